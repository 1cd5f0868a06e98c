//! Interaction repository: the storage contract and its filesystem implementation.
//!
//! On-disk layout is `<base>/<service>/<fingerprint>.json`, one pretty-printed
//! interaction per file. The service directory is derived from the target and
//! only exists for human browsability; the fingerprint alone is the key.

use super::fingerprint::Fingerprinter;
use super::types::Interaction;
use crate::config::{RecordingBackend, RecordingConfig};
use crate::proxy::target::split_scheme;
use parking_lot::RwLock;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Partition used when no service name can be derived from a target
pub const UNKNOWN_PARTITION: &str = "unknown";

const RECORDING_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("no interaction recorded for fingerprint {0}")]
    NotFound(String),
    #[error("failed to decode interaction at {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode interaction {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }

    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| RepositoryError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Storage contract for recorded interactions.
///
/// Implementations are synchronous and backed by local storage. Writes are
/// exclusive, reads are shared.
pub trait InteractionRepository: Send + Sync {
    /// Persist an interaction under the fingerprint of its request.
    /// Saving the same fingerprint again replaces the earlier recording.
    fn save(&self, interaction: &Interaction) -> Result<(), RepositoryError>;

    /// Find the interaction recorded for a fingerprint.
    fn find(&self, fingerprint: &str) -> Result<Interaction, RepositoryError>;

    /// All recorded interactions, most recent first.
    fn find_all(&self) -> Result<Vec<Interaction>, RepositoryError>;

    /// Delete every recorded interaction, returning how many were removed.
    fn clear(&self) -> Result<usize, RepositoryError>;

    /// Number of recorded interactions.
    fn count(&self) -> Result<usize, RepositoryError>;

    /// Fingerprinter used to key saved interactions. Lookups must use the same one.
    fn fingerprinter(&self) -> &Fingerprinter;
}

/// Filesystem-backed repository
pub struct FileRepository {
    base: PathBuf,
    fingerprinter: Fingerprinter,
    lock: RwLock<()>,
}

impl FileRepository {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_fingerprinter(base, Fingerprinter::default())
    }

    pub fn with_fingerprinter(base: impl Into<PathBuf>, fingerprinter: Fingerprinter) -> Self {
        Self {
            base: base.into(),
            fingerprinter,
            lock: RwLock::new(()),
        }
    }

    /// Base directory holding the service partitions
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// Partition directories, sorted by name. A missing base directory is empty.
    fn partitions(&self) -> Result<Vec<PathBuf>, RepositoryError> {
        let entries = match fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::io("read directory", &self.base)(e)),
        };

        let mut partitions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(RepositoryError::io("read directory", &self.base))?;
            let path = entry.path();
            if path.is_dir() {
                partitions.push(path);
            }
        }
        partitions.sort();
        Ok(partitions)
    }

    /// Recording files inside one partition, sorted by name.
    fn recording_files(partition: &Path) -> Result<Vec<PathBuf>, RepositoryError> {
        let entries =
            fs::read_dir(partition).map_err(RepositoryError::io("read directory", partition))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(RepositoryError::io("read directory", partition))?;
            let path = entry.path();
            let is_recording = path
                .extension()
                .is_some_and(|ext| ext == RECORDING_EXTENSION);
            if is_recording && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_interaction(path: &Path) -> Result<Interaction, RepositoryError> {
        let bytes = fs::read(path).map_err(RepositoryError::io("read", path))?;
        serde_json::from_slice(&bytes).map_err(|source| RepositoryError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl InteractionRepository for FileRepository {
    fn save(&self, interaction: &Interaction) -> Result<(), RepositoryError> {
        let fingerprint = self.fingerprinter.fingerprint(&interaction.request);
        let partition = sanitize_service_name(&interaction.metadata.target);
        let file_name = format!("{fingerprint}.{RECORDING_EXTENSION}");

        let json = serde_json::to_vec_pretty(interaction).map_err(|source| {
            RepositoryError::Encode {
                id: interaction.id.clone(),
                source,
            }
        })?;

        let _guard = self.lock.write();

        let dir = self.base.join(&partition);
        fs::create_dir_all(&dir).map_err(RepositoryError::io("create directory", &dir))?;

        let path = dir.join(&file_name);
        fs::write(&path, json).map_err(RepositoryError::io("write", &path))?;

        // One file per fingerprint: drop copies recorded under another target
        for other in self.partitions()? {
            if other == dir {
                continue;
            }
            let stale = other.join(&file_name);
            match fs::remove_file(&stale) {
                Ok(()) => debug!("Removed superseded recording {:?}", stale),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(RepositoryError::io("remove", &stale)(e)),
            }
        }

        debug!(
            "Saved interaction {} for {} {} to {:?}",
            interaction.id, interaction.request.method, interaction.request.url, path
        );
        Ok(())
    }

    fn find(&self, fingerprint: &str) -> Result<Interaction, RepositoryError> {
        // Fingerprints are hex digests; anything else cannot name a recording
        if fingerprint.is_empty() || !fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RepositoryError::NotFound(fingerprint.to_string()));
        }

        let _guard = self.lock.read();
        let file_name = format!("{fingerprint}.{RECORDING_EXTENSION}");

        for partition in self.partitions()? {
            let path = partition.join(&file_name);
            if path.is_file() {
                return Self::read_interaction(&path);
            }
        }

        Err(RepositoryError::NotFound(fingerprint.to_string()))
    }

    fn find_all(&self) -> Result<Vec<Interaction>, RepositoryError> {
        let _guard = self.lock.read();

        let mut interactions = Vec::new();
        for partition in self.partitions()? {
            for path in Self::recording_files(&partition)? {
                interactions.push(Self::read_interaction(&path)?);
            }
        }

        interactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(interactions)
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        let _guard = self.lock.write();

        let partitions = self.partitions()?;
        let mut removed = 0;
        for partition in &partitions {
            removed += Self::recording_files(partition)?.len();
            fs::remove_dir_all(partition).map_err(RepositoryError::io("remove", partition))?;
        }

        info!(
            "Cleared {} recordings in {} partitions under {:?}",
            removed,
            partitions.len(),
            self.base
        );
        Ok(removed)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let _guard = self.lock.read();

        let mut count = 0;
        for partition in self.partitions()? {
            count += Self::recording_files(&partition)?.len();
        }
        Ok(count)
    }

    fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }
}

/// Derive the partition directory name for a target.
///
/// Scheme, userinfo, path, query and fragment are stripped so only
/// `host[:port]` remains. DNS names have dots replaced with underscores, IP
/// literals keep their dots, and the port separator becomes an underscore.
/// Empty or unparseable targets map to [`UNKNOWN_PARTITION`].
pub fn sanitize_service_name(target: &str) -> String {
    let (_, without_scheme) = split_scheme(target.trim());
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);

    let (host, port) = match split_host_port(host_port) {
        Some(parts) => parts,
        None => return UNKNOWN_PARTITION.to_string(),
    };

    let host = host.to_ascii_lowercase();
    let host = match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => host,
        Ok(IpAddr::V6(_)) => host.replace(':', "_"),
        Err(_) => host.replace('.', "_"),
    };

    match port {
        Some(port) => format!("{host}_{port}"),
        None => host,
    }
}

/// Split `host[:port]` (or `[v6]:port`). Returns `None` when it cannot be parsed.
fn split_host_port(authority: &str) -> Option<(&str, Option<&str>)> {
    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = match after {
            "" => None,
            _ => Some(after.strip_prefix(':')?),
        };
        if host.parse::<IpAddr>().is_err() {
            return None;
        }
        (host, port)
    } else if authority.parse::<Ipv6Addr>().is_ok() {
        // An unbracketed v6 literal cannot carry a port
        (authority, None)
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    let valid_host = host.parse::<IpAddr>().is_ok()
        || (host.chars().any(|c| c.is_ascii_alphanumeric())
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')));
    let valid_port = port.is_none_or(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if valid_host && valid_port {
        Some((host, port))
    } else {
        None
    }
}

/// Create a repository based on configuration
pub fn create_repository(config: &RecordingConfig) -> Arc<dyn InteractionRepository> {
    let fingerprinter = config.fingerprinter();
    match config.backend {
        RecordingBackend::File => {
            info!("Using file recording repository at {:?}", config.path);
            Arc::new(FileRepository::with_fingerprinter(
                config.path.clone(),
                fingerprinter,
            ))
        }
        RecordingBackend::Memory => {
            info!("Using in-memory recording repository (recordings are not persisted)");
            Arc::new(crate::backends::InMemoryRepository::with_fingerprinter(
                fingerprinter,
            ))
        }
    }
}
