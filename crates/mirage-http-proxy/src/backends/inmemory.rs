use crate::recording::{Fingerprinter, Interaction, InteractionRepository, RepositoryError};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of InteractionRepository
///
/// Interactions are keyed by fingerprint and live only as long as the process.
/// Useful for testing and for throwaway record sessions.
#[derive(Default)]
pub struct InMemoryRepository {
    interactions: RwLock<HashMap<String, Interaction>>,
    fingerprinter: Fingerprinter,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fingerprinter(fingerprinter: Fingerprinter) -> Self {
        Self {
            interactions: RwLock::new(HashMap::new()),
            fingerprinter,
        }
    }
}

impl InteractionRepository for InMemoryRepository {
    fn save(&self, interaction: &Interaction) -> Result<(), RepositoryError> {
        let fingerprint = self.fingerprinter.fingerprint(&interaction.request);
        self.interactions
            .write()
            .insert(fingerprint, interaction.clone());
        Ok(())
    }

    fn find(&self, fingerprint: &str) -> Result<Interaction, RepositoryError> {
        self.interactions
            .read()
            .get(fingerprint)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(fingerprint.to_string()))
    }

    fn find_all(&self) -> Result<Vec<Interaction>, RepositoryError> {
        let mut all: Vec<Interaction> = self.interactions.read().values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(all)
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        let mut interactions = self.interactions.write();
        let removed = interactions.len();
        interactions.clear();
        Ok(removed)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.interactions.read().len())
    }

    fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{InteractionMetadata, RecordedRequest, RecordedResponse};
    use chrono::{Duration, Utc};

    fn interaction(url: &str, age_secs: i64) -> Interaction {
        Interaction::new(
            Utc::now() - Duration::seconds(age_secs),
            RecordedRequest {
                method: "GET".to_string(),
                url: url.to_string(),
                headers: Default::default(),
                body: Vec::new(),
            },
            RecordedResponse {
                status_code: 200,
                headers: Default::default(),
                body: b"ok".to_vec(),
            },
            InteractionMetadata {
                target: "api.example.com".to_string(),
                duration_ms: 1,
            },
        )
    }

    #[test]
    fn test_inmemory_save_find() {
        let repo = InMemoryRepository::new();
        let record = interaction("/users", 0);
        repo.save(&record).unwrap();

        let fp = repo.fingerprinter().fingerprint(&record.request);
        assert_eq!(repo.find(&fp).unwrap(), record);
    }

    #[test]
    fn test_inmemory_not_found() {
        let repo = InMemoryRepository::new();
        assert!(repo.find("deadbeef").unwrap_err().is_not_found());
    }

    #[test]
    fn test_inmemory_find_all_ordering() {
        let repo = InMemoryRepository::new();
        repo.save(&interaction("/old", 60)).unwrap();
        repo.save(&interaction("/new", 0)).unwrap();
        repo.save(&interaction("/mid", 30)).unwrap();

        let urls: Vec<_> = repo
            .find_all()
            .unwrap()
            .into_iter()
            .map(|i| i.request.url)
            .collect();
        assert_eq!(urls, vec!["/new", "/mid", "/old"]);
    }

    #[test]
    fn test_inmemory_count_clear() {
        let repo = InMemoryRepository::new();
        for i in 0..3 {
            repo.save(&interaction(&format!("/{i}"), i)).unwrap();
        }
        assert_eq!(repo.count().unwrap(), 3);

        assert_eq!(repo.clear().unwrap(), 3);
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_inmemory_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InMemoryRepository>();
    }
}
