mod inmemory;

pub use inmemory::InMemoryRepository;
