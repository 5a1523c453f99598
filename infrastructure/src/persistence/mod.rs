pub mod in_memory_repository;
pub mod user_in_memory_repository;

// Re-export both repository types
pub use in_memory_repository::InMemoryRepository;
pub use user_in_memory_repository::UserInMemoryRepository;
