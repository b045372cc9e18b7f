//! In-process adapters used when no database URL is configured.
//!
//! State lives for the lifetime of the process. Each store serialises access
//! through a single mutex, which also provides the row lock semantics that
//! `ItemRepository::with_lock` requires.

mod account_repository;
mod item_repository;

pub use account_repository::MemoryAccountRepository;
pub use item_repository::MemoryItemRepository;
