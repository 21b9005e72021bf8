//! Shared data types for package metadata, repositories, and transactions.

mod package;
mod repository;
mod transaction;

pub use package::PackageMetadata;
pub use repository::{RepositoryCatalog, RepositoryEntry, RepositoryRegistration};
pub use transaction::{
    TransactionAction, TransactionRecord, TransactionStatus, TransactionType, next_transaction_id,
};
