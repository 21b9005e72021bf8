//! Convenience re-exports for `use alp::prelude::*;`.
//!
//! # Example
//!
//! ```no_run
//! use alp::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let mut ctx = AlpContext::open(AlpConfig::from_env())?;
//! let (record, reports) = remove(&mut ctx, &["hello-world".to_string()])?;
//! println!("{:?}", record.status);
//! for report in reports {
//!     println!("{}: {:?}", report.package, report.outcome);
//! }
//! Ok(())
//! # }
//! ```

pub use crate::config::AlpConfig;
pub use crate::error::{AlpError as Error, Result};
pub use crate::format::Package;
pub use crate::installer::{AlpContext, RemovalOutcome, RemovalReport, install, remove};
pub use crate::resolver::{PackageSource, ResolvedPlan, can_remove, resolve};
pub use crate::types::{
    PackageMetadata, RepositoryCatalog, RepositoryEntry, RepositoryRegistration, TransactionAction,
    TransactionRecord, TransactionStatus, TransactionType,
};
