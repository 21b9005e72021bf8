//! `alp` — a Linux-style package manager core.
//!
//! Installs, removes, and tracks software packages distributed as
//! content-addressed `.alp` archives, resolves their inter-package
//! dependencies, and records every mutation in a crash-auditable
//! transaction log with rollback on partial failure.
//!
//! # Layout
//!
//! - [`types`]: wire and database record shapes (`PackageMetadata`,
//!   repository catalogs, transaction records).
//! - [`format`]: the `.alp` archive itself — build, load, checksum-verify,
//!   extract.
//! - [`db`]: the SQLite-backed installation database.
//! - [`repo`]: repository index fetch and cache.
//! - [`resolver`]: dependency resolution and version comparison.
//! - [`installer`]: the transactional install/remove state machines and
//!   their composition root, [`installer::AlpContext`].
//! - [`config`] / [`env`]: environment-variable-driven configuration.
//!
//! # Example
//!
//! ```no_run
//! use alp::installer::{AlpContext, install};
//! use alp::config::AlpConfig;
//!
//! # fn example() -> alp::Result<()> {
//! let mut ctx = AlpContext::open(AlpConfig::from_env())?;
//! let record = install(
//!     &mut ctx,
//!     &["hello-world".to_string()],
//!     false,
//!     |_plan| true,
//!     &|_name, _downloaded, _total| {},
//! )?;
//! println!("transaction {} finished as {:?}", record.id, record.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod env;
pub mod error;
pub mod format;
pub mod installer;
pub mod repo;
pub mod resolver;
pub mod types;

pub mod prelude;

pub use error::{AlpError as Error, Result};
pub use types::PackageMetadata;
