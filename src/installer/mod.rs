//! Transactional installer: the composition root, transport, append-only
//! log, and the install/remove state machines built on top of them.

pub mod context;
pub mod download;
pub mod install;
pub mod log;
pub mod remove;

pub use context::AlpContext;
pub use download::download;
pub use install::install;
pub use log::TransactionLog;
pub use remove::{RemovalOutcome, RemovalReport, remove};
