//! Dependency resolution: version comparison and the breadth-first plan
//! builder.

pub mod plan;
pub mod version;

pub use plan::{PackageSource, ResolvedPlan, can_remove, resolve};
