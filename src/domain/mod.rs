//! Domain layer for reqlint
//!
//! CDD Principle: Domain Model - Pure value types for requirement quality analysis
//! - Contains requirement records, defects, suggestions and the per-run report aggregate
//! - Independent of file formats, terminals and network collaborators
//! - Expresses the ubiquitous language of requirements engineering (testability, ambiguity)

pub mod errors;
pub mod report;
pub mod requirements;

// Re-export main domain types for convenience
pub use errors::*;
pub use report::*;
pub use requirements::*;
