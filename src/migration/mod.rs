//! Legacy migration and identifier diagnostics

pub mod diagnostic;
pub mod legacy;

pub use diagnostic::{diagnose, find_substitute, DiagnosticReport};
pub use legacy::{scan_legacy, KeyReport, LegacyMigrator, MigrationReport, LEGACY_DESIGN_ID};
