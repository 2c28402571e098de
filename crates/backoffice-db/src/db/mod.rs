//! Database repositories for the data access layer
//
// File lifecycle repository (cleanup claim/lease, soft delete)
pub mod file;
//
// Transaction utilities
pub mod transaction;

pub use file::FileRepository;
