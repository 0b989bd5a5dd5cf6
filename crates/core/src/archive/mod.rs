//! Incremental zip container assembly.

mod error;
mod zip_writer;

pub use error::ArchiveError;
pub use zip_writer::{unique_entry_name, ArchiveWriter, ZipArchiveWriter};
