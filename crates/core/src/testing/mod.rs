//! Mock implementations of the operator's collaborators.
//!
//! These let the operator run end to end without a network or a real
//! archive on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use fetchzip_core::testing::{MockArchiveWriter, MockFetcher, MockResource};
//!
//! let fetcher = MockFetcher::new();
//! fetcher
//!     .add_resource("http://files/cat.jpg", MockResource::ok("cat.jpg", b"meow"))
//!     .await;
//!
//! let writer = MockArchiveWriter::new();
//! writer.fail_entry("broken.pdf");
//! ```

mod mock_archive_writer;
mod mock_fetcher;

pub use mock_archive_writer::{MockArchiveWriter, RecordedUpsert};
pub use mock_fetcher::{MockFetcher, MockResource};
