//! Directory sharing over HTTP with bulk download and delete.
//!
//! `lanshare-core` renders a shared directory as an HTML form: every entry
//! gets a checkbox, and the form submits back to the same directory with
//! `action=Download` or `action=Delete` and the selected `files`. Downloads
//! are bundled into a `.tar.xz` archive; deletes remove the selected entries
//! and show the updated listing.
//!
//! # Examples
//!
//! ```no_run
//! use lanshare_core::ShareConfig;
//! use lanshare_core::server::router;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ShareConfig::new("/srv/share");
//! config.validate()?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router(config)).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod config;
pub mod encoding;
pub mod error;
pub mod listing;
pub mod query;
pub mod server;

// Re-export main API types
pub use actions::BulkExecutor;
pub use actions::DeleteReport;
pub use config::ShareConfig;
pub use error::Result;
pub use error::ShareError;
pub use listing::DirectoryEntry;
pub use listing::ListingPage;
pub use query::Action;
pub use query::ActionRequest;
pub use query::Selection;
pub use server::ShareHandler;
pub use server::router;
