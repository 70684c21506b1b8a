//! bucketdrive-core: filesystem semantics over an object-storage REST backend.
//!
//! The [`Drive`] adapts a remote object store to the shape a hierarchical,
//! mutable filesystem consumer expects: directory listings, file content,
//! rename, copy, delete, save, download links, change notification, and a
//! process-lifetime checkpoint simulation.
//!
//! # Quick start
//!
//! ```no_run
//! use bucketdrive_core::{Drive, DriveConfig, DrivePath};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bucketdrive_core::DriveError> {
//!     let config = DriveConfig::from_toml(r#"
//!         base_url = "https://host/api/storage"
//!         download_url_prefix = "https://storage.example.com/"
//!     "#)?;
//!     let drive = Drive::new(config)?;
//!     let listing = drive.fetch(&DrivePath::root()).await?;
//!     println!("{} entries", match listing.content {
//!         Some(bucketdrive_core::EntryContent::Listing(ref children)) => children.len(),
//!         _ => 0,
//!     });
//!     Ok(())
//! }
//! ```

pub mod checkpoints;
pub mod config;
pub mod drive;
pub mod error;
pub mod model;
pub mod path;
pub mod protocol;
pub mod transport;

pub use config::DriveConfig;
pub use drive::{CreateOptions, Drive, SaveOptions};
pub use error::{DriveError, DriveResult};
pub use model::{
    ChangeEvent, ChangeKind, Checkpoint, Entry, EntryContent, EntryFormat, EntryType,
};
pub use path::DrivePath;
pub use transport::{HttpTransport, Method, Transport};
