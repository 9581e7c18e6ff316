//! sftpblob-core: Core library for sftpblob
//!
//! This crate exposes a remote directory tree as a flat object bucket:
//! - RemoteFs trait for the connected remote filesystem
//! - Tree walking and the paginated, delimiter-aware listing engine
//! - Bucket trait and its implementation over any RemoteFs
//! - Configuration management
//!
//! This crate is designed to be independent of any specific SSH/SFTP library,
//! allowing for easy testing against the local filesystem or mocks.

pub mod bucket;
pub mod config;
pub mod error;
pub mod io;
pub mod list;
pub mod local;
pub mod path;
pub mod remote;
pub mod sort;
pub mod traits;
pub mod walk;

pub use bucket::RemoteBucket;
pub use config::{BucketOptions, Config, ConfigManager, ListStrategy};
pub use error::{Error, ErrorKind, Result};
pub use io::{BlobReader, BlobWriter};
pub use local::LocalFs;
pub use path::RootDir;
pub use remote::{FileInfo, ReadHandle, RemoteFs, WriteHandle, link_entry};
pub use traits::{Attributes, Bucket, ListOptions, ListPage, ObjectInfo, WriterOptions};
pub use walk::{WalkEntry, Walker};
