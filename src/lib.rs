//! Move files between heterogeneous storage backends.
//!
//! A [`storage::StorageBackend`] exposes three operations (list, download,
//! upload) over its own addressing scheme. [`storage::create_backend`] builds
//! one of the supported backends from a type tag, and
//! [`transfer::TransferManager`] composes a source and a destination into
//! single-file and directory-tree transfers staged through local disk.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod transfer;

pub use error::{Error, ErrorKind, Result};
pub use storage::{Backend, BackendParams, BackendType, StorageBackend, create_backend};
pub use transfer::{TransferManager, TransferReport};
