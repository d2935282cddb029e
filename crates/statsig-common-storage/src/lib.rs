// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pluggable key-value storage for the Statsig client SDK.
//!
//! Two providers ship with the crate:
//!
//! - [`FileStorageProvider`]: durable, one file per key under the XDG data
//!   directory. Probed once at startup.
//! - [`InMemoryStorageProvider`]: always available, process-local.
//!
//! All reads and writes go through a [`StorageGateway`], which routes to the
//! durable provider until a permission failure trips its breaker, after which
//! every operation is served from memory for the rest of the process.

pub mod error;
pub mod file;
pub mod gateway;
pub mod memory;
pub mod object;
pub mod provider;

pub use error::{Result, StorageError};
pub use file::FileStorageProvider;
pub use gateway::{ActiveSelector, StorageGateway};
pub use memory::InMemoryStorageProvider;
pub use object::{get_object_from_storage, set_object_in_storage};
pub use provider::{SharedStorageProvider, StorageProvider};
