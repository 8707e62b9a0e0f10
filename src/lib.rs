//! treeclone - directory tree replication for container layers
//!
//! faithfully reproduces a directory tree — regular files, directories,
//! symlinks, fifos, sockets, device nodes — preserving ownership, mode,
//! timestamps and extended attributes, the way a container storage layer
//! materializes a new filesystem layer from an existing one.
//!
//! # Core concepts
//!
//! - **Fallback chain**: file content moves via the cheapest mechanism the
//!   kernel offers — copy-on-write clone, then copy_file_range, then
//!   buffered io — and a mechanism that fails as unsupported stays
//!   disabled for the rest of the run
//! - **Inode dedup**: source files sharing a (device, inode) pair come out
//!   hardlinked to a single destination copy
//! - **Deferred directory timestamps**: directory mtimes are stamped after
//!   the walk, so creating children cannot disturb them
//!
//! # Example usage
//!
//! ```no_run
//! use treeclone::{dir_copy, CopyMode};
//! use std::path::Path;
//!
//! // materialize a layer, carrying extended attributes along
//! dir_copy(
//!     Path::new("/var/lib/layers/base"),
//!     Path::new("/var/lib/layers/new"),
//!     CopyMode::Content,
//!     true,
//! )
//! .unwrap();
//! ```

mod error;
mod rootless;

pub mod copy;
pub mod digest;
pub mod fs;

pub use copy::{
    copy_regular, copy_regular_content_to, dir_copy, CopyMode, DedupTable, DeferredDirTimes,
    FallbackState, FileId,
};
pub use digest::{digest_file, Digest, DigestWriter};
pub use error::{Error, Result};
pub use fs::{EntryKind, EntryStat};
pub use rootless::is_rootless;
