pub mod dedup;
pub mod dircopy;
pub mod fallback;
pub mod metadata;
pub mod regular;

pub use dedup::{DedupTable, FileId};
pub use dircopy::{dir_copy, CopyMode};
pub use fallback::FallbackState;
pub use metadata::{propagate_metadata, DeferredDirTimes};
pub use regular::{copy_regular, copy_regular_content_to};
