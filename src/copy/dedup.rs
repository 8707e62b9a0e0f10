use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fs::EntryStat;

/// identity of a source regular file, meaningful within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

impl FileId {
    pub fn of(stat: &EntryStat) -> Self {
        Self {
            dev: stat.dev,
            ino: stat.ino,
        }
    }
}

/// maps source inodes to the destination path that first received their
/// content, so later source paths sharing the inode become hardlinks to
/// that copy instead of duplicating data
///
/// owned by a single dir_copy invocation and dropped with it; sharing a
/// table across runs would hand out paths from an unrelated destination
/// tree. first writer wins, entries are never removed.
#[derive(Debug, Default)]
pub struct DedupTable {
    copied: HashMap<FileId, PathBuf>,
}

impl DedupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// destination path an earlier copy of this inode landed at, if any
    pub fn get(&self, id: FileId) -> Option<&Path> {
        self.copied.get(&id).map(|p| p.as_path())
    }

    /// record the destination of a freshly copied inode
    pub fn record(&mut self, id: FileId, dest: PathBuf) {
        self.copied.entry(id).or_insert(dest);
    }

    pub fn len(&self) -> usize {
        self.copied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }
}
