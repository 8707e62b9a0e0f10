use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::fs::{
    create_device, create_dir, create_fifo, create_hardlink, create_socket, create_symlink,
    read_symlink_target, EntryKind, EntryStat,
};
use crate::rootless::is_rootless;

use super::{
    copy_regular, propagate_metadata, DedupTable, DeferredDirTimes, FallbackState, FileId,
};

/// whether regular files are copied or hardlinked to their source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMode {
    /// create new files and copy their content
    #[default]
    Content,
    /// hardlink every regular file to its source
    Hardlink,
}

/// replicate the tree rooted at src_dir into dst_dir
///
/// every entry kind is recreated in place — regular files, directories,
/// symlinks, fifos, sockets and device nodes — with ownership, mode,
/// timestamps and (optionally) extended attributes carried over. source
/// files sharing an inode come out hardlinked to one destination copy.
/// directory timestamps are fixed up after the walk so child creation
/// cannot disturb them.
///
/// the first error aborts the run and may leave the destination
/// partially populated; cleanup is the caller's responsibility.
pub fn dir_copy(src_dir: &Path, dst_dir: &Path, mode: CopyMode, copy_xattrs: bool) -> Result<()> {
    let mut fallback = FallbackState::default();
    let mut copied = DedupTable::new();
    let mut deferred = DeferredDirTimes::new();
    let rootless = is_rootless();

    for entry in WalkDir::new(src_dir) {
        let entry = entry?;
        let src_path = entry.path();
        let rel = match src_path.strip_prefix(src_dir) {
            Ok(rel) => rel,
            Err(_) => {
                return Err(Error::Io {
                    path: src_path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "entry outside source root"),
                })
            }
        };
        let dst_path = dst_dir.join(rel);

        let meta = entry.metadata()?;
        let stat = EntryStat::from_metadata(src_path, &meta)?;

        let mut dedup_hardlink = false;

        match stat.kind {
            EntryKind::Regular => {
                let id = FileId::of(&stat);
                if mode == CopyMode::Hardlink {
                    create_hardlink(src_path, &dst_path)?;
                } else if let Some(original) = copied.get(id) {
                    // an earlier source path shares this inode; link to
                    // the copy it produced instead of duplicating data
                    create_hardlink(original, &dst_path)?;
                    dedup_hardlink = true;
                } else {
                    copy_regular(src_path, &dst_path, &stat, &mut fallback)?;
                    copied.record(id, dst_path.clone());
                }
            }

            EntryKind::Directory => create_dir(&dst_path, stat.mode)?,

            EntryKind::Symlink => {
                let target = read_symlink_target(src_path)?;
                create_symlink(&target, &dst_path)?;
            }

            EntryKind::Fifo => create_fifo(&dst_path, stat.mode)?,

            EntryKind::Socket => create_socket(&dst_path, stat.mode, stat.rdev)?,

            EntryKind::Device => {
                if rootless {
                    // device nodes cannot be created inside a user
                    // namespace; leave them out rather than failing
                    // the whole layer
                    continue;
                }
                create_device(&dst_path, stat.mode, stat.rdev)?;
            }
        }

        // a dedup hardlink shares an inode whose metadata is already final
        if dedup_hardlink {
            continue;
        }

        propagate_metadata(
            src_path,
            &dst_path,
            &stat,
            copy_xattrs,
            rootless,
            &mut deferred,
        )?;
    }

    deferred.flush()
}
