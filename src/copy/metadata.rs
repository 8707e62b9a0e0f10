use std::ffi::OsStr;
use std::fs::{self, Permissions};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use nix::libc;

use crate::error::{Error, IoResultExt, Result};
use crate::fs::{lchown, list_xattrs, set_times, EntryKind, EntryStat};

/// capability attribute, replicated whenever xattr copying is on
const XATTR_CAPABILITY: &str = "security.capability";
/// user-namespace attributes are replicated wholesale
const XATTR_USER_PREFIX: &[u8] = b"user.";
/// overlayfs marker on an upper directory that masks its lower counterpart
const XATTR_OVERLAY_OPAQUE: &str = "trusted.overlay.opaque";

/// directory timestamps recorded during the walk and applied afterwards
///
/// stamping a directory inline would be futile: creating each child
/// bumps the parent's mtime again. entries drain in reverse visit
/// order, so every directory is stamped strictly after everything
/// created inside it.
#[derive(Debug, Default)]
pub struct DeferredDirTimes {
    entries: Vec<DirTimes>,
}

#[derive(Debug)]
struct DirTimes {
    dest: PathBuf,
    atime: (i64, i64),
    mtime: (i64, i64),
}

impl DeferredDirTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// remember a directory's source timestamps for the post-walk pass
    pub fn record(&mut self, dest: PathBuf, stat: &EntryStat) {
        self.entries.push(DirTimes {
            dest,
            atime: stat.atime,
            mtime: stat.mtime,
        });
    }

    /// apply all recorded timestamps, deepest-first
    pub fn flush(self) -> Result<()> {
        for dir in self.entries.iter().rev() {
            set_times(&dir.dest, dir.atime, dir.mtime, false).with_path(&dir.dest)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// replicate ownership, xattrs, mode and timestamps from a source entry
/// onto its destination
///
/// the order is fixed: chown can clear setuid/setgid bits, so the mode
/// is applied after it; directory timestamps are deferred, everything
/// else is stamped immediately
pub fn propagate_metadata(
    src: &Path,
    dst: &Path,
    stat: &EntryStat,
    copy_xattrs: bool,
    rootless: bool,
    deferred: &mut DeferredDirTimes,
) -> Result<()> {
    if let Err(e) = lchown(dst, stat.uid, stat.gid) {
        // without the privilege to assign arbitrary ids, keep the copy
        // usable under the current ids instead of failing the layer
        let tolerated = rootless && matches!(e.raw_os_error(), Some(libc::EPERM | libc::EINVAL));
        if !tolerated {
            return Err(Error::Io {
                path: dst.to_path_buf(),
                source: e,
            });
        }
    }

    if copy_xattrs {
        copy_entry_xattrs(src, dst, rootless)?;
    }

    let is_symlink = stat.kind == EntryKind::Symlink;

    // a symlink has no mode of its own
    if !is_symlink {
        fs::set_permissions(dst, Permissions::from_mode(stat.perm_bits())).with_path(dst)?;
    }

    if stat.kind == EntryKind::Directory {
        deferred.record(dst.to_path_buf(), stat);
    } else {
        set_times(dst, stat.atime, stat.mtime, !is_symlink).with_path(dst)?;
    }

    Ok(())
}

fn copy_entry_xattrs(src: &Path, dst: &Path, rootless: bool) -> Result<()> {
    copy_xattr(src, dst, OsStr::new(XATTR_CAPABILITY))?;

    for name in list_xattrs(src)? {
        if name.as_bytes().starts_with(XATTR_USER_PREFIX) {
            copy_xattr(src, dst, &name)?;
        }
    }

    if rootless {
        return Ok(());
    }

    // overlay sets this on an upper directory recreated over a deleted
    // lower one; losing it would let the lower content show through
    copy_xattr(src, dst, OsStr::new(XATTR_OVERLAY_OPAQUE))
}

/// copy one named attribute if the source carries it; filesystems
/// without xattr support are not an error
fn copy_xattr(src: &Path, dst: &Path, name: &OsStr) -> Result<()> {
    let value = match xattr::get(src, name) {
        Ok(value) => value,
        Err(e) if e.raw_os_error() == Some(libc::ENOTSUP) => None,
        Err(e) => {
            return Err(Error::Xattr {
                path: src.to_path_buf(),
                message: format!("failed to get {}: {}", name.to_string_lossy(), e),
            })
        }
    };

    if let Some(value) = value {
        xattr::set(dst, name, &value).map_err(|e| Error::Xattr {
            path: dst.to_path_buf(),
            message: format!("failed to set {}: {}", name.to_string_lossy(), e),
        })?;
    }

    Ok(())
}
