use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use nix::libc;

use crate::error::{Error, IoResultExt, Result};

/// filesystem entry kinds the copier knows how to recreate
///
/// a closed set: classification of anything else is an error, never a
/// best-effort fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Fifo,
    Socket,
    /// block or character device; the raw mode bits distinguish the two
    Device,
}

impl EntryKind {
    /// classify an entry from its (non-followed) metadata
    pub fn from_metadata(path: &Path, meta: &Metadata) -> Result<Self> {
        let ft = meta.file_type();
        if ft.is_file() {
            Ok(EntryKind::Regular)
        } else if ft.is_dir() {
            Ok(EntryKind::Directory)
        } else if ft.is_symlink() {
            Ok(EntryKind::Symlink)
        } else if ft.is_fifo() {
            Ok(EntryKind::Fifo)
        } else if ft.is_socket() {
            Ok(EntryKind::Socket)
        } else if ft.is_block_device() || ft.is_char_device() {
            Ok(EntryKind::Device)
        } else {
            Err(Error::UnsupportedFileType {
                path: path.to_path_buf(),
                mode: meta.mode(),
            })
        }
    }
}

/// raw stat snapshot for one source entry
///
/// captured once at walk time and reused for both the dedup key and
/// metadata replication; the entry is never stat'ed again, so values
/// cannot be disturbed by the copy's own writes
#[derive(Debug, Clone)]
pub struct EntryStat {
    pub kind: EntryKind,
    /// device id, half of the hardlink-dedup key
    pub dev: u64,
    /// inode number, the other half
    pub ino: u64,
    pub uid: u32,
    pub gid: u32,
    /// raw st_mode including the file type bits
    pub mode: u32,
    pub size: u64,
    /// device number for block/char devices (and passed through for sockets)
    pub rdev: u64,
    /// access time as (seconds, nanoseconds)
    pub atime: (i64, i64),
    /// modify time as (seconds, nanoseconds)
    pub mtime: (i64, i64),
}

impl EntryStat {
    /// snapshot from already-read metadata
    pub fn from_metadata(path: &Path, meta: &Metadata) -> Result<Self> {
        Ok(Self {
            kind: EntryKind::from_metadata(path, meta)?,
            dev: meta.dev(),
            ino: meta.ino(),
            uid: meta.uid(),
            gid: meta.gid(),
            mode: meta.mode(),
            size: meta.len(),
            rdev: meta.rdev(),
            atime: (meta.atime(), meta.atime_nsec()),
            mtime: (meta.mtime(), meta.mtime_nsec()),
        })
    }

    /// snapshot a path without following symlinks
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = fs::symlink_metadata(path).with_path(path)?;
        Self::from_metadata(path, &meta)
    }

    /// permission bits including setuid/setgid/sticky, without type bits
    pub fn perm_bits(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// list extended attribute names on a path (no symlink follow)
///
/// filesystems without xattr support report an empty list rather than
/// an error
pub fn list_xattrs(path: &Path) -> Result<Vec<OsString>> {
    match xattr::list(path) {
        Ok(names) => Ok(names.collect()),
        Err(e) if e.raw_os_error() == Some(libc::ENOTSUP) => Ok(vec![]),
        Err(e) => Err(Error::Xattr {
            path: path.to_path_buf(),
            message: format!("failed to list: {}", e),
        }),
    }
}

/// read a symlink's target verbatim
pub fn read_symlink_target(path: &Path) -> Result<PathBuf> {
    fs::read_link(path).with_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn test_classify_regular() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "content").unwrap();

        let stat = EntryStat::from_path(&path).unwrap();
        assert_eq!(stat.kind, EntryKind::Regular);
        assert_eq!(stat.size, 7);
    }

    #[test]
    fn test_classify_directory() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let stat = EntryStat::from_path(&subdir).unwrap();
        assert_eq!(stat.kind, EntryKind::Directory);
    }

    #[test]
    fn test_classify_symlink_without_following() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::write(&target, "content").unwrap();
        symlink(&target, &link).unwrap();

        let stat = EntryStat::from_path(&link).unwrap();
        assert_eq!(stat.kind, EntryKind::Symlink);
    }

    #[test]
    fn test_classify_fifo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fifo");
        nix::unistd::mkfifo(&path, nix::sys::stat::Mode::from_bits_truncate(0o644)).unwrap();

        let stat = EntryStat::from_path(&path).unwrap();
        assert_eq!(stat.kind, EntryKind::Fifo);
    }

    #[test]
    fn test_perm_bits_strip_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "x").unwrap();
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let stat = EntryStat::from_path(&path).unwrap();
        assert_eq!(stat.perm_bits(), 0o640);
        // raw mode still carries the type bits
        assert_ne!(stat.mode, stat.perm_bits());
    }

    #[test]
    fn test_read_symlink_target() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("link");
        symlink("/some/target/path", &link).unwrap();

        let target = read_symlink_target(&link).unwrap();
        assert_eq!(target, PathBuf::from("/some/target/path"));
    }

    #[test]
    fn test_list_xattrs_plain_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "x").unwrap();

        // a fresh file has no user xattrs; the call itself must not fail
        let names = list_xattrs(&path).unwrap();
        assert!(names
            .iter()
            .all(|n| !n.to_string_lossy().starts_with("user.")));
    }
}
