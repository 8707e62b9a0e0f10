use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::fs::{symlink, DirBuilderExt};
use std::path::Path;

use nix::libc;
use nix::sys::stat::{mknod, Mode, SFlag};

use crate::error::{Error, IoResultExt, Result};

/// create a directory with the source's raw mode bits
///
/// "already exists" is tolerated here and only here: the destination
/// root usually exists, and nested walks re-enter directories created
/// moments earlier
pub fn create_dir(path: &Path, mode: u32) -> Result<()> {
    match fs::DirBuilder::new().mode(mode).create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// create a symlink with the given target text
pub fn create_symlink(target: &Path, path: &Path) -> Result<()> {
    symlink(target, path).with_path(path)
}

/// create a named pipe with the source's permission bits
pub fn create_fifo(path: &Path, mode: u32) -> Result<()> {
    nix::unistd::mkfifo(path, Mode::from_bits_truncate(mode)).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// recreate a socket entry via mknod with the raw mode and device id
pub fn create_socket(path: &Path, mode: u32, rdev: u64) -> Result<()> {
    mknod(
        path,
        SFlag::S_IFSOCK,
        Mode::from_bits_truncate(mode),
        rdev as libc::dev_t,
    )
    .map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// create a block or character device node; the type comes from the
/// raw mode bits
pub fn create_device(path: &Path, mode: u32, rdev: u64) -> Result<()> {
    let kind = SFlag::from_bits_truncate(mode & libc::S_IFMT);
    mknod(path, kind, Mode::from_bits_truncate(mode), rdev as libc::dev_t).map_err(|e| {
        Error::Io {
            path: path.to_path_buf(),
            source: e.into(),
        }
    })
}

/// create a hardlink at link pointing at original
pub fn create_hardlink(original: &Path, link: &Path) -> Result<()> {
    fs::hard_link(original, link).with_path(link)
}

/// change ownership without following symlinks
///
/// returns the raw io error so callers can decide which failures to
/// tolerate
pub fn lchown(path: &Path, uid: u32, gid: u32) -> io::Result<()> {
    let c_path = cstring_path(path)?;
    let ret = unsafe { libc::lchown(c_path.as_ptr(), uid, gid) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// set access and modify time; follow=false uses AT_SYMLINK_NOFOLLOW
/// so a symlink's own timestamps change rather than its target's
pub fn set_times(path: &Path, atime: (i64, i64), mtime: (i64, i64), follow: bool) -> io::Result<()> {
    let times = [timespec(atime), timespec(mtime)];
    let flags = if follow { 0 } else { libc::AT_SYMLINK_NOFOLLOW };
    let c_path = cstring_path(path)?;
    let ret = unsafe { libc::utimensat(libc::AT_FDCWD, c_path.as_ptr(), times.as_ptr(), flags) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn timespec((sec, nsec): (i64, i64)) -> libc::timespec {
    libc::timespec {
        tv_sec: sec,
        tv_nsec: nsec,
    }
}

fn cstring_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_encoded_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::{FileTypeExt, MetadataExt};
    use tempfile::tempdir;

    #[test]
    fn test_create_dir_with_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subdir");

        create_dir(&path, 0o40755).unwrap();

        assert!(path.is_dir());
        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.mode() & 0o777, 0o755);
    }

    #[test]
    fn test_create_dir_tolerates_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subdir");
        fs::create_dir(&path).unwrap();

        create_dir(&path, 0o755).unwrap();
    }

    #[test]
    fn test_create_symlink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("link");

        create_symlink(Path::new("/target/path"), &path).unwrap();

        assert!(path.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_link(&path).unwrap(),
            std::path::PathBuf::from("/target/path")
        );
    }

    #[test]
    fn test_create_fifo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fifo");

        create_fifo(&path, 0o644).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert!(meta.file_type().is_fifo());
    }

    #[test]
    fn test_create_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sock");

        // S_IFSOCK mknod needs no privilege
        create_socket(&path, 0o140755, 0).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert!(meta.file_type().is_socket());
    }

    #[test]
    fn test_create_hardlink() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("original");
        let link = dir.path().join("link");
        fs::write(&original, "content").unwrap();

        create_hardlink(&original, &link).unwrap();

        assert_eq!(
            fs::metadata(&original).unwrap().ino(),
            fs::metadata(&link).unwrap().ino()
        );
    }

    #[test]
    fn test_set_times_follows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "x").unwrap();

        set_times(&path, (1_600_000_000, 0), (1_500_000_000, 500), true).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.atime(), 1_600_000_000);
        assert_eq!(meta.mtime(), 1_500_000_000);
        assert_eq!(meta.mtime_nsec(), 500);
    }

    #[test]
    fn test_set_times_nofollow_leaves_target_alone() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::write(&target, "x").unwrap();
        set_times(&target, (1_600_000_000, 0), (1_600_000_000, 0), true).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        set_times(&link, (1_000_000_000, 0), (1_000_000_000, 0), false).unwrap();

        // the target keeps its own timestamps
        assert_eq!(fs::metadata(&target).unwrap().mtime(), 1_600_000_000);
        assert_eq!(fs::symlink_metadata(&link).unwrap().mtime(), 1_000_000_000);
    }

    #[test]
    fn test_lchown_to_self_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "x").unwrap();
        let meta = fs::metadata(&path).unwrap();

        lchown(&path, meta.uid(), meta.gid()).unwrap();
    }
}
