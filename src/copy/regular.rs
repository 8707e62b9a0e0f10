use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::libc;

use crate::error::{Error, IoResultExt, Result};
use crate::fs::{clone_contents, copy_range, EntryStat};

use super::FallbackState;

const COPY_BUF_SIZE: usize = 128 * 1024;

/// copy one regular file's content into an already-open destination
///
/// walks the mechanism chain: copy-on-write clone, then copy_file_range,
/// then buffered io. a mechanism that fails as unsupported or
/// cross-device is disabled in the shared fallback state for the rest
/// of the run; any other failure aborts.
pub fn copy_regular_content_to(
    src: &Path,
    dst_file: &File,
    stat: &EntryStat,
    fallback: &mut FallbackState,
) -> Result<()> {
    let src_file = File::open(src).with_path(src)?;

    if fallback.clone_enabled() {
        match clone_contents(&src_file, dst_file) {
            Ok(()) => return Ok(()),
            Err(e) => match e.raw_os_error() {
                Some(libc::EXDEV) => {
                    // a cross-device clone failure means a cross-device
                    // range copy would fail the same way
                    fallback.disable_clone();
                    fallback.disable_range();
                }
                // EINVAL/ENOTTY are how an unavailable clone ioctl reports
                Some(libc::EOPNOTSUPP | libc::ENOSYS | libc::EINVAL | libc::ENOTTY) => {
                    fallback.disable_clone();
                }
                _ => {
                    return Err(Error::Io {
                        path: src.to_path_buf(),
                        source: e,
                    })
                }
            },
        }
    }

    if fallback.range_enabled() {
        match copy_range_all(&src_file, dst_file, stat.size) {
            Ok(()) => return Ok(()),
            Err(e) => match e.raw_os_error() {
                Some(libc::EXDEV | libc::ENOSYS) => fallback.disable_range(),
                _ => {
                    return Err(Error::Io {
                        path: src.to_path_buf(),
                        source: e,
                    })
                }
            },
        }
    }

    buffered_copy(&src_file, dst_file).with_path(src)
}

/// copy one regular file, creating the destination
///
/// the destination is opened with O_EXCL: an existing file is never
/// blown away
pub fn copy_regular(
    src: &Path,
    dst: &Path,
    stat: &EntryStat,
    fallback: &mut FallbackState,
) -> Result<()> {
    let dst_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(stat.perm_bits())
        .open(dst)
        .with_path(dst)?;

    copy_regular_content_to(src, &dst_file, stat, fallback)
}

/// loop copy_file_range until the full source size has moved; a single
/// call may transfer fewer bytes than asked
fn copy_range_all(src: &File, dst: &File, size: u64) -> io::Result<()> {
    let mut remaining = size;
    while remaining > 0 {
        let chunk = remaining.min(i64::MAX as u64) as usize;
        let n = copy_range(src, dst, chunk)?;
        if n == 0 {
            // source shrank under us; nothing more to move
            break;
        }
        remaining -= n as u64;
    }
    Ok(())
}

fn buffered_copy(mut src: &File, mut dst: &File) -> io::Result<()> {
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        dst.write_all(&buf[..n])?;
    }
}
