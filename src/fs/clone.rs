use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;

use nix::libc;

/// FICLONE ioctl, _IOW(0x94, 9, int) from linux/fs.h
const FICLONE: libc::c_ulong = 0x4004_9409;

/// whole-file copy-on-write clone
///
/// on success the destination shares the source's extents until either
/// side is written; constant time regardless of file size
pub fn clone_contents(src: &File, dst: &File) -> io::Result<()> {
    // SAFETY: both descriptors stay open for the duration of the call
    let ret = unsafe { libc::ioctl(dst.as_raw_fd(), FICLONE, src.as_raw_fd()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// single copy_file_range call; the kernel may transfer fewer bytes
/// than requested, so callers loop on the returned count
pub fn copy_range(src: &File, dst: &File, len: usize) -> io::Result<usize> {
    // SAFETY: null offsets make the kernel use and advance both file
    // positions, which is what a sequential whole-file copy wants
    let ret = unsafe {
        libc::copy_file_range(
            src.as_raw_fd(),
            std::ptr::null_mut(),
            dst.as_raw_fd(),
            std::ptr::null_mut(),
            len,
            0,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret as usize)
}
