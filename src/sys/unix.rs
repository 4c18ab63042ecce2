//! POSIX descriptor calls through libc.

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use super::FdStat;
use crate::types::FdIndex;

#[allow(clippy::unnecessary_cast)]
pub fn fstat(index: FdIndex) -> io::Result<FdStat> {
    use std::mem::MaybeUninit;
    let mut st = MaybeUninit::<libc::stat>::uninit();
    if unsafe { libc::fstat(index, st.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let st = unsafe { st.assume_init() };
    Ok(FdStat {
        dev: st.st_dev as u64,
        ino: st.st_ino as u64,
        mode: st.st_mode as u32,
    })
}

pub fn stat_file(file: &File) -> io::Result<FdStat> {
    fstat(file.as_raw_fd())
}

pub fn open_nonblocking(path: &Path) -> io::Result<File> {
    std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// # Safety
///
/// See [`super::close_fd`].
pub unsafe fn close_fd(index: FdIndex) -> io::Result<()> {
    if unsafe { libc::close(index) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
