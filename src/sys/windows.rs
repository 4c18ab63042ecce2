//! C runtime descriptor calls on Windows.
//!
//! The CRT keeps its own descriptor table on top of kernel handles; `fstat` and `close` work on
//! that table. Failures are reported through `errno`, not `GetLastError`, so errors built here
//! carry the CRT errno value as their raw code.

use std::ffi::{c_int, c_uint};
use std::fs::File;
use std::io;
use std::path::Path;

use super::FdStat;
use crate::types::FdIndex;

type InvalidParameterHandler =
    Option<unsafe extern "C" fn(*const u16, *const u16, *const u16, c_uint, usize)>;

unsafe extern "C" {
    fn _errno() -> *mut c_int;
    fn _set_thread_local_invalid_parameter_handler(
        handler: InvalidParameterHandler,
    ) -> InvalidParameterHandler;
}

unsafe extern "C" fn ignore_invalid_parameter(
    _expression: *const u16,
    _function: *const u16,
    _file: *const u16,
    _line: c_uint,
    _reserved: usize,
) {
}

/// The default CRT handler terminates the process on a closed descriptor. While this guard is
/// alive the call returns -1 with `errno` set to EBADF instead.
struct QuietInvalidParameter(InvalidParameterHandler);

impl QuietInvalidParameter {
    fn install() -> Self {
        let previous =
            unsafe { _set_thread_local_invalid_parameter_handler(Some(ignore_invalid_parameter)) };
        QuietInvalidParameter(previous)
    }
}

impl Drop for QuietInvalidParameter {
    fn drop(&mut self) {
        unsafe { _set_thread_local_invalid_parameter_handler(self.0) };
    }
}

fn crt_error() -> io::Error {
    io::Error::from_raw_os_error(unsafe { *_errno() })
}

pub fn fstat(index: FdIndex) -> io::Result<FdStat> {
    use std::mem::MaybeUninit;
    let _quiet = QuietInvalidParameter::install();
    let mut st = MaybeUninit::<libc::stat>::uninit();
    if unsafe { libc::fstat(index, st.as_mut_ptr()) } != 0 {
        return Err(crt_error());
    }
    let st = unsafe { st.assume_init() };
    Ok(FdStat {
        dev: u64::from(st.st_dev),
        ino: u64::from(st.st_ino),
        mode: u32::from(st.st_mode),
    })
}

/// The CRT reports `st_ino` as 0 for every file, so dev+ino cannot tell two files on the same
/// volume apart. Identity checks are refused rather than matching everything.
pub fn stat_file(_file: &File) -> io::Result<FdStat> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

pub fn open_nonblocking(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// # Safety
///
/// See [`super::close_fd`].
pub unsafe fn close_fd(index: FdIndex) -> io::Result<()> {
    let _quiet = QuietInvalidParameter::install();
    if unsafe { libc::close(index) } != 0 {
        return Err(crt_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fstat_closed_index_reports_ebadf_without_aborting() {
        let err = fstat(-1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_close_closed_index_reports_ebadf() {
        let err = unsafe { close_fd(-1) }.unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
