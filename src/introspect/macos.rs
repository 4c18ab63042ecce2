//! macOS open-file listing via proc_pidinfo(PROC_PIDLISTFDS) and fcntl(F_GETPATH)

use log::{debug, trace};
use std::ffi::CStr;
use std::mem::size_of;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use crate::error::FdError;
use crate::types::OpenFileRecord;

/// Extra slots beyond the sizing call, for descriptors opened in between.
const FD_LIST_HEADROOM: usize = 32;

pub fn open_files() -> crate::Result<Vec<OpenFileRecord>> {
    let pid = unsafe { libc::getpid() };
    let entry_size = size_of::<libc::proc_fdinfo>();

    let needed =
        unsafe { libc::proc_pidinfo(pid, libc::PROC_PIDLISTFDS, 0, std::ptr::null_mut(), 0) };
    if needed <= 0 {
        return Err(FdError::ProcessQuery {
            what: "proc_pidinfo(PROC_PIDLISTFDS)",
            source: std::io::Error::last_os_error(),
        });
    }

    let capacity = needed as usize / entry_size + FD_LIST_HEADROOM;
    let mut fds: Vec<libc::proc_fdinfo> = Vec::with_capacity(capacity);
    let written = unsafe {
        libc::proc_pidinfo(
            pid,
            libc::PROC_PIDLISTFDS,
            0,
            fds.as_mut_ptr().cast(),
            (capacity * entry_size) as libc::c_int,
        )
    };
    if written <= 0 {
        return Err(FdError::ProcessQuery {
            what: "proc_pidinfo(PROC_PIDLISTFDS)",
            source: std::io::Error::last_os_error(),
        });
    }
    // SAFETY: the kernel filled `written` bytes of whole proc_fdinfo entries.
    unsafe { fds.set_len(written as usize / entry_size) };

    let mut records = Vec::new();
    for info in fds
        .iter()
        .filter(|i| i.proc_fdtype == libc::PROX_FDTYPE_VNODE as u32)
    {
        let Some(path) = vnode_path(info.proc_fd) else {
            trace!("fd {}: F_GETPATH failed", info.proc_fd);
            continue;
        };
        if !std::fs::metadata(&path).is_ok_and(|m| m.is_file()) {
            continue;
        }
        records.push(OpenFileRecord {
            path,
            reported_index: Some(info.proc_fd),
        });
    }
    debug!("proc_pidinfo: {} regular files", records.len());
    Ok(records)
}

fn vnode_path(fd: libc::c_int) -> Option<PathBuf> {
    let mut buf = vec![0u8; libc::PATH_MAX as usize];
    if unsafe { libc::fcntl(fd, libc::F_GETPATH, buf.as_mut_ptr()) } == -1 {
        return None;
    }
    let path = CStr::from_bytes_until_nul(&buf).ok()?;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(path.to_bytes())))
}
