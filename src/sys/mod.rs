//! Thin OS layer: per-index `fstat`, identity probes and `close`.
//!
//! [`DescriptorSource`] is the seam between the discovery algorithms and the live descriptor
//! table. [`LiveDescriptors`] talks to the OS; tests substitute their own table.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::types::FdIndex;

// Platform-specific modules
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use self::unix as imp;
#[cfg(windows)]
use self::windows as imp;
#[cfg(not(any(unix, windows)))]
use self::unsupported as imp;

#[cfg(not(any(unix, windows)))]
mod unsupported {
    use super::FdStat;
    use crate::types::FdIndex;
    use std::fs::File;
    use std::io;
    use std::path::Path;

    pub fn fstat(_index: FdIndex) -> io::Result<FdStat> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn stat_file(_file: &File) -> io::Result<FdStat> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn open_nonblocking(path: &Path) -> io::Result<File> {
        File::open(path)
    }

    pub unsafe fn close_fd(_index: FdIndex) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

/// The subset of `struct stat` the pipeline cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FdStat {
    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
}

impl FdStat {
    /// Same underlying file: equal device and inode.
    pub fn same_file(&self, other: &FdStat) -> bool {
        self.dev == other.dev && self.ino == other.ino
    }
}

/// Access to a process descriptor table.
pub trait DescriptorSource {
    /// Scoped descriptor opened for an identity check; released on drop.
    type Probe;

    /// Metadata for the descriptor at `index`.
    fn stat(&self, index: FdIndex) -> io::Result<FdStat>;

    /// Open `path` read-only without blocking on FIFOs or devices.
    fn open_probe(&self, path: &Path) -> io::Result<Self::Probe>;

    /// Metadata for a probe descriptor.
    fn stat_probe(&self, probe: &Self::Probe) -> io::Result<FdStat>;

    /// Close the descriptor at `index`.
    ///
    /// # Safety
    ///
    /// Nothing else may own or use `index` afterwards (see [`crate::close_all`]).
    unsafe fn close(&self, index: FdIndex) -> io::Result<()>;
}

/// The calling process's real descriptor table.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiveDescriptors;

impl DescriptorSource for LiveDescriptors {
    type Probe = File;

    fn stat(&self, index: FdIndex) -> io::Result<FdStat> {
        fstat(index)
    }

    fn open_probe(&self, path: &Path) -> io::Result<File> {
        open_nonblocking(path)
    }

    fn stat_probe(&self, probe: &File) -> io::Result<FdStat> {
        stat_file(probe)
    }

    unsafe fn close(&self, index: FdIndex) -> io::Result<()> {
        unsafe { close_fd(index) }
    }
}

/// Metadata for the descriptor at `index`.
pub fn fstat(index: FdIndex) -> io::Result<FdStat> {
    imp::fstat(index)
}

fn stat_file(file: &File) -> io::Result<FdStat> {
    imp::stat_file(file)
}

fn open_nonblocking(path: &Path) -> io::Result<File> {
    imp::open_nonblocking(path)
}

/// Close a raw descriptor.
///
/// # Safety
///
/// The caller must own `index` and must not use it (or any wrapper around it) afterwards.
pub unsafe fn close_fd(index: FdIndex) -> io::Result<()> {
    unsafe { imp::close_fd(index) }
}

/// True for the "not an open descriptor" error (EBADF).
pub fn is_bad_descriptor(err: &io::Error) -> bool {
    #[cfg(any(unix, windows))]
    {
        err.raw_os_error() == Some(libc::EBADF)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = err;
        false
    }
}

/// True when a path disappeared (or a component stopped being a directory) before reopen.
pub fn is_vanished_path(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_file_ignores_mode() {
        let a = FdStat {
            dev: 1,
            ino: 42,
            mode: 0o100_644,
        };
        let b = FdStat { mode: 0o100_600, ..a };
        assert!(a.same_file(&b));
        assert!(!a.same_file(&FdStat { ino: 43, ..a }));
        assert!(!a.same_file(&FdStat { dev: 2, ..a }));
    }

    #[test]
    fn test_is_vanished_path() {
        assert!(is_vanished_path(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_vanished_path(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_is_bad_descriptor_matches_ebadf_only() {
        assert!(is_bad_descriptor(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(!is_bad_descriptor(&io::Error::from_raw_os_error(libc::EIO)));
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_fstat_on_negative_index_is_bad_descriptor() {
        let err = fstat(-1).unwrap_err();
        assert!(is_bad_descriptor(&err));
    }

    #[cfg(unix)]
    #[test]
    fn test_stat_probe_matches_fstat_of_same_descriptor() {
        use std::os::fd::AsRawFd;
        let file = tempfile::tempfile().unwrap();
        let via_index = fstat(file.as_raw_fd()).unwrap();
        let via_probe = LiveDescriptors.stat_probe(&file).unwrap();
        assert_eq!(via_index, via_probe);
    }
}
