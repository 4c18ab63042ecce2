//! Open-file listing from the OS process-accounting facility, for the calling process only.
//!
//! Each backend reports regular files with whatever index the OS claims. That index is carried
//! as a hint and never used for the mapping; see [`crate::reconcile`].

use crate::types::OpenFileRecord;

// Platform-specific modules
#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux::open_files_in;

/// Regular files the OS says this process has open.
pub fn list_open_files() -> crate::Result<Vec<OpenFileRecord>> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        linux::open_files()
    }

    #[cfg(target_os = "macos")]
    {
        macos::open_files()
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos")))]
    {
        log::debug!("Unsupported platform for open file listing");
        Err(crate::FdError::ProcessQuery {
            what: "open file listing",
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }
}
