//! Linux open-file listing via /proc/self/fd

use log::{debug, trace};
use std::fs;
use std::path::Path;

use crate::error::FdError;
use crate::types::{FdIndex, OpenFileRecord};

const PROC_SELF_FD: &str = "/proc/self/fd";

pub fn open_files() -> crate::Result<Vec<OpenFileRecord>> {
    open_files_in(Path::new(PROC_SELF_FD))
}

/// Read an fd directory laid out like `/proc/<pid>/fd`: one symlink per descriptor, named by
/// its index. Only absolute targets that are regular files are kept; sockets, pipes and
/// anonymous inodes (`socket:[123]`, `anon_inode:...`) and deleted files drop out.
/// The listing's own directory descriptor points at a directory and drops out too.
pub fn open_files_in(fd_dir: &Path) -> crate::Result<Vec<OpenFileRecord>> {
    let entries = fs::read_dir(fd_dir).map_err(|source| FdError::ProcessQuery {
        what: "read_dir(/proc/self/fd)",
        source,
    })?;

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let Some(index) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.parse::<FdIndex>().ok())
        else {
            continue;
        };
        // Descriptor closed between listing and readlink
        let target = match fs::read_link(entry.path()) {
            Ok(target) => target,
            Err(e) => {
                trace!("fd {}: readlink failed: {}", index, e);
                continue;
            }
        };
        if !target.is_absolute() {
            continue;
        }
        if !fs::metadata(&target).is_ok_and(|m| m.is_file()) {
            continue;
        }
        records.push(OpenFileRecord {
            path: target,
            reported_index: Some(index),
        });
    }
    records.sort_by_key(|r| r.reported_index);
    debug!("{}: {} regular files", fd_dir.display(), records.len());
    Ok(records)
}
