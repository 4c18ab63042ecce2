//! Descriptor reconciliation: attribute paths from the OS open-file listing to live indices.
//!
//! The listing's own index field cannot be trusted everywhere, and path comparison breaks on
//! renames and links. Each listed path is opened fresh and compared by file identity against
//! every probed index instead. Cost is one open/close per record plus records × handles
//! `fstat` calls, both bounded by the descriptor limit.

use log::{debug, trace};

use crate::error::FdError;
use crate::sys::{DescriptorSource, LiveDescriptors, is_vanished_path};
use crate::types::{DescriptorHandle, OpenFileRecord, ReconcileStats, ReconciledEntry};

/// Map live descriptor indices to paths.
pub fn reconcile(
    records: &[OpenFileRecord],
    handles: &[DescriptorHandle],
) -> crate::Result<Vec<ReconciledEntry>> {
    reconcile_in(&LiveDescriptors, records, handles).map(|(entries, _)| entries)
}

/// [`reconcile`] plus counts of records that contributed nothing.
pub fn reconcile_with_stats(
    records: &[OpenFileRecord],
    handles: &[DescriptorHandle],
) -> crate::Result<(Vec<ReconciledEntry>, ReconcileStats)> {
    reconcile_in(&LiveDescriptors, records, handles)
}

/// Reconcile against any descriptor table.
///
/// Per record: a path that no longer exists is skipped; every handle whose identity matches
/// the freshly opened probe yields an entry (no early exit, dup'ed descriptors all count);
/// the first handle that stops answering ends the comparisons for that record only.
/// Exactly one probe descriptor is open at a time and it is dropped before the next record.
pub fn reconcile_in<S: DescriptorSource>(
    source: &S,
    records: &[OpenFileRecord],
    handles: &[DescriptorHandle],
) -> crate::Result<(Vec<ReconciledEntry>, ReconcileStats)> {
    let mut entries = Vec::new();
    let mut stats = ReconcileStats::default();

    for record in records {
        let probe = match source.open_probe(&record.path) {
            Ok(probe) => probe,
            Err(e) if is_vanished_path(&e) => {
                trace!("{}: vanished before reopen", record.path.display());
                stats.path_vanished += 1;
                continue;
            }
            Err(e) => {
                return Err(FdError::Reopen {
                    path: record.path.clone(),
                    source: e,
                });
            }
        };

        let probe_stat = match source.stat_probe(&probe) {
            Ok(st) => st,
            Err(e) => {
                debug!("{}: fstat on reopened file failed: {}", record.path.display(), e);
                stats.identity_unavailable += 1;
                continue;
            }
        };

        for handle in handles {
            match source.stat(handle.index) {
                Ok(st) if st.same_file(&probe_stat) => entries.push(ReconciledEntry {
                    index: handle.index,
                    path: record.path.clone(),
                }),
                Ok(_) => {}
                Err(e) => {
                    debug!(
                        "{}: fd {} stopped answering ({}); skipping remaining descriptors",
                        record.path.display(),
                        handle.index,
                        e
                    );
                    stats.identity_unavailable += 1;
                    break;
                }
            }
        }
        drop(probe);
    }

    debug!(
        "Reconciled {} records into {} entries ({} vanished, {} cut short)",
        records.len(),
        entries.len(),
        stats.path_vanished,
        stats.identity_unavailable
    );
    Ok((entries, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::FdStat;
    use crate::types::{DescriptorKind, FdIndex};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};

    /// Paths map to inodes; descriptor indices map to inodes. Tracks open probes.
    struct FakeTable {
        paths: HashMap<PathBuf, u64>,
        fds: HashMap<FdIndex, u64>,
        denied: Vec<PathBuf>,
        outstanding: Cell<usize>,
        max_outstanding: Cell<usize>,
    }

    struct FakeProbe<'a> {
        ino: u64,
        outstanding: &'a Cell<usize>,
    }

    impl Drop for FakeProbe<'_> {
        fn drop(&mut self) {
            self.outstanding.set(self.outstanding.get() - 1);
        }
    }

    impl FakeTable {
        fn new(paths: &[(&str, u64)], fds: &[(FdIndex, u64)]) -> Self {
            Self {
                paths: paths.iter().map(|(p, i)| (PathBuf::from(p), *i)).collect(),
                fds: fds.iter().copied().collect(),
                denied: Vec::new(),
                outstanding: Cell::new(0),
                max_outstanding: Cell::new(0),
            }
        }
    }

    impl<'t> DescriptorSource for &'t FakeTable {
        type Probe = FakeProbe<'t>;

        fn stat(&self, index: FdIndex) -> io::Result<FdStat> {
            self.fds
                .get(&index)
                .map(|&ino| FdStat {
                    dev: 1,
                    ino,
                    mode: 0o100_644,
                })
                .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
        }

        fn open_probe(&self, path: &Path) -> io::Result<FakeProbe<'t>> {
            let table: &'t FakeTable = *self;
            if table.denied.iter().any(|p| p == path) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            let ino = *table
                .paths
                .get(path)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            let now = table.outstanding.get() + 1;
            table.outstanding.set(now);
            table.max_outstanding.set(table.max_outstanding.get().max(now));
            Ok(FakeProbe {
                ino,
                outstanding: &table.outstanding,
            })
        }

        fn stat_probe(&self, probe: &FakeProbe<'t>) -> io::Result<FdStat> {
            Ok(FdStat {
                dev: 1,
                ino: probe.ino,
                mode: 0o100_644,
            })
        }

        unsafe fn close(&self, _index: FdIndex) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(path: &str) -> OpenFileRecord {
        OpenFileRecord {
            path: PathBuf::from(path),
            reported_index: None,
        }
    }

    fn handles(indices: &[FdIndex]) -> Vec<DescriptorHandle> {
        indices
            .iter()
            .map(|&index| DescriptorHandle {
                index,
                kind: DescriptorKind::Regular,
            })
            .collect()
    }

    fn entry(index: FdIndex, path: &str) -> ReconciledEntry {
        ReconciledEntry {
            index,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_reconcile_empty_inputs() {
        let table = FakeTable::new(&[("/tmp/a.txt", 10)], &[(5, 10)]);
        let (entries, _) = reconcile_in(&&table, &[], &handles(&[5])).unwrap();
        assert!(entries.is_empty());
        let (entries, _) = reconcile_in(&&table, &[record("/tmp/a.txt")], &[]).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_reconcile_ignores_reported_index() {
        let table = FakeTable::new(&[("/tmp/a.txt", 10)], &[(0, 1), (1, 2), (2, 3), (5, 10)]);
        let records = vec![OpenFileRecord {
            path: PathBuf::from("/tmp/a.txt"),
            reported_index: Some(2),
        }];
        let (entries, _) = reconcile_in(&&table, &records, &handles(&[0, 1, 2, 5])).unwrap();
        assert_eq!(entries, vec![entry(5, "/tmp/a.txt")]);
    }

    #[test]
    fn test_reconcile_vanished_path_between_valid_ones() {
        let table = FakeTable::new(&[("/a", 10), ("/c", 30)], &[(3, 10), (4, 30)]);
        let records = vec![record("/a"), record("/gone"), record("/c")];
        let (entries, stats) = reconcile_in(&&table, &records, &handles(&[3, 4])).unwrap();
        assert_eq!(entries, vec![entry(3, "/a"), entry(4, "/c")]);
        assert_eq!(stats.path_vanished, 1);
    }

    #[test]
    fn test_reconcile_duplicated_descriptors_all_match() {
        let table = FakeTable::new(&[("/a", 10)], &[(3, 10), (4, 99), (7, 10)]);
        let (entries, _) = reconcile_in(&&table, &[record("/a")], &handles(&[3, 4, 7])).unwrap();
        assert_eq!(entries, vec![entry(3, "/a"), entry(7, "/a")]);
    }

    #[test]
    fn test_reconcile_stops_record_at_first_unanswered_index() {
        // fd 4 closed after probing: comparisons for "/a" stop there, fd 7 is never reached.
        let table = FakeTable::new(&[("/a", 10), ("/b", 20)], &[(3, 10), (7, 10), (8, 20)]);
        let records = vec![record("/a"), record("/b")];
        let (entries, stats) =
            reconcile_in(&&table, &records, &handles(&[3, 4, 7, 8])).unwrap();
        assert_eq!(entries, vec![entry(3, "/a")]);
        assert_eq!(stats.identity_unavailable, 2);
    }

    #[test]
    fn test_reconcile_other_open_errors_propagate() {
        let mut table = FakeTable::new(&[("/a", 10)], &[(3, 10)]);
        table.denied.push(PathBuf::from("/secret"));
        let err = reconcile_in(&&table, &[record("/secret")], &handles(&[3])).unwrap_err();
        assert!(matches!(err, FdError::Reopen { .. }));
    }

    #[test]
    fn test_reconcile_holds_one_probe_at_a_time() {
        let table = FakeTable::new(&[("/a", 10), ("/b", 20), ("/c", 30)], &[(3, 10), (4, 20)]);
        let records = vec![record("/a"), record("/b"), record("/c"), record("/missing")];
        reconcile_in(&&table, &records, &handles(&[3, 4])).unwrap();
        assert_eq!(table.max_outstanding.get(), 1);
        assert_eq!(table.outstanding.get(), 0);
    }
}
