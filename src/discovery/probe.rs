//! Raw descriptor probing: `fstat` every index below the limit and classify what is open.

use log::{debug, trace};

use crate::sys::{DescriptorSource, LiveDescriptors, is_bad_descriptor};
use crate::types::{DescriptorHandle, DescriptorKind, DescriptorLimit, ProbeStats};

/// Open descriptors in `[0, limit)`, ascending. Closed indices are simply absent.
pub fn probe(limit: &DescriptorLimit) -> Vec<DescriptorHandle> {
    probe_with_stats(limit).0
}

/// [`probe`] plus counts of what was skipped.
pub fn probe_with_stats(limit: &DescriptorLimit) -> (Vec<DescriptorHandle>, ProbeStats) {
    probe_in(&LiveDescriptors, limit)
}

/// Probe against any descriptor table.
///
/// EBADF means the index is closed and is expected. Any other per-index error is dropped
/// as well: the table can change under the scan and the reconciler re-validates anyway.
pub fn probe_in<S: DescriptorSource>(
    source: &S,
    limit: &DescriptorLimit,
) -> (Vec<DescriptorHandle>, ProbeStats) {
    let mut handles = Vec::new();
    let mut stats = ProbeStats::default();
    for index in limit.indices() {
        match source.stat(index) {
            Ok(st) => handles.push(DescriptorHandle {
                index,
                kind: DescriptorKind::from_mode(st.mode),
            }),
            Err(e) if is_bad_descriptor(&e) => stats.absent += 1,
            Err(e) => {
                trace!("fd {}: dropped after fstat error: {}", index, e);
                stats.other_errors += 1;
            }
        }
    }
    debug!(
        "Probed {} indices: {} open, {} closed, {} unreadable",
        limit.value,
        handles.len(),
        stats.absent,
        stats.other_errors
    );
    (handles, stats)
}

#[cfg(all(test, any(unix, windows)))]
mod tests {
    use super::*;
    use crate::sys::FdStat;
    use crate::types::{FdIndex, LimitSource};
    use std::collections::HashMap;
    use std::io;
    use std::path::Path;

    /// Fixed descriptor table; indices not in `open` answer EBADF, those in `broken` answer EIO.
    struct FakeTable {
        open: HashMap<FdIndex, u32>,
        broken: Vec<FdIndex>,
    }

    impl DescriptorSource for FakeTable {
        type Probe = ();

        fn stat(&self, index: FdIndex) -> io::Result<FdStat> {
            if self.broken.contains(&index) {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            self.open
                .get(&index)
                .map(|&mode| FdStat {
                    dev: 1,
                    ino: index as u64,
                    mode,
                })
                .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
        }

        fn open_probe(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn stat_probe(&self, _probe: &()) -> io::Result<FdStat> {
            Err(io::Error::from(io::ErrorKind::Unsupported))
        }

        unsafe fn close(&self, _index: FdIndex) -> io::Result<()> {
            Ok(())
        }
    }

    fn limit(value: u32) -> DescriptorLimit {
        DescriptorLimit {
            value,
            source: LimitSource::HardRlimit,
            capped: false,
        }
    }

    #[test]
    fn test_probe_skips_closed_and_classifies() {
        let table = FakeTable {
            open: HashMap::from([(0, 0o020_620), (1, 0o010_600), (5, 0o100_644)]),
            broken: vec![],
        };
        let (handles, stats) = probe_in(&table, &limit(8));
        assert_eq!(
            handles,
            vec![
                DescriptorHandle {
                    index: 0,
                    kind: DescriptorKind::Char
                },
                DescriptorHandle {
                    index: 1,
                    kind: DescriptorKind::Fifo
                },
                DescriptorHandle {
                    index: 5,
                    kind: DescriptorKind::Regular
                },
            ]
        );
        assert_eq!(stats.absent, 5);
        assert_eq!(stats.other_errors, 0);
    }

    #[test]
    fn test_probe_never_returns_index_at_or_above_limit() {
        let table = FakeTable {
            open: HashMap::from([(2, 0o100_644), (3, 0o100_644), (4, 0o100_644)]),
            broken: vec![],
        };
        let (handles, _) = probe_in(&table, &limit(4));
        assert!(handles.iter().all(|h| (0..4).contains(&h.index)));
        assert_eq!(handles.len(), 2);
    }

    #[test]
    fn test_probe_absorbs_other_errors() {
        let table = FakeTable {
            open: HashMap::from([(0, 0o100_644), (2, 0o100_644)]),
            broken: vec![1],
        };
        let (handles, stats) = probe_in(&table, &limit(3));
        assert_eq!(
            handles.iter().map(|h| h.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(stats.other_errors, 1);
    }

    #[test]
    fn test_probe_zero_limit_is_empty() {
        let table = FakeTable {
            open: HashMap::from([(0, 0o100_644)]),
            broken: vec![],
        };
        let (handles, stats) = probe_in(&table, &limit(0));
        assert!(handles.is_empty());
        assert_eq!(stats, ProbeStats::default());
    }

    #[test]
    fn test_probe_unknown_mode_is_kept() {
        let table = FakeTable {
            open: HashMap::from([(0, 0o000_644)]),
            broken: vec![],
        };
        let (handles, _) = probe_in(&table, &limit(1));
        assert_eq!(handles[0].kind, DescriptorKind::Unknown(0o644));
    }
}
