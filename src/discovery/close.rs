//! Best-effort release of reconciled descriptors.

use log::{debug, warn};

use crate::sys::{DescriptorSource, LiveDescriptors};
use crate::types::{CloseOutcome, CloseReport, ReconciledEntry};

/// Close every entry's descriptor, one attempt each. A failure is logged and reported for
/// that entry only; the rest are still attempted. Entries are tried in the given order and
/// a repeated index is tried again (and will normally fail with EBADF).
///
/// # Safety
///
/// Closing a descriptor still owned by something else in the process (a `File`, the logger,
/// the standard streams) violates I/O safety: a later use or drop may hit a reused index.
/// The caller must make sure none of these indices are used again after this call.
pub unsafe fn close_all(entries: impl IntoIterator<Item = ReconciledEntry>) -> Vec<CloseReport> {
    unsafe { close_all_in(&LiveDescriptors, entries) }
}

/// [`close_all`] against any descriptor table.
///
/// # Safety
///
/// As for [`close_all`].
pub unsafe fn close_all_in<S: DescriptorSource>(
    source: &S,
    entries: impl IntoIterator<Item = ReconciledEntry>,
) -> Vec<CloseReport> {
    let reports: Vec<CloseReport> = entries
        .into_iter()
        .map(|entry| {
            let outcome = match unsafe { source.close(entry.index) } {
                Ok(()) => CloseOutcome::Closed,
                Err(e) => {
                    warn!(
                        "fd={} pointing at {} cannot be closed ({}); skipping it",
                        entry.index,
                        entry.path.display(),
                        e
                    );
                    CloseOutcome::Failed(e)
                }
            };
            CloseReport { entry, outcome }
        })
        .collect();
    debug!(
        "Closed {} of {} descriptors",
        reports.iter().filter(|r| r.outcome.is_closed()).count(),
        reports.len()
    );
    reports
}
