//! Descriptor discovery pipeline: limit → probe, open-file listing → reconcile → (close).
//!
//! Everything here is a point-in-time view of a table the process keeps changing; nothing is
//! cached between calls.

pub mod close;
pub mod limit;
pub mod probe;
pub mod reconcile;

pub use close::{close_all, close_all_in};
pub use limit::{clamp_limit, resolve_limit, resolve_limit_with};
pub use probe::{probe, probe_in, probe_with_stats};
pub use reconcile::{reconcile, reconcile_in, reconcile_with_stats};

use log::debug;
use serde::Serialize;
use std::collections::HashSet;

use crate::introspect::list_open_files;
use crate::sys::LiveDescriptors;
use crate::types::{
    CloseReport, DescriptorHandle, DescriptorLimit, DiscoverOpts, FdIndex, OpenFileRecord,
    ProbeStats, ReconcileStats, ReconciledEntry,
};
use crate::utils::config::STDIO_COUNT;

/// Everything one pipeline run observed.
#[derive(Clone, Debug, Serialize)]
pub struct Discovery {
    pub limit: DescriptorLimit,
    pub handles: Vec<DescriptorHandle>,
    pub records: Vec<OpenFileRecord>,
    pub entries: Vec<ReconciledEntry>,
    pub probe_stats: ProbeStats,
    pub reconcile_stats: ReconcileStats,
}

/// Run the full pipeline once for the calling process.
///
/// The open-file listing is taken first, then the limit and the raw probe, then the two are
/// reconciled. A failed limit or listing query is fatal; per-descriptor races are not.
pub fn discover(opts: &DiscoverOpts) -> crate::Result<Discovery> {
    let records = list_open_files()?;
    debug!("OS lists {} open regular files", records.len());

    let limit = resolve_limit_with(opts.limit, opts.max_scan)?;
    let (handles, probe_stats) = probe_in(&LiveDescriptors, &limit);
    let (entries, reconcile_stats) = reconcile_in(&LiveDescriptors, &records, &handles)?;

    Ok(Discovery {
        limit,
        handles,
        records,
        entries,
        probe_stats,
        reconcile_stats,
    })
}

/// Index → path mapping with default options.
pub fn mapped_descriptors() -> crate::Result<Vec<ReconciledEntry>> {
    discover(&DiscoverOpts::default()).map(|d| d.entries)
}

/// Which reconciled descriptors [`clean_up`] must leave alone.
#[derive(Clone, Debug, Default)]
pub struct CleanupOpts {
    /// Also close stdin/stdout/stderr.
    pub include_stdio: bool,
    /// Indices never closed (e.g. the log file).
    pub keep: Vec<FdIndex>,
}

impl CleanupOpts {
    /// Drop kept indices, stdio (unless included) and repeated indices.
    pub fn select(&self, entries: Vec<ReconciledEntry>) -> Vec<ReconciledEntry> {
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|e| self.include_stdio || e.index >= STDIO_COUNT)
            .filter(|e| !self.keep.contains(&e.index))
            .filter(|e| seen.insert(e.index))
            .collect()
    }
}

/// Discover and close every mapped descriptor that `cleanup` allows.
///
/// # Safety
///
/// Every selected descriptor is closed behind the back of whatever owns it. The caller must
/// guarantee that nothing in the process uses those descriptors afterwards; list any it still
/// needs in [`CleanupOpts::keep`].
pub unsafe fn clean_up(
    opts: &DiscoverOpts,
    cleanup: &CleanupOpts,
) -> crate::Result<Vec<CloseReport>> {
    let entries = cleanup.select(discover(opts)?.entries);
    debug!("Closing {} descriptors", entries.len());
    Ok(unsafe { close_all(entries) })
}
