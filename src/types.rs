//! Public and internal types for the fdrecon API and pipeline.

use serde::Serialize;
use std::io;
use std::path::PathBuf;

use crate::utils::config::{MAX_SCAN_LIMIT, ThermalConsts};

/// Descriptor index as the OS hands it out (`c_int`).
pub type FdIndex = i32;

// File type bits of `st_mode`. Spelled out instead of taken from libc because
// `mode_t` differs in width across targets and some types only exist on one OS.
const S_IFMT: u32 = 0o170_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFIFO: u32 = 0o010_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFREG: u32 = 0o100_000;
const S_IFSOCK: u32 = 0o140_000;
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
const S_IFDOOR: u32 = 0o150_000;
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
const S_IFPORT: u32 = 0o160_000;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
const S_IFWHT: u32 = 0o160_000;

/// What an open descriptor refers to, classified from its `st_mode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Block,
    Char,
    Dir,
    /// Solaris door.
    Door,
    Fifo,
    Symlink,
    /// Solaris event port.
    EventPort,
    Regular,
    Socket,
    /// BSD union-mount whiteout.
    Whiteout,
    /// No known type matched; carries the raw mode for diagnostics.
    Unknown(u32),
}

impl DescriptorKind {
    /// Ordered classification table; the first entry whose type bits match wins.
    /// Types the target OS does not have map to `None` and never match.
    const TABLE: [(DescriptorKind, Option<u32>); 10] = [
        (DescriptorKind::Block, Some(S_IFBLK)),
        (DescriptorKind::Char, Some(S_IFCHR)),
        (DescriptorKind::Dir, Some(S_IFDIR)),
        (DescriptorKind::Door, DOOR_BITS),
        (DescriptorKind::Fifo, Some(S_IFIFO)),
        (DescriptorKind::Symlink, Some(S_IFLNK)),
        (DescriptorKind::EventPort, PORT_BITS),
        (DescriptorKind::Regular, Some(S_IFREG)),
        (DescriptorKind::Socket, Some(S_IFSOCK)),
        (DescriptorKind::Whiteout, WHITEOUT_BITS),
    ];

    /// Classify raw `st_mode` bits.
    pub fn from_mode(mode: u32) -> Self {
        let file_type = mode & S_IFMT;
        Self::TABLE
            .iter()
            .find(|(_, bits)| *bits == Some(file_type))
            .map(|(kind, _)| *kind)
            .unwrap_or(DescriptorKind::Unknown(mode))
    }

    /// Short label used in reports (`REG`, `CHR`, ...). Unknown kinds print their raw mode.
    pub fn label(&self) -> String {
        match self {
            DescriptorKind::Block => "BLK".into(),
            DescriptorKind::Char => "CHR".into(),
            DescriptorKind::Dir => "DIR".into(),
            DescriptorKind::Door => "DOOR".into(),
            DescriptorKind::Fifo => "FIFO".into(),
            DescriptorKind::Symlink => "LNK".into(),
            DescriptorKind::EventPort => "PORT".into(),
            DescriptorKind::Regular => "REG".into(),
            DescriptorKind::Socket => "SOCK".into(),
            DescriptorKind::Whiteout => "WHT".into(),
            DescriptorKind::Unknown(mode) => format!("{mode:o}"),
        }
    }
}

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
const DOOR_BITS: Option<u32> = Some(S_IFDOOR);
#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
const DOOR_BITS: Option<u32> = None;

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
const PORT_BITS: Option<u32> = Some(S_IFPORT);
#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
const PORT_BITS: Option<u32> = None;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
const WHITEOUT_BITS: Option<u32> = Some(S_IFWHT);
#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
const WHITEOUT_BITS: Option<u32> = None;

/// A descriptor index that was open when it was probed. Only valid at that instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DescriptorHandle {
    pub index: FdIndex,
    pub kind: DescriptorKind,
}

/// The OS's own claim about an open file of this process.
///
/// `reported_index` is a hint only: `None` means the OS could not say (common on Windows),
/// and even a present value is never used to build the mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenFileRecord {
    pub path: PathBuf,
    pub reported_index: Option<FdIndex>,
}

/// A live descriptor index attributed to a path by the identity check.
/// One path may appear against several indices (dup'ed descriptors).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReconciledEntry {
    pub index: FdIndex,
    pub path: PathBuf,
}

/// Which resource limit to bound the scan with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    /// Hard `RLIMIT_NOFILE` (the OS ceiling).
    #[default]
    Hard,
    /// Soft `RLIMIT_NOFILE` (what this process can currently open).
    Soft,
}

/// Where a [`DescriptorLimit`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    HardRlimit,
    SoftRlimit,
    /// Windows C runtime `_getmaxstdio()`: a soft, reconfigurable cap.
    MaxStdio,
}

/// Exclusive upper bound on descriptor indices: the scan covers `[0, value)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DescriptorLimit {
    pub value: u32,
    pub source: LimitSource,
    /// True when the OS value was unlimited or above the scan cap and got clamped.
    pub capped: bool,
}

impl DescriptorLimit {
    /// Indices covered by the scan.
    pub fn indices(&self) -> std::ops::Range<FdIndex> {
        // value is clamped to the scan cap, far below FdIndex::MAX
        0..FdIndex::try_from(self.value).unwrap_or(FdIndex::MAX)
    }
}

/// Counters for per-index conditions the prober absorbed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProbeStats {
    /// Indices that answered EBADF (closed).
    pub absent: usize,
    /// Indices that failed with some other OS error and were dropped.
    pub other_errors: usize,
}

/// Counters for per-record conditions the reconciler absorbed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Records whose path no longer existed at reopen time.
    pub path_vanished: usize,
    /// Records whose comparison pass stopped early because a descriptor stopped answering.
    pub identity_unavailable: usize,
}

/// Outcome of one close attempt.
#[derive(Debug)]
pub enum CloseOutcome {
    Closed,
    Failed(io::Error),
}

impl CloseOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, CloseOutcome::Closed)
    }
}

/// One entry handed to the closer and what happened to it.
#[derive(Debug)]
pub struct CloseReport {
    pub entry: ReconciledEntry,
    pub outcome: CloseOutcome,
}

/// Lib-only options for [`discover`](crate::discover).
#[derive(Clone, Copy, Debug)]
pub struct DiscoverOpts {
    /// Which rlimit bounds the scan (ignored on Windows).
    pub limit: LimitKind,
    /// Upper clamp for the scan when the OS limit is unlimited or huge.
    pub max_scan: u32,
}

impl Default for DiscoverOpts {
    fn default() -> Self {
        Self {
            limit: LimitKind::Hard,
            max_scan: MAX_SCAN_LIMIT,
        }
    }
}

impl From<&Opts> for DiscoverOpts {
    fn from(o: &Opts) -> Self {
        DiscoverOpts {
            limit: o.limit,
            max_scan: o.max_scan,
        }
    }
}

/// Temperature sampling options (CLI `temps`).
#[derive(Clone, Debug)]
pub struct ThermalOpts {
    /// Seconds between samples in watch mode.
    pub interval_secs: u64,
    /// Tab-separated log appended to in watch mode.
    pub log_path: PathBuf,
    /// Block devices (e.g. `sda`) to query through smartctl.
    pub disks: Vec<String>,
    /// Root holding `thermal_zoneN` directories.
    pub sysfs_root: PathBuf,
    /// Keep sampling until Ctrl-C.
    pub watch: bool,
}

impl Default for ThermalOpts {
    fn default() -> Self {
        Self {
            interval_secs: ThermalConsts::DEFAULT_INTERVAL_SECS,
            log_path: PathBuf::from(ThermalConsts::DEFAULT_LOG_FILENAME),
            disks: Vec::new(),
            sysfs_root: PathBuf::from(ThermalConsts::SYSFS_THERMAL_ROOT),
            watch: false,
        }
    }
}

/// Full options (CLI). Use [`DiscoverOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Which rlimit bounds the scan.
    pub limit: LimitKind,
    /// Upper clamp for the scan.
    pub max_scan: u32,
    /// Debug logging for this crate.
    pub verbose: bool,
    /// Print reports as JSON instead of text.
    pub json: bool,
    /// Also write log lines to this file (it then shows up as one of our own descriptors).
    pub log_file: Option<PathBuf>,
    /// Let cleanup close stdin/stdout/stderr too.
    pub include_stdio: bool,
    /// Files to open before discovery so the mapping has something to show.
    pub hold: Vec<PathBuf>,
    pub thermal: ThermalOpts,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            limit: LimitKind::Hard,
            max_scan: MAX_SCAN_LIMIT,
            verbose: false,
            json: false,
            log_file: None,
            include_stdio: false,
            hold: Vec::new(),
            thermal: ThermalOpts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mode_common_types() {
        assert_eq!(DescriptorKind::from_mode(0o100_644), DescriptorKind::Regular);
        assert_eq!(DescriptorKind::from_mode(0o040_755), DescriptorKind::Dir);
        assert_eq!(DescriptorKind::from_mode(0o020_620), DescriptorKind::Char);
        assert_eq!(DescriptorKind::from_mode(0o060_660), DescriptorKind::Block);
        assert_eq!(DescriptorKind::from_mode(0o010_600), DescriptorKind::Fifo);
        assert_eq!(DescriptorKind::from_mode(0o120_777), DescriptorKind::Symlink);
        assert_eq!(DescriptorKind::from_mode(0o140_777), DescriptorKind::Socket);
    }

    #[test]
    fn test_from_mode_unknown_keeps_raw_mode() {
        assert_eq!(DescriptorKind::from_mode(0o644), DescriptorKind::Unknown(0o644));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_from_mode_platform_only_types_do_not_match_on_linux() {
        assert_eq!(
            DescriptorKind::from_mode(0o160_000),
            DescriptorKind::Unknown(0o160_000)
        );
        assert_eq!(
            DescriptorKind::from_mode(0o150_000),
            DescriptorKind::Unknown(0o150_000)
        );
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_from_mode_whiteout_on_macos() {
        assert_eq!(DescriptorKind::from_mode(0o160_000), DescriptorKind::Whiteout);
    }

    #[test]
    fn test_labels() {
        assert_eq!(DescriptorKind::Regular.label(), "REG");
        assert_eq!(DescriptorKind::Unknown(0o644).label(), "644");
    }

    #[test]
    fn test_limit_indices_are_exclusive() {
        let limit = DescriptorLimit {
            value: 4,
            source: LimitSource::HardRlimit,
            capped: false,
        };
        assert_eq!(limit.indices().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }
}
