//! Descriptor limit detection: the exclusive upper bound for the raw descriptor scan.

use log::debug;

use crate::error::FdError;
use crate::types::{DescriptorLimit, LimitKind, LimitSource};
use crate::utils::config::MAX_SCAN_LIMIT;

/// Hard `RLIMIT_NOFILE`, clamped to [`MAX_SCAN_LIMIT`].
pub fn resolve_limit() -> crate::Result<DescriptorLimit> {
    resolve_limit_with(LimitKind::Hard, MAX_SCAN_LIMIT)
}

/// Resolve the scan bound from the chosen rlimit, clamping unlimited or huge values to `max_scan`.
#[cfg(unix)]
pub fn resolve_limit_with(kind: LimitKind, max_scan: u32) -> crate::Result<DescriptorLimit> {
    let (soft, hard) = rlimit_nofile()?;
    debug!(
        "Open file limits: soft={}, hard={}",
        display_rlim(soft),
        display_rlim(hard)
    );
    let limit = match kind {
        LimitKind::Hard => clamp_limit(hard, max_scan, LimitSource::HardRlimit),
        LimitKind::Soft => clamp_limit(soft, max_scan, LimitSource::SoftRlimit),
    };
    if limit.capped {
        debug!("Scan bound capped at {}", limit.value);
    }
    Ok(limit)
}

/// Windows has no hard ceiling we can read; `_getmaxstdio` is the C runtime's soft cap on
/// stdio-level descriptors and undercounts kernel handle capacity.
#[cfg(windows)]
pub fn resolve_limit_with(_kind: LimitKind, max_scan: u32) -> crate::Result<DescriptorLimit> {
    unsafe extern "C" {
        fn _getmaxstdio() -> std::ffi::c_int;
    }
    let max = unsafe { _getmaxstdio() };
    if max < 0 {
        return Err(FdError::ResourceQuery {
            what: "_getmaxstdio",
            source: std::io::Error::last_os_error(),
        });
    }
    debug!("C runtime max stdio: {}", max);
    Ok(clamp_limit(
        Some(max as u64),
        max_scan,
        LimitSource::MaxStdio,
    ))
}

#[cfg(not(any(unix, windows)))]
pub fn resolve_limit_with(_kind: LimitKind, _max_scan: u32) -> crate::Result<DescriptorLimit> {
    Err(FdError::ResourceQuery {
        what: "resource limits",
        source: std::io::Error::from(std::io::ErrorKind::Unsupported),
    })
}

/// `(soft, hard)` for `RLIMIT_NOFILE`; `None` means unlimited.
#[cfg(unix)]
pub fn rlimit_nofile() -> crate::Result<(Option<u64>, Option<u64>)> {
    use std::mem::MaybeUninit;
    let mut rlim = MaybeUninit::<libc::rlimit>::uninit();
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, rlim.as_mut_ptr()) } != 0 {
        return Err(FdError::ResourceQuery {
            what: "getrlimit(RLIMIT_NOFILE)",
            source: std::io::Error::last_os_error(),
        });
    }
    let rlim = unsafe { rlim.assume_init() };
    Ok((finite(rlim.rlim_cur), finite(rlim.rlim_max)))
}

#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
fn finite(value: libc::rlim_t) -> Option<u64> {
    // RLIM_INFINITY is typically !0 or u64::MAX; treat as "no practical limit"
    if value == libc::RLIM_INFINITY || value as u64 > i64::MAX as u64 {
        None
    } else {
        Some(value as u64)
    }
}

#[cfg(unix)]
fn display_rlim(value: Option<u64>) -> String {
    value.map_or_else(|| "unlimited".to_string(), |v| v.to_string())
}

/// Turn a raw OS limit (`None` = unlimited) into a scan bound no larger than `max_scan`.
pub fn clamp_limit(raw: Option<u64>, max_scan: u32, source: LimitSource) -> DescriptorLimit {
    match raw {
        Some(v) if v <= u64::from(max_scan) => DescriptorLimit {
            value: v as u32,
            source,
            capped: false,
        },
        _ => DescriptorLimit {
            value: max_scan,
            source,
            capped: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_within_cap() {
        let limit = clamp_limit(Some(1024), MAX_SCAN_LIMIT, LimitSource::HardRlimit);
        assert_eq!(limit.value, 1024);
        assert!(!limit.capped);
        assert_eq!(limit.source, LimitSource::HardRlimit);
    }

    #[test]
    fn test_clamp_limit_unlimited_uses_cap() {
        let limit = clamp_limit(None, 4096, LimitSource::SoftRlimit);
        assert_eq!(limit.value, 4096);
        assert!(limit.capped);
    }

    #[test]
    fn test_clamp_limit_above_cap() {
        let limit = clamp_limit(Some(u64::from(MAX_SCAN_LIMIT) + 1), MAX_SCAN_LIMIT, LimitSource::HardRlimit);
        assert_eq!(limit.value, MAX_SCAN_LIMIT);
        assert!(limit.capped);
    }

    #[test]
    fn test_clamp_limit_exactly_cap_is_not_capped() {
        let limit = clamp_limit(Some(256), 256, LimitSource::HardRlimit);
        assert_eq!(limit.value, 256);
        assert!(!limit.capped);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_limit_soft_not_above_hard() {
        let soft = resolve_limit_with(LimitKind::Soft, MAX_SCAN_LIMIT).unwrap();
        let hard = resolve_limit_with(LimitKind::Hard, MAX_SCAN_LIMIT).unwrap();
        assert!(soft.value > 0);
        assert!(soft.value <= hard.value);
    }
}
