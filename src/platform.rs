//! Host facts outside the descriptor pipeline.

use log::debug;

/// Number of effective CPUs.
///
/// Online processors from `sysconf` on unix, then `NUMBER_OF_PROCESSORS` (Windows), then the
/// CPU list from sysinfo, then 1.
pub fn detect_ncpus() -> usize {
    if let Some(n) = sysconf_online_cpus() {
        return n;
    }
    if let Some(n) = std::env::var("NUMBER_OF_PROCESSORS")
        .ok()
        .and_then(|v| parse_positive(&v))
    {
        return n;
    }
    let mut sys = sysinfo::System::new();
    sys.refresh_cpu_all();
    let n = sys.cpus().len();
    if n > 0 {
        return n;
    }
    debug!("CPU count unavailable; assuming 1");
    1
}

#[cfg(unix)]
fn sysconf_online_cpus() -> Option<usize> {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    usize::try_from(n).ok().filter(|&n| n > 0)
}

#[cfg(not(unix))]
fn sysconf_online_cpus() -> Option<usize> {
    None
}

fn parse_positive(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|&n| n > 0)
}
