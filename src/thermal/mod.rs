//! Temperature polling: CPU/SoC zones, optional disks, periodic logging.

pub mod logfile;
pub mod smartctl;
pub mod zones;

pub use logfile::{TemperatureLog, format_row};
pub use smartctl::{parse_smartctl_temperature, read_disk_temperature};
pub use zones::{read_components, read_thermal_zones};

use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ThermalError;
use crate::types::ThermalOpts;
use crate::utils::config::ThermalConsts;

/// One sensor value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub label: String,
    pub celsius: f64,
}

/// Sample every configured source once: sysfs zones (or sysinfo components when the sysfs
/// root is missing or yields nothing), then each disk. A disk that cannot be read is skipped
/// with a warning.
pub fn sample(opts: &ThermalOpts) -> Result<Vec<TemperatureReading>, ThermalError> {
    let mut readings = cpu_readings(&opts.sysfs_root, read_components)?;
    for disk in &opts.disks {
        match read_disk_temperature(disk) {
            Ok(r) => readings.push(r),
            Err(e) => warn!("{}: {}", disk, e),
        }
    }
    Ok(readings)
}

fn cpu_readings<F>(root: &Path, fallback: F) -> Result<Vec<TemperatureReading>, ThermalError>
where
    F: FnOnce() -> Vec<TemperatureReading>,
{
    match read_thermal_zones(root) {
        Ok(r) if !r.is_empty() => Ok(r),
        Ok(_) => {
            debug!("{}: no readable zones; using sysinfo components", root.display());
            Ok(fallback())
        }
        Err(ThermalError::NotAvailable { path }) => {
            debug!("{} missing; using sysinfo components", path);
            Ok(fallback())
        }
        Err(e) => Err(e),
    }
}

/// Sample, append to the log and hand each sample to `on_sample` every `interval_secs` until
/// `stop` is set. Returns the number of samples written.
pub fn watch<F>(opts: &ThermalOpts, stop: &Arc<AtomicBool>, mut on_sample: F) -> anyhow::Result<usize>
where
    F: FnMut(&[TemperatureReading]),
{
    let log = TemperatureLog::new(&opts.log_path);
    let interval = Duration::from_secs(opts.interval_secs.max(1));
    let step = Duration::from_millis(ThermalConsts::STOP_POLL_MS);
    info!(
        "Logging temperatures to {} every {}s (Ctrl-C to stop)",
        log.path().display(),
        interval.as_secs()
    );

    let mut samples = 0_usize;
    while !stop.load(Ordering::SeqCst) {
        let readings = sample(opts)?;
        log.append(chrono::Local::now().naive_local(), &readings)?;
        on_sample(&readings);
        samples += 1;

        let started = Instant::now();
        while started.elapsed() < interval && !stop.load(Ordering::SeqCst) {
            std::thread::sleep(step.min(interval.saturating_sub(started.elapsed())));
        }
    }
    debug!("Stopped after {} samples", samples);
    Ok(samples)
}
