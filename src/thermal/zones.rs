//! CPU/SoC sensors: sysfs thermal zones, with sysinfo components as fallback

use log::{debug, warn};
use std::fs;
use std::path::Path;

use super::TemperatureReading;
use crate::error::ThermalError;
use crate::utils::config::ThermalConsts;

const ZONE_PREFIX: &str = "thermal_zone";

/// Read every `thermal_zoneN` under `root` (normally `/sys/class/thermal`), ordered by N.
/// `type` becomes the label, `temp` is millidegrees Celsius. A zone that cannot be read or
/// parsed is skipped with a warning.
pub fn read_thermal_zones(root: &Path) -> Result<Vec<TemperatureReading>, ThermalError> {
    let entries = fs::read_dir(root).map_err(|_| ThermalError::NotAvailable {
        path: root.display().to_string(),
    })?;

    let mut zones: Vec<(u32, std::path::PathBuf)> = entries
        .flatten()
        .filter_map(|e| {
            let n = e
                .file_name()
                .to_str()?
                .strip_prefix(ZONE_PREFIX)?
                .parse::<u32>()
                .ok()?;
            Some((n, e.path()))
        })
        .collect();
    zones.sort_by_key(|(n, _)| *n);

    let mut readings = Vec::with_capacity(zones.len());
    for (_, dir) in zones {
        match read_zone(&dir) {
            Ok(reading) => readings.push(reading),
            Err(e) => warn!("Skipping thermal zone: {}", e),
        }
    }
    debug!("{}: {} thermal zones", root.display(), readings.len());
    Ok(readings)
}

/// Some zones exist but never answer (ENODATA from an idle radio, for one).
fn read_zone(dir: &Path) -> Result<TemperatureReading, ThermalError> {
    let temp_path = dir.join("temp");
    let raw = read_trimmed(&temp_path)?;
    let millis: f64 = raw.parse().map_err(|_| ThermalError::ParseError {
        path: temp_path.display().to_string(),
        detail: format!("not a number: {raw:?}"),
    })?;
    Ok(TemperatureReading {
        label: read_trimmed(&dir.join("type"))?,
        celsius: millis / ThermalConsts::MILLIDEGREES_PER_DEGREE,
    })
}

fn read_trimmed(path: &Path) -> Result<String, ThermalError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| ThermalError::ReadError {
            path: path.display().to_string(),
            source,
        })
}

/// Sensors sysinfo knows about (hwmon on Linux, SMC on macOS, WMI on Windows).
pub fn read_components() -> Vec<TemperatureReading> {
    let components = sysinfo::Components::new_with_refreshed_list();
    components
        .list()
        .iter()
        .filter_map(|c| {
            c.temperature().map(|t| TemperatureReading {
                label: c.label().to_string(),
                celsius: f64::from(t),
            })
        })
        .collect()
}
