//! Disk temperature via smartctl

use log::debug;
use std::process::Command;

use super::TemperatureReading;
use crate::error::ThermalError;

const SMARTCTL: &str = "smartctl";

/// Column of RAW_VALUE in the SMART attribute table.
const RAW_VALUE_COLUMN: usize = 9;

/// Query `/dev/<device>` through a SAT bridge (`smartctl -a /dev/sdX -d sat`).
pub fn read_disk_temperature(device: &str) -> Result<TemperatureReading, ThermalError> {
    let dev_path = format!("/dev/{device}");
    let output = Command::new(SMARTCTL)
        .args(["-a", &dev_path, "-d", "sat"])
        .output()
        .map_err(|source| ThermalError::Command {
            tool: SMARTCTL,
            source,
        })?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let celsius = parse_smartctl_temperature(&stdout).ok_or_else(|| ThermalError::ParseError {
        path: dev_path.clone(),
        detail: format!("no temperature in smartctl output (exit {})", output.status),
    })?;
    debug!("{}: {} C", dev_path, celsius);
    Ok(TemperatureReading {
        label: device.to_string(),
        celsius,
    })
}

/// First line mentioning `Temperature` that yields a number: its last token (`Current Drive
/// Temperature: 35 C` style lines end in a unit, so the token before it is tried too), else
/// the RAW_VALUE column of an attribute row (`194 Temperature_Celsius ... 35 (Min/Max 20/45)`).
pub fn parse_smartctl_temperature(output: &str) -> Option<f64> {
    output
        .lines()
        .filter(|line| line.contains("Temperature"))
        .find_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let last = tokens.last()?;
            last.parse::<f64>()
                .ok()
                .or_else(|| {
                    (tokens.len() >= 2 && *last == "C")
                        .then(|| tokens[tokens.len() - 2].parse().ok())
                        .flatten()
                })
                .or_else(|| tokens.get(RAW_VALUE_COLUMN)?.parse().ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute_row_last_token() {
        let out = "ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE\n\
                   194 Temperature_Celsius     0x0022   036   052   000    Old_age   Always       -       36\n";
        assert_eq!(parse_smartctl_temperature(out), Some(36.0));
    }

    #[test]
    fn test_parse_attribute_row_with_min_max_suffix() {
        let out = "194 Temperature_Celsius     0x0022   035   045   000    Old_age   Always       -       35 (Min/Max 20/45)\n";
        assert_eq!(parse_smartctl_temperature(out), Some(35.0));
    }

    #[test]
    fn test_parse_scsi_style_line() {
        let out = "Current Drive Temperature:     41 C\nDrive Trip Temperature:        65 C\n";
        assert_eq!(parse_smartctl_temperature(out), Some(41.0));
    }

    #[test]
    fn test_parse_no_temperature() {
        assert_eq!(parse_smartctl_temperature("Device Model: X\n"), None);
    }
}
