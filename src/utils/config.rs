//! Application configuration constants.
//! Limits and file names in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    config_env_var: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                config_env_var: format!("{}_CONFIG", pkg.to_uppercase()),
            }
        })
    }

    /// Crate name; also the module filter for logging.
    pub fn pkg_name(&self) -> &'static str {
        self.pkg_name
    }

    /// Config file looked up in the working directory (`.fdrecon.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Env var that overrides the config file location (`FDRECON_CONFIG`).
    pub fn config_env_var(&self) -> &str {
        &self.config_env_var
    }
}

// ---- Descriptor scan ----

/// Upper clamp for the descriptor scan when the OS limit is unlimited or very large.
///
/// 0x100000 matches the usual Linux `fs.nr_open` default; scanning further only burns
/// syscalls on indices the kernel will never hand out.
pub const MAX_SCAN_LIMIT: u32 = 0x0010_0000;

/// Descriptors 0..STDIO_COUNT are stdin, stdout and stderr.
pub const STDIO_COUNT: i32 = 3;

// ---- Thermal ----

/// Temperature sampling defaults.
pub struct ThermalConsts;

impl ThermalConsts {
    /// Seconds between samples in watch mode.
    pub const DEFAULT_INTERVAL_SECS: u64 = 5;
    /// Default log file for watch mode.
    pub const DEFAULT_LOG_FILENAME: &'static str = "temp_log.txt";
    /// Linux sysfs thermal class.
    pub const SYSFS_THERMAL_ROOT: &'static str = "/sys/class/thermal";
    /// sysfs reports millidegrees Celsius.
    pub const MILLIDEGREES_PER_DEGREE: f64 = 1000.0;
    /// Granularity of the watch loop's sleep so Ctrl-C is noticed promptly (ms).
    pub const STOP_POLL_MS: u64 = 200;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_paths_derive_from_pkg_name() {
        let paths = PackagePaths::get();
        assert_eq!(paths.pkg_name(), "fdrecon");
        assert_eq!(paths.config_filename(), ".fdrecon.toml");
        assert_eq!(paths.config_env_var(), "FDRECON_CONFIG");
    }
}
