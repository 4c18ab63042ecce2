//! Load `.fdrecon.toml` (CLI only). Lib does not use this; the consuming program passes
//! DiscoverOpts directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::{LimitKind, Opts};
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FdreconToml {
    #[serde(default)]
    settings: SettingsSection,
    #[serde(default)]
    thermal: ThermalSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    limit: Option<LimitKind>,
    max_scan: Option<u32>,
    json: Option<bool>,
    verbose: Option<bool>,
    log_file: Option<String>,
    include_stdio: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ThermalSection {
    interval_secs: Option<u64>,
    log_path: Option<String>,
    disks: Option<Vec<String>>,
    sysfs_root: Option<String>,
}

/// Config file location: `$FDRECON_CONFIG` if set, else `.fdrecon.toml` in `dir`.
pub(crate) fn config_path(dir: &Path) -> PathBuf {
    let paths = PackagePaths::get();
    std::env::var_os(paths.config_env_var())
        .map(PathBuf::from)
        .unwrap_or_else(|| dir.join(paths.config_filename()))
}

/// Load the config file if present. Returns None if missing or unreadable. CLI only.
pub(crate) fn load_fdrecon_toml(path: &Path) -> Option<FdreconToml> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_fdrecon_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_fdrecon_toml(s: &str) -> Result<FdreconToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &FdreconToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(s, opts, limit => limit);
    apply_file_opt!(s, opts, max_scan => max_scan);
    apply_file_opt!(s, opts, json => json);
    apply_file_opt!(s, opts, verbose => verbose);
    apply_file_opt!(s, opts, include_stdio => include_stdio);
    if let Some(ref p) = s.log_file {
        opts.log_file = Some(PathBuf::from(p));
    }

    let t = &file.thermal;
    apply_file_opt!(t, opts.thermal, interval_secs => interval_secs);
    if let Some(ref p) = t.log_path {
        opts.thermal.log_path = PathBuf::from(p);
    }
    if let Some(ref v) = t.disks {
        opts.thermal.disks = v.clone();
    }
    if let Some(ref p) = t.sysfs_root {
        opts.thermal.sysfs_root = PathBuf::from(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_present_fields() {
        let file = parse_fdrecon_toml(
            r#"
            [settings]
            limit = "soft"
            max_scan = 2048

            [thermal]
            interval_secs = 10
            disks = ["sda", "sdb"]
            "#,
        )
        .unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.limit, LimitKind::Soft);
        assert_eq!(opts.max_scan, 2048);
        assert!(!opts.json);
        assert_eq!(opts.log_file, None);
        assert_eq!(opts.thermal.interval_secs, 10);
        assert_eq!(opts.thermal.disks, vec!["sda".to_string(), "sdb".to_string()]);
        assert_eq!(
            opts.thermal.log_path,
            Opts::default().thermal.log_path
        );
    }

    #[test]
    fn test_empty_file_changes_nothing() {
        let file = parse_fdrecon_toml("").unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.max_scan, Opts::default().max_scan);
        assert_eq!(opts.limit, LimitKind::Hard);
    }

    #[test]
    fn test_bad_limit_value_is_rejected() {
        assert!(parse_fdrecon_toml("[settings]\nlimit = \"sideways\"\n").is_err());
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_fdrecon_toml(&tmp.path().join(".fdrecon.toml")).is_none());
    }
}
