//! Configuration vault – reads/writes `domino.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use domino_types::DominoConfig;

use crate::error::CliError;

pub const DEFAULT_CONFIG_FILE: &str = "domino.toml";

/// `--config` wins, then `DOMINO_CONFIG`, then `./domino.toml`.
pub fn config_path(cli_path: Option<&Path>) -> PathBuf {
    config_path_from(cli_path, std::env::var("DOMINO_CONFIG").ok())
}

pub(crate) fn config_path_from(cli_path: Option<&Path>, env_path: Option<String>) -> PathBuf {
    if let Some(p) = cli_path {
        return p.to_path_buf();
    }
    match env_path {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Parse the file without environment overrides. `None` if it does not exist.
pub(crate) fn read_from(path: &Path) -> Result<Option<DominoConfig>, CliError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = toml::from_str(&raw).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cfg))
}

/// Load from `path` and apply environment overrides.
pub fn load_from(path: &Path) -> Result<Option<DominoConfig>, CliError> {
    let Some(mut cfg) = read_from(path)? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Like [`load_from`], falling back to defaults when the file is absent.
/// The result is validated.
pub fn load_or_default(path: &Path) -> Result<DominoConfig, CliError> {
    let cfg = match load_from(path)? {
        Some(cfg) => {
            tracing::debug!(path = %path.display(), "config loaded");
            cfg
        }
        None => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            let mut cfg = DominoConfig::default();
            apply_env_overrides(&mut cfg);
            cfg
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `DOMINO_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `DOMINO_DESIRED_WIDTH` | `mosaic.desired_width` |
/// | `DOMINO_DESIRED_HEIGHT` | `mosaic.desired_height` |
/// | `DOMINO_FIELD_ANGLE` | `field.domino_field_angle` (degrees) |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut DominoConfig) {
    if let Ok(v) = std::env::var("DOMINO_DESIRED_WIDTH")
        && let Ok(width) = v.parse::<usize>()
    {
        cfg.mosaic.desired_width = width;
    }
    if let Ok(v) = std::env::var("DOMINO_DESIRED_HEIGHT")
        && let Ok(height) = v.parse::<usize>()
    {
        cfg.mosaic.desired_height = height;
    }
    if let Ok(v) = std::env::var("DOMINO_FIELD_ANGLE")
        && let Ok(angle) = v.parse::<f64>()
        && angle.is_finite()
    {
        cfg.field.domino_field_angle = angle;
    }
}

/// Write `cfg` as pretty TOML, creating parent directories as needed.
pub fn save_to(cfg: &DominoConfig, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| CliError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_takes_precedence() {
        let p = config_path_from(Some(Path::new("/tmp/a.toml")), Some("/tmp/b.toml".into()));
        assert_eq!(p, PathBuf::from("/tmp/a.toml"));
    }

    #[test]
    fn env_path_used_when_no_flag() {
        let p = config_path_from(None, Some("/tmp/b.toml".into()));
        assert_eq!(p, PathBuf::from("/tmp/b.toml"));
    }

    #[test]
    fn default_path_in_working_directory() {
        assert_eq!(config_path_from(None, None), PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(config_path_from(None, Some(String::new())), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("nested").join("domino.toml");

        save_to(&DominoConfig::default(), &path).expect("save");
        let loaded = read_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, DominoConfig::default());
    }

    #[test]
    fn read_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let result = read_from(&dir.path().join("domino.toml")).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("domino.toml");
        fs::write(&path, "[mosaic]\ndesired_width = \"wide\"\n").expect("write");
        match read_from(&path) {
            Err(CliError::ConfigParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("domino.toml");
        fs::write(&path, "[field]\nprep_position_distance = 1.25\n").expect("write");
        let cfg = read_from(&path).expect("ok").expect("some");
        assert_eq!(cfg.field.prep_position_distance, 1.25);
        assert_eq!(cfg.field.exit_position_distance, 2.0);
        assert_eq!(cfg.mosaic.tile_width, 20);
    }

    #[test]
    fn apply_env_overrides_changes_desired_width() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("DOMINO_DESIRED_WIDTH", "120") };
        let mut cfg = DominoConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.mosaic.desired_width, 120);
        unsafe { std::env::remove_var("DOMINO_DESIRED_WIDTH") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_height() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("DOMINO_DESIRED_HEIGHT", "tall") };
        let mut cfg = DominoConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.mosaic.desired_height, 200);
        unsafe { std::env::remove_var("DOMINO_DESIRED_HEIGHT") };
    }

    #[test]
    fn apply_env_overrides_changes_field_angle() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("DOMINO_FIELD_ANGLE", "45.5") };
        let mut cfg = DominoConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.field.domino_field_angle, 45.5);
        unsafe { std::env::remove_var("DOMINO_FIELD_ANGLE") };
    }
}
