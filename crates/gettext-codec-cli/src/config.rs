use std::fs;
use std::path::Path;

use gettext_codec_core::DEFAULT_FOLD_LENGTH;
use serde::Deserialize;

use crate::error::CliError;

pub const DEFAULT_CONFIG_PATH: &str = "gettext-codec.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub fold_length: usize,
    pub sort: bool,
    pub mo_hash_table: bool,
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            fold_length: DEFAULT_FOLD_LENGTH,
            sort: false,
            mo_hash_table: false,
            pretty: false,
        }
    }
}

pub fn load_config(path: &Path) -> Result<CliConfig, CliError> {
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn load_config_or_default(path: &Path) -> Result<CliConfig, CliError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(CliConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{CliConfig, load_config_or_default};
    use crate::error::CliError;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("gettext_codec_{name}_{nanos}.toml"));
        path
    }

    #[test]
    fn uses_default_when_missing() {
        let path = temp_path("missing");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.fold_length, 76);
        assert!(!config.sort);
    }

    #[test]
    fn loads_partial_file() {
        let path = temp_path("config");
        fs::write(&path, "fold_length = 0\nmo_hash_table = true\n").expect("write");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.fold_length, 0);
        assert!(config.mo_hash_table);
        assert!(!config.pretty);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn reports_invalid_toml() {
        let path = temp_path("invalid");
        fs::write(&path, "fold_length = \"wide\"").expect("write");
        let err = load_config_or_default(&path).expect_err("invalid");
        assert!(matches!(err, CliError::Toml(_)));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn default_values_are_stable() {
        let config = CliConfig::default();
        assert!(!config.mo_hash_table);
        assert!(!config.pretty);
    }
}
