use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const CONFIG_DIR_NAME: &str = "garagechat";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Candidate API keys in rotation order. May still be empty here; the
    /// credential pool rejects an empty list at startup.
    pub gemini_api_keys: Vec<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    gemini_api_keys: Option<Vec<String>>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
}

impl AppConfig {
    /// Loads the config file (explicit path or XDG discovery) and applies
    /// environment overrides: `GEMINI_API_KEYS` (comma-separated),
    /// `GEMINI_MODEL` and `GEMINI_BASE_URL`.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => discover_config_path()?,
        };
        let file_config = load_file_config(&config_path)?;

        dotenvy::dotenv().ok();

        let file_keys = file_config
            .as_ref()
            .and_then(|cfg| cfg.gemini_api_keys.clone());
        let file_model = file_config
            .as_ref()
            .and_then(|cfg| cfg.gemini_model.as_ref())
            .and_then(|value| non_empty(value).map(ToOwned::to_owned));
        let file_base_url = file_config
            .as_ref()
            .and_then(|cfg| cfg.gemini_base_url.as_ref())
            .and_then(|value| non_empty(value).map(ToOwned::to_owned));

        let keys = env_non_empty("GEMINI_API_KEYS")
            .map(|raw| split_key_list(&raw))
            .or(file_keys)
            .unwrap_or_default();

        Ok(Self {
            gemini_api_keys: keys
                .into_iter()
                .filter_map(|key| non_empty(&key).map(ToOwned::to_owned))
                .collect(),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .or(file_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env_non_empty("GEMINI_BASE_URL")
                .or(file_base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        })
    }
}

fn split_key_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::Path;

    fn reset_vars() {
        unsafe {
            env::remove_var("GEMINI_API_KEYS");
            env::remove_var("GEMINI_MODEL");
            env::remove_var("GEMINI_BASE_URL");
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    #[test]
    #[serial]
    fn load_uses_defaults_when_nothing_is_configured() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load(None).expect("load config"));
        assert!(cfg.gemini_api_keys.is_empty());
        assert_eq!(cfg.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    #[serial]
    fn load_reads_key_list_from_config_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_dir = tmp.path().join("garagechat");
        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::write(
            config_dir.join("config.toml"),
            r#"
gemini_api_keys = ["file-key-1", "", "file-key-2"]
gemini_model = "file_model"
"#,
        )
        .expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load(None).expect("load config"));
        assert_eq!(cfg.gemini_api_keys, vec!["file-key-1", "file-key-2"]);
        assert_eq!(cfg.gemini_model, "file_model");
    }

    #[test]
    #[serial]
    fn env_key_list_overrides_file_and_filters_blanks() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_dir = tmp.path().join("garagechat");
        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::write(
            config_dir.join("config.toml"),
            r#"gemini_api_keys = ["file-key"]"#,
        )
        .expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("GEMINI_API_KEYS", "env-key-1, ,env-key-2,");
            env::set_var("GEMINI_MODEL", "env_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load(None).expect("load config"));
        assert_eq!(cfg.gemini_api_keys, vec!["env-key-1", "env-key-2"]);
        assert_eq!(cfg.gemini_model, "env_model");
    }

    #[test]
    #[serial]
    fn explicit_config_path_bypasses_discovery() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("custom.toml");
        fs::write(&path, r#"gemini_base_url = "https://example.com""#).expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load(Some(&path)).expect("load config")
        });
        assert_eq!(cfg.gemini_base_url, "https://example.com");
    }

    #[test]
    #[serial]
    fn load_fails_when_xdg_config_home_is_empty() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load(None).expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_root_key() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_dir = tmp.path().join("garagechat");
        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::write(config_dir.join("config.toml"), "unknown_key = 1").expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || {
            AppConfig::load(None).expect_err("load should fail")
        });
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }
}
