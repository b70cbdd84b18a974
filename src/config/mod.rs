#[cfg(feature = "cli")]
pub mod cli;

use crate::core::poller::PollSettings;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://nohmy99.vip/home";

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub output: OutputConfig,
    pub polling: PollingConfig,
    pub browser: BrowserOptions,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: None,
            password: None,
        }
    }
}

// 密碼不進日誌
impl fmt::Debug for SiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_path: String,
    pub debug_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "lucky7_data.csv".to_string(),
            debug_dir: "debug".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub poll_interval_secs: f64,
    pub retry_interval_secs: f64,
    pub round_timeout_secs: u64,
    /// 0 = no time limit
    pub run_seconds: u64,
    /// 0 = no round limit
    pub max_rounds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1.2,
            retry_interval_secs: 0.3,
            round_timeout_secs: 90,
            run_seconds: 0,
            max_rounds: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_executable: None,
            window_width: 1600,
            window_height: 900,
        }
    }
}

impl ScraperConfig {
    /// 有設定檔就讀檔，否則讀環境變數
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// Reads `LUCKY7_URL`, `NOH_USER`, `NOH_PASS`, `CSV_PATH`, `POLL_SEC`,
    /// `ROUND_TIMEOUT`, `RUN_SECONDS`, `MAX_ROUNDS`, `HEADLESS`, `CHROME_PATH`
    /// and `DEBUG_DIR`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("LUCKY7_URL") {
            config.site.url = url;
        }
        config.site.username = get("NOH_USER");
        config.site.password = get("NOH_PASS");
        if let Some(path) = get("CSV_PATH") {
            config.output.csv_path = path;
        }
        if let Some(dir) = get("DEBUG_DIR") {
            config.output.debug_dir = dir;
        }
        if let Some(raw) = get("POLL_SEC") {
            config.polling.poll_interval_secs = parse_value("POLL_SEC", &raw)?;
        }
        if let Some(raw) = get("ROUND_TIMEOUT") {
            config.polling.round_timeout_secs = parse_value("ROUND_TIMEOUT", &raw)?;
        }
        if let Some(raw) = get("RUN_SECONDS") {
            config.polling.run_seconds = parse_value("RUN_SECONDS", &raw)?;
        }
        if let Some(raw) = get("MAX_ROUNDS") {
            config.polling.max_rounds = parse_value("MAX_ROUNDS", &raw)?;
        }
        if let Some(raw) = get("HEADLESS") {
            config.browser.headless = parse_flag("HEADLESS", &raw)?;
        }
        config.browser.chrome_executable = get("CHROME_PATH");

        Ok(config)
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ScrapeError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，先替換 `${VAR}` 環境變數
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| ScrapeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn poll_settings(&self) -> PollSettings {
        let polling = &self.polling;
        PollSettings {
            poll_interval: Duration::from_secs_f64(polling.poll_interval_secs),
            retry_interval: Duration::from_secs_f64(polling.retry_interval_secs),
            run_limit: (polling.run_seconds > 0).then(|| Duration::from_secs(polling.run_seconds)),
            max_rounds: (polling.max_rounds > 0).then_some(polling.max_rounds),
        }
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        validate_url("site.url", &self.site.url)?;

        for (field, value) in [
            ("site.username (NOH_USER)", &self.site.username),
            ("site.password (NOH_PASS)", &self.site.password),
        ] {
            let value = validate_required_field(field, value)?;
            validate_non_empty_string(field, value)?;
            // 未解析的 ${VAR} 佔位符視同未設定
            if ENV_PLACEHOLDER.is_match(value) {
                return Err(ScrapeError::MissingConfigError {
                    field: field.to_string(),
                });
            }
        }

        validate_path("output.csv_path", &self.output.csv_path)?;
        validate_path("output.debug_dir", &self.output.debug_dir)?;
        validate_range("polling.poll_interval_secs", self.polling.poll_interval_secs, 0.05, 3600.0)?;
        validate_range("polling.retry_interval_secs", self.polling.retry_interval_secs, 0.0, 60.0)?;
        validate_range("polling.round_timeout_secs", self.polling.round_timeout_secs, 1, 86_400)?;
        validate_range("browser.window_width", self.browser.window_width, 320, 7680)?;
        validate_range("browser.window_height", self.browser.window_height, 240, 4320)?;
        Ok(())
    }
}

/// 替換環境變數 (例如 ${NOH_PASS})；未設定的保持原樣
fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ScrapeError::InvalidConfigValueError {
            field: name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ScrapeError::InvalidConfigValueError {
            field: name.to_string(),
            value: raw.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}
