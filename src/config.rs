//! Configuration file structures.
//!
//! The configuration is a YAML file merged with environment variables by
//! [`figment`]. Any value can be overridden with a `MENAGERIE_` prefixed
//! variable, nested keys being separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Which bot to run: echo, xkcd, weather, packages, imgflip, absence,
//! # bamboohr or hassmelden
//! bot: xkcd
//!
//! # Room receiving /feedback messages, feedback is disabled without it
//! feedback_conversation: "!feedback:matrix.org"
//!
//! # Seconds a question waits for its answer, 0 disables expiry
//! pending_timeout: 600
//!
//! matrix:
//!   user_id: "@xkcd:matrix.org"
//!   password: "secret-password"
//!   # E2EE recovery passphrase, optional
//!   passphrase: "recovery-passphrase"
//!
//! # Only the section of the configured bot is required
//! services:
//!   weather:
//!     api_key: "openweathermap-key"
//!   libraries_io:
//!     api_key: "libraries-io-key"
//!   imgflip:
//!     username: "imgflip-user"
//!     password: "imgflip-password"
//!   absence_io:
//!     key_id: "absence-key-id"
//!     key: "absence-key"
//!   bamboohr:
//!     api_key: "bamboohr-key"
//!     company_domain: "wire"
//! ```
//!
//! Every service section also accepts a `url` key pointing the bot at another
//! server, which is mostly useful for testing.
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export MENAGERIE_BOT="weather"
//! export MENAGERIE_MATRIX__PASSWORD="secret-from-env"
//! export MENAGERIE_SERVICES__WEATHER__API_KEY="key-from-env"
//! ```

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Prefix of the environment variables overriding the file.
const ENV_PREFIX: &str = "MENAGERIE_";

fn default_pending_timeout() -> u64 {
    600
}

/// Root configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Bot to run
    pub bot: BotKind,
    /// Conversation receiving feedback
    #[serde(default)]
    pub feedback_conversation: Option<String>,
    /// Lifetime of pending questions in seconds.
    ///
    /// `0` keeps questions until they are answered or replaced.
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout: u64,
    /// Matrix account configuration
    pub matrix: Matrix,
    /// Credentials of the third-party services
    #[serde(default)]
    pub services: Services,
}

impl Config {
    /// Loads the configuration from `path`, environment variables take
    /// precedence over the file.
    pub fn load(path: &str) -> Result<Config> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("invalid configuration in {path}"))
    }

    /// Lifetime of pending entries, `None` when expiry is disabled.
    pub fn pending_ttl(&self) -> Option<Duration> {
        match self.pending_timeout {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

/// The bots this binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotKind {
    Echo,
    Xkcd,
    Weather,
    Packages,
    Imgflip,
    Absence,
    Bamboohr,
    Hassmelden,
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BotKind::Echo => "echo",
            BotKind::Xkcd => "xkcd",
            BotKind::Weather => "weather",
            BotKind::Packages => "packages",
            BotKind::Imgflip => "imgflip",
            BotKind::Absence => "absence",
            BotKind::Bamboohr => "bamboohr",
            BotKind::Hassmelden => "hassmelden",
        };
        write!(f, "{name}")
    }
}

/// Matrix account configuration.
///
/// ```yaml
/// matrix:
///   user_id: "@bot:matrix.org"
///   password: "your-password"
///   passphrase: "your-recovery-passphrase"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Matrix {
    /// Fully qualified Matrix user ID, `@username:homeserver.com`
    pub user_id: String,

    /// Account password.
    ///
    /// Used for the first login only, the session is persisted afterwards.
    pub password: String,

    /// E2EE recovery passphrase.
    ///
    /// Without it the bot cannot read encrypted rooms where it lost its keys.
    #[serde(default)]
    pub passphrase: Option<String>,
}

/// Service sections, one per external API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Services {
    #[serde(default)]
    pub xkcd: Option<XkcdService>,
    #[serde(default)]
    pub weather: Option<WeatherService>,
    #[serde(default)]
    pub libraries_io: Option<LibrariesIoService>,
    #[serde(default)]
    pub imgflip: Option<ImgflipService>,
    #[serde(default)]
    pub absence_io: Option<AbsenceIoService>,
    #[serde(default)]
    pub bamboohr: Option<BambooHrService>,
}

fn default_xkcd_url() -> String {
    "https://xkcd.com".to_owned()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org".to_owned()
}

fn default_weather_lang() -> String {
    "en".to_owned()
}

fn default_libraries_io_url() -> String {
    "https://libraries.io".to_owned()
}

fn default_imgflip_url() -> String {
    "https://api.imgflip.com".to_owned()
}

fn default_absence_io_url() -> String {
    "https://app.absence.io".to_owned()
}

fn default_bamboohr_url() -> String {
    "https://api.bamboohr.com".to_owned()
}

/// xkcd needs no credentials, the section only overrides the url.
#[derive(Debug, Clone, Deserialize)]
pub struct XkcdService {
    #[serde(default = "default_xkcd_url")]
    pub url: String,
}

impl Default for XkcdService {
    fn default() -> Self {
        XkcdService {
            url: default_xkcd_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherService {
    pub api_key: String,
    #[serde(default = "default_weather_lang")]
    pub lang: String,
    #[serde(default = "default_weather_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibrariesIoService {
    pub api_key: String,
    #[serde(default = "default_libraries_io_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImgflipService {
    pub username: String,
    pub password: String,
    #[serde(default = "default_imgflip_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbsenceIoService {
    /// Hawk key id
    pub key_id: String,
    /// Hawk key
    pub key: String,
    #[serde(default = "default_absence_io_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BambooHrService {
    pub api_key: String,
    pub company_domain: String,
    #[serde(default = "default_bamboohr_url")]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const MINIMAL: &str = r#"
bot: xkcd
matrix:
  user_id: "@xkcd:example.com"
  password: "secret"
"#;

    #[test]
    #[serial]
    fn test_load_minimal() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.bot, BotKind::Xkcd);
        assert_eq!(config.feedback_conversation, None);
        assert_eq!(config.pending_timeout, 600);
        assert_eq!(config.pending_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.matrix.user_id, "@xkcd:example.com");
        assert_eq!(config.matrix.passphrase, None);
        assert!(config.services.weather.is_none());
        assert!(config.services.xkcd.is_none());
    }

    #[test]
    #[serial]
    fn test_load_full() {
        let file = write_config(
            r#"
bot: absence
feedback_conversation: "!feedback:example.com"
pending_timeout: 0
matrix:
  user_id: "@absence:example.com"
  password: "secret"
  passphrase: "recovery"
services:
  weather:
    api_key: "weather-key"
  absence_io:
    key_id: "id"
    key: "key"
    url: "http://localhost:1234"
  bamboohr:
    api_key: "bamboo-key"
    company_domain: "wire"
"#,
        );
        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.bot, BotKind::Absence);
        assert_eq!(
            config.feedback_conversation.as_deref(),
            Some("!feedback:example.com")
        );
        assert_eq!(config.pending_ttl(), None);
        assert_eq!(config.matrix.passphrase.as_deref(), Some("recovery"));

        let weather = config.services.weather.unwrap();
        assert_eq!(weather.url, "https://api.openweathermap.org");
        assert_eq!(weather.lang, "en");

        let absence = config.services.absence_io.unwrap();
        assert_eq!(absence.url, "http://localhost:1234");
        assert_eq!(absence.key_id, "id");

        assert_eq!(config.services.bamboohr.unwrap().company_domain, "wire");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = write_config(MINIMAL);
        // SAFETY: serialized with the other tests touching the environment
        unsafe {
            std::env::set_var("MENAGERIE_BOT", "weather");
            std::env::set_var("MENAGERIE_SERVICES__WEATHER__API_KEY", "env-key");
        }

        let config = Config::load(file.path().to_str().unwrap());

        unsafe {
            std::env::remove_var("MENAGERIE_BOT");
            std::env::remove_var("MENAGERIE_SERVICES__WEATHER__API_KEY");
        }

        let config = config.unwrap();
        assert_eq!(config.bot, BotKind::Weather);
        assert_eq!(config.services.weather.unwrap().api_key, "env-key");
    }

    #[test]
    #[serial]
    fn test_unknown_bot() {
        let file = write_config(&MINIMAL.replace("bot: xkcd", "bot: parrot"));
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    #[serial]
    fn test_missing_matrix_section() {
        let file = write_config("bot: echo\n");
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_bot_kind_display() {
        assert_eq!(BotKind::Bamboohr.to_string(), "bamboohr");
        assert_eq!(BotKind::Hassmelden.to_string(), "hassmelden");
    }
}
