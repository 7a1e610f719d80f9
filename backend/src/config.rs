//! Service configuration.
//!
//! Settings are layered from an optional `certify.toml` in the working
//! directory and `CERTIFY_*` environment variables (nested keys use `__`,
//! e.g. `CERTIFY_AUTH__JWT_SECRET`). Every field has a default except the
//! token secret, which must be supplied before the service starts.

use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "certify";
const ENV_PREFIX: &str = "CERTIFY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Root for uploaded templates, generated certificates and archives.
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    /// Finished generation jobs kept in memory for status and retry.
    pub retained_jobs: usize,
    pub auth: AuthSettings,
    pub render: RenderSettings,
    pub mail: MailSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("uploads"),
            database_path: PathBuf::from("certify.sqlite"),
            retained_jobs: 500,
            auth: AuthSettings::default(),
            render: RenderSettings::default(),
            mail: MailSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for issued bearer tokens. Empty until configured.
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub users: Vec<UserAccount>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let demo = |name: &str, password: &str, organization: &str| UserAccount {
            username: name.to_string(),
            password: password.to_string(),
            organization: organization.to_string(),
            disabled: false,
        };
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 12 * 60,
            users: vec![
                demo("foundation", "foundation123", "foundation"),
                demo("lyceum", "lyceum123", "lyceum"),
                demo("ft", "ft123", "ft"),
                demo("university", "university123", "university"),
                demo("gymnasium", "gymnasium123", "gymnasium"),
                demo("admin", "admin123", "foundation"),
                demo("user", "user123", "foundation"),
            ],
        }
    }
}

/// Placeholder secrets found in sample configs.
const PLACEHOLDER_SECRETS: [&str; 3] = ["change-me", "changeme", "secret"];

impl AuthSettings {
    /// Tokens signed with a known secret could be minted by anyone.
    pub fn check_secret(&self) -> Result<(), config::ConfigError> {
        let secret = self.jwt_secret.trim();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret) {
            return Err(config::ConfigError::Message(format!(
                "auth.jwt_secret is not set; provide it in {CONFIG_FILE}.toml or {ENV_PREFIX}_AUTH__JWT_SECRET"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub organization: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub fonts_dir: PathBuf,
    /// Family name; genpdf expects `{name}-Regular.ttf`, `{name}-Bold.ttf`, etc.
    pub font_family: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            fonts_dir: PathBuf::from("./fonts"),
            font_family: "LiberationSans".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    Log,
    Outbox,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub transport: MailTransport,
    pub outbox_dir: PathBuf,
    pub from: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            transport: MailTransport::Log,
            outbox_dir: PathBuf::from("uploads/outbox"),
            from: "certificates@localhost".to_string(),
        }
    }
}

pub fn load() -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;
    settings.auth.check_secret()?;
    Ok(settings)
}
