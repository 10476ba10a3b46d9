use chrono::Duration;
use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub tokens: TokenSettings,
    pub users: UserSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token secrets and lifetimes. Each token class has its own secret.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct TokenSettings {
    pub access_secret: String,
    pub access_token_expiry: i64,  // seconds (120 = 2 minutes)
    pub refresh_secret: String,
    pub refresh_token_expiry: i64, // seconds (31536000 = 365 days)
}

impl TokenSettings {
    pub fn access_duration(&self) -> Result<Duration, ConfigError> {
        expiry_duration("tokens.access_token_expiry", self.access_token_expiry)
    }

    pub fn refresh_duration(&self) -> Result<Duration, ConfigError> {
        expiry_duration("tokens.refresh_token_expiry", self.refresh_token_expiry)
    }
}

/// Expiries must be positive and fit in a `Duration`.
fn expiry_duration(key: &str, seconds: i64) -> Result<Duration, ConfigError> {
    if seconds <= 0 {
        return Err(ConfigError::Message(format!(
            "{} must be positive, got {}",
            key, seconds
        )));
    }
    Duration::try_seconds(seconds)
        .ok_or_else(|| ConfigError::Message(format!("{} is out of range: {}", key, seconds)))
}

/// Seed admin account and password hashing cost
#[derive(serde::Deserialize, Clone, Debug)]
pub struct UserSettings {
    pub admin_name: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
}

/// Defaults, then `configuration.{yaml,toml,json}` if present, then
/// `APP__SECTION__KEY` environment variables.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8181)?
        .set_default("tokens.access_secret", "accessKey")?
        .set_default("tokens.access_token_expiry", 120)?
        .set_default("tokens.refresh_secret", "refreshKey")?
        .set_default("tokens.refresh_token_expiry", 60 * 60 * 24 * 365)?
        .set_default("users.admin_name", "admin")?
        .set_default("users.admin_password", "admin")?
        .set_default("users.bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = get_configuration().expect("Failed to read configuration");

        assert_eq!(settings.tokens.access_duration().unwrap(), Duration::minutes(2));
        assert_eq!(settings.tokens.refresh_duration().unwrap(), Duration::days(365));
        assert_ne!(settings.tokens.access_secret, settings.tokens.refresh_secret);
        assert!(!settings.users.admin_name.is_empty());
    }

    fn tokens(access_token_expiry: i64, refresh_token_expiry: i64) -> TokenSettings {
        TokenSettings {
            access_secret: "accessKey".to_string(),
            access_token_expiry,
            refresh_secret: "refreshKey".to_string(),
            refresh_token_expiry,
        }
    }

    #[test]
    fn test_non_positive_expiry_is_rejected() {
        assert!(matches!(
            tokens(0, 60).access_duration(),
            Err(ConfigError::Message(_))
        ));
        assert!(matches!(
            tokens(60, -1).refresh_duration(),
            Err(ConfigError::Message(_))
        ));
    }

    #[test]
    fn test_out_of_range_expiry_is_rejected() {
        let settings = tokens(i64::MAX, 60);

        assert!(matches!(
            settings.access_duration(),
            Err(ConfigError::Message(_))
        ));
        assert_eq!(settings.refresh_duration().unwrap(), Duration::minutes(1));
    }

    #[test]
    fn test_address() {
        let application = ApplicationSettings {
            host: "0.0.0.0".to_string(),
            port: 8181,
        };
        assert_eq!(application.address(), "0.0.0.0:8181");
    }
}
