use serde::{Deserialize, Serialize};

/// Configuration problems that should stop a notification attempt
/// before any SMTP traffic happens.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("email credentials are not configured")]
    MissingCredentials,
    #[error("no notification recipients configured")]
    NoRecipients,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub sender: String,

    #[serde(default)]
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            sender: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Base URL of the league scheduling site.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Public schedule page linked from report footers.
    #[serde(default)]
    pub schedule_url: String,

    /// Venue substring to monitor.
    #[serde(default = "default_venue_filter")]
    pub venue_filter: String,

    /// Fetch-side date range, wider than the monitored window.
    #[serde(default = "default_days_ahead")]
    pub days_ahead: i64,

    /// Monitored horizon for change detection.
    #[serde(default = "default_monitor_days")]
    pub monitor_days: i64,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Label recorded in the JSON export; dates and times themselves
    /// are the venue's wall clock throughout.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Build and log emails without sending them.
    #[serde(default)]
    pub test_mode: bool,

    #[serde(default)]
    pub recipients: Vec<String>,

    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_base_url() -> String {
    "https://ccmha.grayjayleagues.com".to_string()
}

fn default_venue_filter() -> String {
    "Amherst Stadium".to_string()
}

fn default_days_ahead() -> i64 {
    14
}

fn default_monitor_days() -> i64 {
    7
}

fn default_output_dir() -> String {
    "data".to_string()
}

fn default_timezone() -> String {
    "America/Halifax".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            schedule_url: String::new(),
            venue_filter: default_venue_filter(),
            days_ahead: default_days_ahead(),
            monitor_days: default_monitor_days(),
            output_dir: default_output_dir(),
            timezone: default_timezone(),
            log_level: default_log_level(),
            test_mode: false,
            recipients: Vec::new(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MonitorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` if the file exists, otherwise start from
    /// defaults. Environment overrides apply either way.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Deployment secrets and recipient lists come from the
    /// environment so they never land in a checked-in config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(server) = std::env::var("SMTP_SERVER") {
            self.smtp.server = server;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            match port.parse() {
                Ok(port) => self.smtp.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SMTP_PORT value '{}'", port),
            }
        }
        if let Ok(sender) = std::env::var("SENDER_EMAIL") {
            self.smtp.sender = sender;
        }
        if let Ok(password) = std::env::var("SENDER_PASSWORD") {
            self.smtp.password = password;
        }
        if let Ok(recipients) = std::env::var("RECIPIENT_EMAILS") {
            self.recipients = recipients
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Ok(test_mode) = std::env::var("TEST_MODE") {
            self.test_mode = matches!(test_mode.to_lowercase().as_str(), "true" | "1" | "yes");
        }
    }

    /// Check that a real notification attempt could succeed.
    pub fn validate_email(&self) -> Result<(), ConfigError> {
        if self.smtp.sender.is_empty() || self.smtp.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        if self.recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.monitor_days, 7);
        assert_eq!(config.days_ahead, 14);
        assert_eq!(config.smtp.port, 587);
        assert!(!config.test_mode);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            venue_filter = "Springhill Arena"
            monitor_days = 3

            [smtp]
            sender = "bot@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.venue_filter, "Springhill Arena");
        assert_eq!(config.monitor_days, 3);
        assert_eq!(config.days_ahead, 14);
        assert_eq!(config.smtp.sender, "bot@example.com");
        assert_eq!(config.smtp.server, "smtp.gmail.com");
    }

    #[test]
    fn test_validate_email() {
        let mut config = MonitorConfig::default();
        assert!(matches!(
            config.validate_email(),
            Err(ConfigError::MissingCredentials)
        ));

        config.smtp.sender = "bot@example.com".to_string();
        config.smtp.password = "secret".to_string();
        assert!(matches!(
            config.validate_email(),
            Err(ConfigError::NoRecipients)
        ));

        config.recipients = vec!["canteen@example.com".to_string()];
        assert!(config.validate_email().is_ok());
    }
}
