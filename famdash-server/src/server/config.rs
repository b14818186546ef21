use chrono_tz::Tz;
use famdash_shared::domain::MemberRole;
use famdash_shared::lockout::LockoutPolicy;
use serde::Deserialize;
use std::{env, fs, io::ErrorKind, path::Path};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version of the config layout; must share major.minor with the binary.
    pub config_version: String,
    pub dev_cors_origin: Option<String>,
    pub listen_port: Option<u16>,
    /// IANA zone name that decides the household's "today".
    pub timezone: String,
    pub pin: PinPolicyConfig,
    pub audit_retention_days: u32,
    pub seed: Option<SeedConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: env!("CARGO_PKG_VERSION").to_string(),
            dev_cors_origin: None,
            listen_port: None,
            timezone: "UTC".to_string(),
            pin: PinPolicyConfig::default(),
            audit_retention_days: 90,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinPolicyConfig {
    pub max_attempts: u32,
    pub lockout_secs: i64,
    pub session_hours: i64,
    /// Mark the session cookie `Secure`. Enable when served over HTTPS.
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl Default for PinPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 15 * 60,
            session_hours: 24,
            cookie_secure: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PinPolicyConfig {
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_attempts.max(1),
            lockout: chrono::Duration::seconds(self.lockout_secs.max(1)),
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_hours.max(1))
    }
}

/// Members and rewards inserted into an empty database on first start.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub members: Vec<SeedMember>,
    pub rewards: Vec<SeedReward>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMember {
    pub name: String,
    pub role: MemberRole,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedReward {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points_cost: i32,
    #[serde(default)]
    pub is_cash_reward: bool,
    #[serde(default)]
    pub cash_value: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config_version {found} is not compatible with server {expected}")]
    Version { found: String, expected: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Load from `CONFIG_PATH` (default `config.yaml`). A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_yaml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path, "config file not found; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_version(&self.config_version, env!("CARGO_PKG_VERSION"))?;
        self.tz()?;
        if self.pin.bcrypt_cost < 4 || self.pin.bcrypt_cost > 31 {
            return Err(ConfigError::Invalid(format!(
                "pin.bcrypt_cost must be within 4..=31, got {}",
                self.pin.bcrypt_cost
            )));
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone: {}", self.timezone)))
    }
}

fn check_version(found: &str, expected: &str) -> Result<(), ConfigError> {
    let mismatch = || ConfigError::Version {
        found: found.to_string(),
        expected: expected.to_string(),
    };
    let have = semver::Version::parse(found).map_err(|_| mismatch())?;
    let want = semver::Version::parse(expected).map_err(|_| mismatch())?;
    if have.major != want.major || have.minor != want.minor {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg.timezone, "UTC");
        assert_eq!(cfg.pin.max_attempts, 5);
        assert_eq!(cfg.pin.lockout_secs, 900);
        assert_eq!(cfg.audit_retention_days, 90);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn parses_seed_and_policy() {
        let yaml = format!(
            r##"
config_version: "{}"
timezone: Europe/Warsaw
pin:
  max_attempts: 3
  session_hours: 8
seed:
  members:
    - name: Kid
      role: CHILD
    - name: Mom
      role: PARENT
      color: "#aa3300"
  rewards:
    - name: Ice cream
      points_cost: 10
"##,
            env!("CARGO_PKG_VERSION")
        );
        let cfg = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(cfg.tz().unwrap(), chrono_tz::Europe::Warsaw);
        assert_eq!(cfg.pin.lockout_policy().max_attempts, 3);
        assert_eq!(cfg.pin.session_ttl(), chrono::Duration::hours(8));
        let seed = cfg.seed.unwrap();
        assert_eq!(seed.members.len(), 2);
        assert_eq!(seed.members[0].role, MemberRole::Child);
        assert_eq!(seed.rewards[0].points_cost, 10);
    }

    #[test]
    fn rejects_incompatible_version() {
        let err = AppConfig::from_yaml("config_version: \"99.0.0\"").unwrap_err();
        assert!(matches!(err, ConfigError::Version { .. }));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = AppConfig::from_yaml("timezone: Mars/Olympus").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
