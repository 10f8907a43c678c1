use crate::PlatformError;
use secrecy::SecretString;

pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8787";

#[derive(Clone, Debug)]
pub struct Config {
    pub bridge_token: SecretString,
    pub bridge_url: String,
    /// Whether the bridge can open the health service's store page.
    pub remediation: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, PlatformError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Reads configuration values through `get` so tests never touch the
    /// process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, PlatformError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let token = get("HEALTH_BRIDGE_TOKEN")
            .ok_or_else(|| PlatformError::Config("HEALTH_BRIDGE_TOKEN missing".into()))?;
        let bridge_url = get("HEALTH_BRIDGE_URL").unwrap_or_else(|| DEFAULT_BRIDGE_URL.into());
        let remediation = match get("HEALTH_BRIDGE_REMEDIATION") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                PlatformError::Config(format!("HEALTH_BRIDGE_REMEDIATION: invalid flag {raw:?}"))
            })?,
        };
        Ok(Self {
            bridge_token: SecretString::new(token.into()),
            bridge_url,
            remediation,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_missing_token() {
        let get = |k: &str| match k {
            "HEALTH_BRIDGE_URL" => Some("http://localhost".into()),
            _ => None,
        };
        let res = Config::from_env_with(get);
        assert!(matches!(res, Err(PlatformError::Config(_))));
    }

    #[test]
    fn from_env_reads_values() {
        let get = |k: &str| match k {
            "HEALTH_BRIDGE_TOKEN" => Some("sekrit".into()),
            "HEALTH_BRIDGE_URL" => Some("http://localhost".into()),
            "HEALTH_BRIDGE_REMEDIATION" => Some("Yes".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.bridge_url, "http://localhost");
        assert!(cfg.remediation);
    }

    #[test]
    fn from_env_defaults() {
        let get = |k: &str| match k {
            "HEALTH_BRIDGE_TOKEN" => Some("sekrit".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.bridge_url, DEFAULT_BRIDGE_URL);
        assert!(!cfg.remediation);
    }

    #[test]
    fn from_env_rejects_bad_flag() {
        let get = |k: &str| match k {
            "HEALTH_BRIDGE_TOKEN" => Some("sekrit".into()),
            "HEALTH_BRIDGE_REMEDIATION" => Some("maybe".into()),
            _ => None,
        };
        assert!(Config::from_env_with(get).is_err());
    }
}
