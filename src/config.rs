use anyhow::Context;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime configuration read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Credential used when `--caller` is not given.
    pub default_caller: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS must be a number, got '{value}'"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections,
            default_caller: lookup("COMPLIANCE_CALLER").filter(|caller| !caller.trim().is_empty()),
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to the compliance Postgres instance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.default_caller.is_none());
        assert!(config.database_url().is_err());
    }

    #[test]
    fn reads_values() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/training"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("COMPLIANCE_CALLER", "jdoe"),
        ])
        .unwrap();
        assert_eq!(config.database_url().unwrap(), "postgres://localhost/training");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.default_caller.as_deref(), Some("jdoe"));
    }

    #[test]
    fn rejects_bad_pool_size() {
        assert!(config(&[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
    }
}
