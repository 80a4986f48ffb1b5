//! Ballot server configuration
//!
//! Layered as defaults, then an optional `ballot.toml`, then `BALLOT_*`
//! environment variables (`__` separates nested keys, lists are
//! comma-separated). `PORT` overrides the port last.

use anyhow::{Context, Result};
use ballot_common::{BallotError, ConfigError, Identity, DEFAULT_DOMAIN};
use ballot_core::BallotParams;
use config::{Config, Environment, File, FileFormat, Map};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Ballot server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Election parameters
    pub election: ElectionSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            election: ElectionSettings::default(),
        }
    }
}

/// Election parameters, fixed for the lifetime of the process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionSettings {
    /// Domain admin and voter signatures are bound to
    pub domain: String,
    /// Ordered candidate names
    #[serde(deserialize_with = "string_or_list")]
    pub candidates: Vec<String>,
    /// Admin identities as `did:key` or hex
    #[serde(deserialize_with = "string_or_list")]
    pub admins: Vec<String>,
    /// Distinct admin signatures required for gated operations
    pub required_signatures: usize,
}

impl Default for ElectionSettings {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            candidates: vec!["Alice".into(), "Bob".into(), "Charlie".into()],
            admins: Vec::new(),
            required_signatures: 2,
        }
    }
}

impl ElectionSettings {
    /// Parse admins and build core parameters
    pub fn to_params(&self) -> Result<BallotParams, BallotError> {
        if self.admins.is_empty() {
            return Err(ConfigError::NoAdmins.into());
        }
        let admins = self
            .admins
            .iter()
            .map(|s| Identity::parse(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(
            BallotParams::new(self.candidates.iter().cloned(), admins, self.required_signatures)
                .with_domain(self.domain.clone()),
        )
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, `ballot.toml`, and the environment
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::layered(
            File::with_name("ballot").required(false),
            Self::environment(),
        )?;

        // Platform-assigned port takes priority
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }
        Ok(cfg)
    }

    /// Defaults overlaid with a TOML document, without touching the environment
    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::layered(
            File::from_str(toml, FileFormat::Toml),
            Self::environment().source(Some(Map::new())),
        )
    }

    /// `BALLOT_*` variables; values stay strings so hex admins are not read as numbers
    fn environment() -> Environment {
        Environment::with_prefix("BALLOT")
            .prefix_separator("_")
            .separator("__")
    }

    fn layered<S>(file: S, env: Environment) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
            .context("Invalid ballot configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accept a sequence or a comma-separated string
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrList;

    impl<'de> de::Visitor<'de> for StringOrList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a list of strings or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
            Ok(value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                items.push(item);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_any(StringOrList)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_A: &str = "0101010101010101010101010101010101010101010101010101010101010101";
    const ADMIN_B: &str = "0202020202020202020202020202020202020202020202020202020202020202";

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.election.candidates, vec!["Alice", "Bob", "Charlie"]);
        assert_eq!(cfg.election.required_signatures, 2);
        assert_eq!(cfg.election.domain, DEFAULT_DOMAIN);
    }

    #[test]
    fn test_default_admins_must_be_configured() {
        let result = ServerConfig::default().election.to_params();
        assert_eq!(result, Err(ConfigError::NoAdmins.into()));
    }

    #[test]
    fn test_toml_overrides() {
        let cfg = ServerConfig::from_toml(&format!(
            r#"
            port = 9000

            [election]
            domain = "city-council-2026"
            candidates = ["Dana", "Eli"]
            admins = ["{ADMIN_A}", "{ADMIN_B}"]
            required_signatures = 1
            "#
        ))
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.host, "0.0.0.0");

        let params = cfg.election.to_params().unwrap();
        assert_eq!(params.domain, "city-council-2026");
        assert_eq!(params.candidates, vec!["Dana", "Eli"]);
        assert_eq!(params.admins.len(), 2);
        assert_eq!(params.required_signatures, 1);
    }

    #[test]
    fn test_invalid_admin_identity() {
        let settings = ElectionSettings {
            admins: vec!["did:key:nope".into()],
            ..Default::default()
        };
        assert!(matches!(
            settings.to_params(),
            Err(BallotError::Identity(_))
        ));
    }

    fn with_env(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let env: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::layered(
            File::from_str("", FileFormat::Toml),
            ServerConfig::environment().source(Some(env)),
        )
    }

    #[test]
    fn test_empty_sources_fall_back_to_defaults() {
        let cfg = with_env(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.election.admins.is_empty());
        assert_eq!(
            cfg.election.to_params(),
            Err(ConfigError::NoAdmins.into())
        );
    }

    #[test]
    fn test_toml_without_admins_loads() {
        let cfg = ServerConfig::from_toml("[election]\ndomain = \"school-board\"\n").unwrap();
        assert_eq!(cfg.election.domain, "school-board");
        assert_eq!(cfg.election.candidates, vec!["Alice", "Bob", "Charlie"]);
        assert!(cfg.election.admins.is_empty());
    }

    #[test]
    fn test_environment_overrides() {
        let admins = format!("{ADMIN_A}, {ADMIN_B}");
        let cfg = with_env(&[
            ("BALLOT_PORT", "9123"),
            ("BALLOT_HOST", "127.0.0.1"),
            ("BALLOT_ELECTION__ADMINS", &admins),
            ("BALLOT_ELECTION__REQUIRED_SIGNATURES", "1"),
            ("BALLOT_ELECTION__CANDIDATES", "Dana,Eli"),
            ("UNRELATED_PORT", "1"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9123);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9123");
        assert_eq!(cfg.election.admins, vec![ADMIN_A, ADMIN_B]);
        assert_eq!(cfg.election.candidates, vec!["Dana", "Eli"]);

        let params = cfg.election.to_params().unwrap();
        assert_eq!(params.admins.len(), 2);
        assert_eq!(params.required_signatures, 1);
    }

    #[test]
    fn test_environment_overrides_file() {
        let cfg = ServerConfig::layered(
            File::from_str(&format!("[election]\nadmins = [\"{ADMIN_A}\"]\n"), FileFormat::Toml),
            ServerConfig::environment().source(Some(Map::from([(
                "BALLOT_ELECTION__ADMINS".to_string(),
                ADMIN_B.to_string(),
            )]))),
        )
        .unwrap();
        assert_eq!(cfg.election.admins, vec![ADMIN_B]);
    }
}
