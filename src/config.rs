// Configuration read once at program entry and passed down explicitly.
// Library code never looks at the environment itself.

use crate::error::{ApiError, Result};
use clap::ValueEnum;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;

pub const TOKEN_VAR: &str = "SCW_TOKEN";
pub const ACCOUNT_URL_VAR: &str = "SCW_ACCOUNT_API_URL";
pub const MARKETPLACE_URL_VAR: &str = "SCW_MARKETPLACE_API_URL";
pub const MAX_PAGES_VAR: &str = "SCW_MAX_PAGES";

pub const DEFAULT_ACCOUNT_URL: &str = "https://account.scaleway.com";
pub const DEFAULT_MARKETPLACE_URL: &str = "https://api-marketplace.scaleway.com";
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// API token. Its `Debug` output never contains the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ApiError::Config(format!("Environment variable {TOKEN_VAR} required")));
        }
        Ok(Token(value))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Self::new(lookup(TOKEN_VAR).unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Compute regions served by a dedicated API host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Region {
    #[value(name = "ams1")]
    Ams1,
    #[value(name = "par1")]
    Par1,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Ams1 => "ams1",
            Region::Par1 => "par1",
        }
    }

    pub fn compute_url(&self) -> Result<Url> {
        parse_url(&format!("https://cp-{}.scaleway.com", self.as_str()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ams1" => Ok(Region::Ams1),
            "par1" => Ok(Region::Par1),
            other => Err(ApiError::Config(format!(
                "unknown region '{other}' (expected ams1 or par1)"
            ))),
        }
    }
}

/// CPU architecture of a marketplace image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Arch {
    #[default]
    #[value(name = "x86_64")]
    X86_64,
    #[value(name = "arm64")]
    Arm64,
    #[value(name = "arm")]
    Arm,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86_64" => Ok(Arch::X86_64),
            "arm64" => Ok(Arch::Arm64),
            "arm" => Ok(Arch::Arm),
            other => Err(ApiError::Config(format!(
                "unknown architecture '{other}' (expected x86_64, arm64 or arm)"
            ))),
        }
    }
}

/// Endpoints and limits. Built from the environment in `main`, or by hand
/// in tests.
#[derive(Debug, Clone)]
pub struct Config {
    pub account_url: Url,
    pub marketplace_url: Url,
    pub max_pages: usize,
}

impl Config {
    /// Read endpoint overrides from `SCW_ACCOUNT_API_URL`,
    /// `SCW_MARKETPLACE_API_URL` and `SCW_MAX_PAGES`, falling back to the
    /// public Scaleway hosts.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let account_url = lookup(ACCOUNT_URL_VAR).unwrap_or_else(|| DEFAULT_ACCOUNT_URL.into());
        let marketplace_url =
            lookup(MARKETPLACE_URL_VAR).unwrap_or_else(|| DEFAULT_MARKETPLACE_URL.into());
        let max_pages = match lookup(MAX_PAGES_VAR) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ApiError::Config(format!(
                        "{MAX_PAGES_VAR} must be a positive integer, got '{raw}'"
                    )))
                }
            },
            None => DEFAULT_MAX_PAGES,
        };

        Ok(Config {
            account_url: parse_url(&account_url)?,
            marketplace_url: parse_url(&marketplace_url)?,
            max_pages,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ApiError::Config(format!("invalid URL '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_token_is_config_error() {
        let err = Token::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert!(err.to_string().contains("SCW_TOKEN"));
    }

    #[test]
    fn blank_token_is_config_error() {
        let err = Token::from_lookup(lookup(&[(TOKEN_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token::new("very-secret").unwrap();
        assert_eq!(format!("{token:?}"), "Token(***)");
        assert_eq!(token.as_str(), "very-secret");
    }

    #[test]
    fn defaults_point_at_public_hosts() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.account_url.as_str(), "https://account.scaleway.com/");
        assert_eq!(config.marketplace_url.as_str(), "https://api-marketplace.scaleway.com/");
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            (ACCOUNT_URL_VAR, "http://127.0.0.1:8080/account"),
            (MAX_PAGES_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.account_url.as_str(), "http://127.0.0.1:8080/account");
        assert_eq!(config.max_pages, 3);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        assert!(Config::from_lookup(lookup(&[(MAX_PAGES_VAR, "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[(MAX_PAGES_VAR, "many")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ACCOUNT_URL_VAR, "not a url")])).is_err());
    }

    #[test]
    fn region_parsing_and_hosts() {
        assert_eq!("par1".parse::<Region>().unwrap(), Region::Par1);
        assert_eq!(
            Region::Ams1.compute_url().unwrap().as_str(),
            "https://cp-ams1.scaleway.com/"
        );
        let err = "fra1".parse::<Region>().unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn arch_parsing() {
        assert_eq!("arm64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!(Arch::default(), Arch::X86_64);
        assert!("mips".parse::<Arch>().is_err());
    }
}
