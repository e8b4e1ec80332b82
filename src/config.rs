// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH0_DOMAIN` | Identity provider domain; derives issuer and JWKS URL | - |
//! | `JWKS_URL` | JWKS endpoint, overrides the derived one | - |
//! | `JWT_ISSUER` | Expected `iss`, overrides the derived one | - |
//! | `API_AUDIENCE` | Expected `aud` | Required |
//! | `JWT_ALGORITHM` | Accepted signing algorithm (asymmetric only) | `RS256` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache TTL | `300` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | JWKS fetch timeout | `10` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance | `0` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::auth::jwks::{DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT};
use crate::auth::VerifierSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const API_AUDIENCE_ENV: &str = "API_AUDIENCE";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Invalid or incomplete configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for bearer-token verification.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwks_url: Url,
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub leeway: u64,
}

impl AuthSettings {
    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings::new(&self.issuer, &self.audience)
            .with_algorithm(self.algorithm)
            .with_leeway(self.leeway)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    /// Returns `ConfigError` if the issuer, JWKS URL or audience cannot be
    /// determined, a value does not parse, or the algorithm is symmetric.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let domain = lookup(AUTH0_DOMAIN_ENV).map(|d| d.trim_end_matches('/').to_string());

        let jwks_url = lookup(JWKS_URL_ENV)
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/.well-known/jwks.json")))
            .ok_or(ConfigError::Missing(JWKS_URL_ENV))?;
        let jwks_url = Url::parse(&jwks_url).map_err(|e| ConfigError::Invalid {
            name: JWKS_URL_ENV,
            value: jwks_url.clone(),
            reason: e.to_string(),
        })?;

        let issuer = lookup(JWT_ISSUER_ENV)
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/")))
            .ok_or(ConfigError::Missing(JWT_ISSUER_ENV))?;

        let audience = lookup(API_AUDIENCE_ENV).ok_or(ConfigError::Missing(API_AUDIENCE_ENV))?;

        let algorithm = match lookup(JWT_ALGORITHM_ENV) {
            Some(value) => parse_algorithm(&value)?,
            None => Algorithm::RS256,
        };

        let auth = AuthSettings {
            jwks_url,
            issuer,
            audience,
            algorithm,
            cache_ttl: parse_secs(&lookup, JWKS_CACHE_TTL_ENV)?.unwrap_or(DEFAULT_CACHE_TTL),
            fetch_timeout: parse_secs(&lookup, JWKS_FETCH_TIMEOUT_ENV)?
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
            leeway: parse_number(&lookup, JWT_LEEWAY_ENV)?.unwrap_or(0),
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number(&lookup, PORT_ENV)?.unwrap_or(8080),
            auth,
        })
    }
}

fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: JWT_ALGORITHM_ENV,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let algorithm = Algorithm::from_str(value).map_err(|_| invalid("unknown algorithm"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(invalid("symmetric algorithms are not accepted"))
        }
        _ => Ok(algorithm),
    }
}

fn parse_number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_number::<u64>(lookup, name)?.map(Duration::from_secs))
}
