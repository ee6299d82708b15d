//! Configuration loading and validation for chatgate.
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file) and are read exactly once at startup. The resulting [`Config`]
//! is immutable and shared with request handlers through axum state.

use secrecy::{ExposeSecret, SecretString};
use reqwest::header::HeaderValue;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Listen port.
pub const PORT_VAR: &str = "PORT";
/// Bearer credential sent to the upstream API.
pub const SECRET_VAR: &str = "OR_SECRET";
/// Upstream completion endpoint.
pub const URI_VAR: &str = "OR_URI";
/// Model identifier injected into every upstream request.
pub const MODEL_VAR: &str = "OR_MODEL";
/// Optional `X-Title` header value.
pub const TITLE_VAR: &str = "OR_TITLE";
/// Optional `HTTP-Referer` header value.
pub const REFERER_VAR: &str = "OR_REFERER";
/// Optional upstream timeout in whole seconds.
pub const TIMEOUT_VAR: &str = "OR_TIMEOUT_SECS";
/// Inbound body schema: `content` or `messages`.
pub const SCHEMA_VAR: &str = "GATEWAY_SCHEMA";
/// Gateway mode: `proxy` or `mock`.
pub const MODE_VAR: &str = "GATEWAY_MODE";

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub schema: InboundSchema,
    pub mode: GatewayMode,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    /// Address to bind: all interfaces on the configured port.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// Which inbound body shape this deployment accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboundSchema {
    /// `{"content": "..."}`
    #[default]
    Content,
    /// `{"messages": [{"role": "...", "content": "..."}]}`
    Messages,
}

impl InboundSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundSchema::Content => "content",
            InboundSchema::Messages => "messages",
        }
    }
}

impl FromStr for InboundSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(InboundSchema::Content),
            "messages" => Ok(InboundSchema::Messages),
            other => Err(format!("expected 'content' or 'messages', got '{}'", other)),
        }
    }
}

/// How valid chat requests are answered.
#[derive(Debug, Clone)]
pub enum GatewayMode {
    /// Forward to the upstream API and relay its response.
    Proxy(UpstreamConfig),
    /// Answer locally with a canned message, never contacting upstream.
    Mock,
}

impl GatewayMode {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayMode::Proxy(_) => "proxy",
            GatewayMode::Mock => "mock",
        }
    }

    /// Upstream settings, present only in proxy mode.
    pub fn upstream(&self) -> Option<&UpstreamConfig> {
        match self {
            GatewayMode::Proxy(upstream) => Some(upstream),
            GatewayMode::Mock => None,
        }
    }
}

/// Upstream completion API settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Full endpoint URI (e.g., "https://openrouter.ai/api/v1/chat/completions")
    pub uri: String,
    pub api_key: ApiKey,
    /// Model identifier; clients can never override it
    pub model: String,
    /// Sent as `X-Title` when set
    pub title: Option<String>,
    /// Sent as `HTTP-Referer` when set
    pub referer: Option<String>,
    /// Total request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

/// API key wrapper that redacts in Debug/Display and zeroizes on drop.
///
/// The raw value is reachable only through [`ApiKey::expose_secret`], so every
/// use of the credential is grep-auditable.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} environment variable is required")]
    Missing { var: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Any `.env` file is expected to have been applied already (see
    /// [`load_dotenv`]).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration using a custom variable lookup.
    ///
    /// Empty values are treated as unset. Fails on the first missing required
    /// variable or unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_value(PORT_VAR, &required(&lookup, PORT_VAR)?)?;

        let schema = match optional(&lookup, SCHEMA_VAR) {
            Some(raw) => parse_value(SCHEMA_VAR, &raw)?,
            None => InboundSchema::default(),
        };

        let mode_name = optional(&lookup, MODE_VAR).unwrap_or_else(|| "proxy".to_string());
        let mode = match mode_name.trim().to_ascii_lowercase().as_str() {
            "proxy" => GatewayMode::Proxy(UpstreamConfig::from_lookup(&lookup)?),
            "mock" => GatewayMode::Mock,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: MODE_VAR.to_string(),
                    message: format!("expected 'proxy' or 'mock', got '{}'", other),
                })
            }
        };

        Ok(Config {
            server: ServerConfig { port },
            schema,
            mode,
        })
    }
}

impl UpstreamConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = ApiKey::from(required(lookup, SECRET_VAR)?);
        if HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret())).is_err() {
            return Err(ConfigError::InvalidValue {
                key: SECRET_VAR.to_string(),
                message: "contains characters not allowed in an HTTP header".to_string(),
            });
        }

        let uri = required(lookup, URI_VAR)?;
        let parsed = reqwest::Url::parse(&uri).map_err(|e| ConfigError::InvalidValue {
            key: URI_VAR.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: URI_VAR.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let model = required(lookup, MODEL_VAR)?;

        let timeout = match optional(lookup, TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = parse_value(TIMEOUT_VAR, &raw)?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: TIMEOUT_VAR.to_string(),
                        message: "must be greater than zero".to_string(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(UpstreamConfig {
            uri,
            api_key,
            model,
            title: optional_header(lookup, TITLE_VAR)?,
            referer: optional_header(lookup, REFERER_VAR)?,
            timeout,
        })
    }
}

fn optional<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).filter(|value| !value.is_empty())
}

/// An optional value that will be sent verbatim as an HTTP header.
fn optional_header<F>(lookup: &F, var: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, var) {
        Some(value) => match HeaderValue::from_str(&value) {
            Ok(_) => Ok(Some(value)),
            Err(e) => Err(ConfigError::InvalidValue {
                key: var.to_string(),
                message: e.to_string(),
            }),
        },
        None => Ok(None),
    }
}

fn required<F>(lookup: &F, var: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, var).ok_or_else(|| ConfigError::Missing {
        var: var.to_string(),
    })
}

/// Apply a `.env` file from the working directory, if one exists.
///
/// Variables already set in the environment take precedence. Returns the
/// load error, if any, so the caller can report it once logging is up.
pub fn load_dotenv() -> Option<dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
