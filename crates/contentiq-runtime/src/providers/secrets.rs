//! Credential handling for the IBM Cloud API key.
//!
//! The key is wrapped in [`SecretString`] as soon as it is read, so it
//! cannot show up in `Debug` or `Display` output. Callers expose it only
//! at the point where it goes into the token-exchange form body.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Runtime configuration file
    Config,
    /// Environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        let value: String = value.into();
        Self::from_secret(SecretString::from(value), source, name)
    }

    pub fn from_secret(value: SecretString, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value,
            source,
            name,
        }
    }

    /// Load credential from an environment variable.
    ///
    /// Unset and blank variables are both treated as missing.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        match std::env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(Self::new(v, CredentialSource::Environment, name)),
            _ => Err(ProviderError::NotConfigured(format!(
                "{} not set: configure '{}' environment variable",
                name, env_var
            ))),
        }
    }

    /// Use the configured value if present, else fall back to `env_var`.
    pub fn from_config_or_env(
        configured: Option<SecretString>,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = configured {
            if !value.expose_secret().trim().is_empty() {
                return Ok(Self::from_secret(value, CredentialSource::Config, name));
            }
        }

        Self::from_env(env_var, name).map_err(|_| {
            ProviderError::NotConfigured(format!(
                "{} required: set 'api_key' in config or {} environment variable",
                name, env_var
            ))
        })
    }

    /// Expose the credential value. Call only where the value is sent.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
