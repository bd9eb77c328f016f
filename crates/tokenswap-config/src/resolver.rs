//! Secret resolution and the process-wide configuration instance.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ConfigError, Result};

/// Environment variable holding the OAuth client id.
pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";
/// Environment variable holding the registered redirect URI.
pub const CLIENT_CALLBACK_URL_VAR: &str = "SPOTIFY_CLIENT_CALLBACK_URL";
/// Environment variable holding the refresh token encryption secret.
pub const ENCRYPTION_SECRET_VAR: &str = "ENCRYPTION_SECRET";

static SHARED: RwLock<Option<Arc<Config>>> = parking_lot::const_rwlock(None);

/// Resolved proxy configuration.
///
/// Immutable once built. Construct a fresh one with [`Config::from_env`] or
/// [`Config::from_lookup`]; share it with `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    client_id: String,
    client_secret: String,
    callback_url: String,
    encryption_secret: Option<String>,
}

impl Config {
    /// Read all secrets from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Blank values (empty or whitespace only) are treated the same as
    /// missing ones. Fails when any of
    /// the client credentials is absent; a missing encryption secret is
    /// accepted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).unwrap_or_default();

        let config = Self {
            client_id: read(CLIENT_ID_VAR),
            client_secret: read(CLIENT_SECRET_VAR),
            callback_url: read(CLIENT_CALLBACK_URL_VAR),
            encryption_secret: lookup(ENCRYPTION_SECRET_VAR).filter(|s| !is_blank(s)),
        };

        if !config.has_client_credentials() {
            return Err(ConfigError::EmptyClientCredentials);
        }

        if !config.has_encryption_secret() {
            tracing::warn!(
                var = ENCRYPTION_SECRET_VAR,
                "No encryption secret configured, refresh tokens will be returned in plaintext"
            );
        }

        Ok(config)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// The encryption secret, if one is configured.
    pub fn encryption_secret(&self) -> Option<&str> {
        self.encryption_secret.as_deref()
    }

    /// True iff client id, client secret and callback URL are all non-blank.
    pub fn has_client_credentials(&self) -> bool {
        !is_blank(&self.client_id)
            && !is_blank(&self.client_secret)
            && !is_blank(&self.callback_url)
    }

    /// True iff an encryption secret is configured.
    pub fn has_encryption_secret(&self) -> bool {
        self.encryption_secret.is_some()
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .field(
                "encryption_secret",
                &self.encryption_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Get the process-wide configuration, resolving it on first use.
///
/// Every call after a successful resolution returns the same instance.
/// Failed resolutions are not cached, so a later call re-reads the
/// environment.
pub fn resolve() -> Result<Arc<Config>> {
    if let Some(config) = SHARED.read().as_ref() {
        return Ok(Arc::clone(config));
    }

    let mut guard = SHARED.write();
    if let Some(config) = guard.as_ref() {
        return Ok(Arc::clone(config));
    }

    let config = Arc::new(Config::from_env()?);
    tracing::debug!(
        encryption = config.has_encryption_secret(),
        "Resolved configuration"
    );
    *guard = Some(Arc::clone(&config));
    Ok(config)
}

/// Drop the process-wide configuration so the next [`resolve`] re-reads the
/// environment. Instances already handed out are unaffected.
pub fn reset() {
    SHARED.write().take();
}

/// Load a `.env` file from the current directory (or a parent) into the
/// process environment. A missing file is not an error.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded .env file");
            Ok(Some(path))
        }
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    const SAMPLE_SECRET: &str =
        "|NwDQ-R1J,:1ct^@m+[s&C(k}2g]g+T|AuPXz07AT7jB oFjk|tCY+|/|Y:u[Er8";

    fn sample_env(vars: &[&str]) -> HashMap<String, String> {
        let all = [
            (CLIENT_ID_VAR, "sample-client-id"),
            (CLIENT_SECRET_VAR, "sample-client-secret"),
            (CLIENT_CALLBACK_URL_VAR, "sample-client-callback-url://"),
            (ENCRYPTION_SECRET_VAR, SAMPLE_SECRET),
        ];
        all.iter()
            .filter(|(k, _)| vars.contains(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config_from(vars: &[&str]) -> Result<Config> {
        let env = sample_env(vars);
        Config::from_lookup(|name| env.get(name).cloned())
    }

    const CLIENT_VARS: [&str; 3] = [CLIENT_ID_VAR, CLIENT_SECRET_VAR, CLIENT_CALLBACK_URL_VAR];

    #[test]
    fn test_no_variables_fails() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyClientCredentials));
        assert_eq!(err.to_string(), "client credentials are empty");
    }

    #[test]
    fn test_only_encryption_secret_fails() {
        assert!(matches!(
            config_from(&[ENCRYPTION_SECRET_VAR]),
            Err(ConfigError::EmptyClientCredentials)
        ));
    }

    #[test]
    fn test_each_missing_client_var_fails() {
        for missing in CLIENT_VARS {
            let vars: Vec<&str> = CLIENT_VARS
                .iter()
                .copied()
                .chain([ENCRYPTION_SECRET_VAR])
                .filter(|v| *v != missing)
                .collect();
            assert!(
                config_from(&vars).is_err(),
                "expected failure without {}",
                missing
            );
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = sample_env(&CLIENT_VARS);
        env.insert(CLIENT_SECRET_VAR.to_string(), String::new());
        assert!(Config::from_lookup(|name| env.get(name).cloned()).is_err());
    }

    #[test]
    fn test_whitespace_value_counts_as_missing() {
        for var in CLIENT_VARS {
            let mut env = sample_env(&CLIENT_VARS);
            env.insert(var.to_string(), " \t ".to_string());
            assert!(
                Config::from_lookup(|name| env.get(name).cloned()).is_err(),
                "expected failure with blank {}",
                var
            );
        }
    }

    #[test]
    fn test_whitespace_encryption_secret_is_absent() {
        let mut env = sample_env(&CLIENT_VARS);
        env.insert(ENCRYPTION_SECRET_VAR.to_string(), "  ".to_string());
        let config = Config::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert!(!config.has_encryption_secret());
        assert_eq!(config.encryption_secret(), None);
    }

    #[test]
    fn test_all_variables() {
        let config = config_from(&[
            CLIENT_ID_VAR,
            CLIENT_SECRET_VAR,
            CLIENT_CALLBACK_URL_VAR,
            ENCRYPTION_SECRET_VAR,
        ])
        .unwrap();
        assert!(config.has_client_credentials());
        assert!(config.has_encryption_secret());
    }

    #[test]
    fn test_client_variables_only() {
        let config = config_from(&CLIENT_VARS).unwrap();
        assert!(config.has_client_credentials());
        assert!(!config.has_encryption_secret());
        assert_eq!(config.encryption_secret(), None);
    }

    #[test]
    fn test_empty_encryption_secret_is_absent() {
        let mut env = sample_env(&CLIENT_VARS);
        env.insert(ENCRYPTION_SECRET_VAR.to_string(), String::new());
        let config = Config::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert!(!config.has_encryption_secret());
    }

    #[test]
    fn test_property_assignment() {
        let config = config_from(&[
            CLIENT_ID_VAR,
            CLIENT_SECRET_VAR,
            CLIENT_CALLBACK_URL_VAR,
            ENCRYPTION_SECRET_VAR,
        ])
        .unwrap();
        assert_eq!(config.client_id(), "sample-client-id");
        assert_eq!(config.client_secret(), "sample-client-secret");
        assert_eq!(config.callback_url(), "sample-client-callback-url://");
        assert_eq!(config.encryption_secret(), Some(SAMPLE_SECRET));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = config_from(&[
            CLIENT_ID_VAR,
            CLIENT_SECRET_VAR,
            CLIENT_CALLBACK_URL_VAR,
            ENCRYPTION_SECRET_VAR,
        ])
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sample-client-secret"));
        assert!(!debug.contains(SAMPLE_SECRET));
        assert!(debug.contains("sample-client-id"));
    }

    struct EnvGuard;
    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: serialized test context
            unsafe {
                for var in CLIENT_VARS.iter().chain([&ENCRYPTION_SECRET_VAR]) {
                    std::env::remove_var(var);
                }
            }
            reset();
        }
    }

    fn set_client_env() {
        // SAFETY: serialized test context
        unsafe {
            std::env::set_var(CLIENT_ID_VAR, "sample-client-id");
            std::env::set_var(CLIENT_SECRET_VAR, "sample-client-secret");
            std::env::set_var(CLIENT_CALLBACK_URL_VAR, "sample-client-callback-url://");
        }
    }

    #[test]
    #[serial]
    fn test_resolve_returns_single_instance() {
        let _guard = EnvGuard;
        reset();
        set_client_env();

        let a = resolve().unwrap();
        let b = resolve().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    #[serial]
    fn test_reset_forces_fresh_resolution() {
        let _guard = EnvGuard;
        reset();
        set_client_env();

        let before = resolve().unwrap();
        assert!(!before.has_encryption_secret());

        // SAFETY: serialized test context
        unsafe { std::env::set_var(ENCRYPTION_SECRET_VAR, SAMPLE_SECRET) };

        // Cached until reset
        assert!(!resolve().unwrap().has_encryption_secret());

        reset();
        let after = resolve().unwrap();
        assert!(after.has_encryption_secret());
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(!before.has_encryption_secret());
    }

    #[test]
    #[serial]
    fn test_failed_resolution_is_not_cached() {
        let _guard = EnvGuard;
        reset();

        assert!(resolve().is_err());
        set_client_env();
        assert!(resolve().is_ok());
    }
}
