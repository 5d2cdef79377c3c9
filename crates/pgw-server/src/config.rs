//! YAML configuration loading (spec §6.2) and fleet-wide tunable
//! resolution from the environment (spec §6.3).
//!
//! This is the concrete "configuration loading and YAML/environment
//! parsing" collaborator spec §1 places out of the Supervisor's core;
//! everything downstream (`pgw-supervisor`) only ever sees the already
//! validated [`pgw_domain::ProviderConfig`] / [`pgw_domain::Tunables`]
//! shapes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pgw_domain::{Error, ProviderConfig, RawProviderConfig, Result, RestartPolicy, Tunables};
use serde::Deserialize;

/// On-disk document shape: a single top-level `providers:` list (spec
/// §6.2).
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    providers: Vec<RawProviderConfig>,
}

/// Environment variable naming the config file path, checked when
/// `--config` is not passed on the command line.
pub const CONFIG_PATH_ENV: &str = "PGW_CONFIG";

/// Default config file path when neither `--config` nor `PGW_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "providers.yaml";

/// Resolve the effective config path: explicit CLI flag, then
/// `PGW_CONFIG`, then the default filename in the working directory.
#[must_use]
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load and validate the provider fleet plus tunables from `path`.
///
/// # Errors
///
/// Returns [`Error::ConfigMissing`] if the file cannot be read,
/// [`Error::ConfigInvalid`] if the YAML is malformed, a provider entry
/// fails validation, or two providers share a name.
pub fn load_providers(path: &Path, tunables: Tunables) -> Result<Vec<ProviderConfig>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ConfigMissing(format!("failed to read '{}': {e}", path.display()))
    })?;

    let document: RawDocument = serde_yaml::from_str(&content).map_err(|e| Error::ConfigInvalid {
        key: "providers".to_owned(),
        message: format!("failed to parse YAML: {e}"),
    })?;

    let mut seen_names = HashSet::with_capacity(document.providers.len());
    let mut providers = Vec::with_capacity(document.providers.len());
    for mut raw in document.providers {
        expand_env_placeholders(&mut raw);
        let config = ProviderConfig::from_raw(raw, tunables.default_timeout_ms, tunables.max_timeout_ms)?;
        if !seen_names.insert(config.name.clone()) {
            return Err(Error::ConfigInvalid {
                key: "providers[].name".to_owned(),
                message: format!("duplicate provider name '{}'", config.name),
            });
        }
        providers.push(config);
    }

    Ok(providers)
}

/// Resolve the four fleet-wide tunables from the environment (spec
/// §6.3), applying defaults and clamping timeouts to sane bounds.
///
/// # Errors
///
/// Returns [`Error::ConfigInvalid`] if `RESTART_POLICY` is set to
/// something other than `never`/`on-failure`, or if a numeric tunable
/// fails to parse.
pub fn tunables_from_env() -> Result<Tunables> {
    let defaults = Tunables::default();

    let health_check_interval_ms = read_u64_env("HEALTH_CHECK_INTERVAL_MS", defaults.health_check_interval_ms)?;
    let default_timeout_ms = read_u64_env("DEFAULT_TIMEOUT_MS", defaults.default_timeout_ms)?;
    let max_timeout_ms = read_u64_env("MAX_TIMEOUT_MS", defaults.max_timeout_ms)?;

    let restart_policy = match std::env::var("RESTART_POLICY") {
        Err(_) => defaults.restart_policy,
        Ok(value) => match value.as_str() {
            "never" => RestartPolicy::Never,
            "on-failure" => RestartPolicy::OnFailure,
            other => {
                return Err(Error::ConfigInvalid {
                    key: "RESTART_POLICY".to_owned(),
                    message: format!("must be 'never' or 'on-failure', got '{other}'"),
                });
            }
        },
    };

    if default_timeout_ms == 0 || default_timeout_ms > max_timeout_ms {
        return Err(Error::ConfigInvalid {
            key: "DEFAULT_TIMEOUT_MS".to_owned(),
            message: format!("must be in 1..={max_timeout_ms}ms, got {default_timeout_ms}ms"),
        });
    }

    Ok(Tunables {
        health_check_interval_ms,
        restart_policy,
        default_timeout_ms,
        max_timeout_ms,
    })
}

fn read_u64_env(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value.parse::<u64>().map_err(|e| Error::ConfigInvalid {
            key: name.to_owned(),
            message: format!("expected a positive integer, got '{value}': {e}"),
        }),
    }
}

/// Expand `${VAR_NAME}` placeholders in a provider's `envs[].value`
/// entries against the gateway's own process environment, so that by
/// the time [`ProviderConfig`] is constructed every value is already
/// expanded (spec §3 `ProviderConfig`, §4.3 step 1).
///
/// A placeholder naming a variable that is not set in the gateway's
/// environment is left verbatim rather than silently dropped, so a
/// misconfigured provider fails loudly when it tries to use it.
fn expand_env_placeholders(raw: &mut RawProviderConfig) {
    for env in &mut raw.envs {
        env.value = expand_one(&env.value);
    }
}

fn expand_one(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            out.push_str(rest);
            return out;
        };
        let end = start + end;
        out.push_str(&rest[..start]);
        let var_name = &rest[start + 2..end];
        match std::env::var(var_name) {
            Ok(expanded) => out.push_str(&expanded),
            Err(_) => out.push_str(&rest[start..=end]),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgw_domain::EnvVar;

    #[test]
    fn expands_known_placeholder() {
        std::env::set_var("PGW_TEST_TOKEN", "secret123");
        let mut raw = RawProviderConfig {
            name: "p1".to_owned(),
            command: "/bin/true".to_owned(),
            args: Vec::new(),
            envs: vec![EnvVar {
                name: "TOKEN".to_owned(),
                value: "Bearer ${PGW_TEST_TOKEN}".to_owned(),
            }],
            timeout: None,
        };
        expand_env_placeholders(&mut raw);
        assert_eq!(raw.envs[0].value, "Bearer secret123");
        std::env::remove_var("PGW_TEST_TOKEN");
    }

    #[test]
    fn leaves_unknown_placeholder_verbatim() {
        let mut raw = RawProviderConfig {
            name: "p1".to_owned(),
            command: "/bin/true".to_owned(),
            args: Vec::new(),
            envs: vec![EnvVar {
                name: "TOKEN".to_owned(),
                value: "${PGW_DEFINITELY_UNSET_VAR}".to_owned(),
            }],
            timeout: None,
        };
        expand_env_placeholders(&mut raw);
        assert_eq!(raw.envs[0].value, "${PGW_DEFINITELY_UNSET_VAR}");
    }

    #[test]
    fn rejects_unknown_restart_policy() {
        std::env::set_var("RESTART_POLICY", "sometimes");
        let err = tunables_from_env().unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
        std::env::remove_var("RESTART_POLICY");
    }

    #[test]
    fn duplicate_provider_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.yaml");
        std::fs::write(
            &path,
            "providers:\n  - name: p1\n    command: /bin/true\n  - name: p1\n    command: /bin/false\n",
        )
        .unwrap();
        let err = load_providers(&path, Tunables::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }
}
