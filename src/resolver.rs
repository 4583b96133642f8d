use std::{collections::HashMap, sync::OnceLock};

use regex::Regex;

use crate::config::Config;

/// Read access to the variables placeholders are resolved against.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)").expect("placeholder pattern")
    })
}

/// Returns every `$NAME` / `${NAME}` token of `text` with its bare name, in order.
pub fn placeholders(text: &str) -> Vec<(&str, &str)> {
    placeholder_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let token = caps.get(0)?.as_str();
            let name = caps.get(1).or_else(|| caps.get(2))?.as_str();
            Some((token, name))
        })
        .collect()
}

fn lookup(env: &impl Environment, name: &str, prefix: &str) -> String {
    let non_empty = |key: &str| env.var(key).filter(|v| !v.is_empty());

    if !prefix.is_empty() {
        let prefixed = format!("{}_{}", prefix, name).to_uppercase();
        if let Some(value) = non_empty(&prefixed) {
            log::debug!("Resolved ${} using {}", name, prefixed);
            return value;
        }
    }

    match non_empty(name) {
        Some(value) => {
            log::debug!("Resolved ${} using {}", name, name);
            value
        }
        None => {
            log::debug!("${} is not set, replacing it with an empty string", name);
            String::new()
        }
    }
}

/// Substitutes `$NAME` and `${NAME}` in `text`.
///
/// `PREFIX_NAME` (uppercased) is tried before `NAME` when `prefix` is not empty.
/// Unknown variables become empty strings. Tokens are resolved in order and
/// each one replaces every occurrence of its literal text.
pub fn resolve(text: &str, prefix: &str, env: &impl Environment) -> String {
    placeholders(text)
        .into_iter()
        .fold(text.to_string(), |working, (token, name)| {
            if !working.contains(token) {
                return working;
            }
            working.replace(token, &lookup(env, name, prefix))
        })
}

/// Resolves the placeholders of `config` and fills the cluster credentials
/// that were not given directly from their well-known variables.
pub fn resolve_secrets(config: &Config, env: &impl Environment) -> Config {
    let prefix = config.prefix.as_str();
    let fallback = |current: &str, variable: &str| {
        if current.is_empty() {
            resolve(&format!("${{{}}}", variable), prefix, env)
        } else {
            current.to_string()
        }
    };

    if !config.secrets.is_empty() {
        log::warn!(
            "`secrets` is deprecated and ignored, placeholders are resolved automatically: {}",
            config.secrets.join(", ")
        );
    }

    let names: Vec<&str> = placeholders(&config.values)
        .into_iter()
        .chain(placeholders(&config.string_values))
        .map(|(_, name)| name)
        .collect();
    if !names.is_empty() {
        log::debug!("Resolving placeholders: {}", names.join(", "));
    }

    let mut service_account = fallback(&config.service_account, "SERVICE_ACCOUNT");
    if service_account.is_empty() {
        service_account = "helm".to_string();
    }

    Config {
        values: resolve(&config.values, prefix, env),
        string_values: resolve(&config.string_values, prefix, env),
        api_server: fallback(&config.api_server, "API_SERVER"),
        token: fallback(&config.token, "KUBERNETES_TOKEN"),
        certificate: fallback(&config.certificate, "KUBERNETES_CERTIFICATE"),
        service_account,
        ..config.clone()
    }
}
