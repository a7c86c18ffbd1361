//! Configuration helpers: API key resolution from the environment plus
//! provider-style defaults for [`crate::generator::HttpGenerator`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Hosted generative backends this crate ships OpenAI-compatible defaults
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn default_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
            Provider::Gemini => "gemini-1.5-flash",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open-ai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" | "google" => Ok(Provider::Gemini),
            _ => Err(format!("unknown provider: {s}")),
        }
    }
}

/// Resolve the base URL: `GENFLOW_BASE_URL` env var, then the provider's
/// default, then `fallback`, then OpenAI's default.
pub fn get_base_url(provider: Option<Provider>, fallback: Option<&str>) -> String {
    if let Ok(url) = env::var("GENFLOW_BASE_URL") {
        return url;
    }
    if let Some(p) = provider {
        return p.default_url().to_string();
    }
    fallback.unwrap_or(Provider::OpenAi.default_url()).to_string()
}

/// Resolve the model name: `GENFLOW_MODEL` (if `prefer_env`), then `fallback`.
pub fn get_model(fallback: Option<&str>, prefer_env: bool) -> Option<String> {
    if prefer_env {
        if let Ok(model) = env::var("GENFLOW_MODEL") {
            return Some(model);
        }
    }
    fallback.map(|s| s.to_string())
}

/// Default per-request timeout for [`crate::generator::HttpGenerator`] when
/// none is specified explicitly.
pub fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

/// Parse `GENFLOW_API_KEYS` (comma- or newline-separated) into a non-empty
/// list of raw key strings. Blank entries (consecutive separators, trailing
/// newline) are dropped. Returns an empty vec if the variable is unset, empty,
/// or contains only blank entries — callers should surface this as a
/// configuration error via [`crate::key_manager::KeyManager::new`], which
/// already rejects an empty key list.
pub fn api_keys_from_env() -> Vec<String> {
    env::var("GENFLOW_API_KEYS")
        .map(|raw| {
            raw.split(|c| c == ',' || c == '\n')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable mutation is process-global; serialize these tests
    // so they don't race each other's set/remove calls.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn provider_default_urls_are_openai_compatible() {
        assert_eq!(Provider::Gemini.default_url(), "https://generativelanguage.googleapis.com/v1beta/openai");
        assert_eq!(Provider::OpenAi.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn provider_from_str_is_case_insensitive() {
        assert_eq!("GEMINI".parse::<Provider>(), Ok(Provider::Gemini));
        assert!("unknown".parse::<Provider>().is_err());
    }

    #[test]
    fn base_url_falls_back_to_provider_default_without_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::remove_var("GENFLOW_BASE_URL") };
        assert_eq!(get_base_url(Some(Provider::Anthropic), None), Provider::Anthropic.default_url());
    }

    #[test]
    fn api_keys_from_env_splits_on_commas_and_newlines_and_trims() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::set_var("GENFLOW_API_KEYS", "key-a, key-b\nkey-c\n\n") };
        let keys = api_keys_from_env();
        unsafe { env::remove_var("GENFLOW_API_KEYS") };
        assert_eq!(keys, vec!["key-a".to_string(), "key-b".to_string(), "key-c".to_string()]);
    }

    #[test]
    fn api_keys_from_env_is_empty_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::remove_var("GENFLOW_API_KEYS") };
        assert!(api_keys_from_env().is_empty());
    }
}
