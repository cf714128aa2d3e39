//! Provider settings resolution across flags, environment, frontmatter, and
//! user settings.

use crate::settings::UserSettings;
use crate::types::ProviderBlock;

/// Per-run overrides from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    /// `--provider`
    pub provider: Option<String>,
    /// `--model`
    pub model: Option<String>,
    /// API key passed programmatically.
    pub api_key: Option<String>,
    /// Base URL passed programmatically.
    pub base_url: Option<String>,
}

/// Fully resolved provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    /// Provider name, lower-cased. Defaults to `anthropic`.
    pub provider: String,
    /// Model override. `None` means the provider's default model.
    pub model: Option<String>,
    /// API key, if any layer supplied one.
    pub api_key: Option<String>,
    /// Custom endpoint base URL.
    pub base_url: Option<String>,
}

/// Default provider when no layer names one.
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Resolves provider settings.
///
/// Precedence, highest first: flags, environment (`SKC_PROVIDER`,
/// `SKC_MODEL`, `SKC_API_KEY`, `SKC_BASE_URL`, then the provider's own key
/// variable), frontmatter, user settings. `env` looks up one variable and is
/// injectable for tests.
pub fn resolve_provider(
    flags: &ProviderOverrides,
    frontmatter: &ProviderBlock,
    settings: &UserSettings,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedProvider {
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let pick = |flag: &Option<String>, var: &str, fm: &Option<String>, user: &Option<String>| {
        flag.clone()
            .or_else(|| env(var))
            .or_else(|| fm.clone())
            .or_else(|| user.clone())
            .filter(|v| !v.trim().is_empty())
    };

    let provider = pick(
        &flags.provider,
        "SKC_PROVIDER",
        &frontmatter.provider,
        &settings.provider,
    )
    .map(|p| p.trim().to_lowercase())
    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

    let vendor_key_var = if provider.contains("openai") {
        "OPENAI_API_KEY"
    } else {
        "ANTHROPIC_API_KEY"
    };
    let api_key = flags
        .api_key
        .clone()
        .or_else(|| env("SKC_API_KEY"))
        .or_else(|| env(vendor_key_var))
        .or_else(|| frontmatter.api_key.clone())
        .or_else(|| settings.api_key.clone())
        .filter(|v| !v.trim().is_empty());

    ResolvedProvider {
        model: pick(&flags.model, "SKC_MODEL", &frontmatter.model, &settings.model),
        base_url: pick(
            &flags.base_url,
            "SKC_BASE_URL",
            &frontmatter.base_url,
            &settings.base_url,
        ),
        provider,
        api_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_to_anthropic() {
        let r = resolve_provider(
            &ProviderOverrides::default(),
            &ProviderBlock::default(),
            &UserSettings::default(),
            env_from(&[]),
        );
        assert_eq!(r.provider, "anthropic");
        assert!(r.model.is_none());
        assert!(r.api_key.is_none());
    }

    #[test]
    fn flag_beats_env_beats_frontmatter_beats_settings() {
        let fm = ProviderBlock {
            model: Some("fm-model".into()),
            ..ProviderBlock::default()
        };
        let user = UserSettings {
            model: Some("user-model".into()),
            ..UserSettings::default()
        };
        let env = [("SKC_MODEL", "env-model")];

        let flags = ProviderOverrides {
            model: Some("flag-model".into()),
            ..ProviderOverrides::default()
        };
        assert_eq!(resolve_provider(&flags, &fm, &user, env_from(&env)).model.as_deref(), Some("flag-model"));

        let none = ProviderOverrides::default();
        assert_eq!(resolve_provider(&none, &fm, &user, env_from(&env)).model.as_deref(), Some("env-model"));
        assert_eq!(resolve_provider(&none, &fm, &user, env_from(&[])).model.as_deref(), Some("fm-model"));
        assert_eq!(
            resolve_provider(&none, &ProviderBlock::default(), &user, env_from(&[])).model.as_deref(),
            Some("user-model")
        );
    }

    #[test]
    fn vendor_key_follows_provider() {
        let env = env_from(&[("OPENAI_API_KEY", "oa"), ("ANTHROPIC_API_KEY", "an")]);
        let flags = ProviderOverrides {
            provider: Some("OpenAI".into()),
            ..ProviderOverrides::default()
        };
        let r = resolve_provider(&flags, &ProviderBlock::default(), &UserSettings::default(), env);
        assert_eq!(r.provider, "openai");
        assert_eq!(r.api_key.as_deref(), Some("oa"));
    }

    #[test]
    fn skc_key_beats_vendor_key() {
        let env = env_from(&[("SKC_API_KEY", "skc"), ("ANTHROPIC_API_KEY", "an")]);
        let r = resolve_provider(
            &ProviderOverrides::default(),
            &ProviderBlock::default(),
            &UserSettings::default(),
            env,
        );
        assert_eq!(r.api_key.as_deref(), Some("skc"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let user = UserSettings {
            provider: Some("openai".into()),
            ..UserSettings::default()
        };
        let r = resolve_provider(
            &ProviderOverrides::default(),
            &ProviderBlock::default(),
            &user,
            env_from(&[("SKC_PROVIDER", "  ")]),
        );
        assert_eq!(r.provider, "openai");
    }
}
