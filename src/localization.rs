//! Fluent-based localization for user-facing bot messages.

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, LazyLock};
use tracing::error;
use unic_langid::LanguageIdentifier;

/// Languages shipped under ./locales
const SUPPORTED_LANGUAGES: [&str; 1] = ["en"];
const FALLBACK_LANGUAGE: &str = "en";

/// Localization manager for the bot's message catalog.
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();
        for lang in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = lang.parse()?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(lang.to_string(), Arc::new(bundle));
        }
        Ok(Self { bundles })
    }

    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Bidi isolation marks would show up as stray characters in chat
        bundle.set_use_isolating(false);
        let resource_path = format!("./locales/{locale}/main.ftl");
        let content = fs::read_to_string(&resource_path)?;
        let resource = match FluentResource::try_new(content) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                error!(path = %resource_path, ?errors, "Fluent resource parsed with errors");
                resource
            }
        };
        let _ = bundle.add_resource(resource);
        Ok(bundle)
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Get a localized message, falling back to English for unknown languages.
    pub fn get_message_in_language(
        &self,
        key: &str,
        lang: &str,
        args: Option<&FluentArgs>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(lang)
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        let message = match bundle.get_message(key) {
            Some(message) => message,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match message.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let mut errors = vec![];
        bundle.format_pattern(pattern, args, &mut errors).into_owned()
    }
}

static MANAGER: LazyLock<Option<LocalizationManager>> =
    LazyLock::new(|| match LocalizationManager::new() {
        Ok(manager) => Some(manager),
        Err(err) => {
            error!(error = %err, "Failed to initialize localization");
            None
        }
    });

/// Force bundle loading at startup so missing resources surface early.
pub fn init_localization() -> Result<()> {
    if MANAGER.is_none() {
        anyhow::bail!("localization resources failed to load");
    }
    Ok(())
}

/// Map a Telegram language code onto a supported language.
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return FALLBACK_LANGUAGE;
    };
    let base = code.split(['-', '_']).next().unwrap_or(code);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| **lang == base)
        .copied()
        .unwrap_or(FALLBACK_LANGUAGE)
}

/// Convenience function to get a localized message.
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    let lang = detect_language(language_code);
    match MANAGER.as_ref() {
        Some(manager) => manager.get_message_in_language(key, lang, None),
        None => format!("Missing translation: {key}"),
    }
}

/// Convenience function to get a localized message with arguments.
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let lang = detect_language(language_code);
    let mut fluent_args = FluentArgs::new();
    for (name, value) in args {
        fluent_args.set(*name, *value);
    }
    match MANAGER.as_ref() {
        Some(manager) => manager.get_message_in_language(key, lang, Some(&fluent_args)),
        None => format!("Missing translation: {key}"),
    }
}
