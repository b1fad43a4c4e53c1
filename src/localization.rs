//! # Localization Module
//!
//! Fluent-based message catalog for user-facing bot strings. Catalogs live in
//! `locales/<lang>/main.ftl`; English is the fallback language.

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::sync::OnceLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ru"];
const LOCALES_DIR: &str = "./locales";

/// Localization manager for the quote card bot
#[derive(Default)]
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a manager with every supported language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = lang.parse()?;
            bundles.insert(lang.to_string(), Self::create_bundle(&locale));
        }

        Ok(Self { bundles })
    }

    fn create_bundle(locale: &LanguageIdentifier) -> FluentBundle<FluentResource> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Captions go through MarkdownV2, isolation marks would end up in the text
        bundle.set_use_isolating(false);

        let resource_path = format!("{LOCALES_DIR}/{locale}/main.ftl");
        match fs::read_to_string(&resource_path) {
            Ok(content) => match FluentResource::try_new(content) {
                Ok(resource) => {
                    if let Err(errors) = bundle.add_resource(resource) {
                        warn!(path = %resource_path, ?errors, "Duplicate messages in catalog");
                    }
                }
                Err((_, errors)) => {
                    warn!(path = %resource_path, ?errors, "Failed to parse message catalog");
                }
            },
            Err(e) => warn!(path = %resource_path, error = %e, "Message catalog not found"),
        }

        bundle
    }

    /// Get a message in a specific language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match bundle.get_message(key).and_then(|msg| msg.value()) {
            Some(pattern) => pattern,
            None => return format!("Missing translation: {key}"),
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Load message catalogs eagerly at startup
pub fn init_localization() -> Result<()> {
    let manager = LocalizationManager::new()?;
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager, loading it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| LocalizationManager::new().unwrap_or_default())
}

/// Map a Telegram `language_code` onto a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let primary = language_code
        .and_then(|code| code.split(['-', '_']).next())
        .map(|code| code.to_lowercase());

    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| primary.as_deref() == Some(**lang))
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Get a localized message for the user's language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Get a localized message with arguments for the user's language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(
        key,
        detect_language(language_code),
        Some(&args_map),
    )
}
