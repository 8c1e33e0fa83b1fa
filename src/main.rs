use anyhow::Result;
use live_l10n::binding::{
    BindingRecord, CurrentLanguageBroadcaster, Element, PropertyId, PropertyOwner, PropertyValue,
    TranslationBinding, ValueObserver,
};
use live_l10n::config::Config;
use live_l10n::i18n::{
    LocalizationMetrics, ProviderPath, ResourceBundle, ResourceCatalog, ResourceContainer,
};
use std::sync::Arc;
use tracing::info;

const DEMO_STRINGS: &str = r#"{
    "": { "Greeting": "Hello", "Farewell": "Goodbye", "Title": "Live localization" },
    "de": { "Greeting": "Hallo", "Farewell": "Auf Wiedersehen" },
    "de-AT": { "Greeting": "Servus" },
    "fr": { "Greeting": "Bonjour", "Farewell": "Au revoir" }
}"#;

const KEY: PropertyId = PropertyId::new("Key");

fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive.parse()?),
        )
        .init();

    info!("Starting localization demo in {}", config.default_language);

    let catalog = ResourceCatalog::new();
    let bundle = ResourceBundle::from_json(DEMO_STRINGS)?;
    catalog.register(ResourceContainer::new("demo").with_bundle("Demo.Strings", bundle));
    let translator = ProviderPath::parse("bundle://demo;Demo.Strings")?.open(&catalog)?;

    let broadcaster = CurrentLanguageBroadcaster::global();
    broadcaster.set_language(config.default_language.clone());

    let window = Element::root("window");
    window.set_value(PropertyId::TRANSLATOR, PropertyValue::Translator(translator));
    let label = Element::child_of(&window, "label");
    label.set_value(KEY, "Greeting".into());

    let title = TranslationBinding::attach(
        window.clone(),
        BindingRecord::static_once("Title"),
        broadcaster,
    )?;
    let greeting = TranslationBinding::attach(
        label.clone(),
        BindingRecord::dynamic("Greeting").with_string_format("[{0}]")?,
        broadcaster,
    )?;
    let keyed = TranslationBinding::attach(
        label.clone(),
        BindingRecord::key_bound(label.clone(), KEY),
        broadcaster,
    )?;

    let log_greeting: Arc<ValueObserver> =
        Arc::new(|value: &Option<String>| info!("Greeting is now {:?}", value));
    let _greeting_subscription = greeting.subscribe(&log_greeting);

    info!(
        "Initial values: title={:?} greeting={:?} keyed={:?}",
        title.value(),
        greeting.value(),
        keyed.value()
    );

    for language in ["de", "de-AT", "fr"] {
        broadcaster.set_language(language.parse()?);
    }

    label.set_value(KEY, "Farewell".into());
    info!("Key switched: keyed={:?}", keyed.value());

    label.set_value(PropertyId::LANGUAGE, "de".parse::<live_l10n::LanguageTag>()?.into());
    info!(
        "Label pinned to German: greeting={:?} keyed={:?}",
        greeting.value(),
        keyed.value()
    );

    drop(keyed);
    drop(greeting);
    drop(title);

    let report = LocalizationMetrics::global().report();
    info!("Metrics: {}", serde_json::to_string(&report)?);

    Ok(())
}
