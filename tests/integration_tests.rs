//! Integration tests for the live localization crate
//!
//! These tests drive complete flows through the public API: translator
//! resolution from bundles, language and translator changes reaching
//! bindings, and the release of shared subscriptions.

use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use live_l10n::binding::{
    Application, BindingKind, BindingRecord, CurrentLanguageBroadcaster, Element, PropertyId,
    PropertyOwner, PropertyValue, ScopedPropertySource, TranslationBinding, ValueObserver,
};
use live_l10n::i18n::{
    LanguageTag, ProviderPath, ResourceBundle, ResourceCatalog, ResourceContainer,
    StaticTranslations, TranslationSource,
};
use live_l10n::observer::{Callback, SubscriptionHandle, WeakObserverRegistry};
use live_l10n::LocalizationError;

// ==================== Test Helpers ====================

const STRINGS_JSON: &str = r#"{
    "": { "Greeting": "Hello", "Farewell": "Goodbye" },
    "de": { "Greeting": "Hallo", "Farewell": "Tschüss" },
    "fr": { "Greeting": "Bonjour" }
}"#;

fn tag(value: &str) -> LanguageTag {
    LanguageTag::parse(value).expect("valid tag")
}

fn catalog() -> ResourceCatalog {
    let catalog = ResourceCatalog::new();
    catalog.register(ResourceContainer::new("app").with_bundle(
        "App.Strings",
        ResourceBundle::from_json(STRINGS_JSON).expect("valid bundle"),
    ));
    catalog
}

fn bundle_translator() -> Arc<dyn TranslationSource> {
    ProviderPath::parse("bundle://app;App.Strings")
        .and_then(|path| path.open(&catalog()))
        .expect("translator opens")
}

fn static_translator(culture: &str, key: &str, value: &str) -> Arc<dyn TranslationSource> {
    Arc::new(StaticTranslations::new().with(&tag(culture), key, value))
}

fn value_recorder() -> (Arc<Mutex<Vec<Option<String>>>>, Arc<ValueObserver>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    let observer: Arc<ValueObserver> =
        Arc::new(move |value: &Option<String>| log_clone.lock().unwrap().push(value.clone()));
    (log, observer)
}

// ==================== Resolution Flow Tests ====================

#[test]
fn test_bundle_translator_with_culture_fallback() {
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("de-CH")));
    let window = Element::root("window");
    window.set_value(PropertyId::TRANSLATOR, bundle_translator().into());

    let greeting =
        TranslationBinding::attach(window.clone(), BindingRecord::dynamic("Greeting"), &broadcaster)
            .unwrap();
    assert_eq!(greeting.value(), Some("Hallo".to_string()));

    broadcaster.set_language(tag("fr"));
    assert_eq!(greeting.value(), Some("Bonjour".to_string()));

    broadcaster.set_language(tag("it"));
    assert_eq!(greeting.value(), Some("Hello".to_string()));
}

#[test]
fn test_missing_translation_without_fallback_shows_key() {
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
    let window = Element::root("window");
    window.set_value(PropertyId::TRANSLATOR, static_translator("en", "Other", "x").into());

    let binding =
        TranslationBinding::attach(window.clone(), BindingRecord::dynamic("Greeting"), &broadcaster)
            .unwrap();
    assert_eq!(binding.value(), Some("Greeting".to_string()));
}

#[test]
fn test_no_translator_uses_fallback_value() {
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
    let window = Element::root("window");

    let record = BindingRecord::dynamic("Greeting").with_fallback("F");
    let binding = TranslationBinding::attach(window.clone(), record, &broadcaster).unwrap();
    assert_eq!(binding.value(), Some("F".to_string()));

    broadcaster.set_language(tag("de"));
    assert_eq!(binding.value(), Some("F".to_string()));
}

#[test]
fn test_no_translator_uses_fallback_value_formatted() {
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
    let window = Element::root("window");

    let record = BindingRecord::dynamic("Greeting")
        .with_fallback("Hi there")
        .with_string_format("<{0,10}>")
        .unwrap();
    let binding = TranslationBinding::attach(window.clone(), record, &broadcaster).unwrap();
    assert_eq!(binding.value(), Some("<  Hi there>".to_string()));
}

#[test]
fn test_provider_path_errors_surface_at_construction() {
    let err = ProviderPath::parse("bundle://app;Missing")
        .and_then(|path| path.open(&catalog()))
        .unwrap_err();
    assert!(matches!(err, LocalizationError::ResourceLookup { .. }));
    assert!(err.to_string().contains("Missing"));

    let err = ProviderPath::parse("resx://app;App.Strings").unwrap_err();
    assert!(matches!(err, LocalizationError::UnknownProviderScheme { .. }));
}

// ==================== Change Propagation Tests ====================

#[test]
fn test_translator_swap_updates_dynamic_binding_once() {
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
    let window = Element::root("window");
    let label = Element::child_of(&window, "label");
    window.set_value(PropertyId::TRANSLATOR, static_translator("en", "Greeting", "Hi").into());

    let binding =
        TranslationBinding::attach(label.clone(), BindingRecord::dynamic("Greeting"), &broadcaster)
            .unwrap();
    let (log, observer) = value_recorder();
    let _subscription = binding.subscribe(&observer);

    window.set_value(PropertyId::TRANSLATOR, static_translator("en", "Greeting", "Hello").into());

    assert_eq!(binding.value(), Some("Hello".to_string()));
    assert_eq!(*log.lock().unwrap(), vec![Some("Hello".to_string())]);
}

#[test]
fn test_update_matrix_across_kinds() {
    const KEY: PropertyId = PropertyId::new("Key");
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
    let window = Element::root("window");
    window.set_value(PropertyId::TRANSLATOR, bundle_translator().into());
    window.set_value(KEY, "Greeting".into());

    let static_once = TranslationBinding::attach(
        window.clone(),
        BindingRecord::static_once("Greeting"),
        &broadcaster,
    )
    .unwrap();
    let dynamic = TranslationBinding::attach(
        window.clone(),
        BindingRecord::new(BindingKind::DynamicTracked).with_key("Greeting"),
        &broadcaster,
    )
    .unwrap();
    let key_bound = TranslationBinding::attach(
        window.clone(),
        BindingRecord::key_bound(window.clone(), KEY),
        &broadcaster,
    )
    .unwrap();

    for binding in [&static_once, &dynamic, &key_bound] {
        assert_eq!(binding.value(), Some("Hello".to_string()));
    }

    // Language change
    broadcaster.set_language(tag("de"));
    assert_eq!(static_once.value(), Some("Hello".to_string()));
    assert_eq!(dynamic.value(), Some("Hallo".to_string()));
    assert_eq!(key_bound.value(), Some("Hallo".to_string()));

    // Key change
    window.set_value(KEY, "Farewell".into());
    assert_eq!(static_once.value(), Some("Hello".to_string()));
    assert_eq!(dynamic.value(), Some("Hallo".to_string()));
    assert_eq!(key_bound.value(), Some("Tschüss".to_string()));

    // Translator change
    window.set_value(PropertyId::TRANSLATOR, static_translator("de", "Farewell", "Ciao").into());
    assert_eq!(static_once.value(), Some("Hello".to_string()));
    assert_eq!(dynamic.value(), Some("Greeting".to_string()));
    assert_eq!(key_bound.value(), Some("Ciao".to_string()));
}

#[test]
fn test_local_language_shadows_ancestor() {
    let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
    let window = Element::root("window");
    let panel = Element::child_of(&window, "panel");
    let label = Element::child_of(&panel, "label");
    window.set_value(PropertyId::TRANSLATOR, bundle_translator().into());
    panel.set_value(PropertyId::LANGUAGE, tag("fr").into());

    let binding =
        TranslationBinding::attach(label.clone(), BindingRecord::dynamic("Greeting"), &broadcaster)
            .unwrap();
    assert_eq!(binding.value(), Some("Bonjour".to_string()));

    // The panel's language wins over the application's.
    broadcaster.set_language(tag("de"));
    assert_eq!(binding.value(), Some("Bonjour".to_string()));

    panel.clear_value(PropertyId::LANGUAGE);
    assert_eq!(binding.value(), Some("Hallo".to_string()));
}

#[test]
#[serial]
fn test_global_broadcaster_drives_bindings() {
    let broadcaster = CurrentLanguageBroadcaster::global();
    broadcaster.set_language(tag("en"));

    let window = Element::root("window");
    window.set_value(PropertyId::TRANSLATOR, bundle_translator().into());
    let binding =
        TranslationBinding::attach(window.clone(), BindingRecord::dynamic("Greeting"), broadcaster)
            .unwrap();

    Application::global().set_current_language(tag("de"));
    assert_eq!(binding.value(), Some("Hallo".to_string()));

    drop(binding);
    broadcaster.set_language(tag("en"));
    assert!(!broadcaster.is_subscribed());
}

// ==================== Lifetime Tests ====================

#[test]
fn test_dropped_callback_is_pruned_on_next_notify() {
    let registry: WeakObserverRegistry<u32> = WeakObserverRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = Arc::clone(&calls);
    let kept: Arc<Callback<u32>> = Arc::new(move |_: &u32| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });
    let dropped: Arc<Callback<u32>> = Arc::new(|_: &u32| {});

    let _kept_handle = registry.register(&kept);
    let dropped_handle = registry.register(&dropped);
    drop(dropped);

    assert_eq!(registry.len(), 2);
    registry.notify_all(&1);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);
    assert!(dropped_handle.is_disposed());
}

#[test]
fn test_property_source_refcount_and_eviction() {
    let window = Element::root("window");
    let owner: Arc<dyn PropertyOwner> = window.clone();

    let first = ScopedPropertySource::get_or_create(Arc::clone(&owner), PropertyId::LANGUAGE);
    let second = ScopedPropertySource::get_or_create(Arc::clone(&owner), PropertyId::LANGUAGE);
    assert!(first.ptr_eq(&second));

    let callback: Arc<Callback<live_l10n::binding::PropertyChanged>> =
        Arc::new(|_: &live_l10n::binding::PropertyChanged| {});
    let handles: Vec<SubscriptionHandle> =
        (0..2).map(|_| first.add_observer(&callback)).collect();
    assert_eq!(window.change_observer_count(), 1);

    for handle in &handles {
        handle.dispose();
    }
    assert_eq!(window.change_observer_count(), 0);

    let third = ScopedPropertySource::get_or_create(owner, PropertyId::LANGUAGE);
    assert!(!third.ptr_eq(&first));
}

#[test]
fn test_dropping_bindings_releases_everything() {
    let app = Application::new(tag("en"));
    let broadcaster = CurrentLanguageBroadcaster::new(app.clone());
    let window = Element::root("window");

    let bindings: Vec<TranslationBinding> = ["Greeting", "Farewell", "Title"]
        .iter()
        .map(|key| {
            TranslationBinding::attach(window.clone(), BindingRecord::dynamic(key), &broadcaster)
                .unwrap()
        })
        .collect();
    assert_eq!(app.listener_count(), 1);
    assert_eq!(broadcaster.listener_count(), 3);

    drop(bindings);
    assert_eq!(app.listener_count(), 0);
    assert_eq!(window.change_observer_count(), 0);
}

#[test]
fn test_translator_value_identity() {
    let translator = bundle_translator();
    let window = Element::root("window");
    window.set_value(PropertyId::TRANSLATOR, PropertyValue::Translator(Arc::clone(&translator)));

    let stored = window
        .get_value(PropertyId::TRANSLATOR)
        .and_then(|value| value.as_translator().cloned())
        .unwrap();
    assert!(std::ptr::addr_eq(Arc::as_ptr(&stored), Arc::as_ptr(&translator)));
}
