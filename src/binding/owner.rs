//! Property owners: the objects bindings attach to.
//!
//! [`PropertyOwner`] is the contract the localization core needs from a UI
//! object: named property get/set, inherited lookup, and a change stream.
//! [`Element`] is an in-memory implementation organised as a tree, where
//! inheritable properties cascade from ancestors to descendants.

use crate::i18n::{LanguageTag, TranslationSource};
use crate::observer::{lock, Callback, SubscriptionHandle, WeakObserverRegistry};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::trace;

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique owner identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocate a fresh identity. Owner implementations call this once at
    /// construction.
    pub fn next() -> Self {
        OwnerId(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a property. Identity is the name; `inherits` decides whether
/// an unset value is looked up on the owner's ancestors.
#[derive(Debug, Clone, Copy)]
pub struct PropertyId {
    name: &'static str,
    inherits: bool,
}

impl PropertyId {
    /// The translator used to resolve keys. Inherited.
    pub const TRANSLATOR: PropertyId = PropertyId::inherited("TranslationProvider");

    /// The language translations are resolved in. Inherited.
    pub const LANGUAGE: PropertyId = PropertyId::inherited("Language");

    /// A property that is not inherited.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            inherits: false,
        }
    }

    pub const fn inherited(name: &'static str) -> Self {
        Self {
            name,
            inherits: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inherits(&self) -> bool {
        self.inherits
    }
}

impl PartialEq for PropertyId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PropertyId {}

impl Hash for PropertyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A property value.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Text(String),
    Language(LanguageTag),
    /// Compared by identity, not by content.
    Translator(Arc<dyn TranslationSource>),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_language(&self) -> Option<&LanguageTag> {
        match self {
            PropertyValue::Language(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_translator(&self) -> Option<&Arc<dyn TranslationSource>> {
        match self {
            PropertyValue::Translator(translator) => Some(translator),
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Text(a), PropertyValue::Text(b)) => a == b,
            (PropertyValue::Language(a), PropertyValue::Language(b)) => a == b,
            (PropertyValue::Translator(a), PropertyValue::Translator(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<LanguageTag> for PropertyValue {
    fn from(value: LanguageTag) -> Self {
        PropertyValue::Language(value)
    }
}

impl From<Arc<dyn TranslationSource>> for PropertyValue {
    fn from(value: Arc<dyn TranslationSource>) -> Self {
        PropertyValue::Translator(value)
    }
}

/// Native change notification raised by an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChanged {
    pub owner: OwnerId,
    pub property: PropertyId,
    pub old: Option<PropertyValue>,
    pub new: Option<PropertyValue>,
}

/// The capabilities the localization core needs from an owner object.
pub trait PropertyOwner: Send + Sync {
    fn owner_id(&self) -> OwnerId;

    /// The value set directly on this owner, ignoring inheritance.
    fn local_value(&self, property: PropertyId) -> Option<PropertyValue>;

    /// The effective value: the local value, or for inheritable properties
    /// the nearest ancestor's value.
    fn get_value(&self, property: PropertyId) -> Option<PropertyValue>;

    fn set_value(&self, property: PropertyId, value: PropertyValue);

    fn clear_value(&self, property: PropertyId);

    /// Observe changes of the effective value of any property. The callback
    /// is held weakly; keep the `Arc` alive to stay subscribed.
    fn observe_changes(&self, callback: &Arc<Callback<PropertyChanged>>) -> SubscriptionHandle;
}

/// An in-memory owner that lives in a tree.
///
/// Children hold their parent strongly; parents track children weakly.
pub struct Element {
    id: OwnerId,
    name: String,
    parent: Option<Arc<Element>>,
    children: Mutex<Vec<Weak<Element>>>,
    values: Mutex<HashMap<PropertyId, PropertyValue>>,
    changes: WeakObserverRegistry<PropertyChanged>,
}

impl Element {
    /// Create an element without a parent.
    pub fn root(name: &str) -> Arc<Element> {
        Arc::new(Self::build(name, None))
    }

    /// Create an element below `parent`.
    pub fn child_of(parent: &Arc<Element>, name: &str) -> Arc<Element> {
        let child = Arc::new(Self::build(name, Some(Arc::clone(parent))));
        let mut children = lock(&parent.children);
        children.retain(|existing| existing.strong_count() > 0);
        children.push(Arc::downgrade(&child));
        drop(children);
        child
    }

    fn build(name: &str, parent: Option<Arc<Element>>) -> Element {
        Element {
            id: OwnerId::next(),
            name: name.to_string(),
            parent,
            children: Mutex::new(Vec::new()),
            values: Mutex::new(HashMap::new()),
            changes: WeakObserverRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Element>> {
        self.parent.as_ref()
    }

    /// Number of native change observers, including dead ones not yet
    /// pruned.
    pub fn change_observer_count(&self) -> usize {
        self.changes.len()
    }

    fn update_local(&self, property: PropertyId, value: Option<PropertyValue>) {
        let old = self.get_value(property);
        {
            let mut values = lock(&self.values);
            match value {
                Some(value) => values.insert(property, value),
                None => values.remove(&property),
            };
        }
        let new = self.get_value(property);

        if old != new {
            self.raise_changed(property, old, new);
        }
    }

    fn raise_changed(
        &self,
        property: PropertyId,
        old: Option<PropertyValue>,
        new: Option<PropertyValue>,
    ) {
        trace!(
            "Property '{}' changed on element '{}' ({})",
            property.name(),
            self.name,
            self.id
        );

        self.changes.notify_all(&PropertyChanged {
            owner: self.id,
            property,
            old: old.clone(),
            new: new.clone(),
        });

        if !property.inherits() {
            return;
        }

        let children: Vec<Arc<Element>> = {
            let mut children = lock(&self.children);
            children.retain(|child| child.strong_count() > 0);
            children.iter().filter_map(Weak::upgrade).collect()
        };
        for child in children {
            // A local value shadows the inherited one.
            if child.local_value(property).is_none() {
                child.raise_changed(property, old.clone(), new.clone());
            }
        }
    }
}

impl PropertyOwner for Element {
    fn owner_id(&self) -> OwnerId {
        self.id
    }

    fn local_value(&self, property: PropertyId) -> Option<PropertyValue> {
        lock(&self.values).get(&property).cloned()
    }

    fn get_value(&self, property: PropertyId) -> Option<PropertyValue> {
        if let Some(value) = self.local_value(property) {
            return Some(value);
        }
        if property.inherits() {
            return self
                .parent
                .as_ref()
                .and_then(|parent| parent.get_value(property));
        }
        None
    }

    fn set_value(&self, property: PropertyId, value: PropertyValue) {
        self.update_local(property, Some(value));
    }

    fn clear_value(&self, property: PropertyId) {
        self.update_local(property, None);
    }

    fn observe_changes(&self, callback: &Arc<Callback<PropertyChanged>>) -> SubscriptionHandle {
        self.changes.register(callback)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|parent| parent.id))
            .finish_non_exhaustive()
    }
}
