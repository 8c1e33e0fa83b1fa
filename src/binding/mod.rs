//! Live bindings between owners, translators and the application language.
//!
//! # Architecture
//!
//! - `owner`: the `PropertyOwner` contract and the in-memory `Element` tree
//! - `property_source`: shared per (owner, property) change observation
//! - `application`: current UI language and its listeners
//! - `broadcaster`: fan-out of language changes with one upstream subscription
//! - `policy`: binding records, the update matrix and text resolution
//! - `translation`: `TranslationBinding`, which wires all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use live_l10n::binding::{
//!     BindingRecord, CurrentLanguageBroadcaster, Element, TranslationBinding,
//! };
//!
//! let window = Element::root("window");
//! let binding = TranslationBinding::attach(
//!     window.clone(),
//!     BindingRecord::dynamic("Greeting"),
//!     CurrentLanguageBroadcaster::global(),
//! )?;
//! println!("{:?}", binding.value());
//! ```

mod application;
mod broadcaster;
mod owner;
mod policy;
mod property_source;
mod translation;

pub use application::{installed_language, Application, CultureChanged, LanguageChangedFn};
pub use broadcaster::CurrentLanguageBroadcaster;
pub use owner::{Element, OwnerId, PropertyChanged, PropertyId, PropertyOwner, PropertyValue};
pub use policy::{BindingKind, BindingRecord, ChangeTrigger, KeySource, TranslationResolutionPolicy};
pub use property_source::ScopedPropertySource;
pub use translation::{TranslationBinding, ValueObserver};
