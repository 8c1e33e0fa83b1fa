//! Localization metrics and observability module.
//!
//! This module tracks how resolutions end (translated, fallback, no
//! translator) and how many dead observers the weak registries pruned.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global localization metrics singleton.
pub struct LocalizationMetrics {
    /// Number of resolutions performed (construction and re-resolution)
    resolutions: AtomicUsize,

    /// Number of resolutions where the translator provided a value
    translation_hits: AtomicUsize,

    /// Number of resolutions where the translator had no value for the key
    missing_translations: AtomicUsize,

    /// Number of resolutions with no translator available at all
    untranslated: AtomicUsize,

    /// Number of registry entries pruned because their callback was dropped
    pruned_observers: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<LocalizationMetrics> = OnceLock::new();

impl Default for LocalizationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalizationMetrics {
    /// Create a standalone set of counters, all zero.
    pub fn new() -> Self {
        Self {
            resolutions: AtomicUsize::new(0),
            translation_hits: AtomicUsize::new(0),
            missing_translations: AtomicUsize::new(0),
            untranslated: AtomicUsize::new(0),
            pruned_observers: AtomicUsize::new(0),
        }
    }

    /// Get the global localization metrics instance.
    ///
    /// This is the instance the registries and resolution policy record into.
    pub fn global() -> &'static LocalizationMetrics {
        METRICS.get_or_init(LocalizationMetrics::new)
    }

    pub fn record_translation_hit(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.translation_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_translation(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.missing_translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_untranslated(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.untranslated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pruned_observers(&self, count: usize) {
        self.pruned_observers.fetch_add(count, Ordering::Relaxed);
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn translation_hits(&self) -> usize {
        self.translation_hits.load(Ordering::Relaxed)
    }

    pub fn missing_translations(&self) -> usize {
        self.missing_translations.load(Ordering::Relaxed)
    }

    pub fn untranslated(&self) -> usize {
        self.untranslated.load(Ordering::Relaxed)
    }

    pub fn pruned_observers(&self) -> usize {
        self.pruned_observers.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let resolutions = self.resolutions();
        let hits = self.translation_hits();
        let hit_rate = if resolutions > 0 {
            (hits as f64 / resolutions as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolutions,
            translation_hits: hits,
            missing_translations: self.missing_translations(),
            untranslated: self.untranslated(),
            translation_hit_rate: hit_rate,
            pruned_observers: self.pruned_observers(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.translation_hits.store(0, Ordering::Relaxed);
        self.missing_translations.store(0, Ordering::Relaxed);
        self.untranslated.store(0, Ordering::Relaxed);
        self.pruned_observers.store(0, Ordering::Relaxed);
    }
}

/// Metrics report containing current localization statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub resolutions: usize,
    pub translation_hits: usize,
    pub missing_translations: usize,
    pub untranslated: usize,

    /// Translation hit rate as a percentage (0-100)
    pub translation_hit_rate: f64,

    pub pruned_observers: usize,
}
