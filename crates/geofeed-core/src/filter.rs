//! Composable entry filters.
//!
//! A [`FilterChain`] always starts with the base stages (geometry present,
//! then distance when a radius is configured); adapters append their own
//! domain stages afterwards. Every stage is inclusive at its boundary and
//! treats a missing value as a failure.

use std::fmt;

use crate::config::FilterSettings;
use crate::models::FeedEntry;

/// One predicate over a parsed entry.
pub trait EntryFilter<A>: Send + Sync {
    /// Short stage name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if the entry survives this stage.
    fn keep(&self, entry: &FeedEntry<A>) -> bool;
}

/// Attributes that expose a category.
pub trait Categorized {
    fn category(&self) -> Option<&str>;
}

/// Attributes that expose a magnitude.
pub trait HasMagnitude {
    fn magnitude(&self) -> Option<f64>;
}

/// Drops entries without geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasGeometry;

impl<A> EntryFilter<A> for HasGeometry {
    fn name(&self) -> &'static str {
        "geometry"
    }

    fn keep(&self, entry: &FeedEntry<A>) -> bool {
        entry.geometry.is_some()
    }
}

/// Drops entries farther than `radius_km` from home. Boundary is kept.
#[derive(Debug, Clone, Copy)]
pub struct WithinRadius {
    pub radius_km: f64,
}

impl<A> EntryFilter<A> for WithinRadius {
    fn name(&self) -> &'static str {
        "radius"
    }

    fn keep(&self, entry: &FeedEntry<A>) -> bool {
        entry.distance_to_home <= self.radius_km
    }
}

/// Keeps entries whose category is in the allow-list.
#[derive(Debug, Clone)]
pub struct CategoryAllowList {
    pub categories: Vec<String>,
}

impl<A: Categorized> EntryFilter<A> for CategoryAllowList {
    fn name(&self) -> &'static str {
        "categories"
    }

    fn keep(&self, entry: &FeedEntry<A>) -> bool {
        entry
            .attributes
            .category()
            .is_some_and(|category| self.categories.iter().any(|c| c == category))
    }
}

/// Keeps entries with a magnitude at or above the threshold.
#[derive(Debug, Clone, Copy)]
pub struct MinimumMagnitude {
    pub threshold: f64,
}

impl<A: HasMagnitude> EntryFilter<A> for MinimumMagnitude {
    fn name(&self) -> &'static str {
        "minimum_magnitude"
    }

    fn keep(&self, entry: &FeedEntry<A>) -> bool {
        entry
            .attributes
            .magnitude()
            .is_some_and(|magnitude| magnitude >= self.threshold)
    }
}

/// Ordered list of filter stages.
pub struct FilterChain<A> {
    stages: Vec<Box<dyn EntryFilter<A>>>,
}

impl<A> FilterChain<A> {
    /// Base chain: geometry presence, then the radius stage if configured.
    pub fn base(settings: &FilterSettings) -> Self {
        let mut stages: Vec<Box<dyn EntryFilter<A>>> = vec![Box::new(HasGeometry)];
        if let Some(radius_km) = settings.radius_km {
            stages.push(Box::new(WithinRadius { radius_km }));
        }
        Self { stages }
    }

    /// Appends one stage after the existing ones.
    pub fn with_stage(mut self, stage: impl EntryFilter<A> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Appends several boxed stages, in order.
    pub fn extend(&mut self, stages: Vec<Box<dyn EntryFilter<A>>>) {
        self.stages.extend(stages);
    }

    pub fn accepts(&self, entry: &FeedEntry<A>) -> bool {
        self.stages.iter().all(|stage| stage.keep(entry))
    }

    /// Order-preserving filter.
    pub fn filter(&self, entries: Vec<FeedEntry<A>>) -> Vec<FeedEntry<A>> {
        entries
            .into_iter()
            .filter(|entry| self.accepts(entry))
            .collect()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

impl<A> fmt::Debug for FilterChain<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Category stage when the allow-list is set and non-empty.
pub fn category_stage<A: Categorized + 'static>(
    settings: &FilterSettings,
) -> Option<Box<dyn EntryFilter<A>>> {
    settings
        .categories
        .as_ref()
        .filter(|categories| !categories.is_empty())
        .map(|categories| {
            Box::new(CategoryAllowList {
                categories: categories.clone(),
            }) as Box<dyn EntryFilter<A>>
        })
}

/// Magnitude stage when a threshold is set.
pub fn magnitude_stage<A: HasMagnitude + 'static>(
    settings: &FilterSettings,
) -> Option<Box<dyn EntryFilter<A>>> {
    settings
        .minimum_magnitude
        .map(|threshold| Box::new(MinimumMagnitude { threshold }) as Box<dyn EntryFilter<A>>)
}
