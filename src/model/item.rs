use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    assets::decode::{Decode, Raster},
    foundation::{
        core::Location,
        error::{SortError, SortResult},
    },
    model::label::Label,
};

/// A source image paired with its correct [`Label`].
///
/// The decoded raster is cached on the item. It is filled by [`LabeledItem::load`] and released
/// by [`LabeledItem::flush`]; location, label and name never change.
#[derive(Debug)]
pub struct LabeledItem {
    location: Location,
    label: Label,
    display_name: String,
    cache: Mutex<Option<Raster>>,
}

impl LabeledItem {
    pub fn new(
        location: Location,
        label: Label,
        display_name: impl Into<String>,
    ) -> SortResult<Self> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(SortError::validation("item display name must be non-blank"));
        }
        Ok(Self {
            location,
            label,
            display_name,
            cache: Mutex::new(None),
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Decode the source and replace the cached raster with the result.
    pub fn load(&self, decoder: &dyn Decode) -> SortResult<Raster> {
        let raster = decoder
            .decode(&self.location)
            .map_err(|source| SortError::Load {
                location: self.location.to_string(),
                source,
            })?;
        *self.cache() = Some(raster.clone());
        Ok(raster)
    }

    pub fn cached_or_load(&self, decoder: &dyn Decode) -> SortResult<Raster> {
        if let Some(raster) = self.cached() {
            return Ok(raster);
        }
        self.load(decoder)
    }

    pub fn cached(&self) -> Option<Raster> {
        self.cache().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache().is_some()
    }

    pub fn flush(&self) {
        *self.cache() = None;
    }

    pub fn score_against(&self, candidate: &Label) -> bool {
        *candidate == self.label
    }

    fn cache(&self) -> MutexGuard<'_, Option<Raster>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for LabeledItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_name, self.label)
    }
}
