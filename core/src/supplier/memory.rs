use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::String;

use super::*;

/// In-memory [`TokenSource`], for offline play and tests.
///
/// Species listed explicitly use their stored entry; every other species
/// falls back to a placeholder image under `base_url`, if one is set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySource {
    artwork: BTreeMap<SpeciesId, Option<String>>,
    base_url: Option<String>,
    failures: BTreeSet<SpeciesId>,
}

impl MemorySource {
    /// A source that knows no species at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A source serving `{base_url}/{id}.png` for every species.
    pub fn placeholder(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_artwork(mut self, id: SpeciesId, image_url: impl Into<String>) -> Self {
        self.artwork.insert(id, Some(image_url.into()));
        self
    }

    #[must_use]
    pub fn without_artwork(mut self, id: SpeciesId) -> Self {
        self.artwork.insert(id, None);
        self
    }

    /// Makes lookups of `id` fail like a broken connection would.
    #[must_use]
    pub fn failing_on(mut self, id: SpeciesId) -> Self {
        self.failures.insert(id);
        self
    }

    fn resolve(&self, id: SpeciesId) -> core::result::Result<Option<Token>, SupplyError> {
        if self.failures.contains(&id) {
            return Err(SupplyError::Source(format!("lookup of species {id} failed")));
        }

        let image_url = match self.artwork.get(&id) {
            Some(entry) => entry.clone(),
            None => self
                .base_url
                .as_ref()
                .map(|base_url| format!("{base_url}/{id}.png")),
        };
        Ok(image_url.map(|image_url| Token::new(id, image_url)))
    }
}

impl TokenSource for MemorySource {
    async fn lookup(&self, id: SpeciesId) -> core::result::Result<Option<Token>, SupplyError> {
        self.resolve(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_entries_override_placeholder() {
        let source = MemorySource::placeholder("https://img.test")
            .with_artwork(1, "https://img.test/bulbasaur.png")
            .without_artwork(2);

        assert_eq!(
            source.resolve(1),
            Ok(Some(Token::new(1, "https://img.test/bulbasaur.png")))
        );
        assert_eq!(source.resolve(2), Ok(None));
        assert_eq!(
            source.resolve(3),
            Ok(Some(Token::new(3, "https://img.test/3.png")))
        );
    }

    #[test]
    fn empty_source_has_no_artwork() {
        assert_eq!(MemorySource::empty().resolve(25), Ok(None));
    }

    #[test]
    fn failing_species_report_source_errors() {
        let source = MemorySource::placeholder("https://img.test").failing_on(4);
        assert!(matches!(source.resolve(4), Err(SupplyError::Source(_))));
    }
}
