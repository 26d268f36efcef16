//! Source registry — loads all source definitions from embedded TOML
//! configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a new source is
//! as simple as creating a new TOML file and adding it to the list
//! below.

use crate::SourceError;
use crate::source_def::{SourceDefinition, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("twitter", include_str!("../sources/twitter.toml")),
    ("reddit", include_str!("../sources/reddit.toml")),
    ("hackernews", include_str!("../sources/hackernews.toml")),
];

/// Total number of configured sources (used in tests).
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 3;

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time
/// guarantee since the configs are embedded and covered by tests).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Resolves a CLI selection to source definitions: `"all"` for every
/// registered source, otherwise a single source by id.
///
/// # Errors
///
/// * `SourceError::UnknownSource` - if the selection matches no
///   registered id.
pub fn sources_by_selection(selection: &str) -> Result<Vec<SourceDefinition>, SourceError> {
    if selection.eq_ignore_ascii_case("all") {
        return Ok(all_sources());
    }
    let matched: Vec<SourceDefinition> = all_sources()
        .into_iter()
        .filter(|source| source.id == selection)
        .collect();
    if matched.is_empty() {
        return Err(SourceError::UnknownSource(selection.to_owned()));
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_def::FetchMode;
    use social_pulse_models::PlatformFamily;

    #[test]
    fn loads_all_sources() {
        let sources = all_sources();
        assert_eq!(sources.len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn source_ids_are_unique() {
        let sources = all_sources();
        let mut ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn all_sources_have_required_fields() {
        for source in &all_sources() {
            assert!(!source.id.is_empty(), "source id is empty");
            assert!(!source.name.is_empty(), "source name is empty");
            assert!(!source.platform.is_empty(), "source platform is empty");
            assert!(!source.mirrors.is_empty(), "source {} has no mirrors", source.id);
            assert!(
                source.search_path.contains("{query}"),
                "source {} search_path lacks query placeholder",
                source.id
            );
        }
    }

    #[test]
    fn browser_sources_carry_selectors() {
        for source in &all_sources() {
            if source.fetch == FetchMode::Browser {
                let selectors = source
                    .selectors
                    .as_ref()
                    .unwrap_or_else(|| panic!("source {} has no selectors", source.id));
                assert!(!selectors.item.is_empty());
                assert!(!selectors.content.is_empty());
            }
        }
    }

    #[test]
    fn families_cover_all_flows() {
        let sources = all_sources();
        for family in [
            PlatformFamily::MicroBlog,
            PlatformFamily::Forum,
            PlatformFamily::News,
        ] {
            assert!(
                sources.iter().any(|source| source.family == family),
                "no source registered for family {family}"
            );
        }
    }

    #[test]
    fn selection_all_returns_everything() {
        assert_eq!(sources_by_selection("all").unwrap().len(), EXPECTED_SOURCE_COUNT);
        assert_eq!(sources_by_selection("ALL").unwrap().len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn selection_by_id_returns_one() {
        let sources = sources_by_selection("twitter").unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].platform, "Twitter");
    }

    #[test]
    fn unknown_selection_is_an_error() {
        assert!(matches!(
            sources_by_selection("myspace"),
            Err(SourceError::UnknownSource(_))
        ));
    }
}
