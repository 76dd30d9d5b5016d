//! Destination resolution: history id or name pattern to a single id.

use std::future::Future;
use std::pin::Pin;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::transport::TransportError;
use crate::types::{Destination, DestinationId};

/// How the user selected the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationSelector {
    /// Explicit id, used as given.
    Id(String),
    /// Name pattern matched against the listed destinations.
    Name { pattern: String, ignore_case: bool },
}

/// Errors resolving a destination.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no histories matching {0} found")]
    NotFound(String),

    #[error("multiple histories matching {query} found, use --history-id to select one")]
    Ambiguous {
        query: String,
        candidates: Vec<Destination>,
    },

    #[error("invalid history name pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("history id must not be empty")]
    EmptyId,

    #[error("listing histories failed: {0}")]
    Transport(#[from] TransportError),
}

/// Lists the destinations visible to the current credential.
pub trait DestinationResolver: Send + Sync {
    fn list_destinations(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Destination>, TransportError>> + Send + '_>>;
}

/// Case-sensitivity-parameterized name predicate.
///
/// The pattern is a regular expression searched anywhere in the name, so a
/// plain word acts as a substring match.
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: Regex,
}

impl NameFilter {
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Keeps the destinations whose name matches, preserving order.
    pub fn apply(&self, destinations: Vec<Destination>) -> Vec<Destination> {
        destinations
            .into_iter()
            .filter(|d| self.matches(&d.name))
            .collect()
    }
}

/// Resolves `selector` to exactly one destination.
///
/// Never picks among several matches: an ambiguous name yields
/// [`ResolveError::Ambiguous`] with the candidates for the user to choose from.
pub async fn resolve_destination(
    resolver: &dyn DestinationResolver,
    selector: &DestinationSelector,
) -> Result<DestinationId, ResolveError> {
    match selector {
        DestinationSelector::Id(id) => DestinationId::new(id.clone()).ok_or(ResolveError::EmptyId),
        DestinationSelector::Name {
            pattern,
            ignore_case,
        } => {
            let filter =
                NameFilter::new(pattern, *ignore_case).map_err(|source| {
                    ResolveError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
            let mut matches = filter.apply(resolver.list_destinations().await?);
            match matches.len() {
                0 => Err(ResolveError::NotFound(pattern.clone())),
                1 => {
                    let found = matches.remove(0);
                    debug!(pattern = %pattern, id = %found.id, name = %found.name, "history name resolved");
                    DestinationId::new(found.id).ok_or(ResolveError::EmptyId)
                }
                _ => Err(ResolveError::Ambiguous {
                    query: pattern.clone(),
                    candidates: matches,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticResolver {
        destinations: Vec<Destination>,
        calls: AtomicUsize,
    }

    impl StaticResolver {
        fn new(names: &[(&str, &str)]) -> Self {
            Self {
                destinations: names
                    .iter()
                    .map(|(id, name)| Destination {
                        id: id.to_string(),
                        name: name.to_string(),
                        update_time: None,
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DestinationResolver for StaticResolver {
        fn list_destinations(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Destination>, TransportError>> + Send + '_>>
        {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.destinations.clone())
            })
        }
    }

    fn by_name(pattern: &str, ignore_case: bool) -> DestinationSelector {
        DestinationSelector::Name {
            pattern: pattern.into(),
            ignore_case,
        }
    }

    #[tokio::test]
    async fn id_is_used_without_listing() {
        let resolver = StaticResolver::new(&[]);
        let id = resolve_destination(&resolver, &DestinationSelector::Id("abc123".into()))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_id_rejected() {
        let resolver = StaticResolver::new(&[]);
        let err = resolve_destination(&resolver, &DestinationSelector::Id(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyId));
    }

    #[tokio::test]
    async fn single_match_resolves() {
        let resolver = StaticResolver::new(&[("h1", "RNA-seq run 1"), ("h2", "ChIP-seq")]);
        let id = resolve_destination(&resolver, &by_name("RNA", false))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "h1");
    }

    #[tokio::test]
    async fn case_sensitivity_is_explicit() {
        let resolver = StaticResolver::new(&[("h1", "RNA-seq run 1")]);
        let err = resolve_destination(&resolver, &by_name("rna", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(ref p) if p == "rna"));

        let id = resolve_destination(&resolver, &by_name("rna", true))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "h1");
    }

    #[tokio::test]
    async fn multiple_matches_are_ambiguous() {
        let resolver = StaticResolver::new(&[("h1", "run 1"), ("h2", "run 2"), ("h3", "other")]);
        let err = resolve_destination(&resolver, &by_name("^run", false))
            .await
            .unwrap_err();
        match err {
            ResolveError::Ambiguous { query, candidates } => {
                assert_eq!(query, "^run");
                let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, vec!["h1", "h2"]);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_pattern_reported() {
        let resolver = StaticResolver::new(&[("h1", "x")]);
        let err = resolve_destination(&resolver, &by_name("(unclosed", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPattern { .. }));
    }

    #[test]
    fn name_filter_is_a_search() {
        let filter = NameFilter::new("seq", false).unwrap();
        assert!(filter.matches("RNA-seq"));
        assert!(filter.matches("seq data"));
        assert!(!filter.matches("SEQ"));
    }
}
