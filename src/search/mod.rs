pub mod fuzzy;
pub mod index;
pub mod query;

pub use index::FuzzyIndex;
pub use query::{MatchMode, QueryPlan, Term};

use crate::domain::{Event, SearchField};

/// Similarity cut-off: one typo in a four-letter word passes, in a
/// three-letter word it does not.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// An event admitted by a query, identified by its position in the list the
/// index was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub position: usize,
    /// Mean term score; 0 is a perfect match.
    pub score: f64,
    /// The best field per query term, in term order.
    pub matched_fields: Vec<SearchField>,
}

/// A searchable view over one merged event list. Built once per load and
/// never updated in place.
pub trait SearchIndex: Send + Sync {
    fn build(events: &[Event], options: &SearchOptions) -> Self
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(&self, plan: &QueryPlan) -> Vec<ScoredMatch>;
}

/// Filter `events` (the list `index` was built from) by a free-text query.
///
/// A blank or absent query returns every event. Otherwise the result keeps
/// the list's own newest-first order; scores only decide admission.
pub fn search<'a, I: SearchIndex + ?Sized>(
    events: &'a [Event],
    index: &I,
    query: Option<&str>,
) -> Vec<&'a Event> {
    let plan = QueryPlan::parse(query.unwrap_or_default());
    if plan.is_empty() {
        return events.iter().collect();
    }

    let mut matches = index.search(&plan);
    tracing::debug!(
        terms = plan.terms().len(),
        matched = matches.len(),
        "history query"
    );
    matches.sort_by_key(|m| m.position);
    matches
        .into_iter()
        .filter_map(|m| events.get(m.position))
        .collect()
}
