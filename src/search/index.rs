use crate::domain::{Event, SearchField};

use super::query::QueryPlan;
use super::{ScoredMatch, SearchIndex, SearchOptions};

#[derive(Debug, Clone)]
struct IndexedField {
    field: SearchField,
    text: String,
    chars: Vec<char>,
}

/// Default index: per-event lower-cased field text, matched term by term with
/// approximate substring search.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    docs: Vec<Vec<IndexedField>>,
    threshold: f64,
}

impl FuzzyIndex {
    fn index_event(event: &Event) -> Vec<IndexedField> {
        SearchField::ALL
            .iter()
            .filter_map(|&field| {
                let text = event.field(field)?.to_lowercase();
                if text.is_empty() {
                    return None;
                }
                let chars = text.chars().collect();
                Some(IndexedField { field, text, chars })
            })
            .collect()
    }

    /// Best score of `term_index` across the event's fields, with the field
    /// that produced it.
    fn best_field(
        &self,
        fields: &[IndexedField],
        plan: &QueryPlan,
        term_index: usize,
    ) -> Option<(SearchField, f64)> {
        let term = &plan.terms()[term_index];
        fields
            .iter()
            .filter_map(|f| {
                term.score(&f.text, &f.chars, self.threshold)
                    .map(|score| (f.field, score))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl SearchIndex for FuzzyIndex {
    fn build(events: &[Event], options: &SearchOptions) -> Self {
        let docs = events.iter().map(Self::index_event).collect();
        Self {
            docs,
            threshold: options.threshold,
        }
    }

    fn len(&self) -> usize {
        self.docs.len()
    }

    fn search(&self, plan: &QueryPlan) -> Vec<ScoredMatch> {
        let term_count = plan.terms().len();
        let mut matches = Vec::new();

        'docs: for (position, fields) in self.docs.iter().enumerate() {
            let mut total = 0.0;
            let mut matched_fields = Vec::with_capacity(term_count);
            for term_index in 0..term_count {
                match self.best_field(fields, plan, term_index) {
                    Some((field, score)) => {
                        total += score;
                        matched_fields.push(field);
                    }
                    None => continue 'docs,
                }
            }
            let score = if term_count == 0 {
                0.0
            } else {
                total / term_count as f64
            };
            matches.push(ScoredMatch {
                position,
                score,
                matched_fields,
            });
        }

        matches
    }
}
