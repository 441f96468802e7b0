use crate::domain::{Event, EventKind};
use crate::format::DateLabeler;
use crate::labels::LabelCatalog;

/// A run of consecutive events sharing one display date label.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    pub label: String,
    events: Vec<&'a Event>,
}

impl<'a> Bucket<'a> {
    /// Every event of the bucket, in timeline order.
    pub fn events(&self) -> &[&'a Event] {
        &self.events
    }

    /// Distinct kinds present, in order of first appearance.
    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds = Vec::with_capacity(EventKind::ALL.len());
        for event in &self.events {
            let kind = event.kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Kinds to tag the bucket with. Attribute changes dominate: when any is
    /// present it is the only badge.
    pub fn badges(&self) -> Vec<EventKind> {
        let kinds = self.kinds();
        if kinds.contains(&EventKind::Attribute) {
            vec![EventKind::Attribute]
        } else {
            kinds
        }
    }

    /// The identity change shown as the bucket header; only the first one.
    pub fn identity_header(&self) -> Option<&'a Event> {
        self.events
            .iter()
            .copied()
            .find(|e| e.kind() == EventKind::Identity)
    }

    /// Attribute changes, rendered together as one table.
    pub fn attribute_rows(&self) -> Vec<&'a Event> {
        self.of_kind(EventKind::Attribute)
    }

    /// Task changes, each its own unit rendered beneath the header and table.
    pub fn task_units(&self) -> Vec<&'a Event> {
        self.of_kind(EventKind::Task)
    }

    fn of_kind(&self, kind: EventKind) -> Vec<&'a Event> {
        self.events
            .iter()
            .copied()
            .filter(|e| e.kind() == kind)
            .collect()
    }
}

/// Date-labelled buckets in timeline order.
#[derive(Debug, Clone, Default)]
pub struct OrderedGroups<'a> {
    buckets: Vec<Bucket<'a>>,
}

impl<'a> OrderedGroups<'a> {
    pub fn buckets(&self) -> &[Bucket<'a>] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All events across all buckets; always the order they were grouped in.
    pub fn flatten(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.buckets.iter().flat_map(|b| b.events.iter().copied())
    }
}

/// Bucket an already newest-first event sequence by display label. Events are
/// never reordered; only adjacent events can share a bucket.
pub fn group<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    labeler: &DateLabeler,
) -> OrderedGroups<'a> {
    let mut buckets: Vec<Bucket<'a>> = Vec::new();

    for event in events {
        let label = labeler.label(&event.date);
        match buckets.last_mut() {
            Some(bucket) if bucket.label == label => bucket.events.push(event),
            _ => buckets.push(Bucket {
                label,
                events: vec![event],
            }),
        }
    }

    OrderedGroups { buckets }
}

/// Display text for a badge, falling back to the kind's own name.
pub fn badge_label(labels: &LabelCatalog, kind: EventKind) -> String {
    labels.lookup(&[kind.label_key()]).or(kind.as_str())
}
