use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::domain::*;
use crate::format::DateLabeler;
use crate::labels::{AttributeCatalog, LabelCatalog, Lookup};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("unparsable timestamp {0:?}")]
    InvalidDate(String),
    #[error("timestamp {0} out of range")]
    DateOutOfRange(i64),
}

/// Per-source count of records dropped during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub identity_rejected: usize,
    pub attribute_rejected: usize,
    pub task_rejected: usize,
}

impl NormalizeReport {
    pub fn total_rejected(&self) -> usize {
        self.identity_rejected + self.attribute_rejected + self.task_rejected
    }
}

/// Normalized events, one sequence per source, each in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSources {
    pub identity: Vec<Event>,
    pub attribute: Vec<Event>,
    pub task: Vec<Event>,
    pub report: NormalizeReport,
}

/// Parse epoch milliseconds. Surrounding whitespace is ignored but the rest
/// must be a whole integer: trailing garbage (`"1700000000000abc"`) and
/// fractions (`"1.5"`) reject the record instead of being truncated into a
/// plausible but wrong instant.
pub fn parse_millis(raw: &RawMillis) -> Result<DateTime<Utc>, MalformedRecord> {
    let text = raw.as_str().trim();
    let millis: i64 = text
        .parse()
        .map_err(|_| MalformedRecord::InvalidDate(raw.as_str().to_string()))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(MalformedRecord::DateOutOfRange(millis))
}

/// Converts raw identity-service records into timeline events, resolving
/// every display string through the label catalogs.
pub struct Normalizer<'a> {
    labels: &'a LabelCatalog,
    attributes: &'a AttributeCatalog,
    labeler: DateLabeler,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        labels: &'a LabelCatalog,
        attributes: &'a AttributeCatalog,
        labeler: DateLabeler,
    ) -> Self {
        Self {
            labels,
            attributes,
            labeler,
        }
    }

    fn author_name(&self, author: Option<&Author>) -> String {
        Lookup::from(author.and_then(|a| a.author_name.as_deref()))
            .or_lookup(|| self.labels.lookup(&["unknown"]))
            .or_empty()
    }

    pub fn identity_event(&self, change: &IdentityChange) -> Result<Event, MalformedRecord> {
        let date = parse_millis(&change.modification_date)?;
        let change_type_text = self
            .labels
            .lookup(&["history", change.change_type.as_str(), change.change_status.as_str()])
            .or_empty();
        let author_name = self.author_name(change.author.as_ref());
        let change_message = change.change_message.clone().unwrap_or_default();

        let date_label = self.labeler.label(&date);
        let searchable_text = join_text(&[
            date_label.as_str(),
            change_type_text.as_str(),
            author_name.as_str(),
            change_message.as_str(),
        ]);

        Ok(Event {
            date,
            change_type_text,
            author_name,
            detail: EventDetail::Identity { change_message },
            searchable_text,
            payload: EventPayload::Identity(change.clone()),
        })
    }

    pub fn attribute_event(
        &self,
        attribute_key: &str,
        change: &AttributeChange,
    ) -> Result<Event, MalformedRecord> {
        let date = parse_millis(&change.modification_date)?;
        let attribute_label = self.attributes.label(attribute_key);
        let attribute_value = change.attribute_value.clone().unwrap_or_default();
        let change_type_text = self.labels.lookup(&["attributeChangeType"]).or_empty();

        let date_label = self.labeler.label(&date);
        let searchable_text = join_text(&[
            date_label.as_str(),
            attribute_label.as_str(),
            attribute_value.as_str(),
            change_type_text.as_str(),
        ]);

        Ok(Event {
            date,
            change_type_text,
            author_name: String::new(),
            detail: EventDetail::Attribute {
                attribute_key: attribute_key.to_string(),
                attribute_label,
                attribute_value,
            },
            searchable_text,
            payload: EventPayload::Attribute {
                attribute_key: attribute_key.to_string(),
                change: change.clone(),
            },
        })
    }

    pub fn task_event(
        &self,
        task: &Arc<IdentityTask>,
        change: &TaskChange,
    ) -> Result<Event, MalformedRecord> {
        let date = parse_millis(&change.task_change_date)?;
        let task_type = task.task_type.as_str();
        let status = change.task_status.as_str();

        let task_type_text = self
            .labels
            .lookup(&["tasks", task_type, "label"])
            .or(task_type);
        let change_type_text = self
            .labels
            .lookup(&["tasks", task_type, change.task_change_type.as_str(), status])
            .or_else(|| format!("{} {} {}", task_type, change.task_change_type, status));
        let status_text = self
            .labels
            .lookup(&["tasks", task_type, "status", status])
            .or(status);
        let author_name = self.author_name(change.request_author.as_ref());
        let metadata_text = task
            .metadata
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        let date_label = self.labeler.label(&date);
        let searchable_text = join_text(&[
            date_label.as_str(),
            task_type_text.as_str(),
            change_type_text.as_str(),
            status_text.as_str(),
            author_name.as_str(),
            metadata_text.as_str(),
            task.task_code.as_str(),
        ]);

        Ok(Event {
            date,
            change_type_text,
            author_name,
            detail: EventDetail::Task {
                task_type_text,
                status_text,
                metadata_text,
                task_code: task.task_code.clone(),
            },
            searchable_text,
            payload: EventPayload::Task {
                task: Arc::clone(task),
                change: change.clone(),
            },
        })
    }

    /// Normalize both payloads. Malformed records are skipped and counted;
    /// they never abort the load.
    pub fn normalize_all(&self, payloads: &HistoryPayloads) -> NormalizedSources {
        let mut out = NormalizedSources::default();

        for change in &payloads.identity.identity_changes {
            match self.identity_event(change) {
                Ok(event) => out.identity.push(event),
                Err(e) => {
                    tracing::warn!(change_type = %change.change_type, "skipping identity change: {}", e);
                    out.report.identity_rejected += 1;
                }
            }
        }

        for history in &payloads.identity.attribute_histories {
            for change in &history.attribute_changes {
                match self.attribute_event(&history.attribute_key, change) {
                    Ok(event) => out.attribute.push(event),
                    Err(e) => {
                        tracing::warn!(attribute = %history.attribute_key, "skipping attribute change: {}", e);
                        out.report.attribute_rejected += 1;
                    }
                }
            }
        }

        for task in &payloads.tasks {
            let task = Arc::new(task.clone());
            for change in &task.task_history {
                match self.task_event(&task, change) {
                    Ok(event) => out.task.push(event),
                    Err(e) => {
                        tracing::warn!(task_code = %task.task_code, "skipping task change: {}", e);
                        out.report.task_rejected += 1;
                    }
                }
            }
        }

        tracing::debug!(
            identity = out.identity.len(),
            attribute = out.attribute.len(),
            task = out.task.len(),
            rejected = out.report.total_rejected(),
            "normalized history"
        );
        out
    }
}

fn join_text(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
