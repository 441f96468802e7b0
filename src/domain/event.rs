use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{AttributeChange, IdentityChange, IdentityTask, TaskChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Identity,
    Attribute,
    Task,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [Self::Identity, Self::Attribute, Self::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Attribute => "attribute",
            Self::Task => "task",
        }
    }

    /// Key of the kind's badge label in the language resource.
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Identity => "identityChangeType",
            Self::Attribute => "attributeChangeType",
            Self::Task => "taskChangeType",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific resolved text. The variant decides the event's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    Identity {
        change_message: String,
    },
    Attribute {
        attribute_key: String,
        attribute_label: String,
        attribute_value: String,
    },
    Task {
        task_type_text: String,
        status_text: String,
        metadata_text: String,
        task_code: String,
    },
}

/// The raw record an event was built from, kept for detail rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Identity(IdentityChange),
    Attribute {
        attribute_key: String,
        change: AttributeChange,
    },
    Task {
        task: Arc<IdentityTask>,
        change: TaskChange,
    },
}

/// One entry of the unified timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub date: DateTime<Utc>,
    pub change_type_text: String,
    pub author_name: String,
    pub detail: EventDetail,
    pub searchable_text: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self.detail {
            EventDetail::Identity { .. } => EventKind::Identity,
            EventDetail::Attribute { .. } => EventKind::Attribute,
            EventDetail::Task { .. } => EventKind::Task,
        }
    }

    pub fn change_message(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Identity { change_message } => Some(change_message),
            _ => None,
        }
    }

    pub fn attribute_label(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Attribute {
                attribute_label, ..
            } => Some(attribute_label),
            _ => None,
        }
    }

    pub fn attribute_value(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Attribute {
                attribute_value, ..
            } => Some(attribute_value),
            _ => None,
        }
    }

    pub fn task_type_text(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Task { task_type_text, .. } => Some(task_type_text),
            _ => None,
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Task { status_text, .. } => Some(status_text),
            _ => None,
        }
    }

    pub fn metadata_text(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Task { metadata_text, .. } => Some(metadata_text),
            _ => None,
        }
    }

    pub fn task_code(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Task { task_code, .. } => Some(task_code),
            _ => None,
        }
    }

    /// Text of one indexed field, `None` when the field does not apply to
    /// this event's kind.
    pub fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Kind => Some(self.kind().as_str()),
            SearchField::ChangeTypeText => Some(&self.change_type_text),
            SearchField::AuthorName => Some(&self.author_name),
            SearchField::ChangeMessage => self.change_message(),
            SearchField::AttributeLabel => self.attribute_label(),
            SearchField::AttributeValue => self.attribute_value(),
            SearchField::TaskTypeText => self.task_type_text(),
            SearchField::StatusText => self.status_text(),
            SearchField::MetadataText => self.metadata_text(),
            SearchField::TaskCode => self.task_code(),
            SearchField::SearchableText => Some(&self.searchable_text),
        }
    }
}

/// Event fields the search index covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Kind,
    ChangeTypeText,
    AuthorName,
    ChangeMessage,
    AttributeLabel,
    AttributeValue,
    TaskTypeText,
    StatusText,
    MetadataText,
    TaskCode,
    SearchableText,
}

impl SearchField {
    pub const ALL: [SearchField; 11] = [
        Self::Kind,
        Self::ChangeTypeText,
        Self::AuthorName,
        Self::ChangeMessage,
        Self::AttributeLabel,
        Self::AttributeValue,
        Self::TaskTypeText,
        Self::StatusText,
        Self::MetadataText,
        Self::TaskCode,
        Self::SearchableText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::ChangeTypeText => "changeTypeText",
            Self::AuthorName => "authorName",
            Self::ChangeMessage => "changeMessage",
            Self::AttributeLabel => "attributeLabel",
            Self::AttributeValue => "attributeValue",
            Self::TaskTypeText => "taskTypeText",
            Self::StatusText => "statusText",
            Self::MetadataText => "metadataText",
            Self::TaskCode => "taskCode",
            Self::SearchableText => "searchableText",
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
