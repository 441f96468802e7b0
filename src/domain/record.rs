use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Epoch-millisecond timestamp exactly as the identity service sent it.
///
/// The service is inconsistent about emitting these as JSON strings or
/// numbers, so both are accepted and kept as text until normalization.
/// Any other JSON value is kept as its JSON text, which never parses as a
/// timestamp: the record is rejected on its own rather than the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMillis(pub String);

impl RawMillis {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawMillis {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RawMillis {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawMillis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
            Float(f64),
            Null(()),
            Other(serde_json::Value),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Self(s),
            Repr::Integer(n) => Self(n.to_string()),
            Repr::Float(f) => Self(f.to_string()),
            Repr::Null(()) => Self(String::new()),
            Repr::Other(value) => Self(value.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(default, alias = "authorName", deserialize_with = "lenient_opt_text")]
    pub author_name: Option<String>,
    #[serde(default, alias = "authorType", deserialize_with = "lenient_opt_text")]
    pub author_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityChange {
    #[serde(default, alias = "changeType", deserialize_with = "lenient_text")]
    pub change_type: String,
    #[serde(default, alias = "changeStatus", deserialize_with = "lenient_text")]
    pub change_status: String,
    #[serde(default, deserialize_with = "lenient_author")]
    pub author: Option<Author>,
    #[serde(default, alias = "changeMessage", deserialize_with = "lenient_opt_text")]
    pub change_message: Option<String>,
    #[serde(default, alias = "modificationDate")]
    pub modification_date: RawMillis,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeChange {
    #[serde(default, alias = "attributeValue", deserialize_with = "lenient_opt_text")]
    pub attribute_value: Option<String>,
    #[serde(default, alias = "modificationDate")]
    pub modification_date: RawMillis,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeHistory {
    #[serde(default, alias = "attributeKey", deserialize_with = "lenient_text")]
    pub attribute_key: String,
    #[serde(default, alias = "attributeChanges", deserialize_with = "null_as_default")]
    pub attribute_changes: Vec<AttributeChange>,
}

/// Body of `GET identity/{customer_id}/history`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityHistory {
    #[serde(default, alias = "identityChanges", deserialize_with = "null_as_default")]
    pub identity_changes: Vec<IdentityChange>,
    #[serde(default, alias = "attributeHistories", deserialize_with = "null_as_default")]
    pub attribute_histories: Vec<AttributeHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskChange {
    #[serde(default, alias = "taskChangeType", deserialize_with = "lenient_text")]
    pub task_change_type: String,
    #[serde(default, alias = "taskStatus", deserialize_with = "lenient_text")]
    pub task_status: String,
    #[serde(default, deserialize_with = "lenient_author", alias = "requestAuthor")]
    pub request_author: Option<Author>,
    #[serde(default, alias = "taskChangeDate")]
    pub task_change_date: RawMillis,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityTask {
    #[serde(default, alias = "taskType", deserialize_with = "lenient_text")]
    pub task_type: String,
    #[serde(default, alias = "taskCode", deserialize_with = "lenient_text")]
    pub task_code: String,
    #[serde(default, deserialize_with = "metadata_map")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, alias = "taskHistory", deserialize_with = "null_as_default")]
    pub task_history: Vec<TaskChange>,
}

/// Both payloads of one load, fetched together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPayloads {
    pub identity: IdentityHistory,
    pub tasks: Vec<IdentityTask>,
}

// Scalars become their display text; null becomes empty.
fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(value_text)
}

fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        value => Some(value_text(value)),
    })
}

// An author of the wrong shape is treated as absent.
fn lenient_author<'de, D>(deserializer: D) -> Result<Option<Author>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok().flatten())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Metadata values are free-form; scalars are kept as their display text.
fn metadata_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value_text(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_history_accepts_camel_case_and_numeric_dates() {
        let body = json!({
            "identity_changes": [{
                "changeType": "UPDATE",
                "changeStatus": "SUCCESS",
                "author": {"author_name": "agent-7"},
                "modificationDate": 1700000000000i64
            }],
            "attribute_histories": [{
                "attribute_key": "email",
                "attribute_changes": [
                    {"attribute_value": "a@example.com", "modification_date": "1700000000001"}
                ]
            }]
        });

        let history: IdentityHistory = serde_json::from_value(body).expect("deserialize");
        assert_eq!(history.identity_changes.len(), 1);
        assert_eq!(
            history.identity_changes[0].modification_date.as_str(),
            "1700000000000"
        );
        assert_eq!(
            history.attribute_histories[0].attribute_changes[0]
                .modification_date
                .as_str(),
            "1700000000001"
        );
    }

    #[test]
    fn task_metadata_scalars_become_text() {
        let body = json!({
            "task_type": "ACCOUNT_CREATION",
            "task_code": "T-42",
            "metadata": {"email": "a@example.com", "attempts": 3, "missing": null},
            "task_history": []
        });

        let task: IdentityTask = serde_json::from_value(body).expect("deserialize");
        assert_eq!(task.metadata["email"], "a@example.com");
        assert_eq!(task.metadata["attempts"], "3");
        assert_eq!(task.metadata["missing"], "");
    }

    #[test]
    fn missing_optional_fields_default() {
        let body = json!({
            "task_type": "EMAIL_VALIDATION",
            "task_code": "T-1"
        });

        let task: IdentityTask = serde_json::from_value(body).expect("deserialize");
        assert!(task.metadata.is_empty());
        assert!(task.task_history.is_empty());
    }

    #[test]
    fn mistyped_fields_do_not_fail_the_payload() {
        let body = json!({
            "identity_changes": [
                {"change_type": null, "change_status": 7, "modification_date": true},
                {"change_type": "UPDATE", "change_status": "SUCCESS",
                 "author": {"author_name": null}, "modification_date": 1700000000000i64},
                {"change_type": "MERGE", "author": "bob", "modification_date": "1"}
            ],
            "attribute_histories": [{
                "attribute_key": "email",
                "attribute_changes": [
                    {"attribute_value": 42, "modification_date": {"ms": 1}}
                ]
            }, {
                "attribute_key": "phone",
                "attribute_changes": null
            }]
        });

        let history: IdentityHistory = serde_json::from_value(body).expect("deserialize");
        let bad = &history.identity_changes[0];
        assert_eq!(bad.change_type, "");
        assert_eq!(bad.change_status, "7");
        assert_eq!(bad.modification_date.as_str(), "true");
        assert_eq!(history.identity_changes[1].author, Some(Author::default()));
        assert_eq!(history.identity_changes[2].author, None);

        let change = &history.attribute_histories[0].attribute_changes[0];
        assert_eq!(change.attribute_value.as_deref(), Some("42"));
        assert_eq!(change.modification_date.as_str(), r#"{"ms":1}"#);
        assert!(history.attribute_histories[1].attribute_changes.is_empty());
    }
}
