use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::task::{Task, TaskId};

/// One document as the collection API returns it. Backend-managed fields
/// are prefixed with `$` on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: Option<String>,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Envelope of the list endpoint.
#[derive(Debug, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<Document>,
}

/// Create payload. `documentId` of `"unique()"` asks the backend to assign
/// the id.
#[derive(Debug, Serialize)]
pub struct CreateDocument<'a> {
    #[serde(rename = "documentId")]
    pub document_id: &'a str,
    pub data: TaskFields<'a>,
}

#[derive(Debug, Serialize)]
pub struct TaskFields<'a> {
    pub text: &'a str,
    pub completed: bool,
}

/// Partial update payload for the completion flag.
#[derive(Debug, Serialize)]
pub struct UpdateCompleted {
    pub data: CompletedField,
}

#[derive(Debug, Serialize)]
pub struct CompletedField {
    pub completed: bool,
}

impl Document {
    pub fn into_task(self) -> Task {
        let created_at_unix = self
            .created_at
            .as_deref()
            .and_then(parse_rfc3339_unix)
            .unwrap_or_default();
        Task {
            id: TaskId(self.id),
            text: self.text,
            completed: self.completed,
            created_at_unix,
        }
    }
}

pub fn parse_rfc3339_unix(s: &str) -> Option<i64> {
    OffsetDateTime::parse(s, &Rfc3339)
        .ok()
        .map(|t| t.unix_timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_maps_to_tasks() {
        let raw = r#"{
            "total": 2,
            "documents": [
                {
                    "$id": "6888aabbccdd00112233",
                    "$createdAt": "2025-07-29T09:15:00.123+00:00",
                    "$collectionId": "tasks",
                    "text": "Buy milk",
                    "completed": false
                },
                {
                    "$id": "6888aabbccdd44556677",
                    "$createdAt": "2025-07-29T09:16:30.000+00:00",
                    "text": "Ship it",
                    "completed": true
                }
            ]
        }"#;

        let list: DocumentList = serde_json::from_str(raw).unwrap();
        let tasks: Vec<Task> = list.documents.into_iter().map(Document::into_task).collect();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, TaskId("6888aabbccdd00112233".to_string()));
        assert_eq!(tasks[0].text, "Buy milk");
        assert!(!tasks[0].completed);
        assert!(tasks[1].completed);
        assert!(tasks[0].created_at_unix < tasks[1].created_at_unix);
    }

    #[test]
    fn missing_backend_fields_still_map() {
        let raw = r#"{"$id": "abc", "text": "bare"}"#;
        let task = serde_json::from_str::<Document>(raw).unwrap().into_task();
        assert!(!task.completed);
        assert_eq!(task.created_at_unix, 0);
    }

    #[test]
    fn create_payload_shape() {
        let body = CreateDocument {
            document_id: "unique()",
            data: TaskFields {
                text: "Buy milk",
                completed: false,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["documentId"], "unique()");
        assert_eq!(json["data"]["text"], "Buy milk");
        assert_eq!(json["data"]["completed"], false);
    }

    #[test]
    fn rfc3339_parsing() {
        assert_eq!(parse_rfc3339_unix("1970-01-01T00:00:10+00:00"), Some(10));
        assert_eq!(parse_rfc3339_unix("2025-07-29T09:15:00.123Z"), Some(1753780500));
        assert_eq!(parse_rfc3339_unix("not a timestamp"), None);
    }
}
