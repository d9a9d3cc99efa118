//! Thin Firestore REST client.
//!
//! Speaks three endpoints: document GET, `documents:runQuery` and
//! `documents:commit`. Failures come back as [`FirestoreFailure`] and each
//! repository maps them onto its own port error.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use zeroize::Zeroizing;

use super::value::{Document, Fields, Value};

pub(super) const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Transport-level outcome of a Firestore call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(super) enum FirestoreFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FirestoreFailure {
    pub(super) fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "NOT_FOUND")
    }

    /// Precondition failures signal a concurrent write.
    pub(super) fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "FAILED_PRECONDITION" || code == "ABORTED")
    }

    /// Whether the store was unreachable rather than rejecting the call.
    pub(super) fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, code, .. } => *status >= 500 || code == "UNAVAILABLE",
            Self::Decode(_) => false,
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn map_status_error(status: StatusCode, body: &[u8]) -> FirestoreFailure {
    match serde_json::from_slice::<ApiErrorEnvelope>(body) {
        Ok(envelope) => FirestoreFailure::Api {
            status: status.as_u16(),
            code: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => FirestoreFailure::Api {
            status: status.as_u16(),
            code: status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_uppercase()
                .replace(' ', "_"),
            message: String::from_utf8_lossy(body).trim().to_owned(),
        },
    }
}

/// Condition a write must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum Precondition {
    Exists(bool),
    UpdateTime(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum Transform {
    SetToServerValue(&'static str),
    Increment(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FieldTransform {
    pub(super) field_path: &'static str,
    #[serde(flatten)]
    pub(super) transform: Transform,
}

impl FieldTransform {
    pub(super) fn request_time(field_path: &'static str) -> Self {
        Self {
            field_path,
            transform: Transform::SetToServerValue("REQUEST_TIME"),
        }
    }

    pub(super) fn increment(field_path: &'static str, by: i64) -> Self {
        Self {
            field_path,
            transform: Transform::Increment(Value::integer(by)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct DocumentWrite {
    pub(super) name: String,
    pub(super) fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentTransform {
    pub(super) document: String,
    pub(super) field_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FieldMask {
    pub(super) field_paths: Vec<String>,
}

/// One entry of a commit request.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Write {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) update: Option<DocumentWrite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) transform: Option<DocumentTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) update_mask: Option<FieldMask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) update_transforms: Vec<FieldTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) current_document: Option<Precondition>,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    writes: &'a [Write],
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WriteResult {
    pub(super) update_time: Option<String>,
    #[serde(default)]
    pub(super) transform_results: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommitResponse {
    #[serde(default)]
    pub(super) write_results: Vec<WriteResult>,
    pub(super) commit_time: Option<String>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

/// Client bound to one project's default database.
pub(super) struct FirestoreClient {
    http: Client,
    documents_url: String,
    database: String,
    api_key: Zeroizing<String>,
}

impl FirestoreClient {
    pub(super) fn new(
        http: Client,
        endpoint: &str,
        project_id: &str,
        api_key: Zeroizing<String>,
    ) -> Self {
        let database = format!("projects/{project_id}/databases/(default)");
        let documents_url = format!(
            "{}/v1/{database}/documents",
            endpoint.trim_end_matches('/')
        );
        Self {
            http,
            documents_url,
            database,
            api_key,
        }
    }

    /// Full resource name of a document.
    pub(super) fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, FirestoreFailure> {
        let response = request
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| FirestoreFailure::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FirestoreFailure::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, FirestoreFailure> {
        serde_json::from_slice(body).map_err(|err| FirestoreFailure::Decode(err.to_string()))
    }

    /// Fetch one document; `None` when it does not exist.
    pub(super) async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, FirestoreFailure> {
        let url = format!("{}/{collection}/{id}", self.documents_url);
        match self.send(self.http.get(url)).await {
            Ok(body) => Self::decode(&body).map(Some),
            Err(failure) if failure.is_not_found() => Ok(None),
            Err(failure) => Err(failure),
        }
    }

    /// Run a structured query and return the matched documents in order.
    pub(super) async fn run_query(&self, query: &Json) -> Result<Vec<Document>, FirestoreFailure> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = self.send(self.http.post(url).json(query)).await?;
        let items: Vec<RunQueryItem> = Self::decode(&body)?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    /// Apply `writes` atomically.
    pub(super) async fn commit(&self, writes: &[Write]) -> Result<CommitResponse, FirestoreFailure> {
        let url = format!("{}:commit", self.documents_url);
        let body = self
            .send(self.http.post(url).json(&CommitRequest { writes }))
            .await?;
        Self::decode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_write_serialises_transforms_and_precondition() {
        let write = Write {
            update: Some(DocumentWrite {
                name: "projects/p/databases/(default)/documents/questions/q1".into(),
                fields: Fields::from([("title".to_owned(), Value::string("Why is it so?"))]),
            }),
            update_transforms: vec![FieldTransform::request_time("timestamp")],
            current_document: Some(Precondition::Exists(false)),
            ..Write::default()
        };
        let value = serde_json::to_value(&write).expect("serialise");
        assert_eq!(
            value["updateTransforms"][0],
            json!({"fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME"})
        );
        assert_eq!(value["currentDocument"], json!({"exists": false}));
        assert!(value.get("transform").is_none());
    }

    #[test]
    fn increment_transform_uses_integer_value() {
        let value = serde_json::to_value(FieldTransform::increment("answerCount", 1))
            .expect("serialise");
        assert_eq!(
            value,
            json!({"fieldPath": "answerCount", "increment": {"integerValue": "1"}})
        );
    }

    #[test]
    fn update_time_precondition_shape() {
        let value = serde_json::to_value(Precondition::UpdateTime("2024-01-01T00:00:00Z".into()))
            .expect("serialise");
        assert_eq!(value, json!({"updateTime": "2024-01-01T00:00:00Z"}));
    }

    #[test]
    fn api_error_body_is_classified() {
        let body = br#"{"error": {"code": 400, "message": "stale", "status": "FAILED_PRECONDITION"}}"#;
        let failure = map_status_error(StatusCode::BAD_REQUEST, body);
        assert!(failure.is_conflict());
        assert!(!failure.is_unavailable());
    }

    #[test]
    fn non_json_error_falls_back_to_reason() {
        let failure = map_status_error(StatusCode::SERVICE_UNAVAILABLE, b"upstream down");
        assert!(failure.is_unavailable());
        assert_eq!(
            failure,
            FirestoreFailure::Api {
                status: 503,
                code: "SERVICE_UNAVAILABLE".into(),
                message: "upstream down".into(),
            }
        );
    }

    #[test]
    fn document_names_are_database_relative() {
        let client = FirestoreClient::new(
            Client::new(),
            "https://firestore.test/",
            "demo",
            Zeroizing::new("key".into()),
        );
        assert_eq!(
            client.document_name("answers", "a1"),
            "projects/demo/databases/(default)/documents/answers/a1"
        );
        assert_eq!(
            client.documents_url,
            "https://firestore.test/v1/projects/demo/databases/(default)/documents"
        );
    }
}
