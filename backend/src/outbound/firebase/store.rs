//! Firestore-backed repositories and polling live queries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::firestore::{
    DocumentTransform, DocumentWrite, FieldMask, FieldTransform, FirestoreClient,
    FirestoreFailure, Precondition, Write,
};
use super::query::{self, ANSWERS, QUESTIONS};
use super::value::{
    DecodeError, Document, Fields, Value, decode_answer, decode_question, encode_tally, field,
};
use crate::domain::ports::{
    AnswerRepository, AnswerRepositoryError, LiveQueries, LiveQueryError, QuestionRepository,
    QuestionRepositoryError, Revision, StoredAnswer,
};
use crate::domain::{
    Answer, AnswerId, NewAnswer, NewQuestion, Question, QuestionId, QuestionListQuery,
    Subscription, VoteTally, sort_by_score,
};
use crate::outbound::live::poll_snapshots;

/// Questions and answers stored in Cloud Firestore.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Arc<FirestoreClient>,
    poll_interval: Duration,
}

impl FirestoreStore {
    pub(super) fn new(client: FirestoreClient, poll_interval: Duration) -> Self {
        Self {
            client: Arc::new(client),
            poll_interval,
        }
    }

    async fn fetch_questions(
        &self,
        list: &QuestionListQuery,
    ) -> Result<Vec<Question>, FirestoreFailure> {
        let documents = self.client.run_query(&query::questions(list)).await?;
        Ok(list.evaluate(decode_readable(&documents, decode_question)))
    }

    async fn fetch_answers(&self, question_id: &QuestionId) -> Result<Vec<Answer>, FirestoreFailure> {
        let documents = self.client.run_query(&query::answers_for(question_id)).await?;
        let mut answers = decode_readable(&documents, decode_answer);
        sort_by_score(&mut answers);
        Ok(answers)
    }

    fn create_write(&self, collection: &str, id: &str, fields: Fields) -> Write {
        Write {
            update: Some(DocumentWrite {
                name: self.client.document_name(collection, id),
                fields,
            }),
            update_transforms: vec![FieldTransform::request_time(field::TIMESTAMP)],
            current_document: Some(Precondition::Exists(false)),
            ..Write::default()
        }
    }

    fn increment_write(&self, question_id: &QuestionId) -> Write {
        Write {
            transform: Some(DocumentTransform {
                document: self.client.document_name(QUESTIONS, question_id.as_ref()),
                field_transforms: vec![FieldTransform::increment(field::ANSWER_COUNT, 1)],
            }),
            current_document: Some(Precondition::Exists(true)),
            ..Write::default()
        }
    }

    /// Create a document and return its server-assigned creation time.
    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<DateTime<Utc>, FirestoreFailure> {
        let response = self
            .client
            .commit(&[self.create_write(collection, id, fields)])
            .await?;
        let stamped = response
            .write_results
            .into_iter()
            .next()
            .and_then(|result| result.transform_results.into_iter().next());
        match stamped {
            Some(Value::TimestampValue(at)) => Ok(at),
            _ => response
                .commit_time
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|at| at.with_timezone(&Utc))
                .ok_or_else(|| FirestoreFailure::Decode("commit returned no timestamp".into())),
        }
    }
}

/// Decode the documents that parse. Other clients can write documents this
/// service would reject (a short title, a malformed `votedBy`); those are
/// logged and left out rather than failing the whole snapshot.
fn decode_readable<T>(
    documents: &[Document],
    decode: impl Fn(&Document) -> Result<T, DecodeError>,
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|document| match decode(document) {
            Ok(item) => Some(item),
            Err(error) => {
                warn!(document = %document.name, %error, "skipping undecodable document");
                None
            }
        })
        .collect()
}

fn question_error(failure: FirestoreFailure) -> QuestionRepositoryError {
    if failure.is_unavailable() {
        QuestionRepositoryError::connection(failure.to_string())
    } else {
        QuestionRepositoryError::query(failure.to_string())
    }
}

fn answer_error(failure: FirestoreFailure) -> AnswerRepositoryError {
    if failure.is_unavailable() {
        AnswerRepositoryError::connection(failure.to_string())
    } else {
        AnswerRepositoryError::query(failure.to_string())
    }
}

fn live_error(failure: FirestoreFailure) -> LiveQueryError {
    if failure.is_unavailable() {
        LiveQueryError::connection(failure.to_string())
    } else {
        LiveQueryError::query(failure.to_string())
    }
}

fn question_fields(question: &NewQuestion) -> Fields {
    Fields::from([
        (field::TITLE.to_owned(), Value::string(question.title.as_ref())),
        (field::BODY.to_owned(), Value::string(question.body.as_str())),
        (
            field::AUTHOR_ID.to_owned(),
            Value::string(question.author_id.as_ref()),
        ),
        (
            field::AUTHOR_NAME.to_owned(),
            Value::string(question.author_name.as_str()),
        ),
        (field::ANSWER_COUNT.to_owned(), Value::integer(0)),
    ])
}

fn answer_fields(answer: &NewAnswer) -> Fields {
    let mut fields = encode_tally(&VoteTally::default());
    fields.extend([
        (
            field::QUESTION_ID.to_owned(),
            Value::string(answer.question_id.as_ref()),
        ),
        (field::BODY.to_owned(), Value::string(answer.body.as_ref())),
        (
            field::AUTHOR_ID.to_owned(),
            Value::string(answer.author_id.as_ref()),
        ),
        (
            field::AUTHOR_NAME.to_owned(),
            Value::string(answer.author_name.as_str()),
        ),
    ]);
    fields
}

#[async_trait]
impl QuestionRepository for FirestoreStore {
    async fn insert(&self, question: NewQuestion) -> Result<Question, QuestionRepositoryError> {
        let id = QuestionId::random();
        let created_at = self
            .create(QUESTIONS, id.as_ref(), question_fields(&question))
            .await
            .map_err(question_error)?;
        debug!(question_id = %id, "question document created");
        Ok(Question::from_new(id, question, created_at))
    }

    async fn find_by_id(
        &self,
        id: &QuestionId,
    ) -> Result<Option<Question>, QuestionRepositoryError> {
        let Some(document) = self
            .client
            .get(QUESTIONS, id.as_ref())
            .await
            .map_err(question_error)?
        else {
            return Ok(None);
        };
        decode_question(&document)
            .map(Some)
            .map_err(|err| QuestionRepositoryError::query(err.to_string()))
    }

    async fn increment_answer_count(
        &self,
        id: &QuestionId,
    ) -> Result<(), QuestionRepositoryError> {
        match self.client.commit(&[self.increment_write(id)]).await {
            Ok(_) => Ok(()),
            Err(failure) if failure.is_not_found() => {
                Err(QuestionRepositoryError::not_found(id.to_string()))
            }
            Err(failure) => Err(question_error(failure)),
        }
    }

    async fn query(
        &self,
        query: &QuestionListQuery,
    ) -> Result<Vec<Question>, QuestionRepositoryError> {
        self.fetch_questions(query).await.map_err(question_error)
    }
}

#[async_trait]
impl AnswerRepository for FirestoreStore {
    async fn insert(&self, answer: NewAnswer) -> Result<Answer, AnswerRepositoryError> {
        let id = AnswerId::random();
        let created_at = self
            .create(ANSWERS, id.as_ref(), answer_fields(&answer))
            .await
            .map_err(answer_error)?;
        debug!(answer_id = %id, "answer document created");
        Ok(Answer::from_new(id, answer, created_at))
    }

    async fn find_by_id(
        &self,
        id: &AnswerId,
    ) -> Result<Option<StoredAnswer>, AnswerRepositoryError> {
        let Some(document) = self
            .client
            .get(ANSWERS, id.as_ref())
            .await
            .map_err(answer_error)?
        else {
            return Ok(None);
        };
        let answer =
            decode_answer(&document).map_err(|err| AnswerRepositoryError::query(err.to_string()))?;
        Ok(Some(StoredAnswer {
            answer,
            revision: Revision::new(document.update_time),
        }))
    }

    async fn save_tally(
        &self,
        id: &AnswerId,
        tally: &VoteTally,
        expected: &Revision,
    ) -> Result<Revision, AnswerRepositoryError> {
        let fields = encode_tally(tally);
        let write = Write {
            update_mask: Some(FieldMask {
                field_paths: fields.keys().cloned().collect(),
            }),
            update: Some(DocumentWrite {
                name: self.client.document_name(ANSWERS, id.as_ref()),
                fields,
            }),
            current_document: Some(Precondition::UpdateTime(expected.to_string())),
            ..Write::default()
        };
        let response = match self.client.commit(&[write]).await {
            Ok(response) => response,
            Err(failure) if failure.is_not_found() => {
                return Err(AnswerRepositoryError::not_found(id.to_string()));
            }
            Err(failure) if failure.is_conflict() => {
                return Err(AnswerRepositoryError::revision_mismatch(expected.to_string()));
            }
            Err(failure) => return Err(answer_error(failure)),
        };
        response
            .write_results
            .into_iter()
            .next()
            .and_then(|result| result.update_time)
            .map(Revision::new)
            .ok_or_else(|| AnswerRepositoryError::query("commit returned no update time"))
    }

    async fn list_for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Answer>, AnswerRepositoryError> {
        self.fetch_answers(question_id).await.map_err(answer_error)
    }
}

impl LiveQueries for FirestoreStore {
    fn subscribe_questions(&self, query: QuestionListQuery) -> Subscription<Question> {
        let store = self.clone();
        poll_snapshots(self.poll_interval, move || {
            let store = store.clone();
            let query = query.clone();
            async move { store.fetch_questions(&query).await.map_err(live_error) }
        })
    }

    fn subscribe_answers(&self, question_id: QuestionId) -> Subscription<Answer> {
        let store = self.clone();
        poll_snapshots(self.poll_interval, move || {
            let store = store.clone();
            let question_id = question_id.clone();
            async move { store.fetch_answers(&question_id).await.map_err(live_error) }
        })
    }
}
