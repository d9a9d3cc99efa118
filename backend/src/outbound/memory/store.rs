//! In-process document store.
//!
//! Holds questions and answers behind a single async lock and bumps a change
//! counter after every write; live queries re-evaluate when it moves. Each
//! answer carries a monotonically increasing revision used for the tally
//! compare-and-swap. Nothing is persisted across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::{RwLock, watch};

use crate::domain::ports::{
    AnswerRepository, AnswerRepositoryError, LiveQueries, QuestionRepository,
    QuestionRepositoryError, Revision, StoredAnswer,
};
use crate::domain::{
    Answer, AnswerId, NewAnswer, NewQuestion, Question, QuestionId, QuestionListQuery,
    Subscription, VoteTally, sort_by_score,
};
use crate::outbound::live::watch_snapshots;

#[derive(Debug, Clone)]
struct AnswerSlot {
    answer: Answer,
    revision: u64,
}

impl AnswerSlot {
    fn stored(&self) -> StoredAnswer {
        StoredAnswer {
            answer: self.answer.clone(),
            revision: Revision::new(self.revision.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct Documents {
    questions: HashMap<QuestionId, Question>,
    answers: HashMap<AnswerId, AnswerSlot>,
}

struct Inner {
    documents: RwLock<Documents>,
    changes: watch::Sender<u64>,
    clock: Arc<dyn Clock>,
}

/// Shared handle to the in-process store; clones see the same documents.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Empty store stamping documents with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                documents: RwLock::new(Documents::default()),
                changes,
                clock,
            }),
        }
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|version| *version += 1);
    }

    async fn questions_for(&self, query: &QuestionListQuery) -> Vec<Question> {
        let documents = self.inner.documents.read().await;
        query.evaluate(documents.questions.values().cloned())
    }

    async fn answers_for(&self, question_id: &QuestionId) -> Vec<Answer> {
        let documents = self.inner.documents.read().await;
        let mut answers: Vec<Answer> = documents
            .answers
            .values()
            .filter(|slot| &slot.answer.question_id == question_id)
            .map(|slot| slot.answer.clone())
            .collect();
        sort_by_score(&mut answers);
        answers
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn insert(&self, question: NewQuestion) -> Result<Question, QuestionRepositoryError> {
        let stored = Question::from_new(QuestionId::random(), question, self.inner.clock.utc());
        self.inner
            .documents
            .write()
            .await
            .questions
            .insert(stored.id.clone(), stored.clone());
        self.notify();
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        id: &QuestionId,
    ) -> Result<Option<Question>, QuestionRepositoryError> {
        Ok(self.inner.documents.read().await.questions.get(id).cloned())
    }

    async fn increment_answer_count(
        &self,
        id: &QuestionId,
    ) -> Result<(), QuestionRepositoryError> {
        {
            let mut documents = self.inner.documents.write().await;
            let question = documents
                .questions
                .get_mut(id)
                .ok_or_else(|| QuestionRepositoryError::not_found(id.to_string()))?;
            question.answer_count = question.answer_count.saturating_add(1);
        }
        self.notify();
        Ok(())
    }

    async fn query(
        &self,
        query: &QuestionListQuery,
    ) -> Result<Vec<Question>, QuestionRepositoryError> {
        Ok(self.questions_for(query).await)
    }
}

#[async_trait]
impl AnswerRepository for MemoryStore {
    async fn insert(&self, answer: NewAnswer) -> Result<Answer, AnswerRepositoryError> {
        let stored = Answer::from_new(AnswerId::random(), answer, self.inner.clock.utc());
        self.inner.documents.write().await.answers.insert(
            stored.id.clone(),
            AnswerSlot {
                answer: stored.clone(),
                revision: 1,
            },
        );
        self.notify();
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        id: &AnswerId,
    ) -> Result<Option<StoredAnswer>, AnswerRepositoryError> {
        Ok(self
            .inner
            .documents
            .read()
            .await
            .answers
            .get(id)
            .map(AnswerSlot::stored))
    }

    async fn save_tally(
        &self,
        id: &AnswerId,
        tally: &VoteTally,
        expected: &Revision,
    ) -> Result<Revision, AnswerRepositoryError> {
        let revision = {
            let mut documents = self.inner.documents.write().await;
            let slot = documents
                .answers
                .get_mut(id)
                .ok_or_else(|| AnswerRepositoryError::not_found(id.to_string()))?;
            if slot.revision.to_string() != expected.as_ref() {
                return Err(AnswerRepositoryError::revision_mismatch(expected.to_string()));
            }
            slot.answer.tally = tally.clone();
            slot.revision += 1;
            slot.revision
        };
        self.notify();
        Ok(Revision::new(revision.to_string()))
    }

    async fn list_for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Answer>, AnswerRepositoryError> {
        Ok(self.answers_for(question_id).await)
    }
}

impl LiveQueries for MemoryStore {
    fn subscribe_questions(&self, query: QuestionListQuery) -> Subscription<Question> {
        let store = self.clone();
        watch_snapshots(self.inner.changes.subscribe(), move || {
            let store = store.clone();
            let query = query.clone();
            async move { Ok(store.questions_for(&query).await) }
        })
    }

    fn subscribe_answers(&self, question_id: QuestionId) -> Subscription<Answer> {
        let store = self.clone();
        watch_snapshots(self.inner.changes.subscribe(), move || {
            let store = store.clone();
            let question_id = question_id.clone();
            async move { Ok(store.answers_for(&question_id).await) }
        })
    }
}
