//! Tests for the answer service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use rstest::rstest;

use super::*;
use crate::domain::insight::{AI_AUTHOR_ID, AI_AUTHOR_NAME};
use crate::domain::ports::{
    MockAnswerGenerator, MockAnswerRepository, MockQuestionRepository, Revision, StoredAnswer,
    UnconfiguredAnswerGenerator,
};
use crate::domain::{
    ErrorCode, NewQuestion, QuestionDraft, VoteChange, VoteTally,
};

type Service<G> = AnswerService<MockQuestionRepository, MockAnswerRepository, G>;

fn question() -> Question {
    let author = User::new(UserId::new("asker").expect("id"), None, None);
    let draft = QuestionDraft::try_from_parts("How does async work in Rust?", None).expect("draft");
    Question::from_new(
        QuestionId::new("q1").expect("id"),
        NewQuestion::from_draft(draft, &author),
        Utc::now(),
    )
}

fn stored_answer(tally: VoteTally, revision: &str) -> StoredAnswer {
    let author = User::new(UserId::new("writer").expect("id"), None, None);
    let mut answer = Answer::from_new(
        AnswerId::new("a1").expect("id"),
        NewAnswer::by_user(
            QuestionId::new("q1").expect("id"),
            AnswerBody::new("It uses futures and an executor.").expect("body"),
            &author,
        ),
        Utc::now(),
    );
    answer.tally = tally;
    StoredAnswer {
        answer,
        revision: Revision::new(revision),
    }
}

fn questions_with_existing() -> MockQuestionRepository {
    let mut questions = MockQuestionRepository::new();
    questions
        .expect_find_by_id()
        .returning(|_| Ok(Some(question())));
    questions
}

fn inserting_answers() -> MockAnswerRepository {
    let mut answers = MockAnswerRepository::new();
    answers
        .expect_insert()
        .times(1)
        .returning(|new| Ok(Answer::from_new(AnswerId::new("a9").expect("id"), new, Utc::now())));
    answers
}

fn service<G>(
    questions: MockQuestionRepository,
    answers: MockAnswerRepository,
    generator: G,
) -> Service<G> {
    AnswerService::new(Arc::new(questions), Arc::new(answers), Arc::new(generator))
}

fn voter() -> UserId {
    UserId::new("voter").expect("id")
}

#[tokio::test]
async fn post_answer_increments_answer_count() {
    let mut questions = questions_with_existing();
    questions
        .expect_increment_answer_count()
        .times(1)
        .withf(|id| id.as_ref() == "q1")
        .returning(|_| Ok(()));

    let author = User::new(voter(), None, None);
    let body = AnswerBody::new("Futures are polled by an executor.").expect("body");
    let answer = service(questions, inserting_answers(), UnconfiguredAnswerGenerator)
        .post_answer(&author, &QuestionId::new("q1").expect("id"), body)
        .await
        .expect("post succeeds");
    assert_eq!(answer.tally, VoteTally::default());
    assert_eq!(answer.author_id, voter());
}

#[tokio::test]
async fn post_answer_to_missing_question_writes_nothing() {
    let mut questions = MockQuestionRepository::new();
    questions.expect_find_by_id().returning(|_| Ok(None));
    questions.expect_increment_answer_count().never();
    let mut answers = MockAnswerRepository::new();
    answers.expect_insert().never();

    let author = User::new(voter(), None, None);
    let body = AnswerBody::new("Futures are polled by an executor.").expect("body");
    let err = service(questions, answers, UnconfiguredAnswerGenerator)
        .post_answer(&author, &QuestionId::new("q1").expect("id"), body)
        .await
        .expect_err("missing question");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn ai_answer_without_credential_posts_notice() {
    let mut questions = questions_with_existing();
    questions
        .expect_increment_answer_count()
        .times(1)
        .returning(|_| Ok(()));

    let answer = service(questions, inserting_answers(), UnconfiguredAnswerGenerator)
        .request_ai_answer(&QuestionId::new("q1").expect("id"))
        .await
        .expect("notice is still posted");
    assert_eq!(answer.body.as_ref(), NOT_CONFIGURED_NOTICE);
    assert_eq!(answer.author_id.as_ref(), AI_AUTHOR_ID);
    assert_eq!(answer.author_name, AI_AUTHOR_NAME);
}

#[rstest]
#[case(AnswerGeneratorError::transport("timeout"))]
#[case(AnswerGeneratorError::status(500_u16, "boom"))]
#[case(AnswerGeneratorError::empty_response())]
#[tokio::test]
async fn ai_answer_generation_failure_posts_apology(#[case] failure: AnswerGeneratorError) {
    let mut questions = questions_with_existing();
    questions
        .expect_increment_answer_count()
        .returning(|_| Ok(()));
    let mut generator = MockAnswerGenerator::new();
    generator
        .expect_generate()
        .return_once(move |_| Err(failure));

    let answer = service(questions, inserting_answers(), generator)
        .request_ai_answer(&QuestionId::new("q1").expect("id"))
        .await
        .expect("apology is posted");
    assert_eq!(answer.body.as_ref(), GENERATION_FAILED_NOTICE);
}

#[tokio::test]
async fn ai_answer_uses_question_title_in_prompt() {
    let mut questions = questions_with_existing();
    questions
        .expect_increment_answer_count()
        .returning(|_| Ok(()));
    let mut generator = MockAnswerGenerator::new();
    generator
        .expect_generate()
        .withf(|request| request.prompt.contains("\"How does async work in Rust?\""))
        .return_once(|_| Ok("  Executors poll futures.  ".to_owned()));

    let answer = service(questions, inserting_answers(), generator)
        .request_ai_answer(&QuestionId::new("q1").expect("id"))
        .await
        .expect("generated answer");
    assert_eq!(answer.body.as_ref(), "Executors poll futures.");
}

#[tokio::test]
async fn vote_retries_after_revision_mismatch() {
    let mut answers = MockAnswerRepository::new();
    answers
        .expect_find_by_id()
        .times(2)
        .returning(|_| Ok(Some(stored_answer(VoteTally::default(), "1"))));
    let saves = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&saves);
    answers.expect_save_tally().times(2).returning(move |_, tally, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(AnswerRepositoryError::revision_mismatch("1"));
        }
        assert_eq!(tally.upvotes, 1);
        Ok(Revision::new("2"))
    });

    let result = service(MockQuestionRepository::new(), answers, UnconfiguredAnswerGenerator)
        .vote(&voter(), &AnswerId::new("a1").expect("id"), VoteDirection::Up)
        .await
        .expect("vote succeeds on retry");
    assert_eq!(
        result.change,
        VoteChange::Cast {
            direction: VoteDirection::Up
        }
    );
    assert_eq!(saves.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn vote_gives_up_after_bounded_attempts() {
    let mut answers = MockAnswerRepository::new();
    answers
        .expect_find_by_id()
        .returning(|_| Ok(Some(stored_answer(VoteTally::default(), "1"))));
    answers
        .expect_save_tally()
        .times(usize::try_from(MAX_VOTE_ATTEMPTS).expect("small constant"))
        .returning(|_, _, _| Err(AnswerRepositoryError::revision_mismatch("1")));

    let err = service(MockQuestionRepository::new(), answers, UnconfiguredAnswerGenerator)
        .vote(&voter(), &AnswerId::new("a1").expect("id"), VoteDirection::Down)
        .await
        .expect_err("contention");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn vote_on_missing_answer_has_no_side_effects() {
    let mut answers = MockAnswerRepository::new();
    answers.expect_find_by_id().returning(|_| Ok(None));
    answers.expect_save_tally().never();

    let err = service(MockQuestionRepository::new(), answers, UnconfiguredAnswerGenerator)
        .vote(&voter(), &AnswerId::new("a1").expect("id"), VoteDirection::Up)
        .await
        .expect_err("missing answer");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn repeated_vote_retracts() {
    let mut tally = VoteTally::default();
    tally.apply(&voter(), VoteDirection::Up);
    let mut answers = MockAnswerRepository::new();
    answers
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored_answer(tally, "4"))));
    answers
        .expect_save_tally()
        .withf(|_, tally, expected| tally.upvotes == 0 && expected.as_ref() == "4")
        .return_once(|_, _, _| Ok(Revision::new("5")));

    let result = service(MockQuestionRepository::new(), answers, UnconfiguredAnswerGenerator)
        .vote(&voter(), &AnswerId::new("a1").expect("id"), VoteDirection::Up)
        .await
        .expect("retract succeeds");
    assert_eq!(
        result.change,
        VoteChange::Retracted {
            direction: VoteDirection::Up
        }
    );
    assert!(result.tally.voted_by.is_empty());
}

#[tokio::test]
async fn list_requires_existing_question() {
    let mut questions = MockQuestionRepository::new();
    questions.expect_find_by_id().returning(|_| Ok(None));
    let mut answers = MockAnswerRepository::new();
    answers.expect_list_for_question().never();

    let err = service(questions, answers, UnconfiguredAnswerGenerator)
        .list_for_question(&QuestionId::new("q1").expect("id"))
        .await
        .expect_err("missing question");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
