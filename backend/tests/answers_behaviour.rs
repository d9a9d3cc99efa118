//! Behavioural tests for answers, votes and search over the in-process store.

use std::sync::Arc;

use mockable::DefaultClock;
use quorum::domain::ports::{
    AnswersCommand, AnswersQuery, QuestionsCommand, QuestionsQuery, UnconfiguredAnswerGenerator,
};
use quorum::domain::{
    AnswerBody, AnswerService, ErrorCode, QuestionDraft, QuestionListQuery, QuestionService, User,
    UserId, VoteDirection,
};
use quorum::outbound::memory::MemoryStore;
use rstest::{fixture, rstest};

type Answers = AnswerService<MemoryStore, MemoryStore, UnconfiguredAnswerGenerator>;

struct World {
    questions: QuestionService<MemoryStore>,
    answers: Answers,
}

#[fixture]
fn world() -> World {
    let store = Arc::new(MemoryStore::new(Arc::new(DefaultClock)));
    World {
        questions: QuestionService::new(store.clone()),
        answers: AnswerService::new(store.clone(), store, Arc::new(UnconfiguredAnswerGenerator)),
    }
}

fn user(id: &str) -> User {
    User::new(UserId::new(id).expect("user id"), None, None)
}

async fn ask(world: &World, title: &str) -> quorum::domain::Question {
    let draft = QuestionDraft::try_from_parts(title, None).expect("draft");
    world
        .questions
        .post_question(&user("asker"), draft)
        .await
        .expect("question posted")
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_votes_are_never_lost(world: World) {
    let question = ask(&world, "How do lifetimes work?").await;
    let body = AnswerBody::new("They bound how long a borrow is valid.").expect("body");
    let answer = world
        .answers
        .post_answer(&user("answerer"), &question.id, body)
        .await
        .expect("answer posted");

    let world = Arc::new(world);
    let voters: Vec<UserId> = (0..5)
        .map(|n| UserId::new(format!("voter-{n}")).expect("voter id"))
        .collect();
    let handles: Vec<_> = voters
        .iter()
        .cloned()
        .map(|voter| {
            let world = Arc::clone(&world);
            let answer_id = answer.id.clone();
            tokio::spawn(async move {
                world
                    .answers
                    .vote(&voter, &answer_id, VoteDirection::Up)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task").expect("vote applied");
    }

    let listed = world
        .answers
        .list_for_question(&question.id)
        .await
        .expect("answers");
    let tally = &listed[0].tally;
    assert_eq!(tally.upvotes, 5);
    assert_eq!(tally.downvotes, 0);
    assert!(voters.iter().all(|voter| tally.direction_of(voter) == Some(VoteDirection::Up)));
}

#[rstest]
#[tokio::test]
async fn answer_count_tracks_posts(world: World) {
    let question = ask(&world, "What does Pin guarantee?").await;
    for n in 0..3 {
        let body = AnswerBody::new(format!("Answer number {n} explains pinning.")).expect("body");
        world
            .answers
            .post_answer(&user("answerer"), &question.id, body)
            .await
            .expect("answer posted");
    }

    let stored = world.questions.get(&question.id).await.expect("question");
    assert_eq!(stored.answer_count, 3);
}

#[rstest]
#[tokio::test]
async fn prefix_search_matches_title_prefix_only(world: World) {
    ask(&world, "Why is the sky blue?").await;
    ask(&world, "Why do cats purr?").await;
    ask(&world, "When is it done").await;

    let found = world
        .questions
        .list(&QuestionListQuery::from_search("Why", 50))
        .await
        .expect("search");
    let titles: Vec<&str> = found.iter().map(|q| q.title.as_ref()).collect();
    assert_eq!(titles, ["Why do cats purr?", "Why is the sky blue?"]);
}

#[rstest]
#[tokio::test]
async fn unconfigured_ai_answer_posts_notice(world: World) {
    let question = ask(&world, "Is Rust memory safe?").await;
    let answer = world
        .answers
        .request_ai_answer(&question.id)
        .await
        .expect("notice posted");
    assert!(!answer.body.as_ref().is_empty());

    let stored = world.questions.get(&question.id).await.expect("question");
    assert_eq!(stored.answer_count, 1);
}

#[rstest]
#[tokio::test]
async fn short_titles_are_rejected_before_the_store(world: World) {
    assert!(QuestionDraft::try_from_parts("Too short", None).is_err());
    let feed = world
        .questions
        .list(&QuestionListQuery::default())
        .await
        .expect("feed");
    assert!(feed.is_empty());
}

#[rstest]
#[tokio::test]
async fn voting_on_missing_answer_is_not_found(world: World) {
    let missing = quorum::domain::AnswerId::new("missing").expect("id");
    let err = world
        .answers
        .vote(&UserId::new("voter").expect("id"), &missing, VoteDirection::Down)
        .await
        .expect_err("missing answer");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
