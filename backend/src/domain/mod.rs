//! Domain types, services and ports.
//!
//! Types validate their invariants at construction and document their serde
//! contracts. Services implement the driving ports in [`ports`] on top of the
//! driven ports, and know nothing about HTTP, WebSockets or concrete stores.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic error payload.
//! - [`User`], [`Question`], [`Answer`], [`VoteTally`]: the data model.
//! - [`QuestionListQuery`]: feed and prefix search.
//! - [`AppState`]: per-connection view state.
//! - [`Subscription`]: cancellable snapshot stream.

pub mod account_service;
pub mod answer;
pub mod answer_service;
pub mod auth;
pub mod error;
pub mod ids;
pub mod insight;
pub mod live_service;
pub mod navigation;
pub mod ports;
pub mod question;
pub mod question_service;
pub mod search;
pub mod subscription;
pub mod trace_id;
pub mod user;
pub mod vote;

pub use self::account_service::AccountService;
pub use self::answer::{
    ANSWER_MIN, Answer, AnswerBody, AnswerValidationError, NewAnswer, by_score, sort_by_score,
};
pub use self::answer_service::{AnswerService, MAX_VOTE_ATTEMPTS};
pub use self::auth::{
    AuthStateChange, CredentialsValidationError, SignInCredentials, SignUpCredentials,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{AnswerId, DocumentIdError, QuestionId};
pub use self::insight::{GenerationRequest, Sampling};
pub use self::live_service::LiveService;
pub use self::navigation::{AppState, DesiredSubscriptions, Modal, View};
pub use self::question::{
    NewQuestion, Question, QuestionDraft, QuestionTitle, QuestionValidationError, TITLE_MIN,
};
pub use self::question_service::QuestionService;
pub use self::search::{DEFAULT_FEED_LIMIT, QuestionFilter, QuestionListQuery};
pub use self::subscription::{Snapshot, SnapshotSender, SubscriberGone, Subscription};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{DisplayName, Email, User, UserId, UserValidationError};
pub use self::vote::{VoteChange, VoteDirection, VoteTally};

/// Convenient result alias for driving-port calls.
///
/// # Examples
/// ```
/// use quorum::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::not_found("question not found"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
