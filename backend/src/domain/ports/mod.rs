//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`LiveQueries`], [`AuthProvider`],
//! [`AnswerGenerator`]) are implemented by outbound adapters. Driving ports
//! (`*Command`, `*Query`, [`LiveUpdates`]) are implemented by domain services
//! and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod answer_generator;
mod answer_repository;
mod answers_command;
mod answers_query;
mod auth_provider;
mod live_queries;
mod live_updates;
mod question_repository;
mod questions_command;
mod questions_query;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::AccountCommand;
#[cfg(test)]
pub use answer_generator::MockAnswerGenerator;
pub use answer_generator::{AnswerGenerator, AnswerGeneratorError, UnconfiguredAnswerGenerator};
#[cfg(test)]
pub use answer_repository::MockAnswerRepository;
pub use answer_repository::{
    AnswerRepository, AnswerRepositoryError, FixtureAnswerRepository, Revision, StoredAnswer,
};
#[cfg(test)]
pub use answers_command::MockAnswersCommand;
pub use answers_command::{AnswersCommand, VoteResult};
#[cfg(test)]
pub use answers_query::MockAnswersQuery;
pub use answers_query::AnswersQuery;
#[cfg(test)]
pub use auth_provider::MockAuthProvider;
pub use auth_provider::{AuthProvider, AuthProviderError};
#[cfg(test)]
pub use live_queries::MockLiveQueries;
pub use live_queries::{FixtureLiveQueries, LiveQueries, LiveQueryError};
#[cfg(test)]
pub use live_updates::MockLiveUpdates;
pub use live_updates::LiveUpdates;
#[cfg(test)]
pub use question_repository::MockQuestionRepository;
pub use question_repository::{
    FixtureQuestionRepository, QuestionRepository, QuestionRepositoryError,
};
#[cfg(test)]
pub use questions_command::MockQuestionsCommand;
pub use questions_command::QuestionsCommand;
#[cfg(test)]
pub use questions_query::MockQuestionsQuery;
pub use questions_query::QuestionsQuery;
