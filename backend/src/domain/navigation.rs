//! Per-connection application view state.
//!
//! One [`AppState`] exists per live client connection. It is created when the
//! connection opens (with `auth_loading` set until the first auth event
//! arrives), mutated only by [`AppState::on_auth_changed`] and the navigation
//! actions below, and dropped when the connection closes. Adapters derive the
//! live queries a client needs from [`AppState::desired_subscriptions`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::AuthStateChange;
use super::ids::QuestionId;
use super::question::Question;
use super::search::QuestionListQuery;
use super::user::User;

/// Main view shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum View {
    Feed,
    Question {
        #[schema(value_type = String)]
        #[serde(rename = "questionId")]
        question_id: QuestionId,
    },
}

/// Modal overlay shown above the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Modal {
    Auth,
    AskQuestion,
}

/// Live queries required by the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredSubscriptions {
    /// Feed or search results, needed while the feed is shown.
    pub questions: Option<QuestionListQuery>,
    /// Answers to the selected question.
    pub answers: Option<QuestionId>,
}

/// Application state for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    user: Option<User>,
    auth_loading: bool,
    view: View,
    search_term: String,
    modal: Option<Modal>,
    feed_limit: usize,
}

impl AppState {
    /// Fresh state for a new connection.
    pub fn new(feed_limit: usize) -> Self {
        Self {
            user: None,
            auth_loading: true,
            view: View::Feed,
            search_term: String::new(),
            modal: None,
            feed_limit,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn auth_loading(&self) -> bool {
        self.auth_loading
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn modal(&self) -> Option<Modal> {
        self.modal
    }

    /// Record the outcome of an auth listener event. Passing `None` means the
    /// provider reported no signed-in user.
    pub fn on_auth_changed(&mut self, user: Option<User>) {
        self.auth_loading = false;
        let signed_in = user.is_some();
        self.user = user;
        if signed_in && self.modal == Some(Modal::Auth) {
            self.modal = None;
        }
        if !signed_in && self.modal == Some(Modal::AskQuestion) {
            self.modal = None;
        }
    }

    /// Apply an auth provider event that concerns this connection's user.
    pub fn apply_auth_event(&mut self, change: &AuthStateChange) {
        self.on_auth_changed(change.user().cloned());
    }

    /// Change the search term. The view is left alone; an open question
    /// stays open and the feed picks up the term when it is shown again.
    pub fn search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Open a question if it is part of the currently loaded feed. Returns
    /// whether the view changed.
    pub fn select_question(&mut self, id: &QuestionId, loaded: &[Question]) -> bool {
        if !loaded.iter().any(|q| &q.id == id) {
            return false;
        }
        self.view = View::Question {
            question_id: id.clone(),
        };
        true
    }

    pub fn back_to_feed(&mut self) {
        self.view = View::Feed;
    }

    /// Ask-question flow: signed-in users get the form, everyone else the
    /// auth modal.
    pub fn request_ask_question(&mut self) {
        self.modal = Some(if self.user.is_some() {
            Modal::AskQuestion
        } else {
            Modal::Auth
        });
    }

    pub fn request_login(&mut self) {
        self.modal = Some(Modal::Auth);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    /// Query matching the current search term.
    pub fn question_query(&self) -> QuestionListQuery {
        QuestionListQuery::from_search(&self.search_term, self.feed_limit)
    }

    /// Live queries the current view needs.
    pub fn desired_subscriptions(&self) -> DesiredSubscriptions {
        match &self.view {
            View::Feed => DesiredSubscriptions {
                questions: Some(self.question_query()),
                answers: None,
            },
            View::Question { question_id } => DesiredSubscriptions {
                questions: None,
                answers: Some(question_id.clone()),
            },
        }
    }
}
