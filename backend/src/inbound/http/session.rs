//! Cookie session wrapper used by handlers.
//!
//! The session holds the signed-in user's id and a snapshot of their
//! profile, so authenticated handlers need no provider round trip. Once a
//! live socket has been opened with the cookie it also holds a link token;
//! sign-ins on that cookie are announced through [`SessionLinks`] so the
//! socket can adopt the new user.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Error, User};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const USER_KEY: &str = "user";
pub(crate) const LIVE_LINK_KEY: &str = "live_link";

const LINK_CHANNEL_CAPACITY: usize = 64;

const LOGIN_REQUIRED: &str = "You must be logged in to do that.";

/// Domain-level view of the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store `user` as the signed-in user, rotating the session id.
    pub fn persist_user(&self, user: &User) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user.id().as_ref())
            .and_then(|()| self.0.insert(USER_KEY, user))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The signed-in user, if the cookie holds a consistent one.
    pub fn user(&self) -> Result<Option<User>, Error> {
        let id = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        let user = match self.0.get::<User>(USER_KEY) {
            Ok(user) => user,
            Err(error) => {
                warn!(%error, "discarding malformed user in session cookie");
                return Ok(None);
            }
        };
        match (id, user) {
            (Some(id), Some(user)) if user.id().as_ref() == id => Ok(Some(user)),
            (None, None) => Ok(None),
            _ => {
                warn!("session user id and profile disagree; treating as signed out");
                Ok(None)
            }
        }
    }

    /// The signed-in user or `401 Unauthorized`.
    pub fn require_user(&self) -> Result<User, Error> {
        self.user()?
            .ok_or_else(|| Error::unauthorized(LOGIN_REQUIRED))
    }

    /// Forget the signed-in user. A live link survives so sockets opened
    /// with this cookie still follow the next sign-in.
    pub fn purge(&self) -> Result<(), Error> {
        if self.existing_live_link()?.is_some() {
            self.0.remove(USER_ID_KEY);
            self.0.remove(USER_KEY);
            self.0.renew();
        } else {
            self.0.purge();
        }
        Ok(())
    }

    /// The link token, creating one on first use.
    pub fn live_link(&self) -> Result<String, Error> {
        if let Some(link) = self.existing_live_link()? {
            return Ok(link);
        }
        let link = Uuid::new_v4().to_string();
        self.0
            .insert(LIVE_LINK_KEY, &link)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))?;
        Ok(link)
    }

    /// The link token, if a live socket has been opened with this cookie.
    pub fn existing_live_link(&self) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(LIVE_LINK_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }
}

/// A sign-in made on a cookie that carries a live link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedSignIn {
    pub link: String,
    pub user: User,
}

/// Fan-out of [`LinkedSignIn`] events from HTTP handlers to live sockets.
#[derive(Debug, Clone)]
pub struct SessionLinks {
    tx: broadcast::Sender<LinkedSignIn>,
}

impl Default for SessionLinks {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(LINK_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl SessionLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce that `user` signed in on the cookie behind `session`, if a
    /// live socket has been linked to it.
    pub fn announce(&self, session: &SessionContext, user: &User) -> Result<(), Error> {
        let Some(link) = session.existing_live_link()? else {
            return Ok(());
        };
        let event = LinkedSignIn {
            link,
            user: user.clone(),
        };
        if self.tx.send(event).is_err() {
            debug!("no live sockets listening for sign-ins");
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkedSignIn> {
        self.tx.subscribe()
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
