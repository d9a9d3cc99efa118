//! Sign-up and sign-in credentials plus auth state change events.
//!
//! Inbound adapters build these from raw strings; every check here runs
//! before the auth provider is contacted.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, Email, User, UserId, UserValidationError};

/// Errors returned when credential inputs are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was blank or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Display name failed validation.
    DisplayName(UserValidationError),
}

impl CredentialsValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "email",
            Self::EmptyPassword => "password",
            Self::DisplayName(_) => "displayName",
        }
    }
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "Please enter a valid email address."),
            Self::EmptyPassword => write!(f, "Password must not be empty."),
            Self::DisplayName(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

fn parse_email(email: &str) -> Result<Email, CredentialsValidationError> {
    Email::new(email).map_err(|_| CredentialsValidationError::InvalidEmail)
}

fn parse_password(password: &str) -> Result<Zeroizing<String>, CredentialsValidationError> {
    if password.is_empty() {
        return Err(CredentialsValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Validated sign-in credentials.
///
/// The password keeps caller-provided whitespace and is zeroised on drop.
///
/// # Examples
/// ```
/// use quorum::domain::SignInCredentials;
///
/// let creds = SignInCredentials::try_from_parts(" ada@example.com ", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Validate raw email and password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: parse_email(email)?,
            password: parse_password(password)?,
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up request: credentials plus a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpCredentials {
    credentials: SignInCredentials,
    display_name: DisplayName,
}

impl SignUpCredentials {
    /// Validate raw inputs. The display name is checked first so a short
    /// name is reported even when other fields are also wrong.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let display_name =
            DisplayName::new(display_name).map_err(CredentialsValidationError::DisplayName)?;
        let credentials = SignInCredentials::try_from_parts(email, password)?;
        Ok(Self {
            credentials,
            display_name,
        })
    }

    pub fn email(&self) -> &Email {
        self.credentials.email()
    }

    pub fn password(&self) -> &str {
        self.credentials.password()
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }
}

/// Change in the current user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    /// A user signed in or finished signing up.
    SignedIn(User),
    /// The signed-in user's profile changed.
    ProfileUpdated(User),
    /// The user signed out.
    SignedOut(UserId),
}

impl AuthStateChange {
    /// Id of the user the event concerns.
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::SignedIn(user) | Self::ProfileUpdated(user) => user.id(),
            Self::SignedOut(id) => id,
        }
    }

    /// User snapshot after the change, `None` once signed out.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(user) | Self::ProfileUpdated(user) => Some(user),
            Self::SignedOut(_) => None,
        }
    }
}
