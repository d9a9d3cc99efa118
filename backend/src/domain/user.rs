//! User identity as issued by the auth provider.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors for user identity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    IdTooLong { max: usize },
    InvalidEmail,
    EmptyDisplayName,
    DisplayNameTooShort { min: usize },
    DisplayNameTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must not carry surrounding whitespace"),
            Self::IdTooLong { max } => write!(f, "user id must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "Please enter a valid email address."),
            Self::EmptyDisplayName => write!(f, "Display name must not be empty."),
            Self::DisplayNameTooShort { min } => {
                write!(f, "Display name must be at least {min} characters long.")
            }
            Self::DisplayNameTooLong { max } => {
                write!(f, "Display name must be at most {max} characters long.")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Maximum length of a provider-issued user id.
pub const USER_ID_MAX: usize = 128;

/// Opaque user identifier issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        if id.chars().count() > USER_ID_MAX {
            return Err(UserValidationError::IdTooLong { max: USER_ID_MAX });
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address in `local@domain.tld` shape, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = email.as_ref().trim();
        if !email_regex().is_match(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 3;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 50;

/// Human readable display name, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(display_name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = display_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        let length = trimmed.chars().count();
        if length < DISPLAY_NAME_MIN {
            return Err(UserValidationError::DisplayNameTooShort {
                min: DISPLAY_NAME_MIN,
            });
        }
        if length > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Author name used when a user has neither display name nor email.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Signed-in user.
///
/// ## Invariants
/// - `id` is non-empty and carries no surrounding whitespace.
/// - `display_name`, when present, is 3..=50 characters once trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "pQ3x9rT2aLk")]
    id: UserId,
    #[schema(value_type = Option<String>, example = "ada@example.com")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<Email>,
    #[schema(value_type = Option<String>, example = "Ada Lovelace")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<DisplayName>,
}

impl User {
    /// Build a user from validated components.
    pub fn new(id: UserId, email: Option<Email>, display_name: Option<DisplayName>) -> Self {
        Self {
            id,
            email,
            display_name,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    /// Copy of this user with a new display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: DisplayName) -> Self {
        self.display_name = Some(display_name);
        self
    }

    /// Name denormalised onto questions and answers: display name, else
    /// email, else [`ANONYMOUS_AUTHOR`].
    pub fn author_name(&self) -> String {
        self.display_name
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| self.email.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" abc", UserValidationError::InvalidId)]
    fn user_id_rejects_invalid(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn user_id_rejects_overlong_values() {
        let raw = "a".repeat(USER_ID_MAX + 1);
        assert_eq!(
            UserId::new(raw),
            Err(UserValidationError::IdTooLong { max: USER_ID_MAX })
        );
    }

    #[rstest]
    fn ai_author_id_is_valid() {
        assert!(UserId::new("gemini-ai").is_ok());
    }

    #[rstest]
    #[case("ada@example.com", true)]
    #[case("  ada@example.com  ", true)]
    #[case("ada@example", false)]
    #[case("not an email", false)]
    fn email_shape(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(Email::new(raw).is_ok(), ok);
    }

    #[rstest]
    #[case("ab", Err(UserValidationError::DisplayNameTooShort { min: DISPLAY_NAME_MIN }))]
    #[case("  ab  ", Err(UserValidationError::DisplayNameTooShort { min: DISPLAY_NAME_MIN }))]
    #[case("   ", Err(UserValidationError::EmptyDisplayName))]
    #[case(" Ada ", Ok("Ada"))]
    fn display_name_validation(
        #[case] raw: &str,
        #[case] expected: Result<&str, UserValidationError>,
    ) {
        let result = DisplayName::new(raw).map(String::from);
        assert_eq!(result, expected.map(str::to_owned));
    }

    #[rstest]
    fn display_name_rejects_overlong_values() {
        let raw = "x".repeat(DISPLAY_NAME_MAX + 1);
        assert_eq!(
            DisplayName::new(raw),
            Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            })
        );
    }

    fn id() -> UserId {
        UserId::new("u1").expect("valid id")
    }

    #[rstest]
    fn author_name_prefers_display_name() {
        let user = User::new(
            id(),
            Some(Email::new("ada@example.com").expect("email")),
            Some(DisplayName::new("Ada").expect("name")),
        );
        assert_eq!(user.author_name(), "Ada");
    }

    #[rstest]
    fn author_name_falls_back_to_email_then_anonymous() {
        let with_email = User::new(id(), Some(Email::new("ada@example.com").expect("email")), None);
        assert_eq!(with_email.author_name(), "ada@example.com");
        assert_eq!(User::new(id(), None, None).author_name(), ANONYMOUS_AUTHOR);
    }

    #[rstest]
    fn serialises_camel_case_without_absent_fields() {
        let user = User::new(id(), None, Some(DisplayName::new("Ada").expect("name")));
        let value = serde_json::to_value(&user).expect("serialise");
        assert_eq!(value, json!({"id": "u1", "displayName": "Ada"}));
    }

    #[rstest]
    fn deserialising_rejects_short_display_name() {
        let payload = json!({"id": "u1", "displayName": "A"});
        assert!(serde_json::from_value::<User>(payload).is_err());
    }
}
