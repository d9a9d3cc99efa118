//! Store-assigned document identifiers.
//!
//! Ids are opaque strings: the in-process store issues UUIDs, Firestore
//! issues 20-character auto ids. Both are accepted as long as they are
//! usable as a single document path segment.

use std::fmt;

use uuid::Uuid;

/// Validation errors for document identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentIdError {
    Empty,
    TooLong { max: usize },
    InvalidCharacter,
}

impl fmt::Display for DocumentIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier must not be empty"),
            Self::TooLong { max } => write!(f, "identifier must be at most {max} characters"),
            Self::InvalidCharacter => {
                write!(f, "identifier must not contain '/' or whitespace")
            }
        }
    }
}

impl std::error::Error for DocumentIdError {}

/// Maximum identifier length.
pub const DOCUMENT_ID_MAX: usize = 128;

fn validate(raw: &str) -> Result<(), DocumentIdError> {
    if raw.is_empty() {
        return Err(DocumentIdError::Empty);
    }
    if raw.chars().count() > DOCUMENT_ID_MAX {
        return Err(DocumentIdError::TooLong {
            max: DOCUMENT_ID_MAX,
        });
    }
    if raw.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(DocumentIdError::InvalidCharacter);
    }
    Ok(())
}

macro_rules! define_document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Result<Self, DocumentIdError> {
                let raw = raw.into();
                validate(&raw)?;
                Ok(Self(raw))
            }

            /// Fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DocumentIdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

define_document_id! {
    /// Identifier of a question document.
    QuestionId
}

define_document_id! {
    /// Identifier of an answer document.
    AnswerId
}
