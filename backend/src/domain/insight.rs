//! AI-generated answers ("AI insight").
//!
//! The generated answer is posted under a fixed author. When generation fails
//! the answer is still posted, carrying one of two fixed notices instead of
//! generated text.

use super::question::QuestionTitle;
use super::user::{DisplayName, User, UserId};

/// Author id used for generated answers.
pub const AI_AUTHOR_ID: &str = "gemini-ai";
/// Author name used for generated answers.
pub const AI_AUTHOR_NAME: &str = "Gemini AI";

/// Answer body posted when no generator credential is configured.
pub const NOT_CONFIGURED_NOTICE: &str =
    "Gemini API key is not configured. Please ask the administrator to set it up.";
/// Answer body posted when generation fails for any other reason.
pub const GENERATION_FAILED_NOTICE: &str =
    "Sorry, I encountered an error while trying to generate an answer. Please try again later.";

const SYSTEM_INSTRUCTION: &str = "You are a helpful and knowledgeable assistant. Your goal is to \
provide a clear, concise, and accurate answer to the user's question. Format your answer using \
markdown for readability.";

/// Sampling parameters forwarded to the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            top_k: 32,
        }
    }
}

/// Provider-neutral text generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub sampling: Sampling,
}

impl GenerationRequest {
    /// Request asking for an answer to the question titled `title`.
    ///
    /// # Examples
    /// ```
    /// use quorum::domain::{GenerationRequest, QuestionTitle};
    ///
    /// let title = QuestionTitle::new("Why is the sky blue?").unwrap();
    /// let request = GenerationRequest::for_question(&title);
    /// assert!(request.prompt.ends_with("\"Why is the sky blue?\""));
    /// ```
    pub fn for_question(title: &QuestionTitle) -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_owned(),
            prompt: format!(
                "Please provide a comprehensive answer to the following question: \"{title}\""
            ),
            sampling: Sampling::default(),
        }
    }
}

/// The fixed author of generated answers.
pub fn ai_author() -> User {
    match (UserId::new(AI_AUTHOR_ID), DisplayName::new(AI_AUTHOR_NAME)) {
        (Ok(id), Ok(name)) => User::new(id, None, Some(name)),
        (Err(err), _) | (_, Err(err)) => panic!("AI author must be valid: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_quotes_title() {
        let title = QuestionTitle::new("How do I learn Rust?").expect("title");
        let request = GenerationRequest::for_question(&title);
        assert_eq!(
            request.prompt,
            "Please provide a comprehensive answer to the following question: \"How do I learn Rust?\""
        );
        assert!(request.system_instruction.starts_with("You are a helpful"));
        assert_eq!(request.sampling.top_k, 32);
    }

    #[test]
    fn ai_author_has_fixed_id() {
        let author = ai_author();
        assert_eq!(author.id().as_ref(), AI_AUTHOR_ID);
        assert_eq!(author.author_name(), AI_AUTHOR_NAME);
    }
}
