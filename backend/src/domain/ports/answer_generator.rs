//! Driven port for the generative-text API.

use async_trait::async_trait;

use crate::domain::GenerationRequest;

use super::define_port_error;

define_port_error! {
    /// Errors raised by answer generator adapters.
    pub enum AnswerGeneratorError {
        /// No API credential is configured.
        NotConfigured => "answer generator credential is not configured",
        /// The request could not be sent or timed out.
        Transport { message: String } => "answer generator transport failed: {message}",
        /// The API answered with a non-success status.
        Status { status: u16, message: String } =>
            "answer generator returned status {status}: {message}",
        /// The response could not be decoded.
        Decode { message: String } => "answer generator response was malformed: {message}",
        /// The response carried no text.
        EmptyResponse => "answer generator returned no text",
    }
}

/// Port for producing answer text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate text for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AnswerGeneratorError>;
}

/// Generator used when no credential is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredAnswerGenerator;

#[async_trait]
impl AnswerGenerator for UnconfiguredAnswerGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<String, AnswerGeneratorError> {
        Err(AnswerGeneratorError::not_configured())
    }
}
