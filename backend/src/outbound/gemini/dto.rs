//! Wire types for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::GenerationRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequestDto<'a> {
    pub(super) system_instruction: ContentDto<'a>,
    pub(super) contents: [ContentDto<'a>; 1],
    pub(super) generation_config: GenerationConfigDto,
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) role: Option<&'static str>,
    pub(super) parts: [PartDto<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(super) struct PartDto<'a> {
    pub(super) text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfigDto {
    pub(super) temperature: f32,
    pub(super) top_p: f32,
    pub(super) top_k: u32,
}

impl<'a> From<&'a GenerationRequest> for GenerateContentRequestDto<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            system_instruction: ContentDto {
                role: None,
                parts: [PartDto {
                    text: &request.system_instruction,
                }],
            },
            contents: [ContentDto {
                role: Some("user"),
                parts: [PartDto {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfigDto {
                temperature: request.sampling.temperature,
                top_p: request.sampling.top_p,
                top_k: request.sampling.top_k,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateContentResponseDto {
    #[serde(default)]
    pub(super) candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidateDto {
    pub(super) content: Option<CandidateContentDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidateContentDto {
    #[serde(default)]
    pub(super) parts: Vec<CandidatePartDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidatePartDto {
    pub(super) text: Option<String>,
}

impl GenerateContentResponseDto {
    /// Concatenated text parts of the first candidate, if any.
    pub(super) fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
