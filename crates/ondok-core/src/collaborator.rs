//! External collaborators: generative-model extraction and OCR.
//!
//! Both are blocking network calls behind small traits so the pipeline can
//! be exercised with in-process stubs. Callers never see a
//! [`CollaboratorError`](crate::error::CollaboratorError): [`extract_or_fallback`] degrades to
//! [`EXTRACTION_FAILED`] and [`recognize_or_empty`] to an empty string,
//! logging the cause.
//!
//! With the `remote` feature, [`OpenAiClient`] implements both traits
//! against an OpenAI-compatible chat completions endpoint.

use std::fmt::Write as _;

use crate::error::CollaboratorResult;
use crate::vocab::VocabTable;

#[cfg(feature = "remote")]
use crate::config::CollaboratorConfig;
#[cfg(feature = "remote")]
use crate::error::CollaboratorError;

/// Placeholder returned when extraction fails.
pub const EXTRACTION_FAILED: &str = "extraction failed";

/// Extracts (word, grade) pairs from a passage as free text.
pub trait WordExtractor {
    /// Ask the model for the tool words used in `text`.
    fn extract(&self, text: &str, vocab: &VocabTable) -> CollaboratorResult<String>;
}

/// Recognizes text in an image.
pub trait TextRecognizer {
    /// Return the text found in `image`.
    fn recognize(&self, image: &[u8]) -> CollaboratorResult<String>;
}

/// What the extraction collaborator produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Raw model response, still untrusted.
    Response(String),
    /// The call failed; `message` describes why.
    Failed {
        /// Human-readable cause.
        message: String,
    },
}

impl Extraction {
    /// Text to show the user: the response, or the fallback placeholder.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Response(text) => text,
            Self::Failed { .. } => EXTRACTION_FAILED,
        }
    }
}

/// Call the extractor, converting any failure into [`Extraction::Failed`].
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn extract_or_fallback(
    extractor: &dyn WordExtractor,
    text: &str,
    vocab: &VocabTable,
) -> Extraction {
    match extractor.extract(text, vocab) {
        Ok(response) => {
            tracing::info!(response_len = response.len(), "extraction received");
            Extraction::Response(response)
        }
        Err(e) => {
            tracing::warn!(error = %e, "extraction failed, using fallback");
            Extraction::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Call the recognizer, returning an empty string on any failure.
#[tracing::instrument(skip_all, fields(image_len = image.len()))]
pub fn recognize_or_empty(recognizer: &dyn TextRecognizer, image: &[u8]) -> String {
    match recognizer.recognize(image) {
        Ok(text) => {
            tracing::info!(text_len = text.len(), "text recognized");
            text
        }
        Err(e) => {
            tracing::warn!(error = %e, "text recognition failed");
            String::new()
        }
    }
}

/// Build the extraction instruction: full vocabulary plus the passage.
///
/// The model is asked to answer one `word/grade` pair per line and to pick
/// only words from the list, with the grade given in the list.
pub fn build_prompt(vocab: &VocabTable, text: &str) -> String {
    let mut prompt = String::from(
        "다음은 사고도구어 목록입니다. 각 줄은 '단어/등급' 형식입니다.\n\
         아래 지문에서 실제로 사고도구어의 의미로 쓰인 단어만 골라,\n\
         목록에 적힌 등급 그대로 한 줄에 하나씩 '단어/등급' 형식으로만 답하세요.\n\
         목록에 없는 단어는 포함하지 마세요.\n\n[사고도구어 목록]\n",
    );
    for entry in vocab.entries() {
        let _ = writeln!(prompt, "{}/{}", entry.word, entry.grade);
    }
    prompt.push_str("\n[지문]\n");
    prompt.push_str(text);
    prompt
}

/// Instruction sent along with an image for OCR.
pub const OCR_PROMPT: &str = "이미지에 있는 글자를 빠짐없이 그대로 옮겨 적으세요. \
                              설명이나 요약 없이 본문 텍스트만 출력하세요.";

/// Guess an image MIME type from magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Client for an OpenAI-compatible chat completions API.
#[cfg(feature = "remote")]
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
    vision_model: String,
}

#[cfg(feature = "remote")]
mod wire {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize)]
    pub struct ChatRequest<'a> {
        pub model: &'a str,
        pub temperature: f32,
        pub messages: Vec<Message<'a>>,
    }

    #[derive(Serialize)]
    pub struct Message<'a> {
        pub role: &'static str,
        pub content: Vec<Part<'a>>,
    }

    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Part<'a> {
        Text { text: &'a str },
        ImageUrl { image_url: ImageUrl },
    }

    #[derive(Serialize)]
    pub struct ImageUrl {
        pub url: String,
    }

    #[derive(Deserialize)]
    pub struct ChatResponse {
        pub choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    pub struct Choice {
        pub message: ResponseMessage,
    }

    #[derive(Deserialize)]
    pub struct ResponseMessage {
        pub content: Option<String>,
    }

    #[derive(Deserialize)]
    pub struct ErrorResponse {
        pub error: ErrorBody,
    }

    #[derive(Deserialize)]
    pub struct ErrorBody {
        pub message: String,
    }
}

#[cfg(feature = "remote")]
impl OpenAiClient {
    /// Build a client from configuration, reading the key from the environment.
    pub fn from_config(config: &CollaboratorConfig) -> CollaboratorResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CollaboratorError::MissingCredential {
                env_var: config.api_key_env.clone(),
            })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
        })
    }

    fn complete(&self, model: &str, content: Vec<wire::Part<'_>>) -> CollaboratorResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = wire::ChatRequest {
            model,
            temperature: 0.0,
            messages: vec![wire::Message {
                role: "user",
                content,
            }],
        };
        tracing::debug!(%url, model, "sending completion request");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<wire::ErrorResponse>()
                .map_or_else(|_| "unknown error".to_string(), |b| b.error.message);
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: wire::ChatResponse = response
            .json()
            .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CollaboratorError::MalformedResponse("no message content".to_string()))
    }
}

#[cfg(feature = "remote")]
impl WordExtractor for OpenAiClient {
    fn extract(&self, text: &str, vocab: &VocabTable) -> CollaboratorResult<String> {
        let prompt = build_prompt(vocab, text);
        self.complete(&self.model, vec![wire::Part::Text { text: &prompt }])
    }
}

#[cfg(feature = "remote")]
impl TextRecognizer for OpenAiClient {
    fn recognize(&self, image: &[u8]) -> CollaboratorResult<String> {
        use base64::Engine as _;

        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let url = format!("data:{};base64,{encoded}", sniff_image_mime(image));
        self.complete(
            &self.vision_model,
            vec![
                wire::Part::Text { text: OCR_PROMPT },
                wire::Part::ImageUrl {
                    image_url: wire::ImageUrl { url },
                },
            ],
        )
    }
}
