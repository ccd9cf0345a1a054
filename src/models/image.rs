use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One payload returned by a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Decoded image bytes that still need a durable home.
    Inline(Bytes),
    /// A reference the generation service already hosts.
    Remote(String),
}

/// Ordered result of one request. `failed` is only non-zero under the partial policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedImageSet {
    pub images: Vec<String>,
    pub failed: usize,
}

/// Parses `"WIDTHxHEIGHT"`. Returns `None` for `"auto"` and anything malformed.
pub fn parse_dimensions(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.trim().split_once(|c: char| c == 'x' || c == 'X')?;
    let width = w.trim().parse().ok()?;
    let height = h.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAiImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiImageResponse {
    #[serde(default)]
    pub data: Vec<OpenAiImageData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiImageData {
    pub url: Option<String>,
    pub b64_json: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TitanImageResponse {
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_parse() {
        assert_eq!(parse_dimensions("1024x1024"), Some((1024, 1024)));
        assert_eq!(parse_dimensions(" 1536X1024 "), Some((1536, 1024)));
        assert_eq!(parse_dimensions("auto"), None);
        assert_eq!(parse_dimensions("0x512"), None);
        assert_eq!(parse_dimensions("512x"), None);
    }
}
