use bytes::Bytes;
use std::path::Path;

pub const MIN_AGE: u8 = 0;
pub const MAX_AGE: u8 = 50;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// One uploaded parent photograph as it arrived in the form.
#[derive(Debug, Clone)]
pub struct ParentImage {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ParentImage {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Accepted when either the extension or the declared content type is on the allow-list.
    pub fn is_allowed_format(&self) -> bool {
        let by_extension = self
            .extension()
            .map_or(false, |ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        let by_content_type = self.content_type.as_deref().map_or(false, |ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            ALLOWED_CONTENT_TYPES.contains(&essence.as_str())
        });
        by_extension || by_content_type
    }

    /// Best MIME type to announce when forwarding the bytes.
    pub fn mime(&self) -> String {
        if let Some(ct) = self.content_type.as_deref() {
            return ct.to_string();
        }
        self.file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderHint {
    Boy,
    Girl,
    Neutral,
}

impl GenderHint {
    /// Never fails: anything unrecognized is neutral.
    pub fn parse(raw: Option<&str>) -> Self {
        let token = match raw {
            Some(token) => token.trim().to_lowercase(),
            None => return GenderHint::Neutral,
        };
        match token.as_str() {
            "boy" | "garcon" | "garçon" | "man" | "male" | "m" => GenderHint::Boy,
            "girl" | "fille" | "woman" | "female" | "w" | "f" => GenderHint::Girl,
            _ => GenderHint::Neutral,
        }
    }
}

/// Raw form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub father: Option<ParentImage>,
    pub mother: Option<ParentImage>,
    pub gender: Option<String>,
    pub age: Option<String>,
}

/// Input that passed validation; only this reaches external services.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub father: ParentImage,
    pub mother: ParentImage,
    pub gender: GenderHint,
    pub age: Option<u8>,
}
