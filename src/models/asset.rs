use serde::{Deserialize, Serialize};

/// A binary stored in the asset store. Owned by the store once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub secure_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryUploadResponse {
    pub public_id: Option<String>,
    pub secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryErrorResponse {
    pub error: CloudinaryErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Bytes(bytes::Bytes),
    /// A remote file the store downloads on its side.
    Url(String),
}

/// What to store and where.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub source: AssetSource,
    pub folder: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub overwrite: bool,
}

impl AssetUpload {
    pub fn new(bytes: impl Into<bytes::Bytes>, folder: impl Into<String>) -> Self {
        Self::from_source(AssetSource::Bytes(bytes.into()), folder)
    }

    pub fn from_url(url: impl Into<String>, folder: impl Into<String>) -> Self {
        Self::from_source(AssetSource::Url(url.into()), folder)
    }

    fn from_source(source: AssetSource, folder: impl Into<String>) -> Self {
        Self {
            source,
            folder: folder.into(),
            file_name: None,
            content_type: None,
            overwrite: false,
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

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
