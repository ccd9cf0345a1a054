use crate::{
    error::Result,
    models::asset::{AssetUpload, UploadedAsset},
};
use async_trait::async_trait;

/// Durable binary storage that hands back a retrieval URL.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, upload: AssetUpload) -> Result<UploadedAsset>;
}
