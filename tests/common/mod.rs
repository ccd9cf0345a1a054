//! Fake collaborators that count calls.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use visage::{
    models::{
        asset::{AssetUpload, UploadedAsset},
        image::GeneratedImage,
    },
    orchestrator::{Orchestrator, PipelineSettings},
    AssetStore, GenerationPrompt, ImageGenerator, Result, VisageError,
};

#[derive(Default)]
pub struct CountingGenerator {
    pub calls: AtomicUsize,
    pub fail_on: Option<usize>,
    pub prompts: Mutex<Vec<String>>,
}

impl CountingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for CountingGenerator {
    async fn generate(&self, prompt: &GenerationPrompt, _size: &str) -> Result<GeneratedImage> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_on == Some(n) {
            return Err(VisageError::GenerationError("upstream 500".into()));
        }
        Ok(GeneratedImage::Inline(Bytes::from(format!("png-{}", n))))
    }
}

#[derive(Default)]
pub struct CountingStore {
    pub calls: AtomicUsize,
    pub fail_on: Option<usize>,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for CountingStore {
    async fn upload(&self, upload: AssetUpload) -> Result<UploadedAsset> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(n) {
            return Err(VisageError::StorageError("cloudinary said 500".into()));
        }
        let public_id = format!("{}/asset_{}", upload.folder, n);
        Ok(UploadedAsset {
            secure_url: format!("https://res.cloudinary.com/demo/image/upload/{}.png", public_id),
            public_id,
        })
    }
}

pub fn orchestrator(
    generator: &Arc<CountingGenerator>,
    store: &Arc<CountingStore>,
    settings: PipelineSettings,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(generator.clone(), store.clone(), None, settings).unwrap())
}

pub const BOUNDARY: &str = "visage-test-boundary";

pub enum FormPart<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn jpeg<'a>(name: &'a str, file_name: &'a str) -> FormPart<'a> {
    FormPart::File {
        name,
        file_name,
        content_type: "image/jpeg",
        data: b"\xFF\xD8\xFFfake-jpeg",
    }
}

/// Hand-built `multipart/form-data` body.
pub fn multipart(parts: &[FormPart]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
