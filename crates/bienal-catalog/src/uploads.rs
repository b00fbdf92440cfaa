use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{Level, debug, instrument};

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::traits::ImageUploader;

/// Imagen recibida desde la capa de presentación.
#[derive(Clone, Default)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        ImagePayload {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Auto,
    Image,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Auto => "auto",
            ResourceType::Image => "image",
        }
    }
}

/// Dónde queda la imagen en el almacenamiento remoto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub folder: String,
    pub public_id: String,
    pub resource_type: ResourceType,
}

impl Destination {
    /// Foto de perfil de un artista: `artist_<dni>`.
    pub fn artist_portrait(config: &UploadConfig, national_id: &str) -> Self {
        Destination {
            folder: config.artist_folder.clone(),
            public_id: format!("artist_{national_id}"),
            resource_type: ResourceType::Auto,
        }
    }

    /// Foto de una etapa de una escultura: `image_<escultura>_<etapa>`.
    pub fn sculpture_stage(config: &UploadConfig, sculpture: &str, stage: &str) -> Self {
        Destination {
            folder: config.sculpture_folder.clone(),
            public_id: format!("image_{sculpture}_{stage}"),
            resource_type: ResourceType::Image,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Cliente de subidas firmadas (API de Cloudinary).
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    config: UploadConfig,
    client: reqwest::Client,
}

impl CloudinaryUploader {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, resource_type: ResourceType) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type.as_str()
        )
    }

    /// Parámetros firmados, ya ordenados por nombre.
    fn signed_params(destination: &Destination, timestamp: u64) -> Vec<(&'static str, String)> {
        vec![
            ("folder", destination.folder.clone()),
            ("public_id", destination.public_id.clone()),
            ("timestamp", timestamp.to_string()),
        ]
    }

    /// `sha256("k1=v1&k2=v2..." + api_secret)` en hexadecimal.
    fn sign(&self, params: &[(&'static str, String)]) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.expose().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Interpreta la respuesta del servicio: fuera de 2xx es un rechazo con el mensaje
/// que mandó el servicio (o el cuerpo crudo); en 2xx tiene que venir `secure_url`.
fn parse_response(status: StatusCode, body: &str) -> Result<String, UploadError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str::<UploadResponse>(body)
        .map_err(|e| UploadError::Malformed(e.to_string()))?
        .secure_url
        .ok_or_else(|| UploadError::Malformed("response without secure_url".to_string()))
}

#[async_trait::async_trait]
impl ImageUploader for CloudinaryUploader {
    #[instrument(level = Level::DEBUG, skip(self, payload), fields(public_id = %destination.public_id, len = payload.bytes.len()), err)]
    async fn upload(&self, payload: &ImagePayload, destination: &Destination) -> Result<String, UploadError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let params = Self::signed_params(destination, timestamp);
        let signature = self.sign(&params);

        let mut file = Part::bytes(payload.bytes.clone())
            .file_name(payload.file_name.clone().unwrap_or_else(|| destination.public_id.clone()));
        if let Some(mime) = &payload.content_type {
            file = file.mime_str(mime)?;
        }

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (k, v) in params {
            form = form.text(k, v);
        }

        let response = self
            .client
            .post(self.endpoint(destination.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let url = parse_response(status, &body)?;

        debug!("Uploaded {} to {url}", destination.public_id);
        Ok(url)
    }
}
