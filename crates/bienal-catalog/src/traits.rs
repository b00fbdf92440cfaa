use crate::error::{Result, UploadError};
use crate::procedures::Procedure;
use crate::row::{Param, ResultSet};
use crate::uploads::{Destination, ImagePayload};

/// Ejecuta un procedimiento y devuelve sus filas en el orden en que las produjo.
/// Cada llamada adquiere y libera su propia conexión.
#[async_trait::async_trait]
pub trait RowSource: Send + Sync {
    async fn execute(&self, procedure: Procedure, params: Vec<Param>) -> Result<ResultSet>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, secret: &str) -> Result<String>;
    async fn verify(&self, secret: &str, hashed: &str) -> Result<bool>;
}

/// Sube una imagen al almacenamiento remoto y devuelve su URL pública.
#[async_trait::async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, payload: &ImagePayload, destination: &Destination) -> Result<String, UploadError>;
}
