use serde::{Deserialize, Serialize};

/// Fotografía de una etapa del proceso de una escultura. La URL es su única identidad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub stage: Option<String>,
}
