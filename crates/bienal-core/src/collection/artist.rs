use serde::{Deserialize, Serialize};

use super::rating::AvgRating;

/// Documento nacional del artista (DNI). Es su identidad dentro del catálogo.
pub type NationalId = String;

/// La entidad Artista: autor de una o más esculturas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Artist {
    pub national_id: NationalId,
    pub full_name: String,
    pub biography: Option<String>,
    pub contact: Option<String>,
    pub photo_url: Option<String>,
    pub rating: AvgRating,
    pub nationality: Option<String>,
}
