use serde::{Deserialize, Serialize};

use super::{artist::Artist, image::Image, rating::AvgRating};

/// La Escultura: obra identificada por su nombre, con sus autores y las fotos
/// de cada etapa.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sculpture {
    pub name: String,
    /// Fecha de creación, `YYYY-MM-DD`.
    pub created_on: Option<String>,
    pub background: Option<String>,
    pub technique: Option<String>,
    pub rating: AvgRating,

    pub artists: Vec<Artist>,
    pub images: Vec<Image>,
}

impl Sculpture {
    pub fn artist(&self, national_id: &str) -> Option<&Artist> {
        self.artists.iter().find(|a| a.national_id == national_id)
    }

    pub fn image(&self, url: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.url == url)
    }
}
