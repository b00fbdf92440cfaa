use serde::{Deserialize, Serialize};

/// Promedio de votos de una entidad. `Unrated` cuando nadie votó todavía o cuando
/// la consulta que la construyó no incluye el promedio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Option<f64>", into = "Option<f64>")]
pub enum AvgRating {
    #[default]
    Unrated,
    Rated(Rating),
}

impl AvgRating {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AvgRating::Unrated => None,
            AvgRating::Rated(rating) => Some(rating.as_f64()),
        }
    }
}

impl TryFrom<Option<f64>> for AvgRating {
    type Error = RatingError;

    fn try_from(value: Option<f64>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(AvgRating::Unrated),
            Some(v) => Rating::new(v).map(AvgRating::Rated),
        }
    }
}

impl From<AvgRating> for Option<f64> {
    fn from(value: AvgRating) -> Self {
        value.as_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("rating {0} is outside of the 0..=5 scale")]
pub struct RatingError(pub f64);

/// Valor de punto fijo en la escala 0..=5, con cuatro decimales de precisión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u32);

impl Rating {
    const SCALE_FACTOR: u32 = 10000;
    const MAX_VALUE: u32 = 5 * Self::SCALE_FACTOR;

    pub fn new(value: f64) -> Result<Self, RatingError> {
        if !(0.0..=5.0).contains(&value) {
            return Err(RatingError(value));
        }

        let scaled_value = (value * Self::SCALE_FACTOR as f64).round() as u32;

        if scaled_value > Self::MAX_VALUE {
            return Err(RatingError(value));
        }

        Ok(Self(scaled_value))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE_FACTOR as f64
    }
}
