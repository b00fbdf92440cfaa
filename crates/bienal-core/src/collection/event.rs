use serde::{Deserialize, Serialize};

use super::rating::AvgRating;

/// Un evento (concurso, bienal, muestra) en el que compiten esculturas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub location: String,
    /// Fechas `YYYY-MM-DD`.
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    pub theme: Option<String>,
    /// Horas `HH:MM:SS`.
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub rating: AvgRating,
}

impl Event {
    pub fn key(&self) -> EventKey {
        EventKey {
            name: self.name.clone(),
            location: self.location.clone(),
        }
    }
}

/// El nombre solo no identifica un evento: dos ediciones pueden compartirlo en
/// lugares distintos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub name: String,
    pub location: String,
}

impl EventKey {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        EventKey {
            name: name.into(),
            location: location.into(),
        }
    }
}
