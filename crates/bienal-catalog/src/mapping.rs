//! Esquemas de fila de cada consulta y su conversión a entidades.
//!
//! Política para los huecos de los `LEFT JOIN`: una fila sin artista (DNI nulo)
//! o sin imagen (URL nula) no agrega una entrada anidada vacía; la escultura se
//! registra igual. Una fila con DNI pero sin nombre de artista, en cambio, se
//! considera mal formada y la decodificación falla.
//!
//! Las columnas opcionales pueden venir en NULL pero tienen que estar: una fila
//! a la que le falta una columna no se completa con `None`.

use bienal_core::{Account, Artist, AvgRating, Event, EventKey, Image, NationalId, Sculpture};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Distinct, distinct_by};
use crate::row::{RowSchema, nullable};

/// Fila de `list_artists`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRow {
    pub national_id: String,
    pub full_name: String,
    #[serde(deserialize_with = "nullable")]
    pub biography: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub contact: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub photo_url: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub nationality: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub average_rating: AvgRating,
}

impl RowSchema for ArtistRow {}

impl From<ArtistRow> for Artist {
    fn from(row: ArtistRow) -> Self {
        Artist {
            national_id: row.national_id,
            full_name: row.full_name,
            biography: row.biography,
            contact: row.contact,
            photo_url: row.photo_url,
            rating: row.average_rating,
            nationality: row.nationality,
        }
    }
}

/// Fila de `list_events`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRow {
    pub name: String,
    pub location: String,
    #[serde(deserialize_with = "nullable")]
    pub starts_on: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub ends_on: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub theme: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub starts_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub ends_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub average_rating: AvgRating,
}

impl RowSchema for EventRow {}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            name: row.name,
            location: row.location,
            starts_on: row.starts_on,
            ends_on: row.ends_on,
            theme: row.theme,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            rating: row.average_rating,
        }
    }
}

/// Fila de `user_by_email`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRow {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub password_hash: String,
}

impl RowSchema for AccountRow {}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            email: row.email,
            full_name: row.full_name,
            role: row.role,
            password_hash: row.password_hash,
        }
    }
}

/// Columnas de artista tal como vienen en las consultas con join. No incluyen
/// promedio ni nacionalidad.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedArtist {
    #[serde(deserialize_with = "nullable")]
    pub national_id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub biography: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub contact: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub photo_url: Option<String>,
}

impl JoinedArtist {
    fn check(&self) -> Result<(), String> {
        if self.national_id.is_some() && self.full_name.is_none() {
            return Err("artist row without full_name".to_string());
        }
        Ok(())
    }

    fn key(&self) -> Option<NationalId> {
        self.national_id.clone()
    }

    fn to_artist(&self) -> Artist {
        Artist {
            national_id: self.national_id.clone().unwrap_or_default(),
            full_name: self.full_name.clone().unwrap_or_default(),
            biography: self.biography.clone(),
            contact: self.contact.clone(),
            photo_url: self.photo_url.clone(),
            rating: AvgRating::Unrated,
            nationality: None,
        }
    }
}

/// Fila de `list_sculptures`, `sculptures_by_event` y `sculptures_by_artist`:
/// una por cada escultura × artista × imagen.
#[derive(Debug, Clone, Deserialize)]
pub struct SculptureRow {
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub created_on: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub background: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub technique: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub average_rating: AvgRating,

    #[serde(flatten)]
    pub artist: JoinedArtist,

    #[serde(deserialize_with = "nullable")]
    pub url: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub stage: Option<String>,
}

impl RowSchema for SculptureRow {
    fn check(&self) -> Result<(), String> {
        self.artist.check()
    }
}

/// Escultura en construcción mientras se recorren sus filas.
pub struct SculptureDraft {
    sculpture: Sculpture,
    artists: Distinct<NationalId, Artist>,
    images: Distinct<String, Image>,
}

impl Aggregate<SculptureRow> for SculptureDraft {
    type Key = String;
    type Output = Sculpture;

    fn key(row: &SculptureRow) -> String {
        row.name.clone()
    }

    fn start(row: &SculptureRow) -> Self {
        SculptureDraft {
            sculpture: Sculpture {
                name: row.name.clone(),
                created_on: row.created_on.clone(),
                background: row.background.clone(),
                technique: row.technique.clone(),
                rating: row.average_rating,
                artists: Vec::new(),
                images: Vec::new(),
            },
            artists: Distinct::new(),
            images: Distinct::new(),
        }
    }

    fn absorb(&mut self, row: &SculptureRow) {
        if let Some(id) = row.artist.key() {
            self.artists.insert_with(id, || row.artist.to_artist());
        }

        if let Some(url) = &row.url {
            self.images.insert_with(url.clone(), || Image {
                url: url.clone(),
                stage: row.stage.clone(),
            });
        }
    }

    fn finish(self) -> Sculpture {
        Sculpture {
            artists: self.artists.into_vec(),
            images: self.images.into_vec(),
            ..self.sculpture
        }
    }
}

/// Fila de `sculpture_artists_and_events`: artista × evento de una escultura.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantRow {
    #[serde(flatten)]
    pub artist: JoinedArtist,

    #[serde(deserialize_with = "nullable")]
    #[serde(rename = "name")]
    pub event_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub starts_on: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub ends_on: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub theme: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub starts_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub ends_at: Option<String>,
}

impl RowSchema for ParticipantRow {
    fn check(&self) -> Result<(), String> {
        self.artist.check()?;
        if self.event_name.is_some() && self.location.is_none() {
            return Err("event row without location".to_string());
        }
        Ok(())
    }
}

impl ParticipantRow {
    fn event_key(&self) -> Option<EventKey> {
        match (&self.event_name, &self.location) {
            (Some(name), Some(location)) => Some(EventKey::new(name, location)),
            _ => None,
        }
    }

    fn to_event(&self) -> Event {
        Event {
            name: self.event_name.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            starts_on: self.starts_on.clone(),
            ends_on: self.ends_on.clone(),
            theme: self.theme.clone(),
            starts_at: self.starts_at.clone(),
            ends_at: self.ends_at.clone(),
            rating: AvgRating::Unrated,
        }
    }
}

/// Artistas autores de una escultura y eventos en los que compite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Participants {
    pub artists: Vec<Artist>,
    pub events: Vec<Event>,
}

impl Participants {
    pub fn from_rows(rows: &[ParticipantRow]) -> Self {
        Participants {
            artists: distinct_by(rows, |r| r.artist.key(), |r| r.artist.to_artist()),
            events: distinct_by(rows, ParticipantRow::event_key, ParticipantRow::to_event),
        }
    }
}
