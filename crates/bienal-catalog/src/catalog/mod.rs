mod auth;
mod writes;

use bienal_core::{Artist, Event, Sculpture};
use tracing::{Level, info, instrument};

pub use writes::{ArtistUpdate, EventUpdate, NewArtist, NewEvent, NewSculpture};

use crate::aggregate::aggregate;
use crate::config::{CatalogConfig, UploadConfig};
use crate::credentials::BcryptHasher;
use crate::error::{Error, Result};
use crate::mapping::{ArtistRow, EventRow, Participants, ParticipantRow, SculptureDraft, SculptureRow};
use crate::procedures::Procedure;
use crate::row::{Param, ResultSet, RowSchema, decode_rows};
use crate::storage::SqliteDatabase;
use crate::traits::{CredentialHasher, ImageUploader, RowSource};
use crate::uploads::CloudinaryUploader;

/// Punto de entrada de la capa de presentación: una función por consulta o
/// escritura. No guarda estado entre llamadas; las entidades se arman de cero en
/// cada una.
#[derive(Debug, Clone)]
pub struct Catalog<S, H, U> {
    source: S,
    hasher: H,
    uploader: U,
    uploads: UploadConfig,
}

impl Catalog<SqliteDatabase, BcryptHasher, CloudinaryUploader> {
    /// Arma el catálogo con los colaboradores reales descritos en la configuración.
    pub fn open(config: &CatalogConfig) -> Result<Self> {
        info!("Opening catalog");

        let source = SqliteDatabase::open(&config.database)?;
        let hasher = BcryptHasher::new(&config.hashing);
        let uploader = CloudinaryUploader::new(config.uploads.clone());

        Ok(Catalog::new(source, hasher, uploader, config.uploads.clone()))
    }
}

impl<S, H, U> Catalog<S, H, U>
where
    S: RowSource,
    H: CredentialHasher,
    U: ImageUploader,
{
    pub fn new(source: S, hasher: H, uploader: U, uploads: UploadConfig) -> Self {
        Catalog {
            source,
            hasher,
            uploader,
            uploads,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn call(&self, procedure: Procedure, params: Vec<Param>) -> Result<ResultSet> {
        self.source.execute(procedure, params).await
    }

    async fn query<T: RowSchema>(&self, procedure: Procedure, params: Vec<Param>) -> Result<Vec<T>> {
        let result = self.call(procedure, params).await?;
        decode_rows(procedure, result.rows)
    }

    async fn query_sculptures(&self, procedure: Procedure, params: Vec<Param>) -> Result<Vec<Sculpture>> {
        let rows: Vec<SculptureRow> = self.query(procedure, params).await?;
        Ok(aggregate::<SculptureDraft, _>(rows))
    }
}

/// Consultas.
impl<S, H, U> Catalog<S, H, U>
where
    S: RowSource,
    H: CredentialHasher,
    U: ImageUploader,
{
    /// Todos los artistas, con su promedio y nacionalidad.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn artists(&self) -> Result<Vec<Artist>> {
        let rows: Vec<ArtistRow> = self.query(Procedure::ListArtists, vec![]).await?;
        Ok(rows.into_iter().map(Artist::from).collect())
    }

    /// Todas las esculturas con sus autores e imágenes.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn sculptures(&self) -> Result<Vec<Sculpture>> {
        self.query_sculptures(Procedure::ListSculptures, vec![]).await
    }

    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn events(&self) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = self.query(Procedure::ListEvents, vec![]).await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Esculturas que compiten en el evento.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn sculptures_by_event(&self, event_name: &str) -> Result<Vec<Sculpture>> {
        self.query_sculptures(Procedure::SculpturesByEvent, vec![event_name.into()])
            .await
    }

    /// Esculturas hechas por el artista (con todos sus coautores).
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn sculptures_by_artist(&self, national_id: &str) -> Result<Vec<Sculpture>> {
        self.query_sculptures(Procedure::SculpturesByArtist, vec![national_id.into()])
            .await
    }

    /// Autores de la escultura y eventos en los que compite.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn sculpture_participants(&self, sculpture_name: &str) -> Result<Participants> {
        let rows: Vec<ParticipantRow> = self
            .query(Procedure::SculptureArtistsAndEvents, vec![sculpture_name.into()])
            .await?;
        Ok(Participants::from_rows(&rows))
    }
}

/// Rechaza identificadores o nombres vacíos antes de hacer I/O.
fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests;
