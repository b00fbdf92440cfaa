use bienal_core::{Confirmation, EventKey};
use serde::Deserialize;
use tracing::{Level, instrument, warn};

use super::{Catalog, require};
use crate::credentials::Secret;
use crate::error::{Error, Result};
use crate::procedures::Procedure;
use crate::row::ResultSet;
use crate::traits::{CredentialHasher, ImageUploader, RowSource};
use crate::uploads::{Destination, ImagePayload};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub location: String,
    pub theme: Option<String>,
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

/// Nuevos valores de un evento. Reemplaza todos los campos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub name: String,
    pub location: String,
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    pub theme: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArtist {
    pub national_id: String,
    pub full_name: String,
    pub biography: Option<String>,
    pub contact: Option<String>,
    pub password: Option<Secret>,
}

/// Nuevos datos de un artista. `photo_url` y `password` en `None` conservan lo guardado.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistUpdate {
    pub national_id: String,
    pub given_name: String,
    pub family_name: String,
    pub biography: Option<String>,
    pub contact: Option<String>,
    pub photo_url: Option<String>,
    pub password: Option<Secret>,
}

impl ArtistUpdate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name.trim(), self.family_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSculpture {
    pub name: String,
    pub created_on: Option<String>,
    pub background: Option<String>,
    pub technique: Option<String>,
}

fn generated_id(procedure: Procedure, result: &ResultSet) -> Result<i64> {
    result
        .last_insert_id
        .ok_or_else(|| Error::query(procedure.name(), "no row was inserted"))
}

/// Sólo se hashea una contraseña no vacía; `None` deja la guardada.
async fn hash_optional<H: CredentialHasher>(hasher: &H, password: Option<&Secret>) -> Result<Option<String>> {
    match password {
        Some(p) if !p.is_empty() => Ok(Some(hasher.hash(p.expose()).await?)),
        _ => Ok(None),
    }
}

fn matched(what: String, result: &ResultSet) -> Result<()> {
    if result.affected == 0 {
        return Err(Error::NotFound(what));
    }
    Ok(())
}

/// Altas, modificaciones y bajas.
impl<S, H, U> Catalog<S, H, U>
where
    S: RowSource,
    H: CredentialHasher,
    U: ImageUploader,
{
    /// Devuelve el id generado.
    #[instrument(level = Level::DEBUG, skip(self), fields(name = %event.name), err)]
    pub async fn insert_event(&self, event: NewEvent) -> Result<i64> {
        require("event name", &event.name)?;
        require("event location", &event.location)?;

        let procedure = Procedure::InsertEvent;
        let result = self
            .call(
                procedure,
                vec![
                    event.name.into(),
                    event.location.into(),
                    event.theme.into(),
                    event.starts_on.into(),
                    event.ends_on.into(),
                    event.starts_at.into(),
                    event.ends_at.into(),
                ],
            )
            .await?;

        generated_id(procedure, &result)
    }

    #[instrument(level = Level::DEBUG, skip(self, update), err)]
    pub async fn update_event(&self, current: &EventKey, update: EventUpdate) -> Result<Confirmation> {
        require_event(current)?;
        require("event name", &update.name)?;
        require("event location", &update.location)?;

        let result = self
            .call(
                Procedure::UpdateEvent,
                vec![
                    (&current.name).into(),
                    (&current.location).into(),
                    update.name.into(),
                    update.location.into(),
                    update.starts_on.into(),
                    update.ends_on.into(),
                    update.theme.into(),
                    update.starts_at.into(),
                    update.ends_at.into(),
                ],
            )
            .await?;

        matched(format!("event {} at {}", current.name, current.location), &result)?;
        Ok(Confirmation::EventUpdated)
    }

    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn delete_event(&self, key: &EventKey) -> Result<Confirmation> {
        require_event(key)?;

        let result = self
            .call(
                Procedure::DeleteEvent,
                vec![(&key.name).into(), (&key.location).into()],
            )
            .await?;

        matched(format!("event {} at {}", key.name, key.location), &result)?;
        Ok(Confirmation::EventDeleted)
    }

    /// Sube la foto de perfil y después inserta al artista con esa URL. Si el
    /// insert falla, la foto queda subida.
    #[instrument(level = Level::DEBUG, skip(self, portrait), err)]
    pub async fn insert_artist(&self, artist: NewArtist, portrait: ImagePayload) -> Result<i64> {
        require("national id", &artist.national_id)?;
        require("full name", &artist.full_name)?;
        if portrait.is_empty() {
            return Err(Error::validation("artist portrait is required"));
        }

        let password_hash = hash_optional(&self.hasher, artist.password.as_ref()).await?;

        let destination = Destination::artist_portrait(&self.uploads, &artist.national_id);
        let url = self.uploader.upload(&portrait, &destination).await?;

        let procedure = Procedure::InsertArtist;
        let result = self
            .call(
                procedure,
                vec![
                    artist.national_id.into(),
                    artist.full_name.into(),
                    artist.biography.into(),
                    artist.contact.into(),
                    (&url).into(),
                    password_hash.into(),
                ],
            )
            .await
            .inspect_err(|e| warn!(%url, "Artist insert failed, uploaded portrait left behind: {e}"))?;

        generated_id(procedure, &result)
    }

    #[instrument(level = Level::DEBUG, skip(self, update), err)]
    pub async fn update_artist(&self, current_national_id: &str, update: ArtistUpdate) -> Result<Confirmation> {
        require("current national id", current_national_id)?;
        require("national id", &update.national_id)?;
        let full_name = update.full_name();
        require("full name", &full_name)?;

        let password_hash = hash_optional(&self.hasher, update.password.as_ref()).await?;

        let result = self
            .call(
                Procedure::UpdateArtist,
                vec![
                    current_national_id.into(),
                    update.national_id.into(),
                    full_name.into(),
                    update.biography.into(),
                    update.contact.into(),
                    update.photo_url.into(),
                    password_hash.into(),
                ],
            )
            .await?;

        matched(format!("artist {current_national_id}"), &result)?;
        Ok(Confirmation::ArtistUpdated)
    }

    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn delete_artist(&self, national_id: &str) -> Result<Confirmation> {
        require("national id", national_id)?;

        let result = self
            .call(Procedure::DeleteArtist, vec![national_id.into()])
            .await?;

        matched(format!("artist {national_id}"), &result)?;
        Ok(Confirmation::ArtistDeleted)
    }

    #[instrument(level = Level::DEBUG, skip(self), fields(name = %sculpture.name), err)]
    pub async fn insert_sculpture(&self, sculpture: NewSculpture) -> Result<Confirmation> {
        require("sculpture name", &sculpture.name)?;

        self.call(
            Procedure::InsertSculpture,
            vec![
                sculpture.name.into(),
                sculpture.created_on.into(),
                sculpture.background.into(),
                sculpture.technique.into(),
            ],
        )
        .await?;

        Ok(Confirmation::SculptureRegistered)
    }

    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn delete_sculpture(&self, name: &str) -> Result<Confirmation> {
        require("sculpture name", name)?;

        let result = self.call(Procedure::DeleteSculpture, vec![name.into()]).await?;

        matched(format!("sculpture {name}"), &result)?;
        Ok(Confirmation::SculptureDeleted)
    }

    /// Registra al artista como autor de la escultura.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn insert_made_by(&self, national_id: &str, sculpture_name: &str) -> Result<Confirmation> {
        require("national id", national_id)?;
        require("sculpture name", sculpture_name)?;

        self.call(
            Procedure::InsertMadeBy,
            vec![national_id.into(), sculpture_name.into()],
        )
        .await?;

        Ok(Confirmation::MadeByRegistered)
    }

    /// Sube la foto de una etapa de la escultura y guarda su URL. Devuelve el id generado.
    #[instrument(level = Level::DEBUG, skip(self, image), err)]
    pub async fn insert_image(&self, stage: &str, sculpture_name: &str, image: ImagePayload) -> Result<i64> {
        require("stage", stage)?;
        require("sculpture name", sculpture_name)?;
        if image.is_empty() {
            return Err(Error::validation("image is required"));
        }

        let destination = Destination::sculpture_stage(&self.uploads, sculpture_name, stage);
        let url = self.uploader.upload(&image, &destination).await?;

        let procedure = Procedure::InsertImage;
        let result = self
            .call(procedure, vec![stage.into(), sculpture_name.into(), (&url).into()])
            .await
            .inspect_err(|e| warn!(%url, "Image insert failed, uploaded file left behind: {e}"))?;

        generated_id(procedure, &result)
    }

    /// Inscribe la escultura en el evento. Devuelve el id generado.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn insert_competes(&self, event_name: &str, sculpture_name: &str) -> Result<i64> {
        require("event name", event_name)?;
        require("sculpture name", sculpture_name)?;

        let procedure = Procedure::InsertCompetes;
        let result = self
            .call(procedure, vec![event_name.into(), sculpture_name.into()])
            .await?;

        matched(format!("event {event_name}"), &result)?;
        generated_id(procedure, &result)
    }
}

fn require_event(key: &EventKey) -> Result<()> {
    require("event name", &key.name)?;
    require("event location", &key.location)
}
