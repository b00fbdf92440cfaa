//! Procedimientos del catálogo.
//!
//! SQLite no tiene procedimientos almacenados, así que cada uno es una lista fija
//! de sentencias parametrizadas que se ejecutan dentro de una misma transacción.
//! Los parámetros son posicionales (`?1`, `?2`, ...) y cada sentencia puede usar
//! sólo una parte de ellos.

use std::fmt;

use crate::error::{Error, Result};

/// Columnas comunes de las consultas escultura × artista × imagen.
macro_rules! sculpture_join {
    () => {
        "SELECT s.name, s.created_on, s.background, s.technique,
                (SELECT AVG(v.rating) FROM votes v WHERE v.sculpture_name = s.name) AS average_rating,
                a.national_id, a.full_name, a.biography, a.contact, a.photo_url,
                i.url, i.stage
           FROM sculptures s
           LEFT JOIN made_by m ON m.sculpture_name = s.name
           LEFT JOIN artists a ON a.national_id = m.national_id
           LEFT JOIN images i ON i.sculpture_name = s.name"
    };
}

macro_rules! sculpture_order {
    () => {
        " ORDER BY s.name, a.national_id, i.id"
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    ListArtists,
    ListSculptures,
    ListEvents,
    SculpturesByEvent,
    SculpturesByArtist,
    SculptureArtistsAndEvents,
    UserByEmail,
    RegisterUser,
    ChangePassword,
    RecordVote,
    InsertEvent,
    UpdateEvent,
    DeleteEvent,
    InsertArtist,
    UpdateArtist,
    DeleteArtist,
    InsertSculpture,
    DeleteSculpture,
    InsertMadeBy,
    InsertImage,
    InsertCompetes,
}

impl Procedure {
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::ListArtists => "list_artists",
            Procedure::ListSculptures => "list_sculptures",
            Procedure::ListEvents => "list_events",
            Procedure::SculpturesByEvent => "sculptures_by_event",
            Procedure::SculpturesByArtist => "sculptures_by_artist",
            Procedure::SculptureArtistsAndEvents => "sculpture_artists_and_events",
            Procedure::UserByEmail => "user_by_email",
            Procedure::RegisterUser => "register_user",
            Procedure::ChangePassword => "change_password",
            Procedure::RecordVote => "record_vote",
            Procedure::InsertEvent => "insert_event",
            Procedure::UpdateEvent => "update_event",
            Procedure::DeleteEvent => "delete_event",
            Procedure::InsertArtist => "insert_artist",
            Procedure::UpdateArtist => "update_artist",
            Procedure::DeleteArtist => "delete_artist",
            Procedure::InsertSculpture => "insert_sculpture",
            Procedure::DeleteSculpture => "delete_sculpture",
            Procedure::InsertMadeBy => "insert_made_by",
            Procedure::InsertImage => "insert_image",
            Procedure::InsertCompetes => "insert_competes",
        }
    }

    /// Cantidad de parámetros que recibe el procedimiento.
    pub fn arity(&self) -> usize {
        match self {
            Procedure::ListArtists | Procedure::ListSculptures | Procedure::ListEvents => 0,
            Procedure::SculpturesByEvent
            | Procedure::SculpturesByArtist
            | Procedure::SculptureArtistsAndEvents
            | Procedure::UserByEmail
            | Procedure::DeleteArtist
            | Procedure::DeleteSculpture => 1,
            Procedure::ChangePassword
            | Procedure::DeleteEvent
            | Procedure::InsertMadeBy
            | Procedure::InsertCompetes => 2,
            Procedure::RegisterUser | Procedure::RecordVote | Procedure::InsertImage => 3,
            Procedure::InsertSculpture => 4,
            Procedure::InsertArtist => 6,
            Procedure::InsertEvent | Procedure::UpdateArtist => 7,
            Procedure::UpdateEvent => 9,
        }
    }

    /// Sentencias del procedimiento, en orden. La primera es la principal: sus
    /// filas modificadas son las que se informan en `ResultSet::affected`.
    pub fn statements(&self) -> &'static [&'static str] {
        match self {
            Procedure::ListArtists => &["SELECT a.national_id, a.full_name, a.biography, a.contact, a.photo_url, a.nationality,
                        (SELECT AVG(v.rating)
                           FROM votes v
                           JOIN made_by m ON m.sculpture_name = v.sculpture_name
                          WHERE m.national_id = a.national_id) AS average_rating
                   FROM artists a
                  ORDER BY a.full_name COLLATE NOCASE, a.national_id"],

            Procedure::ListSculptures => &[concat!(sculpture_join!(), sculpture_order!())],

            Procedure::ListEvents => &["SELECT e.name, e.location, e.starts_on, e.ends_on, e.theme, e.starts_at, e.ends_at,
                        (SELECT AVG(v.rating)
                           FROM votes v
                           JOIN competes c ON c.sculpture_name = v.sculpture_name
                          WHERE c.event_name = e.name) AS average_rating
                   FROM events e
                  ORDER BY e.starts_on, e.name, e.location"],

            Procedure::SculpturesByEvent => &[concat!(
                sculpture_join!(),
                " WHERE s.name IN (SELECT c.sculpture_name FROM competes c WHERE c.event_name = ?1)",
                sculpture_order!()
            )],

            Procedure::SculpturesByArtist => &[concat!(
                sculpture_join!(),
                " WHERE s.name IN (SELECT mb.sculpture_name FROM made_by mb WHERE mb.national_id = ?1)",
                sculpture_order!()
            )],

            Procedure::SculptureArtistsAndEvents => &["SELECT a.national_id, a.full_name, a.biography, a.contact, a.photo_url,
                        e.name, e.location, e.starts_on, e.ends_on, e.theme, e.starts_at, e.ends_at
                   FROM sculptures s
                   LEFT JOIN made_by m ON m.sculpture_name = s.name
                   LEFT JOIN artists a ON a.national_id = m.national_id
                   LEFT JOIN competes c ON c.sculpture_name = s.name
                   LEFT JOIN events e ON e.name = c.event_name
                  WHERE s.name = ?1
                  ORDER BY a.national_id, e.name, e.location"],

            Procedure::UserByEmail => {
                &["SELECT email, full_name, role, password_hash FROM users WHERE email = ?1"]
            }

            Procedure::RegisterUser => {
                &["INSERT INTO users (full_name, email, password_hash) VALUES (?1, ?2, ?3)"]
            }

            Procedure::ChangePassword => &["UPDATE users SET password_hash = ?2 WHERE email = ?1"],

            Procedure::RecordVote => &["INSERT INTO votes (email, sculpture_name, rating) VALUES (?1, ?2, ?3)
                 ON CONFLICT (email, sculpture_name) DO UPDATE SET rating = excluded.rating"],

            Procedure::InsertEvent => &["INSERT INTO events (name, location, theme, starts_on, ends_on, starts_at, ends_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"],

            Procedure::UpdateEvent => &[
                "UPDATE events
                    SET name = ?3, location = ?4, starts_on = ?5, ends_on = ?6,
                        theme = ?7, starts_at = ?8, ends_at = ?9
                  WHERE name = ?1 AND location = ?2",
                // Sólo se renombra en `competes` si ya no queda otro evento con el nombre viejo.
                "UPDATE competes SET event_name = ?3
                  WHERE event_name = ?1 AND ?1 <> ?3
                    AND NOT EXISTS (SELECT 1 FROM events WHERE name = ?1)",
            ],

            Procedure::DeleteEvent => &[
                "DELETE FROM events WHERE name = ?1 AND location = ?2",
                "DELETE FROM competes
                  WHERE event_name = ?1
                    AND NOT EXISTS (SELECT 1 FROM events WHERE name = ?1)",
            ],

            Procedure::InsertArtist => &["INSERT INTO artists (national_id, full_name, biography, contact, photo_url, password_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"],

            Procedure::UpdateArtist => &["UPDATE artists
                    SET national_id = ?2, full_name = ?3, biography = ?4, contact = ?5,
                        photo_url = COALESCE(?6, photo_url),
                        password_hash = COALESCE(?7, password_hash)
                  WHERE national_id = ?1"],

            Procedure::DeleteArtist => &["DELETE FROM artists WHERE national_id = ?1"],

            Procedure::InsertSculpture => &["INSERT INTO sculptures (name, created_on, background, technique)
                 VALUES (?1, ?2, ?3, ?4)"],

            Procedure::DeleteSculpture => &["DELETE FROM sculptures WHERE name = ?1"],

            Procedure::InsertMadeBy => {
                &["INSERT INTO made_by (national_id, sculpture_name) VALUES (?1, ?2)"]
            }

            Procedure::InsertImage => {
                &["INSERT INTO images (stage, sculpture_name, url) VALUES (?1, ?2, ?3)"]
            }

            // Sin evento con ese nombre no se inserta nada.
            Procedure::InsertCompetes => &["INSERT INTO competes (event_name, sculpture_name)
                 SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM events WHERE name = ?1)"],
        }
    }

    /// Procedimientos cuya sentencia principal tiene que tocar alguna fila. Si no
    /// toca ninguna, las siguientes no se ejecutan y la transacción se descarta.
    pub fn requires_match(&self) -> bool {
        matches!(
            self,
            Procedure::UpdateEvent
                | Procedure::DeleteEvent
                | Procedure::UpdateArtist
                | Procedure::DeleteArtist
                | Procedure::DeleteSculpture
                | Procedure::InsertCompetes
        )
    }

    /// Rechaza la llamada antes de tocar la base si la cantidad de parámetros no coincide.
    pub fn check_arity(&self, given: usize) -> Result<()> {
        if given != self.arity() {
            return Err(Error::validation(format!(
                "`{}` expects {} parameters, got {given}",
                self.name(),
                self.arity()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
