use std::fmt;

use serde::Serialize;

/// Respuesta fija de las operaciones de escritura que no generan un identificador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Done,
    Registered,
    SculptureRegistered,
    MadeByRegistered,
    EventUpdated,
    EventDeleted,
    ArtistUpdated,
    ArtistDeleted,
    SculptureDeleted,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Confirmation::Done => "done",
            Confirmation::Registered => "account registered",
            Confirmation::SculptureRegistered => "sculpture registered",
            Confirmation::MadeByRegistered => "authorship registered",
            Confirmation::EventUpdated => "event updated",
            Confirmation::EventDeleted => "event deleted",
            Confirmation::ArtistUpdated => "artist updated",
            Confirmation::ArtistDeleted => "artist deleted",
            Confirmation::SculptureDeleted => "sculpture deleted",
        };
        f.write_str(msg)
    }
}
