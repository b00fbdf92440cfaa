//! Crate `bienal_catalog`: operaciones de acceso al catálogo de la bienal.
//!
//! Cada operación llama a un procedimiento de la base, decodifica las filas planas
//! y arma las entidades anidadas de `bienal_core`.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod procedures;
pub mod row;
pub mod storage;
pub mod traits;
pub mod uploads;

pub use catalog::{ArtistUpdate, Catalog, EventUpdate, NewArtist, NewEvent, NewSculpture};
pub use config::{CatalogConfig, DatabaseConfig, HashingConfig, LoggingConfig, UploadConfig};
pub use credentials::{BcryptHasher, Secret};
pub use error::{ConfigError, Error, Result, UploadError};
pub use mapping::Participants;
pub use procedures::Procedure;
pub use row::{Param, ResultSet, Row};
pub use storage::SqliteDatabase;
pub use traits::{CredentialHasher, ImageUploader, RowSource};
pub use uploads::{CloudinaryUploader, Destination, ImagePayload};
