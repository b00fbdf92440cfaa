use std::path::{Path, PathBuf};

use bienal_paths::BienalPaths;
use config::{Config, Environment, File, FileFormat};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::Secret;
use crate::error::ConfigError;

/// Prefijo de las variables de entorno que pisan la configuración
/// (`BIENAL__UPLOADS__API_SECRET`, `BIENAL__DATABASE__BUSY_TIMEOUT_MS`, ...).
pub const ENV_PREFIX: &str = "BIENAL";

/// Backends de base de datos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path")]
pub enum DatabaseBackend {
    Sqlite(PathBuf),
}

impl Default for DatabaseBackend {
    fn default() -> Self {
        let path = BienalPaths::resolve()
            .map(|paths| paths.catalog_db)
            .unwrap_or_else(|_| PathBuf::from("catalog.db"));
        DatabaseBackend::Sqlite(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// Espera máxima si la base está ocupada antes de fallar.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: DatabaseBackend::default(),
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            backend: DatabaseBackend::Sqlite(path.into()),
            ..Default::default()
        }
    }
}

/// Servicio remoto de imágenes (API de subida firmada estilo Cloudinary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Secret,
    pub api_base: String,
    /// Carpeta de las fotos de perfil de los artistas.
    pub artist_folder: String,
    /// Carpeta de las fotos de etapas de las esculturas.
    pub sculpture_folder: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: Secret::default(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            artist_folder: "profile-picture".to_string(),
            sculpture_folder: "sculpture-images".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct HashingConfig {
    /// Rondas de bcrypt.
    pub cost: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        HashingConfig { cost: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directiva de `EnvFilter`; `RUST_LOG` tiene prioridad.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct CatalogConfig {
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub hashing: HashingConfig,
    pub logging: LoggingConfig,
}

impl CatalogConfig {
    /// Carga la configuración en capas: valores por defecto, fichero TOML (si existe)
    /// y variables de entorno `BIENAL__*`. Sin ruta se usa el `settings.toml` del usuario.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => BienalPaths::new()?.settings_file,
        };

        debug!("Loading configuration from {}", path.display());

        let cfg = Config::builder()
            .add_source(Config::try_from(&CatalogConfig::default())?)
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(cfg.try_deserialize::<CatalogConfig>()?)
    }

    /// Carga sólo desde un fichero TOML, sin mirar el entorno.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let cfg = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml))
            .build()?;
        Ok(cfg.try_deserialize::<CatalogConfig>()?)
    }

    /// Escribe la configuración por defecto en `path`, creando la carpeta padre.
    pub fn write_default(path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(&CatalogConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
