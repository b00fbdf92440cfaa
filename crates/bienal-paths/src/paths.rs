use std::{
    env, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use tracing::{Level, debug, instrument};

use crate::errors::Error;

/// Variable de entorno que reemplaza la carpeta base (instalaciones portables).
pub const ENV_BASE_DIR: &str = "BIENAL_BASE_DIR";

/// Dónde vive cada cosa del catálogo en la máquina del usuario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BienalPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,

    pub data_dir: PathBuf,
    pub catalog_db: PathBuf,
}

impl BienalPaths {
    /// Resuelve las rutas, crea las carpetas que falten y verifica que se pueda
    /// escribir en ellas.
    pub fn new() -> Result<Self, Error> {
        let paths = BienalPaths::resolve()?;
        paths.validate_structure()?;
        Ok(paths)
    }

    /// Calcula las rutas (`BIENAL_BASE_DIR` o las carpetas del usuario) sin crear nada.
    pub fn resolve() -> Result<Self, Error> {
        if let Ok(base) = env::var(ENV_BASE_DIR) {
            let base = PathBuf::from(base);
            return Ok(BienalPaths::from_dirs(base.join("config"), base.join("data")));
        }

        let proj = ProjectDirs::from("ar", "Bienal", "Bienal").ok_or(Error::NoHome)?;
        Ok(BienalPaths::from_dirs(
            proj.config_dir().to_path_buf(),
            proj.data_dir().to_path_buf(),
        ))
    }

    pub fn from_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        BienalPaths {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            catalog_db: data_dir.join("catalog.db"),
            data_dir,
        }
    }

    /// Crea las carpetas que falten y falla si alguna es de sólo lectura. Ni el
    /// `settings.toml` ni la base se crean acá: el primero es opcional y la
    /// segunda la crea SQLite al abrirla.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub fn validate_structure(&self) -> Result<(), Error> {
        for dir in [&self.config_dir, &self.data_dir] {
            ensure_writable_dir(dir)?;
        }
        Ok(())
    }
}

fn ensure_writable_dir(dir: &Path) -> Result<(), Error> {
    if !dir.exists() {
        debug!("Creating {}", dir.display());
        fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let meta = fs::metadata(dir).map_err(|source| Error::Inspect {
        path: dir.to_path_buf(),
        source,
    })?;
    if meta.permissions().readonly() {
        return Err(Error::ReadOnly(dir.to_path_buf()));
    }

    Ok(())
}
