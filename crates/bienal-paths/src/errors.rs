use std::{io, path::PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No hay HOME ni XDG de donde sacar las carpetas del usuario.
    #[error("Could not determine the catalog directories: the system has no home directory, set BIENAL_BASE_DIR instead")]
    NoHome,

    #[error("Could not create catalog directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not inspect catalog directory {path}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// La carpeta existe pero es de sólo lectura.
    #[error("Catalog directory {0} is read-only")]
    ReadOnly(PathBuf),
}
