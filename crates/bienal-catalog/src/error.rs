use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errores de las operaciones de acceso al catálogo.
#[derive(Error, Debug)]
pub enum Error {
    /// La base no está disponible (no se pudo abrir la conexión).
    #[error("Could not connect to the catalog database: {0}")]
    Connection(#[source] BoxError),

    /// Falló la ejecución de un procedimiento.
    #[error("Procedure `{procedure}` failed: {source}")]
    Query {
        procedure: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{0} not found")]
    NotFound(String),

    /// La contraseña no coincide con el hash guardado.
    #[error("Wrong credentials for {0}")]
    Authentication(String),

    /// Datos de entrada faltantes o filas con una forma inesperada.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Image upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Credential hashing failed: {0}")]
    Hashing(#[source] BoxError),
}

impl Error {
    pub fn query(procedure: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Query {
            procedure,
            source: source.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Errores del servicio remoto de imágenes.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected upload response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Paths error: {0}")]
    Paths(#[from] bienal_paths::Error),
}
