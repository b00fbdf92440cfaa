//! Crate `bienal_paths`: rutas de configuración y datos del catálogo

mod errors;
mod paths;

pub use errors::Error;
pub use paths::{BienalPaths, ENV_BASE_DIR};
