use serde::{Deserialize, Serialize};

/// Cuenta de usuario tal como la devuelve la búsqueda por correo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub full_name: String,
    pub role: String,
    /// Hash bcrypt de la contraseña. Nunca se serializa hacia afuera.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}
