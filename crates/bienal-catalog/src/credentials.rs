use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tracing::{Level, instrument};

use crate::config::HashingConfig;
use crate::error::{Error, Result};
use crate::traits::CredentialHasher;

/// Texto sensible (contraseñas, claves de API). Se serializa tal cual pero nunca
/// aparece en `Debug`, así que no se filtra en logs ni en `#[instrument]`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Hashes bcrypt, compatibles con los que ya hay guardados en la base.
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(config: &HashingConfig) -> Self {
        BcryptHasher { cost: config.cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        BcryptHasher::new(&HashingConfig::default())
    }
}

#[async_trait::async_trait]
impl CredentialHasher for BcryptHasher {
    #[instrument(level = Level::TRACE, skip_all, err)]
    async fn hash(&self, secret: &str) -> Result<String> {
        let secret = secret.to_owned();
        let cost = self.cost;

        // bcrypt es deliberadamente lento: fuera del runtime async.
        spawn_blocking(move || bcrypt::hash(secret, cost))
            .await
            .map_err(|e| Error::Hashing(e.into()))?
            .map_err(|e| Error::Hashing(e.into()))
    }

    #[instrument(level = Level::TRACE, skip_all, err)]
    async fn verify(&self, secret: &str, hashed: &str) -> Result<bool> {
        let secret = secret.to_owned();
        let hashed = hashed.to_owned();

        spawn_blocking(move || bcrypt::verify(secret, &hashed))
            .await
            .map_err(|e| Error::Hashing(e.into()))?
            .map_err(|e| Error::Hashing(e.into()))
    }
}
