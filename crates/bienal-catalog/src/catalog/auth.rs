use bienal_core::{Account, Confirmation};
use tracing::{Level, info, instrument};

use super::{Catalog, require};
use crate::error::{Error, Result};
use crate::mapping::AccountRow;
use crate::procedures::Procedure;
use crate::traits::{CredentialHasher, ImageUploader, RowSource};

/// Votos válidos: de 1 a 5 estrellas.
const VOTE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Cuentas y votos.
impl<S, H, U> Catalog<S, H, U>
where
    S: RowSource,
    H: CredentialHasher,
    U: ImageUploader,
{
    /// Busca la cuenta por correo y compara la contraseña contra el hash guardado.
    /// Sin cuenta no se compara nada (`NotFound`); si no coincide, `Authentication`.
    /// Si coincide devuelve las filas tal cual.
    #[instrument(level = Level::DEBUG, skip(self, password), err)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Vec<Account>> {
        let accounts = self.verified_accounts(email, password).await?;
        info!("Login succeeded");
        Ok(accounts)
    }

    /// Registra un visitante. La contraseña se guarda hasheada.
    #[instrument(level = Level::DEBUG, skip(self, password), err)]
    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> Result<Confirmation> {
        require("full name", full_name)?;
        require("email", email)?;
        require("password", password)?;

        let hashed = self.hasher.hash(password).await?;
        self.call(
            Procedure::RegisterUser,
            vec![full_name.into(), email.into(), hashed.into()],
        )
        .await?;

        Ok(Confirmation::Registered)
    }

    /// Igual que `login` con la contraseña actual; si pasa, guarda el hash de la nueva.
    #[instrument(level = Level::DEBUG, skip(self, current, new), err)]
    pub async fn change_password(&self, email: &str, current: &str, new: &str) -> Result<Confirmation> {
        require("new password", new)?;

        self.verified_accounts(email, current).await?;

        let hashed = self.hasher.hash(new).await?;
        self.call(Procedure::ChangePassword, vec![email.into(), hashed.into()])
            .await?;

        Ok(Confirmation::Done)
    }

    /// Guarda (o reemplaza) el voto del usuario sobre la escultura.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub async fn record_vote(&self, rating: u8, sculpture_name: &str, email: &str) -> Result<Confirmation> {
        if !VOTE_RANGE.contains(&rating) {
            return Err(Error::validation(format!("vote {rating} is outside of 1..=5")));
        }
        require("sculpture name", sculpture_name)?;
        require("email", email)?;

        self.call(
            Procedure::RecordVote,
            vec![email.into(), sculpture_name.into(), rating.into()],
        )
        .await?;

        Ok(Confirmation::Done)
    }

    async fn verified_accounts(&self, email: &str, password: &str) -> Result<Vec<Account>> {
        require("email", email)?;

        let rows: Vec<AccountRow> = self.query(Procedure::UserByEmail, vec![email.into()]).await?;

        let Some(first) = rows.first() else {
            return Err(Error::NotFound(format!("account {email}")));
        };

        if !self.hasher.verify(password, &first.password_hash).await? {
            return Err(Error::Authentication(email.to_string()));
        }

        Ok(rows.into_iter().map(Account::from).collect())
    }
}
