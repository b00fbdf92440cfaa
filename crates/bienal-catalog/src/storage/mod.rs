mod embedded;

use std::{path::PathBuf, sync::Arc, time::Duration};

use rusqlite::Connection;
use tokio::task::spawn_blocking;
use tracing::{Level, debug, info, instrument, trace};

use embedded::migrations::runner;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::error::{Error, Result};
use crate::procedures::Procedure;
use crate::row::{Param, ResultSet, Row, column_value};
use crate::traits::RowSource;

/// Manejador de la base SQLite del catálogo. No guarda conexiones abiertas: cada
/// llamada abre su propia `Session` y la suelta al terminar, salga bien o mal.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    inner: Arc<Settings>,
}

#[derive(Debug)]
struct Settings {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteDatabase {
    /// Abre la base una vez para configurarla y correr las migraciones pendientes.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = match &config.backend {
            DatabaseBackend::Sqlite(path) => path.clone(),
        };

        let db = SqliteDatabase {
            inner: Arc::new(Settings {
                path,
                busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            }),
        };

        let mut session = db.acquire()?;
        Self::initialize_connection(&mut session.conn)?;

        Ok(db)
    }

    fn initialize_connection(conn: &mut Connection) -> Result<()> {
        // WAL permite lecturas mientras otra llamada escribe.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| Error::Connection(e.into()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| Error::Connection(e.into()))?;

        info!("Running catalog database migrations...");

        let report = runner().run(conn).map_err(|e| Error::Connection(e.into()))?;
        for migration in report.applied_migrations() {
            trace!("Applied migration: {:?}", migration);
        }

        info!("Migrations completed.");
        Ok(())
    }

    /// Abre una conexión nueva. Se cierra cuando la `Session` sale de alcance.
    pub fn acquire(&self) -> Result<Session> {
        let conn = Connection::open(&self.inner.path).map_err(|e| Error::Connection(e.into()))?;

        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| Error::Connection(e.into()))?;
        conn.busy_timeout(self.inner.busy_timeout)
            .map_err(|e| Error::Connection(e.into()))?;

        Ok(Session { conn })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.inner.path
    }
}

#[async_trait::async_trait]
impl RowSource for SqliteDatabase {
    #[instrument(level = Level::DEBUG, skip(self, params), fields(procedure = procedure.name()), err)]
    async fn execute(&self, procedure: Procedure, params: Vec<Param>) -> Result<ResultSet> {
        procedure.check_arity(params.len())?;

        let db = self.clone();
        let result = spawn_blocking(move || {
            let mut session = db.acquire()?;
            session.call(procedure, &params)
        })
        .await
        .map_err(|e| Error::query(procedure.name(), e))??;

        debug!(
            rows = result.rows.len(),
            affected = result.affected,
            "Procedure finished"
        );
        Ok(result)
    }
}

/// Una conexión adquirida para una sola llamada.
pub struct Session {
    conn: Connection,
}

impl Session {
    /// Ejecuta todas las sentencias del procedimiento en una transacción. Si alguna
    /// falla, la transacción se descarta (rollback al soltarla).
    pub fn call(&mut self, procedure: Procedure, params: &[Param]) -> Result<ResultSet> {
        let name = procedure.name();
        let tx = self.conn.transaction().map_err(|e| Error::query(name, e))?;

        let mut result = ResultSet::default();

        for (i, sql) in procedure.statements().iter().enumerate() {
            let mut stmt = tx.prepare(sql).map_err(|e| Error::query(name, e))?;

            for index in 1..=stmt.parameter_count() {
                let param = params
                    .get(index - 1)
                    .ok_or_else(|| Error::validation(format!("`{name}` is missing parameter ?{index}")))?;
                stmt.raw_bind_parameter(index, param)
                    .map_err(|e| Error::query(name, e))?;
            }

            if stmt.column_count() > 0 {
                result.rows = collect_rows(&mut stmt).map_err(|e| Error::query(name, e))?;
            } else {
                let changed = stmt.raw_execute().map_err(|e| Error::query(name, e))?;
                if i == 0 {
                    result.affected = changed;
                    if changed == 0 && procedure.requires_match() {
                        trace!("`{name}` matched no rows, rolling back");
                        return Ok(result);
                    }
                }
            }
        }

        let id = tx.last_insert_rowid();
        result.last_insert_id = (id != 0).then_some(id);

        tx.commit().map_err(|e| Error::query(name, e))?;
        Ok(result)
    }
}

fn collect_rows(stmt: &mut rusqlite::Statement<'_>) -> rusqlite::Result<Vec<Row>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.raw_query();
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        let mut map = Row::new();
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), column_value(row.get_ref(i)?));
        }
        out.push(map);
    }

    Ok(out)
}
