use rusqlite::{
    ToSql,
    types::{ToSqlOutput, Value as SqlValue, ValueRef},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::procedures::Procedure;

/// Una fila plana: nombre de columna → valor escalar.
pub type Row = Map<String, Value>;

/// Parámetro escalar de un procedimiento.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Text(value.clone())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Integer(value)
    }
}

impl From<u8> for Param {
    fn from(value: u8) -> Self {
        Param::Integer(value.into())
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Real(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Null => ToSqlOutput::Owned(SqlValue::Null),
            Param::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Param::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Param::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Lo que devuelve una llamada a un procedimiento.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Filas de la última sentencia que devuelve columnas.
    pub rows: Vec<Row>,
    /// Filas modificadas por las sentencias de escritura.
    pub affected: usize,
    /// Identificador generado por el último `INSERT`, si hubo alguno.
    pub last_insert_id: Option<i64>,
}

impl ResultSet {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        ResultSet {
            rows,
            ..Default::default()
        }
    }
}

/// Convierte un valor de columna de SQLite en un escalar JSON.
pub(crate) fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::from(b.to_vec()),
    }
}

/// Columna que puede venir en NULL pero no puede faltar. Sin `deserialize_with`
/// serde completa un `Option` ausente con `None`; con él, la ausencia es un error.
pub fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer)
}

/// Esquema de las filas de una consulta. `check` valida lo que serde no puede
/// expresar, como columnas que deben venir juntas.
pub trait RowSchema: DeserializeOwned {
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Decodifica cada fila con el esquema `T` de la consulta. Falla en la primera
/// fila que no tenga la forma esperada.
pub fn decode_rows<T: RowSchema>(procedure: Procedure, rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value::<T>(Value::Object(row))
                .and_then(|decoded| {
                    decoded
                        .check()
                        .map(|_| decoded)
                        .map_err(<serde_json::Error as serde::de::Error>::custom)
                })
                .map_err(|e| {
                    Error::validation(format!("row {i} of `{}` has an unexpected shape: {e}", procedure.name()))
                })
        })
        .collect()
}
