// Connection type selection, source connection wrapper and diesel error
// mapping.
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use etl_core::{EtlError, Result, SourceSystem};

#[cfg(all(feature = "pg", not(test)))]
pub type DbConn = PgConnection;
#[cfg(any(test, not(feature = "pg")))]
pub type DbConn = SqliteConnection;

/// Opens one connection. `target` is a libpq connection string or URL with
/// Postgres, a file path or `file:` URI with SQLite.
pub fn establish(target: &str) -> Result<DbConn> {
  #[allow(unused_mut)]
  let mut conn = DbConn::establish(target).map_err(|e| EtlError::Connection(e.to_string()))?;
  #[cfg(any(test, not(feature = "pg")))]
  {
    let _ = diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(&mut conn);
  }
  Ok(conn)
}

pub(crate) fn map_extract_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| EtlError::Extract(format!("db: {}", e)))
}

pub(crate) fn map_load_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| EtlError::Load(format!("db: {}", e)))
}

pub(crate) fn map_ledger_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| EtlError::Ledger(format!("db: {}", e)))
}

/// Read-only connection to one source service database. Dropped (and closed)
/// when the source's tables are done.
pub struct SourceDb {
  conn: DbConn,
}

impl SourceDb {
  pub fn connect(system: SourceSystem, target: &str) -> Result<Self> {
    let conn = establish(target).map_err(|e| match e {
                                  EtlError::Connection(msg) => EtlError::Connection(format!("{}: {}", system, msg)),
                                  other => other,
                                })?;
    Ok(Self::from_connection(conn))
  }

  pub fn from_connection(conn: DbConn) -> Self {
    Self { conn }
  }

  pub(crate) fn conn(&mut self) -> &mut DbConn {
    &mut self.conn
  }
}
