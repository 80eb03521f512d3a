//! Diesel persistence for the warehouse ETL.
//!
//! Provides the `etl_run_log` ledger (`Warehouse`), the four table pipelines
//! that read the user and game services and write the warehouse, the
//! environment configuration and `DieselBackend`, which plugs all of it into
//! `etl_core::EtlService`. Postgres is used with the `pg` feature; unit
//! tests and builds without it run on SQLite.

mod backend;
mod config;
mod connection;
mod ledger;
pub mod schema;
pub mod tables;
#[cfg(test)]
mod test_support;

pub use backend::{new_from_env, new_service, DieselBackend};
pub use config::{DbConfig, EtlConfig};
pub use connection::{establish, DbConn, SourceDb};
pub use ledger::Warehouse;
