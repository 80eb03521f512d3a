// Diesel implementation of `EtlBackend`: one connection per source and one
// to the warehouse, opened per trigger from `EtlConfig`.
use crate::config::EtlConfig;
use crate::connection::SourceDb;
use crate::ledger::Warehouse;
use crate::tables::plan_for;
use etl_core::{EtlBackend, EtlService, Result, SourcePlan, SourceSystem};
use log::debug;

pub struct DieselBackend {
  config: EtlConfig,
}

impl DieselBackend {
  pub fn new(config: EtlConfig) -> Self {
    Self { config }
  }
}

impl EtlBackend for DieselBackend {
  type Source = SourceDb;
  type Warehouse = Warehouse;

  fn connect_warehouse(&self) -> Result<Warehouse> {
    debug!("connecting to warehouse {:?}", self.config.warehouse);
    Warehouse::connect(&self.config.warehouse.connection_target()?)
  }

  fn connect_source(&self, source: SourceSystem) -> Result<SourceDb> {
    let db = self.config.source(source);
    debug!("connecting to {} {:?}", source, db);
    SourceDb::connect(source, &db.connection_target()?)
  }

  fn plan(&self, source: SourceSystem) -> SourcePlan<SourceDb, Warehouse> {
    plan_for(source)
  }
}

/// Service wired to the databases described by `config`.
pub fn new_service(config: EtlConfig) -> EtlService<DieselBackend> {
  let service_config = config.service_config();
  EtlService::new(DieselBackend::new(config), service_config)
}

/// Same as `new_service`, reading the configuration from the environment.
pub fn new_from_env() -> Result<EtlService<DieselBackend>> {
  Ok(new_service(EtlConfig::from_env()?))
}
