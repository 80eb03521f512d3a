//! Concrete table pipelines, one module per warehouse table.
mod lobbies;
mod player_sessions;
mod transactions;
mod users;

pub use lobbies::LobbiesPipeline;
pub use player_sessions::PlayerSessionsPipeline;
pub use transactions::TransactionsPipeline;
pub use users::UsersPipeline;

use crate::connection::SourceDb;
use crate::ledger::Warehouse;
use etl_core::{EtlError, SourcePlan, SourceSystem};
use warehouse_domain::DomainError;

/// Tables of `source`, in execution order.
pub fn plan_for(source: SourceSystem) -> SourcePlan<SourceDb, Warehouse> {
  match source {
    SourceSystem::UserService => SourcePlan::new(source, vec![Box::new(UsersPipeline), Box::new(TransactionsPipeline)]),
    SourceSystem::GameService => {
      SourcePlan::new(source, vec![Box::new(LobbiesPipeline), Box::new(PlayerSessionsPipeline)])
    }
  }
}

/// A malformed source row fails the extraction of its table.
fn rejected_row(e: DomainError) -> EtlError {
  EtlError::Extract(e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn each_source_lists_its_tables_in_order() {
    assert_eq!(plan_for(SourceSystem::UserService).table_names(), vec!["dim_users", "fact_transactions"]);
    assert_eq!(plan_for(SourceSystem::GameService).table_names(), vec!["dim_lobbies", "fact_player_sessions"]);
  }
}
