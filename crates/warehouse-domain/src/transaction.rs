// transaction.rs
use crate::errors::require_id;
use crate::{DomainError, USER_SERVICE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Movimiento de moneda virtual (`"CurrencyTransaction"`). Es inmutable: su
/// campo de cambios es `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCurrencyTransaction {
  id: String,
  user_id: String,
  kind: String,
  amount: i32,
  description: Option<String>,
  created_at: NaiveDateTime,
}

impl SourceCurrencyTransaction {
  pub fn new(id: &str,
             user_id: &str,
             kind: &str,
             amount: i32,
             description: Option<String>,
             created_at: NaiveDateTime)
             -> Result<Self, DomainError> {
    require_id("CurrencyTransaction", "id", id)?;
    require_id("CurrencyTransaction", "userId", user_id)?;
    Ok(Self { id: id.to_string(),
              user_id: user_id.to_string(),
              kind: kind.to_string(),
              amount,
              description,
              created_at })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn created_at(&self) -> NaiveDateTime {
    self.created_at
  }
}

/// Fila de `fact_transactions`. La clave natural es
/// `(source_system, source_transaction_id)`; la clave sustituta la asigna el
/// warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactTransaction {
  pub source_system: String,
  pub source_transaction_id: String,
  pub user_id: String,
  pub transaction_type: String,
  pub amount: i32,
  pub description: Option<String>,
  pub occurred_at: NaiveDateTime,
}

impl FactTransaction {
  pub fn from_source(t: &SourceCurrencyTransaction) -> Self {
    Self { source_system: USER_SERVICE.to_string(),
           source_transaction_id: t.id.clone(),
           user_id: t.user_id.clone(),
           transaction_type: t.kind.clone(),
           amount: t.amount,
           description: t.description.clone(),
           occurred_at: t.created_at }
  }
}
