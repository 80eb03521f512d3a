use chrono::{NaiveDate, NaiveDateTime};
use warehouse_domain::{DimLobby, DimUser, DomainError, FactPlayerSession, FactTransaction, SourceCurrencyTransaction,
                       SourceLobby, SourceLobbyPlayer, SourceUser};

fn at(day: u32, hour: u32) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(hour, 30, 0).unwrap()
}

#[test]
fn user_maps_updated_at_to_last_updated() {
  let src = SourceUser::new("u-1", "alice", Some("alice@example.com".into()), at(1, 8), at(4, 9)).unwrap();
  let dim = DimUser::from_source(&src);
  assert_eq!(dim.user_id, "u-1");
  assert_eq!(dim.username, "alice");
  assert_eq!(dim.email.as_deref(), Some("alice@example.com"));
  assert_eq!(dim.created_at, at(1, 8));
  assert_eq!(dim.last_updated, at(4, 9));
}

#[test]
fn user_without_email_stays_null() {
  let src = SourceUser::new("u-2", "bob", None, at(1, 8), at(1, 8)).unwrap();
  assert_eq!(DimUser::from_source(&src).email, None);
}

#[test]
fn blank_ids_are_rejected() {
  let err = SourceUser::new("  ", "ghost", None, at(1, 1), at(1, 1)).unwrap_err();
  assert!(matches!(err, DomainError::ValidationError(_)));
  assert!(SourceCurrencyTransaction::new("t-1", "", "PURCHASE", 10, None, at(1, 1)).is_err());
  assert!(SourceLobbyPlayer::new("lp-1", "", "u-1", None, at(1, 1), None, at(1, 1)).is_err());
}

#[test]
fn transaction_carries_source_system_and_natural_key() {
  let src = SourceCurrencyTransaction::new("t-9", "u-1", "REWARD", -25, Some("refund".into()), at(2, 10)).unwrap();
  let fact = FactTransaction::from_source(&src);
  assert_eq!(fact.source_system, "user_service");
  assert_eq!(fact.source_transaction_id, "t-9");
  assert_eq!(fact.user_id, "u-1");
  assert_eq!(fact.transaction_type, "REWARD");
  assert_eq!(fact.amount, -25);
  assert_eq!(fact.description.as_deref(), Some("refund"));
  assert_eq!(fact.occurred_at, at(2, 10));
}

#[test]
fn lobby_drops_status() {
  let src = SourceLobby::new("l-1", "Night shift", 12, "IN_PROGRESS", at(1, 20), at(1, 22)).unwrap();
  assert_eq!(src.status(), "IN_PROGRESS");
  let dim = DimLobby::from_source(&src);
  assert_eq!(dim.lobby_id, "l-1");
  assert_eq!(dim.lobby_name, "Night shift");
  assert_eq!(dim.max_players, 12);
  assert_eq!(dim.last_updated, at(1, 22));
}

#[test]
fn session_defaults_for_missing_role_and_alive_flag() {
  let src = SourceLobbyPlayer::new("lp-1", "l-1", "u-1", None, at(1, 20), None, at(1, 21)).unwrap();
  let fact = FactPlayerSession::from_source(&src);
  assert_eq!(fact.source_system, "game_service");
  assert_eq!(fact.source_session_id, "lp-1");
  assert_eq!(fact.role_assigned, None);
  assert!(!fact.survived_until_end);
  assert_eq!(fact.joined_at, at(1, 20));
}

#[test]
fn session_keeps_role_and_survival() {
  let src = SourceLobbyPlayer::new("lp-2", "l-1", "u-2", Some("DETECTIVE".into()), at(1, 20), Some(true), at(1, 23)).unwrap();
  let fact = FactPlayerSession::from_source(&src);
  assert_eq!(fact.role_assigned.as_deref(), Some("DETECTIVE"));
  assert!(fact.survived_until_end);
}

#[test]
fn warehouse_rows_serialize_with_column_names() {
  let src = SourceUser::new("u-1", "alice", None, at(1, 8), at(1, 9)).unwrap();
  let json = serde_json::to_value(DimUser::from_source(&src)).unwrap();
  assert_eq!(json["user_id"], "u-1");
  assert!(json["email"].is_null());
}
