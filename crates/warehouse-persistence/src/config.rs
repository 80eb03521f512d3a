// Environment configuration: connection settings for the two sources and
// the warehouse, plus scheduler and reconciliation knobs.
use etl_core::{EtlError, EtlServiceConfig, Result, SourceSystem};
use std::fmt;
use std::path::PathBuf;

/// Built-in connection values for one database.
struct DbDefaults {
  host: &'static str,
  name: &'static str,
  user: &'static str,
  password: &'static str,
}

const USER_SERVICE_DEFAULTS: DbDefaults =
  DbDefaults { host: "user-management-db", name: "mafia_users", user: "mafia_user", password: "mafia_secure_password" };
const GAME_SERVICE_DEFAULTS: DbDefaults = DbDefaults { host: "game-service-db",
                                                       name: "mafia_game",
                                                       user: "mafia_game_user",
                                                       password: "mafia_game_secure_password" };
const WAREHOUSE_DEFAULTS: DbDefaults =
  DbDefaults { host: "data-warehouse-db", name: "mafia_warehouse", user: "warehouse", password: "warehouse" };

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_INTERVAL_MINUTES: u64 = 5;
const DEFAULT_FULL_LOAD_HOUR: u32 = 2;
const DEFAULT_STALE_RUN_MINUTES: i64 = 60;

/// Connection settings for one database, read from `<PREFIX>_DB_*`.
#[derive(Clone, PartialEq)]
pub struct DbConfig {
  prefix: &'static str,
  pub host: String,
  pub port: u16,
  pub name: String,
  pub user: String,
  pub password: String,
  /// `<PREFIX>_DB_URL`; replaces the assembled connection string.
  pub url: Option<String>,
}

// The password and URL stay out of logs.
impl fmt::Debug for DbConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DbConfig")
     .field("prefix", &self.prefix)
     .field("host", &self.host)
     .field("port", &self.port)
     .field("name", &self.name)
     .field("user", &self.user)
     .field("password", &"***")
     .field("url", &self.url.as_ref().map(|_| "***"))
     .finish()
  }
}

impl DbConfig {
  fn from_lookup<F>(prefix: &'static str, defaults: &DbDefaults, lookup: &F) -> Result<Self>
    where F: Fn(&str) -> Option<String>
  {
    let var = |suffix: &str| lookup(&format!("{}_DB_{}", prefix, suffix));
    let port = match var("PORT") {
      Some(raw) => parse_number(&format!("{}_DB_PORT", prefix), &raw)?,
      None => DEFAULT_PORT,
    };
    Ok(Self { prefix,
              host: var("HOST").unwrap_or_else(|| defaults.host.to_string()),
              port,
              name: var("NAME").unwrap_or_else(|| defaults.name.to_string()),
              user: var("USER").unwrap_or_else(|| defaults.user.to_string()),
              password: var("PASSWORD").unwrap_or_else(|| defaults.password.to_string()),
              url: var("URL").filter(|u| !u.trim().is_empty()) })
  }

  /// libpq keyword/value connection string.
  pub fn conninfo(&self) -> String {
    format!("host={} port={} dbname={} user={} password={}",
            quote_conninfo(&self.host),
            self.port,
            quote_conninfo(&self.name),
            quote_conninfo(&self.user),
            quote_conninfo(&self.password))
  }

  /// What to hand to `establish`. Without Postgres only an explicit URL
  /// (a SQLite path) makes sense.
  pub fn connection_target(&self) -> Result<String> {
    if let Some(url) = &self.url {
      return Ok(url.clone());
    }
    if cfg!(all(feature = "pg", not(test))) {
      Ok(self.conninfo())
    } else {
      Err(EtlError::Config(format!("{}_DB_URL must be set when built without the 'pg' feature", self.prefix)))
    }
  }
}

fn quote_conninfo(value: &str) -> String {
  format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
  where T: std::str::FromStr
{
  raw.trim().parse::<T>().map_err(|_| EtlError::Config(format!("{} is not a valid number: {:?}", key, raw)))
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
  pub user_service: DbConfig,
  pub game_service: DbConfig,
  pub warehouse: DbConfig,
  pub interval_minutes: u64,
  /// Hour of day (UTC) of the daily full load.
  pub full_load_hour: u32,
  pub stale_run_minutes: i64,
  /// `ETL_LOG_DIR`: when set, logs are also written to a file there.
  pub log_dir: Option<PathBuf>,
}

impl EtlConfig {
  /// Reads the process environment, after loading `.env` if present.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where F: Fn(&str) -> Option<String>
  {
    let interval_minutes = match lookup("ETL_INTERVAL_MINUTES") {
      Some(raw) => parse_number::<u64>("ETL_INTERVAL_MINUTES", &raw)?,
      None => DEFAULT_INTERVAL_MINUTES,
    };
    if interval_minutes == 0 {
      return Err(EtlError::Config("ETL_INTERVAL_MINUTES must be greater than zero".into()));
    }
    let full_load_hour = match lookup("ETL_FULL_LOAD_HOUR") {
      Some(raw) => parse_number::<u32>("ETL_FULL_LOAD_HOUR", &raw)?,
      None => DEFAULT_FULL_LOAD_HOUR,
    };
    if full_load_hour > 23 {
      return Err(EtlError::Config(format!("ETL_FULL_LOAD_HOUR must be between 0 and 23, got {}", full_load_hour)));
    }
    let stale_run_minutes = match lookup("ETL_STALE_RUN_MINUTES") {
      Some(raw) => parse_number::<i64>("ETL_STALE_RUN_MINUTES", &raw)?,
      None => DEFAULT_STALE_RUN_MINUTES,
    };
    if stale_run_minutes <= 0 {
      return Err(EtlError::Config("ETL_STALE_RUN_MINUTES must be greater than zero".into()));
    }
    Ok(Self { user_service: DbConfig::from_lookup("USER_SERVICE", &USER_SERVICE_DEFAULTS, &lookup)?,
              game_service: DbConfig::from_lookup("GAME_SERVICE", &GAME_SERVICE_DEFAULTS, &lookup)?,
              warehouse: DbConfig::from_lookup("WAREHOUSE", &WAREHOUSE_DEFAULTS, &lookup)?,
              interval_minutes,
              full_load_hour,
              stale_run_minutes,
              log_dir: lookup("ETL_LOG_DIR").filter(|d| !d.trim().is_empty()).map(PathBuf::from) })
  }

  pub fn source(&self, source: SourceSystem) -> &DbConfig {
    match source {
      SourceSystem::UserService => &self.user_service,
      SourceSystem::GameService => &self.game_service,
    }
  }

  pub fn service_config(&self) -> EtlServiceConfig {
    EtlServiceConfig { stale_run_after: chrono::Duration::minutes(self.stale_run_minutes) }
  }
}
