// Diesel schema for the source services and the warehouse.
//
// Source tables are owned by other services (Prisma naming: quoted
// PascalCase tables, camelCase columns). Only the columns the pipeline reads
// are declared.

diesel::table! {
    #[sql_name = "User"]
    src_users (id) {
        id -> Text,
        username -> Text,
        email -> Nullable<Text>,
        #[sql_name = "createdAt"]
        created_at -> Timestamp,
        #[sql_name = "updatedAt"]
        updated_at -> Timestamp,
    }
}

diesel::table! {
    #[sql_name = "CurrencyTransaction"]
    src_currency_transactions (id) {
        id -> Text,
        #[sql_name = "userId"]
        user_id -> Text,
        #[sql_name = "type"]
        kind -> Text,
        amount -> Integer,
        description -> Nullable<Text>,
        #[sql_name = "createdAt"]
        created_at -> Timestamp,
    }
}

diesel::table! {
    #[sql_name = "Lobby"]
    src_lobbies (id) {
        id -> Text,
        name -> Text,
        #[sql_name = "maxPlayers"]
        max_players -> Integer,
        status -> Text,
        #[sql_name = "createdAt"]
        created_at -> Timestamp,
        #[sql_name = "updatedAt"]
        updated_at -> Timestamp,
    }
}

diesel::table! {
    #[sql_name = "LobbyPlayer"]
    src_lobby_players (id) {
        id -> Text,
        #[sql_name = "lobbyId"]
        lobby_id -> Text,
        #[sql_name = "userId"]
        user_id -> Text,
        role -> Nullable<Text>,
        #[sql_name = "joinedAt"]
        joined_at -> Timestamp,
        #[sql_name = "isAlive"]
        is_alive -> Nullable<Bool>,
        #[sql_name = "updatedAt"]
        updated_at -> Timestamp,
    }
}

// Warehouse tables. DDL lives in `sql/`.

diesel::table! {
    etl_run_log (run_id) {
        run_id -> BigInt,
        source_system -> Text,
        table_name -> Text,
        run_start_time -> Timestamp,
        run_end_time -> Nullable<Timestamp>,
        status -> Text,
        records_extracted -> BigInt,
        records_loaded -> BigInt,
        last_extracted_timestamp -> Nullable<Timestamp>,
        error_message -> Nullable<Text>,
    }
}

diesel::table! {
    dim_users (user_id) {
        user_id -> Text,
        username -> Text,
        email -> Nullable<Text>,
        created_at -> Timestamp,
        last_updated -> Timestamp,
    }
}

diesel::table! {
    fact_transactions (transaction_key) {
        transaction_key -> BigInt,
        source_system -> Text,
        source_transaction_id -> Text,
        user_id -> Text,
        transaction_type -> Text,
        amount -> Integer,
        description -> Nullable<Text>,
        occurred_at -> Timestamp,
    }
}

diesel::table! {
    dim_lobbies (lobby_id) {
        lobby_id -> Text,
        lobby_name -> Text,
        max_players -> Integer,
        created_at -> Timestamp,
        last_updated -> Timestamp,
    }
}

diesel::table! {
    fact_player_sessions (session_key) {
        session_key -> BigInt,
        source_system -> Text,
        source_session_id -> Text,
        user_id -> Text,
        lobby_id -> Text,
        role_assigned -> Nullable<Text>,
        joined_at -> Timestamp,
        survived_until_end -> Bool,
    }
}
