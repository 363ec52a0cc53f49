use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Feature '{name}' is not in the feature catalog")]
    UnknownFeature { name: String },

    #[error("Could not draw a unique {kind} after {attempts} attempts")]
    IdSpaceExhausted { kind: &'static str, attempts: u32 },

    #[error("Wallet pool has {size} wallet(s); at least 2 are needed for transfers")]
    WalletPoolTooSmall { size: usize },

    #[error("Operation references wallet {wallet_id}, which does not exist")]
    DanglingWallet { wallet_id: i64 },

    #[error("No wallet was found for actor {actor_id} after insertion")]
    MissingWallet { actor_id: i64 },

    #[error("Unsupported database URL '{url}'")]
    UnsupportedDatabaseUrl { url: String },

    #[error("Unexpected value in column {column}: {detail}")]
    UnexpectedValue { column: usize, detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GenResult<T> = Result<T, GenError>;
