//! Shared primitive types used across every generation phase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of `actor_yape`.
pub type ActorId = i64;

/// Primary key of `billetera_yape`.
pub type WalletId = i64;

/// Primary key of `transaccion_yape`.
pub type TxId = i64;

/// Primary key of `funcionalidad`.
pub type FeatureId = i64;

/// Primary key of `notificacion`.
pub type NotificationId = i64;

/// The canonical run identifier.
pub type RunId = String;

/// Actor categories that carry their own feature allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorCategory {
    Persona,
    SmallBusiness,
    Enterprise,
    Services,
}

impl ActorCategory {
    pub const ALL: [ActorCategory; 4] = [
        ActorCategory::Persona,
        ActorCategory::SmallBusiness,
        ActorCategory::Enterprise,
        ActorCategory::Services,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::SmallBusiness => "small_business",
            Self::Enterprise => "enterprise",
            Self::Services => "services",
        }
    }
}

/// Status and outcome labels as stored in the schema.
pub mod status {
    pub const WALLET_ACTIVE: &str = "Activo";
    pub const CREDENTIAL_ACTIVE: &str = "Activa";
    pub const CREDENTIAL_KIND_PIN: &str = "PIN";
    pub const TRANSACTION_SUCCESSFUL: &str = "Exitosa";
    pub const NOTIFICATION_DELIVERED: &str = "Enviada";
    pub const DIRECTION_SENT: &str = "Envio";
    pub const DIRECTION_RECEIVED: &str = "Recepcion";
}

/// A monetary amount held as integer cents.
///
/// Every amount the generator produces is rounded to two decimals, so
/// cents are exact and render to the same literal on every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(pub i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Round a float amount to the nearest cent.
    pub fn from_f64(amount: f64) -> Self {
        Self((amount * 100.0).round() as i64)
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
