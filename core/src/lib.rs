pub mod actor_phase;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod feature_phase;
pub mod identity;
pub mod name_generator;
pub mod notification_phase;
pub mod phase;
pub mod report;
pub mod rng;
pub mod store;
pub mod transaction_phase;
pub mod types;
pub mod wallet_phase;
