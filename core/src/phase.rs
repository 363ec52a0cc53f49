//! Phase trait.
//!
//! RULE: Every generation phase implements GenPhase.
//! The engine runs each registered phase exactly once, in
//! registration order, each on its own database connection.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    clock::RunClock,
    error::GenResult,
    report::PhaseReport,
    rng::{PhaseRng, PhaseSlot},
    store::WalletStore,
};
use std::any::Any;

/// The contract every phase must fulfill.
pub trait GenPhase {
    /// Stable RNG slot; also the phase's name.
    fn slot(&self) -> PhaseSlot;

    fn name(&self) -> &'static str {
        self.slot().name()
    }

    /// Called once per run by the engine.
    ///
    /// - `store`: a connection opened for this phase only
    /// - `rng`:   this phase's deterministic RNG
    /// - `clock`: the run's wall-clock anchor
    ///
    /// Reads only rows committed by earlier phases.
    fn run(
        &mut self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        clock: &RunClock,
    ) -> GenResult<PhaseReport>;

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}
