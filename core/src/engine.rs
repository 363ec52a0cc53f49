//! The generation engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Actors         (actor_yape, persona, empresa, company tiers)
//!   2. Features       (funcionalidad, a_funcionalidad)
//!   3. Wallets        (billetera_*, credencial, qr, qr_dinamico)
//!   4. Transactions   (balance reset, transaccion_*, operacion_yape)
//!   5. Notifications  (notificacion, notificacion_transaccion)
//!
//! RULES:
//!   - Phases execute in registration order, once per run.
//!   - Each phase gets a fresh connection and reads only rows committed
//!     by earlier phases.
//!   - No phase calls another phase's functions directly.
//!   - All randomness flows through the RngBank.

use crate::{
    actor_phase::{ActorPhase, ActorPopulation},
    clock::RunClock,
    config::GenConfig,
    error::GenResult,
    feature_phase::FeaturePhase,
    notification_phase::NotificationPhase,
    phase::GenPhase,
    report::RunReport,
    rng::{PhaseSlot, RngBank},
    store::WalletStore,
    transaction_phase::TransactionPhase,
    types::RunId,
    wallet_phase::WalletPhase,
};
use std::time::Instant;

pub struct GenEngine {
    pub run_id:   RunId,
    pub clock:    RunClock,
    pub rng_bank: RngBank,
    phases:       Vec<Box<dyn GenPhase>>,
    store:        WalletStore,
}

impl GenEngine {
    pub fn new(run_id: RunId, seed: u64, store: WalletStore, clock: RunClock) -> Self {
        Self {
            run_id,
            clock,
            rng_bank: RngBank::new(seed),
            phases:   Vec::new(),
            store,
        }
    }

    /// Build a fully wired engine with all five phases registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: &GenConfig, store: WalletStore, clock: RunClock) -> Self {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut engine = GenEngine::new(run_id, config.seed, store, clock);

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(Box::new(ActorPhase::new(config.clone())));
        engine.register(Box::new(FeaturePhase::new(config.clone())));
        engine.register(Box::new(WalletPhase::new(config.clone())));
        engine.register(Box::new(TransactionPhase::new(config.clone())));
        engine.register(Box::new(NotificationPhase::new(config.clone())));
        engine
    }

    /// Register a phase. Call in the documented execution order.
    pub fn register(&mut self, phase: Box<dyn GenPhase>) {
        self.phases.push(phase);
    }

    /// Run every registered phase.
    pub fn run(&mut self) -> GenResult<RunReport> {
        self.run_phases(None)
    }

    /// Run phases up to and including `last`. Used by tests that only
    /// need the earlier tables populated.
    pub fn run_through(&mut self, last: PhaseSlot) -> GenResult<RunReport> {
        self.run_phases(Some(last))
    }

    fn run_phases(&mut self, last: Option<PhaseSlot>) -> GenResult<RunReport> {
        let mut report = RunReport {
            run_id:     self.run_id.clone(),
            seed:       self.rng_bank.master_seed(),
            started_at: self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string(),
            phases:     Vec::with_capacity(self.phases.len()),
        };
        log::info!("run {} started (seed {})", self.run_id, report.seed);

        for phase in &mut self.phases {
            let slot = phase.slot();
            let mut conn = self.store.reopen()?;
            let mut rng = self.rng_bank.for_phase(slot);

            let started = Instant::now();
            let mut phase_report = phase.run(&mut conn, &mut rng, &self.clock)?;
            phase_report.elapsed_ms = started.elapsed().as_millis() as u64;
            log::info!(
                "phase {} finished: {} rows in {} ms",
                phase.name(),
                phase_report.total_rows(),
                phase_report.elapsed_ms
            );
            report.phases.push(phase_report);

            if Some(slot) == last {
                break;
            }
        }
        Ok(report)
    }

    /// The actor population generated by this engine's last run.
    pub fn population(&self) -> Option<&ActorPopulation> {
        self.phases.iter().find_map(|phase| {
            phase
                .as_any()
                .downcast_ref::<ActorPhase>()
                .and_then(ActorPhase::population)
        })
    }

    /// The connection the engine was built with.
    pub fn store(&mut self) -> &mut WalletStore {
        &mut self.store
    }
}
