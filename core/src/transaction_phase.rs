//! Phase 4: peer-to-peer transactions.
//!
//! Every active wallet balance is reset once, then transfers are drawn
//! between wallets of the eligible pool (personas, external wallets and
//! small businesses). Self-transfers are dropped after sampling, so the
//! final count lands slightly below the target.
//!
//! Each chunk writes its headers, person details and operation links in
//! one commit. Operation links are checked against a snapshot of the
//! wallet table before any SQL for the chunk is sent.

use crate::{
    actor_phase::CompanyTier,
    clock::RunClock,
    config::{GenConfig, TransactionConfig},
    error::{GenError, GenResult},
    phase::GenPhase,
    report::PhaseReport,
    rng::{PhaseRng, PhaseSlot},
    store::WalletStore,
    types::{Money, TxId, WalletId},
};
use chrono::NaiveDateTime;
use std::{any::Any, collections::HashSet};

#[derive(Debug, Clone)]
pub struct TxHeaderRow {
    pub occurred_at: NaiveDateTime,
    pub amount: Money,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct PersonDetailRow {
    pub tx_id: TxId,
    pub security_code: i64,
    pub channel: String,
}

#[derive(Debug, Clone)]
pub struct OperationRow {
    pub tx_id: TxId,
    pub sender: WalletId,
    pub receiver: WalletId,
}

/// A sampled transfer before it has a reference or an ID.
#[derive(Debug, Clone, PartialEq)]
pub struct TxDraft {
    pub sender: WalletId,
    pub receiver: WalletId,
    pub amount: Money,
    pub channel: String,
    pub security_code: i64,
}

/// `OP` followed by the ten-digit, zero-padded sequence number.
pub fn operation_reference(sequence: u64) -> String {
    format!("OP{sequence:010}")
}

/// Normal amount clipped to the configured bounds, rounded to the cent.
pub fn sample_amount(rng: &mut PhaseRng, config: &TransactionConfig) -> Money {
    let raw = rng.normal(config.amount_mean, config.amount_std_dev);
    Money::from_f64(raw.clamp(config.amount_bounds.min, config.amount_bounds.max))
}

/// Draw `count` transfers from `pool`, then drop the self-transfers.
pub fn sample_drafts(
    rng: &mut PhaseRng,
    config: &TransactionConfig,
    pool: &[WalletId],
    count: usize,
) -> Vec<TxDraft> {
    (0..count)
        .map(|_| {
            let sender = *rng.pick(pool);
            let receiver = *rng.pick(pool);
            let amount = sample_amount(rng, config);
            let channel = rng.pick(&config.channels).clone();
            let security_code = config.security_code_range.sample(rng);
            TxDraft {
                sender,
                receiver,
                amount,
                channel,
                security_code,
            }
        })
        .filter(|d| d.sender != d.receiver)
        .collect()
}

/// Fail on the first draft that names a wallet missing from `known`.
pub fn check_wallets(drafts: &[TxDraft], known: &HashSet<WalletId>) -> GenResult<()> {
    for d in drafts {
        for wallet_id in [d.sender, d.receiver] {
            if !known.contains(&wallet_id) {
                return Err(GenError::DanglingWallet { wallet_id });
            }
        }
    }
    Ok(())
}

pub struct TransactionPhase {
    config: GenConfig,
}

impl TransactionPhase {
    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    /// Persona, external and small-business wallets, deduplicated.
    fn eligible_pool(store: &mut WalletStore) -> GenResult<Vec<WalletId>> {
        let mut pool = store.persona_wallet_ids()?;
        pool.extend(store.external_wallet_ids()?);
        pool.extend(store.tier_wallet_ids(CompanyTier::SmallBusiness)?);
        pool.sort_unstable();
        pool.dedup();
        Ok(pool)
    }

    fn reset_balances(
        &self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        report: &mut PhaseReport,
    ) -> GenResult<()> {
        let range = self.config.transactions.balance_reset;
        let wallets = store.active_wallet_ids()?;
        for chunk in wallets.chunks(self.config.transactions.chunk_size) {
            let balances: Vec<(WalletId, Money)> =
                chunk.iter().map(|&id| (id, range.sample(rng))).collect();
            let n = store.in_transaction(|s| s.set_wallet_balances(&balances))?;
            report.record("billetera_yape.saldo", n);
        }
        log::debug!("transactions: reset {} balances", wallets.len());
        Ok(())
    }

    fn write_chunk(
        store: &mut WalletStore,
        drafts: &[TxDraft],
        first_sequence: u64,
        occurred_at: NaiveDateTime,
        report: &mut PhaseReport,
    ) -> GenResult<()> {
        let headers: Vec<TxHeaderRow> = drafts
            .iter()
            .zip(first_sequence..)
            .map(|(d, seq)| TxHeaderRow {
                occurred_at,
                amount: d.amount,
                reference: operation_reference(seq),
            })
            .collect();

        store.in_transaction(|s| {
            let ids = s.insert_transaction_headers(&headers)?;
            let mut details = Vec::with_capacity(drafts.len());
            let mut operations = Vec::with_capacity(drafts.len());
            for (draft, header) in drafts.iter().zip(&headers) {
                let tx_id = *ids.get(&header.reference).ok_or_else(|| {
                    anyhow::anyhow!("no id returned for operation {}", header.reference)
                })?;
                details.push(PersonDetailRow {
                    tx_id,
                    security_code: draft.security_code,
                    channel: draft.channel.clone(),
                });
                operations.push(OperationRow {
                    tx_id,
                    sender: draft.sender,
                    receiver: draft.receiver,
                });
            }
            report.record("transaccion_yape", ids.len() as u64);
            report.record("transaccion_persona", s.insert_person_details(&details)?);
            report.record("operacion_yape", s.insert_operations(&operations)?);
            Ok(())
        })
    }
}

impl GenPhase for TransactionPhase {
    fn slot(&self) -> PhaseSlot {
        PhaseSlot::Transactions
    }

    fn run(
        &mut self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        clock: &RunClock,
    ) -> GenResult<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        let pool = Self::eligible_pool(store)?;
        if pool.len() < 2 {
            return Err(GenError::WalletPoolTooSmall { size: pool.len() });
        }

        self.reset_balances(store, rng, &mut report)?;

        let known: HashSet<WalletId> = store.all_wallet_ids()?.into_iter().collect();
        let tx = &self.config.transactions;
        let target = tx.p2p_target();
        let mut sequence = store.next_operation_sequence()?;
        let mut written = 0usize;
        let mut remaining = target;
        while remaining > 0 {
            let n = remaining.min(tx.chunk_size);
            remaining -= n;
            let drafts = sample_drafts(rng, tx, &pool, n);
            check_wallets(&drafts, &known)?;
            if drafts.is_empty() {
                continue;
            }
            Self::write_chunk(store, &drafts, sequence, clock.now(), &mut report)?;
            sequence += drafts.len() as u64;
            written += drafts.len();
            log::debug!("transactions: committed {} ({written}/{target})", drafts.len());
        }

        log::info!(
            "transactions: {written} written of {target} targeted over a pool of {} wallets",
            pool.len()
        );
        Ok(report)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
