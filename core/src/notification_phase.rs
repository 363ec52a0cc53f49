//! Phase 5: sent/received notifications for a sample of transactions.

use crate::{
    clock::RunClock,
    config::GenConfig,
    error::GenResult,
    phase::GenPhase,
    report::PhaseReport,
    rng::{PhaseRng, PhaseSlot},
    store::WalletStore,
    types::{status, Money, NotificationId, TxId},
};
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sent => status::DIRECTION_SENT,
            Self::Received => status::DIRECTION_RECEIVED,
        }
    }

    pub fn message(&self, amount: Money) -> String {
        match self {
            Self::Sent => format!("Enviaste S/ {amount}"),
            Self::Received => format!("Recibiste S/ {amount}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub message: String,
    pub channel: String,
}

#[derive(Debug, Clone)]
pub struct NotificationLinkRow {
    pub notification_id: NotificationId,
    pub tx_id: TxId,
    pub amount: Money,
    pub direction: Direction,
}

/// Bernoulli sample of `transactions` at `fraction`, stopping once
/// `limit` are taken.
pub fn sample_transactions(
    rng: &mut PhaseRng,
    fraction: f64,
    limit: usize,
    transactions: &[(TxId, Money)],
) -> Vec<(TxId, Money)> {
    let mut picked = Vec::new();
    for &tx in transactions {
        if picked.len() >= limit {
            break;
        }
        if rng.chance(fraction) {
            picked.push(tx);
        }
    }
    picked
}

pub struct NotificationPhase {
    config: GenConfig,
}

impl NotificationPhase {
    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    /// Write the notifications for `chunk` and their join rows in one commit.
    fn write_chunk(
        &self,
        store: &mut WalletStore,
        chunk: &[(TxId, Money)],
        report: &mut PhaseReport,
    ) -> GenResult<()> {
        let channel = &self.config.notifications.channel;
        let plan: Vec<(TxId, Money, Direction)> = chunk
            .iter()
            .flat_map(|&(tx_id, amount)| {
                [Direction::Sent, Direction::Received].map(|d| (tx_id, amount, d))
            })
            .collect();
        let rows: Vec<NotificationRow> = plan
            .iter()
            .map(|&(_, amount, direction)| NotificationRow {
                message: direction.message(amount),
                channel: channel.clone(),
            })
            .collect();

        store.in_transaction(|s| {
            let ids = s.insert_notifications(&rows)?;
            let links: Vec<NotificationLinkRow> = ids
                .iter()
                .zip(&plan)
                .map(|(&notification_id, &(tx_id, amount, direction))| NotificationLinkRow {
                    notification_id,
                    tx_id,
                    amount,
                    direction,
                })
                .collect();
            report.record("notificacion", ids.len() as u64);
            report.record("notificacion_transaccion", s.insert_notification_links(&links)?);
            Ok(())
        })
    }
}

impl GenPhase for NotificationPhase {
    fn slot(&self) -> PhaseSlot {
        PhaseSlot::Notifications
    }

    fn run(
        &mut self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        _clock: &RunClock,
    ) -> GenResult<PhaseReport> {
        let mut report = PhaseReport::new(self.name());
        let config = &self.config.notifications;

        // Candidates are read a page at a time, keyed by ID, until the cap is met.
        let mut sampled = Vec::new();
        let mut scanned = 0usize;
        let mut after: TxId = 0;
        while sampled.len() < config.cap {
            let page = store.unnotified_transactions(after, config.page_size)?;
            let Some(&(last, _)) = page.last() else {
                break;
            };
            scanned += page.len();
            sampled.extend(sample_transactions(
                rng,
                config.sample_fraction,
                config.cap - sampled.len(),
                &page,
            ));
            log::debug!("notifications: scanned {scanned} candidates, {} sampled", sampled.len());
            if page.len() < config.page_size {
                break;
            }
            after = last;
        }
        if sampled.is_empty() {
            log::warn!("notifications: none sampled from {scanned} transactions");
            return Ok(report);
        }

        // Two notifications per transaction, so half as many transactions per commit.
        let per_commit = (config.commit_every / 2).max(1);
        for chunk in sampled.chunks(per_commit) {
            self.write_chunk(store, chunk, &mut report)?;
            log::debug!("notifications: committed {} transactions", chunk.len());
        }

        log::info!(
            "notifications: {} transactions notified of {} scanned ({} rows)",
            sampled.len(),
            scanned,
            report.rows_for("notificacion"),
        );
        Ok(report)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transactions(n: i64) -> Vec<(TxId, Money)> {
        (1..=n).map(|id| (id, Money::from_cents(id * 10))).collect()
    }

    #[test]
    fn messages_carry_two_decimal_amounts() {
        let amount = Money::from_cents(8_050);
        assert_eq!(Direction::Sent.message(amount), "Enviaste S/ 80.50");
        assert_eq!(Direction::Received.message(amount), "Recibiste S/ 80.50");
        assert_eq!(Direction::Sent.label(), "Envio");
        assert_eq!(Direction::Received.label(), "Recepcion");
    }

    #[test]
    fn sampling_rate_is_roughly_the_fraction() {
        let mut rng = PhaseRng::new(11, 4);
        let picked = sample_transactions(&mut rng, 0.30, usize::MAX, &transactions(20_000));
        let rate = picked.len() as f64 / 20_000.0;
        assert!((rate - 0.30).abs() < 0.02, "rate {rate}");
        assert!(picked.windows(2).all(|w| w[0].0 < w[1].0), "order must be kept");
    }

    #[test]
    fn paged_sampling_matches_a_single_pass() {
        let all = transactions(1_000);
        let whole = sample_transactions(&mut PhaseRng::new(13, 4), 0.30, 120, &all);

        let mut rng = PhaseRng::new(13, 4);
        let mut paged = Vec::new();
        for page in all.chunks(7) {
            if paged.len() >= 120 {
                break;
            }
            let limit = 120 - paged.len();
            paged.extend(sample_transactions(&mut rng, 0.30, limit, page));
        }
        assert_eq!(paged.len(), 120);
        assert_eq!(paged, whole);
    }

    #[test]
    fn sampling_stops_at_cap() {
        let mut rng = PhaseRng::new(12, 4);
        assert_eq!(sample_transactions(&mut rng, 1.0, 25, &transactions(100)).len(), 25);
    }
}
