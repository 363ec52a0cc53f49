use super::{sql::SqlValue, WalletStore};
use crate::{
    error::GenResult,
    notification_phase::{NotificationLinkRow, NotificationRow},
    types::{status, NotificationId},
};

impl WalletStore {
    // ── Notification ──────────────────────────────────────────────

    /// Insert notifications and return their IDs in insertion order.
    pub fn insert_notifications(
        &mut self,
        notifications: &[NotificationRow],
    ) -> GenResult<Vec<NotificationId>> {
        let rows: Vec<_> = notifications
            .iter()
            .map(|n| {
                vec![
                    SqlValue::text(&n.message),
                    SqlValue::from(status::NOTIFICATION_DELIVERED),
                    SqlValue::text(&n.channel),
                ]
            })
            .collect();
        self.insert_rows_returning_ids(
            "notificacion",
            &["mensaje", "estado", "canal"],
            &rows,
            "id_notificacion",
        )
    }

    pub fn insert_notification_links(&mut self, links: &[NotificationLinkRow]) -> GenResult<u64> {
        let rows: Vec<_> = links
            .iter()
            .map(|l| {
                vec![
                    SqlValue::Int(l.notification_id),
                    SqlValue::Int(l.tx_id),
                    SqlValue::Money(l.amount),
                    SqlValue::from(status::TRANSACTION_SUCCESSFUL),
                    SqlValue::from(l.direction.label()),
                ]
            })
            .collect();
        self.insert_rows(
            "notificacion_transaccion",
            &[
                "id_notificacion",
                "id_transaccion",
                "monto",
                "resultado",
                "tipo_operacion",
            ],
            &rows,
            "",
        )
    }
}
