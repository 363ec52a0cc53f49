use super::{
    sql::{Cell, SqlValue},
    DatabaseKind, WalletStore,
};
use crate::{
    error::{GenError, GenResult},
    transaction_phase::{OperationRow, PersonDetailRow, TxHeaderRow},
    types::{status, Money, TxId},
};
use std::collections::HashMap;

impl WalletStore {
    // ── Transaction header ────────────────────────────────────────

    /// Next free operation-reference sequence number. Only well-formed
    /// references (`OP` plus ten digits) take part; anything else in the
    /// column is left alone. Fixed width makes the lexical maximum the
    /// numeric maximum.
    pub fn next_operation_sequence(&mut self) -> GenResult<u64> {
        let well_formed = match self.kind() {
            DatabaseKind::Postgres => "numero_operacion ~ '^OP[0-9]{10}$'".to_string(),
            DatabaseKind::Sqlite => format!("numero_operacion GLOB 'OP{}'", "[0-9]".repeat(10)),
        };
        let rows = self.query(&format!(
            "SELECT MAX(numero_operacion) FROM transaccion_yape WHERE {well_formed}"
        ))?;
        let last = match rows.first().and_then(|r| r.first()) {
            None | Some(Cell::Null) => return Ok(0),
            Some(cell) => cell.as_text(0)?,
        };
        last.strip_prefix("OP")
            .and_then(|digits| digits.parse::<u64>().ok())
            .map(|n| n + 1)
            .ok_or_else(|| GenError::UnexpectedValue {
                column: 0,
                detail: format!("operation reference '{last}' is not OP plus ten digits"),
            })
    }

    /// Insert headers and return `operation reference → transaction id`.
    pub fn insert_transaction_headers(
        &mut self,
        headers: &[TxHeaderRow],
    ) -> GenResult<HashMap<String, TxId>> {
        let rows: Vec<_> = headers
            .iter()
            .map(|h| {
                vec![
                    SqlValue::Timestamp(h.occurred_at),
                    SqlValue::from(status::TRANSACTION_SUCCESSFUL),
                    SqlValue::Money(h.amount),
                    SqlValue::text(&h.reference),
                ]
            })
            .collect();
        self.insert_rows_returning(
            "transaccion_yape",
            &["fecha_hora", "estado", "monto", "numero_operacion"],
            &rows,
            "numero_operacion, id_transaccion",
        )?
        .iter()
        .map(|row| Ok((row[0].as_text(0)?, row[1].as_i64(1)?)))
        .collect()
    }

    /// Up to `limit` successful transactions with an ID above `after`
    /// that carry no notification yet, with their amounts, in ID order.
    pub fn unnotified_transactions(
        &mut self,
        after: TxId,
        limit: usize,
    ) -> GenResult<Vec<(TxId, Money)>> {
        let pairs = self.id_pairs(&format!(
            "SELECT t.id_transaccion, CAST(ROUND(t.monto * 100) AS BIGINT)
             FROM transaccion_yape t
             WHERE t.estado = '{}'
               AND t.id_transaccion > {after}
               AND NOT EXISTS (
                   SELECT 1 FROM notificacion_transaccion n
                   WHERE n.id_transaccion = t.id_transaccion)
             ORDER BY t.id_transaccion
             LIMIT {limit}",
            status::TRANSACTION_SUCCESSFUL
        ))?;
        Ok(pairs
            .into_iter()
            .map(|(id, cents)| (id, Money::from_cents(cents)))
            .collect())
    }

    // ── Transaction detail and operation link ─────────────────────

    pub fn insert_person_details(&mut self, details: &[PersonDetailRow]) -> GenResult<u64> {
        let rows: Vec<_> = details
            .iter()
            .map(|d| {
                vec![
                    SqlValue::Int(d.tx_id),
                    SqlValue::Text(d.security_code.to_string()),
                    SqlValue::text(&d.channel),
                ]
            })
            .collect();
        self.insert_rows(
            "transaccion_persona",
            &["id_transaccion", "codigo_seguridad", "tipo_destino"],
            &rows,
            "",
        )
    }

    pub fn insert_operations(&mut self, operations: &[OperationRow]) -> GenResult<u64> {
        let rows: Vec<_> = operations
            .iter()
            .map(|o| {
                vec![
                    SqlValue::Int(o.tx_id),
                    SqlValue::Int(o.sender),
                    SqlValue::Int(o.receiver),
                ]
            })
            .collect();
        self.insert_rows(
            "operacion_yape",
            &["id_transaccion", "id_billetera_emisor", "id_billetera_receptor"],
            &rows,
            "",
        )
    }
}
