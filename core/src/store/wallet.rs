use super::{
    sql::{id_list, SqlValue, MAX_IDS_PER_LOOKUP, MAX_ROWS_PER_STATEMENT},
    WalletStore,
};
use crate::{
    actor_phase::CompanyTier,
    error::GenResult,
    types::{status, ActorId, Money, WalletId},
    wallet_phase::{
        CompanyProfileRow, CredentialRow, ExternalProfileRow, PersonaProfileRow, QrDynamicRow,
        QrRow, WalletRow,
    },
};
use std::collections::HashMap;

const WALLET_COLUMNS: [&str; 6] = [
    "id_actor",
    "celular",
    "origen_billetera",
    "estado",
    "permite_interoperabilidad",
    "saldo",
];

fn wallet_values(w: &WalletRow) -> Vec<SqlValue> {
    vec![
        w.actor_id.map(SqlValue::Int).unwrap_or(SqlValue::Null),
        SqlValue::Text(w.phone.to_string()),
        SqlValue::text(&w.origin),
        SqlValue::from(status::WALLET_ACTIVE),
        SqlValue::Bool(w.interoperable),
        SqlValue::Money(w.balance),
    ]
}

impl WalletStore {
    // ── Wallet ────────────────────────────────────────────────────

    pub fn insert_wallets(&mut self, wallets: &[WalletRow]) -> GenResult<u64> {
        let rows: Vec<_> = wallets.iter().map(wallet_values).collect();
        self.insert_rows("billetera_yape", &WALLET_COLUMNS, &rows, "")
    }

    /// Insert wallets and return their generated IDs in insertion order.
    pub fn insert_wallets_returning_ids(&mut self, wallets: &[WalletRow]) -> GenResult<Vec<WalletId>> {
        let rows: Vec<_> = wallets.iter().map(wallet_values).collect();
        self.insert_rows_returning_ids("billetera_yape", &WALLET_COLUMNS, &rows, "id_billetera")
    }

    /// Read back `actor → wallet` for freshly inserted actor wallets.
    pub fn wallet_ids_by_actor(&mut self, actors: &[ActorId]) -> GenResult<HashMap<ActorId, WalletId>> {
        let mut map = HashMap::with_capacity(actors.len());
        for chunk in actors.chunks(MAX_IDS_PER_LOOKUP) {
            let pairs = self.id_pairs(&format!(
                "SELECT id_actor, id_billetera FROM billetera_yape WHERE id_actor IN ({})",
                id_list(chunk)
            ))?;
            map.extend(pairs);
        }
        Ok(map)
    }

    /// Actors of `table` (`persona` or `empresa`) that own no wallet yet.
    pub fn actors_without_wallet(&mut self, table: &str) -> GenResult<Vec<ActorId>> {
        self.id_column(&format!(
            "SELECT a.id_actor FROM {table} a
             LEFT JOIN billetera_yape w ON w.id_actor = a.id_actor
             WHERE w.id_billetera IS NULL
             ORDER BY a.id_actor"
        ))
    }

    /// Wallets with no credential row yet.
    pub fn wallets_without_credential(&mut self) -> GenResult<Vec<WalletId>> {
        self.id_column(
            "SELECT w.id_billetera FROM billetera_yape w
             LEFT JOIN credencial c ON c.id_billetera = w.id_billetera
             WHERE c.id_billetera IS NULL
             ORDER BY w.id_billetera",
        )
    }

    pub fn all_wallet_ids(&mut self) -> GenResult<Vec<WalletId>> {
        self.id_column("SELECT id_billetera FROM billetera_yape ORDER BY id_billetera")
    }

    pub fn active_wallet_ids(&mut self) -> GenResult<Vec<WalletId>> {
        self.id_column(&format!(
            "SELECT id_billetera FROM billetera_yape WHERE estado = '{}' ORDER BY id_billetera",
            status::WALLET_ACTIVE
        ))
    }

    pub fn persona_wallet_ids(&mut self) -> GenResult<Vec<WalletId>> {
        self.id_column("SELECT id_billetera FROM billetera_persona ORDER BY id_billetera")
    }

    pub fn external_wallet_ids(&mut self) -> GenResult<Vec<WalletId>> {
        self.id_column("SELECT id_billetera FROM billetera_other_persona ORDER BY id_billetera")
    }

    /// Wallets owned by actors of one company tier.
    pub fn tier_wallet_ids(&mut self, tier: CompanyTier) -> GenResult<Vec<WalletId>> {
        self.id_column(&format!(
            "SELECT w.id_billetera FROM billetera_yape w
             JOIN {} t ON w.id_actor = t.id_actor
             ORDER BY w.id_billetera",
            tier.table()
        ))
    }

    /// Overwrite balances, one `CASE` update per statement-sized chunk.
    pub fn set_wallet_balances(&mut self, balances: &[(WalletId, Money)]) -> GenResult<u64> {
        let mut affected = 0;
        for chunk in balances.chunks(MAX_ROWS_PER_STATEMENT) {
            let arms: String = chunk
                .iter()
                .map(|(id, balance)| format!(" WHEN {id} THEN {balance}"))
                .collect();
            let ids: Vec<WalletId> = chunk.iter().map(|(id, _)| *id).collect();
            affected += self.backend.execute(&format!(
                "UPDATE billetera_yape SET saldo = CASE id_billetera{arms} END WHERE id_billetera IN ({})",
                id_list(&ids)
            ))?;
        }
        Ok(affected)
    }

    // ── Wallet profiles ───────────────────────────────────────────

    pub fn insert_persona_profiles(&mut self, profiles: &[PersonaProfileRow]) -> GenResult<u64> {
        let rows: Vec<_> = profiles
            .iter()
            .map(|p| {
                vec![
                    SqlValue::Int(p.wallet_id),
                    SqlValue::text(&p.registration_method),
                    SqlValue::Money(p.daily_limit),
                    SqlValue::Money(p.monthly_limit),
                    SqlValue::Money(p.per_operation_limit),
                    SqlValue::Bool(p.fraud_blocked),
                    SqlValue::text(&p.verification_level),
                ]
            })
            .collect();
        self.insert_rows(
            "billetera_persona",
            &[
                "id_billetera",
                "metodo_registro",
                "limite_diario",
                "limite_mensual_recaudacion",
                "limite_por_operacion",
                "bloqueado_fraude",
                "nivel_verificacion",
            ],
            &rows,
            "",
        )
    }

    pub fn insert_company_profiles(&mut self, profiles: &[CompanyProfileRow]) -> GenResult<u64> {
        let rows: Vec<_> = profiles
            .iter()
            .map(|p| {
                vec![
                    SqlValue::Int(p.wallet_id),
                    SqlValue::Text(p.collection_account.to_string()),
                    SqlValue::Real(p.commission_rate),
                    SqlValue::Money(p.monthly_collection_limit),
                ]
            })
            .collect();
        self.insert_rows(
            "billetera_empresa",
            &[
                "id_billetera",
                "cuenta_recaudacion",
                "tasa_comision",
                "limite_mensual_recaudacion",
            ],
            &rows,
            "",
        )
    }

    pub fn insert_external_profiles(&mut self, profiles: &[ExternalProfileRow]) -> GenResult<u64> {
        let rows: Vec<_> = profiles
            .iter()
            .map(|p| {
                vec![
                    SqlValue::Int(p.wallet_id),
                    SqlValue::text(&p.external_id),
                    SqlValue::text(&p.display_name),
                ]
            })
            .collect();
        self.insert_rows(
            "billetera_other_persona",
            &["id_billetera", "id_externo", "nombre_externo"],
            &rows,
            "",
        )
    }

    // ── Credential ────────────────────────────────────────────────

    pub fn insert_credentials(&mut self, credentials: &[CredentialRow]) -> GenResult<u64> {
        let rows: Vec<_> = credentials
            .iter()
            .map(|c| {
                vec![
                    SqlValue::Int(c.wallet_id),
                    SqlValue::Int(c.credential_no),
                    SqlValue::from(status::CREDENTIAL_KIND_PIN),
                    SqlValue::text(&c.hash),
                    SqlValue::Timestamp(c.created_at),
                    SqlValue::Null,
                    SqlValue::from(status::CREDENTIAL_ACTIVE),
                ]
            })
            .collect();
        self.insert_rows(
            "credencial",
            &[
                "id_billetera",
                "id_credencial",
                "tipo",
                "hash_valor",
                "fecha_creacion",
                "fecha_expiracion",
                "estado",
            ],
            &rows,
            "",
        )
    }

    // ── QR ────────────────────────────────────────────────────────

    pub fn insert_qr_codes(&mut self, codes: &[QrRow]) -> GenResult<Vec<i64>> {
        let rows: Vec<_> = codes
            .iter()
            .map(|q| vec![SqlValue::text(&q.code), SqlValue::Bool(q.active)])
            .collect();
        self.insert_rows_returning_ids("qr", &["codigo_qr", "activo"], &rows, "id_qr")
    }

    pub fn insert_qr_dynamic(&mut self, details: &[QrDynamicRow]) -> GenResult<u64> {
        let rows: Vec<_> = details
            .iter()
            .map(|d| {
                vec![
                    SqlValue::Int(d.qr_id),
                    SqlValue::Money(d.fixed_amount),
                    SqlValue::Int(d.validity_secs),
                ]
            })
            .collect();
        self.insert_rows(
            "qr_dinamico",
            &["id_qr", "monto_fijo", "tiempo_validez"],
            &rows,
            "",
        )
    }
}
