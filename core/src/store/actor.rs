use super::{sql::SqlValue, WalletStore};
use crate::{
    actor_phase::{CompanyRow, CompanyTier, PersonaRow, SmallBusinessRow},
    error::GenResult,
    types::ActorId,
};

impl WalletStore {
    // ── Actor ─────────────────────────────────────────────────────

    /// Highest existing actor ID, 0 for an empty table.
    pub fn max_actor_id(&mut self) -> GenResult<ActorId> {
        self.scalar_i64("SELECT CAST(COALESCE(MAX(id_actor), 0) AS BIGINT) FROM actor_yape")
    }

    pub fn insert_actors(&mut self, ids: &[ActorId]) -> GenResult<u64> {
        let rows: Vec<_> = ids.iter().map(|&id| vec![SqlValue::Int(id)]).collect();
        self.insert_rows("actor_yape", &["id_actor"], &rows, "")
    }

    // ── Persona ───────────────────────────────────────────────────

    pub fn insert_personas(&mut self, personas: &[PersonaRow]) -> GenResult<u64> {
        let rows: Vec<_> = personas
            .iter()
            .map(|p| {
                vec![
                    SqlValue::Int(p.actor_id),
                    SqlValue::Text(p.national_id.to_string()),
                    SqlValue::text(&p.email),
                ]
            })
            .collect();
        self.insert_rows("persona", &["id_actor", "dni", "correo"], &rows, "")
    }

    pub fn persona_actor_ids(&mut self) -> GenResult<Vec<ActorId>> {
        self.id_column("SELECT id_actor FROM persona ORDER BY id_actor")
    }

    // ── Company ───────────────────────────────────────────────────

    pub fn insert_companies(&mut self, companies: &[CompanyRow]) -> GenResult<u64> {
        let rows: Vec<_> = companies
            .iter()
            .map(|c| {
                vec![
                    SqlValue::Int(c.actor_id),
                    SqlValue::Text(c.tax_id.to_string()),
                    SqlValue::text(&c.legal_name),
                    SqlValue::text(&c.sector),
                    SqlValue::text(&c.trade_name),
                ]
            })
            .collect();
        self.insert_rows(
            "empresa",
            &["id_actor", "ruc", "razon_social", "rubro_comercial", "nombre_comercial"],
            &rows,
            "",
        )
    }

    pub fn insert_small_businesses(&mut self, businesses: &[SmallBusinessRow]) -> GenResult<u64> {
        let rows: Vec<_> = businesses
            .iter()
            .map(|b| {
                vec![
                    SqlValue::Int(b.actor_id),
                    SqlValue::Text(b.owner_national_id.to_string()),
                    SqlValue::text(&b.contact_email),
                    SqlValue::Text(b.contact_phone.to_string()),
                ]
            })
            .collect();
        self.insert_rows(
            CompanyTier::SmallBusiness.table(),
            &["id_actor", "dni_duenho", "correo_contacto", "celular_contacto"],
            &rows,
            "",
        )
    }

    /// Marker rows for tiers that carry no attributes beyond the actor.
    pub fn insert_tier_markers(&mut self, tier: CompanyTier, ids: &[ActorId]) -> GenResult<u64> {
        let rows: Vec<_> = ids.iter().map(|&id| vec![SqlValue::Int(id)]).collect();
        self.insert_rows(tier.table(), &["id_actor"], &rows, "")
    }

    pub fn tier_actor_ids(&mut self, tier: CompanyTier) -> GenResult<Vec<ActorId>> {
        self.id_column(&format!(
            "SELECT id_actor FROM {} ORDER BY id_actor",
            tier.table()
        ))
    }
}
