use super::{sql::SqlValue, WalletStore};
use crate::{
    config::FeatureDef,
    error::GenResult,
    types::{ActorId, FeatureId},
};
use std::collections::HashMap;

impl WalletStore {
    // ── Feature catalog ───────────────────────────────────────────

    pub fn feature_catalog(&mut self) -> GenResult<HashMap<String, FeatureId>> {
        self.query("SELECT nombre, CAST(id_funcionalidad AS BIGINT) FROM funcionalidad")?
            .iter()
            .map(|row| Ok((row[0].as_text(0)?, row[1].as_i64(1)?)))
            .collect()
    }

    /// Insert catalog entries, returning `(name, id)` for each new row.
    pub fn insert_features(&mut self, features: &[FeatureDef]) -> GenResult<Vec<(String, FeatureId)>> {
        let rows: Vec<_> = features
            .iter()
            .map(|f| vec![SqlValue::text(&f.name), SqlValue::text(&f.description)])
            .collect();
        self.insert_rows_returning(
            "funcionalidad",
            &["nombre", "descripcion"],
            &rows,
            "nombre, id_funcionalidad",
        )?
        .iter()
        .map(|row| Ok((row[0].as_text(0)?, row[1].as_i64(1)?)))
        .collect()
    }

    // ── Actor-feature links ───────────────────────────────────────

    /// Conflict-tolerant link insert: pairs that already exist are
    /// skipped silently. Returns the number of links actually added.
    pub fn insert_feature_links(&mut self, links: &[(ActorId, FeatureId)]) -> GenResult<u64> {
        let rows: Vec<_> = links
            .iter()
            .map(|&(actor, feature)| vec![SqlValue::Int(actor), SqlValue::Int(feature)])
            .collect();
        self.insert_rows(
            "a_funcionalidad",
            &["id_actor", "id_funcionalidad"],
            &rows,
            "ON CONFLICT DO NOTHING",
        )
    }
}
