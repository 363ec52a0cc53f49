//! Phase 2: feature catalog and actor-feature links.

use crate::{
    actor_phase::CompanyTier,
    clock::RunClock,
    config::{FeatureConfig, GenConfig},
    error::{GenError, GenResult},
    phase::GenPhase,
    report::PhaseReport,
    rng::{PhaseRng, PhaseSlot},
    store::WalletStore,
    types::{ActorCategory, ActorId, FeatureId},
};
use std::{any::Any, collections::HashMap};

pub struct FeaturePhase {
    config: GenConfig,
}

impl FeaturePhase {
    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    /// Make sure every catalog entry exists, inserting only the names the
    /// table does not have yet. Returns the full `name → id` map.
    fn sync_catalog(
        &self,
        store: &mut WalletStore,
        report: &mut PhaseReport,
    ) -> GenResult<HashMap<String, FeatureId>> {
        let mut catalog = store.feature_catalog()?;
        let missing: Vec<_> = self
            .config
            .features
            .catalog
            .iter()
            .filter(|f| !catalog.contains_key(&f.name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let inserted = store.in_transaction(|s| s.insert_features(&missing))?;
            report.record("funcionalidad", inserted.len() as u64);
            catalog.extend(inserted);
        }
        Ok(catalog)
    }

    fn category_actors(store: &mut WalletStore, category: ActorCategory) -> GenResult<Vec<ActorId>> {
        match category {
            ActorCategory::Persona => store.persona_actor_ids(),
            ActorCategory::SmallBusiness => store.tier_actor_ids(CompanyTier::SmallBusiness),
            ActorCategory::Enterprise => store.tier_actor_ids(CompanyTier::Enterprise),
            ActorCategory::Services => store.tier_actor_ids(CompanyTier::Services),
        }
    }
}

/// Resolve a category's feature names against the catalog.
pub fn resolve_features(
    features: &FeatureConfig,
    category: ActorCategory,
    catalog: &HashMap<String, FeatureId>,
) -> GenResult<Vec<FeatureId>> {
    features
        .by_category
        .get(&category)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|name| {
            catalog
                .get(name)
                .copied()
                .ok_or_else(|| GenError::UnknownFeature { name: name.clone() })
        })
        .collect()
}

/// Every (actor, feature) pair for one category, actor-major.
pub fn cross_links(actors: &[ActorId], features: &[FeatureId]) -> Vec<(ActorId, FeatureId)> {
    actors
        .iter()
        .flat_map(|&actor| features.iter().map(move |&feature| (actor, feature)))
        .collect()
}

impl GenPhase for FeaturePhase {
    fn slot(&self) -> PhaseSlot {
        PhaseSlot::Features
    }

    fn run(
        &mut self,
        store: &mut WalletStore,
        _rng: &mut PhaseRng,
        _clock: &RunClock,
    ) -> GenResult<PhaseReport> {
        let mut report = PhaseReport::new(self.name());
        let catalog = self.sync_catalog(store, &mut report)?;

        // Resolve every list before writing any link so a bad name fails fast.
        let mut plan = Vec::with_capacity(ActorCategory::ALL.len());
        for category in ActorCategory::ALL {
            plan.push((category, resolve_features(&self.config.features, category, &catalog)?));
        }

        let batch = self.config.features.link_batch_size;
        for (category, features) in plan {
            let actors = Self::category_actors(store, category)?;
            if actors.is_empty() || features.is_empty() {
                log::warn!("features: nothing to link for {}", category.label());
                continue;
            }
            let links = cross_links(&actors, &features);
            let mut added = 0;
            for chunk in links.chunks(batch) {
                added += store.in_transaction(|s| s.insert_feature_links(chunk))?;
            }
            report.record("a_funcionalidad", added);
            log::info!(
                "features: {} → {} actors × {} features, {added} new links",
                category.label(),
                actors.len(),
                features.len()
            );
        }
        Ok(report)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
