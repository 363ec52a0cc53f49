//! Phase 1: actors, personas, companies and company tiers.

use crate::{
    clock::RunClock,
    config::{GenConfig, IdRange, TierShares},
    error::GenResult,
    identity::UniqueIdSampler,
    name_generator::NameGenerator,
    phase::GenPhase,
    report::PhaseReport,
    rng::{PhaseRng, PhaseSlot},
    store::WalletStore,
    types::{ActorCategory, ActorId},
};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Contact phones on small-business records span the full 9xx block.
const CONTACT_PHONE_RANGE: IdRange = IdRange::new(900_000_000, 999_999_999);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyTier {
    SmallBusiness,
    Enterprise,
    Services,
}

impl CompanyTier {
    pub const ALL: [CompanyTier; 3] = [
        CompanyTier::SmallBusiness,
        CompanyTier::Enterprise,
        CompanyTier::Services,
    ];

    /// Marker table holding this tier's actors.
    pub fn table(&self) -> &'static str {
        match self {
            Self::SmallBusiness => "empresa_pequeno_negocio",
            Self::Enterprise => "empresa_acceso_empresarial",
            Self::Services => "empresa_servicios",
        }
    }

    pub fn category(&self) -> ActorCategory {
        match self {
            Self::SmallBusiness => ActorCategory::SmallBusiness,
            Self::Enterprise => ActorCategory::Enterprise,
            Self::Services => ActorCategory::Services,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersonaRow {
    pub actor_id: ActorId,
    pub national_id: i64,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CompanyRow {
    pub actor_id: ActorId,
    pub tax_id: i64,
    pub legal_name: String,
    pub sector: String,
    pub trade_name: String,
}

#[derive(Debug, Clone)]
pub struct SmallBusinessRow {
    pub actor_id: ActorId,
    pub owner_national_id: i64,
    pub contact_email: String,
    pub contact_phone: i64,
}

/// Company IDs partitioned by tier, in actor-ID order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierSplit {
    pub small_business: Vec<ActorId>,
    pub enterprise: Vec<ActorId>,
    pub services: Vec<ActorId>,
}

impl TierSplit {
    pub fn ids(&self, tier: CompanyTier) -> &[ActorId] {
        match tier {
            CompanyTier::SmallBusiness => &self.small_business,
            CompanyTier::Enterprise => &self.enterprise,
            CompanyTier::Services => &self.services,
        }
    }

    pub fn total(&self) -> usize {
        self.small_business.len() + self.enterprise.len() + self.services.len()
    }
}

/// Everything phase 1 generated in this run.
#[derive(Debug, Clone, Default)]
pub struct ActorPopulation {
    pub persona_ids: Vec<ActorId>,
    pub companies: TierSplit,
    pub national_ids: Vec<i64>,
    pub tax_ids: Vec<i64>,
}

/// Split companies by position: small business first, then enterprise,
/// then services, which takes whatever share the other two leave.
///
/// Sizes use largest-remainder apportionment over integer basis points,
/// so every tier is within one company of its exact share
/// (300 companies at 0.33 / 0.33 give 99 / 99 / 102).
pub fn split_tiers(company_ids: &[ActorId], shares: &TierShares) -> TierSplit {
    let n = company_ids.len();
    let small_bp = basis_points(shares.small_business);
    let enterprise_bp = basis_points(shares.enterprise).min(10_000 - small_bp);
    let services_bp = 10_000 - small_bp - enterprise_bp;
    let sizes = apportion(n, [small_bp, enterprise_bp, services_bp]);

    let (small, enterprise) = (sizes[0], sizes[1]);
    TierSplit {
        small_business: company_ids[..small].to_vec(),
        enterprise: company_ids[small..small + enterprise].to_vec(),
        services: company_ids[small + enterprise..].to_vec(),
    }
}

fn basis_points(share: f64) -> u128 {
    ((share * 10_000.0).round().max(0.0) as u128).min(10_000)
}

/// Hamilton apportionment of `n` seats over weights summing to 10 000.
/// Ties go to the earlier tier.
fn apportion(n: usize, weights: [u128; 3]) -> [usize; 3] {
    let quotas = weights.map(|w| n as u128 * w);
    let mut sizes = quotas.map(|q| (q / 10_000) as usize);
    let mut leftover = n - sizes.iter().sum::<usize>();

    let mut order = [0usize, 1, 2];
    order.sort_by_key(|&i| std::cmp::Reverse(quotas[i] % 10_000));
    for i in order {
        if leftover == 0 {
            break;
        }
        sizes[i] += 1;
        leftover -= 1;
    }
    sizes
}

pub struct ActorPhase {
    config: GenConfig,
    population: Option<ActorPopulation>,
}

impl ActorPhase {
    pub fn new(config: GenConfig) -> Self {
        Self {
            config,
            population: None,
        }
    }

    /// The population generated by the last run of this phase.
    pub fn population(&self) -> Option<&ActorPopulation> {
        self.population.as_ref()
    }

    fn persona_rows(
        chunk: &[ActorId],
        sampler: &mut UniqueIdSampler,
        rng: &mut PhaseRng,
    ) -> GenResult<Vec<PersonaRow>> {
        chunk
            .iter()
            .map(|&actor_id| {
                Ok(PersonaRow {
                    actor_id,
                    national_id: sampler.draw(rng)?,
                    email: format!("user{actor_id}@yape.com"),
                })
            })
            .collect()
    }

    fn company_rows(
        &self,
        chunk: &[ActorId],
        sampler: &mut UniqueIdSampler,
        rng: &mut PhaseRng,
    ) -> GenResult<Vec<CompanyRow>> {
        let sectors = &self.config.population.sectors;
        chunk
            .iter()
            .map(|&actor_id| {
                let tax_id = sampler.draw(rng)?;
                let sector = rng.pick(sectors).clone();
                let trade_name = NameGenerator::generate_trade_name(rng, &sector);
                Ok(CompanyRow {
                    actor_id,
                    tax_id,
                    legal_name: format!("Empresa {actor_id} SAC"),
                    sector,
                    trade_name,
                })
            })
            .collect()
    }

    fn small_business_rows(&self, chunk: &[ActorId], rng: &mut PhaseRng) -> Vec<SmallBusinessRow> {
        let owner_ids = self.config.population.national_id_range;
        chunk
            .iter()
            .map(|&actor_id| SmallBusinessRow {
                actor_id,
                owner_national_id: owner_ids.sample(rng),
                contact_email: format!("c{actor_id}@negocio.com"),
                contact_phone: CONTACT_PHONE_RANGE.sample(rng),
            })
            .collect()
    }
}

impl GenPhase for ActorPhase {
    fn slot(&self) -> PhaseSlot {
        PhaseSlot::Actors
    }

    fn run(
        &mut self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        _clock: &RunClock,
    ) -> GenResult<PhaseReport> {
        let pop = &self.config.population;
        let batch = pop.batch_size;
        let mut report = PhaseReport::new(self.name());

        // Continue after the highest existing actor: runs are additive.
        let first = store.max_actor_id()? + 1;
        let ids: Vec<ActorId> = (first..first + pop.total_actors as i64).collect();
        for chunk in ids.chunks(batch) {
            let n = store.in_transaction(|s| s.insert_actors(chunk))?;
            report.record("actor_yape", n);
        }

        let (persona_ids, company_ids) = ids.split_at(pop.persona_count());
        if persona_ids.is_empty() || company_ids.is_empty() {
            log::warn!(
                "actors: degenerate split ({} personas, {} companies)",
                persona_ids.len(),
                company_ids.len()
            );
        }

        let mut dni = UniqueIdSampler::new("national ID", pop.national_id_range, pop.max_id_attempts);
        dni.reserve(persona_ids.len())?;
        let mut national_ids = Vec::with_capacity(persona_ids.len());
        for chunk in persona_ids.chunks(batch) {
            let rows = Self::persona_rows(chunk, &mut dni, rng)?;
            national_ids.extend(rows.iter().map(|r| r.national_id));
            let n = store.in_transaction(|s| s.insert_personas(&rows))?;
            report.record("persona", n);
            log::debug!("actors: committed {n} personas");
        }

        let mut ruc = UniqueIdSampler::new("tax ID", pop.tax_id_range, pop.max_id_attempts);
        ruc.reserve(company_ids.len())?;
        let mut tax_ids = Vec::with_capacity(company_ids.len());
        for chunk in company_ids.chunks(batch) {
            let rows = self.company_rows(chunk, &mut ruc, rng)?;
            tax_ids.extend(rows.iter().map(|r| r.tax_id));
            let n = store.in_transaction(|s| s.insert_companies(&rows))?;
            report.record("empresa", n);
            log::debug!("actors: committed {n} companies");
        }

        let tiers = split_tiers(company_ids, &pop.tier_shares);
        for chunk in tiers.small_business.chunks(batch) {
            let rows = self.small_business_rows(chunk, rng);
            let n = store.in_transaction(|s| s.insert_small_businesses(&rows))?;
            report.record(CompanyTier::SmallBusiness.table(), n);
        }
        for tier in [CompanyTier::Enterprise, CompanyTier::Services] {
            for chunk in tiers.ids(tier).chunks(batch) {
                let n = store.in_transaction(|s| s.insert_tier_markers(tier, chunk))?;
                report.record(tier.table(), n);
            }
        }

        log::info!(
            "actors: {} personas, {} companies (tiers {}/{}/{}) from id {first}",
            persona_ids.len(),
            company_ids.len(),
            tiers.small_business.len(),
            tiers.enterprise.len(),
            tiers.services.len(),
        );

        self.population = Some(ActorPopulation {
            persona_ids: persona_ids.to_vec(),
            companies: tiers,
            national_ids,
            tax_ids,
        });
        Ok(report)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shares() -> TierShares {
        TierShares {
            small_business: 0.33,
            enterprise: 0.33,
        }
    }

    #[test]
    fn three_hundred_companies_split_99_99_102() {
        let ids: Vec<ActorId> = (701..=1000).collect();
        let split = split_tiers(&ids, &shares());
        assert_eq!(split.small_business.len(), 99);
        assert_eq!(split.enterprise.len(), 99);
        assert_eq!(split.services.len(), 102);
        assert_eq!(split.small_business[0], 701);
        assert_eq!(split.services.last(), Some(&1000));
    }

    #[test]
    fn split_is_exhaustive_and_close_to_target() {
        for n in 0usize..1_000 {
            let ids: Vec<ActorId> = (1..=n as i64).collect();
            let split = split_tiers(&ids, &shares());
            assert_eq!(split.total(), n, "split must cover all {n} companies");
            let sizes = [
                (split.small_business.len(), 0.33),
                (split.enterprise.len(), 0.33),
                (split.services.len(), 0.34),
            ];
            for (size, share) in sizes {
                let target = n as f64 * share;
                assert!(
                    (size as f64 - target).abs() <= 1.0,
                    "{n} companies: tier of {size} is more than one off {target:.2}"
                );
            }
        }
    }

    #[test]
    fn tier_tables_are_distinct() {
        let tables: Vec<_> = CompanyTier::ALL.iter().map(|t| t.table()).collect();
        assert_eq!(tables.len(), 3);
        assert!(tables[0] != tables[1] && tables[1] != tables[2]);
    }
}
