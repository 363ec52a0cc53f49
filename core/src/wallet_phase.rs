//! Phase 3: wallets, wallet profiles, credentials and dynamic QR codes.
//!
//! Actor wallets are inserted batch by batch; the batch's
//! `actor → wallet` map is read back inside the same transaction and used
//! to write the matching profile rows, so a committed wallet always has
//! its profile. External wallets have no actor and take their IDs from
//! `RETURNING`.

use crate::{
    actor_phase::CompanyTier,
    clock::RunClock,
    config::{GenConfig, WalletConfig},
    error::{GenError, GenResult},
    name_generator::NameGenerator,
    phase::GenPhase,
    report::PhaseReport,
    rng::{PhaseRng, PhaseSlot},
    store::WalletStore,
    types::{ActorId, Money, WalletId},
};
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::{
    any::Any,
    collections::{HashMap, HashSet},
};

#[derive(Debug, Clone)]
pub struct WalletRow {
    /// `None` for external-network wallets.
    pub actor_id: Option<ActorId>,
    pub phone: i64,
    pub origin: String,
    pub interoperable: bool,
    pub balance: Money,
}

#[derive(Debug, Clone)]
pub struct PersonaProfileRow {
    pub wallet_id: WalletId,
    pub registration_method: String,
    pub daily_limit: Money,
    pub monthly_limit: Money,
    pub per_operation_limit: Money,
    pub fraud_blocked: bool,
    pub verification_level: String,
}

#[derive(Debug, Clone)]
pub struct CompanyProfileRow {
    pub wallet_id: WalletId,
    pub collection_account: i64,
    pub commission_rate: f64,
    pub monthly_collection_limit: Money,
}

#[derive(Debug, Clone)]
pub struct ExternalProfileRow {
    pub wallet_id: WalletId,
    pub external_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct CredentialRow {
    pub wallet_id: WalletId,
    pub credential_no: i64,
    pub hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct QrRow {
    pub code: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct QrDynamicRow {
    pub qr_id: i64,
    pub fixed_amount: Money,
    pub validity_secs: i64,
}

/// SHA-256 hex digest of a wallet's synthetic PIN secret.
pub fn credential_hash(wallet_id: WalletId) -> String {
    hex::encode(Sha256::digest(format!("pass{wallet_id}").as_bytes()))
}

/// Which kind of actor a batch of wallets belongs to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Owner {
    Persona,
    Company,
}

pub struct WalletPhase {
    config: GenConfig,
}

impl WalletPhase {
    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    fn wallets(&self) -> &WalletConfig {
        &self.config.wallets
    }

    fn actor_wallet_row(&self, actor_id: ActorId, owner: Owner, rng: &mut PhaseRng) -> WalletRow {
        let w = self.wallets();
        let phone = w.phone_range.sample(rng);
        let balance = match owner {
            Owner::Persona => w.persona_balance.sample(rng),
            Owner::Company => w.company_balance.sample(rng),
        };
        WalletRow {
            actor_id: Some(actor_id),
            phone,
            origin: w.origin.clone(),
            interoperable: owner == Owner::Persona,
            balance,
        }
    }

    fn persona_profile(&self, wallet_id: WalletId) -> PersonaProfileRow {
        let limits = &self.wallets().persona_limits;
        PersonaProfileRow {
            wallet_id,
            registration_method: limits.registration_method.clone(),
            daily_limit: Money::from_f64(limits.daily_limit),
            monthly_limit: Money::from_f64(limits.monthly_limit),
            per_operation_limit: Money::from_f64(limits.per_operation_limit),
            fraud_blocked: false,
            verification_level: limits.verification_level.clone(),
        }
    }

    fn company_profile(&self, wallet_id: WalletId, rng: &mut PhaseRng) -> CompanyProfileRow {
        let profile = &self.wallets().company_profile;
        CompanyProfileRow {
            wallet_id,
            collection_account: profile.collection_account_range.sample(rng),
            commission_rate: profile.commission_rate,
            monthly_collection_limit: Money::from_f64(profile.monthly_collection_limit),
        }
    }

    /// Insert one wallet per actor plus its profile, batch by batch.
    /// Returns the `actor → wallet` map of everything inserted.
    fn actor_wallets(
        &self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        actors: &[ActorId],
        owner: Owner,
        report: &mut PhaseReport,
    ) -> GenResult<HashMap<ActorId, WalletId>> {
        let mut created = HashMap::with_capacity(actors.len());
        for chunk in actors.chunks(self.config.population.batch_size) {
            let rows: Vec<WalletRow> = chunk
                .iter()
                .map(|&actor| self.actor_wallet_row(actor, owner, rng))
                .collect();
            let (inserted, profiles) = store.in_transaction(|s| {
                let inserted = s.insert_wallets(&rows)?;
                let by_actor = s.wallet_ids_by_actor(chunk)?;
                let mut wallet_ids = Vec::with_capacity(chunk.len());
                for &actor_id in chunk {
                    let wallet_id = *by_actor
                        .get(&actor_id)
                        .ok_or(GenError::MissingWallet { actor_id })?;
                    wallet_ids.push((actor_id, wallet_id));
                }
                let profiles = match owner {
                    Owner::Persona => {
                        let rows: Vec<_> =
                            wallet_ids.iter().map(|&(_, w)| self.persona_profile(w)).collect();
                        s.insert_persona_profiles(&rows)?
                    }
                    Owner::Company => {
                        let rows: Vec<_> = wallet_ids
                            .iter()
                            .map(|&(_, w)| self.company_profile(w, rng))
                            .collect();
                        s.insert_company_profiles(&rows)?
                    }
                };
                created.extend(wallet_ids);
                Ok((inserted, profiles))
            })?;
            report.record("billetera_yape", inserted);
            match owner {
                Owner::Persona => report.record("billetera_persona", profiles),
                Owner::Company => report.record("billetera_empresa", profiles),
            }
            log::debug!("wallets: committed {inserted} actor wallets");
        }
        Ok(created)
    }

    /// Ownerless wallets from other networks, each with an external identity.
    fn external_wallets(
        &self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        count: usize,
        report: &mut PhaseReport,
    ) -> GenResult<Vec<WalletId>> {
        let w = self.wallets();
        let batch = self.config.population.batch_size;
        let mut created = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(batch);
            let rows: Vec<WalletRow> = (0..n)
                .map(|_| {
                    let phone = w.phone_range.sample(rng);
                    let origin = rng.pick(&w.external_origins).clone();
                    WalletRow {
                        actor_id: None,
                        phone,
                        origin,
                        interoperable: true,
                        balance: w.external_balance.sample(rng),
                    }
                })
                .collect();
            let ids = store.in_transaction(|s| {
                let ids = s.insert_wallets_returning_ids(&rows)?;
                let profiles: Vec<_> = ids
                    .iter()
                    .map(|&wallet_id| ExternalProfileRow {
                        wallet_id,
                        external_id: format!("EXT{wallet_id}"),
                        display_name: NameGenerator::generate_full_name(rng),
                    })
                    .collect();
                report.record("billetera_other_persona", s.insert_external_profiles(&profiles)?);
                Ok(ids)
            })?;
            report.record("billetera_yape", ids.len() as u64);
            created.extend(ids);
            remaining -= n;
        }
        Ok(created)
    }

    /// One PIN credential for every wallet that lacks one.
    fn credentials(
        &self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        clock: &RunClock,
        report: &mut PhaseReport,
    ) -> GenResult<()> {
        let ages = self.wallets().credential_age_days;
        let wallets = store.wallets_without_credential()?;
        for chunk in wallets.chunks(self.config.population.batch_size) {
            let rows: Vec<_> = chunk
                .iter()
                .map(|&wallet_id| CredentialRow {
                    wallet_id,
                    credential_no: 1,
                    hash: credential_hash(wallet_id),
                    created_at: clock.days_ago(ages.sample(rng)),
                })
                .collect();
            let n = store.in_transaction(|s| s.insert_credentials(&rows))?;
            report.record("credencial", n);
        }
        Ok(())
    }

    /// One active dynamic QR code per enterprise wallet.
    fn qr_codes(
        &self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        wallets: &[WalletId],
        report: &mut PhaseReport,
    ) -> GenResult<()> {
        let w = self.wallets();
        for chunk in wallets.chunks(self.config.population.batch_size) {
            let codes: Vec<_> = chunk
                .iter()
                .map(|&wallet_id| QrRow {
                    code: format!("QRD{wallet_id}{}", rng.range_inclusive(1_000, 9_999)),
                    active: true,
                })
                .collect();
            store.in_transaction(|s| {
                let qr_ids = s.insert_qr_codes(&codes)?;
                let details: Vec<_> = qr_ids
                    .iter()
                    .map(|&qr_id| QrDynamicRow {
                        qr_id,
                        fixed_amount: w.qr_amount.sample(rng),
                        validity_secs: w.qr_validity_secs,
                    })
                    .collect();
                report.record("qr", qr_ids.len() as u64);
                report.record("qr_dinamico", s.insert_qr_dynamic(&details)?);
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl GenPhase for WalletPhase {
    fn slot(&self) -> PhaseSlot {
        PhaseSlot::Wallets
    }

    fn run(
        &mut self,
        store: &mut WalletStore,
        rng: &mut PhaseRng,
        clock: &RunClock,
    ) -> GenResult<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        let personas = store.actors_without_wallet("persona")?;
        let persona_wallets = self.actor_wallets(store, rng, &personas, Owner::Persona, &mut report)?;

        let companies = store.actors_without_wallet("empresa")?;
        let company_wallets = self.actor_wallets(store, rng, &companies, Owner::Company, &mut report)?;

        let external_count =
            (persona_wallets.len() as f64 * self.wallets().external_fraction).floor() as usize;
        let external = self.external_wallets(store, rng, external_count, &mut report)?;

        self.credentials(store, rng, clock, &mut report)?;

        // Only enterprise wallets created in this run get a QR code.
        let enterprise: HashSet<ActorId> = store
            .tier_actor_ids(CompanyTier::Enterprise)?
            .into_iter()
            .collect();
        let mut enterprise_wallets: Vec<WalletId> = company_wallets
            .iter()
            .filter(|(actor, _)| enterprise.contains(actor))
            .map(|(_, &wallet)| wallet)
            .collect();
        enterprise_wallets.sort_unstable();
        self.qr_codes(store, rng, &enterprise_wallets, &mut report)?;

        if persona_wallets.is_empty() && company_wallets.is_empty() {
            log::warn!("wallets: no actors without a wallet");
        }
        log::info!(
            "wallets: {} persona, {} company, {} external; {} credentials, {} QR codes",
            persona_wallets.len(),
            company_wallets.len(),
            external.len(),
            report.rows_for("credencial"),
            report.rows_for("qr"),
        );
        Ok(report)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
