use crate::{
    error::{GenError, GenResult},
    rng::PhaseRng,
    types::{ActorCategory, Money},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Shared value shapes ────────────────────────────────────────────

/// An inclusive integer range used for national IDs, tax IDs and phones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub min: i64,
    pub max: i64,
}

impl IdRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Number of distinct values in the range.
    pub fn len(&self) -> u64 {
        if self.max < self.min {
            0
        } else {
            (self.max - self.min) as u64 + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn sample(&self, rng: &mut PhaseRng) -> i64 {
        rng.range_inclusive(self.min, self.max)
    }
}

/// A uniform amount range, sampled to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut PhaseRng) -> Money {
        Money::from_f64(rng.uniform(self.min, self.max))
    }
}

// ── Phase 1: actors ────────────────────────────────────────────────

/// Proportions of the company population per tier.
/// The services tier receives the remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierShares {
    pub small_business: f64,
    pub enterprise: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub total_actors: usize,
    pub persona_ratio: f64,
    pub batch_size: usize,
    pub national_id_range: IdRange,
    pub tax_id_range: IdRange,
    pub max_id_attempts: u32,
    pub tier_shares: TierShares,
    pub sectors: Vec<String>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            total_actors: 1_000_000,
            persona_ratio: 0.7,
            batch_size: 5_000,
            national_id_range: IdRange::new(70_000_000, 79_999_999),
            tax_id_range: IdRange::new(10_000_000_000, 19_999_999_999),
            max_id_attempts: 1_000,
            tier_shares: TierShares {
                small_business: 0.33,
                enterprise: 0.33,
            },
            sectors: [
                "Retail",
                "Restaurantes",
                "Bodegas",
                "Transporte",
                "Salud",
                "Educación",
                "Servicios profesionales",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl PopulationConfig {
    pub fn persona_count(&self) -> usize {
        (self.total_actors as f64 * self.persona_ratio).floor() as usize
    }

    pub fn company_count(&self) -> usize {
        self.total_actors - self.persona_count()
    }
}

// ── Phase 2: features ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub catalog: Vec<FeatureDef>,
    pub by_category: BTreeMap<ActorCategory, Vec<String>>,
    pub link_batch_size: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        let catalog = [
            ("Enviar dinero", "Permite transferencias entre billeteras."),
            ("Recibir dinero", "Registro de pagos recibidos."),
            ("Consultar saldo", "Muestra el saldo disponible."),
            ("Consultar movimientos", "Historial de operaciones."),
            ("Pago de servicios", "Pago a empresas de servicios."),
            ("Pago con QR", "Permite pagar usando QR."),
            ("Generar QR estático", "Crea un QR permanente."),
            ("Generar QR dinámico", "Crea QR con monto y validez."),
            ("Reportes empresariales", "Reportes de negocio."),
            ("Notificación de envío de dinero", "Aviso por envíos."),
            ("Notificación de recepción de dinero", "Aviso por recepciones."),
        ]
        .into_iter()
        .map(|(name, description)| FeatureDef {
            name: name.into(),
            description: description.into(),
        })
        .collect();

        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut by_category = BTreeMap::new();
        by_category.insert(
            ActorCategory::Persona,
            names(&[
                "Enviar dinero",
                "Recibir dinero",
                "Consultar saldo",
                "Pago de servicios",
                "Pago con QR",
            ]),
        );
        by_category.insert(
            ActorCategory::SmallBusiness,
            names(&[
                "Recibir dinero",
                "Consultar saldo",
                "Pago con QR",
                "Reportes empresariales",
            ]),
        );
        by_category.insert(
            ActorCategory::Enterprise,
            names(&["Recibir dinero", "Generar QR dinámico", "Reportes empresariales"]),
        );
        by_category.insert(
            ActorCategory::Services,
            names(&["Recibir dinero", "Consultar saldo", "Reportes empresariales"]),
        );

        Self {
            catalog,
            by_category,
            link_batch_size: 10_000,
        }
    }
}

// ── Phase 3: wallets ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaLimits {
    pub registration_method: String,
    pub daily_limit: f64,
    pub monthly_limit: f64,
    pub per_operation_limit: f64,
    pub verification_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub commission_rate: f64,
    pub monthly_collection_limit: f64,
    pub collection_account_range: IdRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub phone_range: IdRange,
    pub origin: String,
    pub persona_balance: AmountRange,
    pub company_balance: AmountRange,
    pub external_balance: AmountRange,
    pub external_fraction: f64,
    pub external_origins: Vec<String>,
    pub persona_limits: PersonaLimits,
    pub company_profile: CompanyProfile,
    pub credential_age_days: IdRange,
    pub qr_amount: AmountRange,
    pub qr_validity_secs: i64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            phone_range: IdRange::new(900_000_000, 989_999_999),
            origin: "Yape".into(),
            persona_balance: AmountRange::new(100.0, 5_000.0),
            company_balance: AmountRange::new(1_000.0, 50_000.0),
            external_balance: AmountRange::new(50.0, 2_000.0),
            external_fraction: 0.30,
            external_origins: vec!["Plin".into(), "Tunki".into()],
            persona_limits: PersonaLimits {
                registration_method: "DNI".into(),
                daily_limit: 500.0,
                monthly_limit: 5_000.0,
                per_operation_limit: 100.0,
                verification_level: "Basico".into(),
            },
            company_profile: CompanyProfile {
                commission_rate: 0.03,
                monthly_collection_limit: 100_000.0,
                collection_account_range: IdRange::new(10_000_000, 99_999_999),
            },
            credential_age_days: IdRange::new(1, 365),
            qr_amount: AmountRange::new(10.0, 500.0),
            qr_validity_secs: 600,
        }
    }
}

// ── Phase 4: transactions ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    pub total_target: usize,
    pub p2p_share: f64,
    pub chunk_size: usize,
    pub amount_mean: f64,
    pub amount_std_dev: f64,
    pub amount_bounds: AmountRange,
    pub channels: Vec<String>,
    pub security_code_range: IdRange,
    pub balance_reset: AmountRange,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            total_target: 10_000_000,
            p2p_share: 0.70,
            chunk_size: 10_000,
            amount_mean: 80.0,
            amount_std_dev: 30.0,
            amount_bounds: AmountRange::new(1.0, 500.0),
            channels: vec!["Yape".into(), "Plin".into(), "Tunki".into()],
            security_code_range: IdRange::new(1_000, 9_998),
            balance_reset: AmountRange::new(1_000.0, 6_000.0),
        }
    }
}

impl TransactionConfig {
    pub fn p2p_target(&self) -> usize {
        (self.total_target as f64 * self.p2p_share).floor() as usize
    }
}

// ── Phase 5: notifications ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub sample_fraction: f64,
    pub cap: usize,
    pub commit_every: usize,
    /// Candidate transactions read per query.
    pub page_size: usize,
    pub channel: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sample_fraction: 0.30,
            cap: 1_000_000,
            commit_every: 1_000,
            page_size: 100_000,
            channel: "App".into(),
        }
    }
}

// ── Session ────────────────────────────────────────────────────────

/// Settings applied to every phase connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub schema: String,
    pub work_mem: String,
    pub synchronous_commit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            schema: "yape_1_000_000".into(),
            work_mem: "256MB".into(),
            synchronous_commit: false,
        }
    }
}

impl SessionConfig {
    /// `work_mem` in KiB, for backends that size their cache in pages.
    pub fn work_mem_kib(&self) -> Option<u64> {
        let raw = self.work_mem.trim();
        let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
        let (digits, unit) = raw.split_at(split);
        let value: u64 = digits.parse().ok()?;
        match unit.trim().to_ascii_uppercase().as_str() {
            "" | "KB" => Some(value),
            "MB" => Some(value * 1024),
            "GB" => Some(value * 1024 * 1024),
            _ => None,
        }
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub seed: u64,
    pub session: SessionConfig,
    pub population: PopulationConfig,
    pub features: FeatureConfig,
    pub wallets: WalletConfig,
    pub transactions: TransactionConfig,
    pub notifications: NotificationConfig,
}

impl GenConfig {
    /// Load from the data/ directory.
    /// In tests, use GenConfig::default_test().
    pub fn load(data_dir: &str) -> GenResult<Self> {
        let path = format!("{data_dir}/generator.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GenConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Small-scale configuration used by the test suite.
    pub fn default_test() -> Self {
        let mut config = GenConfig {
            seed: 42,
            ..GenConfig::default()
        };
        config.population.total_actors = 1_000;
        config.population.batch_size = 128;
        config.features.link_batch_size = 500;
        config.transactions.total_target = 10_000;
        config.transactions.chunk_size = 1_000;
        config.notifications.commit_every = 100;
        config
    }

    pub fn validate(&self) -> GenResult<()> {
        let p = &self.population;
        check((0.0..=1.0).contains(&p.persona_ratio), "persona_ratio must be within [0, 1]")?;
        check(p.batch_size > 0, "population.batch_size must be > 0")?;
        check(!p.national_id_range.is_empty(), "national_id_range is empty")?;
        check(!p.tax_id_range.is_empty(), "tax_id_range is empty")?;
        check(p.max_id_attempts > 0, "max_id_attempts must be > 0")?;
        check(!p.sectors.is_empty(), "sectors must not be empty")?;
        let shares = &p.tier_shares;
        check(
            shares.small_business >= 0.0
                && shares.enterprise >= 0.0
                && shares.small_business + shares.enterprise <= 1.0 + f64::EPSILON,
            "tier shares must be non-negative and sum to at most 1",
        )?;

        check(self.features.link_batch_size > 0, "features.link_batch_size must be > 0")?;

        let w = &self.wallets;
        check((0.0..=1.0).contains(&w.external_fraction), "external_fraction must be within [0, 1]")?;
        check(!w.external_origins.is_empty(), "external_origins must not be empty")?;
        check(!w.phone_range.is_empty(), "phone_range is empty")?;
        check(w.credential_age_days.min >= 0, "credential ages must be non-negative")?;
        for (label, range) in [
            ("persona_balance", w.persona_balance),
            ("company_balance", w.company_balance),
            ("external_balance", w.external_balance),
            ("qr_amount", w.qr_amount),
        ] {
            check(range.min <= range.max, &format!("{label} has min > max"))?;
        }

        let t = &self.transactions;
        check((0.0..=1.0).contains(&t.p2p_share), "p2p_share must be within [0, 1]")?;
        check(t.chunk_size > 0, "transactions.chunk_size must be > 0")?;
        check(t.amount_std_dev >= 0.0, "amount_std_dev must be non-negative")?;
        check(t.amount_bounds.min <= t.amount_bounds.max, "amount_bounds has min > max")?;
        check(!t.channels.is_empty(), "channels must not be empty")?;
        check(!t.security_code_range.is_empty(), "security_code_range is empty")?;

        let n = &self.notifications;
        check((0.0..=1.0).contains(&n.sample_fraction), "sample_fraction must be within [0, 1]")?;
        check(n.commit_every >= 2, "notifications.commit_every must be >= 2")?;
        check(n.page_size > 0, "notifications.page_size must be > 0")?;
        Ok(())
    }
}

fn check(condition: bool, reason: &str) -> GenResult<()> {
    if condition {
        Ok(())
    } else {
        Err(GenError::InvalidConfig {
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        GenConfig::default().validate().unwrap();
        GenConfig::default_test().validate().unwrap();
    }

    #[test]
    fn persona_split_floors() {
        let mut p = PopulationConfig::default();
        p.total_actors = 1_000;
        p.persona_ratio = 0.7;
        assert_eq!(p.persona_count(), 700);
        assert_eq!(p.company_count(), 300);
    }

    #[test]
    fn rejects_ratio_out_of_range() {
        let mut config = GenConfig::default_test();
        config.population.persona_ratio = 1.5;
        assert!(matches!(config.validate(), Err(GenError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_tier_shares_over_one() {
        let mut config = GenConfig::default_test();
        config.population.tier_shares.enterprise = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: GenConfig =
            serde_json::from_str(r#"{ "seed": 7, "population": { "total_actors": 10 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.population.total_actors, 10);
        assert_eq!(config.population.batch_size, 5_000);
        assert_eq!(config.features.catalog.len(), 11);
        assert_eq!(config.transactions.channels.len(), 3);
    }

    #[test]
    fn work_mem_parses_units() {
        let mut s = SessionConfig::default();
        assert_eq!(s.work_mem_kib(), Some(256 * 1024));
        s.work_mem = "64kB".into();
        assert_eq!(s.work_mem_kib(), Some(64));
        s.work_mem = "lots".into();
        assert_eq!(s.work_mem_kib(), None);
    }

    #[test]
    fn shipped_data_file_parses() {
        let config = GenConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../data")).unwrap();
        assert_eq!(config.population.persona_ratio, 0.7);
        assert_eq!(config.features.by_category.len(), 4);
    }
}
