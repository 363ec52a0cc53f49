//! Actor and identity generation tests.

mod common;

use common::{build_engine, fixed_clock, ints, scalar};
use std::collections::HashSet;
use walletgen_core::{
    config::GenConfig,
    engine::GenEngine,
    error::GenError,
    rng::PhaseSlot,
};

#[test]
fn thousand_actors_split_into_personas_companies_and_tiers() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("actor_split", &config);
    engine.run_through(PhaseSlot::Actors).unwrap();

    let store = engine.store();
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM actor_yape"), 1_000);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM persona"), 700);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM empresa"), 300);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM empresa_pequeno_negocio"), 99);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM empresa_acceso_empresarial"), 99);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM empresa_servicios"), 102);

    let population = engine.population().expect("actor phase ran");
    assert_eq!(population.persona_ids.len(), 700);
    assert_eq!(population.companies.total(), 300);
    assert_eq!(population.persona_ids.first(), Some(&1));
    assert_eq!(population.companies.services.last(), Some(&1_000));
}

#[test]
fn personas_take_the_first_ids_and_companies_the_rest() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("actor_order", &config);
    engine.run_through(PhaseSlot::Actors).unwrap();

    let store = engine.store();
    assert_eq!(scalar(store, "SELECT MAX(id_actor) FROM persona"), 700);
    assert_eq!(scalar(store, "SELECT MIN(id_actor) FROM empresa"), 701);
    // Tiers are assigned by position within the company block.
    assert_eq!(scalar(store, "SELECT MAX(id_actor) FROM empresa_pequeno_negocio"), 799);
    assert_eq!(scalar(store, "SELECT MIN(id_actor) FROM empresa_servicios"), 899);
}

#[test]
fn national_and_tax_ids_are_unique_and_in_range() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("actor_ids", &config);
    engine.run_through(PhaseSlot::Actors).unwrap();

    let store = engine.store();
    let dnis = ints(store, "SELECT CAST(dni AS INTEGER) FROM persona");
    let rucs = ints(store, "SELECT CAST(ruc AS INTEGER) FROM empresa");

    assert_eq!(dnis.iter().collect::<HashSet<_>>().len(), dnis.len(), "duplicate DNI");
    assert_eq!(rucs.iter().collect::<HashSet<_>>().len(), rucs.len(), "duplicate RUC");
    assert!(dnis.iter().all(|d| config.population.national_id_range.contains(*d)));
    assert!(rucs.iter().all(|r| config.population.tax_id_range.contains(*r)));

    let population = engine.population().unwrap();
    assert_eq!(population.national_ids.len(), 700);
    assert_eq!(population.tax_ids.len(), 300);
}

#[test]
fn emails_and_names_follow_their_patterns() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("actor_text", &config);
    engine.run_through(PhaseSlot::Actors).unwrap();

    let store = engine.store();
    assert_eq!(
        scalar(store, "SELECT COUNT(*) FROM persona WHERE correo <> 'user' || id_actor || '@yape.com'"),
        0
    );
    assert_eq!(
        scalar(store, "SELECT COUNT(*) FROM empresa WHERE razon_social <> 'Empresa ' || id_actor || ' SAC'"),
        0
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM empresa_pequeno_negocio
             WHERE correo_contacto <> 'c' || id_actor || '@negocio.com'
                OR CAST(celular_contacto AS INTEGER) NOT BETWEEN 900000000 AND 999999999"
        ),
        0
    );
    let sectors = store.query("SELECT DISTINCT rubro_comercial FROM empresa").unwrap();
    for row in sectors {
        let sector = row[0].as_text(0).unwrap();
        assert!(config.population.sectors.contains(&sector), "unknown sector {sector}");
    }
}

#[test]
fn second_run_continues_after_existing_actors() {
    let mut config = GenConfig::default_test();
    config.population.total_actors = 100;
    let mut first = build_engine("actor_additive", &config);
    first.run_through(PhaseSlot::Actors).unwrap();

    config.seed = 7;
    let store = first.store().reopen().unwrap();
    let mut second = GenEngine::build(&config, store, fixed_clock());
    second.run_through(PhaseSlot::Actors).unwrap();

    let store = first.store();
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM actor_yape"), 200);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM persona"), 140);
    assert_eq!(second.population().unwrap().persona_ids.first(), Some(&101));
}

#[test]
fn exhausted_id_range_fails_instead_of_spinning() {
    let mut config = GenConfig::default_test();
    config.population.national_id_range.max = config.population.national_id_range.min + 9;
    let mut engine = build_engine("actor_exhausted", &config);

    let err = engine.run_through(PhaseSlot::Actors).unwrap_err();
    assert!(
        matches!(err, GenError::IdSpaceExhausted { .. }),
        "expected IdSpaceExhausted, got {err}"
    );
}
