//! Wallet, profile, credential and QR generation tests.

mod common;

use common::{build_engine, scalar};
use walletgen_core::{config::GenConfig, rng::PhaseSlot, wallet_phase::credential_hash};

fn wallets_engine(tag: &str) -> walletgen_core::engine::GenEngine {
    let config = GenConfig::default_test();
    let mut engine = build_engine(tag, &config);
    engine.run_through(PhaseSlot::Wallets).unwrap();
    engine
}

#[test]
fn every_actor_gets_one_wallet_plus_external_wallets() {
    let mut engine = wallets_engine("wallet_counts");
    let store = engine.store();

    assert_eq!(scalar(store, "SELECT COUNT(*) FROM billetera_persona"), 700);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM billetera_empresa"), 300);
    // floor(700 * 0.30)
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM billetera_other_persona"), 210);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM billetera_yape"), 1_210);
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM (SELECT id_actor FROM billetera_yape
             WHERE id_actor IS NOT NULL GROUP BY id_actor HAVING COUNT(*) > 1)"
        ),
        0
    );
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM billetera_yape WHERE id_actor IS NULL"), 210);
}

#[test]
fn profiles_reference_wallets_of_the_right_owner() {
    let mut engine = wallets_engine("wallet_profiles");
    let store = engine.store();

    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_persona bp
             JOIN billetera_yape w ON w.id_billetera = bp.id_billetera
             JOIN persona p ON p.id_actor = w.id_actor"
        ),
        700
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_empresa be
             JOIN billetera_yape w ON w.id_billetera = be.id_billetera
             JOIN empresa e ON e.id_actor = w.id_actor"
        ),
        300
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_other_persona o
             JOIN billetera_yape w ON w.id_billetera = o.id_billetera
             WHERE w.id_actor IS NULL AND o.id_externo = 'EXT' || o.id_billetera"
        ),
        210
    );
}

#[test]
fn wallet_attributes_follow_the_owner_kind() {
    let mut engine = wallets_engine("wallet_attrs");
    let store = engine.store();

    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_yape w JOIN billetera_persona p ON p.id_billetera = w.id_billetera
             WHERE w.saldo NOT BETWEEN 100 AND 5000 OR w.permite_interoperabilidad = 0
                OR w.origen_billetera <> 'Yape' OR w.estado <> 'Activo'"
        ),
        0
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_yape w JOIN billetera_empresa e ON e.id_billetera = w.id_billetera
             WHERE w.saldo NOT BETWEEN 1000 AND 50000 OR w.permite_interoperabilidad = 1
                OR e.tasa_comision <> 0.03"
        ),
        0
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_yape w JOIN billetera_other_persona o ON o.id_billetera = w.id_billetera
             WHERE w.saldo NOT BETWEEN 50 AND 2000 OR w.origen_billetera NOT IN ('Plin', 'Tunki')"
        ),
        0
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_yape WHERE CAST(celular AS INTEGER) NOT BETWEEN 900000000 AND 989999999"
        ),
        0
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_persona
             WHERE metodo_registro <> 'DNI' OR limite_diario <> 500 OR limite_mensual_recaudacion <> 5000
                OR limite_por_operacion <> 100 OR bloqueado_fraude <> 0 OR nivel_verificacion <> 'Basico'"
        ),
        0
    );
}

#[test]
fn every_wallet_has_exactly_one_pin_credential() {
    let mut engine = wallets_engine("wallet_credentials");
    let store = engine.store();

    assert_eq!(scalar(store, "SELECT COUNT(*) FROM credencial"), 1_210);
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM billetera_yape w
             LEFT JOIN credencial c ON c.id_billetera = w.id_billetera
             WHERE c.id_billetera IS NULL"
        ),
        0
    );
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM credencial
             WHERE id_credencial <> 1 OR tipo <> 'PIN' OR estado <> 'Activa'
                OR length(hash_valor) <> 64 OR fecha_expiracion IS NOT NULL"
        ),
        0
    );
    // Creation dates are 1..=365 days before the fixed run clock (2025-06-30 12:00:00).
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM credencial
             WHERE fecha_creacion NOT BETWEEN '2024-06-30 12:00:00' AND '2025-06-29 12:00:00'"
        ),
        0
    );

    let rows = store
        .query("SELECT id_billetera, hash_valor FROM credencial ORDER BY id_billetera LIMIT 5")
        .unwrap();
    for row in rows {
        let wallet = row[0].as_i64(0).unwrap();
        assert_eq!(row[1].as_text(1).unwrap(), credential_hash(wallet));
    }
}

#[test]
fn enterprise_wallets_get_one_dynamic_qr_each() {
    let mut engine = wallets_engine("wallet_qr");
    let store = engine.store();

    assert_eq!(scalar(store, "SELECT COUNT(*) FROM qr"), 99);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM qr_dinamico"), 99);
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM qr_dinamico d JOIN qr q ON q.id_qr = d.id_qr
             WHERE q.activo = 1 AND d.tiempo_validez = 600
               AND d.monto_fijo BETWEEN 10 AND 500 AND q.codigo_qr LIKE 'QRD%'"
        ),
        99
    );
    // Each code embeds an enterprise wallet id followed by four digits.
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM qr q
             JOIN billetera_yape w ON q.codigo_qr LIKE 'QRD' || w.id_billetera || '____'
             JOIN empresa_acceso_empresarial t ON t.id_actor = w.id_actor"
        ),
        99
    );
}
