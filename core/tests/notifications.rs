//! Notification generation tests.

mod common;

use common::{build_engine, dump, fixed_clock, scalar};
use walletgen_core::{
    config::GenConfig,
    notification_phase::NotificationPhase,
    phase::GenPhase,
    rng::{PhaseSlot, RngBank},
    store::WalletStore,
};

fn assert_two_per_transaction(store: &mut WalletStore) {
    // Exactly one sent and one received notification per notified transaction.
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM (
                SELECT id_transaccion FROM notificacion_transaccion
                GROUP BY id_transaccion
                HAVING COUNT(*) <> 2
                    OR SUM(tipo_operacion = 'Envio') <> 1
                    OR SUM(tipo_operacion = 'Recepcion') <> 1)"
        ),
        0
    );
}

#[test]
fn notified_transactions_get_a_sent_and_a_received_notice() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("notify_pairs", &config);
    engine.run().unwrap();
    let store = engine.store();

    assert_two_per_transaction(store);
    let notified = scalar(store, "SELECT COUNT(DISTINCT id_transaccion) FROM notificacion_transaccion");
    assert!(notified > 0);
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM notificacion"), notified * 2);
    assert_eq!(
        scalar(
            store,
            "SELECT COUNT(*) FROM notificacion_transaccion n
             JOIN transaccion_yape t ON t.id_transaccion = n.id_transaccion
             WHERE n.monto <> t.monto OR n.resultado <> 'Exitosa'"
        ),
        0
    );
}

#[test]
fn messages_match_direction_and_amount() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("notify_messages", &config);
    engine.run().unwrap();

    let rows = engine
        .store()
        .query(
            "SELECT n.mensaje, n.estado, n.canal, l.tipo_operacion, printf('%.2f', t.monto)
             FROM notificacion n
             JOIN notificacion_transaccion l ON l.id_notificacion = n.id_notificacion
             JOIN transaccion_yape t ON t.id_transaccion = l.id_transaccion
             ORDER BY n.id_notificacion LIMIT 200",
        )
        .unwrap();
    assert!(!rows.is_empty());
    for row in rows {
        let message = row[0].as_text(0).unwrap();
        let amount = row[4].as_text(4).unwrap();
        assert_eq!(row[1].as_text(1).unwrap(), "Enviada");
        assert_eq!(row[2].as_text(2).unwrap(), "App");
        let expected = match row[3].as_text(3).unwrap().as_str() {
            "Envio" => format!("Enviaste S/ {amount}"),
            "Recepcion" => format!("Recibiste S/ {amount}"),
            other => panic!("unexpected direction {other}"),
        };
        assert_eq!(message, expected);
    }
}

#[test]
fn roughly_thirty_percent_of_transactions_are_notified() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("notify_rate", &config);
    engine.run().unwrap();
    let store = engine.store();

    let total = scalar(store, "SELECT COUNT(*) FROM transaccion_yape") as f64;
    let notified =
        scalar(store, "SELECT COUNT(DISTINCT id_transaccion) FROM notificacion_transaccion") as f64;
    let rate = notified / total;
    assert!((0.27..=0.33).contains(&rate), "notification rate {rate:.3}");
}

#[test]
fn the_cap_limits_notified_transactions() {
    let mut config = GenConfig::default_test();
    config.notifications.cap = 100;
    let mut engine = build_engine("notify_cap", &config);
    engine.run().unwrap();
    let store = engine.store();

    assert_eq!(
        scalar(store, "SELECT COUNT(DISTINCT id_transaccion) FROM notificacion_transaccion"),
        100
    );
    assert_eq!(scalar(store, "SELECT COUNT(*) FROM notificacion"), 200);
}

#[test]
fn a_rerun_only_notifies_untouched_transactions() {
    let config = GenConfig::default_test();
    let mut engine = build_engine("notify_rerun", &config);
    engine.run().unwrap();
    let before = scalar(engine.store(), "SELECT COUNT(*) FROM notificacion");

    let mut phase = NotificationPhase::new(config.clone());
    let mut store = engine.store().reopen().unwrap();
    let mut rng = RngBank::new(5).for_phase(PhaseSlot::Notifications);
    let report = phase.run(&mut store, &mut rng, &fixed_clock()).unwrap();

    let store = engine.store();
    assert!(report.rows_for("notificacion") > 0);
    assert_eq!(
        scalar(store, "SELECT COUNT(*) FROM notificacion"),
        before + report.rows_for("notificacion") as i64
    );
    assert_two_per_transaction(store);
}

#[test]
fn small_pages_sample_the_same_transactions() {
    const LINKS: &str = "SELECT * FROM notificacion_transaccion ORDER BY id_notificacion";

    let config = GenConfig::default_test();
    let mut whole = build_engine("notify_one_page", &config);
    whole.run().unwrap();

    let mut paged_config = config.clone();
    paged_config.notifications.page_size = 7;
    let mut paged = build_engine("notify_small_pages", &paged_config);
    paged.run().unwrap();

    let expected = dump(whole.store(), LINKS);
    assert!(!expected.is_empty());
    assert_eq!(dump(paged.store(), LINKS), expected);
    assert_two_per_transaction(paged.store());
}

#[test]
fn the_cap_holds_across_page_boundaries() {
    let mut config = GenConfig::default_test();
    config.notifications.cap = 100;
    config.notifications.page_size = 30;
    let mut engine = build_engine("notify_paged_cap", &config);
    engine.run().unwrap();
    let store = engine.store();

    assert_eq!(
        scalar(store, "SELECT COUNT(DISTINCT id_transaccion) FROM notificacion_transaccion"),
        100
    );
    assert_two_per_transaction(store);
}
