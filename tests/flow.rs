//! Transaction Flow Integration Tests
//!
//! Tests for per-step commit and rollback, halting on failure, and how values
//! move between steps through the result context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pay_products::adapters::GatewayError;
use pay_products::core::{FlowError, FlowOutcome, ResultContext, Step, TransactionFlow, ValueKind};
use pay_products::domain::{Payment, Product};
use pay_products::store::{Database, PaymentDao, ProductDao};
use rusqlite::Transaction;
use tempfile::TempDir;

fn database(temp_dir: &TempDir) -> Database {
    let database = Database::new(temp_dir.path().join("products.db"));
    database.migrate().unwrap();
    database
}

fn product(external_id: &str) -> Product {
    Product::new(
        1,
        external_id.to_string(),
        format!("Product {}", external_id),
        1050,
        "token".to_string(),
    )
}

fn count(database: &Database, table: &str) -> i64 {
    database
        .connect()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

fn persist_product(external_id: &'static str) -> Step<'static> {
    Step::transactional(
        format!("persist_{}", external_id),
        move |tx: &Transaction<'_>, _context: &ResultContext| {
            let mut product = product(external_id);
            ProductDao::persist(tx, &mut product)?;
            Ok(product)
        },
    )
}

#[tokio::test]
async fn test_all_steps_complete_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);

    let record_payment = Step::transactional(
        "record_payment",
        |tx: &Transaction<'_>, context: &ResultContext| {
            let product = context.get::<Product>()?.clone();
            let mut payment = Payment::new("pay-1".to_string(), product);
            PaymentDao::persist(tx, &mut payment)?;
            Ok(payment)
        },
    );

    let run = TransactionFlow::new(database.connect().unwrap())
        .append(persist_product("A"))
        .append(record_payment)
        .run()
        .await;

    assert!(run.is_completed());
    assert_eq!(run.steps_executed(), 2);
    assert_eq!(run.result::<Product>().unwrap().external_id, "A");

    let payment = run.into_result::<Payment>().unwrap();
    assert_eq!(payment.product.external_id, "A");
    assert!(payment.id.is_some());
    assert_eq!(count(&database, "payments"), 1);
}

#[tokio::test]
async fn test_transactional_failure_rolls_back_and_halts() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);
    let later_step_ran = Arc::new(AtomicBool::new(false));

    let failing = Step::transactional(
        "persist_then_fail",
        |tx: &Transaction<'_>, _context: &ResultContext| {
            ProductDao::persist(tx, &mut product("B"))?;
            Err::<Product, _>(FlowError::not_found("product", 99))
        },
    );

    let flag = Arc::clone(&later_step_ran);
    let never_runs = Step::non_transactional("never_runs", move |_context: &ResultContext| {
        async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, FlowError>(product("C"))
        }
    });

    let run = TransactionFlow::new(database.connect().unwrap())
        .append(persist_product("A"))
        .append(failing)
        .append(never_runs)
        .run()
        .await;

    assert!(!run.is_completed());
    assert_eq!(run.halted_step(), Some("persist_then_fail"));
    assert_eq!(run.steps_executed(), 2);
    assert!(matches!(
        run.outcome(),
        FlowOutcome::Halted { index: 1, error: FlowError::NotFound { .. }, .. }
    ));
    assert!(!later_step_ran.load(Ordering::SeqCst));

    // A committed before the failure; B was rolled back with its step
    let conn = database.connect().unwrap();
    assert!(ProductDao::find_by_external_id(&conn, "A").unwrap().is_some());
    assert!(ProductDao::find_by_external_id(&conn, "B").unwrap().is_none());
}

#[tokio::test]
async fn test_non_transactional_failure_keeps_earlier_commits() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);

    let unreachable = Step::non_transactional("call_gateway", |_context: &ResultContext| async {
        Err::<Payment, _>(FlowError::from(GatewayError::Transport(
            "connection refused".to_string(),
        )))
    });

    let run = TransactionFlow::new(database.connect().unwrap())
        .append(persist_product("A"))
        .append(unreachable)
        .run()
        .await;

    assert!(matches!(run.failure(), Some(FlowError::Downstream(_))));
    assert_eq!(run.result::<Product>().unwrap().external_id, "A");
    assert_eq!(count(&database, "products"), 1);
}

#[tokio::test]
async fn test_later_failure_does_not_undo_earlier_step() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);

    // Same external id twice: the second insert violates the unique index
    let run = TransactionFlow::new(database.connect().unwrap())
        .append(persist_product("A"))
        .append(persist_product("A"))
        .run()
        .await;

    assert_eq!(run.halted_step(), Some("persist_A"));
    assert!(matches!(run.failure(), Some(FlowError::Transaction(_))));
    assert_eq!(count(&database, "products"), 1);
}

#[tokio::test]
async fn test_last_write_wins_per_kind() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);

    let first = Step::transactional("first", |_tx: &Transaction<'_>, _context: &ResultContext| {
        Ok(product("first"))
    });
    let second = Step::non_transactional("second", |context: &ResultContext| {
        let seen = context.get::<Product>().map(|p| p.external_id.clone());
        async move {
            assert_eq!(seen.unwrap(), "first");
            Ok::<_, FlowError>(product("second"))
        }
    });

    let run = TransactionFlow::new(database.connect().unwrap())
        .append(first)
        .append(second)
        .run()
        .await;

    // Reading is idempotent and sees only the latest value
    assert_eq!(run.result::<Product>().unwrap().external_id, "second");
    assert_eq!(run.result::<Product>().unwrap().external_id, "second");
    assert_eq!(run.context().len(), 1);
    assert_eq!(run.into_result::<Product>().unwrap().external_id, "second");
}

#[tokio::test]
async fn test_missing_context_value_halts_flow() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);

    let needs_payment = Step::transactional(
        "needs_payment",
        |_tx: &Transaction<'_>, context: &ResultContext| {
            let payment = context.get::<Payment>()?.clone();
            Ok(payment)
        },
    );

    let run = TransactionFlow::new(database.connect().unwrap())
        .append(persist_product("A"))
        .append(needs_payment)
        .run()
        .await;

    assert!(matches!(
        run.failure(),
        Some(FlowError::MissingContextValue(ValueKind::Payment))
    ));
    assert!(run.result::<Payment>().is_err());
    assert_eq!(count(&database, "products"), 1);
}

#[tokio::test]
async fn test_empty_flow_completes() {
    let temp_dir = TempDir::new().unwrap();
    let database = database(&temp_dir);

    let flow = TransactionFlow::new(database.connect().unwrap());
    assert!(flow.is_empty());

    let run = flow.run().await;
    assert!(run.is_completed());
    assert_eq!(run.steps_executed(), 0);
    assert!(run.context().is_empty());
    assert!(matches!(
        run.into_result::<Product>(),
        Err(FlowError::MissingContextValue(ValueKind::Product))
    ));
}
