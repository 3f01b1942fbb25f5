//! End-to-end checkout: session -> order -> routing -> receipts

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use kasse_printer::{PrintError, PrintResult};
use kasse_server::api::build_app;
use kasse_server::catalog::normalize_for_search;
use kasse_server::core::{Config, ServerState};
use kasse_server::db::Storage;
use kasse_server::orders::{Payment, Settlement};
use kasse_server::printing::{JobSink, RoutingMode};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Category, CategoryCreate, CategoryType, DiningTableCreate, Printer, PrinterCreate,
    PrinterEndpoint, Product, ProductCreate, RenderConfig, Role,
};
use shared::order::ServiceType;
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

/// Collects what each printer received; printers named in `broken` fail
#[derive(Default)]
struct CollectingSink {
    printed: Mutex<Vec<(String, String)>>,
    broken: Mutex<HashSet<String>>,
}

impl CollectingSink {
    fn texts_for(&self, printer_id: &str) -> Vec<String> {
        self.printed
            .lock()
            .iter()
            .filter(|(id, _)| id == printer_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl JobSink for CollectingSink {
    async fn send(&self, printer: &Printer, text: &str, _cut: bool) -> PrintResult<()> {
        if self.broken.lock().contains(&printer.id) {
            return Err(PrintError::Connection(format!(
                "{} not reachable",
                printer.display_name
            )));
        }
        self.printed
            .lock()
            .push((printer.id.clone(), text.to_string()));
        Ok(())
    }
}

fn setup() -> (ServerState, Arc<CollectingSink>) {
    setup_with(&Config::default())
}

fn setup_with(config: &Config) -> (ServerState, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::default());
    let state = ServerState::assemble(
        config,
        Storage::open_in_memory().unwrap(),
        sink.clone(),
        None,
    );
    (state, sink)
}

fn category(state: &ServerState, name: &str, category_type: CategoryType) -> Category {
    state
        .catalog
        .create_category(CategoryCreate {
            name: name.into(),
            color: String::new(),
            category_type,
            printer_id: None,
            sort_order: None,
        })
        .unwrap()
}

fn product(state: &ServerState, name: &str, cents: i64, category: &Category) -> Product {
    state
        .catalog
        .create_product(ProductCreate {
            name: name.into(),
            price: Decimal::new(cents, 2),
            category_id: category.id.clone(),
            sort_order: None,
            has_deposit: category.category_type == CategoryType::Drinks,
            image_url: None,
        })
        .unwrap()
}

fn printer(state: &ServerState, name: &str, roles: Vec<Role>) -> Printer {
    state
        .catalog
        .create_printer(PrinterCreate {
            display_name: name.into(),
            endpoint: PrinterEndpoint::Relay { queue: name.into() },
            enabled: None,
            is_default: None,
            assigned_roles: roles,
            render: RenderConfig::default(),
        })
        .unwrap()
}

fn cash(cents: i64) -> Settlement {
    Settlement::PayNow(Payment::Cash {
        amount_paid: Decimal::new(cents, 2),
    })
}

#[tokio::test]
async fn togo_food_order_prints_receipt_and_kitchen_ticket() {
    let (state, sink) = setup();
    let food = category(&state, "Essen", CategoryType::Food);
    let bratwurst = product(&state, "Bratwurst", 450, &food);
    let kitchen = printer(&state, "Kueche", vec![Role::Food]);
    let bar = printer(&state, "Bar", vec![Role::Bar]);

    let deposit = state.catalog.deposit_per_glass().unwrap();
    state.sessions.start("t1", Role::Food, deposit);
    state
        .sessions
        .update("t1", |s| {
            s.add_product(&bratwurst, &food)?;
            s.add_product(&bratwurst, &food)?;
            s.set_service_type(ServiceType::ToGo);
            Ok(())
        })
        .unwrap();

    let outcome = state.checkout("t1", cash(1000)).await.unwrap();

    assert_eq!(outcome.order.grand_total, Decimal::new(900, 2));
    assert_eq!(outcome.order.change, Some(Decimal::new(100, 2)));
    assert_eq!(outcome.order.togo_number, Some(1));
    assert!(outcome.print.is_complete());

    let texts = sink.texts_for(&kitchen.id);
    assert_eq!(texts.len(), 2);
    let (ticket, receipt): (Vec<_>, Vec<_>) =
        texts.iter().partition(|t| t.contains("KUECHENBON"));
    assert!(ticket[0].contains("TO GO"));
    assert!(ticket[0].contains("TOGO-NR: 1"));
    assert!(ticket[0].contains("2x Bratwurst"));
    assert!(!ticket[0].contains("GESAMT"));
    assert!(receipt[0].contains("GESAMT:"));
    assert!(sink.texts_for(&bar.id).is_empty());

    // cart is empty again, the terminal stays logged in
    let session = state.sessions.get("t1").unwrap();
    assert!(session.items.is_empty());
    assert_eq!(session.deposit.new_deposits, 0);
}

#[tokio::test]
async fn failing_printers_do_not_undo_the_order() {
    let (state, sink) = setup();
    let drinks = category(&state, "Getraenke", CategoryType::Drinks);
    let pils = product(&state, "Pils", 350, &drinks);
    let left = printer(&state, "Bar 1", vec![Role::Bar]);
    let middle = printer(&state, "Bar 2", vec![Role::Bar]);
    let right = printer(&state, "Bar 3", vec![Role::Bar]);
    sink.broken.lock().extend([left.id.clone(), right.id.clone()]);

    let deposit = state.catalog.deposit_per_glass().unwrap();
    state.sessions.start("bar", Role::Bar, deposit);
    state
        .sessions
        .update("bar", |s| s.add_product(&pils, &drinks))
        .unwrap();

    let outcome = state.checkout("bar", cash(600)).await.unwrap();

    // 3,50 + 2,00 deposit
    assert_eq!(outcome.order.grand_total, Decimal::new(550, 2));
    assert_eq!(outcome.print.sent, vec!["Bar 2"]);
    assert_eq!(outcome.print.failed_printers(), vec!["Bar 1", "Bar 3"]);
    assert_eq!(sink.texts_for(&middle.id).len(), 1);

    let stored = state.orders.get_order(&outcome.order.id).unwrap();
    assert!(stored.is_paid);
    assert_eq!(stored, outcome.order);
}

#[tokio::test]
async fn deferred_orders_build_a_tab_until_settled() {
    let (state, sink) = setup();
    let drinks = category(&state, "Wein", CategoryType::Drinks);
    let riesling = product(&state, "Riesling", 550, &drinks);
    let bar = printer(&state, "Bar", vec![Role::Bar]);
    let table = state
        .catalog
        .create_table(DiningTableCreate {
            name: "7".into(),
            is_active: None,
            sort_order: None,
        })
        .unwrap();

    let deposit = state.catalog.deposit_per_glass().unwrap();
    state.sessions.start("bar", Role::Bar, deposit);
    for _ in 0..2 {
        state
            .sessions
            .update("bar", |s| {
                s.add_product(&riesling, &drinks)?;
                s.select_table(Some(table.id.clone()));
                Ok(())
            })
            .unwrap();
        let outcome = state.checkout("bar", Settlement::DeferToTab).await.unwrap();
        assert!(!outcome.order.is_paid);
        assert_eq!(outcome.order.payment_method, None);
    }

    let tab = state.orders.get_tab(&table.id).unwrap();
    assert_eq!(tab.order_ids.len(), 2);
    assert_eq!(tab.total_amount, Decimal::new(1500, 2));
    assert!(
        sink.texts_for(&bar.id)
            .iter()
            .all(|t| t.contains("Bezahlung erfolgt am Tisch"))
    );

    // a table with an open tab cannot be deleted
    let err = AppError::from(state.catalog.delete_table(&table.id).unwrap_err());
    assert_eq!(err.code, ErrorCode::TableHasOpenTab);

    let short = Payment::Cash {
        amount_paid: Decimal::new(1000, 2),
    };
    let err = AppError::from(state.orders.settle_tab(&table.id, &short).unwrap_err());
    assert_eq!(err.code, ErrorCode::InsufficientCash);
    assert!(state.orders.has_open_tab(&table.id).unwrap());

    let settled = state
        .orders
        .settle_tab(
            &table.id,
            &Payment::Cash {
                amount_paid: Decimal::new(2000, 2),
            },
        )
        .unwrap();
    assert_eq!(settled.change, Some(Decimal::new(500, 2)));
    assert!(settled.orders.iter().all(|o| o.is_paid));
    assert!(!state.orders.has_open_tab(&table.id).unwrap());
}

#[tokio::test]
async fn category_routing_prints_unpaid_receipts_when_configured() {
    for print_unpaid_receipts in [false, true] {
        let (state, sink) = setup_with(&Config {
            routing_mode: RoutingMode::Category,
            print_unpaid_receipts,
            ..Config::default()
        });
        let drinks = category(&state, "Wein", CategoryType::Drinks);
        let riesling = product(&state, "Riesling", 550, &drinks);
        let bar = printer(&state, "Bar", vec![Role::Bar]);
        let table = state
            .catalog
            .create_table(DiningTableCreate {
                name: "3".into(),
                is_active: None,
                sort_order: None,
            })
            .unwrap();

        let deposit = state.catalog.deposit_per_glass().unwrap();
        state.sessions.start("bar", Role::Bar, deposit);
        state
            .sessions
            .update("bar", |s| {
                s.add_product(&riesling, &drinks)?;
                s.select_table(Some(table.id.clone()));
                Ok(())
            })
            .unwrap();
        state.checkout("bar", Settlement::DeferToTab).await.unwrap();

        let texts = sink.texts_for(&bar.id);
        let receipts = texts
            .iter()
            .filter(|t| t.contains("Bezahlung erfolgt am Tisch"))
            .count();
        assert_eq!(texts.iter().filter(|t| t.contains("KUECHENBON")).count(), 1);
        assert_eq!(receipts, usize::from(print_unpaid_receipts));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn double_checkout_records_one_order() {
    let (state, _) = setup();
    let food = category(&state, "Essen", CategoryType::Food);
    let pommes = product(&state, "Pommes", 350, &food);
    let deposit = state.catalog.deposit_per_glass().unwrap();

    let carts = 50;
    for i in 0..carts {
        let terminal = format!("t{i}");
        state.sessions.start(&terminal, Role::Food, deposit);
        state
            .sessions
            .update(&terminal, |s| s.add_product(&pommes, &food))
            .unwrap();

        let attempts: Vec<_> = (0..2)
            .map(|_| {
                let state = state.clone();
                let terminal = terminal.clone();
                tokio::spawn(async move { state.checkout(&terminal, cash(500)).await })
            })
            .collect();
        let mut accepted = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert_eq!(e.code, ErrorCode::EmptyCheckout),
            }
        }
        assert_eq!(accepted, 1, "{terminal}");
        assert!(state.sessions.get(&terminal).unwrap().items.is_empty());
    }

    assert_eq!(state.orders.list_orders().unwrap().len(), carts);
}

#[tokio::test]
async fn http_checkout_round_trip() {
    let (state, sink) = setup();
    let drinks = category(&state, "Getraenke", CategoryType::Drinks);
    let cola = product(&state, "Cola", 300, &drinks);
    let bar = printer(&state, "Bar", vec![Role::Bar]);
    let app = build_app(state.clone());

    let call = |method: &str, uri: &str, body: serde_json::Value| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let resp = app
        .clone()
        .oneshot(call(
            "POST",
            "/api/sessions",
            serde_json::json!({"terminal_id": "t9", "role": "bar"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(call(
            "POST",
            "/api/sessions/t9/items",
            serde_json::json!({"product_id": cola.id}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let view: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(view["code"], 0);
    assert_eq!(view["data"]["can_checkout"], true);
    assert_eq!(view["data"]["deposit"]["new_deposits"], 1);

    let resp = app
        .clone()
        .oneshot(call(
            "POST",
            "/api/sessions/t9/checkout",
            serde_json::json!({
                "settlement": "pay_now",
                "payment": {"method": "CASH", "amount_paid": 4.0}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], ErrorCode::InsufficientCash.code());
    assert!(sink.texts_for(&bar.id).is_empty());

    let resp = app
        .oneshot(call(
            "POST",
            "/api/sessions/t9/checkout",
            serde_json::json!({
                "settlement": "pay_now",
                "payment": {"method": "CASH", "amount_paid": 10.0}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(sink.texts_for(&bar.id).len(), 1);
    assert_eq!(state.orders.list_orders().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (state, _) = setup();
    let resp = build_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/sessions/nobody")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn search_normalization_is_umlaut_tolerant() {
    assert_eq!(normalize_for_search("Äpfel"), normalize_for_search("Aepfel"));
    assert_eq!(normalize_for_search("Äpfel"), normalize_for_search("apfel"));
    assert_eq!(normalize_for_search("Grüße"), normalize_for_search("gruesse"));
}
