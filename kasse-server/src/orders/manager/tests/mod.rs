use super::*;
use shared::models::Product;


fn create_test_manager() -> OrdersManager {
    let storage = Storage::open_in_memory().unwrap();
    OrdersManager::new(storage, chrono_tz::Europe::Berlin)
}

fn add_table(manager: &OrdersManager, id: &str, name: &str, is_active: bool) {
    let table = DiningTable {
        id: id.to_string(),
        name: name.to_string(),
        is_active,
        sort_order: 0,
    };
    manager.storage.put(DINING_TABLES, id, &table).unwrap();
}

fn product(id: &str, cents: i64, has_deposit: bool) -> Product {
    Product {
        id: id.to_string(),
        name: id.to_string(),
        price: Decimal::new(cents, 2),
        category_id: "cat".to_string(),
        sort_order: 0,
        has_deposit,
        image_url: None,
    }
}

fn line(id: &str, cents: i64, quantity: u32) -> CartItem {
    CartItem {
        product: product(id, cents, false),
        quantity,
    }
}

fn deposit(new: u32, returned: u32) -> DepositInfo {
    DepositInfo {
        new_deposits: new,
        returned_deposits: returned,
        deposit_value: Decimal::new(200, 2),
    }
}

fn cash(cents: i64) -> Payment {
    Payment::Cash {
        amount_paid: Decimal::new(cents, 2),
    }
}

/// Riesling 2 × 5,50 + Pils 1 × 3,50 with one glass issued: 16,50
fn wine_and_beer() -> (Vec<CartItem>, DepositInfo) {
    (
        vec![
            line("riesling", 550, 2),
            CartItem {
                product: product("pils", 350, true),
                quantity: 1,
            },
        ],
        deposit(1, 0),
    )
}

fn request(
    items: Vec<CartItem>,
    deposit: DepositInfo,
    service_type: ServiceType,
    table_id: Option<&str>,
    settlement: Settlement,
) -> CheckoutRequest {
    CheckoutRequest {
        items,
        deposit,
        service_type,
        role: Role::Combined,
        table_id: table_id.map(str::to_string),
        settlement,
    }
}

/// Deferred service order to `table_id` whose grand total is `cents`
fn defer(manager: &OrdersManager, table_id: &str, cents: i64) -> Order {
    manager
        .checkout(request(
            vec![line("item", cents, 1)],
            deposit(0, 0),
            ServiceType::Service,
            Some(table_id),
            Settlement::DeferToTab,
        ))
        .unwrap()
}
