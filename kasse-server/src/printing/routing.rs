//! Printer routing
//!
//! Decides which printers get which layout of an order. Two strategies:
//!
//! - **Role**: every enabled printer serving the order's role prints the
//!   customer receipt; ToGo orders also go as kitchen tickets to every
//!   enabled food printer.
//! - **Category**: lines are grouped by their category's printer (falling
//!   back to the default printer) and each group prints as a kitchen ticket;
//!   the default printer also prints the customer receipt.

use serde::{Deserialize, Serialize};
use shared::models::{Category, Printer};
use shared::order::{CartItem, Order, ServiceType};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::renderer::ReceiptMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    Category,
    #[default]
    Role,
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" => Ok(RoutingMode::Role),
            "category" => Ok(RoutingMode::Category),
            other => Err(format!("unknown routing mode: {other}")),
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoutingMode::Category => "category",
            RoutingMode::Role => "role",
        })
    }
}

/// One layout of one order for one printer, not yet rendered
#[derive(Debug, Clone, PartialEq)]
pub struct PrintJob {
    pub printer: Printer,
    pub mode: ReceiptMode,
    /// Lines to print; a subset of the order for category kitchen tickets
    pub items: Vec<CartItem>,
}

/// Routing knobs that do not depend on the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteOptions {
    /// Print the customer receipt for orders deferred to a tab (category routing)
    pub customer_receipt_for_unpaid: bool,
}

/// Printer that takes unrouted lines and customer receipts
///
/// The first enabled `is_default` printer, else the first enabled one.
pub fn default_printer(printers: &[Printer]) -> Option<&Printer> {
    printers
        .iter()
        .find(|p| p.enabled && p.is_default)
        .or_else(|| printers.iter().find(|p| p.enabled))
}

/// Plan the print jobs for an order
///
/// Printers keep the order given; jobs follow it.
pub fn plan(
    order: &Order,
    printers: &[Printer],
    categories: &[Category],
    mode: RoutingMode,
    options: RouteOptions,
) -> Vec<PrintJob> {
    match mode {
        RoutingMode::Role => plan_by_role(order, printers),
        RoutingMode::Category => plan_by_category(order, printers, categories, options),
    }
}

fn plan_by_role(order: &Order, printers: &[Printer]) -> Vec<PrintJob> {
    let mut jobs: Vec<PrintJob> = printers
        .iter()
        .filter(|p| p.enabled && p.serves(order.role))
        .map(|p| PrintJob {
            printer: p.clone(),
            mode: ReceiptMode::Customer,
            items: order.items.clone(),
        })
        .collect();

    if order.service_type == ServiceType::ToGo {
        jobs.extend(
            printers
                .iter()
                .filter(|p| p.enabled && p.is_food_printer())
                .map(|p| PrintJob {
                    printer: p.clone(),
                    mode: ReceiptMode::Kitchen,
                    items: order.items.clone(),
                }),
        );
    }
    jobs
}

fn plan_by_category(
    order: &Order,
    printers: &[Printer],
    categories: &[Category],
    options: RouteOptions,
) -> Vec<PrintJob> {
    let fallback = default_printer(printers);
    let category_printer: HashMap<&str, &str> = categories
        .iter()
        .filter_map(|c| c.printer_id.as_deref().map(|p| (c.id.as_str(), p)))
        .collect();

    let resolve = |item: &CartItem| {
        category_printer
            .get(item.product.category_id.as_str())
            .and_then(|id| printers.iter().find(|p| p.id == *id && p.enabled))
            .or(fallback)
    };

    // groups in order of first appearance
    let mut groups: Vec<(&Printer, Vec<CartItem>)> = Vec::new();
    for item in &order.items {
        let Some(target) = resolve(item) else {
            continue;
        };
        match groups.iter().position(|(p, _)| p.id == target.id) {
            Some(idx) => groups[idx].1.push(item.clone()),
            None => groups.push((target, vec![item.clone()])),
        }
    }

    let mut jobs: Vec<PrintJob> = groups
        .into_iter()
        .map(|(printer, items)| PrintJob {
            printer: printer.clone(),
            mode: ReceiptMode::Kitchen,
            items,
        })
        .collect();

    if let Some(printer) = fallback
        && (order.is_paid || options.customer_receipt_for_unpaid)
    {
        jobs.push(PrintJob {
            printer: printer.clone(),
            mode: ReceiptMode::Customer,
            items: order.items.clone(),
        });
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::models::{CategoryType, PrinterEndpoint, Product, RenderConfig, Role};
    use shared::order::DepositInfo;

    fn printer(id: &str, roles: Vec<Role>, is_default: bool) -> Printer {
        Printer {
            id: id.into(),
            display_name: id.into(),
            endpoint: PrinterEndpoint::Relay { queue: id.into() },
            enabled: true,
            is_default,
            assigned_roles: roles,
            render: RenderConfig::default(),
        }
    }

    fn category(id: &str, printer_id: Option<&str>) -> Category {
        Category {
            id: id.into(),
            name: id.into(),
            color: String::new(),
            category_type: CategoryType::Food,
            printer_id: printer_id.map(String::from),
            sort_order: 0,
        }
    }

    fn item(name: &str, category_id: &str) -> CartItem {
        CartItem {
            product: Product {
                id: name.into(),
                name: name.into(),
                price: Decimal::ONE,
                category_id: category_id.into(),
                sort_order: 0,
                has_deposit: false,
                image_url: None,
            },
            quantity: 1,
        }
    }

    fn order(role: Role, service_type: ServiceType, items: Vec<CartItem>) -> Order {
        Order {
            id: "o".into(),
            items,
            deposit: DepositInfo::new(Decimal::TWO),
            service_type,
            payment_method: None,
            items_total: Decimal::ZERO,
            deposit_total: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            amount_paid: None,
            change: None,
            created_at: Utc::now(),
            role,
            table_id: None,
            table_name: None,
            togo_number: None,
            is_paid: true,
        }
    }

    fn targets(jobs: &[PrintJob]) -> Vec<(&str, ReceiptMode)> {
        jobs.iter()
            .map(|j| (j.printer.id.as_str(), j.mode))
            .collect()
    }

    #[test]
    fn test_routing_mode_parse() {
        assert_eq!("Category".parse::<RoutingMode>(), Ok(RoutingMode::Category));
        assert_eq!(" role ".parse::<RoutingMode>(), Ok(RoutingMode::Role));
        assert!("printer".parse::<RoutingMode>().is_err());
        assert_eq!(RoutingMode::default(), RoutingMode::Role);
    }

    #[test]
    fn test_role_routing() {
        let printers = vec![
            printer("bar", vec![Role::Bar], false),
            printer("kitchen", vec![Role::Food], false),
            printer("all", vec![Role::Combined, Role::Bar], false),
        ];
        let o = order(Role::Bar, ServiceType::Service, vec![item("Pils", "drinks")]);
        let jobs = plan(&o, &printers, &[], RoutingMode::Role, RouteOptions::default());
        assert_eq!(
            targets(&jobs),
            vec![("bar", ReceiptMode::Customer), ("all", ReceiptMode::Customer)]
        );
    }

    #[test]
    fn test_admin_prints_on_combined_printers() {
        let printers = vec![
            printer("bar", vec![Role::Bar], false),
            printer("all", vec![Role::Combined], false),
        ];
        let o = order(Role::Admin, ServiceType::Service, vec![item("Pils", "drinks")]);
        let jobs = plan(&o, &printers, &[], RoutingMode::Role, RouteOptions::default());
        assert_eq!(targets(&jobs), vec![("all", ReceiptMode::Customer)]);
    }

    #[test]
    fn test_togo_adds_kitchen_jobs() {
        let mut off = printer("kitchen2", vec![Role::Food], false);
        off.enabled = false;
        let printers = vec![
            printer("bar", vec![Role::Bar], false),
            printer("kitchen", vec![Role::Food], false),
            off,
        ];
        let o = order(Role::Bar, ServiceType::ToGo, vec![item("Pommes", "food")]);
        let jobs = plan(&o, &printers, &[], RoutingMode::Role, RouteOptions::default());
        assert_eq!(
            targets(&jobs),
            vec![("bar", ReceiptMode::Customer), ("kitchen", ReceiptMode::Kitchen)]
        );
    }

    #[test]
    fn test_category_routing_groups_lines() {
        let printers = vec![
            printer("main", vec![], true),
            printer("grill", vec![], false),
            printer("fryer", vec![], false),
        ];
        let categories = vec![
            category("wurst", Some("grill")),
            category("pommes", Some("fryer")),
            category("wein", None),
        ];
        let o = order(
            Role::Combined,
            ServiceType::Service,
            vec![
                item("Bratwurst", "wurst"),
                item("Pommes", "pommes"),
                item("Currywurst", "wurst"),
                item("Riesling", "wein"),
            ],
        );
        let jobs = plan(&o, &printers, &categories, RoutingMode::Category, RouteOptions::default());
        assert_eq!(
            targets(&jobs),
            vec![
                ("grill", ReceiptMode::Kitchen),
                ("fryer", ReceiptMode::Kitchen),
                ("main", ReceiptMode::Kitchen),
                ("main", ReceiptMode::Customer),
            ]
        );
        let grill: Vec<&str> = jobs[0].items.iter().map(|i| i.product.name.as_str()).collect();
        assert_eq!(grill, vec!["Bratwurst", "Currywurst"]);
        assert_eq!(jobs[3].items.len(), 4);
    }

    #[test]
    fn test_disabled_category_printer_falls_back() {
        let mut grill = printer("grill", vec![], false);
        grill.enabled = false;
        let printers = vec![printer("main", vec![], true), grill];
        let categories = vec![category("wurst", Some("grill"))];
        let o = order(Role::Food, ServiceType::Service, vec![item("Bratwurst", "wurst")]);
        let jobs = plan(&o, &printers, &categories, RoutingMode::Category, RouteOptions::default());
        assert_eq!(
            targets(&jobs),
            vec![("main", ReceiptMode::Kitchen), ("main", ReceiptMode::Customer)]
        );
    }

    #[test]
    fn test_unpaid_customer_receipt_suppressed() {
        let printers = vec![printer("main", vec![], true)];
        let mut o = order(Role::Bar, ServiceType::Service, vec![item("Pils", "x")]);
        o.is_paid = false;

        let jobs = plan(&o, &printers, &[], RoutingMode::Category, RouteOptions::default());
        assert_eq!(targets(&jobs), vec![("main", ReceiptMode::Kitchen)]);

        let opts = RouteOptions {
            customer_receipt_for_unpaid: true,
        };
        let jobs = plan(&o, &printers, &[], RoutingMode::Category, opts);
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_no_enabled_printers_no_jobs() {
        let mut p = printer("main", vec![Role::Bar], true);
        p.enabled = false;
        let o = order(Role::Bar, ServiceType::ToGo, vec![item("Pils", "x")]);
        for mode in [RoutingMode::Role, RoutingMode::Category] {
            assert!(plan(&o, std::slice::from_ref(&p), &[], mode, RouteOptions::default()).is_empty());
        }
    }

    #[test]
    fn test_default_printer_choice() {
        let mut a = printer("a", vec![], true);
        a.enabled = false;
        let b = printer("b", vec![], false);
        let c = printer("c", vec![], true);
        assert_eq!(default_printer(&[a.clone(), b.clone(), c]).unwrap().id, "c");
        assert_eq!(default_printer(&[a, b]).unwrap().id, "b");
    }
}
