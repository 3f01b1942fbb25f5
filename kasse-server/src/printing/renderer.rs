//! Receipt renderer
//!
//! Turns orders into printer-ready text. Every layout is built with the
//! printer's own line width and passed through the sanitizer of its render
//! settings, so the result can go to a transport unchanged.
//!
//! Template text is written in ASCII digraphs ("Rueckgeld") so receipts read
//! the same whether or not a printer transliterates.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use kasse_printer::{FEED_LINES_BEFORE_CUT, SanitizeOptions, TextBuilder, item_lines, sanitize};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{Printer, RenderConfig};
use shared::money::{format_amount, format_eur};
use shared::order::{CartItem, Order, PaymentMethod, ServiceType};

use crate::core::config::VenueInfo;
use crate::orders::DailySummary;

/// Which layout to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptMode {
    /// Full receipt with prices, deposit and payment
    Customer,
    /// What to prepare: items and table / ToGo identity, no money
    Kitchen,
}

fn sanitize_options(config: &RenderConfig) -> SanitizeOptions {
    SanitizeOptions {
        transliterate_german: config.transliterate_german,
        replace_euro: config.replace_euro,
    }
}

/// Receipt renderer
#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    venue: VenueInfo,
    timezone: Tz,
}

impl ReceiptRenderer {
    pub fn new(venue: VenueInfo, timezone: Tz) -> Self {
        Self { venue, timezone }
    }

    fn local(&self, at: DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.timezone)
    }

    /// Render an order with all its lines
    pub fn render(&self, order: &Order, mode: ReceiptMode, config: &RenderConfig) -> String {
        self.render_items(order, &order.items, mode, config)
    }

    /// Render an order restricted to `items`
    ///
    /// Category routing sends each kitchen printer only its own lines.
    pub fn render_items(
        &self,
        order: &Order,
        items: &[CartItem],
        mode: ReceiptMode,
        config: &RenderConfig,
    ) -> String {
        let mut b = TextBuilder::new(config.line_width());

        if let Some(number) = order.togo_number {
            b.banner(&format!("TOGO-NR: {number}"));
            b.blank();
        }

        let opts = sanitize_options(config);
        match mode {
            ReceiptMode::Customer => self.customer_body(&mut b, order, items, opts),
            ReceiptMode::Kitchen => self.kitchen_body(&mut b, order, items, opts),
        }

        b.feed(FEED_LINES_BEFORE_CUT);
        sanitize(&b.finalize(), opts)
    }

    fn date_lines(&self, b: &mut TextBuilder, at: DateTime<Utc>) {
        let local = self.local(at);
        b.line_lr("Datum:", &local.format("%d.%m.%Y").to_string());
        b.line_lr("Uhrzeit:", &local.format("%H:%M").to_string());
    }

    fn customer_body(
        &self,
        b: &mut TextBuilder,
        order: &Order,
        items: &[CartItem],
        opts: SanitizeOptions,
    ) {
        let width = b.width();

        b.text_center(&sanitize(&self.venue.name, opts));
        if !self.venue.subtitle.is_empty() {
            b.text_center(&sanitize(&self.venue.subtitle, opts));
        }
        b.blank();
        b.dash_sep();
        self.date_lines(b, order.created_at);
        b.line_lr("Station:", order.role.receipt_label());
        b.write_line(&sanitize(&service_label(order), opts));
        b.dash_sep();

        for item in items {
            b.write_lines(item_lines(
                &format!("{}x ", item.quantity),
                &sanitize(&item.product.name, opts),
                &format_amount(item.line_total()),
                width,
            ));
        }

        let deposit = &order.deposit;
        if deposit.new_deposits > 0 || deposit.returned_deposits > 0 {
            b.dash_sep();
            b.write_line("Pfand:");
            if deposit.new_deposits > 0 {
                b.line_lr(
                    &format!("  Neu: {} Glaeser", deposit.new_deposits),
                    &format_amount(Decimal::from(deposit.new_deposits) * deposit.deposit_value),
                );
            }
            if deposit.returned_deposits > 0 {
                b.line_lr(
                    &format!("  Zurueck: {} Glaeser", deposit.returned_deposits),
                    &format_amount(
                        -(Decimal::from(deposit.returned_deposits) * deposit.deposit_value),
                    ),
                );
            }
            b.line_lr("  Pfand-Saldo:", &format_amount(order.deposit_total));
        }

        b.eq_sep();
        b.line_lr("Summe Artikel:", &format_amount(order.items_total));
        if !order.deposit_total.is_zero() {
            b.line_lr("Pfand:", &format_amount(order.deposit_total));
        }
        b.line_lr("GESAMT:", &format_eur(order.grand_total));
        b.eq_sep();

        match (order.is_paid, order.payment_method) {
            (true, Some(method)) => {
                b.line_lr("Zahlungsart:", method.receipt_label());
                if method == PaymentMethod::Cash {
                    if let Some(paid) = order.amount_paid {
                        b.line_lr("Gegeben:", &format_amount(paid));
                    }
                    if let Some(change) = order.change {
                        b.line_lr("Rueckgeld:", &format_amount(change));
                    }
                }
            }
            _ => {
                b.write_line("Bezahlung erfolgt am Tisch");
            }
        }

        b.blank();
        b.text_center("Vielen Dank!");
        b.text_center("Wir freuen uns auf Ihren");
        b.text_center("naechsten Besuch!");
    }

    fn kitchen_body(
        &self,
        b: &mut TextBuilder,
        order: &Order,
        items: &[CartItem],
        opts: SanitizeOptions,
    ) {
        let width = b.width();

        b.text_center("KUECHENBON");
        b.boxed(&sanitize(&kitchen_identity(order), opts));
        self.date_lines(b, order.created_at);
        b.dash_sep();
        for item in items {
            b.write_lines(item_lines(
                &format!("{}x ", item.quantity),
                &sanitize(&item.product.name, opts),
                "",
                width,
            ));
        }
        b.dash_sep();
    }

    /// Test page for a printer
    pub fn render_test_page(&self, printer: &Printer, now: DateTime<Utc>) -> String {
        let config = &printer.render;
        let opts = sanitize_options(config);
        let local = self.local(now);
        let mut b = TextBuilder::new(config.line_width());

        b.banner("TESTDRUCK");
        b.blank();
        b.line_lr("Drucker:", &sanitize(&printer.display_name, opts));
        b.line_lr("Queue:", &sanitize(&printer.endpoint.label(), opts));
        b.line_lr("Datum:", &local.format("%d.%m.%Y").to_string());
        b.line_lr("Zeit:", &local.format("%H:%M:%S").to_string());
        b.line_lr("Breite:", &format!("{} Zeichen", config.line_width()));
        b.dash_sep();
        b.write_line("Zeichentest:");
        b.write_line("ÄÖÜ äöü ß € @ # &");
        b.write_line("0123456789");
        b.dash_sep();
        b.text_center("Druck erfolgreich!");
        b.feed(FEED_LINES_BEFORE_CUT);

        sanitize(&b.finalize(), opts)
    }

    /// Daily closing report (Tagesabschluss)
    pub fn render_daily_summary(&self, summary: &DailySummary, config: &RenderConfig) -> String {
        let opts = sanitize_options(config);
        let mut b = TextBuilder::new(config.line_width());

        b.banner("TAGESABSCHLUSS");
        b.text_center(&sanitize(&self.venue.name, opts));
        b.text_center(&summary.date.format("%d.%m.%Y").to_string());
        b.blank();

        b.write_line("UEBERSICHT");
        b.dash_sep();
        b.line_lr("Anzahl Bestellungen:", &summary.order_count.to_string());
        b.line_lr("Summe Artikel:", &format_amount(summary.items_total));
        b.line_lr("Gesamtumsatz:", &format_eur(summary.revenue));
        b.blank();

        b.write_line("ZAHLUNGSARTEN");
        b.dash_sep();
        b.line_lr(
            &format!("Bar ({}x):", summary.cash.count),
            &format_amount(summary.cash.total),
        );
        b.line_lr(
            &format!("Karte ({}x):", summary.card.count),
            &format_amount(summary.card.total),
        );
        if summary.open.count > 0 {
            b.line_lr(
                &format!("Offen ({}x):", summary.open.count),
                &format_amount(summary.open.total),
            );
        }
        b.blank();

        b.write_line("PFAND");
        b.dash_sep();
        b.line_lr("Pfand-Saldo:", &format_amount(summary.deposit_total));
        b.eq_sep();
        b.feed(FEED_LINES_BEFORE_CUT);

        sanitize(&b.finalize(), opts)
    }
}

fn service_label(order: &Order) -> String {
    match (order.service_type, order.table_name.as_deref()) {
        (ServiceType::ToGo, _) => "TO GO".to_string(),
        (ServiceType::Service, Some(table)) => format!("SERVICE - Tisch {table}"),
        (ServiceType::Service, None) => "SERVICE".to_string(),
    }
}

fn kitchen_identity(order: &Order) -> String {
    match (order.service_type, order.table_name.as_deref()) {
        (ServiceType::ToGo, _) => "TO GO".to_string(),
        (ServiceType::Service, Some(table)) => format!("TISCH {}", table.to_uppercase()),
        (ServiceType::Service, None) => "SERVICE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::{FontMode, Product, Role};
    use shared::order::DepositInfo;

    fn line(name: &str, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: name.to_lowercase(),
                name: name.to_string(),
                price: Decimal::new(cents, 2),
                category_id: "c".into(),
                sort_order: 0,
                has_deposit: false,
                image_url: None,
            },
            quantity,
        }
    }

    fn order() -> Order {
        Order {
            id: "o-1".into(),
            items: vec![line("Riesling 0,25l", 550, 2), line("Pils 0,3l", 350, 1)],
            deposit: DepositInfo {
                new_deposits: 1,
                returned_deposits: 0,
                deposit_value: Decimal::new(200, 2),
            },
            service_type: ServiceType::Service,
            payment_method: Some(PaymentMethod::Cash),
            items_total: Decimal::new(1450, 2),
            deposit_total: Decimal::new(200, 2),
            grand_total: Decimal::new(1650, 2),
            amount_paid: Some(Decimal::new(2000, 2)),
            change: Some(Decimal::new(350, 2)),
            // 19:05 in Berlin (CEST)
            created_at: Utc.with_ymd_and_hms(2026, 8, 15, 17, 5, 0).unwrap(),
            role: Role::Bar,
            table_id: Some("t5".into()),
            table_name: Some("5".into()),
            togo_number: None,
            is_paid: true,
        }
    }

    fn renderer() -> ReceiptRenderer {
        ReceiptRenderer::new(
            VenueInfo {
                name: "Weinfest".into(),
                subtitle: "Am Marktplatz".into(),
            },
            chrono_tz::Europe::Berlin,
        )
    }

    fn narrow() -> RenderConfig {
        RenderConfig {
            chars_per_line: 32,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_customer_receipt_content() {
        let text = renderer().render(&order(), ReceiptMode::Customer, &narrow());
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines.contains(&"SERVICE - Tisch 5"));
        assert!(lines.contains(&"Datum:                15.08.2026"));
        assert!(lines.contains(&"Uhrzeit:                   19:05"));
        assert!(lines.contains(&"2x Riesling 0,25l          11,00"));
        assert!(lines.contains(&"  Neu: 1 Glaeser            2,00"));
        assert!(lines.contains(&"GESAMT:                16,50 EUR"));
        assert!(lines.contains(&"Rueckgeld:                  3,50"));
        assert!(!text.contains("Zurueck"));
        assert!(lines.iter().all(|l| l.len() <= 32));
    }

    #[test]
    fn test_customer_receipt_ends_with_feed() {
        let text = renderer().render(&order(), ReceiptMode::Customer, &narrow());
        assert!(text.ends_with("naechsten Besuch!\n\n\n\n"));
    }

    #[test]
    fn test_kitchen_ticket_has_no_money() {
        let text = renderer().render(&order(), ReceiptMode::Kitchen, &narrow());
        assert!(text.contains("KUECHENBON"));
        assert!(text.contains("*           TISCH 5            *"));
        assert!(text.contains("2x Riesling 0,25l\n"));
        assert!(!text.contains("11,00"));
        assert!(!text.contains("Pfand"));
        assert!(!text.contains("GESAMT"));
        assert!(!text.contains("Zahlungsart"));
    }

    #[test]
    fn test_togo_banner_comes_first() {
        let mut o = order();
        o.service_type = ServiceType::ToGo;
        o.table_id = None;
        o.table_name = None;
        o.togo_number = Some(42);

        for mode in [ReceiptMode::Customer, ReceiptMode::Kitchen] {
            let text = renderer().render(&o, mode, &narrow());
            let mut lines = text.lines();
            assert_eq!(lines.next(), Some("=".repeat(32).as_str()));
            assert_eq!(lines.next().map(str::trim), Some("TOGO-NR: 42"));
            assert!(text.contains("TO GO"));
        }
    }

    #[test]
    fn test_deferred_order_is_paid_at_table() {
        let mut o = order();
        o.is_paid = false;
        o.payment_method = None;
        o.amount_paid = None;
        o.change = None;
        let text = renderer().render(&o, ReceiptMode::Customer, &narrow());
        assert!(text.contains("Bezahlung erfolgt am Tisch"));
        assert!(!text.contains("Zahlungsart"));
    }

    #[test]
    fn test_returned_glasses_credit() {
        let mut o = order();
        o.deposit.returned_deposits = 3;
        o.deposit_total = Decimal::new(-400, 2);
        o.grand_total = Decimal::new(1050, 2);
        let text = renderer().render(&o, ReceiptMode::Customer, &narrow());
        assert!(text.contains("  Zurueck: 3 Glaeser       -6,00"));
        assert!(text.contains("  Pfand-Saldo:             -4,00"));
    }

    #[test]
    fn test_long_names_wrap_within_width() {
        let mut o = order();
        o.items = vec![line("Grauburgunder Spätlese trocken vom Kaiserstuhl", 780, 1)];
        let config = RenderConfig {
            chars_per_line: 32,
            font_mode: FontMode::DoubleWidth,
            ..RenderConfig::default()
        };
        let text = renderer().render(&o, ReceiptMode::Customer, &config);
        assert!(text.lines().all(|l| l.len() <= 16));
        assert!(text.contains("Spaetlese"));
    }

    #[test]
    fn test_output_respects_sanitize_settings() {
        let mut o = order();
        o.items = vec![line("Grillkäse", 650, 1)];
        let config = RenderConfig {
            transliterate_german: false,
            replace_euro: false,
            ..narrow()
        };
        let text = renderer().render(&o, ReceiptMode::Customer, &config);
        assert!(text.contains("Grillkse"));
        assert!(text.is_ascii());
        assert!(!text.contains("EUR"));
    }

    #[test]
    fn test_daily_summary_layout() {
        let summary = DailySummary::from_orders(
            chrono::NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(),
            chrono_tz::Europe::Berlin,
            [&order()],
        );
        let text = renderer().render_daily_summary(&summary, &narrow());
        assert!(text.contains("TAGESABSCHLUSS"));
        assert!(text.contains("Anzahl Bestellungen:           1"));
        assert!(text.contains("Bar (1x):                  16,50"));
        assert!(text.contains("Karte (0x):                 0,00"));
        assert!(!text.contains("Offen"));
    }

    #[test]
    fn test_test_page() {
        let printer: Printer = serde_json::from_value(serde_json::json!({
            "id": "p",
            "display_name": "Bar vorne",
            "endpoint": {"transport": "relay", "queue": "bar_front"}
        }))
        .unwrap();
        let text = renderer().render_test_page(&printer, Utc::now());
        assert!(text.contains("TESTDRUCK"));
        assert!(text.contains("bar_front"));
        assert!(text.contains("AeOeUe aeoeue ss EUR @ # &"));
        assert!(text.is_ascii());
    }

    #[test]
    fn test_transliterated_names_keep_width() {
        let mut printer: Printer = serde_json::from_value(serde_json::json!({
            "id": "p",
            "display_name": "Küche Süd Öfen",
            "endpoint": {"transport": "relay", "queue": "kueche"}
        }))
        .unwrap();
        printer.render = narrow();
        let page = renderer().render_test_page(&printer, Utc::now());
        assert!(page.lines().any(|l| l == "Drucker:       Kueche Sued Oefen"));
        assert!(page.lines().all(|l| l.len() <= 32), "{page}");

        let fest = ReceiptRenderer::new(
            VenueInfo {
                name: "Süßes Fest".into(),
                subtitle: String::new(),
            },
            chrono_tz::Europe::Berlin,
        );
        let summary = DailySummary::from_orders(
            chrono::NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(),
            chrono_tz::Europe::Berlin,
            [&order()],
        );
        let text = fest.render_daily_summary(&summary, &narrow());
        let centered = format!("{}Suesses Fest", " ".repeat(10));
        assert!(text.lines().any(|l| l == centered), "{text}");
    }
}
