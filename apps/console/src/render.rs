//! Plain-text rendering: aligned tables and labels.

use chrono::{DateTime, Local, Utc};
use lavapro_core::stats::{ChangeType, DashboardStats};
use lavapro_core::{Customer, Order, Service, ViewState};
use std::fmt::Write;

/// A text table with left-aligned columns.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<const N: usize>(headers: [&str; N]) -> Self {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn view_label(view: ViewState) -> &'static str {
    match view {
        ViewState::Unauthenticated => "signed out",
        ViewState::Loading => "loading",
        ViewState::Admin => "admin dashboard",
        ViewState::Customer => "customer portal",
        ViewState::Delivery => "delivery panel",
        ViewState::UnknownRole => "no role assigned",
    }
}

pub fn date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

pub fn orders_table(orders: &[&Order]) -> String {
    let mut table = Table::new(["#", "DATE", "CUSTOMER", "SERVICE", "STATUS", "TOTAL"]);
    for order in orders {
        table.row(vec![
            order.id.to_string(),
            date(order.created_at),
            order.customer_name.clone(),
            order.service_name.clone(),
            order.status.label_pt().to_string(),
            order.total_price.to_string(),
        ]);
    }
    table.render()
}

pub fn deliveries_table(orders: &[&Order]) -> String {
    let mut table = Table::new(["#", "CUSTOMER", "ADDRESS", "STATUS", "TOTAL"]);
    for order in orders {
        table.row(vec![
            order.id.to_string(),
            order.customer_name.clone(),
            order.delivery.address.clone().unwrap_or_else(|| "-".to_string()),
            order.status.label_pt().to_string(),
            order.total_price.to_string(),
        ]);
    }
    table.render()
}

pub fn customers_table(customers: &[Customer]) -> String {
    let mut table = Table::new(["#", "NAME", "EMAIL", "PHONE", "ADDRESS"]);
    for c in customers {
        table.row(vec![
            c.id.to_string(),
            c.name.clone(),
            c.email.clone().unwrap_or_default(),
            c.phone.clone().unwrap_or_default(),
            c.address.clone().unwrap_or_default(),
        ]);
    }
    table.render()
}

pub fn services_table(services: &[Service]) -> String {
    let mut table = Table::new(["#", "SERVICE", "PRICE", "DESCRIPTION"]);
    for s in services {
        table.row(vec![
            s.id.to_string(),
            s.name.clone(),
            s.price.to_string(),
            s.description.clone(),
        ]);
    }
    table.render()
}

/// Stat cards, status counts and the monthly revenue chart.
pub fn stats(stats: &DashboardStats) -> String {
    let mut out = String::new();

    let mut cards = Table::new(["", "VALUE", "CHANGE"]);
    for card in &stats.cards {
        let arrow = match card.change_type {
            ChangeType::Increase => "▲",
            ChangeType::Decrease => "▼",
        };
        cards.row(vec![
            card.title.clone(),
            card.value.clone(),
            format!("{} {}", arrow, card.change),
        ]);
    }
    out.push_str(&cards.render());
    out.push('\n');

    let mut counts = Table::new(["STATUS", "ORDERS"]);
    for count in &stats.status_counts {
        counts.row(vec![count.status.label_pt().to_string(), count.count.to_string()]);
    }
    out.push_str(&counts.render());
    out.push('\n');

    let peak = stats
        .monthly_revenue
        .iter()
        .map(|m| m.revenue.centavos())
        .max()
        .unwrap_or(0);
    for month in &stats.monthly_revenue {
        let bar = bar_width(month.revenue.centavos(), peak, 30);
        let _ = writeln!(
            out,
            "{:<4} {:<30} {}",
            month.label,
            "█".repeat(bar),
            month.revenue
        );
    }
    out
}

fn bar_width(value: i64, peak: i64, max: usize) -> usize {
    if peak <= 0 || value <= 0 {
        return 0;
    }
    ((value as f64 / peak as f64) * max as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_columns() {
        let mut table = Table::new(["#", "NAME"]);
        table.row(vec!["1".to_string(), "Ana Paula".to_string()]);
        table.row(vec!["42".to_string(), "Bruno".to_string()]);

        let text = table.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#   NAME");
        assert_eq!(lines[1], "--  ---------");
        assert_eq!(lines[2], "1   Ana Paula");
        assert_eq!(lines[3], "42  Bruno");
    }

    #[test]
    fn test_table_counts_characters_not_bytes() {
        let mut table = Table::new(["SERVIÇO", "X"]);
        table.row(vec!["Edredom".to_string(), "1".to_string()]);
        let text = table.render();
        assert_eq!(text.lines().next().unwrap(), "SERVIÇO  X");
        assert_eq!(text.lines().nth(2).unwrap(), "Edredom  1");
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar_width(0, 100, 30), 0);
        assert_eq!(bar_width(100, 100, 30), 30);
        assert_eq!(bar_width(50, 100, 30), 15);
        assert_eq!(bar_width(10, 0, 30), 0);
    }
}
