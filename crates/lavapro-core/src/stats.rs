//! # Dashboard Statistics
//!
//! Revenue, ticket and monthly figures computed from a fetched order set.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders ──┬──► filter(delivered) ──► Σ total_price ──► total_revenue   │
//! │           │                                    │                        │
//! │           │                                    └──► ÷ completed_count   │
//! │           │                                         ──► average_ticket  │
//! │           ├──► distinct(customer_id | folded name) ──► distinct_customers│
//! │           ├──► count by status ──► status_counts                        │
//! │           └──► bucket by created_at month ──► monthly_revenue (N months)│
//! │                                                                         │
//! │  One O(n) pass per figure, no caching. `as_of` is passed in so the     │
//! │  result never depends on the wall clock.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::money::Money;
use crate::text::fold;
use crate::types::{Order, OrderStatus};

/// Short pt-BR month names used on the revenue chart.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

// =============================================================================
// Types
// =============================================================================

/// Revenue of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    /// Chart label ("Jan", "Fev", ...).
    pub label: String,
    pub revenue: Money,
}

/// Direction of a stat card's change badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Increase,
    Decrease,
}

/// One headline card on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatCard {
    pub title: String,
    pub value: String,
    /// Month-over-month change ("+12.5%", "-3.0%", "+2").
    pub change: String,
    pub change_type: ChangeType,
    pub icon: String,
}

/// Count of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

/// Everything the dashboard shows about an order set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    /// Sum of delivered order prices.
    pub total_revenue: Money,
    /// All fetched orders.
    pub order_count: usize,
    /// Delivered orders.
    pub completed_count: usize,
    /// Distinct customers appearing in the orders.
    pub distinct_customers: usize,
    /// Rows in the customer list.
    pub registered_customers: usize,
    /// Revenue divided by completed orders, zero when there are none.
    pub average_ticket: Money,
    /// One entry per status, in lifecycle order, zeros included.
    pub status_counts: Vec<StatusCount>,
    /// Oldest month first.
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub cards: Vec<StatCard>,
}

impl DashboardStats {
    /// Computes every figure for `orders` as of `as_of`.
    ///
    /// ## Example
    /// ```rust
    /// use lavapro_core::stats::DashboardStats;
    /// use chrono::Utc;
    ///
    /// let stats = DashboardStats::compute(&[], 0, Utc::now(), 6);
    /// assert!(stats.total_revenue.is_zero());
    /// assert!(stats.average_ticket.is_zero());
    /// assert_eq!(stats.monthly_revenue.len(), 6);
    /// ```
    pub fn compute(
        orders: &[Order],
        registered_customers: usize,
        as_of: DateTime<Utc>,
        months: usize,
    ) -> Self {
        let summary = Summary::of(orders.iter());

        let this_month = month_key(as_of);
        let last_month = previous_month(this_month);
        let current = Summary::of(orders.iter().filter(|o| month_key(o.created_at) == this_month));
        let previous = Summary::of(orders.iter().filter(|o| month_key(o.created_at) == last_month));

        let cards = vec![
            card_with_percent(
                "Receita Total",
                summary.revenue.to_string(),
                previous.revenue.centavos(),
                current.revenue.centavos(),
                "currency-dollar",
            ),
            card_with_percent(
                "Total de Pedidos",
                orders.len().to_string(),
                previous.orders as i64,
                current.orders as i64,
                "shopping-bag",
            ),
            {
                let (change, change_type) =
                    absolute_change(previous.customers as i64, current.customers as i64);
                StatCard {
                    title: "Clientes".to_string(),
                    value: summary.customers.to_string(),
                    change,
                    change_type,
                    icon: "users".to_string(),
                }
            },
            card_with_percent(
                "Ticket Médio",
                summary.average_ticket().to_string(),
                previous.average_ticket().centavos(),
                current.average_ticket().centavos(),
                "chart-bar",
            ),
        ];

        DashboardStats {
            total_revenue: summary.revenue,
            order_count: orders.len(),
            completed_count: summary.completed,
            distinct_customers: summary.customers,
            registered_customers,
            average_ticket: summary.average_ticket(),
            status_counts: status_counts(orders),
            monthly_revenue: monthly_revenue(orders, as_of, months),
            cards,
        }
    }
}

// =============================================================================
// Building Blocks
// =============================================================================

/// Aggregates shared by the totals and the month-over-month comparison.
struct Summary {
    revenue: Money,
    completed: usize,
    orders: usize,
    customers: usize,
}

impl Summary {
    fn of<'a>(orders: impl Iterator<Item = &'a Order>) -> Self {
        let mut summary = Summary {
            revenue: Money::zero(),
            completed: 0,
            orders: 0,
            customers: 0,
        };
        let mut seen = HashSet::new();

        for order in orders {
            summary.orders += 1;
            if order.is_completed() {
                summary.revenue += order.total_price;
                summary.completed += 1;
            }
            if seen.insert(customer_key(order)) {
                summary.customers += 1;
            }
        }

        summary
    }

    fn average_ticket(&self) -> Money {
        self.revenue.average_over(self.completed)
    }
}

#[derive(Hash, PartialEq, Eq)]
enum CustomerKey {
    Id(i64),
    Name(String),
}

fn customer_key(order: &Order) -> CustomerKey {
    match order.customer_id {
        Some(id) => CustomerKey::Id(id),
        None => CustomerKey::Name(fold(&order.customer_name)),
    }
}

/// Revenue of delivered orders only.
pub fn total_revenue(orders: &[Order]) -> Money {
    orders
        .iter()
        .filter(|o| o.is_completed())
        .map(|o| o.total_price)
        .sum()
}

/// Counts per status, every status present.
pub fn status_counts(orders: &[Order]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: orders.iter().filter(|o| o.status == *status).count(),
        })
        .collect()
}

/// Delivered revenue for the `months` calendar months ending with the
/// month of `as_of`, oldest first, zero-filled.
pub fn monthly_revenue(orders: &[Order], as_of: DateTime<Utc>, months: usize) -> Vec<MonthlyRevenue> {
    let mut keys = Vec::with_capacity(months);
    let mut key = month_key(as_of);
    for _ in 0..months {
        keys.push(key);
        key = previous_month(key);
    }
    keys.reverse();

    keys.into_iter()
        .map(|(year, month)| MonthlyRevenue {
            year,
            month,
            label: MONTH_LABELS[(month - 1) as usize].to_string(),
            revenue: orders
                .iter()
                .filter(|o| o.is_completed() && month_key(o.created_at) == (year, month))
                .map(|o| o.total_price)
                .sum(),
        })
        .collect()
}

fn month_key(at: DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}

fn previous_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn card_with_percent(title: &str, value: String, previous: i64, current: i64, icon: &str) -> StatCard {
    let (change, change_type) = percent_change(previous, current);
    StatCard {
        title: title.to_string(),
        value,
        change,
        change_type,
        icon: icon.to_string(),
    }
}

/// Formats a month-over-month change with one decimal, rounded half away
/// from zero. Growth from zero reads as +100.0%.
pub fn percent_change(previous: i64, current: i64) -> (String, ChangeType) {
    if previous == 0 {
        return if current > 0 {
            ("+100.0%".to_string(), ChangeType::Increase)
        } else if current < 0 {
            ("-100.0%".to_string(), ChangeType::Decrease)
        } else {
            ("0.0%".to_string(), ChangeType::Increase)
        };
    }

    let delta = i128::from(current) - i128::from(previous);
    let base = i128::from(previous).abs();
    let scaled = delta * 1000;
    let tenths = if scaled >= 0 {
        (scaled + base / 2) / base
    } else {
        (scaled - base / 2) / base
    };

    let change_type = if tenths < 0 {
        ChangeType::Decrease
    } else {
        ChangeType::Increase
    };
    let sign = match tenths.signum() {
        1 => "+",
        -1 => "-",
        _ => "",
    };
    let magnitude = tenths.abs();
    (
        format!("{}{}.{}%", sign, magnitude / 10, magnitude % 10),
        change_type,
    )
}

/// Formats an absolute change ("+2", "-1", "0").
pub fn absolute_change(previous: i64, current: i64) -> (String, ChangeType) {
    let delta = current - previous;
    if delta < 0 {
        (delta.to_string(), ChangeType::Decrease)
    } else if delta > 0 {
        (format!("+{}", delta), ChangeType::Increase)
    } else {
        ("0".to_string(), ChangeType::Increase)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
