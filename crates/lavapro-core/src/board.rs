//! # Status Board and Search
//!
//! Groups orders into board columns and filters them by a search query.
//!
//! ```text
//! ┌──────────┬─────────────┬────────────────────┬─────────────┬──────────┐
//! │ Pendente │ Em Preparo  │ Aguardando Coleta  │ Em Trânsito │ Entregue │
//! ├──────────┼─────────────┼────────────────────┼─────────────┼──────────┤
//! │  #41     │  #42        │  #38               │  #37        │  #30     │
//! │  #43     │             │                    │             │  #31     │
//! └──────────┴─────────────┴────────────────────┴─────────────┴──────────┘
//!            canceled orders are not shown on the board
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::text::fold;
use crate::types::{Order, OrderStatus};

/// Board columns, in lifecycle order.
pub const BOARD_COLUMNS: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::InProgress,
    OrderStatus::Ready,
    OrderStatus::InTransit,
    OrderStatus::Delivered,
];

/// One column of the status board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BoardColumn {
    pub status: OrderStatus,
    pub title: String,
    pub orders: Vec<Order>,
}

/// Groups orders into board columns. Within a column the newest order
/// comes first.
pub fn build_board(orders: &[Order]) -> Vec<BoardColumn> {
    BOARD_COLUMNS
        .iter()
        .map(|status| {
            let mut column: Vec<Order> = orders
                .iter()
                .filter(|o| o.status == *status)
                .cloned()
                .collect();
            column.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            BoardColumn {
                status: *status,
                title: status.label_pt().to_string(),
                orders: column,
            }
        })
        .collect()
}

/// Filters orders by a free-text query.
///
/// - `#42` matches order 42 only
/// - `42` matches order 42, plus names containing "42"
/// - anything else matches customer or service names, ignoring case and
///   accents
///
/// An empty query matches everything.
pub fn search_orders<'a>(orders: &'a [Order], query: &str) -> Vec<&'a Order> {
    let query = query.trim();
    if query.is_empty() {
        return orders.iter().collect();
    }

    if let Some(id) = query.strip_prefix('#') {
        return match id.trim().parse::<i64>() {
            Ok(id) => orders.iter().filter(|o| o.id == id).collect(),
            Err(_) => Vec::new(),
        };
    }

    let id = query.parse::<i64>().ok();
    let needle = fold(query);
    orders
        .iter()
        .filter(|o| {
            Some(o.id) == id
                || fold(&o.customer_name).contains(&needle)
                || fold(&o.service_name).contains(&needle)
        })
        .collect()
}

/// The `limit` most recent orders, newest first.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<&Order> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::DeliveryInfo;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn order(id: i64, customer: &str, service: &str, status: OrderStatus, age_days: i64) -> Order {
        Order {
            id,
            tenant_id: Uuid::nil(),
            customer_id: None,
            customer_name: customer.to_string(),
            service_id: None,
            service_name: service.to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap() - Duration::days(age_days),
            total_price: Money::from_centavos(1000),
            delivery: DeliveryInfo::default(),
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order(41, "Ana Souza", "Lavagem Simples", OrderStatus::Pending, 3),
            order(42, "João Pereira", "Passadoria", OrderStatus::InProgress, 2),
            order(43, "Conceição", "Lavagem a Seco", OrderStatus::Pending, 1),
            order(44, "Bruno 42", "Edredom", OrderStatus::Canceled, 0),
        ]
    }

    #[test]
    fn test_board_excludes_canceled() {
        let board = build_board(&sample());
        assert_eq!(board.len(), 5);
        let on_board: usize = board.iter().map(|c| c.orders.len()).sum();
        assert_eq!(on_board, 3);
        assert!(board.iter().all(|c| c.status != OrderStatus::Canceled));
    }

    #[test]
    fn test_board_column_order_and_sorting() {
        let board = build_board(&sample());
        assert_eq!(board[0].title, "Pendente");
        let ids: Vec<_> = board[0].orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![43, 41]);
        assert!(board[3].orders.is_empty());
    }

    #[test]
    fn test_search_by_hash_id() {
        let orders = sample();
        let hits: Vec<_> = search_orders(&orders, "#42").iter().map(|o| o.id).collect();
        assert_eq!(hits, vec![42]);
        assert!(search_orders(&orders, "#abc").is_empty());
    }

    #[test]
    fn test_search_bare_number_matches_id_and_names() {
        let orders = sample();
        let hits: Vec<_> = search_orders(&orders, "42").iter().map(|o| o.id).collect();
        assert_eq!(hits, vec![42, 44]);
    }

    #[test]
    fn test_search_ignores_case_and_accents() {
        let orders = sample();
        let hits: Vec<_> = search_orders(&orders, "joao").iter().map(|o| o.id).collect();
        assert_eq!(hits, vec![42]);
        let hits: Vec<_> = search_orders(&orders, "CONCEICAO").iter().map(|o| o.id).collect();
        assert_eq!(hits, vec![43]);
        let hits: Vec<_> = search_orders(&orders, "lavagem").iter().map(|o| o.id).collect();
        assert_eq!(hits, vec![41, 43]);
    }

    #[test]
    fn test_empty_query_and_recent() {
        let orders = sample();
        assert_eq!(search_orders(&orders, "  ").len(), 4);
        let recent: Vec<_> = recent_orders(&orders, 2).iter().map(|o| o.id).collect();
        assert_eq!(recent, vec![44, 43]);
    }
}
