//! # Order Lifecycle
//!
//! Which status changes an order may go through.
//!
//! ## Transition Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rank:   0 pending   1 in_progress   2 ready   3 in_transit   4 delivered│
//! │                                                                         │
//! │  1. Same status            → Unchanged (idempotent, no write)          │
//! │  2. Terminal order         → rejected                                   │
//! │  3. Any open → canceled    → allowed                                    │
//! │  4. Forward (higher rank)  → allowed, skipping steps is fine            │
//! │  5. Backward               → rejected                                   │
//! │  6. in_transit             → delivery-kind orders only                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::text::fold;
use crate::types::{DeliveryKind, Order, OrderStatus};

/// Outcome of a lifecycle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The order already has the requested status; nothing to write.
    Unchanged,
    /// The status change is allowed.
    Move,
}

/// Position along the forward path. Canceled sits outside it.
fn rank(status: OrderStatus) -> Option<u8> {
    match status {
        OrderStatus::Pending => Some(0),
        OrderStatus::InProgress => Some(1),
        OrderStatus::Ready => Some(2),
        OrderStatus::InTransit => Some(3),
        OrderStatus::Delivered => Some(4),
        OrderStatus::Canceled => None,
    }
}

/// Returns true when an order of `kind` may move from `from` to `to`.
///
/// A same-status "move" is not a transition and returns false here; use
/// [`check_transition`] for the idempotent rule.
pub fn can_transition(from: OrderStatus, to: OrderStatus, kind: DeliveryKind) -> bool {
    if from == to || from.is_terminal() {
        return false;
    }
    if to == OrderStatus::InTransit && kind != DeliveryKind::Delivery {
        return false;
    }
    match (rank(from), rank(to)) {
        (_, None) => true,
        (Some(a), Some(b)) => b > a,
        (None, _) => false,
    }
}

/// Checks a requested status change against the lifecycle.
///
/// ## Example
/// ```rust
/// use lavapro_core::lifecycle::{check_transition, Transition};
/// # use lavapro_core::*;
/// # use chrono::Utc;
/// # let order = Order {
/// #     id: 42, tenant_id: uuid::Uuid::nil(), customer_id: None,
/// #     customer_name: "Ana".into(), service_id: None, service_name: "Lavagem".into(),
/// #     status: OrderStatus::Pending, created_at: Utc::now(),
/// #     total_price: Money::zero(), delivery: DeliveryInfo::default(),
/// # };
/// assert_eq!(check_transition(&order, OrderStatus::InProgress).unwrap(), Transition::Move);
/// assert_eq!(check_transition(&order, OrderStatus::Pending).unwrap(), Transition::Unchanged);
/// ```
pub fn check_transition(order: &Order, to: OrderStatus) -> CoreResult<Transition> {
    if order.status == to {
        return Ok(Transition::Unchanged);
    }
    if can_transition(order.status, to, order.delivery.kind) {
        Ok(Transition::Move)
    } else {
        Err(CoreError::InvalidStatusTransition {
            order_id: order.id,
            from: order.status,
            to,
        })
    }
}

/// The status a courier moves an order to next: ready → in_transit →
/// delivered. `None` for statuses couriers do not handle.
pub fn next_delivery_step(status: OrderStatus) -> Option<OrderStatus> {
    match status {
        OrderStatus::Ready => Some(OrderStatus::InTransit),
        OrderStatus::InTransit => Some(OrderStatus::Delivered),
        _ => None,
    }
}

/// Statuses the order may be moved to, in lifecycle order.
pub fn allowed_targets(order: &Order) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .iter()
        .copied()
        .filter(|to| can_transition(order.status, *to, order.delivery.kind))
        .collect()
}

/// Parses a status label from any dashboard generation.
///
/// Accepts the canonical snake_case labels, older English spellings and
/// the Portuguese labels, ignoring case and accents.
pub fn parse_status(label: &str) -> Option<OrderStatus> {
    let status = match fold(label).as_str() {
        "pending" | "pendente" => OrderStatus::Pending,
        "in progress" | "processing" | "em preparacao" | "em preparo" => OrderStatus::InProgress,
        "ready" | "pronto para coleta" | "aguardando coleta" | "pronto" => OrderStatus::Ready,
        "in transit" | "out for delivery" | "em transito" => OrderStatus::InTransit,
        "delivered" | "completed" | "entregue" => OrderStatus::Delivered,
        "canceled" | "cancelled" | "cancelado" => OrderStatus::Canceled,
        _ => return None,
    };
    Some(status)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::DeliveryInfo;
    use chrono::Utc;
    use uuid::Uuid;

    fn order(status: OrderStatus, kind: DeliveryKind) -> Order {
        Order {
            id: 42,
            tenant_id: Uuid::nil(),
            customer_id: Some(1),
            customer_name: "Ana".to_string(),
            service_id: Some(1),
            service_name: "Lavagem Simples".to_string(),
            status,
            created_at: Utc::now(),
            total_price: Money::from_centavos(2500),
            delivery: DeliveryInfo {
                kind,
                ..DeliveryInfo::default()
            },
        }
    }

    #[test]
    fn test_forward_moves_allowed() {
        use OrderStatus::*;
        assert!(can_transition(Pending, InProgress, DeliveryKind::Pickup));
        assert!(can_transition(InProgress, Ready, DeliveryKind::Pickup));
        assert!(can_transition(Ready, Delivered, DeliveryKind::Pickup));
        assert!(can_transition(Pending, Delivered, DeliveryKind::Pickup));
        assert!(can_transition(Ready, InTransit, DeliveryKind::Delivery));
        assert!(can_transition(InTransit, Delivered, DeliveryKind::Delivery));
    }

    #[test]
    fn test_backward_and_terminal_rejected() {
        use OrderStatus::*;
        assert!(!can_transition(Ready, Pending, DeliveryKind::Pickup));
        assert!(!can_transition(Delivered, Pending, DeliveryKind::Pickup));
        assert!(!can_transition(Canceled, InProgress, DeliveryKind::Pickup));
        assert!(!can_transition(Delivered, Canceled, DeliveryKind::Pickup));
    }

    #[test]
    fn test_cancel_from_any_open_status() {
        for from in [OrderStatus::Pending, OrderStatus::InProgress, OrderStatus::Ready] {
            assert!(can_transition(from, OrderStatus::Canceled, DeliveryKind::Pickup));
        }
        assert!(can_transition(
            OrderStatus::InTransit,
            OrderStatus::Canceled,
            DeliveryKind::Delivery
        ));
    }

    #[test]
    fn test_pickup_orders_never_in_transit() {
        assert!(!can_transition(
            OrderStatus::Ready,
            OrderStatus::InTransit,
            DeliveryKind::Pickup
        ));
    }

    #[test]
    fn test_check_transition_same_status_is_noop() {
        let delivered = order(OrderStatus::Delivered, DeliveryKind::Pickup);
        assert_eq!(
            check_transition(&delivered, OrderStatus::Delivered).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_check_transition_reports_order() {
        let ready = order(OrderStatus::Ready, DeliveryKind::Pickup);
        let err = check_transition(&ready, OrderStatus::Pending).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStatusTransition { order_id: 42, .. }
        ));
    }

    #[test]
    fn test_next_delivery_step() {
        assert_eq!(next_delivery_step(OrderStatus::Ready), Some(OrderStatus::InTransit));
        assert_eq!(next_delivery_step(OrderStatus::InTransit), Some(OrderStatus::Delivered));
        assert_eq!(next_delivery_step(OrderStatus::Pending), None);
        assert_eq!(next_delivery_step(OrderStatus::Delivered), None);
    }

    #[test]
    fn test_allowed_targets() {
        let pending = order(OrderStatus::Pending, DeliveryKind::Pickup);
        assert_eq!(
            allowed_targets(&pending),
            vec![
                OrderStatus::InProgress,
                OrderStatus::Ready,
                OrderStatus::Delivered,
                OrderStatus::Canceled
            ]
        );
        assert!(allowed_targets(&order(OrderStatus::Canceled, DeliveryKind::Delivery)).is_empty());
    }

    #[test]
    fn test_parse_status_labels() {
        assert_eq!(parse_status("Pendente"), Some(OrderStatus::Pending));
        assert_eq!(parse_status("Em Preparação"), Some(OrderStatus::InProgress));
        assert_eq!(parse_status("in-progress"), Some(OrderStatus::InProgress));
        assert_eq!(parse_status("Pronto para Coleta"), Some(OrderStatus::Ready));
        assert_eq!(parse_status("Aguardando Coleta"), Some(OrderStatus::Ready));
        assert_eq!(parse_status("EM TRÂNSITO"), Some(OrderStatus::InTransit));
        assert_eq!(parse_status("completed"), Some(OrderStatus::Delivered));
        assert_eq!(parse_status("cancelled"), Some(OrderStatus::Canceled));
        assert_eq!(parse_status("lost"), None);
    }

    #[test]
    fn test_canonical_labels_parse_back() {
        for status in OrderStatus::ALL {
            assert_eq!(parse_status(status.as_str()), Some(status));
            assert_eq!(parse_status(status.label_pt()), Some(status));
        }
    }
}
