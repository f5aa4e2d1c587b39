//! Scoped data, statistics and mutations over the demo dataset.

mod common;

use common::*;
use lavapro_baas::demo::{DEMO_PASSWORD, DEMO_TENANT_ID};
use lavapro_baas::memory::Failure;
use lavapro_baas::{Baas, Backend, MemoryBackend, Query};
use lavapro_core::lifecycle::Transition;
use lavapro_core::{CoreError, Money, NewCustomer, NewService, OrderStatus, ViewState};
use lavapro_session::{Dashboard, DashboardOptions, DataState, ErrorKind, SessionError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn count(data: &lavapro_session::DashboardData, status: OrderStatus) -> usize {
    data.stats
        .status_counts
        .iter()
        .find(|c| c.status == status)
        .map_or(0, |c| c.count)
}

#[tokio::test]
async fn test_admin_stats_over_mixed_layouts() {
    let (dashboard, _) = signed_in(ADMIN).await;
    let data = dashboard.data().data().unwrap();

    assert_eq!(data.orders.len(), 14);
    assert_eq!(data.skipped_rows, 0);
    assert_eq!(data.stats.order_count, 14);
    assert_eq!(data.stats.completed_count, 8);
    assert_eq!(data.stats.total_revenue, Money::from_centavos(43550));
    assert!((5443..=5444).contains(&data.stats.average_ticket.centavos()));
    assert_eq!(data.stats.registered_customers, 4);

    let summed: usize = data.stats.status_counts.iter().map(|c| c.count).sum();
    assert_eq!(summed, data.stats.order_count);

    // Newest first.
    assert_eq!(data.recent(1)[0].id, 42);
    // The legacy courier label survives normalization.
    let legacy = data.order(3).unwrap();
    assert_eq!(legacy.status, OrderStatus::Delivered);
    assert_eq!(legacy.delivery.courier_name.as_deref(), Some("Carlos Entregador"));
}

#[tokio::test]
async fn test_search_matches_customer_names() {
    let (dashboard, _) = signed_in(ADMIN).await;
    let data = dashboard.data().data().unwrap();
    let hits = data.search("camila");
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|o| o.customer_name == "Camila Ferreira"));
}

#[tokio::test]
async fn test_unreadable_row_is_skipped_not_fatal() {
    let (dashboard, backend) = signed_in(ADMIN).await;
    backend.insert_row(
        "orders",
        json!({ "id": 77, "tenant_id": DEMO_TENANT_ID.to_string(), "status": "Perdido",
                "total_price": 10, "created_at": "2026-01-01T00:00:00Z" }),
    );

    let state = dashboard.refresh().await;
    let data = state.data().unwrap();
    assert_eq!(data.orders.len(), 14);
    assert_eq!(data.skipped_rows, 1);
}

#[tokio::test]
async fn test_tenant_without_orders_has_zero_stats() {
    let backend = Arc::new(MemoryBackend::new());
    let tenant = Uuid::new_v4();
    let user = backend.add_user("dona@nova.com.br", "secret1");
    backend.insert_row(
        "tenants",
        json!({ "id": tenant.to_string(), "name": "Lavanderia Nova", "subscription_status": "trialing" }),
    );
    backend.insert_row(
        "profiles",
        json!({ "id": user.to_string(), "tenant_id": tenant.to_string(),
                "full_name": "Dona Nova", "role": "owner" }),
    );
    let dashboard = Dashboard::new(Baas::new(backend), DashboardOptions::default());

    let view = dashboard
        .sign_in_with_password("dona@nova.com.br", "secret1")
        .await
        .unwrap();
    assert_eq!(view, ViewState::Admin);

    let data = dashboard.data().data().unwrap();
    assert!(data.orders.is_empty());
    assert_eq!(data.stats.total_revenue, Money::zero());
    assert_eq!(data.stats.average_ticket, Money::zero());
    assert!(data.stats.status_counts.iter().all(|c| c.count == 0));
    assert!(data.stats.monthly_revenue.iter().all(|m| m.revenue == Money::zero()));
}

#[tokio::test]
async fn test_profile_without_tenant_has_no_access() {
    let backend = Arc::new(MemoryBackend::new());
    let user = backend.add_user("solto@lavapro.com.br", "secret1");
    backend.insert_row(
        "profiles",
        json!({ "id": user.to_string(), "full_name": "Sem Loja", "role": "admin" }),
    );
    let dashboard = Dashboard::new(Baas::new(backend), DashboardOptions::default());
    dashboard
        .sign_in_with_password("solto@lavapro.com.br", "secret1")
        .await
        .unwrap();

    assert!(matches!(dashboard.data().snapshot(), DataState::NoAccess { .. }));
    assert!(matches!(dashboard.data().data(), Err(SessionError::NotReady(_))));
}

#[tokio::test]
async fn test_admin_moves_order_forward() {
    let (dashboard, _) = signed_in(ADMIN).await;
    let before = dashboard.data().data().unwrap();
    assert_eq!(before.order(42).unwrap().status, OrderStatus::Pending);

    let transition = dashboard
        .update_order_status(42, OrderStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(transition, Transition::Move);

    let after = dashboard.data().data().unwrap();
    assert_eq!(after.order(42).unwrap().status, OrderStatus::InProgress);
    assert_eq!(after.stats.order_count, before.stats.order_count);
    assert_eq!(count(&after, OrderStatus::Pending), count(&before, OrderStatus::Pending) - 1);
    assert_eq!(
        count(&after, OrderStatus::InProgress),
        count(&before, OrderStatus::InProgress) + 1
    );
    let summed: usize = after.stats.status_counts.iter().map(|c| c.count).sum();
    assert_eq!(summed, after.stats.order_count);
}

#[tokio::test]
async fn test_status_change_is_visible_to_other_sessions() {
    let (admin, backend) = signed_in(ADMIN).await;
    admin.update_order_status(11, OrderStatus::Ready).await.unwrap();

    let staff = Dashboard::new(Baas::new(backend), DashboardOptions::default());
    staff
        .sign_in_with_password(STAFF, DEMO_PASSWORD)
        .await
        .unwrap();
    let data = staff.data().data().unwrap();
    assert_eq!(data.order(11).unwrap().status, OrderStatus::Ready);
}

#[tokio::test]
async fn test_same_status_writes_nothing() {
    let (dashboard, backend) = signed_in(ADMIN).await;
    let calls = backend.call_count("orders");

    let transition = dashboard
        .update_order_status(11, OrderStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(transition, Transition::Unchanged);
    // One read for the current order, no write, no refresh.
    assert_eq!(backend.call_count("orders"), calls + 1);
}

#[tokio::test]
async fn test_backward_move_is_rejected() {
    let (dashboard, _) = signed_in(ADMIN).await;
    let err = dashboard
        .update_order_status(12, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Rule(CoreError::InvalidStatusTransition { order_id: 12, .. })
    ));

    let closed = dashboard
        .update_order_status(4, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(closed.kind(), ErrorKind::Mutation);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (dashboard, _) = signed_in(ADMIN).await;
    let err = dashboard
        .update_order_status(999, OrderStatus::Ready)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Rule(CoreError::OrderNotFound(999))));
}

#[tokio::test]
async fn test_failed_mutation_keeps_loaded_data() {
    let (dashboard, backend) = signed_in(ADMIN).await;
    let before = dashboard.data().data().unwrap();

    backend.fail_next("orders", Failure::Server);
    let err = dashboard
        .update_order_status(42, OrderStatus::InProgress)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mutation);

    let after = dashboard.data().data().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.order(42).unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_failed_refresh_is_reported() {
    let (dashboard, backend) = signed_in(ADMIN).await;
    backend.fail_next("services", Failure::Network);

    let state = dashboard.refresh().await;
    assert!(matches!(state, DataState::Failed { .. }));
    assert!(dashboard.refresh().await.data().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_stale_refresh_is_dropped() {
    let (dashboard, backend) = signed_in(ADMIN).await;
    let token = dashboard.session().access_token().unwrap();

    // The slow refresh reads orders before the status change lands.
    backend.delay_next("orders", Duration::from_millis(500));
    let slow = dashboard.data().refresh();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        backend
            .update(
                Some(token.as_str()),
                &Query::table("orders").eq("id", 42),
                json!({ "status": "in_progress" }),
            )
            .await
            .unwrap();
        dashboard.data().refresh().await
    };
    let (slow_state, fast_state) = tokio::join!(slow, fast);

    let fresh = fast_state.data().unwrap();
    assert_eq!(fresh.order(42).unwrap().status, OrderStatus::InProgress);
    // The overtaken refresh reports the newer state, not its own result.
    assert!(Arc::ptr_eq(slow_state.data().unwrap(), fresh));
    let current = dashboard.data().data().unwrap();
    assert_eq!(current.order(42).unwrap().status, OrderStatus::InProgress);
}

#[tokio::test]
async fn test_courier_advances_assigned_deliveries() {
    let (dashboard, _) = signed_in(COURIER).await;

    assert_eq!(dashboard.advance_delivery(9).await.unwrap(), OrderStatus::InTransit);
    assert_eq!(dashboard.advance_delivery(10).await.unwrap(), OrderStatus::Delivered);

    let data = dashboard.data().data().unwrap();
    assert_eq!(data.order(9).unwrap().status, OrderStatus::InTransit);
    // Delivered orders leave the courier's list.
    assert!(data.order(10).is_none());
}

#[tokio::test]
async fn test_courier_cannot_touch_unassigned_orders() {
    let (dashboard, _) = signed_in(COURIER).await;
    let err = dashboard.advance_delivery(42).await.unwrap_err();
    assert!(matches!(err, SessionError::Rule(CoreError::OrderNotFound(42))));

    let err = dashboard
        .update_order_status(9, OrderStatus::Canceled)
        .await
        .unwrap_err();
    assert!(err.is_permission_error());
}

#[tokio::test]
async fn test_admin_registers_customer() {
    let (dashboard, _) = signed_in(ADMIN).await;
    let customer = dashboard
        .create_customer(&NewCustomer {
            name: "Fernanda Rocha".to_string(),
            email: Some("fernanda@email.com".to_string()),
            phone: Some("11988887777".to_string()),
            address: None,
        })
        .await
        .unwrap();

    assert_eq!(customer.tenant_id, DEMO_TENANT_ID);
    let data = dashboard.data().data().unwrap();
    assert_eq!(data.customers.len(), 5);
    assert_eq!(data.stats.registered_customers, 5);
}

#[tokio::test]
async fn test_customer_account_registers_itself_once() {
    let (dashboard, backend) = demo();
    let user_id = backend.add_user("beatriz@email.com", "secret1");
    backend.insert_row(
        "profiles",
        json!({ "id": user_id.to_string(), "tenant_id": DEMO_TENANT_ID.to_string(),
                "full_name": "Beatriz Nunes", "role": "customer" }),
    );
    let view = dashboard.sign_in_with_password("beatriz@email.com", "secret1").await.unwrap();
    assert_eq!(view, ViewState::Customer);
    assert!(dashboard.data().data().unwrap().customers.is_empty());

    let input = NewCustomer {
        name: "Beatriz Nunes".to_string(),
        email: Some("beatriz@email.com".to_string()),
        phone: None,
        address: Some("Rua das Flores, 10".to_string()),
    };
    let customer = dashboard.register_self(&input).await.unwrap();
    assert_eq!(customer.profile_id, Some(user_id));
    assert_eq!(customer.tenant_id, DEMO_TENANT_ID);

    let data = dashboard.data().data().unwrap();
    assert_eq!(data.customers.len(), 1);
    assert_eq!(data.customers[0].id, customer.id);
    assert!(backend
        .rows("customers")
        .iter()
        .any(|r| r["profile_id"] == json!(user_id.to_string())));

    let again = dashboard.register_self(&input).await.unwrap_err();
    assert!(matches!(again, SessionError::Rule(CoreError::AlreadyRegistered)));
}

#[tokio::test]
async fn test_staff_cannot_register_themselves_as_customers() {
    let (dashboard, backend) = signed_in(STAFF).await;
    let calls = backend.call_count("customers");

    let err = dashboard
        .register_self(&NewCustomer {
            name: "Juliana Alves".to_string(),
            email: None,
            phone: None,
            address: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_permission_error());
    assert_eq!(backend.call_count("customers"), calls);
}

#[tokio::test]
async fn test_invalid_customer_is_rejected_before_writing() {
    let (dashboard, backend) = signed_in(ADMIN).await;
    let calls = backend.call_count("customers");

    let err = dashboard
        .create_customer(&NewCustomer {
            name: "   ".to_string(),
            email: None,
            phone: None,
            address: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.call_count("customers"), calls);
}

#[tokio::test]
async fn test_owner_adds_service_customer_cannot() {
    let (owner, _) = signed_in(OWNER).await;
    let service = owner
        .create_service(&NewService {
            name: "Tapetes".to_string(),
            description: "Lavagem de tapetes".to_string(),
            price: Money::from_centavos(9900),
            icon: None,
        })
        .await
        .unwrap();
    assert_eq!(service.price, Money::from_centavos(9900));
    assert!(owner.data().data().unwrap().services.iter().any(|s| s.name == "Tapetes"));

    let (customer, _) = signed_in(CUSTOMER).await;
    let err = customer
        .create_customer(&NewCustomer {
            name: "Intruso".to_string(),
            email: None,
            phone: None,
            address: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_permission_error());
}
