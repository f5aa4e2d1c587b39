//! # Demo Dataset
//!
//! Seeds a [`MemoryBackend`] with a small laundry business so every screen
//! has something to show without a hosted project.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Lavanderia Bolha Azul (active)          Lava Rápido Centro (trialing) │
//! │  ├── owner    dono@bolhaazul.com.br      └── admin admin@lavarapido... │
//! │  ├── admin    admin@bolhaazul.com.br                                    │
//! │  ├── staff    equipe@bolhaazul.com.br                                   │
//! │  ├── customer cliente@bolhaazul.com.br   (linked to customer #1)       │
//! │  ├── delivery entregas@bolhaazul.com.br  (Carlos Entregador)           │
//! │  └── no profile novo@bolhaazul.com.br                                   │
//! │                                                                         │
//! │  Orders over the last six months, written in every row layout the      │
//! │  backend has seen (order_date/service_type, total/delivery_person,     │
//! │  id references, canonical).                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every account uses [`DEMO_PASSWORD`].

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::memory::MemoryBackend;

/// Password of every demo account.
pub const DEMO_PASSWORD: &str = "lavapro123";

/// The main demo tenant.
pub const DEMO_TENANT_ID: Uuid = Uuid::from_u128(0x5f0c_2a1e_7b3d_4c8a_9e6f_1a2b_3c4d_5e6f);
/// A second tenant whose data must never show up in the first.
pub const OTHER_TENANT_ID: Uuid = Uuid::from_u128(0x8a1d_4e2f_6c3b_4d9e_a0f1_2b3c_4d5e_6f70);

pub const OWNER_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0001);
pub const ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0002);
pub const STAFF_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0003);
pub const CUSTOMER_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0004);
pub const COURIER_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0005);
pub const NO_PROFILE_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0006);
pub const OTHER_ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0002_0000_4000_8000_0000_0000_0001);

/// Demo accounts: (email, what the account shows).
pub const DEMO_ACCOUNTS: [(&str, &str); 7] = [
    ("dono@bolhaazul.com.br", "proprietário"),
    ("admin@bolhaazul.com.br", "administrador"),
    ("equipe@bolhaazul.com.br", "funcionário"),
    ("cliente@bolhaazul.com.br", "cliente com três pedidos"),
    ("entregas@bolhaazul.com.br", "entregador"),
    ("novo@bolhaazul.com.br", "conta sem perfil"),
    ("admin@lavarapido.com.br", "administrador de outra lavanderia"),
];

/// Name the courier is matched by on legacy rows.
pub const COURIER_NAME: &str = "Carlos Entregador";

/// A memory backend holding the demo dataset, dated relative to now.
pub fn demo_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    seed(&backend, Utc::now());
    backend
}

/// Seeds the demo dataset with order dates relative to `now`.
pub fn seed(backend: &MemoryBackend, now: DateTime<Utc>) {
    seed_accounts(backend);
    seed_catalog(backend);
    seed_customers(backend);
    for order in orders(now) {
        backend.insert_row("orders", order);
    }
}

fn seed_accounts(backend: &MemoryBackend) {
    let tenant = DEMO_TENANT_ID.to_string();
    let other = OTHER_TENANT_ID.to_string();

    backend.insert_row(
        "tenants",
        json!({ "id": tenant, "name": "Lavanderia Bolha Azul", "subscription_status": "active",
                "created_at": "2024-01-15T12:00:00Z" }),
    );
    backend.insert_row(
        "tenants",
        json!({ "id": other, "name": "Lava Rápido Centro", "subscription_status": "trialing" }),
    );

    let accounts = [
        (OWNER_ID, "dono@bolhaazul.com.br"),
        (ADMIN_ID, "admin@bolhaazul.com.br"),
        (STAFF_ID, "equipe@bolhaazul.com.br"),
        (CUSTOMER_ID, "cliente@bolhaazul.com.br"),
        (COURIER_ID, "entregas@bolhaazul.com.br"),
        (NO_PROFILE_ID, "novo@bolhaazul.com.br"),
        (OTHER_ADMIN_ID, "admin@lavarapido.com.br"),
    ];
    for (id, email) in accounts {
        backend.add_user_with_id(id, email, DEMO_PASSWORD);
    }

    let profiles = [
        json!({ "id": OWNER_ID.to_string(), "tenant_id": tenant, "full_name": "Marina Souza", "role": "owner" }),
        json!({ "id": ADMIN_ID.to_string(), "tenant_id": tenant, "full_name": "Rafael Lima", "role": "admin" }),
        // Older profile rows carry `username` and Portuguese role labels.
        json!({ "id": STAFF_ID.to_string(), "tenant_id": tenant, "username": "Juliana Alves", "role": "Funcionário" }),
        json!({ "id": CUSTOMER_ID.to_string(), "tenant_id": tenant, "full_name": "Ana Paula Ribeiro", "role": "customer" }),
        json!({ "id": COURIER_ID.to_string(), "tenant_id": tenant, "full_name": COURIER_NAME, "role": "delivery" }),
        json!({ "id": OTHER_ADMIN_ID.to_string(), "tenant_id": other, "full_name": "Pedro Costa", "role": "admin" }),
    ];
    for profile in profiles {
        backend.insert_row("profiles", profile);
    }
}

fn seed_catalog(backend: &MemoryBackend) {
    let tenant = DEMO_TENANT_ID.to_string();
    let services = [
        json!({ "id": 1, "tenant_id": tenant, "name": "Lavagem Simples",
                "description": "Lavar e secar, dobrado", "price": 25.00, "icon": "shirt" }),
        json!({ "id": 2, "tenant_id": tenant, "name": "Lavagem e Passadoria",
                "description": "Lavar, secar e passar", "price": "45.50", "icon": "iron" }),
        json!({ "id": 3, "tenant_id": tenant, "name": "Lavagem a Seco",
                "description": "Peças delicadas e ternos", "price": 60, "icon": "sparkles" }),
        json!({ "id": 4, "tenant_id": tenant, "name": "Edredom",
                "description": "Edredons e cobertores", "price": 80.0, "icon": "bed" }),
        json!({ "id": 5, "tenant_id": null, "name": "Passar Roupas",
                "description": "Somente passadoria", "price": 20, "icon": "iron" }),
        json!({ "id": 6, "tenant_id": OTHER_TENANT_ID.to_string(), "name": "Lavagem Express",
                "description": "Pronto em 3 horas", "price": 30, "icon": "zap" }),
    ];
    for service in services {
        backend.insert_row("services", service);
    }
}

fn seed_customers(backend: &MemoryBackend) {
    let tenant = DEMO_TENANT_ID.to_string();
    let customers = [
        json!({ "id": 1, "tenant_id": tenant, "profile_id": CUSTOMER_ID.to_string(),
                "name": "Ana Paula Ribeiro", "email": "cliente@bolhaazul.com.br",
                "phone": "11987654321", "address": "Rua das Flores, 120",
                "created_at": "2024-02-01T10:00:00Z" }),
        json!({ "id": 2, "tenant_id": tenant, "name": "Bruno Martins", "phone": "11912345678",
                "created_at": "2024-02-10T10:00:00Z" }),
        json!({ "id": 3, "tenant_id": tenant, "name": "Camila Ferreira", "email": "camila@email.com",
                "address": "Av. Paulista, 900", "created_at": "2024-03-05T10:00:00Z" }),
        json!({ "id": 4, "tenant_id": tenant, "name": "Diego Santos", "phone": "11955554444",
                "address": "Rua Augusta, 45", "created_at": "2024-03-20T10:00:00Z" }),
        json!({ "id": 5, "tenant_id": OTHER_TENANT_ID.to_string(), "name": "Eduarda Nunes",
                "created_at": "2024-04-01T10:00:00Z" }),
    ];
    for customer in customers {
        backend.insert_row("customers", customer);
    }
}

fn orders(now: DateTime<Utc>) -> Vec<Value> {
    let tenant = DEMO_TENANT_ID.to_string();
    let other = OTHER_TENANT_ID.to_string();
    let ago = |days: i64| (now - Duration::days(days)).to_rfc3339();
    let date_ago = |days: i64| (now - Duration::days(days)).format("%Y-%m-%d").to_string();
    let courier = COURIER_ID.to_string();

    vec![
        // order_date / service_type layout
        json!({ "id": 1, "tenant_id": tenant, "customer_name": "Bruno Martins",
                "service_type": "Lavagem Simples", "order_date": date_ago(170),
                "status": "Entregue", "total_price": 25.00, "delivery_type": "Coleta" }),
        json!({ "id": 2, "tenant_id": tenant, "customer_name": "Camila Ferreira",
                "service_type": "Edredom", "order_date": date_ago(150),
                "status": "Entregue", "total_price": "80.00", "delivery_type": "Entrega" }),
        // total / delivery_person layout
        json!({ "id": 3, "tenant_id": tenant, "customer_name": "Diego Santos",
                "service": "Lavagem a Seco", "total": 60.0, "status": "completed",
                "delivery_person": COURIER_NAME, "created_at": ago(120) }),
        json!({ "id": 4, "tenant_id": tenant, "customer_name": "Bruno Martins",
                "service": "Lavagem e Passadoria", "total": "45.50", "status": "Cancelado",
                "created_at": ago(100) }),
        // canonical
        json!({ "id": 5, "schema_version": 4, "tenant_id": tenant, "customer_id": 1, "service_id": 2,
                "status": "delivered", "total_price": 45.50, "delivery_kind": "pickup",
                "created_at": ago(75) }),
        json!({ "id": 6, "schema_version": 4, "tenant_id": tenant, "customer_id": 3, "service_id": 1,
                "status": "delivered", "total_price": 25.00, "delivery_kind": "delivery",
                "courier_id": courier, "delivery_address": "Av. Paulista, 900", "created_at": ago(50) }),
        json!({ "id": 7, "schema_version": 4, "tenant_id": tenant, "customer_id": 1, "service_id": 4,
                "status": "delivered", "total_price": 80.00, "delivery_kind": "pickup",
                "created_at": ago(35) }),
        json!({ "id": 8, "schema_version": 4, "tenant_id": tenant, "customer_id": 2, "service_id": 3,
                "status": "delivered", "total_price": 60.00, "delivery_kind": "pickup",
                "created_at": ago(20) }),
        // id references only
        json!({ "id": 13, "tenant_id": tenant, "customer_id": 4, "service_id": 3,
                "status": "delivered", "total_price": 60.00, "created_at": ago(10) }),
        json!({ "id": 9, "schema_version": 4, "tenant_id": tenant, "customer_id": 4, "service_id": 1,
                "status": "ready", "total_price": 25.00, "delivery_kind": "delivery",
                "courier_id": courier, "delivery_address": "Rua Augusta, 45", "created_at": ago(6) }),
        json!({ "id": 10, "tenant_id": tenant, "customer_name": "Diego Santos",
                "service": "Edredom", "total": 80, "status": "Em Trânsito",
                "delivery_person": COURIER_NAME, "created_at": ago(3) }),
        json!({ "id": 11, "schema_version": 4, "tenant_id": tenant, "customer_id": 3, "service_id": 2,
                "status": "in_progress", "total_price": 45.50, "delivery_kind": "pickup",
                "created_at": ago(2) }),
        json!({ "id": 12, "schema_version": 4, "tenant_id": tenant, "customer_id": 2, "service_id": 5,
                "status": "ready", "total_price": 20.00, "delivery_kind": "pickup",
                "created_at": ago(1) }),
        json!({ "id": 42, "schema_version": 4, "tenant_id": tenant, "customer_id": 1, "service_id": 1,
                "status": "pending", "total_price": 25.00, "delivery_kind": "delivery",
                "delivery_address": "Rua das Flores, 120", "created_at": ago(0) }),
        // second tenant
        json!({ "id": 100, "schema_version": 4, "tenant_id": other, "customer_id": 5, "service_id": 6,
                "status": "delivered", "total_price": 30.00, "created_at": ago(5) }),
        json!({ "id": 101, "schema_version": 4, "tenant_id": other, "customer_id": 5, "service_id": 6,
                "status": "pending", "total_price": 30.00, "created_at": ago(1) }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavapro_core::schema::normalize_order;

    #[test]
    fn test_every_demo_order_normalizes() {
        for row in orders(Utc::now()) {
            let tenant = if row["tenant_id"] == json!(OTHER_TENANT_ID.to_string()) {
                OTHER_TENANT_ID
            } else {
                DEMO_TENANT_ID
            };
            assert!(normalize_order(&row, tenant).is_ok(), "row {} failed", row["id"]);
        }
    }

    #[test]
    fn test_demo_customer_has_three_orders() {
        let mine: Vec<_> = orders(Utc::now())
            .into_iter()
            .filter(|r| r["customer_id"] == json!(1))
            .collect();
        assert_eq!(mine.len(), 3);
        assert_eq!(mine.iter().filter(|r| r["status"] == "delivered").count(), 2);
    }
}
