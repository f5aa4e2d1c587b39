//! # Schema Normalization
//!
//! Converts backend rows into the canonical domain types.
//!
//! ## Why Normalize?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The `orders` table has been written by four dashboard generations:     │
//! │                                                                         │
//! │  V1  { order_date, service_type, status: "Pendente",                    │
//! │        delivery_type: "Entrega", total_price }                          │
//! │  V2  { created_at, service: "Passadoria", total, delivery_person }      │
//! │  V3  { customer_id, service_id, status: "in_progress", total_price }    │
//! │  V4  { ..., customers: { name }, services: { name } }  ◄── canonical    │
//! │                                                                         │
//! │  Everything above the data-access boundary sees only `Order` (v4).     │
//! │  Rows that cannot be normalized are reported per row, never fatal.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::lifecycle::parse_status;
use crate::money::Money;
use crate::text::fold;
use crate::types::{
    Customer, DeliveryInfo, DeliveryKind, Order, OrderStatus, Profile, Role, Service,
    SubscriptionStatus, Tenant,
};

/// Order row layouts found in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaRevision {
    V1,
    V2,
    V3,
    V4,
}

impl SchemaRevision {
    pub const fn number(&self) -> u32 {
        match self {
            SchemaRevision::V1 => 1,
            SchemaRevision::V2 => 2,
            SchemaRevision::V3 => 3,
            SchemaRevision::V4 => 4,
        }
    }
}

/// An order in canonical form plus the layout it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOrder {
    pub order: Order,
    pub revision: SchemaRevision,
}

// =============================================================================
// Detection
// =============================================================================

/// Detects which layout an order row was written with.
pub fn detect_revision(row: &Value) -> SchemaRevision {
    if row.get("schema_version").and_then(Value::as_u64) == Some(4)
        || embedded(row, "customers").is_some()
        || embedded(row, "services").is_some()
    {
        return SchemaRevision::V4;
    }
    if has(row, "order_date") || has(row, "service_type") || has(row, "delivery_type") {
        return SchemaRevision::V1;
    }
    if has(row, "total") || has(row, "delivery_person") || row.get("service").map_or(false, Value::is_string)
    {
        return SchemaRevision::V2;
    }
    SchemaRevision::V3
}

// =============================================================================
// Orders
// =============================================================================

/// Normalizes one `orders` row.
///
/// `tenant` is the tenant the query was scoped to; older rows do not carry
/// their own `tenant_id`.
pub fn normalize_order(row: &Value, tenant: Uuid) -> Result<NormalizedOrder, ValidationError> {
    let obj = as_object(row, "order")?;
    let revision = detect_revision(row);

    let id = int_field(obj, "id")?.ok_or_else(|| ValidationError::required("id"))?;
    let tenant_id = uuid_field(obj, "tenant_id")?.unwrap_or(tenant);
    let customer_id = int_field(obj, "customer_id")?;
    let service_id = int_field(obj, "service_id")?;

    let customer_name = embedded_name(row, "customers")
        .or_else(|| text_field(obj, &["customer_name"]))
        .or_else(|| customer_id.map(|cid| format!("Cliente #{}", cid)))
        .ok_or_else(|| ValidationError::required("customer_name"))?;

    let service_name = embedded_name(row, "services")
        .or_else(|| text_field(obj, &["service_name", "service_type", "service"]))
        .or_else(|| service_id.map(|sid| format!("Serviço #{}", sid)))
        .ok_or_else(|| ValidationError::required("service_name"))?;

    let status_label =
        text_field(obj, &["status"]).ok_or_else(|| ValidationError::required("status"))?;
    let status = parse_status(&status_label)
        .ok_or_else(|| ValidationError::invalid("status", format!("unknown label '{}'", status_label)))?;

    let created_at = match revision {
        SchemaRevision::V1 => date_field(obj, &["order_date", "created_at"])?,
        _ => date_field(obj, &["created_at", "order_date"])?,
    }
    .ok_or_else(|| ValidationError::required("created_at"))?;

    let total_price = match revision {
        SchemaRevision::V2 => money_field(obj, &["total", "total_price"])?,
        _ => money_field(obj, &["total_price", "total"])?,
    }
    .ok_or_else(|| ValidationError::required("total_price"))?;

    let delivery = delivery_info(obj, status)?;

    Ok(NormalizedOrder {
        order: Order {
            id,
            tenant_id,
            customer_id,
            customer_name,
            service_id,
            service_name,
            status,
            created_at,
            total_price,
            delivery,
        },
        revision,
    })
}

fn delivery_info(obj: &Map<String, Value>, status: OrderStatus) -> Result<DeliveryInfo, ValidationError> {
    let courier_id = uuid_field(obj, "courier_id")?;
    let courier_name = text_field(obj, &["courier_name", "delivery_person"]);
    let address = text_field(obj, &["delivery_address", "address"]);

    let kind = match text_field(obj, &["delivery_type", "delivery_kind"]) {
        Some(label) => parse_delivery_kind(&label).ok_or_else(|| {
            ValidationError::invalid("delivery_type", format!("unknown label '{}'", label))
        })?,
        None if courier_id.is_some() || courier_name.is_some() || status == OrderStatus::InTransit => {
            DeliveryKind::Delivery
        }
        None => DeliveryKind::Pickup,
    };

    Ok(DeliveryInfo {
        kind,
        courier_id,
        courier_name,
        address,
    })
}

/// Parses "Coleta"/"Entrega" and their English equivalents.
pub fn parse_delivery_kind(label: &str) -> Option<DeliveryKind> {
    match fold(label).as_str() {
        "pickup" | "coleta" | "retirada" => Some(DeliveryKind::Pickup),
        "delivery" | "entrega" => Some(DeliveryKind::Delivery),
        _ => None,
    }
}

// =============================================================================
// Profiles, Tenants, Customers, Services
// =============================================================================

/// Parses a role label. Unrecognized labels yield `None`.
pub fn parse_role(label: &str) -> Option<Role> {
    match fold(label).as_str() {
        "owner" | "proprietario" | "dono" => Some(Role::Owner),
        "admin" | "administrator" | "administrador" => Some(Role::Admin),
        "staff" | "employee" | "funcionario" => Some(Role::Staff),
        "customer" | "cliente" | "client" => Some(Role::Customer),
        "delivery" | "courier" | "driver" | "entregador" => Some(Role::Delivery),
        _ => None,
    }
}

/// Normalizes one `profiles` row.
pub fn normalize_profile(row: &Value) -> Result<Profile, ValidationError> {
    let obj = as_object(row, "profile")?;
    Ok(Profile {
        id: uuid_field(obj, "id")?.ok_or_else(|| ValidationError::required("id"))?,
        tenant_id: uuid_field(obj, "tenant_id")?,
        full_name: text_field(obj, &["full_name", "username"]).unwrap_or_default(),
        role: text_field(obj, &["role"]).as_deref().and_then(parse_role),
        avatar_url: text_field(obj, &["avatar_url"]),
    })
}

/// Parses a subscription status label.
pub fn parse_subscription_status(label: &str) -> Option<SubscriptionStatus> {
    match fold(label).as_str() {
        "trialing" | "trial" | "periodo de teste" => Some(SubscriptionStatus::Trialing),
        "active" | "ativa" => Some(SubscriptionStatus::Active),
        "past due" | "pastdue" | "pendente" => Some(SubscriptionStatus::PastDue),
        "canceled" | "cancelled" | "cancelada" => Some(SubscriptionStatus::Canceled),
        _ => None,
    }
}

/// Normalizes one `tenants` row. A missing status reads as trialing.
pub fn normalize_tenant(row: &Value) -> Result<Tenant, ValidationError> {
    let obj = as_object(row, "tenant")?;
    let subscription_status = match text_field(obj, &["subscription_status"]) {
        Some(label) => parse_subscription_status(&label).ok_or_else(|| {
            ValidationError::invalid("subscription_status", format!("unknown label '{}'", label))
        })?,
        None => SubscriptionStatus::Trialing,
    };
    Ok(Tenant {
        id: uuid_field(obj, "id")?.ok_or_else(|| ValidationError::required("id"))?,
        name: text_field(obj, &["name"]).ok_or_else(|| ValidationError::required("name"))?,
        subscription_status,
        created_at: date_field(obj, &["created_at"])?,
    })
}

/// Normalizes one `customers` row.
pub fn normalize_customer(row: &Value, tenant: Uuid) -> Result<Customer, ValidationError> {
    let obj = as_object(row, "customer")?;
    Ok(Customer {
        id: int_field(obj, "id")?.ok_or_else(|| ValidationError::required("id"))?,
        tenant_id: uuid_field(obj, "tenant_id")?.unwrap_or(tenant),
        profile_id: uuid_field(obj, "profile_id")?,
        name: text_field(obj, &["name", "full_name"]).ok_or_else(|| ValidationError::required("name"))?,
        email: text_field(obj, &["email"]),
        phone: text_field(obj, &["phone"]),
        address: text_field(obj, &["address"]),
        created_at: date_field(obj, &["created_at"])?,
    })
}

/// Normalizes one `services` row. Rows without a tenant are global entries.
pub fn normalize_service(row: &Value) -> Result<Service, ValidationError> {
    let obj = as_object(row, "service")?;
    Ok(Service {
        id: int_field(obj, "id")?.ok_or_else(|| ValidationError::required("id"))?,
        tenant_id: uuid_field(obj, "tenant_id")?,
        name: text_field(obj, &["name"]).ok_or_else(|| ValidationError::required("name"))?,
        description: text_field(obj, &["description"]).unwrap_or_default(),
        price: money_field(obj, &["price"])?.ok_or_else(|| ValidationError::required("price"))?,
        icon: text_field(obj, &["icon"]),
    })
}

// =============================================================================
// Field Helpers
// =============================================================================

fn has(row: &Value, key: &str) -> bool {
    row.get(key).map_or(false, |v| !v.is_null())
}

fn as_object<'a>(row: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    row.as_object()
        .ok_or_else(|| ValidationError::invalid(what, "row is not an object"))
}

/// An embedded relation: an object, or the first element of an array.
fn embedded<'a>(row: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    match row.get(key)? {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}

fn embedded_name(row: &Value, key: &str) -> Option<String> {
    embedded(row, key).and_then(|map| text_field(map, &["name"]))
}

/// First non-empty string among `keys`, trimmed.
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(obj: &Map<String, Value>, key: &str) -> Result<Option<i64>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ValidationError::invalid(key, "not an integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::invalid(key, "not an integer")),
        Some(_) => Err(ValidationError::invalid(key, "not an integer")),
    }
}

fn uuid_field(obj: &Map<String, Value>, key: &str) -> Result<Option<Uuid>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(|_| ValidationError::invalid(key, "not a UUID")),
        Some(_) => Err(ValidationError::invalid(key, "not a UUID")),
    }
}

/// Reads a price from a JSON number or numeric string, exactly.
fn money_field(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<Money>, ValidationError> {
    for key in keys {
        match obj.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) => return Money::parse_decimal(&n.to_string()).map(Some),
            Some(Value::String(s)) => return Money::parse_decimal(s).map(Some),
            Some(_) => return Err(ValidationError::invalid(*key, "not a number")),
        }
    }
    Ok(None)
}

fn date_field(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match text_field(obj, keys) {
        None => Ok(None),
        Some(text) => parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| ValidationError::invalid(keys[0], format!("unreadable date '{}'", text))),
    }
}

/// Accepts RFC 3339, the relational store's `YYYY-MM-DD HH:MM:SS+00`
/// form, naive timestamps (read as UTC) and bare dates.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    fn tenant() -> Uuid {
        Uuid::parse_str("5f0c4a4e-0000-4000-8000-000000000001").unwrap()
    }

    #[test]
    fn test_v1_row() {
        let row = json!({
            "id": 7,
            "customer_name": "Maria Silva",
            "service_type": "Lavagem a Seco",
            "order_date": "2024-03-10",
            "status": "Pronto para Coleta",
            "total_price": 45.9,
            "delivery_type": "Entrega"
        });
        let n = normalize_order(&row, tenant()).unwrap();
        assert_eq!(n.revision, SchemaRevision::V1);
        assert_eq!(n.order.tenant_id, tenant());
        assert_eq!(n.order.service_name, "Lavagem a Seco");
        assert_eq!(n.order.status, OrderStatus::Ready);
        assert_eq!(n.order.total_price.centavos(), 4590);
        assert_eq!(n.order.delivery.kind, DeliveryKind::Delivery);
        assert_eq!(n.order.created_at, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_v2_row() {
        let row = json!({
            "id": 8,
            "customer_name": "João",
            "service": "Passadoria",
            "created_at": "2024-04-01T12:30:00Z",
            "status": "Em Trânsito",
            "total": "30.00",
            "delivery_person": "Carlos"
        });
        let n = normalize_order(&row, tenant()).unwrap();
        assert_eq!(n.revision, SchemaRevision::V2);
        assert_eq!(n.order.service_name, "Passadoria");
        assert_eq!(n.order.status, OrderStatus::InTransit);
        assert_eq!(n.order.total_price.centavos(), 3000);
        assert_eq!(n.order.delivery.kind, DeliveryKind::Delivery);
        assert_eq!(n.order.delivery.courier_name.as_deref(), Some("Carlos"));
    }

    #[test]
    fn test_v3_row_without_names() {
        let row = json!({
            "id": 9,
            "tenant_id": tenant().to_string(),
            "customer_id": 3,
            "service_id": 2,
            "created_at": "2024-05-02 08:00:00+00",
            "status": "in_progress",
            "total_price": 12
        });
        let n = normalize_order(&row, Uuid::nil()).unwrap();
        assert_eq!(n.revision, SchemaRevision::V3);
        assert_eq!(n.order.tenant_id, tenant());
        assert_eq!(n.order.customer_name, "Cliente #3");
        assert_eq!(n.order.service_name, "Serviço #2");
        assert_eq!(n.order.delivery.kind, DeliveryKind::Pickup);
        assert_eq!(n.order.created_at.month(), 5);
    }

    #[test]
    fn test_v4_row_with_embeds() {
        let courier = Uuid::new_v4();
        let row = json!({
            "id": 10,
            "tenant_id": tenant().to_string(),
            "customer_id": 3,
            "service_id": 2,
            "created_at": "2024-06-15T09:00:00-03:00",
            "status": "delivered",
            "total_price": 99.99,
            "delivery_type": "delivery",
            "courier_id": courier.to_string(),
            "delivery_address": "Rua A, 10",
            "customers": { "name": "Ana Souza" },
            "services": [{ "name": "Lavagem Completa" }]
        });
        let n = normalize_order(&row, tenant()).unwrap();
        assert_eq!(n.revision, SchemaRevision::V4);
        assert_eq!(n.order.customer_name, "Ana Souza");
        assert_eq!(n.order.service_name, "Lavagem Completa");
        assert_eq!(n.order.total_price.centavos(), 9999);
        assert_eq!(n.order.delivery.courier_id, Some(courier));
        assert_eq!(n.order.delivery.address.as_deref(), Some("Rua A, 10"));
        assert_eq!(n.order.created_at, Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_all_revisions_agree_on_canonical_order() {
        let base = |extra: Value| {
            let mut row = json!({ "id": 1, "customer_name": "Ana", "status": "Entregue" });
            if let (Some(obj), Value::Object(more)) = (row.as_object_mut(), extra) {
                obj.extend(more);
            }
            normalize_order(&row, tenant()).unwrap().order
        };

        let v1 = base(json!({ "service_type": "Lavagem", "order_date": "2024-01-05", "total_price": 20, "delivery_type": "Coleta" }));
        let v2 = base(json!({ "service": "Lavagem", "created_at": "2024-01-05", "total": 20 }));
        let v3 = base(json!({ "service_name": "Lavagem", "created_at": "2024-01-05", "total_price": "20.00" }));
        let v4 = base(json!({ "schema_version": 4, "service_name": "Lavagem", "created_at": "2024-01-05T00:00:00Z", "total_price": 20.0, "delivery_type": "pickup" }));

        assert_eq!(v1, v2);
        assert_eq!(v2, v3);
        assert_eq!(v3, v4);
    }

    #[test]
    fn test_unknown_status_is_row_error() {
        let row = json!({ "id": 1, "customer_name": "A", "service_name": "B", "status": "Perdido",
                          "created_at": "2024-01-01", "total_price": 1 });
        let err = normalize_order(&row, tenant()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "status"));
    }

    #[test]
    fn test_missing_id_and_non_object() {
        assert!(normalize_order(&json!({ "status": "pending" }), tenant()).is_err());
        assert!(normalize_order(&json!([1, 2]), tenant()).is_err());
        assert!(normalize_order(&json!({ "id": 1.5 }), tenant()).is_err());
    }

    #[test]
    fn test_profile_role_handling() {
        let id = Uuid::new_v4();
        let p = normalize_profile(&json!({ "id": id.to_string(), "username": "ana", "role": "Funcionário" })).unwrap();
        assert_eq!(p.full_name, "ana");
        assert_eq!(p.role, Some(Role::Staff));

        let p = normalize_profile(&json!({ "id": id.to_string(), "full_name": "Ana", "role": "superuser" })).unwrap();
        assert_eq!(p.role, None);

        let p = normalize_profile(&json!({ "id": id.to_string(), "full_name": "Ana", "role": null })).unwrap();
        assert_eq!(p.role, None);
        assert_eq!(p.tenant_id, None);
    }

    #[test]
    fn test_tenant_subscription() {
        let id = Uuid::new_v4();
        let t = normalize_tenant(&json!({ "id": id.to_string(), "name": "Lava Bem", "subscription_status": "past_due" })).unwrap();
        assert_eq!(t.subscription_status, SubscriptionStatus::PastDue);

        let t = normalize_tenant(&json!({ "id": id.to_string(), "name": "Lava Bem" })).unwrap();
        assert_eq!(t.subscription_status, SubscriptionStatus::Trialing);

        assert!(normalize_tenant(&json!({ "id": id.to_string(), "name": "X", "subscription_status": "gold" })).is_err());
    }

    #[test]
    fn test_customer_and_service() {
        let c = normalize_customer(&json!({ "id": "5", "name": " Ana ", "email": "", "phone": "1199" }), tenant()).unwrap();
        assert_eq!(c.id, 5);
        assert_eq!(c.name, "Ana");
        assert_eq!(c.email, None);
        assert_eq!(c.tenant_id, tenant());

        let s = normalize_service(&json!({ "id": 2, "name": "Passadoria", "price": 15.5 })).unwrap();
        assert_eq!(s.price.centavos(), 1550);
        assert_eq!(s.tenant_id, None);
        assert_eq!(s.description, "");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2024-01-05T10:00:00.123456+00:00").is_some());
        assert!(parse_timestamp("2024-01-05 10:00:00.5+00").is_some());
        assert!(parse_timestamp("2024-01-05 10:00:00").is_some());
        assert!(parse_timestamp("05/01/2024").is_none());
    }
}
