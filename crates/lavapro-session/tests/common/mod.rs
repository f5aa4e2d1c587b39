//! Shared fixtures: a dashboard over the demo dataset.

#![allow(dead_code)]

use lavapro_baas::demo::{self, DEMO_PASSWORD};
use lavapro_baas::{Baas, MemoryBackend};
use lavapro_session::{Dashboard, DashboardOptions};
use std::sync::Arc;

pub const OWNER: &str = "dono@bolhaazul.com.br";
pub const ADMIN: &str = "admin@bolhaazul.com.br";
pub const STAFF: &str = "equipe@bolhaazul.com.br";
pub const CUSTOMER: &str = "cliente@bolhaazul.com.br";
pub const COURIER: &str = "entregas@bolhaazul.com.br";
pub const NO_PROFILE: &str = "novo@bolhaazul.com.br";
pub const OTHER_ADMIN: &str = "admin@lavarapido.com.br";

pub fn demo() -> (Dashboard, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    demo::seed(&backend, chrono::Utc::now());
    let dashboard = Dashboard::new(Baas::new(backend.clone()), DashboardOptions::default());
    (dashboard, backend)
}

pub async fn signed_in(email: &str) -> (Dashboard, Arc<MemoryBackend>) {
    let (dashboard, backend) = demo();
    dashboard
        .sign_in_with_password(email, DEMO_PASSWORD)
        .await
        .expect("demo sign-in");
    (dashboard, backend)
}
