//! # Console Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (context, dispatch)
//! ├── auth.rs       ◄─── login, magic-link, verify, signup, logout, whoami
//! ├── orders.rs     ◄─── dashboard, orders, board, set-status,
//! │                      deliveries, advance
//! ├── customers.rs  ◄─── customers, add-customer
//! └── catalog.rs    ◄─── catalog, add-service, settings
//! ```
//!
//! ## How a Command Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  --email/--password given?                                              │
//! │     yes ──► sign in for this run only                                   │
//! │     no  ──► session.toml ──► Dashboard::start (validate / refresh)      │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │             rotated tokens written back, revoked ones removed           │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │             view offers the action? ──no──► "not available" (exit 1)    │
//! │                                   │                                     │
//! │                                  yes ──► run, print, flush notices      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod catalog;
pub mod customers;
pub mod orders;

use anyhow::Result;
use lavapro_baas::AuthSession;
use lavapro_core::access::ViewAction;
use lavapro_core::ViewState;
use lavapro_session::{Dashboard, NotificationKind};
use serde::Serialize;
use tracing::debug;

use crate::cli::Command;
use crate::error::CliError;
use crate::render::view_label;
use crate::session_file::SessionFile;

/// Everything a command needs.
pub struct Context {
    pub dashboard: Dashboard,
    /// `None` when sessions are not kept between runs.
    pub session_file: Option<SessionFile>,
    pub credentials: Option<(String, String)>,
    pub json: bool,
    pub demo: bool,
}

impl Context {
    /// Establishes the session for this run and returns the resulting view.
    pub async fn connect(&self) -> Result<ViewState, CliError> {
        if let Some((email, password)) = &self.credentials {
            debug!(%email, "Signing in for this run");
            return Ok(self.dashboard.sign_in_with_password(email, password).await?);
        }

        let stored = self.session_file.as_ref().and_then(SessionFile::load);
        let view = self.dashboard.start(stored.clone()).await;
        self.persist(stored.as_ref())?;
        Ok(view)
    }

    /// Like [`Context::connect`], but a signed-out result is an error.
    pub async fn signed_in(&self) -> Result<ViewState, CliError> {
        let view = self.connect().await?;
        if view == ViewState::Unauthenticated {
            if self.demo && self.credentials.is_none() {
                return Err(CliError::Unavailable(
                    "demo mode keeps no session between runs; pass --email and --password".to_string(),
                ));
            }
            return Err(CliError::NotSignedIn);
        }
        Ok(view)
    }

    /// Signs in and checks that the resulting view offers `action`.
    pub async fn require(&self, action: ViewAction, what: &str) -> Result<ViewState, CliError> {
        let view = self.signed_in().await?;
        if !view.actions().contains(&action) {
            return Err(CliError::Unavailable(format!(
                "{} is not available on the {}",
                what,
                view_label(view)
            )));
        }
        Ok(view)
    }

    /// Writes rotated tokens back, or removes the file when the session
    /// ended. `previous` is what the file held before.
    pub fn persist(&self, previous: Option<&AuthSession>) -> Result<(), CliError> {
        let Some(file) = &self.session_file else {
            return Ok(());
        };
        match self.dashboard.session().current() {
            Some(current) if previous != Some(&current) => file.save(&current),
            Some(_) => Ok(()),
            None if previous.is_some() => file.clear(),
            None => Ok(()),
        }
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Prints pending success and info notices. Errors surface through the
    /// command result instead.
    pub fn flush_notices(&self) {
        let notifier = self.dashboard.notifier();
        for note in notifier.active() {
            match note.kind {
                NotificationKind::Success => println!("✔ {}", note.message),
                NotificationKind::Info => println!("{}", note.message),
                NotificationKind::Error => {}
            }
            notifier.dismiss(note.id);
        }
    }
}

/// Runs one parsed command.
pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => auth::login(ctx, &email, password).await,
        Command::MagicLink { email, redirect_to } => {
            auth::magic_link(ctx, &email, redirect_to.as_deref()).await
        }
        Command::Verify { email, code } => auth::verify(ctx, &email, &code).await,
        Command::Signup {
            email,
            name,
            password,
        } => auth::signup(ctx, &email, &name, password).await,
        Command::Logout => auth::logout(ctx).await,
        Command::Whoami => auth::whoami(ctx).await,
        Command::Dashboard { recent } => orders::dashboard(ctx, recent).await,
        Command::Orders(filter) => orders::list(ctx, &filter).await,
        Command::Board => orders::board(ctx).await,
        Command::SetStatus { order_id, status } => orders::set_status(ctx, order_id, &status).await,
        Command::Deliveries => orders::deliveries(ctx).await,
        Command::Advance { order_id } => orders::advance(ctx, order_id).await,
        Command::Customers => customers::list(ctx).await,
        Command::AddCustomer(args) => customers::add(ctx, args).await,
        Command::Register(args) => customers::register(ctx, args).await,
        Command::Catalog => catalog::list(ctx).await,
        Command::AddService(args) => catalog::add(ctx, args).await,
        Command::Settings => catalog::settings(ctx).await,
    }
}
