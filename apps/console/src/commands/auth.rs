//! # Auth Commands

use anyhow::{Context as _, Result};
use lavapro_baas::SignUpOutcome;
use lavapro_core::ViewState;
use std::io::{self, BufRead, Write};
use tracing::info;

use super::Context;
use crate::error::CliError;
use crate::render::view_label;

fn read_password(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report_view(email: &str, view: ViewState) {
    println!("Signed in as {} ({})", email.trim(), view_label(view));
    if view == ViewState::UnknownRole {
        println!("This account has no role yet; ask the laundry owner to assign one.");
    }
}

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password("Password: ")?,
    };
    let view = ctx
        .dashboard
        .sign_in_with_password(email, &password)
        .await
        .map_err(CliError::from)?;
    ctx.persist(None)?;
    info!(view = ?view, "Login complete");

    report_view(email, view);
    if ctx.demo {
        println!("Demo mode: pass --email and --password to other commands.");
    }
    Ok(())
}

pub async fn magic_link(ctx: &Context, email: &str, redirect_to: Option<&str>) -> Result<()> {
    ctx.dashboard
        .send_magic_link(email, redirect_to)
        .await
        .map_err(CliError::from)?;
    ctx.flush_notices();
    println!("Then run: lavapro verify {} <code>", email.trim());
    Ok(())
}

pub async fn verify(ctx: &Context, email: &str, code: &str) -> Result<()> {
    let view = ctx
        .dashboard
        .verify_otp(email, code)
        .await
        .map_err(CliError::from)?;
    ctx.persist(None)?;
    report_view(email, view);
    Ok(())
}

pub async fn signup(ctx: &Context, email: &str, name: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password("Choose a password: ")?,
    };
    let (outcome, view) = ctx
        .dashboard
        .sign_up(email, &password, name)
        .await
        .map_err(CliError::from)?;

    match outcome {
        SignUpOutcome::SignedIn(_) => {
            ctx.persist(None)?;
            report_view(email, view);
        }
        SignUpOutcome::ConfirmationRequired { email } => {
            ctx.flush_notices();
            println!("Confirmation sent to {}; sign in after confirming.", email);
        }
    }
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let stored = ctx.session_file.as_ref().and_then(|f| f.load());
    if stored.is_some() {
        ctx.dashboard.start(stored).await;
    }
    ctx.dashboard.sign_out().await;
    if let Some(file) = &ctx.session_file {
        file.clear()?;
    }
    println!("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let view = ctx.signed_in().await?;
    let settings = ctx.dashboard.settings().ok();

    if ctx.json {
        return match &settings {
            Some(settings) => ctx.print_json(settings),
            None => ctx.print_json(&serde_json::json!({
                "email": ctx.dashboard.session().current().and_then(|s| s.user.email),
                "view": view_label(view),
            })),
        };
    }

    match settings {
        Some(s) => {
            println!("{} <{}>", s.full_name, s.email.as_deref().unwrap_or("-"));
            println!("{} at {}", s.role_label, s.tenant_name);
        }
        None => {
            let email = ctx
                .dashboard
                .session()
                .current()
                .and_then(|s| s.user.email)
                .unwrap_or_default();
            println!("{}", email);
        }
    }
    println!("View: {}", view_label(view));
    Ok(())
}
