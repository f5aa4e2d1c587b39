//! # Catalog and Settings Commands

use anyhow::Result;
use lavapro_core::access::ViewAction;
use lavapro_core::{Money, NewService};
use lavapro_session::SessionError;

use super::Context;
use crate::cli::ServiceArgs;
use crate::error::CliError;
use crate::render;

/// The public catalog; works without signing in.
pub async fn list(ctx: &Context) -> Result<()> {
    let services = ctx.dashboard.catalog().await.map_err(CliError::from)?;

    if ctx.json {
        return ctx.print_json(&services);
    }
    if services.is_empty() {
        println!("The catalog is empty");
        return Ok(());
    }
    print!("{}", render::services_table(&services));
    Ok(())
}

pub async fn add(ctx: &Context, args: ServiceArgs) -> Result<()> {
    let price = Money::parse_decimal(&args.price)
        .map_err(|e| CliError::from(SessionError::Validation(e)))?;
    ctx.require(ViewAction::Catalog, "editing the catalog").await?;

    let input = NewService {
        name: args.name,
        description: args.description,
        price,
        icon: args.icon,
    };
    let service = ctx
        .dashboard
        .create_service(&input)
        .await
        .map_err(CliError::from)?;

    ctx.flush_notices();
    if ctx.json {
        return ctx.print_json(&service);
    }
    println!("Service #{} at {}", service.id, service.price);
    Ok(())
}

pub async fn settings(ctx: &Context) -> Result<()> {
    ctx.signed_in().await?;
    let settings = ctx.dashboard.settings().map_err(CliError::from)?;

    if ctx.json {
        return ctx.print_json(&settings);
    }

    let mut table = render::Table::new(["SETTING", "VALUE"]);
    table.row(vec!["Name".to_string(), settings.full_name.clone()]);
    table.row(vec![
        "Email".to_string(),
        settings.email.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.row(vec!["Role".to_string(), settings.role_label.clone()]);
    table.row(vec!["Laundry".to_string(), settings.tenant_name.clone()]);
    table.row(vec!["Subscription".to_string(), settings.subscription_label.clone()]);
    print!("{}", table.render());

    let caps = &settings.capabilities;
    let allowed: Vec<&str> = [
        (caps.edit_orders, "edit orders"),
        (caps.manage_customers, "manage customers"),
        (caps.register_self, "complete registration"),
        (caps.manage_catalog, "manage catalog"),
        (caps.advance_deliveries, "advance deliveries"),
        (caps.manage_subscription, "manage subscription"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, label)| *label)
    .collect();
    if !allowed.is_empty() {
        println!();
        println!("Can {}", allowed.join(", "));
    }
    Ok(())
}
