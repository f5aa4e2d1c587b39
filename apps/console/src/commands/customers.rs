//! # Customer Commands

use anyhow::Result;
use lavapro_core::access::ViewAction;
use lavapro_core::NewCustomer;

use super::Context;
use crate::cli::CustomerArgs;
use crate::error::CliError;
use crate::render;

pub async fn list(ctx: &Context) -> Result<()> {
    ctx.require(ViewAction::Customers, "the customer list").await?;
    let data = ctx.dashboard.data().data().map_err(CliError::from)?;

    if ctx.json {
        return ctx.print_json(&data.customers);
    }
    if data.customers.is_empty() {
        println!("No customers yet");
        return Ok(());
    }
    print!("{}", render::customers_table(&data.customers));
    println!("{} customers", data.customers.len());
    Ok(())
}

pub async fn add(ctx: &Context, args: CustomerArgs) -> Result<()> {
    ctx.require(ViewAction::Customers, "registering customers").await?;
    let input = NewCustomer {
        name: args.name,
        email: args.email,
        phone: args.phone,
        address: args.address,
    };
    let customer = ctx
        .dashboard
        .create_customer(&input)
        .await
        .map_err(CliError::from)?;

    ctx.flush_notices();
    if ctx.json {
        return ctx.print_json(&customer);
    }
    println!("Customer #{}", customer.id);
    Ok(())
}

pub async fn register(ctx: &Context, args: CustomerArgs) -> Result<()> {
    ctx.require(ViewAction::OwnOrders, "completing a customer registration").await?;
    let input = NewCustomer {
        name: args.name,
        email: args.email,
        phone: args.phone,
        address: args.address,
    };
    let customer = ctx
        .dashboard
        .register_self(&input)
        .await
        .map_err(CliError::from)?;

    ctx.flush_notices();
    if ctx.json {
        return ctx.print_json(&customer);
    }
    println!("Registered as customer #{}", customer.id);
    Ok(())
}
