//! # Order Commands
//!
//! Dashboard summary, order list, status board and the two ways an order
//! moves: staff set any forward status, couriers advance one step.

use anyhow::Result;
use lavapro_core::access::{ViewAction, COURIER_STATUSES};
use lavapro_core::lifecycle::{parse_status, Transition};
use lavapro_core::{DeliveryKind, Order, OrderStatus, ViewState};
use tracing::debug;

use super::Context;
use crate::cli::OrderFilter;
use crate::error::CliError;
use crate::render;

fn status_arg(label: &str) -> Result<OrderStatus, CliError> {
    parse_status(label).ok_or_else(|| CliError::Usage(format!("unknown order status '{}'", label)))
}

/// Applies search, status filter and limit, newest first.
pub fn filter_orders<'a>(
    orders: &'a [Order],
    search: impl Fn(&'a [Order]) -> Vec<&'a Order>,
    status: Option<OrderStatus>,
    limit: usize,
) -> Vec<&'a Order> {
    let mut hits = search(orders);
    if let Some(status) = status {
        hits.retain(|o| o.status == status);
    }
    hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    hits.truncate(limit);
    hits
}

pub async fn dashboard(ctx: &Context, recent: usize) -> Result<()> {
    let view = ctx.signed_in().await?;
    if view == ViewState::UnknownRole {
        return Err(CliError::Unavailable("this account has no role assigned".to_string()).into());
    }
    let data = ctx.dashboard.data().data().map_err(CliError::from)?;

    if ctx.json {
        return ctx.print_json(&data.stats);
    }

    println!("{} · {}", data.tenant.name, data.role.label_pt());
    println!();
    print!("{}", render::stats(&data.stats));
    if data.skipped_rows > 0 {
        println!("({} unreadable rows skipped)", data.skipped_rows);
    }
    println!();
    println!("Recent orders");
    print!("{}", render::orders_table(&data.recent(recent)));
    Ok(())
}

pub async fn list(ctx: &Context, filter: &OrderFilter) -> Result<()> {
    let status = filter.status.as_deref().map(status_arg).transpose()?;
    let view = ctx.signed_in().await?;
    if !view.actions().contains(&ViewAction::Orders) && !view.actions().contains(&ViewAction::OwnOrders) {
        return Err(CliError::Unavailable(format!(
            "orders are not available on the {}",
            render::view_label(view)
        ))
        .into());
    }
    let data = ctx.dashboard.data().data().map_err(CliError::from)?;

    let query = filter.search.clone().unwrap_or_default();
    let orders = filter_orders(
        &data.orders,
        |orders| lavapro_core::board::search_orders(orders, &query),
        status,
        filter.limit,
    );
    debug!(shown = orders.len(), total = data.orders.len(), "Orders filtered");

    if ctx.json {
        return ctx.print_json(&orders);
    }
    if orders.is_empty() {
        println!("No orders found");
        return Ok(());
    }
    print!("{}", render::orders_table(&orders));
    Ok(())
}

pub async fn board(ctx: &Context) -> Result<()> {
    ctx.require(ViewAction::Board, "the status board").await?;
    let data = ctx.dashboard.data().data().map_err(CliError::from)?;

    if ctx.json {
        return ctx.print_json(&data.board);
    }
    for column in &data.board {
        println!("== {} ({}) ==", column.title, column.orders.len());
        for order in &column.orders {
            println!(
                "  #{:<5} {:<24} {:<22} {}",
                order.id, order.customer_name, order.service_name, order.total_price
            );
        }
        println!();
    }
    Ok(())
}

pub async fn set_status(ctx: &Context, order_id: i64, status: &str) -> Result<()> {
    let status = status_arg(status)?;
    ctx.require(ViewAction::Orders, "changing order status").await?;

    let transition = ctx
        .dashboard
        .update_order_status(order_id, status)
        .await
        .map_err(CliError::from)?;
    if transition == Transition::Unchanged {
        debug!(order_id, "Order already in the requested status, nothing written");
    }
    ctx.flush_notices();
    Ok(())
}

pub async fn deliveries(ctx: &Context) -> Result<()> {
    let view = ctx.signed_in().await?;
    if !view.actions().contains(&ViewAction::Deliveries) && !view.actions().contains(&ViewAction::Orders) {
        return Err(CliError::Unavailable(format!(
            "deliveries are not available on the {}",
            render::view_label(view)
        ))
        .into());
    }
    let data = ctx.dashboard.data().data().map_err(CliError::from)?;

    let mut open: Vec<&Order> = data
        .orders
        .iter()
        .filter(|o| o.delivery.kind == DeliveryKind::Delivery && COURIER_STATUSES.contains(&o.status))
        .collect();
    open.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    if ctx.json {
        return ctx.print_json(&open);
    }
    if open.is_empty() {
        println!("No open deliveries");
        return Ok(());
    }
    print!("{}", render::deliveries_table(&open));
    Ok(())
}

pub async fn advance(ctx: &Context, order_id: i64) -> Result<()> {
    ctx.require(ViewAction::Deliveries, "advancing deliveries").await?;
    ctx.dashboard
        .advance_delivery(order_id)
        .await
        .map_err(CliError::from)?;
    ctx.flush_notices();
    Ok(())
}
