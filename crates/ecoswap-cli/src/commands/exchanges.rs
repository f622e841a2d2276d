//! Exchange request commands.

use super::{report, Context};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use ecoswap_marketplace::{ExchangeFilter, ExchangeOffer};

/// List exchange requests.
pub async fn exchanges_list(
    ctx: &Context,
    filter: ExchangeFilter,
    format: &OutputFormat,
) -> Result<()> {
    match ctx.market.exchanges().list(filter).await {
        Ok(requests) => output::print_table(
            &requests,
            &[
                ("ID", 6, &["id", "exchange_id"]),
                ("Requested", 24, &["requested_title", "requested_item_id"]),
                ("Offered", 24, &["offered_title", "offered_points"]),
                ("From", 14, &["requester_name", "requester_id"]),
                ("Status", 10, &["status"]),
            ],
            "No exchange requests",
            format,
        ),
        Err(e) => report(e, format),
    }
}

/// Offer an item and/or points for someone else's item.
pub async fn exchanges_request(
    ctx: &Context,
    item: i64,
    offer_item: Option<i64>,
    offer_points: Option<i64>,
    format: &OutputFormat,
) -> Result<()> {
    let offer = ExchangeOffer {
        requested_item_id: item,
        offered_item_id: offer_item,
        offered_points: offer_points,
    };

    match ctx.market.exchanges().request(&offer).await {
        Ok(id) => {
            output::print_success(&format!("Exchange request {} sent", id), format);
            Ok(())
        }
        Err(e) => report(e, format),
    }
}

/// Accept a request for one of the caller's items.
pub async fn exchanges_accept(ctx: &Context, id: i64, format: &OutputFormat) -> Result<()> {
    let summary = match ctx.market.exchanges().accept(id).await {
        Ok(summary) => summary,
        Err(e) => return report(e, format),
    };

    match format {
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Text => {
            println!("Exchange {} accepted", id);
            if let Some(bonus) = summary.get("bonus_points").and_then(|v| v.as_i64()) {
                println!("Bonus points earned: {}", bonus);
            }
            Ok(())
        }
    }
}

/// Reject a request for one of the caller's items.
pub async fn exchanges_reject(ctx: &Context, id: i64, format: &OutputFormat) -> Result<()> {
    match ctx.market.exchanges().reject(id).await {
        Ok(()) => {
            output::print_success(&format!("Exchange {} rejected", id), format);
            Ok(())
        }
        Err(e) => report(e, format),
    }
}
