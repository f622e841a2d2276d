//! Donation commands.

use super::{report, Context};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use ecoswap_marketplace::NewDonation;

/// List the caller's donations.
pub async fn donations_list(ctx: &Context, format: &OutputFormat) -> Result<()> {
    match ctx.market.donations().list().await {
        Ok(donations) => output::print_table(
            &donations,
            &[
                ("ID", 6, &["id", "donation_id"]),
                ("Title", 30, &["title"]),
                ("Recipient", 20, &["recipient"]),
                ("Date", 26, &["donation_date", "date"]),
            ],
            "No donations yet",
            format,
        ),
        Err(e) => report(e, format),
    }
}

/// Donate a listed item, or an unlisted one by title.
pub async fn donations_create(
    ctx: &Context,
    item: Option<i64>,
    title: Option<String>,
    recipient: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let donation = NewDonation {
        item_id: item,
        title,
        recipient,
    };

    match ctx.market.donations().create(&donation).await {
        Ok(receipt) => {
            output::print_success(
                &format!(
                    "Donation {} recorded, {} eco points earned",
                    receipt.donation_id, receipt.points_earned
                ),
                format,
            );
            Ok(())
        }
        Err(e) => report(e, format),
    }
}
