//! Eco-point commands.

use super::{report, Context};
use crate::output::{self, OutputFormat};
use anyhow::Result;

/// Show the current balance.
pub async fn points_balance(ctx: &Context, format: &OutputFormat) -> Result<()> {
    match ctx.market.points().balance().await {
        Ok(total) => match format {
            OutputFormat::Json => output::print_json(&serde_json::json!({ "total": total })),
            OutputFormat::Text => {
                println!("Eco points: {}", total);
                Ok(())
            }
        },
        Err(e) => report(e, format),
    }
}

/// Show one page of transaction history.
pub async fn points_history(
    ctx: &Context,
    page: u32,
    limit: u32,
    format: &OutputFormat,
) -> Result<()> {
    let history = match ctx.market.points().transactions(page, limit).await {
        Ok(history) => history,
        Err(e) => return report(e, format),
    };

    if let OutputFormat::Json = format {
        return output::print_json(&serde_json::json!({
            "transactions": history.transactions,
            "total": history.total,
            "page": history.page,
            "limit": history.limit,
            "pages": history.pages,
        }));
    }

    output::print_table(
        &history.transactions,
        &[
            ("Date", 26, &["date", "transaction_date"]),
            ("Type", 6, &["type", "transaction_type"]),
            ("Points", 7, &["points"]),
            ("Note", 40, &["note", "reason"]),
        ],
        "No transactions",
        format,
    )?;
    println!(
        "\nPage {} of {} ({} transactions)",
        history.page,
        history.pages.max(1),
        history.total
    );
    if history.has_next() {
        println!("Next page: ecoswap points history --page {}", history.page + 1);
    }
    Ok(())
}
