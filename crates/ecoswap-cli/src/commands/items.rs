//! Item listing commands.

use super::{report, Context};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use ecoswap_marketplace::{Category, ItemCondition, ItemFilter, ItemStatus, NewItem};

const ITEM_COLUMNS: &[(&str, usize, &[&str])] = &[
    ("ID", 6, &["item_id", "id"]),
    ("Title", 30, &["title"]),
    ("Category", 9, &["category"]),
    ("Size", 6, &["size"]),
    ("Condition", 12, &["item_condition", "condition"]),
    ("Status", 10, &["item_status", "status"]),
];

/// Browse listings, hiding the caller's own.
pub async fn items_list(
    ctx: &Context,
    filter: ItemFilter,
    include_mine: bool,
    format: &OutputFormat,
) -> Result<()> {
    let filter = match ctx.session.current_user() {
        Some(user) if !include_mine => filter.exclude_user(user.user_id),
        _ => filter,
    };

    match ctx.market.items().list(&filter).await {
        Ok(items) => output::print_table(&items, ITEM_COLUMNS, "No items found", format),
        Err(e) => report(e, format),
    }
}

/// The caller's own listings.
pub async fn items_mine(ctx: &Context, format: &OutputFormat) -> Result<()> {
    match ctx.market.items().mine().await {
        Ok(items) => output::print_table(&items, ITEM_COLUMNS, "You have no listings", format),
        Err(e) => report(e, format),
    }
}

/// Show one item.
pub async fn items_show(ctx: &Context, id: i64, format: &OutputFormat) -> Result<()> {
    let item = match ctx.market.items().get(id).await {
        Ok(item) => item,
        Err(e) => return report(e, format),
    };

    match format {
        OutputFormat::Json => output::print_json(&item),
        OutputFormat::Text => {
            output::print_heading("Item Details");
            for (label, field) in [
                ("ID", "item_id"),
                ("Title", "title"),
                ("Description", "description"),
                ("Category", "category"),
                ("Brand", "brand"),
                ("Size", "size"),
                ("Color", "color"),
                ("Condition", "item_condition"),
                ("Status", "item_status"),
                ("Pickup", "pickup_location"),
            ] {
                output::print_row(label, &output::field(&item, field));
            }
            if let Some(seller) = item.get("seller").filter(|s| s.is_object()) {
                output::print_row(
                    "Seller",
                    &format!(
                        "{} (id {})",
                        output::field(seller, "name"),
                        output::first_field(seller, &["id", "user_id"])
                    ),
                );
            }
            Ok(())
        }
    }
}

/// Arguments for listing a new item.
pub struct AddItemArgs {
    pub title: String,
    pub category: Category,
    pub condition: ItemCondition,
    pub status: ItemStatus,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub pickup_location: Option<String>,
}

/// List a new item.
pub async fn items_add(ctx: &Context, args: AddItemArgs, format: &OutputFormat) -> Result<()> {
    let mut item = NewItem::new(args.title, args.category, args.condition);
    item.item_status = args.status;
    item.description = args.description;
    item.brand = args.brand;
    item.size = args.size;
    item.color = args.color;
    item.image_url = args.image_url;
    item.pickup_location = args.pickup_location;

    match ctx.market.items().create(&item).await {
        Ok(id) => {
            output::print_success(&format!("Item listed with id {}", id), format);
            Ok(())
        }
        Err(e) => report(e, format),
    }
}

/// Delete one of the caller's items.
pub async fn items_delete(ctx: &Context, id: i64, format: &OutputFormat) -> Result<()> {
    match ctx.market.items().delete(id).await {
        Ok(()) => {
            output::print_success(&format!("Item {} deleted", id), format);
            Ok(())
        }
        Err(e) => report(e, format),
    }
}
