//! Clothing item listings.

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::vocab::{Category, ItemCondition, ItemStatus};
use crate::{entity_from, id_from, list_from};
use ecoswap_session::{ApiClient, RequestDescriptor};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Query for `GET /clothes`.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<Category>,
    /// Matches any of these statuses.
    pub statuses: Vec<ItemStatus>,
    pub size: Option<String>,
    pub search: Option<String>,
    /// Hide listings owned by this user (normally the caller).
    pub exclude_user: Option<String>,
    pub limit: Option<u32>,
}

impl ItemFilter {
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn exclude_user(mut self, user_id: impl Into<String>) -> Self {
        self.exclude_user = Some(user_id.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn apply(&self, mut descriptor: RequestDescriptor) -> RequestDescriptor {
        if let Some(category) = self.category {
            descriptor = descriptor.with_query("category", category);
        }
        if !self.statuses.is_empty() {
            let statuses: Vec<&str> = self.statuses.iter().map(ItemStatus::as_str).collect();
            descriptor = descriptor.with_query("item_status", statuses.join(","));
        }
        if let Some(size) = self.size.as_deref().filter(|s| !s.is_empty()) {
            descriptor = descriptor.with_query("size", size);
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            descriptor = descriptor.with_query("search", search);
        }
        if let Some(user) = &self.exclude_user {
            descriptor = descriptor.with_query("exclude_user", user);
        }
        if let Some(limit) = self.limit {
            descriptor = descriptor.with_query("limit", limit);
        }
        descriptor
    }
}

/// Body of `POST /add_cloth`.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    pub title: String,
    pub category: Category,
    pub item_condition: ItemCondition,
    pub item_status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_longitude: Option<f64>,
}

impl NewItem {
    pub fn new(title: impl Into<String>, category: Category, condition: ItemCondition) -> Self {
        Self {
            title: title.into(),
            category,
            item_condition: condition,
            item_status: ItemStatus::default(),
            description: None,
            brand: None,
            size: None,
            color: None,
            image_url: None,
            pickup_location: None,
            pickup_latitude: None,
            pickup_longitude: None,
        }
    }

    fn validate(&self) -> MarketplaceResult<()> {
        if self.title.trim().is_empty() {
            return Err(MarketplaceError::InvalidRequest(
                "item title is required".to_string(),
            ));
        }
        if self.pickup_latitude.is_some() != self.pickup_longitude.is_some() {
            return Err(MarketplaceError::InvalidRequest(
                "pickup latitude and longitude must be given together".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `PUT /update_cloth/{id}`. Only the fields set are changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_condition: Option<ItemCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
}

/// `/clothes`, `/cloth/{id}`, `/add_cloth`, `/update_cloth/{id}`.
pub struct Items<'a> {
    client: &'a ApiClient,
}

impl<'a> Items<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Browse listings.
    pub async fn list(&self, filter: &ItemFilter) -> MarketplaceResult<Vec<Value>> {
        let descriptor = filter.apply(RequestDescriptor::get("/clothes"));
        let body: Value = self.client.execute_json(descriptor).await?;
        let items = list_from(body, "items")?;
        debug!(count = items.len(), "Fetched listings");
        Ok(items)
    }

    pub async fn get(&self, item_id: i64) -> MarketplaceResult<Value> {
        let body: Value = self
            .client
            .get_json(&format!("/cloth/{item_id}"), &[])
            .await?;
        Ok(entity_from(body, "item"))
    }

    /// The caller's own listings.
    pub async fn mine(&self) -> MarketplaceResult<Vec<Value>> {
        let body: Value = self.client.get_json("/users/user/my-items", &[]).await?;
        list_from(body, "items")
    }

    /// List a new item. Returns its id.
    pub async fn create(&self, item: &NewItem) -> MarketplaceResult<i64> {
        item.validate()?;
        let body: Value = self.client.post_json("/add_cloth", item).await?;
        let item_id = id_from(&body, "item_id")?;
        info!(item_id, "Item listed");
        Ok(item_id)
    }

    pub async fn update(&self, item_id: i64, update: &ItemUpdate) -> MarketplaceResult<()> {
        if serde_json::to_value(update)?
            .as_object()
            .is_some_and(|fields| fields.is_empty())
        {
            return Err(MarketplaceError::InvalidRequest(
                "nothing to update".to_string(),
            ));
        }
        let _: Value = self
            .client
            .put_json(&format!("/update_cloth/{item_id}"), update)
            .await?;
        info!(item_id, "Item updated");
        Ok(())
    }

    pub async fn delete(&self, item_id: i64) -> MarketplaceResult<()> {
        let _: Value = self.client.delete_json(&format!("/cloth/{item_id}")).await?;
        info!(item_id, "Item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::signed_in;
    use ecoswap_session::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_sends_filters_as_query() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/clothes",
            200,
            json!({"items": [{"id": 1}, {"id": 2}], "count": 2}),
        );

        let filter = ItemFilter::default()
            .category(Category::Women)
            .status(ItemStatus::Available)
            .status(ItemStatus::All)
            .status(ItemStatus::Available)
            .search("  denim ")
            .exclude_user("7")
            .limit(10);
        let items = Items::new(&client).list(&filter).await.unwrap();

        assert_eq!(items.len(), 2);
        let sent = transport.last();
        assert_eq!(sent.bearer_token(), Some("T1"));
        assert_eq!(
            sent.query,
            vec![
                ("category".to_string(), "Women".to_string()),
                ("item_status".to_string(), "Available,All".to_string()),
                ("search".to_string(), "denim".to_string()),
                ("exclude_user".to_string(), "7".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_unwraps_item() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/cloth/5",
            200,
            json!({"item": {"id": 5, "title": "Wool coat"}}),
        );

        let item = Items::new(&client).get(5).await.unwrap();
        assert_eq!(item["title"], "Wool coat");
    }

    #[tokio::test]
    async fn test_get_missing_item_is_status_error() {
        let (_transport, client) = signed_in();

        let err = Items::new(&client).get(404).await.unwrap_err();
        match err {
            MarketplaceError::Api(api) => assert_eq!(api.status(), Some(404)),
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_serializes_vocabulary_and_returns_id() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Post,
            "/add_cloth",
            201,
            json!({"message": "Clothing item added successfully", "item_id": 42}),
        );

        let mut item = NewItem::new("Linen shirt", Category::Men, ItemCondition::GentlyUsed);
        item.size = Some("M".into());
        let id = Items::new(&client).create(&item).await.unwrap();

        assert_eq!(id, 42);
        let body = transport.last().body.unwrap();
        assert_eq!(body["item_condition"], "Gently Used");
        assert_eq!(body["item_status"], "Available");
        assert_eq!(body["size"], "M");
        assert!(body.get("brand").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_without_sending() {
        let (transport, client) = signed_in();

        let item = NewItem::new("   ", Category::Kids, ItemCondition::New);
        let err = Items::new(&client).create(&item).await.unwrap_err();

        assert!(matches!(err, MarketplaceError::InvalidRequest(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let (transport, client) = signed_in();

        let err = Items::new(&client)
            .update(3, &ItemUpdate::default())
            .await
            .unwrap_err();

        assert!(matches!(err, MarketplaceError::InvalidRequest(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_paths() {
        let (transport, client) = signed_in();
        transport.reply(Method::Put, "/update_cloth/3", 200, json!({"message": "ok"}));
        transport.reply(Method::Delete, "/cloth/3", 200, json!({"message": "ok"}));

        let update = ItemUpdate {
            item_status: Some(ItemStatus::Donated),
            ..Default::default()
        };
        Items::new(&client).update(3, &update).await.unwrap();
        Items::new(&client).delete(3).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].body, Some(json!({"item_status": "Donated"})));
        assert_eq!(sent[1].method, Method::Delete);
    }
}
