//! Eco-point balance and history.

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::list_from;
use ecoswap_session::{ApiClient, RequestDescriptor};
use serde_json::Value;
use tracing::debug;

/// One page of `GET /eco_points/transactions`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPage {
    pub transactions: Vec<Value>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl TransactionPage {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// `/eco_points`.
pub struct EcoPoints<'a> {
    client: &'a ApiClient,
}

impl<'a> EcoPoints<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the balance and store it on the session.
    pub async fn balance(&self) -> MarketplaceResult<i64> {
        let body: Value = self.client.get_json("/eco_points", &[]).await?;
        let total = body.get("total").and_then(Value::as_i64).ok_or_else(|| {
            MarketplaceError::InvalidResponse("eco points response carried no `total`".to_string())
        })?;

        self.client.session().set_eco_points(total);
        debug!(total, "Eco points refreshed");
        Ok(total)
    }

    /// Transaction history, newest first. Pages start at 1.
    pub async fn transactions(&self, page: u32, limit: u32) -> MarketplaceResult<TransactionPage> {
        let page = page.max(1);
        let limit = limit.max(1);
        let descriptor = RequestDescriptor::get("/eco_points/transactions")
            .with_query("page", page)
            .with_query("limit", limit);
        let body: Value = self.client.execute_json(descriptor).await?;

        let number = |field: &str| body.get(field).and_then(Value::as_u64);
        // Counters past u32 saturate instead of truncating.
        let counter = |field: &str| number(field).map(|n| u32::try_from(n).unwrap_or(u32::MAX));
        let total = number("total").unwrap_or(0);
        let pages = counter("pages").unwrap_or(0);
        let page = counter("page").unwrap_or(page);
        let limit = counter("limit").unwrap_or(limit);

        Ok(TransactionPage {
            transactions: list_from(body, "transactions")?,
            total,
            page,
            limit,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::signed_in;
    use ecoswap_session::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_balance_updates_session() {
        let (transport, client) = signed_in();
        transport.reply(Method::Get, "/eco_points", 200, json!({"total": 120}));

        let total = EcoPoints::new(&client).balance().await.unwrap();

        assert_eq!(total, 120);
        assert_eq!(client.session().eco_points(), 120);
    }

    #[tokio::test]
    async fn test_balance_without_total_is_invalid() {
        let (transport, client) = signed_in();
        transport.reply(Method::Get, "/eco_points", 200, json!({}));
        client.session().set_eco_points(5);

        let err = EcoPoints::new(&client).balance().await.unwrap_err();

        assert!(matches!(err, MarketplaceError::InvalidResponse(_)));
        assert_eq!(client.session().eco_points(), 5);
    }

    #[tokio::test]
    async fn test_transactions_page() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/eco_points/transactions",
            200,
            json!({
                "transactions": [{"id": 1, "type": "Earn", "points": 10}],
                "total": 21,
                "page": 2,
                "limit": 10,
                "pages": 3
            }),
        );

        let page = EcoPoints::new(&client).transactions(2, 10).await.unwrap();

        assert_eq!(page.transactions.len(), 1);
        assert_eq!(page.total, 21);
        assert!(page.has_next());
        assert_eq!(
            transport.last().query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_counters_saturate() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/eco_points/transactions",
            200,
            json!({
                "transactions": [],
                "total": 5_000_000_000u64,
                "page": 1,
                "limit": 10,
                "pages": 4_294_967_297u64
            }),
        );

        let page = EcoPoints::new(&client).transactions(1, 10).await.unwrap();

        assert_eq!(page.total, 5_000_000_000);
        assert_eq!(page.pages, u32::MAX);
        assert!(page.has_next());
    }
}
