//! Exchange requests between users.

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::{id_from, list_from};
use ecoswap_session::{ApiClient, RequestDescriptor};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::info;

/// Which side of the exchange requests to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeFilter {
    #[default]
    All,
    /// Requests the caller made
    Sent,
    /// Requests for the caller's items
    Received,
}

impl ExchangeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

impl FromStr for ExchangeFilter {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "sent" => Ok(Self::Sent),
            "received" => Ok(Self::Received),
            other => Err(MarketplaceError::InvalidValue {
                field: "exchange filter",
                value: other.to_string(),
                expected: "all, sent, received".to_string(),
            }),
        }
    }
}

/// Body of `POST /exchange`: an item, points, or both offered for another item.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeOffer {
    pub requested_item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offered_item_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offered_points: Option<i64>,
}

impl ExchangeOffer {
    pub fn item(requested_item_id: i64, offered_item_id: i64) -> Self {
        Self {
            requested_item_id,
            offered_item_id: Some(offered_item_id),
            offered_points: None,
        }
    }

    pub fn points(requested_item_id: i64, points: i64) -> Self {
        Self {
            requested_item_id,
            offered_item_id: None,
            offered_points: Some(points),
        }
    }

    fn validate(&self) -> MarketplaceResult<()> {
        let offers_points = self.offered_points.is_some_and(|p| p > 0);
        if self.offered_item_id.is_none() && !offers_points {
            return Err(MarketplaceError::InvalidRequest(
                "an exchange must offer an item or a positive number of points".to_string(),
            ));
        }
        if self.offered_points.is_some_and(|p| p < 0) {
            return Err(MarketplaceError::InvalidRequest(
                "offered points cannot be negative".to_string(),
            ));
        }
        if self.offered_item_id == Some(self.requested_item_id) {
            return Err(MarketplaceError::InvalidRequest(
                "cannot offer the requested item for itself".to_string(),
            ));
        }
        Ok(())
    }
}

/// `/exchange` and its accept/reject actions.
pub struct Exchanges<'a> {
    client: &'a ApiClient,
}

impl<'a> Exchanges<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: ExchangeFilter) -> MarketplaceResult<Vec<Value>> {
        let mut descriptor = RequestDescriptor::get("/exchange");
        if filter != ExchangeFilter::All {
            descriptor = descriptor.with_query("filter", filter.as_str());
        }
        let body: Value = self.client.execute_json(descriptor).await?;
        list_from(body, "requests")
    }

    pub async fn get(&self, exchange_id: i64) -> MarketplaceResult<Value> {
        Ok(self
            .client
            .get_json(&format!("/exchange/{exchange_id}"), &[])
            .await?)
    }

    /// Request an exchange. Returns the new exchange id.
    pub async fn request(&self, offer: &ExchangeOffer) -> MarketplaceResult<i64> {
        offer.validate()?;
        let body: Value = self.client.post_json("/exchange", offer).await?;
        let exchange_id = id_from(&body, "exchange_id")?;
        info!(
            exchange_id,
            requested_item_id = offer.requested_item_id,
            "Exchange requested"
        );
        Ok(exchange_id)
    }

    /// Accept a request for one of the caller's items. Returns the server's
    /// summary (bonus points, exchange value).
    pub async fn accept(&self, exchange_id: i64) -> MarketplaceResult<Value> {
        let body: Value = self
            .client
            .execute_json(RequestDescriptor::post(format!(
                "/exchange/{exchange_id}/accept"
            )))
            .await?;
        info!(exchange_id, "Exchange accepted");
        Ok(body)
    }

    pub async fn reject(&self, exchange_id: i64) -> MarketplaceResult<()> {
        let _: Value = self
            .client
            .execute_json(RequestDescriptor::post(format!(
                "/exchange/{exchange_id}/reject"
            )))
            .await?;
        info!(exchange_id, "Exchange rejected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::signed_in;
    use ecoswap_session::Method;
    use serde_json::json;

    #[test]
    fn test_offer_validation() {
        assert!(ExchangeOffer::item(1, 2).validate().is_ok());
        assert!(ExchangeOffer::points(1, 30).validate().is_ok());
        assert!(ExchangeOffer::points(1, 0).validate().is_err());
        assert!(ExchangeOffer::item(1, 1).validate().is_err());

        let negative = ExchangeOffer {
            requested_item_id: 1,
            offered_item_id: Some(2),
            offered_points: Some(-5),
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Sent".parse::<ExchangeFilter>().unwrap(), ExchangeFilter::Sent);
        assert!("pending".parse::<ExchangeFilter>().is_err());
    }

    #[tokio::test]
    async fn test_list_filters_by_side() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/exchange",
            200,
            json!({"requests": [{"id": 1, "status": "Pending"}]}),
        );

        let all = Exchanges::new(&client).list(ExchangeFilter::All).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(transport.last().query.is_empty());

        Exchanges::new(&client)
            .list(ExchangeFilter::Received)
            .await
            .unwrap();
        assert_eq!(
            transport.last().query,
            vec![("filter".to_string(), "received".to_string())]
        );
    }

    #[tokio::test]
    async fn test_request_posts_offer() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Post,
            "/exchange",
            201,
            json!({"message": "Exchange request created successfully", "exchange_id": 11}),
        );

        let id = Exchanges::new(&client)
            .request(&ExchangeOffer::points(4, 25))
            .await
            .unwrap();

        assert_eq!(id, 11);
        assert_eq!(
            transport.last().body,
            Some(json!({"requested_item_id": 4, "offered_points": 25}))
        );
    }

    #[tokio::test]
    async fn test_accept_returns_summary() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Post,
            "/exchange/11/accept",
            200,
            json!({"message": "Exchange request accepted successfully", "bonus_points": 10}),
        );

        let summary = Exchanges::new(&client).accept(11).await.unwrap();
        assert_eq!(summary["bonus_points"], 10);
    }

    #[tokio::test]
    async fn test_reject_surfaces_server_message() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Post,
            "/exchange/11/reject",
            403,
            json!({"error": "Only the item owner can reject this request"}),
        );

        let err = Exchanges::new(&client).reject(11).await.unwrap_err();
        match err {
            MarketplaceError::Api(api) => {
                assert_eq!(api.status(), Some(403));
                assert_eq!(
                    api.server_message().as_deref(),
                    Some("Only the item owner can reject this request")
                );
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
