//! Item donations.

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::{id_from, list_from};
use ecoswap_session::ApiClient;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Body of `POST /donations`: an existing listing, or a bare title for an
/// item that was never listed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewDonation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl NewDonation {
    pub fn item(item_id: i64) -> Self {
        Self {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    fn validate(&self) -> MarketplaceResult<()> {
        let has_title = self.title.as_deref().is_some_and(|t| !t.trim().is_empty());
        if self.item_id.is_none() && !has_title {
            return Err(MarketplaceError::InvalidRequest(
                "a donation needs an item id or a title".to_string(),
            ));
        }
        Ok(())
    }
}

/// What the server reports for a new donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationReceipt {
    pub donation_id: i64,
    pub points_earned: i64,
}

/// `/donations`.
pub struct Donations<'a> {
    client: &'a ApiClient,
}

impl<'a> Donations<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> MarketplaceResult<Vec<Value>> {
        let body: Value = self.client.get_json("/donations", &[]).await?;
        list_from(body, "donations")
    }

    pub async fn get(&self, donation_id: i64) -> MarketplaceResult<Value> {
        Ok(self
            .client
            .get_json(&format!("/donations/{donation_id}"), &[])
            .await?)
    }

    /// Donate an item. Earned points are added to the session balance.
    pub async fn create(&self, donation: &NewDonation) -> MarketplaceResult<DonationReceipt> {
        donation.validate()?;
        let body: Value = self.client.post_json("/donations", donation).await?;

        let receipt = DonationReceipt {
            donation_id: id_from(&body, "donation_id")?,
            points_earned: body.get("points_earned").and_then(Value::as_i64).unwrap_or(0),
        };

        let session = self.client.session();
        session.set_eco_points(session.eco_points() + receipt.points_earned);
        info!(
            donation_id = receipt.donation_id,
            points_earned = receipt.points_earned,
            "Donation created"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::signed_in;
    use ecoswap_session::Method;
    use serde_json::json;

    #[test]
    fn test_donation_needs_item_or_title() {
        assert!(NewDonation::item(3).validate().is_ok());
        assert!(NewDonation::titled("Winter boots").validate().is_ok());
        assert!(NewDonation::titled("  ").validate().is_err());
        assert!(NewDonation::default().validate().is_err());
    }

    #[tokio::test]
    async fn test_list_unwraps_envelope() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/donations",
            200,
            json!({"donations": [{"id": 1}, {"id": 2}, {"id": 3}]}),
        );

        let donations = Donations::new(&client).list().await.unwrap();
        assert_eq!(donations.len(), 3);
    }

    #[tokio::test]
    async fn test_create_adds_points_to_balance() {
        let (transport, client) = signed_in();
        client.session().set_eco_points(40);
        transport.reply(
            Method::Post,
            "/donations",
            201,
            json!({"message": "Donation created successfully", "donation_id": 8, "points_earned": 10}),
        );

        let receipt = Donations::new(&client)
            .create(&NewDonation::titled("Winter boots").to("Shelter"))
            .await
            .unwrap();

        assert_eq!(
            receipt,
            DonationReceipt {
                donation_id: 8,
                points_earned: 10
            }
        );
        assert_eq!(client.session().eco_points(), 50);
        assert_eq!(
            transport.last().body,
            Some(json!({"title": "Winter boots", "recipient": "Shelter"}))
        );
    }
}
