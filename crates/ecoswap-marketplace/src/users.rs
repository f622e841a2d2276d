//! User profiles.

use crate::entity_from;
use crate::error::{MarketplaceError, MarketplaceResult};
use ecoswap_session::ApiClient;
use ecoswap_storage::UserProfile;
use serde_json::Value;
use tracing::debug;

/// `/users/me` and `/users/user/{id}`.
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the caller's profile and replace the cached one with it.
    pub async fn me(&self) -> MarketplaceResult<UserProfile> {
        let body: Value = self.client.get_json("/users/me", &[]).await?;
        let user = entity_from(body, "user");
        if !user.is_object() {
            return Err(MarketplaceError::InvalidResponse(
                "profile response carried no user".to_string(),
            ));
        }
        let profile: UserProfile = serde_json::from_value(user)?;

        let session = self.client.session();
        session.update_user(&profile)?;
        session.set_eco_points(profile.eco_points);
        debug!(user_id = %profile.user_id, "Profile refreshed");
        Ok(profile)
    }

    /// Public profile of another user, with their listings.
    pub async fn get(&self, user_id: i64) -> MarketplaceResult<Value> {
        Ok(self
            .client
            .get_json(&format!("/users/user/{user_id}"), &[])
            .await?)
    }
}
