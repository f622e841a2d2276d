//! Typed wrappers over the EcoSwap marketplace endpoints.
//!
//! Every call goes through the shared [`ApiClient`], so it carries the bearer
//! token and recovers from an expired one like any other request. Entities
//! come back as `serde_json::Value`; only request bodies and the fixed
//! vocabularies are typed.

mod donations;
mod error;
mod exchanges;
mod items;
mod messages;
mod points;
mod users;
mod vocab;

#[cfg(test)]
mod test_support;

pub use donations::{DonationReceipt, Donations, NewDonation};
pub use error::{MarketplaceError, MarketplaceResult};
pub use exchanges::{ExchangeFilter, ExchangeOffer, Exchanges};
pub use items::{ItemFilter, ItemUpdate, Items, NewItem};
pub use messages::Messaging;
pub use points::{EcoPoints, TransactionPage};
pub use users::Users;
pub use vocab::{Category, ExchangeStatus, ItemCondition, ItemStatus, TransactionType};

use ecoswap_session::ApiClient;
use serde_json::Value;

/// Entry point to the marketplace APIs.
#[derive(Clone)]
pub struct Marketplace {
    client: ApiClient,
}

impl Marketplace {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn items(&self) -> Items<'_> {
        Items::new(&self.client)
    }

    pub fn exchanges(&self) -> Exchanges<'_> {
        Exchanges::new(&self.client)
    }

    pub fn donations(&self) -> Donations<'_> {
        Donations::new(&self.client)
    }

    pub fn points(&self) -> EcoPoints<'_> {
        EcoPoints::new(&self.client)
    }

    pub fn messaging(&self) -> Messaging<'_> {
        Messaging::new(&self.client)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.client)
    }
}

/// Pull the list out of a `{ "<field>": [...] }` envelope. A bare array is
/// accepted as well.
pub(crate) fn list_from(mut body: Value, field: &str) -> MarketplaceResult<Vec<Value>> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(ref mut map) => map.remove(field).unwrap_or(Value::Null),
        _ => Value::Null,
    };

    match list {
        Value::Array(entries) => Ok(entries),
        Value::Null => Ok(Vec::new()),
        other => Err(MarketplaceError::InvalidResponse(format!(
            "expected `{field}` to be a list, got {other}"
        ))),
    }
}

/// Pull an entity out of a `{ "<field>": {...} }` envelope, or return the body
/// itself when it has no such wrapper.
pub(crate) fn entity_from(mut body: Value, field: &str) -> Value {
    match body.get_mut(field) {
        Some(entity) if entity.is_object() => entity.take(),
        _ => body,
    }
}

/// Integer id field of a creation response.
pub(crate) fn id_from(body: &Value, field: &str) -> MarketplaceResult<i64> {
    body.get(field).and_then(Value::as_i64).ok_or_else(|| {
        MarketplaceError::InvalidResponse(format!("response carried no `{field}`"))
    })
}
