//! Conversations and direct messages.

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::{id_from, list_from};
use ecoswap_session::{ApiClient, RequestDescriptor};
use serde_json::{json, Value};
use tracing::{debug, info};

/// `/conversations` and `/messages`.
pub struct Messaging<'a> {
    client: &'a ApiClient,
}

impl<'a> Messaging<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Conversations the caller takes part in.
    pub async fn conversations(&self) -> MarketplaceResult<Vec<Value>> {
        let body: Value = self.client.get_json("/conversations", &[]).await?;
        list_from(body, "conversations")
    }

    /// Conversation list with the latest message of each, as the inbox shows it.
    pub async fn inbox(&self) -> MarketplaceResult<Vec<Value>> {
        let descriptor = RequestDescriptor::get("/messages").with_query("list", 1);
        let body: Value = self.client.execute_json(descriptor).await?;
        list_from(body, "conversations")
    }

    /// Open (or find) the conversation with another user. Returns its id.
    pub async fn start_conversation(&self, other_user_id: i64) -> MarketplaceResult<i64> {
        let body: Value = self
            .client
            .execute_json(RequestDescriptor::post(format!(
                "/conversations/{other_user_id}"
            )))
            .await?;
        let conversation_id = id_from(&body, "conversation_id")?;
        debug!(conversation_id, other_user_id, "Conversation ready");
        Ok(conversation_id)
    }

    /// Messages of one conversation, oldest first.
    pub async fn thread(&self, conversation_id: i64) -> MarketplaceResult<Vec<Value>> {
        let descriptor =
            RequestDescriptor::get("/messages").with_query("conversation_id", conversation_id);
        let body: Value = self.client.execute_json(descriptor).await?;
        list_from(body, "messages")
    }

    /// Send a message. Returns the stored message.
    pub async fn send(&self, conversation_id: i64, text: &str) -> MarketplaceResult<Value> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MarketplaceError::InvalidRequest(
                "message text is empty".to_string(),
            ));
        }

        let message: Value = self
            .client
            .post_json(
                "/messages",
                &json!({ "conversation_id": conversation_id, "text": text }),
            )
            .await?;
        info!(conversation_id, "Message sent");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::signed_in;
    use ecoswap_session::Method;

    #[tokio::test]
    async fn test_thread_accepts_bare_array() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/messages",
            200,
            json!([{"id": 1, "text": "Hi"}, {"id": 2, "text": "Still available?"}]),
        );

        let messages = Messaging::new(&client).thread(4).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(
            transport.last().query,
            vec![("conversation_id".to_string(), "4".to_string())]
        );
    }

    #[tokio::test]
    async fn test_start_conversation_returns_existing_id() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Post,
            "/conversations/9",
            200,
            json!({"conversation_id": 4, "message": "Conversation already exists"}),
        );

        let id = Messaging::new(&client).start_conversation(9).await.unwrap();
        assert_eq!(id, 4);
        assert_eq!(transport.last().body, None);
    }

    #[tokio::test]
    async fn test_send_trims_and_rejects_empty_text() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Post,
            "/messages",
            201,
            json!({"id": 3, "conversation_id": 4, "text": "Deal", "is_self": true}),
        );

        let messaging = Messaging::new(&client);
        assert!(messaging.send(4, "   ").await.is_err());
        assert!(transport.sent().is_empty());

        let message = messaging.send(4, " Deal ").await.unwrap();
        assert_eq!(message["is_self"], true);
        assert_eq!(
            transport.last().body,
            Some(json!({"conversation_id": 4, "text": "Deal"}))
        );
    }

    #[tokio::test]
    async fn test_conversations_envelope() {
        let (transport, client) = signed_in();
        transport.reply(
            Method::Get,
            "/conversations",
            200,
            json!({"conversations": [{"conversation_id": 4}]}),
        );

        let conversations = Messaging::new(&client).conversations().await.unwrap();
        assert_eq!(conversations[0]["conversation_id"], 4);
    }
}
