//! Messaging commands.

use super::{report, Context};
use crate::output::{self, OutputFormat};
use anyhow::Result;

/// List conversations with their latest message.
pub async fn messages_conversations(ctx: &Context, format: &OutputFormat) -> Result<()> {
    match ctx.market.messaging().inbox().await {
        Ok(conversations) => output::print_table(
            &conversations,
            &[
                ("ID", 6, &["conversation_id", "id"]),
                ("With", 20, &["other_user_name", "name", "other_user_id"]),
                ("Last message", 40, &["last_message", "text"]),
            ],
            "No conversations",
            format,
        ),
        Err(e) => report(e, format),
    }
}

/// Show the messages of one conversation.
pub async fn messages_thread(ctx: &Context, conversation: i64, format: &OutputFormat) -> Result<()> {
    let messages = match ctx.market.messaging().thread(conversation).await {
        Ok(messages) => messages,
        Err(e) => return report(e, format),
    };

    if let OutputFormat::Json = format {
        return output::print_json(&messages);
    }
    if messages.is_empty() {
        println!("No messages yet");
    }
    for message in &messages {
        let from_self = message
            .get("is_self")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let sender = if from_self {
            "you".to_string()
        } else {
            output::first_field(message, &["sender_name", "sender_id"])
        };
        println!(
            "[{}] {}: {}",
            output::first_field(message, &["created_at", "timestamp"]),
            sender,
            output::first_field(message, &["text", "message_text"])
        );
    }
    Ok(())
}

/// Open a conversation with another user.
pub async fn messages_start(ctx: &Context, user: i64, format: &OutputFormat) -> Result<()> {
    match ctx.market.messaging().start_conversation(user).await {
        Ok(id) => {
            output::print_success(&format!("Conversation {} ready", id), format);
            Ok(())
        }
        Err(e) => report(e, format),
    }
}

/// Send a message.
pub async fn messages_send(
    ctx: &Context,
    conversation: i64,
    text: &str,
    format: &OutputFormat,
) -> Result<()> {
    match ctx.market.messaging().send(conversation, text).await {
        Ok(_) => {
            output::print_success("Message sent", format);
            Ok(())
        }
        Err(e) => report(e, format),
    }
}
