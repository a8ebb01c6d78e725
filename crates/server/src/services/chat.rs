//! Live chat relay.
//!
//! Each session is isolated: one reply is produced per inbound message, in
//! order, and nothing is persisted or broadcast. The session ends when the
//! client half-closes or the transport breaks; an inbound error simply
//! terminates the outbound stream.

use std::pin::Pin;

use boxoffice_proto::proto::{ChatMessage, chat_service_server::ChatService};
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};

/// Bidirectional chat echo service.
#[derive(Debug, Default)]
pub struct ChatServiceImpl;

/// The deterministic per-message transform: the reply tags the sender.
fn echo_reply(inbound: &ChatMessage) -> ChatMessage {
    ChatMessage {
        user: "Server".to_string(),
        text: format!("Hello {}, you said: {}", inbound.user, inbound.text),
    }
}

/// Maps an inbound session to its outbound session, one reply per message.
///
/// Lazy: each reply is produced as its inbound message is consumed, never
/// buffering more than the message in flight.
fn relay<S>(inbound: S) -> impl Stream<Item = Result<ChatMessage, Status>>
where
    S: Stream<Item = Result<ChatMessage, Status>>,
{
    inbound.map(|item| item.map(|msg| echo_reply(&msg)))
}

#[tonic::async_trait]
impl ChatService for ChatServiceImpl {
    type LiveChatStream = Pin<Box<dyn Stream<Item = Result<ChatMessage, Status>> + Send>>;

    async fn live_chat(
        &self,
        request: Request<Streaming<ChatMessage>>,
    ) -> Result<Response<Self::LiveChatStream>, Status> {
        tracing::info!(service = "chat", method = "live_chat", "Chat session opened");
        Ok(Response::new(Box::pin(relay(request.into_inner()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(user: &str, text: &str) -> ChatMessage {
        ChatMessage {
            user: user.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn reply_tags_the_sender_deterministically() {
        let reply = echo_reply(&msg("u", "hi"));
        assert_eq!(reply.user, "Server");
        assert_eq!(reply.text, "Hello u, you said: hi");
    }

    #[tokio::test]
    async fn n_messages_in_yield_n_replies_in_order() {
        let inbound = futures::stream::iter(vec![
            Ok(msg("ayu", "one")),
            Ok(msg("budi", "two")),
            Ok(msg("ayu", "three")),
        ]);

        let replies: Vec<ChatMessage> = relay(inbound)
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0].text, "Hello ayu, you said: one");
        assert_eq!(replies[1].text, "Hello budi, you said: two");
        assert_eq!(replies[2].text, "Hello ayu, you said: three");
        assert!(replies.iter().all(|r| r.user == "Server"));
    }

    #[tokio::test]
    async fn transport_error_ends_the_session() {
        let inbound = futures::stream::iter(vec![
            Ok(msg("ayu", "one")),
            Err(Status::unavailable("gone")),
        ]);

        let mut out = Box::pin(relay(inbound));
        assert!(out.next().await.unwrap().is_ok());
        assert!(out.next().await.unwrap().is_err());
        assert!(out.next().await.is_none());
    }
}
