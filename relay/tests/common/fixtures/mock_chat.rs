//! Mock chat platform server capturing what the bots send
//!
//! Serves both the Discord channel message endpoint and the Telegram Bot API
//! methods used by the relay, so one instance can back either adapter.

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{
    matchers::{method, path, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

use super::test_data::chat::TELEGRAM_TOKEN;

/// Message delivered to a channel or chat
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub target: String,
    pub text: String,
}

pub struct MockChatServer {
    pub server: MockServer,
    pub base_url: String,
    updates: Arc<Mutex<VecDeque<Value>>>,
    next_update_id: Mutex<i64>,
}

impl MockChatServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        let mock = Self {
            server,
            base_url,
            updates: Arc::new(Mutex::new(VecDeque::new())),
            next_update_id: Mutex::new(100),
        };
        mock.mock_discord().await;
        mock.mock_telegram().await;
        mock
    }

    async fn mock_discord(&self) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/channels/[0-9]+/messages$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
            .mount(&self.server)
            .await;
    }

    async fn mock_telegram(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/sendMessage", TELEGRAM_TOKEN)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "message_id": 1 }
            })))
            .mount(&self.server)
            .await;

        let updates = self.updates.clone();
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/getUpdates", TELEGRAM_TOKEN)))
            .respond_with(move |_: &Request| {
                let pending: Vec<Value> = updates.lock().unwrap().drain(..).collect();
                let response = ResponseTemplate::new(200).set_body_json(json!({
                    "ok": true,
                    "result": pending
                }));
                // Stand in for the long poll when nothing is queued
                if pending.is_empty() {
                    response.set_delay(Duration::from_millis(100))
                } else {
                    response
                }
            })
            .mount(&self.server)
            .await;
    }

    /// Queues a Telegram text message for the next `getUpdates`
    pub fn push_telegram_message(&self, chat_id: i64, user_id: i64, username: &str, text: &str) {
        let mut next_id = self.next_update_id.lock().unwrap();
        *next_id += 1;

        self.updates.lock().unwrap().push_back(json!({
            "update_id": *next_id,
            "message": {
                "message_id": *next_id,
                "date": 1700000000,
                "chat": { "id": chat_id, "type": "group" },
                "from": { "id": user_id, "is_bot": false, "username": username },
                "text": text
            }
        }));
    }

    /// Discord channel messages received so far
    pub async fn discord_messages(&self) -> Vec<SentMessage> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.url.path().starts_with("/channels/"))
            .filter_map(|request| {
                let target = request.url.path_segments()?.nth(1)?.to_string();
                let body: Value = request.body_json().ok()?;
                Some(SentMessage {
                    target,
                    text: body.get("content")?.as_str()?.to_string(),
                })
            })
            .collect()
    }

    /// Telegram `sendMessage` calls received so far
    pub async fn telegram_messages(&self) -> Vec<SentMessage> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.url.path().ends_with("/sendMessage"))
            .filter_map(|request| {
                let body: Value = request.body_json().ok()?;
                Some(SentMessage {
                    target: body.get("chat_id")?.as_str()?.to_string(),
                    text: body.get("text")?.as_str()?.to_string(),
                })
            })
            .collect()
    }

    /// Polls until `count` Telegram messages arrived or `timeout` passed
    pub async fn wait_for_telegram_messages(&self, count: usize, timeout: Duration) -> Vec<SentMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let messages = self.telegram_messages().await;
            if messages.len() >= count || tokio::time::Instant::now() >= deadline {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub async fn wait_for_discord_messages(&self, count: usize, timeout: Duration) -> Vec<SentMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let messages = self.discord_messages().await;
            if messages.len() >= count || tokio::time::Instant::now() >= deadline {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Waits until the bot issued `count` `getUpdates` calls
    ///
    /// The first call drops pending updates, so messages must be queued after it.
    pub async fn wait_for_update_polls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let polls = self
                .requests()
                .await
                .iter()
                .filter(|request| request.url.path().ends_with("/getUpdates"))
                .count();
            if polls >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
