//! The message dispatcher — ack-then-work core of the bot.
//!
//! Envelopes arrive already acknowledged (see `socket`). The dispatcher
//! filters and classifies them, marks accepted messages with a receipt
//! reaction, and enqueues the work. Exactly one worker drains the queue
//! in FIFO order and performs the (possibly minutes-long) model call,
//! so replies always land in the order the messages arrived and event
//! intake is never blocked behind a slow answer.
//!
//! Slash commands never touch the queue: clearing history is cheap and
//! should feel instantaneous.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use docent_core::bus::queue::{EnqueueError, WorkQueue};
use docent_core::bus::types::{WorkItem, WorkKind};
use docent_core::utils::truncate_string;
use docent_models::traits::ResponseModel;

use crate::api::SlackApi;
use crate::events::{classify, parse_envelope, InboundEvent, SocketEnvelope};

/// Reaction applied when a message is accepted and removed when the
/// worker picks it up.
const RECEIPT_EMOJI: &str = "clock2";

/// Filters, classifies, enqueues, and answers inbound Slack events.
pub struct Dispatcher {
    api: SlackApi,
    model: Arc<dyn ResponseModel>,
    queue: WorkQueue,
    reset_command: String,
    worker_started: AtomicBool,
}

impl Dispatcher {
    pub fn new(
        api: SlackApi,
        model: Arc<dyn ResponseModel>,
        reset_command: impl Into<String>,
        queue_capacity: usize,
    ) -> Self {
        Dispatcher {
            api,
            model,
            queue: WorkQueue::new(queue_capacity),
            reset_command: reset_command.into(),
            worker_started: AtomicBool::new(false),
        }
    }

    /// Spawn the single worker that drains the queue for the life of
    /// the process. Exactly one worker may exist; a second one would
    /// race the first for items and break reply ordering.
    pub fn spawn_worker(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let already = self.worker_started.swap(true, Ordering::SeqCst);
        assert!(!already, "dispatcher worker is already running");

        let dispatcher = self.clone();
        tokio::spawn(async move {
            info!("worker started, waiting for messages");
            while let Some(item) = dispatcher.queue.next().await {
                dispatcher.process_item(item).await;
            }
            info!("work queue closed, worker exiting");
        })
    }

    /// Handle one acknowledged envelope. Fast: the model is never
    /// called inline on this path, so the connection keeps acking new
    /// envelopes while earlier questions are still being answered.
    pub async fn on_envelope(&self, envelope: SocketEnvelope) {
        let Some(event) = parse_envelope(&envelope) else {
            return;
        };
        match event {
            InboundEvent::SlashCommand {
                command,
                user_id,
                channel_id,
            } => self.on_slash_command(&command, &user_id, &channel_id).await,
            event => self.on_event(event).await,
        }
    }

    /// Number of items currently queued.
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    async fn on_event(&self, event: InboundEvent) {
        let Some(item) = classify(&event) else {
            return;
        };

        // Let the sender see their request was received before the
        // (possibly slow) answer arrives.
        self.api
            .add_reaction(&item.channel, &item.ts, RECEIPT_EMOJI)
            .await;

        match self.queue.enqueue(item) {
            Ok(()) => {
                info!(
                    depth = self.queue.depth(),
                    capacity = self.queue.capacity(),
                    "message queued"
                );
            }
            Err(e @ EnqueueError::Full { .. }) => {
                // The receipt reaction stands with no answer following;
                // dropping beats blocking the ack path.
                warn!(error = %e, "work queue full, dropping message");
            }
            Err(e) => {
                error!(error = %e, "failed to enqueue message");
            }
        }
    }

    /// The synchronous slash-command path. Only the reset command is
    /// recognized; it is matched by prefix against the configured name.
    async fn on_slash_command(&self, command: &str, user_id: &str, channel_id: &str) {
        if !command.starts_with(&self.reset_command) {
            info!(command = %command, "ignoring unrecognized slash command");
            return;
        }

        info!(user_id = %user_id, "clearing conversation history");
        let message = if self.model.clear_history(user_id) {
            "History cleared"
        } else {
            "No history to clear"
        };

        if let Err(e) = self.api.post_message(channel_id, message).await {
            error!(error = %e, "failed to post history confirmation");
        }
    }

    /// Answer one queued message. Every failure is contained here, at
    /// the item boundary; a bad request never takes the worker down.
    async fn process_item(&self, item: WorkItem) {
        info!(
            user_id = %item.user_id,
            text = %truncate_string(&item.text, 80),
            "processing message"
        );

        self.api
            .remove_reaction(&item.channel, &item.ts, RECEIPT_EMOJI)
            .await;

        let reply = match item.kind {
            WorkKind::DirectMessage => self.model.direct_message(&item.text, &item.user_id).await,
            WorkKind::ChannelMention => {
                self.model.channel_mention(&item.text, &item.user_id).await
            }
        };

        if let Some(ref emoji) = reply.emoji {
            self.api.add_reaction(&item.channel, &item.ts, emoji).await;
        }

        match reply.message.filter(|m| !m.is_empty()) {
            Some(message) => {
                let text = format!(
                    "<@{}>, you asked me: '{}'.\n{}",
                    item.user_id, item.text, message
                );
                if let Err(e) = self.api.post_message(&item.channel, &text).await {
                    error!(error = %e, "failed to post reply");
                }
            }
            None => info!("no reply was generated"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use docent_models::traits::{ModelReply, ReplyStream};

    /// A model that echoes input and tracks sessions by hand.
    struct MockModel {
        calls: Mutex<Vec<String>>,
        sessions: Mutex<HashSet<String>>,
    }

    impl MockModel {
        fn new() -> Self {
            MockModel {
                calls: Mutex::new(Vec::new()),
                sessions: Mutex::new(HashSet::new()),
            }
        }

        fn with_session(user_id: &str) -> Self {
            let model = Self::new();
            model.sessions.lock().unwrap().insert(user_id.to_string());
            model
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResponseModel for MockModel {
        async fn direct_message(&self, message: &str, user_id: &str) -> ModelReply {
            self.calls.lock().unwrap().push(format!("dm:{message}"));
            self.sessions.lock().unwrap().insert(user_id.to_string());
            ModelReply::new(format!("echo: {message}")).with_emoji("robot_face")
        }

        async fn channel_mention(&self, message: &str, user_id: &str) -> ModelReply {
            self.calls.lock().unwrap().push(format!("mention:{message}"));
            self.sessions.lock().unwrap().insert(user_id.to_string());
            ModelReply::new(format!("echo: {message}")).with_emoji("robot_face")
        }

        async fn stream_message(&self, _message: &str, _user_id: &str) -> ReplyStream {
            Box::pin(futures_util::stream::empty())
        }

        fn clear_history(&self, user_id: &str) -> bool {
            self.sessions.lock().unwrap().remove(user_id)
        }

        fn display_name(&self) -> &str {
            "Mock"
        }
    }

    async fn mount_slack_ok(server: &MockServer) {
        for api_path in ["/reactions.add", "/reactions.remove", "/chat.postMessage"] {
            Mock::given(method("POST"))
                .and(path(api_path))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
                .mount(server)
                .await;
        }
    }

    fn make_dispatcher(
        server: &MockServer,
        model: Arc<MockModel>,
        capacity: usize,
    ) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(
            SlackApi::with_api_base("xoxb-test", server.uri()),
            model,
            "/clear_history",
            capacity,
        ))
    }

    fn message_envelope(text: &str, user: &str, ts: &str) -> SocketEnvelope {
        SocketEnvelope {
            envelope_id: format!("eid-{ts}"),
            envelope_type: "events_api".to_string(),
            payload: json!({ "event": {
                "type": "message",
                "channel": "D1",
                "ts": ts,
                "text": text,
                "user": user
            }}),
        }
    }

    fn mention_envelope(text: &str, user: &str) -> SocketEnvelope {
        SocketEnvelope {
            envelope_id: "eid-m".to_string(),
            envelope_type: "events_api".to_string(),
            payload: json!({ "event": {
                "type": "app_mention",
                "channel": "C1",
                "ts": "9.0",
                "text": text,
                "user": user
            }}),
        }
    }

    fn slash_envelope(command: &str, user: &str) -> SocketEnvelope {
        SocketEnvelope {
            envelope_id: "eid-s".to_string(),
            envelope_type: "slash_commands".to_string(),
            payload: json!({
                "command": command,
                "user_id": user,
                "channel_id": "D1"
            }),
        }
    }

    /// Requests to a given API path, in arrival order.
    async fn requests_to(server: &MockServer, api_path: &str) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == api_path)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    /// Poll until `n` messages have been posted (or time out).
    async fn wait_for_posts(server: &MockServer, n: usize) -> Vec<Value> {
        for _ in 0..100 {
            let posts = requests_to(server, "/chat.postMessage").await;
            if posts.len() >= n {
                return posts;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for {n} posted message(s)");
    }

    // ── Happy paths ──

    #[tokio::test]
    async fn test_direct_message_happy_path() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::new());
        let dispatcher = make_dispatcher(&server, model.clone(), 12);
        dispatcher.spawn_worker();

        dispatcher
            .on_envelope(message_envelope("hi", "U1", "1.0"))
            .await;

        let posts = wait_for_posts(&server, 1).await;
        let text = posts[0]["text"].as_str().unwrap();
        assert!(text.contains("<@U1>"));
        assert!(text.contains("'hi'"));
        assert!(text.contains("echo: hi"));
        assert_eq!(model.calls(), vec!["dm:hi"]);

        // Receipt reaction added then removed, model emoji applied.
        let adds = requests_to(&server, "/reactions.add").await;
        let removes = requests_to(&server, "/reactions.remove").await;
        assert_eq!(adds[0]["name"], "clock2");
        assert_eq!(removes[0]["name"], "clock2");
        assert_eq!(adds[1]["name"], "robot_face");
    }

    #[tokio::test]
    async fn test_mention_routes_to_channel_mention() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::new());
        let dispatcher = make_dispatcher(&server, model.clone(), 12);
        dispatcher.spawn_worker();

        dispatcher
            .on_envelope(mention_envelope("what is lunch?", "U2"))
            .await;

        wait_for_posts(&server, 1).await;
        assert_eq!(model.calls(), vec!["mention:what is lunch?"]);
    }

    #[tokio::test]
    async fn test_replies_follow_enqueue_order() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::new());
        let dispatcher = make_dispatcher(&server, model.clone(), 12);

        // Queue everything before the worker exists so all three are
        // pending together.
        for (i, user) in ["U1", "U2", "U1"].iter().enumerate() {
            dispatcher
                .on_envelope(message_envelope(&format!("q{i}"), user, &format!("{i}.0")))
                .await;
        }
        dispatcher.spawn_worker();

        let posts = wait_for_posts(&server, 3).await;
        let texts: Vec<&str> = posts.iter().map(|p| p["text"].as_str().unwrap()).collect();
        assert!(texts[0].contains("q0"));
        assert!(texts[1].contains("q1"));
        assert!(texts[2].contains("q2"));
    }

    // ── Filtering ──

    #[tokio::test]
    async fn test_bot_echo_suppressed() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::new());
        let dispatcher = make_dispatcher(&server, model.clone(), 12);
        dispatcher.spawn_worker();

        let mut envelope = message_envelope("hi", "U1", "1.0");
        envelope.payload["event"]["bot_id"] = json!("B99");
        dispatcher.on_envelope(envelope).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edited_message_suppressed() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let dispatcher = make_dispatcher(&server, Arc::new(MockModel::new()), 12);

        let mut envelope = message_envelope("hi", "U1", "1.0");
        envelope.payload["event"]["subtype"] = json!("message_changed");
        dispatcher.on_envelope(envelope).await;

        assert_eq!(dispatcher.queue_depth(), 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_envelope_dropped() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let dispatcher = make_dispatcher(&server, Arc::new(MockModel::new()), 12);
        dispatcher
            .on_envelope(SocketEnvelope {
                envelope_id: "eid-x".into(),
                envelope_type: "events_api".into(),
                payload: json!({}),
            })
            .await;

        assert_eq!(dispatcher.queue_depth(), 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    // ── Backpressure ──

    #[tokio::test]
    async fn test_queue_overflow_drops_excess() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::new());
        let dispatcher = make_dispatcher(&server, model.clone(), 2);

        // No worker yet: the third message finds the queue full.
        for i in 0..3 {
            dispatcher
                .on_envelope(message_envelope(&format!("q{i}"), "U1", &format!("{i}.0")))
                .await;
        }
        assert_eq!(dispatcher.queue_depth(), 2);

        // All three got the receipt reaction; the dropped one keeps it
        // with no answer ever following.
        assert_eq!(requests_to(&server, "/reactions.add").await.len(), 3);

        dispatcher.spawn_worker();
        wait_for_posts(&server, 2).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let posts = requests_to(&server, "/chat.postMessage").await;
        assert_eq!(posts.len(), 2);
        assert!(!posts
            .iter()
            .any(|p| p["text"].as_str().unwrap().contains("q2")));
    }

    // ── Slash commands ──

    #[tokio::test]
    async fn test_reset_with_history() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::with_session("U1"));
        let dispatcher = make_dispatcher(&server, model, 12);

        dispatcher
            .on_envelope(slash_envelope("/clear_history", "U1"))
            .await;

        let posts = requests_to(&server, "/chat.postMessage").await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["text"], "History cleared");
        // Bypasses the queue entirely.
        assert_eq!(dispatcher.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_reset_without_history() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let dispatcher = make_dispatcher(&server, Arc::new(MockModel::new()), 12);
        dispatcher
            .on_envelope(slash_envelope("/clear_history", "U1"))
            .await;

        let posts = requests_to(&server, "/chat.postMessage").await;
        assert_eq!(posts[0]["text"], "No history to clear");
    }

    #[tokio::test]
    async fn test_reset_matches_by_prefix() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let model = Arc::new(MockModel::with_session("U1"));
        let dispatcher = make_dispatcher(&server, model, 12);

        dispatcher
            .on_envelope(slash_envelope("/clear_history_please", "U1"))
            .await;

        let posts = requests_to(&server, "/chat.postMessage").await;
        assert_eq!(posts[0]["text"], "History cleared");
    }

    #[tokio::test]
    async fn test_unrecognized_command_ignored() {
        let server = MockServer::start().await;
        mount_slack_ok(&server).await;

        let dispatcher = make_dispatcher(&server, Arc::new(MockModel::new()), 12);
        dispatcher.on_envelope(slash_envelope("/weather", "U1")).await;

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    // ── Failure isolation ──

    #[tokio::test]
    async fn test_post_failure_does_not_stop_worker() {
        let server = MockServer::start().await;
        for api_path in ["/reactions.add", "/reactions.remove"] {
            Mock::given(method("POST"))
                .and(path(api_path))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
                .mount(&server)
                .await;
        }
        // First post fails, the rest succeed.
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "error": "channel_not_found"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let model = Arc::new(MockModel::new());
        let dispatcher = make_dispatcher(&server, model.clone(), 12);
        dispatcher
            .on_envelope(message_envelope("first", "U1", "1.0"))
            .await;
        dispatcher
            .on_envelope(message_envelope("second", "U1", "2.0"))
            .await;
        dispatcher.spawn_worker();

        // Both items get processed despite the first post failing.
        wait_for_posts(&server, 2).await;
        assert_eq!(model.calls().len(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "already running")]
    async fn test_second_worker_rejected() {
        let server = MockServer::start().await;
        let dispatcher = make_dispatcher(&server, Arc::new(MockModel::new()), 12);
        dispatcher.spawn_worker();
        dispatcher.spawn_worker();
    }
}
