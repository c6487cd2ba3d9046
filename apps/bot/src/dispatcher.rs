//! Routes incoming messages to per-session workers.
//!
//! One worker task per `(chat_id, user_id)`, each owning its `Conversation`
//! and handling its messages strictly in order. Sessions run concurrently.
//! A worker idle for `idle_timeout` asks to be retired; the dispatcher agrees
//! only if nothing was routed to it since, so no message is ever lost.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::conversation::{Conversation, Input, SessionKey, Step};
use crate::flow::{generate_and_deliver, BotContext};
use crate::telegram::{Message, TelegramClient};

/// Pause before polling again after a failed `getUpdates`.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

struct SessionHandle {
    worker_id: u64,
    tx: mpsc::UnboundedSender<Message>,
    routed: u64,
}

#[derive(Debug)]
struct RetireRequest {
    key: SessionKey,
    worker_id: u64,
    handled: u64,
}

pub struct Dispatcher {
    ctx: Arc<BotContext>,
    idle_timeout: Duration,
    sessions: HashMap<SessionKey, SessionHandle>,
    next_worker_id: u64,
    retire_tx: mpsc::UnboundedSender<RetireRequest>,
    retire_rx: mpsc::UnboundedReceiver<RetireRequest>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BotContext>, idle_timeout: Duration) -> Self {
        let (retire_tx, retire_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            idle_timeout,
            sessions: HashMap::new(),
            next_worker_id: 0,
            retire_tx,
            retire_rx,
        }
    }

    /// Dispatches until the update stream ends.
    pub async fn run(mut self, mut updates: mpsc::Receiver<Message>) {
        loop {
            tokio::select! {
                message = updates.recv() => match message {
                    Some(message) => self.dispatch(message),
                    None => break,
                },
                Some(request) = self.retire_rx.recv() => self.retire(request),
            }
        }
        info!("Update stream closed, {} session(s) still open", self.sessions.len());
    }

    fn dispatch(&mut self, message: Message) {
        let key = SessionKey {
            chat_id: message.chat.id,
            user_id: message.user_id(),
        };

        let message = match self.sessions.get_mut(&key) {
            Some(handle) => match handle.tx.send(message) {
                Ok(()) => {
                    handle.routed += 1;
                    return;
                }
                // Worker is gone; start over with a fresh one.
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let mut handle = self.spawn_worker(key);
        if handle.tx.send(message).is_ok() {
            handle.routed += 1;
        }
        self.sessions.insert(key, handle);
    }

    fn spawn_worker(&mut self, key: SessionKey) -> SessionHandle {
        let worker_id = self.next_worker_id;
        self.next_worker_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(
            self.ctx.clone(),
            key,
            worker_id,
            rx,
            self.idle_timeout,
            self.retire_tx.clone(),
        ));
        debug!(
            chat_id = key.chat_id,
            user_id = key.user_id,
            "Started session worker {worker_id}"
        );

        SessionHandle {
            worker_id,
            tx,
            routed: 0,
        }
    }

    fn retire(&mut self, request: RetireRequest) {
        let idle = self.sessions.get(&request.key).is_some_and(|handle| {
            handle.worker_id == request.worker_id && handle.routed == request.handled
        });
        if idle {
            // Dropping the sender ends the worker.
            self.sessions.remove(&request.key);
            debug!(
                chat_id = request.key.chat_id,
                user_id = request.key.user_id,
                "Retired idle session worker {}",
                request.worker_id
            );
        }
    }
}

async fn run_worker(
    ctx: Arc<BotContext>,
    key: SessionKey,
    worker_id: u64,
    mut rx: mpsc::UnboundedReceiver<Message>,
    idle_timeout: Duration,
    retire_tx: mpsc::UnboundedSender<RetireRequest>,
) {
    let mut conversation = Conversation::new();
    let mut handled = 0u64;
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(message)) => {
                handled += 1;
                handle_message(&ctx, key, &mut conversation, message).await;
            }
            Ok(None) => break,
            Err(_) => {
                let request = RetireRequest {
                    key,
                    worker_id,
                    handled,
                };
                if retire_tx.send(request).is_err() {
                    break;
                }
            }
        }
    }
}

async fn handle_message(
    ctx: &BotContext,
    key: SessionKey,
    conversation: &mut Conversation,
    message: Message,
) {
    let input = Input::from_text(message.text.as_deref());
    match conversation.handle(input) {
        Step::Reply(text) => {
            // Quote the sender in group chats.
            let reply_to = (key.chat_id != key.user_id).then_some(message.message_id);
            if let Err(e) = ctx.transport.send_text(key.chat_id, text, reply_to).await {
                warn!("Failed to reply in chat {}: {e}", key.chat_id);
            }
        }
        Step::Submit(request) => {
            info!(
                chat_id = key.chat_id,
                user_id = key.user_id,
                "Generating CV for {}",
                request.name
            );
            generate_and_deliver(ctx, key, request).await;
        }
        Step::Ignore => {}
    }
    debug!(chat_id = key.chat_id, user_id = key.user_id, state = ?conversation.state(), "Message handled");
}

/// Long-polls Telegram and forwards every message, in update order.
pub async fn poll_updates(client: TelegramClient, tx: mpsc::Sender<Message>) {
    let mut offset = 0;
    loop {
        match client.get_updates(offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some(message) = update.message {
                        if tx.send(message).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("getUpdates failed: {e}");
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
            }
        }
    }
}
