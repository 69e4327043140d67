//! Background refresh for long-lived views.
//!
//! Watchers poll the API on a fixed interval and report through an unbounded
//! channel; they stop when cancelled, when dropped, or when the receiver goes away.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::blogs::FeedEntry;
use crate::api::models::{Balance, ResolvedAccount};
use crate::client::BankClient;

/// Update produced by a watcher
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Balance(Balance),
    Blogs(Vec<FeedEntry>),
    /// A poll failed; the watcher keeps running
    Error(String),
}

/// A cancellable polling task; `poll` returns `false` once nobody is listening
struct PollTask {
    cancellation_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PollTask {
    fn spawn<F, Fut>(name: &'static str, period: Duration, mut poll: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !poll().await {
                            debug!("{} watcher: receiver gone", name);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            cancellation_token,
            handle: Some(handle),
        }
    }

    fn stop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Keeps the cached balance fresh while a dashboard is open
pub struct BalanceWatcher {
    task: PollTask,
}

impl BalanceWatcher {
    /// Start polling at `client.config().balance_poll_interval()`; the first poll is immediate
    pub fn start(client: Arc<BankClient>, sender: mpsc::UnboundedSender<SyncEvent>) -> Self {
        let period = client.config().balance_poll_interval();
        let task = PollTask::spawn("balance", period, move || {
            let client = Arc::clone(&client);
            let sender = sender.clone();
            async move {
                let event = match client.sync_balance().await {
                    Ok(balance) => SyncEvent::Balance(balance),
                    Err(e) => {
                        warn!("Balance poll failed: {}", e);
                        SyncEvent::Error(e.user_message())
                    }
                };
                sender.send(event).is_ok()
            }
        });
        Self { task }
    }

    pub fn stop(&mut self) {
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

/// Re-fetches the blog feed and every post's comments
pub struct BlogFeedWatcher {
    task: PollTask,
}

impl BlogFeedWatcher {
    pub fn start(client: Arc<BankClient>, sender: mpsc::UnboundedSender<SyncEvent>) -> Self {
        let period = client.config().blog_poll_interval();
        let task = PollTask::spawn("blog feed", period, move || {
            let client = Arc::clone(&client);
            let sender = sender.clone();
            async move {
                let event = match client.blog_feed().await {
                    Ok(feed) => SyncEvent::Blogs(feed),
                    Err(e) => {
                        warn!("Blog feed poll failed: {}", e);
                        SyncEvent::Error(e.user_message())
                    }
                };
                sender.send(event).is_ok()
            }
        });
        Self { task }
    }

    pub fn stop(&mut self) {
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(ResolvedAccount),
    NotFound(String),
}

/// Result of resolving the account number typed so far
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub input: String,
    pub outcome: LookupOutcome,
}

/// Debounced account-number lookup for transfer forms.
///
/// Only the latest input can produce a result: each call to [`input`](Self::input)
/// cancels the pending lookup.
pub struct AccountResolver {
    client: Arc<BankClient>,
    sender: mpsc::UnboundedSender<LookupResult>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AccountResolver {
    pub fn new(client: Arc<BankClient>, sender: mpsc::UnboundedSender<LookupResult>) -> Self {
        Self {
            client,
            sender,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Feed the current contents of the account number field
    pub fn input(&self, text: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_pending();

        let input = text.trim().to_string();
        let config = self.client.config();
        if input.chars().count() < config.account_lookup_min_len {
            return;
        }

        let delay = config.account_lookup_debounce();
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let current = Arc::clone(&self.generation);

        let handle = tokio::spawn(async move {
            sleep(delay).await;

            let outcome = match client.resolve_account(&input).await {
                Ok(account) => LookupOutcome::Found(account),
                Err(e) => LookupOutcome::NotFound(e.user_message()),
            };

            if current.load(Ordering::SeqCst) == generation {
                let _ = sender.send(LookupResult { input, outcome });
            }
        });

        *self.lock_pending() = Some(handle);
    }

    /// Drop any lookup still waiting or in flight
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_pending();
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for AccountResolver {
    fn drop(&mut self) {
        self.cancel();
    }
}
