mod utils;

use k9tx_bank_sdk::api::paths;
use k9tx_bank_sdk::models::Balance;
use k9tx_bank_sdk::transport::Method;
use k9tx_bank_sdk::{
    AccountResolver, BalanceWatcher, BlogFeedWatcher, Decimal, LookupOutcome, SyncEvent,
};
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use utils::test_utils::{json_response, logged_in_client, ScriptedTransport};

fn counting_balance(transport: &ScriptedTransport) {
    let cents = Arc::new(AtomicI64::new(25000));
    transport.on(Method::Get, paths::BALANCE, move |_| {
        let current = cents.fetch_add(100, Ordering::SeqCst);
        Ok(json_response(
            200,
            json!({ "balance": Decimal::new(current, 2).to_string() }),
        ))
    });
}

#[tokio::test(start_paused = true)]
async fn test_balance_watcher_polls_and_updates_cache() {
    let transport = Arc::new(ScriptedTransport::new());
    counting_balance(&transport);
    let (client, store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let started = Instant::now();

    let watcher = BalanceWatcher::start(client, sender);

    let first = receiver.recv().await.unwrap();
    assert_eq!(
        first,
        SyncEvent::Balance(Balance {
            balance: Decimal::new(25000, 2)
        }),
        "First poll happens immediately"
    );
    assert!(started.elapsed() < Duration::from_secs(1));

    receiver.recv().await.unwrap();
    let third = receiver.recv().await.unwrap();
    assert_eq!(
        third,
        SyncEvent::Balance(Balance {
            balance: Decimal::new(25200, 2)
        })
    );
    assert!(started.elapsed() >= Duration::from_secs(20));
    assert_eq!(
        store.cached_user().unwrap().map(|u| u.balance),
        Some(Decimal::new(25200, 2))
    );
    assert!(watcher.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_balance_watcher_keeps_polling_after_errors() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Get,
        paths::BALANCE,
        500,
        json!({ "detail": "Database unavailable" }),
    );
    counting_balance(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let _watcher = BalanceWatcher::start(client, sender);

    assert_eq!(
        receiver.recv().await.unwrap(),
        SyncEvent::Error("Database unavailable".to_string())
    );
    assert!(matches!(
        receiver.recv().await.unwrap(),
        SyncEvent::Balance(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_stopped_watcher_sends_nothing_more() {
    let transport = Arc::new(ScriptedTransport::new());
    counting_balance(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let mut watcher = BalanceWatcher::start(client, sender);
    receiver.recv().await.unwrap();
    watcher.stop();

    assert!(!watcher.is_running());
    assert_eq!(receiver.recv().await, None, "Channel closes once the task is gone");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.requests_to(paths::BALANCE).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_watcher_stops_polling() {
    let transport = Arc::new(ScriptedTransport::new());
    counting_balance(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let watcher = BalanceWatcher::start(client, sender);
    receiver.recv().await.unwrap();
    drop(watcher);

    assert_eq!(receiver.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_blog_feed_watcher_emits_feed() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.on(Method::Get, paths::BLOGS, |_| {
        Ok(json_response(
            200,
            json!([{
                "id": 1,
                "author": 7,
                "author_username": "alice",
                "author_profile_image_url": null,
                "title": "Hello",
                "content": "First post",
                "image_url": null,
                "created_at": "2025-03-01T12:00:00Z"
            }]),
        ))
    });
    transport.on(Method::Get, &paths::blog_comments(1), |_| {
        Ok(json_response(200, json!([])))
    });
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let started = Instant::now();

    let _watcher = BlogFeedWatcher::start(client, sender);

    for _ in 0..2 {
        match receiver.recv().await.unwrap() {
            SyncEvent::Blogs(feed) => {
                assert_eq!(feed.len(), 1);
                assert_eq!(feed[0].blog.title, "Hello");
                assert!(feed[0].comments.is_empty());
            }
            other => panic!("Expected a feed, got {:?}", other),
        }
    }
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(10));
}

fn resolvable(transport: &ScriptedTransport) {
    transport.on(Method::Get, paths::RESOLVE_ACCOUNT, |request| {
        let account = request
            .query
            .iter()
            .find(|(key, _)| key == "account_number")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        if account.starts_with("2003") {
            Ok(json_response(
                200,
                json!({ "account_number": account, "username": "bob", "email": "bob@example.com" }),
            ))
        } else {
            Ok(json_response(404, json!({ "error": "Account not found" })))
        }
    });
}

#[tokio::test(start_paused = true)]
async fn test_resolver_only_looks_up_the_last_input() {
    let transport = Arc::new(ScriptedTransport::new());
    resolvable(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let resolver = AccountResolver::new(client, sender);

    resolver.input("2003");
    resolver.input("20030040");
    tokio::time::sleep(Duration::from_millis(100)).await;
    resolver.input("200300400500");

    let result = receiver.recv().await.unwrap();
    assert_eq!(result.input, "200300400500");
    match result.outcome {
        LookupOutcome::Found(account) => assert_eq!(account.username, "bob"),
        other => panic!("Expected a match, got {:?}", other),
    }

    let lookups = transport.requests_to(paths::RESOLVE_ACCOUNT);
    assert_eq!(lookups.len(), 1, "Superseded inputs are never looked up");
    assert!(receiver.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_resolver_waits_for_quiet_period() {
    let transport = Arc::new(ScriptedTransport::new());
    resolvable(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let resolver = AccountResolver::new(client, sender);

    resolver.input("200300400500");
    tokio::time::sleep(Duration::from_millis(399)).await;
    assert!(transport.requests().is_empty());

    let result = receiver.recv().await.unwrap();
    assert!(matches!(result.outcome, LookupOutcome::Found(_)));
}

#[tokio::test(start_paused = true)]
async fn test_resolver_reports_unknown_accounts() {
    let transport = Arc::new(ScriptedTransport::new());
    resolvable(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let resolver = AccountResolver::new(client, sender);

    resolver.input("999999999999");

    let result = receiver.recv().await.unwrap();
    assert_eq!(
        result.outcome,
        LookupOutcome::NotFound("Account not found".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_short_input_cancels_pending_lookup() {
    let transport = Arc::new(ScriptedTransport::new());
    resolvable(&transport);
    let (client, _store) = logged_in_client(Arc::clone(&transport));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let resolver = AccountResolver::new(client, sender);

    resolver.input("200300400500");
    resolver.input("20");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(transport.requests().is_empty());
    assert!(receiver.try_recv().is_err());
}
