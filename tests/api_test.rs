mod utils;

use k9tx_bank_sdk::api::paths;
use k9tx_bank_sdk::models::{
    Attachment, LoanAction, LoanApplication, LoanStatus, NewBlog, ProfileUpdate, TransactionKind,
};
use k9tx_bank_sdk::transport::{FormField, Method, RequestBody};
use k9tx_bank_sdk::{Decimal, Error};
use serde_json::json;
use std::sync::Arc;
use utils::test_utils::{json_response, logged_in_client, user_json, ScriptedTransport};

fn blog_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "author": 7,
        "author_username": "alice",
        "author_profile_image_url": null,
        "title": title,
        "content": "Hello",
        "image": null,
        "image_url": null,
        "created_at": "2025-03-01T12:00:00Z"
    })
}

fn comment_json(id: i64, parent: Option<i64>, replies: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "blog": 1,
        "author": 8,
        "author_username": "bob",
        "author_profile_image_url": null,
        "content": format!("comment {}", id),
        "parent": parent,
        "created_at": "2025-03-01T12:30:00Z",
        "replies": replies
    })
}

#[tokio::test]
async fn test_deposit_updates_cached_balance() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Post,
        paths::DEPOSIT,
        200,
        json!({ "success": "Deposit successful", "balance": "300.50" }),
    );
    let (client, store) = logged_in_client(Arc::clone(&transport));

    let response = client.deposit(Decimal::new(5050, 2)).await.unwrap();

    assert_eq!(response.balance, Decimal::new(30050, 2));
    assert_eq!(
        store.cached_user().unwrap().map(|u| u.balance),
        Some(Decimal::new(30050, 2))
    );
    assert_eq!(
        transport.requests()[0].body,
        RequestBody::Json(json!({ "amount": "50.50" }))
    );
}

#[tokio::test]
async fn test_transfer_body_and_resolve_query() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Get,
        paths::RESOLVE_ACCOUNT,
        200,
        json!({ "account_number": "200300400500", "username": "bob", "email": "bob@example.com" }),
    );
    transport.reply(
        Method::Post,
        paths::TRANSFER,
        200,
        json!({ "success": "Transfer successful" }),
    );
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let recipient = client.resolve_account(" 200300400500 ").await.unwrap();
    let response = client
        .transfer(&recipient.account_number, Decimal::new(25, 0))
        .await
        .unwrap();

    assert_eq!(recipient.username, "bob");
    assert_eq!(response.text_or(""), "Transfer successful");

    let sent = transport.requests();
    assert_eq!(
        sent[0].query,
        vec![("account_number".to_string(), "200300400500".to_string())]
    );
    assert_eq!(
        sent[1].body,
        RequestBody::Json(json!({ "to_account_number": "200300400500", "amount": "25" }))
    );
}

#[tokio::test]
async fn test_unknown_account_message() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Get,
        paths::RESOLVE_ACCOUNT,
        404,
        json!({ "error": "Account not found" }),
    );
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let err = client.resolve_account("999999999999").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Account not found");
}

#[tokio::test]
async fn test_transactions_decode() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Get,
        paths::TRANSACTIONS,
        200,
        json!([
            {
                "id": 2, "type": "TRANSFER", "from_user": 7, "to_user": 8,
                "from_username": "alice", "to_username": "bob",
                "amount": "25.00", "created_at": "2025-03-02T09:00:00Z"
            },
            {
                "id": 1, "type": "DEPOSIT", "from_user": null, "to_user": 7,
                "from_username": null, "to_username": "alice",
                "amount": 100, "created_at": "2025-03-01T09:00:00"
            }
        ]),
    );
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let transactions = client.transactions().await.unwrap();

    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].kind, TransactionKind::Transfer);
    assert_eq!(transactions[1].kind, TransactionKind::Deposit);
    assert_eq!(transactions[1].amount, Decimal::new(100, 0));
    assert!(transactions[0].created_at > transactions[1].created_at);
}

#[tokio::test]
async fn test_update_me_sends_multipart_and_merges_cache() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut updated = user_json();
    updated["username"] = json!("alice-new");
    updated["phone_number"] = json!("+15550199");
    updated["balance"] = json!("0.00");
    transport.reply(Method::Put, paths::ME, 200, updated);
    let (client, store) = logged_in_client(Arc::clone(&transport));

    let user = client
        .update_me(ProfileUpdate {
            username: Some("alice-new".to_string()),
            phone_number: Some("+15550199".to_string()),
            profile_image: Some(Attachment::new("me.png", vec![1, 2, 3])),
        })
        .await
        .unwrap();
    assert_eq!(user.username, "alice-new");

    let cached = store.cached_user().unwrap().unwrap();
    assert_eq!(cached.username, "alice-new");
    assert_eq!(cached.phone_number.as_deref(), Some("+15550199"));
    assert_eq!(
        cached.balance,
        Decimal::new(25000, 2),
        "Only profile fields are merged into the cache"
    );
    assert_eq!(cached.profile_image_url, None, "Picture URL kept when none returned");

    let sent = &transport.requests()[0];
    assert_eq!(
        sent.body,
        RequestBody::Form(vec![
            FormField::Text {
                name: "username".to_string(),
                value: "alice-new".to_string()
            },
            FormField::Text {
                name: "phone_number".to_string(),
                value: "+15550199".to_string()
            },
            FormField::File {
                name: "profile_image".to_string(),
                file_name: "me.png".to_string(),
                bytes: vec![1, 2, 3]
            },
        ])
    );
}

#[tokio::test]
async fn test_empty_profile_update_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new());
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let result = client.update_me(ProfileUpdate::default()).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_blog_feed_tolerates_failing_comments() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Get,
        paths::BLOGS,
        200,
        json!([blog_json(2, "Second"), blog_json(1, "First")]),
    );
    transport.on(Method::Get, &paths::blog_comments(2), |_| {
        Ok(json_response(500, json!({ "detail": "boom" })))
    });
    transport.reply(
        Method::Get,
        &paths::blog_comments(1),
        200,
        json!([comment_json(10, None, json!([comment_json(11, Some(10), json!([]))]))]),
    );
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let feed = client.blog_feed().await.expect("feed should load");

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].blog.title, "Second");
    assert!(feed[0].comments.is_empty());
    assert_eq!(feed[1].comments.len(), 2);
    assert_eq!(feed[1].comments.find(11).and_then(|c| c.parent), Some(10));
}

#[tokio::test]
async fn test_blog_feed_fails_when_blogs_fail() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(Method::Get, paths::BLOGS, 503, json!({}));
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let err = client.blog_feed().await.unwrap_err();

    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_create_blog_with_image() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(Method::Post, paths::BLOGS, 201, blog_json(3, "Launch"));
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let blog = client
        .create_blog(NewBlog {
            title: " Launch ".to_string(),
            content: "We are live".to_string(),
            image: Some(Attachment::new("banner.jpg", vec![0xff, 0xd8])),
        })
        .await
        .unwrap();

    assert_eq!(blog.id, 3);
    match &transport.requests()[0].body {
        RequestBody::Form(fields) => {
            assert_eq!(fields.len(), 3);
            assert_eq!(
                fields[0],
                FormField::Text {
                    name: "title".to_string(),
                    value: "Launch".to_string()
                }
            );
            assert!(matches!(&fields[2], FormField::File { name, .. } if name == "image"));
        }
        other => panic!("Expected a multipart form, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_blog_uses_id_query() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.on(Method::Delete, paths::BLOGS, |_| {
        Ok(k9tx_bank_sdk::ApiResponse::new(204, Vec::new()))
    });
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    client.delete_blog(4).await.unwrap();

    assert_eq!(
        transport.requests()[0].query,
        vec![("id".to_string(), "4".to_string())]
    );
}

#[tokio::test]
async fn test_reply_is_inserted_under_its_parent() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Get,
        &paths::blog_comments(1),
        200,
        json!([comment_json(10, None, json!([]))]),
    );
    transport.reply(
        Method::Post,
        &paths::blog_comments(1),
        201,
        comment_json(12, Some(10), json!([])),
    );
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let mut thread = client.comments(1).await.unwrap();
    let reply = client.add_comment(1, "Agreed", Some(10)).await.unwrap();
    assert!(thread.insert(reply));

    assert_eq!(thread.comments()[0].replies[0].id, 12);
    assert_eq!(
        transport.requests()[1].body,
        RequestBody::Json(json!({ "content": "Agreed", "parent": 10 }))
    );
}

#[tokio::test]
async fn test_loan_application_and_approval() {
    let transport = Arc::new(ScriptedTransport::new());
    let loan = |status: &str| {
        json!({
            "id": 5, "applicant": 7, "applicant_username": "alice",
            "amount": "1000.00", "term_months": 6, "purpose": "Laptop",
            "interest_rate": "10.00", "status": status,
            "created_at": "2025-03-01T12:00:00Z", "approved_at": null, "approved_by": null
        })
    };
    transport.reply(Method::Post, paths::LOANS, 201, loan("PENDING"));
    transport.reply(Method::Post, &paths::loan_action(5), 200, loan("APPROVED"));
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let pending = client
        .apply_loan(&LoanApplication {
            amount: Decimal::new(1000, 0),
            term_months: 6,
            purpose: "Laptop".to_string(),
            interest_rate: LoanApplication::default_interest_rate(),
        })
        .await
        .unwrap();
    let approved = client.act_on_loan(5, LoanAction::Approve).await.unwrap();

    assert_eq!(pending.status, LoanStatus::Pending);
    assert_eq!(approved.status, LoanStatus::Approved);
    let sent = transport.requests();
    assert_eq!(
        sent[0].body,
        RequestBody::Json(json!({
            "amount": "1000", "term_months": 6, "purpose": "Laptop", "interest_rate": "10.00"
        }))
    );
    assert_eq!(sent[1].body, RequestBody::Json(json!({ "action": "approve" })));
}

#[tokio::test]
async fn test_staff_only_action_reports_server_message() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.reply(
        Method::Post,
        &paths::loan_action(5),
        403,
        json!({ "detail": "You do not have permission to perform this action." }),
    );
    let (client, _store) = logged_in_client(Arc::clone(&transport));

    let err = client.act_on_loan(5, LoanAction::Reject).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(
        err.user_message(),
        "You do not have permission to perform this action."
    );
}
