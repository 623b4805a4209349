//! Request-level tests against the fully layered router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;

use contact_gateway::config::RateLimitRule;
use contact_gateway::store::{MessageStatus, NewContactMessage};

mod common;
use common::*;

#[tokio::test]
async fn test_contact_submission_is_stored_and_mailed() {
    let gw = TestGateway::new(test_config());

    let response = gw.send(post_json("/api/contact", &contact_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let id = body["id"].as_str().unwrap().parse().unwrap();

    let stored = gw.state.store.get_message(&id).unwrap();
    assert_eq!(stored.status, MessageStatus::New);
    assert_eq!(stored.email, "ada@example.com");

    let sent = gw.mailbox.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|m| m.to.iter().any(|t| t == "ada@example.com")));
}

#[tokio::test]
async fn test_contact_escapes_markup_in_notification() {
    let gw = TestGateway::new(test_config());
    let mut body = contact_body();
    body["message"] = json!("Hello <b>team</b>, please call me back.");

    let response = gw.send(post_json("/api/contact", &body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let sent = gw.mailbox.sent();
    let notification = sent.iter().find(|m| m.to.iter().all(|t| t != "ada@example.com")).unwrap();
    assert!(!notification.html.contains("<b>team</b>"));
    assert!(notification.html.contains("&lt;b&gt;team&lt;/b&gt;"));
}

#[tokio::test]
async fn test_contact_rejects_foreign_origin() {
    let gw = TestGateway::new(test_config());
    let request = Request::post("/api/contact")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(contact_body().to_string()))
        .unwrap();

    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(gw.state.store.message_count(), 0);
}

#[tokio::test]
async fn test_contact_requires_origin() {
    let gw = TestGateway::new(test_config());
    let request = Request::post("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(contact_body().to_string()))
        .unwrap();

    assert_eq!(gw.send(request).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_contact_accepts_allowed_referer() {
    let gw = TestGateway::new(test_config());
    let request = Request::post("/api/contact")
        .header(header::REFERER, "https://example.com/contact?from=nav")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(contact_body().to_string()))
        .unwrap();

    assert_eq!(gw.send(request).await.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_contact_rate_limited_with_retry_after() {
    let mut config = test_config();
    config.contact.rate_limit = RateLimitRule::new(2, 60_000);
    let gw = TestGateway::new(config);

    for _ in 0..2 {
        let response = gw.send(post_json("/api/contact", &contact_body())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = gw.send(post_json("/api/contact", &contact_body())).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(gw.state.store.message_count(), 2);
}

#[tokio::test]
async fn test_contact_rejects_oversized_body() {
    let gw = TestGateway::new(test_config());
    let mut body = contact_body();
    body["message"] = json!("x".repeat(150 * 1024));

    let response = gw.send(post_json("/api/contact", &body)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(gw.state.store.message_count(), 0);
}

#[tokio::test]
async fn test_contact_requires_json_content_type() {
    let gw = TestGateway::new(test_config());
    let request = Request::post("/api/contact")
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Ada"))
        .unwrap();

    assert_eq!(gw.send(request).await.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_contact_malformed_json() {
    let gw = TestGateway::new(test_config());
    let request = Request::post("/api/contact")
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    assert_eq!(gw.send(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_validation_errors_are_reported_and_not_stored() {
    let gw = TestGateway::new(test_config());
    let body = json!({
        "name": "A",
        "email": "not-an-email",
        "subject": "Hi",
        "message": "short"
    });

    let response = gw.send(post_json("/api/contact", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    for field in ["name", "email", "subject", "message"] {
        assert!(fields.contains(&field), "missing {}", field);
    }
    assert_eq!(gw.state.store.message_count(), 0);
    assert!(gw.mailbox.sent().is_empty());
}

#[tokio::test]
async fn test_contact_rejects_script_content() {
    let gw = TestGateway::new(test_config());
    let mut body = contact_body();
    body["message"] = json!("Hello <script>alert(1)</script> there");

    let response = gw.send(post_json("/api/contact", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_mail_failure_still_succeeds() {
    let mailbox = std::sync::Arc::new(contact_gateway::mail::MemoryMailTransport::failing());
    let state = contact_gateway::AppState::new(
        test_config(),
        contact_gateway::store::MessageStore::new(None),
        contact_gateway::mail::Mailer::new(mailbox),
    );
    let router = contact_gateway::HttpServer::new(state.clone()).router();

    use tower::ServiceExt;
    let response = router.oneshot(post_json("/api/contact", &contact_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(state.store.message_count(), 1);
}

#[tokio::test]
async fn test_list_requires_admin_token() {
    let gw = TestGateway::new(test_config());

    let anonymous = Request::get("/api/contact").body(Body::empty()).unwrap();
    assert_eq!(gw.send(anonymous).await.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::get("/api/contact")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(gw.send(wrong).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_admin_key_locks_admin_api() {
    let mut config = test_config();
    config.admin.api_key = String::new();
    let gw = TestGateway::new(config);

    let request = Request::get("/api/contact")
        .header(header::AUTHORIZATION, "Bearer ")
        .body(Body::empty())
        .unwrap();
    assert_eq!(gw.send(request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_filters_and_limits() {
    let gw = TestGateway::new(test_config());
    for _ in 0..3 {
        gw.send(post_json("/api/contact", &contact_body())).await;
    }
    let first = gw.state.store.list_messages(None, 1).remove(0);
    gw.state.store.update_status(&first.id, MessageStatus::Archived);

    let body = json_body(gw.send(admin_get("/api/contact")).await).await;
    assert_eq!(body["count"], 3);

    let body = json_body(gw.send(admin_get("/api/contact?status=archived")).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["messages"][0]["id"], first.id.to_string());

    let body = json_body(gw.send(admin_get("/api/contact?limit=2")).await).await;
    assert_eq!(body["count"], 2);

    for bad in ["/api/contact?limit=0", "/api/contact?limit=101", "/api/contact?limit=abc", "/api/contact?status=spam"] {
        assert_eq!(gw.send(admin_get(bad)).await.status(), StatusCode::BAD_REQUEST, "{}", bad);
    }
}

#[tokio::test]
async fn test_show_and_mark_message() {
    let gw = TestGateway::new(test_config());
    let created = json_body(gw.send(post_json("/api/contact", &contact_body())).await).await;
    let id = created["id"].as_str().unwrap();

    let response = gw.send(admin_get(&format!("/api/contact/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let thread = json_body(response).await;
    assert_eq!(thread["message"]["status"], "new");
    assert_eq!(thread["replies"].as_array().unwrap().len(), 0);

    let patch = Request::patch(format!("/api/contact/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"status":"read"}"#))
        .unwrap();
    let response = gw.send(patch).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "read");

    let missing = admin_get(&format!("/api/contact/{}", uuid::Uuid::new_v4()));
    assert_eq!(gw.send(missing).await.status(), StatusCode::NOT_FOUND);
}

fn assert_json_error(response: &axum::http::Response<Body>) {
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn test_patch_with_bad_id_is_json_error() {
    let gw = TestGateway::new(test_config());
    let patch = Request::patch("/api/contact/not-a-uuid")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"status":"read"}"#))
        .unwrap();

    let response = gw.send(patch).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_error(&response);
    assert!(json_body(response).await["error"].as_str().unwrap().contains("not-a-uuid"));

    let show = admin_get("/api/contact/not-a-uuid");
    let response = gw.send(show).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_error(&response);
}

#[tokio::test]
async fn test_patch_with_malformed_body_is_json_error() {
    let gw = TestGateway::new(test_config());
    let created = json_body(gw.send(post_json("/api/contact", &contact_body())).await).await;
    let id = created["id"].as_str().unwrap();

    let patch = |body: &'static str, content_type: &'static str| {
        Request::patch(format!("/api/contact/{}", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    };

    let response = gw.send(patch("{bad", "application/json")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_error(&response);
    assert!(json_body(response).await["error"].is_string());

    let response = gw.send(patch(r#"{"status":"read"}"#, "text/plain")).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_json_error(&response);

    let uuid = id.parse().unwrap();
    assert_eq!(gw.state.store.get_message(&uuid).unwrap().status, MessageStatus::New);
}

#[tokio::test]
async fn test_global_body_cap_is_json_error() {
    let mut config = test_config();
    config.security.max_body_size = 64;
    let gw = TestGateway::new(config);

    let raw = contact_body().to_string();
    assert!(raw.len() > 64);
    let request = Request::post("/api/contact")
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, raw.len())
        .body(Body::from(raw))
        .unwrap();

    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_json_error(&response);
    assert_eq!(json_body(response).await["error"], "Payload too large");
    assert_eq!(gw.state.store.message_count(), 0);
}

#[tokio::test]
async fn test_unknown_route_and_method_are_json_errors() {
    let gw = TestGateway::new(test_config());

    let response = gw.send(Request::get("/api/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_json_error(&response);

    let response = gw.send(Request::delete("/api/news").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_json_error(&response);
}

#[tokio::test]
async fn test_admin_stats() {
    let gw = TestGateway::new(test_config());
    gw.send(post_json("/api/contact", &contact_body())).await;

    let response = gw.send(admin_get("/admin/stats")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["total_messages"], 1);
    assert_eq!(stats["by_status"]["new"], 1);
}

fn seed_message(gw: &TestGateway, subject: &str) -> contact_gateway::store::ContactMessage {
    gw.state.store.insert_message(NewContactMessage {
        name: "Jane Doe".into(),
        email: "jane@example.com".into(),
        phone: None,
        company: None,
        subject: subject.into(),
        message: "Original enquiry body".into(),
        ip: None,
    })
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature_without_writing() {
    let gw = TestGateway::new(test_config());
    let thread = seed_message(&gw, "Pricing");
    let payload = inbound_email("jane@example.com", "Re: Pricing", "Thanks!").to_string();

    let unsigned = Request::post("/api/webhooks/email-received")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.clone()))
        .unwrap();
    assert_eq!(gw.send(unsigned).await.status(), StatusCode::UNAUTHORIZED);

    let forged = contact_gateway::security::signature::sign(
        payload.as_bytes(),
        "wrong-secret",
        chrono::Utc::now().timestamp(),
    );
    let forged = Request::post("/api/webhooks/email-received")
        .header(header::CONTENT_TYPE, "application/json")
        .header("webhook-signature", forged)
        .body(Body::from(payload))
        .unwrap();
    assert_eq!(gw.send(forged).await.status(), StatusCode::UNAUTHORIZED);

    assert!(gw.state.store.replies_for(&thread.id).is_empty());
}

#[tokio::test]
async fn test_webhook_rejects_stale_signature() {
    let gw = TestGateway::new(test_config());
    let payload = inbound_email("jane@example.com", "Re: Pricing", "Thanks!").to_string();
    let stale = chrono::Utc::now().timestamp() - 3600;

    let request = Request::post("/api/webhooks/email-received")
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            "svix-signature",
            contact_gateway::security::signature::sign(payload.as_bytes(), WEBHOOK_SECRET, stale),
        )
        .body(Body::from(payload))
        .unwrap();
    assert_eq!(gw.send(request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_stores_reply_and_reopens_thread() {
    let gw = TestGateway::new(test_config());
    let thread = seed_message(&gw, "Website redesign");
    gw.state.store.update_status(&thread.id, MessageStatus::Replied);

    let response = gw
        .send(signed_webhook(&inbound_email(
            "Jane Doe <Jane@Example.com>",
            "Re: Website redesign",
            "Sounds good, Tuesday works.",
        )))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let ack = json_body(response).await;
    assert_eq!(ack["matched"], true);

    let replies = gw.state.store.replies_for(&thread.id);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].body, "Sounds good, Tuesday works.");
    assert_eq!(gw.state.store.get_message(&thread.id).unwrap().status, MessageStatus::New);
}

#[tokio::test]
async fn test_webhook_subject_wildcards_are_literal() {
    let gw = TestGateway::new(test_config());
    let percent = seed_message(&gw, "Discount 100% off");
    std::thread::sleep(std::time::Duration::from_millis(2));
    let latest = seed_message(&gw, "Discount 1000 off");

    // "%" in the reply must match only the literal percent sign.
    gw.send(signed_webhook(&inbound_email("jane@example.com", "RE: Discount 100% off", "Yes")))
        .await;
    assert_eq!(gw.state.store.replies_for(&percent.id).len(), 1);
    assert!(gw.state.store.replies_for(&latest.id).is_empty());
}

#[tokio::test]
async fn test_webhook_unknown_sender_and_other_events() {
    let gw = TestGateway::new(test_config());
    seed_message(&gw, "Pricing");

    let response = gw
        .send(signed_webhook(&inbound_email("stranger@example.org", "Re: Pricing", "hi")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["matched"], false);

    let response = gw
        .send(signed_webhook(&json!({ "type": "email.delivered", "data": null })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ignored"], true);
}

#[tokio::test]
async fn test_webhook_without_secret_fails_open() {
    let mut config = test_config();
    config.webhook.secret = None;
    let gw = TestGateway::new(config);
    let thread = seed_message(&gw, "Pricing");

    let request = Request::post("/api/webhooks/email-received")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            inbound_email("jane@example.com", "Re: Pricing", "Unsigned but accepted").to_string(),
        ))
        .unwrap();
    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["matched"], true);

    let replies = gw.state.store.replies_for(&thread.id);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].body, "Unsigned but accepted");
}

#[tokio::test]
async fn test_webhook_require_secret_without_secret() {
    let mut config = test_config();
    config.webhook.secret = None;
    config.webhook.require_secret = true;
    let gw = TestGateway::new(config);

    let request = Request::post("/api/webhooks/email-received")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(inbound_email("jane@example.com", "Re: x", "y").to_string()))
        .unwrap();
    assert_eq!(gw.send(request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_newsletter_subscribe_is_idempotent() {
    let gw = TestGateway::new(test_config());
    let body = json!({ "email": "Reader@Example.com", "name": "Reader" });

    assert_eq!(gw.send(post_json("/api/newsletter", &body)).await.status(), StatusCode::CREATED);
    assert_eq!(gw.send(post_json("/api/newsletter", &body)).await.status(), StatusCode::OK);
    assert_eq!(gw.state.store.summary().subscribers, 1);

    let invalid = json!({ "email": "nope" });
    assert_eq!(gw.send(post_json("/api/newsletter", &invalid)).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_news_feed_and_category_filter() {
    let gw = TestGateway::new(test_config());

    let all = json_body(gw.send(Request::get("/api/news").body(Body::empty()).unwrap()).await).await;
    let total = all["count"].as_u64().unwrap();
    assert!(total > 0);
    assert!(all["items"][0]["category"].is_string());

    let security = json_body(
        gw.send(Request::get("/api/news?category=Security").body(Body::empty()).unwrap())
            .await,
    )
    .await;
    let filtered = security["items"].as_array().unwrap();
    assert!(filtered.len() as u64 <= total);
    assert!(filtered.iter().all(|i| i["category"] == "Security"));
}

#[tokio::test]
async fn test_health() {
    let gw = TestGateway::new(test_config());
    let response = gw.send(Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
