//! HTTP API tests through the full router

mod helpers;

use axum::{
    body::to_bytes,
    http::{header, Method, StatusCode},
};
use serde_json::json;

use campus_wall::services::Role;
use helpers::*;

async fn create_open_event(ctx: &TestContext, token: &str, max: Option<i32>) -> i64 {
    let request = running_event(max);
    let (status, body) = ctx
        .send(Method::POST, "/api/events", Some(token), Some(serde_json::to_value(&request).unwrap()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send(Method::PUT, &format!("/api/events/{}/status", id), Some(token), Some(json!({"status": 2})))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], 2);
    id
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["database_healthy"], true);
}

#[tokio::test]
async fn test_register_flow_uses_public_envelope() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);
    let event_id = create_open_event(&ctx, &organizer, Some(1)).await;

    let alice = ctx.token(10, Role::User);
    let (status, body) = ctx
        .send(Method::POST, &format!("/api/events/{}/register", event_id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["status"], 1);
    assert_eq!(body["data"]["user_id"], 10);

    let bob = ctx.token(11, Role::User);
    let (status, body) = ctx
        .send(Method::POST, &format!("/api/events/{}/register", event_id), Some(&bob), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 802);

    let (status, body) = ctx
        .send(Method::GET, &format!("/api/events/{}/registration-status", event_id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_registered"], true);
    assert_eq!(body["data"]["status"], 1);

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/api/events/{}/register", event_id),
            Some(&alice),
            Some(json!({"reason": "schedule conflict"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], 0);
    assert_eq!(body["data"]["cancel_reason"], "schedule conflict");

    let (_, body) = ctx.send(Method::GET, &format!("/api/events/{}", event_id), None, None).await;
    assert_eq!(body["data"]["current_participants"], 0);

    let (status, body) = ctx.send(Method::GET, "/api/users/me/registrations", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::POST, "/api/events/1/register", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, body) = ctx
        .send(Method::GET, "/api/users/me/registrations", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn test_admin_rejections_use_admin_envelope() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/admin/events/1/registrations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body.get("code").is_none());

    let admin = ctx.token(ADMIN_ID, Role::Admin);
    let (status, body) = ctx
        .send(Method::GET, "/api/admin/events/abc/registrations/stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let response = ctx
        .send_raw(Method::PUT, "/api/admin/events/1/registrations/batch-status", Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_route_is_enveloped_not_found() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_huge_page_number_is_clamped() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);
    let event_id = create_open_event(&ctx, &organizer, None).await;

    let uri = format!("/api/events?page={}&page_size=100", i64::MAX);
    let (status, body) = ctx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);

    let uri = format!("/api/admin/events/{}/registrations?page={}", event_id, i64::MAX);
    let (status, body) = ctx.send(Method::GET, &uri, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_business_errors_carry_codes() {
    let ctx = TestContext::new();
    let user = ctx.token(10, Role::User);

    let (status, body) = ctx
        .send(Method::POST, "/api/events/404/register", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 801);

    let (status, body) = ctx.send(Method::GET, "/api/events/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, body) = ctx
        .send(Method::POST, "/api/events", Some(&user), Some(serde_json::to_value(running_event(None)).unwrap()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);

    let mut request = serde_json::to_value(running_event(Some(0))).unwrap();
    request["title"] = json!("");
    let (status, body) = ctx.send(Method::POST, "/api/events", Some(&organizer), Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(body["data"]["title"].is_array());
    assert!(body["data"]["max_participants"].is_array());

    let (status, body) = ctx.send(Method::POST, "/api/events", Some(&organizer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].as_str().unwrap().contains("Invalid JSON body"));
}

#[tokio::test]
async fn test_form_errors_name_the_field() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);

    let mut request = serde_json::to_value(running_event(None)).unwrap();
    request["form_config"] = signup_form();
    let (status, body) = ctx.send(Method::POST, "/api/events", Some(&organizer), Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = body["data"]["id"].as_i64().unwrap();
    ctx.send(Method::PUT, &format!("/api/events/{}/status", event_id), Some(&organizer), Some(json!({"status": 2})))
        .await;

    let user = ctx.token(10, Role::User);
    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/events/{}/register", event_id),
            Some(&user),
            Some(json!({"form_data": {"name": "Ada", "student_id": "12"}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 812);
    assert!(body["data"]["student_id"].is_array());
}

#[tokio::test]
async fn test_admin_endpoints_use_admin_envelope() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);
    let event_id = create_open_event(&ctx, &organizer, Some(10)).await;

    let mut registration_ids = Vec::new();
    for user_id in 10..13 {
        let token = ctx.token(user_id, Role::User);
        let (_, body) = ctx
            .send(Method::POST, &format!("/api/events/{}/register", event_id), Some(&token), None)
            .await;
        registration_ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/admin/registrations/{}/check-in", registration_ids[0]),
            Some(&organizer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], 2);

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/admin/events/{}/registrations/batch-status", event_id),
            Some(&organizer),
            Some(json!({"ids": [registration_ids[1], registration_ids[2]], "status": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 2);

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/admin/events/{}/registrations/{}/status", event_id, registration_ids[2]),
            Some(&organizer),
            Some(json!({"status": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], 1);

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/admin/events/{}/registrations/stats", event_id),
            Some(&organizer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attended"], 1);
    assert_eq!(body["data"]["registered"], 1);
    assert_eq!(body["data"]["canceled"], 1);
    assert_eq!(body["data"]["current_participants"], 2);

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/admin/events/{}/registrations?status=0", event_id),
            Some(&organizer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], registration_ids[1]);
}

#[tokio::test]
async fn test_admin_errors_use_admin_envelope() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);
    let event_id = create_open_event(&ctx, &organizer, None).await;

    let outsider = ctx.token(OTHER_ORGANIZER_ID, Role::Organizer);
    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/admin/events/{}/registrations", event_id),
            Some(&outsider),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("organizer"));

    // Configured admins manage every event regardless of the role claim
    let admin = ctx.token(ADMIN_ID, Role::User);
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/admin/registrations/777/check-in",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_export_download() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);
    let event_id = create_open_event(&ctx, &organizer, None).await;
    let user = ctx.token(10, Role::User);
    ctx.send(Method::POST, &format!("/api/events/{}/register", event_id), Some(&user), None)
        .await;

    let response = ctx
        .send_raw(
            Method::GET,
            &format!("/api/admin/events/{}/registrations/export", event_id),
            Some(&organizer),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains(".xlsx"));
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK\x03\x04"));
}

#[tokio::test]
async fn test_event_listing_and_detail() {
    let ctx = TestContext::new();
    let organizer = ctx.token(ORGANIZER_ID, Role::Organizer);
    let event_id = create_open_event(&ctx, &organizer, None).await;

    let (status, body) = ctx.send(Method::GET, "/api/events?status=2&page=1&page_size=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["page_size"], 5);
    assert_eq!(body["data"]["items"][0]["id"], event_id);

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/events/{}", event_id),
            Some(&organizer),
            Some(json!({"title": "Night Market", "is_recommended": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Night Market");

    let (_, body) = ctx.send(Method::GET, "/api/events?recommended=true", None, None).await;
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = ctx
        .send(Method::PUT, &format!("/api/events/{}/status", event_id), Some(&organizer), Some(json!({"status": 1})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 811);
}
