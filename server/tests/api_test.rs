//! HTTP tests for the Campus server over in-memory providers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use campus_auth::Caller;
use campus_auth::mocks::{MockIdentityProvider, MockProfileDirectory, MockRateLimiter};
use campus_auth::providers::RateLimitPolicy;
use campus_commerce::mocks::{FailPoint, MockCatalog, MockOrderRepository};
use campus_commerce::{OrderService, PricingPolicy, ProductRecord, TicketTypeRecord};
use campus_core::environment::Clock;
use campus_core::{EventId, Money, ProductId, Role, TicketTypeId, UserId};
use campus_media::mocks::{MockVideoPlatform, PlatformCall, PlatformStep};
use campus_media::{UploadBroker, UploadLimits};
use campus_server::{AppState, build_router};
use campus_testing::{init_test_tracing, test_clock};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const STUDENT_TOKEN: &str = "student-token";
const PROFESSOR_TOKEN: &str = "professor-token";

struct TestApp {
    server: TestServer,
    identity: MockIdentityProvider,
    catalog: MockCatalog,
    orders: MockOrderRepository,
    profiles: MockProfileDirectory,
    platform: MockVideoPlatform,
    student: Caller,
    hoodie: ProductId,
    gala: TicketTypeId,
}

fn test_app(order_limit: u32) -> TestApp {
    init_test_tracing();
    let clock = Arc::new(test_clock());
    let now = clock.now();

    let student = Caller::new(UserId::new(), Some("ada@campus.test".into()), Role::Student);
    let professor = Caller::new(UserId::new(), None, Role::Professor);
    let identity = MockIdentityProvider::new()
        .with_token(STUDENT_TOKEN, student.clone())
        .with_token(PROFESSOR_TOKEN, professor);

    let catalog = MockCatalog::new();
    let hoodie = ProductId::new();
    let gala = TicketTypeId::new();
    catalog.add_product(ProductRecord {
        id: hoodie,
        name: "Campus hoodie".into(),
        price: Money::from_cents(4_500),
        member_price: Some(Money::from_cents(3_900)),
        stock: 10,
        is_active: true,
    });
    catalog.add_ticket_type(TicketTypeRecord {
        id: gala,
        event_id: EventId::new(),
        name: "Spring gala".into(),
        price: Money::from_cents(2_000),
        member_price: None,
        available: 3,
        is_active: true,
        sales_end: None,
        event_starts_at: now + chrono::Duration::days(30),
    });

    let orders = MockOrderRepository::new(catalog.clone());
    let profiles = MockProfileDirectory::new();
    let order_service = OrderService::new(
        Arc::new(catalog.clone()),
        Arc::new(orders.clone()),
        Arc::new(profiles.clone()),
        clock.clone(),
        PricingPolicy {
            currency: "EUR".into(),
            shipping_fee: Money::from_cents(500),
        },
    );

    let platform = MockVideoPlatform::new();
    let uploads = UploadBroker::new(
        Arc::new(platform.clone()),
        UploadLimits {
            max_bytes: 1_024,
            max_duration: Duration::from_secs(3_600),
        },
    );

    let state = AppState::new(
        Arc::new(identity.clone()),
        Arc::new(MockRateLimiter::with_clock(clock)),
        order_service,
        uploads,
        RateLimitPolicy::new(order_limit, Duration::from_secs(60)),
    );

    TestApp {
        server: TestServer::new(build_router(state)).unwrap(),
        identity,
        catalog,
        orders,
        profiles,
        platform,
        student,
        hoodie,
        gala,
    }
}

fn shipping() -> Value {
    json!({
        "full_name": "Ada Lovelace",
        "email": "ada@campus.test",
        "address_line1": "1 Analytical Way",
        "city": "London",
        "postal_code": "N1 9GU",
        "country": "GB"
    })
}

fn video_form(title: &str, size: usize) -> MultipartForm {
    MultipartForm::new().add_text("title", title.to_string()).add_part(
        "file",
        Part::bytes(vec![7u8; size])
            .file_name("week1.mp4")
            .mime_type("video/mp4"),
    )
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app(10);

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn test_readiness_reports_rate_limiter() {
    let app = test_app(10);

    let response = app.server.get("/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ready"], true);
    assert_eq!(body["components"][0]["component"], "rate_limiter");
}

#[tokio::test]
async fn test_responses_carry_correlation_id() {
    let app = test_app(10);

    let response = app.server.get("/health").await;

    let id = response.header("x-correlation-id");
    assert!(uuid::Uuid::parse_str(id.to_str().unwrap()).is_ok());
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_member_order_is_priced_from_catalog() {
    let app = test_app(10);
    app.profiles.set_member(app.student.user_id, true);

    let response = app
        .server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&json!({
            "items": [
                {"product_id": app.hoodie, "quantity": 2, "price": 1},
                {"event_ticket_type_id": app.gala, "quantity": 1}
            ],
            "shipping": shipping()
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["currency"], "EUR");
    assert_eq!(body["subtotal_cents"], 2 * 3_900 + 2_000);
    assert_eq!(body["shipping_cents"], 500);
    assert_eq!(body["total_cents"], 2 * 3_900 + 2_000 + 500);
    assert_eq!(body["items"][0]["kind"], "product");
    assert_eq!(body["items"][0]["member_price_applied"], true);
    assert_eq!(body["items"][1]["kind"], "ticket");

    assert_eq!(app.orders.order_count(), 1);
    assert_eq!(app.catalog.product_stock(app.hoodie), Some(8));
    assert_eq!(app.catalog.tickets_available(app.gala), Some(2));
}

#[tokio::test]
async fn test_ticket_only_order_needs_no_shipping() {
    let app = test_app(10);

    let response = app
        .server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&json!({"items": [{"event_ticket_type_id": app.gala, "quantity": 2}]}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["shipping_cents"], 0);
    assert_eq!(body["total_cents"], 4_000);
}

#[tokio::test]
async fn test_invalid_order_lists_every_field() {
    let app = test_app(10);

    let response = app
        .server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&json!({
            "items": [{"product_id": app.hoodie, "quantity": 0}],
            "shipping": {"full_name": "A", "email": "not-an-email"}
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let fields: Vec<&str> = body["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"items[0].quantity"));
    assert!(fields.contains(&"shipping.full_name"));
    assert!(fields.contains(&"shipping.email"));
    assert_eq!(app.orders.order_count(), 0);
}

#[tokio::test]
async fn test_sold_out_tickets_conflict() {
    let app = test_app(10);

    let response = app
        .server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&json!({"items": [{"event_ticket_type_id": app.gala, "quantity": 4}]}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(app.orders.order_count(), 0);
}

#[tokio::test]
async fn test_failed_write_is_rolled_back() {
    let app = test_app(10);
    app.orders.fail_at(FailPoint::CreateAttendees);

    let response = app
        .server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&json!({"items": [{"event_ticket_type_id": app.gala, "quantity": 2}]}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(!body["message"].as_str().unwrap().contains("injected"));
    assert_eq!(app.orders.deleted_orders().len(), 1);
    assert_eq!(app.catalog.tickets_available(app.gala), Some(3));
}

#[tokio::test]
async fn test_order_rate_limit() {
    let app = test_app(2);
    let body = json!({"items": [{"event_ticket_type_id": app.gala, "quantity": 1}]});

    for _ in 0..2 {
        app.server
            .post("/api/orders/validate")
            .authorization_bearer(STUDENT_TOKEN)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = app
        .server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&body)
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("retry-after"), "60");
    assert_eq!(app.orders.order_count(), 2);

    // Limits are per user
    app.server
        .post("/api/orders/validate")
        .authorization_bearer(PROFESSOR_TOKEN)
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_order_requires_valid_token() {
    let app = test_app(10);
    let body = json!({"items": [{"event_ticket_type_id": app.gala, "quantity": 1}]});

    app.server
        .post("/api/orders/validate")
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .post("/api/orders/validate")
        .authorization_bearer("forged")
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.identity.set_unavailable(true);
    app.server
        .post("/api/orders/validate")
        .authorization_bearer(STUDENT_TOKEN)
        .json(&body)
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    assert_eq!(app.orders.order_count(), 0);
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_professor_uploads_video() {
    let app = test_app(10);

    let response = app
        .server
        .post("/api/videos/upload")
        .authorization_bearer(PROFESSOR_TOKEN)
        .multipart(video_form("Week 1: Intro", 512))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["video_id"], "mock-video-1");
    assert_eq!(body["status"], "queued");
    assert_eq!(body["ready_to_stream"], false);
    assert_eq!(app.platform.calls().len(), 3);
}

#[tokio::test]
async fn test_student_cannot_upload() {
    let app = test_app(10);

    let response = app
        .server
        .post("/api/videos/upload")
        .authorization_bearer(STUDENT_TOKEN)
        .multipart(video_form("Week 1", 16))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(app.platform.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_video_rejected() {
    let app = test_app(10);

    let response = app
        .server
        .post("/api/videos/upload")
        .authorization_bearer(PROFESSOR_TOKEN)
        .multipart(video_form("Week 1", 2_048))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.platform.calls().is_empty());
}

#[tokio::test]
async fn test_missing_title_is_invalid() {
    let app = test_app(10);
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![1u8; 16])
            .file_name("week1.mp4")
            .mime_type("video/mp4"),
    );

    let response = app
        .server
        .post("/api/videos/upload")
        .authorization_bearer(PROFESSOR_TOKEN)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_title_after_file_is_invalid() {
    let app = test_app(10);
    let form = MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(vec![1u8; 16])
                .file_name("week1.mp4")
                .mime_type("video/mp4"),
        )
        .add_text("title", "Week 1");

    let response = app
        .server
        .post("/api/videos/upload")
        .authorization_bearer(PROFESSOR_TOKEN)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.platform.calls().is_empty());
}

#[tokio::test]
async fn test_uploaded_bytes_reach_platform() {
    let app = test_app(10);

    app.server
        .post("/api/videos/upload")
        .authorization_bearer(PROFESSOR_TOKEN)
        .multipart(video_form("Week 1", 1_000))
        .await
        .assert_status_ok();

    assert!(matches!(
        app.platform.calls()[1],
        PlatformCall::Upload { bytes: 1_000, .. }
    ));
}

#[tokio::test]
async fn test_platform_failure_is_bad_gateway() {
    let app = test_app(10);
    app.platform.fail_at(PlatformStep::RequireSignedUrls);

    let response = app
        .server
        .post("/api/videos/upload")
        .authorization_bearer(PROFESSOR_TOKEN)
        .multipart(video_form("Week 1", 64))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(app.platform.calls().len(), 3);
}
