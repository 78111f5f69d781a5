//! REST API layer using Axum.
//!
//! Provides the JSON endpoints consumed by the client:
//! - CRUD for leads, properties, agents, messages and activities
//!   (`/api/<collection>` and `/api/<collection>/:id`), every write validated.
//! - Login (JWT) for users created by the maintenance scripts.
//! - Dashboard aggregates and the HTML fragments rendered by [`crate::display`].

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{create_jwt, validate_jwt, verify_password};
use crate::display::{render_agent_grid, render_conversation, render_stat_grid};
use crate::error::{CrmError, CrmResult};
use crate::models::{
    Activity, ActivityData, ActivityWithRelations, AgentData, AuthPayload, Entity, LeadData,
    Message, MessageData, PropertyData, PublicUser, Record,
};
use crate::stats::DashboardStats;
use crate::storage::{ListFilter, Store};
use crate::validation::{apply_patch, decode_draft};

const MAX_PAGE_SIZE: usize = 200;
const DEFAULT_FEED_SIZE: usize = 20;

/// Shared app state for REST handlers (Arc-wrapped for concurrency)
pub struct AppState {
    store: Store,
    jwt_secret: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListQuery> for ListFilter {
    fn from(query: ListQuery) -> Self {
        let defaults = ListFilter::default();
        Self {
            status: query.status.filter(|s| !s.is_empty()),
            search: query.search,
            offset: query.offset.unwrap_or(defaults.offset),
            limit: query.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub viewer: Option<String>,
}

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, CrmError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(CrmError::Unauthorized)?;

    let claims = validate_jwt(token, &state.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Unparseable ids can never name a record, so they are reported as missing.
fn parse_id<T: Entity>(raw: &str) -> CrmResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CrmError::NotFound {
        entity: T::LABEL,
        id: raw.to_string(),
    })
}

/// CRUD routes for one entity collection.
fn entity_routes<T: Entity>() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("/api/{}", T::COLLECTION),
            get(list_records::<T>).post(create_record::<T>),
        )
        .route(
            &format!("/api/{}/:id", T::COLLECTION),
            get(get_record::<T>)
                .patch(update_record::<T>)
                .delete(delete_record::<T>),
        )
}

/// Create the Axum router with every CRM endpoint.
pub fn create_router(store: Store, jwt_secret: &str) -> Router {
    let state = Arc::new(AppState {
        store,
        jwt_secret: jwt_secret.to_string(),
    });

    let auth_routes = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/login", post(login_handler))
        .merge(entity_routes::<LeadData>())
        .merge(entity_routes::<PropertyData>())
        .merge(entity_routes::<AgentData>())
        .merge(entity_routes::<MessageData>())
        .merge(entity_routes::<ActivityData>())
        .route("/api/leads/:id/activities", get(lead_activities_handler))
        .route("/api/conversations/:id/messages", get(conversation_handler))
        .route("/api/activities/feed", get(activity_feed_handler))
        .route("/api/dashboard/stats", get(stats_handler))
        .route("/ui/agents", get(agents_fragment))
        .route("/ui/dashboard", get(dashboard_fragment))
        .route("/ui/conversations/:id", get(conversation_fragment))
        .merge(auth_routes)
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "estate CRM API healthy".to_string(),
    })
}

async fn list_records<T: Entity>(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> CrmResult<Json<Vec<Record<T>>>> {
    let records = state.store.list::<T>(&query.into())?;
    Ok(Json(records))
}

async fn create_record<T: Entity>(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> CrmResult<(StatusCode, Json<Record<T>>)> {
    let Json(body) = body?;
    let draft = decode_draft::<T>(body)?;
    let data = T::validate(&draft).inspect_err(|err| {
        warn!(collection = T::COLLECTION, %err, "rejected create request");
    })?;
    let record = state.store.insert(data)?;
    info!(collection = T::COLLECTION, id = %record.id, "created record");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_record<T: Entity>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> CrmResult<Json<Record<T>>> {
    Ok(Json(state.store.get::<T>(parse_id::<T>(&id)?)?))
}

async fn update_record<T: Entity>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    patch: Result<Json<Value>, JsonRejection>,
) -> CrmResult<Json<Record<T>>> {
    let id = parse_id::<T>(&id)?;
    let Json(patch) = patch?;
    let current = state.store.get::<T>(id)?;
    let data = apply_patch(&current.data, &patch)?;
    let record = state.store.update(id, data)?;
    info!(collection = T::COLLECTION, %id, "updated record");
    Ok(Json(record))
}

async fn delete_record<T: Entity>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> CrmResult<StatusCode> {
    let id = parse_id::<T>(&id)?;
    state.store.delete::<T>(id)?;
    info!(collection = T::COLLECTION, %id, "deleted record");
    Ok(StatusCode::NO_CONTENT)
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> CrmResult<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let user = state
        .store
        .find_user_by_username(&payload.username)?
        .filter(|u| u.data.is_active)
        .ok_or(CrmError::Unauthorized)?;

    if !verify_password(&payload.password, &user.data.password).unwrap_or(false) {
        warn!(username = %payload.username, "failed login");
        return Err(CrmError::Unauthorized);
    }

    let token = create_jwt(&user.data.username, &state.jwt_secret)?;
    info!(username = %user.data.username, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
) -> CrmResult<Json<PublicUser>> {
    let user = state
        .store
        .find_user_by_username(&claims.sub)?
        .ok_or(CrmError::Unauthorized)?;
    Ok(Json(PublicUser::from(&user)))
}

async fn lead_activities_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> CrmResult<Json<Vec<Activity>>> {
    let id = parse_id::<LeadData>(&id)?;
    state.store.get::<LeadData>(id)?;
    Ok(Json(state.store.activities_for_lead(id)?))
}

async fn conversation_handler(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> CrmResult<Json<Vec<Message>>> {
    Ok(Json(state.store.messages_in_conversation(&conversation_id)?))
}

async fn activity_feed_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> CrmResult<Json<Vec<ActivityWithRelations>>> {
    let limit = query.limit.unwrap_or(DEFAULT_FEED_SIZE).clamp(1, MAX_PAGE_SIZE);
    Ok(Json(state.store.activity_feed(limit)?))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> CrmResult<Json<DashboardStats>> {
    Ok(Json(DashboardStats::compute(&state.store, Utc::now())?))
}

async fn agents_fragment(State(state): State<Arc<AppState>>) -> CrmResult<Html<String>> {
    let agents = state.store.all::<AgentData>()?;
    Ok(Html(render_agent_grid(&agents)))
}

async fn dashboard_fragment(State(state): State<Arc<AppState>>) -> CrmResult<Html<String>> {
    let stats = DashboardStats::compute(&state.store, Utc::now())?;
    Ok(Html(render_stat_grid(&stats.cards())))
}

async fn conversation_fragment(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> CrmResult<Html<String>> {
    let messages = state.store.messages_in_conversation(&conversation_id)?;
    let viewer = query.viewer.unwrap_or_default();
    Ok(Html(render_conversation(&messages, &viewer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::models::{PropertyDraft, UserData, UserRole};
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt; // For .oneshot() testing

    fn test_app() -> (tempfile::TempDir, Store, Router) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = Store::open(dir.path()).expect("Storage for REST test");
        let app = create_router(store.clone(), "test-secret");
        (dir, store, app)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app.clone().oneshot(json_request("POST", uri, body)).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    fn is_json(response: &Response) -> bool {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_dir, _store, app) = test_app();
        let response = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_lead_applies_defaults_and_lists() {
        let (_dir, _store, app) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/leads",
                json!({
                    "firstName": "Jane",
                    "lastName": "Doe",
                    "email": "jane@example.com",
                    "phone": "555-0101"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "new");
        assert_eq!(created["source"], "website");
        assert!(created["id"].is_string());

        let response = app.oneshot(get_request("/api/leads?status=new")).await.unwrap();
        let leads = body_json(response).await;
        assert_eq!(leads.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn negative_price_is_rejected_with_field_error() {
        let (_dir, store, app) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/properties",
                json!({ "title": "Cabin", "price": -10 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["field"], "price");
        assert_eq!(body["errors"][0]["constraint"], "non_negative");
        assert_eq!(store.count::<PropertyData>().unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_field_type_is_bad_request() {
        let (_dir, _store, app) = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/properties",
                json!({ "title": "Cabin", "price": "cheap" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_and_delete_record() {
        let (_dir, _store, app) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/agents",
                json!({ "fullName": "Jane Doe", "email": "jane@realty.com", "phone": "555" }),
            ))
            .await
            .unwrap();
        let agent = body_json(response).await;
        let id = agent["id"].as_str().unwrap().to_string();
        assert_eq!(agent["isActive"], true);

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/agents/{id}"),
                json!({ "isActive": false, "id": "ignored" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["isActive"], false);
        assert_eq!(updated["id"], id.as_str());

        let response = app
            .clone()
            .oneshot(json_request("PATCH", &format!("/api/agents/{id}"), json!({ "email": "nope" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let delete = Request::builder()
            .uri(format!("/api/agents/{id}"))
            .method("DELETE")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(get_request(&format!("/api/agents/{id}"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn conversation_fragment_marks_outbound_messages() {
        let (_dir, _store, app) = test_app();

        for (sender, recipient) in [("agent-1", "lead-1"), ("lead-1", "agent-1")] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/messages",
                    json!({
                        "conversationId": "conv-9",
                        "senderId": sender,
                        "recipientId": recipient,
                        "content": format!("hello from {sender}")
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/conversations/conv-9/messages"))
            .await
            .unwrap();
        let messages = body_json(response).await;
        assert_eq!(messages[0]["senderId"], "agent-1");
        assert_eq!(messages[0]["status"], "pending");

        let response = app
            .oneshot(get_request("/ui/conversations/conv-9?viewer=agent-1"))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert_eq!(html.matches("message-bubble outbound").count(), 1);
        assert_eq!(html.matches("message-bubble inbound").count(), 1);
    }

    #[tokio::test]
    async fn login_and_me() {
        let (_dir, store, app) = test_app();
        store
            .create_user(UserData {
                username: "testuser".into(),
                password: hash_password("password123").unwrap(),
                full_name: "Test User".into(),
                email: "test@example.com".into(),
                phone: None,
                avatar: None,
                role: UserRole::Agent,
                is_active: true,
            })
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({ "username": "testuser", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({ "username": "testuser", "password": "password123" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["user"].get("password").is_none());
        let token = body["token"].as_str().unwrap().to_string();

        let me = Request::builder()
            .uri("/api/auth/me")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(me).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["username"], "testuser");

        let response = app.oneshot(get_request("/api/auth/me")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn dashboard_fragment_renders_cards() {
        let (_dir, _store, app) = test_app();
        let response = app.oneshot(get_request("/ui/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Total Leads"));
        assert!(html.contains("Pipeline Value"));
    }

    #[tokio::test]
    async fn malformed_ids_and_bodies_get_json_errors() {
        let (_dir, _store, app) = test_app();

        let response = app.clone().oneshot(get_request("/api/leads/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(is_json(&response));
        assert_eq!(body_json(response).await["message"], "Lead not found: not-a-uuid");

        let delete = Request::builder()
            .uri("/api/properties/123")
            .method("DELETE")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(delete).await.unwrap().status(), StatusCode::NOT_FOUND);

        let broken = Request::builder()
            .uri("/api/leads")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        let response = app.oneshot(broken).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(is_json(&response));
        assert!(body_json(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn activity_feed_embeds_related_records() {
        let (_dir, _store, app) = test_app();

        let (status, feed) = get_json(&app, "/api/activities/feed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(feed, json!([]));

        let (_, lead) = post_json(
            &app,
            "/api/leads",
            json!({ "firstName": "Jane", "lastName": "Doe", "email": "jane@example.com", "phone": "555" }),
        )
        .await;
        let (_, agent) = post_json(
            &app,
            "/api/agents",
            json!({ "fullName": "Sam Agent", "email": "sam@realty.com", "phone": "556" }),
        )
        .await;
        let (_, property) =
            post_json(&app, "/api/properties", json!({ "title": "Lake house", "price": 250000 })).await;
        let (status, _) = post_json(
            &app,
            "/api/activities",
            json!({
                "type": "call",
                "leadId": lead["id"],
                "agentId": agent["id"],
                "propertyId": property["id"],
                "description": "Intro call"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, feed) = get_json(&app, "/api/activities/feed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(feed[0]["type"], "call");
        assert_eq!(feed[0]["lead"]["firstName"], "Jane");
        assert_eq!(feed[0]["agent"]["fullName"], "Sam Agent");
        assert_eq!(feed[0]["property"]["title"], "Lake house");
    }

    #[tokio::test]
    async fn lead_activities_and_unknown_lead() {
        let (_dir, _store, app) = test_app();

        let (_, lead) = post_json(
            &app,
            "/api/leads",
            json!({ "firstName": "Jane", "lastName": "Doe", "email": "jane@example.com", "phone": "555" }),
        )
        .await;
        let lead_id = lead["id"].as_str().unwrap().to_string();
        post_json(&app, "/api/activities", json!({ "type": "note", "leadId": lead_id })).await;
        post_json(&app, "/api/activities", json!({ "type": "email" })).await;

        let (status, activities) = get_json(&app, &format!("/api/leads/{lead_id}/activities")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(activities.as_array().map(Vec::len), Some(1));
        assert_eq!(activities[0]["type"], "note");

        let (status, body) = get_json(&app, &format!("/api/leads/{}/activities", Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());

        let (status, _) = get_json(&app, "/api/leads/nope/activities").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dashboard_stats_as_json() {
        let (_dir, _store, app) = test_app();

        for (email, status) in [("a@example.com", "new"), ("b@example.com", "closed")] {
            post_json(
                &app,
                "/api/leads",
                json!({ "firstName": "A", "lastName": "B", "email": email, "phone": "1", "status": status }),
            )
            .await;
        }
        post_json(&app, "/api/properties", json!({ "title": "Loft", "price": 100000 })).await;
        post_json(
            &app,
            "/api/properties",
            json!({ "title": "Sold barn", "price": 50000, "status": "sold" }),
        )
        .await;

        let (status, stats) = get_json(&app, "/api/dashboard/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalLeads"], 2);
        assert_eq!(stats["newLeads"], 2);
        assert_eq!(stats["conversionRate"], 50.0);
        assert_eq!(stats["activeListings"], 1);
        assert_eq!(stats["pipelineValue"], 100000.0);
    }

    #[tokio::test]
    async fn agents_fragment_renders_cards() {
        let (_dir, _store, app) = test_app();

        let response = app.clone().oneshot(get_request("/ui/agents")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No agents yet"));

        post_json(
            &app,
            "/api/agents",
            json!({ "fullName": "Jane Doe", "email": "jane@realty.com", "phone": "555", "totalRevenue": 1500000 }),
        )
        .await;
        let html = body_text(app.oneshot(get_request("/ui/agents")).await.unwrap()).await;
        assert!(html.contains("agent-card"));
        assert!(html.contains(">JD<"));
        assert!(html.contains("$1.5M"));
    }

    #[tokio::test]
    async fn list_limit_defaults_clamps_and_pages() {
        let (_dir, store, app) = test_app();
        for i in 0..205 {
            let draft = PropertyDraft {
                title: Some(format!("Unit {i}")),
                price: Some(1000.0),
                ..Default::default()
            };
            store.insert(PropertyData::validate(&draft).unwrap()).unwrap();
        }

        let len = |v: &Value| v.as_array().map(Vec::len);
        let (_, page) = get_json(&app, "/api/properties").await;
        assert_eq!(len(&page), Some(50));
        let (_, page) = get_json(&app, "/api/properties?limit=500").await;
        assert_eq!(len(&page), Some(200));
        let (_, page) = get_json(&app, "/api/properties?limit=0").await;
        assert_eq!(len(&page), Some(1));
        let (_, page) = get_json(&app, "/api/properties?limit=10&offset=200").await;
        assert_eq!(len(&page), Some(5));
    }
}
