use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::protocol::{TABLE_APPOINTMENTS, TABLE_CUSTOMERS};
use tokio::{net::TcpListener, sync::Mutex};

use crate::backend::{Order, Projection};

#[derive(Debug, Clone)]
struct Captured {
    method: &'static str,
    params: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct ServerState {
    captured: Arc<Mutex<Vec<Captured>>>,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn capture(
    method: &'static str,
    headers: &HeaderMap,
    params: HashMap<String, String>,
    body: Option<Value>,
) -> Captured {
    Captured {
        method,
        params,
        apikey: header(headers, "apikey"),
        authorization: header(headers, "authorization"),
        prefer: header(headers, "prefer"),
        body,
    }
}

async fn list_appointments(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state
        .captured
        .lock()
        .await
        .push(capture("GET", &headers, params, None));
    Json(json!([{
        "id": 7,
        "fecha_hora": "2025-09-09T10:00:00+00:00",
        "servicio": "Mantención 10k",
        "estado": "confirmada",
        "notas": null,
        "vehiculos": { "marca": "Toyota", "modelo": "Yaris", "clientes": { "nombre": "Juan Pérez" } }
    }]))
}

async fn update_appointment(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state
        .captured
        .lock()
        .await
        .push(capture("PATCH", &headers, params, Some(body)));
    StatusCode::NO_CONTENT
}

async fn insert_customer(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let prefer = header(&headers, "prefer");
    state
        .captured
        .lock()
        .await
        .push(capture("POST", &headers, HashMap::new(), Some(body.clone())));
    if prefer.as_deref() == Some("return=representation") {
        let mut row = body;
        row["id"] = json!(41);
        (StatusCode::CREATED, Json(json!([row]))).into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

async fn reject_vehicle() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "code": "23503",
            "details": "Key (cliente_id)=(99) is not present in table \"clientes\".",
            "hint": null,
            "message": "insert or update on table \"vehiculos\" violates foreign key constraint"
        })),
    )
}

async fn plain_failure() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "upstream down")
}

async fn auth_health() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

async fn spawn_rest_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route(
            "/rest/v1/citas",
            get(list_appointments).patch(update_appointment),
        )
        .route("/rest/v1/clientes", post(insert_customer))
        .route("/rest/v1/vehiculos", post(reject_vehicle))
        .route("/rest/v1/flaky", get(plain_failure))
        .route("/auth/v1/health", get(auth_health))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn captured(state: &ServerState) -> Vec<Captured> {
    state.captured.lock().await.clone()
}

#[tokio::test]
async fn select_sends_projection_order_limit_and_credentials() {
    let (url, state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");
    let query = SelectQuery::new(
        TABLE_APPOINTMENTS,
        Projection::new()
            .column("id")
            .relation("vehiculos", Projection::new().column("marca")),
    )
    .order(Order::ascending("fecha_hora"))
    .limit(50);

    let rows = backend.select(&query).await.expect("select");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["vehiculos"]["marca"], json!("Toyota"));
    let requests = captured(&state).await;
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.params["select"], "id,vehiculos(marca)");
    assert_eq!(request.params["order"], "fecha_hora.asc");
    assert_eq!(request.params["limit"], "50");
    assert_eq!(request.apikey.as_deref(), Some("anon-key"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn insert_returning_yields_created_row() {
    let (url, state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");
    let query = InsertQuery::new(
        TABLE_CUSTOMERS,
        &json!({ "nombre": "Juan Pérez", "telefono": null }),
    )
    .expect("query")
    .returning();

    let row = backend.insert(&query).await.expect("insert");

    assert_eq!(row.expect("row")["id"], json!(41));
    let requests = captured(&state).await;
    assert_eq!(
        requests[0].prefer.as_deref(),
        Some("return=representation")
    );
    assert_eq!(
        requests[0].body.as_ref().expect("body")["nombre"],
        json!("Juan Pérez")
    );
}

#[tokio::test]
async fn insert_without_returning_yields_nothing() {
    let (url, state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");
    let query = InsertQuery::new(TABLE_CUSTOMERS, &json!({ "nombre": "Ana" })).expect("query");

    let row = backend.insert(&query).await.expect("insert");

    assert!(row.is_none());
    assert_eq!(
        captured(&state).await[0].prefer.as_deref(),
        Some("return=minimal")
    );
}

#[tokio::test]
async fn update_filters_by_equality() {
    let (url, state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");
    let query = UpdateQuery::new(
        TABLE_APPOINTMENTS,
        &json!({ "estado": "en_recepción", "notas": "Llaves entregadas" }),
        "id",
        7,
    )
    .expect("query");

    backend.update(&query).await.expect("update");

    let requests = captured(&state).await;
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].params["id"], "eq.7");
    assert_eq!(
        requests[0].body.as_ref().expect("body")["estado"],
        json!("en_recepción")
    );
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let (url, _state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");
    let query = InsertQuery::new("vehiculos", &json!({ "cliente_id": 99 }))
        .expect("query")
        .returning();

    let err = backend.insert(&query).await.expect_err("rejected");

    match err {
        BackendError::Api(api) => {
            assert_eq!(api.status, 400);
            assert_eq!(api.code.as_deref(), Some("23503"));
            assert_eq!(
                api.message,
                "insert or update on table \"vehiculos\" violates foreign key constraint"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_falls_back_to_status_text() {
    let (url, _state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");
    let query = SelectQuery::new("flaky", Projection::new().column("id"));

    let err = backend.select(&query).await.expect_err("bad gateway");

    assert_eq!(err.to_string(), "502 Bad Gateway");
}

#[test]
fn base_url_path_prefix_is_preserved() {
    let backend = RestBackend::new("https://demo.example.com/proxy", "k").expect("backend");
    assert_eq!(backend.base_url().as_str(), "https://demo.example.com/proxy/");
}

#[tokio::test]
async fn auth_health_probe_reports_status() {
    let (url, _state) = spawn_rest_server().await;
    let backend = RestBackend::new(&url, "anon-key").expect("backend");

    let health = backend.probe_auth_health().await.expect("probe");
    let table = backend.probe_table(TABLE_APPOINTMENTS).await.expect("probe");

    assert_eq!(health.status, 401);
    assert!(table.is_success());
}
