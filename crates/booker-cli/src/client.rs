//! Async HTTP client for the booking JSON API.

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use booker_core::{
  ApiError,
  api::ResourceApi,
  resource::{NewResource, NewResourceType, ResourceUpdate},
  session::SessionContext,
};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

/// Connection settings for the booking API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the booking REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:  Client,
  config:  ApiConfig,
  session: Arc<dyn SessionContext>,
}

impl ApiClient {
  pub fn new(config: ApiConfig, session: Arc<dyn SessionContext>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      config,
      session,
    })
  }

  pub fn session(&self) -> &dyn SessionContext { self.session.as_ref() }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match self.session.token() {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send `req` and return the JSON body of a successful response.
  async fn send(&self, req: RequestBuilder, what: String) -> Result<Value, ApiError> {
    let resp = self
      .auth(req)
      .send()
      .await
      .map_err(|e| ApiError::Transport(format!("{what}: {e}")))?;

    let status = resp.status();
    let text = resp
      .text()
      .await
      .map_err(|e| ApiError::Transport(format!("{what}: {e}")))?;

    if !status.is_success() {
      tracing::debug!(%status, %what, "request rejected");
      return Err(ApiError::Status {
        status: status.as_u16(),
        body:   error_body(&text),
      });
    }

    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
  }
}

/// JSON when it parses, the raw text otherwise, nothing when empty.
fn error_body(text: &str) -> Option<Value> {
  if text.trim().is_empty() {
    return None;
  }
  Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

impl ResourceApi for ApiClient {
  // ── Resource types ────────────────────────────────────────────────────────

  /// `GET /api/resource_types`
  fn list_resource_types(&self) -> impl Future<Output = Result<Value, ApiError>> + Send + '_ {
    self.send(
      self.client.get(self.url("/resource_types")),
      "GET /resource_types".into(),
    )
  }

  /// `GET /api/resource_types/{id}`
  fn get_resource_type(&self, id: i64) -> impl Future<Output = Result<Value, ApiError>> + Send + '_ {
    let path = format!("/resource_types/{id}");
    self.send(self.client.get(self.url(&path)), format!("GET {path}"))
  }

  /// `POST /api/admin/resource_types`
  fn create_resource_type<'a>(
    &'a self,
    body: &'a NewResourceType,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + 'a {
    self.send(
      self.client.post(self.url("/admin/resource_types")).json(body),
      "POST /admin/resource_types".into(),
    )
  }

  /// `DELETE /api/admin/resource_types/{id}`
  fn delete_resource_type(&self, id: i64) -> impl Future<Output = Result<Value, ApiError>> + Send + '_ {
    let path = format!("/admin/resource_types/{id}");
    self.send(self.client.delete(self.url(&path)), format!("DELETE {path}"))
  }

  // ── Resources ─────────────────────────────────────────────────────────────

  /// `GET /api/resources?page={page}&limit={limit}`
  fn list_resources(
    &self,
    page: u32,
    limit: u32,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + '_ {
    self.send(
      self
        .client
        .get(self.url("/resources"))
        .query(&[("page", page), ("limit", limit)]),
      format!("GET /resources?page={page}"),
    )
  }

  /// `GET /api/resources/{id}`
  fn get_resource(&self, id: i64) -> impl Future<Output = Result<Value, ApiError>> + Send + '_ {
    let path = format!("/resources/{id}");
    self.send(self.client.get(self.url(&path)), format!("GET {path}"))
  }

  /// `POST /api/admin/resources`
  fn create_resource<'a>(
    &'a self,
    body: &'a NewResource,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + 'a {
    self.send(
      self.client.post(self.url("/admin/resources")).json(body),
      "POST /admin/resources".into(),
    )
  }

  /// `PUT /api/admin/resources/{id}`
  fn update_resource<'a>(
    &'a self,
    id: i64,
    body: &'a ResourceUpdate,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + 'a {
    let path = format!("/admin/resources/{id}");
    self.send(self.client.put(self.url(&path)).json(body), format!("PUT {path}"))
  }

  /// `DELETE /api/admin/resources/{id}`
  fn delete_resource(&self, id: i64) -> impl Future<Output = Result<Value, ApiError>> + Send + '_ {
    let path = format!("/admin/resources/{id}");
    self.send(self.client.delete(self.url(&path)), format!("DELETE {path}"))
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{delete, get, post, put},
  };
  use booker_core::{
    coerce::FieldValue, controller::ResourceFormController, session::StaticSession,
  };
  use std::collections::HashMap;

  use serde_json::json;

  use super::*;

  /// Serve `router` on an ephemeral local port; returns the base URL.
  pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
  }

  pub(crate) fn client(base_url: String, token: Option<&str>) -> ApiClient {
    let session = StaticSession::new(token.map(String::from), None);
    ApiClient::new(ApiConfig { base_url }, Arc::new(session)).unwrap()
  }

  pub(crate) fn booking_api() -> Router {
    Router::new()
      .route(
        "/api/resource_types",
        get(|| async {
          Json(json!({ "data": [
            { "id": 1, "type": "Meeting Room", "schema_definition": { "capacity": "number" } },
            { "id": 2, "type": "Laptop", "schema_definition": "{\"os\":\"string\"}" },
          ]}))
        }),
      )
      .route(
        "/api/resource_types/{id}",
        get(|Path(id): Path<i64>| async move {
          match id {
            1 => Ok(Json(json!({ "resource_type": {
              "id": 1, "type": "Meeting Room", "schema_definition": { "capacity": "number" },
            }}))),
            2 => Ok(Json(json!({
              "id": 2, "type": "Laptop", "schema_definition": "{\"os\":\"string\"}",
            }))),
            _ => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "resource type not found" })))),
          }
        }),
      )
      .route(
        "/api/admin/resources",
        post(|Json(body): Json<Value>| async move {
          (StatusCode::CREATED, Json(json!({ "id": 7, "received": body })))
        }),
      )
      .route(
        "/api/admin/resources/{id}",
        put(|| async { (StatusCode::CONFLICT, "resource is booked") }).delete(
          |Path(id): Path<i64>| async move {
            match id {
              3 => Err((StatusCode::CONFLICT, Json(json!({ "message": "resource has bookings" })))),
              _ => Ok(StatusCode::NO_CONTENT),
            }
          },
        ),
      )
      .route(
        "/api/admin/resource_types/{id}",
        delete(|| async {
          (StatusCode::BAD_REQUEST, Json(json!({ "error": "type is in use" })))
        }),
      )
      .route(
        "/api/resources",
        get(|Query(params): Query<HashMap<String, String>>| async move {
          Json(json!({ "data": [{
            "id": 4,
            "name": "Topaz",
            "type_id": 1,
            "location": format!("page {} of size {}", params["page"], params["limit"]),
          }]}))
        }),
      )
  }

  #[tokio::test]
  async fn sends_bearer_token_and_api_prefix() {
    let router = Router::new().route(
      "/api/resource_types",
      get(|headers: HeaderMap| async move {
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
          Some("Bearer secret") => Ok(Json(json!([]))),
          _ => Err(StatusCode::UNAUTHORIZED),
        }
      }),
    );
    let base = serve(router).await;

    let with_token = client(format!("{base}/"), Some("secret"));
    assert_eq!(with_token.list_resource_types().await.unwrap(), json!([]));

    let without = client(base, None);
    let err = without.list_resource_types().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 401, body: None }));
  }

  #[tokio::test]
  async fn error_bodies_are_captured() {
    let base = serve(booking_api()).await;
    let api = client(base, None);

    let err = api.get_resource_type(9).await.unwrap_err();
    assert_eq!(err.user_message("fallback"), "resource type not found");

    let body = ResourceUpdate {
      name:        "Topaz".into(),
      type_id:     1,
      location:    "Office".into(),
      description: "Room".into(),
      is_active:   true,
      properties:  Default::default(),
    };
    let err = api.update_resource(3, &body).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 409, .. }));
    assert_eq!(err.user_message("fallback"), "resource is booked");
  }

  #[tokio::test]
  async fn lists_resources_with_paging() {
    let api = client(serve(booking_api()).await, None);
    let body = api.list_resources(2, 25).await.unwrap();
    assert_eq!(body["data"][0]["location"], "page 2 of size 25");
  }

  #[tokio::test]
  async fn deletes_resources_and_types() {
    let api = client(serve(booking_api()).await, Some("t"));

    assert_eq!(api.delete_resource(8).await.unwrap(), Value::Null);

    let err = api.delete_resource(3).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 409, .. }));
    assert_eq!(err.user_message("Failed to delete resource"), "resource has bookings");

    let err = api.delete_resource_type(1).await.unwrap_err();
    assert_eq!(err.user_message("Failed to delete resource type"), "type is in use");
  }

  #[tokio::test]
  async fn empty_success_body_is_null() {
    let router = Router::new().route(
      "/api/admin/resources",
      post(|| async { StatusCode::NO_CONTENT }),
    );
    let api = client(serve(router).await, None);
    let body = NewResource {
      name:        "Topaz".into(),
      type_id:     1,
      location:    "Office".into(),
      description: "Room".into(),
      properties:  Default::default(),
    };
    assert_eq!(api.create_resource(&body).await.unwrap(), Value::Null);
  }

  #[tokio::test]
  async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(format!("http://{addr}"), None);
    let err = api.list_resource_types().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.user_message("Failed"), "Failed");
  }

  #[tokio::test]
  async fn create_session_over_http() {
    let api = Arc::new(client(serve(booking_api()).await, Some("t")));
    let mut form = ResourceFormController::for_create(api);

    form.load_resource_types().await.unwrap();
    assert_eq!(form.resource_types().len(), 2);

    form.select_type(Some(1)).await.unwrap();
    assert_eq!(form.draft.location, "Office");
    form.draft.name = "Topaz".into();
    form.draft.description = "Corner room".into();
    assert!(form.set_property("capacity", FieldValue::Text("8".into())));

    let saved = form.submit().await.unwrap();
    assert_eq!(saved["id"], 7);
    assert_eq!(
      saved["received"],
      json!({
        "name": "Topaz",
        "type_id": 1,
        "location": "Office",
        "description": "Corner room",
        "properties": { "capacity": 8 },
      })
    );
  }

  #[tokio::test]
  async fn unknown_type_over_http_leaves_form_usable() {
    let api = Arc::new(client(serve(booking_api()).await, None));
    let mut form = ResourceFormController::for_create(api);

    form.select_type(Some(2)).await.unwrap();
    assert_eq!(form.fields().len(), 1);

    assert!(form.select_type(Some(5)).await.is_err());
    assert!(form.fields().is_empty());
    assert!(form.banner().is_some());
  }
}
