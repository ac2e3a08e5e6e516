//! The `ResourceApi` trait: the REST collaborator the form talks to.
//!
//! Read methods return the raw JSON body; the controller decodes the
//! envelope itself so every implementation stays a thin transport.
//! `booker-cli` implements this over HTTP.

use std::future::Future;

use serde_json::Value;

use crate::{
  ApiError,
  resource::{NewResource, NewResourceType, ResourceUpdate},
};

/// Abstraction over the booking REST API.
///
/// All methods return `Send` futures so results can be fetched on spawned
/// tasks.
pub trait ResourceApi: Send + Sync {
  /// `GET /resource_types`
  fn list_resource_types(&self)
  -> impl Future<Output = Result<Value, ApiError>> + Send + '_;

  /// `GET /resource_types/{id}`
  fn get_resource_type(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + '_;

  /// `POST /admin/resource_types`
  fn create_resource_type<'a>(
    &'a self,
    body: &'a NewResourceType,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + 'a;

  /// `DELETE /admin/resource_types/{id}`
  fn delete_resource_type(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + '_;

  /// `GET /resources?page={page}&limit={limit}`
  fn list_resources(
    &self,
    page: u32,
    limit: u32,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + '_;

  /// `GET /resources/{id}`
  fn get_resource(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + '_;

  /// `POST /admin/resources`
  fn create_resource<'a>(
    &'a self,
    body: &'a NewResource,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + 'a;

  /// `PUT /admin/resources/{id}`
  fn update_resource<'a>(
    &'a self,
    id: i64,
    body: &'a ResourceUpdate,
  ) -> impl Future<Output = Result<Value, ApiError>> + Send + 'a;

  /// `DELETE /admin/resources/{id}`
  fn delete_resource(&self, id: i64)
  -> impl Future<Output = Result<Value, ApiError>> + Send + '_;
}
