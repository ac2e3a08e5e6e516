//! [`ResourceFormController`]: one create-or-edit session, end to end.
//!
//! The async operations are split into a synchronous `begin_*` step, the
//! collaborator call, and a synchronous `apply_*`/`finish_*` step. Callers
//! that want to keep a UI responsive run the middle step on a spawned task;
//! the convenience methods ([`ResourceFormController::select_type`],
//! [`ResourceFormController::submit`]) run all three inline.
//!
//! Ordering rules:
//! - only the response to the most recent type selection is applied; an
//!   older response that arrives late is dropped;
//! - a second submission is refused while one is outstanding.

use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;

use crate::{
  ApiError, Error, Result, ValidationErrors,
  api::ResourceApi,
  coerce::FieldValue,
  envelope::{Envelope, RESOURCE_TYPE_KEYS, RESOURCE_TYPES_KEYS},
  form::{
    FormMode, ResourceDraft, SchemaField, SchemaFormModel, SchemaState, name_suggestions,
    suggested_location, validate,
  },
  resource::{NewResource, PropertyValue, Resource, ResourceType, ResourceUpdate},
};

pub const LOAD_TYPES_FAILED: &str = "Failed to load resource types. Please try again.";
pub const LOAD_TYPE_FAILED: &str = "Failed to load resource type details. Please try again.";

// ─── Tickets & payloads ──────────────────────────────────────────────────────

/// Identifies one type selection. Handed out by
/// [`ResourceFormController::begin_select`] and redeemed by
/// [`ResourceFormController::apply_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket {
  generation:  u64,
  pub type_id: i64,
}

/// A validated, coerced payload ready for the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
  Create(NewResource),
  Update {
    resource_id: i64,
    body:        ResourceUpdate,
  },
}

/// Send `submission` to the matching create/update endpoint.
pub async fn send_submission<A: ResourceApi>(
  api: &A,
  submission: &Submission,
) -> Result<Value, ApiError> {
  match submission {
    Submission::Create(body) => api.create_resource(body).await,
    Submission::Update { resource_id, body } => api.update_resource(*resource_id, body).await,
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct ResourceFormController<A> {
  api:                 Arc<A>,
  mode:                FormMode,
  /// Static fields; edit them directly and call
  /// [`clear_error`](Self::clear_error) for the touched key.
  pub draft:           ResourceDraft,
  resource_types:      Vec<ResourceType>,
  model:               SchemaFormModel,
  /// Stored property values of the resource being edited.
  existing_properties: BTreeMap<String, PropertyValue>,
  errors:              ValidationErrors,
  /// Non-blocking message about the type list.
  types_error:         Option<String>,
  /// Non-blocking message about schema loading or submission.
  banner:              Option<String>,
  selection:           u64,
  submitting:          bool,
}

impl<A: ResourceApi> ResourceFormController<A> {
  /// A session that creates a new resource.
  pub fn for_create(api: Arc<A>) -> Self {
    Self::new(api, FormMode::Create, ResourceDraft::default(), BTreeMap::new())
  }

  /// A session that edits `resource`.
  pub fn for_edit(api: Arc<A>, resource: Resource) -> Self {
    let draft = ResourceDraft::from_resource(&resource);
    Self::new(
      api,
      FormMode::Edit {
        resource_id: resource.id,
      },
      draft,
      resource.properties,
    )
  }

  fn new(
    api: Arc<A>,
    mode: FormMode,
    draft: ResourceDraft,
    existing_properties: BTreeMap<String, PropertyValue>,
  ) -> Self {
    Self {
      api,
      mode,
      draft,
      resource_types: Vec::new(),
      model: SchemaFormModel::default(),
      existing_properties,
      errors: ValidationErrors::new(),
      types_error: None,
      banner: None,
      selection: 0,
      submitting: false,
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  /// Shared handle to the collaborator, for running calls on spawned tasks.
  pub fn api(&self) -> Arc<A> { Arc::clone(&self.api) }

  pub fn mode(&self) -> FormMode { self.mode }

  pub fn resource_types(&self) -> &[ResourceType] { &self.resource_types }

  pub fn schema_state(&self) -> &SchemaState { self.model.state() }

  pub fn fields(&self) -> &[SchemaField] { self.model.fields() }

  /// Errors from the last failed submit attempt, minus fields touched since.
  pub fn errors(&self) -> &ValidationErrors { &self.errors }

  pub fn types_error(&self) -> Option<&str> { self.types_error.as_deref() }

  pub fn banner(&self) -> Option<&str> { self.banner.as_deref() }

  pub fn is_submitting(&self) -> bool { self.submitting }

  /// The resolved type whose schema is live, if any.
  pub fn selected_type(&self) -> Option<&ResourceType> { self.model.resource_type() }

  pub fn name_suggestions(&self) -> &'static [&'static str] {
    self
      .selected_type()
      .map(|t| name_suggestions(t.display_name()))
      .unwrap_or_default()
  }

  // ── Type list ─────────────────────────────────────────────────────────────

  /// Fetch the selectable resource types.
  ///
  /// An unrecognized response shape yields an empty list without error; a
  /// transport failure also empties the list and sets
  /// [`types_error`](Self::types_error). Calling it again retries.
  pub async fn load_resource_types(&mut self) -> Result<()> {
    let response = self.api.list_resource_types().await;
    self.apply_resource_types(response)
  }

  /// Apply a type-list response fetched elsewhere.
  pub fn apply_resource_types(&mut self, response: Result<Value, ApiError>) -> Result<()> {
    match response {
      Ok(body) => {
        self.types_error = None;
        self.resource_types = match Envelope::<Vec<ResourceType>>::decode(body, RESOURCE_TYPES_KEYS) {
          Some(envelope) => envelope.into_inner(),
          None => {
            tracing::warn!("unrecognized resource type list shape; treating as empty");
            Vec::new()
          }
        };
        tracing::debug!(count = self.resource_types.len(), "resource types loaded");
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "failed to load resource types");
        self.resource_types.clear();
        self.types_error = Some(LOAD_TYPES_FAILED.into());
        Err(Error::LoadTypes(e))
      }
    }
  }

  /// Whether the current selection failed to resolve and can be retried.
  pub fn selection_failed(&self) -> bool { matches!(self.model.state(), SchemaState::Error { .. }) }

  // ── Type selection ────────────────────────────────────────────────────────

  /// Record a new selection and invalidate any selection still in flight.
  ///
  /// Returns the ticket to fetch with, or `None` when the selection was
  /// cleared (no fetch needed).
  pub fn begin_select(&mut self, type_id: Option<i64>) -> Option<SelectionTicket> {
    self.selection += 1;
    self.draft.type_id = type_id;
    self.errors.remove("type_id");
    self.banner = None;

    match type_id {
      None => {
        self.model.clear();
        None
      }
      Some(type_id) => {
        self.model.start_loading(type_id);
        Some(SelectionTicket {
          generation: self.selection,
          type_id,
        })
      }
    }
  }

  /// Apply the response for `ticket`.
  ///
  /// Returns `Ok(false)` when the ticket has been superseded and the response
  /// was dropped, `Ok(true)` when the schema is now live. A failed or
  /// unrecognizable response puts the model in its error state and returns
  /// [`Error::LoadSchema`].
  pub fn apply_selection(
    &mut self,
    ticket: SelectionTicket,
    response: Result<Value, ApiError>,
  ) -> Result<bool> {
    if ticket.generation != self.selection {
      tracing::debug!(type_id = ticket.type_id, "dropping stale resource type response");
      return Ok(false);
    }

    let resolved = match response {
      Ok(body) => Envelope::<ResourceType>::decode(body, RESOURCE_TYPE_KEYS)
        .map(Envelope::into_inner)
        .ok_or_else(|| format!("Resource type {} not found.", ticket.type_id)),
      Err(e) => {
        tracing::warn!(type_id = ticket.type_id, error = %e, "failed to load resource type");
        Err(LOAD_TYPE_FAILED.to_string())
      }
    };

    match resolved {
      Ok(resource_type) => {
        if let Some(location) = suggested_location(resource_type.display_name(), &self.draft.location) {
          self.draft.location = location.to_string();
          self.errors.remove("location");
        }
        let seed = match self.mode {
          FormMode::Edit { .. } => Some(&self.existing_properties),
          FormMode::Create => None,
        };
        self.model.resolve(resource_type, seed);
        self.errors.retain(|key, _| !key.starts_with("property_"));
        Ok(true)
      }
      Err(message) => {
        self.model.fail(ticket.type_id, message.clone());
        self.banner = Some(message.clone());
        Err(Error::LoadSchema {
          type_id: ticket.type_id,
          message,
        })
      }
    }
  }

  /// Select `type_id` (or clear the selection) and resolve its schema inline.
  pub async fn select_type(&mut self, type_id: Option<i64>) -> Result<()> {
    let Some(ticket) = self.begin_select(type_id) else {
      return Ok(());
    };
    let response = self.api.get_resource_type(ticket.type_id).await;
    self.apply_selection(ticket, response).map(|_| ())
  }

  // ── Editing ───────────────────────────────────────────────────────────────

  /// Set a dynamic field. Returns `false` if `key` is not a live field.
  pub fn set_property(&mut self, key: &str, value: FieldValue) -> bool {
    let changed = self.model.set_value(key, value);
    if changed {
      self.clear_error(&crate::form::property_error_key(key));
    }
    changed
  }

  /// Forget the error for `key` and any banner, as after the user edits it.
  pub fn clear_error(&mut self, key: &str) {
    self.errors.remove(key);
    if !self.submitting {
      self.banner = None;
    }
  }

  // ── Validation & submission ───────────────────────────────────────────────

  /// Validate the whole form. Pure: nothing is recorded.
  pub fn validate(&self) -> ValidationErrors { validate(&self.draft, self.model.fields()) }

  /// Build the payload for the current form state.
  pub fn build_submission(&self) -> Result<Submission> {
    let Some(type_id) = self.draft.type_id else {
      return Err(Error::Validation(ValidationErrors::from([(
        "type_id".to_string(),
        "Type is required".to_string(),
      )])));
    };

    let name = self.draft.name.trim().to_string();
    let location = self.draft.location.trim().to_string();
    let description = self.draft.description.trim().to_string();
    let properties = self.model.properties();

    Ok(match self.mode {
      FormMode::Create => Submission::Create(NewResource {
        name,
        type_id,
        location,
        description,
        properties,
      }),
      FormMode::Edit { resource_id } => Submission::Update {
        resource_id,
        body: ResourceUpdate {
          name,
          type_id,
          location,
          description,
          is_active: self.draft.is_active,
          properties,
        },
      },
    })
  }

  /// Validate, build the payload and mark the session as submitting.
  ///
  /// Refused with [`Error::SubmitInProgress`] while a previous submission is
  /// outstanding, and with [`Error::Validation`] (errors also recorded in
  /// [`errors`](Self::errors)) when the form is incomplete.
  pub fn begin_submit(&mut self) -> Result<Submission> {
    if self.submitting {
      return Err(Error::SubmitInProgress);
    }

    let errors = self.validate();
    if !errors.is_empty() {
      self.errors = errors.clone();
      return Err(Error::Validation(errors));
    }
    self.errors.clear();

    let submission = self.build_submission()?;
    self.submitting = true;
    self.banner = None;
    Ok(submission)
  }

  /// Record the collaborator's answer. Form values are kept either way so a
  /// failed submission can be retried.
  pub fn finish_submit(&mut self, response: Result<Value, ApiError>) -> Result<Value> {
    self.submitting = false;
    match response {
      Ok(body) => {
        tracing::info!(mode = ?self.mode, "resource saved");
        Ok(body)
      }
      Err(source) => {
        let message = source.user_message(self.failure_message());
        tracing::warn!(error = %source, %message, "submission rejected");
        self.banner = Some(message.clone());
        Err(Error::Submission { message, source })
      }
    }
  }

  /// Validate and submit inline.
  pub async fn submit(&mut self) -> Result<Value> {
    let submission = self.begin_submit()?;
    let response = send_submission(self.api.as_ref(), &submission).await;
    self.finish_submit(response)
  }

  fn failure_message(&self) -> &'static str {
    match self.mode {
      FormMode::Create => "Failed to create resource",
      FormMode::Edit { .. } => "Failed to update resource",
    }
  }
}
