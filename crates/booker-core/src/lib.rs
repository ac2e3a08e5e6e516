//! Core types and the resource-form engine for the booker frontend.
//!
//! This crate has no HTTP or terminal dependencies. Transport lives behind
//! the [`api::ResourceApi`] trait; the `booker-cli` crate supplies the
//! `reqwest` implementation and the terminal UI.

pub mod api;
pub mod coerce;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod form;
pub mod label;
pub mod resource;
pub mod schema;
pub mod session;


pub use error::{ApiError, Error, Result, ValidationErrors};
