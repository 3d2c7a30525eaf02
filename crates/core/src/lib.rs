//! Storedesk Core - Shared types library.
//!
//! This crate provides the domain types used across all Storedesk components:
//! - `admin` - The dashboard web application
//! - `cli` - Command-line access to the store API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O and no HTTP
//! clients. Everything here can be unit tested without a running API.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`models`] - Products, orders and user profiles as the store API sends them
//! - [`validation`] - Form validation producing per-field error messages
//! - [`listing`] - Search, filtering, sorting and pagination of cached lists
//! - [`metrics`] - Dashboard figures derived from cached lists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod listing;
pub mod metrics;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
