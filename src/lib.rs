//! CallCoach Intake API Library
//!
//! This library provides the intake side of the CallCoach sales-practice
//! product: the landing page lead form (with background AI research) and
//! the sales rep onboarding form, both persisted to the Supabase project.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Direct Postgres persistence.
//! - `enrichment`: Background lead enrichment pipeline.
//! - `errors`: Error handling types.
//! - `forms`: Headless form state (fields, status banner, redirects).
//! - `gateways`: Persistence and research traits.
//! - `handlers`: HTTP request handlers.
//! - `intake`: Lead and profile submission logic.
//! - `models`: Core data models.
//! - `supabase_client`: Supabase REST and Edge Function client.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod db_storage;
pub mod enrichment;
pub mod errors;
pub mod forms;
pub mod gateways;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod supabase_client;
