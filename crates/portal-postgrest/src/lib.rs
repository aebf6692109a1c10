//! Hosted backend for the health portal: a [`portal_core::TableStore`] over
//! the PostgREST `/rest/v1` API and a [`portal_core::AuthProvider`] over
//! `/auth/v1/user`, as exposed by a Supabase project.

mod query;

pub mod auth;
pub mod client;
pub mod error;

pub use auth::SupabaseAuth;
pub use client::{PostgrestClient, PostgrestConfig};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
