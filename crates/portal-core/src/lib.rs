//! Core types and trait definitions for the health portal data layer.
//!
//! No HTTP or database code lives here. Backends implement
//! [`table::TableStore`] and [`identity::AuthProvider`]; the synchronization
//! layer in `portal-sync` depends only on these seams.

#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod error;
pub mod health_check;
pub mod identity;
pub mod normalize;
pub mod notify;
pub mod profile;
pub mod table;

pub use error::{AuthFailure, ParseError};
pub use identity::{AuthProvider, Identity, StaticSession};
pub use normalize::Decoded;
pub use table::{Row, Table, TableStore};
