//! Synchronization layer between local entity state and the remote tables.
//!
//! Each entity store (profile, appointments, health checks, stats) composes
//! the identity [`resolver`], the row normalizers from `portal-core` and the
//! existence-checked [`upsert`] into a fetch / mutate / local-cache lifecycle.
//! Stores are generic over any [`portal_core::TableStore`] and
//! [`portal_core::AuthProvider`], and are built from a shared
//! [`PortalContext`].

pub mod appointments;
pub mod context;
pub mod error;
pub mod form;
pub mod health_checks;
pub mod profile;
pub mod resolver;
pub mod stats;
pub mod upsert;

pub use appointments::AppointmentStore;
pub use context::{PortalContext, StoreState};
pub use error::{AuthError, Error, PersistenceError, Result};
pub use form::{PasswordChange, PasswordOutcome, ProfileForm};
pub use health_checks::HealthCheckStore;
pub use profile::ProfileStore;
pub use stats::{Stats, StatsStore};
