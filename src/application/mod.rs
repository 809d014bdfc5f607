//! Application layer services implementing business logic.
//!
//! Services consume the domain's store trait and policies and expose the
//! operations HTTP handlers call.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Allocation, resolution and owner edits
//! - [`services::admission_service::AdmissionService`] - Redirect burst limit and allocation quota
//! - [`services::auth_service::AuthService`] - API key identification

pub mod services;
