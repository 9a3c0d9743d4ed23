//! Warehouse inventory core.
//!
//! A library crate exposing the domain model, access policy, quantity
//! ledger, and PostgreSQL adapters behind repository ports. The consuming
//! HTTP layer resolves an [`domain::IdentityContext`] per request, calls the
//! domain services, and maps [`domain::DomainError`] values onto its
//! transport.

pub mod config;
pub mod domain;
pub mod outbound;
