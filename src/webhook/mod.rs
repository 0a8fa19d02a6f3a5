//! Webhook handlers for external integrations
//!
//! ## Modules
//!
//! - [`flows`] - WhatsApp Flows encrypted data exchange endpoint

pub mod flows;
pub mod routes;
