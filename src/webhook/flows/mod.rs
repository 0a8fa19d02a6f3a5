//! WhatsApp Flows data exchange endpoint
//!
//! Every request carries an AES key wrapped with our RSA public key. The key
//! decrypts the request and encrypts the reply, which is all WhatsApp needs
//! to trust the endpoint.
//!
//! ## Submodules
//!
//! - [`security`] - `x-hub-signature-256` verification
//! - [`keys`] - RSA key unwrap and challenge signing
//! - [`cipher`] - AES-GCM payload decryption and response encryption
//! - [`logic`] - Business logic seam and its default implementation
//! - [`handler`] - The full exchange pipeline
//! - [`routes`] - HTTP endpoint handlers

pub mod cipher;
pub mod errors;
pub mod handler;
pub mod keys;
pub mod logic;
pub mod routes;
pub mod schemas;
pub mod security;

pub use routes::{challenge, exchange, method_not_allowed};
