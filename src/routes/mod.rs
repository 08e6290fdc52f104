//! Router Module Index
//!
//! Routes are split by access level so the auth gate is applied once, at the
//! router layer, instead of per handler.

/// Routes open to anonymous clients: signup, signin, shared collections.
pub mod public;

/// Routes behind the auth middleware. Every handler receives a verified `AuthUser`.
pub mod authenticated;
