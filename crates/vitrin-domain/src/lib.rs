//! Shared domain types for the vitrin storefront services.

pub mod user;
