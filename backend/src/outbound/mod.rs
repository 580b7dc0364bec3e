//! Outbound adapters.
//!
//! Purpose: implement the domain ports against real infrastructure, the
//! PostgreSQL store and the push relay.

pub mod persistence;
pub mod push;

pub use push::HttpPushDelivery;
