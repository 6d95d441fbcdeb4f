//! Application-facing views over the Web API client.

pub mod user_data;

pub use user_data::*;
