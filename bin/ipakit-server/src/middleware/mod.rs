//! HTTP middleware stack.
//!
//! [`cors`] builds the CORS layer from configuration and [`trace`] tags every
//! request with an `x-trace-id` span.

pub mod cors;
pub mod trace;
