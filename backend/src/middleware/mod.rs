//! Request middleware.

pub mod trace;

pub use trace::{Trace, TraceId, TRACE_ID_HEADER};
