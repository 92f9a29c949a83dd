#![forbid(unsafe_code)]

mod support;

pub use support::{create_output, init_tracing};
