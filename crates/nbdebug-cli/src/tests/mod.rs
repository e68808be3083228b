//! In-crate tests for the console runtime and the debug session.

mod behaviour;
mod support;
