//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod fake_box;
pub mod raw_http;
pub mod socket_guard;
