//! Rotorparts Checkout library.
//!
//! This crate provides the checkout service as a library, allowing it to be
//! tested and reused. The binary in `main.rs` wires it to an HTTP listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
