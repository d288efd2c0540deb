//! Command-line tooling for the account
//!
//! Key generation, request hashing and signing, and a scripted demo.

pub mod commands;

pub use commands::{demo, hash_request, keygen, sign, CliResult};
