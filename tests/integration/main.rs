//! Integration tests entry point, following https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
//!
//! The binary is driven end to end with a scripted editor and a fake `arc`, so these only run on unix.
#![cfg(unix)]

mod common;
mod create_task;
mod failures;
