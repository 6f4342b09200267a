//! Idempotent provisioning primitives.
//!
//! Each helper checks the current state of the host before
//! changing it, so running it twice is harmless. Helpers that
//! cannot check (unzip, rename) live in the install workflow
//! instead.

pub mod apache;
pub mod deb;
pub mod files;
pub mod mysql;
pub mod system;
pub mod user;
