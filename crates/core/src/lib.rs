//! Domain types and pure logic for the Rebond donation-tracking platform.
//!
//! This crate is deliberately free of database and HTTP dependencies:
//! it holds the shared type aliases, the error taxonomy, the donation
//! lifecycle enum, and the two document renderers (certificate PDF and
//! donation QR code), all as pure functions over plain data.

pub mod certificate;
pub mod donation;
pub mod error;
pub mod qr;
pub mod roles;
pub mod types;
