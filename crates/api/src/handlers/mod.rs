//! HTTP handlers, one module per resource.

pub mod certificates;
pub mod donations;
pub mod qr;
pub mod users;
