// handlers/protected/mod.rs - Admin handlers (admin session required)
//
// Route prefix: /api/admin/*
// Middleware: require_admin injects the SessionUser before any handler runs

pub mod content;
pub mod uploads;

pub use content::*;
pub use uploads::*;
