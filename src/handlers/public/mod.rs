// handlers/public/mod.rs - Public handlers (no session required)
//
// Content reads for the site pages plus the login/logout pair that
// establishes an admin session.

pub mod auth;
pub mod content;

pub use auth::*;
pub use content::*;
