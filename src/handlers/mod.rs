// handlers/mod.rs - Tiered handler layout
//
// Public (no session) -> Protected (admin session) -> Dev (static admin token)
pub mod dev;
pub mod multipart;
pub mod protected;
pub mod public;
