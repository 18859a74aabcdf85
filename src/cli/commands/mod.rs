pub mod check;
pub mod content;
