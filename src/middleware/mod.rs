pub mod auth;
pub mod dev_token;
pub mod response;

pub use auth::{require_admin, require_authenticated, SessionUser};
pub use dev_token::require_dev_token;
pub use response::{ApiResponse, ApiResult};
