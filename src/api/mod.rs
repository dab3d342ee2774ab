pub mod extract;
pub mod response;

pub use extract::{JsonBody, PathParam, QueryParams};
pub use response::{ApiResponse, ApiResult};
