use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::ClientKey;
use crate::error::ApiError;
use crate::rate_limit::LimiterCategory;
use crate::state::AppState;

/// Middleware state: the app plus the limiter category of the routes it guards
#[derive(Clone)]
pub struct Admission {
    pub state: AppState,
    pub category: LimiterCategory,
}

impl Admission {
    pub fn new(state: &AppState, category: LimiterCategory) -> Self {
        Self {
            state: state.clone(),
            category,
        }
    }
}

/// Count the request against the caller's window before any body or path
/// parsing, so malformed requests are limited like well-formed ones.
pub async fn rate_limit_middleware(
    State(admission): State<Admission>,
    client: ClientKey,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    admission.state.service.admit(admission.category, &client)?;
    Ok(next.run(request).await)
}
