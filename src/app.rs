use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers;
use crate::middleware::{rate_limit_middleware, Admission};
use crate::rate_limit::LimiterCategory;
use crate::state::AppState;

/// Full route table with global middleware
pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    // base64 inflates direct uploads by a third; leave headroom for the JSON around it
    let body_limit = state.service.settings().max_upload_bytes / 3 * 4 + 64 * 1024;

    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(upload_routes(&state))
        .merge(image_routes(&state))
        .merge(annotation_routes(&state))
        .merge(message_routes(&state))
        .merge(user_routes(&state))
        .merge(bucket_routes())
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
}

fn limited(route: MethodRouter<AppState>, state: &AppState, category: LimiterCategory) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(Admission::new(state, category), rate_limit_middleware))
}

fn upload_routes(state: &AppState) -> Router<AppState> {
    use handlers::images;

    Router::new()
        .route("/images/upload", limited(post(images::image_upload), state, LimiterCategory::Upload))
        .route("/images", limited(post(images::image_direct_upload), state, LimiterCategory::Upload))
}

fn image_routes(state: &AppState) -> Router<AppState> {
    use handlers::images;

    Router::new()
        .route("/images/:id", limited(get(images::image_get), state, LimiterCategory::General))
        .route("/images/:id/share", limited(post(images::share_post), state, LimiterCategory::General))
}

fn annotation_routes(state: &AppState) -> Router<AppState> {
    use handlers::annotations;

    Router::new()
        .route(
            "/annotations",
            limited(post(annotations::annotation_post), state, LimiterCategory::General),
        )
        .route(
            "/images/:id/annotations",
            limited(get(annotations::annotations_get), state, LimiterCategory::General),
        )
}

fn message_routes(state: &AppState) -> Router<AppState> {
    use handlers::messages;

    // Reads draw on the general budget, posts on the chat budget
    Router::new().route(
        "/annotations/:id/messages",
        limited(get(messages::messages_get), state, LimiterCategory::General).merge(limited(
            post(messages::message_post),
            state,
            LimiterCategory::Chat,
        )),
    )
}

fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/user/images",
        limited(get(handlers::user::user_images_get), state, LimiterCategory::General),
    )
}

// Not rate limited; the upload signature gates writes
fn bucket_routes() -> Router<AppState> {
    Router::new().route(
        "/bucket/:name",
        get(handlers::bucket::get).put(handlers::bucket::put),
    )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
