//! HTTP route definitions

use crate::dispatcher::Route;
use crate::handlers::{
    CreateDirectory, CreateUser, DeleteFile, DeleteUser, GetFile, GetUser, Login, RenameFile,
    UpdateUser,
};
use crate::upload::UploadFile;
use crate::{middleware, AppState};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::Method,
    middleware as axum_middleware,
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const USER_ITEM: &str = r"^/api/users/(\d+)$";
const FILE_ITEM: &str = r"^/api/files/(\d+)$";

/// The REST API route table, in match order
pub fn api_routes() -> Vec<Route> {
    vec![
        Route::body("/api/login", Method::POST, Login),
        Route::body("/api/users", Method::POST, CreateUser),
        Route::request(USER_ITEM, Method::GET, GetUser),
        Route::request(USER_ITEM, Method::DELETE, DeleteUser),
        Route::body(USER_ITEM, Method::PATCH, UpdateUser),
        Route::request(FILE_ITEM, Method::GET, GetFile),
        Route::request(FILE_ITEM, Method::DELETE, DeleteFile),
        Route::upload(FILE_ITEM, Method::PUT, UploadFile),
        Route::body(FILE_ITEM, Method::POST, CreateDirectory),
        Route::body(FILE_ITEM, Method::PATCH, RenameFile),
    ]
}

/// Create the main router.
///
/// Every request is handed to the dispatcher; axum only contributes the
/// middleware stack.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new()
        .fallback(dispatch)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware));

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.upload_limit())),
        )
        .with_state(state)
}

async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    state.dispatcher.dispatch(&state, request).await
}
