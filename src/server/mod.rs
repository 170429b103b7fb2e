// Web服务器模块

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ErrorBody;
pub use state::AppState;

use axum::{
    routing::{delete, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// 构建完整的路由
///
/// 文件 API 同时挂载在根路径和 `/file` 前缀下（前端使用后者）
pub fn build_router(state: AppState) -> Router {
    let file_routes = Router::new()
        .route(
            "/list",
            get(handlers::list_files).fallback(handlers::method_not_allowed),
        )
        .route(
            "/details",
            get(handlers::get_file_details).fallback(handlers::method_not_allowed),
        )
        .route(
            "/open",
            get(handlers::open_file).fallback(handlers::method_not_allowed),
        )
        .route(
            "/delete",
            delete(handlers::delete_file).fallback(handlers::method_not_allowed),
        )
        .route(
            "/raw",
            get(handlers::serve_raw_file).fallback(handlers::method_not_allowed),
        );

    // 配置中间件层
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http()) // HTTP 请求日志
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    Router::new()
        .merge(file_routes.clone())
        .nest("/file", file_routes)
        .route("/health", get(handlers::health_check))
        .fallback(handlers::not_found)
        .layer(middleware)
        .with_state(state)
}
