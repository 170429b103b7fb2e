// 文件管理 API 处理器

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::filesystem::{
    DeleteResponse, FileContentResponse, FileDetailsResponse, FileListResponse, FileService,
    FsError, FsErrorCode,
};
use crate::server::error::ErrorBody;
use crate::server::state::AppState;

/// 原始下载的缓存策略
const RAW_CACHE_CONTROL: &str = "public, max-age=3600";

/// 路径查询参数
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

/// 路径查询参数的提取结果
type PathQueryResult = Result<Query<PathQuery>, QueryRejection>;

/// 取出并校验 path 参数
///
/// 查询串无法解析时按非法参数处理；`default` 为 None 时参数必填
fn checked_path(
    state: &AppState,
    query: PathQueryResult,
    default: Option<&str>,
) -> Result<String, FsError> {
    let Query(query) = query.map_err(|rejection| {
        warn!("查询参数解析失败: {}", rejection.body_text());
        FsError::new(FsErrorCode::InvalidPath).with_message("Invalid query parameters")
    })?;

    let path = match query.path.filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => match default {
            Some(d) => d.to_string(),
            None => return Err(FsError::new(FsErrorCode::MissingParameter)),
        },
    };

    state.file_service.guard().validate_input(&path)?;
    Ok(path)
}

/// 在阻塞线程池中执行同步文件操作
async fn run_blocking<T, F>(service: Arc<FileService>, op: F) -> Result<T, FsError>
where
    F: FnOnce(&FileService) -> Result<T, FsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| {
            error!("文件操作任务异常退出: {}", e);
            FsError::new(FsErrorCode::Internal)
        })?
}

/// GET /list?path=/
/// 列出目录内容
pub async fn list_files(
    State(state): State<AppState>,
    query: PathQueryResult,
) -> Result<Json<FileListResponse>, FsError> {
    let path = checked_path(&state, query, Some("/"))?;
    let listing = run_blocking(state.file_service.clone(), move |svc| svc.list(&path)).await?;
    Ok(Json(listing))
}

/// GET /details?path=/file.txt
/// 获取文件详情
pub async fn get_file_details(
    State(state): State<AppState>,
    query: PathQueryResult,
) -> Result<Json<FileDetailsResponse>, FsError> {
    let path = checked_path(&state, query, None)?;
    let details = run_blocking(state.file_service.clone(), move |svc| svc.details(&path)).await?;
    Ok(Json(details))
}

/// GET /open?path=/file.txt
/// 读取文件内容
pub async fn open_file(
    State(state): State<AppState>,
    query: PathQueryResult,
) -> Result<Json<FileContentResponse>, FsError> {
    let path = checked_path(&state, query, None)?;
    let content = run_blocking(state.file_service.clone(), move |svc| svc.open(&path)).await?;
    Ok(Json(content))
}

/// DELETE /delete?path=/file.txt
/// 删除文件或目录
pub async fn delete_file(
    State(state): State<AppState>,
    query: PathQueryResult,
) -> Result<Json<DeleteResponse>, FsError> {
    let path = checked_path(&state, query, None)?;
    info!("API: 删除 path={}", path);
    let resp = run_blocking(state.file_service.clone(), move |svc| svc.delete(&path)).await?;
    Ok(Json(resp))
}

/// GET /raw?path=/image.png
/// 以原始字节流输出文件
pub async fn serve_raw_file(
    State(state): State<AppState>,
    query: PathQueryResult,
) -> Result<Response, FsError> {
    let path = checked_path(&state, query, None)?;
    let lookup = path.clone();
    let raw = run_blocking(state.file_service.clone(), move |svc| svc.raw(&lookup)).await?;

    let file = tokio::fs::File::open(&raw.full_path)
        .await
        .map_err(|e| FsError::from_io(&e).with_path(path.clone()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&raw.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(raw.size));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(RAW_CACHE_CONTROL),
    );
    if let Ok(value) = HeaderValue::from_str(&http_date(raw.modified)) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    if !raw.inline {
        headers.insert(header::CONTENT_DISPOSITION, attachment_header(&raw.name));
    }

    info!(
        "API: 原始下载 path={}, 类型={}, 大小={}",
        path, raw.mime_type, raw.size
    );

    // 客户端断开时流被丢弃，复制随之中止
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// 格式化为 HTTP 日期（IMF-fixdate）
fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// 构造附件下载头，非 ASCII 文件名附加 RFC 5987 形式
fn attachment_header(name: &str) -> HeaderValue {
    let ascii_name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = if ascii_name == name {
        format!("attachment; filename=\"{}\"", name)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii_name,
            urlencoding::encode(name)
        )
    };

    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}

/// 已知路由的请求方法不匹配
pub async fn method_not_allowed() -> FsError {
    FsError::new(FsErrorCode::MethodNotAllowed)
}

/// 未知路由
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(StatusCode::NOT_FOUND, "Endpoint not found")),
    )
}
