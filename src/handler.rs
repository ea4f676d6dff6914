//! Request dispatch: one catch-all handler routing by HTTP method.

use axum::Router;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{Extension, FromRequest, Multipart, Request};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::files;
use crate::render::Renderer;
use crate::storage::{PathKind, Storage};
use crate::upload;

/// Process-wide serving options, read-only after startup.
#[derive(Clone, Copy, Debug)]
pub struct ServeOptions {
    pub uploads_enabled: bool,
}

/// Per-request record built once by the dispatcher.
struct RequestContext {
    logical_path: String,
    fs_path: PathBuf,
}

/// Assembles the application router around the single dispatcher.
pub fn build_router(
    storage: Arc<Storage>,
    renderer: Arc<Renderer>,
    options: ServeOptions,
) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(Extension(storage))
        .layer(Extension(renderer))
        .layer(Extension(options))
}

/// Top-level dispatcher and failure boundary.
///
/// GET goes to the read path, POST/PUT to the upload ingestor when uploads
/// are enabled. Anything else surfaces as an internal failure; `ApiError`
/// turns propagated failures into a 500 with the detail logged only.
pub async fn handle_request(
    Extension(storage): Extension<Arc<Storage>>,
    Extension(renderer): Extension<Arc<Renderer>>,
    Extension(options): Extension<ServeOptions>,
    request: Request,
) -> Result<Response, ApiError> {
    let method = request.method().clone();
    let target = request.uri().path().to_string();
    info!(client = %client_addr(&request), method = %method, target = %target, "request");

    let resolved = storage.resolve(&target);
    let ctx = RequestContext {
        logical_path: resolved.logical,
        fs_path: resolved.filesystem,
    };

    if method == Method::GET {
        handle_get(&storage, &renderer, &ctx, request.headers()).await
    } else if (method == Method::POST || method == Method::PUT) && options.uploads_enabled {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;
        let overwrite = method == Method::PUT;
        upload::ingest(&ctx.fs_path, overwrite, multipart).await?;
        Ok(StatusCode::OK.into_response())
    } else {
        Err(ApiError::Internal(format!(
            "refusing request with method {method}"
        )))
    }
}

/// Read path: probe the resolved path, then serve the file, the matching
/// index file, or the rendered listing.
async fn handle_get(
    storage: &Storage,
    renderer: &Renderer,
    ctx: &RequestContext,
    request_headers: &HeaderMap,
) -> Result<Response, ApiError> {
    match storage.probe(&ctx.fs_path).await? {
        PathKind::Missing => Err(ApiError::NotFound),
        PathKind::File => files::serve_file(&ctx.fs_path, request_headers).await,
        PathKind::Directory => {
            if let Some(index) = storage.resolve_index(&ctx.fs_path).await? {
                return files::serve_file(&index, request_headers).await;
            }
            let entries = storage.list_dir(&ctx.fs_path).await?;
            let page = renderer.folder_listing(&ctx.logical_path, &entries);
            Ok(Html(page).into_response())
        }
    }
}

fn client_addr(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
