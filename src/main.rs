//! Shelf server binary.
//!
//! Exposes a folder over HTTP: directory listings, file downloads, and
//! multipart uploads via POST/PUT. The main entry point builds the Axum
//! router around a single dispatching handler and starts the listener.

mod config;
mod error;
mod etag;
mod files;
mod handler;
mod logging;
mod render;
mod storage;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum_server::Handle;
use clap::Parser;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, info_span};

use crate::config::Args;
use crate::handler::ServeOptions;
use crate::render::Renderer;
use crate::storage::Storage;

/// Starts the server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), io::Error> {
    logging::init_logging();

    let args = Args::parse();
    let root = PathBuf::from(&args.folder);
    let root = if root.is_absolute() {
        root
    } else {
        std::env::current_dir()?.join(root)
    };
    if !std::fs::metadata(&root)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", root.display()),
        ));
    }

    let storage = Arc::new(Storage::new(root));
    let renderer = Arc::new(Renderer::new(!args.read_only));
    let options = ServeOptions {
        uploads_enabled: !args.read_only,
    };

    let body_limit = if args.upload_max_size == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(args.upload_max_size)
    };

    let app = handler::build_router(storage.clone(), renderer, options)
        .layer(body_limit)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        );

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let handle = Handle::new();

    info!(folder = %storage.root_path().display(), %addr, uploads = options.uploads_enabled, "serving folder");

    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => result?,
        _ = shutdown_signal(handle) => {}
    }

    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
