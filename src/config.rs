//! CLI arguments and server configuration defaults.

use clap::Parser;

/// Index filenames tried in order when a directory is requested.
pub const INDEX_FILENAMES: [&str; 2] = ["index.html", "index.htm"];

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_MAX_SIZE: usize = 0;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "shelf", version, about = "Expose a folder over HTTP")]
pub struct Args {
    #[arg(
        short = 'f',
        long,
        env = "SHELF_FOLDER",
        default_value = ".",
        help = "Path of the folder to expose"
    )]
    pub folder: String,
    #[arg(
        short = 'b',
        long,
        env = "SHELF_BIND",
        default_value = "0.0.0.0",
        help = "Bind address for HTTP"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "SHELF_PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port to bind the web server on"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "SHELF_READ_ONLY",
        default_value_t = false,
        help = "Serve read-only: refuse POST/PUT uploads"
    )]
    pub read_only: bool,
    #[arg(
        long,
        env = "SHELF_UPLOAD_MAX_SIZE",
        default_value_t = DEFAULT_UPLOAD_MAX_SIZE,
        help = "Max upload body size in bytes (0 to disable the cap)"
    )]
    pub upload_max_size: usize,
}
