//! tablepdf – HTML table → PDF service and command-line converter.
//!
//! Usage:
//!   tablepdf serve [--host 0.0.0.0] [--port 5000] [--cors-allow-origin ORIGIN]
//!   tablepdf render <input.html> [output.pdf] [--landscape] [--layout-json PATH]

use std::{fs, path::Path, process};

use clap::Parser;
use env_logger::Env;
use tablepdf::config::{Cli, Command, RenderArgs, ServeArgs};
use tablepdf::http;
use tablepdf::pipeline::generate_pdf;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Render(args) => run_render(args),
    }
}

async fn run_serve(args: ServeArgs) {
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str()))
        .init();

    let state = match args.app_state() {
        Ok(state) => state,
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    };

    let addr = args.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind {addr}: {e}");
            process::exit(1);
        }
    };
    log::info!(
        "Listening on http://{addr}{} (max {} pages per document)",
        http::GENERATE_PDF_PATH,
        state.pipeline().max_pages
    );

    if let Err(e) = http::serve(listener, state).await {
        log::error!("server error: {e}");
        process::exit(1);
    }
}

fn run_render(args: RenderArgs) {
    env_logger::init();

    let config = match args.layout.to_pipeline_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let input = &args.input;
    let output = args.output_path();

    let html = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let (bytes, layout) = match generate_pdf(&html, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error generating PDF ({}): {e}", e.kind());
            process::exit(1);
        }
    };

    write_file(&output, &bytes);
    if let Some(path) = &args.layout_json {
        write_file(path, layout.to_json().as_bytes());
    }

    let pages = layout.pages.len();
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}
