//! Command-line and environment configuration for the `tablepdf` binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::error::Result;
use crate::http::{AppState, CorsPolicy, DEFAULT_DOWNLOAD_NAME, DEFAULT_MAX_BODY_BYTES};
use crate::pipeline::{PageOrientation, PipelineConfig};

/// Command-line arguments for the tablepdf binary.
#[derive(Debug, Parser)]
#[command(name = "tablepdf", version, about = "Render HTML tables into PDF documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Render an HTML file to a PDF file.
    Render(RenderArgs),
}

/// Layout settings shared by both subcommands.
#[derive(Debug, Args, Clone)]
pub struct LayoutArgs {
    /// Title embedded in the PDF metadata.
    #[arg(long, default_value = "Asset Report")]
    pub title: String,

    /// Use A4 landscape instead of portrait.
    #[arg(long, short = 'l')]
    pub landscape: bool,

    /// Font size of cell text, in points.
    #[arg(long = "font-size", default_value_t = 10.0, value_name = "PT")]
    pub font_size: f32,

    /// Inner padding of every cell, in points.
    #[arg(long = "cell-padding", default_value_t = 4.0, value_name = "PT")]
    pub cell_padding: f32,

    /// Page margin, in points.
    #[arg(long, default_value_t = 40.0, value_name = "PT")]
    pub margin: f32,

    /// Repeat a table's header rows on every continuation page.
    #[arg(long = "repeat-header")]
    pub repeat_header: bool,

    /// Upper bound on the pages of one document.
    #[arg(long = "max-pages", default_value_t = 500, value_name = "COUNT")]
    pub max_pages: usize,
}

impl LayoutArgs {
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        let config = PipelineConfig {
            title: self.title.clone(),
            orientation: if self.landscape {
                PageOrientation::Landscape
            } else {
                PageOrientation::Portrait
            },
            font_size: self.font_size,
            cell_padding: self.cell_padding,
            page_margin: self.margin,
            repeat_header: self.repeat_header,
            max_pages: self.max_pages,
            ..PipelineConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Listener address.
    #[arg(long, env = "TABLEPDF_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Listener port.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Largest accepted request body, in bytes.
    #[arg(long = "max-body-bytes", default_value_t = DEFAULT_MAX_BODY_BYTES, value_name = "BYTES")]
    pub max_body_bytes: usize,

    /// Origin allowed to call the API cross-origin (`*` for any). Unset disables CORS.
    #[arg(long = "cors-allow-origin", env = "TABLEPDF_CORS_ALLOW_ORIGIN", value_name = "ORIGIN")]
    pub cors_allow_origin: Option<String>,

    /// Filename suggested in the Content-Disposition header.
    #[arg(long = "download-name", default_value = DEFAULT_DOWNLOAD_NAME, value_name = "NAME")]
    pub download_name: String,

    /// Default log level (trace|debug|info|warn|error); RUST_LOG takes precedence.
    #[arg(long = "log-level", default_value = "info", value_name = "LEVEL")]
    pub log_level: String,
}

impl ServeArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn app_state(&self) -> Result<AppState> {
        let cors = match self.cors_allow_origin.as_deref() {
            Some(origin) => CorsPolicy::allow_origin(origin)?,
            None => CorsPolicy::disabled(),
        };
        AppState::new(self.layout.to_pipeline_config()?)
            .with_cors(cors)
            .with_max_body_bytes(self.max_body_bytes)
            .with_download_name(&self.download_name)
    }
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// HTML file holding the table fragment.
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Destination PDF; defaults to the input path with a `.pdf` extension.
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Also write the computed layout as JSON.
    #[arg(long = "layout-json", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub layout_json: Option<PathBuf>,
}

impl RenderArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let mut o = self.input.clone();
            o.set_extension("pdf");
            o
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn serve_defaults() {
        let Command::Serve(args) = parse(&["tablepdf", "serve"]) else {
            panic!("expected serve");
        };
        assert_eq!(args.download_name, "report.pdf");
        let config = args.layout.to_pipeline_config().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn render_options() {
        let Command::Render(args) = parse(&[
            "tablepdf",
            "render",
            "assets.html",
            "--landscape",
            "--repeat-header",
            "--title",
            "Q3",
        ]) else {
            panic!("expected render");
        };
        assert_eq!(args.output_path(), PathBuf::from("assets.pdf"));
        let config = args.layout.to_pipeline_config().unwrap();
        assert_eq!(config.orientation, PageOrientation::Landscape);
        assert!(config.repeat_header);
        assert_eq!(config.title, "Q3");
    }

    #[test]
    fn invalid_layout_is_a_config_error() {
        let Command::Render(args) = parse(&["tablepdf", "render", "a.html", "--font-size", "0"])
        else {
            panic!("expected render");
        };
        assert_eq!(args.layout.to_pipeline_config().unwrap_err().kind(), "ConfigError");
    }
}
