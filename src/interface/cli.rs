use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use super::PREFERENCES_FILE;
use crate::application::page::{PageConfig, PageFormat, PageService};
use crate::application::service::WishlistService;
use crate::infra::json_store::{JsonCatalogSource, JsonPreferencesRepository};

#[derive(Debug, Parser)]
#[command(
    name = "wishlist-libraries",
    version,
    about = "Merge a wishlist with library holdings and pick the best branch for each item"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// ウィッシュリストと所蔵からページを生成する
    Render(RenderArgs),
    /// MCP Server (stdio)
    Serve {
        /// wishlist.json / library.json / libraries.json を置くディレクトリ
        #[arg(default_value = ".")]
        data_dir: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
pub struct RenderArgs {
    /// ウィッシュリスト（JSON配列）
    #[arg(long)]
    pub wishlist: PathBuf,

    /// 所蔵レコード（JSON配列）
    #[arg(long)]
    pub holdings: PathBuf,

    /// 優先分館設定。省略時はウィッシュリストと同じディレクトリのlibraries.json
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 出力ファイル。省略時はstdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    #[arg(long, default_value = "Library Wishlist")]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Json,
}

impl From<OutputFormat> for PageFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Html => PageFormat::Html,
            OutputFormat::Json => PageFormat::Json,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Render(args) => render(args),
            Command::Serve { data_dir } => super::mcp::run(data_dir).await,
        }
    }
}

fn preferences_path(args: &RenderArgs) -> PathBuf {
    match &args.config {
        Some(path) => path.clone(),
        None => args
            .wishlist
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(PREFERENCES_FILE),
    }
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    let svc = WishlistService::new(
        JsonCatalogSource::new(&args.wishlist, &args.holdings),
        JsonPreferencesRepository::new(preferences_path(&args)),
    );
    let report = svc.report().context("failed to build wishlist report")?;
    let prefs = svc.preferences()?;
    let format = PageFormat::from(args.format);

    match args.output {
        Some(path) => {
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("invalid output path: {}", path.display()))?
                .to_string();
            let config = PageConfig {
                output_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                filename,
                title: args.title,
                format,
            };
            PageService::publish(&report, &prefs, &config)?;
        }
        None => {
            let content = match format {
                PageFormat::Html => PageService::render_html(&report, &prefs, &args.title)?,
                PageFormat::Json => PageService::render_json(&report)?,
            };
            println!("{content}");
        }
    }
    Ok(())
}
