use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "hmc-chunker",
    version,
    about = "Housing Maintenance Code PDF chunking and retrieval tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Chunk(ChunkArgs),
    Inspect(InspectArgs),
    Query(QueryArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long, default_value = "HousingMaintenanceCode.pdf")]
    pub pdf: PathBuf,

    #[arg(long, default_value = ".cache/hmc")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long, default_value_t = 12)]
    pub keyword_limit: usize,

    #[arg(long, default_value_t = 4)]
    pub chars_per_token: usize,

    #[arg(long, default_value_t = false)]
    pub keep_page_furniture: bool,
}

impl ChunkArgs {
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.cache_root.join("chunks"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long, default_value = "HousingMaintenanceCode.pdf")]
    pub pdf: PathBuf,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long, default_value_t = 2)]
    pub context_lines: usize,

    #[arg(long, default_value_t = false)]
    pub keep_page_furniture: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(long, default_value = ".cache/hmc")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub chunks_dir: Option<PathBuf>,

    #[arg(long)]
    pub query: String,

    #[arg(long, default_value_t = 3)]
    pub limit: usize,

    #[arg(long, default_value_t = 3.0)]
    pub title_weight: f64,

    #[arg(long, default_value_t = 2.0)]
    pub keyword_weight: f64,

    #[arg(long, default_value_t = 1.0)]
    pub body_weight: f64,

    #[arg(long, default_value_t = 10.0)]
    pub citation_weight: f64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/hmc")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub chunks_dir: Option<PathBuf>,
}

pub fn resolve_chunks_dir(cache_root: &std::path::Path, chunks_dir: Option<&PathBuf>) -> PathBuf {
    chunks_dir
        .cloned()
        .unwrap_or_else(|| cache_root.join("chunks"))
}
