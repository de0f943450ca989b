use clap::{Parser, Subcommand};
use cli::{collect_candidate_paths, load_candidates, load_image, RankingReport};
use color_eyre::eyre::Result;
use silhouette::{BackendKind, Ranker, RankingConfig, TargetImage};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate backgrounds against a foreground silhouette
    Rank {
        /// Foreground image
        #[arg(short, long)]
        target: PathBuf,
        /// Segmentation mask of the foreground (same dimensions)
        #[arg(short, long)]
        mask: PathBuf,
        /// Candidate image files, ranked in addition to --candidate-dir
        #[arg(short, long, num_args = 1..)]
        candidates: Vec<PathBuf>,
        /// Directory scanned for candidate images
        #[arg(long)]
        candidate_dir: Option<PathBuf>,
        /// TOML or JSON ranking configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the worker count
        #[arg(long)]
        workers: Option<usize>,
        /// Only print the best K entries
        #[arg(long)]
        top: Option<usize>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// List the available image backends
    Backends,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            target,
            mask,
            candidates,
            candidate_dir,
            config,
            workers,
            top,
        } => {
            let mut config = match config {
                Some(path) => RankingConfig::from_file(&path)?,
                None => RankingConfig::default(),
            };
            if workers.is_some() {
                config.workers = workers;
            }
            config.validate()?;

            let paths = collect_candidate_paths(&candidates, candidate_dir.as_deref())?;
            info!(
                target = %target.display(),
                candidates = paths.len(),
                backend = %config.backend,
                "loading images"
            );

            let target_image = TargetImage::new(load_image(&target)?, load_image(&mask)?);
            let candidate_images = load_candidates(&paths)?;

            let ranker = Ranker::from_config(&config)?;
            info!(workers = ranker.workers(), "{}", ranker.scorer().info());
            let result = ranker.rank(&target_image, candidate_images).await?;

            let report = RankingReport::new(&target, &paths, &result, top);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&RankingConfig::schema())?);
        }
        Commands::Backends => {
            for name in BackendKind::names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
