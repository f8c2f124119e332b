use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use post_guard::{GuidelineAnalyzer, GuidelineError, GuidelineResult, GuidelineSet, Post};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "post-guard",
    about = "Flag social posts at risk of violating community guidelines",
    version
)]
struct Cli {
    /// JSON files holding an array of posts (reads stdin if none provided)
    files: Vec<PathBuf>,

    /// Guideline set to use instead of the built-in one (JSON)
    #[arg(long, value_name = "FILE")]
    guidelines: Option<PathBuf>,

    /// Similarity ratio (0.0-1.0) at which posts count as duplicates
    #[arg(long)]
    threshold: Option<f64>,

    /// Print the summary only
    #[arg(long)]
    summary_only: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "analysis failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> GuidelineResult<()> {
    let mut guidelines = match &cli.guidelines {
        Some(path) => GuidelineSet::from_path(path)?,
        None => GuidelineSet::default(),
    };
    if let Some(threshold) = cli.threshold {
        guidelines.duplicates.threshold = threshold;
    }
    let analyzer = GuidelineAnalyzer::try_new(guidelines)?;

    let posts = read_posts(&cli.files)?;
    debug!(posts = posts.len(), "loaded posts");

    let report = post_guard::report(&analyzer, &posts);
    let json = if cli.summary_only {
        serde_json::to_string_pretty(&report.summary)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}

/// All files are concatenated into one batch so duplicates are found across
/// them.
fn read_posts(files: &[PathBuf]) -> GuidelineResult<Vec<Post>> {
    let mut posts = Vec::new();
    if files.is_empty() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        posts.extend(parse_posts(&input)?);
    } else {
        for path in files {
            let text = std::fs::read_to_string(path).map_err(|e| {
                GuidelineError::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {e}", path.display()),
                ))
            })?;
            posts.extend(parse_posts(&text)?);
        }
    }
    Ok(posts)
}

fn parse_posts(json: &str) -> GuidelineResult<Vec<Post>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(Post::from_values(values))
}
