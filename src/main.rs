use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use quire::{Asset, build, config, content, debug, frontmatter, lint, logger, posts, toc};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(ClapParser)]
#[command(author, version, about = "quire - a static blog, nothing more.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    verbose: bool,
    /// Path to the project configuration.
    #[arg(short, long, default_value = "quire.toml")]
    config: PathBuf,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Render the whole site into the output directory.
    Build,
    /// Validate front matter and structure of every post.
    Check,
    /// List posts whose title, excerpt or tags match a query.
    Search { query: String },
    /// Print the table of contents of a markdown file.
    Toc {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Extract a starter site into the current directory.
    Init,
}

fn main() -> anyhow::Result<ExitCode> {
    let start = Instant::now();
    let cli = Cli::parse();
    logger::set_verbose(cli.verbose);

    match cli.command {
        Commands::Init => {
            println!("quire init v{}", env!("CARGO_PKG_VERSION"));
            init_project()?;
            logger::success("Project initialized.");
            println!("Done in {:.2}s.", start.elapsed().as_secs_f32());
        }
        Commands::Build => {
            let config = config::Config::load(&cli.config)?;
            println!("quire build v{}", env!("CARGO_PKG_VERSION"));
            build::perform_build(&config)?;
        }
        Commands::Check => {
            let config = config::Config::load_or_default(&cli.config)?;
            let source = content::FsContent::new(&config.content_dir);
            let report = lint::check_source(&source)?;
            lint::print_report(&report);
            if !report.is_ok() {
                logger::error("Validation failed. Some files have errors.");
                return Ok(ExitCode::FAILURE);
            }
            if report.warnings() > 0 {
                logger::warn("Validation passed with warnings.");
            } else {
                logger::passed("All blog posts are valid!");
            }
        }
        Commands::Search { query } => {
            let config = config::Config::load_or_default(&cli.config)?;
            let source = content::FsContent::new(&config.content_dir);
            let images = content::FsImages::new(&config.images_dir);
            let index = posts::PostIndex::load(&source, &images, &config.image_prefix, config.load_policy())?;
            for post in index.search(&query) {
                println!("{}  {}  {}", post.date, post.slug, post.title);
            }
        }
        Commands::Toc { file, json } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let body = frontmatter::parse(&raw).map(|(_, body)| body).unwrap_or(raw.as_str());
            let outline = toc::parse_headings(body);
            if json {
                println!("{}", serde_json::to_string_pretty(&outline)?);
            } else {
                print_outline(&outline, 0);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_outline(nodes: &[toc::HeadingNode], depth: usize) {
    for node in nodes {
        println!("{}{} #{}", "  ".repeat(depth), node.text, node.id);
        print_outline(&node.children, depth + 1);
    }
}

fn init_project() -> anyhow::Result<()> {
    logger::step(1, 1, "Extracting default site...");

    for file in Asset::iter() {
        let path = Path::new(file.as_ref());

        if path.exists() {
            logger::warn(&format!("{} exists, leaving it alone", path.display()));
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(content) = Asset::get(file.as_ref()) {
            fs::write(path, content.data)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("created"; "{}", path.display());
        }
    }
    Ok(())
}
