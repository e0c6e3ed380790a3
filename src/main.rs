use clap::{Parser, Subcommand};
use md2storage::cache::{CachingBackend, DimensionCache};
use md2storage::config::{self, Config};
use md2storage::convert::{self, ConvertedDocument};
use md2storage::imaging::RustBackend;
use md2storage::{output, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Flags shared by commands that convert documents.
#[derive(clap::Args, Clone)]
struct ConversionArgs {
    /// Markdown file or directory of Markdown files
    source: PathBuf,

    /// Config file (default: md2storage.toml next to the source)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target display width for images, in pixels (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    image_width: Option<u32>,
}

#[derive(Parser)]
#[command(name = "md2storage")]
#[command(about = "Convert Markdown into wiki storage-format markup")]
#[command(long_about = "\
Convert Markdown into wiki storage-format markup

Images become <ac:image> elements. Local images whose pixel size can be
read get responsive sizing attributes scaled to the configured width:

  <ac:image ac:width=\"700\"><ri:attachment ri:filename=\"chart.png\"
    data-width=\"700\" data-height=\"467\"
    style=\"max-width: 100%; height: auto;\"/></ac:image>

Images that cannot be probed (missing files, SVG) and remote URLs are
emitted without them; conversion continues.

Set RUST_LOG=debug for per-image probe logs.
Run 'md2storage gen-config' to generate a documented md2storage.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert documents and write .csf files
    Convert {
        #[command(flatten)]
        args: ConversionArgs,

        /// Output directory
        #[arg(long, default_value = "out")]
        output: PathBuf,

        /// Ignore the dimension cache and probe every image
        #[arg(long)]
        no_cache: bool,
    },
    /// Convert without writing and report images without dimensions
    Check {
        #[command(flatten)]
        args: ConversionArgs,
    },
    /// Print a stock md2storage.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            args,
            output: output_dir,
            no_cache,
        } => {
            let config = load_config(&args)?;
            let options = config.conversion_options()?;
            init_thread_pool(&config.processing);

            let files = scan::find_markdown_files(&args.source)?;
            std::fs::create_dir_all(&output_dir)?;

            let cache = if no_cache {
                DimensionCache::empty()
            } else {
                DimensionCache::load(&output_dir)
            };
            let backend = CachingBackend::new(RustBackend::new(), cache);

            let results = convert::convert_files(&files, &options, &backend);
            let mut converted: Vec<ConvertedDocument> = Vec::with_capacity(results.len());
            let mut failed = 0usize;
            for (file, result) in files.iter().zip(results) {
                let target = scan::output_path(&args.source, file, &output_dir);
                let written = result
                    .and_then(|document| convert::write_document(&document, &target).map(|()| document));
                match written {
                    Ok(document) => {
                        output::print_document(
                            &scan::relative_display(&args.source, file),
                            Some(&relative_to(&output_dir, &target)),
                            &document,
                        );
                        converted.push(document);
                    }
                    Err(e) => {
                        tracing::error!("{e}");
                        failed += 1;
                    }
                }
            }

            println!("Images: {}", backend.stats());
            backend.into_cache().save(&output_dir)?;
            println!("{}", output::format_summary(&converted.iter().collect::<Vec<_>>()));
            if failed > 0 {
                return Err(format!("{failed} document(s) failed to convert").into());
            }
        }
        Command::Check { args } => {
            let config = load_config(&args)?;
            let options = config.conversion_options()?;
            init_thread_pool(&config.processing);

            let files = scan::find_markdown_files(&args.source)?;
            let backend = RustBackend::new();
            let results = convert::convert_files(&files, &options, &backend);

            let mut converted = Vec::with_capacity(results.len());
            let mut failed = 0usize;
            for (file, result) in files.iter().zip(results) {
                match result {
                    Ok(document) => {
                        output::print_document(
                            &scan::relative_display(&args.source, file),
                            None,
                            &document,
                        );
                        converted.push(document);
                    }
                    Err(e) => {
                        tracing::error!("{e}");
                        failed += 1;
                    }
                }
            }

            println!("{}", output::format_summary(&converted.iter().collect::<Vec<_>>()));
            let unknown: usize = converted.iter().map(|d| d.unknown_dimensions().count()).sum();
            if failed > 0 || unknown > 0 {
                return Err(format!(
                    "{failed} unreadable document(s), {unknown} image(s) without readable dimensions"
                )
                .into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the `tracing` subscriber. `RUST_LOG` overrides the default
/// `warn` level; logs go to stderr so stdout stays the conversion report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Resolve config layers: stock defaults, then the config file, then flags.
fn load_config(args: &ConversionArgs) -> Result<Config, config::ConfigError> {
    let mut layers = Vec::new();
    let config_file = args
        .config
        .clone()
        .or_else(|| config::find_config(&args.source));
    if let Some(path) = config_file {
        layers.push(config::load_raw_config(&path)?);
    }
    if let Some(width) = args.image_width {
        layers.push(config::image_width_overlay(width));
    }
    config::resolve_config(layers)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can lower the count, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn relative_to(base: &Path, path: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
