use clap::Parser;
use regen_thumbs::batch::{BatchOptions, BatchOrchestrator, CancellationToken};
use regen_thumbs::fs::LocalFs;
use regen_thumbs::imaging::{BackendGenerator, RustBackend};
use regen_thumbs::library::Catalog;
use regen_thumbs::{config, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regen-thumbs")]
#[command(about = "Regenerate image thumbnails for a media library")]
#[command(long_about = "\
Regenerate image thumbnails for a media library

Every image item in the catalog is re-read from disk, all configured sizes
are generated again, and the fresh size metadata is written back to the
catalog. Variants left over from sizes that no longer exist are kept unless
--remove is given.

Library structure:

  <path>/
  ├── regen.toml                   # Optional: sizes, quality, locations
  ├── library.json                 # Media catalog (items + metadata)
  └── uploads/
      └── 2024/05/
          ├── photo.jpg            # Canonical file
          ├── photo-150x150.jpg    # Variant (base-WxH.ext)
          └── photo-300x200.jpg

Run 'regen-thumbs --gen-config' to print a documented regen.toml.")]
#[command(version = env!("REGEN_VERSION"))]
struct Cli {
    /// Library root directory
    #[arg(short, long, required_unless_present = "gen_config")]
    path: Option<PathBuf>,

    /// No progress or status output (errors are still reported)
    #[arg(short, long)]
    silent: bool,

    /// Delete stale thumbnails after regenerating each image
    #[arg(short, long)]
    remove: bool,

    /// Report stale thumbnails without deleting anything; forces progress output
    #[arg(short, long)]
    debug: bool,

    /// Print a stock regen.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log filter from `RUST_LOG`, warnings only by default. Logs go to stderr so
/// they never interleave with the progress bar's stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let root = resolve_root(cli.path.as_deref())?;
    let show_progress = !cli.silent || cli.debug;
    if show_progress {
        println!("Using path: {}", root.display());
    }

    let config = config::load_config(&root)?;
    let catalog = Catalog::load(&config.catalog_path(&root))?;
    let uploads_root = config.uploads_root(&root);
    let generator = BackendGenerator::from_config(RustBackend::new(), &config);
    let fs = LocalFs;

    let options = BatchOptions {
        cleanup: cli.remove,
        dry_run: cli.debug,
    };
    let orchestrator =
        BatchOrchestrator::new(&catalog, &generator, &catalog, &fs, &uploads_root, options);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer_root = uploads_root.clone();
    let printer = std::thread::spawn(move || {
        output::print_batch_events(rx, &printer_root, show_progress);
    });
    let result = orchestrator.run(&CancellationToken::new(), Some(tx));
    printer.join().ok();
    let report = result?;

    if show_progress {
        output::print_summary(&report);
    }
    output::print_error_report(&report.errors);

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// The library root must be an existing directory.
fn resolve_root(path: Option<&Path>) -> Result<PathBuf, String> {
    let path = path.ok_or("no library path given")?;
    if !path.is_dir() {
        return Err(format!("{} is not a directory", path.display()));
    }
    Ok(path.to_path_buf())
}
