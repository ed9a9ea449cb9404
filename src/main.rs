use clap::{Parser, Subcommand, ValueEnum};
use pwa_creator::{config, generate, manifest, output, simulate, validate};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pwa-creator")]
#[command(about = "Generate installable, offline-capable web apps for KaiOS devices")]
#[command(long_about = "\
Generate installable, offline-capable web apps for KaiOS devices

Reads app fields from a pwa.toml project file and writes:

  dist/
  ├── manifest.json   # Web-app manifest (7 icons under /assets/)
  ├── sw.js           # Offline worker: network first, cache fallback
  └── index.html      # App shell that registers sw.js

Icons, styles/main.css and js/app.js are yours to provide alongside.

Run 'pwa-creator gen-config' to generate a documented pwa.toml.")]
#[command(version)]
struct Cli {
    /// Project file
    #[arg(long, default_value = "pwa.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write manifest.json, sw.js and index.html into the output directory
    Generate,
    /// Print one generated file to stdout
    Show {
        #[arg(value_enum)]
        artifact: Artifact,
    },
    /// Check manifest.json and the icon files it references
    Validate {
        /// Project root holding manifest.json (defaults to the output directory)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Also decode icons and compare their size with the declared sizes
        #[arg(long)]
        check_dimensions: bool,
    },
    /// Install the offline worker over the output directory and replay requests
    Simulate {
        /// Cut the network after the worker has installed
        #[arg(long)]
        offline: bool,
        /// Origin the files are served from
        #[arg(long, default_value = simulate::DEFAULT_ORIGIN)]
        origin: String,
        /// Paths (or absolute URLs) to request
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print a stock pwa.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Artifact {
    Manifest,
    Worker,
    Html,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate => {
            let project = config::load_config(&cli.config)?;
            let app = project.app_config();
            let generated = generate::generate_app(&app, &project.worker)?;
            let written = generate::write_app(&generated, &cli.output)?;
            output::print_generate_output(&app, &project.worker, &written);
        }
        Command::Show { artifact } => {
            let project = config::load_config(&cli.config)?;
            let app = project.app_config();
            let text = match artifact {
                Artifact::Manifest => manifest::manifest_json(&app)?,
                Artifact::Worker => generate::generate_service_worker(&app, &project.worker),
                Artifact::Html => generate::generate_html(&app, &project.worker),
            };
            println!("{}", text);
        }
        Command::Validate {
            root,
            check_dimensions,
        } => {
            let root = root.unwrap_or(cli.output);
            let options = validate::ValidateOptions { check_dimensions };
            let report = validate::validate_manifest(&root, &options);
            if !output::print_validation_report(&report) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Simulate {
            offline,
            origin,
            paths,
        } => {
            let project = config::load_config(&cli.config)?;
            let options = simulate::SimulateOptions {
                origin: simulate::parse_origin(&origin)?,
                offline,
            };
            let report = simulate::simulate(
                &cli.output,
                &project.app_config(),
                &project.worker,
                &paths,
                &options,
            )?;
            output::print_simulation_report(&report, offline);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}
