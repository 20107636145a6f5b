//! cv-generate – command-line YAML → PDF CV generator.
//!
//! Usage:
//!   cv-generate <input.yaml> <output.pdf> [--template DIR] [--html FILE] [--landscape]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use cv_forge::{generate_cv, ExportOptions, GenerateOptions, PageOrientation};

#[derive(Parser, Debug)]
#[command(name = "cv-generate")]
#[command(version)]
#[command(about = "Generate a PDF CV from a YAML file", long_about = None)]
struct Cli {
    /// YAML file with the CV content and style options
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// PDF file to write
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Directory with a custom cv.html and optional style.css
    #[arg(long, value_name = "DIR")]
    template: Option<PathBuf>,

    /// Also write the rendered HTML with the stylesheet inlined. It is
    /// written before the PDF, so it stays behind if the PDF step fails
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Landscape pages, unless the stylesheet's @page names an orientation
    #[arg(long)]
    landscape: bool,

    /// Document title in the PDF metadata (default: the HTML <title>)
    #[arg(long)]
    title: Option<String>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.input.exists() {
        eprintln!("Error: input file not found: {}", cli.input.display());
        return ExitCode::FAILURE;
    }

    let options = GenerateOptions {
        template_dir: cli.template,
        html_output: cli.html,
        export: ExportOptions {
            title: cli.title,
            orientation: if cli.landscape {
                PageOrientation::Landscape
            } else {
                PageOrientation::Portrait
            },
            ..ExportOptions::default()
        },
    };

    match generate_cv(&cli.input, &cli.output, &options) {
        Ok(report) => {
            log::info!(
                "{} page{}, {} bytes",
                report.pages,
                if report.pages == 1 { "" } else { "s" },
                report.bytes
            );
            println!("CV generated: {}", report.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.init();
}
