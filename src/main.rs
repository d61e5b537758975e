mod batch;
mod config;
mod controller;
mod label;
mod pdf;
mod terminal;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::{LabelLayout, load_batch_csv, load_layout};
use controller::FormController;
use label::{LabelRenderer, LabelRequest};
use pdf::export_pdf;
use terminal::{TerminalFrontend, run_session};

/// Print 10x10 cm username/password QR labels to PDF.
#[derive(Parser, Debug)]
#[command(name = "qr_label_maker")]
#[command(about = "Print 10x10 cm username/password QR labels to PDF.", long_about = None)]
struct Args {
    /// JSON file overriding the label layout (fonts, sizes, offsets)
    #[arg(short, long, global = true)]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in the form and queue labels from the terminal (default)
    Interactive {
        /// PNG file refreshed with the label preview after every change
        #[arg(short, long, default_value = "preview.png")]
        preview: PathBuf,
    },
    /// Render a single label to a PNG at full print resolution
    Render {
        #[arg(short, long, default_value = "")]
        username: String,
        #[arg(short, long, default_value = "")]
        password: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Export every row of a username,password CSV as one PDF
    Export {
        #[arg(short, long)]
        csv: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn build_renderer(layout_path: Option<&Path>) -> Result<LabelRenderer> {
    let layout = match layout_path {
        Some(path) => {
            println!("Loading layout from {:?}...", path);
            load_layout(path)?
        }
        None => LabelLayout::default(),
    };
    Ok(LabelRenderer::new(layout))
}

fn run(args: Args) -> Result<()> {
    let renderer = build_renderer(args.layout.as_deref())?;

    match args.command.unwrap_or(Command::Interactive {
        preview: PathBuf::from("preview.png"),
    }) {
        Command::Interactive { preview } => {
            let stdin = io::stdin();
            let frontend = TerminalFrontend::new(stdin.lock(), io::stdout(), preview);
            let mut controller = FormController::new(renderer, frontend)?;
            run_session(&mut controller)?;
        }
        Command::Render {
            username,
            password,
            output,
        } => {
            let label = renderer.render(&username, &password);
            label
                .as_rgb()
                .save(&output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!("Saved {}x{} label to {:?}", label.width(), label.height(), output);
        }
        Command::Export { csv, output } => {
            println!("Loading labels from {:?}...", csv);
            let requests: Vec<LabelRequest> = load_batch_csv(&csv)?;
            if let Some(row) = requests.iter().position(|r| !r.is_complete()) {
                return Err(anyhow!("Row {} of {:?} has an empty username or password", row + 1, csv));
            }
            if requests.is_empty() {
                return Err(anyhow!("No labels found in {:?}", csv));
            }

            println!("Generating {:?}...", output);
            export_pdf(&output, &requests, &renderer)?;
            println!("Successfully saved {:?} with {} pages", output, requests.len());
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
