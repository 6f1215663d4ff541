//! # checksheet CLI
//!
//! Usage:
//!   checksheet checklist.md -o checklist.pdf
//!   checksheet fire.md flood.md          (writes fire.pdf and flood.pdf)
//!   checksheet checklist.md --layout-json > layout.json

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::debug;
use rayon::prelude::*;

use checksheet::font::{FontContext, TrueTypeFace};
use checksheet::model::Document;
use checksheet::pdf::PdfWriter;
use checksheet::{layout_document, markdown, LayoutConfig, Result};

#[derive(Parser)]
#[command(name = "checksheet")]
#[command(version)]
#[command(about = "Lay out Markdown incident checklists as two-column PDF sheets", long_about = None)]
struct Cli {
    /// Markdown (.md) or document JSON (.json) input files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF for a single input. Several inputs are each written
    /// next to their source.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Layout configuration (JSON); missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// TrueType face for regular text
    #[arg(long, value_name = "TTF", requires = "bold_font")]
    regular_font: Option<PathBuf>,

    /// TrueType face for bold text
    #[arg(long, value_name = "TTF", requires = "regular_font")]
    bold_font: Option<PathBuf>,

    /// Print the parsed document as JSON instead of rendering
    #[arg(long, conflicts_with = "layout_json")]
    json: bool,

    /// Print the laid-out pages as JSON instead of rendering
    #[arg(long)]
    layout_json: bool,

    /// Log layout decisions
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when some inputs of a batch failed.
fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => LayoutConfig::from_json(&fs::read_to_string(path)?)?,
        None => LayoutConfig::default(),
    };
    let fonts = match (&cli.regular_font, &cli.bold_font) {
        (Some(regular), Some(bold)) => {
            FontContext::truetype(TrueTypeFace::load(regular)?, TrueTypeFace::load(bold)?)
        }
        _ => checksheet::font_context(&config),
    };

    if cli.json || cli.layout_json {
        for input in &cli.inputs {
            let document = read_document(input)?;
            let json = if cli.json {
                document.to_json()?
            } else {
                serde_json::to_string_pretty(&layout_document(&document, &config, &fonts)?)?
            };
            println!("{}", json);
        }
        return Ok(true);
    }

    if let [input] = cli.inputs.as_slice() {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("output.pdf"));
        generate(input, &output, &config, &fonts)?;
        return Ok(true);
    }

    if cli.output.is_some() {
        log::warn!("-o is ignored with several inputs; each PDF is written next to its source");
    }

    let results: Vec<(&PathBuf, Result<()>)> = cli
        .inputs
        .par_iter()
        .map(|input| (input, generate(input, &input.with_extension("pdf"), &config, &fonts)))
        .collect();

    let mut ok = true;
    for (input, result) in results {
        if let Err(e) = result {
            eprintln!("Error: {}: {}", input.display(), e);
            ok = false;
        }
    }
    Ok(ok)
}

fn read_document(path: &Path) -> Result<Document> {
    let source = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Document::from_json(&source)
    } else {
        Ok(markdown::parse(&source))
    }
}

fn generate(input: &Path, output: &Path, config: &LayoutConfig, fonts: &FontContext) -> Result<()> {
    let document = read_document(input)?;
    debug!("{}: {} document page(s)", input.display(), document.pages.len());

    let pages = layout_document(&document, config, fonts)?;
    let bytes = PdfWriter::new().write(&pages, &document.metadata(), fonts);
    fs::write(output, bytes)?;

    println!("Generated {} ({} pages)", output.display(), pages.len());
    Ok(())
}
