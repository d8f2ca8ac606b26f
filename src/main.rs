use clap::Parser;
use quire::layout::{FeatureFlags, LayoutOptions, layout_document};
use quire::types::{FlowBlock, Layout, Measure};
use quire::{HeaderFooterParts, HeaderFooterResolver, PageDecorations, QuireError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Paginates pre-measured flow blocks and prints the page layout as JSON.
#[derive(Parser, Debug)]
#[command(name = "quire", version, about)]
struct Cli {
    /// JSON document with `blocks`, `measures` and optional `options` and
    /// `headerFooterParts`.
    input: PathBuf,

    /// Where to write the layout. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Input {
    blocks: Vec<FlowBlock>,
    measures: Vec<Measure>,
    #[serde(default)]
    options: LayoutOptions,
    #[serde(default)]
    header_footer_parts: HeaderFooterParts,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    layout: Layout,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    decorations: Vec<PageDecorations>,
}

fn main() -> Result<(), QuireError> {
    env_logger::init();
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.input)?;
    let mut input: Input = serde_json::from_str(&source)?;
    input.options.flags = FeatureFlags::from_env();

    let start = Instant::now();
    let layout = layout_document(&input.blocks, &input.measures, &input.options)?;
    log::info!(
        "Laid out {} blocks into {} pages in {:?}",
        input.blocks.len(),
        layout.pages.len(),
        start.elapsed()
    );

    let decorations = if input.header_footer_parts.is_empty() {
        Vec::new()
    } else {
        let mut resolver = HeaderFooterResolver::new(&input.options);
        let decorations = resolver.resolve(&layout, &input.header_footer_parts, &input.options)?;
        let stats = resolver.cache().stats();
        log::info!("Header/footer cache: {} hits, {} misses", stats.hits, stats.misses);
        decorations
    };

    let output = Output { layout, decorations };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match cli.output {
        Some(path) => fs::write(path, json)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
