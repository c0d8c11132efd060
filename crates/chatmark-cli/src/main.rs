use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatmark_config::Config;
use chatmark_engine::{
    Block, Document, DocumentUpdater, OutputFormat, ParseOptions, Reconciler, io,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatmark", version, about = "Render and stream chat markdown")]
struct Cli {
    /// Config file to use instead of ~/.config/chatmark/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep text only: drop styling and links
    #[arg(long, global = true)]
    ignore_inline: bool,

    /// Don't turn bare URLs into links
    #[arg(long, global = true)]
    ignore_plain_links: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a file and print it in one output format
    Render(RenderArgs),

    /// Dump the normalized block sequence
    Blocks(BlocksArgs),

    /// Feed a file in chunks, as a streamed reply, and report node reuse
    Stream(StreamArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown file, or - for stdin
    file: PathBuf,

    /// markdown, unicode or html
    #[arg(short, long)]
    format: Option<String>,

    /// Merge adjacent paragraphs before rendering
    #[arg(long)]
    coalesce: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct BlocksArgs {
    /// Markdown file, or - for stdin
    file: PathBuf,

    /// Merge adjacent paragraphs first
    #[arg(long)]
    coalesce: bool,
}

#[derive(clap::Args)]
struct StreamArgs {
    /// Markdown file, or - for stdin
    file: PathBuf,

    /// Bytes added per tick
    #[arg(short, long, default_value_t = 16)]
    chunk: usize,

    /// Print the final document in this format after the last tick
    #[arg(short, long)]
    format: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let mut options = config.render.parse_options();
    options.ignore_inline |= cli.ignore_inline;
    options.ignore_plain_links |= cli.ignore_plain_links;

    match cli.command {
        Command::Render(args) => render(&config, options, args),
        Command::Blocks(args) => blocks(&config, options, args),
        Command::Stream(args) => stream(&config, options, args),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map_or_else(Config::config_path, Path::to_path_buf);
    log::debug!("Config path: {}", config_path.display());
    let config = Config::load_from_path(&config_path)?;
    if config.is_none() && path.is_some() {
        anyhow::bail!("Config file not found: {}", config_path.display());
    }
    Ok(config.unwrap_or_default())
}

fn output_format(config: &Config, flag: Option<&str>) -> Result<OutputFormat> {
    let format = match flag {
        Some(name) => name.parse(),
        None => config.render.output_format(),
    };
    format.context("Invalid output format")
}

fn read(file: &Path) -> Result<String> {
    io::read_source(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn render(config: &Config, options: ParseOptions, args: RenderArgs) -> Result<()> {
    let format = output_format(config, args.format.as_deref())?;
    let text = read(&args.file)?;
    let document = Document::parse(&text, &options);
    let document = if args.coalesce || config.render.coalesce {
        document.coalesce().into_owned()
    } else {
        document
    };

    let rendered = document.to_string(format);
    match args.output {
        Some(path) => {
            io::write_output(&path, &rendered)?;
            log::info!("Wrote {} blocks to {}", document.len(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn blocks(config: &Config, options: ParseOptions, args: BlocksArgs) -> Result<()> {
    let text = read(&args.file)?;
    let document = Document::parse(&text, &options);
    let document = if args.coalesce || config.render.coalesce {
        document.coalesce().into_owned()
    } else {
        document
    };

    for (i, block) in document.blocks().iter().enumerate() {
        println!("{i:>3} {}", describe(block));
    }
    Ok(())
}

fn describe(block: &Block) -> String {
    let mut line = format!("{:?} q{} l{}", block.kind(), block.quote_level(), block.list_level());
    if block.list_level() > 0 {
        line.push_str(&format!(" {:?}", block.list_marker()));
    }
    if let Some(lang) = block.lang() {
        line.push_str(&format!(" lang={lang}"));
    }
    line.push_str(&format!(" {:?}", block.plain_text()));
    line
}

fn stream(config: &Config, options: ParseOptions, args: StreamArgs) -> Result<()> {
    anyhow::ensure!(args.chunk > 0, "--chunk must be at least 1");
    let format = args
        .format
        .as_deref()
        .map(|name| output_format(config, Some(name)))
        .transpose()?;
    let text = read(&args.file)?;

    let updater = DocumentUpdater::new(config.render.async_threshold)
        .with_coalesce(config.render.coalesce);
    let mut reconciler = Reconciler::new();
    let mut end = 0;
    let mut tick = 0;
    let mut reused = 0;
    let mut touched = 0;

    while end < text.len() {
        end = (end + args.chunk).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        tick += 1;

        let chunk_options = ParseOptions {
            chunking: end < text.len(),
            ..options
        };
        updater.request(&text[..end], chunk_options).wait();
        let Some(published) = updater.take() else {
            continue;
        };

        let report = reconciler.reconcile_document(&published.document);
        reused += report.reused;
        touched += report.changed + report.rebuilt;
        println!(
            "tick {tick:>4} v{} bytes={end} blocks={} reused={} changed={} rebuilt={} removed={}",
            published.version,
            published.document.len(),
            report.reused,
            report.changed,
            report.rebuilt,
            report.removed
        );
    }

    log::info!("{tick} ticks: {reused} root nodes reused, {touched} changed or rebuilt");
    if let Some(format) = format {
        println!("{}", reconciler.select_all_text(format));
    }
    Ok(())
}
