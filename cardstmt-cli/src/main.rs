use anyhow::{bail, Context, Result};
use cardstmt_core::TextFragment;
use cardstmt_export::OutputFormat;
use cardstmt_ingest::{classify_fragments, LayoutKind, ParseOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod batch;
mod config;
mod extract;
mod logging;
mod print;
mod state;

use batch::{collect_documents, convert_all, print_all, ConvertOptions};
use config::Config;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDSTMT_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "cardstmt", version = VERSION, about = "Convert credit-card statements to CSV, TSV or JSON")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a statement, or every `*-yyyy-mm.pdf|txt` statement in a directory
    Convert {
        /// Statement file (.pdf or extracted .txt) or directory
        path: PathBuf,

        /// Output format: csv, tsv or json (default from config: tsv)
        #[arg(long, short)]
        format: Option<OutputFormat>,

        /// Statement layout: ics or generic (default from config: ics)
        #[arg(long, short)]
        layout: Option<LayoutKind>,

        /// Directory for output files (must exist; default: next to the input)
        #[arg(long, short)]
        dest: Option<PathBuf>,

        /// Replace output files that already exist
        #[arg(long)]
        overwrite: bool,

        /// Print the parsed statement instead of writing a file
        #[arg(long)]
        print: bool,
    },

    /// Show how every line of a statement is classified
    Lines {
        file: PathBuf,

        #[arg(long, short)]
        layout: Option<LayoutKind>,
    },

    /// Manage ~/.cardstmt/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config file if there is none
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Convert {
            path,
            format,
            layout,
            dest,
            overwrite,
            print,
        } => {
            let cfg = config::load_config()?;
            let opts = ConvertOptions {
                format: format.unwrap_or(cfg.default_format),
                layout: layout.unwrap_or(cfg.layout),
                parse: parse_options(&cfg),
                destination_dir: dest.or(cfg.destination_dir),
                overwrite: overwrite || cfg.overwrite,
            };
            convert(path, opts, print).await?;
        }

        Command::Lines { file, layout } => {
            let cfg = config::load_config()?;
            let text = extract::extract_text(&file)?;
            let fragments = TextFragment::from_page_text(&text);
            let classified = classify_fragments(&fragments, layout.unwrap_or(cfg.layout), &parse_options(&cfg))
                .with_context(|| format!("classifying {}", file.display()))?;
            print!("{}", print::format_lines(&classified));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&config::load_config()?)?,
        },
    }

    Ok(())
}

fn parse_options(cfg: &Config) -> ParseOptions {
    ParseOptions {
        line_tolerance: cfg.line_tolerance,
    }
}

async fn convert(path: PathBuf, opts: ConvertOptions, print: bool) -> Result<()> {
    if !path.exists() {
        bail!("not found: {}", path.display());
    }

    let docs = if path.is_dir() {
        let docs = collect_documents(&path)?;
        if docs.is_empty() {
            bail!(
                "no statements in {} (expected *-yyyy-mm.pdf or *_yyyy-mm.txt)",
                path.display()
            );
        }
        docs
    } else {
        vec![path]
    };

    let total = docs.len();
    let report = if print {
        print_all(&docs, &opts, &mut std::io::stdout().lock())?
    } else {
        convert_all(docs, opts).await
    };
    if !report.failed.is_empty() {
        bail!("{} of {} statements failed", report.failed.len(), total);
    }
    Ok(())
}
