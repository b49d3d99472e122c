//! weft - DOCX to HTML/Markdown converter

use std::fs;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use weft::{ConversionOptions, ConversionResult, convert_to_html, convert_to_markdown};

#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about = "DOCX to HTML/Markdown converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    weft report.docx report.html             Convert to HTML
    weft report.docx -f markdown             Convert to Markdown on stdout
    weft report.docx -m styles.map out.html  Convert with a custom style map")]
struct Cli {
    /// Input file (DOCX)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file; stdout if omitted
    #[arg(value_name = "OUTPUT")]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    format: Format,

    /// File containing style-map rules, one per line
    #[arg(short = 'm', long)]
    style_map: Option<String>,

    /// Skip the built-in default style map
    #[arg(long)]
    no_default_style_map: bool,

    /// Prefix for generated element ids
    #[arg(long, default_value = "")]
    id_prefix: String,

    /// Keep paragraphs with no content
    #[arg(long)]
    keep_empty_paragraphs: bool,

    /// Suppress diagnostic messages
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Markdown,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let style_map = match &cli.style_map {
        Some(path) => fs::read_to_string(path).map_err(|error| format!("{path}: {error}"))?,
        None => String::new(),
    };

    let options = ConversionOptions {
        style_map,
        include_default_style_map: !cli.no_default_style_map,
        id_prefix: cli.id_prefix.clone(),
        ignore_empty_paragraphs: !cli.keep_empty_paragraphs,
    };

    let result: ConversionResult = match cli.format {
        Format::Html => convert_to_html(&cli.input, &options),
        Format::Markdown => convert_to_markdown(&cli.input, &options),
    }
    .map_err(|error| error.to_string())?;

    if !cli.quiet {
        for message in &result.messages {
            eprintln!("{message}");
        }
    }

    match &cli.output {
        Some(path) => fs::write(path, result.value).map_err(|error| format!("{path}: {error}"))?,
        None => println!("{}", result.value),
    }

    Ok(())
}
