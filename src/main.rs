use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pdf-translator-rust",
    version,
    about = "Translate scanned PDFs while preserving their layout"
)]
struct Cli {
    /// PDF file to translate
    input: PathBuf,

    /// Output path (default: <input>_translated.pdf)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Source language (ISO 639-1, e.g. en)
    #[arg(short = 's', long = "source")]
    source: Option<String>,

    /// Target language (ISO 639-1, e.g. hi)
    #[arg(short = 't', long = "target")]
    target: Option<String>,

    /// Pages to translate: all, 5, 1-10, or 1-3,7,10-12
    #[arg(short = 'p', long = "pages", default_value = "all")]
    pages: String,

    /// Rasterization resolution in dots per inch
    #[arg(long = "dpi")]
    dpi: Option<u32>,

    /// Pages translated in parallel (default: cores - 1)
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// Tesseract language packs, e.g. eng or eng+deu
    #[arg(long = "ocr-languages")]
    ocr_languages: Option<String>,

    /// Font file for redrawn text (overrides discovery)
    #[arg(long = "font")]
    font: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Write OCR debug overlays and region dumps per page
    #[arg(long = "debug-ocr")]
    debug_ocr: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    pdf_translator_rust::logging::init(cli.verbose)?;

    let output = pdf_translator_rust::run(pdf_translator_rust::Config {
        input: cli.input,
        output: cli.output,
        source_lang: cli.source,
        target_lang: cli.target,
        pages: cli.pages,
        dpi: cli.dpi,
        ocr_languages: cli.ocr_languages,
        font_path: cli.font,
        jobs: cli.jobs,
        settings_path: cli.read_settings,
        debug_ocr: cli.debug_ocr,
    })
    .await?;

    println!("{}", output.display());
    Ok(())
}
