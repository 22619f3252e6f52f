//! Command line access to the bundle builder and the annotation processor.
//!
//! - `build`: writes the script and style bundles of a configuration
//! - `process`: rewrites the annotated blocks of an HTML file
//! - `dump-catalog`: converts a `components.json` to the compressed binary format

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use prism_highlighter::{
    AnnotationProcessor, AssetLinks, BUILD_DIR, BundleArtifact, BundleBuilder, ComponentCatalog,
    Configuration, DirectorySource,
};

#[derive(Parser)]
#[command(name = "prism-bundle", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bundles of a configuration.
    Build(BuildArgs),
    /// Rewrite the annotated code blocks of an HTML file and print the result.
    Process(ProcessArgs),
    /// Write the catalog in the compressed binary format.
    DumpCatalog(DumpArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Root of an unpacked Prism distribution.
    #[arg(short, long)]
    prism_dir: PathBuf,

    /// JSON configuration (default configuration if omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Component catalog (default: components.json in the Prism directory).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory the bundles are written to (default: ./prism-highlighter-build).
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Use a new cache token and write the updated configuration back.
    #[arg(long)]
    fresh_token: bool,
}

#[derive(Args)]
struct ProcessArgs {
    /// HTML file to process.
    input: PathBuf,

    /// JSON configuration (default configuration if omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the asset tags, with bundles served from this URL.
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct DumpArgs {
    /// The components.json to convert.
    catalog: PathBuf,

    /// Output file.
    #[arg(short, long, default_value = "components.zst")]
    output: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> Result<Configuration, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Configuration::load_from_file(path)?),
        None => Ok(Configuration::default().normalized()),
    }
}

fn build(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(args.config.as_ref())?;
    if args.fresh_token {
        config = config.with_fresh_token();
        if let Some(path) = &args.config {
            fs::write(path, serde_json::to_string_pretty(&config)?)?;
            println!("✓ New cache token {} saved to {}", config.cache_token, path.display());
        }
    }

    let catalog_path = args
        .catalog
        .unwrap_or_else(|| args.prism_dir.join("components.json"));
    let catalog = match ComponentCatalog::load_from_file(&catalog_path) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            eprintln!("✗ {e}");
            None
        }
    };

    let builder = BundleBuilder::new(DirectorySource::new(&args.prism_dir), catalog.as_ref());
    let report = builder.build_report(&config);
    for warning in &report.warnings {
        eprintln!("⚠️  {warning}");
    }

    let out_dir = args.out_dir.unwrap_or_else(|| PathBuf::from(BUILD_DIR));
    report.artifact.write_to_dir(&out_dir, &config.cache_token)?;

    println!("Summary:");
    println!("- Languages selected: {}", config.languages.len());
    println!("- Plugins enabled: {}", config.enabled_plugins().count());
    println!("- Missing components: {}", report.warnings.len());
    println!(
        "✓ {} ({} bytes)",
        out_dir
            .join(BundleArtifact::script_file_name(&config.cache_token))
            .display(),
        report.artifact.script.len()
    );
    println!(
        "✓ {} ({} bytes)",
        out_dir
            .join(BundleArtifact::style_file_name(&config.cache_token))
            .display(),
        report.artifact.style.len()
    );

    Ok(())
}

fn process(args: ProcessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_ref())?;
    let input = fs::read_to_string(&args.input)?;

    let processed = AnnotationProcessor::new(&config).process(&input);
    if let Some(base_url) = &args.base_url
        && let Some(links) = AssetLinks::for_page(processed.matched(), base_url, &config)
    {
        print!("{}", links.to_html());
    }
    print!("{}", processed.content);
    eprintln!("{} annotated block(s) rewritten", processed.annotations.len());

    Ok(())
}

fn dump_catalog(args: DumpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = ComponentCatalog::load_from_file(&args.catalog)?;
    catalog.dump_to_file(&args.output)?;

    let json_size = fs::metadata(&args.catalog)?.len();
    let dump_size = fs::metadata(&args.output)?.len();
    println!("Languages: {}", catalog.languages().count());
    println!("Themes: {}", catalog.themes().count());
    println!(
        "✓ {} ({} bytes, {:.2}x smaller than the JSON)",
        args.output.display(),
        dump_size,
        json_size as f64 / dump_size.max(1) as f64
    );

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::Build(args) => build(args),
        Commands::Process(args) => process(args),
        Commands::DumpCatalog(args) => dump_catalog(args),
    }
}
