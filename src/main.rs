use clap::{Parser, Subcommand};
use news_card::acquire::{AcquireSettings, ImageAcquirer};
use news_card::builder::NewsBuilder;
use news_card::cache::{ExpiringCache, FileCache, MemoryCache};
use news_card::card::{CardCompositor, CardLayout};
use news_card::fetch::HttpFetcher;
use news_card::font::FontRenderer;
use news_card::imaging::{Quality, RustBackend};
use news_card::news::NewsClient;
use news_card::writer::FileWriter;
use news_card::{config, logging, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "news-card")]
#[command(about = "Render newsapi.org top headlines as JPEG cards")]
#[command(long_about = "\
Render newsapi.org top headlines as JPEG cards

Each card is a 1920x1080 JPEG with the headline, the article photo (or a
placeholder naming the source) and a credit line. Cards are written as
{source}-{NN}.jpg into the output directory.

Photos and article lists are cached in a JSON file next to the cards, so
re-running within the cache lifetime makes no network requests.

Use the API key 'test' to render the bundled sample headlines offline.

Run 'news-card gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml (and the fonts/ it refers to)
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Output directory for cards and the cache file
    #[arg(long, default_value = "cards", global = true)]
    output: PathBuf,

    /// Log pipeline steps (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// newsapi.org source id, e.g. msnbc
    #[arg(long)]
    source: String,

    /// newsapi.org API key ('test' for the bundled sample)
    #[arg(long)]
    key: String,

    /// Number of cards, 1-20 (default from config)
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch headlines and render one card per article
    Build(BuildArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    match &cli.command {
        Command::Build(args) => build(&cli, args)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn build(cli: &Cli, args: &BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;

    let cache: Arc<dyn ExpiringCache> = if cli.no_cache {
        Arc::new(MemoryCache::new())
    } else {
        let path = resolve_cache_path(&cli.output, &config.cache.file);
        tracing::debug!(path = %path.display(), "opening cache");
        Arc::new(FileCache::open(path))
    };
    let fetcher = Arc::new(HttpFetcher::new(
        Duration::from_secs(config.images.fetch_timeout_secs),
        &config.images.user_agent,
    )?);

    let news = NewsClient::new(
        fetcher.clone(),
        cache.clone(),
        config.news.api_base.clone(),
        config.news.article_ttl(),
    );
    let acquirer = ImageAcquirer::new(
        cache,
        fetcher,
        RustBackend::new(),
        AcquireSettings {
            cache_quality: Quality::new(config.images.photo_quality),
            cache_ttl: config.images.cache_ttl(),
        },
    );
    let renderer = FontRenderer::load(&config.fonts.path)?;
    let compositor = CardCompositor::new(
        acquirer,
        Box::new(renderer),
        CardLayout::from_config(&config)?,
    );
    let builder = NewsBuilder::new(news, compositor, Arc::new(FileWriter::new(&cli.output)));

    let count = args.count.unwrap_or(config.news.count);
    println!(
        "==> Rendering {} headlines \u{2192} {}",
        args.source,
        cli.output.display()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_build_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = builder.create_images(&args.source, &args.key, count, Some(tx));
    printer.join().map_err(|_| "output thread panicked")?;
    let summary = result?;

    println!("Cards: {summary}");
    println!("Photos: {}", builder.compositor().acquirer().stats());
    Ok(())
}

/// A relative cache file lives in the output directory.
fn resolve_cache_path(output: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        output.join(file)
    }
}
