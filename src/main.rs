use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use festival_crawler::app::ports::{Clock, HttpClientPort, IntegrationSink};
use festival_crawler::config::{BatchPolicy, CrawlerConfig, SinkKind};
use festival_crawler::domain::Category;
use festival_crawler::infra::{JsonLinesSink, LogSink, ReqwestHttp, SystemClock};
use festival_crawler::scrapers::touslesfestivals::{FestivalCrawler, FestivalNormalizer, StructuredRecordParser};
use festival_crawler::scrapers::PageFetcher;
use festival_crawler::{logging, metrics};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "festival_crawler")]
#[command(about = "touslesfestivals.com agenda crawler")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to $FESTIVAL_CRAWLER_CONFIG or config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkArg {
    Log,
    Jsonl,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the whole agenda and hand every festival to the sink
    Crawl {
        /// Hard ceiling on listing pages
        #[arg(long)]
        max_pages: Option<u32>,
        /// Concurrent detail page fetches
        #[arg(long)]
        concurrency: Option<usize>,
        /// Keep the good records of a page holding a malformed one
        #[arg(long)]
        lenient: bool,
        /// Send the mobile browser user-agent
        #[arg(long)]
        alternate_agent: bool,
        #[arg(long, value_enum)]
        sink: Option<SinkArg>,
        /// Output file for the jsonl sink
        #[arg(long)]
        output: Option<String>,
        /// Print the crawl report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch and normalize a single festival page, printing the record
    Fetch {
        url: String,
        #[arg(long)]
        alternate_agent: bool,
    },
    /// Print the category taxonomy
    Categories,
}

fn load_config(path: Option<&str>) -> anyhow::Result<CrawlerConfig> {
    let config = match path {
        Some(path) => CrawlerConfig::load(path),
        None => CrawlerConfig::from_env(),
    };
    config.context("loading crawler config")
}

fn build_sink(config: &CrawlerConfig) -> Arc<dyn IntegrationSink> {
    match config.sink {
        SinkKind::Log => Arc::new(LogSink),
        SinkKind::Jsonl => Arc::new(JsonLinesSink::new(&config.output_path)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl {
            max_pages,
            concurrency,
            lenient,
            alternate_agent,
            sink,
            output,
            json,
        } => {
            if let Some(max_pages) = max_pages {
                config.max_pages = max_pages;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            if lenient {
                config.batch_policy = BatchPolicy::Lenient;
            }
            if alternate_agent {
                config.use_alternate_agent = true;
            }
            if let Some(sink) = sink {
                config.sink = match sink {
                    SinkArg::Log => SinkKind::Log,
                    SinkArg::Jsonl => SinkKind::Jsonl,
                };
            }
            if let Some(output) = output {
                config.output_path = output;
            }
            config.validate()?;

            let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(config.request_timeout())?);
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let crawler = FestivalCrawler::new(&config, http, build_sink(&config), clock);

            println!("🚀 Crawling {} ...", config.base_url);
            let report = crawler.run().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!("\n📊 Crawl results (run {}):", report.run_id);
            println!("   Listing pages: {}", report.pages_visited);
            println!("   Records emitted: {}", report.records_emitted);
            println!("   Transport failures: {}", report.transport_failures);
            println!("   Malformed records: {}", report.malformed_records);
            println!("   Discarded batches: {}", report.discarded_batches);
            println!("   Sink failures: {}", report.sink_failures);
            if let Some(reason) = report.stop_reason {
                println!("   Stopped: {:?}", reason);
            }
        }
        Commands::Fetch { url, alternate_agent } => {
            let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(config.request_timeout())?);
            let fetcher = PageFetcher::new(http)
                .with_request_timeout(config.request_timeout())
                .with_alternate_user_agent(config.alternate_user_agent.clone());

            let page = fetcher
                .fetch(&url, alternate_agent || config.use_alternate_agent)
                .await
                .with_context(|| format!("could not retrieve {}", url))?;
            let record = StructuredRecordParser::new()
                .parse_document(&page.document, &page.url)
                .with_context(|| format!("no festival record at {}", url))?;
            let normalizer = FestivalNormalizer::new(Arc::new(SystemClock))
                .with_lead_in(config.description_lead_in.clone());
            let normalized = normalizer.normalize(&record, &page.url);
            info!("Normalized {}", url);
            println!("{}", serde_json::to_string_pretty(&normalized)?);
        }
        Commands::Categories => {
            for category in Category::ALL {
                println!("{:<20} {}", category, category.keyword_list());
            }
        }
    }
    Ok(())
}
