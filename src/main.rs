use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use page_scrape::export::{self, ExportError};
use page_scrape::{
    start_scrape, AsyncRunner, ControlLoop, FetchConfig, HttpFetcher, Outcome, Pipeline,
    ScrapeResult,
};

#[derive(Debug, Parser)]
#[command(name = "page-scrape", version, about = "Scrape a web page with a CSS selector")]
struct Cli {
    #[arg(value_name = "URL")]
    url: String,

    /// CSS selector; required unless --full-page is set
    #[arg(short, long)]
    selector: Option<String>,

    /// text, href, src, or any attribute name
    #[arg(short, long, default_value = "text")]
    attribute: String,

    /// Scrape entire page (ignore selector)
    #[arg(long, default_value_t = false)]
    full_page: bool,

    /// Export results to a CSV file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print results as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// JSON file overriding timeout, user agent, headers and poll interval
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => FetchConfig::load(path).context("loading config")?,
        None => FetchConfig::default(),
    };

    let runner = AsyncRunner::new(Pipeline::new(HttpFetcher::new(&config)));
    let handle = match start_scrape(
        &runner,
        &cli.url,
        cli.selector.as_deref(),
        &cli.attribute,
        cli.full_page,
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Missing Fields: {e}");
            return Ok(ExitCode::from(2));
        }
    };
    eprintln!("Scraping...");

    let delivered: Rc<RefCell<Option<Outcome>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&delivered);
    let mut control = ControlLoop::new(config.poll_interval());
    control.watch(handle, move |outcome| *sink.borrow_mut() = Some(outcome));
    control.run();

    let outcome = delivered
        .borrow_mut()
        .take()
        .context("scrape finished without an outcome")?;

    let results = match outcome {
        Outcome::Success(results) => results,
        Outcome::Failure(e) => {
            eprintln!("Error: {e}");
            eprintln!("Error occurred.");
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&results);
    }
    eprintln!("Scraped {} items.", results.len());

    if let Some(path) = &cli.output {
        match export::export_csv(path, &results) {
            Ok(()) => eprintln!("Data exported to {}", path.display()),
            Err(ExportError::NoData) => eprintln!("{}", ExportError::NoData),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_table(results: &[ScrapeResult]) {
    let width = results.len().to_string().len().max(1);
    println!("{:>width$}  {}  {}", "#", "Value", "Snippet");
    for r in results {
        println!("{:>width$}  {}  {}", r.index, r.value, r.snippet);
    }
}
