use std::io::{self, Write};

use anyhow::Context;
use log::{error, info, warn};

mod error;
mod extractor;
mod fetcher;
mod listing;
mod logger;
mod output;
mod pipeline;
mod rules;
mod settings;

use pipeline::Pipeline;
use settings::Settings;

fn main() -> anyhow::Result<()> {
    logger::init();

    let settings = Settings::new().context("Failed to read configuration")?;
    if settings.api_key.is_none() {
        error!("SCRAPER_API_KEY (or SOME_SECRET) is not set");
    }

    let pipeline = Pipeline::from_settings(&settings)?;
    let result = match pipeline.run(&settings.search_url) {
        Ok(result) => result,
        Err(e) => {
            error!("Could not scrape {}: {}", settings.search_url, e);
            return Err(e).context("Search page could not be scraped");
        }
    };

    if result.is_empty() {
        warn!("No listings found on {}", settings.search_url);
    }

    output::write_results(&result, &settings.output_dir)
        .with_context(|| format!("Failed to write results to {}", settings.output_dir.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::print_results(&result, &mut out)?;
    out.flush()?;

    info!("Scrape complete: {} listings", result.len());
    Ok(())
}
