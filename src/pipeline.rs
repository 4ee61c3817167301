use log::{error, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;
use crate::extractor::{extract_description, extract_listings};
use crate::fetcher::{Fetcher, HttpTransport, Transport};
use crate::listing::{DescriptionOutcome, JobListing, ListingColumns, ScrapeResult, URL_UNAVAILABLE};
use crate::rules::{CompiledRules, ExtractionRules};
use crate::settings::Settings;

/// Zips the search-page columns with the descriptions into listings.
///
/// Stops at the shortest input; a length mismatch is logged, never silent.
pub fn aggregate(columns: ListingColumns, descriptions: Vec<String>) -> ScrapeResult {
    if !columns.is_aligned() || columns.titles.len() != descriptions.len() {
        warn!(
            "Aggregating uneven inputs (columns = {:?}, descriptions = {}); truncating to the shortest",
            columns.lengths(),
            descriptions.len()
        );
    }

    let listings = columns
        .into_cards()
        .into_iter()
        .zip(descriptions)
        .map(|(card, description)| JobListing {
            detail_url: card.detail_url_or_sentinel().to_string(),
            title: card.title,
            company_name: card.company_name,
            company_location: card.company_location,
            metadata: card.metadata,
            posted_date: card.posted_date,
            description,
        })
        .collect();

    ScrapeResult { listings }
}

pub struct Pipeline<T: Transport> {
    fetcher: Fetcher<T>,
    rules: CompiledRules,
    /// Bounds how many detail pages are in flight at once.
    pool: ThreadPool,
}

impl Pipeline<HttpTransport> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Pipeline::new(
            Fetcher::from_settings(settings)?,
            ExtractionRules::default().compile()?,
            settings.concurrency,
        )
    }
}

impl<T: Transport> Pipeline<T> {
    pub fn new(fetcher: Fetcher<T>, rules: CompiledRules, concurrency: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .thread_name(|i| format!("detail-fetch-{i}"))
            .build()?;
        Ok(Pipeline {
            fetcher,
            rules,
            pool,
        })
    }

    /// Fetches one detail page and extracts its description. Failures become
    /// an outcome for this listing only.
    pub fn fetch_description(&self, detail_url: &str) -> DescriptionOutcome {
        if !self.fetcher.has_api_key() {
            error!("API key missing; cannot fetch {}", detail_url);
            return DescriptionOutcome::MissingApiKey;
        }

        match self.fetcher.fetch(detail_url) {
            Ok(body) => {
                let outcome = extract_description(&body, &self.rules);
                if !outcome.is_extracted() {
                    warn!("No description section on {}", detail_url);
                }
                outcome
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", detail_url, e);
                DescriptionOutcome::FetchFailed
            }
        }
    }

    /// One outcome per detail URL, in input order. Sentinel URLs are never
    /// fetched; the rest run on the pipeline's bounded pool.
    pub fn describe(&self, urls: &[String]) -> Vec<DescriptionOutcome> {
        let total = urls.len();
        self.pool.install(|| {
            urls.par_iter()
                .enumerate()
                .map(|(index, url)| {
                    if url == URL_UNAVAILABLE {
                        return DescriptionOutcome::Unavailable;
                    }
                    info!("Fetching description {} / {}: {}", index + 1, total, url);
                    self.fetch_description(url)
                })
                .collect()
        })
    }

    /// Runs the whole scrape for one search page. Failing to fetch the search
    /// page itself aborts the run.
    pub fn run(&self, search_url: &str) -> Result<ScrapeResult> {
        info!("Fetching search page {}", search_url);
        let body = self.fetcher.fetch(search_url)?;

        let columns = extract_listings(&body, &self.rules);
        info!("Found {} listings", columns.titles.len());

        let descriptions = self
            .describe(&columns.urls)
            .into_iter()
            .map(DescriptionOutcome::into_text)
            .collect();

        Ok(aggregate(columns, descriptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::fetcher::tests::StubTransport;
    use crate::listing::{ListingCard, DESCRIPTION_FETCH_FAILED, DESCRIPTION_UNAVAILABLE};
    use crate::output::{read_results, write_results};

    const SEARCH_URL: &str = "https://www.indeed.com/cmp/Example/jobs";
    const LISTING_PAGE: &str = include_str!("../fixtures/listing_page.html");
    const DETAIL_PAGE: &str = include_str!("../fixtures/detail_page.html");
    const DETAIL_URL: &str = "https://www.indeed.com/viewjob?jk=8f2c1a9be0d4";

    fn pipeline<'a>(
        transport: &'a StubTransport,
        key: Option<&str>,
        concurrency: usize,
    ) -> Pipeline<&'a StubTransport> {
        let fetcher = Fetcher::new(
            transport,
            "https://api.example.test/scrape".into(),
            key.map(String::from),
            false,
        );
        Pipeline::new(fetcher, ExtractionRules::default().compile().unwrap(), concurrency).unwrap()
    }

    fn card(title: &str, url: Option<&str>) -> ListingCard {
        ListingCard {
            title: title.into(),
            detail_url: url.map(String::from),
            company_name: "Acme".into(),
            company_location: "Remote".into(),
            metadata: String::new(),
            posted_date: "Today".into(),
        }
    }

    #[test]
    fn end_to_end_two_listings() {
        let transport = StubTransport::default()
            .with_page(SEARCH_URL, 200, LISTING_PAGE)
            .with_page(DETAIL_URL, 200, DETAIL_PAGE);
        let result = pipeline(&transport, Some("k"), 4).run(SEARCH_URL).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.listings[0].detail_url, DETAIL_URL);
        assert_eq!(
            result.listings[0].description,
            "About us The Bill of Rights Institute engages, educates, and empowers individuals. \
             Design programs for teachers Manage partner relationships \
             Questions? Contact us at for details."
        );
        assert_eq!(result.listings[1].detail_url, URL_UNAVAILABLE);
        assert_eq!(result.listings[1].description, DESCRIPTION_UNAVAILABLE);

        // search page + one detail page; the sentinel URL is never requested
        assert_eq!(transport.call_count(), 2);
        let targets = transport.targets.lock().unwrap().clone();
        assert!(!targets.iter().any(|t| t == URL_UNAVAILABLE));

        let dir = std::env::temp_dir().join(format!("job-scraper-e2e-{}", std::process::id()));
        let path = write_results(&result, &dir).unwrap();
        let written = read_results(&path).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written.listings[1].description, "Job description not available");
        assert_eq!(written, result);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn search_page_failure_aborts_the_run() {
        let transport = StubTransport::default().with_page(SEARCH_URL, 500, "boom");
        let err = pipeline(&transport, Some("k"), 1).run(SEARCH_URL).unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { status: 500, .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn missing_api_key_fails_without_requests() {
        let transport = StubTransport::default();
        let p = pipeline(&transport, None, 2);

        assert!(matches!(p.run(SEARCH_URL), Err(ScrapeError::Configuration(_))));
        assert_eq!(p.fetch_description(DETAIL_URL), DescriptionOutcome::MissingApiKey);
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn detail_failure_degrades_to_placeholder() {
        let transport = StubTransport::default().with_page(DETAIL_URL, 429, "slow down");
        let outcome = pipeline(&transport, Some("k"), 1).fetch_description(DETAIL_URL);
        assert_eq!(outcome, DescriptionOutcome::FetchFailed);
        assert_eq!(outcome.into_text(), DESCRIPTION_FETCH_FAILED);
    }

    #[test]
    fn concurrent_descriptions_keep_listing_order() {
        let mut transport = StubTransport::default();
        let mut urls = Vec::new();
        for i in 0..7 {
            if i == 3 {
                urls.push(URL_UNAVAILABLE.to_string());
                continue;
            }
            let url = format!("https://jobs.test/view/{i}");
            let page = format!("<div id=\"jobDescriptionText\"><p>Job {i}</p></div>");
            transport = transport.with_page(&url, 200, &page);
            urls.push(url);
        }

        let outcomes = pipeline(&transport, Some("k"), 3).describe(&urls);

        assert_eq!(outcomes.len(), 7);
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let expected = if i == 3 {
                DescriptionOutcome::Unavailable
            } else {
                DescriptionOutcome::Extracted(format!("Job {i}"))
            };
            assert_eq!(outcome, expected);
        }
        assert_eq!(transport.call_count(), 6);
    }

    #[test]
    fn single_worker_fetches_in_listing_order() {
        let urls: Vec<String> = (0..4).map(|i| format!("https://jobs.test/view/{i}")).collect();
        let transport = urls
            .iter()
            .fold(StubTransport::default(), |t, url| t.with_page(url, 200, "<p>no section</p>"));

        let outcomes = pipeline(&transport, Some("k"), 1).describe(&urls);

        assert!(outcomes.iter().all(|o| *o == DescriptionOutcome::SectionNotFound));
        assert_eq!(*transport.targets.lock().unwrap(), urls);
    }

    #[test]
    fn aggregate_truncates_to_shortest() {
        let columns = ListingColumns::from(vec![card("a", None), card("b", None)].as_slice());
        let result = aggregate(columns, vec!["only one".into()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.listings[0].title, "a");
        assert_eq!(result.listings[0].description, "only one");
        assert_eq!(result.listings[0].detail_url, URL_UNAVAILABLE);
    }
}
