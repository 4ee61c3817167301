use std::fmt;

use serde::{Deserialize, Serialize};

pub const URL_UNAVAILABLE: &str = "URL not available";
pub const COMPANY_UNAVAILABLE: &str = "N/A";
pub const DESCRIPTION_UNAVAILABLE: &str = "Job description not available";
pub const DESCRIPTION_NOT_FOUND: &str = "Job description section not found";
pub const DESCRIPTION_FETCH_FAILED: &str = "Failed to retrieve job description page";
pub const API_KEY_MISSING: &str = "API_KEY not found in .env file.";

/// One job posting as written to `results.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    #[serde(rename = "Job Title")]
    pub title: String,
    #[serde(rename = "Job URL")]
    pub detail_url: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Company Location")]
    pub company_location: String,
    #[serde(rename = "Salary")]
    pub metadata: String,
    #[serde(rename = "Date Posted")]
    pub posted_date: String,
    #[serde(rename = "Job Description")]
    pub description: String,
}

impl fmt::Display for JobListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job Title: {}", self.title)?;
        writeln!(f, "Job URL: {}", self.detail_url)?;
        writeln!(f, "Company Name: {}", self.company_name)?;
        writeln!(f, "Company Location: {}", self.company_location)?;
        writeln!(f, "Salary: {}", self.metadata)?;
        writeln!(f, "Date Posted: {}", self.posted_date)?;
        writeln!(f, "Job Description: {}", self.description)
    }
}

/// Every listing of one search page, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrapeResult {
    pub listings: Vec<JobListing>,
}

impl ScrapeResult {
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Search-page fields of one listing, before its detail page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    /// `None` when the card carries no job id.
    pub detail_url: Option<String>,
    pub company_name: String,
    pub company_location: String,
    pub metadata: String,
    pub posted_date: String,
}

impl ListingCard {
    pub fn detail_url_or_sentinel(&self) -> &str {
        self.detail_url.as_deref().unwrap_or(URL_UNAVAILABLE)
    }
}

/// The six search-page fields as parallel columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingColumns {
    pub titles: Vec<String>,
    pub urls: Vec<String>,
    pub company_names: Vec<String>,
    pub locations: Vec<String>,
    pub metadata: Vec<String>,
    pub dates: Vec<String>,
}

impl ListingColumns {
    pub fn lengths(&self) -> [usize; 6] {
        [
            self.titles.len(),
            self.urls.len(),
            self.company_names.len(),
            self.locations.len(),
            self.metadata.len(),
            self.dates.len(),
        ]
    }

    pub fn is_aligned(&self) -> bool {
        let lengths = self.lengths();
        lengths.iter().all(|&l| l == lengths[0])
    }

    /// Zips the columns into cards, stopping at the shortest column.
    pub fn into_cards(self) -> Vec<ListingCard> {
        let ListingColumns {
            titles,
            urls,
            company_names,
            locations,
            metadata,
            dates,
        } = self;

        titles
            .into_iter()
            .zip(urls)
            .zip(company_names)
            .zip(locations)
            .zip(metadata)
            .zip(dates)
            .map(|(((((title, url), company_name), company_location), metadata), posted_date)| {
                ListingCard {
                    title,
                    detail_url: (url != URL_UNAVAILABLE).then_some(url),
                    company_name,
                    company_location,
                    metadata,
                    posted_date,
                }
            })
            .collect()
    }
}

impl From<&[ListingCard]> for ListingColumns {
    fn from(cards: &[ListingCard]) -> Self {
        let mut columns = ListingColumns::default();
        for card in cards {
            columns.titles.push(card.title.clone());
            columns.urls.push(card.detail_url_or_sentinel().to_string());
            columns.company_names.push(card.company_name.clone());
            columns.locations.push(card.company_location.clone());
            columns.metadata.push(card.metadata.clone());
            columns.dates.push(card.posted_date.clone());
        }
        columns
    }
}

/// How a listing's description was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionOutcome {
    Extracted(String),
    /// The listing has no detail URL, so nothing was fetched.
    Unavailable,
    SectionNotFound,
    FetchFailed,
    MissingApiKey,
}

impl DescriptionOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, DescriptionOutcome::Extracted(_))
    }

    pub fn into_text(self) -> String {
        match self {
            DescriptionOutcome::Extracted(text) => text,
            DescriptionOutcome::Unavailable => DESCRIPTION_UNAVAILABLE.into(),
            DescriptionOutcome::SectionNotFound => DESCRIPTION_NOT_FOUND.into(),
            DescriptionOutcome::FetchFailed => DESCRIPTION_FETCH_FAILED.into(),
            DescriptionOutcome::MissingApiKey => API_KEY_MISSING.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(title: &str, url: Option<&str>) -> ListingCard {
        ListingCard {
            title: title.into(),
            detail_url: url.map(String::from),
            company_name: "Acme".into(),
            company_location: "Remote".into(),
            metadata: "".into(),
            posted_date: "1 day ago".into(),
        }
    }

    #[test]
    fn columns_round_trip_through_cards() {
        let cards = vec![card("A", Some("https://x.test/a")), card("B", None)];
        let columns = ListingColumns::from(cards.as_slice());
        assert!(columns.is_aligned());
        assert_eq!(columns.urls[1], URL_UNAVAILABLE);
        assert_eq!(columns.into_cards(), cards);
    }

    #[test]
    fn ragged_columns_truncate_to_shortest() {
        let mut columns = ListingColumns::from(vec![card("A", None), card("B", None)].as_slice());
        columns.dates.pop();
        assert!(!columns.is_aligned());
        let cards = columns.into_cards();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "A");
    }

    #[test]
    fn json_uses_display_keys() {
        let listing = JobListing {
            title: "Engineer".into(),
            detail_url: URL_UNAVAILABLE.into(),
            company_name: COMPANY_UNAVAILABLE.into(),
            company_location: "Remote".into(),
            metadata: "".into(),
            posted_date: "Today".into(),
            description: DESCRIPTION_UNAVAILABLE.into(),
        };
        let value = serde_json::to_value(&listing).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in [
            "Job Title",
            "Job URL",
            "Company Name",
            "Company Location",
            "Salary",
            "Date Posted",
            "Job Description",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(value["Salary"], "");
    }

    #[test]
    fn outcomes_render_as_sentinels() {
        assert_eq!(DescriptionOutcome::Unavailable.into_text(), "Job description not available");
        assert_eq!(DescriptionOutcome::SectionNotFound.into_text(), "Job description section not found");
        assert_eq!(DescriptionOutcome::FetchFailed.into_text(), "Failed to retrieve job description page");
        assert_eq!(DescriptionOutcome::MissingApiKey.into_text(), "API_KEY not found in .env file.");
        assert_eq!(DescriptionOutcome::Extracted("x".into()).into_text(), "x");
    }
}
