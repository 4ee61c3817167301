use regex::Regex;
use scraper::Selector;

use crate::error::{Result, ScrapeError};

/// Site markup the extractor depends on. Kept as data so a markup change
/// only touches this table.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// One element per listing; every field is read inside it.
    pub card: &'static str,
    pub title: &'static str,
    pub job_link: &'static str,
    pub job_id_attr: &'static str,
    /// `{job_id}` is replaced with the value of `job_id_attr`.
    pub detail_url_template: &'static str,
    pub company_location: &'static str,
    pub location: &'static str,
    pub company_name: &'static str,
    pub metadata_group: &'static str,
    pub metadata_item: &'static str,
    pub date: &'static str,
    pub date_prefix: &'static str,
    pub description: &'static str,
    /// Cloudflare's stand-in for e-mail addresses.
    pub email_placeholder: &'static str,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        ExtractionRules {
            card: "div.job_seen_beacon",
            title: "h2.jobTitle",
            job_link: "a[data-jk]",
            job_id_attr: "data-jk",
            detail_url_template: "https://www.indeed.com/viewjob?jk={job_id}",
            company_location: ".company_location",
            location: "div.css-1p0sjhy.eu4oa1w0",
            company_name: "span.css-92r8pb.eu4oa1w0",
            metadata_group: ".jobMetaDataGroup",
            metadata_item: "div.metadata",
            date: ".underShelfFooter",
            date_prefix: "Posted",
            description: "div#jobDescriptionText",
            email_placeholder: r"\[email[\s\u{a0}]protected\]",
        }
    }
}

/// Parsed form of [`ExtractionRules`].
#[derive(Debug)]
pub struct CompiledRules {
    pub card: Selector,
    pub title: Selector,
    pub job_link: Selector,
    pub job_id_attr: String,
    pub detail_url_template: String,
    pub company_location: Selector,
    pub location: Selector,
    pub company_name: Selector,
    pub metadata_group: Selector,
    pub metadata_item: Selector,
    pub date: Selector,
    pub date_prefix: String,
    pub description: Selector,
    pub email_placeholder: Regex,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

impl ExtractionRules {
    pub fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            card: selector(self.card)?,
            title: selector(self.title)?,
            job_link: selector(self.job_link)?,
            job_id_attr: self.job_id_attr.to_string(),
            detail_url_template: self.detail_url_template.to_string(),
            company_location: selector(self.company_location)?,
            location: selector(self.location)?,
            company_name: selector(self.company_name)?,
            metadata_group: selector(self.metadata_group)?,
            metadata_item: selector(self.metadata_item)?,
            date: selector(self.date)?,
            date_prefix: self.date_prefix.to_string(),
            description: selector(self.description)?,
            email_placeholder: Regex::new(self.email_placeholder)
                .map_err(|_| ScrapeError::Selector(self.email_placeholder.to_string()))?,
        })
    }
}

impl CompiledRules {
    pub fn detail_url(&self, job_id: &str) -> String {
        self.detail_url_template.replace("{job_id}", job_id)
    }
}
