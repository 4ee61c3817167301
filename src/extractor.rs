use log::{debug, warn};
use scraper::{ElementRef, Html};

use crate::listing::{DescriptionOutcome, ListingCard, ListingColumns, COMPANY_UNAVAILABLE, URL_UNAVAILABLE};
use crate::rules::CompiledRules;

fn trimmed_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text fragments with surrounding whitespace removed, empties dropped.
fn stripped_fragments<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element.text().map(str::trim).filter(|s| !s.is_empty())
}

fn detail_url(title: ElementRef, rules: &CompiledRules) -> Option<String> {
    title
        .select(&rules.job_link)
        .next()
        .and_then(|link| link.value().attr(&rules.job_id_attr))
        .map(|job_id| rules.detail_url(job_id))
}

/// `(company name, location)` from a company/location block. `None` when the
/// block has no location element.
fn company_and_location(block: ElementRef, rules: &CompiledRules) -> Option<(String, String)> {
    let location = block.select(&rules.location).next().map(trimmed_text)?;
    let company = block
        .select(&rules.company_name)
        .next()
        .map(trimmed_text)
        .unwrap_or_else(|| COMPANY_UNAVAILABLE.to_string());
    Some((company, location))
}

fn metadata_text(group: ElementRef, rules: &CompiledRules) -> String {
    let items: Vec<String> = group
        .select(&rules.metadata_item)
        .map(|item| stripped_fragments(item).collect::<String>())
        .filter(|text| !text.is_empty())
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!("{}.", items.join(". "))
    }
}

fn posted_date(date: ElementRef, rules: &CompiledRules) -> String {
    date.text()
        .collect::<String>()
        .replace(rules.date_prefix.as_str(), "")
        .trim()
        .to_string()
}

fn card_from(card: ElementRef, rules: &CompiledRules) -> Option<ListingCard> {
    let title = card.select(&rules.title).next()?;
    let (company_name, company_location) = card
        .select(&rules.company_location)
        .next()
        .and_then(|block| company_and_location(block, rules))
        .unwrap_or_else(|| (COMPANY_UNAVAILABLE.to_string(), String::new()));

    Some(ListingCard {
        title: trimmed_text(title),
        detail_url: detail_url(title, rules),
        company_name,
        company_location,
        metadata: card
            .select(&rules.metadata_group)
            .next()
            .map(|group| metadata_text(group, rules))
            .unwrap_or_default(),
        posted_date: card
            .select(&rules.date)
            .next()
            .map(|date| posted_date(date, rules))
            .unwrap_or_default(),
    })
}

/// Collects each field independently across the whole page. Only used when
/// the page has no card containers to anchor on.
fn positional_columns(document: &Html, rules: &CompiledRules) -> ListingColumns {
    let mut columns = ListingColumns::default();

    for title in document.select(&rules.title) {
        columns.titles.push(trimmed_text(title));
        columns
            .urls
            .push(detail_url(title, rules).unwrap_or_else(|| URL_UNAVAILABLE.to_string()));
    }

    for (company, location) in document
        .select(&rules.company_location)
        .filter_map(|block| company_and_location(block, rules))
    {
        columns.company_names.push(company);
        columns.locations.push(location);
    }

    columns.metadata = document
        .select(&rules.metadata_group)
        .map(|group| metadata_text(group, rules))
        .collect();

    columns.dates = document
        .select(&rules.date)
        .map(|date| posted_date(date, rules))
        .collect();

    columns
}

fn titles_outside_cards(document: &Html, rules: &CompiledRules) -> usize {
    document
        .select(&rules.title)
        .filter(|title| {
            !title
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| rules.card.matches(&ancestor))
        })
        .count()
}

/// Extracts every listing on a search-results page, in document order.
///
/// Fields are read inside each listing's card container so a missing element
/// only affects its own listing. Pages without card containers fall back to
/// page-wide columns, truncated to the shortest one.
pub fn extract_cards(html: &[u8], rules: &CompiledRules) -> Vec<ListingCard> {
    let html = String::from_utf8_lossy(html);
    let document = Html::parse_document(&html);

    let mut saw_container = false;
    let mut cards = Vec::new();
    for container in document.select(&rules.card) {
        saw_container = true;
        match card_from(container, rules) {
            Some(card) => cards.push(card),
            None => debug!("Skipping listing container without a title"),
        }
    }
    if saw_container {
        let orphans = titles_outside_cards(&document, rules);
        if orphans > 0 {
            warn!("Skipped {} job titles outside a listing container", orphans);
        }
        return cards;
    }

    let columns = positional_columns(&document, rules);
    if !columns.is_aligned() {
        warn!(
            "Listing fields are misaligned (titles, urls, companies, locations, metadata, dates = {:?}); truncating to the shortest",
            columns.lengths()
        );
    }
    columns.into_cards()
}

/// Six parallel, equal-length columns for a search-results page.
pub fn extract_listings(html: &[u8], rules: &CompiledRules) -> ListingColumns {
    ListingColumns::from(extract_cards(html, rules).as_slice())
}

/// Pulls the job description out of a detail page.
pub fn extract_description(html: &[u8], rules: &CompiledRules) -> DescriptionOutcome {
    let html = String::from_utf8_lossy(html);
    let document = Html::parse_document(&html);

    let Some(section) = document.select(&rules.description).next() else {
        return DescriptionOutcome::SectionNotFound;
    };

    let joined = stripped_fragments(section).collect::<Vec<_>>().join(" ");
    let cleaned = rules.email_placeholder.replace_all(&joined, "");
    DescriptionOutcome::Extracted(cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}
