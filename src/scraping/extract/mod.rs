//! Listing extraction from a rendered listings page.
//!
//! The browser hands back the rendered document as an HTML string; everything
//! here is a pure function of that snapshot, the page URL and the record cap.

mod identifier;
mod selectors;

pub use identifier::resolve_listing_id;
pub use selectors::{Probe, SelectorTable};

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use crate::core::errors::ScrapeError;
use crate::types::{ListingRecord, UNKNOWN_LOCATION};
use selectors::{compile_selectors, FieldChain};

struct CompiledTable {
    title: FieldChain,
    company: FieldChain,
    location: FieldChain,
    link: FieldChain,
    date_posted: FieldChain,
}

impl CompiledTable {
    fn new(table: &SelectorTable) -> Self {
        Self {
            title: FieldChain::compile("title", &table.title),
            company: FieldChain::compile("company", &table.company),
            location: FieldChain::compile("location", &table.location),
            link: FieldChain::compile("link", &table.link),
            date_posted: FieldChain::compile("date_posted", &table.date_posted),
        }
    }

    /// `None` when title, company or link cannot be resolved.
    fn record(&self, node: ElementRef<'_>, base: Option<&Url>) -> Option<ListingRecord> {
        let title = self.title.resolve(node)?;
        let company = self.company.resolve(node)?;
        let link = absolutize(&self.link.resolve(node)?, base)?;
        let location = self
            .location
            .resolve(node)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        let date_posted = self.date_posted.resolve(node).unwrap_or_default();

        Some(ListingRecord {
            id: resolve_listing_id(&link),
            title,
            company,
            location,
            link,
            date_posted,
        })
    }
}

fn absolutize(href: &str, base: Option<&Url>) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base?.join(href).ok().map(|u| u.to_string()),
    }
}

/// Walk the listing container's children in document order and build up to
/// `limit` records.
///
/// Nodes missing a title, company or link are skipped without counting
/// toward `limit`. A page with no recognizable container is an error unless
/// it carries a "no results" marker.
pub fn extract_listings(
    html: &str,
    page_url: &str,
    limit: usize,
    table: &SelectorTable,
) -> Result<Vec<ListingRecord>, ScrapeError> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let container = compile_selectors("container", &table.container)
        .iter()
        .find_map(|sel| document.select(sel).next());

    let Some(container) = container else {
        let empty_page = compile_selectors("no_results", &table.no_results)
            .iter()
            .any(|sel| document.select(sel).next().is_some());
        if empty_page {
            debug!("listings page reports no results");
            return Ok(Vec::new());
        }
        return Err(ScrapeError::Extraction(
            "no listing container matched any known selector".into(),
        ));
    };

    let compiled = CompiledTable::new(table);
    let mut records = Vec::with_capacity(limit.min(64));
    let mut skipped = 0usize;

    for node in container.children().filter_map(ElementRef::wrap) {
        if records.len() >= limit {
            break;
        }
        match compiled.record(node, base.as_ref()) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    debug!(
        "extracted {} listings ({} incomplete nodes skipped)",
        records.len(),
        skipped
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.linkedin.com/jobs/search?keywords=rust";

    fn base_card(title: &str, company: &str, location: Option<&str>, href: &str) -> String {
        let location = location
            .map(|l| format!(r#"<span class="job-search-card__location"> {l} </span>"#))
            .unwrap_or_default();
        format!(
            r#"<li><div class="base-card">
                <a class="base-card__full-link" href="{href}"></a>
                <h3 class="base-search-card__title">
                    {title}
                </h3>
                <h4 class="base-search-card__subtitle"><a>{company}</a></h4>
                {location}
                <time class="job-search-card__listdate" datetime="2026-10-15">3 days ago</time>
            </div></li>"#
        )
    }

    fn page(items: &[String]) -> String {
        format!(
            r#"<html><body><section><ul class="jobs-search__results-list">{}</ul></section></body></html>"#,
            items.join("\n")
        )
    }

    #[test]
    fn test_base_card_fields() {
        let html = page(&[base_card(
            "Senior Rust Engineer",
            "Acme",
            Some("Berlin, Germany"),
            "https://www.linkedin.com/jobs/view/senior-rust-engineer-at-acme-3791234567?refId=1",
        )]);
        let records = extract_listings(&html, PAGE_URL, 10, &SelectorTable::default()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "3791234567");
        assert_eq!(r.title, "Senior Rust Engineer");
        assert_eq!(r.company, "Acme");
        assert_eq!(r.location, "Berlin, Germany");
        assert_eq!(r.date_posted, "2026-10-15");
    }

    #[test]
    fn test_missing_location_uses_sentinel() {
        let html = page(&[base_card("Rust Dev", "Initech", None, "/jobs/view/rust-dev-77")]);
        let records = extract_listings(&html, PAGE_URL, 10, &SelectorTable::default()).unwrap();
        assert_eq!(records[0].location, UNKNOWN_LOCATION);
        assert_eq!(records[0].link, "https://www.linkedin.com/jobs/view/rust-dev-77");
        assert_eq!(records[0].id, "77");
    }

    #[test]
    fn test_incomplete_nodes_are_skipped() {
        let html = page(&[
            r#"<li><h3 class="base-search-card__title">No company or link</h3></li>"#.to_string(),
            base_card("Go Engineer", "Globex", Some("Remote"), "https://x.test/go-engineer-1"),
            r#"<li class="ad-banner">Sponsored</li>"#.to_string(),
        ]);
        let records = extract_listings(&html, PAGE_URL, 10, &SelectorTable::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Go Engineer");
        assert!(records
            .iter()
            .all(|r| !r.title.is_empty() && !r.company.is_empty() && !r.link.is_empty()));
    }

    #[test]
    fn test_limit_bounds_walk() {
        let items: Vec<String> = (0..8)
            .map(|i| base_card(&format!("Job {i}"), "Co", None, &format!("https://x.test/job-{i}")))
            .collect();
        let records = extract_listings(&page(&items), PAGE_URL, 5, &SelectorTable::default()).unwrap();
        assert_eq!(records.len(), 5);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Job 0", "Job 1", "Job 2", "Job 3", "Job 4"]);
    }

    #[test]
    fn test_signed_in_job_card_variant() {
        let html = r#"<html><body><div class="jobs-search-results-list"><ul class="scaffold-layout__list-container">
            <li><div class="job-card-container">
                <a class="job-card-container__link job-card-list__title" href="/jobs/view/3900000001/?trk=x">
                    Platform Engineer
                </a>
                <div class="artdeco-entity-lockup__subtitle">Hooli</div>
                <ul><li class="job-card-container__metadata-item">Austin, TX</li></ul>
            </div></li>
        </ul></div></body></html>"#;
        let records = extract_listings(html, PAGE_URL, 10, &SelectorTable::default()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "Platform Engineer");
        assert_eq!(r.company, "Hooli");
        assert_eq!(r.location, "Austin, TX");
        assert_eq!(r.link, "https://www.linkedin.com/jobs/view/3900000001/?trk=x");
        // no "-digits" segment: the link itself is the id
        assert_eq!(r.id, r.link);
        assert_eq!(r.date_posted, "");
    }

    #[test]
    fn test_no_results_marker_is_empty_not_error() {
        let html = r#"<html><body><section class="jobs-search-no-results-banner">No matching jobs</section></body></html>"#;
        let records = extract_listings(html, PAGE_URL, 10, &SelectorTable::default()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_unknown_markup_is_extraction_error() {
        let html = "<html><body><div class='totally-new-layout'></div></body></html>";
        let err = extract_listings(html, PAGE_URL, 10, &SelectorTable::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }
}
