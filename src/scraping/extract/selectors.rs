//! Fallback selector tables for the listings page.
//!
//! The site has served at least two markup variants for the same listing
//! card (the public "base-card" layout and the signed-in "job-card" layout).
//! Each field is an ordered chain of probes, tried until one yields a
//! non-empty value.

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One way of reading a field out of a listing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    /// Whitespace-collapsed text content of the first element matching `css`.
    Text(String),
    /// Attribute value of the first element matching `css`.
    Attr { css: String, attr: String },
}

impl Probe {
    pub fn text(css: &str) -> Self {
        Probe::Text(css.to_string())
    }

    pub fn attr(css: &str, attr: &str) -> Self {
        Probe::Attr {
            css: css.to_string(),
            attr: attr.to_string(),
        }
    }

    fn css(&self) -> &str {
        match self {
            Probe::Text(css) | Probe::Attr { css, .. } => css,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTable {
    /// Listing container candidates; its element children are the listing nodes.
    pub container: Vec<String>,
    /// Markers of a legitimately empty result page.
    #[serde(default)]
    pub no_results: Vec<String>,
    pub title: Vec<Probe>,
    pub company: Vec<Probe>,
    pub location: Vec<Probe>,
    pub link: Vec<Probe>,
    pub date_posted: Vec<Probe>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            container: vec![
                "ul.jobs-search__results-list".to_string(),
                "ul.scaffold-layout__list-container".to_string(),
                "div.jobs-search-results-list > ul".to_string(),
            ],
            no_results: vec![
                ".jobs-search-no-results-banner".to_string(),
                ".jobs-search-two-pane__no-results-banner--expand".to_string(),
            ],
            title: vec![
                Probe::text("h3.base-search-card__title"),
                Probe::text("a.job-card-list__title"),
                Probe::text(".job-card-list__title--link"),
            ],
            company: vec![
                Probe::text("h4.base-search-card__subtitle"),
                Probe::text(".job-card-container__primary-description"),
                Probe::text(".artdeco-entity-lockup__subtitle"),
            ],
            location: vec![
                Probe::text("span.job-search-card__location"),
                Probe::text("li.job-card-container__metadata-item"),
                Probe::text(".artdeco-entity-lockup__caption"),
            ],
            link: vec![
                Probe::attr("a.base-card__full-link", "href"),
                Probe::attr("a.job-card-container__link", "href"),
                Probe::attr("a.job-card-list__title", "href"),
            ],
            date_posted: vec![
                Probe::attr("time.job-search-card__listdate", "datetime"),
                Probe::attr("time.job-search-card__listdate--new", "datetime"),
                Probe::attr("time", "datetime"),
            ],
        }
    }
}

enum Source {
    Text,
    Attr(String),
}

struct CompiledProbe {
    selector: Selector,
    source: Source,
}

/// A field's probes with their selectors parsed once per extraction.
pub(crate) struct FieldChain {
    probes: Vec<CompiledProbe>,
}

impl FieldChain {
    pub(crate) fn compile(field: &str, probes: &[Probe]) -> Self {
        let probes = probes
            .iter()
            .filter_map(|probe| match Selector::parse(probe.css()) {
                Ok(selector) => Some(CompiledProbe {
                    selector,
                    source: match probe {
                        Probe::Text(_) => Source::Text,
                        Probe::Attr { attr, .. } => Source::Attr(attr.clone()),
                    },
                }),
                Err(e) => {
                    warn!("ignoring invalid {} selector '{}': {:?}", field, probe.css(), e);
                    None
                }
            })
            .collect();
        Self { probes }
    }

    /// First non-empty value produced by the chain, in probe order.
    pub(crate) fn resolve(&self, node: ElementRef<'_>) -> Option<String> {
        self.probes.iter().find_map(|probe| {
            let el = node.select(&probe.selector).next()?;
            let value = match &probe.source {
                Source::Text => collapse_whitespace(&el.text().collect::<String>()),
                Source::Attr(attr) => el.value().attr(attr)?.trim().to_string(),
            };
            (!value.is_empty()).then_some(value)
        })
    }
}

pub(crate) fn compile_selectors(field: &str, selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|css| match Selector::parse(css) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!("ignoring invalid {} selector '{}': {:?}", field, css, e);
                None
            }
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first_li(doc: &Html) -> ElementRef<'_> {
        let li = Selector::parse("li").unwrap();
        doc.select(&li).next().unwrap()
    }

    #[test]
    fn test_primary_probe_wins() {
        let doc = Html::parse_fragment(
            r#"<ul><li><h3 class="a">  Primary
                 Title </h3><h3 class="b">Fallback</h3></li></ul>"#,
        );
        let chain = FieldChain::compile("title", &[Probe::text("h3.a"), Probe::text("h3.b")]);
        assert_eq!(chain.resolve(first_li(&doc)).as_deref(), Some("Primary Title"));
    }

    #[test]
    fn test_fallback_used_when_primary_missing_or_empty() {
        let doc = Html::parse_fragment(r#"<ul><li><h3 class="a">   </h3><h3 class="b">Fallback</h3></li></ul>"#);
        let chain = FieldChain::compile("title", &[Probe::text("h3.a"), Probe::text("h3.b")]);
        assert_eq!(chain.resolve(first_li(&doc)).as_deref(), Some("Fallback"));
    }

    #[test]
    fn test_inline_markup_joins_like_text_content() {
        let doc = Html::parse_fragment(
            r#"<ul><li><h3 class="a">Go<b>lang</b> Dev <em>(Remote)</em></h3></li></ul>"#,
        );
        let chain = FieldChain::compile("title", &[Probe::text("h3.a")]);
        assert_eq!(chain.resolve(first_li(&doc)).as_deref(), Some("Golang Dev (Remote)"));
    }

    #[test]
    fn test_attr_probe() {
        let doc = Html::parse_fragment(
            r#"<ul><li><time datetime="2026-10-01">2 weeks ago</time></li></ul>"#,
        );
        let chain = FieldChain::compile("date_posted", &[Probe::attr("time", "datetime")]);
        assert_eq!(chain.resolve(first_li(&doc)).as_deref(), Some("2026-10-01"));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let doc = Html::parse_fragment(r#"<ul><li><span class="ok">x</span></li></ul>"#);
        let chain = FieldChain::compile("title", &[Probe::text("[[["), Probe::text("span.ok")]);
        assert_eq!(chain.resolve(first_li(&doc)).as_deref(), Some("x"));
    }

    #[test]
    fn test_probe_serde_shape() {
        let probes: Vec<Probe> = serde_json::from_str(
            r#"[{ "text": "h3" }, { "attr": { "css": "a", "attr": "href" } }]"#,
        )
        .unwrap();
        assert_eq!(probes, vec![Probe::text("h3"), Probe::attr("a", "href")]);
    }
}
