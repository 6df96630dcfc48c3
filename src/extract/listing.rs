use crate::error::{Result, ScraperError};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Extracts event detail-page URLs from a listing page.
///
/// Detail links look like `/almaty/event/{slug}`; listings mix relative and
/// absolute forms of the same URL, so both are matched and normalized to the
/// absolute form.
pub struct ListingParser {
    base_url: String,
    relative: Regex,
    absolute: Regex,
}

impl ListingParser {
    pub fn new(base_url: &str, city_slug: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let host = base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let relative = Regex::new(&format!(r"^/{}/event/[\w-]+$", regex::escape(city_slug)))
            .map_err(|e| ScraperError::Config(format!("Invalid relative link pattern: {e}")))?;
        let absolute = Regex::new(&format!(
            r"^https?://{}/{}/event/[\w-]+$",
            regex::escape(host),
            regex::escape(city_slug)
        ))
        .map_err(|e| ScraperError::Config(format!("Invalid absolute link pattern: {e}")))?;
        Ok(Self {
            base_url,
            relative,
            absolute,
        })
    }

    /// Returns unique detail-page URLs in first-seen order.
    pub fn collect_event_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a[href]").unwrap();

        let mut links = Vec::new();
        let mut seen = HashSet::new();
        for anchor in document.select(&anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let url = if self.relative.is_match(href) {
                format!("{}{}", self.base_url, href)
            } else if self.absolute.is_match(href) {
                href.to_string()
            } else {
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ListingParser {
        ListingParser::new("https://sxodim.com", "almaty").unwrap()
    }

    #[test]
    fn collects_relative_and_absolute_links() {
        let html = r#"
            <html><body>
              <a href="/almaty/event/koncert-abba">ABBA</a>
              <a href="https://sxodim.com/almaty/event/standup-vecher">Standup</a>
            </body></html>
        "#;
        let links = parser().collect_event_links(html);
        assert_eq!(
            links,
            vec![
                "https://sxodim.com/almaty/event/koncert-abba",
                "https://sxodim.com/almaty/event/standup-vecher",
            ]
        );
    }

    #[test]
    fn dedupes_preserving_first_seen_order() {
        let html = r#"
            <a href="/almaty/event/first">1</a>
            <a href="/almaty/event/second">2</a>
            <a href="https://sxodim.com/almaty/event/first">1 again</a>
        "#;
        let links = parser().collect_event_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "https://sxodim.com/almaty/event/first");
    }

    #[test]
    fn ignores_non_detail_links() {
        let html = r#"
            <a href="/almaty/events/kontserty">listing itself</a>
            <a href="/astana/event/wrong-city">other city</a>
            <a href="/almaty/event/with-query?utm=1">query string</a>
            <a href="/almaty/place/arbat">a place, not an event</a>
            <a href="https://other-site.com/almaty/event/foreign">foreign host</a>
        "#;
        assert!(parser().collect_event_links(html).is_empty());
    }

    #[test]
    fn city_slug_is_escaped_into_the_pattern() {
        let parser = ListingParser::new("https://sxodim.com/", "nur-sultan").unwrap();
        let links = parser.collect_event_links(r#"<a href="/nur-sultan/event/expo">x</a>"#);
        assert_eq!(links, vec!["https://sxodim.com/nur-sultan/event/expo"]);
    }
}
