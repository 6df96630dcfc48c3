use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::domain::{Category, ScrapedEvent};

const DEFAULT_DURATION_MINUTES: u32 = 120;
const DEFAULT_CURRENCY: &str = "KZT";
const DEFAULT_ADDRESS: &str = "Алматы";
const DEFAULT_HOUR: u32 = 19;

// Site-name suffixes appended to <title> on sxodim pages.
static SITE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\|\s*Давай Сходим!?\s*$").unwrap());
static TICKETS_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-\s*купить билеты.*$").unwrap());

// "20 февраля" / "20 февраля 2026" with genitive and nominative month forms.
// The trailing class keeps "20 февральский" from matching.
static RU_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{1,2})\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря|январь|февраль|март|апрель|май|июнь|июль|август|сентябрь|октябрь|ноябрь|декабрь)(?:\s+(\d{4}))?[\s,.]",
    )
    .unwrap()
});
// "20.02.2026" or "20.02"
static NUMERIC_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\.(\d{1,2})(?:\.(\d{4}))?").unwrap());

// "в 19:00", "начало в 20:00", "время: 18.30"
static LABELED_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:в|начало|время|старт)\s*:?\s*(\d{1,2})[:.](\d{2})").unwrap());
static ANY_TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})[:.](\d{2})\b").unwrap());

// Price fallbacks, most specific first. Thousands may be space-grouped.
static COST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:от|from|цена|стоимость|price)\s*:?\s*([\d\s]+)\s*(?:₸|тг|тенге|KZT)")
            .unwrap(),
        Regex::new(r"(?i)([\d\s]+)\s*(?:₸|тг|тенге|KZT)").unwrap(),
        Regex::new(r"(?i)(?:от|from)\s+([\d\s]+)\b").unwrap(),
    ]
});
const COST_SANITY_RANGE: std::ops::RangeInclusive<u32> = 100..=500_000;

// "Адрес: ..." style labels (Russian and Kazakh), then bare street patterns.
static LABELED_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Место|Адрес|Площадка|Venue|Орын)\s*:?\s*(.+?)(?:\n|$)").unwrap());
static STREET_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:ул\.|пр\.|проспект|улица|Достык|Гоголя)[^,\n]{3,60}").unwrap());

const MIN_ADDRESS_CHARS: usize = 5;
const MAX_ADDRESS_CHARS: usize = 200;
const MIN_DESCRIPTION_CHARS: usize = 20;

/// Extracts structured event fields from a detail page.
///
/// The page markup is not a stable contract, so every field is a chain of
/// heuristics with a silent default. Only the title is mandatory; a page
/// without one is not an event page.
pub struct DetailParser {
    base_url: String,
}

impl DetailParser {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn extract(&self, html: &str, url: &str, category: Category) -> Option<ScrapedEvent> {
        let document = Html::parse_document(html);

        let title = extract_title(&document)?;
        let text = document.root_element().text().collect::<String>();

        let image = self.extract_image(&document).unwrap_or_default();
        let date = extract_date(&text).unwrap_or_else(|| Local::now().date_naive());
        let start_time = extract_time(&text)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap());
        let cost = extract_cost(&text);
        let address = extract_address(&text).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let description = extract_description(&document)
            .unwrap_or_else(|| format!("Мероприятие в Алматы. {}.", title));

        debug!(%url, title = %title, %date, cost, "extracted event");

        Some(ScrapedEvent {
            image,
            date,
            start_time,
            duration: DEFAULT_DURATION_MINUTES,
            artist: title.clone(),
            cost,
            currency: DEFAULT_CURRENCY.to_string(),
            category,
            address,
            link: url.to_string(),
            name_ru: title,
            description_ru: description,
        })
    }

    fn extract_image(&self, document: &Html) -> Option<String> {
        if let Some(content) = meta_content(document, r#"meta[property="og:image"]"#) {
            return Some(content);
        }

        // Event banners live under uploads/posts or an optimized CDN path.
        let img_selector = Selector::parse("img").unwrap();
        for img in document.select(&img_selector) {
            let src = img
                .value()
                .attr("src")
                .filter(|s| !s.is_empty())
                .or_else(|| img.value().attr("data-src").filter(|s| !s.is_empty()));
            let Some(src) = src else { continue };
            if src.contains("uploads/posts") || src.contains("optimized") {
                if src.starts_with("http") {
                    return Some(src.to_string());
                }
                return Some(format!("{}{}", self.base_url, src));
            }
        }
        None
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn extract_title(document: &Html) -> Option<String> {
    let h1_selector = Selector::parse("h1").unwrap();
    for h1 in document.select(&h1_selector) {
        let text = h1.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(content) = meta_content(document, r#"meta[property="og:title"]"#) {
        return Some(content);
    }

    let title_selector = Selector::parse("title").unwrap();
    if let Some(title) = document.select(&title_selector).next() {
        let text = title.text().collect::<String>();
        let text = SITE_SUFFIX_RE.replace(&text, "");
        let text = TICKETS_SUFFIX_RE.replace(text.trim(), "");
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }

    None
}

fn extract_date(text: &str) -> Option<NaiveDate> {
    for caps in RU_DATE_RE.captures_iter(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2]);
        let year: i32 = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => Local::now().year(),
        };
        // "31 февраля" happens in marketing copy; keep scanning.
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = NUMERIC_DATE_RE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => Local::now().year(),
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    None
}

fn month_number(name: &str) -> u32 {
    match name {
        "января" | "январь" => 1,
        "февраля" | "февраль" => 2,
        "марта" | "март" => 3,
        "апреля" | "апрель" => 4,
        "мая" | "май" => 5,
        "июня" | "июнь" => 6,
        "июля" | "июль" => 7,
        "августа" | "август" => 8,
        "сентября" | "сентябрь" => 9,
        "октября" | "октябрь" => 10,
        "ноября" | "ноябрь" => 11,
        "декабря" | "декабрь" => 12,
        _ => 0,
    }
}

fn extract_time(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = LABELED_TIME_RE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            return Some(time);
        }
    }

    // Unlabeled times: accept anything in the plausible event-start window.
    for caps in ANY_TIME_RE.captures_iter(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        if (10..=23).contains(&hour) && minute < 60 {
            return NaiveTime::from_hms_opt(hour, minute, 0);
        }
    }

    None
}

fn extract_cost(text: &str) -> u32 {
    for pattern in COST_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
        if let Ok(price) = digits.parse::<u32>() {
            if COST_SANITY_RANGE.contains(&price) {
                return price;
            }
        }
    }
    0
}

fn extract_address(text: &str) -> Option<String> {
    let labeled = LABELED_ADDRESS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    let street = STREET_ADDRESS_RE.find(text).map(|m| m.as_str());

    for candidate in labeled.into_iter().chain(street) {
        let address = candidate.trim();
        if address.chars().count() > MIN_ADDRESS_CHARS {
            return Some(address.chars().take(MAX_ADDRESS_CHARS).collect());
        }
    }
    None
}

fn extract_description(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="og:description"]"#)
        .filter(|desc| desc.chars().count() > MIN_DESCRIPTION_CHARS)
        .or_else(|| {
            meta_content(document, r#"meta[name="description"]"#)
                .filter(|desc| desc.chars().count() > MIN_DESCRIPTION_CHARS)
        })
}
