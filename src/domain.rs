use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Serialize, Serializer};

/// Event category as used by the backend's events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Other = 0,
    Concert = 1,
    Culture = 2,
    Entertainment = 3,
}

impl Category {
    /// Map a sxodim listing slug to a category. Unknown slugs land in
    /// Concert, which matches how the backend files uncategorized events.
    pub fn from_slug(slug: &str) -> Self {
        match slug {
            "kontserty" => Category::Concert,
            "koncerty-v-everjazz" => Category::Concert,
            "concerty-dvorec-respubliki" => Category::Concert,
            "vystavki" => Category::Culture,
            "screening" => Category::Culture,
            "standup" => Category::Concert,
            "vecherinki" => Category::Concert,
            "teatr" => Category::Culture,
            "razvlecheniya" => Category::Entertainment,
            "detskie-meropriyatiya" => Category::Entertainment,
            _ => Category::Concert,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Category::Concert,
            2 => Category::Culture,
            3 => Category::Entertainment,
            _ => Category::Other,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

// JSON output keeps the backend's integer coding, not the variant names.
impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

/// Translation language ids as used by the backend's translation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En = 1,
    Ru = 2,
    Kz = 3,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ru, Language::Kz];

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// One event as extracted from a detail page, ready to be persisted.
///
/// Russian is the only language the source publishes, so `name_ru` and
/// `description_ru` carry the baseline text for all translation rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedEvent {
    pub image: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: u32,
    pub artist: String,
    pub cost: u32,
    pub currency: String,
    pub category: Category,
    pub address: String,
    pub link: String,
    pub name_ru: String,
    pub description_ru: String,
}

/// An event row as persisted, including bookkeeping columns.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEvent {
    pub id: i64,
    pub image: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: u32,
    pub artist: String,
    pub cost: u32,
    pub currency: String,
    pub category: Category,
    pub address: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A translation row for a stored event.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub event_id: i64,
    pub language_id: i64,
    pub name: String,
    pub description: String,
}
