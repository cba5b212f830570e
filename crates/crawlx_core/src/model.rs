//! Wire-level data model shared by the gateway and the orchestrators.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ConsoleError;

pub const DEFAULT_WAIT_FOR: u8 = 2;
pub const MIN_WAIT_FOR: u8 = 1;
pub const MAX_WAIT_FOR: u8 = 10;

/// Opaque item identity. The service currently hands out integers, but the
/// console never does arithmetic on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(value) => ItemId(value.to_string()),
            RawId::Text(value) => ItemId(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScrapedItem {
    pub id: ItemId,
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub published_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub scraped_at: NaiveDateTime,
}

impl ScrapedItem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.as_ref().is_some_and(|tags| tags.contains(tag))
    }
}

/// Parses a service timestamp into local wall-clock time.
///
/// Offset-carrying RFC 3339 values are converted to the local zone; naive
/// values are already local.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}

/// Tags are loosely typed on the service side: a list, a single string, or null.
/// Blank entries are dropped; an empty result collapses to `None`.
fn deserialize_tags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeSet<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        List(Vec<Option<String>>),
        Single(String),
    }

    let raw = Option::<RawTags>::deserialize(deserializer)?;
    let tags: BTreeSet<String> = match raw {
        None => return Ok(None),
        Some(RawTags::List(list)) => list
            .into_iter()
            .flatten()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        Some(RawTags::Single(single)) => single
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
    };
    Ok(if tags.is_empty() { None } else { Some(tags) })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractType {
    #[default]
    Auto,
    Article,
    Text,
    Structured,
}

impl ExtractType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractType::Auto => "auto",
            ExtractType::Article => "article",
            ExtractType::Text => "text",
            ExtractType::Structured => "structured",
        }
    }
}

impl fmt::Display for ExtractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractType {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ExtractType::Auto),
            "article" => Ok(ExtractType::Article),
            "text" => Ok(ExtractType::Text),
            "structured" => Ok(ExtractType::Structured),
            other => Err(ConsoleError::Validation(format!(
                "unknown extract type '{other}' (expected auto, article, text or structured)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlScrapeRequest {
    pub url: String,
    pub extract_type: ExtractType,
    pub wait_for: u8,
}

impl UrlScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            extract_type: ExtractType::default(),
            wait_for: DEFAULT_WAIT_FOR,
        }
    }

    pub fn with_extract_type(mut self, extract_type: ExtractType) -> Self {
        self.extract_type = extract_type;
        self
    }

    /// Sets the service-side settle time, clamped into the accepted range.
    pub fn with_wait_for(mut self, seconds: u32) -> Self {
        self.wait_for = seconds.clamp(u32::from(MIN_WAIT_FOR), u32::from(MAX_WAIT_FOR)) as u8;
        self
    }

    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.url.trim().is_empty() {
            return Err(ConsoleError::Validation("Please enter a URL".to_string()));
        }
        Ok(())
    }
}

/// A table as extracted by the service: rows of cells.
pub type Table = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlScrapeResponse {
    pub success: bool,
    pub url: String,
    #[serde(default)]
    pub extracted_at: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub tables: Option<Vec<Table>>,
    #[serde(default)]
    pub lists: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub extraction_method: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Content fields of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub url: String,
    pub extracted_at: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub tables: Vec<Table>,
    pub lists: Vec<Vec<String>>,
    pub extraction_method: Option<String>,
}

impl ExtractedPage {
    /// Non-blank extracted text, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted(ExtractedPage),
    Failed { error: String },
}

impl UrlScrapeResponse {
    /// Splits the response so only one of content or error is reachable.
    pub fn into_outcome(self) -> ExtractionOutcome {
        if !self.success {
            return ExtractionOutcome::Failed {
                error: self
                    .error
                    .filter(|error| !error.trim().is_empty())
                    .unwrap_or_else(|| "Failed to scrape URL".to_string()),
            };
        }
        ExtractionOutcome::Extracted(ExtractedPage {
            url: self.url,
            extracted_at: self.extracted_at,
            title: self.title.filter(|title| !title.trim().is_empty()),
            content: self.content,
            author: self.author,
            published_date: self.published_date,
            description: self.description,
            tags: self.tags.unwrap_or_default(),
            tables: self.tables.unwrap_or_default(),
            lists: self.lists.unwrap_or_default(),
            extraction_method: self.extraction_method,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrapeJobRequest {
    pub spiders: Option<Vec<String>>,
}

impl ScrapeJobRequest {
    pub fn all() -> Self {
        Self::default()
    }

    /// Trims names, drops blanks and duplicates (first occurrence wins).
    /// An empty selection means "all configured jobs".
    pub fn for_spiders<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let spiders: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self {
            spiders: if spiders.is_empty() { None } else { Some(spiders) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScrapeJobResponse {
    pub status: String,
    #[serde(default)]
    pub spiders: Vec<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub q: String,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub tag: Option<String>,
    pub fuzzy: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportFormat {
    Csv,
    Pdf,
    Json,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }

    /// Fixed name the saved export is written under.
    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Csv => "scraped_data.csv",
            ExportFormat::Pdf => "scraped_data.pdf",
            ExportFormat::Json => "scraped_data.json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "json" => Ok(ExportFormat::Json),
            other => Err(ConsoleError::Validation(format!(
                "unknown export format '{other}' (expected csv, pdf or json)"
            ))),
        }
    }
}

/// Parameters for exports; only the PDF endpoint reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub style: String,
    pub limit: u32,
    pub tag: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            style: "detailed".to_string(),
            limit: 100,
            tag: None,
        }
    }
}
