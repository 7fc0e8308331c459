use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Descriptions are cut to this many characters on ingestion
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// At most this many distinct skills are kept per job
pub const MAX_REQUIRED_SKILLS: usize = 8;

/// Loosely typed posting date as it arrives from job boards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostedDate {
    /// Unix epoch seconds
    Epoch(i64),
    /// Fractional epoch seconds
    EpochFloat(f64),
    Text(String),
}

/// Job posting as accepted at the ingestion boundary.
///
/// Field names follow the posting format (`requiredSkills`,
/// `minYearsExperience`, ...). Everything except `id` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub min_years_experience: Option<i64>,
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default)]
    pub posted_date: Option<PostedDate>,
}

impl JobInput {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Validated, normalized job held by the catalog. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub required_skills: Vec<String>,
    pub url: Option<String>,
    /// `None` means no requirement
    pub min_years_experience: Option<u32>,
    pub remote: bool,
    pub posted_date: Option<NaiveDateTime>,
}

impl TryFrom<JobInput> for JobRecord {
    type Error = Error;

    fn try_from(input: JobInput) -> Result<Self> {
        let id = input.id.trim().to_string();
        if id.is_empty() {
            return Err(Error::InvalidJob("job id must not be empty".into()));
        }

        let description = input
            .description
            .map(|d| truncate_chars(d.trim(), MAX_DESCRIPTION_CHARS))
            .unwrap_or_default();

        let record = JobRecord {
            id,
            title: input.title.trim().to_string(),
            company: non_empty(input.company),
            location: non_empty(input.location),
            description,
            required_skills: normalize_skills(input.required_skills.unwrap_or_default()),
            url: non_empty(input.url),
            min_years_experience: input
                .min_years_experience
                .filter(|years| *years > 0)
                .map(|years| u32::try_from(years).unwrap_or(u32::MAX)),
            remote: input.remote.unwrap_or(false),
            posted_date: input.posted_date.as_ref().and_then(parse_posted_date),
        };

        if record.combined_text().is_empty() {
            return Err(Error::InvalidJob(format!("job {} has no text to embed", record.id)));
        }
        Ok(record)
    }
}

impl JobRecord {
    /// Text that gets embedded for this job: title, company, description,
    /// skills, location. Empty parts are skipped.
    pub fn combined_text(&self) -> String {
        let skills = self.required_skills.join(" ");
        [
            self.title.as_str(),
            self.company.as_deref().unwrap_or(""),
            self.description.as_str(),
            skills.as_str(),
            self.location.as_deref().unwrap_or(""),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = ahash::AHashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .take(MAX_REQUIRED_SKILLS)
        .collect()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y"];

/// Normalize a posting date to a timezone-naive timestamp.
///
/// Epoch values are read as UTC. Strings carrying an offset keep their wall
/// clock time and drop the offset. Zero, empty or unrecognised values give
/// `None`.
pub fn parse_posted_date(value: &PostedDate) -> Option<NaiveDateTime> {
    match value {
        PostedDate::Epoch(0) => None,
        PostedDate::Epoch(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
        PostedDate::EpochFloat(secs) => {
            if !secs.is_finite() || *secs == 0.0 {
                return None;
            }
            DateTime::from_timestamp(secs.trunc() as i64, 0).map(|dt| dt.naive_utc())
        }
        PostedDate::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
