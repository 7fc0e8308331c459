//! Multi-factor match scoring.
//!
//! Four sub-scores in `[0, 1]` are combined with static weights:
//!
//! | factor     | score                                             |
//! |------------|---------------------------------------------------|
//! | skill      | `(similarity + 1) / 2`                            |
//! | experience | `min(1, user_years / min_years)`, 1 if no minimum |
//! | location   | 1 remote or substring match, 0 mismatch, neutral if unknown |
//! | recency    | `exp(-days / decay_days)`                         |
//!
//! The overall score is scaled to `[0, 100]` and clamped. Breakdown values
//! are scaled but not clamped.

use crate::{JobRecord, UserProfile};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub skill: f32,
    pub experience: f32,
    pub location: f32,
    pub recency: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            skill: 0.55,
            experience: 0.20,
            location: 0.20,
            recency: 0.05,
        }
    }
}

/// Scoring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Days for recency to fall to `1/e`
    pub decay_days: f64,
    /// Age assumed for jobs without a usable posting date
    pub default_age_days: f64,
    /// Location score when either side has no location
    pub neutral_location: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            decay_days: 30.0,
            default_age_days: 30.0,
            neutral_location: 0.5,
        }
    }
}

/// Per-factor scores scaled to `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill: f32,
    pub experience: f32,
    pub location: f32,
    pub recency: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub job: JobRecord,
    pub match_percent: f32,
    /// Raw inner product from the index
    pub similarity: f32,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score against the current UTC wall clock
    pub fn score(&self, profile: &UserProfile, job: &JobRecord, similarity: f32) -> MatchResult {
        self.score_at(profile, job, similarity, Utc::now().naive_utc())
    }

    pub fn score_at(
        &self,
        profile: &UserProfile,
        job: &JobRecord,
        similarity: f32,
        now: NaiveDateTime,
    ) -> MatchResult {
        let skill = self.skill_score(similarity);
        let experience = self.experience_score(profile.years_experience, job.min_years_experience);
        let location = self.location_score(profile.location(), job);
        let recency = self.recency_score(job.posted_date, now) as f32;

        let w = &self.config.weights;
        let overall = w.skill * skill + w.experience * experience + w.location * location + w.recency * recency;

        MatchResult {
            job: job.clone(),
            match_percent: (overall * 100.0).clamp(0.0, 100.0),
            similarity,
            breakdown: ScoreBreakdown {
                skill: skill * 100.0,
                experience: experience * 100.0,
                location: location * 100.0,
                recency: recency * 100.0,
            },
        }
    }

    /// Map cosine similarity from `[-1, 1]` onto `[0, 1]`
    pub fn skill_score(&self, similarity: f32) -> f32 {
        (similarity + 1.0) / 2.0
    }

    pub fn experience_score(&self, user_years: u32, min_years: Option<u32>) -> f32 {
        match min_years {
            None | Some(0) => 1.0,
            Some(min) => (user_years as f32 / min as f32).min(1.0),
        }
    }

    pub fn location_score(&self, user_location: Option<&str>, job: &JobRecord) -> f32 {
        if job.remote {
            return 1.0;
        }
        let job_location = job.location.as_deref().map(str::trim).filter(|l| !l.is_empty());
        match (user_location, job_location) {
            (Some(user), Some(posting)) => {
                let user = user.to_lowercase();
                let posting = posting.to_lowercase();
                if posting.contains(&user) || user.contains(&posting) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => self.config.neutral_location,
        }
    }

    /// Exponential decay by age in fractional days. Future dates count as
    /// age zero. Kept in `f64` so postings decades old still order by age.
    pub fn recency_score(&self, posted: Option<NaiveDateTime>, now: NaiveDateTime) -> f64 {
        let days = match posted {
            Some(posted) => ((now - posted).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0),
            None => self.config.default_age_days,
        };
        (-days / self.config.decay_days).exp()
    }
}
