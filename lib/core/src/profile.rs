use serde::{Deserialize, Serialize};

/// Job seeker profile submitted at query time. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub desired_roles: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub years_experience: u32,
    /// Result cap; absent or zero falls back to the engine default
    #[serde(default, alias = "top_k")]
    pub top_k: Option<usize>,
}

impl UserProfile {
    pub fn new<S: Into<String>>(skills: impl IntoIterator<Item = S>) -> Self {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Text embedded for the query: skills, desired roles, location
    pub fn query_text(&self) -> String {
        self.skills
            .iter()
            .chain(self.desired_roles.iter())
            .map(|s| s.trim())
            .chain(self.location.as_deref().map(str::trim))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Trimmed location, `None` when blank
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_text() {
        let profile = UserProfile {
            desired_roles: vec!["Data Engineer".into()],
            location: Some(" Cape Town ".into()),
            ..UserProfile::new(["Python", " ", "SQL"])
        };
        assert_eq!(profile.query_text(), "Python SQL Data Engineer Cape Town");
        assert_eq!(profile.location(), Some("Cape Town"));
    }

    #[test]
    fn test_query_text_without_skills() {
        let profile = UserProfile {
            desired_roles: vec!["Chef".into()],
            ..Default::default()
        };
        assert_eq!(profile.query_text(), "Chef");
        assert_eq!(profile.location(), None);
    }

    #[test]
    fn test_deserialize_accepts_both_top_k_spellings() {
        let a: UserProfile = serde_json::from_value(json!({"skills": ["Go"], "topK": 3})).unwrap();
        let b: UserProfile = serde_json::from_value(json!({"skills": ["Go"], "top_k": 3})).unwrap();
        assert_eq!(a.top_k, Some(3));
        assert_eq!(a, b);

        let c: UserProfile = serde_json::from_value(json!({"yearsExperience": 4, "location": ""})).unwrap();
        assert!(c.skills.is_empty());
        assert_eq!(c.years_experience, 4);
    }
}
