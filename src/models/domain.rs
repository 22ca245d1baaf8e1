use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Message style selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Casual,
    Enthusiastic,
    Direct,
    #[default]
    #[serde(other)]
    Formal,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Direct => "direct",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-supplied search criteria for one generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SearchInput {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "jobUrl", default)]
    pub job_url: Option<String>,
    #[validate(length(min = 1, message = "userBio is required"))]
    #[serde(rename = "userBio", default)]
    pub user_bio: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(rename = "includeFollowUps", default)]
    pub include_follow_ups: bool,
}

impl SearchInput {
    /// Non-empty company, if any
    pub fn company(&self) -> Option<&str> {
        non_blank(&self.company)
    }

    /// Non-empty role, if any
    pub fn role(&self) -> Option<&str> {
        non_blank(&self.role)
    }

    /// Non-empty location, if any
    pub fn location(&self) -> Option<&str> {
        non_blank(&self.location)
    }

    /// Non-empty job posting URL, if any
    pub fn job_url(&self) -> Option<&str> {
        non_blank(&self.job_url)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(rename = "fieldOfStudy", default)]
    pub field_of_study: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

/// Profile of the user sending the outreach
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "firstName", default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub age: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Education,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(rename = "socialLinks", default, deserialize_with = "null_as_default")]
    pub social_links: SocialLinks,
}

impl UserProfile {
    /// Stand-in profile used when neither the request nor the profile store supplies one
    pub fn synthesized(input: &SearchInput) -> Self {
        Self {
            first_name: "User".to_string(),
            last_name: "Profile".to_string(),
            age: 25,
            location: input.location().unwrap_or("India").to_string(),
            education: Education {
                degree: "Bachelor of Technology".to_string(),
                institution: "Indian Institute of Technology".to_string(),
                field_of_study: "Computer Science".to_string(),
            },
            skills: vec![
                "Programming".to_string(),
                "Problem Solving".to_string(),
                "Communication".to_string(),
            ],
            interests: vec![
                "Technology".to_string(),
                "Innovation".to_string(),
                "Professional Growth".to_string(),
            ],
            experience: Some(input.user_bio.clone()),
            social_links: SocialLinks::default(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Relevance score given as a number or a numeric string such as `"85"` or `"85%"`
fn score_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Score>::deserialize(deserializer)? {
        Some(Score::Number(n)) => n,
        Some(Score::Text(text)) => text.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

/// Candidate person as produced by the generation model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedConnection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(rename = "profileUrl", default, deserialize_with = "null_as_default")]
    pub profile_url: String,
    #[serde(rename = "profileImage", default, deserialize_with = "null_as_default")]
    pub profile_image: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "linkedinUrl", default)]
    pub linkedin_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headline: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
    #[serde(rename = "connectionReason", default, deserialize_with = "null_as_default")]
    pub connection_reason: String,
    #[serde(rename = "relevanceScore", default, deserialize_with = "score_from_number_or_string")]
    pub relevance_score: f64,
}

impl GeneratedConnection {
    /// Relevance clamped to the 0-100 range
    pub fn confidence(&self) -> u8 {
        if self.relevance_score.is_nan() {
            return 0;
        }
        self.relevance_score.round().clamp(0.0, 100.0) as u8
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Fill in avatar and profile links the model leaves out
    pub fn with_derived_links(mut self) -> Self {
        self.profile_image = format!(
            "https://ui-avatars.com/api/?name={}&background=6b7280&color=ffffff&size=128",
            urlencoding::encode(&self.name)
        );
        let profile_link = format!("https://linkedin.com/in/{}", name_slug(&self.name));
        if self.linkedin_url.as_deref().map_or(true, str::is_empty) {
            self.linkedin_url = Some(profile_link.clone());
        }
        if self.profile_url.is_empty() {
            self.profile_url = profile_link;
        }
        self
    }
}

fn name_slug(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// Connection enriched with a message and display fields, as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResult {
    pub name: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub profile_url: String,
    pub profile_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    pub headline: String,
    pub summary: String,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub connection_reason: String,
    pub message: String,
    pub confidence: u8,
    pub connection_strength: u8,
    /// Display-only, randomly synthesized
    pub mutual_connections: u32,
    /// Display-only, randomly synthesized
    pub response_rate: u32,
    /// Display-only, randomly synthesized
    pub last_active: String,
    /// Display-only, randomly synthesized
    pub recent_activity: String,
    pub is_alumni: bool,
    #[serde(default)]
    pub follow_up_sequence: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parsing() {
        let tone: Tone = serde_json::from_str("\"casual\"").unwrap();
        assert_eq!(tone, Tone::Casual);

        let tone: Tone = serde_json::from_str("\"shouty\"").unwrap();
        assert_eq!(tone, Tone::Formal);

        let tone: Tone = serde_json::from_str("\"formal\"").unwrap();
        assert_eq!(tone, Tone::Formal);
        assert_eq!(serde_json::to_string(&Tone::Direct).unwrap(), "\"direct\"");
    }

    #[test]
    fn test_connection_tolerates_nulls() {
        let connection: GeneratedConnection = serde_json::from_str(
            r#"{"name": "Aarav Sharma", "headline": null, "experience": null, "skills": null, "email": null, "relevanceScore": null}"#,
        )
        .unwrap();
        assert_eq!(connection.name, "Aarav Sharma");
        assert!(connection.headline.is_empty());
        assert!(connection.experience.is_empty());
        assert!(connection.skills.is_empty());
        assert_eq!(connection.confidence(), 0);
    }

    #[test]
    fn test_relevance_score_as_string() {
        let quoted: GeneratedConnection =
            serde_json::from_str(r#"{"name": "A", "relevanceScore": "85"}"#).unwrap();
        assert_eq!(quoted.confidence(), 85);

        let percent: GeneratedConnection =
            serde_json::from_str(r#"{"name": "A", "relevanceScore": " 72% "}"#).unwrap();
        assert_eq!(percent.confidence(), 72);

        let junk: GeneratedConnection =
            serde_json::from_str(r#"{"name": "A", "relevanceScore": "high"}"#).unwrap();
        assert_eq!(junk.confidence(), 0);
    }

    #[test]
    fn test_profile_tolerates_nulls() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"firstName": "Jane", "lastName": null, "age": null, "education": null, "skills": null}"#,
        )
        .unwrap();
        assert_eq!(profile.first_name, "Jane");
        assert_eq!(profile.age, 0);
        assert!(profile.last_name.is_empty());
        assert!(profile.skills.is_empty());
        assert!(profile.education.institution.is_empty());
    }

    #[test]
    fn test_search_input_defaults() {
        let input: SearchInput = serde_json::from_str(r#"{"userBio": "hello"}"#).unwrap();
        assert_eq!(input.tone, Tone::Formal);
        assert!(!input.include_follow_ups);
        assert!(input.company().is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_search_input_requires_bio() {
        let input: SearchInput = serde_json::from_str(r#"{"company": "Google"}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let input = SearchInput {
            location: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(input.location().is_none());
    }

    #[test]
    fn test_confidence_clamped() {
        let mut conn = GeneratedConnection { relevance_score: 140.0, ..Default::default() };
        assert_eq!(conn.confidence(), 100);
        conn.relevance_score = -3.0;
        assert_eq!(conn.confidence(), 0);
        conn.relevance_score = 84.6;
        assert_eq!(conn.confidence(), 85);
    }

    #[test]
    fn test_derived_links() {
        let conn = GeneratedConnection {
            name: "Aarav Sharma".to_string(),
            ..Default::default()
        }
        .with_derived_links();

        assert_eq!(conn.profile_url, "https://linkedin.com/in/aarav-sharma");
        assert_eq!(conn.linkedin_url.as_deref(), Some("https://linkedin.com/in/aarav-sharma"));
        assert!(conn.profile_image.contains("Aarav%20Sharma"));
    }

    #[test]
    fn test_synthesized_profile_uses_input() {
        let input = SearchInput {
            location: Some("Pune".to_string()),
            user_bio: "Backend dev".to_string(),
            ..Default::default()
        };
        let profile = UserProfile::synthesized(&input);
        assert_eq!(profile.location, "Pune");
        assert_eq!(profile.experience.as_deref(), Some("Backend dev"));
        assert_eq!(profile.full_name(), "User Profile");
    }
}
