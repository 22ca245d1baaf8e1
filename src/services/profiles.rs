use crate::models::{Education, SocialLinks, UserProfile};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the profile store
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,
}

/// Table names in the hosted store
#[derive(Debug, Clone)]
pub struct ProfileTables {
    pub profiles: String,
    pub education: String,
    pub skills: String,
    pub interests: String,
}

impl Default for ProfileTables {
    fn default() -> Self {
        Self {
            profiles: "user_profiles".to_string(),
            education: "user_education".to_string(),
            skills: "user_skills".to_string(),
            interests: "user_interests".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    age: Option<u8>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    linkedin: Option<String>,
    #[serde(default)]
    github: Option<String>,
    #[serde(default)]
    portfolio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EducationRow {
    #[serde(default)]
    degree: Option<String>,
    #[serde(default)]
    institution: Option<String>,
    #[serde(default)]
    field_of_study: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SkillRow {
    skill_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct InterestRow {
    domain: String,
}

/// Read-only client for profile rows in Supabase (PostgREST)
///
/// Reads, keyed by user id:
/// - the profile row
/// - the education row
/// - skill and interest rows
pub struct ProfileStore {
    base_url: String,
    api_key: String,
    client: Client,
    tables: ProfileTables,
}

impl ProfileStore {
    /// Create a new profile store client
    pub fn new(base_url: String, api_key: String, tables: ProfileTables) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
            tables,
        }
    }

    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        user_id: &str,
    ) -> Result<Vec<T>, ProfileStoreError> {
        let url = format!(
            "{}/rest/v1/{}?user_id=eq.{}&select=*",
            self.base_url.trim_end_matches('/'),
            table,
            urlencoding::encode(user_id)
        );

        tracing::debug!("Fetching {} rows for user: {}", table, user_id);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProfileStoreError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to fetch {} for {}: {} - {}", table, user_id, status, body);
            return Err(ProfileStoreError::ApiError(format!(
                "Failed to fetch {}: {}",
                table, status
            )));
        }

        Ok(response.json().await?)
    }

    /// Assemble a full user profile from the profile, education, skill and interest rows.
    ///
    /// Only a missing profile row is an error; absent education, skills or
    /// interests leave those fields empty.
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileStoreError> {
        let profile: ProfileRow = self
            .select_rows(&self.tables.profiles, user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProfileStoreError::NotFound(format!("Profile not found for user {}", user_id)))?;

        let education = match self.select_rows::<EducationRow>(&self.tables.education, user_id).await {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                tracing::warn!("Failed to fetch education for {}: {}", user_id, e);
                None
            }
        };

        let skills = match self.select_rows::<SkillRow>(&self.tables.skills, user_id).await {
            Ok(rows) => rows.into_iter().map(|r| r.skill_name).collect(),
            Err(e) => {
                tracing::warn!("Failed to fetch skills for {}: {}", user_id, e);
                vec![]
            }
        };

        let interests = match self.select_rows::<InterestRow>(&self.tables.interests, user_id).await {
            Ok(rows) => rows.into_iter().map(|r| r.domain).collect(),
            Err(e) => {
                tracing::warn!("Failed to fetch interests for {}: {}", user_id, e);
                vec![]
            }
        };

        Ok(assemble_profile(profile, education, skills, interests))
    }
}

fn assemble_profile(
    profile: ProfileRow,
    education: Option<EducationRow>,
    skills: Vec<String>,
    interests: Vec<String>,
) -> UserProfile {
    let location = [profile.city, profile.country]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let education = education
        .map(|e| Education {
            degree: e.degree.unwrap_or_default(),
            institution: e.institution.unwrap_or_default(),
            field_of_study: e.field_of_study.unwrap_or_default(),
        })
        .unwrap_or_default();

    UserProfile {
        first_name: profile.first_name.unwrap_or_default(),
        last_name: profile.last_name.unwrap_or_default(),
        age: profile.age.unwrap_or_default(),
        location,
        education,
        skills,
        interests,
        experience: None,
        social_links: SocialLinks {
            linkedin: profile.linkedin,
            github: profile.github,
            portfolio: profile.portfolio,
        },
    }
}
