use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;

use crate::core::display::{self, DisplayMetrics};
use crate::core::message::{fallback_message, follow_up_sequence, normalize_message, DEFAULT_MAX_MESSAGE_CHARS};
use crate::core::pacing::{FixedDelay, Pacer};
use crate::core::prompts::{candidate_prompt, message_prompt, TEST_MESSAGE_PROMPT};
use crate::core::repair::{parse_connections, RepairError};
use crate::models::{GeneratedConnection, PersonResult, SearchInput, Tone, UserProfile};
use crate::services::{GenerationError, GenerationRequest, TextGenerator};

/// Largest batch the model is asked for
pub const MAX_BATCH_SIZE: usize = 18;

pub const QUOTA_MESSAGE: &str =
    "AI service quota exceeded. Please try again in a few minutes or upgrade your plan.";
pub const UNAVAILABLE_MESSAGE: &str = "AI service is currently unavailable. Please try again later.";
pub const EMPTY_RESULT_MESSAGE: &str =
    "AI generated empty response. Please try again or modify your search criteria.";

/// Request-level failures. Per-candidate message failures never surface here.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("AI service configuration error: {0}")]
    Configuration(String),

    #[error("{}", EMPTY_RESULT_MESSAGE)]
    EmptyResult,

    #[error("Malformed AI response: {0}")]
    MalformedResponse(#[from] RepairError),

    #[error("{}", QUOTA_MESSAGE)]
    QuotaExceeded(#[source] GenerationError),

    #[error("AI service unavailable: {0}")]
    Unavailable(#[source] GenerationError),
}

impl ConnectionError {
    /// Text safe to show the end user
    pub fn user_message(&self) -> String {
        match self {
            ConnectionError::Configuration(_) => self.to_string(),
            ConnectionError::EmptyResult => EMPTY_RESULT_MESSAGE.to_string(),
            ConnectionError::QuotaExceeded(_) => QUOTA_MESSAGE.to_string(),
            ConnectionError::MalformedResponse(_) | ConnectionError::Unavailable(_) => {
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

impl From<GenerationError> for ConnectionError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::MissingApiKey => ConnectionError::Configuration(
                "Gemini API key not configured. Please set GEMINI_API_KEY in your environment variables."
                    .to_string(),
            ),
            GenerationError::Unauthorized => {
                ConnectionError::Configuration("Please check your API key.".to_string())
            }
            GenerationError::EmptyResponse => ConnectionError::EmptyResult,
            err if err.is_quota() => ConnectionError::QuotaExceeded(err),
            err => ConnectionError::Unavailable(err),
        }
    }
}

/// Tunables for one finder instance
#[derive(Debug, Clone)]
pub struct FinderSettings {
    pub batch_size: usize,
    pub message_delay_ms: u64,
    pub max_message_chars: usize,
    pub candidate_temperature: f32,
    pub candidate_max_tokens: u32,
    pub message_temperature: f32,
    pub message_max_tokens: u32,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            message_delay_ms: 2000,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            candidate_temperature: 0.7,
            candidate_max_tokens: 2000,
            message_temperature: 0.8,
            message_max_tokens: 200,
        }
    }
}

impl FinderSettings {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}

/// Where a candidate's message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Generated,
    Fallback,
}

/// Connection generation orchestrator
///
/// # Pipeline
/// 1. Candidate generation (one JSON-mode call, repaired and parsed)
/// 2. Sequential, paced message generation with template fallback
/// 3. Display-only decoration
pub struct ConnectionFinder {
    generator: Arc<dyn TextGenerator>,
    pacer: Arc<dyn Pacer>,
    settings: FinderSettings,
    seed: Option<u64>,
}

impl ConnectionFinder {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: FinderSettings) -> Self {
        let pacer = Arc::new(FixedDelay::from_millis(settings.message_delay_ms));
        Self {
            generator,
            pacer,
            settings,
            seed: None,
        }
    }

    /// Replace the delay strategy between message calls
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Make display-only decorations reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn settings(&self) -> &FinderSettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    fn ensure_configured(&self) -> Result<(), ConnectionError> {
        if self.generator.is_configured() {
            Ok(())
        } else {
            Err(GenerationError::MissingApiKey.into())
        }
    }

    /// Generate candidates and attach a message to each.
    ///
    /// With `generate_messages` off no message calls are made and every
    /// candidate gets its fallback message.
    pub async fn find_connections(
        &self,
        input: &SearchInput,
        profile: &UserProfile,
        generate_messages: bool,
    ) -> Result<Vec<PersonResult>, ConnectionError> {
        self.ensure_configured()?;

        let candidates = self.generate_candidates(input).await?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut people: Vec<PersonResult> = candidates
            .iter()
            .map(|candidate| decorate(&mut rng, candidate, input, profile))
            .collect();

        if generate_messages {
            tracing::info!("Generating personalized messages for {} connections", people.len());
        }

        let mut fallbacks = 0;
        for (index, (person, candidate)) in people.iter_mut().zip(&candidates).enumerate() {
            let (message, source) = if generate_messages {
                tracing::debug!(
                    "Generating message for {} ({}/{})",
                    candidate.name,
                    index + 1,
                    candidates.len()
                );
                self.pacer.pause(index).await;
                self.personalized_message(candidate, profile, input.tone).await
            } else {
                (fallback_message(candidate, profile, input.tone), MessageSource::Fallback)
            };

            if source == MessageSource::Fallback {
                fallbacks += 1;
            }
            person.message = message;
        }

        tracing::info!(
            "Processed {} connections with messages ({} from templates)",
            people.len(),
            fallbacks
        );

        Ok(people)
    }

    /// Ask the model for candidates and parse its output
    pub async fn generate_candidates(
        &self,
        input: &SearchInput,
    ) -> Result<Vec<GeneratedConnection>, ConnectionError> {
        self.ensure_configured()?;

        let batch_size = self.settings.effective_batch_size();
        let request = GenerationRequest::json(candidate_prompt(input, batch_size))
            .with_temperature(self.settings.candidate_temperature)
            .with_max_output_tokens(self.settings.candidate_max_tokens);

        tracing::info!(
            "Requesting {} AI connections (company: {:?}, role: {:?})",
            batch_size,
            input.company(),
            input.role()
        );

        let raw = self.generator.generate(&request).await.map_err(|e| {
            tracing::error!("Candidate generation failed: {}", e);
            ConnectionError::from(e)
        })?;

        if raw.trim().is_empty() {
            return Err(ConnectionError::EmptyResult);
        }

        let parsed = parse_connections(&raw).map_err(|e| {
            tracing::error!(
                "Failed to parse AI response: {} (snippet: {:?})",
                e,
                e.snippet().unwrap_or(&raw)
            );
            ConnectionError::from(e)
        })?;

        let mut connections = match parsed {
            Some(connections) if !connections.is_empty() => connections,
            _ => {
                tracing::warn!("AI response contained no connections");
                return Err(ConnectionError::EmptyResult);
            }
        };

        if connections.len() > batch_size {
            tracing::debug!("Dropping {} connections beyond batch size", connections.len() - batch_size);
            connections.truncate(batch_size);
        }

        tracing::info!("Generated {} connections via AI", connections.len());

        Ok(connections
            .into_iter()
            .map(GeneratedConnection::with_derived_links)
            .collect())
    }

    /// Message for one candidate. Never fails: any problem yields the fallback template.
    pub async fn personalized_message(
        &self,
        connection: &GeneratedConnection,
        profile: &UserProfile,
        tone: Tone,
    ) -> (String, MessageSource) {
        let max_chars = self.settings.max_message_chars;
        let request = GenerationRequest::text(message_prompt(connection, profile, tone, max_chars))
            .with_temperature(self.settings.message_temperature)
            .with_max_output_tokens(self.settings.message_max_tokens);

        match self.generator.generate(&request).await {
            Ok(raw) => match normalize_message(&raw, max_chars) {
                Some(message) => (message, MessageSource::Generated),
                None => {
                    tracing::warn!("Message for {} was empty after cleaning, using fallback", connection.name);
                    (fallback_message(connection, profile, tone), MessageSource::Fallback)
                }
            },
            Err(e) => {
                if e.is_quota() {
                    tracing::warn!("Quota exceeded while generating message for {}, using fallback", connection.name);
                } else {
                    tracing::warn!("Failed to generate message for {}: {}, using fallback", connection.name, e);
                }
                (fallback_message(connection, profile, tone), MessageSource::Fallback)
            }
        }
    }

    /// Send a fixed short prompt through the generator
    pub async fn test_message(&self) -> Result<String, ConnectionError> {
        self.ensure_configured()?;

        let raw = self
            .generator
            .generate(&GenerationRequest::text(TEST_MESSAGE_PROMPT))
            .await?;

        normalize_message(&raw, self.settings.max_message_chars).ok_or(ConnectionError::EmptyResult)
    }
}

fn decorate(
    rng: &mut StdRng,
    connection: &GeneratedConnection,
    input: &SearchInput,
    profile: &UserProfile,
) -> PersonResult {
    let metrics = DisplayMetrics::generate(rng, connection);
    let confidence = connection.confidence();

    PersonResult {
        name: connection.name.clone(),
        title: connection.title.clone(),
        company: connection.company.clone(),
        location: connection.location.clone(),
        profile_url: connection.profile_url.clone(),
        profile_image: connection.profile_image.clone(),
        email: connection.email.clone(),
        linkedin_url: connection.linkedin_url.clone(),
        headline: connection.headline.clone(),
        summary: connection.summary.clone(),
        experience: connection.experience.clone(),
        education: connection.education.clone(),
        skills: connection.skills.clone(),
        interests: connection.interests.clone(),
        connection_reason: connection.connection_reason.clone(),
        message: String::new(),
        confidence,
        connection_strength: confidence,
        mutual_connections: metrics.mutual_connections,
        response_rate: metrics.response_rate,
        last_active: metrics.last_active,
        recent_activity: metrics.recent_activity,
        is_alumni: display::is_alumni(rng, connection, profile),
        follow_up_sequence: if input.include_follow_ups {
            follow_up_sequence(connection, input.tone)
        } else {
            vec![]
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pacing::NoDelay;
    use async_trait::async_trait;
    use crate::services::ResponseFormat;

    /// Returns `candidates` for JSON calls and `message` for text calls
    struct FixedGenerator {
        candidates: String,
        message: Result<String, ()>,
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            match request.format {
                ResponseFormat::Json => Ok(self.candidates.clone()),
                ResponseFormat::Text => self
                    .message
                    .clone()
                    .map_err(|_| GenerationError::ApiError("boom".to_string())),
            }
        }
    }

    fn finder(generator: FixedGenerator) -> ConnectionFinder {
        ConnectionFinder::new(Arc::new(generator), FinderSettings::default())
            .with_pacer(Arc::new(NoDelay))
            .with_seed(1)
    }

    fn input() -> SearchInput {
        SearchInput {
            company: Some("Google".to_string()),
            role: Some("Software Engineer".to_string()),
            user_bio: "bio".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_messages_fall_back_on_error() {
        let finder = finder(FixedGenerator {
            candidates: r#"{"connections": [{"name": "A B", "company": "X", "relevanceScore": 50}]}"#.to_string(),
            message: Err(()),
        });

        let people = finder.find_connections(&input(), &UserProfile::default(), true).await.unwrap();
        assert_eq!(people.len(), 1);
        assert!(people[0].message.starts_with("Hello A,"));
    }

    #[tokio::test]
    async fn test_batch_size_truncates() {
        let many = (0..5)
            .map(|i| format!(r#"{{"name": "P{i}", "relevanceScore": 60}}"#))
            .collect::<Vec<_>>()
            .join(",");
        let finder = finder(FixedGenerator {
            candidates: format!(r#"{{"connections": [{many}]}}"#),
            message: Ok("Hi!".to_string()),
        });

        let candidates = finder.generate_candidates(&input()).await.unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[tokio::test]
    async fn test_follow_ups_only_when_requested() {
        let finder = finder(FixedGenerator {
            candidates: r#"{"connections": [{"name": "A B", "relevanceScore": 50}]}"#.to_string(),
            message: Ok("Hi!".to_string()),
        });

        let mut search = input();
        let people = finder.find_connections(&search, &UserProfile::default(), false).await.unwrap();
        assert!(people[0].follow_up_sequence.is_empty());

        search.include_follow_ups = true;
        let people = finder.find_connections(&search, &UserProfile::default(), false).await.unwrap();
        assert_eq!(people[0].follow_up_sequence.len(), 3);
    }

    #[tokio::test]
    async fn test_message_source() {
        let connection = GeneratedConnection {
            name: "Priya Iyer".to_string(),
            ..Default::default()
        };
        let profile = UserProfile::default();

        let failing = finder(FixedGenerator {
            candidates: String::new(),
            message: Err(()),
        });
        let (message, source) = failing.personalized_message(&connection, &profile, Tone::Formal).await;
        assert_eq!(source, MessageSource::Fallback);
        assert!(message.starts_with("Hello Priya,"));

        let blank = finder(FixedGenerator {
            candidates: String::new(),
            message: Ok("  \"\"  ".to_string()),
        });
        let (_, source) = blank.personalized_message(&connection, &profile, Tone::Casual).await;
        assert_eq!(source, MessageSource::Fallback);

        let working = finder(FixedGenerator {
            candidates: String::new(),
            message: Ok("\"Hi Priya!\"".to_string()),
        });
        let (message, source) = working.personalized_message(&connection, &profile, Tone::Casual).await;
        assert_eq!(source, MessageSource::Generated);
        assert_eq!(message, "Hi Priya!");
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            ConnectionError::from(GenerationError::MissingApiKey),
            ConnectionError::Configuration(_)
        ));
        assert!(matches!(
            ConnectionError::from(GenerationError::ApiError("quota exceeded".to_string())),
            ConnectionError::QuotaExceeded(_)
        ));
        assert!(matches!(
            ConnectionError::from(GenerationError::ApiError("500".to_string())),
            ConnectionError::Unavailable(_)
        ));
        assert_eq!(
            ConnectionError::MalformedResponse(RepairError::NoJsonObject).user_message(),
            UNAVAILABLE_MESSAGE
        );
    }

    #[test]
    fn test_batch_size_clamped() {
        let mut settings = FinderSettings::default();
        settings.batch_size = 0;
        assert_eq!(settings.effective_batch_size(), 1);
        settings.batch_size = 50;
        assert_eq!(settings.effective_batch_size(), MAX_BATCH_SIZE);
    }
}
