use regex::Regex;
use std::sync::OnceLock;

use crate::models::{GeneratedConnection, SearchInput, Tone, UserProfile};

/// Fixed prompt used by the diagnostic test-message endpoint
pub const TEST_MESSAGE_PROMPT: &str = "Write a short LinkedIn connection message to John Smith, \
a Software Engineer at Google. Keep it under 150 characters. Be professional and friendly.";

fn job_url_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"linkedin\.com/company/([^/?#]+)",
            r"indeed\.com.*?[?&]q=([^&]+)",
            r"glassdoor\.com/Overview/Working-at-([^-]+)",
            r"jobs\.([^./]+)\.com",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Best-effort company name from a job posting URL
pub fn extract_company_from_job_url(job_url: &str) -> Option<String> {
    job_url_patterns().iter().find_map(|pattern| {
        let raw = pattern.captures(job_url)?.get(1)?.as_str();
        let decoded = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        let company = decoded.replace(['-', '_', '+'], " ").trim().to_string();
        (!company.is_empty()).then_some(company)
    })
}

/// Bullet list describing what the user is searching for
pub fn search_context(input: &SearchInput) -> String {
    let mut lines = Vec::new();

    match (input.company(), input.role()) {
        (Some(company), Some(role)) => {
            lines.push(format!("- Target Company: {company}"));
            lines.push(format!("- Target Role: {role}"));
        }
        (Some(company), None) => lines.push(format!("- Target Company: {company}")),
        (None, Some(role)) => lines.push(format!("- Target Role/Industry: {role}")),
        (None, None) => {}
    }

    if let Some(location) = input.location() {
        lines.push(format!("- Location Preference: {location}"));
    }

    if let Some(job_url) = input.job_url() {
        lines.push(format!("- Job Posting URL: {job_url}"));
        if input.company().is_none() {
            if let Some(company) = extract_company_from_job_url(job_url) {
                lines.push(format!("- Hiring Company: {company}"));
            }
        }
        lines.push("- Generate connections relevant to this opportunity".to_string());
    }

    lines.push(format!("- User Bio Context: {}", input.user_bio.trim()));
    lines.push(format!("- Preferred Communication Tone: {}", input.tone));

    let mut context = lines.join("\n");
    context.push('\n');
    context
}

/// Prompt asking the model for `batch_size` candidates as a JSON object
pub fn candidate_prompt(input: &SearchInput, batch_size: usize) -> String {
    let company = input
        .company()
        .map(str::to_string)
        .or_else(|| input.job_url().and_then(extract_company_from_job_url))
        .unwrap_or_default();
    let role = input.role().unwrap_or_default();
    let location = input.location().unwrap_or_default();

    let search = [company.as_str(), role, location]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let focus = match (role, company.as_str()) {
        ("", "") => "the search context above".to_string(),
        ("", c) => format!("professionals at {c}"),
        (r, "") => r.to_string(),
        (r, c) => format!("{r} at {c}"),
    };

    format!(
        r#"Generate {batch_size} professional connections in JSON format.

Search: {search}

Context:
{context}
Return exactly this JSON structure:
{{
  "connections": [
    {{
      "name": "Indian Name",
      "title": "Job Title",
      "company": "Company Name",
      "location": "City, India",
      "headline": "Professional headline",
      "summary": "Brief summary",
      "skills": ["skill1", "skill2"],
      "interests": ["interest1", "interest2"],
      "connectionReason": "Why connect",
      "relevanceScore": 85
    }}
  ]
}}

Always end each connection with "relevanceScore" (0-100).
Generate {batch_size} unique Indian professionals related to: {focus}"#,
        context = search_context(input),
    )
}

/// Common ground between the sender and a candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedContext {
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub same_city: Option<String>,
    pub field_of_study: Option<String>,
}

fn overlaps(mine: &[String], theirs: &[String]) -> Vec<String> {
    mine.iter()
        .filter(|m| {
            let m = m.to_lowercase();
            !m.is_empty()
                && theirs.iter().any(|t| {
                    let t = t.to_lowercase();
                    !t.is_empty() && (t.contains(&m) || m.contains(&t))
                })
        })
        .cloned()
        .collect()
}

impl SharedContext {
    pub fn between(connection: &GeneratedConnection, profile: &UserProfile) -> Self {
        let city = connection.location.split(',').next().unwrap_or_default().trim();
        let same_city = (!city.is_empty()
            && profile.location.to_lowercase().contains(&city.to_lowercase()))
        .then(|| city.to_string());

        let field = profile.education.field_of_study.trim();
        let field_lower = field.to_lowercase();
        let field_of_study = (!field.is_empty()
            && (connection.headline.to_lowercase().contains(&field_lower)
                || connection.title.to_lowercase().contains(&field_lower)))
        .then(|| field.to_string());

        Self {
            skills: overlaps(&profile.skills, &connection.skills),
            interests: overlaps(&profile.interests, &connection.interests),
            same_city,
            field_of_study,
        }
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        if !self.skills.is_empty() {
            let top = self.skills.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
            out.push_str(&format!("\n- SHARED SKILLS: {top} - Use this as a connection point"));
        }
        if !self.interests.is_empty() {
            let top = self.interests.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
            out.push_str(&format!("\n- MUTUAL INTERESTS: {top} - Reference common ground"));
        }
        if let Some(city) = &self.same_city {
            out.push_str(&format!("\n- LOCATION: Both in {city} - Mention local connection"));
        }
        if let Some(field) = &self.field_of_study {
            out.push_str(&format!(
                "\n- EDUCATION: Similar background in {field} - Reference academic connection"
            ));
        }
        out
    }
}

fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "Write in a professional, respectful tone using proper business language",
        Tone::Casual => "Write in a friendly, conversational tone as if messaging a colleague",
        Tone::Enthusiastic => "Write with genuine energy and enthusiasm while remaining professional",
        Tone::Direct => "Write concisely and get straight to the point while staying polite",
    }
}

/// Prompt for one personalized connection message
pub fn message_prompt(
    connection: &GeneratedConnection,
    profile: &UserProfile,
    tone: Tone,
    max_chars: usize,
) -> String {
    let shared = SharedContext::between(connection, profile).describe();
    let skills = profile.skills.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    let common_ground = if shared.is_empty() {
        String::new()
    } else {
        format!("\nCommon ground:{shared}\n")
    };

    format!(
        r#"Write a personalized LinkedIn connection message under {max_chars} characters.

About the person you're messaging:
- Name: {name}
- Title: {title} at {company}
- Location: {location}

About you (the sender):
- Name: {sender}
- Background: {degree} in {field}
- Skills: {skills}
{common_ground}
Write a {tone} message that:
1. Mentions their specific role or company
2. Shows genuine interest in connecting
3. Is under {max_chars} characters
4. Sounds natural and professional
{instruction}.

Example format: "Hi [Name], I'm interested in [specific aspect of their work]. I'd love to connect and learn more about [relevant topic]. Best regards!"

Write only the message, no quotes or extra text:"#,
        name = connection.name,
        title = connection.title,
        company = connection.company,
        location = connection.location,
        sender = profile.full_name(),
        degree = profile.education.degree,
        field = profile.education.field_of_study,
        instruction = tone_instruction(tone),
    )
}
