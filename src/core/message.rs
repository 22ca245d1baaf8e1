use crate::core::prompts::SharedContext;
use crate::models::{GeneratedConnection, Tone, UserProfile};

/// Default upper bound on message length, in characters
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 300;

/// Smallest configurable limit that still leaves room for text before the ellipsis
pub const MIN_MESSAGE_CHARS: usize = 4;

const ELLIPSIS: &str = "...";

/// Clean model output into a single-line message.
///
/// Strips wrapping quotes, folds newlines and runs of whitespace into single
/// spaces and truncates to `max_chars` characters. Returns `None` when
/// nothing usable is left.
pub fn normalize_message(raw: &str, max_chars: usize) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let quotes: &[char] = &['"', '\'', '\u{201c}', '\u{201d}'];
    let unquoted = collapsed.trim_matches(quotes).trim();

    if unquoted.is_empty() {
        return None;
    }

    let char_count = unquoted.chars().count();
    if char_count <= max_chars {
        return Some(unquoted.to_string());
    }

    if max_chars <= ELLIPSIS.len() {
        let cut: String = unquoted.chars().take(max_chars).collect();
        return (!cut.is_empty()).then_some(cut);
    }

    let keep = max_chars - ELLIPSIS.len();
    let mut truncated: String = unquoted.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    Some(truncated)
}

fn first_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Deterministic message used whenever AI generation is skipped or fails
pub fn fallback_message(connection: &GeneratedConnection, profile: &UserProfile, tone: Tone) -> String {
    let first_name = first_or(connection.first_name(), "there");
    let title = first_or(&connection.title, "professional");
    let company = first_or(&connection.company, "your company");
    let shared = SharedContext::between(connection, profile);

    match tone {
        Tone::Enthusiastic => match shared.skills.first() {
            Some(skill) => format!(
                "Hi {first_name}! I'm excited to connect with another {skill} professional. \
                 Your work at {company} looks fascinating! Let's network and share insights."
            ),
            None => format!(
                "Hi {first_name}! I'm impressed by your work as {title} at {company}. \
                 Would love to connect and learn from your experience in the industry!"
            ),
        },
        Tone::Casual => match shared.interests.first() {
            Some(interest) => format!(
                "Hey {first_name}, I noticed we both share an interest in {interest}. \
                 Would be great to connect and exchange ideas about {title} work!"
            ),
            None => format!(
                "Hi {first_name}, your profile caught my attention. \
                 Would love to connect and learn more about your experience at {company}."
            ),
        },
        Tone::Direct => format!(
            "Hello {first_name}, I'm reaching out because of your role as {title} at {company}. \
             I'd like to connect and hear your advice on this field."
        ),
        Tone::Formal => match shared.skills.first() {
            Some(skill) => format!(
                "Hello {first_name}, I'd like to connect as we both work with {skill}. \
                 I'm interested in learning from your experience at {company}."
            ),
            None => format!(
                "Hello {first_name}, I would like to connect to learn more about your role as \
                 {title} at {company}. Looking forward to networking with you."
            ),
        },
    }
}

/// Three follow-up messages to send after the connection is accepted
pub fn follow_up_sequence(connection: &GeneratedConnection, tone: Tone) -> Vec<String> {
    let name = first_or(&connection.name, "there");
    let company = first_or(&connection.company, "your company");

    let sequence = match tone {
        Tone::Casual => [
            format!("Thanks for connecting! Would love to chat about your experience at {company}."),
            "Hope you're having a great week! Wanted to follow up and see if you'd be open to a quick coffee chat.".to_string(),
            "Just checking in - would love to learn more about what you're working on these days.".to_string(),
        ],
        Tone::Enthusiastic => [
            format!("So excited to connect! Your work at {company} sounds fascinating!"),
            "Hope you're crushing it! Would love to hear about your latest projects and see how we might collaborate.".to_string(),
            "Your background is incredible! I'd be thrilled to learn from your experience and share ideas.".to_string(),
        ],
        Tone::Direct => [
            format!("Thanks for connecting, {name}. Could we set up a 15-minute call about {company}?"),
            "Following up on my earlier note. Is there a good time this week for a short call?".to_string(),
            "Last follow-up from me. If a call doesn't work, a few lines of advice by message would help a lot.".to_string(),
        ],
        Tone::Formal => [
            format!("Thank you for connecting, {name}. I'd love to learn more about your work at {company}."),
            "I hope you're doing well. I wanted to follow up on our connection and explore potential collaboration opportunities.".to_string(),
            "I'd appreciate the chance to discuss how we might support each other's professional goals.".to_string(),
        ],
    };

    sequence.into()
}
