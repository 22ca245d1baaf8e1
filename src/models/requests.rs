use serde::{Deserialize, Serialize};
use crate::models::domain::{SearchInput, UserProfile};

/// Request to generate AI connections
///
/// `searchInput` is optional at the serde level so a missing value can be
/// reported as a 400 with a readable message instead of a payload error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsRequest {
    #[serde(rename = "searchInput", default)]
    pub search_input: Option<SearchInput>,
    #[serde(rename = "userProfile", default)]
    pub user_profile: Option<UserProfile>,
    #[serde(rename = "generateMessages", default = "default_true")]
    pub generate_messages: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_messages_defaults_to_true() {
        let req: ConnectionsRequest =
            serde_json::from_str(r#"{"searchInput": {"userBio": "hi"}}"#).unwrap();
        assert!(req.generate_messages);
        assert!(req.user_profile.is_none());
    }

    #[test]
    fn test_missing_search_input() {
        let req: ConnectionsRequest = serde_json::from_str(r#"{"generateMessages": false}"#).unwrap();
        assert!(req.search_input.is_none());
        assert!(!req.generate_messages);
    }
}
