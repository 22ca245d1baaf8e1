// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Education, GeneratedConnection, PersonResult, SearchInput, SocialLinks, Tone, UserProfile};
pub use requests::ConnectionsRequest;
pub use responses::{ConnectionsMetadata, ConnectionsResponse, ErrorResponse, HealthResponse, TestMessageResponse};
