// Core exports
pub mod display;
pub mod finder;
pub mod message;
pub mod pacing;
pub mod prompts;
pub mod repair;

pub use display::DisplayMetrics;
pub use finder::{ConnectionError, ConnectionFinder, FinderSettings, MessageSource};
pub use message::{fallback_message, follow_up_sequence, normalize_message};
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use repair::{parse_connections, repair_json, RepairError};
