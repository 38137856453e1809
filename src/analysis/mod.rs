pub mod activity;
pub mod allowlist;
pub mod blocklist;
pub mod temporal;

pub use activity::{classify, cognitive_status, ActivityEntry, ActivityStatus, Category, CognitiveStatus};
pub use allowlist::is_trusted_domain;
pub use blocklist::is_blocked;
pub use temporal::adjust_temporal_risk;
