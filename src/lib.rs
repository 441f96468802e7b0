pub mod action;
pub mod client;
pub mod config;
pub mod domain;
pub mod format;
pub mod group;
pub mod labels;
pub mod normalize;
pub mod search;
pub mod session;
pub mod timeline;
pub mod worker;

pub use domain::{Event, EventKind};
pub use group::{group, OrderedGroups};
pub use search::{search, FuzzyIndex, QueryPlan, SearchIndex};
pub use session::{HistorySession, LoadTicket, SessionError};
pub use timeline::merge;
