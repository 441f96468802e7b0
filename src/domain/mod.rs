pub mod event;
pub mod record;

pub use event::*;
pub use record::*;
