use crate::domain::HistoryPayloads;
use crate::session::LoadTicket;

/// Completions reported by the worker back to the session owner.
#[derive(Debug, Clone)]
pub enum Action {
    HistoryLoaded {
        ticket: LoadTicket,
        payloads: Box<HistoryPayloads>,
    },
    HistoryFailed {
        ticket: LoadTicket,
        error: String,
    },
}

impl Action {
    pub fn ticket(&self) -> &LoadTicket {
        match self {
            Self::HistoryLoaded { ticket, .. } | Self::HistoryFailed { ticket, .. } => ticket,
        }
    }
}
