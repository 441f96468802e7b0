use std::sync::Arc;

use tokio::sync::mpsc;

use crate::action::Action;
use crate::client::HistoryClient;
use crate::session::{fetch_payloads, LoadTicket};

#[derive(Debug)]
pub enum HistoryRequest {
    LoadHistory { ticket: LoadTicket },
}

#[derive(Clone)]
pub struct HistoryHandle {
    tx: mpsc::UnboundedSender<HistoryRequest>,
}

impl HistoryHandle {
    pub fn send(&self, request: HistoryRequest) {
        let _ = self.tx.send(request);
    }

    pub fn load(&self, ticket: LoadTicket) {
        self.send(HistoryRequest::LoadHistory { ticket });
    }
}

/// Runs upstream fetches off the caller's task. Holds no timeline state:
/// completions carry their ticket and the session decides whether they are
/// still wanted.
pub struct HistoryWorker {
    client: Arc<dyn HistoryClient>,
    rx: mpsc::UnboundedReceiver<HistoryRequest>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl HistoryWorker {
    pub fn new(
        client: Arc<dyn HistoryClient>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> (Self, HistoryHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = HistoryHandle { tx };
        let worker = Self {
            client,
            rx,
            action_tx,
        };
        (worker, handle)
    }

    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            let action = self.process(request).await;
            if self.action_tx.send(action).is_err() {
                break;
            }
        }
    }

    async fn process(&self, request: HistoryRequest) -> Action {
        match request {
            HistoryRequest::LoadHistory { ticket } => {
                match fetch_payloads(self.client.as_ref(), &ticket.customer_id).await {
                    Ok(payloads) => Action::HistoryLoaded {
                        ticket,
                        payloads: Box::new(payloads),
                    },
                    Err(e) => Action::HistoryFailed {
                        ticket,
                        error: e.to_string(),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use crate::labels::{AttributeCatalog, LabelCatalog};
    use crate::session::testing::client_for;
    use crate::session::{HistorySession, SessionError};

    fn session() -> HistorySession {
        HistorySession::new(
            LabelCatalog::default(),
            AttributeCatalog::default(),
            TimelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn worker_reports_loaded_history() {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let (worker, handle) = HistoryWorker::new(Arc::new(client_for("c-1")), action_tx);
        tokio::spawn(worker.run());

        let mut session = session();
        handle.load(session.begin_load("c-1"));

        let action = action_rx.recv().await.expect("action");
        assert!(matches!(action, Action::HistoryLoaded { .. }));
        session.apply(action).unwrap();
        assert_eq!(session.events().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn worker_reports_fetch_failure() {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let (worker, handle) = HistoryWorker::new(Arc::new(client_for("c-1")), action_tx);
        tokio::spawn(worker.run());

        let mut session = session();
        handle.load(session.begin_load("unknown"));

        let action = action_rx.recv().await.expect("action");
        assert!(matches!(action, Action::HistoryFailed { .. }));
        session.apply(action).unwrap();
        assert!(matches!(
            session.query(None).unwrap_err(),
            SessionError::LoadFailed(_)
        ));
    }

    #[tokio::test]
    async fn abandoned_load_cannot_overwrite_newer_one() {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let (worker, handle) = HistoryWorker::new(Arc::new(client_for("c-1")), action_tx);
        tokio::spawn(worker.run());

        let mut session = session();
        handle.load(session.begin_load("c-1"));
        handle.load(session.begin_load("unknown"));

        let first = action_rx.recv().await.expect("first action");
        assert!(matches!(
            session.apply(first),
            Err(SessionError::Stale { .. })
        ));
        assert!(session.state().is_loading());

        let second = action_rx.recv().await.expect("second action");
        session.apply(second).unwrap();
        assert!(matches!(
            session.events().unwrap_err(),
            SessionError::LoadFailed(_)
        ));
    }
}
