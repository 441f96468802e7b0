use thiserror::Error;
use uuid::Uuid;

use crate::action::Action;
use crate::client::{ClientError, HistoryClient};
use crate::config::TimelineConfig;
use crate::domain::*;
use crate::group::{group, OrderedGroups};
use crate::labels::{AttributeCatalog, LabelCatalog};
use crate::normalize::{NormalizeReport, Normalizer};
use crate::search::{self, FuzzyIndex, SearchIndex};
use crate::timeline::merge_sources;

/// Fetch failure for a whole load. Either source failing fails the load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to load history: {0}")]
    Fetch(#[from] ClientError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no history loaded")]
    NotLoaded,
    #[error("history is still loading")]
    Loading,
    #[error("history load failed: {0}")]
    LoadFailed(String),
    #[error("load {ticket} superseded by load {current}")]
    Stale {
        ticket: Generation,
        current: Generation,
    },
}

/// Load counter. Every new load, and closing the panel, moves it forward;
/// completions from older generations are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issued by [`HistorySession::begin_load`]; must accompany the completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub session: Uuid,
    pub generation: Generation,
    pub customer_id: String,
}

#[derive(Debug, Clone)]
pub enum LoadState<T> {
    NotLoaded,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// One customer's merged timeline and the index built over it.
#[derive(Debug)]
pub struct LoadedTimeline<I> {
    pub customer_id: String,
    pub events: Vec<Event>,
    pub index: I,
    pub report: NormalizeReport,
}

/// State of one history panel: at most one load is current at a time.
pub struct HistorySession<I: SearchIndex = FuzzyIndex> {
    id: Uuid,
    generation: Generation,
    state: LoadState<LoadedTimeline<I>>,
    labels: LabelCatalog,
    attributes: AttributeCatalog,
    config: TimelineConfig,
}

impl<I: SearchIndex> HistorySession<I> {
    pub fn new(labels: LabelCatalog, attributes: AttributeCatalog, config: TimelineConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: Generation::default(),
            state: LoadState::NotLoaded,
            labels,
            attributes,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> &LoadState<LoadedTimeline<I>> {
        &self.state
    }

    pub fn labels(&self) -> &LabelCatalog {
        &self.labels
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Start a new load, dropping the current timeline and index. Any
    /// earlier ticket becomes stale.
    pub fn begin_load(&mut self, customer_id: &str) -> LoadTicket {
        self.generation = self.generation.next();
        self.state = LoadState::Loading;
        tracing::info!(session = %self.id, generation = %self.generation, customer_id, "loading history");
        LoadTicket {
            session: self.id,
            generation: self.generation,
            customer_id: customer_id.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.session == self.id && ticket.generation == self.generation
    }

    fn check_current(&self, ticket: &LoadTicket) -> Result<(), SessionError> {
        if self.is_current(ticket) {
            return Ok(());
        }
        tracing::warn!(
            session = %self.id,
            ticket = %ticket.generation,
            current = %self.generation,
            "discarding stale history completion"
        );
        Err(SessionError::Stale {
            ticket: ticket.generation,
            current: self.generation,
        })
    }

    /// Normalize, merge and index fetched payloads for `ticket`'s load.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        payloads: &HistoryPayloads,
    ) -> Result<&[Event], SessionError> {
        self.check_current(ticket)?;

        let normalizer = Normalizer::new(&self.labels, &self.attributes, self.config.labeler);
        let sources = normalizer.normalize_all(payloads);
        let report = sources.report;
        let events = merge_sources(sources);
        let index = I::build(&events, &self.config.search);
        tracing::info!(
            session = %self.id,
            generation = %self.generation,
            events = events.len(),
            rejected = report.total_rejected(),
            "history loaded"
        );

        self.state = LoadState::Loaded(LoadedTimeline {
            customer_id: ticket.customer_id.clone(),
            events,
            index,
            report,
        });
        self.events()
    }

    /// Record a failed fetch. No timeline or index survives it.
    pub fn fail_load(&mut self, ticket: &LoadTicket, error: &str) -> Result<(), SessionError> {
        self.check_current(ticket)?;
        tracing::error!(session = %self.id, generation = %self.generation, "{}", error);
        self.state = LoadState::Error(error.to_string());
        Ok(())
    }

    /// Apply a worker completion.
    pub fn apply(&mut self, action: Action) -> Result<(), SessionError> {
        match action {
            Action::HistoryLoaded { ticket, payloads } => {
                self.complete_load(&ticket, &payloads).map(|_| ())
            }
            Action::HistoryFailed { ticket, error } => self.fail_load(&ticket, &error),
        }
    }

    /// Fetch both sources concurrently and load them.
    pub async fn load_history(
        &mut self,
        client: &dyn HistoryClient,
        customer_id: &str,
    ) -> Result<&[Event], SessionError> {
        let ticket = self.begin_load(customer_id);
        match fetch_payloads(client, customer_id).await {
            Ok(payloads) => self.complete_load(&ticket, &payloads),
            Err(e) => {
                let message = e.to_string();
                self.fail_load(&ticket, &message)?;
                Err(SessionError::LoadFailed(message))
            }
        }
    }

    /// Drop the timeline; pending loads become stale.
    pub fn close(&mut self) {
        self.generation = self.generation.next();
        self.state = LoadState::NotLoaded;
        tracing::debug!(session = %self.id, generation = %self.generation, "history closed");
    }

    fn loaded(&self) -> Result<&LoadedTimeline<I>, SessionError> {
        match &self.state {
            LoadState::Loaded(timeline) => Ok(timeline),
            LoadState::NotLoaded => Err(SessionError::NotLoaded),
            LoadState::Loading => Err(SessionError::Loading),
            LoadState::Error(e) => Err(SessionError::LoadFailed(e.clone())),
        }
    }

    /// The full merged timeline, newest first.
    pub fn events(&self) -> Result<&[Event], SessionError> {
        self.loaded().map(|t| t.events.as_slice())
    }

    pub fn report(&self) -> Result<NormalizeReport, SessionError> {
        self.loaded().map(|t| t.report)
    }

    /// Filter the current timeline. A blank or absent query returns all of it.
    pub fn query(&self, text: Option<&str>) -> Result<Vec<&Event>, SessionError> {
        let timeline = self.loaded()?;
        Ok(search::search(&timeline.events, &timeline.index, text))
    }

    pub fn group_for_display<'a>(
        &self,
        events: impl IntoIterator<Item = &'a Event>,
    ) -> OrderedGroups<'a> {
        group(events, &self.config.labeler)
    }
}

/// Fetch history and tasks together; both must succeed.
pub async fn fetch_payloads(
    client: &dyn HistoryClient,
    customer_id: &str,
) -> Result<HistoryPayloads, LoadError> {
    let (identity, tasks) = futures::future::try_join(
        client.fetch_identity_history(customer_id),
        client.fetch_identity_tasks(customer_id),
    )
    .await?;
    Ok(HistoryPayloads { identity, tasks })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::client::{ClientError, ClientResult, HistoryClient};
    use crate::domain::*;

    /// In-memory client keyed by customer id.
    #[derive(Default)]
    pub struct StaticClient {
        pub histories: HashMap<String, IdentityHistory>,
        pub tasks: HashMap<String, Vec<IdentityTask>>,
        pub failing_tasks: bool,
    }

    #[async_trait]
    impl HistoryClient for StaticClient {
        async fn fetch_identity_history(&self, customer_id: &str) -> ClientResult<IdentityHistory> {
            self.histories
                .get(customer_id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(customer_id.to_string()))
        }

        async fn fetch_identity_tasks(&self, customer_id: &str) -> ClientResult<Vec<IdentityTask>> {
            if self.failing_tasks {
                return Err(ClientError::Status {
                    status: 500,
                    url: format!("identity/{}/tasks", customer_id),
                });
            }
            Ok(self.tasks.get(customer_id).cloned().unwrap_or_default())
        }
    }

    /// Two identity changes, one attribute change and one task change, all at
    /// distinct timestamps.
    pub fn payloads() -> HistoryPayloads {
        let identity = serde_json::from_value(json!({
            "identity_changes": [
                {"change_type": "CREATE", "change_status": "SUCCESS",
                 "author": {"author_name": "alice"}, "modification_date": "1700000000000"},
                {"change_type": "UPDATE", "change_status": "SUCCESS",
                 "author": {"author_name": "bob"}, "change_message": "declared moved",
                 "modification_date": "1700000300000"}
            ],
            "attribute_histories": [{
                "attribute_key": "email",
                "attribute_changes": [
                    {"attribute_value": "alice@example.com", "modification_date": "1700000200000"}
                ]
            }]
        }))
        .unwrap();
        let tasks = serde_json::from_value(json!([{
            "task_type": "ACCOUNT_CREATION",
            "task_code": "TK-403",
            "metadata": {"email": "alice@example.com"},
            "task_history": [
                {"task_change_type": "CREATE", "task_status": "TODO",
                 "task_change_date": "1700000100000"}
            ]
        }]))
        .unwrap();
        HistoryPayloads { identity, tasks }
    }

    pub fn client_for(customer_id: &str) -> StaticClient {
        let payloads = payloads();
        let mut client = StaticClient::default();
        client
            .histories
            .insert(customer_id.to_string(), payloads.identity);
        client.tasks.insert(customer_id.to_string(), payloads.tasks);
        client
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn session() -> HistorySession {
        HistorySession::new(
            LabelCatalog::default(),
            AttributeCatalog::default(),
            TimelineConfig::default(),
        )
    }

    #[test]
    fn query_before_load_is_rejected() {
        let session = session();
        assert_eq!(session.query(None).unwrap_err(), SessionError::NotLoaded);
    }

    #[test]
    fn scenario_four_distinct_events() {
        let mut session = session();
        let ticket = session.begin_load("c-1");
        assert!(session.state().is_loading());
        assert_eq!(session.query(Some("x")).unwrap_err(), SessionError::Loading);

        let events = session.complete_load(&ticket, &payloads()).unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| w[0].date > w[1].date));
        assert_eq!(session.report().unwrap().total_rejected(), 0);
    }

    #[test]
    fn blank_queries_return_full_timeline() {
        let mut session = session();
        let ticket = session.begin_load("c-1");
        session.complete_load(&ticket, &payloads()).unwrap();

        let all = session.events().unwrap();
        for query in [None, Some(""), Some(" ")] {
            let result = session.query(query).unwrap();
            assert_eq!(result.len(), all.len());
            assert!(result.iter().zip(all.iter()).all(|(a, b)| std::ptr::eq(*a, b)));
        }
    }

    #[test]
    fn query_without_matches_is_empty_not_error() {
        let mut session = session();
        let ticket = session.begin_load("c-1");
        session.complete_load(&ticket, &payloads()).unwrap();

        let result = session.query(Some("declare 403")).unwrap();
        assert!(result.is_empty());
        assert!(session.group_for_display(result).is_empty());
    }

    #[test]
    fn newer_load_wins_over_stale_completion() {
        let mut session = session();
        let first = session.begin_load("c-1");
        let second = session.begin_load("c-2");

        let err = session.complete_load(&first, &payloads()).unwrap_err();
        assert!(matches!(err, SessionError::Stale { .. }));
        assert!(session.state().is_loading());

        session.complete_load(&second, &HistoryPayloads::default()).unwrap();
        assert!(session.events().unwrap().is_empty());
        assert_eq!(
            session.state().data().map(|t| t.customer_id.as_str()),
            Some("c-2")
        );

        // a late failure from the abandoned load changes nothing either
        assert!(session.fail_load(&first, "boom").is_err());
        assert!(session.events().is_ok());
    }

    #[test]
    fn close_invalidates_pending_load() {
        let mut session = session();
        let ticket = session.begin_load("c-1");
        session.close();
        assert!(session.complete_load(&ticket, &payloads()).is_err());
        assert_eq!(session.events().unwrap_err(), SessionError::NotLoaded);
    }

    #[test]
    fn tickets_from_other_sessions_are_stale() {
        let mut a = session();
        let mut b = session();
        let ticket = a.begin_load("c-1");
        b.begin_load("c-1");
        assert!(!b.is_current(&ticket));
    }

    #[tokio::test]
    async fn load_history_joins_both_sources() {
        let client = client_for("c-1");
        let mut session = session();
        let events = session.load_history(&client, "c-1").await.unwrap();
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn one_failing_source_fails_the_load() {
        let mut client = client_for("c-1");
        client.failing_tasks = true;
        let mut session = session();

        let err = session.load_history(&client, "c-1").await.unwrap_err();
        assert!(matches!(err, SessionError::LoadFailed(_)));
        assert!(session.query(None).is_err());
        assert!(matches!(session.state(), LoadState::Error(_)));
    }
}
