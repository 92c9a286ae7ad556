//! Browsing session state
//!
//! A [`Session`] composes the catalog, the active dataflow's schema, the
//! selection and the dataset browser. Remote calls are issued through its
//! [`TaskQueue`]; the owner drains the completion receiver and feeds each
//! completion to [`Session::apply`], which is the only place remote results
//! change session state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::app::browser::DatasetBrowser;
use crate::app::client::DataSource;
use crate::app::models::{ClassificationLists, CodeEntry, CodelistRole, DataflowSummary, SeriesTable};
use crate::app::query::SeriesQuery;
use crate::app::selection::Selection;
use crate::app::tasks::{Completion, TaskKind, TaskOutcome, TaskQueue, Ticket};
use crate::errors::{RemoteError, SessionError};

/// What changed after applying a completion
#[derive(Debug)]
pub enum SessionUpdate {
    CatalogLoaded {
        count: usize,
    },
    SchemaLoaded {
        key_family_id: String,
        /// The schema provided none of the three codelists
        empty: bool,
    },
    SeriesLoaded {
        count: usize,
    },
    /// The call failed; previously held state is unchanged
    Failed {
        kind: TaskKind,
        error: RemoteError,
    },
    /// A superseded request completed and was discarded
    Stale {
        kind: TaskKind,
    },
}

pub struct Session<S: DataSource> {
    catalog: Vec<DataflowSummary>,
    active: Option<DataflowSummary>,
    schema: Option<ClassificationLists>,
    selection: Selection,
    browser: DatasetBrowser,
    tasks: TaskQueue<S>,
}

impl<S: DataSource> Session<S> {
    /// Create a session and the receiver its completions arrive on
    pub fn new(source: Arc<S>) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tasks, receiver) = TaskQueue::new(source);
        let session = Self {
            catalog: Vec::new(),
            active: None,
            schema: None,
            selection: Selection::new(),
            browser: DatasetBrowser::new(),
            tasks,
        };
        (session, receiver)
    }

    pub fn load_catalog(&mut self) -> Ticket {
        self.tasks.spawn_catalog()
    }

    pub fn catalog(&self) -> &[DataflowSummary] {
        &self.catalog
    }

    /// Choose the dataflow at `index` of the catalog and request its schema
    ///
    /// The previous schema and selection are cleared immediately; tables
    /// already in the browser stay until the next successful fetch.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` if `index` is not in the catalog
    pub fn select_dataflow(&mut self, index: usize) -> Result<Ticket, SessionError> {
        let dataflow = self
            .catalog
            .get(index)
            .cloned()
            .ok_or(SessionError::IndexOutOfRange {
                what: "dataflows",
                index,
                len: self.catalog.len(),
            })?;

        tracing::info!(
            "Selected dataflow {} ({})",
            dataflow.name,
            dataflow.key_family_id
        );
        let key_family_id = dataflow.key_family_id.clone();
        self.active = Some(dataflow);
        self.schema = None;
        self.selection.clear();
        Ok(self.tasks.spawn_schema(key_family_id))
    }

    pub fn active_dataflow(&self) -> Option<&DataflowSummary> {
        self.active.as_ref()
    }

    pub fn schema(&self) -> Option<&ClassificationLists> {
        self.schema.as_ref()
    }

    /// Codes available for `role` in the loaded schema
    pub fn codes(&self, role: CodelistRole) -> &[CodeEntry] {
        self.schema.as_ref().map(|s| s.codes(role)).unwrap_or(&[])
    }

    /// Toggle the code at `index` of the `role` codelist
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` if no such code is loaded
    pub fn toggle(&mut self, role: CodelistRole, index: usize) -> Result<&[CodeEntry], SessionError> {
        let codes = self.codes(role);
        let entry = codes
            .get(index)
            .cloned()
            .ok_or(SessionError::IndexOutOfRange {
                what: role.title(),
                index,
                len: codes.len(),
            })?;
        Ok(self.selection.toggle(role, entry))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Fetch gate: a dataflow is active and at least one indicator is chosen
    pub fn can_fetch(&self) -> bool {
        self.active.is_some() && self.selection.is_indicator_non_empty()
    }

    /// Request the series for the current selection
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoDataflowSelected` or
    /// `SessionError::IndicatorRequired` when the fetch gate is closed
    pub fn request_series(&mut self) -> Result<Ticket, SessionError> {
        let dataflow = self.active.as_ref().ok_or(SessionError::NoDataflowSelected)?;
        if !self.selection.is_indicator_non_empty() {
            return Err(SessionError::IndicatorRequired);
        }

        let query = SeriesQuery::new(dataflow.key_family_id.clone(), &self.selection);
        tracing::info!(
            "Requesting series {}/{}",
            query.key_family_id(),
            query.key_path()
        );
        Ok(self.tasks.spawn_series(query))
    }

    pub fn is_loading(&self, kind: TaskKind) -> bool {
        self.tasks.is_pending(kind)
    }

    pub fn browser(&self) -> &DatasetBrowser {
        &self.browser
    }

    pub fn next(&mut self) -> bool {
        self.browser.next()
    }

    pub fn previous(&mut self) -> bool {
        self.browser.previous()
    }

    pub fn current(&self) -> Option<&SeriesTable> {
        self.browser.current()
    }

    /// Apply a completion drained from the receiver
    pub fn apply(&mut self, completion: Completion) -> SessionUpdate {
        let Completion { ticket, outcome } = completion;
        if !self.tasks.accept(ticket) {
            return SessionUpdate::Stale { kind: ticket.kind };
        }

        match outcome {
            TaskOutcome::Catalog(Ok(catalog)) => {
                let count = catalog.len();
                self.catalog = catalog;
                SessionUpdate::CatalogLoaded { count }
            }
            TaskOutcome::Schema(Ok(lists)) => {
                let key_family_id = lists.key_family_id().to_string();
                let empty = lists.is_empty();
                if empty {
                    tracing::warn!("Data structure for {} has no codelists", key_family_id);
                }
                self.schema = Some(lists);
                SessionUpdate::SchemaLoaded {
                    key_family_id,
                    empty,
                }
            }
            TaskOutcome::Series(Ok(tables)) => {
                let count = tables.len();
                self.browser.replace(tables);
                SessionUpdate::SeriesLoaded { count }
            }
            TaskOutcome::Catalog(Err(error))
            | TaskOutcome::Schema(Err(error))
            | TaskOutcome::Series(Err(error)) => {
                tracing::error!("{} request failed: {}", ticket.kind, error);
                SessionUpdate::Failed {
                    kind: ticket.kind,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Observation, SeriesKey};
    use crate::errors::{ErrorKind, RemoteResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Answers every series query with one table per indicator value
    #[derive(Default)]
    struct FakeSource {
        fail_series: AtomicBool,
    }

    #[async_trait]
    impl DataSource for FakeSource {
        async fn list_dataflows(&self) -> RemoteResult<Vec<DataflowSummary>> {
            Ok(vec![
                DataflowSummary::new("Balance of Payments", "BOP"),
                DataflowSummary::new("International Financial Statistics", "IFS"),
            ])
        }

        async fn fetch_schema(&self, key_family_id: &str) -> RemoteResult<ClassificationLists> {
            let mut lists = ClassificationLists::new(key_family_id);
            if key_family_id == "IFS" {
                lists.set(
                    CodelistRole::Frequency,
                    vec![CodeEntry::new("Quarterly", "Q"), CodeEntry::new("Annual", "A")],
                );
                lists.set(CodelistRole::Area, vec![CodeEntry::new("United States", "US")]);
                lists.set(
                    CodelistRole::Indicator,
                    vec![
                        CodeEntry::new("GDP", "NGDP"),
                        CodeEntry::new("CPI", "PCPI"),
                    ],
                );
            }
            Ok(lists)
        }

        async fn fetch_series(&self, query: &SeriesQuery) -> RemoteResult<Vec<SeriesTable>> {
            if self.fail_series.load(Ordering::SeqCst) {
                return Err(RemoteError::ServerError {
                    status: 503,
                    url: "http://localhost/CompactData".to_string(),
                });
            }
            let frequencies = query.values(CodelistRole::Frequency);
            Ok(frequencies
                .iter()
                .map(|freq| {
                    SeriesTable::new(
                        SeriesKey {
                            frequency: freq.clone(),
                            area: query.values(CodelistRole::Area).join("+"),
                            indicator: query.values(CodelistRole::Indicator).join("+"),
                        },
                        vec![Observation::new("2020", "1")],
                    )
                })
                .collect())
        }
    }

    async fn drain_one(
        session: &mut Session<FakeSource>,
        receiver: &mut mpsc::UnboundedReceiver<Completion>,
    ) -> SessionUpdate {
        let completion = receiver.recv().await.unwrap();
        session.apply(completion)
    }

    /// Session with the catalog loaded and IFS selected
    async fn ifs_session() -> (
        Session<FakeSource>,
        mpsc::UnboundedReceiver<Completion>,
        Arc<FakeSource>,
    ) {
        let source = Arc::new(FakeSource::default());
        let (mut session, mut receiver) = Session::new(Arc::clone(&source));
        session.load_catalog();
        assert!(matches!(
            drain_one(&mut session, &mut receiver).await,
            SessionUpdate::CatalogLoaded { count: 2 }
        ));
        session.select_dataflow(1).unwrap();
        assert!(matches!(
            drain_one(&mut session, &mut receiver).await,
            SessionUpdate::SchemaLoaded { empty: false, .. }
        ));
        (session, receiver, source)
    }

    #[tokio::test]
    async fn test_fetch_gate() {
        let (mut session, _receiver, _) = ifs_session().await;
        assert!(!session.can_fetch());
        assert_eq!(session.request_series(), Err(SessionError::IndicatorRequired));

        session.toggle(CodelistRole::Frequency, 0).unwrap();
        session.toggle(CodelistRole::Area, 0).unwrap();
        assert!(!session.can_fetch());

        session.toggle(CodelistRole::Indicator, 0).unwrap();
        assert!(session.can_fetch());
    }

    #[tokio::test]
    async fn test_no_dataflow_selected() {
        let (mut session, _receiver) = Session::new(Arc::new(FakeSource::default()));
        assert_eq!(session.request_series(), Err(SessionError::NoDataflowSelected));
        assert!(matches!(
            session.select_dataflow(0),
            Err(SessionError::IndexOutOfRange { len: 0, .. })
        ));
        assert!(matches!(
            session.toggle(CodelistRole::Area, 0),
            Err(SessionError::IndexOutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_two_series_browse() {
        let (mut session, mut receiver, _) = ifs_session().await;
        session.toggle(CodelistRole::Frequency, 0).unwrap();
        session.toggle(CodelistRole::Frequency, 1).unwrap();
        session.toggle(CodelistRole::Area, 0).unwrap();
        session.toggle(CodelistRole::Indicator, 0).unwrap();

        session.request_series().unwrap();
        assert!(session.is_loading(TaskKind::Series));
        assert!(matches!(
            drain_one(&mut session, &mut receiver).await,
            SessionUpdate::SeriesLoaded { count: 2 }
        ));

        assert_eq!(session.current().unwrap().label(), "Q_US_NGDP");
        assert!(session.next());
        assert_eq!(session.current().unwrap().label(), "A_US_NGDP");
        assert!(!session.next());
        assert!(session.previous());
        assert_eq!(session.current().unwrap().label(), "Q_US_NGDP");
    }

    #[tokio::test]
    async fn test_latest_series_request_wins() {
        let (mut session, mut receiver, _) = ifs_session().await;
        session.toggle(CodelistRole::Frequency, 0).unwrap();
        session.toggle(CodelistRole::Indicator, 0).unwrap();
        session.request_series().unwrap();

        session.toggle(CodelistRole::Indicator, 1).unwrap();
        session.request_series().unwrap();

        let mut stale = 0;
        for _ in 0..2 {
            if let SessionUpdate::Stale { kind } = drain_one(&mut session, &mut receiver).await {
                assert_eq!(kind, TaskKind::Series);
                stale += 1;
            }
        }
        assert_eq!(stale, 1);
        assert_eq!(session.current().unwrap().key.indicator, "NGDP+PCPI");
    }

    #[tokio::test]
    async fn test_new_dataflow_discards_outstanding_series() {
        let (mut session, mut receiver, _) = ifs_session().await;
        session.toggle(CodelistRole::Indicator, 0).unwrap();
        session.toggle(CodelistRole::Frequency, 0).unwrap();
        session.request_series().unwrap();

        session.select_dataflow(0).unwrap();
        assert!(session.selection().is_empty());
        assert!(session.schema().is_none());

        let mut updates = Vec::new();
        for _ in 0..2 {
            updates.push(drain_one(&mut session, &mut receiver).await);
        }
        assert!(updates
            .iter()
            .any(|u| matches!(u, SessionUpdate::Stale { kind: TaskKind::Series })));
        assert!(updates
            .iter()
            .any(|u| matches!(u, SessionUpdate::SchemaLoaded { empty: true, .. })));
        assert!(session.browser().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_tables() {
        let (mut session, mut receiver, source) = ifs_session().await;
        session.toggle(CodelistRole::Frequency, 0).unwrap();
        session.toggle(CodelistRole::Indicator, 0).unwrap();
        session.request_series().unwrap();
        drain_one(&mut session, &mut receiver).await;
        assert_eq!(session.browser().len(), 1);

        source.fail_series.store(true, Ordering::SeqCst);
        session.toggle(CodelistRole::Frequency, 1).unwrap();
        session.request_series().unwrap();

        match drain_one(&mut session, &mut receiver).await {
            SessionUpdate::Failed { kind, error } => {
                assert_eq!(kind, TaskKind::Series);
                assert_eq!(error.kind(), ErrorKind::RemoteUnavailable);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(session.browser().len(), 1);
        assert_eq!(session.current().unwrap().label(), "Q__NGDP");
        assert!(!session.is_loading(TaskKind::Series));
    }
}
