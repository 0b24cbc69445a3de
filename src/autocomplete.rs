//! Debounced airport lookup for a single search box.
//!
//! [`AutocompleteField`] is the state machine with no timers or I/O of its
//! own: every keystroke bumps a sequence number, and a lookup response is
//! applied only when it carries the sequence number the field is still at.
//! [`AutocompleteController`] drives a field on the tokio runtime, owning
//! the debounce and blur timers and publishing every visible change on a
//! watch channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::LookupError;
use crate::model::AirportOption;

pub const MIN_QUERY_LEN: usize = 3;
pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const BLUR_GRACE: Duration = Duration::from_millis(200);

#[async_trait]
pub trait AirportLookup: Send + Sync + 'static {
    async fn search(&self, keyword: &str) -> Result<Vec<AirportOption>, LookupError>;
}

#[derive(Debug, Clone)]
pub struct AutocompleteConfig {
    pub min_query_len: usize,
    pub debounce: Duration,
    pub blur_grace: Duration,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            min_query_len: MIN_QUERY_LEN,
            debounce: DEBOUNCE,
            blur_grace: BLUR_GRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Resolved,
    Failed,
}

impl Phase {
    /// Nothing is scheduled or in flight.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Idle | Self::Resolved | Self::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutocompleteState {
    pub query_text: String,
    /// Code sent to the search API; `query_text` is display only once an option is picked.
    pub selected_value: Option<String>,
    pub options: Vec<AirportOption>,
    pub pending: bool,
    pub error: Option<String>,
    /// The last lookup for the current text matched nothing.
    pub empty: bool,
    /// Whether the option list is showing.
    pub open: bool,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CancelTimer,
    StartTimer { seq: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug)]
pub struct AutocompleteField {
    state: AutocompleteState,
    seq: u64,
    min_query_len: usize,
    disposed: bool,
}

impl AutocompleteField {
    pub fn new(min_query_len: usize) -> Self {
        Self {
            state: AutocompleteState::default(),
            seq: 0,
            min_query_len,
            disposed: false,
        }
    }

    pub fn state(&self) -> &AutocompleteState {
        &self.state
    }

    pub fn input(&mut self, text: impl Into<String>) -> Command {
        self.seq += 1;
        let state = &mut self.state;
        state.query_text = text.into();
        state.selected_value = None;

        if state.query_text.chars().count() < self.min_query_len {
            state.phase = Phase::Idle;
            state.options.clear();
            state.error = None;
            state.empty = false;
            state.pending = false;
            state.open = false;
            return Command::CancelTimer;
        }

        state.phase = Phase::Debouncing;
        state.pending = false;
        Command::StartTimer { seq: self.seq }
    }

    /// `None` when the timer belongs to an older keystroke.
    pub fn timer_fired(&mut self, seq: u64) -> Option<LookupRequest> {
        if self.disposed || seq != self.seq || self.state.phase != Phase::Debouncing {
            debug!(seq, current = self.seq, "ignoring stale debounce timer");
            return None;
        }
        self.state.phase = Phase::Fetching;
        self.state.pending = true;
        Some(LookupRequest {
            seq,
            query: self.state.query_text.clone(),
        })
    }

    /// Returns whether the response was applied.
    pub fn resolve(
        &mut self,
        request: &LookupRequest,
        result: Result<Vec<AirportOption>, LookupError>,
    ) -> bool {
        if self.disposed
            || request.seq != self.seq
            || request.query != self.state.query_text
            || self.state.phase != Phase::Fetching
        {
            debug!(
                seq = request.seq,
                current = self.seq,
                query = %request.query,
                "discarding stale lookup response"
            );
            return false;
        }

        let state = &mut self.state;
        match result {
            Ok(options) if options.is_empty() => {
                state.options.clear();
                state.empty = true;
                state.error = None;
                state.phase = Phase::Resolved;
            }
            Ok(options) => {
                state.options = options;
                state.empty = false;
                state.error = None;
                state.phase = Phase::Resolved;
            }
            Err(err) => {
                state.options.clear();
                state.empty = false;
                state.error = Some(err.to_string());
                state.phase = Phase::Failed;
            }
        }
        state.pending = false;
        state.open = true;
        true
    }

    pub fn select(&mut self, option: &AirportOption) {
        self.seq += 1;
        let state = &mut self.state;
        state.query_text = option.label.clone();
        state.selected_value = Some(option.value.clone());
        state.open = false;
        state.pending = false;
        state.phase = Phase::Idle;
    }

    pub fn focus(&mut self) {
        if !self.state.options.is_empty() {
            self.state.open = true;
        }
    }

    pub fn blur_elapsed(&mut self) {
        self.state.open = false;
        self.state.empty = false;
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.seq += 1;
    }
}

type Shared = Arc<Mutex<AutocompleteField>>;
type Updates = Arc<watch::Sender<AutocompleteState>>;

/// Must be created and used inside a tokio runtime.
pub struct AutocompleteController<L: AirportLookup> {
    field: Shared,
    lookup: Arc<L>,
    config: AutocompleteConfig,
    updates: Updates,
    debounce: Option<JoinHandle<()>>,
    blur: Option<JoinHandle<()>>,
}

impl<L: AirportLookup> AutocompleteController<L> {
    pub fn new(lookup: Arc<L>, config: AutocompleteConfig) -> Self {
        let field = AutocompleteField::new(config.min_query_len);
        let (updates, _) = watch::channel(field.state().clone());
        Self {
            field: Arc::new(Mutex::new(field)),
            lookup,
            config,
            updates: Arc::new(updates),
            debounce: None,
            blur: None,
        }
    }

    pub fn state(&self) -> AutocompleteState {
        self.field.lock().state().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutocompleteState> {
        self.updates.subscribe()
    }

    pub fn input(&mut self, text: impl Into<String>) {
        let command = {
            let mut field = self.field.lock();
            let command = field.input(text);
            self.updates.send_replace(field.state().clone());
            command
        };

        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }

        if let Command::StartTimer { seq } = command {
            self.debounce = Some(tokio::spawn(debounce_then_lookup(
                self.field.clone(),
                self.lookup.clone(),
                self.updates.clone(),
                seq,
                self.config.debounce,
            )));
        }
    }

    pub fn select(&mut self, option: &AirportOption) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        let mut field = self.field.lock();
        field.select(option);
        self.updates.send_replace(field.state().clone());
    }

    pub fn focus(&mut self) {
        let mut field = self.field.lock();
        field.focus();
        self.updates.send_replace(field.state().clone());
    }

    /// Closes the list after the grace delay so a click on an option still lands.
    pub fn blur(&mut self) {
        if let Some(timer) = self.blur.take() {
            timer.abort();
        }
        let field = self.field.clone();
        let updates = self.updates.clone();
        let grace = self.config.blur_grace;
        self.blur = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut field = field.lock();
            field.blur_elapsed();
            updates.send_replace(field.state().clone());
        }));
    }

    /// Waits until nothing is scheduled or in flight and returns that state.
    pub async fn settled(&self) -> AutocompleteState {
        let mut rx = self.updates.subscribe();
        let settled = rx
            .wait_for(|s| s.phase.is_settled())
            .await
            .map(|s| (*s).clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }
}

impl<L: AirportLookup> Drop for AutocompleteController<L> {
    fn drop(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        if let Some(timer) = self.blur.take() {
            timer.abort();
        }
        self.field.lock().dispose();
    }
}

async fn debounce_then_lookup<L: AirportLookup>(
    field: Shared,
    lookup: Arc<L>,
    updates: Updates,
    seq: u64,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    let request = {
        let mut field = field.lock();
        let request = field.timer_fired(seq);
        if request.is_some() {
            updates.send_replace(field.state().clone());
        }
        request
    };
    let Some(request) = request else {
        return;
    };

    debug!(seq, query = %request.query, "debounce elapsed, looking up airports");
    // Detached so a later keystroke aborting the timer cannot cancel the request;
    // a superseded response is dropped by the sequence check instead.
    tokio::spawn(run_lookup(field, lookup, updates, request));
}

async fn run_lookup<L: AirportLookup>(
    field: Shared,
    lookup: Arc<L>,
    updates: Updates,
    request: LookupRequest,
) {
    let result = lookup.search(&request.query).await;
    let mut field = field.lock();
    if field.resolve(&request, result) {
        debug!(seq = request.seq, query = %request.query, "airport lookup applied");
        updates.send_replace(field.state().clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(code: &str) -> AirportOption {
        AirportOption {
            label: format!("{code} Airport"),
            value: code.to_string(),
        }
    }

    #[test]
    fn short_input_cancels_and_clears() {
        let mut field = AutocompleteField::new(3);
        assert_eq!(field.input("Rom"), Command::StartTimer { seq: 1 });
        let req = field.timer_fired(1).unwrap();
        assert!(field.resolve(&req, Ok(vec![option("FCO")])));
        assert!(field.state().open);

        assert_eq!(field.input("Ro"), Command::CancelTimer);
        let state = field.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.options.is_empty());
        assert!(!state.open);
    }

    #[test]
    fn timer_from_older_keystroke_is_ignored() {
        let mut field = AutocompleteField::new(3);
        field.input("Mil");
        field.input("Mila");
        assert!(field.timer_fired(1).is_none());
        let req = field.timer_fired(2).unwrap();
        assert_eq!(req.query, "Mila");
        assert_eq!(field.state().phase, Phase::Fetching);
        assert!(field.state().pending);
    }

    #[test]
    fn response_after_newer_keystroke_is_discarded() {
        let mut field = AutocompleteField::new(3);
        field.input("Lon");
        let old = field.timer_fired(1).unwrap();
        field.input("Lond");
        assert!(!field.resolve(&old, Ok(vec![option("LHR")])));
        assert!(field.state().options.is_empty());
        assert_eq!(field.state().phase, Phase::Debouncing);
    }

    #[test]
    fn empty_result_sets_empty_flag() {
        let mut field = AutocompleteField::new(3);
        field.input("Xyz");
        let req = field.timer_fired(1).unwrap();
        assert!(field.resolve(&req, Ok(vec![])));
        let state = field.state();
        assert!(state.empty);
        assert!(state.error.is_none());
        assert_eq!(state.phase, Phase::Resolved);
    }

    #[test]
    fn failure_sets_error_and_clears_options() {
        let mut field = AutocompleteField::new(3);
        field.input("Par");
        let req = field.timer_fired(1).unwrap();
        assert!(field.resolve(&req, Err(LookupError::Network("reset".into()))));
        let state = field.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some("network error — check your connection"));
        assert!(state.options.is_empty());
        assert!(!state.empty);
    }

    #[test]
    fn select_stores_value_and_closes() {
        let mut field = AutocompleteField::new(3);
        field.input("Fiu");
        let req = field.timer_fired(1).unwrap();
        field.resolve(&req, Ok(vec![option("FCO")]));

        field.select(&option("FCO"));
        let state = field.state();
        assert_eq!(state.query_text, "FCO Airport");
        assert_eq!(state.selected_value.as_deref(), Some("FCO"));
        assert!(!state.open);
        assert_eq!(state.phase, Phase::Idle);

        field.focus();
        assert!(field.state().open);

        field.input("FCO Airpor");
        assert!(field.state().selected_value.is_none());
    }

    #[test]
    fn blur_closes_and_clears_empty() {
        let mut field = AutocompleteField::new(3);
        field.input("Qqq");
        let req = field.timer_fired(1).unwrap();
        field.resolve(&req, Ok(vec![]));
        field.blur_elapsed();
        assert!(!field.state().open);
        assert!(!field.state().empty);

        field.focus();
        assert!(!field.state().open);
    }

    #[test]
    fn disposed_field_ignores_responses() {
        let mut field = AutocompleteField::new(3);
        field.input("Ber");
        let req = field.timer_fired(1).unwrap();
        field.dispose();
        assert!(!field.resolve(&req, Ok(vec![option("BER")])));
    }
}
