//! Search session driver
//!
//! One tokio task owns the [`SearchBar`] and runs every effect it asks for.
//! Inputs arrive through a [`SessionHandle`]; timers and provider calls report
//! back on an internal channel. After each message the current [`SearchView`]
//! is published on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::app::{Effect, Key, Message, SearchBar, SearchQuery, SearchView};
use crate::backend::types::{Category, SearchResultPage};
use crate::backend::{CategoryProvider, SearchProvider};
use crate::config::Config;
use crate::error::SearchError;
use crate::routing::Navigator;

/// External collaborators a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub categories: Arc<dyn CategoryProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub navigator: Arc<dyn Navigator>,
}

/// Cheap, cloneable input side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    inputs: mpsc::UnboundedSender<Message>,
    view: watch::Receiver<SearchView>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn type_term(&self, term: impl Into<String>) -> bool {
        self.send(Message::TermChanged(term.into()))
    }

    pub fn select_category(&self, category_id: i64) -> bool {
        self.send(Message::CategoryChanged(category_id))
    }

    pub fn press(&self, key: Key) -> bool {
        self.send(Message::KeyPressed(key))
    }

    pub fn focus(&self) -> bool {
        self.send(Message::Focused)
    }

    /// Open the product page of the `index`-th displayed result (0-based)
    pub fn open_result(&self, index: usize) -> bool {
        self.send(Message::ResultSelected(index))
    }

    /// Latest published view
    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every published view
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.view.clone()
    }

    /// Returns false once the session has stopped
    fn send(&self, message: Message) -> bool {
        self.inputs.send(message).is_ok()
    }
}

pub struct SearchSession {
    id: Uuid,
    bar: SearchBar,
    collaborators: Collaborators,
    request_timeout: Duration,
    inputs: mpsc::UnboundedReceiver<Message>,
    internal_tx: mpsc::UnboundedSender<Message>,
    internal_rx: mpsc::UnboundedReceiver<Message>,
    view_tx: watch::Sender<SearchView>,
    debounce: Option<JoinHandle<()>>,
    in_flight: Option<JoinHandle<()>>,
    reveal: Option<JoinHandle<()>>,
    categories: Option<JoinHandle<()>>,
}

impl SearchSession {
    /// Build a session and its handle. Categories are fetched on start
    /// unless `categories` is given.
    pub fn new(
        config: &Config,
        collaborators: Collaborators,
        categories: Option<Vec<Category>>,
    ) -> (Self, SessionHandle) {
        let id = Uuid::new_v4();
        let bar = match categories {
            Some(list) => SearchBar::new(config).with_categories(list),
            None => SearchBar::new(config),
        };
        let (inputs_tx, inputs) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(bar.view());

        let session = Self {
            id,
            bar,
            collaborators,
            request_timeout: config.request_timeout(),
            inputs,
            internal_tx,
            internal_rx,
            view_tx,
            debounce: None,
            in_flight: None,
            reveal: None,
            categories: None,
        };
        let handle = SessionHandle {
            id,
            inputs: inputs_tx,
            view: view_rx,
        };
        (session, handle)
    }

    /// Spawn the session on the current runtime
    pub fn spawn(
        config: &Config,
        collaborators: Collaborators,
        categories: Option<Vec<Category>>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (session, handle) = Self::new(config, collaborators, categories);
        let span = tracing::info_span!("search_session", session = %session.id);
        let task = tokio::spawn(session.run().instrument(span));
        (handle, task)
    }

    /// Event loop. Ends when every handle has been dropped.
    pub async fn run(mut self) {
        tracing::debug!("Search session started");
        for effect in self.bar.init() {
            self.perform(effect);
        }
        self.publish();

        loop {
            let message = tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(message) => message,
                    None => break,
                },
                Some(message) = self.internal_rx.recv() => message,
            };

            for effect in self.bar.update(message) {
                self.perform(effect);
            }
            self.publish();
        }

        self.shutdown();
        tracing::debug!("Search session ended");
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.bar.view());
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::ScheduleDebounce { generation, delay } => {
                abort(self.debounce.take());
                let tx = self.internal_tx.clone();
                self.debounce = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Message::DebounceElapsed { generation });
                }));
            }

            Effect::Search {
                generation,
                query,
                page,
                page_size,
            } => {
                abort(self.in_flight.take());
                let provider = self.collaborators.search.clone();
                let timeout = self.request_timeout;
                let tx = self.internal_tx.clone();
                self.in_flight = Some(tokio::spawn(
                    async move {
                        let result =
                            search_with_timeout(provider, &query, page, page_size, timeout).await;
                        let _ = tx.send(Message::SearchComplete { generation, result });
                    }
                    .in_current_span(),
                ));
            }

            Effect::StartReveal {
                generation,
                steps,
                interval,
            } => {
                abort(self.reveal.take());
                let tx = self.internal_tx.clone();
                self.reveal = Some(tokio::spawn(async move {
                    for _ in 0..steps {
                        tokio::time::sleep(interval).await;
                        if tx.send(Message::RevealTick { generation }).is_err() {
                            break;
                        }
                    }
                }));
            }

            Effect::CancelReveal => abort(self.reveal.take()),

            Effect::CancelSearch => abort(self.in_flight.take()),

            Effect::Navigate(route) => self.collaborators.navigator.navigate(&route),

            Effect::LoadCategories => {
                let provider = self.collaborators.categories.clone();
                let timeout = self.request_timeout;
                let tx = self.internal_tx.clone();
                abort(self.categories.take());
                self.categories = Some(tokio::spawn(
                    async move {
                        let call = provider.list_categories();
                        let result = match tokio::time::timeout(timeout, call).await {
                            Ok(result) => result,
                            Err(_) => Err(SearchError::Timeout(timeout)),
                        };
                        let _ = tx.send(Message::CategoriesLoaded(result));
                    }
                    .in_current_span(),
                ));
            }
        }
    }

    fn shutdown(&mut self) {
        abort(self.debounce.take());
        abort(self.in_flight.take());
        abort(self.reveal.take());
        abort(self.categories.take());
    }
}

fn abort(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        task.abort();
    }
}

async fn search_with_timeout(
    provider: Arc<dyn SearchProvider>,
    query: &SearchQuery,
    page: u32,
    page_size: u32,
    timeout: Duration,
) -> Result<SearchResultPage, SearchError> {
    let call = provider.search_products(&query.term, query.category_id, page, page_size);
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::Product;
    use crate::routing::Route;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        term: String,
        category_id: i64,
        page: u32,
        page_size: u32,
    }

    /// In-memory catalog keyed by term, with optional per-term latency
    #[derive(Default)]
    struct FakeShop {
        pages: HashMap<String, Vec<i64>>,
        latency: HashMap<String, Duration>,
        failing: bool,
        category_latency: Option<Duration>,
        calls: Mutex<Vec<Call>>,
        searches_finished: AtomicUsize,
        categories_served: AtomicBool,
    }

    impl FakeShop {
        fn with_page(mut self, term: &str, ids: &[i64]) -> Self {
            self.pages.insert(term.to_string(), ids.to_vec());
            self
        }

        fn with_latency(mut self, term: &str, latency: Duration) -> Self {
            self.latency.insert(term.to_string(), latency);
            self
        }

        fn with_category_latency(mut self, latency: Duration) -> Self {
            self.category_latency = Some(latency);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn product(id: i64) -> Product {
        Product {
            id,
            name: format!("part-{}", id),
            price: 1000.0,
            currency: "VND".to_string(),
            image_url: String::new(),
            path: format!("part-{}", id),
        }
    }

    #[async_trait]
    impl SearchProvider for FakeShop {
        async fn search_products(
            &self,
            term: &str,
            category_id: i64,
            page: u32,
            page_size: u32,
        ) -> Result<SearchResultPage, SearchError> {
            self.calls.lock().unwrap().push(Call {
                term: term.to_string(),
                category_id,
                page,
                page_size,
            });
            if let Some(latency) = self.latency.get(term) {
                sleep(*latency).await;
            }
            self.searches_finished.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(SearchError::Unavailable("connection refused".to_string()));
            }
            let ids = self.pages.get(term).cloned().unwrap_or_default();
            Ok(SearchResultPage {
                total: ids.len() as u64,
                products: ids.into_iter().map(product).collect(),
            })
        }
    }

    #[async_trait]
    impl CategoryProvider for FakeShop {
        async fn list_categories(&self) -> Result<Vec<Category>, SearchError> {
            if let Some(latency) = self.category_latency {
                sleep(latency).await;
            }
            self.categories_served.store(true, Ordering::SeqCst);
            Ok(vec![
                Category { id: 1, name: "Engine".to_string() },
                Category { id: 2, name: "Body".to_string() },
            ])
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Mutex<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: &Route) {
            self.routes.lock().unwrap().push(route.clone());
        }
    }

    fn start(shop: FakeShop) -> (SessionHandle, Arc<FakeShop>, Arc<RecordingNavigator>) {
        let shop = Arc::new(shop);
        let navigator = Arc::new(RecordingNavigator::default());
        let collaborators = Collaborators {
            categories: shop.clone(),
            search: shop.clone(),
            navigator: navigator.clone(),
        };
        let (handle, _task) = SearchSession::spawn(&Config::default(), collaborators, None);
        (handle, shop, navigator)
    }

    fn ids(view: &SearchView) -> Vec<i64> {
        view.displayed.iter().map(|p| p.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_issues_one_search() {
        let (handle, shop, _) = start(FakeShop::default().with_page("tab", &[1, 2]));

        handle.type_term("t");
        sleep(Duration::from_millis(40)).await;
        handle.type_term("ta");
        sleep(Duration::from_millis(40)).await;
        handle.type_term("tab");

        sleep(Duration::from_millis(299)).await;
        assert!(shop.calls().is_empty());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(
            shop.calls(),
            vec![Call {
                term: "tab".to_string(),
                category_id: -1,
                page: 1,
                page_size: 6
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_change_restarts_debounce() {
        let (handle, shop, _) = start(FakeShop::default());

        handle.type_term("pad");
        sleep(Duration::from_millis(200)).await;
        handle.select_category(5);
        sleep(Duration::from_millis(200)).await;
        assert!(shop.calls().is_empty());

        sleep(Duration::from_millis(150)).await;
        let calls = shop.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].category_id, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_term_emptied_before_debounce_never_searches() {
        let (handle, shop, _) = start(FakeShop::default().with_page("oil", &[1]));

        handle.type_term("oil");
        sleep(Duration::from_millis(100)).await;
        handle.type_term("");
        sleep(Duration::from_millis(1000)).await;

        assert!(shop.calls().is_empty());
        let view = handle.view();
        assert!(view.displayed.is_empty());
        assert!(!view.loading);
        assert!(!view.panel_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_reveal_progressively() {
        let (handle, _, _) = start(
            FakeShop::default()
                .with_page("belt", &[4, 8, 15])
                .with_latency("belt", Duration::from_millis(100)),
        );

        handle.type_term("belt");
        sleep(Duration::from_millis(350)).await;
        assert!(handle.view().loading);

        // Response at 400ms, one item every 50ms after that
        sleep(Duration::from_millis(75)).await;
        let view = handle.view();
        assert!(!view.loading);
        assert_eq!(view.total, 3);
        assert!(view.displayed.is_empty());

        sleep(Duration::from_millis(50)).await;
        assert_eq!(ids(&handle.view()), vec![4]);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(ids(&handle.view()), vec![4, 8, 15]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_query_wins_over_running_reveal() {
        let (handle, _, _) = start(
            FakeShop::default()
                .with_page("first", &[1, 2, 3, 4, 5, 6])
                .with_page("second", &[20, 21]),
        );

        handle.type_term("first");
        sleep(Duration::from_millis(410)).await;
        let partial = ids(&handle.view());
        assert!(!partial.is_empty() && partial.len() < 6);

        handle.type_term("second");
        sleep(Duration::from_millis(1000)).await;

        assert_eq!(ids(&handle.view()), vec![20, 21]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_never_lands() {
        let (handle, shop, _) = start(
            FakeShop::default()
                .with_page("slow", &[1, 2])
                .with_latency("slow", Duration::from_millis(800))
                .with_page("fast", &[9]),
        );

        handle.type_term("slow");
        sleep(Duration::from_millis(350)).await;
        handle.type_term("fast");
        sleep(Duration::from_millis(2000)).await;

        assert_eq!(shop.calls().len(), 2);
        assert_eq!(ids(&handle.view()), vec![9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_ends_in_error_state() {
        let shop = FakeShop {
            failing: true,
            ..FakeShop::default()
        };
        let (handle, _, _) = start(shop);

        handle.type_term("clutch");
        sleep(Duration::from_millis(400)).await;

        let view = handle.view();
        assert!(!view.loading);
        assert!(view.displayed.is_empty());
        assert!(matches!(view.error, Some(SearchError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_provider_times_out() {
        let (handle, _, _) = start(
            FakeShop::default().with_latency("hang", Duration::from_secs(60)),
        );

        handle.type_term("hang");
        sleep(Duration::from_millis(300 + 5000 + 10)).await;

        let view = handle.view();
        assert!(!view.loading);
        assert_eq!(view.error, Some(SearchError::Timeout(Duration::from_millis(5000))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_navigates_without_searching() {
        let (handle, shop, navigator) = start(FakeShop::default());

        handle.select_category(3);
        handle.type_term(" a/b ");
        handle.press(Key::Enter);
        sleep(Duration::from_millis(500)).await;

        let routes = navigator.routes.lock().unwrap().clone();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].href().contains("key=a-b&categoryId=3"));
        assert!(shop.calls().is_empty());
        assert_eq!(handle.view().term, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_categories_fetched_on_start() {
        let (handle, _, _) = start(FakeShop::default());
        sleep(Duration::from_millis(1)).await;
        assert_eq!(handle.view().categories.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_stops_when_handles_drop() {
        let shop = Arc::new(FakeShop::default());
        let collaborators = Collaborators {
            categories: shop.clone(),
            search: shop.clone(),
            navigator: Arc::new(RecordingNavigator::default()),
        };
        let (handle, task) =
            SearchSession::spawn(&Config::default(), collaborators, Some(Vec::new()));
        handle.type_term("gear");
        drop(handle);

        task.await.unwrap();
        sleep(Duration::from_millis(500)).await;
        assert!(shop.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_category_request() {
        let shop = Arc::new(FakeShop::default().with_category_latency(Duration::from_secs(2)));
        let collaborators = Collaborators {
            categories: shop.clone(),
            search: shop.clone(),
            navigator: Arc::new(RecordingNavigator::default()),
        };
        let (handle, task) = SearchSession::spawn(&Config::default(), collaborators, None);
        sleep(Duration::from_millis(1)).await;
        drop(handle);

        task.await.unwrap();
        sleep(Duration::from_secs(3)).await;
        assert!(!shop.categories_served.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_term_aborts_in_flight_search() {
        let (handle, shop, _) = start(
            FakeShop::default()
                .with_page("hose", &[1])
                .with_latency("hose", Duration::from_secs(2)),
        );

        handle.type_term("hose");
        sleep(Duration::from_millis(350)).await;
        assert_eq!(shop.calls().len(), 1);

        handle.type_term("");
        sleep(Duration::from_secs(3)).await;

        assert_eq!(shop.searches_finished.load(Ordering::SeqCst), 0);
        let view = handle.view();
        assert!(!view.loading);
        assert!(view.displayed.is_empty());
    }
}
