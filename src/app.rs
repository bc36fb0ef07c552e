//! Search bar state machine
//!
//! `SearchBar::update` is pure: it consumes a [`Message`], mutates state and
//! returns the [`Effect`]s the session must perform. Timers, provider calls and
//! navigation all happen in `session`.

use std::time::Duration;

use crate::backend::types::{Category, Product, SearchResultPage};
use crate::config::Config;
use crate::error::SearchError;
use crate::reveal::Reveal;
use crate::routing::{normalize_term, Route};

/// Category id meaning "all categories"
pub const ALL_CATEGORIES: i64 = -1;

// ============================================================================
// Inputs and Effects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub enum Message {
    TermChanged(String),
    CategoryChanged(i64),
    KeyPressed(Key),
    Focused,
    /// A revealed result was picked, by position in the display buffer
    ResultSelected(usize),
    DebounceElapsed { generation: u64 },
    SearchComplete {
        generation: u64,
        result: Result<SearchResultPage, SearchError>,
    },
    RevealTick { generation: u64 },
    CategoriesLoaded(Result<Vec<Category>, SearchError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleDebounce { generation: u64, delay: Duration },
    Search {
        generation: u64,
        query: SearchQuery,
        page: u32,
        page_size: u32,
    },
    StartReveal {
        generation: u64,
        steps: usize,
        interval: Duration,
    },
    CancelReveal,
    CancelSearch,
    Navigate(Route),
    LoadCategories,
}

// ============================================================================
// Published View
// ============================================================================

/// Snapshot of everything a renderer needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub term: String,
    pub category_id: i64,
    pub panel_visible: bool,
    pub loading: bool,
    pub total: u64,
    pub displayed: Vec<Product>,
    pub error: Option<SearchError>,
    pub categories: Vec<Category>,
}

// ============================================================================
// Application State
// ============================================================================

pub struct SearchBar {
    term: String,
    category_id: i64,
    dismissed: bool,
    loading: bool,
    total: u64,
    displayed: Vec<Product>,
    reveal: Option<Reveal>,
    error: Option<SearchError>,
    categories: Option<Vec<Category>>,
    input_generation: u64,
    query_generation: u64,
    debounce: Duration,
    reveal_interval: Duration,
    page_size: u32,
}

impl SearchBar {
    pub fn new(config: &Config) -> Self {
        Self {
            term: String::new(),
            category_id: ALL_CATEGORIES,
            dismissed: false,
            loading: false,
            total: 0,
            displayed: Vec::new(),
            reveal: None,
            error: None,
            categories: None,
            input_generation: 0,
            query_generation: 0,
            debounce: config.debounce(),
            reveal_interval: config.reveal_interval(),
            page_size: config.page_size,
        }
    }

    /// Seed the category list instead of fetching it
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Effects to run once when the session starts
    pub fn init(&self) -> Vec<Effect> {
        if self.categories.is_none() {
            vec![Effect::LoadCategories]
        } else {
            Vec::new()
        }
    }

    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            term: self.term.clone(),
            category_id: self.category_id,
        }
    }

    pub fn query_generation(&self) -> u64 {
        self.query_generation
    }

    pub fn panel_visible(&self) -> bool {
        !self.term.is_empty() && !self.dismissed
    }

    pub fn view(&self) -> SearchView {
        SearchView {
            term: self.term.clone(),
            category_id: self.category_id,
            panel_visible: self.panel_visible(),
            loading: self.loading,
            total: self.total,
            displayed: self.displayed.clone(),
            error: self.error.clone(),
            categories: self.categories.clone().unwrap_or_default(),
        }
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::TermChanged(term) => {
                self.term = term;
                self.dismissed = false;
                vec![self.reschedule()]
            }

            Message::CategoryChanged(category_id) => {
                self.category_id = category_id;
                vec![self.reschedule()]
            }

            Message::Focused => {
                self.dismissed = false;
                Vec::new()
            }

            Message::KeyPressed(key) => self.handle_key(key),

            Message::ResultSelected(index) => match self.displayed.get(index) {
                Some(product) => vec![Effect::Navigate(Route::product(&product.path))],
                None => {
                    tracing::debug!("No displayed result at {}", index);
                    Vec::new()
                }
            },

            Message::DebounceElapsed { generation } => {
                if generation != self.input_generation {
                    tracing::trace!("Ignoring superseded debounce {}", generation);
                    return Vec::new();
                }
                self.settle()
            }

            Message::SearchComplete { generation, result } => {
                if generation != self.query_generation {
                    tracing::debug!(
                        "Discarding stale response for generation {} (current {})",
                        generation,
                        self.query_generation
                    );
                    return Vec::new();
                }
                self.loading = false;
                match result {
                    Ok(page) => self.accept_page(generation, page),
                    Err(e) => {
                        tracing::warn!("Search failed: {}", e);
                        self.error = Some(e);
                        Vec::new()
                    }
                }
            }

            Message::RevealTick { generation } => {
                if generation != self.query_generation {
                    return Vec::new();
                }
                if let Some(reveal) = self.reveal.as_mut() {
                    if reveal.generation() == generation {
                        if let Some(product) = reveal.next() {
                            self.displayed.push(product);
                        }
                    }
                }
                Vec::new()
            }

            Message::CategoriesLoaded(result) => {
                match result {
                    Ok(categories) => {
                        tracing::debug!("Loaded {} categories", categories.len());
                        self.categories = Some(categories);
                    }
                    Err(e) => {
                        tracing::warn!("Could not load categories: {}", e);
                        self.categories = Some(Vec::new());
                    }
                }
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Business Logic
    // ========================================================================

    fn reschedule(&mut self) -> Effect {
        self.input_generation += 1;
        Effect::ScheduleDebounce {
            generation: self.input_generation,
            delay: self.debounce,
        }
    }

    /// Input went quiet: drop the old results and query for the current term
    fn settle(&mut self) -> Vec<Effect> {
        self.query_generation += 1;
        self.clear_results();

        let mut effects = vec![Effect::CancelReveal];
        if self.term.is_empty() {
            tracing::debug!("Search term cleared");
            effects.push(Effect::CancelSearch);
            return effects;
        }

        self.loading = true;
        let query = self.query();
        tracing::info!(
            "Searching {:?} in category {} (generation {})",
            query.term,
            query.category_id,
            self.query_generation
        );
        effects.push(Effect::Search {
            generation: self.query_generation,
            query,
            page: 1,
            page_size: self.page_size,
        });
        effects
    }

    fn accept_page(&mut self, generation: u64, page: SearchResultPage) -> Vec<Effect> {
        self.total = page.total;
        if page.products.is_empty() {
            return Vec::new();
        }

        let reveal = Reveal::new(generation, page.products);
        let steps = reveal.len();
        self.displayed.clear();
        self.reveal = Some(reveal);
        vec![Effect::StartReveal {
            generation,
            steps,
            interval: self.reveal_interval,
        }]
    }

    fn clear_results(&mut self) {
        self.loading = false;
        self.total = 0;
        self.displayed.clear();
        self.reveal = None;
        self.error = None;
    }

    fn handle_key(&mut self, key: Key) -> Vec<Effect> {
        if self.term.is_empty() {
            return Vec::new();
        }

        match key {
            Key::Escape => {
                self.dismissed = true;
                Vec::new()
            }
            Key::Enter => {
                let key = normalize_term(&self.term);
                if key.is_empty() {
                    return Vec::new();
                }
                let route = Route::search_results(&key, self.category_id);
                self.term.clear();
                vec![self.reschedule(), Effect::Navigate(route)]
            }
            Key::Other => Vec::new(),
        }
    }
}
