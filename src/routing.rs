//! Hand-off from a committed search to the storefront router

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

/// Path of the full search-results page
pub const SEARCH_RESULTS_PATH: &str = "/search/q";

/// Prefix of product detail pages
pub const PRODUCT_PATH_PREFIX: &str = "/product/";

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s/]+").expect("static regex"));

/// Trim and collapse runs of whitespace and slashes into one `-`
pub fn normalize_term(term: &str) -> String {
    SEPARATORS.replace_all(term.trim(), "-").into_owned()
}

/// Navigation target: a path plus ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl Route {
    /// Route to the results page for an already normalized term
    pub fn search_results(key: &str, category_id: i64) -> Self {
        Self {
            path: SEARCH_RESULTS_PATH.to_string(),
            params: vec![
                ("key".to_string(), key.to_string()),
                ("categoryId".to_string(), category_id.to_string()),
            ],
        }
    }

    /// Detail page of a product, by its slug
    pub fn product(path: &str) -> Self {
        Self {
            path: format!("{}{}", PRODUCT_PATH_PREFIX, path),
            params: Vec::new(),
        }
    }

    /// Path with the form-encoded query string, e.g. `/search/q?key=a-b&categoryId=3`
    pub fn href(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

/// Fire-and-forget router
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Terminal navigator: prints the target instead of opening it
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn navigate(&self, route: &Route) {
        tracing::info!("navigate {}", route.href());
        println!("-> {}", route.href());
    }
}
