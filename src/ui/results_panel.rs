//! Search results panel rendered as plain text

use std::fmt::Write;

use crate::app::{SearchView, ALL_CATEGORIES};
use crate::backend::types::Category;

/// Render the panel for a view, or `None` while it is hidden
pub fn render(view: &SearchView) -> Option<String> {
    if !view.panel_visible {
        return None;
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Search results: ({} in {})  {} products found",
        view.term,
        category_label(&view.categories, view.category_id),
        view.total
    );

    if view.loading {
        let _ = writeln!(out, "  ... loading");
    } else if let Some(error) = &view.error {
        let _ = writeln!(out, "  ! {}", error);
    } else {
        for (i, product) in view.displayed.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {}  {}  (/product/{})",
                i + 1,
                product.name,
                product.display_price(),
                product.path
            );
        }
    }

    Some(out)
}

/// Category list with the implicit "all" entry first
pub fn render_categories(categories: &[Category]) -> String {
    let mut out = format!("  {:>4}  All\n", ALL_CATEGORIES);
    for category in categories {
        let _ = writeln!(out, "  {:>4}  {}", category.id, category.name);
    }
    out
}

fn category_label(categories: &[Category], category_id: i64) -> String {
    if category_id == ALL_CATEGORIES {
        return "all categories".to_string();
    }
    categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("category {}", category_id))
}
