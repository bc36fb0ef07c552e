//! Shared types for backend communication

use serde::{Deserialize, Deserializer, Serialize};

/// Product category used as a search filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Product as returned by the storefront search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "decimal")]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub path: String,
}

impl Product {
    /// Price with thousands separators followed by the currency, e.g. `1,250,000 VND`
    pub fn display_price(&self) -> String {
        let amount = group_thousands(self.price);
        if self.currency.is_empty() {
            amount
        } else {
            format!("{} {}", amount, self.currency)
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Sequelize serializes DECIMAL columns as strings
fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(n) => Ok(n),
        Decimal::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.trim_end_matches('0').is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}
