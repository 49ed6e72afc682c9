//! Static shop price catalog.
//!
//! Loaded once at startup from an external list of `name:price` entries and
//! exposed to the rest of the bot as a read-only lookup table. Parsing is
//! strict: a malformed entry fails the load instead of being skipped.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::ShopError;
use crate::Points;

/// One purchasable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    /// Display name.
    pub name: String,
    /// Price in points.
    pub price: Points,
}

/// Read-only price list in source order.
#[derive(Debug, Clone, Default)]
pub struct ShopCatalog {
    items: Vec<ShopItem>,
}

impl ShopCatalog {
    /// Parse a catalog from `name:price` lines.
    ///
    /// Blank lines and lines starting with `#` are ignored. Everything else
    /// must be a `name:price` pair with a positive integer price.
    pub fn from_entries<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, ShopError> {
        let mut items: Vec<ShopItem> = Vec::new();

        for (idx, raw) in lines.into_iter().enumerate() {
            let line = idx + 1;
            let entry = raw.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }

            let (name, price) = entry.rsplit_once(':').ok_or_else(|| ShopError::MalformedEntry {
                line,
                entry: entry.to_string(),
            })?;

            let name = name.trim();
            let price_text = price.trim();
            if name.is_empty() {
                return Err(ShopError::MalformedEntry {
                    line,
                    entry: entry.to_string(),
                });
            }

            let price: Points = price_text
                .parse()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| ShopError::InvalidPrice {
                    line,
                    name: name.to_string(),
                    price: price_text.to_string(),
                })?;

            if items.iter().any(|i| i.name.eq_ignore_ascii_case(name)) {
                return Err(ShopError::DuplicateItem {
                    line,
                    name: name.to_string(),
                });
            }

            items.push(ShopItem {
                name: name.to_string(),
                price,
            });
        }

        Ok(Self { items })
    }

    /// Load a catalog from a file, one entry per line.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_entries(contents.lines())?)
    }

    /// Look up an item price by case-insensitive name.
    pub fn price_of(&self, name: &str) -> Option<Points> {
        self.items
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name.trim()))
            .map(|i| i.price)
    }

    /// All items in source order.
    pub fn items(&self) -> &[ShopItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the catalog has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
