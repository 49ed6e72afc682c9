//! Shop price list, loaded at startup and never mutated.

pub mod catalog;

pub use catalog::{ShopCatalog, ShopItem};
