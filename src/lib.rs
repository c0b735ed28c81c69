//! Link classification and URL sanitation for scraped founder/company records.
//!
//! A record goes through [`links::choose_links`] to get at most one URL per
//! slot, then each slot is checked with [`actionable::Denylist`] before it is
//! shown as a live link.

pub mod actionable;
pub mod config;
pub mod db;
pub mod links;
pub mod models;
pub mod normalize;

pub use actionable::{Denylist, LinkContext, Rejection, UrlVerdict, ValidateOptions};
pub use links::choose_links;
pub use models::{ClassifiedLinks, FlexField, RawEntry};
