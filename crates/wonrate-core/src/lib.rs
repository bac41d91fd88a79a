//! Core contracts for wonrate.
//!
//! This crate contains:
//! - Canonical rate records and the currency/date domain model
//! - Publish-calendar window arithmetic (fixed UTC+9)
//! - Interchangeable source adapters (snapshot, scrape, open-banking, mock)
//! - The date-keyed cache and the reconciliation service that merges
//!   cached, static, and freshly fetched records into one dataset

pub mod adapters;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http;
pub mod normalize;
pub mod reconcile;
pub mod service;
pub mod source;

pub use adapters::{MockAdapter, OpenBankingAdapter, OpenBankingCredentials, ScrapeAdapter, SnapshotAdapter};
pub use cache::{epoch_millis, CacheEntry, CacheKey, CacheStore};
pub use calendar::CutoverRule;
pub use config::Config;
pub use domain::{Currency, RateDate, RateKind, RateRecord};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::ValidationError;
pub use reconcile::{ChartPoint, RateBoard};
pub use service::{FetchOutcome, RateService, DEFAULT_WEEKLY_WINDOW, TODAY_TTL_MS};
pub use source::{ProviderId, RateQuery, RateSource, SourceError, SourceErrorKind};
