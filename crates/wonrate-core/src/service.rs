//! Fetch-cycle orchestration: date windows, cache policy, merge.
//!
//! The service owns the decision between cached and fresh data. Past
//! dates are immutable once cached; only "today" (and a not-yet-reached
//! cutover date) is ever refetched, and then only after the freshness
//! threshold lapses. A refetch failure never discards what the cache
//! already holds.

use std::sync::Arc;

use futures::future::join_all;
use time::OffsetDateTime;

use crate::adapters::{MockAdapter, OpenBankingAdapter, ScrapeAdapter, SnapshotAdapter};
use crate::cache::{epoch_millis, CacheEntry, CacheKey, CacheStore};
use crate::calendar::{self, CutoverRule};
use crate::envelope::EnvelopeError;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::source::{ProviderId, RateQuery, RateSource, SourceError};
use crate::{reconcile, Config, Currency, RateDate, RateRecord};

/// Freshness threshold for the current publish date.
pub const TODAY_TTL_MS: i64 = 60 * 60 * 1000;
/// How many recent anchor dates a weekly fetch cycle targets.
pub const DEFAULT_WEEKLY_WINDOW: usize = 4;

/// Result of one fetch cycle: the merged, deduplicated, date-descending
/// dataset plus everything a consumer needs to explain it.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<RateRecord>,
    pub source_chain: Vec<ProviderId>,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl FetchOutcome {
    fn new(provider: ProviderId) -> Self {
        Self {
            records: Vec::new(),
            source_chain: vec![provider],
            cache_hit: false,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }
}

struct FetchJob {
    key: CacheKey,
    query: RateQuery,
    stale: Option<CacheEntry>,
}

/// Orchestrates one configured source over the cache.
pub struct RateService {
    source: Arc<dyn RateSource>,
    cache: CacheStore,
    allow_mock: bool,
    weekly_window: usize,
    cutover: CutoverRule,
}

impl RateService {
    pub fn new(source: Arc<dyn RateSource>, cache: CacheStore, allow_mock: bool) -> Self {
        Self {
            source,
            cache,
            allow_mock,
            weekly_window: DEFAULT_WEEKLY_WINDOW,
            cutover: CutoverRule::default(),
        }
    }

    pub fn with_weekly_window(mut self, window: usize) -> Self {
        self.weekly_window = window;
        self
    }

    /// Builds the service for one configured provider.
    ///
    /// Missing open-banking credentials are deliberately not an error
    /// here: the adapter fails closed per call and the cycle falls back,
    /// mirroring the non-fatal config policy. Only a snapshot source
    /// without a snapshot URL cannot operate at all.
    pub fn from_config(config: &Config, provider: ProviderId) -> Result<Self, SourceError> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

        let source: Arc<dyn RateSource> = match provider {
            ProviderId::Snapshot => {
                let url = config.snapshot_url.clone().ok_or_else(|| {
                    SourceError::config("snapshot source selected but WONRATE_SNAPSHOT_URL is not set")
                })?;
                Arc::new(SnapshotAdapter::new(url, http))
            }
            ProviderId::Scrape => Arc::new(
                ScrapeAdapter::new(config.proxy_base.clone(), http)
                    .with_lookback_days(config.lookback_days),
            ),
            ProviderId::OpenBanking => {
                let credentials = config
                    .openbanking_base
                    .as_ref()
                    .and_then(|_| config.open_banking_credentials());
                Arc::new(OpenBankingAdapter::new(
                    config.openbanking_base.clone().unwrap_or_default(),
                    credentials,
                    http,
                ))
            }
            ProviderId::Mock => Arc::new(MockAdapter),
        };

        let cache = match &config.cache_file {
            Some(path) => CacheStore::with_file(path),
            None => CacheStore::in_memory(),
        };

        Ok(Self::new(source, cache, config.allow_mock))
    }

    pub fn provider(&self) -> ProviderId {
        self.source.id()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// One fetch cycle against the wall clock.
    pub async fn fetch_cycle(&self) -> FetchOutcome {
        self.fetch_cycle_at(OffsetDateTime::now_utc()).await
    }

    /// One fetch cycle at an explicit instant, windowed by the source's
    /// publishing cadence.
    pub async fn fetch_cycle_at(&self, now: OffsetDateTime) -> FetchOutcome {
        match self.source.id() {
            ProviderId::Snapshot => self.snapshot_cycle(now).await,
            ProviderId::Scrape => self.history_cycle(now).await,
            ProviderId::OpenBanking | ProviderId::Mock => {
                let dates = self.weekly_window_dates(now);
                self.fetch_dates(now, &dates).await
            }
        }
    }

    /// Target dates for a weekly-cadence source: the recent anchor dates
    /// plus, past the cutoff, the upcoming anchor date.
    pub fn weekly_window_dates(&self, now: OffsetDateTime) -> Vec<RateDate> {
        let mut dates = Vec::with_capacity(self.weekly_window + 1);
        if let Some(next) = calendar::cutover_date(now, &self.cutover) {
            dates.push(next);
        }
        dates.extend(calendar::recent_anchor_dates(
            now,
            self.cutover.anchor,
            self.weekly_window,
        ));
        dates
    }

    /// Cache-aware fetch over an explicit set of target dates.
    pub async fn fetch_dates(&self, now: OffsetDateTime, dates: &[RateDate]) -> FetchOutcome {
        let today = calendar::today(now);
        let now_ms = epoch_millis(now);
        let mut outcome = FetchOutcome::new(self.source.id());
        // Mock output is never cached, and never served from cache.
        let use_cache = self.source.id() != ProviderId::Mock;

        let mut cached_records = Vec::new();
        let mut jobs = Vec::new();

        for &date in dates {
            for currency in Currency::ALL {
                let key = CacheKey::new(self.source.id(), date, Some(currency));
                let cached = if use_cache { self.cache.get(&key).await } else { None };

                match cached {
                    Some(entry) if date < today || entry.age_ms(now_ms) < TODAY_TTL_MS => {
                        cached_records.extend(entry.records);
                    }
                    stale => jobs.push(FetchJob {
                        key,
                        query: RateQuery::unit(date, currency),
                        stale,
                    }),
                }
            }
        }

        outcome.cache_hit = jobs.is_empty();
        let fresh = self.run_jobs(&mut outcome, now_ms, jobs).await;
        outcome.records = reconcile::merge_records(cached_records, fresh);
        dedup_errors(&mut outcome.errors);

        if outcome.records.is_empty() && self.source.id() != ProviderId::Mock {
            self.mock_fallback(dates, &mut outcome);
        }

        outcome
    }

    async fn snapshot_cycle(&self, now: OffsetDateTime) -> FetchOutcome {
        let mut outcome = FetchOutcome::new(self.source.id());

        match self.source.fetch(RateQuery::all()).await {
            Ok(records) if !records.is_empty() => {
                outcome.records = reconcile::merge_records(records, Vec::new());
            }
            Ok(_) => {
                outcome
                    .warnings
                    .push("snapshot loaded but contained no records".to_owned());
                self.mock_fallback(&self.weekly_window_dates(now), &mut outcome);
            }
            Err(error) => {
                outcome
                    .errors
                    .push(EnvelopeError::from_source_error(self.source.id(), &error));
                self.mock_fallback(&self.weekly_window_dates(now), &mut outcome);
            }
        }

        outcome
    }

    /// Daily-history cycle: per-currency lookback payloads cached under
    /// the current publish date.
    async fn history_cycle(&self, now: OffsetDateTime) -> FetchOutcome {
        let today = calendar::today(now);
        let now_ms = epoch_millis(now);
        let mut outcome = FetchOutcome::new(self.source.id());

        let mut cached_records = Vec::new();
        let mut jobs = Vec::new();

        for currency in Currency::ALL {
            let key = CacheKey::new(self.source.id(), today, Some(currency));
            match self.cache.get(&key).await {
                Some(entry) if entry.age_ms(now_ms) < TODAY_TTL_MS => {
                    cached_records.extend(entry.records);
                }
                stale => jobs.push(FetchJob {
                    key,
                    query: RateQuery::for_currency(currency),
                    stale,
                }),
            }
        }

        outcome.cache_hit = jobs.is_empty();
        let fresh = self.run_jobs(&mut outcome, now_ms, jobs).await;
        outcome.records = reconcile::merge_records(cached_records, fresh);
        dedup_errors(&mut outcome.errors);

        if outcome.records.is_empty() {
            self.mock_fallback(&self.weekly_window_dates(now), &mut outcome);
        }

        outcome
    }

    /// Runs the missing-unit fetches concurrently, each wrapped so a
    /// failure degrades to an omission (or a stale serve) instead of
    /// taking the batch down.
    async fn run_jobs(
        &self,
        outcome: &mut FetchOutcome,
        now_ms: i64,
        jobs: Vec<FetchJob>,
    ) -> Vec<RateRecord> {
        if jobs.is_empty() {
            return Vec::new();
        }

        let results = join_all(jobs.iter().map(|job| self.source.fetch(job.query))).await;

        let mut fresh = Vec::new();
        for (job, result) in jobs.into_iter().zip(results) {
            match result {
                Ok(records) if !records.is_empty() => {
                    if self.source.id() != ProviderId::Mock {
                        self.cache
                            .put(&job.key, CacheEntry::new(records.clone(), now_ms))
                            .await;
                    }
                    fresh.extend(records);
                }
                Ok(_) => {
                    if let Some(stale) = job.stale {
                        outcome.warnings.push(format!(
                            "{}: upstream returned no rows, serving cached data",
                            describe(&job.key)
                        ));
                        fresh.extend(stale.records);
                    }
                }
                Err(error) => {
                    outcome
                        .errors
                        .push(EnvelopeError::from_source_error(self.source.id(), &error));
                    if let Some(stale) = job.stale {
                        outcome.warnings.push(format!(
                            "{}: refetch failed, serving cached data",
                            describe(&job.key)
                        ));
                        fresh.extend(stale.records);
                    }
                }
            }
        }

        fresh
    }

    fn mock_fallback(&self, dates: &[RateDate], outcome: &mut FetchOutcome) {
        if !self.allow_mock {
            outcome
                .warnings
                .push("no rate data available and mock fallback is disabled".to_owned());
            return;
        }

        let records: Vec<RateRecord> = dates
            .iter()
            .flat_map(|date| MockAdapter::records_for_date(*date))
            .collect();

        outcome.records = reconcile::merge_records(Vec::new(), records);
        outcome.source_chain.push(ProviderId::Mock);
        outcome
            .warnings
            .push("serving deterministic mock data; no real source was reachable".to_owned());
    }
}

fn describe(key: &CacheKey) -> String {
    match key.currency {
        Some(currency) => format!("{} {}", currency.code(), key.date),
        None => key.date.to_string(),
    }
}

/// Collapses repeated identical failures (one per fanned-out unit) into
/// a single reported error.
fn dedup_errors(errors: &mut Vec<EnvelopeError>) {
    let mut seen = std::collections::HashSet::new();
    errors.retain(|error| seen.insert((error.code.clone(), error.message.clone())));
}
