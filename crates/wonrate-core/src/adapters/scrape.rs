use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use log::warn;
use scraper::{Html, Selector};
use time::{Duration, OffsetDateTime};

use crate::calendar::PUBLISH_OFFSET;
use crate::http::{HttpClient, HttpRequest};
use crate::normalize;
use crate::source::{ProviderId, RateQuery, RateSource, SourceError};
use crate::{Currency, RateDate, RateRecord};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
/// Runaway guard: the daily-quote history is paginated and the lookback
/// window fits comfortably in this many pages.
pub const DEFAULT_MAX_PAGES: u32 = 12;

/// Scrapes the proxied daily-quote pages, one currency at a time.
///
/// The upstream serves EUC-KR bytes; rows are pulled out of the quote
/// table by ordinal cell position through the shared normalizer.
pub struct ScrapeAdapter {
    proxy_base: String,
    http: Arc<dyn HttpClient>,
    lookback_days: i64,
    max_pages: u32,
}

impl ScrapeAdapter {
    pub fn new(proxy_base: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            proxy_base: proxy_base.into(),
            http,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days.max(1);
        self
    }

    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages.max(1);
        self
    }

    fn page_url(&self, currency: Currency, page: u32) -> String {
        format!(
            "{}/marketindex/exchangeDailyQuote.naver?marketindexCd={}&page={}",
            self.proxy_base.trim_end_matches('/'),
            urlencoding::encode(currency.market_index_code()),
            page
        )
    }

    async fn fetch_page(&self, currency: Currency, page: u32) -> Result<String, SourceError> {
        let request = HttpRequest::get(self.page_url(currency, page))
            .with_header("user-agent", "Mozilla/5.0 (compatible; wonrate/0.1)");

        let response = self.http.execute(request).await.map_err(|error| {
            SourceError::network(format!(
                "daily quote fetch failed for {currency} page {page}: {}",
                error.message()
            ))
        })?;

        if !response.is_success() {
            return Err(SourceError::upstream_status(format!(
                "daily quote endpoint returned status {} for {currency} page {page}",
                response.status
            )));
        }

        let (text, _, had_errors) = encoding_rs::EUC_KR.decode(&response.body);
        if had_errors {
            warn!("daily quote page for {currency} contained undecodable EUC-KR bytes");
        }

        Ok(text.into_owned())
    }

    /// Walks the paginated history for one currency until the page comes
    /// back empty, the oldest row falls outside the lookback window, or
    /// the page cap is reached, whichever happens first.
    pub async fn fetch_history(
        &self,
        currency: Currency,
        now: OffsetDateTime,
    ) -> Result<Vec<RateRecord>, SourceError> {
        let cutoff = RateDate::new(
            now.to_offset(PUBLISH_OFFSET).date() - Duration::days(self.lookback_days),
        );

        let mut collected = Vec::new();
        let mut page = 1;

        while page <= self.max_pages {
            let html = self.fetch_page(currency, page).await?;
            let rows = parse_daily_quote_rows(&html, currency);

            let Some(oldest) = rows.last().map(|record| record.date) else {
                break;
            };

            collected.extend(rows.into_iter().filter(|record| record.date >= cutoff));

            if oldest < cutoff {
                break;
            }
            page += 1;
        }

        Ok(collected)
    }

    /// Just the newest published row for one currency (page 1, first row).
    pub async fn latest(&self, currency: Currency) -> Result<Option<RateRecord>, SourceError> {
        let html = self.fetch_page(currency, 1).await?;
        Ok(parse_daily_quote_rows(&html, currency).into_iter().next())
    }
}

impl RateSource for ScrapeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Scrape
    }

    fn fetch<'a>(
        &'a self,
        query: RateQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RateRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(currency) = query.currency else {
                return Err(SourceError::parse(
                    "daily quote scrape requires a currency".to_owned(),
                ));
            };

            let history = self.fetch_history(currency, OffsetDateTime::now_utc()).await?;
            Ok(match query.date {
                Some(date) => history.into_iter().filter(|r| r.date == date).collect(),
                None => history,
            })
        })
    }
}

/// Extracts quote rows from one page of the daily-quote table.
///
/// Kept synchronous so the parsed DOM never crosses an await point.
fn parse_daily_quote_rows(html: &str, currency: Currency) -> Vec<RateRecord> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tbody tr").expect("static selector is valid");
    let cell_selector = Selector::parse("td").expect("static selector is valid");

    document
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_owned())
                .collect();
            normalize::row_to_record(&cells, currency)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::datetime;

    fn quote_page(rows: &[(&str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(date, rate)| {
                format!(
                    "<tr><td>{date}</td><td>{rate}</td><td>0.5</td><td>1,345.00</td>\
                     <td>1,316.00</td><td>1,320.00</td><td>1,341.00</td></tr>"
                )
            })
            .collect();
        format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
    }

    struct PagedHttpClient {
        pages: HashMap<u32, String>,
        calls: AtomicUsize,
    }

    impl PagedHttpClient {
        fn new(pages: HashMap<u32, String>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HttpClient for PagedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let page: u32 = request
                .url
                .rsplit("page=")
                .next()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(1);
            let body = self.pages.get(&page).cloned().unwrap_or_else(|| quote_page(&[]));
            Box::pin(async move { Ok(HttpResponse::ok(body)) })
        }
    }

    #[tokio::test]
    async fn stops_when_a_page_comes_back_empty() {
        let mut pages = HashMap::new();
        pages.insert(1, quote_page(&[("2024.03.08", "1,330.50"), ("2024.03.07", "1,329.00")]));
        // Page 2 intentionally absent: the client serves an empty table.

        let http = Arc::new(PagedHttpClient::new(pages));
        let adapter = ScrapeAdapter::new("https://proxy.test", http.clone());

        let now = datetime!(2024-03-08 12:00 UTC);
        let history = adapter
            .fetch_history(Currency::Usd, now)
            .await
            .expect("fetch should succeed");

        assert_eq!(history.len(), 2);
        assert_eq!(http.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_once_the_oldest_row_predates_the_cutoff() {
        let mut pages = HashMap::new();
        pages.insert(1, quote_page(&[("2024.03.08", "1,330.50"), ("2024.03.01", "1,320.00")]));
        pages.insert(2, quote_page(&[("2023.11.01", "1,300.00")]));
        pages.insert(3, quote_page(&[("2023.10.01", "1,290.00")]));

        let http = Arc::new(PagedHttpClient::new(pages));
        let adapter = ScrapeAdapter::new("https://proxy.test", http.clone());

        let now = datetime!(2024-03-08 12:00 UTC);
        let history = adapter
            .fetch_history(Currency::Usd, now)
            .await
            .expect("fetch should succeed");

        // The out-of-window row is dropped and pagination does not reach page 3.
        assert_eq!(history.len(), 2);
        assert_eq!(http.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn page_cap_bounds_a_runaway_history() {
        let mut pages = HashMap::new();
        for page in 1..=10 {
            pages.insert(page, quote_page(&[("2024.03.08", "1,330.50")]));
        }

        let http = Arc::new(PagedHttpClient::new(pages));
        let adapter = ScrapeAdapter::new("https://proxy.test", http.clone()).with_max_pages(3);

        let now = datetime!(2024-03-08 12:00 UTC);
        let history = adapter
            .fetch_history(Currency::Usd, now)
            .await
            .expect("fetch should succeed");

        assert_eq!(history.len(), 3);
        assert_eq!(http.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn latest_takes_only_the_first_row_of_page_one() {
        let mut pages = HashMap::new();
        pages.insert(1, quote_page(&[("2024.03.08", "1,330.50"), ("2024.03.07", "1,329.00")]));

        let http = Arc::new(PagedHttpClient::new(pages));
        let adapter = ScrapeAdapter::new("https://proxy.test", http.clone());

        let newest = adapter
            .latest(Currency::Usd)
            .await
            .expect("fetch should succeed")
            .expect("page has rows");

        assert_eq!(newest.id, "20240308-USD");
        assert_eq!(http.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rows_with_missing_cells_are_skipped() {
        let html = "<html><body><table><tbody>\
             <tr><td>2024.03.08</td><td>1,330.50</td></tr>\
             <tr><td>2024.03.07</td><td>1,329.00</td><td>0.5</td><td>1,344.00</td>\
             <td>1,315.00</td><td>1,319.00</td><td>1,340.00</td></tr>\
             </tbody></table></body></html>";

        let rows = parse_daily_quote_rows(html, Currency::Usd);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "20240307-USD");
    }

    #[test]
    fn page_url_carries_market_index_code_and_page() {
        let http = Arc::new(PagedHttpClient::new(HashMap::new()));
        let adapter = ScrapeAdapter::new("https://proxy.test/", http);
        assert_eq!(
            adapter.page_url(Currency::Jpy, 2),
            "https://proxy.test/marketindex/exchangeDailyQuote.naver?marketindexCd=FX_JPYKRW&page=2"
        );
    }
}
