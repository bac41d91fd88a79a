use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::calendar::PUBLISH_OFFSET;
use crate::http::{HttpClient, HttpRequest};
use crate::normalize::parse_rate;
use crate::source::{ProviderId, RateQuery, RateSource, SourceError};
use crate::{RateKind, RateRecord};

const API_NAME: &str = "InquireExchangeRate";
const SUCCESS_CODE: &str = "00000";

const COMPACT_TIME: &[BorrowedFormatItem<'static>] = format_description!("[hour][minute][second]");
const COMPACT_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Credential set for the rate-inquiry endpoint.
///
/// Always injected through configuration; there are no baked-in values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBankingCredentials {
    pub access_token: String,
    pub institution_code: String,
    pub fintech_app_no: String,
    pub api_service_code: String,
}

/// Queries the bank's open rate-inquiry API, one POST per currency.
pub struct OpenBankingAdapter {
    base: String,
    credentials: Option<OpenBankingCredentials>,
    http: Arc<dyn HttpClient>,
}

impl OpenBankingAdapter {
    pub fn new(
        base: impl Into<String>,
        credentials: Option<OpenBankingCredentials>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            base: base.into(),
            credentials,
            http,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn inquiry_url(&self) -> String {
        format!("{}/{API_NAME}.nh", self.base.trim_end_matches('/'))
    }

    fn request_body(
        &self,
        credentials: &OpenBankingCredentials,
        query: &RateQuery,
        now: OffsetDateTime,
    ) -> Result<String, SourceError> {
        let local = now.to_offset(PUBLISH_OFFSET);
        let date = query
            .date
            .ok_or_else(|| SourceError::parse("rate inquiry requires a target date"))?;
        let currency = query
            .currency
            .ok_or_else(|| SourceError::parse("rate inquiry requires a currency"))?;

        let header = InquiryHeader {
            api_name: API_NAME.to_owned(),
            transmit_date: local
                .format(format_description!("[year][month][day]"))
                .expect("calendar dates are always formattable"),
            transmit_time: local
                .format(COMPACT_TIME)
                .expect("times are always formattable"),
            institution_code: credentials.institution_code.clone(),
            fintech_app_no: credentials.fintech_app_no.clone(),
            api_service_code: credentials.api_service_code.clone(),
            transaction_id: transaction_id(local),
            access_token: credentials.access_token.clone(),
        };

        let request = InquiryRequest {
            header,
            btb: "0".to_owned(),
            currency_code: currency.code().to_owned(),
            inquiry_date: date.compact(),
        };

        serde_json::to_string(&request)
            .map_err(|error| SourceError::parse(format!("rate inquiry body failed to encode: {error}")))
    }
}

impl RateSource for OpenBankingAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenBanking
    }

    fn fetch<'a>(
        &'a self,
        query: RateQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RateRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(credentials) = &self.credentials else {
                return Err(SourceError::config(
                    "open-banking credentials are not configured",
                ));
            };

            let body = self.request_body(credentials, &query, OffsetDateTime::now_utc())?;
            let request = HttpRequest::post_json(self.inquiry_url(), body);

            let response = self.http.execute(request).await.map_err(|error| {
                SourceError::network(format!("rate inquiry failed: {}", error.message()))
            })?;

            if !response.is_success() {
                return Err(SourceError::upstream_status(format!(
                    "rate inquiry endpoint returned status {}",
                    response.status
                )));
            }

            let payload: InquiryResponse =
                serde_json::from_slice(&response.body).map_err(|error| {
                    SourceError::parse(format!("rate inquiry response is not valid JSON: {error}"))
                })?;

            if payload.header.response_code != SUCCESS_CODE {
                return Err(SourceError::upstream_status(format!(
                    "rate inquiry returned Rpcd {}{}",
                    payload.header.response_code,
                    payload
                        .header
                        .response_message
                        .as_deref()
                        .map(|msg| format!(": {msg}"))
                        .unwrap_or_default()
                )));
            }

            // These two are validated by request_body above.
            let date = query
                .date
                .ok_or_else(|| SourceError::parse("rate inquiry requires a target date"))?;
            let currency = query
                .currency
                .ok_or_else(|| SourceError::parse("rate inquiry requires a currency"))?;

            Ok(payload
                .records
                .into_iter()
                .map(|row| {
                    RateRecord::new(currency, date, parse_rate(&row.base_rate), RateKind::Bank)
                        .with_quotes(
                            Some(parse_rate(&row.cash_buy)),
                            Some(parse_rate(&row.cash_sell)),
                            Some(parse_rate(&row.tt_buy)),
                            Some(parse_rate(&row.tt_sell)),
                        )
                })
                .collect())
        })
    }
}

/// Per-call transaction id: 14-digit local timestamp plus 6 random digits.
fn transaction_id(local: OffsetDateTime) -> String {
    let stamp = local
        .format(COMPACT_STAMP)
        .expect("timestamps are always formattable");
    format!("{stamp}{:06}", fastrand::u32(0..1_000_000))
}

#[derive(Debug, Serialize)]
struct InquiryHeader {
    #[serde(rename = "ApiNm")]
    api_name: String,
    #[serde(rename = "Tsymd")]
    transmit_date: String,
    #[serde(rename = "Trtm")]
    transmit_time: String,
    #[serde(rename = "Iscd")]
    institution_code: String,
    #[serde(rename = "FintechApsno")]
    fintech_app_no: String,
    #[serde(rename = "ApiSvcCd")]
    api_service_code: String,
    #[serde(rename = "IsTuno")]
    transaction_id: String,
    #[serde(rename = "AccessToken")]
    access_token: String,
}

#[derive(Debug, Serialize)]
struct InquiryRequest {
    #[serde(rename = "Header")]
    header: InquiryHeader,
    #[serde(rename = "Btb")]
    btb: String,
    #[serde(rename = "Crcd")]
    currency_code: String,
    #[serde(rename = "Inymd")]
    inquiry_date: String,
}

#[derive(Debug, Deserialize)]
struct InquiryResponse {
    #[serde(rename = "Header")]
    header: InquiryResponseHeader,
    #[serde(rename = "REC", default)]
    records: Vec<InquiryRow>,
}

#[derive(Debug, Deserialize)]
struct InquiryResponseHeader {
    #[serde(rename = "Rpcd")]
    response_code: String,
    // The upstream emits this field name with a trailing space.
    #[serde(rename = "Rsms ", alias = "Rsms", default)]
    response_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InquiryRow {
    #[serde(rename = "BrgnBsrt", default)]
    base_rate: String,
    #[serde(rename = "CshBnrt", default)]
    cash_buy: String,
    #[serde(rename = "CshSlrt", default)]
    cash_sell: String,
    #[serde(rename = "TlchPrnlBnrt", default)]
    tt_buy: String,
    #[serde(rename = "TlchPrnlSlrt", default)]
    tt_sell: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use crate::{Currency, RateDate};
    use std::sync::Mutex;
    use time::macros::datetime;

    struct RecordingHttpClient {
        response: HttpResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn new(response: HttpResponse) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn credentials() -> OpenBankingCredentials {
        OpenBankingCredentials {
            access_token: "test-token".to_owned(),
            institution_code: "000000".to_owned(),
            fintech_app_no: "001".to_owned(),
            api_service_code: "DrawingTransferA".to_owned(),
        }
    }

    const SUCCESS_BODY: &str = r#"{
        "Header": {"Rpcd": "00000", "Rsms ": "정상처리"},
        "Iqtcnt": "1",
        "REC": [{
            "Crcd": "USD",
            "BrgnBsrt": "1,330.50",
            "CshBnrt": "1,345.00",
            "CshSlrt": "1,316.00",
            "TlchPrnlBnrt": "1,341.00",
            "TlchPrnlSlrt": "1,320.00"
        }]
    }"#;

    #[tokio::test]
    async fn success_response_normalizes_every_quote_variant() {
        let http = Arc::new(RecordingHttpClient::new(HttpResponse::ok(SUCCESS_BODY)));
        let adapter =
            OpenBankingAdapter::new("https://openapi.test", Some(credentials()), http.clone());

        let date = RateDate::parse("2024-03-01").expect("must parse");
        let records = adapter
            .fetch(RateQuery::unit(date, Currency::Usd))
            .await
            .expect("fetch should succeed");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "20240301-USD");
        assert_eq!(record.rate, 1330.5);
        assert_eq!(record.cash_buy, Some(1345.0));
        assert_eq!(record.cash_sell, Some(1316.0));
        assert_eq!(record.tt_buy, Some(1341.0));
        assert_eq!(record.tt_sell, Some(1320.0));

        let requests = http.requests.lock().expect("not poisoned");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("/InquireExchangeRate.nh"));
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().expect("body present"))
                .expect("body is JSON");
        assert_eq!(body["Header"]["ApiNm"], API_NAME);
        assert_eq!(body["Header"]["AccessToken"], "test-token");
        assert_eq!(body["Crcd"], "USD");
        assert_eq!(body["Inymd"], "20240301");
        let tuno = body["Header"]["IsTuno"].as_str().expect("IsTuno present");
        assert_eq!(tuno.len(), 20);
        assert!(tuno.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[tokio::test]
    async fn non_success_rpcd_is_an_upstream_error() {
        let body = r#"{"Header": {"Rpcd": "E1001", "Rsms ": "invalid token"}, "REC": []}"#;
        let http = Arc::new(RecordingHttpClient::new(HttpResponse::ok(body)));
        let adapter = OpenBankingAdapter::new("https://openapi.test", Some(credentials()), http);

        let date = RateDate::parse("2024-03-01").expect("must parse");
        let error = adapter
            .fetch(RateQuery::unit(date, Currency::Usd))
            .await
            .expect_err("fetch should fail");

        assert_eq!(error.code(), "source.upstream_status");
        assert!(error.message().contains("E1001"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_closed_without_a_network_call() {
        let http = Arc::new(RecordingHttpClient::new(HttpResponse::ok(SUCCESS_BODY)));
        let adapter = OpenBankingAdapter::new("https://openapi.test", None, http.clone());

        let date = RateDate::parse("2024-03-01").expect("must parse");
        let error = adapter
            .fetch(RateQuery::unit(date, Currency::Usd))
            .await
            .expect_err("fetch should fail");

        assert_eq!(error.code(), "source.config");
        assert!(http.requests.lock().expect("not poisoned").is_empty());
    }

    #[test]
    fn transaction_ids_are_twenty_digits_anchored_on_the_timestamp() {
        let local = datetime!(2024-03-01 09:30:15 +9);
        let tuno = transaction_id(local);
        assert_eq!(tuno.len(), 20);
        assert!(tuno.starts_with("20240301093015"));
    }
}
