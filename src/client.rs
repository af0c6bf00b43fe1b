//! Async HTTP client: session management, retries, and listing endpoints.
//!
//! One [`Client`] owns a connection pool and a concurrency cap; all listing
//! and detail operations go through [`Client::fetch`], which implements the
//! retry contract (429 surfaces immediately, 404 becomes an empty body,
//! transient failures back off exponentially).

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Method, StatusCode};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::list::{parse_categories, parse_video_list};
use crate::options::Options;
use crate::patterns::{CATEGORY_URL, ROOT_URL, SEARCH_URL};
use crate::result::{CategoryEntry, VideoSummary};
use crate::video::Video;

#[allow(clippy::expect_used)]
static SEARCH_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse(SEARCH_URL).expect("SEARCH_URL parses"));

#[allow(clippy::expect_used)]
static CATEGORY_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse(CATEGORY_URL).expect("CATEGORY_URL parses"));

/// Sort order accepted by search and category listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first (the site default, sent as no parameter).
    #[default]
    Newest,
    MostViewed,
    TopRated,
    Longest,
    Random,
}

impl SortOrder {
    /// Query-parameter value for this sort order.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::MostViewed => "most-viewed",
            Self::TopRated => "top-rated",
            Self::Longest => "longest",
            Self::Random => "random",
        }
    }
}

/// Time window accepted by popular and top-rated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    /// All time (the site default, sent as no parameter).
    #[default]
    AllTime,
    Today,
    Week,
    Month,
    Year,
}

impl TimeFilter {
    /// Query-parameter value for this time window.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllTime => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Async scraping client for the site.
///
/// Cheap to clone is not a goal here; share one instance. The client caps
/// in-flight requests at `Options::max_connections` and keeps at most
/// `Options::max_connections_per_host` idle connections pooled.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    options: Options,
    permits: Arc<Semaphore>,
}

impl Client {
    /// Build a client from the given options.
    ///
    /// Fails with [`Error::Config`] when the proxy URL is invalid or the
    /// TLS backend cannot be initialized.
    pub fn new(options: Options) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );

        let mut builder = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .default_headers(headers)
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.max_connections_per_host);

        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| Error::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(|e| Error::Config(e.to_string()))?;
        let permits = Arc::new(Semaphore::new(options.max_connections.max(1)));

        Ok(Self {
            http,
            options,
            permits,
        })
    }

    /// Options this client was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Fetch a URL with GET and return the response body.
    ///
    /// `max_retries` is the total attempt count. A 429 returns
    /// [`Error::RateLimited`] without retrying, a 404 returns an empty
    /// string, and a proxy connect failure returns [`Error::ProxyFailure`]
    /// immediately. Everything else is retried with exponential backoff
    /// (`retry_backoff * 2^attempt`) until attempts are exhausted.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        self.request(Method::GET, url, None).await
    }

    /// POST a url-encoded form, under the same retry contract as `fetch`.
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String> {
        self.request(Method::POST, url, Some(form)).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::NetworkFailure("client closed".to_string()))?;

        let attempts = self.options.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                sleep(backoff_delay(self.options.retry_backoff, attempt)).await;
            }

            let mut request = self.http.request(method.clone(), url);
            if let Some(form) = form {
                request = request.form(form);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        warn!(url, "rate limited");
                        return Err(Error::RateLimited);
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Ok(String::new());
                    }
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => return Ok(body),
                            Err(err) => {
                                debug!(url, attempt, error = %err, "body read failed");
                                last_error =
                                    Some(Error::NetworkFailure(err.to_string()));
                            }
                        }
                    } else {
                        debug!(url, attempt, %status, "retryable response status");
                        last_error = Some(Error::NetworkFailure(format!(
                            "status {status} for {url}"
                        )));
                    }
                }
                Err(err) => {
                    if err.is_connect() && self.options.proxy.is_some() {
                        return Err(Error::ProxyFailure(err.to_string()));
                    }
                    debug!(url, attempt, error = %err, "request failed");
                    last_error = Some(if err.is_timeout() {
                        Error::NetworkFailure(format!("request timeout for {url}"))
                    } else {
                        Error::NetworkFailure(err.to_string())
                    });
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::NetworkFailure(format!("max retries exceeded for {url}"))))
    }

    /// Fetch one video's detail page by id, slug, or URL.
    pub async fn video(&self, id_or_url: &str) -> Result<Video> {
        let mut video = Video::new(id_or_url)?;
        video.fetch(self).await?;
        Ok(video)
    }

    /// Search with default sort and time window.
    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<VideoSummary>> {
        self.search_with(query, page, SortOrder::default(), TimeFilter::default())
            .await
    }

    /// Search with explicit sort and time window.
    ///
    /// The path-based search URL is tried first; when it yields an empty
    /// page the query-parameter format is tried once as a fallback.
    pub async fn search_with(
        &self,
        query: &str,
        page: u32,
        sort: SortOrder,
        time_filter: TimeFilter,
    ) -> Result<Vec<VideoSummary>> {
        let html = self
            .fetch(&search_url(query, page, sort, time_filter))
            .await?;
        if !html.trim().is_empty() {
            return Ok(parse_video_list(&html));
        }

        debug!(query, "path search empty, trying query-parameter format");
        let html = self
            .fetch(&search_fallback_url(query, page, sort, time_filter))
            .await?;
        Ok(parse_video_list(&html))
    }

    /// List a category page, falling back to search when it 404s.
    pub async fn category(
        &self,
        category: &str,
        page: u32,
        sort: SortOrder,
    ) -> Result<Vec<VideoSummary>> {
        let html = self.fetch(&category_url(category, page, sort)).await?;
        if !html.trim().is_empty() {
            return Ok(parse_video_list(&html));
        }

        debug!(category, "category page empty, falling back to search");
        let html = self
            .fetch(&search_url(category, page, sort, TimeFilter::AllTime))
            .await?;
        Ok(parse_video_list(&html))
    }

    /// Latest videos (the homepage for page 1).
    pub async fn latest(&self, page: u32) -> Result<Vec<VideoSummary>> {
        let html = self.fetch(&latest_url(page)).await?;
        Ok(parse_video_list(&html))
    }

    /// Most viewed videos within a time window.
    pub async fn popular(
        &self,
        page: u32,
        time_filter: TimeFilter,
    ) -> Result<Vec<VideoSummary>> {
        let html = self
            .fetch(&listing_url("most-viewed", page, time_filter))
            .await?;
        Ok(parse_video_list(&html))
    }

    /// Top rated videos within a time window.
    pub async fn top_rated(
        &self,
        page: u32,
        time_filter: TimeFilter,
    ) -> Result<Vec<VideoSummary>> {
        let html = self
            .fetch(&listing_url("top-rated", page, time_filter))
            .await?;
        Ok(parse_video_list(&html))
    }

    /// Pick a random video by sampling a few listing pages.
    ///
    /// The site's own `/random/` page is often cached, so randomness comes
    /// from shuffling local sources instead: the homepage, popular and
    /// top-rated listings, plus two random deep pages. Up to three sources
    /// are scanned (at most 30 records, stopping early at 15) and one record
    /// is picked at random and fetched in full.
    pub async fn random_video(&self) -> Result<Option<Video>> {
        let mut sources = vec![
            ROOT_URL.to_string(),
            format!("{ROOT_URL}/most-viewed/"),
            format!("{ROOT_URL}/top-rated/"),
        ];
        {
            let mut rng = rand::thread_rng();
            let page: u32 = rng.gen_range(1..=10);
            sources.push(format!("{ROOT_URL}/latest/{page}/"));
            let page: u32 = rng.gen_range(1..=10);
            sources.push(format!("{ROOT_URL}/most-viewed/{page}/"));
            sources.shuffle(&mut rng);
        }

        let mut collected: Vec<VideoSummary> = Vec::new();
        for url in sources.iter().take(3) {
            let html = match self.fetch(url).await {
                Ok(html) => html,
                Err(err) => {
                    debug!(url, error = %err, "random source failed");
                    continue;
                }
            };
            if html.trim().is_empty() {
                continue;
            }
            for summary in parse_video_list(&html) {
                collected.push(summary);
                if collected.len() >= 30 {
                    break;
                }
            }
            if collected.len() >= 15 {
                break;
            }
        }

        if collected.is_empty() {
            return Ok(None);
        }

        let pick = {
            let mut rng = rand::thread_rng();
            rng.gen_range(0..collected.len())
        };
        let summary = collected.swap_remove(pick);
        self.video(&summary.url).await.map(Some)
    }

    /// List all categories from the categories page.
    pub async fn categories(&self) -> Result<Vec<CategoryEntry>> {
        let html = self.fetch(&format!("{ROOT_URL}/categories/")).await?;
        Ok(parse_categories(&html))
    }
}

/// Path-format search URL: `/search/{query}/{page}/` plus filters.
fn search_url(query: &str, page: u32, sort: SortOrder, time_filter: TimeFilter) -> String {
    let mut url = SEARCH_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        segments.push(query.trim());
        if page > 1 {
            segments.push(&page.to_string());
        }
        segments.push("");
    }
    append_filters(&mut url, Some(sort), Some(time_filter));
    url.to_string()
}

/// Query-parameter search URL used when the path format yields nothing.
fn search_fallback_url(
    query: &str,
    page: u32,
    sort: SortOrder,
    time_filter: TimeFilter,
) -> String {
    let mut url = SEARCH_BASE.clone();
    url.query_pairs_mut()
        .append_pair("q", query.trim())
        .append_pair("page", &page.to_string())
        .append_pair("sort", sort.as_str())
        .append_pair("time", time_filter.as_str());
    url.to_string()
}

/// Category listing URL: `/categories/{slug}/{page}/` plus sort.
fn category_url(category: &str, page: u32, sort: SortOrder) -> String {
    let mut url = CATEGORY_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        segments.push(category.trim());
        if page > 1 {
            segments.push(&page.to_string());
        }
        segments.push("");
    }
    append_filters(&mut url, Some(sort), None);
    url.to_string()
}

/// Latest-videos URL; page 1 is the homepage.
fn latest_url(page: u32) -> String {
    if page > 1 {
        format!("{ROOT_URL}/latest/{page}/")
    } else {
        ROOT_URL.to_string()
    }
}

/// Listing URL for a root section with optional page and time filter.
fn listing_url(section: &str, page: u32, time_filter: TimeFilter) -> String {
    let mut url = format!("{ROOT_URL}/{section}/");
    if page > 1 {
        url.push_str(&format!("{page}/"));
    }
    if time_filter != TimeFilter::AllTime {
        url.push_str(&format!("?time={}", time_filter.as_str()));
    }
    url
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`.
///
/// The exponent saturates so a pathological retry count degrades into a
/// very long sleep instead of an arithmetic panic.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Append non-default sort/time filters as query parameters.
fn append_filters(url: &mut Url, sort: Option<SortOrder>, time_filter: Option<TimeFilter>) {
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(sort) = sort.filter(|s| *s != SortOrder::Newest) {
            pairs.append_pair("sort", sort.as_str());
        }
        if let Some(time) = time_filter.filter(|t| *t != TimeFilter::AllTime) {
            pairs.append_pair("time", time.as_str());
        }
    }
    // query_pairs_mut leaves a dangling `?` when nothing was appended
    if url.query() == Some("") {
        url.set_query(None);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[test]
    fn search_url_uses_path_format() {
        assert_eq!(
            search_url("hot clip", 1, SortOrder::Newest, TimeFilter::AllTime),
            "https://www.xxxgfporn.com/search/hot%20clip/"
        );
        assert_eq!(
            search_url("milf", 3, SortOrder::Newest, TimeFilter::AllTime),
            "https://www.xxxgfporn.com/search/milf/3/"
        );
        assert_eq!(
            search_url("milf", 1, SortOrder::MostViewed, TimeFilter::Week),
            "https://www.xxxgfporn.com/search/milf/?sort=most-viewed&time=week"
        );
    }

    #[test]
    fn search_fallback_url_carries_all_parameters() {
        let url = search_fallback_url("hot clip", 2, SortOrder::TopRated, TimeFilter::Month);
        assert!(url.starts_with("https://www.xxxgfporn.com/search/?"));
        assert!(url.contains("q=hot+clip"));
        assert!(url.contains("page=2"));
        assert!(url.contains("sort=top-rated"));
        assert!(url.contains("time=month"));
    }

    #[test]
    fn category_url_appends_page_and_sort() {
        assert_eq!(
            category_url("amateur", 1, SortOrder::Newest),
            "https://www.xxxgfporn.com/categories/amateur/"
        );
        assert_eq!(
            category_url("amateur", 2, SortOrder::TopRated),
            "https://www.xxxgfporn.com/categories/amateur/2/?sort=top-rated"
        );
    }

    #[test]
    fn listing_urls_have_expected_shapes() {
        assert_eq!(latest_url(1), "https://www.xxxgfporn.com");
        assert_eq!(latest_url(4), "https://www.xxxgfporn.com/latest/4/");
        assert_eq!(
            listing_url("most-viewed", 1, TimeFilter::AllTime),
            "https://www.xxxgfporn.com/most-viewed/"
        );
        assert_eq!(
            listing_url("top-rated", 2, TimeFilter::Today),
            "https://www.xxxgfporn.com/top-rated/2/?time=today"
        );
    }

    fn http_response(status: u16, body: &str) -> String {
        let reason = match status {
            200 => "OK",
            404 => "Not Found",
            429 => "Too Many Requests",
            _ => "Error",
        };
        format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve one canned response per connection, counting hits.
    async fn serve_script(
        responses: Vec<String>,
    ) -> (String, std::sync::Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            let mut responses = responses.into_iter();
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let response = responses
                    .next()
                    .unwrap_or_else(|| http_response(200, "fallback"));
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}/"), hits)
    }

    fn fast_client(max_retries: u32) -> Client {
        Client::new(Options {
            max_retries,
            retry_backoff: Duration::from_millis(5),
            ..Options::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_retries_transient_failures_until_success() {
        let (url, hits) = serve_script(vec![
            http_response(500, "boom"),
            http_response(500, "boom"),
            http_response(500, "boom"),
            http_response(200, "ok"),
        ])
        .await;

        let body = fast_client(4).fetch(&url).await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fetch_gives_up_after_max_retries() {
        let (url, hits) = serve_script(vec![
            http_response(500, "boom"),
            http_response(500, "boom"),
            http_response(500, "boom"),
        ])
        .await;

        let err = fast_client(3).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::NetworkFailure(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_delay_saturates_instead_of_panicking() {
        assert_eq!(backoff_delay(Duration::from_secs(1), 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(Duration::from_secs(1), 3), Duration::from_secs(4));
        // An attempt count past the u32 exponent range degrades, not panics.
        assert_eq!(
            backoff_delay(Duration::from_millis(1), 64),
            Duration::from_millis(1) * u32::MAX
        );
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(head_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..head_end]);
        let content_length = head
            .lines()
            .find_map(|line| {
                line.to_ascii_lowercase()
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().ok())
            })
            .flatten()
            .unwrap_or(0);
        raw.len() >= head_end + 4 + content_length
    }

    /// Serve one request, echoing the raw request back as the body.
    async fn serve_echo() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 2048];
                loop {
                    let Ok(n) = stream.read(&mut buf).await else {
                        break;
                    };
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request_complete(&request) {
                        break;
                    }
                }
                let body = String::from_utf8_lossy(&request).into_owned();
                let _ = stream.write_all(http_response(200, &body).as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{addr}/submit")
    }

    #[tokio::test]
    async fn post_form_sends_method_and_encoded_body() {
        let url = serve_echo().await;

        let echoed = fast_client(1)
            .post_form(&url, &[("q", "hot clip"), ("page", "2")])
            .await
            .unwrap();

        assert!(echoed.starts_with("POST /submit"));
        assert!(echoed
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));
        assert!(echoed.contains("q=hot+clip&page=2"));
    }

    #[tokio::test]
    async fn fetch_maps_missing_pages_to_empty_body() {
        let (url, hits) = serve_script(vec![http_response(404, "gone")]).await;

        let body = fast_client(3).fetch(&url).await.unwrap();
        assert_eq!(body, "");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_surfaces_rate_limiting_without_retry() {
        let (url, hits) = serve_script(vec![http_response(429, "slow down")]).await;

        let err = fast_client(3).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_proxy_url_is_a_config_error() {
        let err = Client::new(Options {
            proxy: Some("not a proxy url".to_string()),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
