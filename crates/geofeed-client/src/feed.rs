use std::fmt;
use std::future::Future;

use geofeed_core::config::{FilterSettings, HttpConfig};
use geofeed_core::error::FeedError;
use geofeed_core::filter::FilterChain;
use geofeed_core::models::{Coordinate, FeatureCollection, FeedEntry};
use geofeed_core::snapshot::FeedSnapshot;
use geofeed_core::source::{EntryExtractor, FeedSource, TimestampReducer};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

/// HTTP-backed GeoJSON feed, parameterized over one source dialect.
///
/// Each [`fetch_snapshot`](FeedSource::fetch_snapshot) call performs a single
/// GET, decodes the document, extracts entries relative to the home
/// coordinate, and applies the filter chain. Nothing is retried: a failed
/// fetch surfaces as [`FeedSnapshot::Error`].
///
/// # Examples
///
/// ```no_run
/// use geofeed_client::{GeoJsonFeed, GenericFeed};
/// use geofeed_core::{Coordinate, FeedSource, FilterSettings, HttpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let feed = GeoJsonFeed::new(
///     Coordinate::try_new(-33.87, 151.21)?,
///     GenericFeed::new("https://example.org/incidents.geojson")?,
///     FilterSettings::default().with_radius(50.0),
///     &HttpConfig::default(),
/// )?;
/// let snapshot = feed.fetch_snapshot(None).await;
/// println!("{} entries", snapshot.entries().len());
/// # Ok(())
/// # }
/// ```
pub struct GeoJsonFeed<X> {
    client: Client,
    url: Url,
    timeout_secs: u64,
    home: Coordinate,
    settings: FilterSettings,
    extractor: X,
}

impl<X> GeoJsonFeed<X>
where
    X: EntryExtractor + TimestampReducer<<X as EntryExtractor>::Attributes>,
{
    /// Creates a feed for the extractor's URL.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::InvalidUrl` if the extractor's URL does not parse,
    /// `FeedError::InvalidFilter` for unusable filter settings, and
    /// `FeedError::Client` if the HTTP client cannot be built.
    pub fn new(
        home: Coordinate,
        extractor: X,
        settings: FilterSettings,
        http: &HttpConfig,
    ) -> Result<Self, FeedError> {
        let url = parse_feed_url(extractor.url())?;
        settings.validate()?;

        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .timeout(http.timeout())
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url,
            timeout_secs: http.timeout_secs,
            home,
            settings,
            extractor,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn home(&self) -> Coordinate {
        self.home
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Fetches the raw document body.
    ///
    /// Returns `Ok(None)` when the server answers 304 Not Modified.
    pub async fn fetch(&self) -> Result<Option<String>, FeedError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        Ok(Some(body))
    }

    /// Decodes `body` and turns it into a snapshot, without any I/O.
    ///
    /// Decode failures become `FeedSnapshot::Error`.
    pub fn build_snapshot(
        &self,
        body: &str,
        settings: &FilterSettings,
    ) -> FeedSnapshot<X::Attributes> {
        let collection = match FeatureCollection::from_json(body) {
            Ok(collection) => collection,
            Err(err) => {
                warn!("Unable to parse JSON from {}: {}", self.url, err);
                return FeedSnapshot::Error(err);
            }
        };

        let entries = self.build_entries(&collection);
        let total = entries.len();
        let entries = self.filter_chain(settings).filter(entries);
        debug!(
            feed = self.extractor.name(),
            "{} of {} entries passed the filters", entries.len(), total
        );

        let latest_timestamp = self.extractor.latest_timestamp(&entries);
        FeedSnapshot::ok(entries, latest_timestamp)
    }

    /// One entry per feature, in document order, before filtering.
    pub fn build_entries(&self, collection: &FeatureCollection) -> Vec<FeedEntry<X::Attributes>> {
        let attribution = self.extractor.feed_attribution(collection);
        collection
            .features
            .iter()
            .map(|feature| {
                self.extractor
                    .extract(self.home, feature, attribution.as_deref())
            })
            .collect()
    }

    /// Base stages followed by the extractor's domain stages.
    pub fn filter_chain(&self, settings: &FilterSettings) -> FilterChain<X::Attributes> {
        let mut chain = FilterChain::base(settings);
        chain.extend(self.extractor.domain_filters(settings));
        chain
    }

    fn transport_error(&self, err: reqwest::Error) -> FeedError {
        let err = if err.is_timeout() {
            FeedError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            FeedError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() || err.is_body() {
            FeedError::Network(format!("Failed to read response body: {}", err))
        } else {
            FeedError::Client(err.to_string())
        };
        warn!("Fetching data from {} failed with {}", self.url, err);
        err
    }
}

impl<X> FeedSource for GeoJsonFeed<X>
where
    X: EntryExtractor + TimestampReducer<<X as EntryExtractor>::Attributes>,
{
    type Attributes = X::Attributes;

    fn fetch_snapshot(
        &self,
        overrides: Option<&FilterSettings>,
    ) -> impl Future<Output = FeedSnapshot<X::Attributes>> + Send {
        let settings = match overrides {
            Some(overrides) => self.settings.with_overrides(overrides),
            None => self.settings.clone(),
        };

        async move {
            if let Err(err) = settings.validate() {
                return FeedSnapshot::Error(err);
            }
            match self.fetch().await {
                Ok(Some(body)) => self.build_snapshot(&body, &settings),
                Ok(None) => FeedSnapshot::OkNoData,
                Err(err) => FeedSnapshot::Error(err),
            }
        }
    }
}

impl<X: EntryExtractor> fmt::Display for GeoJsonFeed<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}(home={}, url={}, radius={:?}",
            self.extractor.name(),
            self.home,
            self.url,
            self.settings.radius_km
        )?;
        if let Some(categories) = &self.settings.categories {
            write!(f, ", categories={:?}", categories)?;
        }
        if let Some(magnitude) = self.settings.minimum_magnitude {
            write!(f, ", magnitude={:?}", magnitude)?;
        }
        f.write_str(")>")
    }
}

/// Parses an absolute http(s) URL.
pub(crate) fn parse_feed_url(raw: &str) -> Result<Url, FeedError> {
    let url = Url::parse(raw).map_err(|_| FeedError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FeedError::InvalidUrl(raw.to_string())),
    }
}
