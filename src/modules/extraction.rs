use log::{debug, error, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::{CustomResult, ExtractionSnafu, ValidationSnafu};
use crate::modules::catalog::Catalog;
use crate::modules::verification::{FormField, LapForm};

/// # extracted fields
/// what the extraction service read from a screenshot. every field is
/// optional, the service leaves out what it could not read.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct ExtractedFields {
    #[serde(default)]
    pub minutes: Option<u32>,
    #[serde(default)]
    pub seconds: Option<u32>,
    #[serde(default)]
    pub milliseconds: Option<u32>,
    #[serde(default, rename = "trackId")]
    pub track_id: Option<String>,
    #[serde(default, rename = "carId")]
    pub vehicle_id: Option<String>,
}

impl ExtractedFields {
    pub fn has_complete_time(&self) -> bool {
        self.minutes.is_some() && self.seconds.is_some() && self.milliseconds.is_some()
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct ImagePayload {
    pub mime_type: String,
    /// base64 encoded image
    pub data: String,
}

impl ImagePayload {
    /// # parse a data url
    /// split `data:<mime>;base64,<data>` into its parts
    pub fn from_data_url(data_url: &str) -> CustomResult<ImagePayload> {
        let pattern = match Regex::new(r"^data:(?P<mime>[\w.+-]+/[\w.+-]+);base64,(?P<data>[A-Za-z0-9+/=\s]+)$") {
            Ok(pattern) => pattern,
            Err(e) => return ExtractionSnafu { message: e.to_string() }.fail(),
        };

        match pattern.captures(data_url.trim()) {
            Some(captures) => Ok(ImagePayload {
                mime_type: captures["mime"].to_string(),
                data: captures["data"].to_string(),
            }),
            None => ValidationSnafu { field: "image", message: "expected a base64 data url".to_string() }.fail(),
        }
    }
}

/// # extraction request
/// the image plus the ids the service may answer with
#[derive(Serialize, Debug, Clone)]
pub struct ExtractionRequest {
    #[serde(flatten)]
    pub image: ImagePayload,
    pub track_ids: Vec<String>,
    pub vehicle_ids: Vec<String>,
}

impl ExtractionRequest {
    pub fn new(image: ImagePayload, catalog: &Catalog) -> ExtractionRequest {
        ExtractionRequest {
            image,
            track_ids: catalog.track_ids().into_iter().map(String::from).collect(),
            vehicle_ids: catalog.vehicle_ids().into_iter().map(String::from).collect(),
        }
    }
}

/// # field extractor
/// reads lap data from a screenshot
#[allow(async_fn_in_trait)]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> CustomResult<ExtractedFields>;
}

/// extraction service reached over http
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpExtractor {
    pub fn new(url: &str, api_key: Option<&str>) -> HttpExtractor {
        HttpExtractor {
            client: reqwest::Client::new(),
            url: url.to_string(),
            api_key: api_key.map(String::from),
        }
    }
}

impl FieldExtractor for HttpExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> CustomResult<ExtractedFields> {
        debug!(target: "modules/extraction:extract", "sending {} image to {}", request.image.mime_type, self.url);

        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(target: "modules/extraction:extract", "Error reaching extraction service: {}", e);
                return ExtractionSnafu { message: e.to_string() }.fail();
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(target: "modules/extraction:extract", "Extraction service answered {}", status);
            return ExtractionSnafu { message: format!("service answered {}", status) }.fail();
        }

        match response.json::<ExtractedFields>().await {
            Ok(fields) => Ok(fields),
            Err(e) => {
                error!(target: "modules/extraction:extract", "Unreadable extraction response: {}", e);
                ExtractionSnafu { message: e.to_string() }.fail()
            }
        }
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            // sender gone without cancelling, never fires
            std::future::pending::<()>().await;
        }
    }
}

/// # cancellable extraction
/// run an extraction unless `cancel` flips to true first.
///
/// ## Returns
/// * `None` - the pass was cancelled, its result must not reach the form
/// * `Some(result)` - the finished pass
pub async fn extract_cancellable<E: FieldExtractor>(
    extractor: &E,
    request: &ExtractionRequest,
    mut cancel: watch::Receiver<bool>,
) -> Option<CustomResult<ExtractedFields>> {
    tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => {
            info!(target: "modules/extraction:extract_cancellable", "extraction cancelled");
            None
        }
        result = extractor.extract(request) => Some(result),
    }
}

/// # settle an extraction pass onto a form
/// cancelled passes are dropped, failures keep the manual values
pub fn settle(form: &mut LapForm, outcome: Option<CustomResult<ExtractedFields>>, catalog: &Catalog) -> Vec<FormField> {
    match outcome {
        Some(Ok(fields)) => form.apply_extraction(&fields, catalog),
        Some(Err(error)) => {
            form.extraction_failed(&error.to_string());
            Vec::new()
        }
        None => Vec::new(),
    }
}
