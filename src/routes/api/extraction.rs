use rocket::serde::json::Json;
use rocket::{post, State};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigSnafu;
use crate::modules::extraction::{ExtractedFields, ExtractionRequest, FieldExtractor, ImagePayload};
use crate::modules::models::competitor::Identity;
use crate::routes::responses::{ApiError, ApiResult};
use crate::routes::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ExtractBody {
    /// `data:<mime>;base64,<data>`
    pub image: String,
}

#[derive(Serialize, Debug)]
pub struct ExtractResponse {
    pub fields: ExtractedFields,
    /// all three timing parts were read, a form filled from this is verified
    pub complete: bool,
}

/// # read a screenshot
/// ids the catalog does not know are dropped before answering
#[post("/extract", format = "json", data = "<body>")]
pub async fn extract_fields(body: Json<ExtractBody>, _identity: Identity, state: &State<AppState>) -> ApiResult<ExtractResponse> {
    let extractor = match &state.extractor {
        Some(extractor) => extractor,
        None => return Err(ApiError::from(ConfigSnafu { key: "EXTRACTION_URL" }.build())),
    };

    let image = ImagePayload::from_data_url(&body.image)?;
    let request = ExtractionRequest::new(image, &state.catalog);
    let mut fields = extractor.extract(&request).await?;

    fields.track_id = fields.track_id.filter(|id| state.catalog.has_track(id));
    fields.vehicle_id = fields.vehicle_id.filter(|id| state.catalog.has_vehicle(id));

    Ok(Json(ExtractResponse {
        complete: fields.has_complete_time(),
        fields,
    }))
}
