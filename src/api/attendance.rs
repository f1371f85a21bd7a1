use crate::engine::{AttendanceEngine, ClassificationResult};
use crate::error::EngineError;
use crate::store::mysql::MySqlStore;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;

/// One scanned or manually typed identifier. Date and time default to the
/// server clock, which is what QR-scan ingestion sends.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    #[schema(example = "123456789012")]
    pub identifier: String,
    #[schema(example = "2026-08-24", value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,
    #[schema(example = "07:45:00", value_type = String, format = "time", nullable = true)]
    pub time: Option<NaiveTime>,
}

/// Record attendance for a scanned identifier
#[utoipa::path(
    post,
    path = "/api/v1/attendance/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan classified and recorded", body = ClassificationResult, example = json!({
            "person_type": "student",
            "canonical_id": "123456789012",
            "display_name": "Juan Dela Cruz",
            "session": "morning",
            "is_late": true,
            "time_recorded": "07:45:00",
            "was_already_recorded": false
        })),
        (status = 400, description = "Identifier matches no known format", body = Object, example = json!({
            "message": "unrecognized identifier format: ???"
        })),
        (status = 404, description = "No person matches the identifier", body = Object, example = json!({
            "message": "no student found for identifier 123456789012"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn record_scan(
    engine: web::Data<AttendanceEngine<MySqlStore>>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now();
    let date = payload.date.unwrap_or_else(|| now.date_naive());
    let time = payload.time.unwrap_or_else(|| now.time());

    match engine.record_attendance(&payload.identifier, date, time).await {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),

        Err(err @ EngineError::InvalidIdentifierFormat(_)) => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": err.to_string()
            })))
        }

        Err(err @ EngineError::PersonNotFound { .. }) => {
            Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": err.to_string()
            })))
        }

        Err(EngineError::StorageUnavailable(err)) => {
            tracing::error!(error = %err, identifier = %payload.identifier, "Scan failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}
