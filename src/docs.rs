use crate::api::attendance::ScanRequest;
use crate::engine::ClassificationResult;
use crate::model::attendance::Session;
use crate::model::person::PersonType;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## School Attendance Tracker

This API powers the attendance classification and recording engine of a
school attendance tracker.

### 🔹 Key Features
- **Attendance Scanning**
  - Accepts raw scanned/typed identifiers (student LRN or staff code)
  - Normalizes legacy staff formats (`EMP-######`, `ID######`, bare digits)
  - Resolves the applicable schedule (section > grade level > default)
  - Classifies the scan into a session (morning/afternoon) and a punctuality
    outcome (on-time/late)
  - Records idempotently: duplicate scans report the stored time instead of
    erroring

### 📦 Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(crate::api::attendance::record_scan),
    components(schemas(ScanRequest, ClassificationResult, PersonType, Session)),
    tags(
        (name = "Attendance", description = "Attendance scanning and recording APIs"),
    )
)]
pub struct ApiDoc;
