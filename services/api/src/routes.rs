use crate::infra::{describe_file, AppState, CollectingNotifier, PortalState, RecordingNavigator};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json};
use land_registry::error::AppError;
use land_registry::workflows::registry::{
    list_properties, registry_router, Property, PropertyId, RecordError, RegistryStore,
    VerificationStatus,
};
use land_registry::workflows::wizard::{
    DocumentKind, FlowBlueprint, FlowCollaborators, Notification, PropertyContext, ReviewSummary,
    SubmissionFlow, SubmissionResult, UploadRejection,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Everything a headless client would enter into the wizard in one go.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmissionRequest {
    #[serde(default)]
    pub(crate) fields: BTreeMap<String, String>,
    #[serde(default)]
    pub(crate) documents: Vec<DocumentUpload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentUpload {
    pub(crate) document: DocumentKind,
    pub(crate) name: String,
    pub(crate) size_bytes: u64,
    #[serde(default)]
    pub(crate) media_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PropertyListParams {
    pub(crate) status: Option<VerificationStatus>,
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) result: SubmissionResult,
    pub(crate) review: ReviewSummary,
    pub(crate) rejections: Vec<UploadRejection>,
    pub(crate) notifications: Vec<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) destination: Option<String>,
}

pub(crate) fn with_application_routes(portal: PortalState) -> axum::Router {
    registry_router(portal.queue.clone())
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/registrations", post(registration_endpoint))
        .route("/api/v1/properties", get(property_list_endpoint))
        .route("/api/v1/properties/:property_id", get(property_endpoint))
        .route(
            "/api/v1/properties/:property_id/transfers",
            post(transfer_endpoint),
        )
        .layer(Extension(portal))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn property_list_endpoint(
    Extension(portal): Extension<PortalState>,
    Query(params): Query<PropertyListParams>,
) -> Response {
    let properties = list_properties(portal.catalog.as_ref(), params.status, params.limit);
    (StatusCode::OK, Json(json!({ "properties": properties }))).into_response()
}

pub(crate) async fn property_endpoint(
    Extension(portal): Extension<PortalState>,
    Path(property_id): Path<u32>,
) -> Response {
    match lookup_property(&portal, property_id) {
        Ok(property) => (StatusCode::OK, Json(property)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn registration_endpoint(
    Extension(portal): Extension<PortalState>,
    Json(request): Json<SubmissionRequest>,
) -> Response {
    let notifier = Arc::new(CollectingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let collaborators = portal.registration_collaborators(notifier.clone(), navigator.clone());

    respond(
        run_flow(
            &portal,
            FlowBlueprint::registration(),
            collaborators,
            request,
        )
        .await,
        &notifier,
        &navigator,
    )
}

pub(crate) async fn transfer_endpoint(
    Extension(portal): Extension<PortalState>,
    Path(property_id): Path<u32>,
    Json(request): Json<SubmissionRequest>,
) -> Response {
    let property = match lookup_property(&portal, property_id) {
        Ok(property) => property,
        Err(error) => return error.into_response(),
    };
    let notifier = Arc::new(CollectingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let collaborators = portal.transfer_collaborators(notifier.clone(), navigator.clone());
    let blueprint = FlowBlueprint::transfer(PropertyContext::from(&property));

    respond(
        run_flow(&portal, blueprint, collaborators, request).await,
        &notifier,
        &navigator,
    )
}

fn lookup_property(portal: &PortalState, property_id: u32) -> Result<Property, AppError> {
    let id = PropertyId(property_id);
    portal
        .catalog
        .property(id)
        .ok_or(AppError::from(RecordError::UnknownProperty(id)))
}

type FlowOutcome = (SubmissionResult, ReviewSummary, Vec<UploadRejection>);

/// Drives a fresh wizard the way the portal would: fill, upload, walk to the
/// summary step, then submit.
async fn run_flow(
    portal: &PortalState,
    blueprint: FlowBlueprint,
    collaborators: FlowCollaborators,
    request: SubmissionRequest,
) -> Result<FlowOutcome, AppError> {
    let flow = SubmissionFlow::new(blueprint, portal.wizard.flow_settings(), collaborators);

    for (name, value) in &request.fields {
        flow.set_field(name, value.as_str())?;
    }

    let mut rejections = Vec::new();
    for upload in request.documents {
        let file = describe_file(&upload.name, upload.size_bytes, upload.media_type.as_deref());
        rejections.extend(flow.select_files(upload.document, vec![file])?);
    }
    flow.wait_for_uploads().await;

    while !flow.is_final_step() {
        flow.advance()?;
    }

    let review = flow.review();
    let result = flow.submit().await?;
    flow.dispose();

    info!(
        flow = flow.kind().label(),
        success = result.is_success(),
        rejected_files = rejections.len(),
        "headless submission finished"
    );

    Ok((result, review, rejections))
}

fn respond(
    outcome: Result<FlowOutcome, AppError>,
    notifier: &CollectingNotifier,
    navigator: &RecordingNavigator,
) -> Response {
    let (result, review, rejections) = match outcome {
        Ok(outcome) => outcome,
        Err(error) => return error.into_response(),
    };
    let status = if result.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    let body = SubmissionResponse {
        result,
        review,
        rejections,
        notifications: notifier.take(),
        destination: navigator.destination(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use land_registry::config::WizardConfig;
    use land_registry::workflows::registry::{RegistryCatalog, RegistryStore};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn instant_portal() -> PortalState {
        let wizard = WizardConfig {
            upload_tick: Duration::ZERO,
            registration_delay: Duration::ZERO,
            transfer_delay: Duration::ZERO,
            review_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        PortalState::new(RegistryCatalog::seeded().expect("seed data is valid"), wizard)
    }

    async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    fn registration_body() -> Value {
        json!({
            "fields": {
                "propertyTitle": "Residential Plot - Kandy",
                "plotNumber": " KAN-03-2024-017 ",
                "address": "12 Temple Road, Kandy",
                "district": "Kandy",
                "province": "Central",
                "landArea": "15.5",
                "propertyType": "residential",
                "ownerNIC": "198512345678"
            },
            "documents": [
                { "document": "titleDeed", "name": "deed.pdf", "size_bytes": 120000 },
                { "document": "surveyPlan", "name": "plan.exe", "size_bytes": 4000 }
            ]
        })
    }

    #[tokio::test]
    async fn registration_is_queued_for_verification() {
        let portal = instant_portal();
        let app = with_application_routes(portal.clone());

        let (status, body) = post_json(app, "/api/v1/registrations", registration_body()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["result"]["outcome"], "success");
        assert_eq!(body["result"]["reference"], "REG-000004");
        assert_eq!(body["rejections"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["rejections"][0]["file_name"], "plan.exe");
        assert_eq!(body["review"]["active_step"], 2);
        assert!(body.get("destination").is_none());

        let queued = portal.catalog.registrations();
        let latest = queued.last().expect("registration enqueued");
        assert_eq!(latest.plot_number, "KAN-03-2024-017");
        assert_eq!(latest.documents, vec!["Title Deed".to_string()]);
    }

    #[tokio::test]
    async fn empty_registration_reports_field_errors() {
        let app = with_application_routes(instant_portal());

        let (status, body) = post_json(app, "/api/v1/registrations", json!({})).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = body["fields"].as_array().expect("field errors listed");
        assert!(fields
            .iter()
            .any(|error| error["field"] == "propertyTitle"));
    }

    #[tokio::test]
    async fn unknown_fields_are_rejected() {
        let app = with_application_routes(instant_portal());

        let (status, _) = post_json(
            app,
            "/api/v1/registrations",
            json!({ "fields": { "favouriteColour": "green" } }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transfer_updates_the_owner_and_reports_the_destination() {
        let portal = instant_portal();
        let app = with_application_routes(portal.clone());

        let (status, body) = post_json(
            app,
            "/api/v1/properties/1/transfers",
            json!({
                "fields": {
                    "buyerName": "Sarah Johnson",
                    "buyerNIC": "851234567V",
                    "buyerEmail": "sarah@example.com",
                    "buyerPhone": "+94 77 123 4567",
                    "buyerAddress": "45 Lake Drive, Colombo 07",
                    "saleAmount": "25000000"
                },
                "documents": [
                    { "document": "transferDeed", "name": "deed.pdf", "size_bytes": 2048 }
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["destination"], "/property/1");
        assert_eq!(body["review"]["property"]["current_owner"], "John Doe");

        let property = portal
            .catalog
            .property(PropertyId(1))
            .expect("seeded property");
        assert_eq!(property.owner.name, "Sarah Johnson");
    }

    #[tokio::test]
    async fn transfers_of_unknown_properties_are_not_found() {
        let app = with_application_routes(instant_portal());

        let (status, body) = post_json(app, "/api/v1/properties/42/transfers", json!({})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "property 42 does not exist");
    }

    #[tokio::test]
    async fn registration_documents_do_not_belong_to_transfers() {
        let app = with_application_routes(instant_portal());

        let (status, _) = post_json(
            app,
            "/api/v1/properties/1/transfers",
            json!({
                "documents": [
                    { "document": "titleDeed", "name": "deed.pdf", "size_bytes": 2048 }
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn property_list_shows_status_date_and_area() {
        let app = with_application_routes(instant_portal());

        let (status, body) = get_json(app, "/api/v1/properties").await;

        assert_eq!(status, StatusCode::OK);
        let properties = body["properties"].as_array().expect("property rows");
        assert_eq!(properties.len(), 3);
        assert_eq!(properties[0]["id"], 1);
        assert_eq!(properties[0]["title"], "Residential Plot - Colombo 07");
        assert_eq!(properties[0]["status_label"], "Verified");
        assert_eq!(properties[0]["registered_on"], "2024-08-10");
        assert_eq!(properties[2]["land_area"], "2 acres");
    }

    #[tokio::test]
    async fn property_list_filters_by_status_and_limit() {
        let app = with_application_routes(instant_portal());

        let (status, body) =
            get_json(app.clone(), "/api/v1/properties?status=pending").await;
        assert_eq!(status, StatusCode::OK);
        let pending = body["properties"].as_array().expect("property rows");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["id"], 3);

        let (_, body) = get_json(app, "/api/v1/properties?limit=2").await;
        assert_eq!(body["properties"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
