//! JSON and form echo endpoints.

use axum::{extract::Form, response::Json};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[utoipa::path(
    post,
    path = "/api/data/submitJson",
    responses(
        (status = 200, description = "The submitted JSON object, unchanged"),
        (status = 400, description = "Body is not valid JSON"),
        (status = 415, description = "Content type is not application/json"),
        (status = 422, description = "Body is JSON but not an object")
    )
)]
/// Echo a JSON object
///
/// Returns the submitted object unchanged. Useful for checking client serialisation.
pub async fn submit_json(Json(data): Json<Map<String, Value>>) -> Json<Map<String, Value>> {
    tracing::info!("Received JSON data: {}", serde_json::Value::Object(data.clone()));
    Json(data)
}

#[utoipa::path(
    post,
    path = "/api/data/submitForm",
    responses(
        (status = 200, description = "Submitted fields, each mapped to the list of its values")
    )
)]
/// Echo a URL-encoded form
///
/// Repeated keys are preserved: every key maps to all values submitted for it, in order.
pub async fn submit_form(
    Form(pairs): Form<Vec<(String, String)>>,
) -> Json<BTreeMap<String, Vec<String>>> {
    let fields = group_fields(pairs);
    tracing::info!("Received form data with {} field(s)", fields.len());
    Json(fields)
}

fn group_fields(pairs: Vec<(String, String)>) -> BTreeMap<String, Vec<String>> {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        fields.entry(key).or_default().push(value);
    }
    fields
}
