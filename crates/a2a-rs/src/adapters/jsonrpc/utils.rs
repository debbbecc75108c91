use std::fmt::Debug;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::error;
use utoipa::IntoResponses;

use crate::errors::A2aServerError;

/// Decodes JSON-RPC `params` into the method's parameter type.
pub fn parse_params<T: DeserializeOwned>(params: Map<String, Value>) -> Result<T, A2aServerError> {
    serde_json::from_value(Value::Object(params))
        .map_err(|e| A2aServerError::invalid_params(e.to_string()))
}

/// Plain JSON response for the REST-style routes (agent card).
pub struct JsonResponse<T: Serialize, E: Serialize>(Result<T, E>);

impl<T: Serialize, E: Serialize + IntoResponse> IntoResponses for JsonResponse<T, E> {
    fn responses() -> std::collections::BTreeMap<
        String,
        utoipa::openapi::RefOr<utoipa::openapi::response::Response>,
    > {
        std::collections::BTreeMap::new()
    }
}

impl<T: Serialize, E: Serialize + IntoResponse + Debug> IntoResponse for JsonResponse<T, E> {
    fn into_response(self) -> Response {
        match self.0 {
            Ok(value) => (StatusCode::OK, Json(value)).into_response(),
            Err(error) => {
                error!("Error: {:?}", error);
                error.into_response()
            }
        }
    }
}

impl<T: Serialize, E: Serialize> From<Result<T, E>> for JsonResponse<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self(result)
    }
}
