use geo_runtime_loader::{typed_handler_fn, HandlerError, Module};
use geo_runtime_models::InvocationContext;
use serde::{Deserialize, Serialize};

pub const MODULE: &str = "geo.storage";

pub fn module() -> Module {
    Module::new().function("split_s3_path", typed_handler_fn(split_s3_path_handler))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitPathRequest {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

/// Splits `scheme://bucket/key/parts` at the first slash after the bucket.
pub fn split_s3_path(path: &str) -> Result<ObjectLocation, HandlerError> {
    let invalid = || HandlerError::value_error(format!("Invalid S3 path: {path}"));

    let (scheme, rest) = path.split_once("://").ok_or_else(invalid)?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(invalid());
    }
    let (bucket, key) = rest.split_once('/').ok_or_else(invalid)?;
    if bucket.is_empty() || key.is_empty() || rest.chars().any(char::is_control) {
        return Err(invalid());
    }

    Ok(ObjectLocation {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

fn split_s3_path_handler(
    request: SplitPathRequest,
    _context: &InvocationContext,
) -> Result<ObjectLocation, HandlerError> {
    split_s3_path(&request.path)
}
