//! Point-cloud pipeline definitions for terrain and surface models.
//!
//! Handlers here only build the pipeline JSON; executing it is left to the
//! point-cloud tooling installed in the image.

use geo_runtime_loader::{typed_handler_fn, HandlerError, Module};
use geo_runtime_models::InvocationContext;
use serde::Deserialize;
use serde_json::{json, Value};

pub const MODULE: &str = "geo.pipelines";
pub const DEFAULT_SRS: &str = "EPSG:25830";

pub fn module() -> Module {
    Module::new()
        .function("dem_pipeline", typed_handler_fn(dem_handler))
        .function("dsm_pipeline", typed_handler_fn(dsm_handler))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineRequest {
    /// Input LAS/LAZ file.
    pub filename: String,
    /// Output GeoTIFF.
    pub output: String,
    #[serde(default)]
    pub srs: Option<String>,
    #[serde(default)]
    pub resolution: Option<f64>,
}

impl PipelineRequest {
    fn validate(&self) -> Result<(), HandlerError> {
        if self.filename.trim().is_empty() {
            return Err(HandlerError::value_error("filename must not be empty"));
        }
        if self.output.trim().is_empty() {
            return Err(HandlerError::value_error("output must not be empty"));
        }
        if let Some(res) = self.resolution {
            if !res.is_finite() || res <= 0.0 {
                return Err(HandlerError::value_error("resolution must be positive"));
            }
        }
        Ok(())
    }

    fn srs(&self) -> &str {
        self.srs.as_deref().unwrap_or(DEFAULT_SRS)
    }
}

fn reader(filename: &str, srs: &str) -> Value {
    json!({"type": "readers.las", "filename": filename, "spatialreference": srs})
}

fn reprojection(srs: &str) -> Value {
    json!({"type": "filters.reprojection", "in_srs": srs, "out_srs": srs})
}

fn radius_outlier() -> Value {
    json!({"type": "filters.outlier", "method": "radius", "radius": 1.0, "min_k": 4})
}

fn gtiff_writer(filename: &str, resolution: f64) -> Value {
    json!({
        "type": "writers.gdal",
        "gdaldriver": "GTiff",
        "nodata": "-9999",
        "output_type": "max",
        "resolution": resolution,
        "filename": filename,
    })
}

/// Bare-earth model: reclassify, filter noise, keep ground (class 2).
pub fn dem_pipeline(filename: &str, output: &str, srs: &str, resolution: f64) -> Value {
    json!({
        "pipeline": [
            reader(filename, srs),
            reprojection(srs),
            {"type": "filters.assign", "assignment": "Classification[:]=0"},
            {"type": "filters.elm"},
            radius_outlier(),
            {
                "type": "filters.smrf",
                "ignore": "Classification[7:7]",
                "slope": 0.2,
                "window": 16,
                "threshold": 0.45,
                "scalar": 1.2
            },
            {"type": "filters.range", "limits": "Classification[2:2]"},
            gtiff_writer(output, resolution),
        ]
    })
}

/// Surface model: drop noise (class 7) and keep first returns.
pub fn dsm_pipeline(filename: &str, output: &str, srs: &str, resolution: f64) -> Value {
    json!({
        "pipeline": [
            reader(filename, srs),
            reprojection(srs),
            radius_outlier(),
            {"type": "filters.range", "limits": "Classification![7:7]"},
            {"type": "filters.range", "limits": "returnnumber[1:1]"},
            gtiff_writer(output, resolution),
        ]
    })
}

fn dem_handler(request: PipelineRequest, _context: &InvocationContext) -> Result<Value, HandlerError> {
    request.validate()?;
    Ok(dem_pipeline(
        &request.filename,
        &request.output,
        request.srs(),
        request.resolution.unwrap_or(1.0),
    ))
}

fn dsm_handler(request: PipelineRequest, _context: &InvocationContext) -> Result<Value, HandlerError> {
    request.validate()?;
    Ok(dsm_pipeline(
        &request.filename,
        &request.output,
        request.srs(),
        request.resolution.unwrap_or(1.0),
    ))
}
