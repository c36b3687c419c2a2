use geo_runtime_loader::{typed_handler_fn, HandlerError, Module};
use geo_runtime_models::InvocationContext;
use serde::{Deserialize, Serialize};

pub const MODULE: &str = "geo.partition";

pub fn module() -> Module {
    Module::new().function("square_split", typed_handler_fn(square_split_handler))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Bounds {
    fn validate(&self) -> Result<(), HandlerError> {
        let all = [self.x_min, self.y_min, self.x_max, self.y_max];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(HandlerError::value_error("bounds must be finite numbers"));
        }
        if self.x_max < self.x_min || self.y_max < self.y_min {
            return Err(HandlerError::value_error(
                "bounds are inverted: max must not be below min",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SquareSplitRequest {
    pub bounds: Bounds,
    #[serde(default = "default_splits")]
    pub splits: u32,
}

fn default_splits() -> u32 {
    2
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SquareSplitResponse {
    /// `[x_min, y_min, x_max, y_max]` per cell.
    pub bounds: Vec<[f64; 4]>,
}

/// Splits `bounds` into a `splits` x `splits` grid of equal cells.
///
/// Cells are ordered column-major: the outer index walks x, the inner walks y.
pub fn square_split(bounds: &Bounds, splits: u32) -> Vec<[f64; 4]> {
    let n = f64::from(splits);
    let x_size = (bounds.x_max - bounds.x_min) / n;
    let y_size = (bounds.y_max - bounds.y_min) / n;

    let mut cells = Vec::with_capacity((splits as usize).pow(2));
    for i in 0..splits {
        for j in 0..splits {
            let x_min = x_size * f64::from(i) + bounds.x_min;
            let y_min = y_size * f64::from(j) + bounds.y_min;
            cells.push([x_min, y_min, x_min + x_size, y_min + y_size]);
        }
    }
    cells
}

// Caps a response at 65536 cells
const MAX_SPLITS: u32 = 256;

fn square_split_handler(
    request: SquareSplitRequest,
    _context: &InvocationContext,
) -> Result<SquareSplitResponse, HandlerError> {
    request.bounds.validate()?;
    if request.splits == 0 {
        return Err(HandlerError::value_error("splits must be at least 1"));
    }
    if request.splits > MAX_SPLITS {
        return Err(HandlerError::value_error(format!(
            "splits must be at most {MAX_SPLITS}"
        )));
    }
    Ok(SquareSplitResponse {
        bounds: square_split(&request.bounds, request.splits),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_runtime_loader::Handler;
    use serde_json::json;

    fn unit() -> Bounds {
        Bounds {
            x_min: 0.0,
            y_min: 0.0,
            x_max: 10.0,
            y_max: 20.0,
        }
    }

    #[test]
    fn two_by_two_grid_is_column_major() {
        let cells = square_split(&unit(), 2);
        assert_eq!(
            cells,
            vec![
                [0.0, 0.0, 5.0, 10.0],
                [0.0, 10.0, 5.0, 20.0],
                [5.0, 0.0, 10.0, 10.0],
                [5.0, 10.0, 10.0, 20.0],
            ]
        );
    }

    #[test]
    fn single_split_is_the_input() {
        assert_eq!(square_split(&unit(), 1), vec![[0.0, 0.0, 10.0, 20.0]]);
    }

    #[test]
    fn cells_tile_the_bounds() {
        let b = Bounds {
            x_min: 725000.0,
            y_min: 4370000.0,
            x_max: 727000.0,
            y_max: 4372000.0,
        };
        let cells = square_split(&b, 4);
        assert_eq!(cells.len(), 16);
        let area: f64 = cells.iter().map(|c| (c[2] - c[0]) * (c[3] - c[1])).sum();
        assert!((area - 2000.0 * 2000.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn handler_validates_input() {
        let module = module();
        let handler = module.get("square_split").unwrap();
        let ctx = InvocationContext::new("req-1", i64::MAX);

        let out = handler
            .call(
                json!({"bounds": {"x_min": 0.0, "y_min": 0.0, "x_max": 2.0, "y_max": 2.0}}),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(out["bounds"].as_array().unwrap().len(), 4);

        for bad in [
            json!({"bounds": {"x_min": 0.0, "y_min": 0.0, "x_max": 2.0, "y_max": 2.0}, "splits": 0}),
            json!({"bounds": {"x_min": 5.0, "y_min": 0.0, "x_max": 2.0, "y_max": 2.0}}),
            json!({"bounds": {"x_min": 0.0, "y_min": 0.0}}),
        ] {
            let err = handler.call(bad, &ctx).await.unwrap_err();
            assert_eq!(err.kind(), "ValueError");
        }
    }
}
