use thiserror::Error;

use crate::calibration::CalibrationError;
use crate::model::RouteType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("location is {distance_m:.0} m from the nearest road node (limit {limit_m:.0} m)")]
    OutOfCoverage { distance_m: f64, limit_m: f64 },
    #[error("no route found between the snapped locations")]
    NoRouteFound,
    #[error("search exceeded the {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },
    #[error("route variant '{0}' failed validation and is unavailable")]
    VariantUnavailable(RouteType),
    #[error("no graph variant passed validation")]
    NoUsableVariant,
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("unrecoverable error: {0}")]
    UnrecoverableError(&'static str),
}

impl Error {
    /// Stable machine-readable label for the error kind, so transport
    /// layers can branch on failure type instead of message content.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Calibration(_) => "calibration",
            Error::OutOfCoverage { .. } => "out_of_coverage",
            Error::NoRouteFound => "no_route_found",
            Error::Timeout { .. } => "timeout",
            Error::VariantUnavailable(_) => "variant_unavailable",
            Error::NoUsableVariant => "no_usable_variant",
            Error::InvalidData(_) => "invalid_data",
            Error::IoError(_) => "io",
            Error::UnrecoverableError(_) => "internal",
        }
    }
}
