//! Normalized incident records consumed by the risk model

use chrono::NaiveDateTime;
use geo::Point;
use serde::{Deserialize, Serialize};

/// Broad incident category with a fixed severity weighting.
///
/// Feeds report free-form labels; `from_label` folds them onto this
/// closed set so calibration never depends on source-specific strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    Assault,
    Robbery,
    Theft,
    Burglary,
    VehicleCrime,
    Harassment,
    PropertyDamage,
    Narcotics,
    Other,
}

impl IncidentCategory {
    /// Severity weight in [0,1], scaled to the threat an incident poses
    /// to a person traveling through the area.
    pub fn default_severity(self) -> f64 {
        match self {
            IncidentCategory::Assault => 1.0,
            IncidentCategory::Robbery => 0.9,
            IncidentCategory::Harassment => 0.6,
            IncidentCategory::Theft => 0.5,
            IncidentCategory::Burglary => 0.45,
            IncidentCategory::VehicleCrime => 0.4,
            IncidentCategory::Narcotics => 0.35,
            IncidentCategory::PropertyDamage => 0.3,
            IncidentCategory::Other => 0.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentCategory::Assault => "assault",
            IncidentCategory::Robbery => "robbery",
            IncidentCategory::Theft => "theft",
            IncidentCategory::Burglary => "burglary",
            IncidentCategory::VehicleCrime => "vehicle_crime",
            IncidentCategory::Harassment => "harassment",
            IncidentCategory::PropertyDamage => "property_damage",
            IncidentCategory::Narcotics => "narcotics",
            IncidentCategory::Other => "other",
        }
    }

    /// Fold a raw feed label onto a category by keyword matching
    pub fn from_label(raw: &str) -> Self {
        let label = raw.trim().to_ascii_lowercase();
        if label.contains("assault") || label.contains("battery") || label.contains("homicide") {
            IncidentCategory::Assault
        } else if label.contains("robbery") {
            IncidentCategory::Robbery
        } else if label.contains("burglary") || label.contains("breaking") {
            IncidentCategory::Burglary
        } else if label.contains("vehicle") || label.contains("auto") {
            IncidentCategory::VehicleCrime
        } else if label.contains("theft") || label.contains("larceny") || label.contains("shoplift")
        {
            IncidentCategory::Theft
        } else if label.contains("harass") || label.contains("intimidat") || label.contains("stalk")
        {
            IncidentCategory::Harassment
        } else if label.contains("vandal") || label.contains("damage") || label.contains("arson") {
            IncidentCategory::PropertyDamage
        } else if label.contains("drug") || label.contains("narcotic") {
            IncidentCategory::Narcotics
        } else {
            IncidentCategory::Other
        }
    }
}

/// One normalized incident. Created at ingestion, never mutated.
#[derive(Debug, Clone)]
pub struct IncidentRecord {
    /// Incident location (x = longitude, y = latitude)
    pub location: Point<f64>,
    pub category: IncidentCategory,
    /// Severity weight, defaulted from the category when the feed
    /// carries none
    pub severity: f64,
    /// Feeds without a parseable timestamp yield `None`
    pub occurred_at: Option<NaiveDateTime>,
}

impl IncidentRecord {
    pub fn new(
        location: Point<f64>,
        category: IncidentCategory,
        occurred_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            location,
            category,
            severity: category.default_severity(),
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fold_onto_categories() {
        assert_eq!(
            IncidentCategory::from_label("AGGRAVATED ASSAULT"),
            IncidentCategory::Assault
        );
        assert_eq!(
            IncidentCategory::from_label("Theft from Motor Vehicle"),
            IncidentCategory::VehicleCrime
        );
        assert_eq!(
            IncidentCategory::from_label("larceny"),
            IncidentCategory::Theft
        );
        assert_eq!(
            IncidentCategory::from_label("noise complaint"),
            IncidentCategory::Other
        );
    }

    #[test]
    fn severities_rank_person_crimes_highest() {
        assert!(
            IncidentCategory::Assault.default_severity()
                > IncidentCategory::Theft.default_severity()
        );
        assert!(
            IncidentCategory::Theft.default_severity()
                > IncidentCategory::Other.default_severity()
        );
    }
}
