//! Flood risk classification against a location's historical flood record.
//!
//! Each live reading is compared with the mean of the same reading over the
//! location's past floods. The number of readings at or above their mean
//! selects the risk level:
//!
//! | matches | risk     | hours | color  |
//! |---------|----------|-------|--------|
//! | 3       | Yes      | 18    | red    |
//! | 2       | Likely   | 30    | orange |
//! | 1       | Unlikely | 50    | yellow |
//! | 0       | No       | N/A   | green  |
//!
//! Locations without any history classify as `Unknown` (gray); locations that
//! never flooded classify as `No` (green).

use thiserror::Error;

use crate::index::{reference_profile, HistoricalIndex};
use crate::models::{ClassificationResult, ReferenceProfile, RiskLevel};

// ---

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    /// A live reading was negative, NaN or infinite.
    #[error("invalid {field}: {value} (expected a finite non-negative number)")]
    InvalidInput { field: &'static str, value: f64 },
}

/// Live sensor readings for one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub rainfall: f64,
    pub river_level: f64,
    pub dam_release: f64,
}

impl Readings {
    /// Validate raw readings.
    pub fn new(rainfall: f64, river_level: f64, dam_release: f64) -> Result<Self, ClassifyError> {
        // ---
        for (field, value) in [
            ("rainfall", rainfall),
            ("river_level", river_level),
            ("dam_release", dam_release),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ClassifyError::InvalidInput { field, value });
            }
        }
        Ok(Readings {
            rainfall,
            river_level,
            dam_release,
        })
    }

    /// Number of readings at or above the reference mean (0..=3).
    pub fn match_score(&self, profile: &ReferenceProfile) -> u8 {
        // ---
        [
            self.rainfall >= profile.avg_rainfall,
            self.river_level >= profile.avg_river_level,
            self.dam_release >= profile.avg_dam_release,
        ]
        .into_iter()
        .filter(|&hit| hit)
        .count() as u8
    }
}

/// Classify live readings for `location` against `index`.
pub fn classify(
    index: &HistoricalIndex,
    location: &str,
    rainfall: f64,
    river_level: f64,
    dam_release: f64,
) -> Result<ClassificationResult, ClassifyError> {
    // ---
    let readings = Readings::new(rainfall, river_level, dam_release)?;
    Ok(classify_readings(index, location, &readings))
}

/// Classify already validated readings.
pub fn classify_readings(
    index: &HistoricalIndex,
    location: &str,
    readings: &Readings,
) -> ClassificationResult {
    // ---
    let Some(history) = index.partition(location) else {
        tracing::debug!("No history for location {:?}", location);
        return ClassificationResult::new(RiskLevel::Unknown, None);
    };

    let Some(profile) = reference_profile(history) else {
        tracing::debug!("No recorded floods for location {:?}", location);
        return ClassificationResult::new(RiskLevel::No, None);
    };

    let score = readings.match_score(&profile);
    tracing::debug!(?profile, ?readings, score, "Scored readings for {:?}", location);
    from_score(score)
}

fn from_score(score: u8) -> ClassificationResult {
    match score {
        3.. => ClassificationResult::new(RiskLevel::Yes, Some(18)),
        2 => ClassificationResult::new(RiskLevel::Likely, Some(30)),
        1 => ClassificationResult::new(RiskLevel::Unlikely, Some(50)),
        0 => ClassificationResult::new(RiskLevel::No, None),
    }
}
