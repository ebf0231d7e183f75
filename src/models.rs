//! Data models for the flood risk service.

use serde::{Deserialize, Serialize, Serializer};

// ---

/// Raw historical record as it appears in the training data file.
///
/// `flood_occurred` is written either as a boolean or as a number depending
/// on which tool exported the file, so it is kept loose here and settled in
/// [`RawObservation::to_observation`]. Extra columns such as `hour` are ignored.
#[derive(Debug, Deserialize)]
pub struct RawObservation {
    // ---
    pub location: String,
    pub rainfall: f64,
    pub river_level: f64,
    pub dam_release: f64,
    pub flood_occurred: FloodFlag,
}

/// Boolean-or-number flood marker. Only `true` or `1` count as a flood.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum FloodFlag {
    Bool(bool),
    Number(f64),
}

impl FloodFlag {
    pub fn occurred(self) -> bool {
        match self {
            FloodFlag::Bool(b) => b,
            FloodFlag::Number(n) => n == 1.0,
        }
    }
}

/// One immutable historical observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    // ---
    pub location: String,
    pub rainfall: f64,
    pub river_level: f64,
    pub dam_release: f64,
    pub flood_occurred: bool,
}

impl RawObservation {
    // ---
    /// Validate the record and convert it into an [`Observation`].
    ///
    /// Rejects empty locations and readings that are negative or not finite.
    pub fn to_observation(&self) -> Result<Observation, String> {
        // ---
        if self.location.trim().is_empty() {
            return Err("empty location".to_string());
        }
        for (field, value) in [
            ("rainfall", self.rainfall),
            ("river_level", self.river_level),
            ("dam_release", self.dam_release),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} must be a finite non-negative number, got {value}"));
            }
        }

        Ok(Observation {
            location: self.location.clone(),
            rainfall: self.rainfall,
            river_level: self.river_level,
            dam_release: self.dam_release,
            flood_occurred: self.flood_occurred.occurred(),
        })
    }
}

/// Mean readings over a location's flooded observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceProfile {
    pub avg_rainfall: f64,
    pub avg_river_level: f64,
    pub avg_dam_release: f64,
}

/// Flood risk verdict, ordered from no data to certain flooding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Unknown,
    No,
    Unlikely,
    Likely,
    Yes,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Unknown => "Unknown",
            RiskLevel::No => "No",
            RiskLevel::Unlikely => "Unlikely",
            RiskLevel::Likely => "Likely",
            RiskLevel::Yes => "Yes",
        }
    }

    /// Color code shown to operators for this risk level.
    pub fn severity_tier(&self) -> SeverityTier {
        match self {
            RiskLevel::Unknown => SeverityTier::Gray,
            RiskLevel::No => SeverityTier::Green,
            RiskLevel::Unlikely => SeverityTier::Yellow,
            RiskLevel::Likely => SeverityTier::Orange,
            RiskLevel::Yes => SeverityTier::Red,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Gray,
    Green,
    Yellow,
    Orange,
    Red,
}

/// Outcome of classifying one set of live readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    // ---
    pub risk_level: RiskLevel,
    /// Hours until expected impact. `None` renders as "N/A".
    pub estimated_hours: Option<u32>,
    pub severity_tier: SeverityTier,
}

impl ClassificationResult {
    pub fn new(risk_level: RiskLevel, estimated_hours: Option<u32>) -> Self {
        Self {
            risk_level,
            estimated_hours,
            severity_tier: risk_level.severity_tier(),
        }
    }
}

/// JSON body returned for a classification request.
#[derive(Debug, Serialize)]
pub struct RiskResponse {
    // ---
    pub location: String,
    pub rainfall: f64,
    pub river_level: f64,
    pub dam_release: f64,
    pub flood_risk: RiskLevel,
    #[serde(serialize_with = "hours_or_na")]
    pub time_left_hours: Option<u32>,
    pub color_code: SeverityTier,
    pub message: String,
}

impl RiskResponse {
    // ---
    pub fn build(
        location: &str,
        rainfall: f64,
        river_level: f64,
        dam_release: f64,
        result: &ClassificationResult,
    ) -> Self {
        // ---
        let message = match result.estimated_hours {
            Some(hours) => format!(
                "Flood risk: {}. Estimated time left: {} hours.",
                result.risk_level, hours
            ),
            None => "No flood expected.".to_string(),
        };

        RiskResponse {
            location: title_case(location.trim()),
            rainfall,
            river_level,
            dam_release,
            flood_risk: result.risk_level,
            time_left_hours: result.estimated_hours,
            color_code: result.severity_tier,
            message,
        }
    }
}

fn hours_or_na<S: Serializer>(hours: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match hours {
        Some(h) => serializer.serialize_u32(*h),
        None => serializer.serialize_str("N/A"),
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    // ---
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
