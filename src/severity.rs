//! AQI severity bands for the result banner.
//!
//! Thresholds (upper bound inclusive):
//! - AQI ≤ 50: Good
//! - 50 < AQI ≤ 100: Moderate
//! - AQI > 100: High

use serde::Serialize;

pub const GOOD_MAX_AQI: f64 = 50.0;
pub const MODERATE_MAX_AQI: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeverityBand {
    Good,
    Moderate,
    High,
}

impl SeverityBand {
    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::Good => "🟢 Good Air Quality",
            SeverityBand::Moderate => "🟡 Moderate Pollution",
            SeverityBand::High => "🔴 High Pollution",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SeverityBand::Good => "Air quality is safe and clean.",
            SeverityBand::Moderate => "Sensitive people should be cautious.",
            SeverityBand::High => "Avoid outdoor activities. Wear a mask.",
        }
    }

    /// Banner background color.
    pub fn color(&self) -> &'static str {
        match self {
            SeverityBand::Good => "#1e7f3f",
            SeverityBand::Moderate => "#c9a227",
            SeverityBand::High => "#8b1e1e",
        }
    }
}

/// Classify an AQI value. NaN falls through to `High`.
pub fn classify(aqi: f64) -> SeverityBand {
    if aqi <= GOOD_MAX_AQI {
        SeverityBand::Good
    } else if aqi <= MODERATE_MAX_AQI {
        SeverityBand::Moderate
    } else {
        SeverityBand::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(50.0), SeverityBand::Good);
        assert_eq!(classify(50.01), SeverityBand::Moderate);
        assert_eq!(classify(100.0), SeverityBand::Moderate);
        assert_eq!(classify(100.01), SeverityBand::High);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(0.0), SeverityBand::Good);
        assert_eq!(classify(-5.0), SeverityBand::Good);
        assert_eq!(classify(499.0), SeverityBand::High);
    }

    #[test]
    fn test_labels_and_messages() {
        let band = classify(42.0);
        assert_eq!(band, SeverityBand::Good);
        assert_eq!(band.label(), "🟢 Good Air Quality");
        assert_eq!(band.message(), "Air quality is safe and clean.");

        assert_eq!(SeverityBand::High.message(), "Avoid outdoor activities. Wear a mask.");
        assert_eq!(SeverityBand::Moderate.color(), "#c9a227");
    }
}
