//! Newtype wrapper for measured distances.
//!
//! Every display unit is derived from the meter value directly, so rounding
//! one unit never feeds into another.

/// Conversion factor: feet to meters
pub const FEET_TO_METERS: f64 = 0.3048;

/// Conversion factor: meters to inches
pub const METERS_TO_INCHES: f64 = 39.37;

/// Conversion factor: meters to centimeters
pub const METERS_TO_CENTIMETERS: f64 = 100.0;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Straight-line distance in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Meters(pub f64);

impl Meters {
    /// Euclidean distance between two world-space points (1 unit = 1 m).
    pub fn between(a: bevy::math::Vec3, b: bevy::math::Vec3) -> Self {
        Self(a.as_dvec3().distance(b.as_dvec3()))
    }

    /// Convert to feet.
    pub fn to_feet(self) -> f64 {
        self.0 / FEET_TO_METERS
    }

    /// Convert to inches.
    pub fn to_inches(self) -> f64 {
        self.0 * METERS_TO_INCHES
    }

    /// Convert to centimeters.
    pub fn to_centimeters(self) -> f64 {
        self.0 * METERS_TO_CENTIMETERS
    }

    /// All four display units, each rounded to two decimals.
    pub fn readout(self) -> DistanceReadout {
        DistanceReadout {
            meters: round2(self.0),
            feet: round2(self.to_feet()),
            inches: round2(self.to_inches()),
            centimeters: round2(self.to_centimeters()),
        }
    }
}

impl std::fmt::Display for Meters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", round2(self.0))
    }
}

/// Rounded multi-unit view of a distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceReadout {
    pub meters: f64,
    pub feet: f64,
    pub inches: f64,
    pub centimeters: f64,
}

impl DistanceReadout {
    fn parts(&self) -> [String; 4] {
        [
            format!("{}m", self.meters),
            format!("{}ft", self.feet),
            format!("{}in", self.inches),
            format!("{}cm", self.centimeters),
        ]
    }

    /// One unit per line, as shown in labels and the live readout.
    pub fn multi_line(&self) -> String {
        self.parts().join("\n")
    }

    /// Single-line form used in lists and exports.
    pub fn inline(&self) -> String {
        self.parts().join(" / ")
    }
}
