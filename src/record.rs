use serde::Serialize;

use crate::category::{SnowMoisture, SnowType};

/// Canonical column names, in the positional order of the survey export.
pub const FIELD_NAMES: [&str; 10] = [
    "timestamp",
    "location",
    "air_temp",
    "snow_type",
    "snow_moisture",
    "wax_brand",
    "wax_product",
    "rating",
    "snow_temp",
    "layers",
];

pub const FIELD_COUNT: usize = FIELD_NAMES.len();

/// One survey submission, fields exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub timestamp: String,
    pub location: String,
    pub air_temp: String,
    pub snow_type: String,
    pub snow_moisture: String,
    pub wax_brand: String,
    pub wax_product: String,
    pub rating: String,
    pub snow_temp: String,
    pub layers: String,
}

impl RawRecord {
    /// Assigns fields by position. Returns `None` unless exactly
    /// [`FIELD_COUNT`] values are supplied.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Option<Self> {
        let [
            timestamp,
            location,
            air_temp,
            snow_type,
            snow_moisture,
            wax_brand,
            wax_product,
            rating,
            snow_temp,
            layers,
        ] = fields
        else {
            return None;
        };
        Some(Self {
            timestamp: timestamp.as_ref().to_string(),
            location: location.as_ref().to_string(),
            air_temp: air_temp.as_ref().to_string(),
            snow_type: snow_type.as_ref().to_string(),
            snow_moisture: snow_moisture.as_ref().to_string(),
            wax_brand: wax_brand.as_ref().to_string(),
            wax_product: wax_product.as_ref().to_string(),
            rating: rating.as_ref().to_string(),
            snow_temp: snow_temp.as_ref().to_string(),
            layers: layers.as_ref().to_string(),
        })
    }
}

/// A cleaned record. `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub timestamp: String,
    pub location: String,
    pub air_temp: Option<f64>,
    pub snow_type: Option<SnowType>,
    pub snow_moisture: Option<SnowMoisture>,
    pub wax_brand: String,
    pub wax_product: String,
    pub rating: Option<i64>,
    pub snow_temp: Option<f64>,
    pub layers: Option<i64>,
}

impl CanonicalRecord {
    /// Serializes to snapshot fields; missing values become empty strings.
    pub fn to_fields(&self) -> [String; FIELD_COUNT] {
        [
            self.timestamp.clone(),
            self.location.clone(),
            format_optional(self.air_temp),
            self.snow_type.map(|s| s.to_string()).unwrap_or_default(),
            self.snow_moisture.map(|s| s.to_string()).unwrap_or_default(),
            self.wax_brand.clone(),
            self.wax_product.clone(),
            format_optional(self.rating),
            format_optional(self.snow_temp),
            format_optional(self.layers),
        ]
    }
}

fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Parses a decimal number, yielding `None` for anything non-numeric.
/// Surrounding whitespace is ignored; NaN and infinities count as missing.
pub fn coerce_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses an integer. Integral decimal text such as `4.0` is accepted;
/// fractional or non-numeric text yields `None`.
pub fn coerce_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = coerce_float(trimmed)?;
    if value.fract() != 0.0 || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_float_handles_common_inputs() {
        assert_eq!(coerce_float("-3.5"), Some(-3.5));
        assert_eq!(coerce_float(" 2 "), Some(2.0));
        assert_eq!(coerce_float("1e1"), Some(10.0));
        assert_eq!(coerce_float(""), None);
        assert_eq!(coerce_float("kalt"), None);
        assert_eq!(coerce_float("-2,5"), None);
        assert_eq!(coerce_float("NaN"), None);
        assert_eq!(coerce_float("inf"), None);
    }

    #[test]
    fn coerce_integer_accepts_integral_decimals() {
        assert_eq!(coerce_integer("4"), Some(4));
        assert_eq!(coerce_integer("4.0"), Some(4));
        assert_eq!(coerce_integer(" -1 "), Some(-1));
        assert_eq!(coerce_integer("4.5"), None);
        assert_eq!(coerce_integer("gut"), None);
        assert_eq!(coerce_integer(""), None);
    }

    #[test]
    fn raw_record_requires_exact_field_count() {
        let fields = vec!["x"; FIELD_COUNT];
        assert!(RawRecord::from_fields(&fields).is_some());
        assert!(RawRecord::from_fields(&fields[..9]).is_none());
        let mut long = fields.clone();
        long.push("extra");
        assert!(RawRecord::from_fields(&long).is_none());
    }

    #[test]
    fn to_fields_leaves_missing_values_empty() {
        let record = CanonicalRecord {
            location: "Seefeld".into(),
            air_temp: Some(-2.0),
            snow_type: Some(SnowType::Icy),
            rating: Some(4),
            ..Default::default()
        };
        let fields = record.to_fields();
        assert_eq!(fields[1], "Seefeld");
        assert_eq!(fields[2], "-2");
        assert_eq!(fields[3], "icy");
        assert_eq!(fields[4], "");
        assert_eq!(fields[7], "4");
        assert_eq!(fields[9], "");
    }
}
