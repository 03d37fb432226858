//! Per-column metadata and load-time type inference.
//!
//! Every column gets a [`Variable`] record when a dataset is loaded. The
//! type and measurement level are inferred once, from a sample of the
//! column's values; after that every field is only changed by explicit user
//! edits, never by re-inference.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::value::{Value, parses_as_number};

/// How many non-empty values are sampled when inferring a column's type.
pub const INFERENCE_SAMPLE: usize = 100;

/// Fraction of the sample that must parse as finite numbers for the column
/// to be inferred numeric.
pub const NUMERIC_THRESHOLD: f64 = 0.7;

/// Missing-value tokens every new variable starts with.
pub const DEFAULT_MISSING: [&str; 5] = ["", "NULL", "null", "N/A", "NA"];

/// Storage type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Numeric,
    String,
    Date,
}

impl VarType {
    pub fn name(self) -> &'static str {
        match self {
            VarType::Numeric => "numeric",
            VarType::String => "string",
            VarType::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "numeric" => Some(VarType::Numeric),
            "string" => Some(VarType::String),
            "date" => Some(VarType::Date),
            _ => None,
        }
    }
}

/// Measurement level, in the SPSS sense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Scale,
    Ordinal,
    Nominal,
}

impl Measure {
    pub fn name(self) -> &'static str {
        match self {
            Measure::Scale => "scale",
            Measure::Ordinal => "ordinal",
            Measure::Nominal => "nominal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "scale" => Some(Measure::Scale),
            "ordinal" => Some(Measure::Ordinal),
            "nominal" => Some(Measure::Nominal),
            _ => None,
        }
    }
}

/// Cell display alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn name(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Analysis role of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Input,
    Target,
    Both,
    None,
    Partition,
    Split,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Input => "input",
            Role::Target => "target",
            Role::Both => "both",
            Role::None => "none",
            Role::Partition => "partition",
            Role::Split => "split",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "input" => Some(Role::Input),
            "target" => Some(Role::Target),
            "both" => Some(Role::Both),
            "none" => Some(Role::None),
            "partition" => Some(Role::Partition),
            "split" => Some(Role::Split),
            _ => None,
        }
    }
}

/// Metadata for one column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub var_type: VarType,
    pub label: String,
    /// Value labels: raw value -> human label (e.g. "1" -> "male").
    pub value_labels: BTreeMap<String, String>,
    /// Tokens treated as user-missing values.
    pub missing: Vec<String>,
    pub width: usize,
    pub decimals: usize,
    pub alignment: Alignment,
    pub measure: Measure,
    pub role: Role,
}

impl Variable {
    /// Default metadata for a column added after load (string/nominal).
    pub fn new_default(name: &str) -> Self {
        Variable {
            name: name.to_string(),
            var_type: VarType::String,
            label: name.to_string(),
            value_labels: BTreeMap::new(),
            missing: DEFAULT_MISSING.iter().map(|s| s.to_string()).collect(),
            width: 10,
            decimals: 2,
            alignment: Alignment::Left,
            measure: Measure::Nominal,
            role: Role::Input,
        }
    }

    /// Infer metadata for a column from its values. Runs once, at load.
    ///
    /// Samples up to [`INFERENCE_SAMPLE`] non-empty values; the column is
    /// numeric/scale when at least [`NUMERIC_THRESHOLD`] of the sample
    /// parses as finite numbers, string/nominal otherwise. A string column
    /// whose sample holds 2-10 distinct values is kept nominal.
    pub fn infer<'a, I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let sample: Vec<String> = values
            .into_iter()
            .filter(|v| !v.is_empty())
            .take(INFERENCE_SAMPLE)
            .map(|v| v.display())
            .collect();

        let numeric = sample
            .iter()
            .filter(|s| parses_as_number(s).is_some())
            .count();

        let is_numeric =
            !sample.is_empty() && numeric as f64 >= sample.len() as f64 * NUMERIC_THRESHOLD;

        let (var_type, measure) = if is_numeric {
            (VarType::Numeric, Measure::Scale)
        } else {
            // String columns read as nominal; a sample with 2-10 distinct
            // values (categorical data) and free text land on the same
            // default, so the distinct count is not consulted further.
            (VarType::String, Measure::Nominal)
        };

        Variable {
            name: name.to_string(),
            var_type,
            label: name.to_string(),
            value_labels: BTreeMap::new(),
            missing: DEFAULT_MISSING.iter().map(|s| s.to_string()).collect(),
            width: (name.len() + 2).clamp(8, 20),
            decimals: 2,
            alignment: if is_numeric {
                Alignment::Right
            } else {
                Alignment::Left
            },
            measure,
            role: Role::Input,
        }
    }

    /// Whether a value matches one of this variable's missing tokens.
    pub fn is_missing(&self, value: &Value) -> bool {
        let text = value.display();
        self.missing.iter().any(|tok| tok == &text)
    }

    /// Label shown for a value, falling back to the raw display text.
    pub fn value_label(&self, value: &Value) -> String {
        let text = value.display();
        match self.value_labels.get(&text) {
            Some(label) => label.clone(),
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers_and_text(numeric: usize, text: usize) -> Vec<Value> {
        let mut values = Vec::new();
        for i in 0..numeric {
            values.push(Value::Text(i.to_string()));
        }
        for i in 0..text {
            values.push(Value::Text(format!("label{}", i)));
        }
        values
    }

    #[test]
    fn test_infer_numeric_at_threshold() {
        // 70 of 100 parse as numbers: exactly at the threshold.
        let values = numbers_and_text(70, 30);
        let var = Variable::infer("score", values.iter());
        assert_eq!(var.var_type, VarType::Numeric);
        assert_eq!(var.measure, Measure::Scale);
        assert_eq!(var.alignment, Alignment::Right);
    }

    #[test]
    fn test_infer_string_below_threshold() {
        // 69 of 100: stays string/nominal.
        let values = numbers_and_text(69, 31);
        let var = Variable::infer("score", values.iter());
        assert_eq!(var.var_type, VarType::String);
        assert_eq!(var.measure, Measure::Nominal);
        assert_eq!(var.alignment, Alignment::Left);
    }

    #[test]
    fn test_infer_skips_empty_values() {
        let values = vec![
            Value::Empty,
            Value::Text(String::new()),
            Value::Number(1.0),
            Value::Number(2.0),
        ];
        let var = Variable::infer("x", values.iter());
        assert_eq!(var.var_type, VarType::Numeric);
    }

    #[test]
    fn test_infer_empty_column_defaults_to_string() {
        let values: Vec<Value> = Vec::new();
        let var = Variable::infer("blank", values.iter());
        assert_eq!(var.var_type, VarType::String);
        assert_eq!(var.measure, Measure::Nominal);
    }

    #[test]
    fn test_infer_samples_at_most_100_values() {
        // First 100 non-empty values are numeric; everything after is text
        // and must not influence the result.
        let mut values: Vec<Value> = (0..100).map(|i| Value::Number(i as f64)).collect();
        values.extend((0..200).map(|_| Value::Text("word".to_string())));
        let var = Variable::infer("v", values.iter());
        assert_eq!(var.var_type, VarType::Numeric);
    }

    #[test]
    fn test_infer_width_tracks_name_length() {
        let short = Variable::infer("id", std::iter::empty());
        assert_eq!(short.width, 8);
        let long = Variable::infer("a_very_long_variable_name", std::iter::empty());
        assert_eq!(long.width, 20);
        let mid = Variable::infer("household", std::iter::empty());
        assert_eq!(mid.width, 11);
    }

    #[test]
    fn test_default_missing_tokens() {
        let var = Variable::new_default("VAR3");
        assert!(var.is_missing(&Value::Empty));
        assert!(var.is_missing(&Value::Text("NULL".to_string())));
        assert!(var.is_missing(&Value::Text("N/A".to_string())));
        assert!(!var.is_missing(&Value::Text("0".to_string())));
    }

    #[test]
    fn test_value_label_fallback() {
        let mut var = Variable::new_default("sex");
        var.value_labels.insert("1".to_string(), "male".to_string());
        assert_eq!(var.value_label(&Value::Number(1.0)), "male");
        assert_eq!(var.value_label(&Value::Number(2.0)), "2");
    }

    #[test]
    fn test_enum_parse_round_trip() {
        assert_eq!(VarType::parse("Numeric"), Some(VarType::Numeric));
        assert_eq!(Measure::parse(" scale "), Some(Measure::Scale));
        assert_eq!(Alignment::parse("RIGHT"), Some(Alignment::Right));
        assert_eq!(Role::parse("target"), Some(Role::Target));
        assert_eq!(VarType::parse("bogus"), None);
    }
}
