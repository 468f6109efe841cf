//! Submitted form data and its conversion into a feature vector.
//!
//! Values are parsed the way a browser's `parseFloat` reads a text field:
//! leading whitespace is skipped, the longest numeric prefix wins, and
//! anything without one (including the empty string) becomes NaN.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::FeatureVector;

/// Longest decimal prefix `parseFloat` accepts, or an `Infinity` literal.
static NUMERIC_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("numeric prefix regex must compile")
});

/// Ordered name/value pairs of a submitted form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Builder-style, mirrors the order fields appear in.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &str) -> Self {
        let fields = body
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(name), decode_component(value))
            })
            .collect();
        Self { fields }
    }

    /// Parse `name=value` command-line arguments.
    pub fn from_assignments<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut form = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((name, value)) = arg.split_once('=') else {
                anyhow::bail!("expected name=value, got '{arg}'");
            };
            form = form.field(name.trim(), value);
        }
        Ok(form)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Every field parsed with [`parse_float`]; NaN is kept as is.
    ///
    /// A repeated name keeps its first position and its last value.
    pub fn to_feature_vector(&self) -> FeatureVector {
        let mut pairs: Vec<(String, f64)> = Vec::with_capacity(self.fields.len());
        for (name, raw) in &self.fields {
            let value = parse_float(raw);
            match pairs.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value,
                None => pairs.push((name.clone(), value)),
            }
        }
        pairs.into_iter().collect()
    }

    /// Names of fields whose value does not parse to a number.
    /// Judged on the value each name ends up with, see
    /// [`to_feature_vector`](Self::to_feature_vector).
    pub fn non_numeric_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.fields {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names.retain(|name| {
            self.fields
                .iter()
                .rev()
                .find(|(n, _)| n.as_str() == *name)
                .is_some_and(|(_, raw)| parse_float(raw).is_nan())
        });
        names
    }
}

/// Browser `parseFloat`: numeric prefix of `raw`, or NaN.
pub fn parse_float(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let Some(m) = NUMERIC_PREFIX_RE.find(trimmed) else {
        return f64::NAN;
    };

    let literal = m.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" if literal.starts_with('-') => f64::NEG_INFINITY,
        "Infinity" => f64::INFINITY,
        _ => literal.parse().unwrap_or(f64::NAN),
    }
}

/// Decode one urlencoded component: `+` is a space, `%XX` a byte.
fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                (Some(high), Some(low)) => {
                    out.push(high << 4 | low);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_reads_plain_numbers() {
        assert_eq!(parse_float("1.5"), 1.5);
        assert_eq!(parse_float("-2"), -2.0);
        assert_eq!(parse_float("+3"), 3.0);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("5."), 5.0);
        assert_eq!(parse_float("1e3"), 1000.0);
        assert_eq!(parse_float("  42"), 42.0);
    }

    #[test]
    fn parse_float_takes_longest_prefix() {
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float("12px"), 12.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("1.2.3"), 1.2);
    }

    #[test]
    fn parse_float_handles_infinity() {
        assert_eq!(parse_float("Infinity"), f64::INFINITY);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn parse_float_yields_nan_for_non_numbers() {
        assert!(parse_float("").is_nan());
        assert!(parse_float("abc").is_nan());
        assert!(parse_float("-").is_nan());
        assert!(parse_float(".").is_nan());
        assert!(parse_float("NaN").is_nan());
    }

    #[test]
    fn urlencoded_body_keeps_order_and_decodes() {
        let form = FormSubmission::from_urlencoded("petal-width=1.5&sepal%20length=2%2E5&note=a+b");
        let fields: Vec<(&str, &str)> = form.fields().collect();
        assert_eq!(
            fields,
            vec![("petal-width", "1.5"), ("sepal length", "2.5"), ("note", "a b")]
        );
    }

    #[test]
    fn urlencoded_body_tolerates_odd_input() {
        let form = FormSubmission::from_urlencoded("a=&b&&c=%zz&d=%4");
        let fields: Vec<(&str, &str)> = form.fields().collect();
        assert_eq!(fields, vec![("a", ""), ("b", ""), ("c", "%zz"), ("d", "%4")]);
    }

    #[test]
    fn feature_vector_passes_nan_through() {
        let form = FormSubmission::new().field("f1", "1.5").field("f2", "");
        let features = form.to_feature_vector();
        assert_eq!(features.get("f1"), Some(1.5));
        assert!(features.get("f2").unwrap().is_nan());
        assert_eq!(form.non_numeric_fields(), vec!["f2"]);
    }

    #[test]
    fn repeated_names_keep_first_position_and_last_value() {
        let form = FormSubmission::from_assignments(["a=1", "b=2", "a=3"]).unwrap();
        let features = form.to_feature_vector();
        let pairs: Vec<(&str, f64)> = features.iter().collect();
        assert_eq!(pairs, vec![("a", 3.0), ("b", 2.0)]);
        assert!(form.non_numeric_fields().is_empty());
        assert_eq!(
            serde_json::to_string(&features).unwrap(),
            r#"{"a":3.0,"b":2.0}"#
        );
    }

    #[test]
    fn assignments_require_equals() {
        let form = FormSubmission::from_assignments(["f1=1", "f2 = -2"]).unwrap();
        assert_eq!(form.to_feature_vector().get("f2"), Some(-2.0));
        assert!(FormSubmission::from_assignments(["oops"]).is_err());
    }
}
