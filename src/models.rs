use serde::{Deserialize, Serialize};

/// One named numeric sequence inside a payload, as delivered.
///
/// Upstream sometimes serializes numbers as strings, emits `null` holes, or puts placeholders
/// such as `"N/A"` in the data. Holes stay `None` here; [`crate::normalize`] decides what they
/// become on a chart, and the CSV export writes them as empty fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Series {
    #[serde(default, deserialize_with = "de_string_lenient")]
    pub label: String,
    #[serde(default, deserialize_with = "de_f64_seq_lenient")]
    pub data: Vec<Option<f64>>,
}

impl Series {
    /// A series without holes.
    pub fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data: data.into_iter().map(Some).collect(),
        }
    }

    pub fn with_holes(label: impl Into<String>, data: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }
}

/// Chart data as delivered by the query endpoint (`formatted_data_for_visualization`).
///
/// Lengths are not checked here: `data.len()` may differ from `labels.len()` and between
/// series. See [`crate::normalize`] for the rectangular form every renderer consumes.
/// Labels may arrive as numbers (years) or `null`; they are kept as text, `null` as `""`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VisualizationPayload {
    #[serde(default, deserialize_with = "de_string_seq_lenient")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub values: Vec<Series>,
}

impl VisualizationPayload {
    pub fn new(labels: Vec<String>, values: Vec<Series>) -> Self {
        Self { labels, values }
    }
}

/// Response of the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub table_name: String,
    pub rows_loaded: u64,
}

/// Request body of the query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub user_query: String,
    pub table_id: String,
}

/// Response of the query endpoint. Everything but `answer` is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: String,
    /// Suggested chart kind (wire name, e.g. `"bar"`). May be empty or unknown.
    #[serde(default)]
    pub visualization: Option<String>,
    #[serde(default)]
    pub visualization_reason: Option<String>,
    #[serde(default)]
    pub formatted_data_for_visualization: Option<VisualizationPayload>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable detail; FastAPI validation errors arrive as arrays.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn de_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A JSON scalar read as text: strings as-is, numbers and booleans formatted, `null` as `""`.
struct LenientString(String);

impl<'de> Deserialize<'de> for LenientString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct StringVisitor;

        impl<'de> Visitor<'de> for StringVisitor {
            type Value = String;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a string, a number, or null")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(s.to_string())
            }

            fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(s)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(String::new())
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(String::new())
            }
        }

        deserializer.deserialize_any(StringVisitor).map(LenientString)
    }
}

fn de_string_lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    LenientString::deserialize(deserializer).map(|LenientString(s)| s)
}

fn de_string_seq_lenient<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let seq = Option::<Vec<LenientString>>::deserialize(deserializer)?;
    Ok(seq
        .unwrap_or_default()
        .into_iter()
        .map(|LenientString(s)| s)
        .collect())
}

/// Serde helper: parse a sequence of optional `f64` from JSON numbers, numeric strings, or
/// `null`. Strings that are not numbers (`"N/A"`, `""`) become holes.
fn de_f64_seq_lenient<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct LenientF64(Option<f64>);

    impl<'de> Deserialize<'de> for LenientF64 {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct F64Visitor;

            impl<'de> Visitor<'de> for F64Visitor {
                type Value = Option<f64>;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "a number, a numeric string, or null")
                }

                fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(Some(v))
                }

                fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(Some(v as f64))
                }

                fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(Some(v as f64))
                }

                fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
                }

                fn visit_unit<E>(self) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(None)
                }

                fn visit_none<E>(self) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(None)
                }
            }

            deserializer.deserialize_any(F64Visitor).map(LenientF64)
        }
    }

    let seq = Option::<Vec<LenientF64>>::deserialize(deserializer)?;
    Ok(seq
        .unwrap_or_default()
        .into_iter()
        .map(|LenientF64(v)| v)
        .collect())
}
