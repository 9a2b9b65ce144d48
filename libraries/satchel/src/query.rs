use serde_json::{Value, json};

/// One query term. Reads take a slice of these; filters combine as AND.
/// `$id` and `$createdAt` address the document envelope rather than an
/// attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches when the attribute equals any of the given values, so a
    /// multi-value equality doubles as a membership test (that is how chunked
    /// id lookups are phrased).
    Equal { attribute: String, values: Vec<Value> },
    IsNull { attribute: String },
    Search { attribute: String, terms: String },
    OrderAsc { attribute: String },
    OrderDesc { attribute: String },
    Limit(usize),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn equal_any(
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(attribute: impl Into<String>) -> Self {
        Query::IsNull {
            attribute: attribute.into(),
        }
    }

    pub fn search(attribute: impl Into<String>, terms: impl Into<String>) -> Self {
        Query::Search {
            attribute: attribute.into(),
            terms: terms.into(),
        }
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::OrderAsc {
            attribute: attribute.into(),
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc {
            attribute: attribute.into(),
        }
    }

    pub fn limit(count: usize) -> Self {
        Query::Limit(count)
    }

    /// The JSON form the hosted service expects in `queries[]` parameters.
    pub fn to_wire(&self) -> Value {
        match self {
            Query::Equal { attribute, values } => {
                json!({ "method": "equal", "attribute": attribute, "values": values })
            }
            Query::IsNull { attribute } => {
                json!({ "method": "isNull", "attribute": attribute })
            }
            Query::Search { attribute, terms } => {
                json!({ "method": "search", "attribute": attribute, "values": [terms] })
            }
            Query::OrderAsc { attribute } => {
                json!({ "method": "orderAsc", "attribute": attribute })
            }
            Query::OrderDesc { attribute } => {
                json!({ "method": "orderDesc", "attribute": attribute })
            }
            Query::Limit(count) => {
                json!({ "method": "limit", "values": [count] })
            }
        }
    }
}
