//! Filter compiler.
//!
//! Turns a [`ProductQuery`] into the platform's search filter language.
//! Each clause is sent as its own `filter.query` argument; the platform ANDs
//! them. Clause order follows the query and is never rearranged.

use std::fmt;

use super::types::{Filter, ProductQuery};

/// The only range filter identifier that is honored.
pub const PRICE_FILTER_IDENTIFIER: &str = "price";

/// Price field scoped by the `priceCurrency`/`priceCountry` search arguments.
pub const SCOPED_PRICE_FIELD: &str = "variants.scopedPrice.value.centAmount";

/// One filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Product ID is any of the values.
    ProductIds(Vec<String>),
    /// Any variant SKU is one of the values.
    Skus(Vec<String>),
    /// Product is in any of the categories or their descendants.
    CategorySubtree(Vec<String>),
    /// Field equals any of the quoted values.
    Terms { field: String, values: Vec<String> },
    /// Field equals any of the unquoted (numeric) values.
    Values { field: String, values: Vec<String> },
    /// Field equals the boolean.
    Boolean { field: String, value: bool },
    /// Field is within the range; missing bounds are open (`*`).
    Range {
        field: String,
        min: Option<i64>,
        max: Option<i64>,
    },
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::ProductIds(ids) => write!(f, "id:{}", quote_list(ids)),
            Clause::Skus(skus) => write!(f, "variants.sku:{}", quote_list(skus)),
            Clause::CategorySubtree(ids) => {
                let subtrees: Vec<String> = ids
                    .iter()
                    .map(|id| format!("subtree({})", quote(id)))
                    .collect();
                write!(f, "categories.id: {}", subtrees.join(", "))
            }
            Clause::Terms { field, values } => write!(f, "{field}:{}", quote_list(values)),
            Clause::Values { field, values } => write!(f, "{field}:{}", values.join(",")),
            Clause::Boolean { field, value } => write!(f, "{field}:{value}"),
            Clause::Range { field, min, max } => write!(
                f,
                "{field}:range ({} to {})",
                bound(*min),
                bound(*max)
            ),
        }
    }
}

/// Ordered list of clauses, ANDed by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpression(Vec<Clause>);

impl FilterExpression {
    pub fn clauses(&self) -> &[Clause] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Render every clause as a search argument.
    pub fn to_query_args(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

/// Compile a product query into filter clauses.
///
/// Structured filters that cannot be expressed are skipped: range filters on
/// anything but `price`, and term or boolean filters without terms.
pub fn compile(query: &ProductQuery) -> FilterExpression {
    let mut clauses = Vec::new();

    if let Some(ids) = non_empty(&query.product_ids) {
        clauses.push(Clause::ProductIds(ids.to_vec()));
    }

    if let Some(skus) = non_empty(&query.skus) {
        clauses.push(Clause::Skus(skus.to_vec()));
    }

    if let Some(categories) = non_empty(&query.categories) {
        clauses.push(Clause::CategorySubtree(categories.to_vec()));
    }

    for filter in query.filters.iter().flatten() {
        match compile_filter(filter) {
            Some(clause) => clauses.push(clause),
            None => tracing::debug!(
                identifier = filter.identifier(),
                "filter dropped from query"
            ),
        }
    }

    FilterExpression(clauses)
}

/// Compile a single structured filter.
fn compile_filter(filter: &Filter) -> Option<Clause> {
    match filter {
        Filter::Term { identifier, terms } => {
            if terms.is_empty() {
                return None;
            }
            Some(Clause::Terms {
                field: format!("{identifier}.key"),
                values: terms.clone(),
            })
        }
        // Only the first term counts.
        Filter::Boolean { identifier, terms } => {
            let first = terms.first()?;
            Some(Clause::Boolean {
                field: identifier.clone(),
                value: parse_bool(first),
            })
        }
        Filter::Range {
            identifier,
            min,
            max,
        } => {
            if identifier != PRICE_FILTER_IDENTIFIER {
                return None;
            }
            Some(Clause::Range {
                field: SCOPED_PRICE_FIELD.to_string(),
                min: *min,
                max: *max,
            })
        }
    }
}

/// `true` iff the lowercased term is `"true"`.
pub fn parse_bool(term: &str) -> bool {
    term.to_lowercase() == "true"
}

/// Quote a value for the filter language.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote(v))
        .collect::<Vec<_>>()
        .join(",")
}

fn bound(value: Option<i64>) -> String {
    value.map_or_else(|| "*".to_string(), |v| v.to_string())
}

fn non_empty(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|v| !v.is_empty())
}
