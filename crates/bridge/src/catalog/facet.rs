//! Facet translation.
//!
//! Facet *definitions* describe every attribute that can be aggregated and
//! its value type. They decide the shape of each argument. The shopper's
//! *requested* facets decide which filters are applied. The two are kept
//! apart: every definition gets an aggregation argument, but only requested
//! facets become filter arguments.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::filter::{Clause, parse_bool};
use super::mapper::localized;
use super::types::{
    FacetRequest, FacetResult, FacetTerm, ProductQuery, RangeFacet, RangeValue, TermFacet,
    value_as_string,
};
use crate::backend::types::{AttributeSchema, RawAttributeType, RawFacetResult};
use crate::locale::Locale;

/// Prefix of catalog attribute ids.
pub const ATTRIBUTE_PREFIX: &str = "variants.attributes.";

/// Value type of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetAttributeType {
    Text,
    LocalizedText,
    Enum,
    LocalizedEnum,
    Boolean,
    Number,
    Money,
}

impl FacetAttributeType {
    /// Map a platform attribute type; sets facet on their element type.
    /// Types that cannot be aggregated return `None`.
    pub fn from_schema(attribute_type: &RawAttributeType) -> Option<Self> {
        match attribute_type.name.as_str() {
            "text" => Some(FacetAttributeType::Text),
            "ltext" => Some(FacetAttributeType::LocalizedText),
            "enum" => Some(FacetAttributeType::Enum),
            "lenum" => Some(FacetAttributeType::LocalizedEnum),
            "boolean" => Some(FacetAttributeType::Boolean),
            "number" => Some(FacetAttributeType::Number),
            "money" => Some(FacetAttributeType::Money),
            "set" => attribute_type
                .element_type
                .as_deref()
                .and_then(Self::from_schema),
            _ => None,
        }
    }
}

/// An attribute eligible for faceting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetDefinition {
    pub attribute_id: String,
    pub attribute_type: FacetAttributeType,
    pub label: Option<String>,
}

impl FacetDefinition {
    pub fn new(attribute_id: &str, attribute_type: FacetAttributeType) -> Self {
        Self {
            attribute_id: attribute_id.to_string(),
            attribute_type,
            label: None,
        }
    }
}

/// Facets every query supports regardless of the catalog.
pub fn builtin_definitions() -> Vec<FacetDefinition> {
    vec![
        FacetDefinition::new("categories.id", FacetAttributeType::Text),
        FacetDefinition::new("variants.scopedPrice.value", FacetAttributeType::Money),
        FacetDefinition::new("variants.price", FacetAttributeType::Money),
        FacetDefinition::new("variants.scopedPriceDiscounted", FacetAttributeType::Boolean),
    ]
}

/// Build the facet definitions for a query: searchable catalog attributes
/// (first occurrence of each id wins) followed by the built-in facets.
pub fn facet_definitions(schemas: &[AttributeSchema], locale: &Locale) -> Vec<FacetDefinition> {
    let mut seen = HashSet::new();
    let mut definitions = Vec::new();

    for schema in schemas.iter().filter(|s| s.is_searchable) {
        let Some(attribute_type) = FacetAttributeType::from_schema(&schema.attribute_type) else {
            continue;
        };

        let attribute_id = format!("{ATTRIBUTE_PREFIX}{}", schema.name);
        if !seen.insert(attribute_id.clone()) {
            continue;
        }

        definitions.push(FacetDefinition {
            attribute_id,
            attribute_type,
            label: localized(&schema.label, locale),
        });
    }

    definitions.extend(builtin_definitions());
    definitions
}

/// Aggregation argument for one definition.
///
/// Money facets always aggregate over everything (`0 to *`); when the shopper
/// selected bounds, a second bucket for exactly those bounds is added.
pub fn facet_argument(
    definition: &FacetDefinition,
    requested: Option<&FacetRequest>,
    locale: &Locale,
) -> String {
    let id = &definition.attribute_id;
    match definition.attribute_type {
        FacetAttributeType::Text | FacetAttributeType::Boolean | FacetAttributeType::Number => {
            id.clone()
        }
        FacetAttributeType::LocalizedText => format!("{id}.{}", locale.language),
        FacetAttributeType::Enum | FacetAttributeType::LocalizedEnum => format!("{id}.key"),
        FacetAttributeType::Money => match requested {
            Some(FacetRequest::Range { min, max, .. }) if min.is_some() || max.is_some() => {
                format!(
                    "{id}.centAmount:range (0 to *), ({} to {})",
                    bound(*min),
                    bound(*max)
                )
            }
            _ => format!("{id}.centAmount:range (0 to *)"),
        },
    }
}

/// Aggregation arguments for every definition, aliased with the attribute id
/// so results can be matched back.
pub fn definitions_to_query_args(
    definitions: &[FacetDefinition],
    requested: &[FacetRequest],
    locale: &Locale,
) -> Vec<String> {
    definitions
        .iter()
        .map(|definition| {
            let expression =
                facet_argument(definition, find_request(requested, definition), locale);
            format!("{expression} as {}", definition.attribute_id)
        })
        .collect()
}

/// Filter arguments for the requested facets, shaped by their definitions.
///
/// Requested facets without a definition, or without usable values for the
/// definition's type, are skipped.
pub fn requested_to_filter_facets(
    requested: &[FacetRequest],
    definitions: &[FacetDefinition],
    locale: &Locale,
) -> Vec<String> {
    let by_id: HashMap<&str, &FacetDefinition> = definitions
        .iter()
        .map(|d| (d.attribute_id.as_str(), d))
        .collect();

    requested
        .iter()
        .filter_map(|facet| {
            let Some(definition) = by_id.get(facet.identifier()) else {
                tracing::debug!(identifier = facet.identifier(), "requested facet has no definition");
                return None;
            };
            let clause = facet_clause(facet, definition, locale);
            if clause.is_none() {
                tracing::debug!(
                    identifier = facet.identifier(),
                    "requested facet does not fit its definition"
                );
            }
            clause
        })
        .map(|clause| clause.to_string())
        .collect()
}

fn facet_clause(
    facet: &FacetRequest,
    definition: &FacetDefinition,
    locale: &Locale,
) -> Option<Clause> {
    let id = &definition.attribute_id;
    match (facet, definition.attribute_type) {
        (
            FacetRequest::Term { terms, .. } | FacetRequest::Boolean { terms, .. },
            FacetAttributeType::Boolean,
        ) => {
            let first = terms.first()?;
            Some(Clause::Boolean {
                field: id.clone(),
                value: parse_bool(first),
            })
        }
        (FacetRequest::Term { terms, .. }, attribute_type) if !terms.is_empty() => {
            let values = terms.clone();
            match attribute_type {
                FacetAttributeType::Text => Some(Clause::Terms {
                    field: id.clone(),
                    values,
                }),
                FacetAttributeType::LocalizedText => Some(Clause::Terms {
                    field: format!("{id}.{}", locale.language),
                    values,
                }),
                FacetAttributeType::Enum | FacetAttributeType::LocalizedEnum => {
                    Some(Clause::Terms {
                        field: format!("{id}.key"),
                        values,
                    })
                }
                FacetAttributeType::Number => Some(Clause::Values {
                    field: id.clone(),
                    values,
                }),
                FacetAttributeType::Money | FacetAttributeType::Boolean => None,
            }
        }
        (FacetRequest::Range { min, max, .. }, FacetAttributeType::Money)
            if min.is_some() || max.is_some() =>
        {
            Some(Clause::Range {
                field: format!("{id}.centAmount"),
                min: *min,
                max: *max,
            })
        }
        (FacetRequest::Range { min, max, .. }, FacetAttributeType::Number)
            if min.is_some() || max.is_some() =>
        {
            Some(Clause::Range {
                field: id.clone(),
                min: *min,
                max: *max,
            })
        }
        _ => None,
    }
}

/// Convert raw aggregation results into typed facets.
///
/// Definitions are walked in order. A result is matched to a definition by its
/// attribute id (the alias), or by the bare expression when the platform
/// ignored the alias. Unmatched results and results of the wrong kind are
/// dropped.
pub fn results_to_facets(
    raw: &HashMap<String, RawFacetResult>,
    definitions: &[FacetDefinition],
    query: &ProductQuery,
    locale: &Locale,
) -> Vec<FacetResult> {
    let requested = query.facets.as_deref().unwrap_or_default();

    definitions
        .iter()
        .filter_map(|definition| {
            let request = find_request(requested, definition);
            let result = raw.get(&definition.attribute_id).or_else(|| {
                raw.get(&facet_argument(definition, request, locale))
            })?;
            convert_result(definition, request, result)
        })
        .collect()
}

fn convert_result(
    definition: &FacetDefinition,
    request: Option<&FacetRequest>,
    result: &RawFacetResult,
) -> Option<FacetResult> {
    let identifier = definition.attribute_id.clone();
    let label = definition
        .label
        .clone()
        .unwrap_or_else(|| identifier.clone());
    let selected = request.is_some();

    match (definition.attribute_type, result) {
        (FacetAttributeType::Money, RawFacetResult::Range { ranges }) => {
            let overall = ranges.first();
            let value = match request {
                Some(FacetRequest::Range { min, max, .. }) => Some(RangeValue {
                    min: *min,
                    max: *max,
                }),
                _ => None,
            };
            Some(FacetResult::Range(RangeFacet {
                key: identifier.clone(),
                identifier,
                label,
                selected,
                min: overall.and_then(|r| r.min).map(|v| v.round() as i64),
                max: overall.and_then(|r| r.max).map(|v| v.round() as i64),
                value,
            }))
        }
        (FacetAttributeType::Money, _) => None,
        (attribute_type, RawFacetResult::Terms { terms, .. }) => {
            let is_boolean = attribute_type == FacetAttributeType::Boolean;
            let selected_terms = request.map(FacetRequest::terms).unwrap_or_default();

            let terms = terms
                .iter()
                .filter_map(|term| {
                    let mut key = value_as_string(&term.term)?;
                    if is_boolean {
                        key = boolean_term(&key);
                    }
                    Some(FacetTerm {
                        identifier: key.clone(),
                        label: key.clone(),
                        count: term.product_count.unwrap_or(term.count),
                        selected: selected_terms
                            .iter()
                            .any(|t| t.eq_ignore_ascii_case(&key)),
                        key,
                    })
                })
                .collect();

            let facet = TermFacet {
                key: identifier.clone(),
                identifier,
                label,
                selected,
                terms,
            };

            Some(if is_boolean {
                FacetResult::Boolean(facet)
            } else {
                FacetResult::Term(facet)
            })
        }
        _ => {
            tracing::debug!(
                identifier = %definition.attribute_id,
                "aggregation result does not match facet type"
            );
            None
        }
    }
}

/// Platform boolean terms are `T`/`F`.
fn boolean_term(term: &str) -> String {
    match term {
        "T" | "true" => "true".to_string(),
        "F" | "false" => "false".to_string(),
        other => other.to_lowercase(),
    }
}

fn find_request<'a>(
    requested: &'a [FacetRequest],
    definition: &FacetDefinition,
) -> Option<&'a FacetRequest> {
    requested
        .iter()
        .find(|r| r.identifier() == definition.attribute_id)
}

fn bound(value: Option<i64>) -> String {
    value.map_or_else(|| "*".to_string(), |v| v.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::types::{RawFacetRange, RawFacetTerm};

    fn locale() -> Locale {
        Locale {
            language: "en".to_string(),
            country: "US".to_string(),
            currency: "USD".to_string(),
        }
    }

    fn schema(name: &str, type_name: &str, searchable: bool) -> AttributeSchema {
        AttributeSchema {
            name: name.to_string(),
            label: [("en".to_string(), name.to_uppercase())].into_iter().collect(),
            attribute_type: RawAttributeType::named(type_name),
            is_searchable: searchable,
        }
    }

    #[test]
    fn definitions_dedupe_and_append_builtins() {
        let schemas = vec![
            schema("color", "lenum", true),
            schema("color", "text", true),
            schema("internal", "text", false),
            schema("published", "datetime", true),
            schema("size", "number", true),
        ];

        let definitions = facet_definitions(&schemas, &locale());
        let ids: Vec<&str> = definitions.iter().map(|d| d.attribute_id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "variants.attributes.color",
                "variants.attributes.size",
                "categories.id",
                "variants.scopedPrice.value",
                "variants.price",
                "variants.scopedPriceDiscounted",
            ]
        );
        assert_eq!(definitions[0].attribute_type, FacetAttributeType::LocalizedEnum);
        assert_eq!(definitions[0].label.as_deref(), Some("COLOR"));
    }

    #[test]
    fn set_attributes_use_element_type() {
        let mut set = RawAttributeType::named("set");
        set.element_type = Some(Box::new(RawAttributeType::named("enum")));
        assert_eq!(
            FacetAttributeType::from_schema(&set),
            Some(FacetAttributeType::Enum)
        );
        assert_eq!(
            FacetAttributeType::from_schema(&RawAttributeType::named("reference")),
            None
        );
    }

    #[test]
    fn query_args_shaped_by_type() {
        let definitions = vec![
            FacetDefinition::new("variants.attributes.color", FacetAttributeType::Enum),
            FacetDefinition::new("variants.attributes.title", FacetAttributeType::LocalizedText),
            FacetDefinition::new("categories.id", FacetAttributeType::Text),
            FacetDefinition::new("variants.price", FacetAttributeType::Money),
            FacetDefinition::new("variants.scopedPrice.value", FacetAttributeType::Money),
        ];
        let requested = vec![FacetRequest::Range {
            identifier: "variants.scopedPrice.value".to_string(),
            min: Some(1000),
            max: None,
        }];

        assert_eq!(
            definitions_to_query_args(&definitions, &requested, &locale()),
            vec![
                "variants.attributes.color.key as variants.attributes.color",
                "variants.attributes.title.en as variants.attributes.title",
                "categories.id as categories.id",
                "variants.price.centAmount:range (0 to *) as variants.price",
                "variants.scopedPrice.value.centAmount:range (0 to *), (1000 to *) \
                 as variants.scopedPrice.value",
            ]
        );
    }

    #[test]
    fn only_requested_facets_become_filters() {
        let definitions = vec![
            FacetDefinition::new("variants.attributes.color", FacetAttributeType::Enum),
            FacetDefinition::new("variants.attributes.size", FacetAttributeType::Number),
            FacetDefinition::new("variants.scopedPrice.value", FacetAttributeType::Money),
            FacetDefinition::new("variants.scopedPriceDiscounted", FacetAttributeType::Boolean),
        ];
        let requested = vec![
            FacetRequest::Term {
                identifier: "variants.attributes.color".to_string(),
                terms: vec!["red".to_string()],
            },
            FacetRequest::Term {
                identifier: "variants.attributes.unknown".to_string(),
                terms: vec!["x".to_string()],
            },
            FacetRequest::Range {
                identifier: "variants.scopedPrice.value".to_string(),
                min: Some(100),
                max: Some(200),
            },
            FacetRequest::Boolean {
                identifier: "variants.scopedPriceDiscounted".to_string(),
                terms: vec!["True".to_string(), "false".to_string()],
            },
        ];

        assert_eq!(
            requested_to_filter_facets(&requested, &definitions, &locale()),
            vec![
                r#"variants.attributes.color.key:"red""#,
                "variants.scopedPrice.value.centAmount:range (100 to 200)",
                "variants.scopedPriceDiscounted:true",
            ]
        );
    }

    #[test]
    fn number_terms_are_unquoted() {
        let definitions = vec![FacetDefinition::new(
            "variants.attributes.size",
            FacetAttributeType::Number,
        )];
        let requested = vec![FacetRequest::Term {
            identifier: "variants.attributes.size".to_string(),
            terms: vec!["38".to_string(), "39".to_string()],
        }];
        assert_eq!(
            requested_to_filter_facets(&requested, &definitions, &locale()),
            vec!["variants.attributes.size:38,39"]
        );
    }

    #[test]
    fn unusable_requests_are_dropped() {
        let definitions = vec![
            FacetDefinition::new("variants.price", FacetAttributeType::Money),
            FacetDefinition::new("variants.attributes.color", FacetAttributeType::Enum),
        ];
        let requested = vec![
            FacetRequest::Term {
                identifier: "variants.price".to_string(),
                terms: vec!["100".to_string()],
            },
            FacetRequest::Range {
                identifier: "variants.price".to_string(),
                min: None,
                max: None,
            },
            FacetRequest::Term {
                identifier: "variants.attributes.color".to_string(),
                terms: vec![],
            },
        ];
        assert!(requested_to_filter_facets(&requested, &definitions, &locale()).is_empty());
    }

    #[test]
    fn results_matched_back_to_definitions() {
        let definitions = vec![
            FacetDefinition {
                attribute_id: "variants.attributes.color".to_string(),
                attribute_type: FacetAttributeType::Enum,
                label: Some("Color".to_string()),
            },
            FacetDefinition::new("variants.scopedPrice.value", FacetAttributeType::Money),
            FacetDefinition::new("variants.scopedPriceDiscounted", FacetAttributeType::Boolean),
            FacetDefinition::new("variants.price", FacetAttributeType::Money),
        ];
        let query = ProductQuery {
            facets: Some(vec![
                FacetRequest::Term {
                    identifier: "variants.attributes.color".to_string(),
                    terms: vec!["red".to_string()],
                },
                FacetRequest::Range {
                    identifier: "variants.scopedPrice.value".to_string(),
                    min: Some(500),
                    max: None,
                },
            ]),
            ..Default::default()
        };

        let mut raw = HashMap::new();
        raw.insert(
            "variants.attributes.color".to_string(),
            RawFacetResult::Terms {
                data_type: Some("text".to_string()),
                missing: 0,
                total: 3,
                other: 0,
                terms: vec![
                    RawFacetTerm {
                        term: serde_json::json!("red"),
                        count: 2,
                        product_count: Some(1),
                    },
                    RawFacetTerm {
                        term: serde_json::json!("blue"),
                        count: 1,
                        product_count: None,
                    },
                ],
            },
        );
        raw.insert(
            "variants.scopedPrice.value.centAmount:range (0 to *), (500 to *)".to_string(),
            RawFacetResult::Range {
                ranges: vec![RawFacetRange {
                    from: Some(0.0),
                    count: 3,
                    min: Some(499.0),
                    max: Some(12999.0),
                    ..Default::default()
                }],
            },
        );
        raw.insert(
            "variants.scopedPriceDiscounted".to_string(),
            RawFacetResult::Terms {
                data_type: Some("boolean".to_string()),
                missing: 0,
                total: 3,
                other: 0,
                terms: vec![RawFacetTerm {
                    term: serde_json::json!("T"),
                    count: 1,
                    product_count: None,
                }],
            },
        );
        // Wrong kind for a money facet.
        raw.insert(
            "variants.price".to_string(),
            RawFacetResult::Filter { count: 3 },
        );
        raw.insert(
            "unrelated".to_string(),
            RawFacetResult::Filter { count: 1 },
        );

        let facets = results_to_facets(&raw, &definitions, &query, &locale());
        assert_eq!(facets.len(), 3);

        let FacetResult::Term(color) = &facets[0] else {
            panic!("expected term facet");
        };
        assert_eq!(color.label, "Color");
        assert!(color.selected);
        assert_eq!(color.terms[0].count, 1);
        assert!(color.terms[0].selected);
        assert!(!color.terms[1].selected);

        let FacetResult::Range(price) = &facets[1] else {
            panic!("expected range facet");
        };
        assert_eq!(price.min, Some(499));
        assert_eq!(price.max, Some(12999));
        assert_eq!(
            price.value,
            Some(RangeValue {
                min: Some(500),
                max: None
            })
        );

        let FacetResult::Boolean(discounted) = &facets[2] else {
            panic!("expected boolean facet");
        };
        assert!(!discounted.selected);
        assert_eq!(discounted.terms[0].key, "true");
    }

    #[test]
    fn unaliased_results_match_by_expression() {
        let definitions = vec![FacetDefinition::new(
            "variants.attributes.color",
            FacetAttributeType::LocalizedEnum,
        )];
        let mut raw = HashMap::new();
        raw.insert(
            "variants.attributes.color.key".to_string(),
            RawFacetResult::Terms {
                data_type: None,
                missing: 0,
                total: 1,
                other: 0,
                terms: vec![RawFacetTerm {
                    term: serde_json::json!("c1"),
                    count: 4,
                    product_count: None,
                }],
            },
        );

        let facets = results_to_facets(&raw, &definitions, &ProductQuery::default(), &locale());
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].identifier(), "variants.attributes.color");
    }
}
