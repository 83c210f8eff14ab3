//! Product query engine module.
//!
//! This module provides:
//! - ProductApi: Executes product, category and inventory queries against the backend
//! - filter: Compiles structured queries into the platform filter language
//! - facet: Facet definitions, aggregation arguments and facet results
//! - cursor: Opaque `offset:<N>` pagination cursors
//! - category_tree: Builds category forests from flat lists
//! - ProductQueryFactory: Reads product queries from request parameters
//! - Types: ProductQuery, Filter, FacetRequest, QueryResult, etc.

pub mod category_tree;
pub mod cursor;
pub mod facet;
pub mod filter;
pub mod mapper;
mod product_api;
mod query_factory;
pub mod types;

pub use facet::{FacetAttributeType, FacetDefinition};
pub use filter::{Clause, FilterExpression};
pub use product_api::{ProductApi, QuerySettings};
pub use query_factory::ProductQueryFactory;
pub use types::{
    CategoryFormat, CategoryQuery, FacetRequest, FacetResult, FacetTerm, Filter, ProductQuery,
    QueryEcho, QueryResult, RangeFacet, RangeValue, ResultItem, SortAttribute, SortAttributes,
    SortDirection, TermFacet,
};
