//! apicheck-core: Core types and comparison logic for API contract testing
//!
//! This crate provides JSON pointers, flexible matchers, the structural
//! comparator, the request catalog, payload variant generation, and the
//! test-data generator registry. HTTP execution and response assertions
//! live in `apicheck-client`.

pub mod catalog;
pub mod compare;
pub mod matcher;
pub mod pointer;
pub mod registry;
pub mod variants;

pub use catalog::{
    CatalogError, ExpectedResponse, RequestCatalog, RequestDefinition, catalog_schema,
};
pub use compare::{CompareError, Diff, Expected, equals, param_equals};
pub use matcher::{JsonKind, Matcher, values_equal};
pub use pointer::{Pointer, PointerError};
pub use registry::{GeneratorFn, GeneratorRegistry, RegistryError, builtin_generators};
pub use variants::{MutationKind, PayloadVariantGenerator, VariantCase};
