//! dagster asset module dialect.
//!
//! An asset module declares computation nodes with `@dg.asset` or
//! `@dg.multi_asset(outs=...)`. A node depends on the assets named by its
//! parameters; parameters typed as the execution context or as a
//! configurable resource are injected by the framework instead.

mod decorator;
mod generator;
mod parser;

pub use decorator::NodeMarker;
pub use generator::generate_dagster;
pub use parser::parse_dagster;

/// Module name of the framework.
pub const FRAMEWORK_MODULE: &str = "dagster";

/// Alias used for the framework in generated modules.
pub const CANONICAL_ALIAS: &str = "dg";

/// Roots through which `asset`, `multi_asset` and resource bases are
/// reachable without a `from` import.
const QUALIFIED_ROOTS: &[&str] = &["dg", "dagster"];

const ASSET: &str = "asset";
const MULTI_ASSET: &str = "multi_asset";
const ASSET_OUT: &str = "AssetOut";

/// Base classes that turn a class into an injectable resource.
const RESOURCE_BASES: &[&str] = &["ConfigurableResource", "ConfigurableIOManager"];

/// Annotation marking the execution-context parameter.
const CONTEXT_TYPE: &str = "AssetExecutionContext";
