/// Dataset variants and the active-cases derivation.
pub mod dataset;
/// Download and local caching of the upstream tables.
pub mod fetch;
/// CSV case-count tables.
pub mod table;
