//! Purpose: Shared library crate used by the `tabsort` CLI and tests.
//! Exports: `api` (tables, bid records, sorting, errors).
//! Role: Parsing and sorting core; the binary only adds prompting, timing, and output.
//! Invariants: Core functions return errors to the caller and never log or print.
//! Invariants: No process-wide state; every operation works on caller-owned data.
pub mod api;
mod core;
