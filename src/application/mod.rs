//! Application layer: the record validation pipeline and the tax engine
//! that consumes its output.
//!
//! `ValidationEngine` decides which records can be trusted; `TaxProcessor`
//! computes liabilities over the trusted ones and keeps an audit history.
//! Both are synchronous and can be shared behind an `Arc`.

pub mod report;
pub mod tax;
pub mod validation;
