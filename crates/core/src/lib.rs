//! Domain types and pure logic for the tabula service.
//!
//! Nothing in this crate performs I/O: handlers in `tabula-api` fetch rows
//! and bytes, then hand them to the functions here.

pub mod chart;
pub mod csv_import;
pub mod error;
pub mod imaging;
pub mod loan;
pub mod movie;
pub mod naming;
pub mod pagination;
pub mod stats;
pub mod text;
pub mod types;
pub mod validation;
