//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod image_repo;
pub mod loan_repo;
pub mod movie_repo;

pub use image_repo::ImageRepo;
pub use loan_repo::LoanRepo;
pub use movie_repo::MovieRepo;

/// Rows per multi-row INSERT, keeping bind parameters well under the
/// Postgres limit of 65535.
pub(crate) const INSERT_CHUNK_ROWS: usize = 1000;

/// Append `rows` placeholder tuples of `width` parameters each, numbered
/// from `$1`.
pub(crate) fn push_value_tuples(query: &mut String, rows: usize, width: usize) {
    let mut param_idx = 1usize;
    for row in 0..rows {
        if row > 0 {
            query.push_str(", ");
        }
        query.push('(');
        for col in 0..width {
            if col > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!("${param_idx}"));
            param_idx += 1;
        }
        query.push(')');
    }
}
