/*!
 * Utilities Module
 *
 * Contains the application-wide error taxonomy (§7).
 */

pub mod errors;

pub use errors::{AppError, Result};
