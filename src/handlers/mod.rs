/*!
 * HTTP Request Handlers Module
 *
 * Contains all HTTP request handlers for the API endpoints (§6).
 */

pub mod agenda;
pub mod appointments;
pub mod availability;
pub mod public_appointments;

pub use agenda::{staff_day_view, worker_day_view};
pub use appointments::{attend, cancel, inline_edit, no_show, register_payment, reschedule};
pub use availability::generate_options;
pub use public_appointments::reserve;
