/*!
 * Services Module
 *
 * Business logic layer built on top of the repository facade (C8): the
 * reservation service (C5), lifecycle service (C6), and agenda views (C7).
 */

pub mod agenda_service;
pub mod lifecycle_service;
pub mod reservation_service;

pub use agenda_service::AgendaService;
pub use lifecycle_service::LifecycleService;
pub use reservation_service::ReservationService;
