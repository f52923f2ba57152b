/*!
 * Data Models Module
 *
 * Contains the booking domain's data types and their row/wire mappings.
 */

pub mod appointment;
pub mod customer;
pub mod principal;
pub mod request_context;
pub mod schedule;
pub mod service;
pub mod worker;

pub use appointment::{
    Appointment, AppointmentAudit, AppointmentBlock, AppointmentBlockWithLines,
    AppointmentServiceLine, AppointmentStatus, AppointmentWithBlocks, AuditAction, CreatedChannel,
    PaymentMethod,
};
pub use customer::{Customer, CustomerInput, CustomerType};
pub use principal::{Principal, Role};
pub use request_context::RequestContext;
pub use schedule::{CalendarException, DayOfWeek, ExceptionType, RecurringBreak, WeeklyScheduleRule};
pub use service::{AssignmentGroup, AssignmentType, Service, ServiceCategory};
pub use worker::{Worker, WorkerRole};
