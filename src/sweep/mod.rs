pub mod scheduler;
pub mod sweep_dto;
pub mod sweep_handlers;
pub mod sweep_service;

pub use scheduler::start_sweep_scheduler;
pub use sweep_dto::SweepResponse;
pub use sweep_handlers::check_reminders;
pub use sweep_service::{ReminderSweeper, SweepSettings};
