pub mod reminder_models;
pub mod reminder_dto;
pub mod reminder_handlers;
pub mod reminder_service;

pub use reminder_models::Reminder;
pub use reminder_dto::{CreateReminderRequest, CreateReminderResponse};
pub use reminder_handlers::{create_reminder, get_reminder, method_not_allowed, preflight};
pub use reminder_service::{validate_request, ReminderService};
