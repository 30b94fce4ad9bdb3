pub mod local_book;
pub mod local_storage;
pub mod notifier;

pub use local_book::LocalBook;
pub use local_storage::LocalStorage;
pub use notifier::{watch, ConsoleNotifier};
