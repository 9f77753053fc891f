pub mod error;
pub mod notify;
pub mod ui_state;

pub use error::{AppError, Result};
pub use notify::{Notifier, RecordingNotifier, TracingNotifier};
pub use ui_state::{ListPreferences, MemoryUiStateStore, UiStateStore, ViewMode};
