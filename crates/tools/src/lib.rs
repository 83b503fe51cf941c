//! Built-in tool implementations for Verdant.
//!
//! Tools give the agent the ability to act outside the conversation:
//! check the weather, do watering math, schedule reminders, and search
//! the web. Each tool is the sole boundary to its provider — errors and
//! timeouts become failed `ToolResult`s at the registry, never panics.

pub mod calculator;
pub mod reminder;
pub mod weather;
pub mod web_search;

use std::path::PathBuf;
use std::sync::Arc;

use verdant_core::tool::ToolRegistry;

pub use calculator::CalculatorTool;
pub use reminder::{ReminderStore, ReminderTool};
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

/// Options for building the default tool registry.
pub struct RegistryOptions {
    /// OpenWeatherMap API key; `None` leaves the weather tool registered
    /// but unconfigured (it reports failure when invoked).
    pub weather_api_key: Option<String>,

    /// Weather API base URL (overridable for tests).
    pub weather_base_url: String,

    /// Whether web search is enabled.
    pub search_enabled: bool,

    /// Path for the durable reminder store.
    pub reminder_path: PathBuf,

    /// Reminder dedupe window in hours.
    pub reminder_dedupe_hours: u64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            weather_base_url: "https://api.openweathermap.org/data/2.5".into(),
            search_enabled: false,
            reminder_path: ReminderStore::default_path(),
            reminder_dedupe_hours: 24,
        }
    }
}

/// Create the default tool registry plus a handle to the reminder store
/// (the operational surface lists reminders without going through the
/// loop).
pub fn default_registry(options: RegistryOptions) -> (ToolRegistry, Arc<ReminderStore>) {
    let reminders = Arc::new(ReminderStore::new(
        options.reminder_path,
        options.reminder_dedupe_hours,
    ));

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WeatherTool::new(
        options.weather_api_key,
        options.weather_base_url,
    )));
    registry.register(Box::new(CalculatorTool));
    registry.register(Box::new(ReminderTool::new(reminders.clone())));
    registry.register(Box::new(WebSearchTool::new(options.search_enabled)));

    (registry, reminders)
}
