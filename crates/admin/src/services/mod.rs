//! Admin services.
//!
//! - [`reports`] - Sample report tables and CSV export
//! - [`settings`] - Operator profile and preferences
//! - [`calendar`] - Month grid
//! - [`orders`] - Order status, payment and delivery
//! - [`categories`] - Product categories

pub mod calendar;
pub mod categories;
pub mod orders;
pub mod reports;
pub mod settings;

pub use calendar::{DayCell, MonthGrid, WEEKDAYS};
pub use categories::{Category, CategoryError, CategoryForm, CategoryList};
pub use orders::{AdminOrder, OrderBook, OrderNotFound, OrderStatus};
pub use reports::{Report, ReportTab, UnknownReport, report};
pub use settings::{PasswordForm, Preferences, PreferencesForm, Profile, Settings, Theme};
