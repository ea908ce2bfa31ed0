//! Operator profile and preferences.
//!
//! These live only in the operator's session; nothing is sent to the
//! backend. A fresh session starts from the sample profile.

use serde::{Deserialize, Serialize};

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl Theme {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::System => "System Default",
        }
    }
}

/// Interface languages on offer.
pub const LANGUAGES: [&str; 3] = ["English", "Hindi", "Marathi"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Amit Sharma".to_string(),
            email: "amit.sharma@example.com".to_string(),
            phone: "+91 9876543210".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub notifications: bool,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            notifications: true,
            language: LANGUAGES[0].to_string(),
        }
    }
}

impl Preferences {
    /// Build from the submitted form. An unknown language keeps the
    /// current one.
    #[must_use]
    pub fn from_form(form: &PreferencesForm, current: &Self) -> Self {
        let language = if LANGUAGES.contains(&form.language.as_str()) {
            form.language.clone()
        } else {
            current.language.clone()
        };

        Self {
            theme: form.theme,
            // Unchecked boxes are simply absent from the form.
            notifications: form.notifications.is_some(),
            language,
        }
    }
}

/// Everything the settings page edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub profile: Profile,
    pub preferences: Preferences,
}

/// Preferences form data.
#[derive(Debug, Deserialize)]
pub struct PreferencesForm {
    #[serde(default)]
    pub theme: Theme,
    pub notifications: Option<String>,
    #[serde(default)]
    pub language: String,
}

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub new: String,
    #[serde(default)]
    pub confirm: String,
}

impl PasswordForm {
    /// Check the new password was typed the same twice.
    ///
    /// # Errors
    ///
    /// Returns the message to show when it was not.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.new == self.confirm {
            Ok(())
        } else {
            Err("New passwords do not match.")
        }
    }
}
