//! Promotional banners shown on the home page and managed from the admin.

use serde::{Deserialize, Serialize};

use crate::types::BannerId;

/// A banner image with an on/off switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(rename = "_id", alias = "id")]
    pub id: BannerId,
    #[serde(default)]
    pub title: String,
    /// Image URL (hosted by the backend's CDN).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Keep only the banners that are switched on, preserving order.
#[must_use]
pub fn active(banners: Vec<Banner>) -> Vec<Banner> {
    banners.into_iter().filter(|b| b.is_active).collect()
}
