//! Banner CRUD against the merchant backend.

use reqwest::multipart::{Form, Part};
use secrecy::SecretString;
use tracing::instrument;

use navdana_core::{Banner, BannerId};

use super::{ApiError, MerchantApi};

/// A banner operation, for choosing what to tell the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerAction {
    List,
    Upload,
    Toggle,
    Delete,
}

impl BannerAction {
    /// Shown on success.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::List => "",
            Self::Upload => "Banner added successfully!",
            Self::Toggle => "Banner status updated!",
            Self::Delete => "Banner deleted successfully!",
        }
    }

    /// Shown on failure when the backend gave no usable message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to fetch banners",
            Self::Upload => "Failed to upload banner. Title must be unique.",
            Self::Toggle => "Failed to update banner.",
            Self::Delete => "Failed to delete banner.",
        }
    }
}

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct BannerImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A banner to upload.
#[derive(Debug, Clone)]
pub struct NewBanner {
    pub title: String,
    pub is_active: bool,
    pub image: Option<BannerImage>,
}

impl NewBanner {
    /// Title and image, or the validation message.
    fn parts(&self) -> Result<(&str, &BannerImage), ApiError> {
        let title = self.title.trim();
        match &self.image {
            Some(image) if !title.is_empty() && !image.bytes.is_empty() => Ok((title, image)),
            _ => Err(ApiError::Validation(
                "Title and image are required.".to_string(),
            )),
        }
    }

    /// The multipart body: `title`, `isActive` and the file as `url`.
    fn to_form(&self) -> Result<Form, ApiError> {
        let (title, image) = self.parts()?;
        let file = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;

        Ok(Form::new()
            .text("title", title.to_string())
            .text("isActive", self.is_active.to_string())
            .part("url", file))
    }
}

impl MerchantApi {
    /// All banners, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a banner list.
    #[instrument(skip_all)]
    pub async fn list_banners(&self, token: &SecretString) -> Result<Vec<Banner>, ApiError> {
        let request = self.client().get(self.url("/banner"));
        self.send(request, Some(token)).await
    }

    /// Upload a new banner.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without a request when the title or
    /// image is missing, or the backend's error otherwise.
    #[instrument(skip_all, fields(title = %banner.title))]
    pub async fn upload_banner(
        &self,
        token: &SecretString,
        banner: &NewBanner,
    ) -> Result<(), ApiError> {
        let form = banner.to_form()?;
        let request = self.client().post(self.url("/banner/upload")).multipart(form);
        self.send_raw(request, Some(token)).await?;
        Ok(())
    }

    /// Switch a banner on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses.
    #[instrument(skip(self, token))]
    pub async fn set_banner_active(
        &self,
        token: &SecretString,
        id: &BannerId,
        is_active: bool,
    ) -> Result<(), ApiError> {
        let request = self
            .client()
            .put(self.url(&format!("/banner/{id}")))
            .json(&serde_json::json!({ "isActive": is_active }));
        self.send_raw(request, Some(token)).await?;
        Ok(())
    }

    /// Flip a banner's active flag, reading its current state first.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails, or the banner is not listed.
    pub async fn toggle_banner(&self, token: &SecretString, id: &BannerId) -> Result<bool, ApiError> {
        let banners = self.list_banners(token).await?;
        let current = banners
            .iter()
            .find(|b| &b.id == id)
            .ok_or_else(|| ApiError::Validation(format!("Banner {id} not found.")))?;
        let is_active = !current.is_active;
        self.set_banner_active(token, id, is_active).await?;
        Ok(is_active)
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses.
    #[instrument(skip(self, token))]
    pub async fn delete_banner(&self, token: &SecretString, id: &BannerId) -> Result<(), ApiError> {
        let request = self.client().delete(self.url(&format!("/banner/{id}")));
        self.send_raw(request, Some(token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> BannerImage {
        BannerImage {
            file_name: "diwali.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_upload_needs_title_and_image() {
        let no_image = NewBanner {
            title: "Diwali".to_string(),
            is_active: true,
            image: None,
        };
        let blank_title = NewBanner {
            title: "   ".to_string(),
            is_active: true,
            image: Some(image()),
        };

        for banner in [no_image, blank_title] {
            let err = banner.to_form().err();
            assert!(
                matches!(&err, Some(ApiError::Validation(m)) if m == "Title and image are required.")
            );
        }
    }

    #[test]
    fn test_upload_form_builds() {
        let banner = NewBanner {
            title: " Diwali ".to_string(),
            is_active: false,
            image: Some(image()),
        };
        assert!(banner.to_form().is_ok());
        assert_eq!(banner.parts().ok().map(|(t, _)| t), Some("Diwali"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            BannerAction::Upload.failure_message(),
            "Failed to upload banner. Title must be unique."
        );
        assert_eq!(BannerAction::Delete.success_message(), "Banner deleted successfully!");
        assert_eq!(BannerAction::List.failure_message(), "Failed to fetch banners");
    }
}
