//! Banner management commands.
//!
//! These talk to the merchant backend with an operator token, the same
//! calls the admin panel's banner page makes.

use std::path::Path;

use navdana_admin::merchant::{ApiError, BannerImage, MerchantApi, NewBanner};
use navdana_core::BannerId;
use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during banner commands.
#[derive(Debug, Error)]
pub enum BannerError {
    /// The image file could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend refused or failed the request.
    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Backend client plus the operator token.
pub struct Context {
    api: MerchantApi,
    token: SecretString,
}

impl Context {
    #[must_use]
    pub fn new(api_url: &str, token: SecretString) -> Self {
        Self {
            api: MerchantApi::new(api_url),
            token,
        }
    }
}

/// Print every banner, one per line.
pub async fn list(ctx: &Context) -> Result<(), BannerError> {
    let banners = ctx.api.list_banners(&ctx.token).await?;

    if banners.is_empty() {
        info!("No banners");
    }
    for banner in &banners {
        let status = if banner.is_active { "active" } else { "inactive" };
        info!("{}  {:<8}  {}  {}", banner.id, status, banner.title, banner.url);
    }
    Ok(())
}

/// Upload an image file as a new banner.
///
/// # Errors
///
/// Returns [`BannerError::ReadFile`] if the file cannot be read, or the
/// backend's refusal (for example a duplicate title).
pub async fn upload(ctx: &Context, title: &str, file: &Path, is_active: bool) -> Result<(), BannerError> {
    let bytes = std::fs::read(file).map_err(|source| BannerError::ReadFile {
        path: file.display().to_string(),
        source,
    })?;

    let file_name = file
        .file_name()
        .map_or_else(|| "banner".to_string(), |n| n.to_string_lossy().into_owned());

    let banner = NewBanner {
        title: title.to_string(),
        is_active,
        image: Some(BannerImage {
            content_type: content_type_for(file).to_string(),
            file_name,
            bytes,
        }),
    };

    ctx.api.upload_banner(&ctx.token, &banner).await?;
    info!("Banner added: {title}");
    Ok(())
}

/// Flip a banner's active flag.
pub async fn toggle(ctx: &Context, id: &str) -> Result<(), BannerError> {
    let id = BannerId::from(id);
    let active = ctx.api.toggle_banner(&ctx.token, &id).await?;
    info!("Banner {id} is now {}", if active { "active" } else { "inactive" });
    Ok(())
}

/// Delete a banner.
pub async fn delete(ctx: &Context, id: &str) -> Result<(), BannerError> {
    let id = BannerId::from(id);
    ctx.api.delete_banner(&ctx.token, &id).await?;
    info!("Banner {id} deleted");
    Ok(())
}

/// Guess the image MIME type from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/b/sale.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("hero.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("hero.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }
}
