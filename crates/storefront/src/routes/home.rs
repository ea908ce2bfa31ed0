//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use navdana_core::banner;

use super::Layout;
use super::products::ProductCard;
use crate::backend::MerchantBackend;
use crate::filters;
use crate::state::AppState;

/// Number of products shown on the home page.
const FEATURED_PRODUCTS: usize = 8;

/// A hero slide built from an active banner.
#[derive(Clone)]
pub struct BannerSlide {
    pub title: String,
    pub image_url: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub banners: Vec<BannerSlide>,
    pub products: Vec<ProductCard>,
}

/// Display the home page.
///
/// Banners and products are both optional decoration: a backend failure
/// renders the page without them.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let (banners, products) = tokio::join!(
        state.backend().list_banners(),
        state.backend().list_products()
    );

    let banners = banners
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load banners"))
        .map(banner::active)
        .unwrap_or_default()
        .into_iter()
        .map(|b| BannerSlide {
            title: b.title,
            image_url: b.url,
        })
        .collect();

    let products = products
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load products"))
        .unwrap_or_default()
        .iter()
        .take(FEATURED_PRODUCTS)
        .map(ProductCard::from)
        .collect();

    HomeTemplate {
        layout: Layout::load(&state, &session).await,
        banners,
        products,
    }
}
