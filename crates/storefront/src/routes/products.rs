//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use navdana_core::{Price, ProductId};

use super::Layout;
use crate::backend::{MerchantBackend, Product};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Product card data for grids.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: Price::inr(product.price).display(),
            image: product.primary_image().to_string(),
        }
    }
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub sku: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: Price::inr(product.price).display(),
            description: product.description.clone().unwrap_or_default(),
            images: product.images.clone(),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            sku: product.sku.clone().unwrap_or_default(),
        }
    }
}

/// Which option was missing from an add-to-cart attempt.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub missing: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub error: Option<String>,
}

/// Display product listing page.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let products = state.backend().list_products().await?;

    Ok(ProductsIndexTemplate {
        layout: Layout::load(&state, &session).await,
        products: products.iter().map(ProductCard::from).collect(),
    })
}

/// Display product detail page.
#[instrument(skip(state, session, query))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<ShowQuery>,
) -> Result<impl IntoResponse> {
    let product = state.backend().product(&ProductId::new(id)).await?;

    let error = query.missing.as_deref().map(|missing| match missing {
        "color" => "Please select a color".to_string(),
        _ => "Please select a size".to_string(),
    });

    Ok(ProductShowTemplate {
        layout: Layout::load(&state, &session).await,
        product: ProductView::from(&product),
        error,
    })
}
