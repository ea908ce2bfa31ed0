//! Admin sign-in, banners, orders, categories and reports against a fake merchant
//! backend.

#![allow(clippy::unwrap_used)]

use navdana_integration_tests::{FakeMerchant, VALID_OTP, client, spawn_admin};
use reqwest::{Client, StatusCode, header, multipart};

async fn get_page(client: &Client, url: String) -> String {
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.unwrap()
}

async fn post_form(client: &Client, url: String, form: &[(&str, &str)]) -> String {
    let resp = client.post(url).form(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.unwrap()
}

/// Sign in as an operator; returns the dashboard page.
async fn sign_in(client: &Client, base: &str) -> String {
    let page = post_form(
        client,
        format!("{base}/login/send-code"),
        &[("name", "Meera"), ("email", "meera@navdana.in")],
    )
    .await;
    assert!(page.contains("We sent a code to meera@navdana.in"));
    assert!(page.contains(r#"action="/login/verify""#));

    post_form(client, format!("{base}/login/verify"), &[("otp", VALID_OTP)]).await
}

#[tokio::test]
async fn test_panels_require_sign_in() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;

    let resp = client().get(format!("{base}/banners")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/login");
}

#[tokio::test]
async fn test_wrong_code_stays_on_login() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();

    post_form(
        &client,
        format!("{base}/login/send-code"),
        &[("name", "Meera"), ("email", "meera@navdana.in")],
    )
    .await;
    let page = post_form(&client, format!("{base}/login/verify"), &[("otp", "999999")]).await;
    assert!(page.contains("Invalid or expired OTP"));

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/login");
}

#[tokio::test]
async fn test_sign_in_then_out() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();

    let dashboard = sign_in(&client, &base).await;
    assert!(dashboard.contains("Welcome, Meera"));
    assert!(dashboard.contains("2 total, 1 active"));
    assert_eq!(backend.recorded().otp_emails, vec!["meera@navdana.in".to_string()]);

    let resp = client.post(format!("{base}/logout")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/login");

    let resp = client.get(format!("{base}/settings")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/login");
}

#[tokio::test]
async fn test_banner_toggle_and_delete() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();
    sign_in(&client, &base).await;

    let page = get_page(&client, format!("{base}/banners")).await;
    assert!(page.contains("Diwali Sale"));
    assert!(page.contains("Monsoon"));

    let page = post_form(&client, format!("{base}/banners/B2/toggle"), &[("active", "false")]).await;
    assert!(page.contains("Banner status updated!"));
    assert_eq!(backend.recorded().banners[1]["isActive"], true);

    let page = post_form(&client, format!("{base}/banners/B1/delete"), &[]).await;
    assert!(page.contains("Banner deleted successfully!"));
    assert!(!page.contains("Diwali Sale"));
    assert_eq!(backend.recorded().banners.len(), 1);
}

#[tokio::test]
async fn test_banner_upload() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();
    sign_in(&client, &base).await;

    let image = multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("holi.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = multipart::Form::new()
        .text("title", "Holi Colours")
        .text("isActive", "true")
        .part("url", image);

    let resp = client
        .post(format!("{base}/banners"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let page = resp.text().await.unwrap();
    assert!(page.contains("Banner added successfully!"));
    assert!(page.contains("Holi Colours"));
    assert_eq!(
        backend.recorded().uploads,
        vec![("Holi Colours".to_string(), "holi.jpg".to_string(), 4)]
    );

    // A repeated title is refused by the backend and reported.
    let image = multipart::Part::bytes(vec![0xFF, 0xD8]).file_name("again.jpg");
    let form = multipart::Form::new()
        .text("title", "Diwali Sale")
        .part("url", image);
    let page = client
        .post(format!("{base}/banners"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Banner title already exists"));
}

#[tokio::test]
async fn test_report_csv_download() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();
    sign_in(&client, &base).await;

    let page = get_page(&client, format!("{base}/reports?tab=inventory")).await;
    assert!(page.contains("Reports Dashboard"));

    let resp = client
        .get(format!("{base}/reports/order/csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        r#"attachment; filename="order_report.csv""#
    );
    let csv = resp.text().await.unwrap();
    assert!(csv.lines().count() > 1);
    assert!(csv.lines().nth(1).unwrap().starts_with('"'));
}

#[tokio::test]
async fn test_order_status_payment_and_delivery() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();
    sign_in(&client, &base).await;

    let page = get_page(&client, format!("{base}/orders")).await;
    assert!(page.contains("#101"));
    assert!(page.contains(r#"action="/orders/101/paid""#));

    let page = post_form(&client, format!("{base}/orders/101/status"), &[("status", "shipped")]).await;
    assert!(page.contains("Order 101 is now Shipped."));

    let page = post_form(&client, format!("{base}/orders/101/paid"), &[]).await;
    assert!(page.contains("Order 101 marked as paid."));
    assert!(!page.contains(r#"action="/orders/101/paid""#));

    let page = post_form(&client, format!("{base}/orders/101/delivered"), &[]).await;
    assert!(page.contains("Order 101 marked as delivered."));
    let page = post_form(&client, format!("{base}/orders/101/delivered"), &[]).await;
    assert!(page.contains("Order 101 marked as not delivered."));

    let page = post_form(&client, format!("{base}/orders/999/paid"), &[]).await;
    assert!(page.contains("Order not found!"));
    assert!(!page.contains("#999"));

    let page = post_form(&client, format!("{base}/orders/102/status"), &[("status", "lost")]).await;
    assert!(page.contains("Unknown order status."));
}

#[tokio::test]
async fn test_category_add_edit_delete_clear() {
    let backend = FakeMerchant::spawn().await;
    let base = spawn_admin(&backend).await;
    let client = client();
    sign_in(&client, &base).await;

    let page = get_page(&client, format!("{base}/categories")).await;
    assert!(page.contains("No categories yet."));

    let page = post_form(&client, format!("{base}/categories"), &[("name", " "), ("description", "")]).await;
    assert!(page.contains("Category name is required."));

    let page = post_form(
        &client,
        format!("{base}/categories"),
        &[("name", "Sarees"), ("description", "Handloom")],
    )
    .await;
    assert!(page.contains("Category added successfully!"));
    let (_, rest) = page.split_once(r#"action="/categories/"#).unwrap();
    let id = rest.split('"').next().unwrap().to_string();
    assert_ne!(id, "clear");

    let page = post_form(
        &client,
        format!("{base}/categories/{id}"),
        &[("name", "Silk Sarees"), ("description", "Banarasi")],
    )
    .await;
    assert!(page.contains("Category updated successfully!"));
    assert!(page.contains(r#"value="Silk Sarees""#));

    let page = post_form(&client, format!("{base}/categories/{id}/delete"), &[]).await;
    assert!(page.contains("Category deleted successfully!"));
    let page = post_form(&client, format!("{base}/categories/{id}/delete"), &[]).await;
    assert!(page.contains("Category not found!"));

    post_form(&client, format!("{base}/categories"), &[("name", "Kurtas")]).await;
    let page = post_form(&client, format!("{base}/categories/clear"), &[]).await;
    assert!(page.contains("All categories cleared!"));
    assert!(page.contains("No categories yet."));
}
