//! JSON-over-HTTP remote cart client.

use async_trait::async_trait;
use cardfactory_core::{Cart, CartItem, CartLineInput};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{RemoteCartClient, RemoteError};
use crate::config::RemoteCartConfig;

/// Response body of `GET cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartResponse {
    #[serde(default)]
    cart_item: Vec<CartItem>,
}

/// Request body of `POST cart/items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddCartRequest<'a> {
    cart_item: &'a [CartLineInput],
}

/// Remote cart client speaking JSON over HTTP.
///
/// Endpoints, relative to the configured base URL:
///
/// | Operation     | Request                    |
/// |---------------|----------------------------|
/// | `get_cart`    | `GET cart`                 |
/// | `add_items`   | `POST cart/items`          |
/// | `remove_item` | `DELETE cart/items/{slug}` |
/// | `clear_cart`  | `DELETE cart`              |
#[derive(Clone)]
pub struct HttpCartClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartClient {
    /// Create a new remote cart client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &RemoteCartConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.api_token {
            let auth_value = format!("Bearer {}", token.expose_secret());
            let mut value = HeaderValue::from_str(&auth_value)
                .map_err(|e| RemoteError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn cart_url(&self) -> Result<Url, RemoteError> {
        Ok(self.base_url.join("cart")?)
    }

    fn items_url(&self) -> Result<Url, RemoteError> {
        Ok(self.base_url.join("cart/items")?)
    }

    fn item_url(&self, slug: &str) -> Result<Url, RemoteError> {
        let mut url = self.items_url()?;
        url.path_segments_mut()
            .map_err(|()| RemoteError::Parse(format!("{} cannot be a base URL", self.base_url)))?
            .push(slug);
        Ok(url)
    }

    /// Turn a non-success response into a `RemoteError`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after, &body))
    }
}

/// Map a non-success status to the matching error.
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> RemoteError {
    let message: String = body.chars().take(200).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited(retry_after.unwrap_or(1)),
        _ => RemoteError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl RemoteCartClient for HttpCartClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<Cart, RemoteError> {
        let response = self.client.get(self.cart_url()?).send().await?;
        let body: CartResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        debug!(lines = body.cart_item.len(), "Fetched remote cart");
        Ok(Cart::from(body.cart_item))
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn add_items(&self, lines: &[CartLineInput]) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.items_url()?)
            .json(&AddCartRequest { cart_item: lines })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(slug = %slug))]
    async fn remove_item(&self, slug: &str) -> Result<(), RemoteError> {
        let response = self.client.delete(self.item_url(slug)?).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), RemoteError> {
        let response = self.client.delete(self.cart_url()?).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use cardfactory_core::Quantity;

    use super::*;

    fn client(base: &str) -> HttpCartClient {
        HttpCartClient::new(&RemoteCartConfig {
            base_url: Url::parse(base).unwrap(),
            api_token: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client("https://api.example.com/v1/");

        assert_eq!(
            client.cart_url().unwrap().as_str(),
            "https://api.example.com/v1/cart"
        );
        assert_eq!(
            client.items_url().unwrap().as_str(),
            "https://api.example.com/v1/cart/items"
        );
    }

    #[test]
    fn test_item_url_encodes_slug() {
        let client = client("https://api.example.com/");

        assert_eq!(
            client.item_url("holiday card/2").unwrap().as_str(),
            "https://api.example.com/cart/items/holiday%20card%2F2"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, None, "expired"),
            RemoteError::Unauthorized(msg) if msg == "expired"
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, None, ""),
            RemoteError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some(30), ""),
            RemoteError::RateLimited(30)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, None, ""),
            RemoteError::RateLimited(1)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, None, "boom"),
            RemoteError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(1000);
        let RemoteError::Api { message, .. } = status_error(StatusCode::BAD_GATEWAY, None, &body)
        else {
            panic!("expected API error");
        };
        assert_eq!(message.len(), 200);
    }

    #[test]
    fn test_add_request_shape() {
        let lines = vec![CartLineInput {
            slug: "a".to_string(),
            quantity: Quantity::from(3),
        }];
        let json = serde_json::to_value(AddCartRequest { cart_item: &lines }).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "cartItem": [{ "slug": "a", "quantity": 3 }] })
        );
    }

    #[test]
    fn test_cart_response_collapses_duplicates() {
        let body: CartResponse = serde_json::from_str(
            r#"{"cartItem":[{"slug":"a","quantity":1},{"slug":"a","quantity":4}]}"#,
        )
        .unwrap();
        let cart = Cart::from(body.cart_item);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity.get(), 4);
    }
}
