//! Presentation links attached to products and payments.

use serde::{Deserialize, Serialize};

use super::payment::Payment;
use super::product::Product;

/// A hypermedia link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub method: String,
    pub href: String,
}

impl Link {
    pub fn get(rel: &str, href: String) -> Self {
        Self {
            rel: rel.to_string(),
            method: "GET".to_string(),
            href,
        }
    }
}

/// Builds links from the configured base URLs
#[derive(Debug, Clone)]
pub struct LinksDecorator {
    products_api_url: String,
    products_ui_pay_url: String,
}

impl LinksDecorator {
    pub fn new(products_api_url: impl Into<String>, products_ui_pay_url: impl Into<String>) -> Self {
        Self {
            products_api_url: trim_slash(products_api_url.into()),
            products_ui_pay_url: trim_slash(products_ui_pay_url.into()),
        }
    }

    /// Attach `self` and `pay` links to a product
    pub fn decorate_product(&self, mut product: Product) -> Product {
        product.links = vec![
            Link::get(
                "self",
                format!("{}/v1/api/products/{}", self.products_api_url, product.external_id),
            ),
            Link::get(
                "pay",
                format!("{}/{}", self.products_ui_pay_url, product.external_id),
            ),
        ];
        product
    }

    /// Attach `self` and, when known, `next` links to a payment
    pub fn decorate_payment(&self, mut payment: Payment) -> Payment {
        let mut links = vec![Link::get(
            "self",
            format!("{}/v1/api/payments/{}", self.products_api_url, payment.external_id),
        )];

        if let Some(next_url) = payment.next_url.as_deref().filter(|url| !url.is_empty()) {
            links.push(Link::get("next", next_url.to_string()));
        }

        payment.links = links;
        payment
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decorator() -> LinksDecorator {
        LinksDecorator::new("http://localhost/", "http://localhost/pay")
    }

    fn product() -> Product {
        Product::new(1, "P1".to_string(), "Fee".to_string(), 1050, "token".to_string())
    }

    #[test]
    fn test_product_links() {
        let product = decorator().decorate_product(product());

        assert_eq!(product.links.len(), 2);
        assert_eq!(product.links[0].href, "http://localhost/v1/api/products/P1");
        assert_eq!(product.links[1].rel, "pay");
        assert_eq!(product.links[1].href, "http://localhost/pay/P1");
    }

    #[test]
    fn test_payment_links_include_next_url() {
        let mut payment = Payment::new("abc".to_string(), product());
        payment.mark_succeeded("G1".to_string(), "https://next.url".to_string());

        let payment = decorator().decorate_payment(payment);
        assert_eq!(payment.links.len(), 2);
        assert_eq!(payment.links[0].href, "http://localhost/v1/api/payments/abc");
        assert_eq!(payment.links[1].rel, "next");
    }

    #[test]
    fn test_payment_links_skip_empty_next_url() {
        let mut payment = Payment::new("abc".to_string(), product());
        payment.mark_succeeded("G1".to_string(), String::new());

        let payment = decorator().decorate_payment(payment);
        assert_eq!(payment.links.len(), 1);
    }
}
