use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::StorefrontError;
use crate::models::Product;

use super::ApiClient;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub price: Decimal,
    pub stock: u32,
    pub low_stock_threshold: u32,
}

/// Partial update; only the fields present are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StockPatch {
    stock: u32,
}

impl ApiClient {
    pub async fn list_products(&self) -> Result<Vec<Product>, StorefrontError> {
        self.get_enveloped("/api/products").await
    }

    pub async fn create_product(
        &self,
        input: &CreateProductInput,
    ) -> Result<Product, StorefrontError> {
        self.post_enveloped("/api/products", input).await
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        updates: &UpdateProductInput,
    ) -> Result<Product, StorefrontError> {
        self.put_enveloped(&format!("/api/products/{id}"), updates)
            .await
    }

    pub async fn patch_stock(&self, id: Uuid, stock: u32) -> Result<Product, StorefrontError> {
        self.patch_enveloped(&format!("/api/products/{id}/stock"), &StockPatch { stock })
            .await
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), StorefrontError> {
        self.delete_ack(&format!("/api/products/{id}")).await
    }
}
