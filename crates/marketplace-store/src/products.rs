use anyhow::{Context, Result};
use artisan_core::{MarketplaceError, Product, ProductFilter, ProductInput, ProductUpdate};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::db::MarketplaceDb;

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    artisan_id: String,
    title: String,
    description: String,
    price: f64,
    category: String,
    images: String,
    story: Option<String>,
    cultural_context: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = anyhow::Error;

    fn try_from(row: ProductRow) -> Result<Self> {
        let images = serde_json::from_str(&row.images)
            .with_context(|| format!("Stored product {} has corrupt images column", row.id))?;

        Ok(Product {
            images,
            id: row.id,
            artisan_id: row.artisan_id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: row.category,
            story: row.story,
            cultural_context: row.cultural_context,
            created_at: row.created_at,
        })
    }
}

/// The products that make up artisans' portfolios.
pub struct ProductCatalog {
    db: MarketplaceDb,
}

impl ProductCatalog {
    pub fn new(db: MarketplaceDb) -> Self {
        Self { db }
    }

    pub async fn create(&self, artisan_id: &str, input: ProductInput) -> Result<Product> {
        input.validate()?;
        let product = Product::new(artisan_id, input);

        sqlx::query(
            r#"
            INSERT INTO products (id, artisan_id, title, description, price, category, images, story, cultural_context, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.artisan_id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(serde_json::to_string(&product.images)?)
        .bind(&product.story)
        .bind(&product.cultural_context)
        .bind(product.created_at)
        .execute(self.db.pool())
        .await?;

        tracing::debug!("Artisan {} listed product {}", artisan_id, product.id);

        Ok(product)
    }

    /// Newest first, optionally narrowed by category and/or artisan.
    pub async fn list(&self, filter: &ProductFilter, limit: i64) -> Result<Vec<Product>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM products");
        let mut has_where = false;

        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            query.push(" WHERE category = ").push_bind(category.to_string());
            has_where = true;
        }
        if let Some(artisan_id) = filter.artisan_id.as_deref().filter(|a| !a.is_empty()) {
            query
                .push(if has_where { " AND " } else { " WHERE " })
                .push("artisan_id = ")
                .push_bind(artisan_id.to_string());
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit);

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(Product::try_from).transpose()
    }

    pub async fn require(&self, id: &str) -> Result<Product> {
        self.get(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Product").into())
    }

    pub async fn update(&self, id: &str, update: ProductUpdate) -> Result<Product> {
        update.validate()?;
        let mut product = self.require(id).await?;
        product.apply(update);

        sqlx::query(
            r#"
            UPDATE products
            SET title = ?, description = ?, price = ?, category = ?, images = ?, story = ?, cultural_context = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(serde_json::to_string(&product.images)?)
        .bind(&product.story)
        .bind(&product.cultural_context)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(product)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(MarketplaceError::not_found("Product").into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::UserDirectory;
    use artisan_core::NewUser;

    async fn setup() -> (ProductCatalog, String, String) {
        let db = MarketplaceDb::in_memory().await.unwrap();
        let users = UserDirectory::new(db.clone());
        let mut ids = Vec::new();
        for email in ["weaver@example.com", "potter@example.com"] {
            let user = users
                .register(NewUser {
                    email: email.to_string(),
                    name: "Test Artisan".to_string(),
                    password: "TestPass123!".to_string(),
                    user_type: "artisan".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let potter = ids.pop().unwrap();
        let weaver = ids.pop().unwrap();
        (ProductCatalog::new(db), weaver, potter)
    }

    fn input(title: &str, category: &str, price: f64) -> ProductInput {
        ProductInput {
            title: title.to_string(),
            description: "Made by hand".to_string(),
            price,
            category: category.to_string(),
            images: vec!["https://example.com/image1.jpg".to_string()],
            story: None,
            cultural_context: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (catalog, weaver, _) = setup().await;
        let product = catalog
            .create(&weaver, input("Test Handwoven Scarf", "Textiles", 2500.0))
            .await
            .unwrap();

        let fetched = catalog.get(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Test Handwoven Scarf");
        assert_eq!(fetched.images, vec!["https://example.com/image1.jpg".to_string()]);
        assert_eq!(fetched.artisan_id, weaver);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (catalog, weaver, potter) = setup().await;
        catalog.create(&weaver, input("Scarf", "Textiles", 2500.0)).await.unwrap();
        catalog.create(&weaver, input("Shawl", "Textiles", 4000.0)).await.unwrap();
        catalog.create(&potter, input("Vase", "Pottery", 900.0)).await.unwrap();

        let all = catalog.list(&ProductFilter::default(), 100).await.unwrap();
        assert_eq!(all.len(), 3);

        let textiles = catalog
            .list(
                &ProductFilter {
                    category: Some("Textiles".to_string()),
                    artisan_id: None,
                },
                100,
            )
            .await
            .unwrap();
        assert_eq!(textiles.len(), 2);

        let potters = catalog
            .list(
                &ProductFilter {
                    category: Some("Textiles".to_string()),
                    artisan_id: Some(potter.clone()),
                },
                100,
            )
            .await
            .unwrap();
        assert!(potters.is_empty());

        let limited = catalog.list(&ProductFilter::default(), 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (catalog, weaver, _) = setup().await;
        let product = catalog
            .create(&weaver, input("Scarf", "Textiles", 2500.0))
            .await
            .unwrap();

        let updated = catalog
            .update(
                &product.id,
                ProductUpdate {
                    price: Some(2800.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 2800.0);
        assert_eq!(catalog.require(&product.id).await.unwrap().price, 2800.0);

        catalog.delete(&product.id).await.unwrap();
        assert!(catalog.get(&product.id).await.unwrap().is_none());

        let err = catalog.delete(&product.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found");
    }

    #[tokio::test]
    async fn test_corrupt_images_column_is_an_error() {
        let (catalog, weaver, _) = setup().await;
        let product = catalog
            .create(&weaver, input("Scarf", "Textiles", 2500.0))
            .await
            .unwrap();

        sqlx::query("UPDATE products SET images = 'not json' WHERE id = ?")
            .bind(&product.id)
            .execute(catalog.db.pool())
            .await
            .unwrap();

        let err = catalog.get(&product.id).await.unwrap_err();
        assert!(err.to_string().contains("corrupt images column"));
        assert!(catalog.list(&ProductFilter::default(), 100).await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let (catalog, weaver, _) = setup().await;
        let err = catalog
            .create(&weaver, input("Scarf", "Textiles", -5.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MarketplaceError>(),
            Some(MarketplaceError::Validation(_))
        ));
    }
}
