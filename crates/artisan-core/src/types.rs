use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Account kind. Only artisans may publish products and stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Artisan,
    Buyer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Artisan => "artisan",
            UserType::Buyer => "buyer",
        }
    }

}

impl std::str::FromStr for UserType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "artisan" => Ok(UserType::Artisan),
            "buyer" => Ok(UserType::Buyer),
            _ => Err(MarketplaceError::Validation(format!(
                "Unknown user_type '{}': expected 'artisan' or 'buyer'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub user_type: UserType,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub craft_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_artisan(&self) -> bool {
        self.user_type == UserType::Artisan
    }
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub user_type: String,
}

impl NewUser {
    /// Normalize and check the payload, returning the parsed user type.
    pub fn validate(&mut self) -> MarketplaceResult<UserType> {
        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_string();

        if self.email.is_empty() || !self.email.contains('@') {
            return Err(MarketplaceError::Validation(
                "A valid email is required".to_string(),
            ));
        }
        if self.name.is_empty() {
            return Err(MarketplaceError::Validation("Name is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(MarketplaceError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        self.user_type.parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub craft_type: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> MarketplaceResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(MarketplaceError::Validation(
                    "Name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A handcrafted item in an artisan's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub artisan_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub cultural_context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(artisan_id: impl Into<String>, input: ProductInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            artisan_id: artisan_id.into(),
            title: input.title.trim().to_string(),
            description: input.description,
            price: input.price,
            category: input.category.trim().to_string(),
            images: input.images,
            story: input.story,
            cultural_context: input.cultural_context,
            created_at: Utc::now(),
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: ProductUpdate) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if update.story.is_some() {
            self.story = update.story;
        }
        if update.cultural_context.is_some() {
            self.cultural_context = update.cultural_context;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub cultural_context: Option<String>,
}

impl ProductInput {
    pub fn validate(&self) -> MarketplaceResult<()> {
        validate_title(&self.title)?;
        validate_price(self.price)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub story: Option<String>,
    pub cultural_context: Option<String>,
}

impl ProductUpdate {
    pub fn validate(&self) -> MarketplaceResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

/// Optional filters for catalogue listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub artisan_id: Option<String>,
}

/// A narrative an artisan tells about their craft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub artisan_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Story {
    pub fn new(artisan_id: impl Into<String>, input: StoryInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            artisan_id: artisan_id.into(),
            title: input.title.trim().to_string(),
            content: input.content,
            audio_url: input.audio_url,
            video_url: input.video_url,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl StoryInput {
    pub fn validate(&self) -> MarketplaceResult<()> {
        validate_title(&self.title)?;
        if self.content.trim().is_empty() {
            return Err(MarketplaceError::Validation(
                "Content is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything shown on an artisan's public page.
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub artisan: User,
    pub products: Vec<Product>,
    pub stories: Vec<Story>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_title(title: &str) -> MarketplaceResult<()> {
    if title.trim().is_empty() {
        return Err(MarketplaceError::Validation("Title is required".to_string()));
    }
    Ok(())
}

fn validate_price(price: f64) -> MarketplaceResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(MarketplaceError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(user_type: &str) -> NewUser {
        NewUser {
            email: "  Weaver@Example.com ".to_string(),
            name: " Meera ".to_string(),
            password: "TestPass123!".to_string(),
            user_type: user_type.to_string(),
        }
    }

    fn scarf() -> ProductInput {
        ProductInput {
            title: "Handwoven Scarf".to_string(),
            description: "Silk with block-printed motifs".to_string(),
            price: 2500.0,
            category: "Textiles".to_string(),
            images: vec![],
            story: None,
            cultural_context: None,
        }
    }

    #[test]
    fn test_user_type_parse() {
        assert_eq!("artisan".parse::<UserType>(), Ok(UserType::Artisan));
        assert_eq!(" BUYER".parse::<UserType>(), Ok(UserType::Buyer));
        assert!(matches!(
            "admin".parse::<UserType>(),
            Err(MarketplaceError::Validation(_))
        ));
    }

    #[test]
    fn test_user_type_serializes_lowercase() {
        let json = serde_json::to_string(&UserType::Artisan).unwrap();
        assert_eq!(json, "\"artisan\"");
    }

    #[test]
    fn test_new_user_validate_normalizes() {
        let mut user = new_user("artisan");
        let kind = user.validate().unwrap();
        assert_eq!(kind, UserType::Artisan);
        assert_eq!(user.email, "weaver@example.com");
        assert_eq!(user.name, "Meera");
    }

    #[test]
    fn test_new_user_rejects_bad_input() {
        let mut user = new_user("collector");
        assert!(matches!(user.validate(), Err(MarketplaceError::Validation(_))));

        let mut user = new_user("buyer");
        user.password = "abc".to_string();
        assert!(matches!(user.validate(), Err(MarketplaceError::Validation(_))));

        let mut user = new_user("buyer");
        user.email = "not-an-email".to_string();
        assert!(matches!(user.validate(), Err(MarketplaceError::Validation(_))));
    }

    #[test]
    fn test_product_input_validation() {
        assert!(scarf().validate().is_ok());

        let mut bad = scarf();
        bad.price = -1.0;
        assert!(bad.validate().is_err());

        let mut bad = scarf();
        bad.title = "   ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_product_apply_partial_update() {
        let mut product = Product::new("artisan-1", scarf());
        product.apply(ProductUpdate {
            price: Some(3000.0),
            cultural_context: Some("Rajasthani bandhani".to_string()),
            ..Default::default()
        });

        assert_eq!(product.price, 3000.0);
        assert_eq!(product.title, "Handwoven Scarf");
        assert_eq!(product.cultural_context.as_deref(), Some("Rajasthani bandhani"));
    }

    #[test]
    fn test_product_images_default_empty() {
        let input: ProductInput = serde_json::from_str(
            r#"{"title":"Bowl","description":"Terracotta","price":400,"category":"Pottery"}"#,
        )
        .unwrap();
        assert!(input.images.is_empty());
    }

    #[test]
    fn test_story_input_requires_content() {
        let input = StoryInput {
            title: "My Craft Journey".to_string(),
            content: " ".to_string(),
            audio_url: None,
            video_url: None,
        };
        assert!(input.validate().is_err());
    }
}
