//! Prompt templates.
//!
//! The JSON layouts requested here are what the frontend renders, so field
//! names are part of the API contract.

use artisan_core::{Product, User};

pub const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in helping local artisans market their traditional crafts and tell their cultural stories.";

pub const CONNECTION_CHECK_PROMPT: &str =
    "Say 'AI integration successful for Artisan Marketplace!' and nothing else.";

pub const DEFAULT_PRODUCT_CONTEXT: &str = "Traditional handcrafted item";
pub const DEFAULT_CULTURAL_BACKGROUND: &str = "Traditional Indian craftsmanship";

pub const DEFAULT_TRANSLATION_TEXT: &str = "Beautiful handwoven silk saree with traditional motifs. This exquisite piece represents generations of skilled craftsmanship.";
pub const DEFAULT_TRANSLATION_LANGUAGES: &[&str] = &["Hindi", "Tamil", "Bengali", "Gujarati"];

/// Guidance per social platform. Unknown platforms get a generic brief.
pub fn platform_guidance(platform: &str) -> &'static str {
    match platform.trim().to_lowercase().as_str() {
        "instagram" => "Instagram post with an engaging caption, emojis and hashtags. End with a call-to-action.",
        "facebook" => "Facebook post that tells a story, with a longer description that invites community engagement.",
        "twitter" => "Twitter thread of several short, punchy tweets.",
        _ => "General social media post",
    }
}

fn hashtag_budget(platform: &str) -> &'static str {
    if platform.trim().eq_ignore_ascii_case("instagram") {
        "10-15"
    } else {
        "5-8"
    }
}

pub fn quick_product_analysis(context: Option<&str>) -> String {
    format!(
        r#"Look at this handcrafted product and prepare a marketplace listing:
1. A compelling product title (at most 60 characters)
2. A detailed description of two to three paragraphs
3. A suggested price range in INR
4. The product category
5. Key features and selling points

Context from the artisan: {context}

Reply as JSON:
{{
    "title": "suggested title",
    "description": "detailed description",
    "price_range": "1000-2000 INR",
    "category": "category name",
    "features": ["feature 1", "feature 2"],
    "cultural_significance": "brief cultural context"
}}"#,
        context = context.unwrap_or(DEFAULT_PRODUCT_CONTEXT)
    )
}

pub fn detailed_product_analysis(context: Option<&str>) -> String {
    format!(
        r#"You are an expert in traditional Indian crafts and in running an artisan marketplace. Study the attached photo of a handcrafted item and prepare a complete listing.

Context from the artisan: {context}

Reply with a single JSON object:
{{
    "title": "compelling product title (max 60 characters)",
    "description": "two to three paragraphs on craftsmanship, materials and cultural significance",
    "suggested_price": "single price in INR, number only",
    "price_range": "range such as '1500-2500 INR'",
    "category": "Textiles, Jewelry, Home Decor, ...",
    "materials": ["materials used"],
    "techniques": ["traditional techniques involved"],
    "cultural_context": "cultural and regional significance",
    "target_audience": "who would value this piece",
    "care_instructions": "how to look after it",
    "key_features": ["unique selling points"],
    "occasions": ["occasions for use or gifting"],
    "color_palette": ["dominant colours"],
    "estimated_time_to_make": "time needed to craft it"
}}

Keep it authentic, culturally respectful and ready to publish."#,
        context = context.unwrap_or(DEFAULT_PRODUCT_CONTEXT)
    )
}

pub fn quick_story(artisan_name: &str, craft_type: &str, simple_text: &str, background: Option<&str>) -> String {
    format!(
        r#"Write an engaging story about an artisan from these notes.

Artisan: {artisan_name}
Craft: {craft_type}
In their words: {simple_text}
Cultural background: {background}

Include a title and three to four paragraphs covering their heritage, the traditional techniques they use, why the craft matters culturally, their personal passion, and their ties to community and tradition. Keep it authentic, respectful and moving.

Reply as JSON:
{{
    "title": "story title",
    "story": "full story content",
    "cultural_highlights": ["highlight 1", "highlight 2"],
    "traditional_techniques": ["technique 1", "technique 2"]
}}"#,
        background = background.unwrap_or(DEFAULT_CULTURAL_BACKGROUND)
    )
}

pub fn illustrated_story(
    artisan_name: &str,
    craft_type: &str,
    simple_text: &str,
    background: Option<&str>,
    has_image: bool,
) -> String {
    let image_note = if has_image {
        "\nA photo of the craft or the artisan at work is attached; draw on what it shows.\n"
    } else {
        ""
    };

    format!(
        r#"You are a storyteller who preserves and shares cultural heritage. Write an artisan story from these notes.

Artisan: {artisan_name}
Craft: {craft_type}
In their words: {simple_text}
Cultural background: {background}
{image_note}
The story needs a title that reflects the artisan's journey and four to five paragraphs on:
- how they came to the craft and who taught them
- the traditional techniques and materials in detail
- the cultural and historical significance of the craft
- what they have overcome to keep the tradition alive
- how they hope to pass it on

Reply with a single JSON object:
{{
    "title": "story title",
    "story": "the full narrative",
    "short_summary": "two-sentence summary for previews",
    "cultural_highlights": ["aspect 1", "aspect 2", "aspect 3"],
    "traditional_techniques": ["technique 1", "technique 2", "technique 3"],
    "heritage_significance": "why this craft matters for cultural preservation",
    "artisan_quote": "a meaningful quote the artisan might say",
    "story_tags": ["tag1", "tag2", "tag3"],
    "estimated_read_time": "X minutes"
}}"#,
        background = background.unwrap_or(DEFAULT_CULTURAL_BACKGROUND)
    )
}

pub fn social_content(product: &Product, platform: &str) -> String {
    format!(
        r##"Create {platform} content for this product.

Product: {title}
Description: {description}
Category: {category}

Platform: {platform}
Brief: {guidance}

Provide the main post, {hashtags} relevant hashtags, a call-to-action and story highlights. Focus on cultural heritage, traditional craftsmanship and supporting local artisans.

Reply as JSON:
{{
    "main_content": "post content",
    "hashtags": ["#tag1", "#tag2"],
    "call_to_action": "CTA text",
    "story_highlights": ["highlight 1", "highlight 2"],
    "best_posting_time": "suggested time"
}}"##,
        title = product.title,
        description = product.description,
        category = product.category,
        guidance = platform_guidance(platform),
        hashtags = hashtag_budget(platform),
    )
}

pub fn translation(text: &str, languages: &[String]) -> String {
    format!(
        r#"Translate this product description into {languages}:

"{text}"

Keep the translations culturally authentic and appealing to local buyers.

Reply as a JSON object keyed by ISO 639-1 language code."#,
        languages = languages.join(", "),
    )
}

pub fn recommendations(user: &User, products: &[Product]) -> String {
    let catalogue = if products.is_empty() {
        "No products are listed yet; suggest the kinds of items to look for.".to_string()
    } else {
        products
            .iter()
            .map(|p| format!("- [{}] {} ({}, {:.0} INR)", p.id, p.title, p.category, p.price))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Recommend products to a user ({user_type}) interested in traditional Indian crafts.

Available products ({count}):
{catalogue}

Recommend up to 5 items, weighing cultural interest, seasonal relevance, gifting occasions and price range.

Reply as JSON:
{{
    "recommendations": [
        {{
            "product_id": "id from the list, if any",
            "reason": "why recommended",
            "occasion": "suitable for",
            "cultural_appeal": "cultural significance"
        }}
    ]
}}"#,
        user_type = user.user_type,
        count = products.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use artisan_core::{ProductInput, UserType};
    use chrono::Utc;

    fn scarf() -> Product {
        Product::new(
            "artisan-1",
            ProductInput {
                title: "Handwoven Silk Scarf".to_string(),
                description: "Traditional patterns".to_string(),
                price: 2500.0,
                category: "Textiles".to_string(),
                images: vec![],
                story: None,
                cultural_context: None,
            },
        )
    }

    #[test]
    fn test_platform_guidance() {
        assert!(platform_guidance("Instagram").contains("hashtags"));
        assert!(platform_guidance("twitter").contains("thread"));
        assert_eq!(platform_guidance("pinterest"), "General social media post");
    }

    #[test]
    fn test_quick_analysis_default_context() {
        let prompt = quick_product_analysis(None);
        assert!(prompt.contains(DEFAULT_PRODUCT_CONTEXT));
        assert!(prompt.contains("\"price_range\""));
    }

    #[test]
    fn test_social_prompt_mentions_product() {
        let prompt = social_content(&scarf(), "instagram");
        assert!(prompt.contains("Handwoven Silk Scarf"));
        assert!(prompt.contains("10-15"));
        assert!(prompt.contains(r##""hashtags": ["#tag1", "#tag2"]"##));
        assert!(prompt.trim_end().ends_with("}"));

        let prompt = social_content(&scarf(), "facebook");
        assert!(prompt.contains("5-8"));
    }

    #[test]
    fn test_illustrated_story_image_note() {
        let with = illustrated_story("Meera", "Weaving", "20 years", None, true);
        let without = illustrated_story("Meera", "Weaving", "20 years", None, false);
        assert!(with.contains("photo"));
        assert!(!without.contains("photo"));
        assert!(without.contains(DEFAULT_CULTURAL_BACKGROUND));
    }

    #[test]
    fn test_recommendations_list_products() {
        let user = User {
            id: "u1".to_string(),
            email: "buyer@example.com".to_string(),
            name: "Buyer".to_string(),
            user_type: UserType::Buyer,
            bio: None,
            location: None,
            craft_type: None,
            created_at: Utc::now(),
        };
        let product = scarf();
        let prompt = recommendations(&user, std::slice::from_ref(&product));
        assert!(prompt.contains("user (buyer)"));
        assert!(prompt.contains(&product.id));

        let empty = recommendations(&user, &[]);
        assert!(empty.contains("No products are listed yet"));
    }

    #[test]
    fn test_translation_prompt() {
        let languages = vec!["Hindi".to_string(), "Tamil".to_string()];
        let prompt = translation("Clay lamp", &languages);
        assert!(prompt.contains("Hindi, Tamil"));
        assert!(prompt.contains("\"Clay lamp\""));
    }
}
