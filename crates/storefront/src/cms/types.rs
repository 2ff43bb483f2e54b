//! Records mirrored from the CMS.
//!
//! Field names follow the CMS's camelCase JSON. Optional relations may come
//! back as `null` or be missing entirely depending on `populate`; both read
//! as the field's default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tienda_core::{CartProduct, CategoryId, MediaId, Price, ProductId, RecordId};
use url::Url;

/// Image shown when a record has no media.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

/// Resolve a media path against the CMS base URL.
///
/// Missing paths resolve to [`PLACEHOLDER_IMAGE`], absolute URLs are
/// returned unchanged, and anything else is appended to the base URL.
#[must_use]
pub fn media_url(base_url: &Url, url: Option<&str>) -> String {
    match url {
        None | Some("") => PLACEHOLDER_IMAGE.to_string(),
        Some(url) if url.starts_with("http") => url.to_string(),
        Some(path) => format!("{}{path}", base_url.as_str().trim_end_matches('/')),
    }
}

/// An uploaded media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: MediaId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub alternative_text: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub document_id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub price: Price,
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: Vec<Media>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The first image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Media> {
        self.image.first()
    }

    /// Whether stock is tracked and exhausted.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.stock.is_some_and(|stock| stock <= 0)
    }

    /// The cart-facing view of this product, with its first image resolved
    /// against the CMS base URL.
    #[must_use]
    pub fn to_cart_product(&self, base_url: &Url) -> CartProduct {
        CartProduct {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: media_url(base_url, self.primary_image().map(|m| m.url.as_str())),
            slug: self.slug.clone(),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Social network profile links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

/// Store-wide settings edited in the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub id: RecordId,
    pub store_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub logo: Option<Media>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    /// Order phone number; takes precedence over `WHATSAPP_NUMBER`.
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub social_media: Option<SocialMedia>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Home page hero banner content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSection {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Media>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
