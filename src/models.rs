// Listing data contract as returned by the listing search service.
// The controller only reads ids, build year/make/model, price and miles;
// everything else is carried through untouched for presentation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// The listing service writes absent lists and strings as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// One search result: the listing itself plus its build and valuation data.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Listing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub listing: ListingDetails,
    pub build: Build, // Required: year filtering and sorting depend on it
    #[serde(default, deserialize_with = "null_as_default")]
    pub valuation: Valuation,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub price_history: Vec<Value>, // Opaque, passed through
    // Any other top-level keys the service adds
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Listing {
    /// Stable unique key for this listing: `id`, or `vin` when `id` is empty.
    pub fn key(&self) -> &str {
        if self.listing.id.is_empty() {
            &self.listing.vin
        } else {
            &self.listing.id
        }
    }

    pub fn year(&self) -> i32 {
        self.build.year
    }

    pub fn price(&self) -> u64 {
        self.listing.price
    }

    pub fn miles(&self) -> u64 {
        self.listing.miles
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ListingDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub vin: String,
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub miles: u64,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    #[serde(rename = "carfax_1_owner", deserialize_with = "null_as_default")]
    pub carfax_one_owner: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub carfax_clean_title: bool,
    pub msrp: Option<u64>,
    pub price_change_percent: Option<f64>,
    pub vdp_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub media: Media,
    #[serde(deserialize_with = "null_as_default")]
    pub dealer: Dealer,
    #[serde(deserialize_with = "null_as_default")]
    pub extra: Extra,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Media {
    #[serde(deserialize_with = "null_as_default")]
    pub photo_links: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub photo_links_cached: Vec<String>,
}

impl Media {
    // First usable photo, preferring the live links over the cached copies
    pub fn primary_photo(&self) -> Option<&str> {
        self.photo_links
            .first()
            .or_else(|| self.photo_links_cached.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Dealer {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Dealer {
    // "City, ST" when both parts are known
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(city), Some(state)) if !city.is_empty() && !state.is_empty() => {
                Some(format!("{}, {}", city, state))
            }
            (Some(city), _) if !city.is_empty() => Some(city.to_string()),
            (_, Some(state)) if !state.is_empty() => Some(state.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Extra {
    #[serde(deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub high_value_features: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub options_packages: Vec<String>,
    pub seller_comments: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Build {
    pub year: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub make: String,
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub body_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub drivetrain: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub doors: Option<u32>,
    #[serde(default)]
    pub city_mpg: Option<u32>,
    #[serde(default)]
    pub highway_mpg: Option<u32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

// Opaque valuation data; only displayed, never used for logic
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Valuation {
    #[serde(deserialize_with = "null_as_default")]
    pub is_good_value: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub score: f64,
}

// Search service response body
#[derive(Debug, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub listings: Vec<Listing>,
}

// Model lookup service response body
#[derive(Debug, Deserialize, Default)]
pub struct ModelsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    // Minimal listing with the fields the controller reads
    pub fn listing(id: &str, year: i32, price: u64, miles: u64) -> Listing {
        Listing {
            listing: ListingDetails {
                id: id.to_string(),
                vin: format!("VIN{}", id),
                heading: format!("{} Ford F-150", year),
                price,
                miles,
                ..Default::default()
            },
            build: Build {
                year,
                make: "Ford".to_string(),
                model: "F-150".to_string(),
                trim: None,
                body_type: None,
                transmission: None,
                drivetrain: None,
                fuel_type: None,
                doors: None,
                city_mpg: None,
                highway_mpg: None,
                other: Map::new(),
            },
            valuation: Valuation::default(),
            price_history: Vec::new(),
            other: Map::new(),
        }
    }
}
