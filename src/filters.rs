// Filter input: raw form values, the validated FilterSet handed to the
// controller, the outgoing search query, and the make -> model dependency.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FilterError;

pub const DEFAULT_RADIUS: u32 = 50;
pub const MIN_RADIUS: u32 = 1;
pub const MAX_RADIUS: u32 = 500;
pub const EARLIEST_YEAR: i32 = 1990;

// Latest model year the form accepts: next year's models are already on lots
pub fn latest_model_year() -> i32 {
    chrono::Local::now().year() + 1
}

// Inclusive year bounds applied client-side after the search returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }
}

// Validated search criteria. Only `zip` and the year ordering are checked
// again by the controller; the other bounds belong to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    pub zip: String,
    pub radius: u32,
    pub year_min: i32,
    pub year_max: i32,
}

impl FilterSet {
    // Guard for entering `searching`
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.zip.trim().is_empty() {
            return Err(FilterError::MissingZip);
        }
        if self.year_min > self.year_max {
            return Err(FilterError::InvertedYearRange {
                min: self.year_min,
                max: self.year_max,
            });
        }
        Ok(())
    }

    pub fn years(&self) -> YearRange {
        YearRange {
            min: self.year_min,
            max: self.year_max,
        }
    }

    /// Builds the query sent to the search service. Year bounds are
    /// deliberately left out: the service cannot filter on them, so they are
    /// applied to the response instead.
    pub fn to_query(&self, rows: u32) -> SearchQuery {
        SearchQuery {
            make: non_empty(&self.make),
            model: non_empty(&self.model),
            zip: self.zip.trim().to_string(),
            radius: self.radius,
            rows,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// Query parameters of a search service call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub zip: String,
    pub radius: u32,
    pub rows: u32,
}

// Raw form values as submitted from the page or the JSON API.
// Numeric fields accept empty strings as "not given".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterForm {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub radius: Option<NumberField>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year_min: Option<NumberField>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year_max: Option<NumberField>,
}

// A number from JSON, or the text of a form field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(i64),
    Text(String),
}

impl NumberField {
    fn parse<T: TryFrom<i64>>(&self, field: &'static str) -> Result<T, FilterError> {
        let invalid = || FilterError::InvalidNumber {
            field,
            value: match self {
                NumberField::Number(n) => n.to_string(),
                NumberField::Text(s) => s.clone(),
            },
        };
        let n = match self {
            NumberField::Number(n) => *n,
            NumberField::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        };
        T::try_from(n).map_err(|_| invalid())
    }
}

impl fmt::Display for NumberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberField::Number(n) => write!(f, "{}", n),
            NumberField::Text(s) => f.write_str(s.trim()),
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NumberField>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberField>::deserialize(deserializer)?;
    Ok(value.filter(|v| !matches!(v, NumberField::Text(s) if s.trim().is_empty())))
}

impl FilterForm {
    /// Validates the form against the reference UI bounds, filling in the
    /// defaults for anything left blank.
    pub fn submit(&self) -> Result<FilterSet, FilterError> {
        self.submit_with_latest_year(latest_model_year())
    }

    pub fn submit_with_latest_year(&self, latest_year: i32) -> Result<FilterSet, FilterError> {
        let make = self.make.trim().to_string();
        let model = self.model.trim().to_string();
        let zip = self.zip.trim().to_string();

        if zip.is_empty() {
            return Err(FilterError::MissingZip);
        }
        if make.is_empty() && !model.is_empty() {
            return Err(FilterError::ModelWithoutMake);
        }

        let radius = match &self.radius {
            Some(field) => field.parse::<u32>("radius")?,
            None => DEFAULT_RADIUS,
        };
        if !(MIN_RADIUS..=MAX_RADIUS).contains(&radius) {
            return Err(FilterError::RadiusOutOfRange {
                radius,
                min: MIN_RADIUS,
                max: MAX_RADIUS,
            });
        }

        let year_min = match &self.year_min {
            Some(field) => field.parse::<i32>("yearMin")?,
            None => EARLIEST_YEAR,
        };
        let year_max = match &self.year_max {
            Some(field) => field.parse::<i32>("yearMax")?,
            None => latest_year,
        };
        if year_min < EARLIEST_YEAR {
            return Err(FilterError::YearTooEarly {
                year: year_min,
                earliest: EARLIEST_YEAR,
            });
        }
        if year_max > latest_year {
            return Err(FilterError::YearTooLate {
                year: year_max,
                latest: latest_year,
            });
        }

        let filters = FilterSet {
            make,
            model,
            zip,
            radius,
            year_min,
            year_max,
        };
        filters.validate()?;
        Ok(filters)
    }
}

// A model list fetch issued for one make choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub generation: u64,
    pub make: String,
}

/// The chosen make, the model list that depends on it, and the chosen model.
///
/// Choosing a make clears the chosen model and invalidates any model list
/// fetch still in flight; only the fetch for the latest choice may land.
#[derive(Debug, Clone, Default)]
pub struct ModelChoices {
    make: String,
    model: String,
    models: Vec<String>,
    generation: u64,
    pending: bool,
}

impl ModelChoices {
    pub fn select_make(&mut self, make: &str) -> Option<ModelRequest> {
        self.make = make.trim().to_string();
        self.model.clear();
        self.models.clear();
        self.generation += 1;
        self.pending = !self.make.is_empty();

        self.pending.then(|| ModelRequest {
            generation: self.generation,
            make: self.make.clone(),
        })
    }

    pub fn select_model(&mut self, model: &str) -> Result<(), FilterError> {
        let model = model.trim();
        if self.make.is_empty() && !model.is_empty() {
            return Err(FilterError::ModelWithoutMake);
        }
        self.model = model.to_string();
        Ok(())
    }

    // Returns false when the fetch was superseded by a newer make choice
    pub fn accept_models(&mut self, generation: u64, models: Vec<String>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.models = models;
        self.pending = false;
        true
    }

    pub fn reject_models(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.models.clear();
        self.pending = false;
        true
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }
}
