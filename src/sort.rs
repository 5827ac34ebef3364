// Sort projection over the current filtered results.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    #[serde(rename = "none")]
    ServerOrder,
    MilesAsc,
    MilesDesc,
    PriceAsc,
    PriceDesc,
    YearAsc,
    YearDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::ServerOrder,
        SortKey::MilesAsc,
        SortKey::MilesDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::YearAsc,
        SortKey::YearDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::ServerOrder => "none",
            SortKey::MilesAsc => "miles-asc",
            SortKey::MilesDesc => "miles-desc",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::YearAsc => "year-asc",
            SortKey::YearDesc => "year-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::ServerOrder => "Sort By",
            SortKey::MilesAsc => "Miles (Low → High)",
            SortKey::MilesDesc => "Miles (High → Low)",
            SortKey::PriceAsc => "Price (Low → High)",
            SortKey::PriceDesc => "Price (High → Low)",
            SortKey::YearAsc => "Year (Oldest → Newest)",
            SortKey::YearDesc => "Year (Newest → Oldest)",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0:?}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

/// Orders `results` by `key` without touching the slice. Ties keep their
/// incoming order (`sort_by` is stable).
pub fn sort_listings<'a, I>(results: I, key: SortKey) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    let mut sorted: Vec<&Listing> = results.into_iter().collect();
    match key {
        SortKey::ServerOrder => {}
        SortKey::MilesAsc => sorted.sort_by(|a, b| a.miles().cmp(&b.miles())),
        SortKey::MilesDesc => sorted.sort_by(|a, b| b.miles().cmp(&a.miles())),
        SortKey::PriceAsc => sorted.sort_by(|a, b| a.price().cmp(&b.price())),
        SortKey::PriceDesc => sorted.sort_by(|a, b| b.price().cmp(&a.price())),
        SortKey::YearAsc => sorted.sort_by(|a, b| a.year().cmp(&b.year())),
        SortKey::YearDesc => sorted.sort_by(|a, b| b.year().cmp(&a.year())),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::listing;

    fn keys(sorted: &[&Listing]) -> Vec<String> {
        sorted.iter().map(|l| l.key().to_string()).collect()
    }

    #[test]
    fn price_ascending() {
        let results = vec![
            listing("a", 2020, 20_000, 10),
            listing("b", 2020, 15_000, 10),
            listing("c", 2020, 30_000, 10),
        ];
        let sorted = sort_listings(&results, SortKey::PriceAsc);
        let prices: Vec<u64> = sorted.iter().map(|l| l.price()).collect();
        assert_eq!(prices, vec![15_000, 20_000, 30_000]);
    }

    #[test]
    fn descending_keys() {
        let results = vec![
            listing("a", 2018, 20_000, 30_000),
            listing("b", 2022, 25_000, 5_000),
            listing("c", 2020, 15_000, 60_000),
        ];
        assert_eq!(keys(&sort_listings(&results, SortKey::MilesDesc)), ["c", "a", "b"]);
        assert_eq!(keys(&sort_listings(&results, SortKey::PriceDesc)), ["b", "a", "c"]);
        assert_eq!(keys(&sort_listings(&results, SortKey::YearDesc)), ["b", "c", "a"]);
        assert_eq!(keys(&sort_listings(&results, SortKey::YearAsc)), ["a", "c", "b"]);
        assert_eq!(keys(&sort_listings(&results, SortKey::MilesAsc)), ["b", "a", "c"]);
    }

    #[test]
    fn ties_keep_incoming_order() {
        let results = vec![
            listing("first", 2020, 18_000, 1),
            listing("second", 2021, 18_000, 2),
            listing("cheap", 2019, 9_000, 3),
            listing("third", 2022, 18_000, 4),
        ];
        assert_eq!(
            keys(&sort_listings(&results, SortKey::PriceAsc)),
            ["cheap", "first", "second", "third"]
        );
        assert_eq!(
            keys(&sort_listings(&results, SortKey::PriceDesc)),
            ["first", "second", "third", "cheap"]
        );
    }

    #[test]
    fn none_is_identity_and_input_is_untouched() {
        let results = vec![
            listing("z", 2024, 50_000, 1),
            listing("y", 2015, 5_000, 90_000),
        ];
        let before = results.clone();
        assert_eq!(keys(&sort_listings(&results, SortKey::ServerOrder)), ["z", "y"]);
        let _ = sort_listings(&results, SortKey::PriceAsc);
        assert_eq!(results, before);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let results = vec![
            listing("a", 2020, 3, 9),
            listing("b", 2020, 1, 9),
            listing("c", 2020, 2, 9),
        ];
        let once = sort_listings(&results, SortKey::PriceAsc);
        let twice = sort_listings(once.iter().copied(), SortKey::PriceAsc);
        assert_eq!(keys(&once), keys(&twice));
    }

    #[test]
    fn keys_round_trip_through_their_names() {
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>(), Ok(key));
            assert_eq!(serde_json::to_value(key).unwrap(), serde_json::json!(key.as_str()));
        }
        assert!("cheapest".parse::<SortKey>().is_err());
    }
}
