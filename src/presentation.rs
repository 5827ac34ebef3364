// Display-ready projections of listings for the HTML page: cards for the
// result grid and the detail panel. Absent data is left out, never shown as
// an error.

use crate::models::Listing;

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub key: String,
    pub heading: String,
    pub subtitle: String,
    pub price: String,
    pub miles: String,
    pub location: Option<String>,
    pub photo: Option<String>,
    pub good_value: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub heading: String,
    pub price: String,
    pub photos: Vec<String>,
    pub specs: Vec<Spec>,
    pub history: Vec<String>, // Carfax badges
    pub high_value_features: Vec<String>,
    pub features: Vec<String>,
    pub options: Vec<String>,
    pub options_packages: Vec<String>,
    pub seller_comments: Option<String>,
    pub dealer: Vec<Spec>,
    pub vdp_url: Option<String>,
    pub good_value: bool,
}

fn heading(listing: &Listing) -> String {
    if listing.listing.heading.trim().is_empty() {
        format!("{} {} {}", listing.build.year, listing.build.make, listing.build.model)
    } else {
        listing.listing.heading.clone()
    }
}

pub fn card(listing: &Listing) -> Card {
    let build = &listing.build;
    let subtitle = match build.trim.as_deref().filter(|t| !t.is_empty()) {
        Some(trim) => format!("{} {} {} {}", build.year, build.make, build.model, trim),
        None => format!("{} {} {}", build.year, build.make, build.model),
    };

    Card {
        key: listing.key().to_string(),
        heading: heading(listing),
        subtitle,
        price: format_price(listing.price()),
        miles: format_miles(listing.miles()),
        location: listing.listing.dealer.location(),
        photo: listing.listing.media.primary_photo().map(str::to_string),
        good_value: listing.valuation.is_good_value,
    }
}

pub fn detail(listing: &Listing) -> Detail {
    let car = &listing.listing;
    let build = &listing.build;

    let mut specs = Vec::new();
    let mut push = |label: &'static str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            specs.push(Spec { label, value });
        }
    };
    push("Mileage", Some(format_miles(car.miles)));
    push("MSRP", car.msrp.filter(|m| *m > 0).map(format_price));
    push(
        "Price change",
        car.price_change_percent
            .filter(|p| *p != 0.0)
            .map(|p| format!("{:+.1}%", p)),
    );
    push("Trim", build.trim.clone());
    push("Body", build.body_type.clone());
    push("Transmission", build.transmission.clone());
    push("Drivetrain", build.drivetrain.clone());
    push("Fuel", build.fuel_type.clone());
    push("Doors", build.doors.filter(|d| *d > 0).map(|d| d.to_string()));
    push(
        "MPG",
        match (build.city_mpg, build.highway_mpg) {
            (Some(city), Some(hwy)) if city > 0 && hwy > 0 => Some(format!("{} city / {} hwy", city, hwy)),
            _ => None,
        },
    );
    push("Exterior", car.exterior_color.clone());
    push("Interior", car.interior_color.clone());
    push("VIN", Some(car.vin.clone()));

    let mut history = Vec::new();
    if car.carfax_one_owner {
        history.push("1-Owner".to_string());
    }
    if car.carfax_clean_title {
        history.push("Clean Title".to_string());
    }

    let mut dealer = Vec::new();
    let mut push_dealer = |label: &'static str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            dealer.push(Spec { label, value });
        }
    };
    push_dealer("Dealer", car.dealer.name.clone());
    push_dealer("Location", car.dealer.location());
    push_dealer("Phone", car.dealer.phone.clone());
    push_dealer("Website", car.dealer.website.clone());

    let photos = if car.media.photo_links.is_empty() {
        car.media.photo_links_cached.clone()
    } else {
        car.media.photo_links.clone()
    };

    Detail {
        heading: heading(listing),
        price: format_price(listing.price()),
        photos,
        specs,
        history,
        high_value_features: car.extra.high_value_features.clone(),
        features: car.extra.features.clone(),
        options: car.extra.options.clone(),
        options_packages: car.extra.options_packages.clone(),
        seller_comments: car.extra.seller_comments.clone().filter(|c| !c.trim().is_empty()),
        dealer,
        vdp_url: car.vdp_url.clone().filter(|u| !u.is_empty()),
        good_value: listing.valuation.is_good_value,
    }
}

// 21000 -> "$21,000"
pub fn format_price(amount: u64) -> String {
    format!("${}", group_thousands(amount))
}

// 45000 -> "45,000 mi"
pub fn format_miles(miles: u64) -> String {
    format!("{} mi", group_thousands(miles))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
