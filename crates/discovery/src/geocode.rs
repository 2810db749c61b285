//! Human-readable labels for a chosen location.

use crate::ports::ReverseGeocoder;
use serde::Serialize;
use tracing::{debug, warn};
use workkar_geo::Coordinate;

/// How the viewer produced the point being labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationOrigin {
    /// "Use my current location"
    Current,
    /// Picked on a map
    Picked,
}

impl LocationOrigin {
    fn fallback_prefix(self) -> &'static str {
        match self {
            Self::Current => "Current Location",
            Self::Picked => "Selected Location",
        }
    }
}

/// Display text for a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationLabel {
    pub point: Coordinate,
    /// Address line, or a coordinate fallback
    pub address: String,
    pub city: Option<String>,
    /// True when the address came from the geocoder
    pub geocoded: bool,
}

/// Reverse-geocode `point`, falling back to a coordinate label on any failure.
pub async fn describe_location(
    geocoder: Option<&dyn ReverseGeocoder>,
    point: Coordinate,
    origin: LocationOrigin,
) -> LocationLabel {
    if let Some(geocoder) = geocoder {
        match geocoder.reverse(point).await {
            Ok(place) if !place.display_name.trim().is_empty() => {
                debug!(%point, address = %place.display_name, "Reverse geocoded location");
                return LocationLabel {
                    point,
                    address: place.display_name,
                    city: place.city,
                    geocoded: true,
                };
            }
            Ok(_) => warn!(%point, "Reverse geocoding returned no address"),
            Err(err) => warn!(%point, error = %err, "Reverse geocoding failed"),
        }
    }

    LocationLabel {
        point,
        address: fallback_label(point, origin),
        city: None,
        geocoded: false,
    }
}

/// `"Current Location (17.3850, 78.4867)"` and friends.
pub fn fallback_label(point: Coordinate, origin: LocationOrigin) -> String {
    format!("{} ({point})", origin.fallback_prefix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DiscoveryError, Result};
    use crate::ports::Place;
    use async_trait::async_trait;

    const POINT: Coordinate = Coordinate::new(17.385_04, 78.486_71);

    struct Answer(Result<Place>);

    #[async_trait]
    impl ReverseGeocoder for Answer {
        async fn reverse(&self, _point: Coordinate) -> Result<Place> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_geocoded_label() {
        let geocoder = Answer(Ok(Place {
            display_name: "Abids, Hyderabad, Telangana, India".into(),
            city: Some("Hyderabad".into()),
        }));

        let label = describe_location(Some(&geocoder), POINT, LocationOrigin::Current).await;

        assert!(label.geocoded);
        assert_eq!(label.city.as_deref(), Some("Hyderabad"));
        assert_eq!(label.address, "Abids, Hyderabad, Telangana, India");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_coordinates() {
        let geocoder = Answer(Err(DiscoveryError::Geocode("HTTP 503".into())));

        let label = describe_location(Some(&geocoder), POINT, LocationOrigin::Picked).await;

        assert!(!label.geocoded);
        assert_eq!(label.address, "Selected Location (17.3850, 78.4867)");
    }

    #[tokio::test]
    async fn test_blank_address_falls_back() {
        let geocoder = Answer(Ok(Place {
            display_name: "  ".into(),
            city: None,
        }));
        let label = describe_location(Some(&geocoder), POINT, LocationOrigin::Current).await;
        assert_eq!(label.address, "Current Location (17.3850, 78.4867)");
    }

    #[tokio::test]
    async fn test_no_geocoder_configured() {
        let label = describe_location(None, POINT, LocationOrigin::Current).await;
        assert!(!label.geocoded);
        assert!(label.address.starts_with("Current Location ("));
    }
}
