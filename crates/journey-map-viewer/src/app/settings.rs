use clap::Parser;
use journey_map_lib::Coordinate;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Journey Map - interactive map view for travel journaling
pub struct Settings {
    /// Initial map center latitude
    #[clap(long, default_value = "48.8566", allow_negative_numbers = true)]
    pub lat: f64,

    /// Initial map center longitude
    #[clap(long, default_value = "2.3522", allow_negative_numbers = true)]
    pub lon: f64,

    /// Known user position latitude (enables the origin of routes and the
    /// center-on-you lock)
    #[clap(long, allow_negative_numbers = true)]
    pub user_lat: Option<f64>,

    /// Known user position longitude
    #[clap(long, allow_negative_numbers = true)]
    pub user_lon: Option<f64>,

    /// Start with the dark tile theme
    #[clap(long, default_value = "false")]
    pub dark: bool,

    /// Base URL of the geocoding service (GeoDB-style places API)
    #[clap(
        long,
        default_value = "https://geodb-free-service.wirefreethought.com/v1/geo"
    )]
    pub geocoding_url: String,

    /// Base URL of the routing engine (OSRM-style route API)
    #[clap(long, default_value = "https://router.project-osrm.org")]
    pub routing_url: String,

    /// Ignore previously persisted view settings and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

impl Settings {
    pub fn from_cli() -> Self {
        Settings::parse()
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// The user position, when both components were given.
    pub fn user_location(&self) -> Option<Coordinate> {
        match (self.user_lat, self.user_lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_location_requires_both_components() {
        let mut settings = Settings::parse_from(["journey-map-viewer"]);
        assert!(settings.user_location().is_none());

        settings.user_lat = Some(48.8);
        assert!(settings.user_location().is_none());

        settings.user_lon = Some(2.3);
        assert_eq!(
            settings.user_location(),
            Some(Coordinate::new(48.8, 2.3))
        );
    }

    #[test]
    fn test_defaults_center_on_paris() {
        let settings = Settings::parse_from(["journey-map-viewer"]);
        assert_eq!(settings.center(), Coordinate::new(48.8566, 2.3522));
        assert!(!settings.dark);
    }
}
