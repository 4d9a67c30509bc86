//! Base-layer styles and tile source resolution
//!
//! Resolution is a pure lookup over (style, dark mode); switching styles
//! never touches unrelated view state, which the orchestrator guarantees by
//! making the style its own field.

/// Available base-layer styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerStyle {
    Standard,
    Satellite,
    Terrain,
    Transport,
}

/// A concrete tile source: URL template (`{z}/{x}/{y}` placeholders) plus
/// the attribution the map must display for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedLayer {
    pub tile_url: &'static str,
    pub attribution: &'static str,
    pub attribution_url: &'static str,
}

impl LayerStyle {
    pub fn all() -> &'static [Self] {
        &[
            Self::Standard,
            Self::Satellite,
            Self::Terrain,
            Self::Transport,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Satellite => "Satellite",
            Self::Terrain => "Terrain",
            Self::Transport => "Transport",
        }
    }

    /// Resolve this style to a tile source for the given theme.
    pub fn resolve(&self, dark_mode: bool) -> ResolvedLayer {
        match (self, dark_mode) {
            (Self::Standard, false) => ResolvedLayer {
                tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors",
                attribution_url: "https://www.openstreetmap.org/copyright",
            },
            (Self::Standard, true) => ResolvedLayer {
                tile_url: "https://basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors © CARTO",
                attribution_url: "https://carto.com/attributions",
            },
            // No dark variant exists for imagery; both themes share it
            (Self::Satellite, _) => ResolvedLayer {
                tile_url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "© Esri, Maxar, Earthstar Geographics",
                attribution_url: "https://www.esri.com/",
            },
            (Self::Terrain, false) => ResolvedLayer {
                tile_url: "https://tile.opentopomap.org/{z}/{x}/{y}.png",
                attribution: "© OpenTopoMap (CC-BY-SA)",
                attribution_url: "https://opentopomap.org/",
            },
            (Self::Terrain, true) => ResolvedLayer {
                tile_url: "https://tiles.stadiamaps.com/tiles/alidade_smooth_dark/{z}/{x}/{y}.png",
                attribution: "© Stadia Maps © OpenMapTiles © OpenStreetMap",
                attribution_url: "https://stadiamaps.com/",
            },
            (Self::Transport, false) => ResolvedLayer {
                tile_url: "https://tile.thunderforest.com/transport/{z}/{x}/{y}.png",
                attribution: "© Thunderforest © OpenStreetMap contributors",
                attribution_url: "https://www.thunderforest.com/",
            },
            (Self::Transport, true) => ResolvedLayer {
                tile_url: "https://tile.thunderforest.com/transport-dark/{z}/{x}/{y}.png",
                attribution: "© Thunderforest © OpenStreetMap contributors",
                attribution_url: "https://www.thunderforest.com/",
            },
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::Standard
    }
}
