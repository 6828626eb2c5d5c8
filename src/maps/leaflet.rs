//! Standalone Leaflet pages.
//!
//! Layers are serialized to JSON and embedded in a small HTML document that
//! loads Leaflet and leaflet.heat from a CDN.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Failed to serialize map layers: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write map file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub area_name: String,
    pub lat: f64,
    pub lon: f64,
    pub color: String,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapLayer {
    Heat {
        points: Vec<HeatPoint>,
        radius: u32,
        blur: u32,
    },
    Markers {
        markers: Vec<Marker>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafletMap {
    pub center: [f64; 2],
    pub zoom: u8,
    pub layers: Vec<MapLayer>,
}

impl LeafletMap {
    pub fn new(lat: f64, lon: f64, zoom: u8) -> Self {
        Self {
            center: [lat, lon],
            zoom,
            layers: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: MapLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// All heat points and markers as `[lat, lon]` pairs.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.layers
            .iter()
            .flat_map(|layer| match layer {
                MapLayer::Heat { points, .. } => {
                    points.iter().map(|p| [p.lat, p.lon]).collect::<Vec<_>>()
                }
                MapLayer::Markers { markers } => markers.iter().map(|m| [m.lat, m.lon]).collect(),
            })
            .collect()
    }

    pub fn to_html(&self, title: &str) -> Result<String, MapError> {
        // "</" would end the script element early.
        let data = serde_json::to_string(self)?.replace("</", "<\\/");
        let title = escape_html(title);

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const data = {data};
const map = L.map("map").setView(data.center, data.zoom);
L.tileLayer("{TILE_URL}", {{ attribution: "{TILE_ATTRIBUTION}" }}).addTo(map);
for (const layer of data.layers) {{
  if (layer.kind === "heat") {{
    const max = Math.max(1, ...layer.points.map(p => p.weight));
    L.heatLayer(layer.points.map(p => [p.lat, p.lon, p.weight]),
      {{ radius: layer.radius, blur: layer.blur, max: max }}).addTo(map);
  }} else if (layer.kind === "markers") {{
    for (const m of layer.markers) {{
      const popup = document.createElement("div");
      popup.textContent = m.popup;
      L.circleMarker([m.lat, m.lon], {{ color: m.color, fillColor: m.color, fillOpacity: 0.8, radius: 8 }})
        .bindPopup(popup)
        .addTo(map);
    }}
  }}
}}
</script>
</body>
</html>
"#
        ))
    }

    pub fn write_html(&self, path: &Path, title: &str) -> Result<(), MapError> {
        std::fs::write(path, self.to_html(title)?)?;
        log::info!("Wrote map {}", path.display());
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
