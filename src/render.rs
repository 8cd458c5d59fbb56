//! Renders the network as an SVG vector map.
//!
//! An external collaborator to the routing core: the router and catalogue
//! never depend on this module, only the I/O layer's `Map` response does.

use rgb::RGB8;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path, Text};
use svg::node::Text as TextNode;
use svg::Document;

use crate::catalogue::{BusId, Catalogue, StopId};

#[derive(Debug, Clone)]
pub enum Color {
    Named(String),
    Rgb(RGB8),
    Rgba(RGB8, f64),
}

impl Color {
    fn to_svg_string(&self) -> String {
        match self {
            Color::Named(name) => name.clone(),
            Color::Rgb(c) => format!("rgb({},{},{})", c.r, c.g, c.b),
            Color::Rgba(c, a) => format!("rgba({},{},{},{})", c.r, c.g, c.b, a),
        }
    }
}

pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: (f64, f64),
    pub stop_label_font_size: u32,
    pub stop_label_offset: (f64, f64),
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
}

struct Projection {
    max_lat: f64,
    min_lon: f64,
    zoom: f64,
    padding: f64,
}

impl Projection {
    fn fit(points: impl Iterator<Item = (f64, f64)>, width: f64, height: f64, padding: f64) -> Self {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut any = false;
        for (lat, lon) in points {
            any = true;
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
        }
        if !any {
            return Self { max_lat: 0.0, min_lon: 0.0, zoom: 0.0, padding };
        }

        let width_zoom = if max_lon > min_lon { Some((width - 2.0 * padding) / (max_lon - min_lon)) } else { None };
        let height_zoom = if max_lat > min_lat { Some((height - 2.0 * padding) / (max_lat - min_lat)) } else { None };
        let zoom = match (width_zoom, height_zoom) {
            (Some(w), Some(h)) => w.min(h),
            (Some(w), None) => w,
            (None, Some(h)) => h,
            (None, None) => 0.0,
        };

        Self { max_lat, min_lon, zoom, padding }
    }

    // Only ever called when `zoom != 0.0`; the degenerate case is handled
    // by `MapRenderer::render` before this is reached.
    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = (lon - self.min_lon) * self.zoom + self.padding;
        let y = (self.max_lat - lat) * self.zoom + self.padding;
        (x, y)
    }
}

pub struct MapRenderer {
    settings: RenderSettings,
}

impl MapRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    /// Renders every bus's polyline (circular buses close via their own
    /// stored loop; out-and-back buses draw the one-way line only, since
    /// the return trip overlaps it exactly) then every routed stop as a
    /// circle and a label.
    pub fn render(&self, catalogue: &Catalogue) -> String {
        let settings = &self.settings;

        let routed_stops = Self::stops_on_any_bus(catalogue);
        let center = (settings.width / 2.0, settings.height / 2.0);
        let projection = Projection::fit(
            routed_stops.iter().map(|&s| {
                let c = catalogue.stop_coordinate(s);
                (c.latitude, c.longitude)
            }),
            settings.width,
            settings.height,
            settings.padding,
        );
        let degenerate = projection.zoom == 0.0;
        let point_of = |stop: StopId| -> (f64, f64) {
            if degenerate {
                center
            } else {
                let c = catalogue.stop_coordinate(stop);
                projection.project(c.latitude, c.longitude)
            }
        };

        let mut document = Document::new().set("width", settings.width).set("height", settings.height).set("viewBox", (0, 0, settings.width as i64, settings.height as i64));

        let buses = catalogue.sorted_buses();
        for (palette_index, &bus) in buses.iter().enumerate() {
            if let Some(path) = self.bus_path(catalogue, bus, &point_of) {
                let color = self.palette_color(palette_index);
                document = document.add(path.set("stroke", color.to_svg_string()));
            }
        }

        for (palette_index, &bus) in buses.iter().enumerate() {
            let color = self.palette_color(palette_index);
            for label in self.bus_labels(catalogue, bus, &point_of, &color) {
                document = document.add(label);
            }
        }

        for &stop in &routed_stops {
            document = document.add(self.stop_circle(point_of(stop)));
        }

        for &stop in &routed_stops {
            for label in self.stop_labels(catalogue, stop, &point_of) {
                document = document.add(label);
            }
        }

        document.to_string()
    }

    fn stops_on_any_bus(catalogue: &Catalogue) -> Vec<StopId> {
        let mut stops: Vec<StopId> = catalogue
            .sorted_buses()
            .iter()
            .flat_map(|&bus| catalogue.bus(bus).stops().to_vec())
            .collect();
        stops.sort_unstable_by_key(|s| s.index());
        stops.dedup();
        stops.sort_unstable_by(|&a, &b| catalogue.stop_name(a).cmp(catalogue.stop_name(b)));
        stops
    }

    fn palette_color(&self, index: usize) -> Color {
        if self.settings.color_palette.is_empty() {
            return Color::Named("black".to_owned());
        }
        self.settings.color_palette[index % self.settings.color_palette.len()].clone()
    }

    fn bus_path(&self, catalogue: &Catalogue, bus: BusId, point_of: &impl Fn(StopId) -> (f64, f64)) -> Option<Path> {
        let stops = catalogue.bus(bus).stops();
        let mut iter = stops.iter();
        let first = *iter.next()?;
        let mut data = Data::new().move_to(point_of(first));
        for &stop in iter {
            data = data.line_to(point_of(stop));
        }

        Some(
            Path::new()
                .set("fill", "none")
                .set("stroke-width", self.settings.line_width)
                .set("stroke-linecap", "round")
                .set("stroke-linejoin", "round")
                .set("d", data),
        )
    }

    fn bus_labels(&self, catalogue: &Catalogue, bus: BusId, point_of: &impl Fn(StopId) -> (f64, f64), color: &Color) -> Vec<Text> {
        let bus_info = catalogue.bus(bus);
        let stops = bus_info.stops();
        let Some(&first) = stops.first() else {
            return Vec::new();
        };
        let mut termini = vec![first];
        if !bus_info.is_circular() {
            if let Some(&last) = stops.last() {
                if last != first {
                    termini.push(last);
                }
            }
        }

        termini
            .into_iter()
            .flat_map(|stop| self.label_pair(catalogue.bus_name(bus), point_of(stop), self.settings.bus_label_offset, self.settings.bus_label_font_size, color))
            .collect()
    }

    fn stop_circle(&self, (x, y): (f64, f64)) -> Circle {
        Circle::new().set("cx", x).set("cy", y).set("r", self.settings.stop_radius).set("fill", "white")
    }

    fn stop_labels(&self, catalogue: &Catalogue, stop: StopId, point_of: &impl Fn(StopId) -> (f64, f64)) -> Vec<Text> {
        let black = Color::Named("black".to_owned());
        self.label_pair(catalogue.stop_name(stop), point_of(stop), self.settings.stop_label_offset, self.settings.stop_label_font_size, &black)
    }

    /// An underlayer copy (drawn first, stroked wide for legibility) and
    /// the label itself, matching how the original renders every label.
    fn label_pair(&self, content: &str, (x, y): (f64, f64), offset: (f64, f64), font_size: u32, fill: &Color) -> Vec<Text> {
        let (dx, dy) = offset;
        let build = |extra_stroke: bool| {
            let mut text = Text::new("").add(TextNode::new(content.to_owned())).set("x", x + dx).set("y", y + dy).set("font-size", font_size).set("font-family", "Verdana, sans-serif");
            text = if extra_stroke {
                text.set("fill", self.settings.underlayer_color.to_svg_string())
                    .set("stroke", self.settings.underlayer_color.to_svg_string())
                    .set("stroke-width", self.settings.underlayer_width)
                    .set("stroke-linecap", "round")
                    .set("stroke-linejoin", "round")
            } else {
                text.set("fill", fill.to_svg_string())
            };
            text
        };
        vec![build(true), build(false)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn settings() -> RenderSettings {
        RenderSettings {
            width: 600.0,
            height: 400.0,
            padding: 50.0,
            line_width: 14.0,
            stop_radius: 5.0,
            bus_label_font_size: 20,
            bus_label_offset: (7.0, 15.0),
            stop_label_font_size: 18,
            stop_label_offset: (7.0, -3.0),
            underlayer_color: Color::Rgba(RGB8 { r: 255, g: 255, b: 255 }, 0.85),
            underlayer_width: 3.0,
            color_palette: vec![Color::Named("green".to_owned()), Color::Rgb(RGB8 { r: 255, g: 160, b: 0 })],
        }
    }

    #[test]
    fn renders_well_formed_svg_for_empty_catalogue() {
        let catalogue = Catalogue::new();
        let svg = MapRenderer::new(settings()).render(&catalogue);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn renders_a_line_and_labels_for_one_bus() {
        let mut catalogue = Catalogue::new();
        let a = catalogue.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        let b = catalogue.add_stop("B", Coordinate::new(0.01, 0.01)).unwrap();
        catalogue.add_bus("1", vec![a, b], false).unwrap();

        let svg = MapRenderer::new(settings()).render(&catalogue);
        assert!(svg.contains("<path"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<text"));
    }
}
