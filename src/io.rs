//! The batch runner's I/O layer: deserializes the four-section request
//! document, fills the catalogue in three passes, builds the router and
//! renderer once, and answers every stat request in order.
//!
//! Stops are added first, then every distance override, then every bus
//! (which can now resolve every stop name it lists). The catalogue and
//! router are never touched again after [`process`] finishes building
//! them.

use std::collections::BTreeMap;

use rgb::RGB8;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalogue::Catalogue;
use crate::error::{CatalogueError, LoadError};
use crate::geo::Coordinate;
use crate::render::{Color, MapRenderer, RenderSettings};
use crate::router::{Activity, RouteQueryResult, Router};
use crate::stats::{self, BusQueryResult, StopQueryResult};

#[derive(Deserialize)]
struct RequestDocument {
    base_requests: Vec<BaseRequest>,
    render_settings: RawRenderSettings,
    routing_settings: RoutingSettings,
    stat_requests: Vec<StatRequest>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum BaseRequest {
    Stop {
        name: String,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        road_distances: BTreeMap<String, u32>,
    },
    Bus {
        name: String,
        stops: Vec<String>,
        is_roundtrip: bool,
    },
}

#[derive(Deserialize)]
struct RoutingSettings {
    bus_wait_time: u32,
    bus_velocity: f64,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum StatRequest {
    Stop { id: i64, name: String },
    Bus { id: i64, name: String },
    Route { id: i64, from: String, to: String },
    Map { id: i64 },
}

#[derive(Deserialize)]
struct RawRenderSettings {
    width: f64,
    height: f64,
    padding: f64,
    line_width: f64,
    stop_radius: f64,
    bus_label_font_size: u32,
    bus_label_offset: [f64; 2],
    stop_label_font_size: u32,
    stop_label_offset: [f64; 2],
    underlayer_color: Value,
    underlayer_width: f64,
    color_palette: Vec<Value>,
}

/// Runs the whole batch: parse -> three-pass fill -> build router/renderer
/// -> answer every stat request -> serialize the response array.
pub fn process(input: &str) -> Result<String, LoadError> {
    let document: RequestDocument = serde_json::from_str(input)?;

    let catalogue = fill_catalogue(&document.base_requests)?;
    let router = Router::build(&catalogue, document.routing_settings.bus_wait_time, document.routing_settings.bus_velocity);
    let renderer = build_renderer(document.render_settings)?;

    log::info!(
        "Catalogue loaded: {} stops, {} buses. Answering {} stat requests.",
        catalogue.stop_count(),
        catalogue.bus_count(),
        document.stat_requests.len()
    );

    let responses: Vec<Value> = document.stat_requests.iter().map(|req| answer(req, &catalogue, &router, &renderer)).collect();

    Ok(serde_json::to_string(&responses)?)
}

fn fill_catalogue(base_requests: &[BaseRequest]) -> Result<Catalogue, LoadError> {
    let mut catalogue = Catalogue::new();

    // Pass 1: every stop, so every name is resolvable afterward.
    for request in base_requests {
        if let BaseRequest::Stop { name, latitude, longitude, .. } = request {
            catalogue.add_stop(name, Coordinate::new(*latitude, *longitude))?;
        }
    }

    // Pass 2: every directional distance override.
    for request in base_requests {
        if let BaseRequest::Stop { name, road_distances, .. } = request {
            let from = catalogue.find_stop(name).expect("pass 1 added every stop");
            for (to_name, meters) in road_distances {
                let to = catalogue.find_stop(to_name).ok_or_else(|| CatalogueError::UnknownStop(to_name.clone()))?;
                catalogue.set_distance(from, to, *meters);
            }
        }
    }

    // Pass 3: every bus, now that every stop it lists is known.
    for request in base_requests {
        if let BaseRequest::Bus { name, stops, is_roundtrip } = request {
            let stop_ids = stops
                .iter()
                .map(|stop_name| catalogue.find_stop(stop_name).ok_or_else(|| CatalogueError::UnknownStop(stop_name.clone())))
                .collect::<Result<Vec<_>, _>>()?;
            catalogue.add_bus(name, stop_ids, *is_roundtrip)?;
        }
    }

    Ok(catalogue)
}

fn build_renderer(raw: RawRenderSettings) -> Result<MapRenderer, LoadError> {
    let underlayer_color = parse_color(&raw.underlayer_color)?;
    let color_palette = raw.color_palette.iter().map(parse_color).collect::<Result<Vec<_>, _>>()?;

    Ok(MapRenderer::new(RenderSettings {
        width: raw.width,
        height: raw.height,
        padding: raw.padding,
        line_width: raw.line_width,
        stop_radius: raw.stop_radius,
        bus_label_font_size: raw.bus_label_font_size,
        bus_label_offset: (raw.bus_label_offset[0], raw.bus_label_offset[1]),
        stop_label_font_size: raw.stop_label_font_size,
        stop_label_offset: (raw.stop_label_offset[0], raw.stop_label_offset[1]),
        underlayer_color,
        underlayer_width: raw.underlayer_width,
        color_palette,
    }))
}

/// A color is a CSS name string, a `[r,g,b]` triplet, or an `[r,g,b,a]`
/// quadruplet — matching the three shapes the original renderer accepts.
fn parse_color(value: &Value) -> Result<Color, LoadError> {
    match value {
        Value::String(name) => Ok(Color::Named(name.clone())),
        Value::Array(items) => match items.len() {
            3 => {
                let (r, g, b) = channel_triplet(items)?;
                Ok(Color::Rgb(RGB8 { r, g, b }))
            }
            4 => {
                let (r, g, b) = channel_triplet(&items[..3])?;
                let a = items[3].as_f64().ok_or_else(|| LoadError::InvalidColor("alpha channel must be a number".into()))?;
                Ok(Color::Rgba(RGB8 { r, g, b }, a))
            }
            other => Err(LoadError::InvalidColor(format!("color array must have 3 or 4 elements, got {other}"))),
        },
        _ => Err(LoadError::InvalidColor("color must be a string or an array".into())),
    }
}

fn channel_triplet(items: &[Value]) -> Result<(u8, u8, u8), LoadError> {
    let channel = |i: usize| -> Result<u8, LoadError> {
        items[i]
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| LoadError::InvalidColor("color channel must be an integer 0-255".into()))
    };
    Ok((channel(0)?, channel(1)?, channel(2)?))
}

fn answer(request: &StatRequest, catalogue: &Catalogue, router: &Router, renderer: &MapRenderer) -> Value {
    match request {
        StatRequest::Stop { id, name } => match stats::query_stop(catalogue, name) {
            StopQueryResult::Found(buses) => json!({"request_id": id, "buses": buses}),
            StopQueryResult::NotFound => not_found(*id),
        },
        StatRequest::Bus { id, name } => match stats::query_bus(catalogue, name) {
            BusQueryResult::Found(bus_stats) => json!({
                "request_id": id,
                "curvature": bus_stats.curvature,
                "route_length": bus_stats.road_length,
                "stop_count": bus_stats.stops_on_route,
                "unique_stop_count": bus_stats.unique_stops,
            }),
            BusQueryResult::NotFound => not_found(*id),
        },
        StatRequest::Route { id, from, to } => match stats::query_route(router, from, to) {
            RouteQueryResult::Found(itinerary) => {
                let items: Vec<Value> = itinerary
                    .activities
                    .iter()
                    .map(|activity| match activity {
                        Activity::Wait { stop, time } => json!({"type": "Wait", "stop_name": stop, "time": round6(*time)}),
                        Activity::Ride { bus, span, time } => json!({"type": "Bus", "bus": bus, "span_count": span, "time": round6(*time)}),
                    })
                    .collect();
                json!({"request_id": id, "total_time": round6(itinerary.total_time), "items": items})
            }
            RouteQueryResult::NotFound => not_found(*id),
        },
        StatRequest::Map { id } => json!({"request_id": id, "map": renderer.render(catalogue)}),
    }
}

fn not_found(id: i64) -> Value {
    json!({"request_id": id, "error_message": "not found"})
}

fn round6(time: f64) -> f64 {
    (time * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> String {
        json!({
            "base_requests": [
                {"type": "Stop", "name": "A", "latitude": 55.611087, "longitude": 37.20829, "road_distances": {"B": 3900}},
                {"type": "Stop", "name": "B", "latitude": 55.595884, "longitude": 37.209755, "road_distances": {"A": 4100}},
                {"type": "Bus", "name": "256", "stops": ["A", "B"], "is_roundtrip": false},
            ],
            "render_settings": {
                "width": 200.0, "height": 200.0, "padding": 10.0,
                "line_width": 2.0, "stop_radius": 3.0,
                "bus_label_font_size": 12, "bus_label_offset": [1.0, 1.0],
                "stop_label_font_size": 10, "stop_label_offset": [1.0, 1.0],
                "underlayer_color": "white", "underlayer_width": 1.0,
                "color_palette": ["green", [255, 0, 0], [0, 0, 255, 0.5]],
            },
            "routing_settings": {"bus_wait_time": 6, "bus_velocity": 40.0},
            "stat_requests": [
                {"id": 1, "type": "Bus", "name": "256"},
                {"id": 2, "type": "Stop", "name": "A"},
                {"id": 3, "type": "Stop", "name": "Nowhere"},
                {"id": 4, "type": "Route", "from": "A", "to": "B"},
                {"id": 5, "type": "Map"},
            ],
        })
        .to_string()
    }

    #[test]
    fn end_to_end_worked_example() {
        let output = process(&sample_document()).expect("document should process");
        let responses: Vec<Value> = serde_json::from_str(&output).unwrap();

        assert_eq!(responses[0]["request_id"], 1);
        assert_eq!(responses[0]["stop_count"], 3);
        assert_eq!(responses[0]["unique_stop_count"], 2);

        assert_eq!(responses[1]["buses"], json!(["256"]));

        assert_eq!(responses[2]["error_message"], "not found");

        assert_eq!(responses[3]["total_time"], 11.85);
        assert_eq!(responses[3]["items"][0]["type"], "Wait");
        assert_eq!(responses[3]["items"][1]["span_count"], 1);

        assert!(responses[4]["map"].as_str().unwrap().contains("<svg"));
    }

    #[test]
    fn unknown_stop_reference_is_fatal() {
        let document = json!({
            "base_requests": [
                {"type": "Bus", "name": "1", "stops": ["Ghost"], "is_roundtrip": true},
            ],
            "render_settings": {
                "width": 1.0, "height": 1.0, "padding": 0.0,
                "line_width": 1.0, "stop_radius": 1.0,
                "bus_label_font_size": 1, "bus_label_offset": [0.0, 0.0],
                "stop_label_font_size": 1, "stop_label_offset": [0.0, 0.0],
                "underlayer_color": "white", "underlayer_width": 1.0,
                "color_palette": [],
            },
            "routing_settings": {"bus_wait_time": 1, "bus_velocity": 1.0},
            "stat_requests": [],
        })
        .to_string();

        assert!(process(&document).is_err());
    }
}
