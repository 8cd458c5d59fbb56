//! Pure transformations from catalogue/router state into the three
//! stat-request answers. No I/O, no JSON — see [`crate::io`] for that.

use crate::catalogue::Catalogue;
use crate::router::{Router, RouteQueryResult};

pub struct BusStats {
    pub curvature: f64,
    pub road_length: u64,
    pub stops_on_route: usize,
    pub unique_stops: usize,
}

pub enum BusQueryResult {
    Found(BusStats),
    NotFound,
}

pub enum StopQueryResult {
    Found(Vec<String>),
    NotFound,
}

pub fn query_bus(catalogue: &Catalogue, name: &str) -> BusQueryResult {
    let Some(bus) = catalogue.find_bus(name) else {
        return BusQueryResult::NotFound;
    };
    BusQueryResult::Found(BusStats {
        curvature: catalogue.curvature(bus),
        road_length: catalogue.road_length(bus),
        stops_on_route: catalogue.bus(bus).stops_on_route(),
        unique_stops: catalogue.bus(bus).unique_stops(),
    })
}

pub fn query_stop(catalogue: &Catalogue, name: &str) -> StopQueryResult {
    let Some(stop) = catalogue.find_stop(name) else {
        return StopQueryResult::NotFound;
    };
    StopQueryResult::Found(catalogue.buses_at_stop(stop).into_iter().map(str::to_owned).collect())
}

pub fn query_route<'a>(router: &Router<'a>, from: &str, to: &str) -> RouteQueryResult {
    router.find_route(from, to)
}
