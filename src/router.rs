//! Transit router: maps the catalogue onto a two-vertex-per-stop graph and
//! answers shortest-time itinerary queries.
//!
//! Vertex encoding for the k-th stop in [`Catalogue::sorted_stops`] order:
//! `In(stop) = 2k` (on the platform, not yet waited), `Ride(stop) = 2k+1`
//! (boarded, moving). A wait edge `In -> Ride` costs `bus_wait_time`; a ride
//! edge `Ride(a) -> In(b)` costs the time to cover one or more consecutive
//! stops of a single bus without changing vehicles.

use std::collections::HashMap;

use crate::catalogue::{BusId, Catalogue, StopId};
use crate::dijkstra;
use crate::graph::{EdgeId, Graph, VertexId};

const METERS_PER_KM: f64 = 1000.0;
const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
enum EdgeLabel {
    Wait { stop: StopId },
    Ride { bus: BusId, span: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    Wait { stop: String, time: f64 },
    Ride { bus: String, span: u32, time: f64 },
}

pub struct Itinerary {
    pub total_time: f64,
    pub activities: Vec<Activity>,
}

pub enum RouteQueryResult {
    Found(Itinerary),
    NotFound,
}

pub struct Router<'a> {
    catalogue: &'a Catalogue,
    graph: Graph,
    stop_rank: HashMap<StopId, u32>,
    edge_labels: Vec<EdgeLabel>,
}

impl<'a> Router<'a> {
    /// Builds the transit graph from a catalogue that is now treated as
    /// frozen: no further stops, buses, or distances may be added once a
    /// `Router` borrows it.
    pub fn build(catalogue: &'a Catalogue, bus_wait_time: u32, bus_velocity_kmh: f64) -> Self {
        let sorted_stops = catalogue.sorted_stops();
        let mut graph = Graph::with_vertices(sorted_stops.len() * 2);
        let mut stop_rank = HashMap::with_capacity(sorted_stops.len());
        let mut edge_labels = Vec::new();

        for (rank, &stop) in sorted_stops.iter().enumerate() {
            stop_rank.insert(stop, rank as u32);
            let in_vertex = Self::in_vertex(rank as u32);
            let ride_vertex = Self::ride_vertex(rank as u32);
            let edge_id = graph.add_edge(in_vertex, ride_vertex, bus_wait_time as f64);
            Self::record_label(&mut edge_labels, edge_id, EdgeLabel::Wait { stop });
        }

        let velocity_m_per_min = bus_velocity_kmh * METERS_PER_KM / MINUTES_PER_HOUR;

        for bus_id in catalogue.sorted_buses() {
            let bus = catalogue.bus(bus_id);
            let stops = bus.stops();
            Self::add_ride_edges(&mut graph, &mut edge_labels, catalogue, &stop_rank, bus_id, stops, velocity_m_per_min);

            if !bus.is_circular() {
                let reversed: Vec<StopId> = stops.iter().rev().copied().collect();
                Self::add_ride_edges(&mut graph, &mut edge_labels, catalogue, &stop_rank, bus_id, &reversed, velocity_m_per_min);
            }
        }

        Self { catalogue, graph, stop_rank, edge_labels }
    }

    fn in_vertex(rank: u32) -> VertexId {
        rank * 2
    }

    fn ride_vertex(rank: u32) -> VertexId {
        rank * 2 + 1
    }

    fn record_label(labels: &mut Vec<EdgeLabel>, edge_id: EdgeId, label: EdgeLabel) {
        debug_assert_eq!(edge_id as usize, labels.len());
        labels.push(label);
    }

    /// Emits one Ride edge per (i, j) pair with i < j along `stops`,
    /// weighted by the running sum of directional road distances between
    /// consecutive stops, converted to minutes.
    fn add_ride_edges(
        graph: &mut Graph,
        edge_labels: &mut Vec<EdgeLabel>,
        catalogue: &Catalogue,
        stop_rank: &HashMap<StopId, u32>,
        bus: BusId,
        stops: &[StopId],
        velocity_m_per_min: f64,
    ) {
        let n = stops.len();
        for i in 0..n.saturating_sub(1) {
            let mut distance_sum_m: u64 = 0;
            for j in (i + 1)..n {
                distance_sum_m += catalogue.get_distance(stops[j - 1], stops[j]) as u64;
                let travel_time = distance_sum_m as f64 / velocity_m_per_min;

                let from = Self::ride_vertex(stop_rank[&stops[i]]);
                let to = Self::in_vertex(stop_rank[&stops[j]]);
                let edge_id = graph.add_edge(from, to, travel_time);
                Self::record_label(edge_labels, edge_id, EdgeLabel::Ride { bus, span: (j - i) as u32 });
            }
        }
    }

    pub fn find_route(&self, from_name: &str, to_name: &str) -> RouteQueryResult {
        let (Some(from), Some(to)) = (self.catalogue.find_stop(from_name), self.catalogue.find_stop(to_name)) else {
            return RouteQueryResult::NotFound;
        };

        let src = Self::in_vertex(self.stop_rank[&from]);
        let dst = Self::in_vertex(self.stop_rank[&to]);

        let Some(route) = dijkstra::build_route(&self.graph, src, dst) else {
            return RouteQueryResult::NotFound;
        };

        let activities = route
            .edges
            .iter()
            .map(|&edge_id| {
                let weight = self.graph.edge(edge_id).weight;
                match self.edge_labels[edge_id as usize] {
                    EdgeLabel::Wait { stop } => Activity::Wait {
                        stop: self.catalogue.stop_name(stop).to_owned(),
                        time: weight,
                    },
                    EdgeLabel::Ride { bus, span } => Activity::Ride {
                        bus: self.catalogue.bus_name(bus).to_owned(),
                        span,
                        time: weight,
                    },
                }
            })
            .collect();

        RouteQueryResult::Found(Itinerary { total_time: route.total_weight, activities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn build_catalogue() -> Catalogue {
        let mut cat = Catalogue::new();
        let a = cat.add_stop("A", Coordinate::new(55.611087, 37.20829)).unwrap();
        let b = cat.add_stop("B", Coordinate::new(55.595884, 37.209755)).unwrap();
        cat.set_distance(a, b, 3900);
        cat.set_distance(b, a, 4100);
        cat.add_bus("256", vec![a, b], false).unwrap();
        cat
    }

    #[test]
    fn out_and_back_worked_example() {
        let cat = build_catalogue();
        let router = Router::build(&cat, 6, 40.0);
        let RouteQueryResult::Found(itinerary) = router.find_route("A", "B") else {
            panic!("expected a route");
        };
        assert!((itinerary.total_time - 11.85).abs() < 1e-9);
        assert_eq!(itinerary.activities.len(), 2);
        assert!(matches!(itinerary.activities[0], Activity::Wait { ref stop, time } if stop == "A" && (time - 6.0).abs() < 1e-9));
        assert!(matches!(&itinerary.activities[1], Activity::Ride { bus, span: 1, .. } if bus == "256"));
    }

    #[test]
    fn same_bus_skip_has_single_ride_edge() {
        let mut cat = Catalogue::new();
        let x = cat.add_stop("X", Coordinate::new(0.0, 0.0)).unwrap();
        let y = cat.add_stop("Y", Coordinate::new(0.0, 0.01)).unwrap();
        let z = cat.add_stop("Z", Coordinate::new(0.0, 0.02)).unwrap();
        cat.set_distance(x, y, 1000);
        cat.set_distance(y, z, 1000);
        cat.add_bus("M", vec![x, y, z], false).unwrap();

        let router = Router::build(&cat, 5, 30.0);
        let RouteQueryResult::Found(itinerary) = router.find_route("X", "Z") else {
            panic!("expected a route");
        };
        assert_eq!(itinerary.activities.len(), 2);
        assert!(matches!(&itinerary.activities[0], Activity::Wait { stop, .. } if stop == "X"));
        assert!(matches!(&itinerary.activities[1], Activity::Ride { bus, span: 2, .. } if bus == "M"));
    }

    #[test]
    fn unknown_endpoint_is_not_found() {
        let cat = build_catalogue();
        let router = Router::build(&cat, 6, 40.0);
        assert!(matches!(router.find_route("Nowhere", "A"), RouteQueryResult::NotFound));
    }

    #[test]
    fn disconnected_stops_are_not_found() {
        let mut cat = Catalogue::new();
        let a = cat.add_stop("A", Coordinate::new(0.0, 0.0)).unwrap();
        let b = cat.add_stop("B", Coordinate::new(0.0, 1.0)).unwrap();
        let c = cat.add_stop("C", Coordinate::new(1.0, 0.0)).unwrap();
        let d = cat.add_stop("D", Coordinate::new(1.0, 1.0)).unwrap();
        cat.set_distance(a, b, 100);
        cat.set_distance(c, d, 100);
        cat.add_bus("1", vec![a, b], false).unwrap();
        cat.add_bus("2", vec![c, d], false).unwrap();

        let router = Router::build(&cat, 5, 30.0);
        assert!(matches!(router.find_route("A", "C"), RouteQueryResult::NotFound));
    }

    #[test]
    fn self_route_is_free() {
        let cat = build_catalogue();
        let router = Router::build(&cat, 6, 40.0);
        let RouteQueryResult::Found(itinerary) = router.find_route("A", "A") else {
            panic!("expected a route");
        };
        assert_eq!(itinerary.total_time, 0.0);
        assert!(itinerary.activities.is_empty());
    }

    #[test]
    fn alternation_holds_for_every_ride() {
        let cat = build_catalogue();
        let router = Router::build(&cat, 6, 40.0);
        let RouteQueryResult::Found(itinerary) = router.find_route("A", "B") else {
            panic!("expected a route");
        };
        for pair in itinerary.activities.windows(2) {
            if let Activity::Ride { .. } = &pair[1] {
                assert!(matches!(pair[0], Activity::Wait { .. }));
            }
        }
        assert!(matches!(itinerary.activities.first(), Some(Activity::Wait { .. })));
    }
}
