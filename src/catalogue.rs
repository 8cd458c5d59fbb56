//! In-memory store of stops, buses, and road-distance overrides.
//!
//! Stops and buses never move once inserted: callers address them by
//! [`StopId`]/[`BusId`], dense indices into the catalogue's own backing
//! vectors, rather than by borrowed reference. This sidesteps the
//! stop<->bus cyclic reference the source data model implies (a stop
//! lists the buses through it, a bus lists its stops) without needing
//! self-referential structures: both sides just resolve the other's id
//! through the catalogue.

use std::collections::{BTreeSet, HashMap};

use crate::error::CatalogueError;
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StopId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusId(u32);

impl StopId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BusId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub struct Stop {
    name: Box<str>,
    coordinate: Coordinate,
    buses: BTreeSet<BusId>,
}

pub struct Bus {
    name: Box<str>,
    stops: Vec<StopId>,
    is_circular: bool,
}

impl Bus {
    /// Number of stops along the route as reported to callers: the stored
    /// sequence length for a circular bus (it already contains the closing
    /// stop), doubled minus one for an out-and-back bus.
    pub fn stops_on_route(&self) -> usize {
        if self.is_circular {
            self.stops.len()
        } else {
            2 * self.stops.len() - 1
        }
    }

    pub fn unique_stops(&self) -> usize {
        self.stops.iter().collect::<std::collections::HashSet<_>>().len()
    }

    pub fn is_circular(&self) -> bool {
        self.is_circular
    }

    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Default)]
pub struct Catalogue {
    stops: Vec<Stop>,
    buses: Vec<Bus>,
    stop_index: HashMap<Box<str>, StopId>,
    bus_index: HashMap<Box<str>, BusId>,
    distances: HashMap<(StopId, StopId), u32>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stop(&mut self, name: &str, coordinate: Coordinate) -> Result<StopId, CatalogueError> {
        if self.stop_index.contains_key(name) {
            return Err(CatalogueError::DuplicateStop(name.to_owned()));
        }
        let id = StopId(self.stops.len() as u32);
        self.stops.push(Stop {
            name: name.into(),
            coordinate,
            buses: BTreeSet::new(),
        });
        self.stop_index.insert(name.into(), id);
        Ok(id)
    }

    pub fn set_distance(&mut self, from: StopId, to: StopId, meters: u32) {
        self.distances.insert((from, to), meters);
    }

    /// Inserts a new bus. `stops` must already reference existing stops
    /// (the caller resolves names to [`StopId`] via [`Self::find_stop`]
    /// before calling this).
    pub fn add_bus(&mut self, name: &str, stops: Vec<StopId>, is_circular: bool) -> Result<BusId, CatalogueError> {
        if self.bus_index.contains_key(name) {
            return Err(CatalogueError::DuplicateBus(name.to_owned()));
        }
        if stops.is_empty() {
            return Err(CatalogueError::EmptyRoute(name.to_owned()));
        }
        if is_circular && stops.first() != stops.last() {
            return Err(CatalogueError::InvalidCircularRoute(name.to_owned()));
        }

        let id = BusId(self.buses.len() as u32);
        for &stop in &stops {
            self.stops[stop.index()].buses.insert(id);
        }
        self.buses.push(Bus {
            name: name.into(),
            stops,
            is_circular,
        });
        self.bus_index.insert(name.into(), id);
        Ok(id)
    }

    pub fn find_stop(&self, name: &str) -> Option<StopId> {
        self.stop_index.get(name).copied()
    }

    pub fn find_bus(&self, name: &str) -> Option<BusId> {
        self.bus_index.get(name).copied()
    }

    pub fn stop_name(&self, id: StopId) -> &str {
        &self.stops[id.index()].name
    }

    pub fn bus_name(&self, id: BusId) -> &str {
        &self.buses[id.index()].name
    }

    pub fn stop_coordinate(&self, id: StopId) -> Coordinate {
        self.stops[id.index()].coordinate
    }

    pub fn bus(&self, id: BusId) -> &Bus {
        &self.buses[id.index()]
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    /// Directional road distance from `from` to `to`. Falls back to the
    /// reverse-direction override if the forward one is absent, and to
    /// zero if neither is recorded.
    pub fn get_distance(&self, from: StopId, to: StopId) -> u32 {
        self.distances
            .get(&(from, to))
            .or_else(|| self.distances.get(&(to, from)))
            .copied()
            .unwrap_or(0)
    }

    /// Stops in lexicographic name order — used for deterministic vertex
    /// numbering by the router and for map rendering.
    pub fn sorted_stops(&self) -> Vec<StopId> {
        let mut ids: Vec<StopId> = (0..self.stops.len() as u32).map(StopId).collect();
        ids.sort_unstable_by(|&a, &b| self.stop_name(a).cmp(self.stop_name(b)));
        ids
    }

    pub fn sorted_buses(&self) -> Vec<BusId> {
        let mut ids: Vec<BusId> = (0..self.buses.len() as u32).map(BusId).collect();
        ids.sort_unstable_by(|&a, &b| self.bus_name(a).cmp(self.bus_name(b)));
        ids
    }

    /// Bus names passing through `stop`, in lexicographic order.
    pub fn buses_at_stop(&self, stop: StopId) -> Vec<&str> {
        let mut names: Vec<&str> = self.stops[stop.index()]
            .buses
            .iter()
            .map(|&bus| self.bus_name(bus))
            .collect();
        names.sort_unstable();
        names
    }

    /// Sum of directional road distances along consecutive stop pairs of
    /// `bus`, doubled (there and back, each direction separately) for an
    /// out-and-back bus.
    pub fn road_length(&self, bus: BusId) -> u64 {
        let stops = self.bus(bus).stops();
        let mut total = 0u64;
        for pair in stops.windows(2) {
            total += self.get_distance(pair[0], pair[1]) as u64;
            if !self.bus(bus).is_circular() {
                total += self.get_distance(pair[1], pair[0]) as u64;
            }
        }
        total
    }

    /// Sum of great-circle distances along consecutive stop pairs,
    /// doubled for an out-and-back bus.
    pub fn geographic_length(&self, bus: BusId) -> f64 {
        let stops = self.bus(bus).stops();
        let mut total = 0.0;
        for pair in stops.windows(2) {
            let d = self.stop_coordinate(pair[0]).distance_to(self.stop_coordinate(pair[1]));
            total += if self.bus(bus).is_circular() { d } else { 2.0 * d };
        }
        total
    }

    pub fn curvature(&self, bus: BusId) -> f64 {
        let geo = self.geographic_length(bus);
        if geo == 0.0 {
            return 0.0;
        }
        self.road_length(bus) as f64 / geo
    }
}
