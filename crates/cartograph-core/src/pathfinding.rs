//! # Pathfinding
//!
//! Dijkstra's algorithm over the room graph, plus the queries built on it:
//! path reconstruction, nearest room among candidates, nearest tagged room.
//!
//! ## Determinism
//!
//! Frontier priorities are `(cost, room id)` pairs and neighbors are relaxed
//! in ascending id order, with strict improvement required. Equal-cost ties
//! therefore always resolve the same way, and equal-distance candidates are
//! won by the lowest id.
//!
//! ## Edge costs
//!
//! `Disabled` edges are skipped. `Computed` edges are evaluated through the
//! `CostRegistry` when relaxed; a function answering `None` closes the edge
//! for this search, and an unregistered name aborts the search with
//! `NavError::UnknownCostFunction`.

use crate::cost::CostRegistry;
use crate::graph::RoomGraph;
use crate::heap::MinHeap;
use crate::primitives::DEFAULT_EDGE_COST;
use crate::room::Room;
use crate::{Cost, NavError, RoomId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SEARCH RESULT
// =============================================================================

/// Output of a shortest-path search from one source.
///
/// Rooms that were not reached are absent from both maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPaths {
    /// Room the search started from.
    pub source: RoomId,
    /// Predecessor of each reached room on its best known route.
    pub previous: BTreeMap<RoomId, RoomId>,
    /// Best known cumulative cost of each reached room.
    pub distances: BTreeMap<RoomId, Cost>,
}

impl ShortestPaths {
    fn new(source: RoomId) -> Self {
        let mut distances = BTreeMap::new();
        distances.insert(source, Cost::ZERO);
        Self {
            source,
            previous: BTreeMap::new(),
            distances,
        }
    }

    /// Cost of the best route to `id`, if reached.
    #[must_use]
    pub fn distance(&self, id: RoomId) -> Option<Cost> {
        self.distances.get(&id).copied()
    }

    /// Check if `id` was reached.
    #[must_use]
    pub fn is_reachable(&self, id: RoomId) -> bool {
        self.distances.contains_key(&id)
    }

    /// Hops from the source to `destination`.
    ///
    /// - `None`: not reached
    /// - `Some(vec![])`: `destination` is the source, no movement needed
    /// - otherwise the first hop after the source through `destination`
    #[must_use]
    pub fn route_to(&self, destination: RoomId) -> Option<Vec<RoomId>> {
        if destination == self.source {
            return Some(Vec::new());
        }

        let mut route = vec![destination];
        let mut current = destination;
        // A predecessor chain can not be longer than the number of entries.
        for _ in 0..=self.previous.len() {
            let prev = *self.previous.get(&current)?;
            if prev == self.source {
                route.reverse();
                return Some(route);
            }
            route.push(prev);
            current = prev;
        }
        None
    }
}

// =============================================================================
// SEARCHES
// =============================================================================

impl RoomGraph {
    /// Run Dijkstra from `source` until `stop` accepts a finalized room.
    ///
    /// Returns the search state and the room that stopped it, if any.
    /// Without a stop the whole reachable graph is explored.
    pub fn search<F>(
        &self,
        source: RoomId,
        costs: &CostRegistry,
        mut stop: F,
    ) -> Result<(ShortestPaths, Option<RoomId>), NavError>
    where
        F: FnMut(RoomId, &Room) -> bool,
    {
        if !self.contains(source) {
            return Err(NavError::RoomNotFound(source));
        }

        let mut paths = ShortestPaths::new(source);
        let mut finalized = BTreeSet::new();
        let mut frontier = MinHeap::with_capacity(self.len().min(1024));
        frontier.push((Cost::ZERO, source), source);

        while let Some(((dist, _), current)) = frontier.pop() {
            // Lazy deletion: skip entries superseded by a better push.
            if paths.distance(current).is_some_and(|best| dist > best) {
                continue;
            }
            if !finalized.insert(current) {
                continue;
            }
            let Some(room) = self.room(current) else {
                continue;
            };
            if stop(current, room) {
                return Ok((paths, Some(current)));
            }

            for (&next, exit) in &room.exits {
                if finalized.contains(&next) || !self.contains(next) {
                    continue;
                }
                let evaluated = costs.evaluate(&exit.cost).inspect_err(|e| {
                    tracing::debug!(from = %current, to = %next, error = %e, "Edge cost evaluation failed");
                });
                let Some(edge) = evaluated? else {
                    continue;
                };
                let candidate = dist.saturating_add(edge);
                if paths.distance(next).is_none_or(|known| candidate < known) {
                    paths.distances.insert(next, candidate);
                    paths.previous.insert(next, current);
                    frontier.push((candidate, next), next);
                }
            }
        }

        Ok((paths, None))
    }

    /// Shortest paths from `source`, stopping early once `destination` is
    /// finalized.
    pub fn dijkstra(
        &self,
        source: RoomId,
        destination: Option<RoomId>,
        costs: &CostRegistry,
    ) -> Result<ShortestPaths, NavError> {
        let (paths, _) = self.search(source, costs, |id, _| Some(id) == destination)?;
        Ok(paths)
    }

    /// Hop sequence from `source` to `destination`.
    ///
    /// `Ok(None)` if unreachable, `Ok(Some(vec![]))` if already there.
    pub fn path_to(
        &self,
        source: RoomId,
        destination: RoomId,
        costs: &CostRegistry,
    ) -> Result<Option<Vec<RoomId>>, NavError> {
        let paths = self.dijkstra(source, Some(destination), costs)?;
        Ok(paths.route_to(destination))
    }

    /// Closest reachable room among `targets`.
    ///
    /// The source wins at distance zero when it is a target.
    pub fn find_nearest(
        &self,
        source: RoomId,
        targets: &[RoomId],
        costs: &CostRegistry,
    ) -> Result<Option<RoomId>, NavError> {
        let wanted: BTreeSet<RoomId> = targets.iter().copied().collect();
        let (_, found) = self.search(source, costs, |id, _| wanted.contains(&id))?;
        Ok(found)
    }

    /// Closest reachable room carrying `tag`.
    pub fn find_nearest_by_tag(
        &self,
        source: RoomId,
        tag: &str,
        costs: &CostRegistry,
    ) -> Result<Option<RoomId>, NavError> {
        let (_, found) = self.search(source, costs, |_, room| room.has_tag(tag))?;
        Ok(found)
    }

    /// Every reachable room carrying `tag`, nearest first.
    pub fn find_all_nearest_by_tag(
        &self,
        source: RoomId,
        tag: &str,
        costs: &CostRegistry,
    ) -> Result<Vec<RoomId>, NavError> {
        let paths = self.dijkstra(source, None, costs)?;
        let mut found: Vec<(Cost, RoomId)> = self
            .ids_with_tag(tag)
            .into_iter()
            .filter_map(|id| paths.distance(id).map(|d| (d, id)))
            .collect();
        found.sort_unstable();
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }

    /// Expected travel time along `route`, which starts at the origin room.
    ///
    /// Hops without a usable cost (missing, disabled or currently closed)
    /// count `DEFAULT_EDGE_COST`.
    pub fn estimate_time(&self, route: &[RoomId], costs: &CostRegistry) -> Result<Cost, NavError> {
        let mut total = Cost::ZERO;
        for hop in route.windows(2) {
            let (from, to) = (hop[0], hop[1]);
            let room = self.room(from).ok_or(NavError::RoomNotFound(from))?;
            let cost = match room.exit(to) {
                Some(exit) => costs.evaluate(&exit.cost)?.unwrap_or(DEFAULT_EDGE_COST),
                None => DEFAULT_EDGE_COST,
            };
            total = total.saturating_add(cost);
        }
        Ok(total)
    }

    /// Movement commands for walking `hops` starting at `source`.
    ///
    /// `None` if some hop has no exit from the previous room.
    #[must_use]
    pub fn commands_along(&self, source: RoomId, hops: &[RoomId]) -> Option<Vec<String>> {
        let mut from = source;
        let mut commands = Vec::with_capacity(hops.len());
        for &to in hops {
            let exit = self.room(from)?.exit(to)?;
            commands.push(exit.command.clone());
            from = to;
        }
        Some(commands)
    }
}

// =============================================================================
// TESTS
// =============================================================================
