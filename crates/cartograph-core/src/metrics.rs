//! # Map Metrics
//!
//! Summary counts over a room graph, for status reporting and sanity checks.

use crate::graph::RoomGraph;
use crate::room::Environment;
use crate::{EdgeCost, RoomId};
use serde::Serialize;

/// Counts describing a room graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MapMetrics {
    /// Total number of rooms.
    pub room_count: usize,
    /// Total number of exits.
    pub exit_count: usize,
    /// Exits that can never be traversed.
    pub disabled_exits: usize,
    /// Exits whose cost comes from a cost function.
    pub computed_exits: usize,
    /// Exits pointing at rooms that do not exist.
    pub dangling_exits: usize,
    /// Distinct uids in the index.
    pub uid_count: usize,
    /// Distinct tags in use.
    pub tag_count: usize,
    /// Rooms whose latest exit line says "Obvious paths:".
    pub outdoor_rooms: usize,
    /// Rooms whose latest exit line says "Obvious exits:".
    pub indoor_rooms: usize,
    /// Highest room id.
    pub max_id: Option<RoomId>,
    /// Average exits per room, in thousandths (integer only).
    pub exits_per_room_thousandths: u64,
}

impl MapMetrics {
    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph(graph: &RoomGraph) -> Self {
        let mut metrics = Self {
            room_count: graph.len(),
            uid_count: graph.uid_count(),
            tag_count: graph.tags().len(),
            max_id: graph.max_id(),
            ..Self::default()
        };

        for room in graph.rooms() {
            match room.environment() {
                Some(Environment::Outdoor) => metrics.outdoor_rooms += 1,
                Some(Environment::Indoor) => metrics.indoor_rooms += 1,
                None => {}
            }
            for (to, exit) in &room.exits {
                metrics.exit_count += 1;
                match exit.cost {
                    EdgeCost::Disabled => metrics.disabled_exits += 1,
                    EdgeCost::Computed(_) => metrics.computed_exits += 1,
                    EdgeCost::Fixed(_) => {}
                }
                if !graph.contains(*to) {
                    metrics.dangling_exits += 1;
                }
            }
        }

        metrics.exits_per_room_thousandths = if metrics.room_count > 0 {
            (metrics.exit_count as u64).saturating_mul(1000) / metrics.room_count as u64
        } else {
            0
        };
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Room;
    use crate::{Cost, Uid};

    #[test]
    fn empty_graph_has_zero_metrics() {
        assert_eq!(MapMetrics::from_graph(&RoomGraph::new()), MapMetrics::default());
    }

    #[test]
    fn counts_exits_by_kind() {
        let mut a = Room::new(RoomId(0));
        a.paths.push("Obvious paths: north.".to_string());
        a.add_fixed_exit(RoomId(1), "north", Cost(200));
        a.add_exit(RoomId(2), "go gate", EdgeCost::computed("closed"));
        a.add_exit(RoomId(9), "swim", EdgeCost::Disabled);
        a.add_tag("town");
        a.uid.push(Uid(1));

        let mut b = Room::new(RoomId(1));
        b.paths.push("Obvious exits: out.".to_string());
        b.add_tag("town");
        b.add_tag("inn");

        let metrics = MapMetrics::from_graph(&RoomGraph::from_rooms([a, b]));
        assert_eq!(metrics.room_count, 2);
        assert_eq!(metrics.exit_count, 3);
        assert_eq!(metrics.disabled_exits, 1);
        assert_eq!(metrics.computed_exits, 1);
        assert_eq!(metrics.dangling_exits, 2);
        assert_eq!(metrics.uid_count, 1);
        assert_eq!(metrics.tag_count, 2);
        assert_eq!(metrics.outdoor_rooms, 1);
        assert_eq!(metrics.indoor_rooms, 1);
        assert_eq!(metrics.max_id, Some(RoomId(1)));
        assert_eq!(metrics.exits_per_room_thousandths, 1500);
    }
}
