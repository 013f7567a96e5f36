//! # CLI Command Implementations
//!
//! Every command prints plain text, or pretty JSON under `--json-mode`.

use cartograph_core::{
    Cost, EdgeCost, MapFormat, MapStore, NavError, Room, RoomId, SaveOutcome,
};
use serde_json::{Value, json};

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// JSON view of a room, keys in map-file order.
#[must_use]
pub fn room_json(room: &Room) -> Value {
    let exits: Vec<Value> = room
        .exits
        .iter()
        .map(|(to, exit)| {
            let cost = match &exit.cost {
                EdgeCost::Disabled => Value::Null,
                EdgeCost::Fixed(cost) => json!(cost.to_string()),
                EdgeCost::Computed(name) => json!(name.as_str()),
            };
            json!({ "to": to.0, "command": exit.command, "cost": cost })
        })
        .collect();

    json!({
        "id": room.id.0,
        "title": room.title,
        "description": room.description,
        "paths": room.paths,
        "location": room.location,
        "uid": room.uid.iter().map(|u| u.0).collect::<Vec<_>>(),
        "tags": room.tags,
        "exits": exits,
    })
}

/// Parse a comma-separated list of room ids.
pub fn parse_ids(list: &str) -> Result<Vec<RoomId>, NavError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map(RoomId)
                .map_err(|e| NavError::Config(format!("Invalid room id '{}': {}", s, e)))
        })
        .collect()
}

fn require_room(store: &MapStore, id: RoomId) -> Result<Room, NavError> {
    store.room(id)?.ok_or(NavError::RoomNotFound(id))
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show map summary counts.
pub fn cmd_status(store: &MapStore, json_mode: bool) -> Result<(), NavError> {
    let metrics = store.metrics()?;
    let latest = store.directory().latest()?;

    if json_mode {
        print_json(&json!({
            "map_dir": store.directory().root().to_string_lossy(),
            "profile": store.profile().name(),
            "file": latest.as_ref().map(|f| f.path.to_string_lossy().into_owned()),
            "metrics": metrics,
        }));
        return Ok(());
    }

    println!("Cartograph Map Status");
    println!("=====================");
    println!("Directory: {}", store.directory().root().display());
    println!("Profile:   {}", store.profile().name());
    if let Some(file) = &latest {
        println!("File:      {} ({})", file.path.display(), file.format);
    }
    println!();
    println!("Rooms:          {}", metrics.room_count);
    println!("Exits:          {}", metrics.exit_count);
    println!("  disabled:     {}", metrics.disabled_exits);
    println!("  computed:     {}", metrics.computed_exits);
    println!("  dangling:     {}", metrics.dangling_exits);
    println!("Uids:           {}", metrics.uid_count);
    println!("Tags:           {}", metrics.tag_count);
    println!("Outdoor/Indoor: {}/{}", metrics.outdoor_rooms, metrics.indoor_rooms);
    if let Some(max) = metrics.max_id {
        println!("Highest id:     {}", max);
    }

    Ok(())
}

// =============================================================================
// ROOM COMMAND
// =============================================================================

/// Show one room.
pub fn cmd_room(store: &MapStore, json_mode: bool, id: u32) -> Result<(), NavError> {
    let room = require_room(store, RoomId(id))?;

    if json_mode {
        print_json(&room_json(&room));
        return Ok(());
    }

    println!("Room #{}", room.id);
    for title in &room.title {
        println!("  {}", title);
    }
    if let Some(description) = room.description.first() {
        println!("  {}", description);
    }
    if let Some(location) = &room.location {
        println!("  Location: {}", location);
    }
    if !room.uid.is_empty() {
        let uids: Vec<String> = room.uid.iter().map(ToString::to_string).collect();
        println!("  Uid:      {}", uids.join(", "));
    }
    if !room.tags.is_empty() {
        println!("  Tags:     {}", room.tags.join(", "));
    }
    for (to, exit) in &room.exits {
        let cost = match &exit.cost {
            EdgeCost::Disabled => "disabled".to_string(),
            EdgeCost::Fixed(cost) => cost.to_string(),
            EdgeCost::Computed(name) => format!("<{}>", name.as_str()),
        };
        println!("  -> #{:<8} {:<24} {}", to, exit.command, cost);
    }

    Ok(())
}

// =============================================================================
// PATH COMMAND
// =============================================================================

/// Shortest route between two rooms.
pub fn cmd_path(store: &MapStore, json_mode: bool, from: u32, to: u32) -> Result<(), NavError> {
    let (from, to) = (RoomId(from), RoomId(to));
    require_room(store, from)?;
    require_room(store, to)?;

    let Some(hops) = store.path_to(from, to)? else {
        if json_mode {
            print_json(&json!({ "from": from.0, "to": to.0, "reachable": false }));
        } else {
            println!("No route from #{} to #{}", from, to);
        }
        return Ok(());
    };

    let commands = store
        .with_graph(|graph| graph.commands_along(from, &hops))?
        .unwrap_or_default();
    let mut route = Vec::with_capacity(hops.len() + 1);
    route.push(from);
    route.extend_from_slice(&hops);
    let time = store.estimate_time(&route)?;

    if json_mode {
        print_json(&json!({
            "from": from.0,
            "to": to.0,
            "reachable": true,
            "hops": hops.iter().map(|id| id.0).collect::<Vec<_>>(),
            "commands": commands,
            "estimated_millis": time.0,
        }));
        return Ok(());
    }

    if hops.is_empty() {
        println!("Already at #{}", to);
        return Ok(());
    }
    println!("Route #{} -> #{} ({} hops, ~{})", from, to, hops.len(), time);
    for (hop, command) in hops.iter().zip(&commands) {
        println!("  {:<24} #{}", command, hop);
    }

    Ok(())
}

// =============================================================================
// NEAREST COMMAND
// =============================================================================

/// Closest reachable room carrying a tag or among a list of ids.
pub fn cmd_nearest(
    store: &MapStore,
    json_mode: bool,
    from: u32,
    tag: Option<&str>,
    ids: Option<&str>,
    all: bool,
) -> Result<(), NavError> {
    let from = RoomId(from);
    require_room(store, from)?;

    let found: Vec<RoomId> = match (tag, ids) {
        (Some(tag), _) if all => store.find_all_nearest_by_tag(from, tag)?,
        (Some(tag), _) => store.find_nearest_by_tag(from, tag)?.into_iter().collect(),
        (None, Some(list)) => {
            let targets = parse_ids(list)?;
            store.find_nearest(from, &targets)?.into_iter().collect()
        }
        (None, None) => {
            return Err(NavError::Config(
                "nearest needs --tag or --ids".to_string(),
            ));
        }
    };

    let paths = store.dijkstra(from, None)?;
    let distance = |id: &RoomId| paths.distance(*id).unwrap_or(Cost::ZERO);

    if json_mode {
        let rooms: Vec<Value> = found
            .iter()
            .map(|id| json!({ "id": id.0, "distance_millis": distance(id).0 }))
            .collect();
        print_json(&json!({ "from": from.0, "found": rooms }));
        return Ok(());
    }

    if found.is_empty() {
        println!("Nothing reachable from #{}", from);
        return Ok(());
    }
    for id in &found {
        println!("#{:<8} {}", id, distance(id));
    }

    Ok(())
}

// =============================================================================
// TAGS COMMAND
// =============================================================================

/// List every tag in the map.
pub fn cmd_tags(store: &MapStore, json_mode: bool) -> Result<(), NavError> {
    let tags = store.tags()?;

    if json_mode {
        print_json(&json!({ "tags": tags }));
        return Ok(());
    }

    for tag in &tags {
        println!("{}", tag);
    }
    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Save the latest map in `to`.
pub fn cmd_convert(store: &MapStore, json_mode: bool, to: MapFormat) -> Result<(), NavError> {
    store.load()?;
    let outcome = store.save_as(to)?;

    let path = match &outcome {
        SaveOutcome::Saved(path) => Some(path.to_string_lossy().into_owned()),
        SaveOutcome::Reloaded => None,
    };

    if json_mode {
        print_json(&json!({ "format": to.to_string(), "saved": path }));
        return Ok(());
    }

    match path {
        Some(path) => println!("Wrote {}", path),
        None => println!("Map failed its integrity check; reloaded from disk, nothing written"),
    }
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Problems found by `cmd_check`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Integrity violation, if any.
    pub integrity: Option<String>,
    /// `(from, to)` exits pointing at rooms not in the map.
    pub dangling: Vec<(RoomId, RoomId)>,
    /// `(from, to, name)` exits naming unregistered cost functions.
    pub unknown_costs: Vec<(RoomId, RoomId, String)>,
}

impl CheckReport {
    /// Check if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.integrity.is_none() && self.dangling.is_empty() && self.unknown_costs.is_empty()
    }
}

/// Build the check report for the loaded map.
pub fn check_map(store: &MapStore) -> Result<CheckReport, NavError> {
    let costs = store.costs();
    store.with_graph(|graph| {
        let mut report = CheckReport {
            integrity: graph.check_integrity().err().map(|v| v.to_string()),
            ..CheckReport::default()
        };
        for room in graph.rooms() {
            for (to, exit) in &room.exits {
                if !graph.contains(*to) {
                    report.dangling.push((room.id, *to));
                }
                if let EdgeCost::Computed(name) = &exit.cost {
                    if !costs.contains(name.as_str()) {
                        report
                            .unknown_costs
                            .push((room.id, *to, name.as_str().to_string()));
                    }
                }
            }
        }
        report
    })
}

/// Check map integrity and report broken edges.
pub fn cmd_check(store: &MapStore, json_mode: bool) -> Result<(), NavError> {
    let report = check_map(store)?;

    if json_mode {
        print_json(&json!({
            "clean": report.is_clean(),
            "integrity": report.integrity,
            "dangling": report.dangling.iter().map(|(f, t)| json!([f.0, t.0])).collect::<Vec<_>>(),
            "unknown_costs": report
                .unknown_costs
                .iter()
                .map(|(f, t, n)| json!({ "from": f.0, "to": t.0, "name": n }))
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    if report.is_clean() {
        println!("Map OK");
        return Ok(());
    }
    if let Some(violation) = &report.integrity {
        println!("Integrity: {}", violation);
    }
    for (from, to) in &report.dangling {
        println!("Dangling exit #{} -> #{}", from, to);
    }
    for (from, to, name) in &report.unknown_costs {
        println!("Unknown cost function '{}' on #{} -> #{}", name, from, to);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_trims_and_skips_empty() {
        assert_eq!(
            parse_ids(" 3, 1,,7 ").expect("ids"),
            vec![RoomId(3), RoomId(1), RoomId(7)]
        );
        assert!(matches!(parse_ids("1,x"), Err(NavError::Config(_))));
    }

    #[test]
    fn room_json_disabled_cost_is_null() {
        let mut room = Room::new(RoomId(4));
        room.add_exit(RoomId(5), "go gate", EdgeCost::Disabled);
        room.add_fixed_exit(RoomId(6), "north", Cost(200));
        let value = room_json(&room);
        assert_eq!(value["id"], 4);
        assert_eq!(value["exits"][0]["cost"], Value::Null);
        assert_eq!(value["exits"][1]["cost"], "0.200s");
    }
}
