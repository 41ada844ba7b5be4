//! Proximity index: "who is near entity X, within radius r, same zone?"
//! (spec §4.9).
//!
//! Backed by a per-zone 3D grid with cell edge equal to the configured
//! default nearby radius. Updated on every location write; a query only
//! scans the cell the point falls in plus its 26 neighbors, so lookup cost
//! is proportional to local agent density rather than world population.

use std::collections::HashMap;

use npc_types::{AgentId, ZonePosition};

use crate::config::ProximityConfig;

/// Errors from proximity index operations.
#[derive(Debug, thiserror::Error)]
pub enum ProximityError {
    /// The configured nearby radius is not a positive, finite number.
    #[error("invalid proximity configuration: nearby_radius must be positive and finite, got {radius}")]
    InvalidRadius {
        /// The offending radius value.
        radius: f64,
    },
}

type CellCoord = (i64, i64, i64);

/// A per-zone 3D grid index over agent positions.
///
/// Agents with no reported location are simply absent from the index; they
/// never appear in a `nearby` query but are otherwise unaffected.
#[derive(Debug, Clone)]
pub struct ProximityIndex {
    cell_edge: f64,
    /// zone -> cell -> agents currently occupying that cell.
    grids: HashMap<String, HashMap<CellCoord, Vec<AgentId>>>,
    /// agent -> its last known (zone, cell, position), so updates and
    /// removals don't require a linear scan.
    placements: HashMap<AgentId, (String, CellCoord, ZonePosition)>,
}

impl ProximityIndex {
    /// Build an empty index using `config.nearby_radius` as the grid cell
    /// edge.
    ///
    /// # Errors
    ///
    /// Returns [`ProximityError::InvalidRadius`] if the configured radius is
    /// not positive and finite.
    pub fn new(config: &ProximityConfig) -> Result<Self, ProximityError> {
        if !config.nearby_radius.is_finite() || config.nearby_radius <= 0.0 {
            return Err(ProximityError::InvalidRadius {
                radius: config.nearby_radius,
            });
        }
        Ok(Self {
            cell_edge: config.nearby_radius,
            grids: HashMap::new(),
            placements: HashMap::new(),
        })
    }

    fn cell_of(&self, position: &ZonePosition) -> CellCoord {
        (
            float_to_cell(position.x, self.cell_edge),
            float_to_cell(position.y, self.cell_edge),
            float_to_cell(position.z, self.cell_edge),
        )
    }

    /// Record (or update) an agent's location. Called on every location
    /// write.
    pub fn update(&mut self, agent: AgentId, position: ZonePosition) {
        self.remove(agent);

        let cell = self.cell_of(&position);
        let zone_grid = self.grids.entry(position.zone.clone()).or_default();
        zone_grid.entry(cell).or_default().push(agent);
        self.placements.insert(agent, (position.zone.clone(), cell, position));
    }

    /// Remove an agent from the index (it reported no location, or left the
    /// simulation).
    pub fn remove(&mut self, agent: AgentId) {
        let Some((zone, cell, _)) = self.placements.remove(&agent) else {
            return;
        };
        if let Some(zone_grid) = self.grids.get_mut(&zone)
            && let Some(occupants) = zone_grid.get_mut(&cell)
        {
            occupants.retain(|&id| id != agent);
            if occupants.is_empty() {
                zone_grid.remove(&cell);
            }
        }
    }

    /// Agents in the same zone as `origin`, within `radius` of it, excluding
    /// `origin` itself. `origin` must currently be indexed (have a location);
    /// agents with no reported location can never be queried *from* and
    /// never appear *in* results.
    #[must_use]
    pub fn nearby(&self, origin: AgentId, radius: f64) -> Vec<AgentId> {
        let Some((zone, origin_cell, origin_pos)) = self.placements.get(&origin) else {
            return Vec::new();
        };
        let Some(zone_grid) = self.grids.get(zone) else {
            return Vec::new();
        };

        let span = cell_span(radius, self.cell_edge);
        let mut found = Vec::new();
        for dx in -span..=span {
            for dy in -span..=span {
                for dz in -span..=span {
                    let cell = (
                        origin_cell.0.saturating_add(dx),
                        origin_cell.1.saturating_add(dy),
                        origin_cell.2.saturating_add(dz),
                    );
                    let Some(occupants) = zone_grid.get(&cell) else {
                        continue;
                    };
                    for &candidate in occupants {
                        if candidate == origin {
                            continue;
                        }
                        if let Some((_, _, candidate_pos)) = self.placements.get(&candidate)
                            && distance(origin_pos, candidate_pos) <= radius
                        {
                            found.push(candidate);
                        }
                    }
                }
            }
        }
        found
    }

    /// Number of agents currently indexed (have a reported location).
    #[must_use]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether the index currently has no positioned agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

fn float_to_cell(value: f64, cell_edge: f64) -> i64 {
    let ratio = (value / cell_edge).floor();
    if !ratio.is_finite() {
        return 0;
    }
    // Saturating: a coordinate larger than i64 range means a cell id outside
    // the reachable grid, which is exactly what saturation expresses.
    if ratio >= (i64::MAX as f64) {
        i64::MAX
    } else if ratio <= (i64::MIN as f64) {
        i64::MIN
    } else {
        ratio as i64
    }
}

fn cell_span(radius: f64, cell_edge: f64) -> i64 {
    if cell_edge <= 0.0 {
        return 0;
    }
    let span = (radius / cell_edge).ceil();
    if !span.is_finite() || span < 0.0 {
        0
    } else if span >= (i64::MAX as f64) {
        i64::MAX
    } else {
        span as i64
    }
}

fn distance(a: &ZonePosition, b: &ZonePosition) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pos(zone: &str, x: f64, y: f64, z: f64) -> ZonePosition {
        ZonePosition {
            zone: zone.to_owned(),
            x,
            y,
            z,
        }
    }

    fn index() -> ProximityIndex {
        ProximityIndex::new(&ProximityConfig { nearby_radius: 10.0 }).unwrap()
    }

    #[test]
    fn nearby_finds_agents_within_radius_same_zone() {
        let mut idx = index();
        let a = AgentId::new();
        let b = AgentId::new();
        let c = AgentId::new();
        idx.update(a, pos("market", 0.0, 0.0, 0.0));
        idx.update(b, pos("market", 3.0, 0.0, 0.0));
        idx.update(c, pos("market", 50.0, 0.0, 0.0));

        let found = idx.nearby(a, 10.0);
        assert!(found.contains(&b));
        assert!(!found.contains(&c));
        assert!(!found.contains(&a));
    }

    #[test]
    fn nearby_excludes_other_zones() {
        let mut idx = index();
        let a = AgentId::new();
        let b = AgentId::new();
        idx.update(a, pos("market", 0.0, 0.0, 0.0));
        idx.update(b, pos("docks", 0.0, 0.0, 0.0));

        assert!(idx.nearby(a, 100.0).is_empty());
    }

    #[test]
    fn unindexed_origin_returns_empty() {
        let idx = index();
        assert!(idx.nearby(AgentId::new(), 10.0).is_empty());
    }

    #[test]
    fn update_moves_an_existing_agent() {
        let mut idx = index();
        let a = AgentId::new();
        let b = AgentId::new();
        idx.update(a, pos("market", 0.0, 0.0, 0.0));
        idx.update(b, pos("market", 3.0, 0.0, 0.0));
        assert!(idx.nearby(a, 10.0).contains(&b));

        idx.update(a, pos("market", 500.0, 0.0, 0.0));
        assert!(idx.nearby(a, 10.0).is_empty());
    }

    #[test]
    fn remove_drops_agent_from_future_queries() {
        let mut idx = index();
        let a = AgentId::new();
        let b = AgentId::new();
        idx.update(a, pos("market", 0.0, 0.0, 0.0));
        idx.update(b, pos("market", 1.0, 0.0, 0.0));
        idx.remove(b);
        assert!(idx.nearby(a, 10.0).is_empty());
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn invalid_radius_is_rejected() {
        assert!(ProximityIndex::new(&ProximityConfig { nearby_radius: 0.0 }).is_err());
        assert!(ProximityIndex::new(&ProximityConfig { nearby_radius: -1.0 }).is_err());
    }
}
