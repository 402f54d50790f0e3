//! Board topology: tiles, vertices, edges and ports.
//!
//! This module contains:
//! - Resource types (cosmic themed)
//! - Tile, vertex, edge and port records
//! - The topology generator that derives the vertex/edge graph from the tiles
//! - Board queries, placement validation and mutation helpers
//! - Per-roll production
//!
//! The graph is generated once per game. Afterwards only buildings, roads and
//! the black-hole flag change.

use crate::hex::{GridPos, LatticePoint, Point, TILE_COUNT};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

/// Player identifier (seat index, 0-3)
pub type PlayerId = u8;

/// Tile identifier (row-major index, 0-18)
pub type TileId = u8;

/// Number of distinct vertices on a standard board
pub const VERTEX_COUNT: usize = 54;

/// Number of distinct edges on a standard board
pub const EDGE_COUNT: usize = 72;

/// Number of trade ports on a standard board
pub const PORT_COUNT: usize = 9;

/// How far a port marker sits outside its edge, in pixels
const PORT_OFFSET: f64 = 30.0;

/// Resource types - cosmic themed!
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Resource {
    DarkMatter,
    Gas,
    Dust,
    Energy,
    Stars,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::DarkMatter,
        Resource::Gas,
        Resource::Dust,
        Resource::Energy,
        Resource::Stars,
    ];

    /// Display name for this resource
    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::DarkMatter => "Dark Matter",
            Resource::Gas => "Gas",
            Resource::Dust => "Dust",
            Resource::Energy => "Energy",
            Resource::Stars => "Stars",
        }
    }
}

/// What a tile produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    /// Empty space, never produces
    Void,
}

/// A hex tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    /// Production number (2-12, never 7); `None` for the void
    pub number: Option<u8>,
    pub has_black_hole: bool,
    pub position: GridPos,
}

impl Tile {
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            TileKind::Resource(r) => Some(r),
            TileKind::Void => None,
        }
    }

    /// Whether a roll of `roll` makes this tile produce
    pub fn produces_on(&self, roll: u8) -> bool {
        self.number == Some(roll) && !self.has_black_hole && self.resource().is_some()
    }
}

/// Building on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VertexBuilding {
    #[default]
    Empty,
    Settlement(PlayerId),
    City(PlayerId),
}

impl VertexBuilding {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => Some(*p),
        }
    }

    pub fn is_occupied(&self) -> bool {
        !matches!(self, VertexBuilding::Empty)
    }

    /// Units of a resource this building collects per production
    pub fn production(&self) -> u32 {
        match self {
            VertexBuilding::Empty => 0,
            VertexBuilding::Settlement(_) => 1,
            VertexBuilding::City(_) => 2,
        }
    }
}

/// Road on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EdgeBuilding {
    #[default]
    Empty,
    Road(PlayerId),
}

impl EdgeBuilding {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            EdgeBuilding::Empty => None,
            EdgeBuilding::Road(p) => Some(*p),
        }
    }
}

/// Vertex id derived from the rounded pixel position (`v-<x>-<y>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub String);

impl VertexId {
    fn at(position: Point) -> Self {
        let (x, y) = position.rounded();
        VertexId(format!("v-{}-{}", x, y))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        VertexId(s.to_string())
    }
}

/// Edge id derived from the rounded midpoint (`e-<x>-<y>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    fn at(position: Point) -> Self {
        let (x, y) = position.rounded();
        EdgeId(format!("e-{}-{}", x, y))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

/// A settlement location where up to three tiles meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    /// Tiles sharing this corner (1 to 3)
    pub tile_ids: Vec<TileId>,
    pub lattice: LatticePoint,
    pub position: Point,
    pub building: VertexBuilding,
}

/// A road location between two vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    /// Tiles sharing this side; a single tile means a border edge
    pub tile_ids: Vec<TileId>,
    pub vertex_ids: [VertexId; 2],
    pub position: Point,
    pub road: EdgeBuilding,
}

impl Edge {
    pub fn is_border(&self) -> bool {
        self.tile_ids.len() == 1
    }

    pub fn touches(&self, vertex: &VertexId) -> bool {
        self.vertex_ids.contains(vertex)
    }

    /// The endpoint opposite `vertex`
    pub fn other_end(&self, vertex: &VertexId) -> Option<&VertexId> {
        match &self.vertex_ids {
            [a, b] if a == vertex => Some(b),
            [a, b] if b == vertex => Some(a),
            _ => None,
        }
    }
}

/// Port types for bank trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specialized(Resource),
}

impl PortKind {
    /// Units given per unit received
    pub fn rate(&self) -> u32 {
        match self {
            PortKind::Generic => 3,
            PortKind::Specialized(_) => 2,
        }
    }

    /// The standard mix: 4 generic plus one specialized port per resource
    pub fn standard_set() -> Vec<PortKind> {
        let mut kinds = vec![PortKind::Generic; 4];
        kinds.extend(Resource::ALL.iter().map(|&r| PortKind::Specialized(r)));
        kinds
    }
}

/// A trade port on a border edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: u8,
    pub kind: PortKind,
    pub edge_id: EdgeId,
    /// The two vertices that grant access to this port
    pub vertex_ids: [VertexId; 2],
    pub position: Point,
    /// Outward-facing angle in degrees, for rendering
    pub rotation: f64,
}

/// Violations found while building the board graph.
///
/// These indicate a bug in the geometry rather than a user error, and abort
/// game creation.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum TopologyError {
    #[error("Edge {edge} has an endpoint that matches no vertex")]
    UnresolvedEndpoint { edge: String },

    #[error("Vertex {vertex} belongs to {count} tiles")]
    TileMembership { vertex: String, count: usize },

    #[error("Expected {expected} {what}, generated {found}")]
    UnexpectedCount {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Tile {tile} sits outside the board at row {row}, column {col}")]
    InvalidGridPosition { tile: TileId, row: u8, col: u8 },

    #[error("Expected exactly one black hole, found {0}")]
    BlackHoleCount(usize),
}

fn expect_count(what: &str, expected: usize, found: usize) -> Result<(), TopologyError> {
    if expected == found {
        Ok(())
    } else {
        Err(TopologyError::UnexpectedCount {
            what: what.to_string(),
            expected,
            found,
        })
    }
}

// ==================== Topology Generation ====================

/// Shuffle the tile kinds and numbers and lay them out in rows of 3-4-5-4-3.
///
/// The void tile starts with the black hole and has no number; every other
/// tile draws the next number from the shuffled list.
pub fn generate_tiles<R: Rng>(rng: &mut R) -> Vec<Tile> {
    let mut kinds = Vec::with_capacity(TILE_COUNT);
    let distribution = [
        (Resource::DarkMatter, 6),
        (Resource::Gas, 4),
        (Resource::Dust, 3),
        (Resource::Energy, 3),
        (Resource::Stars, 2),
    ];
    for (resource, count) in distribution {
        kinds.extend(std::iter::repeat(TileKind::Resource(resource)).take(count));
    }
    kinds.push(TileKind::Void);
    kinds.shuffle(rng);

    let mut numbers: Vec<u8> = vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];
    numbers.shuffle(rng);
    let mut numbers = numbers.into_iter();

    GridPos::all()
        .into_iter()
        .zip(kinds)
        .enumerate()
        .map(|(i, (position, kind))| {
            let is_void = kind == TileKind::Void;
            Tile {
                id: i as TileId,
                kind,
                number: if is_void { None } else { numbers.next() },
                has_black_hole: is_void,
                position,
            }
        })
        .collect()
}

/// Derive the vertex set from the tile corners.
///
/// Corners of neighbouring tiles that coincide on the lattice collapse into a
/// single vertex whose tile membership accumulates.
pub fn generate_vertices(tiles: &[Tile]) -> Result<Vec<Vertex>, TopologyError> {
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut by_lattice: HashMap<LatticePoint, usize> = HashMap::new();

    for tile in tiles {
        if !tile.position.is_valid() {
            return Err(TopologyError::InvalidGridPosition {
                tile: tile.id,
                row: tile.position.row,
                col: tile.position.col,
            });
        }

        for corner in tile.position.corners() {
            match by_lattice.get(&corner) {
                Some(&index) => {
                    let vertex = &mut vertices[index];
                    if !vertex.tile_ids.contains(&tile.id) {
                        vertex.tile_ids.push(tile.id);
                    }
                }
                None => {
                    let position = corner.to_point();
                    by_lattice.insert(corner, vertices.len());
                    vertices.push(Vertex {
                        id: VertexId::at(position),
                        tile_ids: vec![tile.id],
                        lattice: corner,
                        position,
                        building: VertexBuilding::Empty,
                    });
                }
            }
        }
    }

    for vertex in &vertices {
        if !(1..=3).contains(&vertex.tile_ids.len()) {
            return Err(TopologyError::TileMembership {
                vertex: vertex.id.to_string(),
                count: vertex.tile_ids.len(),
            });
        }
    }

    Ok(vertices)
}

/// Derive the edge set from the tile sides.
///
/// Both endpoint ids are resolved by looking the corner up in `vertices`; an
/// edge whose corner is missing there is an error, never a half-built edge.
pub fn generate_edges(tiles: &[Tile], vertices: &[Vertex]) -> Result<Vec<Edge>, TopologyError> {
    let vertex_at: HashMap<LatticePoint, &Vertex> =
        vertices.iter().map(|v| (v.lattice, v)).collect();

    let mut edges: Vec<Edge> = Vec::new();
    let mut by_key: HashMap<LatticePoint, usize> = HashMap::new();

    for tile in tiles {
        for (a, b) in tile.position.sides() {
            let key = LatticePoint::side_key(a, b);
            if let Some(&index) = by_key.get(&key) {
                let edge = &mut edges[index];
                if !edge.tile_ids.contains(&tile.id) {
                    edge.tile_ids.push(tile.id);
                }
                continue;
            }

            let position = Point::midpoint(a.to_point(), b.to_point());
            let id = EdgeId::at(position);
            let (start, end) = match (vertex_at.get(&a), vertex_at.get(&b)) {
                (Some(start), Some(end)) => (start, end),
                _ => return Err(TopologyError::UnresolvedEndpoint { edge: id.0 }),
            };

            by_key.insert(key, edges.len());
            edges.push(Edge {
                id,
                tile_ids: vec![tile.id],
                vertex_ids: [start.id.clone(), end.id.clone()],
                position,
                road: EdgeBuilding::Empty,
            });
        }
    }

    Ok(edges)
}

/// Place the nine trade ports evenly around the border.
///
/// Border edges are sorted by angle around their common centroid and every
/// `n / 9`-th one (starting half a stride in) receives a port from the
/// shuffled standard set.
pub fn generate_ports<R: Rng>(
    edges: &[Edge],
    vertices: &[Vertex],
    rng: &mut R,
) -> Result<Vec<Port>, TopologyError> {
    let mut border: Vec<&Edge> = edges.iter().filter(|e| e.is_border()).collect();
    if border.len() < PORT_COUNT {
        return Err(TopologyError::UnexpectedCount {
            what: "border edges".to_string(),
            expected: PORT_COUNT,
            found: border.len(),
        });
    }

    let n = border.len() as f64;
    let center = Point::new(
        border.iter().map(|e| e.position.x).sum::<f64>() / n,
        border.iter().map(|e| e.position.y).sum::<f64>() / n,
    );
    let angle = |p: &Point| (p.y - center.y).atan2(p.x - center.x);
    border.sort_by(|a, b| angle(&a.position).total_cmp(&angle(&b.position)));

    let position_of: HashMap<&VertexId, Point> =
        vertices.iter().map(|v| (&v.id, v.position)).collect();

    let mut kinds = PortKind::standard_set();
    kinds.shuffle(rng);

    let stride = border.len() / PORT_COUNT;
    let offset = stride / 2;

    let mut ports = Vec::with_capacity(PORT_COUNT);
    for (i, kind) in kinds.into_iter().enumerate() {
        let edge = border[offset + i * stride];
        let (a, b) = match (
            position_of.get(&edge.vertex_ids[0]),
            position_of.get(&edge.vertex_ids[1]),
        ) {
            (Some(a), Some(b)) => (*a, *b),
            _ => {
                return Err(TopologyError::UnresolvedEndpoint {
                    edge: edge.id.to_string(),
                })
            }
        };

        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let to_center = (center.x - edge.position.x, center.y - edge.position.y);
        let (mut nx, mut ny) = (-dy, dx);
        if nx * to_center.0 + ny * to_center.1 >= 0.0 {
            nx = dy;
            ny = -dx;
        }
        let len = (nx * nx + ny * ny).sqrt().max(f64::EPSILON);
        let (nx, ny) = (nx / len, ny / len);

        ports.push(Port {
            id: i as u8,
            kind,
            edge_id: edge.id.clone(),
            vertex_ids: edge.vertex_ids.clone(),
            position: Point::new(
                edge.position.x + nx * PORT_OFFSET,
                edge.position.y + ny * PORT_OFFSET,
            ),
            rotation: ny.atan2(nx).to_degrees(),
        });
    }

    Ok(ports)
}

/// The game board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub tiles: Vec<Tile>,
    pub vertices: BTreeMap<VertexId, Vertex>,
    pub edges: BTreeMap<EdgeId, Edge>,
    pub ports: Vec<Port>,
    /// Tile currently holding the black hole
    pub black_hole: TileId,
}

impl Board {
    /// Generate a fresh random board, checking every topology invariant
    pub fn generate<R: Rng>(rng: &mut R) -> Result<Self, TopologyError> {
        let tiles = generate_tiles(rng);
        Self::from_tiles(tiles, rng)
    }

    /// Build the vertex/edge/port graph for an existing tile layout
    pub fn from_tiles<R: Rng>(tiles: Vec<Tile>, rng: &mut R) -> Result<Self, TopologyError> {
        expect_count("tiles", TILE_COUNT, tiles.len())?;

        let holes: Vec<&Tile> = tiles.iter().filter(|t| t.has_black_hole).collect();
        if holes.len() != 1 {
            return Err(TopologyError::BlackHoleCount(holes.len()));
        }
        let black_hole = holes[0].id;

        let vertices = generate_vertices(&tiles)?;
        expect_count("vertices", VERTEX_COUNT, vertices.len())?;

        let edges = generate_edges(&tiles, &vertices)?;
        expect_count("edges", EDGE_COUNT, edges.len())?;

        let ports = generate_ports(&edges, &vertices, rng)?;
        expect_count("ports", PORT_COUNT, ports.len())?;

        Ok(Self {
            tiles,
            vertices: vertices.into_iter().map(|v| (v.id.clone(), v)).collect(),
            edges: edges.into_iter().map(|e| (e.id.clone(), e)).collect(),
            ports,
            black_hole,
        })
    }

    // ==================== Query Methods ====================

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn vertex(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Building on a vertex (`Empty` for unknown ids)
    pub fn building_at(&self, id: &VertexId) -> VertexBuilding {
        self.vertices
            .get(id)
            .map(|v| v.building)
            .unwrap_or_default()
    }

    /// Edges touching a vertex
    pub fn edges_at(&self, vertex: &VertexId) -> Vec<&Edge> {
        self.edges.values().filter(|e| e.touches(vertex)).collect()
    }

    /// Vertices one edge away from `vertex`
    pub fn neighbors(&self, vertex: &VertexId) -> Vec<&VertexId> {
        self.edges_at(vertex)
            .into_iter()
            .filter_map(|e| e.other_end(vertex))
            .collect()
    }

    /// Vertices on the corners of a tile
    pub fn vertices_of_tile(&self, tile: TileId) -> impl Iterator<Item = &Vertex> {
        self.vertices
            .values()
            .filter(move |v| v.tile_ids.contains(&tile))
    }

    /// Tiles sharing a vertex
    pub fn tiles_at_vertex(&self, vertex: &VertexId) -> Vec<&Tile> {
        match self.vertices.get(vertex) {
            Some(v) => v.tile_ids.iter().filter_map(|&id| self.tile(id)).collect(),
            None => Vec::new(),
        }
    }

    /// Players with a building on a tile's corners
    pub fn players_adjacent_to_tile(&self, tile: TileId) -> BTreeSet<PlayerId> {
        self.vertices_of_tile(tile)
            .filter_map(|v| v.building.owner())
            .collect()
    }

    /// Ports a player can use (has a building on one of the access vertices)
    pub fn player_ports(&self, player: PlayerId) -> Vec<PortKind> {
        self.ports
            .iter()
            .filter(|port| {
                port.vertex_ids
                    .iter()
                    .any(|v| self.building_at(v).owner() == Some(player))
            })
            .map(|port| port.kind)
            .collect()
    }

    /// Bank trade rate for giving `resource`: the best of 4:1 and every accessible port
    pub fn bank_rate(&self, player: PlayerId, resource: Resource) -> u32 {
        self.player_ports(player)
            .into_iter()
            .filter(|kind| match kind {
                PortKind::Generic => true,
                PortKind::Specialized(r) => *r == resource,
            })
            .map(|kind| kind.rate())
            .fold(4, u32::min)
    }

    // ==================== Validation Methods ====================

    /// Check the distance rule: no neighbouring vertex may hold a building
    pub fn satisfies_distance_rule(&self, vertex: &VertexId) -> bool {
        self.neighbors(vertex)
            .into_iter()
            .all(|n| !self.building_at(n).is_occupied())
    }

    /// Whether the player has a road touching this vertex
    pub fn touches_own_road(&self, vertex: &VertexId, player: PlayerId) -> bool {
        self.edges_at(vertex)
            .iter()
            .any(|e| e.road == EdgeBuilding::Road(player))
    }

    /// Check if an edge joins the player's network: an endpoint holds their
    /// building or touches another of their roads
    pub fn is_connected_to_network(&self, edge: &EdgeId, player: PlayerId) -> bool {
        let Some(edge) = self.edges.get(edge) else {
            return false;
        };
        edge.vertex_ids.iter().any(|endpoint| {
            self.building_at(endpoint).owner() == Some(player)
                || self
                    .edges_at(endpoint)
                    .iter()
                    .any(|e| e.id != edge.id && e.road == EdgeBuilding::Road(player))
        })
    }

    /// Get valid settlement spots; `require_road` adds the road connection rule
    pub fn valid_settlement_spots(&self, player: PlayerId, require_road: bool) -> Vec<VertexId> {
        self.vertices
            .values()
            .filter(|v| {
                !v.building.is_occupied()
                    && self.satisfies_distance_rule(&v.id)
                    && (!require_road || self.touches_own_road(&v.id, player))
            })
            .map(|v| v.id.clone())
            .collect()
    }

    /// Get valid road spots for a player outside of setup
    pub fn valid_road_spots(&self, player: PlayerId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| {
                e.road == EdgeBuilding::Empty && self.is_connected_to_network(&e.id, player)
            })
            .map(|e| e.id.clone())
            .collect()
    }

    /// Get the player's settlements that can become cities
    pub fn valid_city_spots(&self, player: PlayerId) -> Vec<VertexId> {
        self.vertices
            .values()
            .filter(|v| v.building == VertexBuilding::Settlement(player))
            .map(|v| v.id.clone())
            .collect()
    }

    // ==================== Mutation Methods ====================

    /// Place a settlement (assumes validation already done)
    pub fn place_settlement(&mut self, vertex: &VertexId, player: PlayerId) {
        if let Some(v) = self.vertices.get_mut(vertex) {
            v.building = VertexBuilding::Settlement(player);
        }
    }

    /// Upgrade a settlement to a city in place
    pub fn upgrade_to_city(&mut self, vertex: &VertexId, player: PlayerId) {
        if let Some(v) = self.vertices.get_mut(vertex) {
            v.building = VertexBuilding::City(player);
        }
    }

    /// Place a road
    pub fn place_road(&mut self, edge: &EdgeId, player: PlayerId) {
        if let Some(e) = self.edges.get_mut(edge) {
            e.road = EdgeBuilding::Road(player);
        }
    }

    /// Remove whatever stands on a vertex (setup undo only)
    pub fn clear_vertex(&mut self, vertex: &VertexId) {
        if let Some(v) = self.vertices.get_mut(vertex) {
            v.building = VertexBuilding::Empty;
        }
    }

    /// Move the black hole, keeping exactly one tile flagged
    pub fn move_black_hole(&mut self, to: TileId) {
        for tile in &mut self.tiles {
            tile.has_black_hole = tile.id == to;
        }
        self.black_hole = to;
    }

    // ==================== Resource Distribution ====================

    /// Resources produced by a dice total, as `(player, resource, amount)`.
    ///
    /// Every building on a producing tile collects independently; the tile
    /// holding the black hole produces nothing.
    pub fn production(&self, roll: u8) -> Vec<(PlayerId, Resource, u32)> {
        let mut totals: BTreeMap<(PlayerId, Resource), u32> = BTreeMap::new();

        for tile in self.tiles.iter().filter(|t| t.produces_on(roll)) {
            let Some(resource) = tile.resource() else {
                continue;
            };
            for vertex in self.vertices_of_tile(tile.id) {
                if let Some(owner) = vertex.building.owner() {
                    *totals.entry((owner, resource)).or_insert(0) += vertex.building.production();
                }
            }
        }

        totals
            .into_iter()
            .map(|((player, resource), amount)| (player, resource, amount))
            .collect()
    }
}
