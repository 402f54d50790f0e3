//! Victory points, the longest chain, and the two competitive bonuses.
//!
//! Everything here is a pure recomputation over the current board and player
//! state. Nothing is tracked incrementally.

use crate::board::{Board, Edge, EdgeBuilding, EdgeId, PlayerId, VertexId};
use crate::player::Player;
use std::collections::{HashMap, HashSet};

/// Minimum chain length for the Longest Chain bonus
pub const LONGEST_CHAIN_MIN: u32 = 5;

/// Minimum gravity wells played for the Gravity Dominion bonus
pub const GRAVITY_DOMINION_MIN: u32 = 3;

/// Victory points for the two bonuses
const BONUS_POINTS: u32 = 2;

/// Total victory points for a player.
///
/// settlements + 2 x cities + secret victory cards + 2 per bonus held.
pub fn score(player: &Player) -> u32 {
    let mut vp = player.buildings.settlements + 2 * player.buildings.cities;
    vp += player.secret_victory_cards();
    if player.has_gravity_dominion {
        vp += BONUS_POINTS;
    }
    if player.has_longest_chain {
        vp += BONUS_POINTS;
    }
    vp
}

/// Decide who holds a competitive bonus.
///
/// `standings` pairs each player with their value. Only values of at least
/// `minimum` qualify. The current holder keeps the bonus while tied for the
/// maximum; otherwise a unique leader takes it and a tie leaves it unheld.
pub fn award_bonus(
    standings: &[(PlayerId, u32)],
    holder: Option<PlayerId>,
    minimum: u32,
) -> Option<PlayerId> {
    let best = standings.iter().map(|&(_, v)| v).max()?;
    if best < minimum {
        return None;
    }

    if let Some(h) = holder {
        if standings.iter().any(|&(p, v)| p == h && v == best) {
            return Some(h);
        }
    }

    let mut leaders = standings.iter().filter(|&&(_, v)| v == best);
    match (leaders.next(), leaders.next()) {
        (Some(&(p, _)), None) => Some(p),
        _ => None,
    }
}

/// Length of the player's longest chain of roads.
///
/// Roads may not be reused within one path but vertices may be revisited.
/// An opponent's building severs the chain at that vertex unless the path
/// starts there.
pub fn longest_chain(board: &Board, player: PlayerId) -> u32 {
    let mut adjacency: HashMap<&VertexId, Vec<&Edge>> = HashMap::new();
    for edge in board
        .edges
        .values()
        .filter(|e| e.road == EdgeBuilding::Road(player))
    {
        for vertex in &edge.vertex_ids {
            adjacency.entry(vertex).or_default().push(edge);
        }
    }

    let search = ChainSearch {
        board,
        player,
        adjacency,
    };

    let mut best = 0;
    for &start in search.adjacency.keys() {
        let mut used = HashSet::new();
        best = best.max(search.extend(start, start, &mut used));
    }
    best
}

struct ChainSearch<'a> {
    board: &'a Board,
    player: PlayerId,
    adjacency: HashMap<&'a VertexId, Vec<&'a Edge>>,
}

impl<'a> ChainSearch<'a> {
    fn blocks(&self, vertex: &VertexId) -> bool {
        self.board
            .building_at(vertex)
            .owner()
            .is_some_and(|owner| owner != self.player)
    }

    /// Longest continuation from `vertex` without reusing an edge in `used`
    fn extend(
        &self,
        vertex: &'a VertexId,
        start: &'a VertexId,
        used: &mut HashSet<&'a EdgeId>,
    ) -> u32 {
        if vertex != start && self.blocks(vertex) {
            return 0;
        }

        let mut best = 0;
        for &edge in self.adjacency.get(vertex).into_iter().flatten() {
            if used.contains(&edge.id) {
                continue;
            }
            let Some(next) = edge.other_end(vertex) else {
                continue;
            };
            used.insert(&edge.id);
            best = best.max(1 + self.extend(next, start, used));
            used.remove(&edge.id);
        }
        best
    }
}
