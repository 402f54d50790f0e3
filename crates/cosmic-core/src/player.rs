//! Player state and resource management.
//!
//! This module contains:
//! - Player struct with resources, action cards, and bonus flags
//! - ResourceHand for managing resource counts
//! - Action card types and the deck
//! - Build costs and the afford/deduct rules

use crate::board::{EdgeId, PlayerId, Resource, VertexId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Crimson,
    Azure,
    Amber,
    Violet,
}

impl PlayerColor {
    /// Get color for a seat index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 4 {
            0 => PlayerColor::Crimson,
            1 => PlayerColor::Azure,
            2 => PlayerColor::Amber,
            _ => PlayerColor::Violet,
        }
    }

    /// Hex color code for rendering
    pub fn hex_code(&self) -> u32 {
        match self {
            PlayerColor::Crimson => 0xEF4444,
            PlayerColor::Azure => 0x3B82F6,
            PlayerColor::Amber => 0xF59E0B,
            PlayerColor::Violet => 0x8B5CF6,
        }
    }
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub dark_matter: u32,
    pub gas: u32,
    pub dust: u32,
    pub energy: u32,
    pub stars: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(dark_matter: u32, gas: u32, dust: u32, energy: u32, stars: u32) -> Self {
        Self {
            dark_matter,
            gas,
            dust,
            energy,
            stars,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource units
    pub fn total(&self) -> u32 {
        self.dark_matter + self.gas + self.dust + self.energy + self.stars
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::DarkMatter => self.dark_matter,
            Resource::Gas => self.gas,
            Resource::Dust => self.dust,
            Resource::Energy => self.energy,
            Resource::Stars => self.stars,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::DarkMatter => &mut self.dark_matter,
            Resource::Gas => &mut self.gas,
            Resource::Dust => &mut self.dust,
            Resource::Energy => &mut self.energy,
            Resource::Stars => &mut self.stars,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot(resource) = count;
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for r in Resource::ALL {
            self.add(r, other.get(r));
        }
    }

    /// Every required amount is covered by this hand
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// The hand left after paying `cost`.
    ///
    /// Callers gate this behind [`ResourceHand::can_afford`]; it does not clamp.
    pub fn deduct(&self, cost: &ResourceHand) -> ResourceHand {
        debug_assert!(self.can_afford(cost), "deduct without a passing afford check");
        ResourceHand {
            dark_matter: self.dark_matter - cost.dark_matter,
            gas: self.gas - cost.gas,
            dust: self.dust - cost.dust,
            energy: self.energy - cost.energy,
            stars: self.stars - cost.stars,
        }
    }

    /// Pay a cost in place (same contract as `deduct`)
    pub fn subtract(&mut self, cost: &ResourceHand) {
        *self = self.deduct(cost);
    }

    /// One token per unit held, in resource order
    pub fn units(&self) -> Vec<Resource> {
        Resource::ALL
            .iter()
            .flat_map(|&r| std::iter::repeat(r).take(self.get(r) as usize))
            .collect()
    }

    /// Remove one uniformly random unit (black hole theft)
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let resource = *self.units().choose(rng)?;
        self.subtract(&ResourceHand::single(resource, 1));
        Some(resource)
    }

    /// Drop `count` random units and return what was dropped.
    ///
    /// The hand is flattened into unit tokens, shuffled, and the first
    /// `count` tokens are removed.
    pub fn discard_random<R: Rng>(&mut self, count: u32, rng: &mut R) -> ResourceHand {
        let mut tokens = self.units();
        tokens.shuffle(rng);

        let mut dropped = ResourceHand::new();
        for resource in tokens.into_iter().take(count as usize) {
            dropped.add(resource, 1);
        }
        self.subtract(&dropped);
        dropped
    }
}

/// Build costs
pub mod costs {
    use super::ResourceHand;

    /// Road: 1 dark matter, 1 gas
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Settlement: 1 dark matter, 1 gas, 1 dust, 1 energy
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// City upgrade: 2 dark matter, 1 gas, 1 dust, 1 stars
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(2, 1, 1, 0, 1)
    }

    /// Action card: 1 dust, 1 energy, 1 stars
    pub fn card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// Things a player can pay for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildKind {
    Road,
    Settlement,
    City,
    Card,
}

impl BuildKind {
    pub fn cost(&self) -> ResourceHand {
        match self {
            BuildKind::Road => costs::road(),
            BuildKind::Settlement => costs::settlement(),
            BuildKind::City => costs::city(),
            BuildKind::Card => costs::card(),
        }
    }
}

/// How many of each thing a player has built or bought
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCounts {
    pub roads: u32,
    pub settlements: u32,
    pub cities: u32,
    pub cards: u32,
}

/// Action card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    /// Move the black hole and steal, counts toward Gravity Dominion
    GravityWell,
    /// Build 2 roads for free
    RoadBuilder,
    /// Every opponent hands over all of one resource
    Monopoly,
    /// Take any 2 resources from the bank
    Invention,
    /// Worth 1 VP while held, never played
    SecretVictory,
}

/// A single card from the deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCard {
    pub id: u8,
    pub kind: CardKind,
    pub name: String,
    /// Turn number the card was bought on
    pub turn_bought: Option<u32>,
}

impl ActionCard {
    fn new(id: u8, kind: CardKind, name: &str) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            turn_bought: None,
        }
    }

    /// The 25-card deck, unshuffled
    pub fn standard_deck() -> Vec<ActionCard> {
        let mut deck = Vec::with_capacity(25);

        // 14 Gravity Wells
        for id in 1..=14 {
            deck.push(ActionCard::new(id, CardKind::GravityWell, "Gravity Well"));
        }

        // 2 of each progress card
        deck.push(ActionCard::new(15, CardKind::RoadBuilder, "Filament Builder"));
        deck.push(ActionCard::new(16, CardKind::RoadBuilder, "Filament Builder"));
        deck.push(ActionCard::new(17, CardKind::Monopoly, "Cosmic Monopoly"));
        deck.push(ActionCard::new(18, CardKind::Monopoly, "Cosmic Monopoly"));
        deck.push(ActionCard::new(19, CardKind::Invention, "Galactic Invention"));
        deck.push(ActionCard::new(20, CardKind::Invention, "Galactic Invention"));

        // 5 secret victory cards
        let secrets = [
            "Galactic Library",
            "Ancient Nebula",
            "Stellar Portal",
            "Lost Civilization",
            "Temporal Anomaly",
        ];
        for (i, name) in secrets.iter().enumerate() {
            deck.push(ActionCard::new(21 + i as u8, CardKind::SecretVictory, name));
        }

        deck
    }

    /// Secret victory cards only ever count toward score
    pub fn is_playable(&self) -> bool {
        !matches!(self.kind, CardKind::SecretVictory)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Seat index (0-3)
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    pub buildings: BuildingCounts,
    /// Cached score, refreshed after every action
    pub victory_points: u32,
    /// Settlements in placement order (occupancy lives on the board)
    pub placed_settlements: Vec<VertexId>,
    /// Roads in placement order
    pub placed_roads: Vec<EdgeId>,
    /// Unplayed action cards
    pub cards: Vec<ActionCard>,
    pub gravity_wells_played: u32,
    pub has_gravity_dominion: bool,
    pub has_longest_chain: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            resources: ResourceHand::new(),
            buildings: BuildingCounts::default(),
            victory_points: 0,
            placed_settlements: Vec::new(),
            placed_roads: Vec::new(),
            cards: Vec::new(),
            gravity_wells_played: 0,
            has_gravity_dominion: false,
            has_longest_chain: false,
        }
    }

    /// Pure afford check for a build kind
    pub fn can_afford(&self, kind: BuildKind) -> bool {
        self.resources.can_afford(&kind.cost())
    }

    /// Pay for a build kind (caller checked `can_afford`)
    pub fn pay(&mut self, kind: BuildKind) {
        self.resources = self.resources.deduct(&kind.cost());
    }

    /// Secret victory cards held
    pub fn secret_victory_cards(&self) -> u32 {
        self.cards
            .iter()
            .filter(|c| c.kind == CardKind::SecretVictory)
            .count() as u32
    }

    pub fn card(&self, card_id: u8) -> Option<&ActionCard> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    /// Remove a card from hand
    pub fn take_card(&mut self, card_id: u8) -> Option<ActionCard> {
        let pos = self.cards.iter().position(|c| c.id == card_id)?;
        Some(self.cards.remove(pos))
    }

    /// Cards that may be played on `turn` (not secret, not bought this turn)
    pub fn playable_cards(&self, turn: u32) -> impl Iterator<Item = &ActionCard> {
        self.cards
            .iter()
            .filter(move |c| c.is_playable() && c.turn_bought != Some(turn))
    }
}
