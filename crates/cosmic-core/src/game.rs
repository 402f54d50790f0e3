//! Core game state machine.
//!
//! `GameState` is advanced by a pure reducer: every action runs against a
//! clone of the state, then one post-action pass (stale offers, bonuses,
//! scores, win check) runs, and only a fully successful result is committed.
//! A rejected action leaves the state untouched.

use crate::actions::{CardChoice, GameAction, GameEvent, TradeOffer};
use crate::board::{
    Board, EdgeBuilding, EdgeId, PlayerId, Resource, TileId, TopologyError, VertexBuilding,
    VertexId,
};
use crate::config::{GameConfig, RuleOptions};
use crate::player::{ActionCard, BuildKind, CardKind, Player, ResourceHand};
use crate::scoring::{self, GRAVITY_DOMINION_MIN, LONGEST_CHAIN_MIN};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Players holding more than this many units discard half on a 7
const DISCARD_THRESHOLD: u32 = 7;

/// Free roads granted by a road builder card
const FREE_ROADS: u8 = 2;

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Initial placement phase
    Setup {
        /// Which round of setup (1 or 2)
        round: u8,
        /// What we're currently placing
        placing: SetupPlacing,
    },

    /// Start of a turn, waiting for the dice
    Playing,

    /// After the roll - build, trade, play cards, end turn
    Building,

    /// Game is over
    Ended { winner: PlayerId },
}

/// What we're placing during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPlacing {
    Settlement,
    Road,
}

/// What the board is currently waiting for.
///
/// Exactly one mode is active at a time. The resolution modes are blocking:
/// only the command that resolves them is accepted until they are done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    PlacingSettlement,
    PlacingRoad,
    UpgradingToCity,
    /// A 7 or a gravity well: pick the black hole's new tile
    MovingBlackHole,
    /// Pick who to steal from
    SelectingVictim {
        tile: TileId,
        candidates: Vec<PlayerId>,
    },
    SelectingMonopolyResource,
    SelectingInventionResources,
    /// Road builder in progress
    BuildingFreeRoads { remaining: u8 },
}

impl InteractionMode {
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            InteractionMode::MovingBlackHole
                | InteractionMode::SelectingVictim { .. }
                | InteractionMode::SelectingMonopolyResource
                | InteractionMode::SelectingInventionResources
        )
    }

    /// Whether `action` resolves this (blocking) mode
    fn accepts(&self, action: &GameAction) -> bool {
        matches!(
            (self, action),
            (InteractionMode::MovingBlackHole, GameAction::MoveBlackHole(_))
                | (InteractionMode::SelectingVictim { .. }, GameAction::StealFrom(_))
                | (
                    InteractionMode::SelectingMonopolyResource,
                    GameAction::ChooseMonopolyResource(_)
                )
                | (
                    InteractionMode::SelectingInventionResources,
                    GameAction::ChooseInventionResources(_, _)
                )
        )
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Finish the current selection first")]
    InvalidMode,

    #[error("No such player")]
    InvalidPlayer,

    #[error("Unknown vertex {0}")]
    UnknownVertex(String),

    #[error("Unknown edge {0}")]
    UnknownEdge(String),

    #[error("Unknown tile {0}")]
    UnknownTile(TileId),

    #[error("That spot is already taken")]
    Occupied,

    #[error("Too close to another settlement")]
    DistanceRule,

    #[error("Not connected to your network")]
    NotConnected,

    #[error("You can only upgrade your own settlement")]
    NotOwnSettlement,

    #[error("Cannot afford this")]
    CannotAfford,

    #[error("No action cards left in deck")]
    EmptyDeck,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("That card cannot be played")]
    CardNotPlayable,

    #[error("Cards cannot be played on the turn they are bought")]
    CardBoughtThisTurn,

    #[error("Invalid choice for this card")]
    InvalidChoice,

    #[error("Invalid trade")]
    InvalidTrade,

    #[error("No such trade offer")]
    NoSuchOffer,

    #[error("Only the offering player can cancel an offer")]
    NotYourOffer,

    #[error("The offering player can no longer cover this offer")]
    OfferNotCovered,

    #[error("Invalid target")]
    InvalidTarget,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Board generation failed: {0}")]
    Topology(#[from] TopologyError),
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub players: Vec<Player>,
    pub current_player: PlayerId,
    pub phase: GamePhase,
    pub mode: InteractionMode,
    /// Turn number (starts at 1, advanced by every end of turn)
    pub turn_number: u32,
    /// Last dice roll
    pub dice: Option<(u8, u8)>,
    pub win_target: u32,
    /// Remaining action cards, drawn from the back
    pub deck: Vec<ActionCard>,
    /// Played action cards
    pub discarded: Vec<ActionCard>,
    pub trade_offers: Vec<TradeOffer>,
    pub next_offer_id: u32,
    /// Number of actions applied so far; timestamps trade offers
    pub clock: u64,
    pub rules: RuleOptions,
    /// Setup phase tracking: which settlement was just placed
    setup_settlement: Option<VertexId>,
}

impl GameState {
    /// Start a new game: board, players and a shuffled deck
    pub fn new<R: Rng>(config: &GameConfig, rng: &mut R) -> Result<Self, GameError> {
        config.validate()?;

        let board = Board::generate(rng)?;
        let players: Vec<Player> = config
            .names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name))
            .collect();

        let mut deck = ActionCard::standard_deck();
        deck.shuffle(rng);

        info!(
            players = players.len(),
            win_target = config.win_target,
            "new game created"
        );

        Ok(Self {
            board,
            players,
            current_player: 0,
            phase: GamePhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement,
            },
            mode: InteractionMode::Idle,
            turn_number: 1,
            dice: None,
            win_target: config.win_target,
            deck,
            discarded: Vec::new(),
            trade_offers: Vec::new(),
            next_offer_id: 1,
            clock: 0,
            rules: config.rules.clone(),
            setup_settlement: None,
        })
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::InvalidPlayer)
    }

    /// The settlement placed in the current setup step, if any
    pub fn setup_settlement(&self) -> Option<&VertexId> {
        self.setup_settlement.as_ref()
    }

    /// Victory points computed from the current counts and flags
    pub fn score(&self, id: PlayerId) -> u32 {
        self.get_player(id).map(scoring::score).unwrap_or(0)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Ended { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Ended { winner } => Some(winner),
            _ => None,
        }
    }

    // ==================== Reducer ====================

    /// Apply an action, committing the new state only if it succeeds
    pub fn apply_action<R: Rng>(
        &mut self,
        player: PlayerId,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let (next, events) = self.reduce(player, action, rng)?;
        *self = next;
        Ok(events)
    }

    /// Compute the state that follows `action` without touching `self`
    pub fn reduce<R: Rng>(
        &self,
        player: PlayerId,
        action: GameAction,
        rng: &mut R,
    ) -> Result<(GameState, Vec<GameEvent>), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if self.get_player(player).is_none() {
            return Err(GameError::InvalidPlayer);
        }

        let mut next = self.clone();
        match next.execute(player, action.clone(), rng) {
            Ok(mut events) => {
                next.clock += 1;
                events.extend(next.after_action());
                debug!(player, ?action, events = events.len(), "action applied");
                Ok((next, events))
            }
            Err(err) => {
                debug!(player, ?action, %err, "action rejected");
                Err(err)
            }
        }
    }

    fn execute<R: Rng>(
        &mut self,
        player: PlayerId,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.mode.is_blocking() && !self.mode.accepts(&action) {
            return Err(GameError::InvalidMode);
        }

        // Accepting an offer is the one thing other players may do
        if !matches!(action, GameAction::AcceptTradeOffer(_)) {
            self.ensure_turn(player)?;
        }

        match action {
            GameAction::RollDice => self.roll_dice(player, rng),
            GameAction::EndTurn => self.end_turn(player),
            GameAction::BeginBuild(kind) => self.begin_build(player, kind),
            GameAction::CancelMode => self.cancel_mode(player),
            GameAction::PlaceSettlement(vertex) => match self.phase {
                GamePhase::Setup { .. } => self.place_setup_settlement(player, vertex),
                _ => self.build_settlement(player, vertex),
            },
            GameAction::PlaceRoad(edge) => match self.phase {
                GamePhase::Setup { .. } => self.place_setup_road(player, edge),
                _ => self.build_road(player, edge),
            },
            GameAction::UpgradeToCity(vertex) => self.upgrade_to_city(player, vertex),
            GameAction::UndoPlacement => self.undo_placement(player),
            GameAction::BuyCard => self.buy_card(player),
            GameAction::PlayCard { card_id, choice } => self.play_card(player, card_id, choice),
            GameAction::ChooseMonopolyResource(resource) => {
                self.finish_selection(InteractionMode::SelectingMonopolyResource)?;
                self.resolve_monopoly(player, resource)
            }
            GameAction::ChooseInventionResources(a, b) => {
                self.finish_selection(InteractionMode::SelectingInventionResources)?;
                self.resolve_invention(player, a, b)
            }
            GameAction::MoveBlackHole(tile) => self.move_black_hole(player, tile),
            GameAction::StealFrom(victim) => self.steal_from(player, victim, rng),
            GameAction::CreateTradeOffer {
                offering,
                requesting,
            } => self.create_offer(player, offering, requesting),
            GameAction::AcceptTradeOffer(id) => self.accept_offer(player, id),
            GameAction::CancelTradeOffer(id) => self.cancel_offer(player, id),
            GameAction::BankTrade { give, want } => self.bank_trade(player, give, want),
        }
    }

    // ==================== Guards ====================

    fn ensure_turn(&self, player: PlayerId) -> Result<(), GameError> {
        if player == self.current_player {
            Ok(())
        } else {
            Err(GameError::NotYourTurn)
        }
    }

    fn ensure_building(&self) -> Result<(), GameError> {
        if self.phase == GamePhase::Building {
            Ok(())
        } else {
            Err(GameError::InvalidPhase)
        }
    }

    /// Leave `expected`; any other mode means no card is waiting for a choice
    fn finish_selection(&mut self, expected: InteractionMode) -> Result<(), GameError> {
        if self.mode != expected {
            return Err(GameError::InvalidMode);
        }
        self.mode = InteractionMode::Idle;
        Ok(())
    }

    fn vertex_checked(&self, vertex: &VertexId) -> Result<VertexBuilding, GameError> {
        self.board
            .vertex(vertex)
            .map(|v| v.building)
            .ok_or_else(|| GameError::UnknownVertex(vertex.to_string()))
    }

    fn edge_checked(&self, edge: &EdgeId) -> Result<EdgeBuilding, GameError> {
        self.board
            .edge(edge)
            .map(|e| e.road)
            .ok_or_else(|| GameError::UnknownEdge(edge.to_string()))
    }

    /// Empty vertex that respects the distance rule
    fn check_settlement_spot(&self, vertex: &VertexId) -> Result<(), GameError> {
        if self.vertex_checked(vertex)?.is_occupied() {
            return Err(GameError::Occupied);
        }
        if !self.board.satisfies_distance_rule(vertex) {
            return Err(GameError::DistanceRule);
        }
        Ok(())
    }

    fn check_afford(&self, player: PlayerId, kind: BuildKind) -> Result<(), GameError> {
        match self.get_player(player) {
            Some(p) if p.can_afford(kind) => Ok(()),
            Some(_) => Err(GameError::CannotAfford),
            None => Err(GameError::InvalidPlayer),
        }
    }

    // ==================== Setup Phase ====================

    fn place_setup_settlement(
        &mut self,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<Vec<GameEvent>, GameError> {
        let GamePhase::Setup {
            round,
            placing: SetupPlacing::Settlement,
        } = self.phase
        else {
            return Err(GameError::InvalidPhase);
        };
        self.check_settlement_spot(&vertex)?;

        self.board.place_settlement(&vertex, player);
        let grant = if round == 2 {
            self.starting_resources(&vertex)
        } else {
            ResourceHand::new()
        };

        let p = self.player_mut(player)?;
        p.buildings.settlements += 1;
        p.placed_settlements.push(vertex.clone());
        p.resources.add_hand(&grant);

        self.setup_settlement = Some(vertex.clone());
        self.phase = GamePhase::Setup {
            round,
            placing: SetupPlacing::Road,
        };

        let mut events = vec![GameEvent::SettlementPlaced { player, vertex }];
        if !grant.is_empty() {
            events.push(GameEvent::StartingResources {
                player,
                resources: grant,
            });
        }
        Ok(events)
    }

    /// One unit per non-void tile around the vertex
    fn starting_resources(&self, vertex: &VertexId) -> ResourceHand {
        let mut grant = ResourceHand::new();
        for tile in self.board.tiles_at_vertex(vertex) {
            if let Some(resource) = tile.resource() {
                grant.add(resource, 1);
            }
        }
        grant
    }

    fn place_setup_road(
        &mut self,
        player: PlayerId,
        edge: EdgeId,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !matches!(
            self.phase,
            GamePhase::Setup {
                placing: SetupPlacing::Road,
                ..
            }
        ) {
            return Err(GameError::InvalidPhase);
        }
        if self.edge_checked(&edge)? != EdgeBuilding::Empty {
            return Err(GameError::Occupied);
        }
        let touches_settlement = match (&self.setup_settlement, self.board.edge(&edge)) {
            (Some(settlement), Some(e)) => e.touches(settlement),
            _ => false,
        };
        if !touches_settlement {
            return Err(GameError::NotConnected);
        }

        self.board.place_road(&edge, player);
        let p = self.player_mut(player)?;
        p.buildings.roads += 1;
        p.placed_roads.push(edge.clone());
        self.setup_settlement = None;

        let mut events = vec![GameEvent::RoadPlaced {
            player,
            edge,
            free: true,
        }];
        events.extend(self.advance_setup());
        Ok(events)
    }

    /// Round 1 goes forward through the seats, round 2 backward
    fn advance_setup(&mut self) -> Vec<GameEvent> {
        let GamePhase::Setup { round, .. } = self.phase else {
            return Vec::new();
        };
        let last = (self.player_count() - 1) as PlayerId;

        match round {
            1 if self.current_player < last => {
                self.current_player += 1;
                self.phase = GamePhase::Setup {
                    round: 1,
                    placing: SetupPlacing::Settlement,
                };
            }
            1 => {
                self.phase = GamePhase::Setup {
                    round: 2,
                    placing: SetupPlacing::Settlement,
                };
            }
            _ if self.current_player > 0 => {
                self.current_player -= 1;
                self.phase = GamePhase::Setup {
                    round: 2,
                    placing: SetupPlacing::Settlement,
                };
            }
            _ => {
                self.current_player = 0;
                self.phase = GamePhase::Playing;
                self.mode = InteractionMode::Idle;
                info!("setup complete");
                return vec![GameEvent::SetupCompleted];
            }
        }
        Vec::new()
    }

    fn undo_placement(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        let GamePhase::Setup {
            round,
            placing: SetupPlacing::Road,
        } = self.phase
        else {
            return Err(GameError::NothingToUndo);
        };
        let vertex = self.setup_settlement.take().ok_or(GameError::NothingToUndo)?;

        let grant = if round == 2 {
            self.starting_resources(&vertex)
        } else {
            ResourceHand::new()
        };
        self.board.clear_vertex(&vertex);

        let p = self.player_mut(player)?;
        p.buildings.settlements = p.buildings.settlements.saturating_sub(1);
        p.placed_settlements.retain(|v| *v != vertex);
        if p.resources.can_afford(&grant) {
            p.resources.subtract(&grant);
        }

        self.phase = GamePhase::Setup {
            round,
            placing: SetupPlacing::Settlement,
        };
        Ok(vec![GameEvent::PlacementUndone { player, vertex }])
    }

    // ==================== Dice ====================

    fn roll_dice<R: Rng>(
        &mut self,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::InvalidPhase);
        }

        let die1: u8 = rng.gen_range(1..=6);
        let die2: u8 = rng.gen_range(1..=6);
        let total = die1 + die2;
        self.dice = Some((die1, die2));
        self.phase = GamePhase::Building;

        let mut events = vec![GameEvent::DiceRolled {
            player,
            roll: (die1, die2),
            total,
        }];

        if total == 7 {
            for p in &mut self.players {
                let held = p.resources.total();
                if held > DISCARD_THRESHOLD {
                    let discarded = p.resources.discard_random(held / 2, rng);
                    events.push(GameEvent::ResourcesDiscarded {
                        player: p.id,
                        discarded,
                    });
                }
            }
            if self.rules.black_hole_on_seven {
                self.mode = InteractionMode::MovingBlackHole;
            }
            return Ok(events);
        }

        let distributions = self.board.production(total);
        for &(pid, resource, amount) in &distributions {
            self.player_mut(pid)?.resources.add(resource, amount);
        }
        if !distributions.is_empty() {
            events.push(GameEvent::ResourcesProduced { distributions });
        }
        Ok(events)
    }

    // ==================== Building ====================

    fn begin_build(
        &mut self,
        player: PlayerId,
        kind: BuildKind,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        if !matches!(
            self.mode,
            InteractionMode::Idle
                | InteractionMode::PlacingSettlement
                | InteractionMode::PlacingRoad
                | InteractionMode::UpgradingToCity
        ) {
            return Err(GameError::InvalidMode);
        }
        let mode = match kind {
            BuildKind::Road => InteractionMode::PlacingRoad,
            BuildKind::Settlement => InteractionMode::PlacingSettlement,
            BuildKind::City => InteractionMode::UpgradingToCity,
            BuildKind::Card => return Err(GameError::InvalidChoice),
        };
        self.check_afford(player, kind)?;

        self.mode = mode.clone();
        Ok(vec![GameEvent::ModeChanged { player, mode }])
    }

    fn cancel_mode(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        match self.mode {
            InteractionMode::Idle => Err(GameError::InvalidMode),
            _ => {
                self.mode = InteractionMode::Idle;
                Ok(vec![GameEvent::ModeChanged {
                    player,
                    mode: InteractionMode::Idle,
                }])
            }
        }
    }

    fn build_settlement(
        &mut self,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        if !matches!(
            self.mode,
            InteractionMode::Idle | InteractionMode::PlacingSettlement
        ) {
            return Err(GameError::InvalidMode);
        }
        self.check_settlement_spot(&vertex)?;
        if self.rules.require_road_connection && !self.board.touches_own_road(&vertex, player) {
            return Err(GameError::NotConnected);
        }
        self.check_afford(player, BuildKind::Settlement)?;

        self.board.place_settlement(&vertex, player);
        let p = self.player_mut(player)?;
        p.pay(BuildKind::Settlement);
        p.buildings.settlements += 1;
        p.placed_settlements.push(vertex.clone());
        self.mode = InteractionMode::Idle;

        Ok(vec![GameEvent::SettlementPlaced { player, vertex }])
    }

    fn build_road(&mut self, player: PlayerId, edge: EdgeId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        let free_remaining = match self.mode {
            InteractionMode::Idle | InteractionMode::PlacingRoad => None,
            InteractionMode::BuildingFreeRoads { remaining } => Some(remaining),
            _ => return Err(GameError::InvalidMode),
        };
        if self.edge_checked(&edge)? != EdgeBuilding::Empty {
            return Err(GameError::Occupied);
        }
        if !self.board.is_connected_to_network(&edge, player) {
            return Err(GameError::NotConnected);
        }
        if free_remaining.is_none() {
            self.check_afford(player, BuildKind::Road)?;
        }

        self.board.place_road(&edge, player);
        let p = self.player_mut(player)?;
        if free_remaining.is_none() {
            p.pay(BuildKind::Road);
        }
        p.buildings.roads += 1;
        p.placed_roads.push(edge.clone());

        self.mode = match free_remaining {
            Some(remaining) if remaining > 1 => InteractionMode::BuildingFreeRoads {
                remaining: remaining - 1,
            },
            _ => InteractionMode::Idle,
        };

        Ok(vec![GameEvent::RoadPlaced {
            player,
            edge,
            free: free_remaining.is_some(),
        }])
    }

    fn upgrade_to_city(
        &mut self,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        if !matches!(
            self.mode,
            InteractionMode::Idle | InteractionMode::UpgradingToCity
        ) {
            return Err(GameError::InvalidMode);
        }
        if self.vertex_checked(&vertex)? != VertexBuilding::Settlement(player) {
            return Err(GameError::NotOwnSettlement);
        }
        self.check_afford(player, BuildKind::City)?;

        self.board.upgrade_to_city(&vertex, player);
        let p = self.player_mut(player)?;
        p.pay(BuildKind::City);
        p.buildings.settlements = p.buildings.settlements.saturating_sub(1);
        p.buildings.cities += 1;
        self.mode = InteractionMode::Idle;

        Ok(vec![GameEvent::CityUpgraded { player, vertex }])
    }

    // ==================== Action Cards ====================

    fn buy_card(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        if self.mode != InteractionMode::Idle {
            return Err(GameError::InvalidMode);
        }
        if self.deck.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        self.check_afford(player, BuildKind::Card)?;

        let turn = self.turn_number;
        let mut card = self.deck.pop().ok_or(GameError::EmptyDeck)?;
        card.turn_bought = Some(turn);

        let p = self.player_mut(player)?;
        p.pay(BuildKind::Card);
        p.buildings.cards += 1;
        p.cards.push(card);

        Ok(vec![GameEvent::CardBought { player }])
    }

    fn play_card(
        &mut self,
        player: PlayerId,
        card_id: u8,
        choice: Option<CardChoice>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let card = self
            .get_player(player)
            .and_then(|p| p.card(card_id))
            .ok_or(GameError::NoSuchCard)?;
        if !card.is_playable() {
            return Err(GameError::CardNotPlayable);
        }
        if card.turn_bought == Some(self.turn_number) {
            return Err(GameError::CardBoughtThisTurn);
        }
        let kind = card.kind;

        let phase_ok = match kind {
            CardKind::GravityWell => {
                matches!(self.phase, GamePhase::Playing | GamePhase::Building)
            }
            _ => self.phase == GamePhase::Building,
        };
        if !phase_ok {
            return Err(GameError::InvalidPhase);
        }
        if self.mode != InteractionMode::Idle {
            return Err(GameError::InvalidMode);
        }
        let choice_ok = match (kind, choice) {
            (_, None) => true,
            (CardKind::Monopoly, Some(CardChoice::Monopoly(_))) => true,
            (CardKind::Invention, Some(CardChoice::Invention(_, _))) => true,
            _ => false,
        };
        if !choice_ok {
            return Err(GameError::InvalidChoice);
        }

        let p = self.player_mut(player)?;
        let card = p.take_card(card_id).ok_or(GameError::NoSuchCard)?;
        if kind == CardKind::GravityWell {
            p.gravity_wells_played += 1;
        }
        self.discarded.push(card);

        let mut events = vec![GameEvent::CardPlayed { player, kind }];
        match (kind, choice) {
            (CardKind::GravityWell, _) => self.mode = InteractionMode::MovingBlackHole,
            (CardKind::RoadBuilder, _) => {
                self.mode = InteractionMode::BuildingFreeRoads {
                    remaining: FREE_ROADS,
                }
            }
            (CardKind::Monopoly, Some(CardChoice::Monopoly(resource))) => {
                events.extend(self.resolve_monopoly(player, resource)?);
            }
            (CardKind::Monopoly, _) => self.mode = InteractionMode::SelectingMonopolyResource,
            (CardKind::Invention, Some(CardChoice::Invention(a, b))) => {
                events.extend(self.resolve_invention(player, a, b)?);
            }
            (CardKind::Invention, _) => self.mode = InteractionMode::SelectingInventionResources,
            (CardKind::SecretVictory, _) => return Err(GameError::CardNotPlayable),
        }
        Ok(events)
    }

    /// Every opponent hands over all of `resource`
    fn resolve_monopoly(
        &mut self,
        player: PlayerId,
        resource: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mut total = 0;
        for other in self.players.iter_mut().filter(|p| p.id != player) {
            total += other.resources.get(resource);
            other.resources.set(resource, 0);
        }
        self.player_mut(player)?.resources.add(resource, total);

        Ok(vec![GameEvent::MonopolyResolved {
            player,
            resource,
            total,
        }])
    }

    /// One unit each of two resources (possibly the same) from the bank
    fn resolve_invention(
        &mut self,
        player: PlayerId,
        a: Resource,
        b: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        let p = self.player_mut(player)?;
        p.resources.add(a, 1);
        p.resources.add(b, 1);

        Ok(vec![GameEvent::InventionResolved {
            player,
            resources: (a, b),
        }])
    }

    // ==================== Black Hole ====================

    fn move_black_hole(
        &mut self,
        player: PlayerId,
        tile: TileId,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.mode != InteractionMode::MovingBlackHole {
            return Err(GameError::InvalidMode);
        }
        if self.board.tile(tile).is_none() {
            return Err(GameError::UnknownTile(tile));
        }
        let from = self.board.black_hole;
        if tile == from {
            return Err(GameError::InvalidTarget);
        }

        self.board.move_black_hole(tile);

        let candidates: Vec<PlayerId> = self
            .board
            .players_adjacent_to_tile(tile)
            .into_iter()
            .filter(|&p| p != player)
            .collect();
        self.mode = if candidates.is_empty() {
            InteractionMode::Idle
        } else {
            InteractionMode::SelectingVictim { tile, candidates }
        };

        Ok(vec![GameEvent::BlackHoleMoved {
            player,
            from,
            to: tile,
        }])
    }

    fn steal_from<R: Rng>(
        &mut self,
        player: PlayerId,
        victim: PlayerId,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let InteractionMode::SelectingVictim { candidates, .. } = &self.mode else {
            return Err(GameError::InvalidMode);
        };
        if !candidates.contains(&victim) {
            return Err(GameError::InvalidTarget);
        }

        let resource = self.player_mut(victim)?.resources.steal_random(rng);
        if let Some(r) = resource {
            self.player_mut(player)?.resources.add(r, 1);
        }
        self.mode = InteractionMode::Idle;

        Ok(vec![GameEvent::ResourceStolen {
            thief: player,
            victim,
            resource,
        }])
    }

    // ==================== Trading ====================

    fn create_offer(
        &mut self,
        player: PlayerId,
        offering: ResourceHand,
        requesting: ResourceHand,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;

        let offer = TradeOffer {
            id: self.next_offer_id,
            from: player,
            offering,
            requesting,
            created_at: self.clock,
        };
        if !offer.is_valid() {
            return Err(GameError::InvalidTrade);
        }
        if !self
            .get_player(player)
            .is_some_and(|p| p.resources.can_afford(&offering))
        {
            return Err(GameError::CannotAfford);
        }

        self.next_offer_id += 1;
        self.trade_offers.push(offer.clone());
        Ok(vec![GameEvent::TradeOffered { offer }])
    }

    fn accept_offer(
        &mut self,
        player: PlayerId,
        offer_id: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        let index = self
            .trade_offers
            .iter()
            .position(|o| o.id == offer_id)
            .ok_or(GameError::NoSuchOffer)?;
        let offer = self.trade_offers[index].clone();
        if offer.from == player {
            return Err(GameError::InvalidTrade);
        }

        // Holdings may have changed since the offer was posted
        if !self
            .get_player(offer.from)
            .is_some_and(|p| p.resources.can_afford(&offer.offering))
        {
            return Err(GameError::OfferNotCovered);
        }
        if !self
            .get_player(player)
            .is_some_and(|p| p.resources.can_afford(&offer.requesting))
        {
            return Err(GameError::CannotAfford);
        }

        let from = self.player_mut(offer.from)?;
        from.resources.subtract(&offer.offering);
        from.resources.add_hand(&offer.requesting);

        let to = self.player_mut(player)?;
        to.resources.subtract(&offer.requesting);
        to.resources.add_hand(&offer.offering);

        self.trade_offers.remove(index);
        Ok(vec![GameEvent::TradeAccepted {
            offer_id,
            from: offer.from,
            to: player,
        }])
    }

    fn cancel_offer(
        &mut self,
        player: PlayerId,
        offer_id: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        let index = self
            .trade_offers
            .iter()
            .position(|o| o.id == offer_id)
            .ok_or(GameError::NoSuchOffer)?;
        if self.trade_offers[index].from != player {
            return Err(GameError::NotYourOffer);
        }
        self.trade_offers.remove(index);
        Ok(vec![GameEvent::TradeCancelled { offer_id }])
    }

    fn bank_trade(
        &mut self,
        player: PlayerId,
        give: Resource,
        want: Resource,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;
        if give == want {
            return Err(GameError::InvalidTrade);
        }

        let rate = self.board.bank_rate(player, give);
        let p = self.player_mut(player)?;
        if p.resources.get(give) < rate {
            return Err(GameError::CannotAfford);
        }
        p.resources.subtract(&ResourceHand::single(give, rate));
        p.resources.add(want, 1);

        Ok(vec![GameEvent::BankTrade {
            player,
            gave: give,
            gave_count: rate,
            received: want,
        }])
    }

    // ==================== Turn Management ====================

    fn end_turn(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_building()?;

        let mut events = Vec::new();
        if !self.trade_offers.is_empty() {
            let offer_ids = self.trade_offers.drain(..).map(|o| o.id).collect();
            events.push(GameEvent::OffersExpired { offer_ids });
        }

        let next_player = (self.current_player + 1) % self.player_count() as PlayerId;
        self.current_player = next_player;
        self.turn_number += 1;
        self.dice = None;
        self.mode = InteractionMode::Idle;
        self.phase = GamePhase::Playing;

        events.push(GameEvent::TurnEnded {
            player,
            next_player,
        });
        Ok(events)
    }

    // ==================== Post-action Pass ====================

    /// Runs after every successful action, in this order: drop offers the
    /// offering player can no longer cover, settle both bonuses, refresh the
    /// cached scores, then check for a winner.
    fn after_action(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        events.extend(self.purge_stale_offers());
        events.extend(self.update_longest_chain());
        events.extend(self.update_gravity_dominion());

        for player in &mut self.players {
            player.victory_points = scoring::score(player);
        }

        events.extend(self.check_win_condition());
        events
    }

    fn purge_stale_offers(&mut self) -> Vec<GameEvent> {
        let players = &self.players;
        let mut offer_ids = Vec::new();
        self.trade_offers.retain(|offer| {
            let covered = players
                .get(offer.from as usize)
                .is_some_and(|p| p.resources.can_afford(&offer.offering));
            if !covered {
                offer_ids.push(offer.id);
            }
            covered
        });

        if offer_ids.is_empty() {
            Vec::new()
        } else {
            vec![GameEvent::OffersExpired { offer_ids }]
        }
    }

    fn update_longest_chain(&mut self) -> Vec<GameEvent> {
        let standings: Vec<(PlayerId, u32)> = self
            .players
            .iter()
            .map(|p| (p.id, scoring::longest_chain(&self.board, p.id)))
            .collect();
        let holder = self.players.iter().find(|p| p.has_longest_chain).map(|p| p.id);
        let new_holder = scoring::award_bonus(&standings, holder, LONGEST_CHAIN_MIN);

        if new_holder == holder {
            return Vec::new();
        }
        for p in &mut self.players {
            p.has_longest_chain = Some(p.id) == new_holder;
        }
        let length = standings.iter().map(|&(_, v)| v).max().unwrap_or(0);
        vec![GameEvent::LongestChainChanged {
            holder: new_holder,
            length,
        }]
    }

    fn update_gravity_dominion(&mut self) -> Vec<GameEvent> {
        let standings: Vec<(PlayerId, u32)> = self
            .players
            .iter()
            .map(|p| (p.id, p.gravity_wells_played))
            .collect();
        let holder = self
            .players
            .iter()
            .find(|p| p.has_gravity_dominion)
            .map(|p| p.id);
        let new_holder = scoring::award_bonus(&standings, holder, GRAVITY_DOMINION_MIN);

        if new_holder == holder {
            return Vec::new();
        }
        for p in &mut self.players {
            p.has_gravity_dominion = Some(p.id) == new_holder;
        }
        let played = standings.iter().map(|&(_, v)| v).max().unwrap_or(0);
        vec![GameEvent::GravityDominionChanged {
            holder: new_holder,
            played,
        }]
    }

    /// First player in seat order at or above the target wins
    fn check_win_condition(&mut self) -> Vec<GameEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        let Some(winner) = self
            .players
            .iter()
            .find(|p| p.victory_points >= self.win_target)
        else {
            return Vec::new();
        };

        let (winner, victory_points) = (winner.id, winner.victory_points);
        self.phase = GamePhase::Ended { winner };
        self.mode = InteractionMode::Idle;
        self.trade_offers.clear();
        info!(winner, victory_points, "game won");

        vec![GameEvent::GameWon {
            winner,
            victory_points,
        }]
    }

    // ==================== Valid Actions ====================

    /// Get all currently valid actions for a player
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let Some(p) = self.get_player(player) else {
            return actions;
        };
        if self.is_finished() {
            return actions;
        }

        self.push_acceptances(p, &mut actions);
        if player != self.current_player {
            return actions;
        }

        match &self.mode {
            InteractionMode::MovingBlackHole => {
                for tile in &self.board.tiles {
                    if tile.id != self.board.black_hole {
                        actions.push(GameAction::MoveBlackHole(tile.id));
                    }
                }
                return actions;
            }
            InteractionMode::SelectingVictim { candidates, .. } => {
                actions.extend(candidates.iter().map(|&v| GameAction::StealFrom(v)));
                return actions;
            }
            InteractionMode::SelectingMonopolyResource => {
                actions.extend(Resource::ALL.map(GameAction::ChooseMonopolyResource));
                return actions;
            }
            InteractionMode::SelectingInventionResources => {
                for a in Resource::ALL {
                    for b in Resource::ALL {
                        actions.push(GameAction::ChooseInventionResources(a, b));
                    }
                }
                return actions;
            }
            _ => {}
        }

        match &self.phase {
            GamePhase::Setup { placing, .. } => match placing {
                SetupPlacing::Settlement => {
                    for vertex in self.board.valid_settlement_spots(player, false) {
                        actions.push(GameAction::PlaceSettlement(vertex));
                    }
                }
                SetupPlacing::Road => {
                    if let Some(settlement) = &self.setup_settlement {
                        for edge in self.board.edges_at(settlement) {
                            if edge.road == EdgeBuilding::Empty {
                                actions.push(GameAction::PlaceRoad(edge.id.clone()));
                            }
                        }
                        actions.push(GameAction::UndoPlacement);
                    }
                }
            },

            GamePhase::Playing => {
                actions.push(GameAction::RollDice);
                self.push_card_plays(p, &mut actions);
            }

            GamePhase::Building => self.push_building_actions(p, &mut actions),

            GamePhase::Ended { .. } => {}
        }

        actions
    }

    /// Offers from other players that both sides can still cover
    fn push_acceptances(&self, p: &Player, actions: &mut Vec<GameAction>) {
        if self.phase != GamePhase::Building || self.mode.is_blocking() {
            return;
        }
        for offer in self.trade_offers.iter().filter(|o| o.from != p.id) {
            let covered = self
                .get_player(offer.from)
                .is_some_and(|from| from.resources.can_afford(&offer.offering));
            if covered && p.resources.can_afford(&offer.requesting) {
                actions.push(GameAction::AcceptTradeOffer(offer.id));
            }
        }
    }

    fn push_card_plays(&self, p: &Player, actions: &mut Vec<GameAction>) {
        if self.mode != InteractionMode::Idle {
            return;
        }
        for card in p.playable_cards(self.turn_number) {
            if card.kind != CardKind::GravityWell && self.phase != GamePhase::Building {
                continue;
            }
            let card_id = card.id;
            actions.push(GameAction::PlayCard {
                card_id,
                choice: None,
            });
            match card.kind {
                CardKind::Monopoly => {
                    for r in Resource::ALL {
                        actions.push(GameAction::PlayCard {
                            card_id,
                            choice: Some(CardChoice::Monopoly(r)),
                        });
                    }
                }
                CardKind::Invention => {
                    for a in Resource::ALL {
                        for b in Resource::ALL {
                            actions.push(GameAction::PlayCard {
                                card_id,
                                choice: Some(CardChoice::Invention(a, b)),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn push_building_actions(&self, p: &Player, actions: &mut Vec<GameAction>) {
        let player = p.id;
        actions.push(GameAction::EndTurn);
        if self.mode != InteractionMode::Idle {
            actions.push(GameAction::CancelMode);
        }

        for give in Resource::ALL {
            if p.resources.get(give) >= self.board.bank_rate(player, give) {
                for want in Resource::ALL.into_iter().filter(|&w| w != give) {
                    actions.push(GameAction::BankTrade { give, want });
                }
            }
        }
        for offer in self.trade_offers.iter().filter(|o| o.from == player) {
            actions.push(GameAction::CancelTradeOffer(offer.id));
        }

        let allows =
            |mode: InteractionMode| self.mode == InteractionMode::Idle || self.mode == mode;
        let free_roads = matches!(self.mode, InteractionMode::BuildingFreeRoads { .. });

        if free_roads || (allows(InteractionMode::PlacingRoad) && p.can_afford(BuildKind::Road)) {
            for edge in self.board.valid_road_spots(player) {
                actions.push(GameAction::PlaceRoad(edge));
            }
        }
        if free_roads {
            return;
        }

        if allows(InteractionMode::PlacingSettlement) && p.can_afford(BuildKind::Settlement) {
            let require_road = self.rules.require_road_connection;
            for vertex in self.board.valid_settlement_spots(player, require_road) {
                actions.push(GameAction::PlaceSettlement(vertex));
            }
        }
        if allows(InteractionMode::UpgradingToCity) && p.can_afford(BuildKind::City) {
            for vertex in self.board.valid_city_spots(player) {
                actions.push(GameAction::UpgradeToCity(vertex));
            }
        }

        for kind in [BuildKind::Road, BuildKind::Settlement, BuildKind::City] {
            if p.can_afford(kind) {
                actions.push(GameAction::BeginBuild(kind));
            }
        }

        let can_buy = p.can_afford(BuildKind::Card) && !self.deck.is_empty();
        if self.mode == InteractionMode::Idle && can_buy {
            actions.push(GameAction::BuyCard);
        }
        self.push_card_plays(p, actions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::find_path;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn new_game(players: u8, seed: u64) -> (GameState, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let game = GameState::new(&GameConfig::new(players, 10), &mut rng).expect("game starts");
        (game, rng)
    }

    /// Play through setup with the first valid placement each time
    fn finish_setup(game: &mut GameState, rng: &mut StdRng) {
        while matches!(game.phase, GamePhase::Setup { .. }) {
            let player = game.current_player;
            let action = game
                .valid_actions(player)
                .into_iter()
                .next()
                .expect("setup always has a placement");
            game.apply_action(player, action, rng).expect("valid placement");
        }
    }

    /// An RNG whose next roll totals `total`
    fn rng_rolling(total: u8) -> StdRng {
        for seed in 0..10_000 {
            let rng = StdRng::seed_from_u64(seed);
            let mut peek = rng.clone();
            let a: u8 = peek.gen_range(1..=6);
            let b: u8 = peek.gen_range(1..=6);
            if a + b == total {
                return rng;
            }
        }
        panic!("no seed rolls {}", total);
    }

    /// Skip to the building phase of the current player's turn
    fn into_building(game: &mut GameState) {
        game.phase = GamePhase::Building;
        game.mode = InteractionMode::Idle;
    }

    fn give(game: &mut GameState, player: PlayerId, hand: ResourceHand) {
        game.players[player as usize].resources.add_hand(&hand);
    }

    fn plenty() -> ResourceHand {
        ResourceHand::with_amounts(10, 10, 10, 10, 10)
    }

    fn card_of(kind: CardKind, id: u8) -> ActionCard {
        let mut card = ActionCard::standard_deck()
            .into_iter()
            .find(|c| c.kind == kind)
            .expect("kind in deck");
        card.id = id;
        card
    }

    #[test]
    fn test_new_game() {
        let (game, _) = new_game(3, 1);
        assert_eq!(game.players.len(), 3);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.turn_number, 1);
        assert_eq!(game.deck.len(), 25);
        assert_eq!(
            game.phase,
            GamePhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = GameState::new(&GameConfig::new(6, 10), &mut rng);
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_setup_order_four_players() {
        let (mut game, mut rng) = new_game(4, 2);
        let mut order = Vec::new();

        while matches!(game.phase, GamePhase::Setup { .. }) {
            let player = game.current_player;
            let settlement = game.valid_actions(player).into_iter().next().expect("spot");
            assert!(matches!(settlement, GameAction::PlaceSettlement(_)));
            game.apply_action(player, settlement, &mut rng).expect("settlement");

            // Same player owes the road
            assert_eq!(game.current_player, player);
            let road = game.valid_actions(player).into_iter().next().expect("road");
            assert!(matches!(road, GameAction::PlaceRoad(_)));
            game.apply_action(player, road, &mut rng).expect("road");

            order.push(player);
        }

        assert_eq!(order, vec![0, 1, 2, 3, 3, 2, 1, 0]);
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.current_player, 0);
        for p in &game.players {
            assert_eq!(p.buildings.settlements, 2);
            assert_eq!(p.buildings.roads, 2);
            assert_eq!(p.victory_points, 2);
        }
    }

    #[test]
    fn test_round_two_grants_starting_resources() {
        let (mut game, mut rng) = new_game(2, 3);
        // Round 1 for both players, then player 1 opens round 2
        for _ in 0..4 {
            let player = game.current_player;
            let action = game.valid_actions(player).into_iter().next().expect("action");
            game.apply_action(player, action, &mut rng).expect("valid");
        }
        assert_eq!(game.current_player, 1);

        let vertex = game.board.valid_settlement_spots(1, false)[0].clone();
        let expected = game.starting_resources(&vertex);
        let before = game.players[1].resources;
        game.apply_action(1, GameAction::PlaceSettlement(vertex), &mut rng)
            .expect("settlement");

        let mut after = before;
        after.add_hand(&expected);
        assert_eq!(game.players[1].resources, after);
    }

    #[test]
    fn test_undo_setup_settlement() {
        let (mut game, mut rng) = new_game(2, 4);
        let before = game.clone();
        let vertex = game.board.valid_settlement_spots(0, false)[0].clone();
        game.apply_action(0, GameAction::PlaceSettlement(vertex.clone()), &mut rng)
            .expect("settlement");

        let events = game
            .apply_action(0, GameAction::UndoPlacement, &mut rng)
            .expect("undo");
        assert!(events.contains(&GameEvent::PlacementUndone { player: 0, vertex }));
        assert_eq!(game.board, before.board);
        assert_eq!(game.players[0].buildings, before.players[0].buildings);
        assert_eq!(game.phase, before.phase);

        assert_eq!(
            game.apply_action(0, GameAction::UndoPlacement, &mut rng),
            Err(GameError::NothingToUndo)
        );
    }

    #[test]
    fn test_setup_road_must_touch_new_settlement() {
        let (mut game, mut rng) = new_game(2, 5);
        let vertex = game.board.valid_settlement_spots(0, false)[0].clone();
        game.apply_action(0, GameAction::PlaceSettlement(vertex.clone()), &mut rng)
            .expect("settlement");

        let far = game
            .board
            .edges
            .values()
            .find(|e| !e.touches(&vertex))
            .map(|e| e.id.clone())
            .expect("far edge");
        assert_eq!(
            game.apply_action(0, GameAction::PlaceRoad(far), &mut rng),
            Err(GameError::NotConnected)
        );
    }

    #[test]
    fn test_wrong_player_rejected_without_change() {
        let (mut game, mut rng) = new_game(3, 6);
        let snapshot = game.clone();
        let vertex = game.board.valid_settlement_spots(1, false)[0].clone();
        assert_eq!(
            game.apply_action(1, GameAction::PlaceSettlement(vertex), &mut rng),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(game, snapshot);
        assert_eq!(
            game.apply_action(9, GameAction::RollDice, &mut rng),
            Err(GameError::InvalidPlayer)
        );
    }

    #[test]
    fn test_distance_rule_enforced() {
        let (mut game, mut rng) = new_game(2, 7);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        give(&mut game, 0, plenty());

        let own = game.players[0].placed_settlements[0].clone();
        let neighbor = game.board.neighbors(&own)[0].clone();
        assert_eq!(
            game.apply_action(0, GameAction::PlaceSettlement(neighbor), &mut rng),
            Err(GameError::DistanceRule)
        );
        assert_eq!(
            game.apply_action(0, GameAction::PlaceSettlement(own), &mut rng),
            Err(GameError::Occupied)
        );
        assert!(matches!(
            game.apply_action(0, GameAction::PlaceSettlement("v-0-0".into()), &mut rng),
            Err(GameError::UnknownVertex(_))
        ));
    }

    #[test]
    fn test_build_settlement_pays_and_scores() {
        let (mut game, mut rng) = new_game(2, 8);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);

        game.players[0].resources = ResourceHand::new();
        let spot = game.board.valid_settlement_spots(0, false)[0].clone();
        assert_eq!(
            game.apply_action(0, GameAction::PlaceSettlement(spot.clone()), &mut rng),
            Err(GameError::CannotAfford)
        );

        game.players[0].resources = ResourceHand::with_amounts(1, 1, 1, 1, 0);
        game.apply_action(0, GameAction::PlaceSettlement(spot.clone()), &mut rng)
            .expect("settlement");
        assert!(game.players[0].resources.is_empty());
        assert_eq!(game.players[0].buildings.settlements, 3);
        assert_eq!(game.players[0].victory_points, 3);
        assert_eq!(game.board.building_at(&spot), VertexBuilding::Settlement(0));
    }

    #[test]
    fn test_road_connection_rule_option() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = GameConfig::new(2, 10).with_rules(RuleOptions {
            require_road_connection: true,
            ..RuleOptions::default()
        });
        let mut game = GameState::new(&config, &mut rng).expect("game");
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        give(&mut game, 0, plenty());

        let unconnected = game
            .board
            .valid_settlement_spots(0, false)
            .into_iter()
            .find(|v| !game.board.touches_own_road(v, 0))
            .expect("spot");
        assert_eq!(
            game.apply_action(0, GameAction::PlaceSettlement(unconnected), &mut rng),
            Err(GameError::NotConnected)
        );
    }

    #[test]
    fn test_upgrade_to_city_in_place() {
        let (mut game, mut rng) = new_game(2, 10);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        give(&mut game, 0, plenty());

        let own = game.players[0].placed_settlements[0].clone();
        let theirs = game.players[1].placed_settlements[0].clone();
        assert_eq!(
            game.apply_action(0, GameAction::UpgradeToCity(theirs), &mut rng),
            Err(GameError::NotOwnSettlement)
        );

        game.apply_action(0, GameAction::UpgradeToCity(own.clone()), &mut rng)
            .expect("city");
        assert_eq!(game.board.building_at(&own), VertexBuilding::City(0));
        assert_eq!(game.players[0].buildings.settlements, 1);
        assert_eq!(game.players[0].buildings.cities, 1);
        assert_eq!(game.players[0].victory_points, 3);
        assert_eq!(game.board.vertices.len(), 54);
    }

    #[test]
    fn test_begin_build_and_cancel() {
        let (mut game, mut rng) = new_game(2, 11);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);

        assert_eq!(
            game.apply_action(0, GameAction::BeginBuild(BuildKind::City), &mut rng),
            Err(GameError::CannotAfford)
        );
        give(&mut game, 0, plenty());
        game.apply_action(0, GameAction::BeginBuild(BuildKind::Road), &mut rng)
            .expect("mode");
        assert_eq!(game.mode, InteractionMode::PlacingRoad);

        // Placing mode only offers roads
        let actions = game.valid_actions(0);
        assert!(actions.iter().all(|a| !matches!(a, GameAction::PlaceSettlement(_))));
        assert!(actions.iter().any(|a| matches!(a, GameAction::PlaceRoad(_))));

        game.apply_action(0, GameAction::CancelMode, &mut rng)
            .expect("cancel");
        assert_eq!(game.mode, InteractionMode::Idle);
        assert_eq!(
            game.apply_action(0, GameAction::BeginBuild(BuildKind::Card), &mut rng),
            Err(GameError::InvalidChoice)
        );
    }

    #[test]
    fn test_roll_produces_and_enters_building() {
        let (mut game, mut rng) = new_game(2, 12);
        finish_setup(&mut game, &mut rng);
        let mut dice = rng_rolling(8);
        let events = game
            .apply_action(0, GameAction::RollDice, &mut dice)
            .expect("roll");
        assert_eq!(game.phase, GamePhase::Building);
        assert!(matches!(
            events[0],
            GameEvent::DiceRolled { total: 8, .. }
        ));
        assert_eq!(
            game.apply_action(0, GameAction::RollDice, &mut rng),
            Err(GameError::InvalidPhase)
        );
    }

    #[test]
    fn test_seven_discards_then_building() {
        let (mut game, mut rng) = new_game(3, 13);
        finish_setup(&mut game, &mut rng);
        game.players[1].resources = ResourceHand::with_amounts(3, 3, 3, 0, 0);
        game.players[2].resources = ResourceHand::with_amounts(2, 2, 2, 1, 0);
        let untouched = game.players[2].resources;
        let hole = game.board.black_hole;

        let mut dice = rng_rolling(7);
        game.apply_action(0, GameAction::RollDice, &mut dice)
            .expect("roll");
        assert_eq!(game.players[1].resources.total(), 5);
        assert_eq!(game.players[2].resources, untouched);
        assert_eq!(game.phase, GamePhase::Building);
        assert_eq!(game.mode, InteractionMode::Idle);
        assert_eq!(game.board.black_hole, hole);

        game.apply_action(0, GameAction::EndTurn, &mut rng)
            .expect("nothing left to resolve");
        assert_eq!(game.current_player, 1);
    }

    #[test]
    fn test_seven_moves_black_hole_when_enabled() {
        let mut rng = StdRng::seed_from_u64(13);
        let config = GameConfig::new(3, 10).with_rules(RuleOptions {
            black_hole_on_seven: true,
            ..RuleOptions::default()
        });
        let mut game = GameState::new(&config, &mut rng).expect("game");
        finish_setup(&mut game, &mut rng);
        game.players[1].resources = ResourceHand::with_amounts(3, 3, 3, 0, 0);

        let mut dice = rng_rolling(7);
        game.apply_action(0, GameAction::RollDice, &mut dice)
            .expect("roll");
        assert_eq!(game.players[1].resources.total(), 5);
        assert_eq!(game.mode, InteractionMode::MovingBlackHole);

        // Blocking: nothing but the move is accepted
        assert_eq!(
            game.apply_action(0, GameAction::EndTurn, &mut rng),
            Err(GameError::InvalidMode)
        );
        let here = game.board.black_hole;
        assert_eq!(
            game.apply_action(0, GameAction::MoveBlackHole(here), &mut rng),
            Err(GameError::InvalidTarget)
        );
    }

    #[test]
    fn test_black_hole_victims_exclude_mover() {
        let (mut game, mut rng) = new_game(3, 14);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.mode = InteractionMode::MovingBlackHole;

        // A tile next to player 0 and another player, if any; else any tile with an opponent
        let target = game
            .board
            .tiles
            .iter()
            .map(|t| t.id)
            .filter(|&t| t != game.board.black_hole)
            .find(|&t| {
                let around = game.board.players_adjacent_to_tile(t);
                around.contains(&0) && around.len() > 1
            })
            .or_else(|| {
                game.board.tiles.iter().map(|t| t.id).find(|&t| {
                    t != game.board.black_hole
                        && game.board.players_adjacent_to_tile(t).iter().any(|&p| p != 0)
                })
            })
            .expect("tile with an opponent");

        game.players[1].resources = ResourceHand::with_amounts(0, 0, 0, 0, 1);
        game.players[2].resources = ResourceHand::with_amounts(0, 0, 0, 0, 1);
        game.apply_action(0, GameAction::MoveBlackHole(target), &mut rng)
            .expect("move");

        let InteractionMode::SelectingVictim { candidates, .. } = game.mode.clone() else {
            panic!("expected victim selection, got {:?}", game.mode);
        };
        assert!(!candidates.contains(&0));
        assert!(!candidates.is_empty());

        let victim = candidates[0];
        assert_eq!(
            game.apply_action(0, GameAction::StealFrom(0), &mut rng),
            Err(GameError::InvalidTarget)
        );
        let before = game.players[0].resources.stars;
        game.apply_action(0, GameAction::StealFrom(victim), &mut rng)
            .expect("steal");
        assert_eq!(game.players[0].resources.stars, before + 1);
        assert_eq!(game.players[victim as usize].resources.total(), 0);
        assert_eq!(game.mode, InteractionMode::Idle);
    }

    #[test]
    fn test_move_to_empty_tile_skips_victims() {
        let (mut game, mut rng) = new_game(2, 15);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.mode = InteractionMode::MovingBlackHole;

        let empty = game
            .board
            .tiles
            .iter()
            .map(|t| t.id)
            .find(|&t| {
                t != game.board.black_hole && game.board.players_adjacent_to_tile(t).is_empty()
            })
            .expect("empty tile");
        game.apply_action(0, GameAction::MoveBlackHole(empty), &mut rng)
            .expect("move");
        assert_eq!(game.mode, InteractionMode::Idle);
        assert_eq!(game.board.black_hole, empty);
    }

    #[test]
    fn test_card_bought_this_turn_cannot_be_played() {
        let (mut game, mut rng) = new_game(2, 16);
        finish_setup(&mut game, &mut rng);
        give(&mut game, 0, plenty());
        game.apply_action(0, GameAction::RollDice, &mut rng_rolling(8))
            .expect("roll");

        // Put a gravity well on top of the deck
        game.deck.push(card_of(CardKind::GravityWell, 99));
        game.apply_action(0, GameAction::BuyCard, &mut rng)
            .expect("buy");
        assert_eq!(game.players[0].buildings.cards, 1);

        let play = GameAction::PlayCard {
            card_id: 99,
            choice: None,
        };
        assert_eq!(
            game.apply_action(0, play.clone(), &mut rng),
            Err(GameError::CardBoughtThisTurn)
        );
        assert!(!game.valid_actions(0).contains(&play));

        game.apply_action(0, GameAction::EndTurn, &mut rng)
            .expect("end");
        game.apply_action(1, GameAction::RollDice, &mut rng_rolling(8))
            .expect("roll");
        game.apply_action(1, GameAction::EndTurn, &mut rng)
            .expect("end");

        // A later turn, before rolling
        assert_eq!(game.current_player, 0);
        assert_eq!(game.phase, GamePhase::Playing);
        assert!(game.valid_actions(0).contains(&play));
        game.apply_action(0, play, &mut rng).expect("playable before rolling");
        assert_eq!(game.mode, InteractionMode::MovingBlackHole);
        assert_eq!(game.players[0].gravity_wells_played, 1);
        assert_eq!(game.discarded.len(), 1);
    }

    #[test]
    fn test_secret_victory_card_not_playable() {
        let (mut game, mut rng) = new_game(2, 17);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.players[0].cards.push(card_of(CardKind::SecretVictory, 50));

        assert_eq!(
            game.apply_action(
                0,
                GameAction::PlayCard {
                    card_id: 50,
                    choice: None
                },
                &mut rng
            ),
            Err(GameError::CardNotPlayable)
        );
        assert_eq!(game.score(0), 3);
    }

    #[test]
    fn test_monopoly_and_invention() {
        let (mut game, mut rng) = new_game(3, 18);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        for p in &mut game.players {
            p.resources = ResourceHand::with_amounts(0, 2, 0, 0, 0);
        }
        game.players[0].cards.push(card_of(CardKind::Monopoly, 60));
        game.players[0].cards.push(card_of(CardKind::Invention, 61));

        game.apply_action(
            0,
            GameAction::PlayCard {
                card_id: 60,
                choice: Some(CardChoice::Monopoly(Resource::Gas)),
            },
            &mut rng,
        )
        .expect("monopoly");
        assert_eq!(game.players[0].resources.gas, 6);
        assert_eq!(game.players[1].resources.gas, 0);
        assert_eq!(game.players[2].resources.gas, 0);

        // No inline choice: wait for one
        game.apply_action(
            0,
            GameAction::PlayCard {
                card_id: 61,
                choice: None,
            },
            &mut rng,
        )
        .expect("invention");
        assert_eq!(game.mode, InteractionMode::SelectingInventionResources);
        game.apply_action(
            0,
            GameAction::ChooseInventionResources(Resource::Stars, Resource::Stars),
            &mut rng,
        )
        .expect("choice");
        assert_eq!(game.players[0].resources.stars, 2);
        assert_eq!(game.mode, InteractionMode::Idle);
    }

    #[test]
    fn test_road_builder_grants_two_free_roads() {
        let (mut game, mut rng) = new_game(2, 19);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.players[0].cards.push(card_of(CardKind::RoadBuilder, 70));
        let before = game.players[0].resources;

        game.apply_action(
            0,
            GameAction::PlayCard {
                card_id: 70,
                choice: None,
            },
            &mut rng,
        )
        .expect("road builder");
        assert_eq!(game.mode, InteractionMode::BuildingFreeRoads { remaining: 2 });

        for remaining in [1, 0] {
            let edge = game.board.valid_road_spots(0)[0].clone();
            game.apply_action(0, GameAction::PlaceRoad(edge), &mut rng)
                .expect("free road");
            let expected = if remaining == 0 {
                InteractionMode::Idle
            } else {
                InteractionMode::BuildingFreeRoads { remaining }
            };
            assert_eq!(game.mode, expected);
        }
        assert_eq!(game.players[0].resources, before);
        assert_eq!(game.players[0].buildings.roads, 4);
    }

    #[test]
    fn test_gravity_dominion_needs_three_and_strictly_more() {
        let (mut game, mut rng) = new_game(2, 20);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.players[0].resources = ResourceHand::single(Resource::Gas, 20);
        let trade = GameAction::BankTrade {
            give: Resource::Gas,
            want: Resource::Stars,
        };

        game.players[1].gravity_wells_played = 3;
        game.players[0].gravity_wells_played = 2;
        game.apply_action(0, trade.clone(), &mut rng)
            .expect("any action triggers the pass");
        assert!(game.players[1].has_gravity_dominion);

        // Tying the holder is not enough
        game.players[0].gravity_wells_played = 3;
        game.apply_action(0, trade.clone(), &mut rng)
            .expect("trade");
        assert!(game.players[1].has_gravity_dominion);
        assert!(!game.players[0].has_gravity_dominion);

        game.players[0].gravity_wells_played = 4;
        let events = game.apply_action(0, trade, &mut rng).expect("trade");
        assert!(game.players[0].has_gravity_dominion);
        assert!(!game.players[1].has_gravity_dominion);
        assert!(events.contains(&GameEvent::GravityDominionChanged {
            holder: Some(0),
            played: 4
        }));
    }

    #[test]
    fn test_longest_chain_awarded_after_build() {
        let (mut game, mut rng) = new_game(2, 21);
        into_building(&mut game);
        let (vertices, edges) = find_path(&game.board, 5, &HashSet::new()).expect("path");
        game.board.place_settlement(&vertices[0], 0);
        game.players[0].buildings.settlements = 1;
        give(&mut game, 0, plenty());

        for edge in edges {
            game.apply_action(0, GameAction::PlaceRoad(edge), &mut rng)
                .expect("road");
        }
        assert!(game.players[0].has_longest_chain);
        assert_eq!(game.players[0].victory_points, 3);
    }

    #[test]
    fn test_trade_offer_lifecycle() {
        let (mut game, mut rng) = new_game(3, 22);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        for p in &mut game.players {
            p.resources = ResourceHand::with_amounts(2, 2, 0, 0, 0);
        }

        let offer = GameAction::CreateTradeOffer {
            offering: ResourceHand::single(Resource::DarkMatter, 2),
            requesting: ResourceHand::single(Resource::Gas, 1),
        };
        assert_eq!(
            game.apply_action(1, offer.clone(), &mut rng),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(
            game.apply_action(
                0,
                GameAction::CreateTradeOffer {
                    offering: ResourceHand::new(),
                    requesting: ResourceHand::single(Resource::Gas, 1),
                },
                &mut rng
            ),
            Err(GameError::InvalidTrade)
        );
        game.apply_action(0, offer, &mut rng).expect("offer");
        let id = game.trade_offers[0].id;
        assert!(game.valid_actions(2).contains(&GameAction::AcceptTradeOffer(id)));

        assert_eq!(
            game.apply_action(0, GameAction::AcceptTradeOffer(id), &mut rng),
            Err(GameError::InvalidTrade)
        );
        game.apply_action(2, GameAction::AcceptTradeOffer(id), &mut rng)
            .expect("accept");
        assert_eq!(game.players[0].resources, ResourceHand::with_amounts(0, 3, 0, 0, 0));
        assert_eq!(game.players[2].resources, ResourceHand::with_amounts(4, 1, 0, 0, 0));
        assert!(game.trade_offers.is_empty());
    }

    #[test]
    fn test_offers_close_at_end_of_turn() {
        let (mut game, mut rng) = new_game(2, 23);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.players[0].resources = ResourceHand::single(Resource::Dust, 1);

        game.apply_action(
            0,
            GameAction::CreateTradeOffer {
                offering: ResourceHand::single(Resource::Dust, 1),
                requesting: ResourceHand::single(Resource::Energy, 1),
            },
            &mut rng,
        )
        .expect("offer");
        let events = game
            .apply_action(0, GameAction::EndTurn, &mut rng)
            .expect("end");
        assert!(game.trade_offers.is_empty());
        assert!(matches!(events[0], GameEvent::OffersExpired { .. }));
        assert_eq!(game.current_player, 1);
        assert_eq!(game.turn_number, 2);
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_bank_trade_rates() {
        let (mut game, mut rng) = new_game(2, 24);
        finish_setup(&mut game, &mut rng);
        into_building(&mut game);
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 0, 0, 1);
        let rate = game.board.bank_rate(0, Resource::Stars);

        let trade = |give, want| GameAction::BankTrade { give, want };

        assert_eq!(
            game.apply_action(0, trade(Resource::Stars, Resource::Stars), &mut rng),
            Err(GameError::InvalidTrade)
        );
        assert_eq!(
            game.apply_action(0, trade(Resource::Stars, Resource::Gas), &mut rng),
            Err(GameError::CannotAfford)
        );

        game.players[0].resources = ResourceHand::single(Resource::Stars, rate);
        game.apply_action(0, trade(Resource::Stars, Resource::Gas), &mut rng)
            .expect("trade");
        assert_eq!(game.players[0].resources, ResourceHand::single(Resource::Gas, 1));
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let (mut game, mut rng) = new_game(2, 25);
        game.phase = GamePhase::Ended { winner: 1 };
        assert_eq!(
            game.apply_action(1, GameAction::EndTurn, &mut rng),
            Err(GameError::GameOver)
        );
        assert!(game.valid_actions(1).is_empty());
    }

    #[test]
    fn test_card_choices_need_a_pending_card() {
        let (mut game, mut rng) = new_game(2, 28);
        let choices = [
            GameAction::ChooseMonopolyResource(Resource::Gas),
            GameAction::ChooseInventionResources(Resource::Stars, Resource::Stars),
        ];

        // During setup, then with nothing pending in the building phase
        for _ in 0..2 {
            assert_eq!(game.mode, InteractionMode::Idle);
            let before = game.clone();
            for choice in &choices {
                assert_eq!(
                    game.apply_action(0, choice.clone(), &mut rng),
                    Err(GameError::InvalidMode)
                );
                assert_eq!(game, before);
            }
            finish_setup(&mut game, &mut rng);
            into_building(&mut game);
        }
    }

    /// Every command that could be issued in `game`, except open-ended trade offers
    fn every_action(game: &GameState) -> Vec<GameAction> {
        let mut actions = vec![
            GameAction::RollDice,
            GameAction::EndTurn,
            GameAction::CancelMode,
            GameAction::UndoPlacement,
            GameAction::BuyCard,
        ];
        for kind in [
            BuildKind::Road,
            BuildKind::Settlement,
            BuildKind::City,
            BuildKind::Card,
        ] {
            actions.push(GameAction::BeginBuild(kind));
        }
        for vertex in game.board.vertices.keys() {
            actions.push(GameAction::PlaceSettlement(vertex.clone()));
            actions.push(GameAction::UpgradeToCity(vertex.clone()));
        }
        for edge in game.board.edges.keys() {
            actions.push(GameAction::PlaceRoad(edge.clone()));
        }

        let mut choices = vec![None];
        for a in Resource::ALL {
            choices.push(Some(CardChoice::Monopoly(a)));
            for b in Resource::ALL {
                choices.push(Some(CardChoice::Invention(a, b)));
            }
        }
        let card_ids = game
            .players
            .iter()
            .flat_map(|p| p.cards.iter().map(|c| c.id))
            .chain([200]);
        for card_id in card_ids {
            for choice in &choices {
                actions.push(GameAction::PlayCard {
                    card_id,
                    choice: *choice,
                });
            }
        }

        for a in Resource::ALL {
            actions.push(GameAction::ChooseMonopolyResource(a));
            for b in Resource::ALL {
                actions.push(GameAction::ChooseInventionResources(a, b));
                actions.push(GameAction::BankTrade { give: a, want: b });
            }
        }
        for tile in &game.board.tiles {
            actions.push(GameAction::MoveBlackHole(tile.id));
        }
        for p in &game.players {
            actions.push(GameAction::StealFrom(p.id));
        }
        let offer_ids = game.trade_offers.iter().map(|o| o.id).chain([999]);
        for id in offer_ids {
            actions.push(GameAction::AcceptTradeOffer(id));
            actions.push(GameAction::CancelTradeOffer(id));
        }
        actions
    }

    /// One game per phase and interaction mode, with player 0 to act
    fn every_situation() -> Vec<(&'static str, GameState)> {
        let mut rng = StdRng::seed_from_u64(27);
        let mut situations = Vec::new();

        let (mut game, _) = new_game(3, 27);
        situations.push(("setup settlement", game.clone()));
        let spot = game.valid_actions(0).into_iter().next().expect("spot");
        game.apply_action(0, spot, &mut rng).expect("settlement");
        situations.push(("setup road", game.clone()));

        let (mut game, _) = new_game(3, 27);
        finish_setup(&mut game, &mut rng);
        game.players[0].cards.push(card_of(CardKind::GravityWell, 60));
        game.players[0].cards.push(card_of(CardKind::Monopoly, 61));
        game.players[0].cards.push(card_of(CardKind::Invention, 62));
        game.players[0].cards.push(card_of(CardKind::RoadBuilder, 63));
        game.players[0].cards.push(card_of(CardKind::SecretVictory, 64));
        let mut fresh = card_of(CardKind::GravityWell, 65);
        fresh.turn_bought = Some(game.turn_number);
        game.players[0].cards.push(fresh);
        situations.push(("playing", game.clone()));

        into_building(&mut game);
        give(&mut game, 0, plenty());
        give(&mut game, 1, plenty());
        game.apply_action(
            0,
            GameAction::CreateTradeOffer {
                offering: ResourceHand::single(Resource::Dust, 1),
                requesting: ResourceHand::single(Resource::Stars, 5),
            },
            &mut rng,
        )
        .expect("offer");
        let building = game;
        situations.push(("building", building.clone()));

        let mode_after = |action: GameAction| {
            let mut game = building.clone();
            game.apply_action(0, action, &mut StdRng::seed_from_u64(1))
                .expect("enters mode");
            game
        };
        let play = |card_id: u8| GameAction::PlayCard {
            card_id,
            choice: None,
        };
        situations.push(("placing road", mode_after(GameAction::BeginBuild(BuildKind::Road))));
        situations.push((
            "placing settlement",
            mode_after(GameAction::BeginBuild(BuildKind::Settlement)),
        ));
        situations.push((
            "upgrading to city",
            mode_after(GameAction::BeginBuild(BuildKind::City)),
        ));
        situations.push(("free roads", mode_after(play(63))));
        situations.push(("moving black hole", mode_after(play(60))));
        situations.push(("choosing monopoly", mode_after(play(61))));
        situations.push(("choosing invention", mode_after(play(62))));

        let mut game = building.clone();
        game.mode = InteractionMode::SelectingVictim {
            tile: game.board.tiles[0].id,
            candidates: vec![1],
        };
        situations.push(("selecting victim", game));

        let mut game = building;
        game.phase = GamePhase::Ended { winner: 1 };
        situations.push(("ended", game));

        situations
    }

    #[test]
    fn test_valid_actions_match_reducer() {
        let rng = StdRng::seed_from_u64(26);
        for (situation, game) in every_situation() {
            let catalogue = every_action(&game);
            for player in 0..3 {
                let listed = game.valid_actions(player);
                for action in &listed {
                    assert!(
                        catalogue.contains(action),
                        "{}: player {} offered unexpected {:?}",
                        situation,
                        player,
                        action
                    );
                }

                for action in &catalogue {
                    let mut after = game.clone();
                    let result = after.apply_action(player, action.clone(), &mut rng.clone());
                    assert_eq!(
                        result.is_ok(),
                        listed.contains(action),
                        "{}: player {} {:?} -> {:?}",
                        situation,
                        player,
                        action,
                        result
                    );
                    if result.is_err() {
                        assert_eq!(after, game);
                    }
                }
            }
        }
    }
}
