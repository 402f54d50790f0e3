//! Commands players can issue and the events they produce.
//!
//! A presentation layer drives the engine purely through [`GameAction`] and
//! reacts to the returned [`GameEvent`]s (sounds, animations, toasts).

use crate::board::{EdgeId, PlayerId, Resource, TileId, VertexId};
use crate::game::InteractionMode;
use crate::player::{BuildKind, CardKind, ResourceHand};
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Turn Actions ====================
    /// Roll the dice (start of turn)
    RollDice,
    /// End your turn
    EndTurn,

    // ==================== Building ====================
    /// Enter a placement mode after an afford check (not for cards)
    BeginBuild(BuildKind),
    /// Leave the current placement or free-road mode
    CancelMode,
    /// Place a settlement (setup or paid)
    PlaceSettlement(VertexId),
    /// Place a road (setup, paid, or free)
    PlaceRoad(EdgeId),
    /// Upgrade your settlement to a city
    UpgradeToCity(VertexId),
    /// Take back the settlement of the current setup step
    UndoPlacement,

    // ==================== Action Cards ====================
    /// Buy the top card of the deck
    BuyCard,
    /// Play a card from hand; monopoly/invention may carry their choice
    PlayCard {
        card_id: u8,
        choice: Option<CardChoice>,
    },
    /// Resolve a pending monopoly
    ChooseMonopolyResource(Resource),
    /// Resolve a pending invention
    ChooseInventionResources(Resource, Resource),

    // ==================== Black Hole ====================
    /// Move the black hole to another tile
    MoveBlackHole(TileId),
    /// Steal a random unit from one of the candidates
    StealFrom(PlayerId),

    // ==================== Trading ====================
    /// Post an offer to every other player
    CreateTradeOffer {
        offering: ResourceHand,
        requesting: ResourceHand,
    },
    /// Accept someone else's offer
    AcceptTradeOffer(u32),
    /// Withdraw your own offer
    CancelTradeOffer(u32),
    /// Trade with the bank at your best rate
    BankTrade { give: Resource, want: Resource },
}

/// Inline choice for cards that need one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardChoice {
    Monopoly(Resource),
    Invention(Resource, Resource),
}

/// A player-to-player trade offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub id: u32,
    /// Player making the offer
    pub from: PlayerId,
    pub offering: ResourceHand,
    pub requesting: ResourceHand,
    /// Logical clock value when the offer was posted
    pub created_at: u64,
}

impl TradeOffer {
    /// Both sides must ask for something
    pub fn is_valid(&self) -> bool {
        !self.offering.is_empty() && !self.requesting.is_empty()
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// Production after a roll, as `(player, resource, amount)`
    ResourcesProduced {
        distributions: Vec<(PlayerId, Resource, u32)>,
    },

    /// Random discard on a 7
    ResourcesDiscarded {
        player: PlayerId,
        discarded: ResourceHand,
    },

    /// Round-2 setup grant
    StartingResources {
        player: PlayerId,
        resources: ResourceHand,
    },

    ModeChanged {
        player: PlayerId,
        mode: InteractionMode,
    },

    SettlementPlaced {
        player: PlayerId,
        vertex: VertexId,
    },

    RoadPlaced {
        player: PlayerId,
        edge: EdgeId,
        free: bool,
    },

    CityUpgraded {
        player: PlayerId,
        vertex: VertexId,
    },

    PlacementUndone {
        player: PlayerId,
        vertex: VertexId,
    },

    CardBought {
        player: PlayerId,
    },

    CardPlayed {
        player: PlayerId,
        kind: CardKind,
    },

    MonopolyResolved {
        player: PlayerId,
        resource: Resource,
        total: u32,
    },

    InventionResolved {
        player: PlayerId,
        resources: (Resource, Resource),
    },

    BlackHoleMoved {
        player: PlayerId,
        from: TileId,
        to: TileId,
    },

    /// `resource` is `None` when the victim had nothing
    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        resource: Option<Resource>,
    },

    TradeOffered {
        offer: TradeOffer,
    },

    TradeAccepted {
        offer_id: u32,
        from: PlayerId,
        to: PlayerId,
    },

    TradeCancelled {
        offer_id: u32,
    },

    /// Offers dropped because the offering player can no longer cover them
    OffersExpired {
        offer_ids: Vec<u32>,
    },

    BankTrade {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    LongestChainChanged {
        holder: Option<PlayerId>,
        length: u32,
    },

    GravityDominionChanged {
        holder: Option<PlayerId>,
        played: u32,
    },

    SetupCompleted,

    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    GameWon {
        winner: PlayerId,
        victory_points: u32,
    },
}
