//! Game context: the authoritative state of one game
//!
//! [`GameContext`] exclusively owns the piece collection and everything
//! derived from it. It is owned by the tick orchestrator and lent by
//! reference to the command pipeline, the collision resolver and the
//! promotion manager; nothing else mutates it.
//!
//! # Storage
//!
//! Pieces live in slots. A captured piece leaves an empty slot behind and a
//! promotion swaps the state machine inside the pawn's slot, so slot indices
//! stay stable for the whole game. The id → slot lookup always lists exactly
//! the live pieces.
//!
//! # Construction
//!
//! Building a context validates the initial placement and fails with a
//! [`GameError`] when:
//! - a side has no king, or more than one
//! - two pieces of the same side share a cell (opposite sides may overlap)
//! - an id is used twice or a piece sits off the board

use crate::core::settings::GameSettings;
use crate::game::assets::{Appearance, AssetCatalog, HeadlessCatalog};
use crate::game::command::Command;
use crate::game::error::{GameError, GameResult, StateResult};
use crate::game::event_bus::EventBus;
use crate::game::events::Event;
use crate::game::layout::BoardLayout;
use crate::game::occupancy::OccupancyIndex;
use crate::game::piece::{Piece, PieceFactory};
use crate::game::promotion::PromotionLedger;
use crate::game::state_machine::StateMachine;
use crate::game::types::{BoardSize, Cell, Millis, PieceId, PieceKind, Side};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct GameContext {
    factory: PieceFactory,
    slots: Vec<Option<Piece>>,
    lookup: HashMap<PieceId, usize>,
    occupancy: OccupancyIndex,
    ledger: PromotionLedger,
    last_origin: HashMap<PieceId, Cell>,
    appearances: HashMap<PieceId, Appearance>,
    assets: Box<dyn AssetCatalog>,
    bus: Arc<EventBus>,
}

impl GameContext {
    /// Context over already-built pieces
    pub fn new(pieces: Vec<Piece>, factory: PieceFactory, bus: Arc<EventBus>) -> GameResult<Self> {
        validate_placement(
            factory.settings().board,
            pieces.iter().map(|piece| (&piece.id, piece.current_cell())),
        )?;

        let lookup = pieces
            .iter()
            .enumerate()
            .map(|(slot, piece)| (piece.id.clone(), slot))
            .collect();
        let mut ctx = Self {
            factory,
            slots: pieces.into_iter().map(Some).collect(),
            lookup,
            occupancy: OccupancyIndex::new(),
            ledger: PromotionLedger::default(),
            last_origin: HashMap::new(),
            appearances: HashMap::new(),
            assets: Box::new(HeadlessCatalog),
            bus,
        };
        ctx.load_appearances();
        ctx.rebuild_occupancy();
        Ok(ctx)
    }

    /// Context seeded from a layout; the layout's board size wins
    pub fn from_layout(
        layout: &BoardLayout,
        settings: &GameSettings,
        bus: Arc<EventBus>,
        now: Millis,
    ) -> GameResult<Self> {
        let factory = PieceFactory::new(GameSettings {
            board: layout.board,
            ..settings.clone()
        });
        validate_placement(
            layout.board,
            layout.placements.iter().map(|(id, cell)| (id, *cell)),
        )?;
        let pieces = layout
            .placements
            .iter()
            .map(|(id, cell)| factory.piece(id.clone(), *cell, now))
            .collect::<GameResult<Vec<_>>>()?;
        Self::new(pieces, factory, bus)
    }

    /// Swap the presentation collaborator and reload every appearance
    pub fn with_assets(mut self, assets: Box<dyn AssetCatalog>) -> Self {
        self.assets = assets;
        self.load_appearances();
        self
    }

    fn load_appearances(&mut self) {
        self.appearances.clear();
        for piece in self.slots.iter().flatten() {
            let appearance = match self.assets.appearance(piece.kind(), piece.side()) {
                Ok(appearance) => appearance,
                Err(e) => {
                    warn!("[ASSETS] {} uses a placeholder: {}", piece.id, e);
                    Appearance::placeholder(piece.kind(), piece.side())
                }
            };
            self.appearances.insert(piece.id.clone(), appearance);
        }
    }

    pub fn board(&self) -> BoardSize {
        self.factory.settings().board
    }

    pub fn factory(&self) -> &PieceFactory {
        &self.factory
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn publish(&self, event: &Event) {
        self.bus.publish(event);
    }

    pub fn piece(&self, id: &str) -> Option<&Piece> {
        let slot = *self.lookup.get(id)?;
        self.slots.get(slot)?.as_ref()
    }

    pub fn piece_mut(&mut self, id: &str) -> Option<&mut Piece> {
        let slot = *self.lookup.get(id)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    /// Live pieces in slot order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Whether `side` still has a king on the board
    pub fn king_alive(&self, side: Side) -> bool {
        self.pieces()
            .any(|piece| piece.kind() == PieceKind::King && piece.side() == side)
    }

    pub fn king_count(&self) -> usize {
        self.pieces().filter(|piece| piece.id.is_king()).count()
    }

    /// Advance every piece to `now`
    pub fn update_all(&mut self, now: Millis) {
        for piece in self.slots.iter_mut().flatten() {
            piece.update(now);
        }
    }

    /// Re-seat every piece idle at its cell as of `now`
    pub fn reset_clocks(&mut self, now: Millis) {
        for piece in self.slots.iter_mut().flatten() {
            let cell = piece.current_cell();
            piece
                .machine
                .reset(&Command::idle(now, piece.id.as_str(), cell));
        }
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn rebuild_occupancy(&mut self) {
        self.occupancy.rebuild(
            self.slots
                .iter()
                .flatten()
                .map(|piece| (&piece.id, piece.current_cell())),
        );
    }

    /// Forward a command to a piece's state machine
    ///
    /// `None` when the id doesn't resolve to a live piece.
    pub fn apply_command(&mut self, id: &str, cmd: &Command) -> Option<StateResult<()>> {
        let slot = *self.lookup.get(id)?;
        let piece = self.slots.get_mut(slot)?.as_mut()?;
        Some(piece.machine.on_command(cmd, &self.occupancy))
    }

    /// Take a piece off the board
    pub fn remove(&mut self, id: &str) -> Option<Piece> {
        let slot = self.lookup.remove(id)?;
        let piece = self.slots.get_mut(slot)?.take();
        self.appearances.remove(id);
        self.last_origin.remove(id);
        piece
    }

    /// Atomically give the piece in `old`'s slot a new id and machine
    pub fn replace_identity(&mut self, old: &PieceId, new_id: PieceId, machine: StateMachine) -> bool {
        if self.lookup.contains_key(new_id.as_str()) {
            warn!("[CONTEXT] Refusing to reuse live id {}", new_id);
            return false;
        }
        let Some(slot) = self.lookup.remove(old.as_str()) else {
            return false;
        };
        let Some(entry) = self.slots.get_mut(slot) else {
            return false;
        };
        *entry = Some(Piece::new(new_id.clone(), machine));
        self.lookup.insert(new_id.clone(), slot);

        if let Some(appearance) = self.appearances.remove(old.as_str()) {
            self.appearances.insert(new_id.clone(), appearance);
        }
        if let Some(origin) = self.last_origin.remove(old.as_str()) {
            self.last_origin.insert(new_id, origin);
        }
        true
    }

    pub fn ledger(&self) -> &PromotionLedger {
        &self.ledger
    }

    pub fn record_promotion(&mut self, pawn: &PieceId, queen: &PieceId) {
        self.ledger.record(pawn, queen);
    }

    pub fn mint_queen_id(&self, side: Side) -> PieceId {
        self.ledger
            .next_queen_id(side, |candidate| self.lookup.contains_key(candidate))
    }

    /// Remember where a piece stood before its latest command
    pub fn record_origin(&mut self, id: &PieceId, cell: Cell) {
        self.last_origin.insert(id.clone(), cell);
    }

    pub fn origin_of(&self, id: &str) -> Option<Cell> {
        self.last_origin.get(id).copied()
    }

    pub fn appearance(&self, id: &str) -> Option<&Appearance> {
        self.appearances.get(id)
    }

    /// Try to give a piece the appearance of its current kind
    ///
    /// Keeps the previous appearance on failure.
    pub fn refresh_appearance(&mut self, id: &PieceId) -> bool {
        match self.assets.appearance(id.kind(), id.side()) {
            Ok(appearance) => {
                self.appearances.insert(id.clone(), appearance);
                true
            }
            Err(e) => {
                warn!(
                    "[ASSETS] Could not load appearance for {}: {}; keeping previous",
                    id, e
                );
                false
            }
        }
    }

    /// Promoted queens not yet wearing a queen appearance
    pub fn pending_fixups(&self) -> Vec<PieceId> {
        self.ledger
            .promoted_queens()
            .filter_map(|id| self.lookup.get_key_value(id).map(|(key, _)| key))
            .filter(|id| {
                self.appearances
                    .get(id.as_str())
                    .map_or(true, |appearance| appearance.kind != PieceKind::Queen)
            })
            .cloned()
            .collect()
    }

    /// Re-apply presentation for promoted queens that still need it
    pub fn apply_fixups(&mut self) {
        for id in self.pending_fixups() {
            if let Ok(appearance) = self.assets.appearance(id.kind(), id.side()) {
                info!("[ASSETS] Restored queen appearance for {}", id);
                self.appearances.insert(id, appearance);
            } else {
                debug!("[ASSETS] Queen appearance for {} still unavailable", id);
            }
        }
    }
}

/// Structural checks on an initial placement
pub fn validate_placement<'a>(
    board: BoardSize,
    placements: impl IntoIterator<Item = (&'a PieceId, Cell)>,
) -> GameResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut by_cell: HashMap<(Cell, Side), &PieceId> = HashMap::new();
    let mut kings: HashMap<Side, usize> = HashMap::new();

    for (id, cell) in placements {
        if !seen.insert(id.as_str()) {
            return Err(GameError::DuplicatePieceId { id: id.to_string() });
        }
        if !board.contains(cell) {
            return Err(GameError::OutOfBounds {
                id: id.to_string(),
                cell,
            });
        }
        if let Some(first) = by_cell.insert((cell, id.side()), id) {
            return Err(GameError::SameSideOverlap {
                first: first.to_string(),
                second: id.to_string(),
                cell,
            });
        }
        if id.is_king() {
            *kings.entry(id.side()).or_insert(0) += 1;
        }
    }

    for side in [Side::White, Side::Black] {
        match kings.get(&side).copied().unwrap_or(0) {
            0 => return Err(GameError::MissingKing { side }),
            1 => {}
            count => return Err(GameError::DuplicateKing { side, count }),
        }
    }
    Ok(())
}

impl std::fmt::Debug for GameContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameContext")
            .field("board", &self.board())
            .field("pieces", &self.lookup.len())
            .field("ledger", &self.ledger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(layout: &str) -> GameContext {
        let layout = BoardLayout::parse_csv(layout).unwrap();
        GameContext::from_layout(&layout, &GameSettings::default(), Arc::new(EventBus::new()), 0)
            .expect("valid layout")
    }

    #[test]
    fn test_lookup_and_occupancy_agree() {
        let ctx = context(crate::game::layout::STANDARD_LAYOUT);
        assert_eq!(ctx.len(), 32);
        assert_eq!(ctx.occupancy().len(), 32);
        for id in ctx.occupancy().ids() {
            assert!(ctx.contains(id.as_str()));
        }
        assert_eq!(ctx.piece("QW1").unwrap().current_cell(), Cell::new(7, 3));
    }

    #[test]
    fn test_missing_king_rejected() {
        let layout = BoardLayout::standard().without_piece("KB1");
        let result =
            GameContext::from_layout(&layout, &GameSettings::default(), Arc::new(EventBus::new()), 0);
        assert!(matches!(
            result,
            Err(GameError::MissingKing { side: Side::Black })
        ));
    }

    #[test]
    fn test_same_side_overlap_rejected() {
        let layout = BoardLayout::empty(BoardSize::STANDARD)
            .with_piece("KW1", Cell::new(7, 4))
            .and_then(|l| l.with_piece("KB1", Cell::new(0, 4)))
            .and_then(|l| l.with_piece("RW1", Cell::new(3, 3)))
            .and_then(|l| l.with_piece("NW1", Cell::new(3, 3)))
            .unwrap();
        let result =
            GameContext::from_layout(&layout, &GameSettings::default(), Arc::new(EventBus::new()), 0);
        assert!(matches!(result, Err(GameError::SameSideOverlap { .. })));
    }

    #[test]
    fn test_opposite_sides_may_overlap() {
        let layout = BoardLayout::empty(BoardSize::STANDARD)
            .with_piece("KW1", Cell::new(7, 4))
            .and_then(|l| l.with_piece("KB1", Cell::new(0, 4)))
            .and_then(|l| l.with_piece("PW2", Cell::new(4, 4)))
            .and_then(|l| l.with_piece("PB2", Cell::new(4, 4)))
            .unwrap();
        assert!(GameContext::from_layout(
            &layout,
            &GameSettings::default(),
            Arc::new(EventBus::new()),
            0
        )
        .is_ok());
    }

    #[test]
    fn test_two_kings_one_side_rejected() {
        let result = BoardLayout::parse_csv("KB,KB\nKW,").map(|layout| {
            GameContext::from_layout(&layout, &GameSettings::default(), Arc::new(EventBus::new()), 0)
        });
        assert!(matches!(
            result,
            Ok(Err(GameError::DuplicateKing { side: Side::Black, count: 2 }))
        ));
    }

    #[test]
    fn test_remove_leaves_tombstone() {
        let mut ctx = context("KB,RB\n,\nKW,");
        let removed = ctx.remove("RB1").expect("live rook");
        assert_eq!(removed.id.as_str(), "RB1");
        assert!(!ctx.contains("RB1"));
        assert!(ctx.remove("RB1").is_none());

        ctx.rebuild_occupancy();
        assert_eq!(ctx.occupancy().len(), 2);
    }

    #[test]
    fn test_replace_identity_is_atomic() {
        let mut ctx = context("KB,\nPW,\nKW,");
        let old = PieceId::parse("PW1").unwrap();
        let new_id = PieceId::promoted_queen(Side::White, 1);
        let machine = ctx
            .factory()
            .machine(PieceKind::Queen, Side::White, Cell::new(1, 0), 0)
            .unwrap();

        assert!(ctx.replace_identity(&old, new_id.clone(), machine));
        assert!(!ctx.contains("PW1"));
        assert_eq!(ctx.piece("QW_1").unwrap().kind(), PieceKind::Queen);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_unknown_command_target() {
        let mut ctx = context("KB,\n,\nKW,");
        let cmd = Command::relocate(0, "ZZ9", Cell::new(0, 0), Cell::new(1, 0));
        assert!(ctx.apply_command("ZZ9", &cmd).is_none());
    }
}
