//! Pawn promotion
//!
//! A surviving pawn standing on the opposing back rank (row 0 for White, the
//! last row for Black) is turned into a queen. Promotion is an identity swap:
//! the pawn's id is retired, a fresh `Q<side>_<n>` id is minted and a newly
//! built queen state machine takes over the same slot, idle at the pawn's
//! cell. The retired id never resolves to a live piece again.
//!
//! # Ledger
//!
//! [`PromotionLedger`] remembers every promoted pawn id and every queen id
//! minted by promotion, for the whole game. It makes promotion idempotent per
//! pawn and keeps minted ids unique even after the queen is captured.
//!
//! # Failure policy
//!
//! If the configured queen physics can't be built the queen falls back to the
//! default profile; if its appearance can't be loaded it keeps the pawn's
//! appearance until the per-tick fixup succeeds. Either way the promotion
//! commits and nothing propagates to the tick loop.

use crate::core::settings::PhysicsProfile;
use crate::game::context::GameContext;
use crate::game::events::Event;
use crate::game::state_machine::StateMachine;
use crate::game::types::{Millis, PieceId, PieceKind, Side};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Pawns already promoted and queens created by promotion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionLedger {
    promoted_pawns: BTreeSet<String>,
    promoted_queens: BTreeSet<String>,
}

impl PromotionLedger {
    pub fn is_promoted_pawn(&self, id: &str) -> bool {
        self.promoted_pawns.contains(id)
    }

    pub fn is_promoted_queen(&self, id: &str) -> bool {
        self.promoted_queens.contains(id)
    }

    /// Smallest `Q<side>_<n>` that was never minted and isn't live
    pub fn next_queen_id(&self, side: Side, is_live: impl Fn(&str) -> bool) -> PieceId {
        let mut n = 1;
        loop {
            let candidate = PieceId::promoted_queen(side, n);
            if !self.promoted_queens.contains(candidate.as_str()) && !is_live(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn record(&mut self, pawn: &PieceId, queen: &PieceId) {
        self.promoted_pawns.insert(pawn.to_string());
        self.promoted_queens.insert(queen.to_string());
    }

    pub fn promoted_queens(&self) -> impl Iterator<Item = &str> {
        self.promoted_queens.iter().map(String::as_str)
    }

    pub fn promoted_pawns(&self) -> impl Iterator<Item = &str> {
        self.promoted_pawns.iter().map(String::as_str)
    }
}

/// Promote `id` if it is an unpromoted pawn on its promotion row
///
/// Returns the new queen id when a promotion happened.
pub fn check_promotion(ctx: &mut GameContext, id: &str, now: Millis) -> Option<PieceId> {
    let piece = ctx.piece(id)?;
    if piece.kind() != PieceKind::Pawn || ctx.ledger().is_promoted_pawn(id) {
        return None;
    }
    let cell = piece.current_cell();
    if cell.row != ctx.board().promotion_row(piece.side()) {
        return None;
    }
    promote(ctx, id, now)
}

/// Check every live pawn, in id order
pub fn check_all_promotions(ctx: &mut GameContext, now: Millis) -> Vec<PieceId> {
    let mut pawns: Vec<PieceId> = ctx
        .pieces()
        .filter(|piece| piece.kind() == PieceKind::Pawn)
        .map(|piece| piece.id.clone())
        .collect();
    pawns.sort();

    pawns
        .iter()
        .filter_map(|pawn| check_promotion(ctx, pawn.as_str(), now))
        .collect()
}

fn promote(ctx: &mut GameContext, id: &str, now: Millis) -> Option<PieceId> {
    let piece = ctx.piece(id)?;
    let old_id = piece.id.clone();
    let side = old_id.side();
    let cell = piece.current_cell();

    let new_id = ctx.mint_queen_id(side);
    let machine = match ctx.factory().machine(PieceKind::Queen, side, cell, now) {
        Ok(machine) => machine,
        Err(e) => {
            warn!(
                "[PROMOTION] Queen physics unavailable for {} ({}); using defaults",
                old_id, e
            );
            StateMachine::standard(
                PieceKind::Queen,
                side,
                ctx.board(),
                &PhysicsProfile::default(),
                cell,
                now,
            )
        }
    };

    if !ctx.replace_identity(&old_id, new_id.clone(), machine) {
        return None;
    }
    ctx.record_promotion(&old_id, &new_id);
    ctx.refresh_appearance(&new_id);

    info!("[PROMOTION] {} promoted to {} at {}", old_id, new_id, cell);
    ctx.publish(&Event::promotion(&old_id, &new_id, cell, now));
    Some(new_id)
}
