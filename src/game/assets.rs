//! Presentation collaborator interface
//!
//! The engine never draws anything, but it does keep track of which
//! appearance each live piece was given so that a renderer can pick it up and
//! so that promoted queens still wearing a pawn's appearance get retried.
//!
//! Loading failures are never fatal: a piece whose appearance can't be loaded
//! keeps a best-effort placeholder and the game carries on.

use crate::game::error::AssetError;
use crate::game::types::{PieceKind, Side};
use std::path::PathBuf;

/// What a renderer should draw for a piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub kind: PieceKind,
    pub side: Side,
    /// Directory holding the sprite set, when loaded from disk
    pub source: Option<PathBuf>,
}

impl Appearance {
    /// Appearance with no backing sprites
    pub fn placeholder(kind: PieceKind, side: Side) -> Self {
        Self {
            kind,
            side,
            source: None,
        }
    }

    /// Two-letter piece code, e.g. `QW`
    pub fn code(&self) -> String {
        format!("{}{}", self.kind.code(), self.side.code())
    }
}

/// Source of piece appearances
pub trait AssetCatalog: Send {
    fn appearance(&self, kind: PieceKind, side: Side) -> Result<Appearance, AssetError>;
}

/// Catalog that never fails; used for headless games
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessCatalog;

impl AssetCatalog for HeadlessCatalog {
    fn appearance(&self, kind: PieceKind, side: Side) -> Result<Appearance, AssetError> {
        Ok(Appearance::placeholder(kind, side))
    }
}

/// Sprite sets on disk, laid out as `<root>/<code>/states/idle/`
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetCatalog for DirectoryCatalog {
    fn appearance(&self, kind: PieceKind, side: Side) -> Result<Appearance, AssetError> {
        if !self.root.is_dir() {
            return Err(AssetError::LoadFailed {
                message: format!("pieces root {:?} is not a directory", self.root),
            });
        }
        let code = format!("{}{}", kind.code(), side.code());
        let dir = self.root.join(&code).join("states").join("idle");
        if !dir.is_dir() {
            return Err(AssetError::MissingSprites {
                kind,
                side,
                state: "idle".to_string(),
            });
        }
        Ok(Appearance {
            kind,
            side,
            source: Some(dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_headless_catalog_always_succeeds() {
        let appearance = HeadlessCatalog
            .appearance(PieceKind::Queen, Side::Black)
            .unwrap();
        assert_eq!(appearance.code(), "QB");
        assert!(appearance.source.is_none());
    }

    #[test]
    fn test_directory_catalog_lookup() {
        let root = std::env::temp_dir().join(format!("kungfu-pieces-{}", std::process::id()));
        fs::create_dir_all(root.join("QW").join("states").join("idle")).unwrap();
        let catalog = DirectoryCatalog::new(&root);

        let queen = catalog.appearance(PieceKind::Queen, Side::White).unwrap();
        assert!(queen.source.unwrap().ends_with("QW/states/idle"));

        let missing = catalog.appearance(PieceKind::Rook, Side::White);
        assert!(matches!(missing, Err(AssetError::MissingSprites { .. })));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_directory_catalog_missing_root() {
        let catalog = DirectoryCatalog::new("/definitely/not/here");
        assert!(matches!(
            catalog.appearance(PieceKind::King, Side::White),
            Err(AssetError::LoadFailed { .. })
        ));
    }
}
