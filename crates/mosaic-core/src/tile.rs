//! Tiles and the shared tile bag.
//!
//! This module contains:
//! - The five-color tile palette
//! - TileCounts for per-color bookkeeping
//! - TileBag, the shared draw pile with its discard bin

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Number of tiles of each color in a fresh bag.
pub const TILES_PER_COLOR: usize = 20;

/// A tile color. Tiles have no identity beyond their color.
///
/// Wire codes are single letters (`B`/`Y`/`R`/`K`/`W`), matching the
/// client protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "Y")]
    Yellow,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "K")]
    Black,
    #[serde(rename = "W")]
    White,
}

impl Tile {
    /// All tile colors, in wall-column offset order.
    pub const ALL: [Tile; 5] = [
        Tile::Blue,
        Tile::Yellow,
        Tile::Red,
        Tile::Black,
        Tile::White,
    ];

    /// Column this color occupies in wall row 0. Each subsequent row
    /// shifts the color one column right (mod 5), tracing a diagonal.
    pub fn column_offset(&self) -> usize {
        match self {
            Tile::Blue => 0,
            Tile::Yellow => 1,
            Tile::Red => 2,
            Tile::Black => 3,
            Tile::White => 4,
        }
    }
}

/// A multiset of tiles as per-color counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCounts {
    pub blue: u32,
    pub yellow: u32,
    pub red: u32,
    pub black: u32,
    pub white: u32,
}

impl TileCounts {
    /// Create an empty count set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of a specific color
    pub fn get(&self, tile: Tile) -> u32 {
        match tile {
            Tile::Blue => self.blue,
            Tile::Yellow => self.yellow,
            Tile::Red => self.red,
            Tile::Black => self.black,
            Tile::White => self.white,
        }
    }

    /// Add tiles of a color
    pub fn add(&mut self, tile: Tile, amount: u32) {
        match tile {
            Tile::Blue => self.blue += amount,
            Tile::Yellow => self.yellow += amount,
            Tile::Red => self.red += amount,
            Tile::Black => self.black += amount,
            Tile::White => self.white += amount,
        }
    }

    /// Total number of tiles counted
    pub fn total(&self) -> u32 {
        self.blue + self.yellow + self.red + self.black + self.white
    }

    /// Check if no tiles are counted
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The shared bag of tiles plus the discard bin tiles return to.
///
/// A fresh bag holds 20 tiles of each of the 5 colors. Tiles cleared
/// from player boards at round end go into the bin via [`recycle`] and
/// re-enter the bag when it runs dry mid-draw.
///
/// [`recycle`]: TileBag::recycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileBag {
    bag: Vec<Tile>,
    bin: Vec<Tile>,
}

impl TileBag {
    /// Create a full, shuffled bag
    pub fn new() -> Self {
        let mut bag = Vec::with_capacity(TILES_PER_COLOR * Tile::ALL.len());
        for tile in Tile::ALL {
            bag.extend(std::iter::repeat(tile).take(TILES_PER_COLOR));
        }
        bag.shuffle(&mut rand::thread_rng());
        Self {
            bag,
            bin: Vec::new(),
        }
    }

    /// Draw up to `count` tiles from the bag.
    ///
    /// If the bag empties mid-draw, the bin is poured back in and
    /// reshuffled before continuing. If both are empty, fewer tiles
    /// than requested are returned; drawing never fails.
    pub fn draw(&mut self, count: usize) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(count);
        for _ in 0..count {
            if self.bag.is_empty() {
                self.refill_from_bin();
            }
            match self.bag.pop() {
                Some(tile) => tiles.push(tile),
                None => break,
            }
        }
        tiles
    }

    /// Drop tiles into the discard bin
    pub fn recycle(&mut self, counts: &TileCounts) {
        for tile in Tile::ALL {
            self.bin
                .extend(std::iter::repeat(tile).take(counts.get(tile) as usize));
        }
    }

    /// Number of tiles currently drawable without a refill
    pub fn remaining(&self) -> usize {
        self.bag.len()
    }

    /// Number of tiles waiting in the discard bin
    pub fn binned(&self) -> usize {
        self.bin.len()
    }

    fn refill_from_bin(&mut self) {
        self.bag.append(&mut self.bin);
        self.bag.shuffle(&mut rand::thread_rng());
    }
}

impl Default for TileBag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fresh_bag_holds_100_tiles() {
        let bag = TileBag::new();
        assert_eq!(bag.remaining(), 100);
        assert_eq!(bag.binned(), 0);
    }

    #[test]
    fn test_draw_removes_tiles() {
        let mut bag = TileBag::new();
        let tiles = bag.draw(4);
        assert_eq!(tiles.len(), 4);
        assert_eq!(bag.remaining(), 96);
    }

    #[test]
    fn test_draw_refills_from_bin() {
        let mut bag = TileBag::new();
        let drawn = bag.draw(100);
        assert_eq!(drawn.len(), 100);
        assert_eq!(bag.remaining(), 0);

        let mut returned = TileCounts::new();
        returned.add(Tile::Red, 3);
        returned.add(Tile::Blue, 2);
        bag.recycle(&returned);
        assert_eq!(bag.binned(), 5);

        // Exhausted bag pulls the bin back in mid-draw.
        let tiles = bag.draw(5);
        assert_eq!(tiles.len(), 5);
        assert_eq!(bag.remaining(), 0);
        assert_eq!(bag.binned(), 0);
    }

    #[test]
    fn test_overdraw_returns_fewer_without_error() {
        let mut bag = TileBag::new();
        let tiles = bag.draw(150);
        assert_eq!(tiles.len(), 100);
        assert!(bag.draw(4).is_empty());
    }

    #[test]
    fn test_tile_conservation_across_draw_and_recycle() {
        let mut bag = TileBag::new();
        let drawn = bag.draw(37);

        let mut counts = TileCounts::new();
        for tile in &drawn {
            counts.add(*tile, 1);
        }
        bag.recycle(&counts);

        assert_eq!(bag.remaining() + bag.binned(), 100);
    }

    #[test]
    fn test_tile_counts_accumulate() {
        let mut counts = TileCounts::new();
        counts.add(Tile::Red, 2);
        counts.add(Tile::Red, 3);
        counts.add(Tile::White, 1);
        assert_eq!(counts.get(Tile::Red), 5);
        assert_eq!(counts.total(), 6);
        assert!(!counts.is_empty());
    }
}
