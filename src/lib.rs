// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - Decoder and renderer library for FFXIV strategy boards.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `stratboard` Crate
 *
 * A library for decoding, parsing, and rendering FFXIV strategy board share
 * codes.
 *
 * This crate provides a full pipeline from a `[stgy:a...]` share code to an
 * image:
 *
 * 1. [cipher]: Reverses the share code cipher into the container bytes.
 * 2. [decoder]: Drops the container header and inflates the board data.
 * 3. [parser]: Converts the board data into a [Board] and its objects.
 * 4. [geometry]: Classifies objects and computes their shapes and placement.
 * 5. [render]: Draws the board onto a 1024x768 canvas using the imagery from
 *    an [AssetProvider], such as the ones in [assets].
 *
 * ## Usage Example
 *
 * ```no_run
 * use stratboard::assets::DirectoryAssets;
 * use stratboard::decoder::DecodedBoard;
 * use stratboard::parser::Board;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Decode the share code
 *     let decoded = DecodedBoard::from_share_code("[stgy:a...]")?;
 *
 *     // Parse the decoded board
 *     let board = Board::from_decoded(&decoded)?;
 *     for object in &board.objects {
 *         println!("Object {} at ({}, {})", object.type_id, object.x, object.y);
 *     }
 *
 *     // Render it
 *     let assets = DirectoryAssets::open("assets")?;
 *     let raster = stratboard::render(&board, &assets)?;
 *     std::fs::write("board.png", raster.encode_png()?)?;
 *
 *     Ok(())
 * }
 * ```
 */

pub mod assets;
pub mod cipher;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod parser;
pub mod render;

pub use error::{Error, Result};
pub use parser::{Board, BoardObject};
pub use render::{AssetProvider, Raster, render};

/// Decodes and parses a share code.
pub fn load(code: &str) -> Result<Board> {
    let decoded = decoder::DecodedBoard::from_share_code(code)?;
    Board::from_decoded(&decoded)
}
