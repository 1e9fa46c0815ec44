// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/decoder.rs - Container decoder for strategy board share codes.
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
 * # `decoder` Module
 *
 * This module turns a share code into the raw board bytes: it reverses the
 * share code cipher, drops the container header, and inflates the zlib
 * stream that follows.
 *
 * ## Usage Example
 *
 * ```no_run
 * use stratboard::decoder::DecodedBoard;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let decoded = DecodedBoard::from_share_code("[stgy:a...]")?;
 *     println!("{} bytes", decoded.content.len());
 *     Ok(())
 * }
 * ```
 */

use std::io::prelude::*;

use flate2::read::ZlibDecoder;
use log::debug;

use crate::cipher::reverse_cipher;
use crate::error::{Error, Result};

/// Size of the container header in front of the zlib stream.
pub const HEADER_LEN: usize = 6;

/// Drops the container header and inflates the remaining zlib stream.
pub fn unwrap(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < HEADER_LEN {
        return Err(Error::format(format!(
            "container is {} bytes, shorter than its header",
            data.len()
        )));
    }

    // Bytes 4..6 hold the inflated length; it is only a capacity hint.
    let capacity = u16::from_le_bytes([data[4], data[5]]) as usize;

    let mut decoder = ZlibDecoder::new(&data[HEADER_LEN..]);
    let mut buffer = Vec::with_capacity(capacity);
    decoder
        .read_to_end(&mut buffer)
        .map_err(|e| Error::format(format!("zlib: {}", e)))?;

    debug!("inflated {} bytes into {} bytes", data.len() - HEADER_LEN, buffer.len());

    Ok(buffer)
}

#[derive(Debug)]
pub struct DecodedBoard {
    /// The uninterpreted container header.
    pub header: [u8; HEADER_LEN],
    /// The inflated board data.
    pub content: Vec<u8>,
}

impl DecodedBoard {
    pub fn from_share_code(code: &str) -> Result<Self> {
        let container = reverse_cipher(code)?;
        let content = unwrap(&container)?;

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&container[..HEADER_LEN]);

        Ok(Self { header, content })
    }
}
