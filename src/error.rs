// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Error types for strategy board decoding and rendering.
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

use std::io;

use thiserror::Error;

/// Errors produced while decoding, parsing, or rendering a strategy board.
#[derive(Error, Debug)]
pub enum Error {
    /// The share code or its decoded payload is malformed.
    #[error("invalid strategy board: {0}")]
    Format(String),

    /// A section tag did not match the value expected at its position.
    #[error("unexpected section number: expected {expected}, found {found}")]
    Section { expected: u16, found: u16 },

    /// A column section declared a different object count than the object list.
    #[error("unexpected number of objects in section {section}: expected {expected}, found {found}")]
    ObjectCount {
        section: u16,
        expected: usize,
        found: usize,
    },

    /// A sprite, background, mask, or font could not be resolved.
    #[error("asset not found: {0}")]
    Asset(String),

    /// A drawing routine was handed an object type it does not draw.
    #[error("unexpected object type: {0}")]
    UnsupportedObject(u16),

    /// The canvas could not be allocated or encoded.
    #[error("raster error: {0}")]
    Raster(String),

    /// An I/O error raised by an asset provider.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    pub(crate) fn asset(msg: impl Into<String>) -> Self {
        Error::Asset(msg.into())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(error: base64::DecodeError) -> Self {
        Error::Format(format!("base64: {}", error))
    }
}

impl From<image::ImageError> for Error {
    fn from(error: image::ImageError) -> Self {
        Error::Asset(error.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Error::Asset(format!("manifest: {}", error))
    }
}
