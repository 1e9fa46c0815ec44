// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/parser.rs - Parser library for strategy board data.
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
 * # `parser` Module
 *
 * This module provides functionality to parse decoded strategy board data
 * into a [Board] and its list of [BoardObject]s.
 *
 * The board data is a fixed sequence of tagged sections. The object list
 * comes first, followed by one column section per object property, each
 * holding one value per object in list order.
 *
 * ## Usage Example
 *
 * ```no_run
 * use stratboard::decoder::DecodedBoard;
 * use stratboard::parser::Board;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Decode the share code
 *     let decoded = DecodedBoard::from_share_code("[stgy:a...]")?;
 *
 *     // Parse the decoded board
 *     let board = Board::from_decoded(&decoded)?;
 *
 *     // Access parsed data
 *     for object in &board.objects {
 *         println!("Object {} at ({}, {})", object.type_id, object.x, object.y);
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

use log::debug;

use crate::decoder::DecodedBoard;
use crate::error::{Error, Result};

/// Reserved object type ids with dedicated drawing routines.
pub mod object_type {
    /// Circular area of effect, drawn as an arc masked by the circle image.
    pub const CIRCLE_AOE: u16 = 10;
    /// Rectangular area of effect.
    pub const LINE_AOE: u16 = 11;
    /// Line between two points.
    pub const LINE: u16 = 12;
    /// Fan or donut shaped area of effect.
    pub const FAN_AOE: u16 = 17;
    /// Text label.
    pub const TEXT: u16 = 100;
}

/// Width of the rendered canvas in pixels.
pub const CANVAS_WIDTH: u32 = 1024;
/// Height of the rendered canvas in pixels.
pub const CANVAS_HEIGHT: u32 = 768;

const SOURCE_WIDTH: f64 = 5120.0;
const SOURCE_HEIGHT: f64 = 3840.0;

pub const FLAG_VISIBLE: u16 = 1 << 0;
pub const FLAG_FLIP_HORIZONTAL: u16 = 1 << 1;
pub const FLAG_FLIP_VERTICAL: u16 = 1 << 2;
/// Locked in the editor. Has no effect on rendering.
pub const FLAG_LOCKED: u16 = 1 << 3;

const DATA_OFFSET: usize = 24;

const SECTION_NAME: u16 = 1;
const SECTION_OBJECT: u16 = 2;
const SECTION_TEXT: u16 = 3;
const SECTION_FLAGS: u16 = 4;
const SECTION_POSITION: u16 = 5;
const SECTION_ANGLE: u16 = 6;
const SECTION_SCALE: u16 = 7;
const SECTION_COLOR: u16 = 8;
const SECTION_PARAMS: [u16; 3] = [10, 11, 12];
const SECTION_BACKGROUND: u16 = 3;

/// Converts a coordinate pair from board space to canvas space.
pub fn rescale(x: i32, y: i32) -> (i32, i32) {
    (
        (f64::from(x) / SOURCE_WIDTH * f64::from(CANVAS_WIDTH)).round() as i32,
        (f64::from(y) / SOURCE_HEIGHT * f64::from(CANVAS_HEIGHT)).round() as i32,
    )
}

/// Converts a 0-100 transparency percentage to an 8-bit alpha value.
pub fn alpha_from_transparency(transparency: u8) -> u8 {
    (255.0 * (1.0 - f64::from(transparency) / 100.0)).round() as u8
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Derived from the stored transparency percentage.
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Represents a single marker or effect placed on the board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardObject {
    /// The object type, see [object_type] for the ones with special behavior.
    pub type_id: u16,
    /// The label text. Empty for everything but [object_type::TEXT].
    pub text: String,
    pub visible: bool,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// The X-coordinate on the canvas.
    pub x: i32,
    /// The Y-coordinate on the canvas.
    pub y: i32,
    /// The rotation angle in degrees.
    pub angle: i16,
    pub color: Color,
    pub scale: u8,
    /// Type-specific parameters from sections 10, 11 and 12.
    pub params: [i16; 3],
}

impl BoardObject {
    /// Returns the object's scale multiplied by `factor`, negated along
    /// each flipped axis.
    pub fn scale_factor(&self, factor: f32) -> (f32, f32) {
        let scale = f32::from(self.scale) * factor;
        let flip_h = if self.flip_horizontal { -1.0 } else { 1.0 };
        let flip_v = if self.flip_vertical { -1.0 } else { 1.0 };
        (scale * flip_h, scale * flip_v)
    }
}

/// A fully parsed strategy board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    /// The name of the board.
    pub name: String,
    /// The background image id.
    pub background_id: u16,
    /// The objects on the board, in the order they were stored.
    pub objects: Vec<BoardObject>,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let bytes = &self.data[self.pos..end];
                self.pos = end;
                Ok(bytes)
            }
            None => Err(Error::format(format!(
                "unexpected end of board data reading {} bytes at offset {}",
                len, self.pos
            ))),
        }
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn rewind(&mut self, len: usize) {
        self.pos -= len;
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    // Strings are NUL-padded to a multiple of four bytes.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Ok(String::from_utf8_lossy(&bytes[..end]).to_string())
    }

    fn expect_tag(&mut self, expected: u16) -> Result<()> {
        let found = self.read_u16()?;
        if found != expected {
            return Err(Error::Section { expected, found });
        }
        Ok(())
    }

    fn section_header(&mut self, section: u16, object_count: usize) -> Result<()> {
        self.expect_tag(section)?;
        self.skip(2)?;
        let found = self.read_u16()? as usize;
        if found != object_count {
            return Err(Error::ObjectCount {
                section,
                expected: object_count,
                found,
            });
        }
        Ok(())
    }
}

impl Board {
    /// Parses decoded board data.
    ///
    /// # Arguments
    ///
    /// * `data` - The inflated board bytes.
    ///
    /// # Returns
    ///
    /// A `Result` containing the parsed `Board` or an error.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data, DATA_OFFSET);

        reader.expect_tag(SECTION_NAME)?;
        let name = reader.read_string()?;

        let mut objects = Vec::new();
        loop {
            if reader.read_u16()? != SECTION_OBJECT {
                reader.rewind(2);
                break;
            }
            let type_id = reader.read_u16()?;
            let text = if type_id == object_type::TEXT {
                reader.expect_tag(SECTION_TEXT)?;
                reader.read_string()?
            } else {
                String::new()
            };
            objects.push(BoardObject {
                type_id,
                text,
                ..Default::default()
            });
        }
        let count = objects.len();

        reader.section_header(SECTION_FLAGS, count)?;
        for object in &mut objects {
            let flags = reader.read_u16()?;
            object.visible = flags & FLAG_VISIBLE != 0;
            object.flip_horizontal = flags & FLAG_FLIP_HORIZONTAL != 0;
            object.flip_vertical = flags & FLAG_FLIP_VERTICAL != 0;
        }

        reader.section_header(SECTION_POSITION, count)?;
        for object in &mut objects {
            let raw_x = reader.read_u16()?;
            let raw_y = reader.read_u16()?;
            (object.x, object.y) = rescale(i32::from(raw_x), i32::from(raw_y));
        }

        reader.section_header(SECTION_ANGLE, count)?;
        for object in &mut objects {
            object.angle = reader.read_i16()?;
        }

        reader.section_header(SECTION_SCALE, count)?;
        for object in &mut objects {
            object.scale = reader.read_u8()?;
        }
        // Columns are 2-byte aligned
        reader.skip(count % 2)?;

        reader.section_header(SECTION_COLOR, count)?;
        for object in &mut objects {
            let rgbt = reader.take(4)?;
            object.color = Color::new(rgbt[0], rgbt[1], rgbt[2], alpha_from_transparency(rgbt[3]));
        }

        for (index, section) in SECTION_PARAMS.into_iter().enumerate() {
            reader.section_header(section, count)?;
            for object in &mut objects {
                object.params[index] = reader.read_i16()?;
            }
        }

        reader.expect_tag(SECTION_BACKGROUND)?;
        reader.skip(4)?;
        let background_id = reader.read_u16()?;

        debug!(
            "parsed board {:?}: {} objects, background {}",
            name, count, background_id
        );

        Ok(Self {
            name,
            background_id,
            objects,
        })
    }

    /// Parses a decoded share code into a structured format.
    pub fn from_decoded(decoded: &DecodedBoard) -> Result<Self> {
        Self::from_bytes(decoded.content.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RawObject {
        type_id: u16,
        text: &'static str,
        flags: u16,
        position: (u16, u16),
        angle: i16,
        scale: u8,
        color: [u8; 4],
        params: [i16; 3],
    }

    impl Default for RawObject {
        fn default() -> Self {
            Self {
                type_id: 47,
                text: "",
                flags: FLAG_VISIBLE,
                position: (0, 0),
                angle: 0,
                scale: 100,
                color: [255, 255, 255, 0],
                params: [0, 0, 0],
            }
        }
    }

    fn push_u16(out: &mut Vec<u8>, value: u16) {
        out.extend(value.to_le_bytes());
    }

    fn push_string(out: &mut Vec<u8>, value: &str) {
        let padded = (value.len() + 4) & !3;
        push_u16(out, padded as u16);
        out.extend(value.as_bytes());
        out.resize(out.len() + padded - value.len(), 0);
    }

    /// Encodes a board the way the game lays it out. Also returns the
    /// offset of every section tag.
    fn encode_board(name: &str, objects: &[RawObject], background: u16) -> (Vec<u8>, Vec<usize>) {
        let mut out = vec![0u8; DATA_OFFSET];
        let mut tags = Vec::new();
        let count = objects.len() as u16;

        tags.push(out.len());
        push_u16(&mut out, SECTION_NAME);
        push_string(&mut out, name);

        for object in objects {
            tags.push(out.len());
            push_u16(&mut out, SECTION_OBJECT);
            push_u16(&mut out, object.type_id);
            if object.type_id == object_type::TEXT {
                tags.push(out.len());
                push_u16(&mut out, SECTION_TEXT);
                push_string(&mut out, object.text);
            }
        }

        let mut header = |out: &mut Vec<u8>, section: u16| {
            tags.push(out.len());
            push_u16(out, section);
            push_u16(out, 1);
            push_u16(out, count);
        };

        header(&mut out, SECTION_FLAGS);
        objects.iter().for_each(|o| push_u16(&mut out, o.flags));
        header(&mut out, SECTION_POSITION);
        for o in objects {
            push_u16(&mut out, o.position.0);
            push_u16(&mut out, o.position.1);
        }
        header(&mut out, SECTION_ANGLE);
        objects.iter().for_each(|o| out.extend(o.angle.to_le_bytes()));
        header(&mut out, SECTION_SCALE);
        objects.iter().for_each(|o| out.push(o.scale));
        if objects.len() % 2 == 1 {
            out.push(0);
        }
        header(&mut out, SECTION_COLOR);
        objects.iter().for_each(|o| out.extend(o.color));
        for (index, section) in SECTION_PARAMS.into_iter().enumerate() {
            header(&mut out, section);
            objects.iter().for_each(|o| out.extend(o.params[index].to_le_bytes()));
        }

        tags.push(out.len());
        push_u16(&mut out, SECTION_BACKGROUND);
        push_u16(&mut out, 1);
        push_u16(&mut out, 1);
        push_u16(&mut out, background);

        (out, tags)
    }

    fn sample_objects() -> Vec<RawObject> {
        vec![
            RawObject {
                type_id: object_type::TEXT,
                text: "Tank",
                position: (2560, 1920),
                color: [255, 0, 0, 0],
                ..Default::default()
            },
            RawObject {
                type_id: object_type::FAN_AOE,
                flags: FLAG_VISIBLE | FLAG_FLIP_VERTICAL | FLAG_LOCKED,
                position: (5120, 3840),
                angle: -125,
                scale: 46,
                color: [255, 255, 255, 57],
                params: [310, 120, 0],
                ..Default::default()
            },
            RawObject {
                type_id: 66,
                flags: FLAG_FLIP_HORIZONTAL,
                color: [128, 128, 255, 50],
                params: [-1, 0, 32767],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_parse_board() {
        let (data, _) = encode_board("Pull", &sample_objects(), 6);
        let board = Board::from_bytes(&data).unwrap();

        assert_eq!(board.name, "Pull");
        assert_eq!(board.background_id, 6);
        assert_eq!(board.objects.len(), 3);

        let label = &board.objects[0];
        assert_eq!(label.type_id, object_type::TEXT);
        assert_eq!(label.text, "Tank");
        assert!(label.visible);
        assert!(!label.flip_horizontal && !label.flip_vertical);
        assert_eq!((label.x, label.y), (512, 384));
        assert_eq!(label.color, Color::new(255, 0, 0, 255));

        let fan = &board.objects[1];
        assert_eq!(fan.text, "");
        assert!(fan.visible && fan.flip_vertical && !fan.flip_horizontal);
        assert_eq!((fan.x, fan.y), (1024, 768));
        assert_eq!(fan.angle, -125);
        assert_eq!(fan.scale, 46);
        assert_eq!(fan.color, Color::new(255, 255, 255, 110));
        assert_eq!(fan.params, [310, 120, 0]);

        let hidden = &board.objects[2];
        assert!(!hidden.visible && hidden.flip_horizontal);
        assert_eq!((hidden.x, hidden.y), (0, 0));
        assert_eq!(hidden.color.a, 128);
        assert_eq!(hidden.params, [-1, 0, 32767]);
    }

    #[test]
    fn test_parse_even_object_count() {
        let mut objects = sample_objects();
        objects.pop();
        let (data, _) = encode_board("", &objects, 0);
        let board = Board::from_bytes(&data).unwrap();
        assert_eq!(board.name, "");
        assert_eq!(board.objects.len(), 2);
        assert_eq!(board.objects[1].params, [310, 120, 0]);
    }

    #[test]
    fn test_parse_empty_board() {
        let (data, _) = encode_board("Empty", &[], 2);
        let board = Board::from_bytes(&data).unwrap();
        assert!(board.objects.is_empty());
        assert_eq!(board.background_id, 2);
    }

    #[test]
    fn test_corrupt_section_tags() {
        let (data, tags) = encode_board("Pull", &sample_objects(), 1);
        for offset in tags {
            let mut corrupt = data.clone();
            corrupt[offset] ^= 0x40;
            assert!(
                matches!(Board::from_bytes(&corrupt), Err(Error::Section { .. })),
                "corrupt tag at offset {} was not rejected",
                offset
            );
        }
    }

    #[test]
    fn test_object_count_mismatch() {
        let (mut data, tags) = encode_board("Pull", &sample_objects(), 1);
        // The flags section header is the first tag after the object list.
        let flags = tags
            .iter()
            .copied()
            .find(|&offset| data[offset] == SECTION_FLAGS as u8)
            .unwrap();
        data[flags + 4] = 2;
        match Board::from_bytes(&data) {
            Err(Error::ObjectCount {
                section,
                expected,
                found,
            }) => {
                assert_eq!(section, SECTION_FLAGS);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_truncated_data() {
        let (data, _) = encode_board("Pull", &sample_objects(), 1);
        for len in [0, DATA_OFFSET + 1, DATA_OFFSET + 5, data.len() / 2, data.len() - 1] {
            assert!(
                matches!(Board::from_bytes(&data[..len]), Err(Error::Format(_))),
                "truncated data of length {} was not rejected",
                len
            );
        }
    }

    #[test]
    fn test_rescale() {
        assert_eq!(rescale(5120, 3840), (1024, 768));
        assert_eq!(rescale(0, 0), (0, 0));
        assert_eq!(rescale(2560, 1920), (512, 384));
        assert_eq!(rescale(801, 807), (160, 161));
        assert_eq!(rescale(-2031, -247), (-406, -49));
    }

    #[test]
    fn test_alpha_from_transparency() {
        assert_eq!(alpha_from_transparency(0), 255);
        assert_eq!(alpha_from_transparency(100), 0);
        assert_eq!(alpha_from_transparency(50), 128);
        assert_eq!(alpha_from_transparency(57), 110);
    }

    #[test]
    fn test_scale_factor() {
        let object = BoardObject {
            scale: 50,
            flip_horizontal: true,
            ..Default::default()
        };
        assert_eq!(object.scale_factor(0.5), (-25.0, 25.0));
    }
}
