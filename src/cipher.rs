// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/cipher.rs - Share code substitution and rotation cipher
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

use base64::Engine;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use encoding_rs::WINDOWS_1252;
use log::debug;

use crate::error::{Error, Result};

pub const SHARE_CODE_PREFIX: &str = "[stgy:a";
pub const SHARE_CODE_SUFFIX: &str = "]";

const SUBSTITUTION_TABLE: [(char, char); 64] = [
    ('+', 'N'), ('-', 'P'), ('0', 'x'), ('1', 'g'), ('2', '0'), ('3', 'K'), ('4', '8'), ('5', 'S'),
    ('6', 'J'), ('7', '2'), ('8', 's'), ('9', 'Z'), ('A', 'D'), ('B', 'F'), ('C', 't'), ('D', 'T'),
    ('E', '6'), ('F', 'E'), ('G', 'a'), ('H', 'V'), ('I', 'c'), ('J', 'p'), ('K', 'L'), ('L', 'M'),
    ('M', 'm'), ('N', 'e'), ('O', 'j'), ('P', '9'), ('Q', 'X'), ('R', 'B'), ('S', '4'), ('T', 'R'),
    ('U', 'Y'), ('V', '7'), ('W', '_'), ('X', 'n'), ('Y', 'O'), ('Z', 'b'), ('a', 'i'), ('b', '-'),
    ('c', 'v'), ('d', 'H'), ('e', 'C'), ('f', 'A'), ('g', 'r'), ('h', 'W'), ('i', 'o'), ('j', 'd'),
    ('k', 'I'), ('l', 'q'), ('m', 'h'), ('n', 'U'), ('o', 'l'), ('p', 'k'), ('q', '3'), ('r', 'f'),
    ('s', 'y'), ('t', '5'), ('u', 'G'), ('v', 'w'), ('w', '1'), ('x', 'u'), ('y', 'z'), ('z', 'Q'),
];

// The game does not always zero the trailing bits of the final symbol.
const SHARE_CODE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

fn substitute(c: char) -> char {
    SUBSTITUTION_TABLE
        .iter()
        .find(|&&(from, _)| from == c)
        .map_or(c, |&(_, to)| to)
}

/// Maps a character to its 6-bit value. Unknown characters map to 0.
pub fn map_in(c: char) -> u8 {
    match c {
        'A'..='Z' => c as u8 - b'A',
        'a'..='z' => c as u8 - b'a' + 26,
        '0'..='9' => c as u8 - b'0' + 52,
        '-' | '>' => 62,
        '_' | '?' => 63,
        _ => 0,
    }
}

/// Maps a 6-bit value back to the canonical base64url alphabet.
pub fn map_out(value: u8) -> char {
    match value & 0x3f {
        v @ 0..=25 => (b'A' + v) as char,
        v @ 26..=51 => (b'a' + v - 26) as char,
        v @ 52..=61 => (b'0' + v - 52) as char,
        62 => '-',
        _ => '_',
    }
}

fn unrotate(value: u8, seed: u8, index: usize) -> u8 {
    value.wrapping_sub(seed).wrapping_sub((index % 64) as u8) & 0x3f
}

/// Strips the share code envelope, undoes the substitution and rotation,
/// and base64-decodes the result into the compressed container bytes.
pub fn reverse_cipher(code: &str) -> Result<Vec<u8>> {
    if code.len() < SHARE_CODE_PREFIX.len() + SHARE_CODE_SUFFIX.len() + 1 {
        return Err(Error::format("share code is too short"));
    }
    let body = code
        .strip_prefix(SHARE_CODE_PREFIX)
        .and_then(|rest| rest.strip_suffix(SHARE_CODE_SUFFIX))
        .ok_or_else(|| Error::format("missing share code prefix or suffix"))?;

    let mut chars = body.chars().map(substitute);
    let seed = match chars.next() {
        Some(c) => map_in(c),
        None => return Err(Error::format("share code has no payload")),
    };

    let text: String = chars
        .enumerate()
        .map(|(i, c)| map_out(unrotate(map_in(c), seed, i)))
        .collect();

    let (bytes, _, had_errors) = WINDOWS_1252.encode(&text);
    if had_errors {
        return Err(Error::format("payload is not representable in Windows-1252"));
    }

    let decoded = SHARE_CODE_BASE64.decode(&*bytes)?;
    debug!(
        "reversed share code cipher: seed {}, {} symbols, {} bytes",
        seed,
        text.len(),
        decoded.len()
    );

    Ok(decoded)
}

#[cfg(test)]
pub(crate) fn encode(data: &[u8], seed: u8) -> String {
    fn unsubstitute(c: char) -> char {
        SUBSTITUTION_TABLE
            .iter()
            .find(|&&(_, to)| to == c)
            .map_or(c, |&(from, _)| from)
    }

    let text = SHARE_CODE_BASE64.encode(data);

    let mut result = String::from(SHARE_CODE_PREFIX);
    result.push(unsubstitute(map_out(seed)));
    for (i, c) in text.chars().enumerate() {
        let rotated = map_in(c)
            .wrapping_add(seed)
            .wrapping_add((i % 64) as u8)
            & 0x3f;
        result.push(unsubstitute(map_out(rotated)));
    }
    result.push_str(SHARE_CODE_SUFFIX);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_round_trip() {
        for value in 0..64u8 {
            assert_eq!(map_in(map_out(value)), value);
        }
    }

    #[test]
    fn test_alphabet_aliases() {
        assert_eq!(map_in('>'), 62);
        assert_eq!(map_in('?'), 63);
        assert_eq!(map_in('+'), 0);
        assert_eq!(map_in('é'), 0);
    }

    #[test]
    fn test_substitution_is_a_permutation() {
        let mut targets: Vec<char> = SUBSTITUTION_TABLE.iter().map(|&(_, to)| to).collect();
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(targets.len(), SUBSTITUTION_TABLE.len());
        for to in targets {
            assert_eq!(map_out(map_in(to)), to);
        }
    }

    #[test]
    fn test_unrotate_wraps() {
        assert_eq!(unrotate(0, 1, 0), 63);
        assert_eq!(unrotate(5, 3, 2), 0);
        assert_eq!(unrotate(10, 0, 64), 10);
        assert_eq!(unrotate(10, 0, 65), 9);
    }

    #[test]
    fn test_reverse_cipher() {
        let data = [0x12, 0x34, 0x56, 0x78, 0xAB, 0xCD, 0xEF];
        for seed in [0, 5, 63] {
            let code = encode(&data, seed);
            assert_eq!(reverse_cipher(&code).unwrap(), data);
        }
    }

    #[test]
    fn test_reverse_cipher_is_deterministic() {
        let code = encode(b"strategy board payload with some length to it", 17);
        assert_eq!(reverse_cipher(&code).unwrap(), reverse_cipher(&code).unwrap());
    }

    #[test]
    fn test_rejects_bad_envelope() {
        for code in ["", "[stgy:a]", "stgy:aABCD]", "[stgy:aABCD", "[stgy:bABCD]", "(stgy:aABCD)"] {
            assert!(
                matches!(reverse_cipher(code), Err(Error::Format(_))),
                "accepted {:?}",
                code
            );
        }
    }

    #[test]
    fn test_rejects_bad_base64_length() {
        // A seed plus a single symbol cannot encode a whole byte.
        assert!(matches!(reverse_cipher("[stgy:aAB]"), Err(Error::Format(_))));
    }

    #[test]
    fn test_multibyte_characters_are_single_symbols() {
        let code = encode(&[0x00, 0x10, 0x83, 0x10, 0x51, 0x87], 0);
        assert_eq!(code, "[stgy:affeFuk3LY]");

        // 'f' substitutes to 'A', which has the same 6-bit value as any
        // unknown character; the two-byte 'é' must occupy a single position.
        let altered = "[stgy:aféeFuk3LY]";
        assert_eq!(reverse_cipher(altered).unwrap(), reverse_cipher(&code).unwrap());
        assert_eq!(reverse_cipher(altered).unwrap(), [0x00, 0x10, 0x83, 0x10, 0x51, 0x87]);
    }
}
