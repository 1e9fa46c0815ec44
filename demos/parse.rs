// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  parse.rs - Share code parser demo for FFXIV strategy boards.
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

use std::io::{self, Read};

use clap::Parser;

use stratboard::decoder::*;
use stratboard::parser::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The share code to parse, or "-" to read it from stdin.
    code: String,

    /// Print the inflated board data as hex before parsing it.
    #[arg(long)]
    dump: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let code = if args.code == "-" {
        let mut input = String::new();
        if let Err(error) = io::stdin().read_to_string(&mut input) {
            eprintln!("Error reading share code from stdin: {:?}", error);
            return;
        }
        input.trim().to_string()
    } else {
        args.code
    };

    let decoded = match DecodedBoard::from_share_code(&code) {
        Ok(board) => board,
        Err(error) => {
            eprintln!("Error decoding share code {:?}: {}", &code, error);
            return;
        }
    };

    if args.dump {
        println!("header: {:02x?}", decoded.header);
        for (i, chunk) in decoded.content.chunks(16).enumerate() {
            println!("{:04x}: {:02x?}", i * 16, chunk);
        }
    }

    let board = match Board::from_decoded(&decoded) {
        Ok(board) => board,
        Err(error) => {
            eprintln!("Error parsing share code {:?}: {}", &code, error);
            return;
        }
    };

    println!("{:#?}", board);
}
