// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  render.rs - Share code renderer demo for FFXIV strategy boards.
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

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use stratboard::assets::DirectoryAssets;
use stratboard::render::render;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The share code to render.
    code: String,

    /// The directory holding sprites, backgrounds, and the label font.
    #[arg(short, long, default_value = "assets")]
    assets: PathBuf,

    /// Font file to use for labels, relative to the asset directory.
    #[arg(long)]
    font: Option<String>,

    /// The file to write.
    #[arg(short, long, default_value = "board.png")]
    output: PathBuf,

    /// Image format of the output file.
    #[arg(short, long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// JPEG quality, from 1 to 100.
    #[arg(short, long, default_value_t = 90)]
    quality: u8,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let board = match stratboard::load(&args.code) {
        Ok(board) => board,
        Err(error) => {
            eprintln!("Error loading share code {:?}: {}", &args.code, error);
            return;
        }
    };

    let assets = match DirectoryAssets::open(&args.assets) {
        Ok(assets) => match args.font {
            Some(font) => assets.with_font_file(font),
            None => assets,
        },
        Err(error) => {
            eprintln!("Error opening assets {:?}: {}", &args.assets, error);
            return;
        }
    };

    let raster = match render(&board, &assets) {
        Ok(raster) => raster,
        Err(error) => {
            eprintln!("Error rendering board {:?}: {}", &board.name, error);
            return;
        }
    };

    let encoded = match args.format {
        Format::Png => raster.encode_png(),
        Format::Jpeg => raster.encode_jpeg(args.quality.clamp(1, 100)),
    };
    let data = match encoded {
        Ok(data) => data,
        Err(error) => {
            eprintln!("Error encoding board {:?}: {}", &board.name, error);
            return;
        }
    };

    if let Err(error) = fs::write(&args.output, data) {
        eprintln!("Failed to write file {}: {}", args.output.display(), error);
    }
}
