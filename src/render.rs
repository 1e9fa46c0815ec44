// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/render.rs - Renderer for strategy boards.
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
 * # `render` Module
 *
 * This module draws a parsed [Board] onto a fixed size canvas.
 *
 * Imagery and the label font come from an [AssetProvider], so the renderer
 * does not care whether assets live in a directory, an archive, or memory.
 *
 * ## Usage Example
 *
 * ```no_run
 * use stratboard::assets::DirectoryAssets;
 * use stratboard::render::render;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let board = stratboard::load("[stgy:a...]")?;
 *     let assets = DirectoryAssets::open("assets")?;
 *
 *     let raster = render(&board, &assets)?;
 *     std::fs::write("board.png", raster.encode_png()?)?;
 *
 *     Ok(())
 * }
 * ```
 */

use std::sync::Arc;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use log::{debug, trace, warn};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, Mask, Paint, PathBuilder, Pixmap, PixmapPaint,
    Rect, Stroke, Transform,
};

use crate::error::{Error, Result};
use crate::geometry::{
    ArcGeometry, ObjectKind, draw_list, line_end, rectangle_path, rectangle_transform,
    sprite_transform,
};
use crate::parser::{Board, BoardObject, CANVAS_HEIGHT, CANVAS_WIDTH, Color, object_type};

/// Point size of label text.
pub const LABEL_FONT_SIZE: f32 = 30.0;
/// Offset of a label's foreground text from its shadow.
pub const LABEL_SHADOW_OFFSET: f32 = -2.0;
/// Fill color of arcs without a mask image. The alpha comes from the object.
pub const ARC_FILL: (u8, u8, u8) = (254, 161, 49);

/// A sprite image and the scale it is drawn at per unit of object scale.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub image: Pixmap,
    pub scale: f32,
}

/// Supplies the imagery and font a board is drawn with.
///
/// Providers that cache assets across renders must be safe to share between
/// threads; the renderer itself only ever reads from them.
pub trait AssetProvider {
    /// The sprite for an object type, or [Error::Asset] if there is none.
    fn sprite(&self, type_id: u16) -> Result<Arc<Sprite>>;

    /// The background image, at least as large as the canvas.
    fn background(&self, id: u16) -> Result<Arc<Pixmap>>;

    /// The image clipped into an arc object, if its type has one.
    fn arc_mask(&self, type_id: u16) -> Result<Option<Arc<Pixmap>>>;

    /// The font labels are drawn with.
    fn font(&self) -> Result<FontArc>;
}

/// A rendered board.
#[derive(Debug, Clone)]
pub struct Raster {
    pixmap: Pixmap,
}

impl Raster {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// The unpremultiplied color at a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::new(c.red(), c.green(), c.blue(), c.alpha()))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Raster(format!("PNG: {}", e)))
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let rgb: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue()]
            })
            .collect();
        let image = RgbImage::from_raw(self.width(), self.height(), rgb)
            .ok_or_else(|| Error::Raster("JPEG: pixel buffer size mismatch".into()))?;

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(&image)
            .map_err(|e| Error::Raster(format!("JPEG: {}", e)))?;
        Ok(buffer)
    }
}

/// Renders a board with the given assets.
pub fn render<A: AssetProvider + ?Sized>(board: &Board, assets: &A) -> Result<Raster> {
    let mut canvas = Canvas::new(assets)?;

    canvas.draw_background(board.background_id)?;

    let drawables = draw_list(board);
    debug!(
        "drawing {} of {} objects on background {}",
        drawables.len(),
        board.objects.len(),
        board.background_id
    );
    for drawable in drawables {
        let object = drawable.object;
        trace!(
            "drawing {:?} (type {}) at ({}, {})",
            drawable.kind, object.type_id, object.x, object.y
        );
        match drawable.kind {
            ObjectKind::Arc => canvas.draw_arc(object)?,
            ObjectKind::Rectangle => canvas.draw_rectangle(object),
            ObjectKind::Line => canvas.draw_line(object),
            ObjectKind::Label => canvas.draw_label(object)?,
            ObjectKind::Sprite(type_id) => canvas.draw_sprite(object, type_id)?,
        }
    }

    Ok(Raster {
        pixmap: canvas.pixmap,
    })
}

fn solid(r: u8, g: u8, b: u8, a: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn object_paint(object: &BoardObject) -> Paint<'static> {
    let c = object.color;
    solid(c.r, c.g, c.b, c.a)
}

fn image_paint() -> PixmapPaint {
    PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..Default::default()
    }
}

struct Canvas<'a, A: ?Sized> {
    pixmap: Pixmap,
    assets: &'a A,
}

impl<'a, A: AssetProvider + ?Sized> Canvas<'a, A> {
    fn new(assets: &'a A) -> Result<Self> {
        let pixmap = Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT)
            .ok_or_else(|| Error::Raster("failed to allocate canvas".into()))?;
        Ok(Self { pixmap, assets })
    }

    fn draw_background(&mut self, id: u16) -> Result<()> {
        let background = self.assets.background(id)?;
        self.pixmap.draw_pixmap(
            0,
            0,
            (*background).as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn draw_arc(&mut self, object: &BoardObject) -> Result<()> {
        let geometry = ArcGeometry::from_object(object)?;
        let Some(path) = geometry.path() else {
            warn!("skipping degenerate arc at ({}, {})", object.x, object.y);
            return Ok(());
        };
        let transform = geometry.transform(object);

        match self.assets.arc_mask(object.type_id)? {
            Some(image) => {
                let mut clip = Mask::new(CANVAS_WIDTH, CANVAS_HEIGHT)
                    .ok_or_else(|| Error::Raster("failed to allocate arc clip".into()))?;
                clip.fill_path(&path, FillRule::Winding, true, transform);
                self.pixmap.draw_pixmap(
                    0,
                    0,
                    (*image).as_ref(),
                    &image_paint(),
                    geometry.mask_transform(object, image.width(), image.height()),
                    Some(&clip),
                );
            }
            None => {
                let (r, g, b) = ARC_FILL;
                let paint = solid(r, g, b, object.color.a);
                self.pixmap
                    .fill_path(&path, &paint, FillRule::Winding, transform, None);
            }
        }
        Ok(())
    }

    fn draw_rectangle(&mut self, object: &BoardObject) {
        if let Some(path) = rectangle_path(object) {
            self.pixmap.fill_path(
                &path,
                &object_paint(object),
                FillRule::Winding,
                rectangle_transform(object),
                None,
            );
        }
    }

    fn draw_line(&mut self, object: &BoardObject) {
        let start = (object.x as f32, object.y as f32);
        let end = line_end(object);
        let radius = f32::from(object.params[2]);

        let mut pb = PathBuilder::new();
        pb.move_to(start.0, start.1);
        pb.line_to(end.0, end.1);
        if let Some(path) = pb.finish().filter(|_| radius > 0.0) {
            let stroke = Stroke {
                width: radius * 2.0,
                line_cap: LineCap::Round,
                ..Default::default()
            };
            self.pixmap.stroke_path(
                &path,
                &object_paint(object),
                &stroke,
                Transform::identity(),
                None,
            );
        }

        let point_paint = solid(255, 255, 255, object.color.a);
        for (x, y) in [start, end] {
            if let Some(point) = PathBuilder::from_circle(x, y, radius) {
                self.pixmap.fill_path(
                    &point,
                    &point_paint,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
    }

    fn draw_label(&mut self, object: &BoardObject) -> Result<()> {
        if object.type_id != object_type::TEXT {
            return Err(Error::UnsupportedObject(object.type_id));
        }
        if object.text.is_empty() {
            return Ok(());
        }

        let font = self.assets.font()?;
        let (x, y) = (object.x as f32, object.y as f32);
        let c = object.color;

        self.draw_text(&font, &object.text, x, y, ColorU8::from_rgba(0, 0, 0, c.a))?;
        self.draw_text(
            &font,
            &object.text,
            x + LABEL_SHADOW_OFFSET,
            y + LABEL_SHADOW_OFFSET,
            ColorU8::from_rgba(c.r, c.g, c.b, c.a),
        )
    }

    /// Draws a single line of text centered on (x, y).
    fn draw_text(&mut self, font: &FontArc, text: &str, x: f32, y: f32, color: ColorU8) -> Result<()> {
        let scale = label_scale(font);
        let scaled = font.as_scaled(scale);

        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        // Anchored on the advance width and a line height of 3/4 of the
        // point size.
        let left = x - 0.5 * caret;
        let baseline = y + 0.5 * LABEL_FONT_SIZE * 0.75;

        let mut coverage = Mask::new(CANVAS_WIDTH, CANVAS_HEIGHT)
            .ok_or_else(|| Error::Raster("failed to allocate text mask".into()))?;
        let stride = CANVAS_WIDTH as i64;
        let data = coverage.data_mut();

        for (id, offset) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(left + offset, baseline));
            let Some(outline) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outline.px_bounds();
            outline.draw(|gx, gy, value| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                if px < 0 || py < 0 || px >= stride || py >= i64::from(CANVAS_HEIGHT) {
                    return;
                }
                let cell = &mut data[(py * stride + px) as usize];
                *cell = (*cell).max((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            });
        }

        let paint = solid(color.red(), color.green(), color.blue(), color.alpha());
        let Some(area) = Rect::from_xywh(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32) else {
            return Ok(());
        };
        self.pixmap
            .fill_rect(area, &paint, Transform::identity(), Some(&coverage));
        Ok(())
    }

    fn draw_sprite(&mut self, object: &BoardObject, type_id: u16) -> Result<()> {
        let sprite = self.assets.sprite(type_id)?;
        let transform = sprite_transform(
            object,
            sprite.scale,
            sprite.image.width(),
            sprite.image.height(),
        );
        // TODO: apply the object's alpha through PixmapPaint::opacity.
        self.pixmap.draw_pixmap(
            0,
            0,
            sprite.image.as_ref(),
            &image_paint(),
            transform,
            None,
        );
        Ok(())
    }
}

/// Scale that gives the font an em size of [LABEL_FONT_SIZE] pixels.
fn label_scale(font: &FontArc) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) => {
            PxScale::from(LABEL_FONT_SIZE * font.height_unscaled() / units_per_em)
        }
        None => PxScale::from(LABEL_FONT_SIZE),
    }
}
