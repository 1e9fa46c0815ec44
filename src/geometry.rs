// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/geometry.rs - Shapes and transforms for strategy board objects.
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
 * # `geometry` Module
 *
 * This module interprets parsed board objects as drawable shapes: it
 * classifies each object by how it is drawn and computes the paths and
 * canvas transforms the renderer needs.
 *
 * All transforms are built from scratch for each object, so nothing
 * carries over from one object to the next.
 */

use std::f64::consts::PI;

use tiny_skia::{Path, PathBuilder, Rect, Transform};

use crate::error::{Error, Result};
use crate::parser::{Board, BoardObject, object_type, rescale};

/// Scale applied to arc shapes per unit of object scale.
pub const ARC_SCALE: f32 = 0.02;
/// Scale applied to arc mask images per unit of object scale.
pub const ARC_MASK_SCALE: f32 = 0.01;
/// Sprite scale used when the asset does not specify one.
pub const DEFAULT_SPRITE_SCALE: f32 = 1.0 / 200.0;

const CIRCLE_AOE_RADIUS: f64 = 256.0;
const FAN_AOE_RADIUS: f64 = 250.0;
const ARC_START: f64 = -PI / 2.0;
// Angular step used to flatten arcs into line segments.
const ARC_STEP: f64 = PI / 90.0;

/// How an object is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A partial annulus, optionally masked by an image.
    Arc,
    /// A filled rectangle centered on the object.
    Rectangle,
    /// A stroked line with round end points.
    Line,
    /// A text label with a drop shadow.
    Label,
    /// A sprite image looked up by type id.
    Sprite(u16),
}

impl ObjectKind {
    pub fn classify(type_id: u16) -> Self {
        match type_id {
            object_type::CIRCLE_AOE | object_type::FAN_AOE => ObjectKind::Arc,
            object_type::LINE_AOE => ObjectKind::Rectangle,
            object_type::LINE => ObjectKind::Line,
            object_type::TEXT => ObjectKind::Label,
            id => ObjectKind::Sprite(id),
        }
    }
}

/// An object paired with the way it is drawn.
#[derive(Debug, Clone, Copy)]
pub struct Drawable<'a> {
    pub object: &'a BoardObject,
    pub kind: ObjectKind,
}

/// Classifies the visible objects of a board, in drawing order.
///
/// Objects are drawn last to first, so the first object in the board ends
/// up on top.
pub fn draw_list(board: &Board) -> Vec<Drawable<'_>> {
    board
        .objects
        .iter()
        .rev()
        .filter(|object| object.visible)
        .map(|object| Drawable {
            object,
            kind: ObjectKind::classify(object.type_id),
        })
        .collect()
}

/// Outer radius of an arc object, before scaling.
pub fn arc_outer_radius(type_id: u16) -> Result<f64> {
    match type_id {
        object_type::CIRCLE_AOE => Ok(CIRCLE_AOE_RADIUS),
        object_type::FAN_AOE => Ok(FAN_AOE_RADIUS),
        id => Err(Error::UnsupportedObject(id)),
    }
}

/// The shape of an arc object in its local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    /// Sweep angle in radians.
    pub sweep: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Offset from the arc's center to the object's anchor.
    pub offset: (f64, f64),
}

impl ArcGeometry {
    pub fn from_object(object: &BoardObject) -> Result<Self> {
        let outer_radius = arc_outer_radius(object.type_id)?;
        let sweep = f64::from(object.params[0]) / 180.0 * PI;
        let inner_radius = f64::from(object.params[1]);

        let (left, right, bottom) = arc_extents(sweep, inner_radius, outer_radius);

        Ok(Self {
            sweep,
            inner_radius,
            outer_radius,
            offset: (-(left - right) / 2.0, bottom / 2.0),
        })
    }

    pub fn start_angle(&self) -> f64 {
        ARC_START
    }

    pub fn end_angle(&self) -> f64 {
        ARC_START + self.sweep
    }

    /// The outline of the arc: outer edge from start to end, then the inner
    /// edge back to the start.
    pub fn path(&self) -> Option<Path> {
        let (start, end) = (self.start_angle(), self.end_angle());
        let mut pb = PathBuilder::new();
        push_arc(&mut pb, self.outer_radius, start, end, true);
        push_arc(&mut pb, self.inner_radius, end, start, false);
        pb.close();
        pb.finish()
    }

    /// Places the arc so that its pivot sits on the object's anchor, then
    /// rotates and scales it about that pivot.
    pub fn transform(&self, object: &BoardObject) -> Transform {
        let (ox, oy) = (self.offset.0 as f32, self.offset.1 as f32);
        let (sx, sy) = object.scale_factor(ARC_SCALE);
        Transform::from_translate(object.x as f32 + ox, object.y as f32 + oy)
            .pre_rotate_at(f32::from(object.angle), -ox, -oy)
            .pre_translate(-ox, -oy)
            .pre_scale(sx, sy)
            .pre_translate(ox, oy)
    }

    /// Transform for a mask image of the given size clipped into the arc.
    pub fn mask_transform(&self, object: &BoardObject, width: u32, height: u32) -> Transform {
        let (ox, oy) = (self.offset.0 as f32, self.offset.1 as f32);
        let s = f32::from(object.scale) * ARC_MASK_SCALE;
        let left = self.offset.0 as i32 - (width / 2) as i32;
        let top = self.offset.1 as i32 - (height / 2) as i32;
        self.transform(object)
            .pre_translate(-ox, -oy)
            .pre_scale(s, s)
            .pre_translate(ox, oy)
            .pre_translate(left as f32, top as f32)
    }
}

/// Left, right, and bottom extents of an arc's bounding box, relative to
/// its center, for the four sweep regions split at π/2, π, and 3π/2.
pub fn arc_extents(sweep: f64, inner_radius: f64, outer_radius: f64) -> (f64, f64, f64) {
    let mut left = 0.0;
    let mut right = 0.0;
    let mut bottom = 0.0;

    if sweep < PI * 1.5 && sweep >= PI {
        left = (1.0 + sweep.sin()) * outer_radius;
    } else if sweep < PI {
        left = outer_radius;
    }
    if sweep < PI {
        if sweep >= PI * 0.5 {
            bottom = (1.0 + sweep.cos()) * outer_radius;
        } else {
            bottom = outer_radius + sweep.cos() * inner_radius;
        }
    }
    if sweep < PI * 0.5 {
        right = (1.0 - sweep.sin()) * outer_radius;
    }

    (left, right, bottom)
}

fn push_arc(pb: &mut PathBuilder, radius: f64, from: f64, to: f64, move_first: bool) {
    let segments = ((to - from).abs() / ARC_STEP).ceil().max(1.0) as usize;
    for i in 0..=segments {
        let angle = from + (to - from) * i as f64 / segments as f64;
        let (x, y) = ((radius * angle.cos()) as f32, (radius * angle.sin()) as f32);
        if i == 0 && move_first {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
}

/// The rectangle of a line AoE object, centered on the origin.
pub fn rectangle_path(object: &BoardObject) -> Option<Path> {
    let w = f32::from(object.params[0]);
    let h = f32::from(object.params[1]);
    let rect = Rect::from_ltrb(-w.abs(), -h.abs(), w.abs(), h.abs())?;
    Some(PathBuilder::from_rect(rect))
}

pub fn rectangle_transform(object: &BoardObject) -> Transform {
    Transform::from_translate(object.x as f32, object.y as f32).pre_rotate(f32::from(object.angle))
}

/// The far end of a line object in canvas space.
pub fn line_end(object: &BoardObject) -> (f32, f32) {
    let (x, y) = rescale(i32::from(object.params[0]), i32::from(object.params[1]));
    (x as f32, y as f32)
}

/// Places a sprite of the given size centered on the object.
pub fn sprite_transform(object: &BoardObject, asset_scale: f32, width: u32, height: u32) -> Transform {
    let (sx, sy) = object.scale_factor(asset_scale);
    Transform::from_translate(object.x as f32, object.y as f32)
        .pre_scale(sx, sy)
        .pre_rotate(f32::from(object.angle))
        .pre_translate(-((width / 2) as f32), -((height / 2) as f32))
}
