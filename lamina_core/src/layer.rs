// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layering pass: depth, opacity, occlusion, and damage.
//!
//! [`LayerVisitor::visit`] walks the stage tree once per drawn frame, in
//! paint order (the stage first, then each container's children back to
//! front), and writes a [`LayerInfo`](crate::scene::LayerInfo) for every
//! actor it reaches:
//!
//! 1. **Depth**: evenly spaced values strictly between [`MIN_DEPTH`] and
//!    [`MAX_DEPTH`], increasing in paint order, so later (nearer) actors get
//!    larger depths. Every traversed actor gets one, culled or not.
//! 2. **Model-view**: `parent · T(x, y) · S(w·sx, h·sy) · tilt`, mapping the
//!    unit square onto the actor's quad in stage pixels. Containers count as
//!    1×1.
//! 3. **Opacity**: effective opacity is the product along the ancestor
//!    chain. A leaf is opaque when that product exceeds 0.999 and its content
//!    has no alpha.
//! 4. **Culling**: invisible, degenerate, and off-stage leaves are culled
//!    outright. Then, front to back, a leaf whose on-stage bounds lie inside
//!    a nearer opaque, axis-aligned leaf is culled too.
//! 5. **Damage**: with partial updates, the damage of every drawn pixmap is
//!    mapped to stage space and unioned. All damage accumulators are reset.
//!
//! Culling is conservative: it only removes actors that are certainly
//! hidden, so drawing with culling disabled gives the same image.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::geometry::IntRect;
use crate::scene::{ActorId, ActorKind, INVALID, Scene};
use crate::transform::Transform3d;

/// Depth of the far plane. No actor is assigned this value.
pub const MIN_DEPTH: f32 = 0.0;

/// Depth of the near plane. No actor is assigned this value.
pub const MAX_DEPTH: f32 = 4096.0 + MIN_DEPTH;

/// Effective opacity above which an actor counts as opaque.
pub const OPAQUE_THRESHOLD: f32 = 0.999;

const UNIT_SQUARE: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// What a layering pass found out about the frame as a whole.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerOutcome {
    /// An unculled, opaque, axis-aligned leaf covers the whole stage, so the
    /// frame does not need clearing.
    pub has_fullscreen_actor: bool,
    /// The front-most visible leaf, when it is an opaque texture-pixmap actor
    /// covering the whole stage.
    pub top_fullscreen_actor: Option<ActorId>,
    /// Union of drawn pixmap damage in stage pixels (top-left origin).
    ///
    /// Always empty unless partial updates were requested.
    pub damage: IntRect,
    /// Depth spacing used by this pass.
    pub layer_thickness: f32,
    /// Number of actors traversed.
    pub traversed: usize,
    /// Number of traversed leaves that were culled.
    pub culled: usize,
}

/// Returns the depth spacing for a tree of `actor_count` actors.
///
/// Two spare layers keep the outermost actors off the clip planes, and the
/// power-of-two divisor keeps the repeated additions exact.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "actor counts beyond u32 cannot be drawn anyway"
)]
pub fn layer_thickness(actor_count: usize) -> f32 {
    let count = (actor_count as u32).saturating_add(2).next_power_of_two();
    (MAX_DEPTH - MIN_DEPTH) / count as f32
}

/// The layering pass.
#[derive(Clone, Copy, Debug)]
pub struct LayerVisitor {
    actor_count: usize,
    use_partial_updates: bool,
}

impl LayerVisitor {
    /// Creates a visitor spacing depths for `actor_count` actors.
    ///
    /// With `use_partial_updates`, pixmap damage is accumulated into
    /// [`LayerOutcome::damage`].
    #[must_use]
    pub fn new(actor_count: usize, use_partial_updates: bool) -> Self {
        Self {
            actor_count,
            use_partial_updates,
        }
    }

    /// Runs the pass over the scene's stage tree.
    pub fn visit(&self, scene: &mut Scene) -> LayerOutcome {
        scene.update_traversal();
        let order = core::mem::take(&mut scene.traversal_order);
        let stage = scene.stage_size();
        let stage_rect = Rect::new(0.0, 0.0, f64::from(stage.width), f64::from(stage.height));

        // A stale count must never push depths past the near plane.
        let thickness = layer_thickness(self.actor_count.max(order.len()));
        let mut depth = MIN_DEPTH + thickness;

        let n = scene.len as usize;
        let mut visible = vec![false; n];
        let mut on_stage = vec![Rect::ZERO; n];
        let mut covers_stage = vec![false; n];
        let mut outcome = LayerOutcome {
            layer_thickness: thickness,
            traversed: order.len(),
            ..LayerOutcome::default()
        };

        // Parents before children: transforms, opacity, outright culling.
        for &idx in &order {
            let i = idx as usize;
            let p = scene.parent[i];
            let (parent_mv, parent_opacity, parent_visible) = if p == INVALID {
                (Transform3d::IDENTITY, 1.0, true)
            } else {
                let info = &scene.layer[p as usize];
                (info.model_view, info.effective_opacity, visible[p as usize])
            };

            let kind = scene.kind[i];
            let vis = parent_visible && scene.is_visible_at(idx);
            visible[i] = vis;
            let effective_opacity = parent_opacity * scene.opacity[i];

            let (w, h) = if kind.is_container() {
                (1.0, 1.0)
            } else {
                (f64::from(scene.width[i]), f64::from(scene.height[i]))
            };
            let model_view = parent_mv
                * Transform3d::from_translation(f64::from(scene.x[i]), f64::from(scene.y[i]), 0.0)
                * Transform3d::from_scale(
                    w * f64::from(scene.scale_x[i]),
                    h * f64::from(scene.scale_y[i]),
                    1.0,
                )
                * Transform3d::from_tilt(f64::from(scene.tilt[i]));

            let mut culled = !vis;
            let mut is_opaque = false;
            let mut screen_bounds = IntRect::EMPTY;
            if kind.is_leaf() {
                let bounds = model_view.map_rect_bbox(UNIT_SQUARE);
                let clipped = bounds.intersect(stage_rect);
                let degenerate = scene.width[i] <= 0
                    || scene.height[i] <= 0
                    || !bounds.is_finite()
                    || bounds.is_zero_area();
                let offscreen = clipped.is_zero_area();
                let pixmap = &scene.pixmap[i];
                let no_content = kind == ActorKind::TexturePixmap && !pixmap.is_bound();
                culled |= degenerate || offscreen || no_content;

                let content_opaque = match kind {
                    ActorKind::ColoredBox => scene.color[i].is_opaque(),
                    ActorKind::Image => scene.image[i].is_some_and(|image| !image.has_alpha),
                    ActorKind::TexturePixmap => pixmap.is_bound() && pixmap.is_opaque(),
                    ActorKind::Stage | ActorKind::Container => false,
                };
                is_opaque = effective_opacity > OPAQUE_THRESHOLD && content_opaque;

                if !culled {
                    on_stage[i] = clipped;
                    covers_stage[i] = model_view.is_axis_aligned() && contains(bounds, stage_rect);
                    screen_bounds = IntRect::from_kurbo_outward(clipped);
                }
            }

            let info = &mut scene.layer[i];
            info.depth = depth;
            depth += thickness;
            info.effective_opacity = effective_opacity;
            info.model_view = model_view;
            info.dim = [scene.dim_left[i], scene.dim_right[i]];
            info.is_opaque = is_opaque;
            info.culled = culled;
            info.screen_bounds = screen_bounds;
        }

        // Front to back: occlusion by nearer opaque leaves.
        let mut occluders: Vec<Rect> = Vec::new();
        let mut seen_top = false;
        for &idx in order.iter().rev() {
            let i = idx as usize;
            let kind = scene.kind[i];
            if kind.is_container() {
                continue;
            }
            if scene.layer[i].culled {
                outcome.culled += 1;
                continue;
            }
            let bounds = on_stage[i];
            if occluders.iter().any(|o| contains(*o, bounds)) {
                scene.layer[i].culled = true;
                outcome.culled += 1;
                continue;
            }

            let info = &scene.layer[i];
            let occludes = info.is_opaque && info.model_view.is_axis_aligned();
            if !seen_top {
                seen_top = true;
                if kind == ActorKind::TexturePixmap && occludes && covers_stage[i] {
                    outcome.top_fullscreen_actor = Some(scene.id_at(idx));
                }
            }
            if occludes {
                occluders.push(bounds);
                if covers_stage[i] {
                    outcome.has_fullscreen_actor = true;
                    self.mark_ancestors_opaque(scene, idx);
                }
            }
        }

        if self.use_partial_updates {
            let mut damage: Option<Rect> = None;
            for &idx in &order {
                let i = idx as usize;
                if scene.kind[i] != ActorKind::TexturePixmap || scene.layer[i].culled {
                    continue;
                }
                let local = scene.pixmap[i].damage;
                if local.is_empty() {
                    continue;
                }
                let w = f64::from(scene.width[i]);
                let h = f64::from(scene.height[i]);
                let unit = Rect::new(
                    f64::from(local.x) / w,
                    f64::from(local.y) / h,
                    f64::from(local.right()) / w,
                    f64::from(local.bottom()) / h,
                );
                let mapped = scene.layer[i].model_view.map_rect_bbox(unit);
                damage = Some(damage.map_or(mapped, |d| d.union(mapped)));
            }
            outcome.damage = damage
                .map(|d| IntRect::from_kurbo_outward(d.intersect(stage_rect)))
                .unwrap_or(IntRect::EMPTY);
        }
        for state in &mut scene.pixmap {
            state.damage = IntRect::EMPTY;
        }

        scene.traversal_order = order;
        outcome
    }

    /// Marks the ancestors of a stage-covering opaque leaf as opaque.
    fn mark_ancestors_opaque(&self, scene: &mut Scene, idx: u32) {
        let mut p = scene.parent[idx as usize];
        while p != INVALID {
            let info = &mut scene.layer[p as usize];
            if info.effective_opacity > OPAQUE_THRESHOLD {
                info.is_opaque = true;
            }
            p = scene.parent[p as usize];
        }
    }
}

/// Returns `true` if `inner` lies within `outer`.
fn contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}
