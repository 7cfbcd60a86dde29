// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builds a [`RenderPlan`] from a layered scene.

use lamina_core::geometry::IntRect;
use lamina_core::layer::LayerOutcome;
use lamina_core::scene::{ActorKind, Scene};

use crate::damage::flip_to_bottom_left;
use crate::plan::{ItemContent, RenderItem, RenderPlan};

/// The draw pass.
///
/// Reads the [`LayerInfo`](lamina_core::scene::LayerInfo) written by the
/// layering pass and turns every unculled leaf into a [`RenderItem`]. The
/// plan is kept between frames so its buffers are reused.
#[derive(Debug, Default)]
pub struct DrawVisitor {
    plan: RenderPlan,
}

impl DrawVisitor {
    /// Creates a draw visitor with an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently built plan.
    #[must_use]
    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    /// Builds the plan for the scene's current layering results.
    ///
    /// With `region` (top-left stage pixels), drawing is scissored to it and
    /// items outside it are left out.
    pub fn build(
        &mut self,
        scene: &Scene,
        outcome: &LayerOutcome,
        region: Option<IntRect>,
    ) -> &RenderPlan {
        let stage = scene.stage_size();
        let plan = &mut self.plan;
        plan.clear();
        plan.viewport = stage;
        if !outcome.has_fullscreen_actor {
            plan.clear_color = Some(scene.stage_color());
        }
        plan.scissor = region.map(|r| flip_to_bottom_left(r, stage.height));

        for &idx in scene.traversal_order() {
            let kind = scene.kind_at(idx);
            if kind.is_container() {
                continue;
            }
            let info = scene.layer_at(idx);
            if info.culled {
                continue;
            }
            if let Some(region) = region {
                if info.screen_bounds.intersect(region).is_empty() {
                    continue;
                }
            }

            let content = match kind {
                ActorKind::ColoredBox => ItemContent::Color(scene.color_at(idx)),
                ActorKind::Image => match scene.image_at(idx) {
                    Some(image) => ItemContent::Texture {
                        texture: image.texture,
                        has_alpha: image.has_alpha,
                    },
                    None => ItemContent::Placeholder,
                },
                ActorKind::TexturePixmap => {
                    let state = scene.pixmap_at(idx);
                    match state.texture {
                        Some(texture) if !state.failed => ItemContent::Texture {
                            texture,
                            has_alpha: state.has_alpha,
                        },
                        _ => ItemContent::Placeholder,
                    }
                }
                ActorKind::Stage | ActorKind::Container => continue,
            };

            let item = RenderItem {
                actor: scene.id_at(idx),
                content,
                model_view: info.model_view.to_cols_f32(),
                depth: info.depth,
                opacity: info.effective_opacity,
                dim: info.dim,
                screen_bounds: info.screen_bounds,
            };
            if info.is_opaque {
                plan.opaque.push(item);
            } else {
                plan.translucent.push(item);
            }
        }
        // Traversal is back to front; the opaque pass runs front to back.
        plan.opaque.reverse();

        tracing::trace!(
            opaque = plan.opaque.len(),
            translucent = plan.translucent.len(),
            cleared = plan.clear_color.is_some(),
            "render plan built"
        );
        &self.plan
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use lamina_core::clock::ManualClock;
    use lamina_core::geometry::{Color, Size};
    use lamina_core::layer::LayerVisitor;
    use lamina_core::scene::{ActorId, PixmapHandle, SceneConfig, TextureId};
    use lamina_core::scheduler::NullTimer;

    use super::*;

    fn scene() -> Scene {
        Scene::new(
            SceneConfig {
                stage_size: Size::new(800, 600),
                stage_color: Color::rgb(0.1, 0.2, 0.3),
                ..SceneConfig::default()
            },
            Box::new(ManualClock::default()),
            Box::new(NullTimer),
        )
    }

    fn layer(s: &mut Scene, partial: bool) -> LayerOutcome {
        s.advance_animations();
        LayerVisitor::new(s.actor_count(), partial).visit(s)
    }

    fn colored(s: &mut Scene, x: i32, y: i32, w: i32, h: i32, color: Color) -> ActorId {
        let id = s.create_colored_box(Size::new(w, h), color).unwrap();
        s.move_to(id, x, y, 0).unwrap();
        let stage = s.stage();
        s.add_child(stage, id).unwrap();
        id
    }

    #[test]
    fn splits_opaque_and_translucent() {
        let mut s = scene();
        let back = colored(&mut s, 0, 0, 100, 100, Color::WHITE);
        let front = colored(&mut s, 50, 50, 100, 100, Color::WHITE);
        let glass = colored(&mut s, 10, 10, 20, 20, Color::rgba(1.0, 0.0, 0.0, 0.5));
        let outcome = layer(&mut s, false);

        let mut draw = DrawVisitor::new();
        let plan = draw.build(&s, &outcome, None);
        assert_eq!(plan.clear_color, Some(Color::rgb(0.1, 0.2, 0.3)));
        let opaque: alloc::vec::Vec<_> = plan.opaque.iter().map(|i| i.actor).collect();
        assert_eq!(opaque, [front, back], "opaque pass runs front to back");
        assert_eq!(plan.translucent.len(), 1);
        assert_eq!(plan.translucent[0].actor, glass);
        assert!(plan.opaque[0].depth > plan.opaque[1].depth);
    }

    #[test]
    fn fullscreen_actor_skips_clear_and_hides_rest() {
        let mut s = scene();
        colored(&mut s, 10, 10, 50, 50, Color::WHITE);
        let cover = colored(&mut s, 0, 0, 800, 600, Color::WHITE);
        let outcome = layer(&mut s, false);

        let mut draw = DrawVisitor::new();
        let plan = draw.build(&s, &outcome, None);
        assert_eq!(plan.clear_color, None);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.opaque[0].actor, cover);
    }

    #[test]
    fn dimmed_actor_carries_edge_dimming() {
        let mut s = scene();
        let plain = colored(&mut s, 0, 0, 100, 100, Color::WHITE);
        let dimmed = colored(&mut s, 200, 0, 100, 100, Color::WHITE);
        s.show_dimmed(dimmed, true, 0).unwrap();
        let outcome = layer(&mut s, false);

        let mut draw = DrawVisitor::new();
        let plan = draw.build(&s, &outcome, None);
        let dim_of = |id| plan.items().find(|i| i.actor == id).map(|i| i.dim);
        assert_eq!(dim_of(plain), Some([0.0, 0.0]));
        assert_eq!(dim_of(dimmed), Some([0.2, 0.6]));
        assert_eq!(plan.opaque.len(), 2, "dimming leaves the actor opaque");
    }

    #[test]
    fn region_filters_items_and_sets_scissor() {
        let mut s = scene();
        let left = colored(&mut s, 0, 0, 100, 100, Color::WHITE);
        colored(&mut s, 500, 400, 100, 100, Color::WHITE);
        let outcome = layer(&mut s, false);

        let mut draw = DrawVisitor::new();
        let region = IntRect::new(10, 10, 20, 20);
        let plan = draw.build(&s, &outcome, Some(region));
        assert_eq!(plan.scissor, Some(IntRect::new(10, 570, 20, 20)));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.opaque[0].actor, left);
    }

    #[test]
    fn pixmap_without_texture_draws_placeholder() {
        let mut s = scene();
        let win = s.create_texture_pixmap();
        s.bind_pixmap(win, PixmapHandle(7), Size::new(64, 64), false)
            .unwrap();
        let stage = s.stage();
        s.add_child(stage, win).unwrap();
        let outcome = layer(&mut s, false);

        let mut draw = DrawVisitor::new();
        let plan = draw.build(&s, &outcome, None);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items().next().unwrap().content, ItemContent::Placeholder);

        // Once the texture exists it is sampled directly.
        for work in s.take_texture_work() {
            if let lamina_core::scene::TextureWork::Refresh { idx, .. } = work {
                s.finish_texture_refresh(idx, Some(TextureId(3)));
            }
        }
        let outcome = layer(&mut s, false);
        let plan = draw.build(&s, &outcome, None);
        assert_eq!(
            plan.items().next().unwrap().content,
            ItemContent::Texture {
                texture: TextureId(3),
                has_alpha: false
            }
        );
    }

    #[test]
    fn culled_and_hidden_actors_are_skipped() {
        let mut s = scene();
        let hidden = colored(&mut s, 0, 0, 10, 10, Color::WHITE);
        s.hide(hidden).unwrap();
        colored(&mut s, 900, 0, 10, 10, Color::WHITE);
        let outcome = layer(&mut s, false);

        let mut draw = DrawVisitor::new();
        assert!(draw.build(&s, &outcome, None).is_empty());
        assert!(draw.plan().clear_color.is_some());
    }
}
