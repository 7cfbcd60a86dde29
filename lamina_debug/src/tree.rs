// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indented text dumps of the actor tree.

use std::fmt::Write;

use lamina_core::scene::{ActorId, Scene};

/// Renders the stage tree, one actor per line, children indented by two
/// spaces under their parent in paint order.
///
/// Each line reads:
///
/// ```text
/// "name" ActorId(3@gen0) (hidden ColoredBoxActor) (10, 20) 30x40 scale=(1.00, 1.00) 50% tilt=0.00
/// ```
///
/// `hidden ` appears only for actors whose visibility flag is off.
#[must_use]
pub fn dump_tree(scene: &Scene) -> String {
    dump_subtree(scene, scene.stage())
}

/// Renders the tree rooted at `root`, which need not be attached to the
/// stage.
///
/// # Panics
///
/// Panics if `root` is stale.
#[must_use]
pub fn dump_subtree(scene: &Scene, root: ActorId) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0_usize)];
    while let Some((id, indent)) = stack.pop() {
        write_line(&mut out, scene, id, indent);
        let first = stack.len();
        stack.extend(scene.children(id).map(|c| (c, indent + 1)));
        stack[first..].reverse();
    }
    out
}

fn write_line(out: &mut String, scene: &Scene, id: ActorId, indent: usize) {
    let (x, y) = scene.position(id);
    let size = scene.size(id);
    let (sx, sy) = scene.scale(id);
    let _ = writeln!(
        out,
        "{:indent$}\"{}\" {:?} ({}{}) ({x}, {y}) {}x{} scale=({sx:.2}, {sy:.2}) {:.0}% tilt={:.2}",
        "",
        scene.name(id),
        id,
        if scene.is_shown(id) { "" } else { "hidden " },
        scene.kind(id).label(),
        size.width,
        size.height,
        scene.opacity(id) * 100.0,
        scene.tilt(id),
        indent = indent * 2,
    );
}

#[cfg(test)]
mod tests {
    use lamina_core::clock::ManualClock;
    use lamina_core::geometry::{Color, Size};
    use lamina_core::scene::SceneConfig;
    use lamina_core::scheduler::NullTimer;

    use super::*;

    fn scene() -> Scene {
        Scene::new(
            SceneConfig {
                stage_size: Size::new(800, 600),
                ..SceneConfig::default()
            },
            Box::new(ManualClock::default()),
            Box::new(NullTimer),
        )
    }

    #[test]
    fn nested_actors_are_indented_in_paint_order() {
        let mut s = scene();
        let stage = s.stage();
        let group = s.create_container();
        s.set_name(group, "windows").unwrap();
        s.add_child(stage, group).unwrap();
        let back = s.create_colored_box(Size::new(30, 40), Color::WHITE).unwrap();
        s.set_name(back, "back").unwrap();
        s.move_to(back, 10, 20, 0).unwrap();
        s.set_opacity(back, 0.5, 0).unwrap();
        s.hide(back).unwrap();
        let front = s.create_texture_pixmap();
        s.set_name(front, "front").unwrap();
        s.add_child(group, back).unwrap();
        s.add_child(group, front).unwrap();

        let dump = dump_tree(&s);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 4, "{dump}");
        assert!(lines[0].starts_with("\"stage\" "), "{dump}");
        assert!(lines[0].contains("(StageActor) (0, 0) 800x600"), "{dump}");
        assert!(lines[1].starts_with("  \"windows\" "), "{dump}");
        assert!(lines[1].contains("(ContainerActor)"), "{dump}");
        assert!(lines[2].starts_with("    \"back\" "), "{dump}");
        assert!(
            lines[2].ends_with("(hidden ColoredBoxActor) (10, 20) 30x40 scale=(1.00, 1.00) 50% tilt=0.00"),
            "{dump}"
        );
        assert!(lines[3].starts_with("    \"front\" "), "{dump}");
    }

    #[test]
    fn detached_subtree_can_be_dumped() {
        let mut s = scene();
        let group = s.create_container();
        let child = s.create_container();
        s.add_child(group, child).unwrap();
        let dump = dump_subtree(&s, group);
        assert_eq!(dump.lines().count(), 2);
        assert!(!dump_tree(&s).contains("ContainerActor"));
    }
}
