use crate::controls::{OrbitCamera, OrbitControls, OrbitControlsConfig};
use crate::scene::{Scene, SceneFactory, SceneInit};
use offscreen_bridge::{ElementProxyReceiver, Listener, ListenerOptions, listener};
use offscreen_common::Surface;
use offscreen_protocol::{EventKind, EventRecord};
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Normalized device position of the cursor over the surface.
///
/// Cleared to a point far off-surface so nothing is picked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPosition {
    pub x: f64,
    pub y: f64,
}

impl PickPosition {
    pub const CLEARED: Self = Self {
        x: -100_000.0,
        y: -100_000.0,
    };

    pub fn is_cleared(&self) -> bool {
        *self == Self::CLEARED
    }
}

impl Default for PickPosition {
    fn default() -> Self {
        Self::CLEARED
    }
}

#[derive(Debug, Clone, Copy)]
struct Cube {
    color: u32,
    x: f32,
    rotation: f32,
}

/// Three spinning cubes under orbit controls.
pub struct OrbitScene {
    // Dropped before `input` so it can still unsubscribe.
    controls: OrbitControls,
    surface: Rc<Cell<Surface>>,
    input: Rc<ElementProxyReceiver>,
    cubes: Vec<Cube>,
    pick: Rc<Cell<PickPosition>>,
    pick_listeners: Vec<(EventKind, Listener)>,
    frames: u64,
}

impl OrbitScene {
    pub fn new(init: SceneInit) -> Self {
        let SceneInit {
            surface,
            input_element,
        } = init;
        let surface = Rc::new(Cell::new(surface));
        let controls = OrbitControls::new(
            OrbitCamera::default(),
            &input_element,
            OrbitControlsConfig::default(),
        );
        let cubes = [(0x44aa88, 0.0), (0x8844aa, -2.0), (0xaa8844, 2.0)]
            .into_iter()
            .map(|(color, x)| Cube {
                color,
                x,
                rotation: 0.0,
            })
            .collect();

        let pick = Rc::new(Cell::new(PickPosition::CLEARED));
        let pick_listeners = pick_listeners(&pick, &surface, &Rc::downgrade(&input_element));
        for (kind, l) in &pick_listeners {
            input_element.add_event_listener(*kind, Rc::clone(l), ListenerOptions::default());
        }

        Self {
            surface,
            input: input_element,
            controls,
            cubes,
            pick,
            pick_listeners,
            frames: 0,
        }
    }

    pub fn pick_position(&self) -> PickPosition {
        self.pick.get()
    }

    pub fn surface(&self) -> Surface {
        self.surface.get()
    }

    pub fn camera(&self) -> OrbitCamera {
        self.controls.camera()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Match the drawing surface to the element's client size.
    fn resize_to_display(&mut self) -> bool {
        let (w, h) = (self.input.client_width(), self.input.client_height());
        let mut surface = self.surface.get();
        let changed = surface.set_size(w, h);
        self.surface.set(surface);
        if surface.height > 0 {
            self.controls
                .set_aspect(surface.width as f32 / surface.height as f32);
        }
        changed
    }
}

impl Scene for OrbitScene {
    fn render(&mut self, time: f64) -> String {
        if self.input.document().is_hidden() {
            return format!("=== Orbit (frame={}) hidden ===\n", self.frames);
        }
        let resized = self.resize_to_display();
        for (ndx, cube) in self.cubes.iter_mut().enumerate() {
            let speed = 1.0 + ndx as f64 * 0.1;
            cube.rotation = (time * speed) as f32;
        }
        self.frames += 1;

        let surface = self.surface.get();
        let cam = self.controls.camera();
        let eye = cam.position();
        let mut out = String::new();
        out.push_str(&format!(
            "=== Orbit (frame={}, t={time:.3}) ===\n",
            self.frames
        ));
        out.push_str(&format!(
            "Surface: {}x{}{}\n",
            surface.width,
            surface.height,
            if resized { " (resized)" } else { "" }
        ));
        out.push_str(&format!(
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) aspect={:.2}\n",
            eye.x, eye.y, eye.z, cam.target.x, cam.target.y, cam.target.z, cam.aspect
        ));
        let pick = self.pick.get();
        if pick.is_cleared() {
            out.push_str("Pick: none\n");
        } else {
            out.push_str(&format!("Pick: ({:.3}, {:.3})\n", pick.x, pick.y));
        }
        for cube in &self.cubes {
            out.push_str(&format!(
                "  [#{:06x}] x={:.1} rot={:.3}\n",
                cube.color, cube.x, cube.rotation
            ));
        }
        out
    }
}

impl Drop for OrbitScene {
    fn drop(&mut self) {
        for (kind, l) in self.pick_listeners.drain(..) {
            self.input.remove_event_listener(kind, &l);
        }
    }
}

fn set_pick(
    pick: &Cell<PickPosition>,
    surface: &Cell<Surface>,
    element: &Weak<ElementProxyReceiver>,
    client: (f64, f64),
) {
    let Some(element) = element.upgrade() else {
        return;
    };
    let rect = element.get_bounding_client_rect();
    let surface = surface.get();
    if rect.width == 0 || rect.height == 0 || surface.width == 0 || surface.height == 0 {
        pick.set(PickPosition::CLEARED);
        return;
    }
    let (sw, sh) = (f64::from(surface.width), f64::from(surface.height));
    let x = (client.0 - f64::from(rect.left)) * sw / f64::from(rect.width);
    let y = (client.1 - f64::from(rect.top)) * sh / f64::from(rect.height);
    pick.set(PickPosition {
        x: x / sw * 2.0 - 1.0,
        y: y / sh * -2.0 + 1.0,
    });
}

fn pick_listeners(
    pick: &Rc<Cell<PickPosition>>,
    surface: &Rc<Cell<Surface>>,
    element: &Weak<ElementProxyReceiver>,
) -> Vec<(EventKind, Listener)> {
    let from_pointer = {
        let (pick, surface, element) = (Rc::clone(pick), Rc::clone(surface), element.clone());
        listener(move |e: &EventRecord| {
            if let (Some(x), Some(y)) = (e.client_x, e.client_y) {
                set_pick(&pick, &surface, &element, (x, y));
            }
            Ok(())
        })
    };
    let from_touch = {
        let (pick, surface, element) = (Rc::clone(pick), Rc::clone(surface), element.clone());
        listener(move |e: &EventRecord| {
            if e.kind == EventKind::TouchStart {
                e.prevent_default();
            }
            if let Some(t) = e.touches.as_deref().and_then(|t| t.first()) {
                set_pick(&pick, &surface, &element, (t.client_x, t.client_y));
            }
            Ok(())
        })
    };
    let clear = {
        let pick = Rc::clone(pick);
        listener(move |_| {
            pick.set(PickPosition::CLEARED);
            Ok(())
        })
    };

    vec![
        (EventKind::MouseMove, from_pointer),
        (EventKind::MouseOut, Rc::clone(&clear)),
        (EventKind::MouseLeave, Rc::clone(&clear)),
        (EventKind::TouchStart, Rc::clone(&from_touch)),
        (EventKind::TouchMove, from_touch),
        (EventKind::TouchEnd, clear),
    ]
}

/// Builds an `OrbitScene` for every started proxy.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrbitSceneFactory;

impl SceneFactory for OrbitSceneFactory {
    fn init(&self, init: SceneInit) -> anyhow::Result<Box<dyn Scene>> {
        Ok(Box::new(OrbitScene::new(init)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offscreen_bridge::{DocumentShim, VisibilityState};
    use offscreen_common::Geometry;
    use offscreen_protocol::{EventData, Touch};

    fn scene_at(geometry: Geometry) -> (OrbitScene, Rc<ElementProxyReceiver>) {
        let el = Rc::new(ElementProxyReceiver::new("A".into(), Rc::new(DocumentShim::new())));
        el.handle_event(&EventData::from(geometry));
        let scene = OrbitScene::new(SceneInit {
            surface: Surface::default(),
            input_element: Rc::clone(&el),
        });
        (scene, el)
    }

    #[test]
    fn pick_starts_cleared() {
        let (scene, _el) = scene_at(Geometry::new(0, 0, 300, 150));
        assert!(scene.pick_position().is_cleared());
    }

    #[test]
    fn mousemove_sets_normalized_pick() {
        let (scene, el) = scene_at(Geometry::new(10, 20, 300, 150));
        // Center of the element.
        el.dispatch_event(&EventRecord::new(EventKind::MouseMove).at(160.0, 95.0));
        let p = scene.pick_position();
        assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9, "{p:?}");

        // Top-left corner.
        el.dispatch_event(&EventRecord::new(EventKind::MouseMove).at(10.0, 20.0));
        assert_eq!(scene.pick_position(), PickPosition { x: -1.0, y: 1.0 });
    }

    #[test]
    fn mouseout_and_touchend_clear_pick() {
        let (scene, el) = scene_at(Geometry::new(0, 0, 300, 150));
        for clearing in [EventKind::MouseOut, EventKind::MouseLeave, EventKind::TouchEnd] {
            el.dispatch_event(&EventRecord::new(EventKind::MouseMove).at(30.0, 30.0));
            assert!(!scene.pick_position().is_cleared());
            el.dispatch_event(&EventRecord::new(clearing));
            assert!(scene.pick_position().is_cleared(), "{clearing}");
        }
    }

    #[test]
    fn touch_uses_first_touch() {
        let (scene, el) = scene_at(Geometry::new(0, 0, 200, 100));
        let mut touch = EventRecord::new(EventKind::TouchStart);
        touch.touches = Some(vec![Touch::new(0, 200.0, 100.0), Touch::new(1, 0.0, 0.0)]);
        el.dispatch_event(&touch);
        assert_eq!(scene.pick_position(), PickPosition { x: 1.0, y: -1.0 });
    }

    #[test]
    fn zero_sized_element_clears_pick() {
        let (scene, el) = scene_at(Geometry::new(0, 0, 0, 0));
        el.dispatch_event(&EventRecord::new(EventKind::MouseMove).at(5.0, 5.0));
        assert!(scene.pick_position().is_cleared());
    }

    #[test]
    fn render_resizes_surface_to_client_size() {
        let (mut scene, el) = scene_at(Geometry::new(0, 0, 400, 200));
        let frame = scene.render(0.5);
        assert_eq!(scene.surface(), Surface { width: 400, height: 200 });
        assert!(frame.contains("Surface: 400x200 (resized)"));
        assert!((scene.camera().aspect - 2.0).abs() < 1e-6);

        el.handle_event(&EventData::from(Geometry::new(0, 0, 100, 100)));
        let frame = scene.render(1.0);
        assert!(frame.contains("Surface: 100x100 (resized)"));
        assert!((scene.camera().aspect - 1.0).abs() < 1e-6);

        let frame = scene.render(1.5);
        assert!(frame.contains("Surface: 100x100\n"));
    }

    #[test]
    fn render_reports_cubes_and_frame_count() {
        let (mut scene, _el) = scene_at(Geometry::new(0, 0, 300, 150));
        scene.render(0.0);
        let frame = scene.render(2.0);
        assert_eq!(scene.frames(), 2);
        assert!(frame.contains("frame=2"));
        assert!(frame.contains("[#44aa88] x=0.0 rot=2.000"));
        assert!(frame.contains("[#8844aa] x=-2.0 rot=2.200"));
        assert!(frame.contains("[#aa8844] x=2.0 rot=2.400"));
        assert!(frame.contains("Pick: none"));
    }

    #[test]
    fn frame_has_one_line_per_item() {
        let (mut scene, el) = scene_at(Geometry::new(0, 0, 300, 150));
        el.dispatch_event(&EventRecord::new(EventKind::MouseMove).at(150.0, 75.0));
        let frame = scene.render(0.0);
        assert!(frame.ends_with('\n'));
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("=== Orbit (frame=1"));
        assert_eq!(lines[3], "Pick: (0.000, 0.000)");
    }

    #[test]
    fn hidden_document_skips_frame() {
        let doc = Rc::new(DocumentShim::new());
        let el = Rc::new(ElementProxyReceiver::new("A".into(), Rc::clone(&doc)));
        let mut scene = OrbitScene::new(SceneInit {
            surface: Surface::default(),
            input_element: el,
        });
        doc.set_visibility_state(VisibilityState::Hidden);
        assert!(scene.render(1.0).contains("hidden"));
        assert_eq!(scene.frames(), 0);
    }

    #[test]
    fn dropping_scene_detaches_listeners() {
        let (scene, el) = scene_at(Geometry::new(0, 0, 300, 150));
        assert_eq!(el.listener_count(EventKind::MouseMove), 1);
        assert_eq!(el.listener_count(EventKind::PointerDown), 1);
        drop(scene);
        assert_eq!(el.listener_count(EventKind::MouseMove), 0);
        assert_eq!(el.listener_count(EventKind::PointerDown), 0);
    }

    #[test]
    fn factory_builds_scene() {
        let el = Rc::new(ElementProxyReceiver::new("A".into(), Rc::new(DocumentShim::new())));
        let scene = OrbitSceneFactory.init(SceneInit {
            surface: Surface::default(),
            input_element: el,
        });
        assert!(scene.is_ok());
    }
}
