use glam::{Mat4, Vec3};
use offscreen_bridge::{ElementProxyReceiver, Listener, ListenerOptions, listener};
use offscreen_protocol::{EventKind, EventRecord};
use std::cell::{Cell, RefCell};
use std::f32::consts::PI;
use std::rc::{Rc, Weak};

const MIN_POLAR: f32 = 1e-4;

/// Orbit-control tuning. Defaults follow the usual orbit-control behaviour.
#[derive(Debug, Clone)]
pub struct OrbitControlsConfig {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Pixels panned per arrow key press.
    pub key_pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitControlsConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            key_pan_speed: 7.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

/// Perspective camera orbiting a target, in spherical coordinates.
///
/// `theta` is the azimuth around +Y measured from +Z, `phi` the polar angle from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    // Four units down +Z looking at the origin.
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 4.0,
            theta: 0.0,
            phi: PI / 2.0,
            fov: 75.0_f32.to_radians(),
            aspect: 2.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    pointer_id: i32,
    last: (f64, f64),
}

struct OrbitState {
    camera: OrbitCamera,
    config: OrbitControlsConfig,
    drag: Option<Drag>,
}

impl OrbitState {
    fn rotate(&mut self, dx: f32, dy: f32, client_height: f32) {
        let speed = 2.0 * PI * self.config.rotate_speed / client_height;
        self.camera.theta -= dx * speed;
        self.camera.phi = (self.camera.phi - dy * speed).clamp(MIN_POLAR, PI - MIN_POLAR);
    }

    fn pan(&mut self, dx: f32, dy: f32, client_height: f32) {
        // World units covered by one pixel at the target's depth.
        let per_pixel = 2.0 * self.camera.radius * (self.camera.fov / 2.0).tan() / client_height;
        let scale = per_pixel * self.config.pan_speed;
        let offset = (-self.camera.right() * dx + self.camera.up() * dy) * scale;
        self.camera.target += offset;
    }

    fn dolly(&mut self, delta_y: f64) {
        let scale = 0.95_f32.powf(self.config.zoom_speed);
        if delta_y < 0.0 {
            self.camera.radius *= scale;
        } else if delta_y > 0.0 {
            self.camera.radius /= scale;
        }
        self.camera.radius = self
            .camera
            .radius
            .clamp(self.config.min_distance, self.config.max_distance);
    }
}

/// Camera controls attached to an element facade.
///
/// Left drag rotates, right drag (or modified left drag) pans, the wheel
/// dollies, and arrow keys pan.
pub struct OrbitControls {
    state: Rc<RefCell<OrbitState>>,
    element: Weak<ElementProxyReceiver>,
    listeners: Vec<(EventKind, Listener)>,
    updates: Rc<Cell<u64>>,
}

impl OrbitControls {
    pub fn new(
        camera: OrbitCamera,
        element: &Rc<ElementProxyReceiver>,
        config: OrbitControlsConfig,
    ) -> Self {
        let state = Rc::new(RefCell::new(OrbitState {
            camera,
            config,
            drag: None,
        }));
        let updates = Rc::new(Cell::new(0));
        let weak = Rc::downgrade(element);

        element.style().set("touchAction", "none");

        let listeners: Vec<(EventKind, Listener)> = vec![
            (EventKind::ContextMenu, listener(|e| {
                e.prevent_default();
                Ok(())
            })),
            (EventKind::PointerDown, on_pointer_down(&state, &weak)),
            (EventKind::PointerMove, on_pointer_move(&state, &weak, &updates)),
            (EventKind::PointerUp, on_pointer_up(&state, &weak)),
            (EventKind::Wheel, on_wheel(&state, &updates)),
            (EventKind::KeyDown, on_key_down(&state, &weak, &updates)),
        ];
        for (kind, l) in &listeners {
            element.add_event_listener(*kind, Rc::clone(l), ListenerOptions::default());
        }

        Self {
            state,
            element: weak,
            listeners,
            updates,
        }
    }

    pub fn camera(&self) -> OrbitCamera {
        self.state.borrow().camera
    }

    pub fn set_aspect(&self, aspect: f32) {
        self.state.borrow_mut().camera.aspect = aspect;
    }

    pub fn is_dragging(&self) -> bool {
        self.state.borrow().drag.is_some()
    }

    /// Number of camera changes applied from input so far.
    pub fn update_count(&self) -> u64 {
        self.updates.get()
    }

    /// Unsubscribe from the element.
    pub fn dispose(&mut self) {
        if let Some(element) = self.element.upgrade() {
            for (kind, l) in self.listeners.drain(..) {
                element.remove_event_listener(kind, &l);
            }
        }
        self.listeners.clear();
    }
}

impl Drop for OrbitControls {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn client_height(element: &Weak<ElementProxyReceiver>) -> Option<f32> {
    let h = element.upgrade()?.client_height();
    (h > 0).then_some(h as f32)
}

fn client_pos(e: &EventRecord) -> Option<(f64, f64)> {
    Some((e.client_x?, e.client_y?))
}

fn on_pointer_down(state: &Rc<RefCell<OrbitState>>, element: &Weak<ElementProxyReceiver>) -> Listener {
    let state = Rc::clone(state);
    let element = element.clone();
    listener(move |e| {
        let Some(last) = client_pos(e) else {
            return Ok(());
        };
        let modified = e.ctrl_key == Some(true) || e.meta_key == Some(true) || e.shift_key == Some(true);
        let mode = match e.button.unwrap_or(0) {
            0 if modified => DragMode::Pan,
            0 => DragMode::Rotate,
            2 => DragMode::Pan,
            _ => return Ok(()),
        };
        let pointer_id = e.pointer_id.unwrap_or(0);
        if let Some(el) = element.upgrade() {
            el.set_pointer_capture(pointer_id);
        }
        state.borrow_mut().drag = Some(Drag {
            mode,
            pointer_id,
            last,
        });
        Ok(())
    })
}

fn on_pointer_move(
    state: &Rc<RefCell<OrbitState>>,
    element: &Weak<ElementProxyReceiver>,
    updates: &Rc<Cell<u64>>,
) -> Listener {
    let state = Rc::clone(state);
    let element = element.clone();
    let updates = Rc::clone(updates);
    listener(move |e| {
        let mut st = state.borrow_mut();
        let Some(drag) = st.drag else {
            return Ok(());
        };
        if e.pointer_id.unwrap_or(0) != drag.pointer_id {
            return Ok(());
        }
        let (Some(pos), Some(height)) = (client_pos(e), client_height(&element)) else {
            return Ok(());
        };
        let dx = (pos.0 - drag.last.0) as f32;
        let dy = (pos.1 - drag.last.1) as f32;
        match drag.mode {
            DragMode::Rotate => st.rotate(dx, dy, height),
            DragMode::Pan => st.pan(dx, dy, height),
        }
        st.drag = Some(Drag { last: pos, ..drag });
        updates.set(updates.get() + 1);
        Ok(())
    })
}

fn on_pointer_up(state: &Rc<RefCell<OrbitState>>, element: &Weak<ElementProxyReceiver>) -> Listener {
    let state = Rc::clone(state);
    let element = element.clone();
    listener(move |_| {
        if let Some(drag) = state.borrow_mut().drag.take() {
            if let Some(el) = element.upgrade() {
                el.release_pointer_capture(drag.pointer_id);
            }
        }
        Ok(())
    })
}

fn on_wheel(state: &Rc<RefCell<OrbitState>>, updates: &Rc<Cell<u64>>) -> Listener {
    let state = Rc::clone(state);
    let updates = Rc::clone(updates);
    listener(move |e| {
        e.prevent_default();
        let Some(delta_y) = e.delta_y else {
            return Ok(());
        };
        state.borrow_mut().dolly(delta_y);
        updates.set(updates.get() + 1);
        Ok(())
    })
}

fn on_key_down(
    state: &Rc<RefCell<OrbitState>>,
    element: &Weak<ElementProxyReceiver>,
    updates: &Rc<Cell<u64>>,
) -> Listener {
    let state = Rc::clone(state);
    let element = element.clone();
    let updates = Rc::clone(updates);
    listener(move |e| {
        let Some(height) = client_height(&element) else {
            return Ok(());
        };
        let mut st = state.borrow_mut();
        let step = st.config.key_pan_speed;
        match e.code.as_deref() {
            Some("ArrowUp") => st.pan(0.0, step, height),
            Some("ArrowDown") => st.pan(0.0, -step, height),
            Some("ArrowLeft") => st.pan(step, 0.0, height),
            Some("ArrowRight") => st.pan(-step, 0.0, height),
            _ => return Ok(()),
        }
        updates.set(updates.get() + 1);
        Ok(())
    })
}
