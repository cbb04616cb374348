use offscreen_bridge::ElementProxyReceiver;
use offscreen_common::Surface;
use std::rc::Rc;

/// What a scene receives on `start`: the transferred surface and the
/// receiver standing in for the input element.
pub struct SceneInit {
    pub surface: Surface,
    pub input_element: Rc<ElementProxyReceiver>,
}

/// A started scene. Called once per frame on the render thread.
///
/// The scene reads input state from its receiver; it never touches the channel.
pub trait Scene {
    /// Render one frame at `time` seconds since the loop started.
    fn render(&mut self, time: f64) -> String;
}

/// Builds a scene for each `start` record.
pub trait SceneFactory {
    fn init(&self, init: SceneInit) -> anyhow::Result<Box<dyn Scene>>;
}

impl<F> SceneFactory for F
where
    F: Fn(SceneInit) -> anyhow::Result<Box<dyn Scene>>,
{
    fn init(&self, init: SceneInit) -> anyhow::Result<Box<dyn Scene>> {
        self(init)
    }
}
