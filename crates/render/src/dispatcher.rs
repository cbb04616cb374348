use crate::scene::{Scene, SceneFactory, SceneInit};
use offscreen_bridge::{BridgeError, Delivery, ProxyManager};
use offscreen_common::{Geometry, ProxyId};
use offscreen_protocol::{EventData, Message, ProtocolError, decode};
use std::collections::BTreeMap;

/// Fatal errors from handling one inbound record.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("proxy {0} is already started")]
    AlreadyStarted(ProxyId),
    #[error("scene init for proxy {id} failed: {source:#}")]
    SceneInit {
        id: ProxyId,
        #[source]
        source: anyhow::Error,
    },
}

/// Result of a successfully handled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Started,
    Routed(Delivery),
    Disposed { existed: bool },
}

/// Maps each inbound record to its handler.
///
/// Owns the receivers and the scenes started on them.
pub struct CommandDispatcher {
    proxies: ProxyManager,
    factory: Box<dyn SceneFactory>,
    scenes: BTreeMap<ProxyId, Box<dyn Scene>>,
}

impl CommandDispatcher {
    pub fn new(factory: Box<dyn SceneFactory>) -> Self {
        Self {
            proxies: ProxyManager::new(),
            factory,
            scenes: BTreeMap::new(),
        }
    }

    /// Decode a JSON wire record and handle it.
    pub fn handle_raw(&mut self, raw: &str) -> Result<Outcome, DispatchError> {
        let msg = decode(raw)?;
        self.handle(msg)
    }

    pub fn handle(&mut self, msg: Message) -> Result<Outcome, DispatchError> {
        match msg {
            Message::MakeProxy { id } => {
                self.proxies.make_proxy(id)?;
                Ok(Outcome::Created)
            }
            Message::Start { id, surface } => {
                if self.scenes.contains_key(&id) {
                    return Err(DispatchError::AlreadyStarted(id));
                }
                let input_element = self.proxies.get_proxy(&id)?;
                let scene = self
                    .factory
                    .init(SceneInit {
                        surface,
                        input_element,
                    })
                    .map_err(|source| DispatchError::SceneInit {
                        id: id.clone(),
                        source,
                    })?;
                tracing::info!(proxy = %id, width = surface.width, height = surface.height, "scene started");
                self.scenes.insert(id, scene);
                Ok(Outcome::Started)
            }
            Message::Event { id, data } => {
                Ok(Outcome::Routed(self.proxies.handle_event(&id, &data)))
            }
            Message::Size {
                id,
                left,
                top,
                width,
                height,
            } => {
                let data = EventData::from(Geometry::new(left, top, width, height));
                Ok(Outcome::Routed(self.proxies.handle_event(&id, &data)))
            }
            Message::DisposeProxy { id } => {
                self.scenes.remove(&id);
                let existed = self.proxies.dispose_proxy(&id);
                Ok(Outcome::Disposed { existed })
            }
        }
    }

    /// Render every started scene once.
    pub fn render_frame(&mut self, time: f64) -> Vec<(ProxyId, String)> {
        self.scenes
            .iter_mut()
            .map(|(id, scene)| (id.clone(), scene.render(time)))
            .collect()
    }

    pub fn proxies(&self) -> &ProxyManager {
        &self.proxies
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }
}
