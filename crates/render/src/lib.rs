//! Render context: everything that runs on the background thread.
//!
//! # Invariants
//! - The dispatcher is the only entry point from the channel.
//! - All records pending at a frame boundary are applied before the frame renders.
//! - Scenes see input only through an `ElementProxyReceiver`.

mod config;
mod controls;
mod dispatcher;
mod orbit_scene;
mod scene;
mod worker;

pub use config::RenderConfig;
pub use controls::{OrbitCamera, OrbitControls, OrbitControlsConfig};
pub use dispatcher::{CommandDispatcher, DispatchError, Outcome};
pub use orbit_scene::{OrbitScene, OrbitSceneFactory, PickPosition};
pub use scene::{Scene, SceneFactory, SceneInit};
pub use worker::{RenderWorker, WorkerReport};
