use crate::config::RenderConfig;
use crate::dispatcher::CommandDispatcher;
use crate::scene::SceneFactory;
use offscreen_common::ProxyId;
use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Summary handed back when the render loop exits.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkerReport {
    pub frames: u64,
    pub records: u64,
    /// Records the dispatcher rejected, in arrival order.
    pub fatal_errors: Vec<String>,
    /// Last frame each scene rendered, kept after its proxy is disposed.
    pub last_frames: BTreeMap<ProxyId, String>,
    pub dropped_records: u64,
}

/// The render context's top level: pulls records off the channel,
/// dispatches them, and renders every started scene once per frame.
pub struct RenderWorker {
    inbound: Receiver<String>,
    dispatcher: CommandDispatcher,
    config: RenderConfig,
    report: WorkerReport,
    epoch: Instant,
    connected: bool,
}

impl RenderWorker {
    pub fn new(inbound: Receiver<String>, factory: Box<dyn SceneFactory>, config: RenderConfig) -> Self {
        Self {
            inbound,
            dispatcher: CommandDispatcher::new(factory),
            config,
            report: WorkerReport::default(),
            epoch: Instant::now(),
            connected: true,
        }
    }

    /// Run a worker on a dedicated `render` thread.
    ///
    /// The dispatcher is single-threaded, so it is built on the new thread.
    pub fn spawn(
        inbound: Receiver<String>,
        factory: Box<dyn SceneFactory + Send>,
        config: RenderConfig,
    ) -> io::Result<JoinHandle<WorkerReport>> {
        thread::Builder::new()
            .name("render".into())
            .spawn(move || RenderWorker::new(inbound, factory, config).run())
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn report(&self) -> &WorkerReport {
        &self.report
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Handle one wire record. Fatal errors are logged and collected; the
    /// loop keeps going.
    pub fn process(&mut self, raw: &str) {
        let _span = tracing::debug_span!("record", n = self.report.records).entered();
        self.report.records += 1;
        match self.dispatcher.handle_raw(raw) {
            Ok(outcome) => tracing::trace!(?outcome, "handled"),
            Err(e) => {
                tracing::error!("fatal record error: {e}");
                self.report.fatal_errors.push(e.to_string());
            }
        }
    }

    /// Apply every record already queued. Returns how many were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut n = 0;
        loop {
            match self.inbound.try_recv() {
                Ok(raw) => {
                    self.process(&raw);
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.connected = false;
                    break;
                }
            }
        }
        n
    }

    /// Block for records until `deadline`, applying each as it arrives.
    pub fn pump_until(&mut self, deadline: Instant) {
        while self.connected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.inbound.recv_timeout(remaining) {
                Ok(raw) => self.process(&raw),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => self.connected = false,
            }
        }
    }

    /// Drain the queue, then render one frame of every scene.
    pub fn tick(&mut self, time: f64) {
        self.drain_pending();
        let _span = tracing::info_span!("frame", n = self.report.frames).entered();
        for (id, frame) in self.dispatcher.render_frame(time) {
            self.report.last_frames.insert(id, frame);
        }
        self.report.frames += 1;
    }

    /// Loop until the channel disconnects or the frame budget is spent.
    pub fn run(mut self) -> WorkerReport {
        tracing::info!(
            frame_ms = self.config.frame_interval.as_millis() as u64,
            max_frames = ?self.config.max_frames,
            "render loop started"
        );
        self.epoch = Instant::now();
        loop {
            if self
                .config
                .max_frames
                .is_some_and(|max| self.report.frames >= max)
            {
                break;
            }
            self.pump_until(Instant::now() + self.config.frame_interval);
            let time = self.epoch.elapsed().as_secs_f64();
            self.tick(time);
            if !self.connected {
                break;
            }
        }
        self.report.dropped_records = self.dispatcher.proxies().dropped_records();
        tracing::info!(
            frames = self.report.frames,
            records = self.report.records,
            fatal = self.report.fatal_errors.len(),
            "render loop stopped"
        );
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit_scene::OrbitSceneFactory;
    use crate::scene::{Scene, SceneInit};
    use offscreen_bridge::{ListenerOptions, listener};
    use offscreen_common::{Geometry, Surface};
    use offscreen_input::{
        ChannelTransport, ElementProxy, HostElement, Modifiers, NativeEvent, SimulatedElement,
        Transport, serialize,
    };
    use offscreen_protocol::{EventKind, EventRecord, Touch};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Fixture {
        worker: RenderWorker,
        host: Rc<SimulatedElement>,
        proxy: ElementProxy,
    }

    fn fixture(factory: Box<dyn SceneFactory>) -> Fixture {
        let (transport, rx) = ChannelTransport::pair();
        let host = Rc::new(SimulatedElement::new(Geometry::new(10, 20, 300, 150)));
        let host_dyn: Rc<dyn HostElement> = host.clone();
        let transport: Rc<dyn Transport> = Rc::new(transport);
        let proxy = ElementProxy::create(host_dyn, transport, "A".into()).unwrap();
        let worker = RenderWorker::new(rx, factory, RenderConfig::default());
        Fixture {
            worker,
            host,
            proxy,
        }
    }

    fn capture(worker: &RenderWorker, kind: EventKind) -> Rc<RefCell<Vec<EventRecord>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        worker
            .dispatcher()
            .proxies()
            .get_proxy(&"A".into())
            .unwrap()
            .add_event_listener(
                kind,
                listener(move |e| {
                    s.borrow_mut().push(e.clone());
                    Ok(())
                }),
                ListenerOptions::default(),
            );
        seen
    }

    /// A native event with every field group populated plus a
    /// non-whitelisted property.
    fn loaded(kind: EventKind) -> NativeEvent {
        let touch = Touch::new(3, 12.0, 13.0);
        NativeEvent::new(kind, 250.0)
            .at(42.0, 7.0)
            .with_page(52.0, 27.0)
            .with_modifiers(Modifiers {
                shift: true,
                ctrl: false,
                alt: true,
                meta: false,
            })
            .with_buttons(2, 2)
            .with_pointer(9, "pen", true)
            .with_wheel(0.5, -3.0, 0.0, 1)
            .with_touches(vec![touch.clone()], vec![touch])
            .with_key("a", "KeyA")
            .with_extra("target", "canvas#c")
    }

    #[test]
    fn every_kind_round_trips_its_whitelisted_fields() {
        let mut f = fixture(Box::new(OrbitSceneFactory));
        f.worker.drain_pending();
        let seen: Vec<_> = EventKind::ALL
            .iter()
            .map(|kind| capture(&f.worker, *kind))
            .collect();

        for kind in EventKind::ALL {
            f.host.fire(&loaded(kind));
        }
        f.worker.drain_pending();

        for (kind, seen) in EventKind::ALL.iter().zip(&seen) {
            let seen = seen.borrow();
            assert_eq!(seen.len(), 1, "{kind}");
            let expected = serialize(&loaded(*kind));
            assert_eq!(seen[0], expected, "{kind}");
            assert_eq!(seen[0].time_stamp, Some(250.0));
        }
    }

    #[test]
    fn records_carry_only_their_kind_fields() {
        let mut f = fixture(Box::new(OrbitSceneFactory));
        f.worker.drain_pending();
        let touches = capture(&f.worker, EventKind::TouchMove);
        let wheels = capture(&f.worker, EventKind::Wheel);
        let keys = capture(&f.worker, EventKind::KeyDown);

        f.host.fire(&loaded(EventKind::TouchMove));
        f.host.fire(&loaded(EventKind::Wheel));
        f.host.fire(&loaded(EventKind::KeyDown));
        f.worker.drain_pending();

        let t = &touches.borrow()[0];
        assert_eq!(t.client_x, None);
        assert_eq!(t.touches.as_ref().map(Vec::len), Some(1));
        assert_eq!(t.shift_key, Some(true));

        let w = &wheels.borrow()[0];
        assert_eq!(w.delta_y, Some(-3.0));
        assert_eq!(w.client_x, Some(42.0));
        assert_eq!(w.pointer_id, None);
        assert_eq!(w.key, None);

        let k = &keys.borrow()[0];
        assert_eq!(k.code.as_deref(), Some("KeyA"));
        assert_eq!(k.client_x, None);
        assert_eq!(k.touches, None);
    }

    #[test]
    fn touch_default_is_prevented_before_posting() {
        let f = fixture(Box::new(OrbitSceneFactory));
        assert!(f.host.fire(&loaded(EventKind::TouchStart)));
        assert!(!f.host.fire(&loaded(EventKind::MouseDown)));
    }

    #[test]
    fn geometry_follows_host_layout() {
        let mut f = fixture(Box::new(OrbitSceneFactory));
        f.worker.drain_pending();
        let r = f.worker.dispatcher().proxies().get_proxy(&"A".into()).unwrap();
        assert_eq!(r.get_bounding_client_rect().right, 310);

        f.host.resize(640, 480);
        f.host.move_to(0, 0);
        f.worker.drain_pending();
        let rect = r.get_bounding_client_rect();
        assert_eq!((rect.left, rect.top, rect.width, rect.height), (0, 0, 640, 480));
    }

    #[test]
    fn start_then_tick_renders_scene() {
        let mut f = fixture(Box::new(OrbitSceneFactory));
        f.proxy.start(Surface::default()).unwrap();
        f.worker.tick(0.0);
        assert_eq!(f.worker.dispatcher().scene_count(), 1);
        let frame = &f.worker.report().last_frames[&ProxyId::new("A")];
        assert!(frame.contains("Surface: 300x150"));
        assert_eq!(f.worker.report().frames, 1);
    }

    #[test]
    fn records_posted_before_a_frame_apply_before_it() {
        struct Probe(Rc<offscreen_bridge::ElementProxyReceiver>);
        impl Scene for Probe {
            fn render(&mut self, _time: f64) -> String {
                format!("{}x{}", self.0.client_width(), self.0.client_height())
            }
        }
        let factory = |init: SceneInit| -> anyhow::Result<Box<dyn Scene>> {
            Ok(Box::new(Probe(init.input_element)))
        };
        let mut f = fixture(Box::new(factory));
        f.proxy.start(Surface::default()).unwrap();
        f.host.resize(800, 600);
        f.worker.tick(0.0);
        assert_eq!(f.worker.report().last_frames[&ProxyId::new("A")], "800x600");
    }

    #[test]
    fn fatal_records_are_collected_and_loop_continues() {
        let (tx, rx) = mpsc::channel();
        let mut worker = RenderWorker::new(rx, Box::new(OrbitSceneFactory), RenderConfig::default());
        tx.send(r#"{"type":"mouse","x":0,"y":0}"#.to_owned()).unwrap();
        tx.send(r#"{"type":"makeProxy","id":"A"}"#.to_owned()).unwrap();
        tx.send(r#"{"type":"makeProxy","id":"A"}"#.to_owned()).unwrap();
        worker.tick(0.0);

        let report = worker.report();
        assert_eq!(report.records, 3);
        assert_eq!(report.fatal_errors.len(), 2);
        assert_eq!(report.fatal_errors[0], "no handler for type: mouse");
        assert!(worker.dispatcher().proxies().contains(&"A".into()));
    }

    #[test]
    fn dispose_stops_rendering_but_keeps_last_frame() {
        let mut f = fixture(Box::new(OrbitSceneFactory));
        f.proxy.start(Surface::default()).unwrap();
        f.worker.tick(0.0);
        let last = f.worker.report().last_frames[&ProxyId::new("A")].clone();
        f.proxy.dispose().unwrap();
        assert_eq!(f.host.listener_count(), 0);
        assert_eq!(f.host.observer_count(), 0);
        f.worker.tick(0.016);
        assert!(f.worker.dispatcher().proxies().is_empty());
        assert_eq!(f.worker.dispatcher().scene_count(), 0);
        assert_eq!(f.worker.report().last_frames[&ProxyId::new("A")], last);
    }

    #[test]
    fn run_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel::<String>();
        let config = RenderConfig::default().with_frame_interval(Duration::from_millis(1));
        let worker = RenderWorker::new(rx, Box::new(OrbitSceneFactory), config);
        tx.send(r#"{"type":"makeProxy","id":"A"}"#.to_owned()).unwrap();
        drop(tx);
        let report = worker.run();
        assert_eq!(report.records, 1);
        assert!(report.frames >= 1);
        assert!(report.fatal_errors.is_empty());
    }

    #[test]
    fn run_honours_frame_budget() {
        let (_tx, rx) = mpsc::channel::<String>();
        let config = RenderConfig::default()
            .with_frame_interval(Duration::from_millis(1))
            .with_max_frames(3);
        let report = RenderWorker::new(rx, Box::new(OrbitSceneFactory), config).run();
        assert_eq!(report.frames, 3);
    }

    #[test]
    fn spawned_worker_reports_back() {
        let (transport, rx) = ChannelTransport::pair();
        let config = RenderConfig::default().with_frame_interval(Duration::from_millis(1));
        let handle = RenderWorker::spawn(rx, Box::new(OrbitSceneFactory), config).unwrap();

        transport.post(&offscreen_protocol::Message::MakeProxy { id: "A".into() }).unwrap();
        transport
            .post(&offscreen_protocol::Message::Start {
                id: "A".into(),
                surface: Surface::default(),
            })
            .unwrap();
        transport
            .post(&offscreen_protocol::Message::DisposeProxy { id: "A".into() })
            .unwrap();
        drop(transport);

        let report = handle.join().unwrap();
        assert_eq!(report.records, 3);
        assert!(report.fatal_errors.is_empty());
        assert_eq!(report.dropped_records, 0);
    }
}
