mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use offscreen_common::{Geometry, ProxyId, Surface};
use offscreen_input::{ChannelTransport, ElementProxy, HostElement, SimulatedElement, Transport};
use offscreen_protocol::{EventKind, MESSAGE_TYPES};
use offscreen_render::{OrbitSceneFactory, RenderConfig, RenderWorker};
use script::{Script, ScriptStep};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "offscreen-cli", about = "Drive the offscreen input bridge from the command line")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and protocol info
    Info,
    /// Replay an input script through a proxy into the render thread
    Run {
        /// YAML input script; the built-in demo runs if omitted
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Stop the render loop after this many frames
        #[arg(short, long)]
        frames: Option<u64>,
        /// Milliseconds between frames
        #[arg(long, default_value = "16")]
        frame_ms: u64,
        /// Initial element width
        #[arg(long, default_value = "300")]
        width: u32,
        /// Initial element height
        #[arg(long, default_value = "150")]
        height: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("offscreen-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("messages: {}", MESSAGE_TYPES.join(", "));
            let kinds: Vec<&str> = EventKind::ALL.iter().map(EventKind::as_str).collect();
            println!("event kinds ({}): {}", kinds.len(), kinds.join(", "));
        }
        Commands::Run {
            script,
            frames,
            frame_ms,
            width,
            height,
        } => {
            let script = match script {
                Some(path) => Script::load(&path)?,
                None => Script::builtin()?,
            };
            let mut config = RenderConfig::default().with_frame_interval(Duration::from_millis(frame_ms));
            if let Some(n) = frames {
                config = config.with_max_frames(n);
            }
            run(script, config, Geometry::new(0, 0, width, height))?;
        }
    }

    Ok(())
}

fn run(script: Script, config: RenderConfig, geometry: Geometry) -> anyhow::Result<()> {
    let (transport, rx) = ChannelTransport::pair();
    let worker = RenderWorker::spawn(rx, Box::new(OrbitSceneFactory), config)
        .context("spawning render thread")?;

    let host = Rc::new(SimulatedElement::new(geometry));
    let host_dyn: Rc<dyn HostElement> = host.clone();
    let transport: Rc<dyn Transport> = Rc::new(transport);
    let id = ProxyId::generate();
    println!("Proxy {id}: {}x{} at ({}, {})", geometry.width, geometry.height, geometry.left, geometry.top);

    let mut proxy = ElementProxy::create(host_dyn, Rc::clone(&transport), id)?;
    proxy.start(Surface::default())?;

    for (n, step) in script.steps.into_iter().enumerate() {
        let _span = tracing::debug_span!("step", n).entered();
        match step {
            ScriptStep::Resize { width, height } => host.resize(width, height),
            ScriptStep::Move { left, top } => host.move_to(left, top),
            ScriptStep::Event(event) => {
                let prevented = host.fire(&event);
                tracing::debug!(kind = %event.kind, prevented, "fired");
            }
            ScriptStep::Wait { ms } => thread::sleep(Duration::from_millis(ms)),
            ScriptStep::Dispose => proxy.dispose()?,
        }
    }

    if let Err(e) = proxy.dispose() {
        // The loop may already have hit its frame budget.
        tracing::warn!("dispose not delivered: {e}");
    }
    drop(proxy);
    drop(transport);

    let report = worker
        .join()
        .map_err(|_| anyhow::anyhow!("render thread panicked"))?;

    println!(
        "Frames: {}  Records: {}  Dropped: {}",
        report.frames, report.records, report.dropped_records
    );
    for err in &report.fatal_errors {
        println!("  fatal: {err}");
    }
    for (id, frame) in &report.last_frames {
        println!("--- {id} ---\n{frame}");
    }
    Ok(())
}
