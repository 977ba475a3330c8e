use anyhow::Context;
use clap::{Parser, Subcommand};
use pixelgrab_common::{ObjectId, Ray};
use pixelgrab_kernel::{
    GrabPolicy, InteractionEvent, InteractionState, ObjectRegistry, StepInput, step,
};
use pixelgrab_render::{CanvasLayout, DebugTextRenderer, RenderView, Renderer, SceneRef};
use pixelgrab_tools::SceneInspector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixelgrab-cli", about = "Headless pixelgrab tooling")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and viewer defaults
    Info,
    /// Aim at the first box, hold it while scrolling, then let go
    Simulate {
        /// Number of frames to run, including the aim and release frames
        #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u32).range(3..))]
        frames: u32,
        /// RNG seed for box placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Number of boxes to scatter
        #[arg(short, long, default_value = "5")]
        boxes: usize,
        /// Wheel lines scrolled on each held frame
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        scroll: f32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let policy = GrabPolicy::default();
            let layout = CanvasLayout::new(1000, 600, 2)?;
            println!("pixelgrab-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", pixelgrab_render::crate_info());
            println!(
                "grab: scroll_step={} min_distance={}",
                policy.scroll_step,
                policy
                    .min_distance
                    .map_or_else(|| "none".to_string(), |d| d.to_string())
            );
            println!(
                "display: {}x{} canvas: {}x{} pixel_size={}",
                layout.display_size().x,
                layout.display_size().y,
                layout.canvas_size().x,
                layout.canvas_size().y,
                layout.downscale()
            );
        }
        Commands::Simulate {
            frames,
            seed,
            boxes,
            scroll,
        } => {
            println!("Grab simulation: seed={seed}, boxes={boxes}, frames={frames}, scroll={scroll}");

            let mut registry = ObjectRegistry::scatter(boxes, &mut StdRng::seed_from_u64(seed));
            let target = registry
                .get(ObjectId(0))
                .map(|o| o.position())
                .context("simulation needs at least one box")?;

            let view = RenderView::default();
            let ray = Ray::towards(view.eye, target);
            let policy = GrabPolicy::default();
            let mut state = InteractionState::new();
            let mut moves = 0usize;

            for frame in 0..frames {
                // Frame 0 only aims; the last frame lets go.
                let held = frame > 0 && frame + 1 < frames;
                let input = StepInput {
                    elapsed: 1.0 / 60.0,
                    ray,
                    grab_held: held,
                    scroll_delta: if held { scroll } else { 0.0 },
                    viewer_position: view.eye,
                };
                let outcome = step(&mut registry, state, &input, &policy);
                state = outcome.state;

                for event in outcome.events {
                    match event {
                        InteractionEvent::GrabStarted { id, distance } => {
                            println!("frame {frame}: grabbed {id} at distance {distance:.2}");
                        }
                        InteractionEvent::Released { id } => {
                            println!("frame {frame}: released {id}");
                        }
                        InteractionEvent::Moved { id, to, .. } => {
                            moves += 1;
                            tracing::debug!(frame, %id, ?to, "moved");
                        }
                    }
                }
            }

            println!("moves: {moves}");
            println!("{}", SceneInspector::summary(&registry, &state));
            print!(
                "{}",
                DebugTextRenderer::new().render(
                    SceneRef {
                        registry: &registry,
                        interaction: &state,
                    },
                    &view,
                )
            );

            if let Some(object) = registry.get(ObjectId(0)) {
                let distance = object.position().distance(view.eye);
                println!("first box: distance={distance:.2} held={}", object.is_grabbed());
            }
        }
    }

    Ok(())
}
