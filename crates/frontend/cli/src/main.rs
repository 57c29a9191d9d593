mod scene;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use prism_core::logging::{LogCategory, LogConfig, LogLevel};
use prism_core::renderer::Renderer;
use prism_core::types::Frame;
use prism_raster::{PipelineRenderer, RenderConfig, SoftwareRenderer};
use scene::{Scene, SceneKind};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "prism", about = "Render a built-in scene with the software rasterizer")]
struct Args {
    /// Scene to render
    #[arg(value_enum)]
    scene: SceneKind,

    /// Surface width (overrides --config)
    #[arg(long)]
    width: Option<u32>,

    /// Surface height (overrides --config)
    #[arg(long)]
    height: Option<u32>,

    /// PNG file to write the last frame to
    #[arg(long, default_value = "prism.png")]
    output: PathBuf,

    /// JSON render settings; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of animation steps to render
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Pipeline log level for every category: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Trace every rasterized primitive (very noisy)
    #[arg(long, default_value_t = false)]
    log_raster: bool,

    /// Write pipeline logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Point size in pixels (overrides --config)
    #[arg(long)]
    point_size: Option<u32>,

    /// Enable back-face culling (overrides --config)
    #[arg(long, default_value_t = false)]
    cull: bool,

    /// Print the last frame's draw counters as JSON
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn configure_logging(args: &Args) -> Result<()> {
    let level = LogLevel::from_str(&args.log_level)
        .ok_or_else(|| anyhow!("Unknown log level: {}", args.log_level))?;
    let config = LogConfig::global();
    for category in LogCategory::ALL {
        config.set_level(category, level);
    }
    if args.log_raster {
        config.set_level(LogCategory::Raster, LogLevel::Trace);
    }
    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    Ok(())
}

fn render_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading render config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(size) = args.point_size {
        config.point_size = size;
    }
    if args.cull {
        config.cull_back_faces = true;
    }
    if config.width == 0 || config.height == 0 {
        anyhow::bail!("Surface size must be non-zero, got {}x{}", config.width, config.height);
    }
    Ok(config)
}

fn write_png(frame: &Frame, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame.to_rgba_bytes())?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    configure_logging(&args)?;

    if args.frames == 0 {
        anyhow::bail!("--frames must be at least 1");
    }

    let config = render_config(&args)?;
    let aspect = config.width as f32 / config.height as f32;
    let mut renderer = SoftwareRenderer::new(config.clone());
    let mut scene = Scene::new(args.scene)?;
    log::info!(
        "Rendering {:?} at {}x{} with {}",
        scene.kind(),
        config.width,
        config.height,
        renderer.name()
    );

    for frame in 0..args.frames {
        renderer.clear(config.clear_color);
        let stats = scene.render(&mut renderer, frame, aspect)?;
        log::debug!(
            "Frame {}: {} fragments written of {} shaded",
            frame,
            stats.fragments_written,
            stats.fragments_shaded
        );
    }

    write_png(renderer.get_frame(), &args.output)?;
    log::info!("Wrote {}", args.output.display());

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&renderer.frame_stats())?);
    }

    Ok(())
}
