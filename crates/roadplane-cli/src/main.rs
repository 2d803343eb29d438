use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use roadplane_core::{ImageSize, Line2, NormWindow, Real};
use roadplane_linear::{
    estimate_planar_homography, DiagnosticSink, HomographyConfig, NoDiagnostics, RoadPlaneInput,
    RoadPlaneReport,
};
use serde::{Deserialize, Serialize};

mod overlay;

use overlay::ImageOverlay;

/// Road-plane homography from two lane boundaries.
#[derive(Debug, Parser)]
#[command(author, version, about = "Road-plane homography from two lane boundaries")]
struct Args {
    /// Path to a JSON scene: intrinsics, lane lines and windows.
    #[arg(long)]
    input: PathBuf,

    /// Optional path to JSON HomographyConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image the lines were detected in; provides the image size and the
    /// background of diagnostic overlays.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Directory receiving `samples.png` and `road_points.png`.
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

/// Scene as read from disk; the image size may come from `--image` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneFile {
    intrinsics: [[Real; 3]; 3],
    left_line: Line2,
    right_line: Line2,
    left_window: NormWindow,
    right_window: NormWindow,
    #[serde(default)]
    image_size: Option<ImageSize>,
}

impl SceneFile {
    fn into_input(self, image_size: ImageSize) -> RoadPlaneInput {
        RoadPlaneInput {
            intrinsics: self.intrinsics,
            left_line: self.left_line,
            right_line: self.right_line,
            left_window: self.left_window,
            right_window: self.right_window,
            image_size,
        }
    }
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

fn write_report_json(report: &RoadPlaneReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn resolve_image_size(
    declared: Option<ImageSize>,
    image: Option<&image::RgbImage>,
) -> Result<ImageSize> {
    match (declared, image) {
        (Some(size), Some(img)) => {
            let actual = ImageSize::new(img.width() as usize, img.height() as usize);
            if actual != size {
                warn!(
                    "scene declares {}x{} but the image is {}x{}; using the image size",
                    size.width, size.height, actual.width, actual.height
                );
            }
            Ok(actual)
        }
        (None, Some(img)) => Ok(ImageSize::new(img.width() as usize, img.height() as usize)),
        (Some(size), None) => Ok(size),
        (None, None) => bail!("image size unknown: set `image_size` in the scene or pass --image"),
    }
}

fn run_from_files(
    input_path: &Path,
    config_path: Option<&Path>,
    image_path: Option<&Path>,
    diagnostics_dir: Option<&Path>,
) -> Result<String> {
    let scene: SceneFile = load_json_file(input_path)?;

    let config = if let Some(cfg_path) = config_path {
        load_json_file::<HomographyConfig>(cfg_path)?
    } else {
        HomographyConfig::default()
    };

    let background = match image_path {
        Some(path) => Some(
            image::open(path)
                .with_context(|| format!("failed to open image {}", path.display()))?
                .to_rgb8(),
        ),
        None => None,
    };
    let size = resolve_image_size(scene.image_size, background.as_ref())?;
    let input = scene.into_input(size);
    info!(
        "estimating road-plane homography for a {}x{} image ({} samples, lane width {} m)",
        size.width, size.height, config.samples, config.lane_width
    );

    let mut overlay = diagnostics_dir.map(|_| match background {
        Some(img) => ImageOverlay::new(img),
        None => ImageOverlay::blank(size),
    });
    let mut no_diagnostics = NoDiagnostics;
    let sink: &mut dyn DiagnosticSink = match overlay.as_mut() {
        Some(overlay) => overlay,
        None => &mut no_diagnostics,
    };

    let result = estimate_planar_homography(&input, &config, sink);

    // Overlays are written even when a later stage failed.
    if let (Some(dir), Some(overlay)) = (diagnostics_dir, overlay.as_ref()) {
        for path in overlay.save(dir)? {
            info!("wrote {}", path.display());
        }
    }

    let solution = result.context("road-plane homography estimation failed")?;
    info!("homography:\n{}", solution.homography);
    write_report_json(&solution.report())
}

fn main() {
    env_logger::init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let json = run_from_files(
        &args.input,
        args.config.as_deref(),
        args.image.as_deref(),
        args.diagnostics.as_deref(),
    )?;
    println!("{}", json);
    Ok(())
}
