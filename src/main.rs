use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use plotters::prelude::*;
use ray_analytics::{
    new_bundle, Aperture, Medium, OpticalSystem, Pattern, RayBundle, Shape, Surface,
};
use skyangle::SkyAngle;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SamplingPattern {
    Fan,
    Hexapolar,
    Grid,
    Random,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Trace a ray bundle through a plano-convex BK7 singlet and report the spot
/// statistics at the paraxial focus
#[derive(Parser)]
#[command(name = "ray-analytics")]
struct Args {
    /// Pupil sampling pattern
    #[arg(long, value_enum, default_value = "fan")]
    pattern: SamplingPattern,
    /// Number of rays (fan, grid side, random) or rings (hexapolar)
    #[arg(short, long, default_value = "21")]
    n_rays: usize,
    /// Seed of the random pupil sampling
    #[arg(long, default_value = "1")]
    seed: u64,
    /// Wavelengths [nm]
    #[arg(short, long = "wavelength", default_values_t = vec![550f64])]
    wavelengths: Vec<f64>,
    /// Field angle [arcmin]
    #[arg(short, long, default_value = "0")]
    field: f64,
    /// Override of the image plane distance from the lens back vertex [m]
    #[arg(long)]
    image_distance: Option<f64>,
    /// Ray layout drawing
    #[arg(long, default_value = "layout.svg")]
    layout: String,
    /// Spot diagram drawing
    #[arg(long, default_value = "spot.svg")]
    spot: String,
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

// Plano-convex BK7 singlet prescription
const ROC: f64 = 0.05;
const THICKNESS: f64 = 0.005;
const SEMI_DIAMETER: f64 = 0.0125;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.clone().into())
        .init();

    let n_glass = Medium::bk7().index_at(args.wavelengths[0] * 1e-9);
    // thin lens focal length and back focal distance of the singlet
    let efl = ROC / (n_glass - 1f64);
    let bfd = args.image_distance.unwrap_or(efl - THICKNESS / n_glass);
    info!("EFL: {:.3}mm ; BFD: {:.3}mm", efl * 1e3, bfd * 1e3);

    let system = OpticalSystem::builder()
        .refract(
            Surface::new(Shape::Sphere { roc: ROC }, [0f64; 3])
                .apertured(Aperture::circular(SEMI_DIAMETER)),
            Medium::bk7(),
        )
        .refract(
            Surface::new(Shape::Plane, [0., 0., THICKNESS])
                .apertured(Aperture::circular(SEMI_DIAMETER)),
            Medium::air(),
        )
        .screen(Surface::new(Shape::Plane, [0., 0., THICKNESS + bfd]))
        .build()
        .context("assembling the plano-convex singlet")?;

    let pattern = match args.pattern {
        SamplingPattern::Fan => Pattern::Fan { n: args.n_rays },
        SamplingPattern::Hexapolar => Pattern::Hexapolar { rings: args.n_rays },
        SamplingPattern::Grid => Pattern::Grid { n: args.n_rays },
        SamplingPattern::Random => Pattern::RandomDisk {
            n: args.n_rays,
            seed: args.seed,
        },
    };
    let mut bundle = new_bundle()
        .pattern(pattern)
        .radius(0.8 * SEMI_DIAMETER)
        .launch_plane(-2e-2)
        .field(
            SkyAngle::Arcminute(args.field).to_radians(),
            std::f64::consts::FRAC_PI_2,
        )
        .wavelengths(args.wavelengths.iter().map(|w| w * 1e-9).collect())
        .build()
        .context("generating the ray bundle")?;
    bundle.trace(&system);

    let spot = bundle.spot().expect("bundle is traced");
    info!(
        "spot: {} rays traced, {} vignetted, {} escaped",
        spot.traced, spot.vignetted, spot.escaped
    );
    info!(
        "centroid: [{:+.3e},{:+.3e},{:+.3e}]m ; RMS radius: {:.3e}m",
        spot.centroid[0], spot.centroid[1], spot.centroid[2], spot.rms_radius
    );
    if let Some(focus) = bundle.best_focus() {
        info!(
            "best focus: [{:+.3e},{:+.3e},{:+.6}]m",
            focus[0], focus[1], focus[2]
        );
    }

    draw_layout(&args.layout, &system, &bundle).context("drawing the ray layout")?;
    draw_spot(&args.spot, &bundle).context("drawing the spot diagram")?;
    Ok(())
}

/// Meridional y-z layout: surface profiles from the sag and the traced ray
/// polylines
fn draw_layout(
    path: &str,
    system: &OpticalSystem,
    bundle: &RayBundle,
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path, (1024, 512)).into_drawing_area();
    root.fill(&WHITE)?;
    let z_max = system
        .elements()
        .iter()
        .map(|e| e.surface.frame.origin[2])
        .fold(0f64, f64::max);
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(-2.5e-2..z_max * 1.05, -1.5 * SEMI_DIAMETER..1.5 * SEMI_DIAMETER)?;
    chart
        .configure_mesh()
        .x_desc("z [m]")
        .y_desc("y [m]")
        .draw()?;
    for element in system.elements() {
        let half = element
            .surface
            .aperture
            .map_or(SEMI_DIAMETER, |ap| ap.semi_diameter());
        let z0 = element.surface.frame.origin[2];
        let shape = element.surface.shape;
        chart.draw_series(LineSeries::new(
            (0..=100).map(|k| {
                let y = half * (2f64 * k as f64 / 100f64 - 1f64);
                (z0 + shape.height_at(0f64, y), y)
            }),
            &BLACK,
        ))?;
    }
    if let Some(paths) = &bundle.paths {
        for traced in paths {
            chart.draw_series(LineSeries::new(
                traced.points().into_iter().map(|p| (p[2], p[1])),
                &BLUE.mix(0.5),
            ))?;
        }
    }
    root.present()?;
    Ok(())
}

/// Terminal points scatter at the image surface
fn draw_spot(path: &str, bundle: &RayBundle) -> anyhow::Result<()> {
    let spot = bundle.spot().expect("bundle is traced");
    let paths = bundle.paths.as_deref().expect("bundle is traced");
    let radius = (3f64 * spot.rms_radius).max(1e-7);
    let root = SVGBackend::new(path, (512, 512)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(
            spot.centroid[0] - radius..spot.centroid[0] + radius,
            spot.centroid[1] - radius..spot.centroid[1] + radius,
        )?;
    chart
        .configure_mesh()
        .x_desc("x [m]")
        .y_desc("y [m]")
        .draw()?;
    chart.draw_series(paths.iter().filter_map(|traced| {
        traced
            .terminal()
            .map(|r| Circle::new((r.point[0], r.point[1]), 2, RED.filled()))
    }))?;
    root.present()?;
    Ok(())
}
