use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use cgview::logging::init_logging;
use cgview::{Feature, Variant, ViewerConfig};

/// Keyboard and mouse driven viewer for OBJ and STL models.
///
/// Keys: W/A/S/D move (Shift+W/S also moves vertically), X/Y/Z rotate (Shift
/// reverses), M/N scale, Escape quits. The pinwheel variant spins on its own:
/// Space pauses, E/Q change the speed.
#[derive(Parser, Debug)]
#[command(name = "cgview", version, about)]
struct Cli {
    /// Model file to load (.obj or .stl)
    model: Option<PathBuf>,

    /// Which viewer preset to run
    #[arg(long, value_enum, default_value_t = Variant::Model)]
    variant: Variant,

    /// Ignore material textures and draw with material colours only
    #[arg(long)]
    no_textures: bool,

    /// Initial window width
    #[arg(long, default_value_t = 500)]
    width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 500)]
    height: u32,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 15.0)]
    frustum_angle: f32,

    /// Distance of the camera from the origin
    #[arg(long, default_value_t = 1.0)]
    camera_distance: f32,

    /// Near clip plane
    #[arg(long, default_value_t = 0.001)]
    near: f32,

    /// Far clip plane
    #[arg(long, default_value_t = 50.0)]
    far: f32,

    /// Log filter in env_logger syntax (e.g. "cgview=debug"); overrides RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

impl Cli {
    fn config(&self) -> ViewerConfig {
        let mut features = self.variant.features();
        if self.no_textures {
            features.remove(Feature::TextureMapping);
        }

        ViewerConfig::new()
            .size(self.width, self.height)
            .features(features)
            .clip_planes(self.near, self.far)
            .frustum_angle(self.frustum_angle)
            .camera_distance(self.camera_distance)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(-1);
        }
    };

    init_logging(cli.log.as_deref());

    match cgview::run(cli.config(), cli.model) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_model_variant() {
        let cli = Cli::try_parse_from(["cgview", "teapot.obj"]).unwrap();
        assert_eq!(cli.model, Some(PathBuf::from("teapot.obj")));
        let config = cli.config();
        assert_eq!((config.width, config.height), (500, 500));
        assert_eq!(config.features, Variant::Model.features());
        assert_eq!(config.frustum_angle, 15.0);
    }

    #[test]
    fn no_textures_drops_texture_mapping() {
        let cli = Cli::try_parse_from(["cgview", "--variant", "free-look", "--no-textures", "m.obj"])
            .unwrap();
        let features = cli.config().features;
        assert!(features.contains(Feature::FreeCamera));
        assert!(!features.contains(Feature::TextureMapping));
    }

    #[test]
    fn log_filter_is_optional() {
        let cli = Cli::try_parse_from(["cgview", "m.obj"]).unwrap();
        assert_eq!(cli.log, None);
        let cli = Cli::try_parse_from(["cgview", "--log", "cgview=debug", "m.obj"]).unwrap();
        assert_eq!(cli.log.as_deref(), Some("cgview=debug"));
    }

    #[test]
    fn unknown_variant_is_rejected() {
        assert!(Cli::try_parse_from(["cgview", "--variant", "teapot"]).is_err());
    }
}
