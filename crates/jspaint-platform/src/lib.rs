pub mod crash_report;
pub mod file_association;
pub mod instance;
pub mod paths;
pub mod wallpaper;

pub use instance::{Acquired, InstanceCoordinator, PrimaryInstance};
pub use paths::{config_dir, crash_report_dir, data_dir, ensure_dirs, runtime_dir};
pub use wallpaper::{WallpaperError, WallpaperFailure, WallpaperSetter, WallpaperStrategy};
