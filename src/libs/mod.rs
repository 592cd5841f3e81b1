// Library modules behind the `driver-installer` commands and HTTP routes.

pub mod config_loading;
pub mod driver_installer;
pub mod errors;
pub mod install_lock;
pub mod mirrors;
pub mod paths;
pub mod progress;
pub mod utilities;
pub mod version_probe;
