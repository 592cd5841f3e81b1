// Our custom logging macros.
use crate::{log_debug, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::env;
use std::path::PathBuf;

/// Resolves paths that start with a tilde `~` into the user's home directory.
///
/// # Arguments
/// * `path`: A string slice (`&str`) representing the path, which might start with `~`.
///
/// # Returns
/// * `PathBuf`: The expanded path, or the input unchanged when it has no
///   leading `~` or the home directory cannot be determined.
pub fn expand_tilde(path: &str) -> PathBuf {
    // `tilde_with_context` lets us resolve the home directory through `dirs`,
    // matching how the rest of the application locates it.
    let expanded = shellexpand::tilde_with_context(path, || {
        dirs::home_dir().map(|home| home.to_string_lossy().into_owned())
    });
    PathBuf::from(expanded.as_ref())
}

/// Returns the directory that holds the application's own files, typically `~/.browserautomate`.
///
/// Falls back to `.browserautomate` under the current directory when the
/// home directory cannot be determined.
pub fn get_app_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        let app_dir = home_dir.join(".browserautomate");
        log_debug!("[Utils] App directory resolved to: {}", app_dir.display().to_string().cyan());
        app_dir
    } else {
        let fallback_dir = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".browserautomate");
        log_warn!(
            "[Utils] Could not determine home directory. Using {}",
            fallback_dir.display().to_string().yellow()
        );
        fallback_dir
    }
}
