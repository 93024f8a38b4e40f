//! Small helpers shared by the modules.

use std::path::Path;

/// Joins `name` to the directory `dir_path`.
///
/// Non UTF-8 components are replaced lossily, the data directory comes from
/// the command line so it is valid UTF-8 in practice.
pub fn get_path(dir_path: &str, name: &str) -> String {
    Path::new(dir_path).join(name).to_string_lossy().into_owned()
}
