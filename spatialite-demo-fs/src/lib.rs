//! Filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Sidecar extensions that make up an ESRI shapefile, in the order they are
/// checked.
pub const SHAPEFILE_EXTENSIONS: [&str; 3] = ["shp", "shx", "dbf"];

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Path of one shapefile component: `base` with `.extension` appended.
///
/// The extension is appended rather than substituted, so dots already in the
/// base name survive.
#[must_use]
pub fn shapefile_component(base: &Utf8Path, extension: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{base}.{extension}"))
}

/// Components of the shapefile at `base` that are absent or not regular
/// files.
///
/// A missing parent directory counts as every component missing.
///
/// # Errors
/// Returns any IO error other than "not found" raised while probing.
pub fn missing_shapefile_components(base: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    let mut missing = Vec::new();
    for extension in SHAPEFILE_EXTENSIONS {
        let path = shapefile_component(base, extension);
        match file_is_file(&path) {
            Ok(true) => {}
            Ok(false) => missing.push(path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => missing.push(path),
            Err(err) => return Err(err),
        }
    }
    Ok(missing)
}
