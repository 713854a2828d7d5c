//! Files compiled into the binary: the kubelet unit and containerd's
//! kernel module list.

use anyhow::Result;
use include_dir::{Dir, include_dir};

use crate::domain::{Asset, Source};

static EMBEDDED_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// Return the raw bytes of a single embedded asset without extracting to disk.
///
/// # Errors
///
/// Returns an error if no asset with the given `name` exists.
pub fn get_asset(name: &str) -> Result<&'static [u8]> {
    EMBEDDED_ASSETS
        .get_file(name)
        .map(|f| f.contents())
        .ok_or_else(|| anyhow::anyhow!("embedded asset not found: {name}"))
}

/// Open `asset` as a source. Embedded files carry no checksum; they cannot
/// be tampered with in transit.
///
/// # Errors
///
/// Returns an error if the asset was not compiled in.
pub fn asset_source(asset: Asset) -> Result<Source> {
    let bytes = get_asset(asset.file_name())?;
    Ok(Source::new(asset.owner(), bytes, None))
}
