use crate::core::engine::EngineError;
use librqbit::{torrent_from_bytes, ByteBufOwned};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DESCRIPTOR_EXT: &str = "torrent";
const PIECE_HASH_LEN: u64 = 20;

/// Newest `*.torrent` across `dirs`, by creation time where the filesystem
/// records it and modification time otherwise.
pub fn discover_descriptor(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .filter_map(|dir| fs::read_dir(dir).ok())
        .flatten()
        .filter_map(|entry| entry.ok())
        .filter(|entry| is_descriptor(&entry.path()))
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            let stamp = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some((stamp, entry.path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}

fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(DESCRIPTOR_EXT))
        .unwrap_or(false)
}

/// Parses the metainfo with the engine's own decoder and checks the piece
/// layout, so anything the engine would refuse is reported as invalid here.
pub fn validate_descriptor(bytes: &[u8]) -> Result<(), EngineError> {
    let invalid = EngineError::InvalidSource;

    let meta = torrent_from_bytes::<ByteBufOwned>(bytes).map_err(|e| invalid(format!("{e:#}")))?;
    let info = &meta.info;

    let total: u64 = info
        .iter_file_lengths()
        .map_err(|e| invalid(format!("{e:#}")))?
        .sum();
    if total == 0 {
        return Err(invalid("torrent has no data".to_string()));
    }
    if info.piece_length == 0 {
        return Err(invalid("piece length is zero".to_string()));
    }

    let pieces = total.div_ceil(info.piece_length as u64);
    if info.pieces.0.len() as u64 != pieces * PIECE_HASH_LEN {
        return Err(invalid(format!(
            "expected {pieces} piece hashes, found {} bytes",
            info.pieces.0.len()
        )));
    }
    Ok(())
}
