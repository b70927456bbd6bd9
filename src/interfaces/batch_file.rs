use crate::domain::envelope::BatchList;
use crate::error::Result;
use prost::Message;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes a serialized `BatchList`, the same bytes the client would POST.
pub fn write_batch_list(path: &Path, batch_list: &BatchList) -> Result<()> {
    let bytes = batch_list.encode_to_vec();
    debug!(path = %path.display(), bytes = bytes.len(), "writing batch list");
    fs::write(path, bytes)?;
    Ok(())
}

/// Reads a batch list file and checks that it decodes.
pub fn read_batch_list(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    BatchList::decode(bytes.as_slice())?;
    Ok(bytes)
}
