
use std::path::Path;

use crate::{sst_filename, SstError, SstReader, SstWriter};

/// Helper: write `entries` as the SSTable with the given ordinal and open a
/// reader for it. `None` values are tombstones.
pub(crate) fn write_and_open(
    dir: &Path,
    ordinal: u64,
    entries: &[(&str, Option<&str>)],
) -> Result<SstReader, SstError> {
    let path = dir.join(sst_filename(ordinal));
    SstWriter::write(
        &path,
        entries
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.map(str::to_owned))),
    )?;
    SstReader::open(&path)
}
