//! Dataset → delimited text.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use proreporter_core::dataset::Dataset;

use crate::error::{Error, Result};

/// Render `dataset` with `delimiter`, CRLF line endings, quoting only the
/// fields that need it.
pub(crate) fn to_csv(dataset: &Dataset, delimiter: u8) -> Result<String> {
  let mut writer = WriterBuilder::new()
    .delimiter(delimiter)
    .terminator(Terminator::CRLF)
    .quote_style(QuoteStyle::Necessary)
    .from_writer(Vec::new());

  writer.write_record(&dataset.columns)?;
  for row in &dataset.rows {
    writer.write_record(
      dataset
        .columns
        .iter()
        .map(|c| row.get(c).map(ToString::to_string).unwrap_or_default()),
    )?;
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| Error::Malformed(e.into_error().into()))?;
  String::from_utf8(bytes).map_err(|_| Error::NotUtf8)
}
