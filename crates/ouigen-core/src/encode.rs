//! Binary table encoding.
//!
//! The generated table is an 8-byte big-endian signed generation timestamp
//! (milliseconds since the epoch) followed by one record per parsed registry
//! entry: 3 prefix bytes, a 2-byte big-endian UTF-8 byte length, and the
//! organization name bytes. Records appear in input order and the table is
//! always a full replacement, never an incremental patch.

use std::io::{BufReader, ErrorKind, Read, Write};

use crate::{
    error::{ErrorContext, OuigenError, Result},
    parser::OuiRecord,
};

/// Writes the binary table for `records` to `out` and returns the number of
/// records written.
///
/// The generation timestamp is written unconditionally, so an empty record
/// sequence still produces a valid 8-byte table. Record errors (from the
/// lazy parser) and organization names longer than 65535 UTF-8 bytes abort
/// the encoding.
pub fn encode<W, I>(records: I, generated_at_millis: i64, out: &mut W) -> Result<u64>
where
    W: Write,
    I: IntoIterator<Item = Result<OuiRecord>>,
{
    out.write_all(&generated_at_millis.to_be_bytes())
        .with_context(|| "writing generation timestamp".to_string())?;

    let mut count = 0u64;
    for record in records {
        let record = record?;
        let name = record.organization.as_bytes();
        let len = u16::try_from(name.len()).map_err(|_| {
            OuigenError::Custom(format!(
                "organization name too long ({} bytes): {:.40}...",
                name.len(),
                record.organization
            ))
        })?;

        out.write_all(&record.prefix)
            .with_context(|| "writing record prefix".to_string())?;
        out.write_all(&len.to_be_bytes())
            .with_context(|| "writing record name length".to_string())?;
        out.write_all(name)
            .with_context(|| "writing record name".to_string())?;
        count += 1;
    }

    out.flush()
        .with_context(|| "flushing binary table".to_string())?;
    Ok(count)
}

/// Reads a binary table back into its generation timestamp and ordered
/// record list. This is the deserializer matching [`encode`]; consumers of
/// the generated file decode it the same way.
pub fn decode<R: Read>(input: R) -> Result<(i64, Vec<OuiRecord>)> {
    let mut reader = BufReader::new(input);

    let mut timestamp = [0u8; 8];
    reader
        .read_exact(&mut timestamp)
        .with_context(|| "reading generation timestamp".to_string())?;
    let generated_at = i64::from_be_bytes(timestamp);

    let mut records = Vec::new();
    loop {
        let mut prefix = [0u8; 3];
        match reader.read_exact(&mut prefix) {
            Ok(()) => {}
            // A clean end of stream falls exactly on a record boundary.
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err).with_context(|| "reading record prefix".to_string()),
        }

        let mut len = [0u8; 2];
        reader
            .read_exact(&mut len)
            .with_context(|| "reading record name length".to_string())?;

        let mut name = vec![0u8; u16::from_be_bytes(len) as usize];
        reader
            .read_exact(&mut name)
            .with_context(|| "reading record name".to_string())?;
        let organization = String::from_utf8(name)
            .map_err(|err| OuigenError::Custom(format!("invalid UTF-8 in record name: {err}")))?;

        records.push(OuiRecord {
            prefix,
            organization,
        });
    }

    Ok((generated_at, records))
}
