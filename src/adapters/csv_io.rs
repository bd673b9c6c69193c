use crate::core::report::header;
use crate::domain::model::OutputRow;
use crate::domain::ports::{RowSink, RowSource};
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Reads IPs from a CSV with a header row, taking the named column.
pub struct CsvRowSource<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    ip_index: usize,
    ip_column: String,
}

impl CsvRowSource<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, ip_column: &str) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, ip_column)
    }
}

impl<R: Read> CsvRowSource<R> {
    /// 標頭缺少 IP 欄位時整批失敗，因為不可能有任何有效的列
    pub fn from_reader(reader: R, ip_column: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let ip_index = headers
            .iter()
            .position(|h| h == ip_column)
            .ok_or_else(|| EtlError::ValidationError {
                message: format!(
                    "Input header has no '{}' column (found: {})",
                    ip_column,
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            })?;

        Ok(Self {
            records: reader.into_records(),
            ip_index,
            ip_column: ip_column.to_string(),
        })
    }
}

impl<R: Read> RowSource for CsvRowSource<R> {
    fn next_ip(&mut self) -> Option<Result<String>> {
        let record = match self.records.next()? {
            Ok(record) => record,
            // 只有 I/O 錯誤會中止整批，其餘解析錯誤只影響該列
            Err(e) if e.is_io_error() => return Some(Err(e.into())),
            Err(e) => {
                return Some(Err(EtlError::MalformedRow {
                    line: e.position().map(|p| p.line()).unwrap_or(0),
                    reason: e.to_string(),
                }))
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let ip = record.get(self.ip_index).unwrap_or("");

        if ip.is_empty() {
            return Some(Err(EtlError::MalformedRow {
                line,
                reason: format!("missing '{}' field", self.ip_column),
            }));
        }

        Some(Ok(ip.to_string()))
    }
}

/// Writes report rows as CSV. The header goes out once, before the first row
/// or at `finish` when the batch was empty.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl CsvRowSink<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> CsvRowSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| EtlError::IoError(e.into_error()))
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(header())?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> RowSink for CsvRowSink<W> {
    fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        self.ensure_header()?;
        self.writer.write_record(row.to_fields())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.ensure_header()?;
        self.writer.flush()?;
        Ok(())
    }
}
