use std::{
    fs::File,
    io::{Cursor, Read},
    marker::PhantomData,
    ops::RangeInclusive,
    path::PathBuf,
};

use csv::StringRecord;

use crate::pipeline::{Envelope, ImportError, RowStream, Source};

/// A row type that can be read from one comma-delimited record.
pub trait CsvRow: Sized + Send + 'static {
    /// Accepted field counts per record.
    const COLUMNS: RangeInclusive<usize>;

    /// Parse an already length-checked, trimmed record.
    fn from_record(record: &StringRecord) -> Result<Self, String>;
}

#[derive(Debug, Clone)]
enum CsvInput {
    Path(PathBuf),
    Text(String),
}

/// Comma-delimited source. The first line is a header and is skipped
/// without being inspected; empty and whitespace-only lines are ignored.
pub struct CsvSource<T> {
    input: CsvInput,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CsvSource<T> {
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            input: CsvInput::Path(path.into()),
            _marker: PhantomData,
        }
    }

    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self {
            input: CsvInput::Text(text.into()),
            _marker: PhantomData,
        }
    }
}

fn open(input: &CsvInput) -> Result<Box<dyn Read + Send>, ImportError> {
    match input {
        CsvInput::Path(path) => {
            let file = File::open(path).map_err(|e| {
                ImportError::Source(format!("failed to open CSV file {}: {e}", path.display()))
            })?;
            Ok(Box::new(file))
        }
        CsvInput::Text(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
    }
}

fn describe(columns: &RangeInclusive<usize>) -> String {
    if columns.start() == columns.end() {
        columns.start().to_string()
    } else {
        format!("{} to {}", columns.start(), columns.end())
    }
}

/// A whitespace-only line trims down to a single empty field.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(str::is_empty)
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

#[async_trait::async_trait]
impl<T: CsvRow> Source<T> for CsvSource<T> {
    async fn stream(&self) -> RowStream<T> {
        // Blocking reads inside the stream; inputs are small operator files.
        let input = self.input.clone();
        let s = async_stream::try_stream! {
            let reader = open(&input)?;
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(reader);

            for result in rdr.records() {
                let record = result.map_err(|e| ImportError::Source(format!(
                    "failed to read CSV record: {e}"
                )))?;
                if is_blank(&record) {
                    continue;
                }
                let line = record_line(&record);

                let payload = if T::COLUMNS.contains(&record.len()) {
                    T::from_record(&record).map_err(|reason| ImportError::Row { line, reason })
                } else {
                    Err(ImportError::Row {
                        line,
                        reason: format!(
                            "expected {} columns, found {}",
                            describe(&T::COLUMNS),
                            record.len()
                        ),
                    })
                }?;

                yield Envelope { payload, line };
            }
        };

        Box::pin(s)
    }
}
