use std::{marker::PhantomData, pin::Pin};

use futures::{Stream, StreamExt};
use ledger_client::LedgerError;

/// A parsed row and the input line it came from.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub line: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("source error: {0}")]
    Source(String),
    #[error("line {line}: {reason}")]
    Row { line: u64, reason: String },
    #[error("line {line}: {source}")]
    Ledger {
        line: u64,
        #[source]
        source: LedgerError,
    },
}

/// An import that stopped on its first bad row. Rows before it stay
/// applied; `processed` says how many.
#[derive(thiserror::Error, Debug)]
#[error("import stopped after {processed} row(s): {cause}")]
pub struct ImportFailure {
    pub processed: usize,
    #[source]
    pub cause: ImportError,
}

pub type RowStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, ImportError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> RowStream<T>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn write(&self, row: Envelope<T>) -> Result<(), ImportError>;
}

pub struct Pipeline<S, T, K> {
    pub name: &'static str,
    pub source: S,
    pub sink: K,
    _row: PhantomData<fn() -> T>,
}

impl<S, T, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T>,
    K: Sink<T>,
{
    pub fn new(name: &'static str, source: S, sink: K) -> Self {
        Self {
            name,
            source,
            sink,
            _row: PhantomData,
        }
    }

    /// Feed every row to the sink in order, stopping at the first error.
    /// Returns the number of rows applied.
    pub async fn run(self) -> Result<usize, ImportFailure> {
        let mut stream = self.source.stream().await;
        let mut processed = 0usize;

        while let Some(item) = stream.next().await {
            let outcome = match item {
                Ok(row) => self.sink.write(row).await,
                Err(e) => Err(e),
            };

            if let Err(cause) = outcome {
                metrics::counter!("ledger_import_failures_total").increment(1);
                tracing::error!(pipeline = self.name, processed, error = %cause, "import failed");
                return Err(ImportFailure { processed, cause });
            }

            processed += 1;
            metrics::counter!("ledger_import_rows_total").increment(1);
        }

        tracing::info!(pipeline = self.name, rows = processed, "import complete");
        Ok(processed)
    }
}
