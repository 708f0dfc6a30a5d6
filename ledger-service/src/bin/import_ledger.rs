use anyhow::{bail, Result};
use ledger_client::db::SqliteLedgerStore;
use ledger_service::{config::AppConfig, observability, ImportKind, Importer};
use std::{env, path::Path};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: import_ledger <buildings|units|usage> <csv_file_path>");
    }
    let kind: ImportKind = args[1].parse().map_err(anyhow::Error::msg)?;
    let file_path = Path::new(&args[2]);

    // Only [database] is used; LEDGER_CONFIG can point at an operator file.
    let cfg = AppConfig::load()?;
    let store = SqliteLedgerStore::connect(&cfg.database.uri, cfg.database.max_connections).await?;

    let rows = Importer::new(&store).import_file(kind, file_path).await?;
    tracing::info!(%kind, rows, "import finished");

    Ok(())
}
