use anyhow::{bail, Context, Result};
use ledger_client::{
    db::{LedgerStore, SqliteLedgerStore},
    domain::{BuildingId, Period, UnitId},
};
use ledger_service::{
    aggregation::AggregationEngine,
    alerts::AlertEvaluator,
    auth::{seed_users, Authenticator, DirectoryAuthenticator, Identity},
    billing::BillingCalculator,
    config::AppConfig,
    export::Exporter,
    observability,
    recorder::UsageRecorder,
    reports::Reports,
    ImportKind, Importer,
};
use std::{env, path::PathBuf};

const USAGE: &str = "usage: ledger-service [--period YYYY-MM] \
<overview|summary|units [building_id]|alerts|bill <unit_id>|simulate|export|chart|import <buildings|units|usage> <path>>";

#[derive(Debug, PartialEq)]
enum Command {
    Overview,
    Summary,
    Units(Option<BuildingId>),
    Alerts,
    Bill(UnitId),
    Simulate,
    Export,
    Chart,
    Import(ImportKind, PathBuf),
}

impl Command {
    fn requires_admin(&self) -> bool {
        matches!(self, Command::Simulate | Command::Export | Command::Import(..))
    }
}

/// Split `--period` out of the arguments and parse the rest as a command.
fn parse_args(args: &[String]) -> Result<(Command, Option<Period>)> {
    let mut period = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--period" {
            let value = iter.next().context("--period needs a value")?;
            period = Some(value.parse::<Period>()?);
        } else {
            rest.push(arg.as_str());
        }
    }

    let command = match rest.as_slice() {
        ["overview"] => Command::Overview,
        ["summary"] => Command::Summary,
        ["units"] => Command::Units(None),
        ["units", id] => Command::Units(Some(id.parse().context("building id must be an integer")?)),
        ["alerts"] => Command::Alerts,
        ["bill", id] => Command::Bill(id.parse().context("unit id must be an integer")?),
        ["simulate"] => Command::Simulate,
        ["export"] => Command::Export,
        ["chart"] => Command::Chart,
        ["import", kind, path] => Command::Import(kind.parse().map_err(anyhow::Error::msg)?, PathBuf::from(*path)),
        _ => bail!(USAGE),
    };
    Ok((command, period))
}

async fn login(store: &SqliteLedgerStore) -> Result<Identity> {
    let username = env::var("LEDGER_USER").context("LEDGER_USER is not set")?;
    let password = env::var("LEDGER_PASSWORD").context("LEDGER_PASSWORD is not set")?;
    let identity = DirectoryAuthenticator::new(store)
        .authenticate(&username, &password)
        .await?;
    tracing::info!(user = %identity.username, role = %identity.role, "signed in");
    Ok(identity)
}

async fn run(command: Command, period: Period, store: &SqliteLedgerStore, cfg: &AppConfig) -> Result<()> {
    let reports = Reports::new(store);

    match command {
        Command::Overview => {
            for row in reports.overview().await? {
                tracing::info!(
                    building_id = row.building.id,
                    name = %row.building.name,
                    rate_per_kwh = %row.building.rate_per_kwh,
                    units = row.unit_count,
                    "building"
                );
            }
        }
        Command::Summary => {
            let engine = AggregationEngine::new(store);
            for row in reports.monthly_summary(period).await? {
                let average = engine.average_per_unit_kwh(row.building.id, period).await?;
                tracing::info!(
                    %period,
                    name = %row.building.name,
                    total_kwh = %row.totals.total_kwh,
                    total_cost = %row.totals.total_cost,
                    average_kwh = %average,
                    "monthly totals"
                );
            }
        }
        Command::Units(building) => {
            let ids = match building {
                Some(id) => vec![id],
                None => store.buildings().await?.into_iter().map(|b| b.id).collect(),
            };
            for building_id in ids {
                for line in reports.unit_usage(building_id, period).await? {
                    tracing::info!(
                        %period,
                        building_id,
                        unit_id = line.unit_id,
                        unit_number = %line.unit_number,
                        kwh = %line.kwh,
                        threshold = %line.threshold,
                        exceeds = line.exceeds,
                        "unit usage"
                    );
                }
            }
        }
        Command::Alerts => {
            let alerts = AlertEvaluator::new(store).check_all_buildings(period).await?;
            for alert in &alerts {
                tracing::warn!(unit_id = alert.unit_id, %period, kwh = %alert.kwh, threshold = %alert.threshold, "over threshold");
            }
            let exported = Exporter::new(store, &cfg.export.out_dir).write_alerts(period, &alerts)?;
            tracing::info!(alerts = alerts.len(), path = %exported.path.display(), "alerts evaluated");
        }
        Command::Bill(unit_id) => {
            let bill = BillingCalculator::new(store).bill_for_month(unit_id, period).await?;
            tracing::info!(
                unit_id = bill.unit_id,
                period = %bill.period,
                kwh = %bill.kwh,
                rate = %bill.rate,
                cost = %bill.cost,
                "bill"
            );
        }
        Command::Simulate => match UsageRecorder::new(store).simulate_over_usage(period).await? {
            Some(over) => tracing::info!(
                unit_id = over.unit.id,
                unit_number = %over.unit.unit_number,
                kwh = %over.kwh,
                %period,
                "over-usage recorded"
            ),
            None => tracing::warn!("no unit has a threshold, nothing simulated"),
        },
        Command::Export => {
            let exporter = Exporter::new(store, &cfg.export.out_dir);
            exporter.buildings().await?;
            exporter.units().await?;
        }
        Command::Chart => {
            for bar in reports.usage_by_building(period).await? {
                tracing::info!(%period, name = %bar.building_name, total_kwh = %bar.total_kwh, "building usage");
            }
            Exporter::new(store, &cfg.export.out_dir).chart().await?;
        }
        Command::Import(kind, path) => {
            let rows = Importer::new(store).import_file(kind, &path).await?;
            tracing::info!(%kind, rows, "import finished");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, period_override) = parse_args(&args)?;

    let cfg = AppConfig::load()?;
    let period = match period_override {
        Some(p) => p,
        None => cfg.report.period()?,
    };

    let store = SqliteLedgerStore::connect(&cfg.database.uri, cfg.database.max_connections).await?;
    seed_users(&store, &cfg.users).await?;

    if let Some(dir) = &cfg.import.data_dir {
        Importer::new(&store).import_directory(dir).await;
    }

    let identity = login(&store).await?;
    if command.requires_admin() {
        identity.require_admin()?;
    }

    run(command, period, &store, &cfg).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn period_flag_can_appear_anywhere() {
        let (command, period) = parse_args(&args(&["bill", "7", "--period", "2025-10"])).unwrap();
        assert_eq!(command, Command::Bill(7));
        assert_eq!(period, Some(Period::new(2025, 10).unwrap()));

        let (command, period) = parse_args(&args(&["--period", "2024-01", "units"])).unwrap();
        assert_eq!(command, Command::Units(None));
        assert_eq!(period, Some(Period::new(2024, 1).unwrap()));
    }

    #[test]
    fn admin_commands_are_flagged() {
        let (import, _) = parse_args(&args(&["import", "usage", "Usage.csv"])).unwrap();
        assert!(import.requires_admin());
        let (chart, _) = parse_args(&args(&["chart"])).unwrap();
        assert!(!chart.requires_admin());
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(parse_args(&args(&["bill", "seven"])).is_err());
        assert!(parse_args(&args(&["--period", "2025-13", "summary"])).is_err());
        assert!(parse_args(&args(&["refund"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }
}
