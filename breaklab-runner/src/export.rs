//! CSV export of sweep tables and trade ledgers.
//!
//! Headers are stable lowercase_snake. The sweep table carries one column
//! per parameter plus the union of metric keys seen across successful rows,
//! so every row serializes the same width.

use crate::sweep::SweepResults;
use breaklab_core::domain::{OrderSide, TradeLedgerEntry};
use std::collections::BTreeSet;
use std::io::Write;

/// Write the ranked sweep table: fingerprint, parameters, objective,
/// success, error, then metric columns.
pub fn write_sweep_csv<W: Write>(writer: W, results: &SweepResults) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut param_names: BTreeSet<String> = BTreeSet::new();
    let mut metric_names: BTreeSet<String> = BTreeSet::new();
    for outcome in results.all() {
        param_names.extend(outcome.parameters.keys().cloned());
        metric_names.extend(outcome.metrics.keys().cloned());
    }

    let mut header: Vec<String> = vec!["fingerprint".into()];
    header.extend(param_names.iter().cloned());
    header.push("objective".into());
    header.push("success".into());
    header.push("error".into());
    header.extend(metric_names.iter().cloned());
    csv_writer.write_record(&header)?;

    for outcome in results.ranked() {
        let mut record: Vec<String> = vec![outcome.fingerprint.clone()];
        for name in &param_names {
            record.push(
                outcome
                    .parameters
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        record.push(outcome.objective.to_string());
        record.push(outcome.success.to_string());
        record.push(outcome.error.clone().unwrap_or_default());
        for name in &metric_names {
            record.push(
                outcome
                    .metrics
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        csv_writer.write_record(&record)?;
    }

    // Failed rows after the ranked successes, for completeness.
    for outcome in results.failures() {
        let mut record: Vec<String> = vec![outcome.fingerprint.clone()];
        for name in &param_names {
            record.push(
                outcome
                    .parameters
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        record.push(outcome.objective.to_string());
        record.push(outcome.success.to_string());
        record.push(outcome.error.clone().unwrap_or_default());
        for _ in &metric_names {
            record.push(String::new());
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write a run's trade ledger.
pub fn write_trades_csv<W: Write>(
    writer: W,
    trades: &[TradeLedgerEntry],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "timestamp",
        "symbol",
        "side",
        "quantity",
        "price",
        "notional",
        "realized_pnl",
    ])?;

    for trade in trades {
        let side = match trade.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };
        csv_writer.write_record([
            trade.timestamp.to_rfc3339(),
            trade.symbol.clone(),
            side.to_string(),
            trade.quantity.to_string(),
            trade.price.to_string(),
            trade.notional.to_string(),
            trade.realized_pnl.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Objective;
    use crate::space::ParameterSpace;
    use crate::sweep::SweepRunner;
    use breaklab_core::error::EngineError;
    use breaklab_core::metrics::MetricsSnapshot;
    use chrono::{TimeZone, Utc};

    #[test]
    fn sweep_csv_has_stable_header_and_ranked_rows() {
        let mut space = ParameterSpace::new();
        space.add("x", vec![1.0, 2.0]).unwrap();
        let runner = SweepRunner::new(Objective::Sharpe, |point| {
            let mut snap = MetricsSnapshot::new();
            snap.insert("sharpe".into(), point["x"]);
            snap.insert("total_return".into(), point["x"] / 10.0);
            Ok::<_, EngineError>(snap)
        });
        let results = runner.run_grid(&space).unwrap();

        let mut buffer = Vec::new();
        write_sweep_csv(&mut buffer, &results).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "fingerprint,x,objective,success,error,sharpe,total_return"
        );
        // Best (x = 2) first.
        let first = lines.next().unwrap();
        assert!(first.contains(",2,2,true,,2,0.2"));
    }

    #[test]
    fn trades_csv_round_trips_fields() {
        let trades = vec![TradeLedgerEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 3, 21, 0, 0).unwrap(),
            symbol: "SPY".into(),
            side: OrderSide::Sell,
            quantity: 100,
            price: 105.0,
            notional: 10_500.0,
            realized_pnl: 500.0,
        }];

        let mut buffer = Vec::new();
        write_trades_csv(&mut buffer, &trades).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with(
            "timestamp,symbol,side,quantity,price,notional,realized_pnl"
        ));
        assert!(text.contains("SPY,sell,100,105,10500,500"));
    }
}
