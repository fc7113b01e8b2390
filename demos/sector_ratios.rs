use bank_ratio_builder::utils::quarter_end;
use bank_ratio_builder::*;

fn bank_quarter(
    ticker: &str,
    bank_type: BankType,
    quarter: u8,
    total_assets: f64,
    loans: f64,
    deposits: f64,
    net_income: f64,
) -> FinancialPeriodRecord {
    FinancialPeriodRecord::new(
        EntityId::bank(ticker).unwrap(),
        2024,
        PeriodLength::new(quarter).unwrap(),
        quarter_end(2024, quarter),
    )
    .with_sector_type(Some(bank_type))
    .with_line_items(
        [
            ("BS.1", total_assets),
            ("BS.13", loans),
            ("BS.56", deposits),
            ("IS.22", net_income * f64::from(quarter)),
        ]
        .into_iter()
        .collect(),
    )
}

fn fmt_ratio(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:>8.2}%", v * 100.0))
        .unwrap_or_else(|| format!("{:>9}", "-"))
}

fn main() {
    println!("🏦 Sector Ratio Demo\n");
    println!("Two state-owned and two private banks over three quarters of 2024.");
    println!("Group rows sum member line items; their ratios are recomputed from the sums.\n");

    let mut records = Vec::new();
    for quarter in 1..=3u8 {
        let growth = 1.0 + 0.03 * f64::from(quarter);
        records.push(bank_quarter("VCB", BankType::Socb, quarter, 1.8e15 * growth, 1.3e15 * growth, 1.4e15 * growth, 8.0e12));
        records.push(bank_quarter("BID", BankType::Socb, quarter, 2.3e15 * growth, 1.8e15 * growth, 1.9e15 * growth, 6.0e12));
        records.push(bank_quarter("ACB", BankType::Private1, quarter, 7.2e14 * growth, 5.1e14 * growth, 5.0e14 * growth, 4.5e12));
        records.push(bank_quarter("TCB", BankType::Private1, quarter, 9.0e14 * growth, 5.8e14 * growth, 5.5e14 * growth, 6.5e12));
    }

    let tables = match BankRatioProcessor::process_records(records) {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            return;
        }
    };

    println!("{:<10} {:<6} {:>9} {:>9}", "Entity", "Period", "LDR", "ROAA");
    println!("{}", "-".repeat(37));
    for row in &tables.quarterly {
        println!(
            "{:<10} {:<6} {} {}",
            row.entity_id.label(),
            row.period_key().to_string(),
            fmt_ratio(row.ratio(RatioCode::Ca1)),
            fmt_ratio(row.ratio(RatioCode::Ca16)),
        );
    }

    let sector = EntityId::Group(GroupLabel::Sector);
    if let Some(q1) = tables.find(&sector, PeriodKey::new(2024, PeriodLength::new(1).unwrap())) {
        println!("\nℹ️  Null ratios for Sector 1Q24:");
        for (code, reason) in q1.null_ratios().into_iter().take(5) {
            println!("  {} ({}): {}", code, code.description(), reason);
        }
    }

    if let Some(dir) = std::env::args().nth(1) {
        match tables.write_dir(&dir) {
            Ok(()) => println!("\n✅ Wrote {} and {} to {}", QUARTERLY_FILE, YEARLY_FILE, dir),
            Err(e) => eprintln!("❌ Export failed: {}", e),
        }
    }
}
