//! `date,price` CSV reader for ordered price series.

use chrono::NaiveDate;
use quant_finance_core::PricePoint;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

use super::file::resolve_path;

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    price: Decimal,
}

/// Read a headed `date,price` CSV file (ISO dates, oldest first).
pub fn read_price_csv(path: &str) -> Result<Vec<PricePoint>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let prices = parse_prices(file)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(prices)
}

fn parse_prices<R: Read>(reader: R) -> Result<Vec<PricePoint>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize::<PriceRow>()
        .map(|row| {
            row.map(|r| PricePoint {
                date: r.date,
                price: r.price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_headed_csv() {
        let data = "date,price\n2024-01-02, 100.5\n2024-01-03,99\n";
        let prices = parse_prices(data.as_bytes()).unwrap();
        assert_eq!(
            prices,
            vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    price: dec!(100.5),
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    price: dec!(99),
                },
            ]
        );
    }

    #[test]
    fn test_bad_date_rejected() {
        let data = "date,price\n02/01/2024,100\n";
        assert!(parse_prices(data.as_bytes()).is_err());
    }
}
