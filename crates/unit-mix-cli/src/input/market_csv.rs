use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use unit_mix_core::unit_mix::model::MarketObservation;

/// Explicit mapping from CSV column names to market-observation fields.
///
/// The column names must match the header exactly; there is deliberately no
/// fuzzy or contains-style matching here. Anyone loading a differently
/// shaped market summary supplies their own map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMap {
    pub studio_rent: String,
    pub one_bedroom_rent: String,
    pub vacancy_rate: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            studio_rent: "avg_studio_rent".into(),
            one_bedroom_rent: "avg_one_bedroom_rent".into(),
            vacancy_rate: "avg_vacancy_rate".into(),
        }
    }
}

/// Read one market observation from the first data row of a CSV file.
pub fn read_market(
    path: &str,
    map: &ColumnMap,
) -> Result<MarketObservation, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| format!("Failed to open market CSV '{}': {}", path, e))?;

    let headers = reader.headers()?.clone();
    let studio_idx = column_index(&headers, &map.studio_rent)?;
    let one_bedroom_idx = column_index(&headers, &map.one_bedroom_rent)?;
    let vacancy_idx = column_index(&headers, &map.vacancy_rate)?;

    let record = reader
        .records()
        .next()
        .ok_or_else(|| format!("Market CSV '{}' has no data rows", path))??;

    Ok(MarketObservation {
        studio_rent: parse_decimal(&record, studio_idx, &map.studio_rent)?,
        one_bedroom_rent: parse_decimal(&record, one_bedroom_idx, &map.one_bedroom_rent)?,
        vacancy_rate: parse_decimal(&record, vacancy_idx, &map.vacancy_rate)?,
    })
}

fn column_index(
    headers: &csv::StringRecord,
    name: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| format!("Market CSV has no column named '{}'", name).into())
}

fn parse_decimal(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
) -> Result<Decimal, Box<dyn std::error::Error>> {
    let raw = record
        .get(idx)
        .ok_or_else(|| format!("Row is missing a value for column '{}'", column))?
        .trim();

    Decimal::from_str(raw)
        .map_err(|e| format!("Column '{}' holds non-numeric value '{}': {}", column, raw, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_market_with_default_map() {
        let path = write_temp(
            "umx_market_default.csv",
            "city,avg_studio_rent,avg_one_bedroom_rent,avg_vacancy_rate\n\
             New Hope,1700,2000,0.10\n",
        );

        let market = read_market(path.to_str().unwrap(), &ColumnMap::default()).unwrap();
        assert_eq!(market.studio_rent, Decimal::from(1700));
        assert_eq!(market.one_bedroom_rent, Decimal::from(2000));
        assert_eq!(market.vacancy_rate, Decimal::from_str("0.10").unwrap());
    }

    #[test]
    fn test_read_market_with_custom_map() {
        let path = write_temp(
            "umx_market_custom.csv",
            "Market,Studio Rent,1BR Rent,Vacancy\nNew Hope,1650,1950,0.08\n",
        );

        let map = ColumnMap {
            studio_rent: "Studio Rent".into(),
            one_bedroom_rent: "1BR Rent".into(),
            vacancy_rate: "Vacancy".into(),
        };
        let market = read_market(path.to_str().unwrap(), &map).unwrap();
        assert_eq!(market.studio_rent, Decimal::from(1650));
    }

    #[test]
    fn test_missing_column_is_explicit_error() {
        let path = write_temp(
            "umx_market_missing.csv",
            "city,studio,one_bedroom\nNew Hope,1700,2000\n",
        );

        let err = read_market(path.to_str().unwrap(), &ColumnMap::default()).unwrap_err();
        assert!(err.to_string().contains("avg_studio_rent"));
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let path = write_temp(
            "umx_market_bad.csv",
            "avg_studio_rent,avg_one_bedroom_rent,avg_vacancy_rate\nn/a,2000,0.10\n",
        );

        let err = read_market(path.to_str().unwrap(), &ColumnMap::default()).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn test_empty_csv_rejected() {
        let path = write_temp(
            "umx_market_empty.csv",
            "avg_studio_rent,avg_one_bedroom_rent,avg_vacancy_rate\n",
        );

        let err = read_market(path.to_str().unwrap(), &ColumnMap::default()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }
}
