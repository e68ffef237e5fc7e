//! CSV ingest and normalization.
//!
//! Two inputs are read here:
//!
//! - **bulk import** files: one row per planting, optionally with one harvest
//!   (`crop_name, area, planting_date[, harvest_date, yield_amount]`)
//! - **history** files for ad-hoc estimation
//!   (`month` or `planting_date`, `area`, `yield_amount`)
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no estimation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{HistoricalRecord, NewCrop, NewHarvest, UserId};
use crate::error::{AppError, StoreError};
use crate::store::FarmRepository;

const NAME_COLUMNS: [&str; 3] = ["crop_name", "name", "crop"];
const YIELD_COLUMNS: [&str; 2] = ["yield_amount", "yield"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// One parsed import row: a planting plus an optional harvest of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub crop: NewCrop,
    pub harvest: Option<NewHarvest>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Outcome of writing an import into the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub crops_created: usize,
    pub harvests_created: usize,
    pub row_errors: Vec<RowError>,
}

impl ImportSummary {
    pub fn rows_skipped(&self) -> usize {
        self.row_errors.len()
    }
}

/// Read and parse a bulk import file.
pub fn read_import_csv(path: &Path) -> Result<ParsedImport, AppError> {
    let file = open_csv(path)?;
    parse_import(file)
}

pub fn parse_import<R: Read>(input: R) -> Result<ParsedImport, AppError> {
    let mut reader = csv_reader(input);
    let header_map = read_header_map(&mut reader)?;

    let name_col = first_present(&header_map, &NAME_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `crop_name` (or `name`)"))?;
    ensure_columns(&header_map, &["area", "planting_date"])?;
    let yield_col = first_present(&header_map, &YIELD_COLUMNS);
    let has_harvest_date = header_map.contains_key("harvest_date");
    if has_harvest_date != yield_col.is_some() {
        return Err(AppError::new(
            2,
            "Harvest columns must come together: `harvest_date` and `yield_amount`.",
        ));
    }

    let mut out = ParsedImport::default();

    for (idx, result) in reader.records().enumerate() {
        // +2: one header line, and CSV lines are 1-based.
        let line = idx + 2;
        out.rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_import_row(&record, &header_map, name_col, yield_col));

        match parsed {
            Ok((crop, harvest)) => out.rows.push(ImportRow {
                line,
                crop,
                harvest,
            }),
            Err(message) => {
                warn!(line, %message, "skipping import row");
                out.row_errors.push(RowError { line, message });
            }
        }
    }

    Ok(out)
}

fn parse_import_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    name_col: &str,
    yield_col: Option<&str>,
) -> Result<(NewCrop, Option<NewHarvest>), String> {
    let name = get_required(record, header_map, name_col)?.to_string();
    let area = parse_f64(get_required(record, header_map, "area")?, "area")?;
    let planting_date = parse_date(get_required(record, header_map, "planting_date")?)?;

    let harvest_date = get_optional(record, header_map, "harvest_date");
    let yield_amount = yield_col.and_then(|col| get_optional(record, header_map, col));

    let harvest = match (harvest_date, yield_amount) {
        (None, None) => None,
        (Some(d), Some(y)) => Some(NewHarvest {
            date: parse_date(d)?,
            yield_amount: parse_f64(y, "yield_amount")?,
        }),
        _ => return Err("`harvest_date` and `yield_amount` must both be set or both be empty.".to_string()),
    };

    Ok((
        NewCrop {
            name,
            area,
            planting_date,
        },
        harvest,
    ))
}

/// Write parsed rows into `repo` for `owner`.
///
/// Rows with the same crop name, area and planting date share one crop, so a
/// file can list several harvests of one planting. Validation failures become
/// row errors; any other store failure aborts the import.
pub fn apply_import<R: FarmRepository + ?Sized>(
    repo: &mut R,
    owner: UserId,
    parsed: ParsedImport,
) -> Result<ImportSummary, AppError> {
    let mut summary = ImportSummary {
        rows_read: parsed.rows_read,
        row_errors: parsed.row_errors,
        ..ImportSummary::default()
    };
    let mut crop_ids: HashMap<(String, u64, NaiveDate), u64> = HashMap::new();

    for row in parsed.rows {
        let key = (
            row.crop.name.trim().to_string(),
            row.crop.area.to_bits(),
            row.crop.planting_date,
        );

        // A bad harvest rejects the whole row before anything is written.
        let harvest = match row.harvest.map(NewHarvest::validated).transpose() {
            Ok(harvest) => harvest,
            Err(err) => {
                skip_row(&mut summary, row.line, err.to_string());
                continue;
            }
        };

        let crop_id = match crop_ids.get(&key) {
            Some(id) => *id,
            None => match repo.create_crop(owner, row.crop) {
                Ok(crop) => {
                    summary.crops_created += 1;
                    crop_ids.insert(key, crop.id);
                    crop.id
                }
                Err(err @ StoreError::Invalid { .. }) => {
                    skip_row(&mut summary, row.line, err.to_string());
                    continue;
                }
                Err(err) => return Err(err.into()),
            },
        };

        if let Some(harvest) = harvest {
            match repo.create_harvest(owner, crop_id, harvest) {
                Ok(_) => summary.harvests_created += 1,
                Err(err @ StoreError::Invalid { .. }) => {
                    skip_row(&mut summary, row.line, err.to_string());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    summary.row_errors.sort_by_key(|e| e.line);
    info!(
        owner,
        rows = summary.rows_read,
        crops = summary.crops_created,
        harvests = summary.harvests_created,
        skipped = summary.rows_skipped(),
        "import finished"
    );
    Ok(summary)
}

fn skip_row(summary: &mut ImportSummary, line: usize, message: String) {
    warn!(line, %message, "skipping import row");
    summary.row_errors.push(RowError { line, message });
}

/// Read a history file for ad-hoc estimation.
///
/// Each row needs `area`, `yield_amount` and either `month` (1-12) or a
/// `planting_date`. Unparseable rows are logged and skipped; range checks are
/// left to the estimator.
pub fn load_history_csv(path: &Path) -> Result<(Vec<HistoricalRecord>, Vec<RowError>), AppError> {
    let file = open_csv(path)?;
    parse_history(file)
}

pub fn parse_history<R: Read>(input: R) -> Result<(Vec<HistoricalRecord>, Vec<RowError>), AppError> {
    let mut reader = csv_reader(input);
    let header_map = read_header_map(&mut reader)?;

    ensure_columns(&header_map, &["area"])?;
    let yield_col = first_present(&header_map, &YIELD_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `yield_amount`"))?;
    if !header_map.contains_key("month") && !header_map.contains_key("planting_date") {
        return Err(AppError::new(
            2,
            "History CSV needs a `month` or `planting_date` column.",
        ));
    }

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_history_row(&record, &header_map, yield_col));

        match parsed {
            Ok(r) => records.push(r),
            Err(message) => {
                warn!(line, %message, "skipping history row");
                errors.push(RowError { line, message });
            }
        }
    }

    Ok((records, errors))
}

fn parse_history_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    yield_col: &str,
) -> Result<HistoricalRecord, String> {
    let month = match get_optional(record, header_map, "month") {
        Some(m) => m
            .parse::<u32>()
            .map_err(|_| format!("Invalid month '{m}'."))?,
        None => parse_date(get_required(record, header_map, "planting_date")?)?.month(),
    };

    Ok(HistoricalRecord {
        month,
        area: parse_f64(get_required(record, header_map, "area")?, "area")?,
        yield_amount: parse_f64(get_required(record, header_map, yield_col)?, "yield_amount")?,
    })
}

fn open_csv(path: &Path) -> Result<File, AppError> {
    File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn read_header_map<R: Read>(reader: &mut csv::Reader<R>) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    Ok(build_header_map(headers))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn first_present<'a>(header_map: &HashMap<String, usize>, names: &[&'a str]) -> Option<&'a str> {
    names.iter().copied().find(|n| header_map.contains_key(*n))
}

fn ensure_columns(header_map: &HashMap<String, usize>, names: &[&str]) -> Result<(), AppError> {
    for name in names {
        if !header_map.contains_key(*name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }
    Ok(())
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a date in one of the accepted formats.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO first; farm records kept in spreadsheets often use day-first dates.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_f64(s: &str, field: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{field}` value '{s}'.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HarvestFilter;
    use crate::store::InMemoryStore;

    #[test]
    fn header_names_are_normalized() {
        assert_eq!(normalize_header_name("\u{feff}Crop_Name "), "crop_name");
        assert_eq!(normalize_header_name("AREA"), "area");
    }

    #[test]
    fn dates_accept_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for s in ["2024-03-15", "15/03/2024", "15-03-2024", "2024/03/15"] {
            assert_eq!(parse_date(s).unwrap(), expected, "{s}");
        }
        assert!(parse_date("March 15").is_err());
    }

    #[test]
    fn import_collects_row_errors_and_keeps_good_rows() {
        let csv = "\u{feff}Name,Area,Planting_Date,Harvest_Date,Yield\n\
                   Maize,2.5,2024-03-15,2024-07-20,1700\n\
                   Maize,2.5,2024-03-15,2024-08-02,300\n\
                   Beans,abc,2024-03-15,,\n\
                   Rice,1.0,2024-10-01,2025-02-01,\n\
                   Sorghum,1.0,2024-04-01,,\n";
        let parsed = parse_import(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows_read, 5);
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(
            parsed.row_errors.iter().map(|e| e.line).collect::<Vec<_>>(),
            vec![4, 5]
        );
        assert!(parsed.rows[2].harvest.is_none());
    }

    #[test]
    fn import_requires_schema_columns() {
        let err = parse_import("name,planting_date\nMaize,2024-03-15\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("area"));

        let err = parse_import("name,area,planting_date,harvest_date\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn apply_import_groups_harvests_by_planting() {
        let csv = "crop_name,area,planting_date,harvest_date,yield_amount\n\
                   Maize,2.5,2024-03-15,2024-07-20,1700\n\
                   Maize,2.5,2024-03-15,2024-08-02,300\n\
                   Maize,0,2024-03-15,2024-08-02,300\n\
                   Beans,1,2024-03-15,2024-06-02,-4\n";
        let parsed = parse_import(csv.as_bytes()).unwrap();

        let mut store = InMemoryStore::new();
        let summary = apply_import(&mut store, 1, parsed).unwrap();

        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.crops_created, 1);
        assert_eq!(summary.harvests_created, 2);
        assert_eq!(
            summary.row_errors.iter().map(|e| e.line).collect::<Vec<_>>(),
            vec![4, 5]
        );
        assert_eq!(store.crop_count(), 1);

        let maize = store.list_crops(1).unwrap().into_iter().find(|c| c.name == "Maize").unwrap();
        let filter = HarvestFilter {
            crop_id: Some(maize.id),
            ..HarvestFilter::for_owner(1)
        };
        assert_eq!(store.list_harvests(&filter).unwrap().len(), 2);
    }

    #[test]
    fn rejected_harvest_leaves_no_crop_behind() {
        let bad = "crop_name,area,planting_date,harvest_date,yield_amount\n\
                   Beans,1,2024-03-15,2024-06-02,-4\n";
        let mut store = InMemoryStore::new();
        let summary = apply_import(&mut store, 1, parse_import(bad.as_bytes()).unwrap()).unwrap();

        assert_eq!(summary.rows_skipped(), 1);
        assert_eq!(summary.crops_created, 0);
        assert_eq!(store.crop_count(), 0);

        let fixed = "crop_name,area,planting_date,harvest_date,yield_amount\n\
                     Beans,1,2024-03-15,2024-06-02,400\n";
        let summary = apply_import(&mut store, 1, parse_import(fixed.as_bytes()).unwrap()).unwrap();
        assert_eq!(summary.crops_created, 1);
        assert_eq!(store.crop_count(), 1);
        assert_eq!(store.harvest_count(), 1);
    }

    #[test]
    fn history_accepts_month_or_planting_date() {
        let by_month = "month,area,yield_amount\n3,2,1300\nx,2,1300\n11,4,2480\n";
        let (records, errors) = parse_history(by_month.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].month, 11);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);

        let by_date = "planting_date,area,yield\n2024-04-01,3,2100\n";
        let (records, _) = parse_history(by_date.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![HistoricalRecord {
                month: 4,
                area: 3.0,
                yield_amount: 2100.0
            }]
        );

        assert!(parse_history("area,yield_amount\n".as_bytes()).is_err());
    }
}
