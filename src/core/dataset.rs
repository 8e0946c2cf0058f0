//! Reading per-location measurement files into aligned tables, and writing tables back out.

use crate::domain::model::Table;
use crate::utils::error::{PvGenError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub delimiter: u8,
    /// Token that marks a missing measurement, in addition to an empty cell.
    pub na_value: String,
    /// Accepted file extensions, compared case-insensitively and without the dot.
    pub extensions: Vec<String>,
    /// Position of the temperature series among the data columns (index column excluded).
    pub temperature_column: usize,
    pub irradiance_column: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            na_value: "NULL".to_string(),
            extensions: vec!["csv".to_string(), "txt".to_string()],
            temperature_column: 0,
            irradiance_column: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    pub delimiter: u8,
    pub na_rep: String,
    pub index_label: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            na_rep: String::new(),
            index_label: "timestamp".to_string(),
        }
    }
}

/// One parsed file: a timestamp index and its numeric data columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Temperature and irradiance readings of a single location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSeries {
    pub location: String,
    pub timestamps: Vec<String>,
    pub temperature: Vec<f64>,
    pub irradiance: Vec<f64>,
}

impl LocationSeries {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            timestamps: Vec::new(),
            temperature: Vec::new(),
            irradiance: Vec::new(),
        }
    }

    /// Appends the rows of `frame`, taking the configured data columns.
    pub fn append(&mut self, frame: &Frame, options: &ReadOptions, source: &str) -> Result<()> {
        let required = options.temperature_column.max(options.irradiance_column) + 1;
        if frame.columns.len() < required {
            return Err(PvGenError::ProcessingError {
                message: format!(
                    "{}: expected at least {} data columns after the timestamp, found {}",
                    source,
                    required,
                    frame.columns.len()
                ),
            });
        }

        let seen: HashSet<&str> = self.timestamps.iter().map(String::as_str).collect();
        let mut added = HashSet::new();
        for timestamp in &frame.index {
            if seen.contains(timestamp.as_str()) || !added.insert(timestamp.as_str()) {
                return Err(PvGenError::ProcessingError {
                    message: format!(
                        "{}: timestamp '{}' appears more than once for location '{}'",
                        source, timestamp, self.location
                    ),
                });
            }
        }

        for (timestamp, row) in frame.index.iter().zip(&frame.rows) {
            self.timestamps.push(timestamp.clone());
            self.temperature.push(row[options.temperature_column]);
            self.irradiance.push(row[options.irradiance_column]);
        }
        Ok(())
    }
}

/// Location named by a measurement file: the text before the first space,
/// or the file stem when the name has no space.
pub fn location_of(file_name: &str) -> &str {
    match file_name.split_once(' ') {
        Some((location, _)) => location,
        None => Path::new(file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file_name),
    }
}

/// Whether a listed file should be read as measurement data.
pub fn is_data_file(file_name: &str, options: &ReadOptions) -> bool {
    if file_name.starts_with('.') {
        return false;
    }

    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            options
                .extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Tokens read as a missing measurement regardless of `ReadOptions::na_value`.
/// Same set pandas treats as NA by default, so files exported from it load unchanged.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn parse_cell(raw: &str, na_value: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw == na_value || DEFAULT_NA_VALUES.contains(&raw) {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}

fn read_error(source: &str, error: csv::Error) -> PvGenError {
    PvGenError::ProcessingError {
        message: format!("{}: {}", source, error),
    }
}

/// Parses delimited text whose first column is the timestamp index.
pub fn parse_frame(data: &[u8], options: &ReadOptions, source: &str) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(|e| read_error(source, e))?.clone();
    if headers.len() < 2 {
        return Err(PvGenError::ProcessingError {
            message: format!("{}: no data columns after the timestamp column", source),
        });
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut index = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| read_error(source, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let mut fields = record.iter();
        let timestamp = fields.next().unwrap_or_default().to_string();

        let mut row = Vec::with_capacity(columns.len());
        for (column, raw) in columns.iter().zip(fields) {
            let value = parse_cell(raw, &options.na_value).ok_or_else(|| {
                PvGenError::ProcessingError {
                    message: format!(
                        "{}: line {}, column '{}': '{}' is not a number",
                        source, line, column, raw
                    ),
                }
            })?;
            row.push(value);
        }

        index.push(timestamp);
        rows.push(row);
    }

    Ok(Frame {
        index,
        columns,
        rows,
    })
}

/// Groups parsed files by location. `files` must already be in the order rows should be appended.
pub fn group_by_location<'a, I>(files: I, options: &ReadOptions) -> Result<Vec<LocationSeries>>
where
    I: IntoIterator<Item = (&'a str, Frame)>,
{
    let mut by_location: BTreeMap<String, LocationSeries> = BTreeMap::new();
    for (file_name, frame) in files {
        let location = location_of(file_name);
        by_location
            .entry(location.to_string())
            .or_insert_with(|| LocationSeries::new(location))
            .append(&frame, options, file_name)?;
    }
    Ok(by_location.into_values().collect())
}

/// Builds the temperature and irradiance tables over the union of all timestamps.
///
/// Rows follow first appearance across `series`; a location without a reading
/// at some timestamp gets `NaN` there.
pub fn align(series: &[LocationSeries]) -> Result<(Table, Table)> {
    let mut index: Vec<String> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for location in series {
        for timestamp in &location.timestamps {
            if !positions.contains_key(timestamp.as_str()) {
                positions.insert(timestamp.as_str(), index.len());
                index.push(timestamp.clone());
            }
        }
    }

    let width = series.len();
    let mut temperature = vec![f64::NAN; index.len() * width];
    let mut irradiance = vec![f64::NAN; index.len() * width];
    for (column, location) in series.iter().enumerate() {
        for (i, timestamp) in location.timestamps.iter().enumerate() {
            let row = positions[timestamp.as_str()];
            temperature[row * width + column] = location.temperature[i];
            irradiance[row * width + column] = location.irradiance[i];
        }
    }

    let columns: Vec<String> = series.iter().map(|s| s.location.clone()).collect();
    Ok((
        Table::new(index.clone(), columns.clone(), temperature)?,
        Table::new(index, columns, irradiance)?,
    ))
}

/// Serializes a table as delimited text with a header row.
pub fn write_table(table: &Table, options: &WriteOptions) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::new());

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(options.index_label.as_str());
    header.extend(table.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (timestamp, values) in table.rows() {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(timestamp.to_string());
        record.extend(values.iter().map(|v| {
            if v.is_nan() {
                options.na_rep.clone()
            } else {
                v.to_string()
            }
        }));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| PvGenError::IoError(std::io::Error::new(e.error().kind(), e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> Frame {
        parse_frame(text.as_bytes(), &ReadOptions::default(), "test.csv").unwrap()
    }

    #[test]
    fn test_location_of() {
        assert_eq!(location_of("Berlin 2019.csv"), "Berlin");
        assert_eq!(location_of("Berlin 2019 part 2.csv"), "Berlin");
        assert_eq!(location_of("Munich.csv"), "Munich");
    }

    #[test]
    fn test_is_data_file() {
        let options = ReadOptions::default();
        assert!(is_data_file("Berlin 2019.csv", &options));
        assert!(is_data_file("Berlin 2019.CSV", &options));
        assert!(is_data_file("Berlin 2019.txt", &options));
        assert!(!is_data_file("notes.md", &options));
        assert!(!is_data_file(".Berlin.csv", &options));
        assert!(!is_data_file("README", &options));
    }

    #[test]
    fn test_parse_frame_maps_sentinel_to_nan() {
        let parsed = frame("time;temp;irr\n2019-01-01 10:00;5.5;NULL\n2019-01-01 11:00; 6 ;\n");

        assert_eq!(parsed.columns, vec!["temp", "irr"]);
        assert_eq!(parsed.index, vec!["2019-01-01 10:00", "2019-01-01 11:00"]);
        assert_eq!(parsed.rows[0][0], 5.5);
        assert!(parsed.rows[0][1].is_nan());
        assert_eq!(parsed.rows[1][0], 6.0);
        assert!(parsed.rows[1][1].is_nan());
    }

    #[test]
    fn test_parse_frame_accepts_common_missing_tokens() {
        let parsed = frame(
            "time;temp;irr\nt0;NA;N/A\nt1;-1.#IND;nan\nt2;null;#N/A\nt3;4;<NA>\n",
        );

        assert_eq!(parsed.rows.len(), 4);
        for row in &parsed.rows[..3] {
            assert!(row.iter().all(|v| v.is_nan()), "row {:?}", row);
        }
        assert_eq!(parsed.rows[3][0], 4.0);
        assert!(parsed.rows[3][1].is_nan());
    }

    #[test]
    fn test_custom_na_value_keeps_default_tokens() {
        let options = ReadOptions {
            na_value: "-999".to_string(),
            ..ReadOptions::default()
        };
        let parsed = parse_frame(b"time;temp;irr\nt0;-999;NA\n", &options, "x.csv").unwrap();
        assert!(parsed.rows[0][0].is_nan());
        assert!(parsed.rows[0][1].is_nan());
    }

    #[test]
    fn test_malformed_record_names_the_file() {
        let result = parse_frame(
            b"time;temp;irr\nt0;1;100\nt1;2\n",
            &ReadOptions::default(),
            "Berlin 2019.csv",
        );
        match result {
            Err(PvGenError::ProcessingError { message }) => {
                assert!(message.starts_with("Berlin 2019.csv: "), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_frame_rejects_text_cells() {
        let result = parse_frame(
            b"time;temp;irr\nt0;warm;100\n",
            &ReadOptions::default(),
            "Berlin 2019.csv",
        );
        match result {
            Err(PvGenError::ProcessingError { message }) => {
                assert!(message.contains("Berlin 2019.csv"));
                assert!(message.contains("'warm'"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_frame_requires_data_columns() {
        let result = parse_frame(b"time\nt0\n", &ReadOptions::default(), "x.csv");
        assert!(matches!(result, Err(PvGenError::ProcessingError { .. })));
    }

    #[test]
    fn test_group_concatenates_same_location_in_order() {
        let options = ReadOptions::default();
        let files = vec![
            ("Berlin 2019.csv", frame("time;t;e\na;1;10\nb;2;20\n")),
            ("Berlin 2020.csv", frame("time;t;e\nc;3;30\n")),
            ("Aachen 2019.csv", frame("time;t;e\na;7;70\n")),
        ];

        let series = group_by_location(files, &options).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].location, "Aachen");
        assert_eq!(series[1].location, "Berlin");
        assert_eq!(series[1].timestamps, vec!["a", "b", "c"]);
        assert_eq!(series[1].temperature, vec![1.0, 2.0, 3.0]);
        assert_eq!(series[1].irradiance, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_group_rejects_repeated_timestamp() {
        let files = vec![
            ("Berlin 2019.csv", frame("time;t;e\na;1;10\n")),
            ("Berlin 2020.csv", frame("time;t;e\na;2;20\n")),
        ];
        assert!(group_by_location(files, &ReadOptions::default()).is_err());
    }

    #[test]
    fn test_group_honours_column_positions() {
        let options = ReadOptions {
            temperature_column: 2,
            irradiance_column: 0,
            ..ReadOptions::default()
        };
        let files = vec![("Berlin.csv", frame("time;e;x;t\na;100;0;12\n"))];
        let series = group_by_location(files, &options).unwrap();
        assert_eq!(series[0].temperature, vec![12.0]);
        assert_eq!(series[0].irradiance, vec![100.0]);

        let narrow = vec![("Berlin.csv", frame("time;e;t\na;100;12\n"))];
        assert!(group_by_location(narrow, &options).is_err());
    }

    #[test]
    fn test_align_fills_missing_timestamps() {
        let series = vec![
            LocationSeries {
                location: "Aachen".to_string(),
                timestamps: vec!["a".to_string(), "b".to_string()],
                temperature: vec![1.0, 2.0],
                irradiance: vec![10.0, 20.0],
            },
            LocationSeries {
                location: "Berlin".to_string(),
                timestamps: vec!["b".to_string(), "c".to_string()],
                temperature: vec![5.0, 6.0],
                irradiance: vec![50.0, 60.0],
            },
        ];

        let (temperature, irradiance) = align(&series).unwrap();

        assert_eq!(temperature.shape(), (3, 2));
        assert_eq!(temperature.index(), irradiance.index());
        assert_eq!(temperature.columns(), &["Aachen".to_string(), "Berlin".to_string()]);
        assert_eq!(temperature.get(1, 1), Some(5.0));
        assert!(temperature.get(0, 1).unwrap().is_nan());
        assert!(irradiance.get(2, 0).unwrap().is_nan());
        assert_eq!(irradiance.get(2, 1), Some(60.0));
    }

    #[test]
    fn test_write_table_prints_na_rep() {
        let table = Table::from_rows(
            ["t0", "t1"],
            ["Aachen", "Berlin"],
            vec![vec![1.5, f64::NAN], vec![2.0, 0.25]],
        )
        .unwrap();

        let options = WriteOptions {
            na_rep: "NA".to_string(),
            ..WriteOptions::default()
        };
        let text = String::from_utf8(write_table(&table, &options).unwrap()).unwrap();

        assert_eq!(text, "timestamp,Aachen,Berlin\nt0,1.5,NA\nt1,2,0.25\n");
    }
}
