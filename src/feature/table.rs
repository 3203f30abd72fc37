use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;

use crate::feature::params::FeatureParams;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: could not parse field {value:?} as a number")]
    MalformedField { line: usize, value: String },
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Read a tab-delimited numeric matrix into feature rows.
///
/// The first line is a header and is discarded. Every following line must
/// carry at least `expected_width` tab-separated numeric fields; all
/// fields are parsed as floating point regardless of logical
/// integrality. Any malformed field or short row fails the whole read,
/// there is no row-level recovery.
pub fn read_rows(path: &Path, expected_width: usize) -> Result<Vec<Vec<f64>>, TableError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut lines = reader.lines();
    if lines.next().transpose()?.is_none() {
        return Ok(Vec::new());
    }

    // Line numbers are 1-based and count the header.
    let numbered: Vec<(usize, String)> = lines
        .enumerate()
        .map(|(i, line)| Ok((i + 2, line?)))
        .collect::<Result<_, std::io::Error>>()?;

    numbered
        .par_iter()
        .map(|(line, text)| parse_row(*line, text, expected_width))
        .collect()
}

fn parse_row(line: usize, text: &str, expected_width: usize) -> Result<Vec<f64>, TableError> {
    let fields: Vec<&str> = text.split('\t').collect();
    if fields.len() < expected_width {
        return Err(TableError::RowWidth {
            line,
            expected: expected_width,
            found: fields.len(),
        });
    }
    fields
        .iter()
        .map(|field| {
            field.trim().parse::<f64>().map_err(|_| TableError::MalformedField {
                line,
                value: (*field).to_string(),
            })
        })
        .collect()
}

/// Write feature rows as a tab-delimited numeric matrix.
///
/// Columns follow the fixed output order with a header line; the id
/// column is re-numbered sequentially from 1 in output order. Charge and
/// isotope count are rendered as integers, everything else in native
/// decimal form. The quality score column is only present for tables
/// produced by the second scoring stage.
pub fn write_rows(
    path: &Path,
    rows: &[Vec<f64>],
    params: &FeatureParams,
    with_quality: bool,
) -> Result<(), TableError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write!(
        writer,
        "id\tmz\trt\tz\tisotope_num\tintensity_shape_score\tisotope_distribution_score\t\
         intensity_window_evg\tintensity_area_percentage\trt_start\trt_end\tscan_num\t\
         intensity_sum\tsvr_score"
    )?;
    if with_quality {
        write!(writer, "\tquality_score")?;
    }
    writeln!(writer)?;

    for (index, row) in rows.iter().enumerate() {
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            index + 1,
            row[params.mz_index],
            row[params.rt_index],
            row[params.z_index] as i64,
            row[params.isonum_index] as i64,
            row[params.int_shape_index],
            row[params.iso_distr_index],
            row[params.intensity_window_avg_index],
            row[params.intensity_area_percentage_index],
            row[params.rt_start_index],
            row[params.rt_end_index],
            row[params.scan_num_index],
            row[params.intensity_sum_index],
            row[params.svr_index],
        )?;
        if with_quality {
            write!(writer, "\t{}", row[params.quality_index])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write as _;

    fn params() -> FeatureParams {
        let pairs = [
            ("ID_INDEX", "0"),
            ("MZ_INDEX", "1"),
            ("RT_INDEX", "2"),
            ("Z_INDEX", "3"),
            ("ISONUM_INDEX", "4"),
            ("INT_SHAPE_INDEX", "5"),
            ("ISO_DISTR_INDEX", "6"),
            ("INTENSITY_WINDOW_AVG_INDEX", "7"),
            ("INTENSITY_AREA_PERCENTAGE_INDEX", "8"),
            ("RT_START_INDEX", "9"),
            ("RT_END_INDEX", "10"),
            ("SCAN_NUM_INDEX", "11"),
            ("INTENSITY_SUM_INDEX", "12"),
            ("SVR_INDEX", "13"),
            ("QUALITY_INDEX", "14"),
            ("INVALID_VAL", "-10000"),
            ("MZ_ERROR", "0.0001"),
            ("RT_ERROR", "0.5"),
        ];
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FeatureParams::from_key_values(&map).unwrap()
    }

    fn row(id: f64, mz: f64, rt: f64, z: f64, isonum: f64, svr: f64, quality: f64) -> Vec<f64> {
        let mut row = vec![0.0; 15];
        row[0] = id;
        row[1] = mz;
        row[2] = rt;
        row[3] = z;
        row[4] = isonum;
        row[13] = svr;
        row[14] = quality;
        row
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let params = params();
        let rows = vec![
            row(7.0, 500.25, 10.5, 2.0, 3.0, 0.8, 0.9),
            row(9.0, 612.125, 22.0, 3.0, 2.0, 0.7, 0.6),
        ];

        let file = tempfile::NamedTempFile::new().unwrap();
        write_rows(file.path(), &rows, &params, true).unwrap();
        let reloaded = read_rows(file.path(), params.required_width(true)).unwrap();

        assert_eq!(reloaded.len(), 2);
        // ids are re-numbered in output order, the rest round-trips
        assert!((reloaded[0][params.id_index] - 1.0).abs() < 1e-9);
        assert!((reloaded[1][params.id_index] - 2.0).abs() < 1e-9);
        for (original, read) in rows.iter().zip(reloaded.iter()) {
            assert!((read[params.mz_index] - original[params.mz_index]).abs() < 1e-9);
            assert!((read[params.rt_index] - original[params.rt_index]).abs() < 1e-9);
            assert!((read[params.z_index] - original[params.z_index]).abs() < 1e-9);
            assert!((read[params.isonum_index] - original[params.isonum_index]).abs() < 1e-9);
            assert!((read[params.svr_index] - original[params.svr_index]).abs() < 1e-9);
            assert!((read[params.quality_index] - original[params.quality_index]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_quality_column_is_optional() {
        let params = params();
        let rows = vec![row(1.0, 500.0, 10.0, 2.0, 1.0, 0.8, 0.9)];

        let file = tempfile::NamedTempFile::new().unwrap();
        write_rows(file.path(), &rows, &params, false).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.ends_with("svr_score"));
        assert_eq!(header.split('\t').count(), 14);
        let reloaded = read_rows(file.path(), params.required_width(false)).unwrap();
        assert_eq!(reloaded[0].len(), 14);
    }

    #[test]
    fn test_malformed_field_fails_whole_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "1.0\t2.0").unwrap();
        writeln!(file, "3.0\tnot-a-number").unwrap();

        let err = read_rows(file.path(), 2).unwrap_err();
        match err {
            TableError::MalformedField { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-number");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_short_row_fails_whole_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb\tc").unwrap();
        writeln!(file, "1.0\t2.0\t3.0").unwrap();
        writeln!(file, "4.0\t5.0").unwrap();

        let err = read_rows(file.path(), 3).unwrap_err();
        assert!(matches!(err, TableError::RowWidth { line: 3, .. }));
    }

    #[test]
    fn test_empty_file_reads_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let rows = read_rows(file.path(), 15).unwrap();
        assert!(rows.is_empty());
    }
}
