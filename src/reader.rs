use crate::error::{WindowError, WindowResult};
use memmap2::Mmap;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

/// Supported observation file layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// One JSON value per line
    JsonLines,
    /// A single JSON array
    JsonArray,
    /// Comma-separated numeric columns
    Csv,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Some(FileFormat::JsonLines),
            "json" => Some(FileFormat::JsonArray),
            "csv" | "txt" => Some(FileFormat::Csv),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Open a file and map it into memory (read-only)
fn mmap_file(path: &Path) -> WindowResult<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and dropped before this module returns.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

/// Read every raw observation of a file, format chosen by extension.
///
/// Items are returned unnormalized so shape errors surface at the ingest that
/// reaches them.
pub fn read_observations<P: AsRef<Path>>(path: P) -> WindowResult<Vec<Value>> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path).ok_or_else(|| {
        WindowError::Source(format!(
            "Unsupported file extension for {}. Supported: jsonl, ndjson, json, csv, txt",
            path.display()
        ))
    })?;

    if std::fs::metadata(path)?.len() == 0 {
        return Ok(Vec::new());
    }

    let mmap = mmap_file(path)?;
    let items = parse_bytes(&mmap, format)?;
    log::info!(
        "Read {} observations from {} ({:?})",
        items.len(),
        path.display(),
        format
    );
    Ok(items)
}

/// Parse raw file content in the given layout
pub fn parse_bytes(content: &[u8], format: FileFormat) -> WindowResult<Vec<Value>> {
    match format {
        FileFormat::JsonArray => match serde_json::from_slice::<Value>(content)? {
            Value::Array(items) => Ok(items),
            other => Err(WindowError::Shape(format!(
                "expected a JSON array of observations, got {}",
                kind(&other)
            ))),
        },
        FileFormat::JsonLines => data_lines(content)
            .map(|entry| {
                let (line_no, line) = entry?;
                parse_json_line(line).map_err(|e| {
                    WindowError::Shape(format!("line {}: {}", line_no, e))
                })
            })
            .collect(),
        FileFormat::Csv => parse_csv(content),
    }
}

/// Parse one JSON-lines record
pub fn parse_json_line(line: &str) -> WindowResult<Value> {
    Ok(serde_json::from_str(line.trim())?)
}

fn parse_csv(content: &[u8]) -> WindowResult<Vec<Value>> {
    let mut items = Vec::new();
    let mut first = true;

    for entry in data_lines(content) {
        let (line_no, line) = entry?;
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let parsed: Option<Vec<f64>> = cells.iter().map(|c| c.parse::<f64>().ok()).collect();

        // JSON has no NaN or infinity
        if let Some(row) = &parsed {
            if row.iter().any(|v| !v.is_finite()) {
                return Err(WindowError::Shape(format!(
                    "line {}: non-finite value in '{}'",
                    line_no, line
                )));
            }
        }

        let row = match parsed {
            Some(row) => row,
            // header row
            None if first => {
                first = false;
                continue;
            }
            None => {
                return Err(WindowError::Source(format!(
                    "line {}: non-numeric value in '{}'",
                    line_no, line
                )))
            }
        };
        first = false;

        items.push(if row.len() == 1 {
            Value::from(row[0])
        } else {
            Value::from(row)
        });
    }

    Ok(items)
}

/// Non-empty, non-comment lines with their 1-based line numbers; a line that
/// is not UTF-8 is an error, never skipped
fn data_lines(content: &[u8]) -> impl Iterator<Item = WindowResult<(usize, &str)>> {
    content
        .split(|&b| b == b'\n')
        .enumerate()
        .filter_map(|(i, raw)| {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    return Some(Err(WindowError::Shape(format!(
                        "line {}: invalid UTF-8 ({})",
                        i + 1,
                        e
                    ))))
                }
            };
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some(Ok((i + 1, line)))
            }
        })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_csv_with_header_and_comments() {
        let content = b"# sensor dump\na,b\n1,2\n\n3, 4\n";
        let items = parse_bytes(content, FileFormat::Csv).unwrap();
        assert_eq!(items, vec![json!([1.0, 2.0]), json!([3.0, 4.0])]);
    }

    #[test]
    fn test_csv_single_column_yields_scalars() {
        let items = parse_bytes(b"value\n1\n2\n", FileFormat::Csv).unwrap();
        assert_eq!(items, vec![json!(1.0), json!(2.0)]);
    }

    #[test]
    fn test_csv_rejects_garbage_after_header() {
        assert!(parse_bytes(b"1,2\n3,x\n", FileFormat::Csv).is_err());
    }

    #[test]
    fn test_invalid_utf8_line_is_error() {
        let content = b"1\n2\n\xff\xfe\n4\n";
        for format in [FileFormat::Csv, FileFormat::JsonLines] {
            let err = parse_bytes(content, format).unwrap_err();
            assert!(matches!(err, WindowError::Shape(_)));
            assert!(err.to_string().contains("line 3"));
        }
    }

    #[test]
    fn test_csv_rejects_non_finite_cells() {
        for content in [&b"1\nnan\n3\n"[..], &b"1,2\n3,inf\n"[..], &b"-infinity\n"[..]] {
            let err = parse_bytes(content, FileFormat::Csv).unwrap_err();
            assert!(err.to_string().contains("non-finite"));
        }
        let err = parse_bytes(b"1\nNaN\n", FileFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_json_lines_error_reports_line() {
        let err = parse_bytes(b"1\n2\n{oops\n", FileFormat::JsonLines).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_json_lines_and_array() {
        let lines = parse_bytes(b"1\n[2, 3]\n{\"x\": 4, \"y\": 5}\n", FileFormat::JsonLines).unwrap();
        assert_eq!(lines.len(), 3);
        let array = parse_bytes(b"[1, 2, 3]", FileFormat::JsonArray).unwrap();
        assert_eq!(array.len(), 3);
        assert!(parse_bytes(b"{\"a\": 1}", FileFormat::JsonArray).is_err());
    }

    #[test]
    fn test_read_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "1\n2\n3").unwrap();
        let items = read_observations(file.path()).unwrap();
        assert_eq!(items.len(), 3);

        let empty = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        assert!(read_observations(empty.path()).unwrap().is_empty());

        let unknown = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        assert!(read_observations(unknown.path()).is_err());
    }
}
