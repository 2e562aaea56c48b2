use std::collections::HashMap;
use std::str::FromStr;

use crate::plate_pipeline::common::error::{AnalysisError, Result};

/// `#` header fields and data rows of a results file, with 1-based line
/// numbers kept for error messages.
pub(crate) struct Sections<'a> {
    pub origin: &'a str,
    pub headers: HashMap<String, (usize, &'a str)>,
    pub rows: Vec<(usize, &'a str)>,
}

impl<'a> Sections<'a> {
    /// Header lines look like `# Key: value`; `#` lines without a colon are
    /// comments.
    pub fn split(text: &'a str, origin: &'a str) -> Self {
        let mut headers = HashMap::new();
        let mut rows = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            if let Some(rest) = line.strip_prefix('#') {
                if let Some((key, value)) = rest.split_once(':') {
                    headers.insert(key.trim().to_ascii_lowercase(), (line_no, value.trim()));
                }
            } else if !line.trim().is_empty() {
                rows.push((line_no, line));
            }
        }
        Self {
            origin,
            headers,
            rows,
        }
    }

    pub fn header<T>(&self, field: &'static str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let (line, value) = self
            .headers
            .get(&field.to_ascii_lowercase())
            .ok_or_else(|| AnalysisError::MissingHeader {
                path: self.origin.to_string(),
                field,
            })?;
        value.parse().map_err(|e: T::Err| {
            AnalysisError::format(self.origin, *line, *value, format!("{field}: {e}"))
        })
    }

    pub fn check_count(&self, field: &'static str, declared: u64, actual: u64) -> Result<()> {
        if declared == actual {
            Ok(())
        } else {
            Err(AnalysisError::CountMismatch {
                path: self.origin.to_string(),
                field,
                declared,
                actual,
            })
        }
    }
}

/// Whitespace-separated columns of one data row.
pub(crate) struct Row<'a> {
    origin: &'a str,
    line_no: usize,
    line: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    pub fn new(origin: &'a str, line_no: usize, line: &'a str, expected: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != expected {
            return Err(AnalysisError::format(
                origin,
                line_no,
                line,
                format!("expected {expected} columns, found {}", fields.len()),
            ));
        }
        Ok(Self {
            origin,
            line_no,
            line,
            fields,
        })
    }

    pub fn get<T>(&self, col: usize, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.fields[col].parse().map_err(|e: T::Err| {
            AnalysisError::format(self.origin, self.line_no, self.line, format!("{name}: {e}"))
        })
    }

    pub fn flag(&self, col: usize, name: &str) -> Result<bool> {
        match self.fields[col] {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(AnalysisError::format(
                self.origin,
                self.line_no,
                self.line,
                format!("{name}: expected 0 or 1, found {other:?}"),
            )),
        }
    }
}
