//! Qucs text formats: schematic documents, the clipboard exchange text and
//! simulation datasets.
//!
//! Every format is line oriented. A line is `<` + space separated fields +
//! `>`, where quoted fields may contain spaces. Sections open with `<Name>`
//! and close with `</Name>`.

pub mod dataset;
pub mod reader;
pub mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub use dataset::{Dataset, Variable};
pub use reader::{
    read_exchange, read_schematic, read_sections, DocumentProperties, SchematicFile, Sections,
};
pub use writer::{write_exchange, write_graph_sections, write_schematic, write_symbol};

pub const SCHEMATIC_MAGIC: &str = "<Qucs Schematic ";
pub const DATASET_MAGIC: &str = "<Qucs Dataset ";

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File is empty")]
    EmptyFile,
    #[error("Wrong document type: {0}")]
    WrongMagic(String),
    #[error("Document version {found} is newer than the supported version {running}")]
    VersionTooNew { found: String, running: String },
    #[error("Section <{0}> is not closed")]
    UnclosedSection(String),
    #[error("Line {line}: {message}")]
    Field { line: usize, message: String },
}

impl FormatError {
    pub(crate) fn field(line: usize, message: impl Into<String>) -> Self {
        FormatError::Field {
            line,
            message: message.into(),
        }
    }
}

/// Version as the integer left after removing the dots (`0.0.19` -> 19).
pub fn version_number(version: &str) -> Option<u64> {
    let digits: String = version.chars().filter(|c| *c != '.').collect();
    digits.parse().ok()
}

/// Check a `<Qucs Schematic X.Y.Z>` header line and return its version.
/// Older versions are accepted, newer ones are refused.
pub fn parse_header(line: &str, running: &str) -> Result<String, FormatError> {
    let line = line.trim();
    if !line.starts_with(SCHEMATIC_MAGIC) || !line.ends_with('>') {
        return Err(FormatError::WrongMagic(line.to_string()));
    }
    let version = line[SCHEMATIC_MAGIC.len()..line.len() - 1].trim().to_string();
    let found = version_number(&version)
        .ok_or_else(|| FormatError::field(1, format!("invalid version '{}'", version)))?;
    let supported = version_number(running)
        .ok_or_else(|| FormatError::field(1, format!("invalid running version '{}'", running)))?;
    if found > supported {
        return Err(FormatError::VersionTooNew {
            found: version,
            running: running.to_string(),
        });
    }
    Ok(version)
}

/// First non-blank line together with its 1-based line number.
pub(crate) fn first_content_line(content: &str) -> Option<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .find(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l))
}

/// Content between the outer angle brackets of a line.
pub(crate) fn strip_brackets(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('<')?.strip_suffix('>')
}

/// Split a line body into fields. Quoted fields keep their quotes so they
/// can be written back unchanged.
pub(crate) fn split_fields(body: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in body.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

pub(crate) fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

pub(crate) fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Count the subcircuit ports of a schematic file without loading it: the
/// header is checked, then the distinct port numbers of the `<Port` lines in
/// the components section are counted.
pub fn probe_port_count(path: &Path, running: &str) -> Result<usize, FormatError> {
    let content = std::fs::read_to_string(path)?;
    let (_, header) = first_content_line(&content).ok_or(FormatError::EmptyFile)?;
    parse_header(header, running)?;

    let mut lines = content.lines().skip_while(|l| l.trim() != "<Components>");
    if lines.next().is_none() {
        return Err(FormatError::UnclosedSection("Components".to_string()));
    }
    let mut numbers = BTreeSet::new();
    let mut ordinal: usize = 0;
    for line in lines {
        let line = line.trim();
        if line == "</Components>" {
            return Ok(numbers.len());
        }
        if line.split(' ').next() == Some("<Port") {
            ordinal += 1;
            let number = strip_brackets(line)
                .map(split_fields)
                .and_then(|f| f.get(9).and_then(|v| unquote(v).trim().parse().ok()))
                .unwrap_or(ordinal);
            numbers.insert(number);
        }
    }
    Err(FormatError::UnclosedSection("Components".to_string()))
}

/// Resolves subcircuit file references of one document to port counts.
#[derive(Debug, Clone)]
pub struct SubcircuitResolver {
    base: Option<PathBuf>,
    running: String,
}

impl SubcircuitResolver {
    /// `base` is the directory relative references are resolved against.
    pub fn new(base: Option<PathBuf>, running: impl Into<String>) -> Self {
        Self {
            base,
            running: running.into(),
        }
    }

    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Port count of the referenced file; unreadable or invalid files count
    /// as zero ports.
    pub fn port_count(&self, file: &str) -> usize {
        if file.is_empty() {
            return 0;
        }
        let path = self.resolve(file);
        match probe_port_count(&path, &self.running) {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("Subcircuit {:?} has no usable ports: {}", path, e);
                0
            }
        }
    }
}
