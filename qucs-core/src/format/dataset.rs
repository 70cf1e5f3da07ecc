//! Simulation results (`.dat`) reader.

use std::path::Path;

use crate::element::Complex;

use super::{first_content_line, strip_brackets, FormatError, DATASET_MAGIC};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Independent variables this one depends on; empty for an independent
    /// variable.
    pub dependencies: Vec<String>,
    pub values: Vec<Complex>,
}

impl Variable {
    pub fn is_independent(&self) -> bool {
        self.dependencies.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub version: String,
    pub variables: Vec<Variable>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, FormatError> {
        let (header_line, header) = first_content_line(content).ok_or(FormatError::EmptyFile)?;
        let header = header.trim();
        if !header.starts_with(DATASET_MAGIC) || !header.ends_with('>') {
            return Err(FormatError::WrongMagic(header.to_string()));
        }
        let version = header[DATASET_MAGIC.len()..header.len() - 1].trim().to_string();

        let mut variables = Vec::new();
        let mut lines = content
            .lines()
            .enumerate()
            .skip(header_line)
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        while let Some((n, line)) = lines.next() {
            let inner = strip_brackets(line)
                .ok_or_else(|| FormatError::field(n, format!("unexpected line '{}'", line)))?;
            let mut fields = inner.split_whitespace();
            let block = fields.next().unwrap_or_default();
            let name = fields
                .next()
                .ok_or_else(|| FormatError::field(n, "variable without a name"))?
                .to_string();
            let dependencies = match block {
                // `<indep name count>`
                "indep" => Vec::new(),
                "dep" => fields.map(str::to_string).collect(),
                other => {
                    return Err(FormatError::field(n, format!("unknown block '{}'", other)));
                }
            };

            let close = format!("</{}>", block);
            let mut values = Vec::new();
            let mut closed = false;
            for (vn, value_line) in lines.by_ref() {
                if value_line == close {
                    closed = true;
                    break;
                }
                for token in value_line.split_whitespace() {
                    let value = parse_value(token).ok_or_else(|| {
                        FormatError::field(vn, format!("invalid value '{}'", token))
                    })?;
                    values.push(value);
                }
            }
            if !closed {
                return Err(FormatError::UnclosedSection(block.to_string()));
            }
            variables.push(Variable {
                name,
                dependencies,
                values,
            });
        }

        Ok(Self { version, variables })
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// (x, y) pairs of a variable. The x axis comes from its first
    /// independent variable, or from the sample index when that is missing.
    pub fn samples(&self, name: &str) -> Option<Vec<(f64, Complex)>> {
        let var = self.variable(name)?;
        if var.is_independent() {
            return Some(var.values.iter().map(|v| (v.re, *v)).collect());
        }
        let axis = var
            .dependencies
            .first()
            .and_then(|d| self.variable(d))
            .map(|d| d.values.iter().map(|v| v.re).collect::<Vec<_>>())
            .unwrap_or_default();
        Some(
            var.values
                .iter()
                .enumerate()
                .map(|(i, v)| (axis.get(i).copied().unwrap_or(i as f64), *v))
                .collect(),
        )
    }
}

/// Parse `1.5`, `-2e-3`, `1+j2` or `+1.0e+00-j3.5e-01`.
pub fn parse_value(token: &str) -> Option<Complex> {
    match token.find('j') {
        None => Some(Complex {
            re: token.parse().ok()?,
            im: 0.0,
        }),
        Some(j) => {
            let head = &token[..j];
            let (re_part, sign) = if let Some(re_part) = head.strip_suffix('+') {
                (re_part, 1.0)
            } else if let Some(re_part) = head.strip_suffix('-') {
                (re_part, -1.0)
            } else {
                return None;
            };
            let re = if re_part.is_empty() { 0.0 } else { re_part.parse().ok()? };
            let im: f64 = token[j + 1..].parse().ok()?;
            Some(Complex { re, im: sign * im })
        }
    }
}
