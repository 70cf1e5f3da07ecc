//! Schematic document reader.

use crate::element::{Component, Diagram, Label, Painting, Property, PropertyKind, Trace, Wire};
use crate::geometry::{Point, COORD_LIMIT};
use crate::graph::Graph;
use crate::library::{self, SUBCIRCUIT_MODEL};
use crate::viewport::Viewport;

use super::{
    first_content_line, parse_header, split_fields, strip_brackets, unquote, FormatError,
    SubcircuitResolver,
};

/// Contents of the `<Properties>` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentProperties {
    pub view: Option<Viewport>,
    pub data_set: Option<String>,
    pub data_display: Option<String>,
    pub open_display: bool,
    /// Other `Key=value` entries, kept verbatim.
    pub extra: Vec<String>,
}

/// Parsed sections of a document body. Components, wires, diagrams and
/// paintings land in `schematic`, the `<Symbol>` section in `symbol`.
#[derive(Debug, Default)]
pub struct Sections {
    pub properties: DocumentProperties,
    pub schematic: Graph,
    pub symbol: Graph,
}

#[derive(Debug)]
pub struct SchematicFile {
    pub version: String,
    pub properties: DocumentProperties,
    pub schematic: Graph,
    pub symbol: Graph,
}

/// Parse a complete schematic file, header included.
pub fn read_schematic(
    content: &str,
    running: &str,
    resolver: &SubcircuitResolver,
) -> Result<SchematicFile, FormatError> {
    let (header_line, header) = first_content_line(content).ok_or(FormatError::EmptyFile)?;
    let version = parse_header(header, running)?;
    let body = content
        .lines()
        .enumerate()
        .skip(header_line)
        .map(|(i, l)| (i + 1, l));
    let sections = parse_sections(body, resolver)?;
    Ok(SchematicFile {
        version,
        properties: sections.properties,
        schematic: sections.schematic,
        symbol: sections.symbol,
    })
}

/// Parse exchange text (header plus sections) into a graph of its elements.
pub fn read_exchange(
    content: &str,
    running: &str,
    resolver: &SubcircuitResolver,
) -> Result<Graph, FormatError> {
    read_schematic(content, running, resolver).map(|file| file.schematic)
}

/// Parse a headerless body, as stored in undo snapshots.
pub fn read_sections(content: &str, resolver: &SubcircuitResolver) -> Result<Sections, FormatError> {
    parse_sections(content.lines().enumerate().map(|(i, l)| (i + 1, l)), resolver)
}

fn parse_sections<'a>(
    lines: impl Iterator<Item = (usize, &'a str)>,
    resolver: &SubcircuitResolver,
) -> Result<Sections, FormatError> {
    let mut lines = lines
        .map(|(n, l)| (n, l.trim()))
        .filter(|(_, l)| !l.is_empty());
    let mut sections = Sections::default();

    while let Some((n, line)) = lines.next() {
        let name = section_name(line)
            .ok_or_else(|| FormatError::field(n, format!("unexpected line '{}'", line)))?;
        let body = collect_section(&mut lines, name)?;
        match name {
            "Properties" => read_properties(&body, &mut sections.properties)?,
            "Symbol" => read_paintings(&body, &mut sections.symbol)?,
            "Components" => {
                for (n, text) in body {
                    let component = read_component(n, text, resolver)?;
                    sections.schematic.append(component);
                }
            }
            "Wires" => {
                for (n, text) in body {
                    read_wire(n, text, &mut sections.schematic)?;
                }
            }
            "Diagrams" => read_diagrams(&body, &mut sections.schematic)?,
            "Paintings" => read_paintings(&body, &mut sections.schematic)?,
            other => tracing::debug!("Skipping unknown section <{}>", other),
        }
    }
    Ok(sections)
}

fn section_name(line: &str) -> Option<&str> {
    let inner = strip_brackets(line)?;
    if inner.is_empty()
        || inner.starts_with('/')
        || inner.contains('=')
        || inner.contains(char::is_whitespace)
    {
        return None;
    }
    Some(inner)
}

fn collect_section<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    name: &str,
) -> Result<Vec<(usize, &'a str)>, FormatError> {
    let close = format!("</{}>", name);
    let mut body = Vec::new();
    for (n, line) in lines {
        if line == close {
            return Ok(body);
        }
        body.push((n, line));
    }
    Err(FormatError::UnclosedSection(name.to_string()))
}

fn fields_of(line: usize, text: &str) -> Result<Vec<String>, FormatError> {
    strip_brackets(text)
        .map(split_fields)
        .ok_or_else(|| FormatError::field(line, format!("'{}' is not enclosed in < >", text)))
}

fn int(line: usize, field: &str) -> Result<i32, FormatError> {
    field
        .parse()
        .map_err(|_| FormatError::field(line, format!("invalid number '{}'", field)))
}

/// A position, offset or size field, bounded to [`COORD_LIMIT`].
fn coord(line: usize, field: &str) -> Result<i32, FormatError> {
    let value = int(line, field)?;
    if value.checked_abs().map_or(true, |v| v > COORD_LIMIT) {
        return Err(FormatError::field(
            line,
            format!("coordinate out of range '{}'", field),
        ));
    }
    Ok(value)
}

fn read_properties(body: &[(usize, &str)], props: &mut DocumentProperties) -> Result<(), FormatError> {
    for &(n, text) in body {
        let inner = strip_brackets(text)
            .ok_or_else(|| FormatError::field(n, format!("'{}' is not enclosed in < >", text)))?;
        match inner.split_once('=') {
            Some(("View", value)) => {
                let view = Viewport::from_property(value)
                    .ok_or_else(|| FormatError::field(n, format!("invalid view '{}'", value)))?;
                props.view = Some(view);
            }
            Some(("DataSet", value)) => props.data_set = Some(value.to_string()),
            Some(("DataDisplay", value)) => props.data_display = Some(value.to_string()),
            Some(("OpenDisplay", value)) => props.open_display = value.trim() == "1",
            _ => props.extra.push(inner.to_string()),
        }
    }
    Ok(())
}

fn read_component(
    line: usize,
    text: &str,
    resolver: &SubcircuitResolver,
) -> Result<Component, FormatError> {
    let f = fields_of(line, text)?;
    if f.len() < 9 {
        return Err(FormatError::field(
            line,
            format!("component needs at least 9 fields, found {}", f.len()),
        ));
    }
    let model = f[0].as_str();
    let name = unquote(&f[1]);
    let center = Point::new(coord(line, &f[3])?, coord(line, &f[4])?);
    let values: Vec<(String, bool)> = f[9..]
        .chunks(2)
        .map(|pair| {
            let display = pair.get(1).map(|d| d == "1").unwrap_or(false);
            (unquote(&pair[0]).to_string(), display)
        })
        .collect();

    let mut comp = if model == SUBCIRCUIT_MODEL {
        let file = values.first().map(|(v, _)| v.as_str()).unwrap_or("");
        Component::subcircuit(name, center, file, resolver.port_count(file))
    } else if let Some(info) = library::lookup(model) {
        Component::from_model(info, name, center)
    } else {
        Component::unknown(model, name, center)
    };
    comp.active = f[2] != "0";
    comp.text_offset = Point::new(coord(line, &f[5])?, coord(line, &f[6])?);
    comp.mirrored = f[7] == "1";
    comp.rotation = int(line, &f[8])?.rem_euclid(4) as u8;

    for (i, (value, display)) in values.into_iter().enumerate() {
        match comp.properties.get_mut(i) {
            Some(prop) => {
                prop.value = value;
                prop.display = display;
            }
            None => comp.properties.push(Property {
                name: format!("P{}", i + 1),
                value,
                display,
                kind: PropertyKind::Text,
            }),
        }
    }
    Ok(comp)
}

fn read_wire(line: usize, text: &str, graph: &mut Graph) -> Result<(), FormatError> {
    let f = fields_of(line, text)?;
    if f.len() < 4 {
        return Err(FormatError::field(line, "wire needs at least 4 fields"));
    }
    let start = Point::new(coord(line, &f[0])?, coord(line, &f[1])?);
    let end = Point::new(coord(line, &f[2])?, coord(line, &f[3])?);
    let label = f.get(4).map(|s| unquote(s)).unwrap_or("");
    let text_position = match (f.get(5), f.get(6)) {
        (Some(x), Some(y)) => Point::new(coord(line, x)?, coord(line, y)?),
        _ => start,
    };
    let delta = match f.get(7) {
        Some(d) => coord(line, d)?,
        None => 0,
    };
    let initial = f.get(8).map(|s| unquote(s).to_string()).unwrap_or_default();

    if start == end && !label.is_empty() {
        let mut node_label = Label::new(label, start, text_position);
        node_label.initial = initial;
        graph.append(node_label);
        return Ok(());
    }

    let wire = Wire::new(start, end);
    let horizontal = wire.is_horizontal();
    let wire_id = graph.append(wire);
    if !label.is_empty() {
        let anchor = if horizontal {
            start.translated(delta, 0)
        } else {
            start.translated(0, delta)
        };
        let mut wire_label = Label::new(label, anchor, text_position).on_wire(wire_id);
        wire_label.initial = initial;
        graph.append(wire_label);
    }
    Ok(())
}

fn read_diagrams(body: &[(usize, &str)], graph: &mut Graph) -> Result<(), FormatError> {
    let mut lines = body.iter().copied();
    while let Some((n, text)) = lines.next() {
        let f = fields_of(n, text)?;
        if f.len() < 5 {
            return Err(FormatError::field(n, "diagram needs at least 5 fields"));
        }
        let mut diagram = Diagram::new(
            f[0].clone(),
            Point::new(coord(n, &f[1])?, coord(n, &f[2])?),
            coord(n, &f[3])?,
            coord(n, &f[4])?,
        );
        diagram.fields = f[5..].to_vec();

        let close = format!("</{}>", diagram.kind);
        let mut closed = false;
        for (_, nested) in lines.by_ref() {
            if nested == close {
                closed = true;
                break;
            }
            if nested.starts_with("<\"") {
                let fields = strip_brackets(nested).map(split_fields).unwrap_or_default();
                if let Some((variable, rest)) = fields.split_first() {
                    diagram.traces.push(Trace {
                        variable: unquote(variable).to_string(),
                        fields: rest.to_vec(),
                        samples: Vec::new(),
                    });
                }
            } else {
                diagram.extra.push(nested.to_string());
            }
        }
        if !closed {
            return Err(FormatError::UnclosedSection(diagram.kind));
        }
        graph.append(diagram);
    }
    Ok(())
}

fn read_paintings(body: &[(usize, &str)], graph: &mut Graph) -> Result<(), FormatError> {
    for &(n, text) in body {
        let f = fields_of(n, text)?;
        if f.len() < 3 {
            return Err(FormatError::field(n, "painting needs at least 3 fields"));
        }
        let position = Point::new(coord(n, &f[1])?, coord(n, &f[2])?);
        graph.append(Painting::new(f[0].clone(), position, f[3..].to_vec()));
    }
    Ok(())
}
