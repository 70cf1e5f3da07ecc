//! Schematic document writer. Output is accepted unchanged by the reader.

use crate::element::{Component, Diagram, Label, Painting, Wire};
use crate::graph::Graph;

use super::quote;
use super::reader::DocumentProperties;

/// Complete document text. The `<Symbol>` section is only written when the
/// symbol graph holds anything.
pub fn write_schematic(
    version: &str,
    properties: &DocumentProperties,
    schematic: &Graph,
    symbol: &Graph,
) -> String {
    let mut out = format!("<Qucs Schematic {}>\n", version);
    out.push_str(&write_properties(properties));
    if !symbol.is_empty() {
        out.push_str(&write_symbol(symbol));
    }
    out.push_str(&write_graph_sections(schematic, false));
    out
}

/// Header plus the sections of the selected elements only.
pub fn write_exchange(version: &str, graph: &Graph) -> String {
    let mut out = format!("<Qucs Schematic {}>\n", version);
    out.push_str(&write_graph_sections(graph, true));
    out
}

pub fn write_symbol(symbol: &Graph) -> String {
    let mut out = String::from("<Symbol>\n");
    for p in symbol.paintings() {
        out.push_str(&painting_line(p));
    }
    out.push_str("</Symbol>\n");
    out
}

fn write_properties(props: &DocumentProperties) -> String {
    let mut out = String::from("<Properties>\n");
    if let Some(view) = &props.view {
        out.push_str(&format!("  <View={}>\n", view.to_property()));
    }
    if let Some(data_set) = &props.data_set {
        out.push_str(&format!("  <DataSet={}>\n", data_set));
    }
    if let Some(data_display) = &props.data_display {
        out.push_str(&format!("  <DataDisplay={}>\n", data_display));
    }
    if props.open_display {
        out.push_str("  <OpenDisplay=1>\n");
    }
    for entry in &props.extra {
        out.push_str(&format!("  <{}>\n", entry));
    }
    out.push_str("</Properties>\n");
    out
}

/// Components, wires, diagrams and paintings of one graph. This is also the
/// undo snapshot text.
pub fn write_graph_sections(graph: &Graph, selected_only: bool) -> String {
    let keep = |selected: bool| !selected_only || selected;
    let mut out = String::from("<Components>\n");
    for c in graph.components().iter().filter(|c| keep(c.selected)) {
        out.push_str(&component_line(c));
    }
    out.push_str("</Components>\n<Wires>\n");

    let wires: Vec<&Wire> = graph.wires().iter().filter(|w| keep(w.selected)).collect();
    for w in &wires {
        let label = graph.labels().iter().find(|l| l.wire == Some(w.id));
        out.push_str(&wire_line(w, label));
    }
    // wire labels travel on their wire line, never as node labels
    for l in graph.labels().iter().filter(|l| l.wire.is_none() && keep(l.selected)) {
        out.push_str(&node_label_line(l));
    }
    out.push_str("</Wires>\n<Diagrams>\n");

    for d in graph.diagrams().iter().filter(|d| keep(d.selected)) {
        out.push_str(&diagram_lines(d));
    }
    out.push_str("</Diagrams>\n<Paintings>\n");
    for p in graph.paintings().iter().filter(|p| keep(p.selected)) {
        out.push_str(&painting_line(p));
    }
    out.push_str("</Paintings>\n");
    out
}

fn join(fields: &[String]) -> String {
    fields.iter().map(|f| format!(" {}", f)).collect()
}

fn component_line(c: &Component) -> String {
    let mut line = format!(
        "  <{} {} {} {} {} {} {} {} {}",
        c.model,
        c.name,
        u8::from(c.active),
        c.center.x,
        c.center.y,
        c.text_offset.x,
        c.text_offset.y,
        u8::from(c.mirrored),
        c.rotation
    );
    for p in &c.properties {
        line.push_str(&format!(" {} {}", quote(&p.value), u8::from(p.display)));
    }
    line.push_str(">\n");
    line
}

fn wire_line(w: &Wire, label: Option<&Label>) -> String {
    match label {
        Some(l) => {
            let delta = if w.is_horizontal() {
                l.anchor.x - w.start.x
            } else {
                l.anchor.y - w.start.y
            };
            format!(
                "  <{} {} {} {} {} {} {} {} {}>\n",
                w.start.x,
                w.start.y,
                w.end.x,
                w.end.y,
                quote(&l.text),
                l.text_position.x,
                l.text_position.y,
                delta,
                quote(&l.initial)
            )
        }
        None => format!(
            "  <{} {} {} {} \"\" 0 0 0 \"\">\n",
            w.start.x, w.start.y, w.end.x, w.end.y
        ),
    }
}

fn node_label_line(l: &Label) -> String {
    format!(
        "  <{} {} {} {} {} {} {} 0 {}>\n",
        l.anchor.x,
        l.anchor.y,
        l.anchor.x,
        l.anchor.y,
        quote(&l.text),
        l.text_position.x,
        l.text_position.y,
        quote(&l.initial)
    )
}

fn diagram_lines(d: &Diagram) -> String {
    let mut out = format!(
        "  <{} {} {} {} {}{}>\n",
        d.kind,
        d.position.x,
        d.position.y,
        d.width,
        d.height,
        join(&d.fields)
    );
    for t in &d.traces {
        out.push_str(&format!("    <{}{}>\n", quote(&t.variable), join(&t.fields)));
    }
    for extra in &d.extra {
        out.push_str(&format!("    {}\n", extra));
    }
    out.push_str(&format!("  </{}>\n", d.kind));
    out
}

fn painting_line(p: &Painting) -> String {
    format!(
        "  <{} {} {}{}>\n",
        p.kind,
        p.position.x,
        p.position.y,
        join(&p.fields)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Component;
    use crate::format::{read_exchange, read_schematic, SubcircuitResolver};
    use crate::geometry::Point;
    use crate::library::lookup;

    fn resolver() -> SubcircuitResolver {
        SubcircuitResolver::new(None, "0.0.19")
    }

    #[test]
    fn test_written_document_reads_back() {
        let mut g = Graph::new();
        g.append(Component::from_model(lookup("R").unwrap(), "R1", Point::new(200, 100)));
        let w = g.append(Wire::new(Point::new(100, 100), Point::new(170, 100)));
        g.append(Label::new("in", Point::new(130, 100), Point::new(130, 80)).on_wire(w));
        g.append(Label::new("gnd", Point::new(50, 50), Point::new(60, 40)));
        let props = DocumentProperties {
            data_set: Some("amp.dat".to_string()),
            ..Default::default()
        };

        let text = write_schematic("0.0.19", &props, &g, &Graph::new());
        assert!(!text.contains("<Symbol>"));
        let file = read_schematic(&text, "0.0.19", &resolver()).unwrap();
        assert_eq!(file.properties.data_set.as_deref(), Some("amp.dat"));
        assert_eq!(file.schematic.components()[0].name, "R1");
        assert_eq!(file.schematic.labels().len(), 2);
        let wire_label = file.schematic.labels().iter().find(|l| l.wire.is_some()).unwrap();
        assert_eq!(wire_label.anchor, Point::new(130, 100));
    }

    #[test]
    fn test_exchange_holds_only_selection() {
        let mut g = Graph::new();
        let r1 = g.append(Component::from_model(lookup("R").unwrap(), "R1", Point::new(0, 0)));
        g.append(Component::from_model(lookup("C").unwrap(), "C1", Point::new(100, 0)));
        g.set_selected(r1, true);

        let text = write_exchange("0.0.19", &g);
        let pasted = read_exchange(&text, "0.0.19", &resolver()).unwrap();
        assert_eq!(pasted.components().len(), 1);
        assert_eq!(pasted.components()[0].name, "R1");
    }

    #[test]
    fn test_wire_label_without_its_wire_is_not_copied() {
        let mut g = Graph::new();
        let w = g.append(Wire::new(Point::new(0, 0), Point::new(100, 0)));
        let on_wire = g.append(Label::new("in", Point::new(20, 0), Point::new(20, -20)).on_wire(w));
        let node = g.append(Label::new("gnd", Point::new(0, 50), Point::new(10, 40)));
        g.set_selected(on_wire, true);
        g.set_selected(node, true);

        let pasted = read_exchange(&write_exchange("0.0.19", &g), "0.0.19", &resolver()).unwrap();
        assert_eq!(pasted.labels().len(), 1);
        assert_eq!(pasted.labels()[0].text, "gnd");
        assert!(pasted.labels()[0].wire.is_none());
        assert!(pasted.wires().is_empty());
    }
}
