//! The element graph of one view (schematic or symbol) of a document.
//!
//! Elements are kept in per-kind ordered collections, in file order. Nodes
//! are not stored in files; they are maintained from component ports and
//! wire end points as elements come and go.

use std::collections::HashMap;
use std::path::Path;

use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::element::{
    Component, Diagram, Element, ElementId, ElementKind, Label, Node, Painting, Selectable,
    Wire,
};
use crate::geometry::{Point, Rect};
use crate::library::{self, ID_TEXT};

/// Connected set of node points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Net {
    pub name: Option<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    components: Vec<Component>,
    wires: Vec<Wire>,
    nodes: Vec<Node>,
    labels: Vec<Label>,
    diagrams: Vec<Diagram>,
    paintings: Vec<Painting>,
    index: HashMap<ElementId, ElementKind>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no element is placed. Nodes only exist alongside other
    /// elements, so they are not counted separately.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn diagrams(&self) -> &[Diagram] {
        &self.diagrams
    }

    pub fn diagrams_mut(&mut self) -> &mut [Diagram] {
        &mut self.diagrams
    }

    pub fn paintings(&self) -> &[Painting] {
        &self.paintings
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn kind_of(&self, id: ElementId) -> Option<ElementKind> {
        self.index.get(&id).copied()
    }

    pub fn component(&self, id: ElementId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: ElementId) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    /// Copy of one element.
    pub fn element(&self, id: ElementId) -> Option<Element> {
        match self.kind_of(id)? {
            ElementKind::Component => self.component(id).cloned().map(Element::Component),
            ElementKind::Wire => self.wires.iter().find(|e| e.id == id).cloned().map(Element::Wire),
            ElementKind::Node => self.nodes.iter().find(|e| e.id == id).cloned().map(Element::Node),
            ElementKind::Label => self.labels.iter().find(|e| e.id == id).cloned().map(Element::Label),
            ElementKind::Diagram => self
                .diagrams
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .map(Element::Diagram),
            ElementKind::Painting => self
                .paintings
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .map(Element::Painting),
        }
    }

    /// All elements in storage order: components, wires, nodes, labels,
    /// diagrams, paintings.
    pub fn elements(&self) -> Vec<Element> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.components.iter().cloned().map(Element::Component));
        out.extend(self.wires.iter().cloned().map(Element::Wire));
        out.extend(self.nodes.iter().cloned().map(Element::Node));
        out.extend(self.labels.iter().cloned().map(Element::Label));
        out.extend(self.diagrams.iter().cloned().map(Element::Diagram));
        out.extend(self.paintings.iter().cloned().map(Element::Painting));
        out
    }

    pub fn append(&mut self, element: impl Into<Element>) -> ElementId {
        let element = element.into();
        let id = element.id();
        for point in element.connection_points() {
            self.attach(point, id);
        }
        self.index.insert(id, element.kind());
        match element {
            Element::Component(c) => self.components.push(c),
            Element::Wire(w) => self.wires.push(w),
            Element::Node(n) => self.nodes.push(n),
            Element::Label(l) => self.labels.push(l),
            Element::Diagram(d) => self.diagrams.push(d),
            Element::Painting(p) => self.paintings.push(p),
        }
        id
    }

    /// Remove an element. Absent ids are ignored. Removing a wire also drops
    /// the labels anchored to it.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let kind = self.index.remove(&id)?;
        let removed = match kind {
            ElementKind::Component => take(&mut self.components, |e| e.id == id).map(Element::Component),
            ElementKind::Wire => take(&mut self.wires, |e| e.id == id).map(Element::Wire),
            ElementKind::Node => take(&mut self.nodes, |e| e.id == id).map(Element::Node),
            ElementKind::Label => take(&mut self.labels, |e| e.id == id).map(Element::Label),
            ElementKind::Diagram => take(&mut self.diagrams, |e| e.id == id).map(Element::Diagram),
            ElementKind::Painting => take(&mut self.paintings, |e| e.id == id).map(Element::Painting),
        };
        match kind {
            ElementKind::Component => self.detach(id),
            ElementKind::Wire => {
                self.detach(id);
                let orphans: Vec<ElementId> = self
                    .labels
                    .iter()
                    .filter(|l| l.wire == Some(id))
                    .map(|l| l.id)
                    .collect();
                for label in orphans {
                    self.remove(label);
                }
            }
            _ => {}
        }
        removed
    }

    fn attach(&mut self, point: Point, id: ElementId) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.position == point) {
            if !node.connections.contains(&id) {
                node.connections.push(id);
            }
            return;
        }
        let mut node = Node::new(point);
        node.connections.push(id);
        self.index.insert(node.id, ElementKind::Node);
        self.nodes.push(node);
    }

    fn detach(&mut self, id: ElementId) {
        for node in &mut self.nodes {
            node.connections.retain(|c| *c != id);
        }
        let index = &mut self.index;
        self.nodes.retain(|n| {
            if n.connections.is_empty() {
                index.remove(&n.id);
                false
            } else {
                true
            }
        });
    }

    /// Recompute every node from scratch, e.g. after elements were moved.
    pub fn rebuild_nodes(&mut self) {
        for node in self.nodes.drain(..) {
            self.index.remove(&node.id);
        }
        let mut points: Vec<(Point, ElementId)> = Vec::new();
        for c in &self.components {
            points.extend(c.ports().into_iter().map(|p| (p, c.id)));
        }
        for w in &self.wires {
            points.push((w.start, w.id));
            points.push((w.end, w.id));
        }
        for (point, id) in points {
            self.attach(point, id);
        }
    }

    pub fn node_at(&self, point: Point) -> Option<&Node> {
        self.nodes.iter().find(|n| n.position == point)
    }

    pub fn connections_at(&self, point: Point) -> &[ElementId] {
        self.node_at(point)
            .map(|n| n.connections.as_slice())
            .unwrap_or(&[])
    }

    /// Groups of nodes joined by wires. A net takes the name of the first
    /// label found on it.
    pub fn nets(&self) -> Vec<Net> {
        let position: HashMap<Point, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.position, i))
            .collect();
        let mut sets = UnionFind::<usize>::new(self.nodes.len());
        for w in &self.wires {
            if let (Some(&a), Some(&b)) = (position.get(&w.start), position.get(&w.end)) {
                sets.union(a, b);
            }
        }

        let mut groups: Vec<(usize, Net)> = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let root = sets.find(i);
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, net)) => net.points.push(node.position),
                None => groups.push((
                    root,
                    Net {
                        name: None,
                        points: vec![node.position],
                    },
                )),
            }
        }

        for label in &self.labels {
            let anchor = match label.wire {
                Some(wire) => self.wires.iter().find(|w| w.id == wire).map(|w| w.start),
                None => Some(label.anchor),
            };
            let Some(&node) = anchor.and_then(|p| position.get(&p)) else {
                continue;
            };
            let root = sets.find(node);
            if let Some((_, net)) = groups.iter_mut().find(|(r, _)| *r == root) {
                if net.name.is_none() {
                    net.name = Some(label.text.clone());
                }
            }
        }

        groups.into_iter().map(|(_, net)| net).collect()
    }

    pub fn set_selected(&mut self, id: ElementId, selected: bool) -> bool {
        match self.kind_of(id) {
            Some(ElementKind::Component) => set_flag(&mut self.components, id, selected),
            Some(ElementKind::Wire) => set_flag(&mut self.wires, id, selected),
            Some(ElementKind::Node) => set_flag(&mut self.nodes, id, selected),
            Some(ElementKind::Label) => set_flag(&mut self.labels, id, selected),
            Some(ElementKind::Diagram) => set_flag(&mut self.diagrams, id, selected),
            Some(ElementKind::Painting) => set_flag(&mut self.paintings, id, selected),
            None => false,
        }
    }

    /// Select every element lying completely inside `area`.
    pub fn select_area(&mut self, area: Rect) -> usize {
        let hits: Vec<ElementId> = self
            .elements()
            .into_iter()
            .filter(|e| !matches!(e, Element::Node(_)) && area.encloses(&e.bounds()))
            .map(|e| e.id())
            .collect();
        for id in &hits {
            self.set_selected(*id, true);
        }
        hits.len()
    }

    pub fn deselect_all(&mut self) {
        clear_flags(&mut self.components);
        clear_flags(&mut self.wires);
        clear_flags(&mut self.nodes);
        clear_flags(&mut self.labels);
        clear_flags(&mut self.diagrams);
        clear_flags(&mut self.paintings);
    }

    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.elements()
            .into_iter()
            .filter(|e| e.is_selected())
            .map(|e| e.id())
            .collect()
    }

    /// Move every selected element. Labels follow their wire.
    pub fn translate_selected(&mut self, dx: i32, dy: i32) -> usize {
        let mut moved = 0;
        let mut moved_wires = Vec::new();
        for c in self.components.iter_mut().filter(|c| c.selected) {
            c.center = c.center.translated(dx, dy);
            moved += 1;
        }
        for w in self.wires.iter_mut().filter(|w| w.selected) {
            w.start = w.start.translated(dx, dy);
            w.end = w.end.translated(dx, dy);
            moved_wires.push(w.id);
            moved += 1;
        }
        for l in &mut self.labels {
            let follows = l.wire.map(|w| moved_wires.contains(&w)).unwrap_or(false);
            if l.selected || follows {
                l.anchor = l.anchor.translated(dx, dy);
                l.text_position = l.text_position.translated(dx, dy);
                if l.selected {
                    moved += 1;
                }
            }
        }
        for d in self.diagrams.iter_mut().filter(|d| d.selected) {
            d.position = d.position.translated(dx, dy);
            moved += 1;
        }
        for p in self.paintings.iter_mut().filter(|p| p.selected) {
            p.position = p.position.translated(dx, dy);
            moved += 1;
        }
        if moved > 0 {
            self.rebuild_nodes();
        }
        moved
    }

    /// Change a component property, or a label's `Name`/`Initial`.
    pub fn set_property(&mut self, id: ElementId, name: &str, value: &str) -> bool {
        match self.kind_of(id) {
            Some(ElementKind::Component) => self
                .component_mut(id)
                .map(|c| c.set_property(name, value))
                .unwrap_or(false),
            Some(ElementKind::Label) => {
                let Some(label) = self.labels.iter_mut().find(|l| l.id == id) else {
                    return false;
                };
                match name {
                    "Name" => label.text = value.to_string(),
                    "Initial" => label.initial = value.to_string(),
                    _ => return false,
                }
                true
            }
            _ => false,
        }
    }

    /// Subcircuit instances referencing `path`, by full path or by bare file
    /// name. Same-named files in different directories both match.
    pub fn find_by_file_reference(&self, path: &Path) -> Vec<ElementId> {
        let full = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.components
            .iter()
            .rev()
            .filter(|c| {
                c.file_reference()
                    .map(|f| f == full || (!name.is_empty() && f == name))
                    .unwrap_or(false)
            })
            .map(|c| c.id)
            .collect()
    }

    /// Rebuild a subcircuit instance for a new port count. The element keeps
    /// its id, placement and properties and moves to the end of the
    /// component list.
    pub fn recreate_component(&mut self, id: ElementId, port_count: usize) -> bool {
        let is_sub = self.component(id).map(|c| c.is_subcircuit()).unwrap_or(false);
        if !is_sub {
            return false;
        }
        match self.remove(id) {
            Some(Element::Component(mut comp)) => {
                comp.set_port_count(port_count);
                self.append(comp);
                true
            }
            _ => false,
        }
    }

    /// Smallest rectangle around every element, `Rect::EMPTY` when empty.
    pub fn bounding_extent(&self) -> Rect {
        self.elements()
            .iter()
            .fold(Rect::EMPTY, |acc, e| acc.union(&e.bounds()))
    }

    /// Number of subcircuit ports placed in this graph. Ports sharing a
    /// number count once.
    pub fn port_count(&self) -> usize {
        self.port_numbers().len()
    }

    /// Distinct port numbers, sorted. A port without a readable `Num` takes
    /// its position among the ports.
    pub fn port_numbers(&self) -> Vec<usize> {
        let mut numbers: Vec<usize> = self
            .components
            .iter()
            .filter(|c| c.is_port())
            .enumerate()
            .map(|(i, c)| c.port_number().unwrap_or(i + 1))
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    /// Make the symbol pins of this (symbol) graph match the ports of
    /// `schematic`: pins of vanished ports go, missing pins are added in the
    /// default layout. Returns the port count.
    pub fn adjust_port_numbers(&mut self, schematic: &Graph) -> usize {
        let numbers = schematic.port_numbers();

        let stale: Vec<ElementId> = self
            .paintings
            .iter()
            .filter(|p| p.is_port_symbol())
            .filter(|p| p.port_number().map(|n| !numbers.contains(&n)).unwrap_or(true))
            .map(|p| p.id)
            .collect();
        for id in stale {
            self.remove(id);
        }

        let layout = library::subcircuit_pin_layout(numbers.len());
        for (slot, number) in numbers.iter().enumerate() {
            let present = self
                .paintings
                .iter()
                .any(|p| p.port_number() == Some(*number));
            if !present {
                self.append(Painting::port_symbol(*number, layout[slot]));
            }
        }
        numbers.len()
    }

    /// Draw the default box symbol around `port_count` pins. Only meant for a
    /// symbol graph that holds nothing but its pins.
    pub fn build_default_symbol(&mut self, port_count: usize) {
        let h = 30 * ((port_count as i32 - 1) / 2) + 10;
        let id_text = Painting::new(ID_TEXT, Point::new(-20, h + 4), vec!["\"SUB\"".to_string()]);
        self.index.insert(id_text.id, ElementKind::Painting);
        self.paintings.insert(0, id_text);

        self.append(Painting::line(Point::new(-20, -h), 40, 0));
        self.append(Painting::line(Point::new(20, -h), 0, 2 * h));
        self.append(Painting::line(Point::new(-20, h), 40, 0));
        self.append(Painting::line(Point::new(-20, -h), 0, 2 * h));

        let layout = library::subcircuit_pin_layout(port_count);
        let mut pins: Vec<&mut Painting> = self
            .paintings
            .iter_mut()
            .filter(|p| p.is_port_symbol())
            .collect();
        pins.sort_by_key(|p| p.port_number().unwrap_or(usize::MAX));
        let mut stubs = Vec::new();
        for (pin, position) in pins.into_iter().zip(layout) {
            pin.position = position;
            let stub_x = if position.x < 0 { -30 } else { 20 };
            stubs.push(Painting::line(Point::new(stub_x, position.y), 10, 0));
        }
        for stub in stubs {
            self.append(stub);
        }
    }

    /// Move every element of `other` into this graph, optionally selected.
    /// Ids are kept. Returns the ids of the moved elements.
    pub fn absorb(&mut self, other: Graph, select: bool) -> Vec<ElementId> {
        let mut moved = Vec::with_capacity(other.len());
        for mut element in other.elements() {
            if matches!(element, Element::Node(_)) {
                continue;
            }
            element.set_selected(select);
            moved.push(self.append(element));
        }
        moved
    }
}

fn take<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    let pos = items.iter().position(pred)?;
    Some(items.remove(pos))
}

fn set_flag<T: Selectable>(items: &mut [T], id: ElementId, value: bool) -> bool {
    match items.iter_mut().find(|e| e.element_id() == id) {
        Some(e) => {
            e.set_selected(value);
            true
        }
        None => false,
    }
}

fn clear_flags<T: Selectable>(items: &mut [T]) {
    items.iter_mut().for_each(|e| e.set_selected(false));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::lookup;

    fn resistor(name: &str, x: i32, y: i32) -> Component {
        Component::from_model(lookup("R").unwrap(), name, Point::new(x, y))
    }

    fn port(num: usize, x: i32, y: i32) -> Component {
        let mut p = Component::from_model(lookup("Port").unwrap(), format!("P{}", num), Point::new(x, y));
        p.set_property("Num", &num.to_string());
        p
    }

    #[test]
    fn test_empty_extent_is_sentinel() {
        assert_eq!(Graph::new().bounding_extent(), Rect::EMPTY);
    }

    #[test]
    fn test_extent_of_single_element() {
        let mut g = Graph::new();
        g.append(Wire::new(Point::new(10, 20), Point::new(90, 20)));
        assert_eq!(g.bounding_extent(), Rect::new(10, 20, 90, 20));
    }

    #[test]
    fn test_wire_and_resistor_share_node() {
        let mut g = Graph::new();
        let r = g.append(resistor("R1", 100, 100));
        let w = g.append(Wire::new(Point::new(130, 100), Point::new(200, 100)));
        let at = g.connections_at(Point::new(130, 100));
        assert_eq!(at, &[r, w]);
        assert_eq!(g.nodes().len(), 3);

        g.remove(r);
        assert_eq!(g.connections_at(Point::new(130, 100)), &[w]);
        assert_eq!(g.nodes().len(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut g = Graph::new();
        g.append(resistor("R1", 0, 0));
        let before = g.len();
        assert!(g.remove(ElementId::new()).is_none());
        assert_eq!(g.len(), before);
    }

    #[test]
    fn test_removing_wire_drops_its_label() {
        let mut g = Graph::new();
        let w = g.append(Wire::new(Point::new(0, 0), Point::new(50, 0)));
        let l = g.append(Label::new("out", Point::new(20, 0), Point::new(20, -20)).on_wire(w));
        g.remove(w);
        assert!(!g.contains(l));
    }

    #[test]
    fn test_nets_follow_wires_and_labels() {
        let mut g = Graph::new();
        let w = g.append(Wire::new(Point::new(0, 0), Point::new(50, 0)));
        g.append(Wire::new(Point::new(50, 0), Point::new(50, 50)));
        g.append(Wire::new(Point::new(200, 0), Point::new(250, 0)));
        g.append(Label::new("vin", Point::new(10, 0), Point::new(10, -20)).on_wire(w));

        let nets = g.nets();
        assert_eq!(nets.len(), 2);
        let named = nets.iter().find(|n| n.name.as_deref() == Some("vin")).unwrap();
        assert_eq!(named.points.len(), 3);
    }

    #[test]
    fn test_recreate_keeps_placement_and_properties() {
        let mut g = Graph::new();
        let mut sub = Component::subcircuit("SUB1", Point::new(300, 200), "amp.sch", 2);
        sub.rotation = 1;
        sub.properties[0].display = false;
        let id = g.append(sub.clone());
        g.append(resistor("R1", 0, 0));

        assert!(g.recreate_component(id, 3));
        let rebuilt = g.component(id).unwrap();
        assert_eq!(rebuilt.center, sub.center);
        assert_eq!(rebuilt.rotation, 1);
        assert_eq!(rebuilt.properties, sub.properties);
        assert_eq!(rebuilt.port_count(), 3);
        assert_eq!(g.components().last().map(|c| c.id), Some(id));
        for p in rebuilt.ports() {
            assert_eq!(g.connections_at(p), &[id]);
        }
    }

    #[test]
    fn test_recreate_rejects_plain_components() {
        let mut g = Graph::new();
        let id = g.append(resistor("R1", 0, 0));
        assert!(!g.recreate_component(id, 3));
        assert!(g.contains(id));
    }

    #[test]
    fn test_find_by_file_reference_matches_path_or_name() {
        let mut g = Graph::new();
        let a = g.append(Component::subcircuit("SUB1", Point::new(0, 0), "/proj/amp.sch", 2));
        let b = g.append(Component::subcircuit("SUB2", Point::new(100, 0), "amp.sch", 2));
        g.append(Component::subcircuit("SUB3", Point::new(200, 0), "filter.sch", 2));

        let mut found = g.find_by_file_reference(Path::new("/proj/amp.sch"));
        found.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_adjust_port_numbers_adds_and_removes_pins() {
        let mut schematic = Graph::new();
        schematic.append(port(1, 0, 0));
        schematic.append(port(2, 0, 100));

        let mut symbol = Graph::new();
        symbol.append(Painting::port_symbol(1, Point::new(-30, 0)));
        symbol.append(Painting::port_symbol(7, Point::new(30, 0)));

        assert_eq!(symbol.adjust_port_numbers(&schematic), 2);
        let mut numbers: Vec<usize> = symbol.paintings().iter().filter_map(|p| p.port_number()).collect();
        numbers.sort();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_shared_port_number_counts_once() {
        let mut schematic = Graph::new();
        schematic.append(port(1, 0, 0));
        schematic.append(port(1, 0, 100));
        assert_eq!(schematic.port_count(), 1);

        let mut symbol = Graph::new();
        assert_eq!(symbol.adjust_port_numbers(&schematic), schematic.port_count());
        assert_eq!(symbol.paintings().len(), 1);
    }

    #[test]
    fn test_default_symbol_places_pins() {
        let mut schematic = Graph::new();
        for i in 1..=3 {
            schematic.append(port(i, 0, 100 * i as i32));
        }
        let mut symbol = Graph::new();
        let count = symbol.adjust_port_numbers(&schematic);
        symbol.build_default_symbol(count);

        assert_eq!(symbol.paintings()[0].kind, ID_TEXT);
        let pin3 = symbol.paintings().iter().find(|p| p.port_number() == Some(3)).unwrap();
        assert_eq!(pin3.position, Point::new(-30, 30));
        // id text, four box lines, three pins, three stubs
        assert_eq!(symbol.paintings().len(), 11);
    }

    #[test]
    fn test_translate_selected_rebuilds_nodes() {
        let mut g = Graph::new();
        let r = g.append(resistor("R1", 0, 0));
        g.set_selected(r, true);
        assert_eq!(g.translate_selected(10, 0), 1);
        assert_eq!(g.connections_at(Point::new(40, 0)), &[r]);
        assert!(g.node_at(Point::new(30, 0)).is_none());
    }
}
