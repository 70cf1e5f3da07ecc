//! Elements of a schematic or symbol graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Rect};
use crate::library::{self, ModelInfo, PORT_MODEL, PORT_SYMBOL, SUBCIRCUIT_MODEL};

/// Identity of an element inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editing hint for a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Text,
    Number,
    File,
    Choice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
    /// Shown next to the component on the schematic.
    pub display: bool,
    pub kind: PropertyKind,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            display: false,
            kind,
        }
    }

    pub fn shown(mut self) -> Self {
        self.display = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Component,
    Wire,
    Node,
    Label,
    Diagram,
    Painting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ElementId,
    pub model: String,
    pub name: String,
    pub active: bool,
    pub center: Point,
    /// Position of the name/property text relative to the centre.
    pub text_offset: Point,
    pub mirrored: bool,
    /// Quarter turns, 0..=3.
    pub rotation: u8,
    pub properties: Vec<Property>,
    pub selected: bool,
    /// Port offsets before mirroring and rotation.
    port_offsets: Vec<Point>,
    body: Rect,
}

impl Component {
    /// A fresh component of a library model with default property values.
    pub fn from_model(info: &ModelInfo, name: impl Into<String>, center: Point) -> Self {
        let properties = info
            .properties
            .iter()
            .map(|(n, v, kind, display)| Property {
                name: n.to_string(),
                value: v.to_string(),
                display: *display,
                kind: *kind,
            })
            .collect();
        Self {
            id: ElementId::new(),
            model: info.model.to_string(),
            name: name.into(),
            active: true,
            center,
            text_offset: Point::new(-26, 15),
            mirrored: false,
            rotation: 0,
            properties,
            selected: false,
            port_offsets: info.ports.to_vec(),
            body: info.body,
        }
    }

    /// A component for a model that is not in the library. It keeps its
    /// property values but has no ports.
    pub fn unknown(model: impl Into<String>, name: impl Into<String>, center: Point) -> Self {
        Self {
            id: ElementId::new(),
            model: model.into(),
            name: name.into(),
            active: true,
            center,
            text_offset: Point::new(-26, 15),
            mirrored: false,
            rotation: 0,
            properties: Vec::new(),
            selected: false,
            port_offsets: Vec::new(),
            body: Rect::new(-10, -10, 10, 10),
        }
    }

    /// A subcircuit instance referencing `file` with `port_count` pins.
    pub fn subcircuit(name: impl Into<String>, center: Point, file: &str, port_count: usize) -> Self {
        let mut comp = Self::unknown(SUBCIRCUIT_MODEL, name, center);
        comp.properties
            .push(Property::new("File", file, PropertyKind::File).shown());
        comp.set_port_count(port_count);
        comp
    }

    pub fn is_subcircuit(&self) -> bool {
        self.model == SUBCIRCUIT_MODEL
    }

    pub fn is_port(&self) -> bool {
        self.model == PORT_MODEL
    }

    /// File referenced by a subcircuit instance (first property).
    pub fn file_reference(&self) -> Option<&str> {
        if !self.is_subcircuit() {
            return None;
        }
        self.properties.first().map(|p| p.value.as_str())
    }

    /// Number of a subcircuit port, from its `Num` property.
    pub fn port_number(&self) -> Option<usize> {
        if !self.is_port() {
            return None;
        }
        self.property("Num").and_then(|v| v.trim().parse().ok())
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Returns false when the component has no property of that name.
    pub fn set_property(&mut self, name: &str, value: &str) -> bool {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Re-derive the pin geometry of a subcircuit for `count` ports.
    pub fn set_port_count(&mut self, count: usize) {
        self.port_offsets = library::subcircuit_pin_layout(count);
        self.body = library::subcircuit_body(count);
    }

    pub fn port_count(&self) -> usize {
        self.port_offsets.len()
    }

    fn transform(&self, offset: Point) -> Point {
        let p = if self.mirrored { offset.mirrored_x() } else { offset };
        let p = p.rotated(self.rotation);
        p.translated(self.center.x, self.center.y)
    }

    /// Absolute port positions.
    pub fn ports(&self) -> Vec<Point> {
        self.port_offsets.iter().map(|p| self.transform(*p)).collect()
    }

    pub fn bounds(&self) -> Rect {
        let a = self.transform(Point::new(self.body.x1, self.body.y1));
        let b = self.transform(Point::new(self.body.x2, self.body.y2));
        let mut r = Rect::from_points(a, b);
        for p in self.ports() {
            r.include(p);
        }
        r
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: ElementId,
    pub start: Point,
    pub end: Point,
    pub selected: bool,
}

impl Wire {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: ElementId::new(),
            start,
            end,
            selected: false,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    pub fn contains(&self, p: Point) -> bool {
        Rect::from_points(self.start, self.end).contains(p)
            && (self.start.x == self.end.x || self.start.y == self.end.y)
    }
}

/// Connection point where ports and wire ends meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: ElementId,
    pub position: Point,
    pub connections: Vec<ElementId>,
    pub selected: bool,
}

impl Node {
    pub fn new(position: Point) -> Self {
        Self {
            id: ElementId::new(),
            position,
            connections: Vec::new(),
            selected: false,
        }
    }
}

/// Net name attached to a wire, or standing alone on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: ElementId,
    pub text: String,
    pub anchor: Point,
    pub text_position: Point,
    pub wire: Option<ElementId>,
    pub initial: String,
    pub selected: bool,
}

impl Label {
    pub fn new(text: impl Into<String>, anchor: Point, text_position: Point) -> Self {
        Self {
            id: ElementId::new(),
            text: text.into(),
            anchor,
            text_position,
            wire: None,
            initial: String::new(),
            selected: false,
        }
    }

    pub fn on_wire(mut self, wire: ElementId) -> Self {
        self.wire = Some(wire);
        self
    }
}

/// Complex sample from a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

/// One curve of a diagram, bound to a dataset variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub variable: String,
    /// Remaining fields of the trace line, kept verbatim.
    pub fields: Vec<String>,
    /// (x, y) samples filled in by a results reload.
    #[serde(default)]
    pub samples: Vec<(f64, Complex)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub id: ElementId,
    pub kind: String,
    /// Lower left corner.
    pub position: Point,
    pub width: i32,
    pub height: i32,
    pub fields: Vec<String>,
    pub traces: Vec<Trace>,
    /// Nested lines other than traces (markers etc.), kept verbatim.
    pub extra: Vec<String>,
    pub selected: bool,
}

impl Diagram {
    pub fn new(kind: impl Into<String>, position: Point, width: i32, height: i32) -> Self {
        Self {
            id: ElementId::new(),
            kind: kind.into(),
            position,
            width,
            height,
            fields: Vec::new(),
            traces: Vec::new(),
            extra: Vec::new(),
            selected: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y - self.height,
            self.position.x + self.width,
            self.position.y,
        )
    }
}

/// Free graphics: lines, texts, symbol pins and the symbol id text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Painting {
    pub id: ElementId,
    pub kind: String,
    pub position: Point,
    pub fields: Vec<String>,
    pub selected: bool,
}

impl Painting {
    pub fn new(kind: impl Into<String>, position: Point, fields: Vec<String>) -> Self {
        Self {
            id: ElementId::new(),
            kind: kind.into(),
            position,
            fields,
            selected: false,
        }
    }

    pub fn port_symbol(number: usize, position: Point) -> Self {
        Self::new(PORT_SYMBOL, position, vec![number.to_string()])
    }

    pub fn line(from: Point, dx: i32, dy: i32) -> Self {
        Self::new(
            "Line",
            from,
            vec![
                dx.to_string(),
                dy.to_string(),
                "#000080".to_string(),
                "2".to_string(),
                "1".to_string(),
            ],
        )
    }

    pub fn is_port_symbol(&self) -> bool {
        self.kind == PORT_SYMBOL
    }

    /// Port number of a symbol pin.
    pub fn port_number(&self) -> Option<usize> {
        if !self.is_port_symbol() {
            return None;
        }
        self.fields.first().and_then(|f| f.parse().ok())
    }

    fn extent(&self) -> Option<(i32, i32)> {
        match self.kind.as_str() {
            "Line" | "Arrow" | "Rectangle" | "Ellipse" | "Arc" | "EArc" => {
                let dx = self.fields.first()?.parse().ok()?;
                let dy = self.fields.get(1)?.parse().ok()?;
                Some((dx, dy))
            }
            _ => None,
        }
    }

    pub fn bounds(&self) -> Rect {
        match self.extent() {
            Some((dx, dy)) => Rect::from_points(self.position, self.position.translated(dx, dy)),
            None => Rect::from_points(self.position, self.position),
        }
    }
}

/// Shared selection access for the per-kind element collections.
pub trait Selectable {
    fn element_id(&self) -> ElementId;
    fn selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);
}

macro_rules! impl_selectable {
    ($($ty:ty),*) => {
        $(impl Selectable for $ty {
            fn element_id(&self) -> ElementId {
                self.id
            }

            fn selected(&self) -> bool {
                self.selected
            }

            fn set_selected(&mut self, selected: bool) {
                self.selected = selected;
            }
        })*
    };
}

impl_selectable!(Component, Wire, Node, Label, Diagram, Painting);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Component(Component),
    Wire(Wire),
    Node(Node),
    Label(Label),
    Diagram(Diagram),
    Painting(Painting),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Component(c) => c.id,
            Element::Wire(w) => w.id,
            Element::Node(n) => n.id,
            Element::Label(l) => l.id,
            Element::Diagram(d) => d.id,
            Element::Painting(p) => p.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Component(_) => ElementKind::Component,
            Element::Wire(_) => ElementKind::Wire,
            Element::Node(_) => ElementKind::Node,
            Element::Label(_) => ElementKind::Label,
            Element::Diagram(_) => ElementKind::Diagram,
            Element::Painting(_) => ElementKind::Painting,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Element::Component(c) => c.center,
            Element::Wire(w) => w.start,
            Element::Node(n) => n.position,
            Element::Label(l) => l.anchor,
            Element::Diagram(d) => d.position,
            Element::Painting(p) => p.position,
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Element::Component(c) => c.bounds(),
            Element::Wire(w) => Rect::from_points(w.start, w.end),
            Element::Node(n) => Rect::from_points(n.position, n.position),
            Element::Label(l) => Rect::from_points(l.anchor, l.text_position),
            Element::Diagram(d) => d.bounds(),
            Element::Painting(p) => p.bounds(),
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            Element::Component(c) => c.selected,
            Element::Wire(w) => w.selected,
            Element::Node(n) => n.selected,
            Element::Label(l) => l.selected,
            Element::Diagram(d) => d.selected,
            Element::Painting(p) => p.selected,
        }
    }

    pub fn set_selected(&mut self, selected: bool) {
        match self {
            Element::Component(c) => c.selected = selected,
            Element::Wire(w) => w.selected = selected,
            Element::Node(n) => n.selected = selected,
            Element::Label(l) => l.selected = selected,
            Element::Diagram(d) => d.selected = selected,
            Element::Painting(p) => p.selected = selected,
        }
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        match self {
            Element::Component(c) => c.center = c.center.translated(dx, dy),
            Element::Wire(w) => {
                w.start = w.start.translated(dx, dy);
                w.end = w.end.translated(dx, dy);
            }
            Element::Node(n) => n.position = n.position.translated(dx, dy),
            Element::Label(l) => {
                l.anchor = l.anchor.translated(dx, dy);
                l.text_position = l.text_position.translated(dx, dy);
            }
            Element::Diagram(d) => d.position = d.position.translated(dx, dy),
            Element::Painting(p) => p.position = p.position.translated(dx, dy),
        }
    }

    /// Editable properties. Components own theirs; labels expose name and
    /// initial value; other elements have none.
    pub fn properties(&self) -> Vec<Property> {
        match self {
            Element::Component(c) => c.properties.clone(),
            Element::Label(l) => vec![
                Property::new("Name", l.text.clone(), PropertyKind::Text).shown(),
                Property::new("Initial", l.initial.clone(), PropertyKind::Number),
            ],
            _ => Vec::new(),
        }
    }

    /// Points where this element connects to nodes.
    pub fn connection_points(&self) -> Vec<Point> {
        match self {
            Element::Component(c) => c.ports(),
            Element::Wire(w) => vec![w.start, w.end],
            _ => Vec::new(),
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Element::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_painting(&self) -> Option<&Painting> {
        match self {
            Element::Painting(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Component> for Element {
    fn from(c: Component) -> Self {
        Element::Component(c)
    }
}

impl From<Wire> for Element {
    fn from(w: Wire) -> Self {
        Element::Wire(w)
    }
}

impl From<Label> for Element {
    fn from(l: Label) -> Self {
        Element::Label(l)
    }
}

impl From<Diagram> for Element {
    fn from(d: Diagram) -> Self {
        Element::Diagram(d)
    }
}

impl From<Painting> for Element {
    fn from(p: Painting) -> Self {
        Element::Painting(p)
    }
}
