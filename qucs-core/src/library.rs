//! Built-in component models.
//!
//! A schematic line only stores a model name, a placement and the property
//! values. Everything else (property names, editing hints, body outline and
//! port offsets) comes from this table. Models not listed here are still
//! loaded and saved unchanged; they just have no ports.

use crate::element::PropertyKind;
use crate::geometry::{Point, Rect};

pub const SUBCIRCUIT_MODEL: &str = "Sub";
pub const PORT_MODEL: &str = "Port";
pub const PORT_SYMBOL: &str = ".PortSym";
pub const ID_TEXT: &str = ".ID";

/// Static description of a component model.
#[derive(Debug)]
pub struct ModelInfo {
    pub model: &'static str,
    /// Instance name prefix used when placing a new component (`R` -> `R1`).
    pub prefix: &'static str,
    pub description: &'static str,
    /// (name, default value, editing hint, shown on schematic)
    pub properties: &'static [(&'static str, &'static str, PropertyKind, bool)],
    pub body: Rect,
    pub ports: &'static [Point],
}

const TWO_TERMINAL_H: &[Point] = &[Point::new(-30, 0), Point::new(30, 0)];
const TWO_TERMINAL_V: &[Point] = &[Point::new(0, -30), Point::new(0, 30)];
const SINGLE: &[Point] = &[Point::new(0, 0)];
const NONE: &[Point] = &[];

static MODELS: &[ModelInfo] = &[
    ModelInfo {
        model: "R",
        prefix: "R",
        description: "resistor",
        properties: &[
            ("R", "50 Ohm", PropertyKind::Number, true),
            ("Temp", "26.85", PropertyKind::Number, false),
        ],
        body: Rect::new(-30, -11, 30, 11),
        ports: TWO_TERMINAL_H,
    },
    ModelInfo {
        model: "C",
        prefix: "C",
        description: "capacitor",
        properties: &[("C", "1 pF", PropertyKind::Number, true)],
        body: Rect::new(-30, -13, 30, 13),
        ports: TWO_TERMINAL_H,
    },
    ModelInfo {
        model: "L",
        prefix: "L",
        description: "inductor",
        properties: &[("L", "1 nH", PropertyKind::Number, true)],
        body: Rect::new(-30, -10, 30, 6),
        ports: TWO_TERMINAL_H,
    },
    ModelInfo {
        model: "GND",
        prefix: "*",
        description: "ground",
        properties: &[],
        body: Rect::new(-11, 0, 11, 17),
        ports: SINGLE,
    },
    ModelInfo {
        model: PORT_MODEL,
        prefix: "P",
        description: "subcircuit port",
        properties: &[
            ("Num", "1", PropertyKind::Number, true),
            ("Type", "analog", PropertyKind::Choice, false),
        ],
        body: Rect::new(-27, -8, 0, 8),
        ports: SINGLE,
    },
    ModelInfo {
        model: "Vdc",
        prefix: "V",
        description: "dc voltage source",
        properties: &[("U", "1 V", PropertyKind::Number, true)],
        body: Rect::new(-14, -30, 14, 30),
        ports: TWO_TERMINAL_V,
    },
    ModelInfo {
        model: "Idc",
        prefix: "I",
        description: "dc current source",
        properties: &[("I", "1 mA", PropertyKind::Number, true)],
        body: Rect::new(-14, -30, 14, 30),
        ports: TWO_TERMINAL_V,
    },
    ModelInfo {
        model: "Vac",
        prefix: "V",
        description: "ac voltage source",
        properties: &[
            ("U", "1 V", PropertyKind::Number, true),
            ("f", "1 GHz", PropertyKind::Number, false),
        ],
        body: Rect::new(-14, -30, 14, 30),
        ports: TWO_TERMINAL_V,
    },
    ModelInfo {
        model: "Pac",
        prefix: "P",
        description: "power source",
        properties: &[
            ("Num", "1", PropertyKind::Number, true),
            ("Z", "50 Ohm", PropertyKind::Number, true),
        ],
        body: Rect::new(-14, -30, 14, 30),
        ports: TWO_TERMINAL_V,
    },
    ModelInfo {
        model: SUBCIRCUIT_MODEL,
        prefix: "SUB",
        description: "subcircuit",
        properties: &[("File", "", PropertyKind::File, true)],
        body: Rect::new(-20, -10, 20, 10),
        ports: NONE,
    },
    ModelInfo {
        model: ".DC",
        prefix: "DC",
        description: "dc simulation",
        properties: &[("Temp", "26.85", PropertyKind::Number, false)],
        body: Rect::new(0, 0, 100, 30),
        ports: NONE,
    },
    ModelInfo {
        model: ".AC",
        prefix: "AC",
        description: "ac simulation",
        properties: &[
            ("Type", "lin", PropertyKind::Choice, true),
            ("Start", "1 GHz", PropertyKind::Number, true),
            ("Stop", "10 GHz", PropertyKind::Number, true),
            ("Points", "19", PropertyKind::Number, true),
        ],
        body: Rect::new(0, 0, 100, 70),
        ports: NONE,
    },
    ModelInfo {
        model: ".SP",
        prefix: "SP",
        description: "s-parameter simulation",
        properties: &[
            ("Type", "lin", PropertyKind::Choice, true),
            ("Start", "1 GHz", PropertyKind::Number, true),
            ("Stop", "10 GHz", PropertyKind::Number, true),
            ("Points", "19", PropertyKind::Number, true),
        ],
        body: Rect::new(0, 0, 100, 70),
        ports: NONE,
    },
];

pub fn lookup(model: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.model == model)
}

pub fn models() -> impl Iterator<Item = &'static ModelInfo> {
    MODELS.iter()
}

/// Half height of the default subcircuit box for `count` ports.
fn box_half_height(count: usize) -> i32 {
    let count = count as i32;
    30 * ((count - 1) / 2) + 10
}

/// Pin positions of a subcircuit symbol: odd pins on the left, even pins on
/// the right, one row every 60 units.
pub fn subcircuit_pin_layout(count: usize) -> Vec<Point> {
    let h = box_half_height(count);
    let mut pins = Vec::with_capacity(count);
    let mut y = 10 - h;
    while pins.len() < count {
        pins.push(Point::new(-30, y));
        if pins.len() == count {
            break;
        }
        pins.push(Point::new(30, y));
        y += 60;
    }
    pins
}

/// Body outline of the default subcircuit symbol, pins included.
pub fn subcircuit_body(count: usize) -> Rect {
    let h = box_half_height(count);
    if count == 0 {
        Rect::new(-20, -h, 20, h)
    } else {
        Rect::new(-30, -h, 30, h)
    }
}
