use ratatui::style::Color;

// Origin top-left with y down; angles are radians clockwise from +x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn polar(self, radius: f64, angle: f64) -> Self {
        Self {
            x: self.x + angle.cos() * radius,
            y: self.y + angle.sin() * radius,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        from: Point,
        to: Point,
        start: Color,
        end: Color,
    },
    Radial {
        center: Point,
        inner: f64,
        outer: f64,
        start: Color,
        end: Color,
    },
}

impl Paint {
    pub fn color_at(&self, p: Point) -> Color {
        match *self {
            Paint::Solid(color) => color,
            Paint::Linear {
                from,
                to,
                start,
                end,
            } => {
                let (dx, dy) = (to.x - from.x, to.y - from.y);
                let len_sq = dx * dx + dy * dy;
                if len_sq == 0.0 {
                    return start;
                }
                let t = ((p.x - from.x) * dx + (p.y - from.y) * dy) / len_sq;
                lerp_color(start, end, t)
            }
            Paint::Radial {
                center,
                inner,
                outer,
                start,
                end,
            } => {
                if outer <= inner {
                    return start;
                }
                let t = (center.distance(p) - inner) / (outer - inner);
                lerp_color(start, end, t)
            }
        }
    }
}

pub fn lerp_color(a: Color, b: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ if t < 0.5 => a,
        _ => b,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f64,
    pub cap: LineCap,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            paint: Paint::Solid(color),
            width,
            cap: LineCap::Butt,
        }
    }

    pub fn round(mut self) -> Self {
        self.cap = LineCap::Round;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub opacity: f64,
    pub blur: f64,
    pub offset: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        stroke: Stroke,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
        shadow: Option<Shadow>,
    },
    Disc {
        center: Point,
        radius: f64,
        fill: Color,
        stroke: Option<Stroke>,
    },
    Text {
        at: Point,
        text: String,
        size: f64,
        bold: bool,
        color: Color,
    },
}

pub trait Surface {
    fn draw(&mut self, op: DrawOp);
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }
}

impl Surface for RecordingSurface {
    fn draw(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}
