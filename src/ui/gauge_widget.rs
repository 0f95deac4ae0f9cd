use crate::gauge::surface::{lerp_color, DrawOp, LineCap, Paint, Point, Stroke};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Context, Line},
        Widget,
    },
};

pub const DOTS_PER_COL: u32 = 2;
pub const DOTS_PER_ROW: u32 = 4;

const MAX_BANDS: usize = 6;

const MIN_TEXT_DOTS: f64 = 3.0;

// Shadows are blended against a white page.
const BACKDROP: Color = Color::Rgb(0xff, 0xff, 0xff);

pub struct GaugeCanvas<'a> {
    ops: &'a [DrawOp],
    side: f64,
}

impl<'a> GaugeCanvas<'a> {
    pub fn new(ops: &'a [DrawOp], side: u32) -> Self {
        Self {
            ops,
            side: side as f64,
        }
    }

    pub fn fit(area: Rect, side: u32) -> Rect {
        let width = ((side / DOTS_PER_COL) as u16).min(area.width);
        let height = ((side / DOTS_PER_ROW) as u16).min(area.height);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Widget for GaugeCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 || self.side <= 0.0 {
            return;
        }

        let side = self.side;
        let cell_width = side / area.width as f64;
        let ops = self.ops;

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, side])
            .y_bounds([0.0, side])
            .paint(|ctx| {
                for op in ops {
                    paint_op(ctx, op, side, cell_width);
                }
            })
            .render(area, buf);
    }
}

// Canvas y grows upward; frames are recorded with y down.
fn flip(p: Point, side: f64) -> (f64, f64) {
    (p.x, side - p.y)
}

fn paint_op(ctx: &mut Context<'_>, op: &DrawOp, side: f64, cell_width: f64) {
    match op {
        DrawOp::Clear => {}
        DrawOp::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            stroke,
        } => paint_arc(ctx, *center, *radius, *start_angle, *end_angle, stroke, side),
        DrawOp::Line {
            from,
            to,
            stroke,
            shadow,
        } => {
            if let Some(shadow) = shadow {
                let offset = |p: Point| Point::new(p.x + shadow.offset.x, p.y + shadow.offset.y);
                let color = lerp_color(BACKDROP, shadow.color, shadow.opacity);
                let blurred = Stroke::solid(color, stroke.width + shadow.blur / 5.0);
                paint_line(ctx, offset(*from), offset(*to), &blurred, side);
            }
            paint_line(ctx, *from, *to, stroke, side);
        }
        DrawOp::Disc {
            center,
            radius,
            fill,
            stroke,
        } => {
            let (x, y) = flip(*center, side);
            let mut r = 0.5;
            while r < *radius {
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: r,
                    color: *fill,
                });
                r += 1.0;
            }
            if let Some(stroke) = stroke {
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: *radius,
                    color: stroke.paint.color_at(*center),
                });
            }
        }
        DrawOp::Text {
            at,
            text,
            size,
            bold,
            color,
        } => {
            if *size < MIN_TEXT_DOTS {
                return;
            }
            let (x, y) = flip(*at, side);
            let half = text.chars().count() as f64 * cell_width / 2.0;
            let mut style = Style::default().fg(*color);
            if *bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            ctx.print(x - half, y, Span::styled(text.clone(), style));
        }
    }
}

fn bands(width: f64) -> Vec<f64> {
    let count = (width.round() as usize).clamp(1, MAX_BANDS);
    if count == 1 {
        return vec![0.0];
    }
    let step = width / (count - 1) as f64;
    (0..count).map(|i| -width / 2.0 + i as f64 * step).collect()
}

fn paint_arc(
    ctx: &mut Context<'_>,
    center: Point,
    radius: f64,
    start: f64,
    end: f64,
    stroke: &Stroke,
    side: f64,
) {
    let span = end - start;
    if span.abs() < f64::EPSILON {
        return;
    }

    for offset in bands(stroke.width) {
        let r = radius + offset;
        let steps = ((span.abs() * r).ceil() as usize).clamp(8, 2048);
        let mut prev = center.polar(r, start);
        for i in 1..=steps {
            let next = center.polar(r, start + span * i as f64 / steps as f64);
            let mid = Point::new((prev.x + next.x) / 2.0, (prev.y + next.y) / 2.0);
            segment(ctx, prev, next, stroke.paint.color_at(mid), side);
            prev = next;
        }
    }

    if stroke.cap == LineCap::Round {
        for angle in [start, end] {
            let tip = center.polar(radius, angle);
            let (x, y) = flip(tip, side);
            ctx.draw(&Circle {
                x,
                y,
                radius: stroke.width / 2.0,
                color: stroke.paint.color_at(tip),
            });
        }
    }
}

fn paint_line(ctx: &mut Context<'_>, from: Point, to: Point, stroke: &Stroke, side: f64) {
    let length = from.distance(to);
    if length == 0.0 {
        return;
    }
    // Unit normal to the segment.
    let (nx, ny) = (-(to.y - from.y) / length, (to.x - from.x) / length);

    for offset in bands(stroke.width) {
        let a = Point::new(from.x + nx * offset, from.y + ny * offset);
        let b = Point::new(to.x + nx * offset, to.y + ny * offset);
        let color = match stroke.paint {
            Paint::Solid(color) => color,
            paint => paint.color_at(Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)),
        };
        segment(ctx, a, b, color, side);
    }
}

fn segment(ctx: &mut Context<'_>, a: Point, b: Point, color: Color, side: f64) {
    let (x1, y1) = flip(a, side);
    let (x2, y2) = flip(b, side);
    ctx.draw(&Line {
        x1,
        y1,
        x2,
        y2,
        color,
    });
}
