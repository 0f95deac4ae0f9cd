use super::surface::{DrawOp, Paint, Point, Shadow, Stroke, Surface};
use super::{GaugeConfig, START_ANGLE_DEG, SWEEP_DEG};
use ratatui::style::Color;
use std::f64::consts::TAU;

const RING_INNER: Color = Color::Rgb(0xf0, 0xf0, 0xf0);
const RING_OUTER: Color = Color::Rgb(0xe0, 0xe0, 0xe0);
const MAJOR_TICK: Color = Color::Rgb(0x33, 0x33, 0x33);
const MINOR_TICK: Color = Color::Rgb(0x66, 0x66, 0x66);
const LABEL: Color = Color::Rgb(0x33, 0x33, 0x33);
const NEEDLE: Color = Color::Rgb(0xe5, 0x39, 0x35);
const HUB_RIM: Color = Color::Rgb(0xb7, 0x1c, 0x1c);

pub fn render_frame(surface: &mut impl Surface, config: &GaugeConfig, speed: f64, side: f64) {
    let center = Point::new(side / 2.0, side / 2.0);
    let radius = side * 0.4;
    let speed = config.clamp_speed(speed);
    let percentage = config.percentage(speed);

    surface.draw(DrawOp::Clear);

    draw_background(surface, center, radius);
    draw_speed_arc(surface, config, center, radius, percentage);
    draw_ticks(surface, config, center, radius);
    draw_needle(surface, center, radius, percentage);
    draw_readout(surface, center, radius, speed);
}

fn draw_background(surface: &mut impl Surface, center: Point, radius: f64) {
    surface.draw(DrawOp::Arc {
        center,
        radius,
        start_angle: 0.0,
        end_angle: TAU,
        stroke: Stroke {
            paint: Paint::Radial {
                center,
                inner: radius * 0.95,
                outer: radius * 1.05,
                start: RING_INNER,
                end: RING_OUTER,
            },
            width: radius * 0.1,
            cap: Default::default(),
        },
    });
}

fn draw_speed_arc(
    surface: &mut impl Surface,
    config: &GaugeConfig,
    center: Point,
    radius: f64,
    percentage: f64,
) {
    let start_angle = START_ANGLE_DEG.to_radians();
    let end_angle = start_angle + SWEEP_DEG.to_radians() * percentage;
    let (start, end) = config.bracket(percentage).colors();

    surface.draw(DrawOp::Arc {
        center,
        radius,
        start_angle,
        end_angle,
        stroke: Stroke {
            paint: Paint::Linear {
                from: Point::new(center.x - radius, center.y - radius),
                to: Point::new(center.x + radius, center.y + radius),
                start,
                end,
            },
            width: radius * 0.1,
            cap: Default::default(),
        }
        .round(),
    });
}

fn draw_ticks(surface: &mut impl Surface, config: &GaugeConfig, center: Point, radius: f64) {
    let start_angle = START_ANGLE_DEG.to_radians();
    let step = SWEEP_DEG.to_radians() / config.total_ticks as f64;
    let label_size = radius * 0.15;

    for i in 0..=config.total_ticks {
        let angle = start_angle + i as f64 * step;
        let major = i % config.major_every == 0;

        let (inner, width, color) = if major {
            (0.8, 0.02, MAJOR_TICK)
        } else {
            (0.85, 0.01, MINOR_TICK)
        };

        surface.draw(DrawOp::Line {
            from: center.polar(radius * inner, angle),
            to: center.polar(radius * 0.95, angle),
            stroke: Stroke::solid(color, radius * width),
            shadow: None,
        });

        if major {
            surface.draw(DrawOp::Text {
                at: center.polar(radius * 0.7, angle),
                text: format!("{}", config.tick_value(i)),
                size: label_size,
                bold: true,
                color: LABEL,
            });
        }
    }
}

fn draw_needle(surface: &mut impl Surface, center: Point, radius: f64, percentage: f64) {
    let angle = (START_ANGLE_DEG + SWEEP_DEG * percentage).to_radians();

    surface.draw(DrawOp::Line {
        from: center,
        to: center.polar(radius * 0.8, angle),
        stroke: Stroke::solid(NEEDLE, radius * 0.03).round(),
        shadow: Some(Shadow {
            color: Color::Rgb(0, 0, 0),
            opacity: 0.2,
            blur: 10.0,
            offset: Point::new(2.0, 2.0),
        }),
    });

    surface.draw(DrawOp::Disc {
        center,
        radius: radius * 0.08,
        fill: NEEDLE,
        stroke: Some(Stroke::solid(HUB_RIM, radius * 0.02)),
    });
}

fn draw_readout(surface: &mut impl Surface, center: Point, radius: f64, speed: f64) {
    surface.draw(DrawOp::Text {
        at: Point::new(center.x, center.y + radius * 0.4),
        text: format!("{:.1}", speed),
        size: radius * 0.3,
        bold: true,
        color: LABEL,
    });

    surface.draw(DrawOp::Text {
        at: Point::new(center.x, center.y + radius * 0.6),
        text: "Mbps".to_string(),
        size: radius * 0.15,
        bold: false,
        color: LABEL,
    });
}
