mod render;
pub mod surface;

pub use render::render_frame;

use ratatui::style::Color;
use surface::Surface;

// Degrees clockwise from 3 o'clock.
pub const START_ANGLE_DEG: f64 = 135.0;
pub const SWEEP_DEG: f64 = 270.0;

pub const LOW_START: Color = Color::Rgb(0xff, 0x44, 0x44);
pub const LOW_END: Color = Color::Rgb(0xcc, 0x00, 0x00);
pub const MID_START: Color = Color::Rgb(0xff, 0xbb, 0x33);
pub const MID_END: Color = Color::Rgb(0xff, 0x88, 0x00);
pub const HIGH_START: Color = Color::Rgb(0x00, 0xc8, 0x51);
pub const HIGH_END: Color = Color::Rgb(0x00, 0x7e, 0x33);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeConfig {
    pub max_speed: f64,
    pub total_ticks: u32,
    pub major_every: u32,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub max_side: u32,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            max_speed: 100.0,
            total_ticks: 100,
            major_every: 10,
            low_threshold: 0.3,
            high_threshold: 0.7,
            max_side: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedBracket {
    Low,
    Medium,
    High,
}

impl SpeedBracket {
    pub fn colors(self) -> (Color, Color) {
        match self {
            SpeedBracket::Low => (LOW_START, LOW_END),
            SpeedBracket::Medium => (MID_START, MID_END),
            SpeedBracket::High => (HIGH_START, HIGH_END),
        }
    }
}

impl GaugeConfig {
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        speed.clamp(0.0, self.max_speed)
    }

    pub fn percentage(&self, speed: f64) -> f64 {
        if self.max_speed <= 0.0 {
            return 0.0;
        }
        (speed / self.max_speed).clamp(0.0, 1.0)
    }

    pub fn needle_angle_deg(&self, speed: f64) -> f64 {
        START_ANGLE_DEG + SWEEP_DEG * self.percentage(speed)
    }

    // Strict: a value on a threshold takes the upper bracket.
    pub fn bracket(&self, percentage: f64) -> SpeedBracket {
        if percentage < self.low_threshold {
            SpeedBracket::Low
        } else if percentage < self.high_threshold {
            SpeedBracket::Medium
        } else {
            SpeedBracket::High
        }
    }

    pub fn side_for_width(&self, container_width: u32) -> u32 {
        container_width.min(self.max_side)
    }

    pub fn tick_value(&self, index: u32) -> f64 {
        self.max_speed * index as f64 / self.total_ticks as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeState {
    side: u32,
    speed: f64,
}

impl Default for GaugeState {
    fn default() -> Self {
        Self {
            side: GaugeConfig::default().max_side,
            speed: 0.0,
        }
    }
}

impl GaugeState {
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn resize(&mut self, config: &GaugeConfig, container_width: u32) -> bool {
        let side = config.side_for_width(container_width);
        let changed = side != self.side;
        self.side = side;
        changed
    }

    pub fn show(&mut self, config: &GaugeConfig, speed: f64) {
        self.speed = config.clamp_speed(speed);
    }

    pub fn draw(&self, config: &GaugeConfig, surface: &mut impl Surface) {
        render_frame(surface, config, self.speed, self.side as f64);
    }
}
