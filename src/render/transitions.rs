use std::sync::Arc;

use super::frame::Frame;

/// Registry keys, in listing order.
pub const STYLE_NAMES: [&str; 28] = [
    "fade",
    "dissolve",
    "wipe_left",
    "wipe_right",
    "wipe_up",
    "wipe_down",
    "slide_left",
    "slide_right",
    "zoom_in",
    "zoom_out",
    "blur_transition",
    "whip_pan",
    "rotate_transition",
    "door_wipe",
    "circle_wipe",
    "diamond_wipe",
    "clock_wipe",
    "split_screen",
    "venetian_blinds",
    "checkerboard",
    "push",
    "luma_wipe",
    "flip_transition",
    "pixel_dissolve",
    "burn_transition",
    "ripple_transition",
    "flash_transition",
    "glitch_transition",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Left,
    Right,
    Up,
    Down,
}

/// Every supported transition with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionStyle {
    Fade,
    Dissolve,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    SlideLeft,
    SlideRight,
    ZoomIn,
    ZoomOut,
    Blur { radius: f32 },
    WhipPan,
    Rotate { angle: f32 },
    DoorWipe { from_center: bool },
    CircleWipe { from_center: bool },
    DiamondWipe { from_center: bool },
    ClockWipe { clockwise: bool },
    /// The split moves left to right, or top to bottom when `vertical`
    SplitScreen { vertical: bool },
    VenetianBlinds { blinds: u32, vertical: bool },
    Checkerboard { squares: u32 },
    Push { direction: Direction },
    /// Grayscale map matching the frame size; a radial gradient when absent
    LumaWipe { map: Option<Arc<Frame>> },
    /// Squeezes height, or width when flipping around the vertical axis
    Flip { vertical_axis: bool },
    PixelDissolve,
    Burn,
    Ripple { amplitude: f32, frequency: f32 },
    /// `width` is the share of the transition the flash spans
    Flash { intensity: f32, width: f32 },
    Glitch { intensity: f32, glitches: u32 },
}

impl TransitionStyle {
    /// Style for a registry key with default parameters.
    pub fn from_name(name: &str) -> Option<Self> {
        let style = match name {
            "fade" => Self::Fade,
            "dissolve" => Self::Dissolve,
            "wipe_left" => Self::WipeLeft,
            "wipe_right" => Self::WipeRight,
            "wipe_up" => Self::WipeUp,
            "wipe_down" => Self::WipeDown,
            "slide_left" => Self::SlideLeft,
            "slide_right" => Self::SlideRight,
            "zoom_in" => Self::ZoomIn,
            "zoom_out" => Self::ZoomOut,
            "blur_transition" => Self::Blur { radius: 20.0 },
            "whip_pan" => Self::WhipPan,
            "rotate_transition" => Self::Rotate { angle: 360.0 },
            "door_wipe" => Self::DoorWipe { from_center: true },
            "circle_wipe" => Self::CircleWipe { from_center: true },
            "diamond_wipe" => Self::DiamondWipe { from_center: true },
            "clock_wipe" => Self::ClockWipe { clockwise: true },
            "split_screen" => Self::SplitScreen { vertical: false },
            "venetian_blinds" => Self::VenetianBlinds {
                blinds: 10,
                vertical: false,
            },
            "checkerboard" => Self::Checkerboard { squares: 8 },
            "push" => Self::Push {
                direction: Direction::Left,
            },
            "luma_wipe" => Self::LumaWipe { map: None },
            "flip_transition" => Self::Flip {
                vertical_axis: false,
            },
            "pixel_dissolve" => Self::PixelDissolve,
            "burn_transition" => Self::Burn,
            "ripple_transition" => Self::Ripple {
                amplitude: 10.0,
                frequency: 5.0,
            },
            "flash_transition" => Self::Flash {
                intensity: 1.5,
                width: 0.2,
            },
            "glitch_transition" => Self::Glitch {
                intensity: 0.1,
                glitches: 10,
            },
            _ => return None,
        };
        Some(style)
    }

    /// Like [`from_name`](Self::from_name), falling back to `fade` with a
    /// warning for unknown keys.
    pub fn resolve(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase();
        Self::from_name(&key).unwrap_or_else(|| {
            log::warn!("Unknown transition '{}', using fade", name);
            Self::Fade
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::Dissolve => "dissolve",
            Self::WipeLeft => "wipe_left",
            Self::WipeRight => "wipe_right",
            Self::WipeUp => "wipe_up",
            Self::WipeDown => "wipe_down",
            Self::SlideLeft => "slide_left",
            Self::SlideRight => "slide_right",
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::Blur { .. } => "blur_transition",
            Self::WhipPan => "whip_pan",
            Self::Rotate { .. } => "rotate_transition",
            Self::DoorWipe { .. } => "door_wipe",
            Self::CircleWipe { .. } => "circle_wipe",
            Self::DiamondWipe { .. } => "diamond_wipe",
            Self::ClockWipe { .. } => "clock_wipe",
            Self::SplitScreen { .. } => "split_screen",
            Self::VenetianBlinds { .. } => "venetian_blinds",
            Self::Checkerboard { .. } => "checkerboard",
            Self::Push { .. } => "push",
            Self::LumaWipe { .. } => "luma_wipe",
            Self::Flip { .. } => "flip_transition",
            Self::PixelDissolve => "pixel_dissolve",
            Self::Burn => "burn_transition",
            Self::Ripple { .. } => "ripple_transition",
            Self::Flash { .. } => "flash_transition",
            Self::Glitch { .. } => "glitch_transition",
        }
    }

    /// Documented default length in seconds.
    pub fn default_duration(&self) -> f64 {
        match self {
            Self::WhipPan => 0.5,
            _ => 1.0,
        }
    }

    /// Attach a luma map to `luma_wipe`; other styles are returned unchanged.
    pub fn with_luma_map(self, luma: Arc<Frame>) -> Self {
        match self {
            Self::LumaWipe { .. } => Self::LumaWipe { map: Some(luma) },
            other => other,
        }
    }
}
