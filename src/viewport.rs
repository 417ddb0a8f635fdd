//! Pan/zoom state applied when presenting layout coordinates.
//!
//! Button commands (`zoom_in`, `zoom_out`) scale about the view origin and
//! leave `translate` untouched. `zoom_at` keeps a given screen point fixed and
//! is what the scroll wheel uses.

use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub zoom_step: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 1.3,
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(ConfigurationError::parameter(
                "min_scale",
                format!("expected a finite positive value, got {}", self.min_scale),
            ));
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            return Err(ConfigurationError::parameter(
                "max_scale",
                format!("expected a finite value >= min_scale, got {}", self.max_scale),
            ));
        }
        if !(self.min_scale..=self.max_scale).contains(&1.0) {
            return Err(ConfigurationError::parameter(
                "min_scale",
                "scale range must include the default scale of 1",
            ));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigurationError::parameter(
                "zoom_step",
                format!("expected a finite value above 1, got {}", self.zoom_step),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// `origin` is the top-left corner of the drawing surface.
    pub fn world_to_screen(&self, origin: Pos2, world: Vec2) -> Pos2 {
        origin + self.translate + world * self.scale
    }

    pub fn screen_to_world(&self, origin: Pos2, screen: Pos2) -> Vec2 {
        (screen - origin - self.translate) / self.scale
    }
}

#[derive(Clone, Debug, Default)]
pub struct Viewport {
    transform: ViewTransform,
    config: ViewportConfig,
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            transform: ViewTransform::default(),
            config,
        })
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.transform.scale * self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.transform.scale / self.config.zoom_step);
    }

    pub fn reset(&mut self) {
        self.transform = ViewTransform::default();
    }

    pub fn set_pan(&mut self, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.transform.translate = Vec2::new(dx, dy);
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        let translate = self.transform.translate + delta;
        self.set_pan(translate.x, translate.y);
    }

    /// Multiplies the scale by `factor`, keeping the layout point under
    /// `anchor` (relative to the surface origin) in place.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }

        let world = (anchor - self.transform.translate) / self.transform.scale;
        self.set_scale(self.transform.scale * factor);
        self.transform.translate = anchor - world * self.transform.scale;
    }

    fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.transform.scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        }
    }
}
