use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("capsule radius must be positive, got {0}")]
    Radius(f32),

    #[error("capsule height {height} is smaller than its diameter (radius {radius})")]
    Height { height: f32, radius: f32 },

    #[error("dead zone must be in [0, 1), got {0}")]
    DeadZone(f32),

    #[error("gravity must point down (negative), got {0}")]
    Gravity(f32),

    #[error("grounded velocity must be negative, got {0}")]
    GroundedVelocity(f32),

    #[error("max align angle must be in [0, 180] degrees, got {0}")]
    AlignAngle(f32),

    #[error("pitch clamp must be in [0, 90] degrees, got {0}")]
    PitchClamp(f32),

    #[error("`{name}` must be a finite non-negative value, got {value}")]
    Negative { name: &'static str, value: f32 },
}
