use crate::prelude::*;

#[derive(Clone, Copy, Reflect, Debug, PartialEq, Eq, Hash)]
pub enum AnimFloat {
    /// Normalized move speed. 0 is idle, 0.5 walk, 1 run.
    Speed,
    /// Climb animation playback rate in [0, 1].
    ClimbPlayRate,
}

#[derive(Clone, Copy, Reflect, Debug, PartialEq, Eq, Hash)]
pub enum AnimBool {
    IsFalling,
    IsClimbing,
}

#[derive(Clone, Copy, Reflect, Debug, PartialEq, Eq, Hash)]
pub enum AnimTrigger {
    Jump,
    Mantle,
}

impl AnimFloat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::ClimbPlayRate => "ClimbPlayRate",
        }
    }
}

impl AnimBool {
    pub const fn name(self) -> &'static str {
        match self {
            Self::IsFalling => "isFalling",
            Self::IsClimbing => "isClimbing",
        }
    }
}

impl AnimTrigger {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jump => "Jump",
            Self::Mantle => "Mantle",
        }
    }
}

pub trait AnimationSink {
    fn set_float(&mut self, param: AnimFloat, value: f32);
    fn set_bool(&mut self, param: AnimBool, value: bool);
    fn fire(&mut self, trigger: AnimTrigger);
}

/// Latest animation parameters of a character. Triggers stay set until taken.
#[derive(Component, Clone, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct AnimationParameters {
    pub speed: f32,
    pub climb_play_rate: f32,
    pub is_falling: bool,
    pub is_climbing: bool,
    jump: bool,
    mantle: bool,
}

impl AnimationParameters {
    pub fn float(&self, param: AnimFloat) -> f32 {
        match param {
            AnimFloat::Speed => self.speed,
            AnimFloat::ClimbPlayRate => self.climb_play_rate,
        }
    }

    pub fn flag(&self, param: AnimBool) -> bool {
        match param {
            AnimBool::IsFalling => self.is_falling,
            AnimBool::IsClimbing => self.is_climbing,
        }
    }

    pub fn is_triggered(&self, trigger: AnimTrigger) -> bool {
        match trigger {
            AnimTrigger::Jump => self.jump,
            AnimTrigger::Mantle => self.mantle,
        }
    }

    /// Returns whether `trigger` fired since it was last taken, and resets it.
    pub fn take_trigger(&mut self, trigger: AnimTrigger) -> bool {
        let slot = match trigger {
            AnimTrigger::Jump => &mut self.jump,
            AnimTrigger::Mantle => &mut self.mantle,
        };
        core::mem::take(slot)
    }
}

impl AnimationSink for AnimationParameters {
    fn set_float(&mut self, param: AnimFloat, value: f32) {
        match param {
            AnimFloat::Speed => self.speed = value,
            AnimFloat::ClimbPlayRate => self.climb_play_rate = value,
        }
    }

    fn set_bool(&mut self, param: AnimBool, value: bool) {
        match param {
            AnimBool::IsFalling => self.is_falling = value,
            AnimBool::IsClimbing => self.is_climbing = value,
        }
    }

    fn fire(&mut self, trigger: AnimTrigger) {
        match trigger {
            AnimTrigger::Jump => self.jump = true,
            AnimTrigger::Mantle => self.mantle = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_latch_until_taken() {
        let mut params = AnimationParameters::default();
        params.fire(AnimTrigger::Jump);
        params.fire(AnimTrigger::Jump);
        assert!(params.is_triggered(AnimTrigger::Jump));
        assert!(!params.is_triggered(AnimTrigger::Mantle));

        assert!(params.take_trigger(AnimTrigger::Jump));
        assert!(!params.take_trigger(AnimTrigger::Jump));
    }

    #[test]
    fn channels_are_addressed_by_id() {
        let mut params = AnimationParameters::default();
        params.set_float(AnimFloat::ClimbPlayRate, 0.25);
        params.set_bool(AnimBool::IsClimbing, true);
        assert_eq!(params.float(AnimFloat::ClimbPlayRate), 0.25);
        assert_eq!(params.float(AnimFloat::Speed), 0.0);
        assert!(params.flag(AnimBool::IsClimbing));
        assert!(!params.flag(AnimBool::IsFalling));
        assert_eq!(AnimBool::IsFalling.name(), "isFalling");
    }
}
