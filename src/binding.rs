use crate::channels::Channels;
use crate::lighthandler::{LightHandler, Side, TransitionConfig};
use crate::pattern::{Pattern, PatternPreset};
use crate::pwmsink::PwmSink;

/// Which output(s) a pattern goes to. Discriminants are the host-side codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    Right = 0,
    Left = 1,
    Both = 2,
}

impl TryFrom<u8> for Target {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Target::Right),
            1 => Ok(Target::Left),
            2 => Ok(Target::Both),
            _ => Err(code),
        }
    }
}

/// Host-facing surface. Every call reports success as a plain `bool`.
pub struct Bindings<S: PwmSink> {
    handler: Option<LightHandler<S>>,
}

impl<S: PwmSink> Bindings<S> {
    pub fn new() -> Bindings<S> {
        Bindings { handler: None }
    }

    /// Replaces (and stops) any previously initialized handler.
    pub fn initialize(
        &mut self,
        color: Channels,
        transitions_enabled: bool,
        refresh_interval_ms: u32,
        transition_ms: u32,
        sink: S,
    ) -> bool {
        if !color.is_valid() {
            log::warn!("Rejecting default color {:?}", color.values());
            return false;
        }

        // Drop the old handler first so its loop is joined before the new one exists
        self.handler = None;
        let config = TransitionConfig {
            enabled: transitions_enabled,
            refresh_interval_ms,
            transition_ms,
        };
        self.handler = Some(LightHandler::new(color, config, sink));
        true
    }

    pub fn start(&self) -> bool {
        let Some(handler) = self.initialized_handler() else {
            return false;
        };

        match handler.start() {
            Ok(()) => true,
            Err(err) => {
                log::error!("{err}");
                false
            }
        }
    }

    pub fn stop(&self) -> bool {
        let Some(handler) = self.initialized_handler() else {
            return false;
        };

        if !handler.is_running() {
            return true;
        }

        handler.stop();
        log::debug!(
            "Stopped at left {:?}, right {:?}",
            handler.last_output(Side::Left).values(),
            handler.last_output(Side::Right).values()
        );
        true
    }

    pub fn set_constant_color(&self, target: Target, color: Channels) -> bool {
        self.set_pattern(target, color, Pattern::constant)
    }

    pub fn set_pulsing_color(&self, target: Target, color: Channels, period_ms: u32) -> bool {
        self.set_pattern(target, color, |color| Pattern::pulsing(color, period_ms))
    }

    pub fn set_onoff_color(&self, target: Target, color: Channels, period_ms: u32) -> bool {
        self.set_pattern(target, color, |color| Pattern::on_off(color, period_ms))
    }

    pub fn set_preset(&self, target: Target, preset: PatternPreset, color: Channels) -> bool {
        self.set_pattern(target, color, |color| preset.to_pattern(color))
    }

    fn set_pattern(
        &self,
        target: Target,
        color: Channels,
        make_pattern: impl FnOnce(Channels) -> Pattern,
    ) -> bool {
        let Some(handler) = self.initialized_handler() else {
            return false;
        };
        if !color.is_valid() {
            log::warn!("Rejecting color {:?} for {target:?}", color.values());
            return false;
        }

        let pattern = make_pattern(color);
        match target {
            Target::Left => handler.set_pattern_left(pattern),
            Target::Right => handler.set_pattern_right(pattern),
            Target::Both => handler.set_patterns(pattern),
        }
        true
    }

    fn initialized_handler(&self) -> Option<&LightHandler<S>> {
        if self.handler.is_none() {
            log::warn!("Light handler used before initialization");
        }
        self.handler.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn light_handler(&self) -> Option<&LightHandler<S>> {
        self.handler.as_ref()
    }
}

impl<S: PwmSink> Default for Bindings<S> {
    fn default() -> Self {
        Bindings::new()
    }
}
