use serde::Deserialize;

use crate::binding::{Bindings, Target};
use crate::channels::Channels;
use crate::error::Result;
use crate::gcode::{self, GcodeAction};
use crate::pattern::PatternPreset;
use crate::pwmsink::PwmSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PrinterStatus {
    Startup,
    Idle,
    Paused,
    Error,
    Heating,
    Printing,
    Finished,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StatusStyle {
    pub color: String,
    pub pattern: PatternPreset,
}

impl StatusStyle {
    fn new(color: &str, pattern: PatternPreset) -> StatusStyle {
        StatusStyle {
            color: color.to_string(),
            pattern,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatusStyles {
    pub startup: StatusStyle,
    pub idle: StatusStyle,
    pub paused: StatusStyle,
    pub error: StatusStyle,
    pub heating: StatusStyle,
    pub printing: StatusStyle,
    pub finished: StatusStyle,
}

impl Default for StatusStyles {
    fn default() -> Self {
        StatusStyles {
            startup: StatusStyle::new("#00FF00", PatternPreset::NormalPulsing),
            idle: StatusStyle::new("#00FF00", PatternPreset::Constant),
            paused: StatusStyle::new("#00FF00", PatternPreset::Constant),
            error: StatusStyle::new("#FF0000", PatternPreset::SlowPulsing),
            heating: StatusStyle::new("#FF8000", PatternPreset::NormalPulsing),
            printing: StatusStyle::new("#FFFFFF", PatternPreset::Constant),
            finished: StatusStyle::new("#00FF00", PatternPreset::NormalPulsing),
        }
    }
}

impl StatusStyles {
    pub fn style(&self, status: PrinterStatus) -> &StatusStyle {
        match status {
            PrinterStatus::Startup => &self.startup,
            PrinterStatus::Idle => &self.idle,
            PrinterStatus::Paused => &self.paused,
            PrinterStatus::Error => &self.error,
            PrinterStatus::Heating => &self.heating,
            PrinterStatus::Printing => &self.printing,
            PrinterStatus::Finished => &self.finished,
        }
    }

    /// Fails on the first style whose color does not parse.
    pub fn validate(&self) -> Result<()> {
        for style in [
            &self.startup,
            &self.idle,
            &self.paused,
            &self.error,
            &self.heating,
            &self.printing,
            &self.finished,
        ] {
            Channels::from_hex(&style.color)?;
        }
        Ok(())
    }
}

pub fn lights_off<S: PwmSink>(bindings: &Bindings<S>) -> bool {
    log::debug!("Switching the lights off");
    bindings.set_constant_color(Target::Both, Channels::zero())
}

/// Shows `status` on both sides, or keeps the lights off when they are disabled.
pub fn show_status<S: PwmSink>(
    bindings: &Bindings<S>,
    styles: &StatusStyles,
    lights_enabled: bool,
    status: PrinterStatus,
) -> bool {
    if !lights_enabled {
        return lights_off(bindings);
    }

    let style = styles.style(status);
    let color = match Channels::from_hex(&style.color) {
        Ok(color) => color,
        Err(err) => {
            log::warn!("Cannot show {status:?}: {err}");
            return false;
        }
    };

    log::info!("Showing {status:?}: {} {:?}", style.color, style.pattern);
    bindings.set_preset(Target::Both, style.pattern, color)
}

/// What the printer reports about itself. Heating is tracked from G-code instead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PrinterState {
    pub is_error: bool,
    pub is_printing: bool,
    pub is_paused: bool,
    /// Job progress in percent.
    pub completion: f32,
}

pub fn resolve_status(
    is_error: bool,
    is_printing: bool,
    heating: bool,
    is_paused: bool,
    completion: f32,
) -> PrinterStatus {
    if is_error {
        PrinterStatus::Error
    } else if is_printing {
        if heating {
            PrinterStatus::Heating
        } else {
            PrinterStatus::Printing
        }
    } else if is_paused {
        PrinterStatus::Paused
    } else if completion >= 100.0 {
        PrinterStatus::Finished
    } else {
        PrinterStatus::Idle
    }
}

/// Follows the printer through its state and the G-code it is sent.
pub struct StatusIndicator {
    styles: StatusStyles,
    lights_enabled: bool,
    heating: bool,
}

impl StatusIndicator {
    pub fn new(styles: StatusStyles, lights_enabled: bool) -> StatusIndicator {
        StatusIndicator {
            styles,
            lights_enabled,
            heating: false,
        }
    }

    pub fn status(&self, printer: &PrinterState) -> PrinterStatus {
        resolve_status(
            printer.is_error,
            printer.is_printing,
            self.heating,
            printer.is_paused,
            printer.completion,
        )
    }

    pub fn refresh<S: PwmSink>(&self, bindings: &Bindings<S>, printer: &PrinterState) -> bool {
        show_status(
            bindings,
            &self.styles,
            self.lights_enabled,
            self.status(printer),
        )
    }

    /// Lines that don't concern the lights are accepted and ignored.
    pub fn handle_gcode<S: PwmSink>(
        &mut self,
        bindings: &Bindings<S>,
        printer: &PrinterState,
        cmd: &str,
    ) -> bool {
        match gcode::parse(cmd) {
            Some(GcodeAction::SetColor(color)) => {
                log::debug!("{cmd} sets color {:?}", color.values());
                if !self.lights_enabled {
                    return lights_off(bindings);
                }
                bindings.set_constant_color(Target::Both, color)
            }
            Some(GcodeAction::Heating) => self.set_heating(bindings, printer, true),
            Some(GcodeAction::Moving) => self.set_heating(bindings, printer, false),
            None => true,
        }
    }

    fn set_heating<S: PwmSink>(
        &mut self,
        bindings: &Bindings<S>,
        printer: &PrinterState,
        heating: bool,
    ) -> bool {
        if heating == self.heating {
            return true;
        }

        self.heating = heating;
        self.refresh(bindings, printer)
    }
}
