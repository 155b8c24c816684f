use crate::channels::Channels;

/// Hardware-facing end of the light handler. Receives both outputs once per tick.
///
/// Writes are fire-and-forget: a sink deals with its own failures.
pub trait PwmSink: Send + 'static {
    fn write(&mut self, left: &Channels, right: &Channels);
}

impl<S: PwmSink + ?Sized> PwmSink for Box<S> {
    fn write(&mut self, left: &Channels, right: &Channels) {
        (**self).write(left, right);
    }
}

/// Sink that only logs, for running without any output hardware.
pub struct LogSink;

impl PwmSink for LogSink {
    fn write(&mut self, left: &Channels, right: &Channels) {
        log::trace!("left {:?} right {:?}", left.values(), right.values());
    }
}
