//! Result sink.

use tokio::sync::mpsc;

use super::error::ErrorKind;
use crate::geocoder::AddressReport;
use crate::location::Position;
use crate::settings::ResolutionToken;

/// Consumer of everything the coordinator produces.
///
/// Always called from the coordinator task, one call at a time.
pub trait LocationSink: Send + Sync {
    fn on_position(&self, position: &Position);

    /// A lookup finished. `report.display()` gives the text to show.
    fn on_address(&self, report: &AddressReport);

    /// A terminal failure. Sent once per failed request.
    fn on_error(&self, error: &ErrorKind);

    /// The settings resolution flow keyed by `token` should be shown.
    ///
    /// Answer with [`CoordinatorHandle::on_settings_resolution`](super::CoordinatorHandle::on_settings_resolution).
    fn on_resolution_required(&self, _token: ResolutionToken) {}
}

/// Sink callback, as an owned value.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Position(Position),
    Address(AddressReport),
    Error(ErrorKind),
    ResolutionRequired(ResolutionToken),
}

/// Sink that forwards every callback onto a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SinkEvent) {
        // Nobody listening is not the coordinator's problem.
        let _ = self.tx.send(event);
    }
}

impl LocationSink for ChannelSink {
    fn on_position(&self, position: &Position) {
        self.forward(SinkEvent::Position(*position));
    }

    fn on_address(&self, report: &AddressReport) {
        self.forward(SinkEvent::Address(report.clone()));
    }

    fn on_error(&self, error: &ErrorKind) {
        self.forward(SinkEvent::Error(error.clone()));
    }

    fn on_resolution_required(&self, token: ResolutionToken) {
        self.forward(SinkEvent::ResolutionRequired(token));
    }
}
