//! Presentation-thread event fan-out (spec.md §4.8 `EventDispatcher`)

use mediacore_types::{
    Aspect, Connector, EngineProperty, LogLevel, MediaError, PlatformOps, Ticks, UiPriority,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

/// Marshals engine transitions to the host's [`Connector`] via the
/// platform's injected presentation-thread invoker.
///
/// Every dispatch runs on whatever thread `ui_invoke` chooses to run it on;
/// a panicking listener is caught and logged rather than propagated back
/// into the pipeline (spec.md §7 "Listener exceptions are swallowed").
pub struct EventDispatcher {
    platform: Arc<dyn PlatformOps>,
    connector: Arc<dyn Connector>,
}

impl EventDispatcher {
    /// Builds a dispatcher over the given platform/connector pair.
    pub fn new(platform: Arc<dyn PlatformOps>, connector: Arc<dyn Connector>) -> Self {
        Self { platform, connector }
    }

    fn invoke(&self, priority: UiPriority, f: impl FnOnce(&dyn Connector) + Send + 'static) {
        let connector = self.connector.clone();
        self.platform.ui_invoke(
            priority,
            Box::new(move || {
                if catch_unwind(AssertUnwindSafe(|| f(connector.as_ref()))).is_err() {
                    error!(target: "Engine.Commands", "connector listener panicked");
                }
            }),
        );
    }

    /// `MediaOpened` (spec.md §4.8).
    pub fn media_opened(&self) {
        self.invoke(UiPriority::High, |c| c.on_media_opened());
    }

    /// `MediaChanging`.
    pub fn media_changing(&self) {
        self.invoke(UiPriority::High, |c| c.on_media_changing());
    }

    /// `MediaChanged`.
    pub fn media_changed(&self) {
        self.invoke(UiPriority::High, |c| c.on_media_changed());
    }

    /// `MediaClosed`.
    pub fn media_closed(&self) {
        self.invoke(UiPriority::High, |c| c.on_media_closed());
    }

    /// `MediaFailed(error)`.
    pub fn media_failed(&self, error: MediaError) {
        warn!(target: error.aspect().as_str(), %error, "media failed");
        self.invoke(UiPriority::High, move |c| c.on_media_failed(&error));
    }

    /// `MediaEnded`.
    pub fn media_ended(&self) {
        self.invoke(UiPriority::Normal, |c| c.on_media_ended());
    }

    /// `BufferingStarted` / `BufferingEnded`.
    pub fn buffering(&self, started: bool) {
        if started {
            self.invoke(UiPriority::Normal, |c| c.on_buffering_started());
        } else {
            self.invoke(UiPriority::Normal, |c| c.on_buffering_ended());
        }
    }

    /// `SeekingStarted` / `SeekingEnded`.
    pub fn seeking(&self, started: bool) {
        if started {
            self.invoke(UiPriority::High, |c| c.on_seeking_started());
        } else {
            self.invoke(UiPriority::High, |c| c.on_seeking_ended());
        }
    }

    /// `PositionChanged(ticks)`.
    pub fn position_changed(&self, ticks: Ticks) {
        self.invoke(UiPriority::Normal, move |c| c.on_position_changed(ticks));
    }

    /// `on_property_changed(name)`, one call per mutated observable.
    pub fn property_changed(&self, property: EngineProperty) {
        self.invoke(UiPriority::Normal, move |c| c.on_property_changed(property));
    }

    /// `MessageLogged(level, aspect, text)`. Also emitted through `tracing`
    /// so hosts that don't implement `on_message_logged` still see it in
    /// structured logs.
    pub fn message_logged(&self, level: LogLevel, aspect: Aspect, text: impl Into<String>) {
        let text = text.into();
        match level {
            LogLevel::Error => error!(target: aspect.as_str(), "{text}"),
            LogLevel::Warn => warn!(target: aspect.as_str(), "{text}"),
            _ => tracing::debug!(target: aspect.as_str(), "{text}"),
        }
        let text_for_connector = text.clone();
        self.invoke(UiPriority::Normal, move |c| {
            c.on_message_logged(level, aspect, &text_for_connector)
        });
    }
}
