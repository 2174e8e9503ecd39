//! Mention detection and the notification decision.
//!
//! The decision is pure: the state handler asks [`should_notify`] and emits
//! a declarative notify action; [`Alerter`] then performs the platform calls
//! through collaborator traits. A denied or unsupported platform facility
//! degrades to a logged no-op, never an error.

use anyhow::Result;
use tracing::warn;

use crate::config::model::NotificationConfig;

/// True when `body` mentions `nick`, case-insensitively. A leading `@` in
/// the body is incidental: `@alice` and `alice` both count.
pub fn detect_mention(body: &str, nick: &str) -> bool {
    if nick.is_empty() {
        return false;
    }
    body.to_lowercase().contains(&nick.to_lowercase())
}

/// Decide whether a freshly received message should alert the user.
///
/// Never fires for a message the user is already actively viewing: the
/// target must differ from the active one, or the view must be hidden.
pub fn should_notify(
    body: &str,
    target: &str,
    self_nick: &str,
    active_target: Option<&str>,
    view_hidden: bool,
) -> bool {
    detect_mention(body, self_nick) && (view_hidden || active_target != Some(target))
}

/// Platform notification collaborator.
pub trait NotificationSink: Send {
    fn show(&self, title: &str, body: &str) -> Result<()>;
}

/// Sound playback collaborator.
pub trait SoundPlayer: Send {
    fn play(&self) -> Result<()>;
}

/// Discards notifications. Used when the platform offers nothing better.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn show(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

impl SoundPlayer for NullSink {
    fn play(&self) -> Result<()> {
        Ok(())
    }
}

/// Executes notify decisions. Collaborator failures are logged and dropped.
pub struct Alerter {
    config: NotificationConfig,
    sink: Box<dyn NotificationSink>,
    sound: Box<dyn SoundPlayer>,
}

impl Alerter {
    pub fn new(
        config: NotificationConfig,
        sink: Box<dyn NotificationSink>,
        sound: Box<dyn SoundPlayer>,
    ) -> Self {
        Self { config, sink, sound }
    }

    pub fn disabled() -> Self {
        Self::new(
            NotificationConfig {
                enabled: false,
                sound: false,
            },
            Box::new(NullSink),
            Box::new(NullSink),
        )
    }

    pub fn alert(&self, title: &str, body: &str) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self.sink.show(title, body) {
            warn!("Notification failed: {e:#}");
        }
        if self.config.sound {
            if let Err(e) = self.sound.play() {
                warn!("Notification sound failed: {e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn mention_is_case_insensitive_and_at_optional() {
        assert!(detect_mention("hey Alice, got a sec?", "alice"));
        assert!(detect_mention("ping @alice", "alice"));
        assert!(!detect_mention("hey bob", "alice"));
        assert!(!detect_mention("anything", ""));
    }

    #[test]
    fn silent_for_visible_active_target() {
        assert!(!should_notify(
            "alice: look",
            "#rust",
            "alice",
            Some("#rust"),
            false,
        ));
    }

    #[test]
    fn fires_when_view_hidden_even_for_active_target() {
        assert!(should_notify(
            "alice: look",
            "#rust",
            "alice",
            Some("#rust"),
            true,
        ));
    }

    #[test]
    fn fires_for_background_target() {
        assert!(should_notify(
            "alice: look",
            "#rust",
            "alice",
            Some("#other"),
            false,
        ));
    }

    #[test]
    fn no_mention_no_alert() {
        assert!(!should_notify("hi all", "#rust", "alice", None, true));
    }

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn show(&self, _: &str, _: &str) -> Result<()> {
            anyhow::bail!("permission denied")
        }
    }

    struct CountingSound(Arc<AtomicUsize>);

    impl SoundPlayer for CountingSound {
        fn play(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn sink_failure_is_swallowed_and_sound_still_plays() {
        let plays = Arc::new(AtomicUsize::new(0));
        let alerter = Alerter::new(
            NotificationConfig {
                enabled: true,
                sound: true,
            },
            Box::new(FailingSink),
            Box::new(CountingSound(Arc::clone(&plays))),
        );
        alerter.alert("Mention", "body");
        assert_eq!(plays.load(Ordering::SeqCst), 1);
    }
}
