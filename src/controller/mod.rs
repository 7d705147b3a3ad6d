//! Emulated controller state
//!
//! Owns the button bitfield and both analog sticks, and flushes input reports
//! through the [`Transport`](crate::transport::Transport) seam. The wire
//! protocol itself (pairing, HID transport) lives behind that seam.

pub mod report;
pub mod stick;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

use crate::transport::{Transport, TransportError};
use stick::{Side, StickState};

/// Button names of the emulated controller
static AVAILABLE_BUTTONS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from([
        "y", "x", "b", "a", "r", "zr", "minus", "plus", "r_stick", "l_stick", "home", "capture",
        "down", "up", "right", "left", "l", "zl",
    ])
});

/// Shared handle to one controller session's state
pub type SharedControllerState = Arc<tokio::sync::Mutex<ControllerState>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("unknown button \"{0}\"")]
    UnknownButton(String),
}

/// Pressed/released state of every available button
#[derive(Debug, Clone, Default)]
pub struct ButtonState {
    pressed: HashSet<String>,
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every button this controller supports, in stable order
    pub fn available_buttons(&self) -> impl Iterator<Item = &'static str> {
        AVAILABLE_BUTTONS.iter().copied()
    }

    pub fn is_available(&self, name: &str) -> bool {
        AVAILABLE_BUTTONS.contains(name)
    }

    pub fn is_pressed(&self, name: &str) -> bool {
        self.pressed.contains(name)
    }

    pub fn press(&mut self, name: &str) -> Result<(), ControllerError> {
        if !self.is_available(name) {
            return Err(ControllerError::UnknownButton(name.to_string()));
        }
        self.pressed.insert(name.to_string());
        Ok(())
    }

    pub fn release(&mut self, name: &str) -> Result<(), ControllerError> {
        if !self.is_available(name) {
            return Err(ControllerError::UnknownButton(name.to_string()));
        }
        self.pressed.remove(name);
        Ok(())
    }
}

/// Full controller state: buttons plus both sticks
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    buttons: ButtonState,
    l_stick: StickState,
    r_stick: StickState,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buttons(&self) -> &ButtonState {
        &self.buttons
    }

    pub fn buttons_mut(&mut self) -> &mut ButtonState {
        &mut self.buttons
    }

    pub fn stick(&self, side: Side) -> &StickState {
        match side {
            Side::Left => &self.l_stick,
            Side::Right => &self.r_stick,
        }
    }

    pub fn stick_mut(&mut self, side: Side) -> &mut StickState {
        match side {
            Side::Left => &mut self.l_stick,
            Side::Right => &mut self.r_stick,
        }
    }

    /// Flush the current state as one input report
    pub async fn send(&self, transport: &dyn Transport) -> Result<(), TransportError> {
        transport.write(&report::pack(self)).await
    }
}

/// Press the named buttons together, flush a report, wait, release, flush.
///
/// All names are validated before anything is pressed, so a bad name leaves
/// the state untouched.
pub async fn button_push(
    state: &SharedControllerState,
    transport: &dyn Transport,
    buttons: &[String],
    hold: Duration,
) -> Result<(), PushError> {
    {
        let mut guard = state.lock().await;
        for name in buttons {
            if !guard.buttons().is_available(name) {
                return Err(ControllerError::UnknownButton(name.clone()).into());
            }
        }
        for name in buttons {
            guard.buttons_mut().press(name)?;
        }
        debug!("push: pressed {:?}", buttons);
        guard.send(transport).await?;
    }

    tokio::time::sleep(hold).await;

    let mut guard = state.lock().await;
    for name in buttons {
        guard.buttons_mut().release(name)?;
    }
    debug!("push: released {:?}", buttons);
    guard.send(transport).await?;
    Ok(())
}

/// Failure of a combined press/flush/release push
#[derive(Debug, Error)]
pub enum PushError {
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PushError {
    /// True when the underlying transport reported a lost connection
    pub fn is_disconnect(&self) -> bool {
        matches!(self, PushError::Transport(TransportError::NotConnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;

    #[test]
    fn test_unknown_button_is_rejected() {
        let mut buttons = ButtonState::new();
        assert_eq!(
            buttons.press("start"),
            Err(ControllerError::UnknownButton("start".to_string()))
        );
        assert!(buttons.press("a").is_ok());
        assert!(buttons.is_pressed("a"));
        assert!(buttons.release("a").is_ok());
        assert!(!buttons.is_pressed("a"));
    }

    #[tokio::test]
    async fn test_button_push_presses_then_releases() {
        let state: SharedControllerState =
            Arc::new(tokio::sync::Mutex::new(ControllerState::new()));
        let transport = RecordingTransport::new();

        button_push(
            &state,
            &transport,
            &["a".to_string(), "b".to_string()],
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        let reports = transport.reports();
        assert_eq!(reports.len(), 2);
        // First report carries A (bit 3) and B (bit 2), second is all-released
        assert_eq!(reports[0][0], (1 << 3) | (1 << 2));
        assert_eq!(reports[1][0], 0);
        assert!(!state.lock().await.buttons().is_pressed("a"));
    }

    #[tokio::test]
    async fn test_button_push_validates_before_mutating() {
        let state: SharedControllerState =
            Arc::new(tokio::sync::Mutex::new(ControllerState::new()));
        let transport = RecordingTransport::new();

        let err = button_push(
            &state,
            &transport,
            &["a".to_string(), "bogus".to_string()],
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            PushError::Controller(ControllerError::UnknownButton(_))
        ));
        assert!(transport.reports().is_empty());
        assert!(!state.lock().await.buttons().is_pressed("a"));
    }

    #[tokio::test]
    async fn test_button_push_surfaces_disconnect() {
        let state: SharedControllerState =
            Arc::new(tokio::sync::Mutex::new(ControllerState::new()));
        let transport = RecordingTransport::new();
        transport.disconnect();

        let err = button_push(
            &state,
            &transport,
            &["a".to_string()],
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        assert!(err.is_disconnect());
    }
}
