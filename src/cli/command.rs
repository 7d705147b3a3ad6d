//! Command trait and the built-in controller commands

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::controller::stick::{Side, StickMotion};
use crate::controller::SharedControllerState;
use crate::transport::Transport;

/// A registered console command.
///
/// All methods take `&self` so handlers can be stored as `Arc<dyn Command>`;
/// implementations share state through the controller handle.
#[async_trait]
pub trait Command: Send + Sync {
    /// Registry name (unique per session)
    fn name(&self) -> &str;

    /// Help text, rendered through the dedent formatter. `None` hides the
    /// command from the listing.
    fn help(&self) -> Option<&str> {
        None
    }

    /// Run with positional arguments. `Ok(Some(text))` is printed to the
    /// console; errors are printed and the rest of the chain continues.
    async fn run(&self, args: &[String]) -> Result<Option<String>>;
}

/// `stick <side> <direction> [value]`
pub struct StickCommand {
    state: SharedControllerState,
}

impl StickCommand {
    pub fn new(state: SharedControllerState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Command for StickCommand {
    fn name(&self) -> &str {
        "stick"
    }

    fn help(&self) -> Option<&str> {
        Some(
            "stick - set stick position
             usage: stick <side> <direction> [value]
             side: 'l', 'left' for the left stick; 'r', 'right' for the right stick
             direction: 'center', 'up', 'down', 'left', 'right';
                        'h', 'horizontal' or 'v', 'vertical' set the axis to <value>",
        )
    }

    async fn run(&self, args: &[String]) -> Result<Option<String>> {
        let Some(side_token) = args.first() else {
            bail!("missing side argument");
        };
        let Some(side) = Side::from_token(side_token) else {
            bail!("value of side must be \"l\", \"left\" or \"r\", \"right\"");
        };
        let Some(direction) = args.get(1) else {
            bail!("missing direction argument");
        };

        let motion = StickMotion::from_tokens(direction, args.get(2).map(String::as_str))?;

        let mut state = self.state.lock().await;
        let stick = state.stick_mut(side);
        stick.apply(motion)?;
        Ok(Some(format!(
            "{} stick set to ({}, {})",
            side,
            stick.get_h(),
            stick.get_v()
        )))
    }
}

/// `hold <buttons...>` — press and keep pressed, flush one report
pub struct HoldCommand {
    state: SharedControllerState,
    transport: Arc<dyn Transport>,
}

impl HoldCommand {
    pub fn new(state: SharedControllerState, transport: Arc<dyn Transport>) -> Self {
        Self { state, transport }
    }
}

#[async_trait]
impl Command for HoldCommand {
    fn name(&self) -> &str {
        "hold"
    }

    fn help(&self) -> Option<&str> {
        Some(
            "hold - press buttons and keep them pressed
             usage: hold <button> [<button>...]",
        )
    }

    async fn run(&self, args: &[String]) -> Result<Option<String>> {
        set_buttons(&self.state, self.transport.as_ref(), args, true).await
    }
}

/// `release <buttons...>` — release held buttons, flush one report
pub struct ReleaseCommand {
    state: SharedControllerState,
    transport: Arc<dyn Transport>,
}

impl ReleaseCommand {
    pub fn new(state: SharedControllerState, transport: Arc<dyn Transport>) -> Self {
        Self { state, transport }
    }
}

#[async_trait]
impl Command for ReleaseCommand {
    fn name(&self) -> &str {
        "release"
    }

    fn help(&self) -> Option<&str> {
        Some(
            "release - release held buttons
             usage: release <button> [<button>...]",
        )
    }

    async fn run(&self, args: &[String]) -> Result<Option<String>> {
        set_buttons(&self.state, self.transport.as_ref(), args, false).await
    }
}

async fn set_buttons(
    state: &SharedControllerState,
    transport: &dyn Transport,
    buttons: &[String],
    press: bool,
) -> Result<Option<String>> {
    if buttons.is_empty() {
        bail!("missing button name");
    }

    let mut guard = state.lock().await;
    for name in buttons {
        if !guard.buttons().is_available(name) {
            bail!("unknown button \"{}\"", name);
        }
    }
    for name in buttons {
        if press {
            guard.buttons_mut().press(name)?;
        } else {
            guard.buttons_mut().release(name)?;
        }
    }
    guard.send(transport).await?;
    Ok(None)
}

/// `wait <seconds>` — pause between chained sub-commands
pub struct WaitCommand;

#[async_trait]
impl Command for WaitCommand {
    fn name(&self) -> &str {
        "wait"
    }

    fn help(&self) -> Option<&str> {
        Some(
            "wait - pause before the next chained command
             usage: wait <seconds>",
        )
    }

    async fn run(&self, args: &[String]) -> Result<Option<String>> {
        let Some(raw) = args.first() else {
            bail!("missing duration argument");
        };
        let seconds: f64 = match raw.parse() {
            Ok(s) if s >= 0.0 && f64::is_finite(s) => s,
            _ => bail!("unexpected duration \"{}\"", raw),
        };
        tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::stick::{Side, STICK_CENTER};
    use crate::controller::ControllerState;
    use crate::transport::testing::RecordingTransport;

    fn make_state() -> SharedControllerState {
        Arc::new(tokio::sync::Mutex::new(ControllerState::new()))
    }

    #[tokio::test]
    async fn test_stick_sets_horizontal_value() {
        let state = make_state();
        let cmd = StickCommand::new(state.clone());

        let out = cmd
            .run(&["l".to_string(), "h".to_string(), "500".to_string()])
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("left stick set to (500, 2048)"));
        assert_eq!(state.lock().await.stick(Side::Left).get_h(), 500);
    }

    #[tokio::test]
    async fn test_stick_center_resets_both_axes() {
        let state = make_state();
        let cmd = StickCommand::new(state.clone());

        cmd.run(&["r".to_string(), "up".to_string()]).await.unwrap();
        cmd.run(&["r".to_string(), "center".to_string()])
            .await
            .unwrap();

        let guard = state.lock().await;
        let stick = guard.stick(Side::Right);
        assert_eq!((stick.get_h(), stick.get_v()), (STICK_CENTER, STICK_CENTER));
    }

    #[tokio::test]
    async fn test_stick_rejects_bad_tokens_and_leaves_state() {
        let state = make_state();
        let cmd = StickCommand::new(state.clone());

        assert!(cmd.run(&["m".to_string(), "up".to_string()]).await.is_err());
        assert!(cmd
            .run(&["l".to_string(), "h".to_string(), "fast".to_string()])
            .await
            .is_err());
        assert!(cmd
            .run(&["l".to_string(), "sideways".to_string()])
            .await
            .is_err());
        assert!(cmd.run(&["l".to_string(), "h".to_string()]).await.is_err());

        let guard = state.lock().await;
        assert_eq!(guard.stick(Side::Left).get_h(), STICK_CENTER);
        assert_eq!(guard.stick(Side::Left).get_v(), STICK_CENTER);
    }

    #[tokio::test]
    async fn test_hold_and_release_flush_reports() {
        let state = make_state();
        let transport = Arc::new(RecordingTransport::new());

        let hold = HoldCommand::new(state.clone(), transport.clone());
        hold.run(&["a".to_string()]).await.unwrap();
        assert!(state.lock().await.buttons().is_pressed("a"));

        let release = ReleaseCommand::new(state.clone(), transport.clone());
        release.run(&["a".to_string()]).await.unwrap();
        assert!(!state.lock().await.buttons().is_pressed("a"));

        assert_eq!(transport.reports().len(), 2);
    }

    #[tokio::test]
    async fn test_hold_rejects_unknown_button_without_pressing() {
        let state = make_state();
        let transport = Arc::new(RecordingTransport::new());
        let hold = HoldCommand::new(state.clone(), transport.clone());

        assert!(hold
            .run(&["a".to_string(), "bogus".to_string()])
            .await
            .is_err());
        assert!(!state.lock().await.buttons().is_pressed("a"));
        assert!(transport.reports().is_empty());
    }

    #[tokio::test]
    async fn test_wait_validates_duration() {
        let cmd = WaitCommand;
        assert!(cmd.run(&["0.001".to_string()]).await.is_ok());
        assert!(cmd.run(&[]).await.is_err());
        assert!(cmd.run(&["soon".to_string()]).await.is_err());
        assert!(cmd.run(&["-1".to_string()]).await.is_err());
    }
}
