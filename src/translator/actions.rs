//! Structured action chains
//!
//! A chain is an ordered list of typed actions rather than a command string,
//! so release synthesis is a data transformation: presses become releases and
//! stick motions collapse to center. Chains still read and print in command
//! syntax (`hold a && stick l h 3200`) for config files and logs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::parser::{Invocation, CHAIN_SEPARATOR};
use crate::controller::stick::{Side, StickMotion, StickParseError};

/// One controller mutation derived from an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Press a button and keep it pressed
    Press(String),
    /// Release a held button
    Release(String),
    /// Move a stick
    Stick { side: Side, motion: StickMotion },
}

impl Action {
    /// The action emitted when a hold on this action expires
    pub fn released(&self) -> Action {
        match self {
            Action::Press(button) => Action::Release(button.clone()),
            Action::Release(button) => Action::Release(button.clone()),
            Action::Stick { side, .. } => Action::Stick {
                side: *side,
                motion: StickMotion::Center,
            },
        }
    }

    pub fn is_stick(&self) -> bool {
        matches!(self, Action::Stick { .. })
    }

    /// Render to an invocation for the shared dispatch path
    pub fn to_invocation(&self) -> Invocation {
        match self {
            Action::Press(button) => Invocation::new("hold", vec![button.clone()]),
            Action::Release(button) => Invocation::new("release", vec![button.clone()]),
            Action::Stick { side, motion } => {
                let mut args = vec![side.token().to_string()];
                args.extend(motion.tokens());
                Invocation::new("stick", args)
            }
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inv = self.to_invocation();
        write!(f, "{}", inv.name)?;
        for arg in &inv.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainParseError {
    #[error("empty action clause")]
    EmptyClause,
    #[error("unknown action \"{0}\" (expected hold, release or stick)")]
    UnknownAction(String),
    #[error("\"{0}\" takes at least one button name")]
    MissingButton(String),
    #[error("stick action takes a side (\"l\", \"left\", \"r\", \"right\"), got \"{0}\"")]
    BadSide(String),
    #[error("stick action is missing a direction")]
    MissingDirection,
    #[error(transparent)]
    Stick(#[from] StickParseError),
}

/// Ordered list of actions executed left-to-right
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionChain(Vec<Action>);

impl ActionChain {
    pub fn new(actions: Vec<Action>) -> Self {
        Self(actions)
    }

    /// Parse command syntax: clauses joined by `&&`, each `hold <buttons..>`,
    /// `release <buttons..>` or `stick <side> <direction> [value]`.
    pub fn parse(text: &str) -> Result<Self, ChainParseError> {
        let mut actions = Vec::new();

        for clause in text.split(CHAIN_SEPARATOR) {
            let tokens: Vec<&str> = clause.split_whitespace().collect();
            let Some((&name, args)) = tokens.split_first() else {
                return Err(ChainParseError::EmptyClause);
            };

            match name {
                "hold" | "release" => {
                    if args.is_empty() {
                        return Err(ChainParseError::MissingButton(name.to_string()));
                    }
                    for &button in args {
                        actions.push(if name == "hold" {
                            Action::Press(button.to_string())
                        } else {
                            Action::Release(button.to_string())
                        });
                    }
                }
                "stick" => {
                    let side_token = args.first().ok_or(ChainParseError::MissingDirection)?;
                    let side = Side::from_token(side_token)
                        .ok_or_else(|| ChainParseError::BadSide(side_token.to_string()))?;
                    let direction = args.get(1).ok_or(ChainParseError::MissingDirection)?;
                    let motion = StickMotion::from_tokens(direction, args.get(2).copied())?;
                    actions.push(Action::Stick { side, motion });
                }
                other => return Err(ChainParseError::UnknownAction(other.to_string())),
            }
        }

        Ok(Self(actions))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn actions(&self) -> &[Action] {
        &self.0
    }

    /// Any stick action present (selects the longer hold duration)
    pub fn has_stick(&self) -> bool {
        self.0.iter().any(Action::is_stick)
    }

    /// The chain synthesized when this chain's hold expires
    pub fn released(&self) -> ActionChain {
        Self(self.0.iter().map(Action::released).collect())
    }

    /// Only the first action (menu-mode gating)
    pub fn truncated(&self) -> ActionChain {
        Self(self.0.first().cloned().into_iter().collect())
    }

    /// Render for the shared dispatch path
    pub fn to_invocations(&self) -> Vec<Invocation> {
        self.0.iter().map(Action::to_invocation).collect()
    }
}

impl std::fmt::Display for ActionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, action) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", CHAIN_SEPARATOR)?;
            }
            write!(f, "{}", action)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for ActionChain {
    type Error = ChainParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ActionChain> for String {
    fn from(chain: ActionChain) -> Self {
        chain.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hold_pair() {
        let chain = ActionChain::parse("hold a&&hold y").unwrap();
        assert_eq!(
            chain.actions(),
            &[
                Action::Press("a".to_string()),
                Action::Press("y".to_string())
            ]
        );
        assert!(!chain.has_stick());
    }

    #[test]
    fn test_parse_multi_button_clause() {
        let chain = ActionChain::parse("hold l zl").unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_parse_stick_clause() {
        let chain = ActionChain::parse("stick l h 3200&&stick r h 3200").unwrap();
        assert_eq!(
            chain.actions()[0],
            Action::Stick {
                side: Side::Left,
                motion: StickMotion::Horizontal(3200),
            }
        );
        assert!(chain.has_stick());
    }

    #[test]
    fn test_parse_rejects_unknown_clause() {
        assert_eq!(
            ActionChain::parse("mash a"),
            Err(ChainParseError::UnknownAction("mash".to_string()))
        );
        assert_eq!(
            ActionChain::parse("hold"),
            Err(ChainParseError::MissingButton("hold".to_string()))
        );
        assert_eq!(
            ActionChain::parse("stick m up"),
            Err(ChainParseError::BadSide("m".to_string()))
        );
    }

    #[test]
    fn test_release_synthesis_is_structural() {
        let chain = ActionChain::parse("hold b&&stick l up").unwrap();
        let released = chain.released();
        assert_eq!(
            released.actions(),
            &[
                Action::Release("b".to_string()),
                Action::Stick {
                    side: Side::Left,
                    motion: StickMotion::Center,
                }
            ]
        );
    }

    #[test]
    fn test_truncated_keeps_first_action() {
        let chain = ActionChain::parse("hold a&&hold y").unwrap();
        assert_eq!(
            chain.truncated().actions(),
            &[Action::Press("a".to_string())]
        );
        assert!(ActionChain::default().truncated().is_empty());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let chain = ActionChain::parse("hold b&&stick l center").unwrap();
        assert_eq!(chain.to_string(), "hold b && stick l center");
        assert_eq!(ActionChain::parse(&chain.to_string()).unwrap(), chain);
    }

    #[test]
    fn test_to_invocations_matches_console_syntax() {
        let chain = ActionChain::parse("stick l h 848").unwrap();
        let invocations = chain.to_invocations();
        assert_eq!(invocations[0].name, "stick");
        assert_eq!(invocations[0].args, vec!["l", "h", "848"]);
    }
}
