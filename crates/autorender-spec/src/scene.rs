//! Animated scene config types.

use serde::{Deserialize, Serialize};

/// Parameters of the `animated_scene` variant.
///
/// Every listed action is baked to keyframes on `object_name` and placed on
/// its own NLA track before the scene is exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimatedSceneConfig {
    /// Object the actions are baked on.
    pub object_name: String,

    /// Actions to bake, in bake order.
    #[serde(default)]
    pub action_configs: Vec<ActionConfig>,
}

impl AnimatedSceneConfig {
    /// Creates a config without actions.
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            action_configs: Vec::new(),
        }
    }

    /// Adds an action.
    pub fn with_action(mut self, action: ActionConfig) -> Self {
        self.action_configs.push(action);
        self
    }

    /// Names of the configured actions, in order.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.action_configs.iter().map(|a| a.action_name.as_str())
    }
}

/// One action to bake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Name of the action in the source scene.
    pub action_name: String,

    /// Frame distance between baked keyframes.
    #[serde(default = "default_bake_step")]
    pub bake_step: u32,
}

fn default_bake_step() -> u32 {
    1
}

impl ActionConfig {
    /// Creates an action config baked on every frame.
    pub fn new(action_name: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            bake_step: default_bake_step(),
        }
    }

    /// Sets the bake step.
    pub fn with_step(mut self, bake_step: u32) -> Self {
        self.bake_step = bake_step;
        self
    }
}
