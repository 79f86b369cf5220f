use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn next(self) -> Self {
                Self(self.0.wrapping_add(1))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(Generation);
id_newtype!(RequestId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Edible,
    Poisonous,
}

impl Verdict {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "edible" => Some(Self::Edible),
            "poisonous" => Some(Self::Poisonous),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edible => "edible",
            Self::Poisonous => "poisonous",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub edible: f64,
    pub poisonous: f64,
}

impl Probabilities {
    pub fn sum(&self) -> f64 {
        self.edible + self.poisonous
    }

    pub fn of(&self, verdict: Verdict) -> f64 {
        match verdict {
            Verdict::Edible => self.edible,
            Verdict::Poisonous => self.poisonous,
        }
    }
}

/// Position of a session in the interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Selected,
    Predicting,
    Predicted,
    VisualizeRequested,
    Visualized,
    /// Reserved. Service failures return to the previous stable phase with
    /// `last_error` set; no controller transition enters this phase.
    Failed,
}

impl Phase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Predicting | Self::VisualizeRequested)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected => "selected",
            Self::Predicting => "predicting",
            Self::Predicted => "predicted",
            Self::VisualizeRequested => "visualize_requested",
            Self::Visualized => "visualized",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Predict,
    Visualize,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predict => "predict",
            Self::Visualize => "visualize",
        }
    }
}
