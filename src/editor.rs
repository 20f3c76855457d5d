//! Parameter editors
//!
//! An editor binds one key of a [`SharedParameters`] store to a
//! toolkit-neutral [`Control`]. Rendering is left to the host. Every
//! [`ParameterEditor::apply`] writes straight through to the store, so
//! the next reader sees the new value without a commit step.
//!
//! ## Table of Contents
//! - **ParameterEditor**: Bind / setup / apply lifecycle
//! - **Control**: Widget model produced by `setup`
//! - **ControlInput**: A user edit fed back through `apply`
//! - **TimeLagEditor**: Spinner over `numTimeLags`, never below zero
//! - **DescriptorEditor**: Control for any registered key, clamped to its bounds

use crate::error::{CausalError, Result};
use crate::parameters::{keys, ParamDescriptor, ParamValue, SharedParameters};
use tracing::debug;

/// Widget model for one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Integer spinner with inclusive bounds
    IntSpinner {
        /// Current value
        value: i64,
        /// Lowest accepted value
        min: i64,
        /// Highest accepted value
        max: i64,
    },
    /// Floating-point field with inclusive bounds
    DoubleField {
        /// Current value
        value: f64,
        /// Lowest accepted value
        min: f64,
        /// Highest accepted value
        max: f64,
    },
    /// On/off toggle
    Checkbox {
        /// Current state
        checked: bool,
    },
    /// Free text
    TextField {
        /// Current text
        text: String,
    },
}

impl Control {
    /// Current value as stored in [`crate::Parameters`]
    pub fn value(&self) -> ParamValue {
        match self {
            Control::IntSpinner { value, .. } => ParamValue::Int(*value),
            Control::DoubleField { value, .. } => ParamValue::Double(*value),
            Control::Checkbox { checked } => ParamValue::Bool(*checked),
            Control::TextField { text } => ParamValue::Str(text.clone()),
        }
    }

    /// Build the control for `value`, clamped to `descriptor`'s bounds
    fn for_value(descriptor: &ParamDescriptor, value: ParamValue) -> Result<Self> {
        let mut control = match (&descriptor.default, &value) {
            (ParamValue::Int(_), ParamValue::Int(v)) => Control::IntSpinner {
                value: *v,
                min: descriptor.lower.map_or(i64::MIN, |l| l.ceil() as i64),
                max: descriptor.upper.map_or(i64::MAX, |u| u.floor() as i64),
            },
            (ParamValue::Double(_), ParamValue::Double(v)) if !v.is_finite() => {
                return Err(CausalError::ParameterRange {
                    key: descriptor.key.to_string(),
                    value: v.to_string(),
                    reason: "must be finite".to_string(),
                })
            }
            (ParamValue::Double(_), ParamValue::Double(v)) => Control::DoubleField {
                value: *v,
                min: descriptor.lower.unwrap_or(f64::NEG_INFINITY),
                max: descriptor.upper.unwrap_or(f64::INFINITY),
            },
            (ParamValue::Double(_), ParamValue::Int(v)) => Control::DoubleField {
                value: *v as f64,
                min: descriptor.lower.unwrap_or(f64::NEG_INFINITY),
                max: descriptor.upper.unwrap_or(f64::INFINITY),
            },
            (ParamValue::Bool(_), ParamValue::Bool(b)) => Control::Checkbox { checked: *b },
            (ParamValue::Str(_), ParamValue::Str(s)) => Control::TextField { text: s.clone() },
            (expected, actual) => {
                return Err(CausalError::ParameterType {
                    key: descriptor.key.to_string(),
                    expected: expected.type_name(),
                    actual: actual.type_name(),
                })
            }
        };
        control.clamp();
        Ok(control)
    }

    /// Replace the value with `input`, clamped to the bounds
    fn accept(&mut self, key: &str, input: ControlInput) -> Result<()> {
        if let ControlInput::Double(v) = input {
            if !v.is_finite() {
                return Err(CausalError::ParameterRange {
                    key: key.to_string(),
                    value: v.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
        match (&mut *self, input) {
            (Control::IntSpinner { value, .. }, ControlInput::Int(v)) => *value = v,
            (Control::DoubleField { value, .. }, ControlInput::Double(v)) => *value = v,
            (Control::DoubleField { value, .. }, ControlInput::Int(v)) => *value = v as f64,
            (Control::Checkbox { checked }, ControlInput::Bool(b)) => *checked = b,
            (Control::TextField { text }, ControlInput::Text(s)) => *text = s,
            (control, input) => {
                return Err(CausalError::ParameterType {
                    key: key.to_string(),
                    expected: control.value().type_name(),
                    actual: input.type_name(),
                })
            }
        }
        self.clamp();
        Ok(())
    }

    fn clamp(&mut self) {
        match self {
            Control::IntSpinner { value, min, max } => *value = (*value).clamp(*min, *max),
            Control::DoubleField { value, min, max } => {
                if *value < *min {
                    *value = *min;
                } else if *value > *max {
                    *value = *max;
                }
            }
            Control::Checkbox { .. } | Control::TextField { .. } => {}
        }
    }
}

/// A user edit
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    /// Spinner or numeric entry
    Int(i64),
    /// Numeric entry
    Double(f64),
    /// Toggle
    Bool(bool),
    /// Text entry
    Text(String),
}

impl ControlInput {
    fn type_name(&self) -> &'static str {
        match self {
            ControlInput::Int(_) => "integer",
            ControlInput::Double(_) => "double",
            ControlInput::Bool(_) => "boolean",
            ControlInput::Text(_) => "string",
        }
    }
}

/// View over one or more keys of a shared parameter store
pub trait ParameterEditor {
    /// Bind to `params`, replacing any previous binding
    fn set_params(&mut self, params: SharedParameters);

    /// Build the control from the bound store's current values
    fn setup(&mut self) -> Result<()>;

    /// Whether the host must show this editor even when it looks trivial
    fn must_be_shown(&self) -> bool;

    /// Control built by the last `setup`
    fn control(&self) -> Option<&Control>;

    /// Apply a user edit and write the result through to the store
    fn apply(&mut self, input: ControlInput) -> Result<()>;
}

/// Shared state of the single-key editors below
#[derive(Debug, Default)]
struct Binding {
    params: Option<SharedParameters>,
    control: Option<Control>,
}

impl Binding {
    fn params(&self, key: &str) -> Result<&SharedParameters> {
        self.params.as_ref().ok_or_else(|| {
            CausalError::config(format!("editor for '{}' has no parameters bound", key))
        })
    }

    fn rebind(&mut self, params: SharedParameters) {
        self.params = Some(params);
        self.control = None;
    }

    fn apply(&mut self, key: &str, input: ControlInput) -> Result<()> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| CausalError::config(format!("editor for '{}' has no parameters bound", key)))?;
        let control = self
            .control
            .as_mut()
            .ok_or_else(|| CausalError::config(format!("editor for '{}' was not set up", key)))?;

        control.accept(key, input)?;
        let value = control.value();
        debug!(key, value = %value, "Parameter edited");
        params.write().set(key, value);
        Ok(())
    }
}

/// Spinner over `numTimeLags`
///
/// The initial value falls back to 1 when the store has none. Edits
/// below zero are clamped to zero.
#[derive(Debug, Default)]
pub struct TimeLagEditor {
    binding: Binding,
}

impl TimeLagEditor {
    /// Create an unbound editor
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParameterEditor for TimeLagEditor {
    fn set_params(&mut self, params: SharedParameters) {
        self.binding.rebind(params);
    }

    fn setup(&mut self) -> Result<()> {
        let lags = self
            .binding
            .params(keys::NUM_TIME_LAGS)?
            .read()
            .get_int(keys::NUM_TIME_LAGS, 1)?;
        let mut control = Control::IntSpinner {
            value: lags,
            min: 0,
            max: i64::MAX,
        };
        control.clamp();
        self.binding.control = Some(control);
        Ok(())
    }

    fn must_be_shown(&self) -> bool {
        true
    }

    fn control(&self) -> Option<&Control> {
        self.binding.control.as_ref()
    }

    fn apply(&mut self, input: ControlInput) -> Result<()> {
        self.binding.apply(keys::NUM_TIME_LAGS, input)
    }
}

/// Editor for any key in the descriptor registry
#[derive(Debug)]
pub struct DescriptorEditor {
    descriptor: &'static ParamDescriptor,
    binding: Binding,
}

impl DescriptorEditor {
    /// Editor for `key`; fails for keys without a descriptor
    pub fn new(key: &str) -> Result<Self> {
        let descriptor = ParamDescriptor::find(key)
            .ok_or_else(|| CausalError::UnknownParameter(key.to_string()))?;
        Ok(Self {
            descriptor,
            binding: Binding::default(),
        })
    }

    /// Descriptor the control is built from
    pub fn descriptor(&self) -> &'static ParamDescriptor {
        self.descriptor
    }
}

impl ParameterEditor for DescriptorEditor {
    fn set_params(&mut self, params: SharedParameters) {
        self.binding.rebind(params);
    }

    fn setup(&mut self) -> Result<()> {
        let current = self
            .binding
            .params(self.descriptor.key)?
            .read()
            .get(self.descriptor.key)
            .cloned()
            .unwrap_or_else(|| self.descriptor.default.clone());
        self.binding.control = Some(Control::for_value(self.descriptor, current)?);
        Ok(())
    }

    fn must_be_shown(&self) -> bool {
        false
    }

    fn control(&self) -> Option<&Control> {
        self.binding.control.as_ref()
    }

    fn apply(&mut self, input: ControlInput) -> Result<()> {
        self.binding.apply(self.descriptor.key, input)
    }
}
