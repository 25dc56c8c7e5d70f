//! Error types for discipline evaluation and service resolution.

use ac_core::CoreError;
use thiserror::Error;

/// Errors that can occur inside a discipline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: &'static str },

    #[error("Input '{name}' was not provided")]
    MissingInput { name: String },

    #[error("Input '{name}' is {actual}, expected {expected}")]
    WrongShape {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Output '{name}' was not declared")]
    UnknownOutput { name: String },

    #[error("Model error: {message}")]
    Model { message: String },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for CoreError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what } => CoreError::InvalidArg { what },
            ComponentError::InvalidArg { what } => CoreError::InvalidArg { what },
            _ => CoreError::InvalidArg {
                what: "discipline error",
            },
        }
    }
}

/// Service registration and resolution errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Implementation '{implementation}' of service '{service}' is already registered")]
    DuplicateImplementation {
        service: String,
        implementation: String,
    },

    #[error("Service '{service}' already defaults to '{existing}'; '{new}' cannot also be default")]
    ConflictingDefault {
        service: String,
        existing: String,
        new: String,
    },

    #[error("Unknown service '{service}'")]
    UnknownService { service: String },

    #[error("Service '{service}' has no implementation '{implementation}' (known: {known:?})")]
    UnknownImplementation {
        service: String,
        implementation: String,
        known: Vec<String>,
    },

    #[error(
        "Service '{service}' has several implementations and none is marked default: {candidates:?}"
    )]
    AmbiguousService {
        service: String,
        candidates: Vec<String>,
    },

    #[error("Implementation '{implementation}' of service '{service}' is unavailable: {reason}")]
    ImplementationUnavailable {
        service: String,
        implementation: String,
        reason: String,
    },

    #[error("Options {keys:?} are not accepted by '{implementation}' of service '{service}'")]
    InvalidOptions {
        service: String,
        implementation: String,
        keys: Vec<String>,
    },

    #[error("Factory for '{implementation}' of service '{service}' failed: {source}")]
    Factory {
        service: String,
        implementation: String,
        #[source]
        source: ComponentError,
    },

    #[error("Plugin '{plugin}' failed to register: {reason}")]
    Plugin { plugin: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
