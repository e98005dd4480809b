use thiserror::Error;

/// A baseline fact table is missing a field or carries an unusable value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Missing baseline fact: {group}.{key}")]
    MissingFact { group: String, key: String },

    #[error("Malformed baseline fact {group}.{key}: {reason}")]
    MalformedFact {
        group: String,
        key: String,
        reason: String,
    },

    #[error("Unknown fact group: {0}")]
    UnknownGroup(String),
}

/// A projection was requested before the model was ready for it
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("Levers have not been initialized; call initialize_levers() before projecting")]
    LeversUninitialized,

    #[error("Levers are already initialized for this model")]
    LeversAlreadyInitialized,
}

/// An arithmetic precondition of the projection was violated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Division by zero: {field} must be non-zero")]
    ZeroDenominator { field: &'static str },

    #[error("Non-positive required quantity: {quantity} = {value}")]
    NonPositive { quantity: &'static str, value: f64 },

    #[error("Negative quantity: {quantity} = {value}")]
    Negative { quantity: &'static str, value: f64 },

    #[error("No feasible fleet: trucks_total = {trucks}")]
    InfeasibleFleet { trucks: u32 },

    #[error("Non-finite result for {quantity}")]
    NonFinite { quantity: &'static str },

    #[error("Invalid value {value} for lever {lever}: {reason}")]
    InvalidLever {
        lever: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Top level error for the projection engine and its drivers
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Scenario {index} failed with parameters {parameters}: {source}")]
    ScenarioFailed {
        index: usize,
        parameters: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Scenario worker panicked")]
    WorkerPanicked,
}

impl Error {
    pub fn scenario_failed(index: usize, parameters: impl Into<String>, source: Error) -> Self {
        Self::ScenarioFailed {
            index,
            parameters: parameters.into(),
            source: Box::new(source),
        }
    }

    /// The domain error at the root of this error, if any
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            Self::ScenarioFailed { source, .. } => source.as_domain(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_names_the_field() {
        let err: Error = DomainError::ZeroDenominator {
            field: "productivity.avg_num_trucks",
        }
        .into();
        assert!(err.to_string().contains("productivity.avg_num_trucks"));
    }

    #[test]
    fn test_scenario_failure_keeps_root_domain_error() {
        let root: Error = DomainError::InfeasibleFleet { trucks: 0 }.into();
        let err = Error::scenario_failed(3, "trucks_total=0", root);

        assert_eq!(
            err.as_domain(),
            Some(&DomainError::InfeasibleFleet { trucks: 0 })
        );
        assert!(err.to_string().contains("trucks_total=0"));
    }

    #[test]
    fn test_state_error_message() {
        let err: Error = StateError::LeversUninitialized.into();
        assert!(err.to_string().contains("initialize_levers"));
    }
}
