use thiserror::Error;

use lodestone_core::DevicePath;

/// Errors surfaced synchronously to driver callers.
///
/// These all mean the caller asked for something the session cannot do right
/// now; transport and protocol failures never appear here — they are logged
/// and retried internally by the reconnect supervisor.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A command was issued against a session with no live connection.
    #[error("Reader at {path} is not connected")]
    NotConnected { path: DevicePath },

    /// The session's outgoing command channel is full.
    ///
    /// Callers issue commands at human cadence; a full channel means the
    /// send loop is wedged, and blocking on it would spread the problem.
    #[error("Command channel for reader at {path} is full")]
    CommandBacklog { path: DevicePath },

    /// The controller was stopped; its registry no longer accepts sessions.
    #[error("Controller is stopped")]
    ControllerStopped,

    /// The command itself was malformed (wrong trait count, bad depletion
    /// marker pairing, invalid name).
    #[error(transparent)]
    Invalid(#[from] lodestone_core::Error),
}

impl DriverError {
    /// Create a not-connected error for a session path.
    pub fn not_connected(path: &DevicePath) -> Self {
        Self::NotConnected { path: path.clone() }
    }

    /// Create a command-backlog error for a session path.
    pub fn command_backlog(path: &DevicePath) -> Self {
        Self::CommandBacklog { path: path.clone() }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_path() {
        let path = DevicePath::new("/dev/ttyUSB0").unwrap();
        assert_eq!(
            DriverError::not_connected(&path).to_string(),
            "Reader at /dev/ttyUSB0 is not connected"
        );
        assert_eq!(
            DriverError::command_backlog(&path).to_string(),
            "Command channel for reader at /dev/ttyUSB0 is full"
        );
    }

    #[test]
    fn core_validation_errors_pass_through() {
        let err: DriverError = lodestone_core::Error::invalid_device_name("name is empty").into();
        assert_eq!(err.to_string(), "Invalid device name: name is empty");
    }
}
