//! Error codes and exit status for aeroctl

use aero_common::AeroError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when a command is not valid in the current state or input is bad
pub const EXIT_INVALID_COMMAND: i32 = 64;

/// Exit code when the backend returns a body that cannot be decoded
pub const EXIT_INVALID_RESPONSE: i32 = 65;

/// Exit code when the backend is unreachable or failing
pub const EXIT_BACKEND_UNAVAILABLE: i32 = 70;

pub fn exit_code_for(err: &AeroError) -> i32 {
    match err {
        AeroError::Unreachable { .. } => EXIT_BACKEND_UNAVAILABLE,
        AeroError::Backend { .. } if err.is_transient() => EXIT_BACKEND_UNAVAILABLE,
        AeroError::Decode { .. } => EXIT_INVALID_RESPONSE,
        AeroError::Busy(_) => EXIT_INVALID_COMMAND,
        _ if err.is_validation() => EXIT_INVALID_COMMAND,
        _ => EXIT_GENERAL_ERROR,
    }
}

/// Exit code for an error chain from the binary edge
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AeroError>())
        .map_or(EXIT_GENERAL_ERROR, exit_code_for)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let unreachable = AeroError::Unreachable {
            url: "http://localhost:8000".into(),
            message: "refused".into(),
        };
        assert_eq!(exit_code_for(&unreachable), EXIT_BACKEND_UNAVAILABLE);
        assert_eq!(
            exit_code_for(&AeroError::InvalidDelay("x".into())),
            EXIT_INVALID_COMMAND
        );
        assert_eq!(
            exit_code_for(&AeroError::Backend {
                endpoint: "/resolve".into(),
                status: 422,
                body: String::new()
            }),
            EXIT_GENERAL_ERROR
        );
    }

    #[test]
    fn test_exit_code_through_context() {
        let result: Result<(), AeroError> = Err(AeroError::Decode {
            endpoint: "/data".into(),
            message: "eof".into(),
        });
        let err = result.context("status failed").unwrap_err();
        assert_eq!(exit_code(&err), EXIT_INVALID_RESPONSE);
    }
}
