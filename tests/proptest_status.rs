//! Property-based tests for operation status parsing using proptest
//!
//! Status strings come from the service and are not under our control, so
//! parsing must be total and terminal-state classification must be exact.

use aznet::OperationStatus;
use proptest::prelude::*;

const TERMINAL_SPELLINGS: &[&str] = &["Succeeded", "Completed", "Failed", "Canceled", "Cancelled"];

proptest! {
    /// Parsing never panics and unknown spellings are never terminal
    #[test]
    fn parse_is_total(value in ".*") {
        let status = OperationStatus::parse(&value);
        if status.is_terminal() {
            prop_assert!(TERMINAL_SPELLINGS.contains(&value.as_str()));
        }
    }

    /// Exactly the documented spellings reach a terminal state
    #[test]
    fn terminal_iff_known_spelling(value in "[A-Za-z]{0,12}") {
        let status = OperationStatus::parse(&value);
        prop_assert_eq!(
            status.is_terminal(),
            TERMINAL_SPELLINGS.contains(&value.as_str())
        );
    }

    /// Display output parses back to the same status
    #[test]
    fn display_round_trips(value in ".*") {
        let status = OperationStatus::parse(&value);
        prop_assert_eq!(OperationStatus::parse(&status.to_string()), status);
    }

    /// Failure implies terminality
    #[test]
    fn failed_is_terminal(value in ".*") {
        let status = OperationStatus::parse(&value);
        if status.is_failed() {
            prop_assert!(status.is_terminal());
        }
    }
}
