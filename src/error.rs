// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur in the library.

use crate::model::SolveStatus;

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub(crate) fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                        status: None,
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (Implausible, implausible),
    (Internal, internal),
    (InvalidConfig, invalid_config),
    (InvalidNetwork, invalid_network),
    (InvalidNode, invalid_node),
    (InvalidProportions, invalid_proportions),
    (InvalidUnit, invalid_unit),
    (NodeNotFound, node_not_found),
    (NotImplemented, not_implemented),
    (SolveFailed, solve_failed)
);

/// An error that can occur while building, solving or checking a
/// [Network][crate::Network].
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
    status: Option<SolveStatus>,
}

impl Error {
    /// Creates a `SolveFailed` error carrying the solver's termination status.
    pub(crate) fn solve_failed_with(status: SolveStatus, desc: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::SolveFailed,
            desc: desc.into(),
            status: Some(status),
        }
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human readable description of the error.
    pub fn description(&self) -> &str {
        &self.desc
    }

    /// Returns the solver termination status, for errors of kind
    /// [`ErrorKind::SolveFailed`].
    pub fn status(&self) -> Option<SolveStatus> {
        self.status
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.kind, status, self.desc),
            None => write!(f, "{}: {}", self.kind, self.desc),
        }
    }
}

impl std::error::Error for Error {}
