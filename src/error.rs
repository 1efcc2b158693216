// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error types for filter operations

use std::fmt;

/// ErrorKind is all kinds of Error of bloomcascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The argument provided is invalid.
    InvalidArgument,
    /// The filters differ in bit count or false positive probability.
    IncompatibleFilters,
    /// The encoded data carries an unknown format version.
    UnknownEncoding,
    /// The encoded data is shorter, or longer, than its header promises.
    DataTooShort,
    /// The encoded data decodes into values no filter can hold.
    InvalidData,
    /// A dynamic filter cannot grow any further.
    Overflow,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::IncompatibleFilters => "IncompatibleFilters",
            ErrorKind::UnknownEncoding => "UnknownEncoding",
            ErrorKind::DataTooShort => "DataTooShort",
            ErrorKind::InvalidData => "InvalidData",
            ErrorKind::Overflow => "Overflow",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all bloomcascade functions.
///
/// # Examples
///
/// ```
/// # use bloomcascade::error::Error;
/// # use bloomcascade::error::ErrorKind;
/// let err = Error::new(ErrorKind::InvalidArgument, "bad input");
/// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
/// assert_eq!(err.message(), "bad input");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

// Convenient constructors used within bloomcascade crate.
impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, msg)
    }

    pub(crate) fn incompatible_filters(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::IncompatibleFilters, msg)
    }

    pub(crate) fn unknown_encoding(expected: u8, actual: u8) -> Self {
        Self::new(
            ErrorKind::UnknownEncoding,
            format!("unknown encoding version: expected {expected}, got {actual}"),
        )
    }

    pub(crate) fn data_too_short(msg: impl fmt::Display) -> Self {
        Self::new(ErrorKind::DataTooShort, format!("data too short: {msg}"))
    }

    pub(crate) fn trailing_data(extra: usize) -> Self {
        Self::new(
            ErrorKind::DataTooShort,
            format!("{extra} unexpected trailing bytes"),
        )
    }

    pub(crate) fn invalid_data(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, msg)
    }

    pub(crate) fn overflow(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Overflow, msg)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            for (i, (k, v)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k}: {v}")?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_context() {
        let err = Error::incompatible_filters("different number of bits");
        assert_eq!(
            err.to_string(),
            "IncompatibleFilters => different number of bits"
        );
    }

    #[test]
    fn test_display_with_context() {
        let err = Error::data_too_short("header")
            .with_context("filter", 2)
            .with_context("expected", 41);
        assert_eq!(
            err.to_string(),
            "DataTooShort, context: { filter: 2, expected: 41 } => data too short: header"
        );
    }

    #[test]
    fn test_unknown_encoding_message() {
        let err = Error::unknown_encoding(1, 7);
        assert_eq!(err.kind(), ErrorKind::UnknownEncoding);
        assert_eq!(err.message(), "unknown encoding version: expected 1, got 7");
    }
}
