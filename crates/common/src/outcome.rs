//! Railway-style outcome type for business operations.
//!
//! Every domain operation returns an [`Outcome`] instead of panicking or
//! raising an error for an expected rule violation. Fatal problems
//! (misconfiguration, storage failures) travel separately as `Err` values of
//! each crate's error enum.

use serde::{Deserialize, Serialize};

const UNSPECIFIED_FAILURE: &str = "Operation failed.";

/// The messages of a failed [`Outcome`].
///
/// Always holds at least one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Failure {
    messages: Vec<String>,
}

impl Failure {
    /// Creates a failure with a single message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Creates a failure from an ordered list of messages.
    ///
    /// An empty list yields a single generic message.
    pub fn from_messages<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if messages.is_empty() {
            return Self::new(UNSPECIFIED_FAILURE);
        }
        Self { messages }
    }

    /// Returns the messages in the order they were recorded.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Appends the messages of another failure after this one's.
    pub fn merge(&mut self, other: Failure) {
        self.messages.extend(other.messages);
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

impl std::error::Error for Failure {}

/// Outcome of a business operation: either `Ok` with a value or `Fail` with
/// one or more human-readable messages.
///
/// A `Fail` never carries a value and an `Ok` never carries messages.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data")]
pub enum Outcome<T = ()> {
    /// The operation succeeded.
    Ok(T),
    /// The operation was rejected by a business rule.
    Fail(Failure),
}

impl Outcome<()> {
    /// A successful outcome with no value.
    pub fn ok() -> Self {
        Outcome::Ok(())
    }
}

impl<T> Outcome<T> {
    /// A successful outcome carrying `value`.
    pub fn ok_with(value: T) -> Self {
        Outcome::Ok(value)
    }

    /// A failed outcome with a single message.
    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Fail(Failure::new(message))
    }

    /// A failed outcome with several messages, order preserved.
    pub fn fail_many<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Outcome::Fail(Failure::from_messages(messages))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// Returns the value if the outcome is `Ok`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Fail(_) => None,
        }
    }

    /// Consumes the outcome, returning the value if it is `Ok`.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Fail(_) => None,
        }
    }

    /// Returns the failure messages; empty for `Ok`.
    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Ok(_) => &[],
            Outcome::Fail(failure) => failure.messages(),
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Fail(failure) => Some(failure),
        }
    }

    /// Continues with `f` when `Ok`; a `Fail` is propagated untouched and
    /// `f` is never invoked.
    pub fn then<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Outcome::Ok(value) => f(value),
            Outcome::Fail(failure) => Outcome::Fail(failure),
        }
    }

    /// Runs a side effect on the value when `Ok`, dropping the value.
    pub fn then_do<F>(self, f: F) -> Outcome<()>
    where
        F: FnOnce(T),
    {
        match self {
            Outcome::Ok(value) => {
                f(value);
                Outcome::Ok(())
            }
            Outcome::Fail(failure) => Outcome::Fail(failure),
        }
    }

    /// Transforms the value when `Ok`.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Fail(failure) => Outcome::Fail(failure),
        }
    }

    /// Converts into a standard `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Fail(failure) => Err(failure),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Outcome::Fail(failure)
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(failure) => Outcome::Fail(failure),
        }
    }
}

/// Combines several outcomes into one.
///
/// `Ok` with every value when all succeed; otherwise a `Fail` holding the
/// messages of every failed input, in input order.
pub fn combine<T, I>(outcomes: I) -> Outcome<Vec<T>>
where
    I: IntoIterator<Item = Outcome<T>>,
{
    let mut values = Vec::new();
    let mut failure: Option<Failure> = None;

    for outcome in outcomes {
        match outcome {
            Outcome::Ok(value) => values.push(value),
            Outcome::Fail(next) => match failure.as_mut() {
                Some(existing) => existing.merge(next),
                None => failure = Some(next),
            },
        }
    }

    match failure {
        Some(failure) => Outcome::Fail(failure),
        None => Outcome::Ok(values),
    }
}
