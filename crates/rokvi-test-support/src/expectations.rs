//! Strict expectation engine backing the fakes.
//!
//! Each expectation pairs a matcher with a responder. The most recently
//! registered matching expectation answers a call; a call nothing matches is
//! recorded and then panics so the failure surfaces at the call site.

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

type Matcher<A> = Box<dyn Fn(&A) -> bool + Send + Sync>;
type Responder<A, R> = Box<dyn Fn(&A) -> R + Send + Sync>;

/// Unmet expectations and unexpected calls collected at teardown.
#[derive(Debug, Error)]
#[error("mock verification failed")]
pub struct VerificationError {
    /// One line per failure.
    pub failures: Vec<String>,
}

impl VerificationError {
    /// `Ok` when `failures` is empty.
    ///
    /// # Errors
    ///
    /// Returns the collected failures otherwise.
    pub fn check(failures: Vec<String>) -> Result<(), Self> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Self { failures })
        }
    }
}

/// A fake whose expectations can be verified.
pub trait Verifiable {
    /// Failures observed so far; empty when every expectation was met.
    fn failures(&self) -> Vec<String>;

    /// Verify every expectation.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] listing unmet expectations and
    /// unexpected calls.
    fn verify(&self) -> Result<(), VerificationError> {
        VerificationError::check(self.failures())
    }
}

struct Expectation<A, R> {
    description: String,
    matcher: Matcher<A>,
    responder: Responder<A, R>,
    times: Option<usize>,
    calls: usize,
}

struct State<A, R> {
    expectations: Vec<Expectation<A, R>>,
    unexpected: Vec<String>,
}

/// Expectations and observed calls for a single method.
pub struct MethodMock<A, R> {
    method: &'static str,
    state: Mutex<State<A, R>>,
}

impl<A, R> Debug for MethodMock<A, R> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MethodMock")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl<A: Debug, R> MethodMock<A, R> {
    /// Mock for `method` with no expectations.
    #[must_use]
    pub const fn new(method: &'static str) -> Self {
        Self {
            method,
            state: Mutex::new(State {
                expectations: Vec::new(),
                unexpected: Vec::new(),
            }),
        }
    }

    /// Start an expectation matching any arguments.
    #[must_use]
    pub fn expect(&self) -> ExpectationBuilder<'_, A, R> {
        ExpectationBuilder {
            mock: self,
            description: "any arguments".to_string(),
            matcher: Box::new(|_| true),
            times: None,
        }
    }

    /// Answer a call from the latest matching expectation.
    ///
    /// # Panics
    ///
    /// Panics when no expectation matches `args`.
    pub fn call(&self, args: A) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(expectation) = state
            .expectations
            .iter_mut()
            .rev()
            .find(|expectation| (expectation.matcher)(&args))
        {
            expectation.calls += 1;
            return (expectation.responder)(&args);
        }
        let call = format!("{}({args:?})", self.method);
        state.unexpected.push(call.clone());
        drop(state);
        panic!("unexpected call to {call}");
    }

    /// Number of calls answered by any expectation.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .expectations
            .iter()
            .map(|expectation| expectation.calls)
            .sum()
    }

    fn push(&self, expectation: Expectation<A, R>) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .expectations
            .push(expectation);
    }
}

impl<A, R> Verifiable for MethodMock<A, R> {
    fn failures(&self) -> Vec<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut failures: Vec<String> = state
            .expectations
            .iter()
            .filter_map(|expectation| match expectation.times {
                Some(times) if expectation.calls != times => Some(format!(
                    "{}: expectation `{}` invoked {} times, expected {times}",
                    self.method, expectation.description, expectation.calls
                )),
                None if expectation.calls == 0 => Some(format!(
                    "{}: expectation `{}` was never invoked",
                    self.method, expectation.description
                )),
                _ => None,
            })
            .collect();
        failures.extend(
            state
                .unexpected
                .iter()
                .map(|call| format!("{}: unexpected call {call}", self.method)),
        );
        failures
    }
}

/// Staged expectation; registered by [`ExpectationBuilder::returning`].
pub struct ExpectationBuilder<'a, A, R> {
    mock: &'a MethodMock<A, R>,
    description: String,
    matcher: Matcher<A>,
    times: Option<usize>,
}

impl<A: Debug, R> ExpectationBuilder<'_, A, R> {
    /// Only match arguments accepted by `matcher`.
    #[must_use]
    pub fn with(
        mut self,
        description: impl Into<String>,
        matcher: impl Fn(&A) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.description = description.into();
        self.matcher = Box::new(matcher);
        self
    }

    /// Require exactly `times` invocations instead of at least one.
    #[must_use]
    pub const fn times(mut self, times: usize) -> Self {
        self.times = Some(times);
        self
    }

    /// Register the expectation answering with `responder`.
    pub fn returning(self, responder: impl Fn(&A) -> R + Send + Sync + 'static) {
        self.mock.push(Expectation {
            description: self.description,
            matcher: self.matcher,
            responder: Box::new(responder),
            times: self.times,
            calls: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_matching_expectation_answers() {
        let mock = MethodMock::<u32, &'static str>::new("lookup");
        mock.expect().returning(|_| "any");
        mock.expect().with("seven", |value| *value == 7).returning(|_| "seven");

        assert_eq!(mock.call(7), "seven");
        assert_eq!(mock.call(3), "any");
        assert_eq!(mock.call_count(), 2);
        assert!(mock.verify().is_ok());
    }

    #[test]
    fn unmet_and_miscounted_expectations_fail_verification() {
        let mock = MethodMock::<u32, u32>::new("double");
        mock.expect().with("one", |value| *value == 1).returning(|v| v * 2);
        mock.expect()
            .with("two", |value| *value == 2)
            .times(2)
            .returning(|v| v * 2);
        mock.call(2);

        let Err(err) = mock.verify() else {
            panic!("verification should fail");
        };
        assert_eq!(err.to_string(), "mock verification failed");
        assert_eq!(
            err.failures,
            vec![
                "double: expectation `one` was never invoked",
                "double: expectation `two` invoked 1 times, expected 2",
            ]
        );
    }

    #[test]
    #[should_panic(expected = "unexpected call to lookup(9)")]
    fn unmatched_call_panics() {
        let mock = MethodMock::<u32, u32>::new("lookup");
        mock.expect().with("one", |value| *value == 1).returning(|_| 1);
        mock.call(9);
    }

    #[test]
    fn unmatched_call_is_reported_after_the_panic() {
        let mock = MethodMock::<u32, u32>::new("lookup");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| mock.call(9)));
        assert!(outcome.is_err());
        assert_eq!(
            mock.failures(),
            vec!["lookup: unexpected call lookup(9)"]
        );
    }
}
