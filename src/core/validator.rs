//! Pluggable validators
//!
//! Both the declarative schema and the component-native validity flags are
//! [`Validator`]s. Validators compose with [`Validator::and`], which runs
//! both sides and merges their field errors.

use futures::future::{self, LocalBoxFuture};

use crate::core::error::{FieldErrors, Validation};
use crate::core::values::FormValues;

/// A check over the complete value map
///
/// Implementations report every failing field in one pass and may return
/// coerced values (e.g. trimmed strings) on success.
pub trait Validator {
    fn validate(&self, values: &FormValues) -> Validation;

    /// Run `self`, then `next` over the output, merging errors from both
    fn and<V: Validator>(self, next: V) -> Merged<Self, V>
    where
        Self: Sized,
    {
        Merged {
            first: self,
            second: next,
        }
    }
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn validate(&self, values: &FormValues) -> Validation {
        (**self).validate(values)
    }
}

impl<V: Validator + ?Sized> Validator for &V {
    fn validate(&self, values: &FormValues) -> Validation {
        (**self).validate(values)
    }
}

/// Validator built from a closure
pub struct FnValidator<F>(pub F);

impl<F> Validator for FnValidator<F>
where
    F: Fn(&FormValues) -> Validation,
{
    fn validate(&self, values: &FormValues) -> Validation {
        (self.0)(values)
    }
}

/// Accepts everything unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, values: &FormValues) -> Validation {
        Ok(values.clone())
    }
}

/// Two validators whose errors are merged
///
/// The second validator sees the coerced output of the first when the first
/// passes, and the original values otherwise. When both report the same
/// field the first one's error is kept.
#[derive(Debug, Clone)]
pub struct Merged<A, B> {
    first: A,
    second: B,
}

impl<A: Validator, B: Validator> Validator for Merged<A, B> {
    fn validate(&self, values: &FormValues) -> Validation {
        match self.first.validate(values) {
            Ok(coerced) => self.second.validate(&coerced),
            Err(mut errors) => {
                if let Err(more) = self.second.validate(values) {
                    merge_errors(&mut errors, more);
                }
                Err(errors)
            }
        }
    }
}

/// Add `more` into `errors`, keeping existing entries
pub fn merge_errors(errors: &mut FieldErrors, more: FieldErrors) {
    for (field, error) in more {
        errors.entry(field).or_insert(error);
    }
}

/// A validator whose work may suspend (e.g. remote uniqueness checks)
///
/// Every [`Validator`] is usable where an async one is expected.
pub trait AsyncValidator {
    fn validate_async<'a>(&'a self, values: &'a FormValues) -> LocalBoxFuture<'a, Validation>;
}

impl<V: Validator> AsyncValidator for V {
    fn validate_async<'a>(&'a self, values: &'a FormValues) -> LocalBoxFuture<'a, Validation> {
        Box::pin(future::ready(self.validate(values)))
    }
}
