//! Form controller: owns field values and gates submission
//!
//! Submission runs in two phases so a validator may suspend without the
//! controller being borrowed for the whole time:
//!
//! 1. [`FormController::begin_submit`] snapshots the values and internal
//!    validity flags and hands out a [`SubmitTicket`] carrying a fresh
//!    sequence token. While a ticket is outstanding further submits are
//!    ignored.
//! 2. [`FormController::finish_submit`] merges the validator's verdict with
//!    the snapshotted flags. A ticket whose token is no longer the one in
//!    flight (the form was reset meanwhile) is discarded without touching
//!    any state.
//!
//! [`FormController::submit`] runs both phases with the controller's own
//! validator; [`submit_shared`] does the same across an await point.

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::core::binding::{FieldAdapter, FieldBinding, FieldEvent, FieldUpdate};
use crate::core::error::{ConfigError, ErrorState, FieldErrors, Validation};
use crate::core::field::{FieldName, FieldValue};
use crate::core::validator::{merge_errors, AsyncValidator, Validator};
use crate::core::validity::InternalValidity;
use crate::core::values::FormValues;

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Both error sources were clear; the success callback received these values
    Accepted(FormValues),
    /// At least one field failed; every failing field is listed
    Rejected(ErrorState),
    /// Another submit was still in flight
    Ignored,
    /// The form was reset while this submit was validating
    Discarded,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmitOutcome::Rejected(_))
    }
}

/// Snapshot taken when a submit starts
#[derive(Debug)]
pub struct SubmitTicket {
    token: u64,
    values: FormValues,
    internal: InternalValidity,
}

impl SubmitTicket {
    /// Values to hand to the validator
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

type SuccessCallback = Box<dyn FnMut(&FormValues)>;

/// Authoritative state for one form session
pub struct FormController {
    fields: Vec<FieldName>,
    defaults: FormValues,
    values: FormValues,
    errors: ErrorState,
    internal: InternalValidity,
    touched: BTreeSet<FieldName>,
    validator: Box<dyn Validator>,
    on_success: Option<SuccessCallback>,
    last_token: u64,
    in_flight: Option<u64>,
}

impl FormController {
    /// Create a controller for the declared fields, seeded with `defaults`
    ///
    /// Every declared field needs a default and no default may name an
    /// undeclared field.
    pub fn initialize<I, V>(fields: I, defaults: FormValues, validator: V) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = FieldName>,
        V: Validator + 'static,
    {
        let mut declared = Vec::new();
        for field in fields {
            if declared.contains(&field) {
                return Err(ConfigError::DuplicateField(field));
            }
            declared.push(field);
        }

        for field in &declared {
            if !defaults.contains(field) {
                return Err(ConfigError::MissingDefault(field.clone()));
            }
        }
        if let Some(extra) = defaults.names().find(|name| !declared.contains(name)) {
            return Err(ConfigError::UndeclaredDefault(extra.clone()));
        }

        tracing::debug!(fields = declared.len(), "form controller initialized");

        Ok(Self {
            fields: declared,
            values: defaults.clone(),
            defaults,
            errors: ErrorState::default(),
            internal: InternalValidity::new(),
            touched: BTreeSet::new(),
            validator: Box::new(validator),
            on_success: None,
            last_token: 0,
            in_flight: None,
        })
    }

    /// Register the callback run with the validated values of each accepted submit
    pub fn on_success(mut self, callback: impl FnMut(&FormValues) + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn fields(&self) -> &[FieldName] {
        &self.fields
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, field: &FieldName) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn internal_validity(&self) -> &InternalValidity {
        &self.internal
    }

    pub fn is_touched(&self, field: &FieldName) -> bool {
        self.touched.contains(field)
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    fn check_declared(&self, field: &FieldName) -> Result<(), ConfigError> {
        if self.values.contains(field) {
            Ok(())
        } else {
            Err(ConfigError::UnknownField(field.clone()))
        }
    }

    /// Overwrite a field's value
    ///
    /// This is a change event: any internal validity flag for the field is
    /// cleared. No validation runs until submit.
    pub fn set_field_value(&mut self, field: &FieldName, value: FieldValue) -> Result<(), ConfigError> {
        let slot = self
            .values
            .get_mut(field)
            .ok_or_else(|| ConfigError::UnknownField(field.clone()))?;
        *slot = value;
        self.internal.reset(field);
        Ok(())
    }

    /// Record component-native validity for a field, replacing any earlier flag
    pub fn set_internal_validity(&mut self, field: &FieldName, valid: bool) -> Result<(), ConfigError> {
        self.check_declared(field)?;
        self.internal.set(field.clone(), valid);
        Ok(())
    }

    /// Apply an event produced by a [`FieldBinding`]
    pub fn dispatch(&mut self, event: FieldEvent) -> Result<(), ConfigError> {
        let (field, update, commit) = match event {
            FieldEvent::Changed { field, update } => (field, update, false),
            FieldEvent::Committed { field, update } => (field, update, true),
        };
        self.apply_update(&field, update)?;
        if commit {
            self.touched.insert(field);
        }
        Ok(())
    }

    fn apply_update(&mut self, field: &FieldName, update: FieldUpdate) -> Result<(), ConfigError> {
        self.set_field_value(field, update.value)?;
        if let Some(valid) = update.validity {
            self.internal.set(field.clone(), valid);
        }
        Ok(())
    }

    /// Build the binding descriptor for one field
    pub fn binding<'a>(&self, field: &FieldName, adapter: &'a dyn FieldAdapter) -> Option<FieldBinding<'a>> {
        let value = self.values.get(field)?.clone();
        Some(FieldBinding::new(
            field.clone(),
            value,
            self.errors.get(field).cloned(),
            self.touched.contains(field),
            adapter,
        ))
    }

    /// Run the controller's validator over a full value map
    pub fn validate(&self, values: &FormValues) -> Validation {
        self.validator.validate(values)
    }

    /// Validate the current values and invoke the success callback if both
    /// the validator and every internal validity flag pass
    pub fn submit(&mut self) -> SubmitOutcome {
        let Some(ticket) = self.begin_submit() else {
            return SubmitOutcome::Ignored;
        };
        let verdict = self.validator.validate(ticket.values());
        self.finish_submit(ticket, verdict)
    }

    /// Start a submit; `None` while another submit is in flight
    pub fn begin_submit(&mut self) -> Option<SubmitTicket> {
        if let Some(token) = self.in_flight {
            tracing::debug!(token, "submit ignored, another submit is in flight");
            return None;
        }
        self.last_token += 1;
        let token = self.last_token;
        self.in_flight = Some(token);
        tracing::debug!(token, "submit started");
        Some(SubmitTicket {
            token,
            values: self.values.clone(),
            internal: self.internal.clone(),
        })
    }

    /// Give up on a submit without a verdict
    pub fn abandon_submit(&mut self, ticket: SubmitTicket) {
        self.release(ticket.token);
    }

    fn release(&mut self, token: u64) {
        if self.in_flight == Some(token) {
            tracing::debug!(token, "submit abandoned");
            self.in_flight = None;
        }
    }

    /// True when `values` holds exactly the declared fields
    fn has_declared_fields(&self, values: &FormValues) -> bool {
        values.len() == self.fields.len() && self.fields.iter().all(|f| values.contains(f))
    }

    /// Complete a submit with the validator's verdict over the ticket's values
    pub fn finish_submit(&mut self, ticket: SubmitTicket, verdict: Validation) -> SubmitOutcome {
        if self.in_flight != Some(ticket.token) {
            tracing::debug!(token = ticket.token, "stale submit discarded");
            return SubmitOutcome::Discarded;
        }
        self.in_flight = None;

        let verdict = match verdict {
            Ok(coerced) if !self.has_declared_fields(&coerced) => {
                tracing::warn!(
                    token = ticket.token,
                    returned = coerced.len(),
                    declared = self.fields.len(),
                    "validator returned values that do not match the declared fields"
                );
                Err(FieldErrors::new())
            }
            other => other,
        };

        let merged = match verdict {
            Ok(coerced) => ticket.internal.validate(&coerced),
            Err(mut errors) => {
                if let Err(internal) = ticket.internal.validate(&ticket.values) {
                    merge_errors(&mut errors, internal);
                }
                Err(errors)
            }
        };

        match merged {
            Ok(validated) => {
                self.errors.clear();
                tracing::debug!(token = ticket.token, "submit accepted");
                if let Some(callback) = self.on_success.as_mut() {
                    callback(&validated);
                }
                SubmitOutcome::Accepted(validated)
            }
            Err(errors) => {
                if errors.is_empty() {
                    tracing::warn!(
                        token = ticket.token,
                        "validator rejected the form without naming a field"
                    );
                }
                tracing::debug!(token = ticket.token, fields = errors.len(), "submit rejected");
                self.errors = ErrorState::from_errors(errors);
                SubmitOutcome::Rejected(self.errors.clone())
            }
        }
    }

    /// Restore defaults and forget flags, errors and any in-flight submit
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
        self.errors.clear();
        self.internal.clear();
        self.touched.clear();
        if let Some(token) = self.in_flight.take() {
            tracing::debug!(token, "form reset while submit in flight");
        }
    }
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("fields", &self.fields)
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("internal", &self.internal)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

/// Submit a shared controller through a validator that may suspend
///
/// The controller is borrowed only to start and to finish the submit, so
/// field edits can land while validation is pending. Those edits never
/// reach this submit: it validates the snapshot taken at the start.
pub async fn submit_shared<V>(form: &RefCell<FormController>, validator: &V) -> SubmitOutcome
where
    V: AsyncValidator + ?Sized,
{
    let Some(ticket) = form.borrow_mut().begin_submit() else {
        return SubmitOutcome::Ignored;
    };
    let mut pending = PendingSubmit {
        form,
        token: ticket.token,
        armed: true,
    };
    let verdict = validator.validate_async(ticket.values()).await;
    pending.armed = false;
    form.borrow_mut().finish_submit(ticket, verdict)
}

/// Releases the in-flight slot if a shared submit is dropped before it finishes
struct PendingSubmit<'f> {
    form: &'f RefCell<FormController>,
    token: u64,
    armed: bool,
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.form.try_borrow_mut() {
            Ok(mut form) => form.release(self.token),
            Err(_) => tracing::warn!(token = self.token, "cannot release dropped submit, form is borrowed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::binding::{FieldAdapter, RawInput};
    use crate::core::error::{ErrorKind, FieldErrors, ValidationError};
    use crate::core::validator::FnValidator;
    use futures::channel::oneshot;
    use futures::future::LocalBoxFuture;
    use futures::FutureExt;
    use std::cell::Cell;
    use std::rc::Rc;

    fn name(s: &str) -> FieldName {
        s.parse().unwrap()
    }

    fn login_defaults() -> FormValues {
        [
            (name("email"), FieldValue::text("")),
            (name("password"), FieldValue::text("")),
            (name("terms"), FieldValue::Flag(false)),
        ]
        .into_iter()
        .collect()
    }

    fn login_fields() -> Vec<FieldName> {
        vec![name("email"), name("password"), name("terms")]
    }

    /// email non-empty and shaped like an address, password of 5+ chars, terms accepted
    fn login_rules(values: &FormValues) -> Validation {
        let mut errors = FieldErrors::new();
        let email = values.get_str("email").and_then(|v| v.as_text()).unwrap_or("");
        if email.is_empty() {
            errors.insert(name("email"), ValidationError::schema(name("email"), "Email is required"));
        } else if !email.contains('@') {
            errors.insert(
                name("email"),
                ValidationError::schema(name("email"), "Invalid email address format"),
            );
        }
        let password = values.get_str("password").and_then(|v| v.as_text()).unwrap_or("");
        if password.chars().count() < 5 {
            errors.insert(
                name("password"),
                ValidationError::schema(name("password"), "Password must be 5 characters at minimum"),
            );
        }
        if values.get_str("terms").and_then(|v| v.as_flag()) != Some(true) {
            errors.insert(
                name("terms"),
                ValidationError::schema(name("terms"), "The terms of service must be accepted"),
            );
        }
        if errors.is_empty() {
            Ok(values.clone())
        } else {
            Err(errors)
        }
    }

    fn login_form(calls: Rc<Cell<usize>>) -> FormController {
        FormController::initialize(login_fields(), login_defaults(), FnValidator(login_rules))
            .unwrap()
            .on_success(move |_| calls.set(calls.get() + 1))
    }

    fn fill_valid_login(form: &mut FormController) {
        form.set_field_value(&name("email"), FieldValue::text("a@b.com")).unwrap();
        form.set_field_value(&name("password"), FieldValue::text("abcde")).unwrap();
        form.set_field_value(&name("terms"), FieldValue::Flag(true)).unwrap();
    }

    fn rejected_fields(outcome: &SubmitOutcome) -> Vec<String> {
        match outcome {
            SubmitOutcome::Rejected(errors) => errors.fields().map(|f| f.to_string()).collect(),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    struct DateAdapter;

    impl FieldAdapter for DateAdapter {
        fn on_change(&self, raw: &RawInput) -> FieldUpdate {
            match raw {
                RawInput::Text(s) => {
                    let valid = s.is_empty()
                        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok();
                    FieldUpdate::with_validity(s.as_str(), valid)
                }
                other => FieldUpdate::with_validity(format!("{:?}", other), false),
            }
        }
    }

    #[test]
    fn test_initialize_requires_every_default() {
        let mut defaults = login_defaults();
        defaults = defaults
            .into_iter()
            .filter(|(k, _)| k.as_str() != "terms")
            .collect();
        let err = FormController::initialize(login_fields(), defaults, FnValidator(login_rules))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingDefault(name("terms")));
    }

    #[test]
    fn test_initialize_rejects_undeclared_default() {
        let mut defaults = login_defaults();
        defaults.insert(name("country"), FieldValue::text("Germany"));
        let err = FormController::initialize(login_fields(), defaults, FnValidator(login_rules))
            .unwrap_err();
        assert_eq!(err, ConfigError::UndeclaredDefault(name("country")));
    }

    #[test]
    fn test_initialize_rejects_duplicate_fields() {
        let fields = vec![name("email"), name("email")];
        let defaults: FormValues = [(name("email"), FieldValue::text(""))].into_iter().collect();
        let err = FormController::initialize(fields, defaults, FnValidator(login_rules)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateField(name("email")));
    }

    #[test]
    fn test_set_field_value_unknown_field() {
        let mut form = login_form(Rc::new(Cell::new(0)));
        let err = form
            .set_field_value(&name("country"), FieldValue::text("France"))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownField(name("country")));
        assert_eq!(form.values().len(), 3);
    }

    #[test]
    fn test_unchanged_defaults_rejected_on_every_field() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());

        let outcome = form.submit();
        assert_eq!(rejected_fields(&outcome), vec!["email", "password", "terms"]);
        assert_eq!(form.errors().message(&name("email")), Some("Email is required"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_valid_values_accepted_once() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        form.submit();
        fill_valid_login(&mut form);

        let outcome = form.submit();
        let mut expected = FormValues::new();
        expected.insert(name("email"), FieldValue::text("a@b.com"));
        expected.insert(name("password"), FieldValue::text("abcde"));
        expected.insert(name("terms"), FieldValue::Flag(true));
        assert_eq!(outcome, SubmitOutcome::Accepted(expected));
        assert_eq!(calls.get(), 1);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_schema_rejection_marks_exactly_failing_fields() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        fill_valid_login(&mut form);
        form.set_field_value(&name("password"), FieldValue::text("abc")).unwrap();

        let outcome = form.submit();
        assert_eq!(rejected_fields(&outcome), vec!["password"]);
        assert_eq!(form.errors().get(&name("password")).unwrap().kind, ErrorKind::Schema);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_internal_invalidity_blocks_schema_success() {
        let calls = Rc::new(Cell::new(0));
        let mut fields = login_fields();
        fields.push(name("dob"));
        let mut defaults = login_defaults();
        defaults.insert(name("dob"), FieldValue::text(""));
        let mut form = FormController::initialize(fields, defaults, FnValidator(login_rules))
            .unwrap()
            .on_success({
                let calls = calls.clone();
                move |_: &FormValues| calls.set(calls.get() + 1)
            });
        fill_valid_login(&mut form);
        form.set_field_value(&name("dob"), FieldValue::text("31/31/2000")).unwrap();
        form.set_internal_validity(&name("dob"), false).unwrap();

        let outcome = form.submit();
        assert_eq!(rejected_fields(&outcome), vec!["dob"]);
        let err = form.errors().get(&name("dob")).unwrap();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, None);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_both_sources_reported_in_one_pass() {
        let mut fields = login_fields();
        fields.push(name("dob"));
        let mut defaults = login_defaults();
        defaults.insert(name("dob"), FieldValue::text(""));
        let mut form =
            FormController::initialize(fields, defaults, FnValidator(login_rules)).unwrap();
        form.set_internal_validity(&name("dob"), false).unwrap();

        let outcome = form.submit();
        assert_eq!(
            rejected_fields(&outcome),
            vec!["dob", "email", "password", "terms"]
        );
    }

    #[test]
    fn test_change_event_resets_internal_flag() {
        let mut fields = login_fields();
        fields.push(name("dob"));
        let mut defaults = login_defaults();
        defaults.insert(name("dob"), FieldValue::text(""));
        let mut form =
            FormController::initialize(fields, defaults, FnValidator(login_rules)).unwrap();
        fill_valid_login(&mut form);
        form.set_internal_validity(&name("dob"), false).unwrap();
        form.set_field_value(&name("dob"), FieldValue::text("2000-01-31")).unwrap();

        assert_eq!(form.internal_validity().get(&name("dob")), None);
        assert!(form.submit().is_accepted());
    }

    #[test]
    fn test_immediate_resubmit_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        let first = form.submit();
        let second = form.submit();
        assert_eq!(first, second);

        fill_valid_login(&mut form);
        let first = form.submit();
        let second = form.submit();
        assert_eq!(first, second);
        assert!(first.is_accepted());
    }

    #[test]
    fn test_submit_while_in_flight_is_ignored() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        fill_valid_login(&mut form);

        let ticket = form.begin_submit().unwrap();
        assert!(form.is_submitting());
        assert_eq!(form.submit(), SubmitOutcome::Ignored);
        assert!(form.begin_submit().is_none());
        assert_eq!(calls.get(), 0);

        let verdict = form.validate(ticket.values());
        assert!(form.finish_submit(ticket, verdict).is_accepted());
        assert_eq!(calls.get(), 1);
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_stale_submit_after_reset_is_discarded() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        fill_valid_login(&mut form);

        let stale = form.begin_submit().unwrap();
        form.reset();
        let verdict = form.validate(stale.values());
        assert_eq!(form.finish_submit(stale, verdict), SubmitOutcome::Discarded);
        assert_eq!(calls.get(), 0);
        assert_eq!(form.values(), &login_defaults());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_stale_ticket_cannot_finish_newer_submit() {
        let mut form = login_form(Rc::new(Cell::new(0)));
        let stale = form.begin_submit().unwrap();
        form.reset();
        let current = form.begin_submit().unwrap();
        assert!(current.token() > stale.token());

        let verdict = form.validate(stale.values());
        assert_eq!(form.finish_submit(stale, verdict), SubmitOutcome::Discarded);
        assert!(form.is_submitting());

        let verdict = form.validate(current.values());
        assert!(form.finish_submit(current, verdict).is_rejected());
    }

    #[test]
    fn test_abandoned_submit_unblocks_form() {
        let mut form = login_form(Rc::new(Cell::new(0)));
        let ticket = form.begin_submit().unwrap();
        form.abandon_submit(ticket);
        assert!(!form.is_submitting());
        assert!(form.submit().is_rejected());
    }

    #[test]
    fn test_coerced_values_reach_callback_but_not_form_state() {
        let seen: Rc<RefCell<Option<FormValues>>> = Rc::new(RefCell::new(None));
        let trim_then_check = FnValidator(|values: &FormValues| -> Validation {
            let trimmed: FormValues = values
                .iter()
                .map(|(k, v)| match v {
                    FieldValue::Text(s) => (k.clone(), FieldValue::text(s.trim())),
                    other => (k.clone(), other.clone()),
                })
                .collect();
            login_rules(&trimmed)
        });
        let mut form = FormController::initialize(login_fields(), login_defaults(), trim_then_check)
            .unwrap()
            .on_success({
                let seen = seen.clone();
                move |values: &FormValues| *seen.borrow_mut() = Some(values.clone())
            });
        fill_valid_login(&mut form);
        form.set_field_value(&name("email"), FieldValue::text("  a@b.com  ")).unwrap();

        assert!(form.submit().is_accepted());
        let seen = seen.borrow();
        let seen = seen.as_ref().unwrap();
        assert_eq!(seen.get_str("email"), Some(&FieldValue::text("a@b.com")));
        assert_eq!(form.value(&name("email")), Some(&FieldValue::text("  a@b.com  ")));
    }

    #[test]
    fn test_binding_round_trip_through_dispatch() {
        let mut fields = login_fields();
        fields.push(name("dob"));
        let mut defaults = login_defaults();
        defaults.insert(name("dob"), FieldValue::text(""));
        let mut form =
            FormController::initialize(fields, defaults, FnValidator(login_rules)).unwrap();
        fill_valid_login(&mut form);

        let adapter = DateAdapter;
        let event = form.binding(&name("dob"), &adapter).unwrap().on_change("2000-13-45");
        form.dispatch(event).unwrap();
        assert_eq!(form.internal_validity().get(&name("dob")), Some(false));
        assert!(!form.is_touched(&name("dob")));

        let event = form.binding(&name("dob"), &adapter).unwrap().on_commit("2000-13-45");
        form.dispatch(event).unwrap();
        assert!(form.is_touched(&name("dob")));

        assert!(form.submit().is_rejected());
        let binding = form.binding(&name("dob"), &adapter).unwrap();
        assert!(binding.has_error());
        assert_eq!(binding.message(), None);
        assert_eq!(binding.current_value, FieldValue::text("2000-13-45"));

        let event = binding.on_commit("2000-12-01");
        form.dispatch(event).unwrap();
        assert!(form.submit().is_accepted());
        assert!(!form.binding(&name("dob"), &adapter).unwrap().has_error());
    }

    #[test]
    fn test_binding_for_unknown_field() {
        let form = login_form(Rc::new(Cell::new(0)));
        assert!(form.binding(&name("country"), &DateAdapter).is_none());
    }

    /// Validator that blocks its first call until released
    struct Gated {
        gate: RefCell<Option<oneshot::Receiver<()>>>,
        calls: Cell<usize>,
    }

    impl AsyncValidator for Gated {
        fn validate_async<'a>(&'a self, values: &'a FormValues) -> LocalBoxFuture<'a, Validation> {
            self.calls.set(self.calls.get() + 1);
            let gate = self.gate.borrow_mut().take();
            Box::pin(async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                login_rules(values)
            })
        }
    }

    #[test]
    fn test_shared_submit_uses_snapshot_and_ignores_second_submit() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        fill_valid_login(&mut form);
        let form = RefCell::new(form);

        let (release, gate) = oneshot::channel();
        let validator = Gated {
            gate: RefCell::new(Some(gate)),
            calls: Cell::new(0),
        };

        let first = submit_shared(&form, &validator);
        let meanwhile = async {
            let second = submit_shared(&form, &validator).await;
            form.borrow_mut()
                .set_field_value(&name("password"), FieldValue::text("x"))
                .unwrap();
            let _ = release.send(());
            second
        };
        let (first, second) = futures::executor::block_on(futures::future::join(first, meanwhile));

        assert_eq!(second, SubmitOutcome::Ignored);
        match first {
            SubmitOutcome::Accepted(values) => {
                assert_eq!(values.get_str("password"), Some(&FieldValue::text("abcde")));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
        assert_eq!(validator.calls.get(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(
            form.borrow().value(&name("password")),
            Some(&FieldValue::text("x"))
        );
    }

    #[test]
    fn test_shared_submit_discarded_after_reset() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        fill_valid_login(&mut form);
        let form = RefCell::new(form);

        let (release, gate) = oneshot::channel();
        let validator = Gated {
            gate: RefCell::new(Some(gate)),
            calls: Cell::new(0),
        };

        let first = submit_shared(&form, &validator);
        let meanwhile = async {
            form.borrow_mut().reset();
            let _ = release.send(());
        };
        let (outcome, ()) = futures::executor::block_on(futures::future::join(first, meanwhile));

        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(calls.get(), 0);
        assert_eq!(form.borrow().values(), &login_defaults());
    }

    #[test]
    fn test_shared_submit_with_sync_validator() {
        let form = RefCell::new(login_form(Rc::new(Cell::new(0))));
        let outcome = futures::executor::block_on(submit_shared(&form, &FnValidator(login_rules)));
        assert_eq!(rejected_fields(&outcome), vec!["email", "password", "terms"]);
        assert_eq!(form.borrow().errors().len(), 3);
    }

    /// Validator whose verdict never arrives
    struct Stalled;

    impl AsyncValidator for Stalled {
        fn validate_async<'a>(&'a self, _values: &'a FormValues) -> LocalBoxFuture<'a, Validation> {
            Box::pin(futures::future::pending())
        }
    }

    #[test]
    fn test_dropped_shared_submit_releases_form() {
        let calls = Rc::new(Cell::new(0));
        let mut form = login_form(calls.clone());
        fill_valid_login(&mut form);
        let form = RefCell::new(form);

        // Polled once, then dropped while validation is pending
        let outcome = submit_shared(&form, &Stalled).now_or_never();
        assert!(outcome.is_none());
        assert!(!form.borrow().is_submitting());

        let outcome = form.borrow_mut().submit();
        assert!(outcome.is_accepted());
        assert_eq!(calls.get(), 1);
        assert_eq!(form.borrow().value(&name("email")), Some(&FieldValue::text("a@b.com")));
    }

    #[test]
    fn test_dropped_stale_submit_keeps_newer_submit_in_flight() {
        let form = RefCell::new(login_form(Rc::new(Cell::new(0))));
        let stale = form.borrow_mut().begin_submit().unwrap();
        form.borrow_mut().reset();
        let current = form.borrow_mut().begin_submit().unwrap();

        form.borrow_mut().abandon_submit(stale);
        assert!(form.borrow().is_submitting());
        form.borrow_mut().abandon_submit(current);
        assert!(!form.borrow().is_submitting());
    }

    #[test]
    fn test_validator_adding_a_field_is_rejected() {
        let calls = Rc::new(Cell::new(0));
        let mut form = FormController::initialize(
            login_fields(),
            login_defaults(),
            FnValidator(|values: &FormValues| -> Validation {
                let mut out = values.clone();
                out.insert(name("country"), FieldValue::text("Germany"));
                Ok(out)
            }),
        )
        .unwrap()
        .on_success({
            let calls = calls.clone();
            move |_: &FormValues| calls.set(calls.get() + 1)
        });

        match form.submit() {
            SubmitOutcome::Rejected(errors) => assert!(errors.is_empty()),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(calls.get(), 0);
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_validator_dropping_a_field_is_rejected() {
        let mut form = FormController::initialize(
            login_fields(),
            login_defaults(),
            FnValidator(|values: &FormValues| -> Validation {
                Ok(values
                    .clone()
                    .into_iter()
                    .filter(|(k, _)| k.as_str() != "terms")
                    .collect())
            }),
        )
        .unwrap();
        form.set_internal_validity(&name("email"), false).unwrap();

        // Internal errors are still reported alongside the form-level failure
        assert_eq!(rejected_fields(&form.submit()), vec!["email"]);
    }
}
