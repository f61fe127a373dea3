//! The form validation orchestrator.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tokio::runtime::Handle;

use crate::cache::ValidationCache;
use crate::debounce::Debouncer;
use crate::error::{ConstructionError, RuleError, SubmitError};
use crate::event::{EventBus, SubscriptionId, ValidatorEvent};
use crate::graph::DependencyGraph;
use crate::host::{FormHost, FormTarget, SubmitState};
use crate::listener::{FormEvent, Listeners};
use crate::options::ValidatorOptions;
use crate::pending::{PendingOps, Ticket};
use crate::result::{FieldError, FieldState, SubmitOutcome};
use crate::rules::{Rule, RuleContext, RuleSet};
use crate::submit::{SubmitOptions, SubmitRequest, SubmitResponse, parse_url};

/// Validates one form against a [`RuleSet`].
///
/// The validator owns every piece of validation state for its form: field
/// states, the result cache, debounce timers, and in-flight runs. It is cheap
/// to clone (uses `Arc` internally); clones share that state.
///
/// Debounced and event-driven work is spawned on the ambient tokio runtime,
/// so [`dispatch`](Self::dispatch) must be called from inside one.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use formwarden_lib::{FormEvent, FormValidator, ValidatorOptions};
/// use formwarden_lib::host::MemoryForm;
/// use formwarden_lib::rules::RuleSet;
///
/// let form = Arc::new(MemoryForm::new().with_field("email", ""));
/// let rules = RuleSet::builder()
///     .field("email")
///         .required("Email is required")
///         .email("invalid email")
///     .build();
///
/// let validator = FormValidator::new(
///     form.clone(),
///     rules,
///     ValidatorOptions::default().on_valid_submit(|values| println!("{values:?}")),
/// )?;
/// validator.init();
///
/// form.set_value("email", "a@b.com");
/// validator.dispatch(FormEvent::input("email"));
/// ```
#[derive(Clone)]
pub struct FormValidator {
    inner: Arc<ValidatorInner>,
}

struct ValidatorInner {
    host: Arc<dyn FormHost>,
    rules: Vec<(String, Arc<[Rule]>)>,
    graph: DependencyGraph,
    options: ValidatorOptions,
    cache: ValidationCache,
    debouncer: Debouncer,
    events: EventBus,
    state: Mutex<ValidatorState>,
}

#[derive(Debug, Default)]
struct ValidatorState {
    /// Registered fields, in rule declaration order
    fields: Vec<FieldState>,
    dirty: HashSet<String>,
    pending: PendingOps,
    listeners: Listeners,
    submitting: bool,
    /// Form validity last reported to observers
    last_validity: Option<bool>,
}

/// Feedback owed to the host after a state change.
#[derive(Debug, Default)]
struct Gating {
    submit: Option<SubmitState>,
    validity_changed: Option<bool>,
}

/// Outcome of one field run.
#[derive(Debug, Clone, Copy)]
struct Run {
    valid: bool,
    /// Whether the run's result reached the field state; superseded and
    /// cancelled runs report the prior validity instead
    applied: bool,
}

impl Run {
    fn applied(valid: bool) -> Self {
        Self { valid, applied: true }
    }

    fn discarded(valid: bool) -> Self {
        Self {
            valid,
            applied: false,
        }
    }
}

enum Verdict {
    Pass,
    Fail(String),
    Broken,
}

impl ValidatorState {
    fn field_mut(&mut self, name: &str) -> Option<&mut FieldState> {
        self.fields.iter_mut().find(|f| f.field_name == name)
    }

    fn is_valid(&self, name: &str) -> bool {
        self.fields
            .iter()
            .find(|f| f.field_name == name)
            .is_some_and(|f| f.is_valid)
    }

    fn dependencies_valid(&self, dependencies: &[String]) -> bool {
        dependencies.iter().all(|d| self.is_valid(d))
    }

    fn all_valid(&self) -> bool {
        self.fields.iter().all(|f| f.is_valid)
    }

    fn errors(&self) -> Vec<FieldError> {
        self.fields
            .iter()
            .filter(|f| !f.is_valid)
            .filter_map(|f| {
                f.message
                    .as_ref()
                    .map(|m| FieldError::new(f.field_name.clone(), m.clone()))
            })
            .collect()
    }

    /// Recomputes form validity; the submit control is left alone while a
    /// submit is in flight.
    fn gating(&mut self) -> Gating {
        let valid = self.all_valid();
        let validity_changed = (self.last_validity != Some(valid)).then(|| {
            self.last_validity = Some(valid);
            valid
        });
        let submit = (!self.submitting).then_some(if valid {
            SubmitState::Enabled
        } else {
            SubmitState::Disabled
        });
        Gating {
            submit,
            validity_changed,
        }
    }
}

impl FormValidator {
    /// Binds a validator to a form.
    ///
    /// Fails if the target cannot be resolved to a form container.
    pub fn new(
        target: impl Into<FormTarget>,
        rules: RuleSet,
        options: ValidatorOptions,
    ) -> Result<Self, ConstructionError> {
        let host = match target.into() {
            FormTarget::Host(host) => host,
            FormTarget::Selector { document, selector } => document
                .query_form(&selector)
                .ok_or_else(|| ConstructionError::form_not_found(selector))?,
        };
        if !host.is_form() {
            return Err(ConstructionError::NotAForm);
        }

        let graph = DependencyGraph::from_rules(&rules);
        let rules = rules
            .iter()
            .map(|(name, field_rules)| (name.to_string(), Arc::from(field_rules.to_vec())))
            .collect();

        Ok(Self {
            inner: Arc::new(ValidatorInner {
                host,
                rules,
                graph,
                cache: ValidationCache::new(options.cache_ttl),
                options,
                debouncer: Debouncer::default(),
                events: EventBus::new(),
                state: Mutex::new(ValidatorState::default()),
            }),
        })
    }

    /// Registers every declared field and starts listening for events.
    ///
    /// Fields start out invalid, so the submit control stays disabled until
    /// each one has passed at least once.
    pub fn init(&self) {
        let inner = &self.inner;
        let gating = {
            let mut state = inner.state();
            if state.listeners.is_attached() {
                log::warn!("validator already initialized; ignoring init");
                return;
            }

            state.fields.clear();
            for (name, _) in &inner.rules {
                if !inner.host.has_field(name) {
                    log::debug!("field '{name}' has rules but is not in the form");
                    continue;
                }
                state.fields.push(FieldState::untrusted(name.clone()));
                state.listeners.fields.insert(name.clone());
            }
            for source in inner.graph.sources() {
                if inner.host.has_field(source) {
                    state.listeners.dependency_sources.insert(source.to_string());
                }
            }
            state.listeners.submit = true;

            log::debug!(
                "listening to {} field(s), {} dependency source(s)",
                state.listeners.fields.len(),
                state.listeners.dependency_sources.len()
            );
            state.gating()
        };

        inner.host.set_native_validation(false);
        inner.apply_gating(gating);
    }

    /// Routes a host event through the listeners attached by [`init`](Self::init).
    ///
    /// Input is debounced per field; blur validates right away; submit runs
    /// the submit protocol in the background. Events for which no listener
    /// is attached are dropped.
    pub fn dispatch(&self, event: FormEvent) {
        let inner = &self.inner;
        match event {
            FormEvent::Input(field) => {
                let propagate = {
                    let mut state = inner.state();
                    if !state.listeners.listens_to(&field) {
                        log::trace!("no input listener for '{field}'");
                        return;
                    }
                    state.dirty.insert(field.clone());
                    state.listeners.propagates(&field)
                };

                let worker = Arc::clone(inner);
                let name = field.clone();
                inner
                    .debouncer
                    .schedule(&field, inner.options.debounce_timeout, async move {
                        worker.run_input(&name, propagate).await;
                    });
            }
            FormEvent::Blur(field) => {
                let propagate = {
                    let state = inner.state();
                    if !state.listeners.listens_to(&field) {
                        return;
                    }
                    state.listeners.propagates(&field)
                };

                inner.debouncer.cancel(&field);
                let worker = Arc::clone(inner);
                spawn_detached("blur validation", async move {
                    worker.run_input(&field, propagate).await;
                });
            }
            FormEvent::Submit => {
                if !inner.state().listeners.submit {
                    return;
                }
                let validator = self.clone();
                spawn_detached("submit", async move {
                    validator.handle_submit().await;
                });
            }
        }
    }

    /// Validates one field, reusing a fresh cached result when possible.
    pub async fn validate_field(&self, name: &str) -> bool {
        self.inner.run_field(name, false).await.valid
    }

    /// Validates one field, always evaluating its rules.
    pub async fn force_validate_field(&self, name: &str) -> bool {
        self.inner.run_field(name, true).await.valid
    }

    /// Validates every declared field concurrently.
    pub async fn validate_form(&self) -> bool {
        self.inner.run_form(false).await
    }

    /// Validates every declared field concurrently, bypassing the cache.
    pub async fn force_validate_form(&self) -> bool {
        self.inner.run_form(true).await
    }

    /// Runs the submit protocol.
    ///
    /// Returns [`SubmitOutcome::Ignored`] if another submit is in flight.
    /// Otherwise shows the loading state, force-validates the whole form and
    /// calls the matching callback. The loading state is always cleared,
    /// even if a callback panics or the future is dropped.
    pub async fn handle_submit(&self) -> SubmitOutcome {
        let inner = &self.inner;
        {
            let mut state = inner.state();
            if state.submitting {
                log::debug!("submit already in progress; ignoring");
                return SubmitOutcome::Ignored;
            }
            state.submitting = true;
        }
        let _guard = SubmitGuard { inner };
        inner.host.set_submit_state(SubmitState::Loading);

        // Pending timers would cancel the forced runs below
        inner.debouncer.cancel_all();

        if inner.run_form(true).await {
            let values = inner.host.values();
            log::debug!("submit accepted with {} field(s)", values.len());
            inner.events.emit(ValidatorEvent::ValidSubmit);
            if let Some(callback) = &inner.options.on_valid_submit {
                callback(values.clone());
            }
            SubmitOutcome::Valid(values)
        } else {
            let errors = inner.state().errors();
            log::debug!("submit rejected with {} error(s)", errors.len());
            inner.events.emit(ValidatorEvent::InvalidSubmit {
                errors: errors.clone(),
            });
            if let Some(callback) = &inner.options.on_invalid_submit {
                callback(errors.clone());
            }
            SubmitOutcome::Invalid(errors)
        }
    }

    /// Sends the current form values to `url` through the configured transport.
    ///
    /// Does not validate; call it from the valid-submit callback.
    pub async fn submit(
        &self,
        url: &str,
        options: SubmitOptions,
    ) -> Result<SubmitResponse, SubmitError> {
        let request = SubmitRequest {
            url: parse_url(url)?,
            options,
            values: self.inner.host.values(),
        };
        self.inner.options.transport().send(request).await
    }

    /// Clears the cache, aborts all pending work, and marks every field valid.
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.debouncer.cancel_all();
        inner.cache.clear();

        let (names, gating) = {
            let mut state = inner.state();
            state.pending.cancel_all();
            state.dirty.clear();
            for field in state.fields.iter_mut() {
                field.is_valid = true;
                field.message = None;
            }
            let names: Vec<String> = state.fields.iter().map(|f| f.field_name.clone()).collect();
            (names, state.gating())
        };

        for name in names {
            inner.host.clear_field_error(&name);
            inner.events.emit(ValidatorEvent::FieldValid { field: name });
        }
        inner.apply_gating(gating);
    }

    /// Detaches every listener, restores native validation, and resets.
    pub fn destroy(&self) {
        self.inner.state().listeners = Listeners::default();
        self.inner.host.set_native_validation(true);
        self.reset();
    }

    /// Registers an observer for validator events.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ValidatorEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(listener)
    }

    /// Removes an observer.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Current state of one field.
    pub fn field_state(&self, name: &str) -> Option<FieldState> {
        self.inner
            .state()
            .fields
            .iter()
            .find(|f| f.field_name == name)
            .cloned()
    }

    /// Current state of every registered field.
    pub fn field_states(&self) -> Vec<FieldState> {
        self.inner.state().fields.clone()
    }

    /// Every invalid field that has a message, in declaration order.
    pub fn errors(&self) -> Vec<FieldError> {
        self.inner.state().errors()
    }

    /// Whether every registered field is currently valid.
    pub fn is_form_valid(&self) -> bool {
        self.inner.state().all_valid()
    }

    /// Whether the field received input since init or the last reset.
    pub fn is_dirty(&self, name: &str) -> bool {
        self.inner.state().dirty.contains(name)
    }

    /// Whether a submit is in flight.
    pub fn is_submitting(&self) -> bool {
        self.inner.state().submitting
    }

    /// Whether the field has a debounce timer or validation outstanding.
    pub fn is_pending(&self, name: &str) -> bool {
        self.inner.debouncer.is_pending(name) || self.inner.state().pending.in_flight(name)
    }

    /// The dependency graph derived from the rule set.
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.inner.graph
    }

    /// The options this validator was built with.
    pub fn options(&self) -> &ValidatorOptions {
        &self.inner.options
    }

    /// The bound form.
    pub fn host(&self) -> &Arc<dyn FormHost> {
        &self.inner.host
    }
}

impl std::fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidator")
            .field("fields", &self.inner.rules.len())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl ValidatorInner {
    fn state(&self) -> MutexGuard<'_, ValidatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rules_for(&self, name: &str) -> Option<Arc<[Rule]>> {
        self.rules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rules)| Arc::clone(rules))
    }

    fn prior_validity(&self, name: &str) -> Run {
        Run::discarded(self.state().is_valid(name))
    }

    /// Runs a field's validation after input, then revalidates the fields
    /// that depend on it.
    ///
    /// Dependents are left alone when the field's own run was superseded or
    /// cancelled; whoever superseded it owns their revalidation.
    async fn run_input(&self, name: &str, propagate: bool) {
        let run = self.run_field(name, false).await;
        if !propagate {
            return;
        }
        if !run.applied {
            log::debug!("validation of '{name}' was superseded; not propagating");
            return;
        }
        let dependents = self.graph.dependents_of(name);
        log::debug!("'{name}' changed; revalidating {dependents:?}");
        join_all(dependents.iter().map(|d| self.run_field(d, true))).await;
    }

    async fn run_form(&self, force: bool) -> bool {
        let results = join_all(self.rules.iter().map(|(name, _)| self.run_field(name, force))).await;
        results.into_iter().all(|run| run.valid)
    }

    async fn run_field(&self, name: &str, force: bool) -> Run {
        let Some(rules) = self.rules_for(name) else {
            log::debug!("no rules for '{name}'");
            return Run::applied(true);
        };
        let Some(value) = self.host.field_value(name) else {
            return Run::applied(true);
        };

        let ticket = self.state().pending.begin(name);

        let cached = if force { None } else { self.cache.get(name, &value) };
        if let Some(hit) = cached {
            log::trace!("cache hit for '{name}'");
            if !self.commit(name, &ticket, hit.is_valid, hit.message) {
                return self.prior_validity(name);
            }
            return Run::applied(hit.is_valid);
        }

        let cx = RuleContext::new(name, value.clone(), Arc::clone(&self.host), ticket.token().clone());
        let mut verdict = Verdict::Pass;

        for rule in rules.iter() {
            if !rule.dependencies().is_empty() && !self.state().dependencies_valid(rule.dependencies()) {
                log::trace!("skipping rule '{}' on '{name}': dependencies not valid", rule.message());
                continue;
            }

            let result = tokio::select! {
                biased;
                _ = ticket.token().cancelled() => Err(RuleError::Cancelled),
                result = rule.evaluate(value.clone(), cx.clone()) => result,
            };

            if !self.state().pending.is_current(name, &ticket) {
                log::debug!("discarding superseded validation of '{name}'");
                return self.prior_validity(name);
            }

            match result {
                Ok(true) => {}
                Ok(false) | Err(RuleError::Invalid(None)) => {
                    verdict = Verdict::Fail(rule.message().to_string());
                    break;
                }
                Err(RuleError::Invalid(Some(message))) => {
                    verdict = Verdict::Fail(message);
                    break;
                }
                Err(RuleError::Cancelled) => {
                    log::debug!("rule on '{name}' cancelled itself");
                    self.state().pending.finish(name, &ticket);
                    return self.prior_validity(name);
                }
                Err(RuleError::Unexpected(error)) => {
                    log::error!("Unexpected error validating '{name}': {error}");
                    verdict = Verdict::Broken;
                    break;
                }
            }
        }

        let (is_valid, message, cacheable) = match verdict {
            Verdict::Pass => (true, None, true),
            Verdict::Fail(message) => (false, Some(message), true),
            Verdict::Broken => (
                false,
                Some(self.options.unexpected_error_message.clone()),
                false,
            ),
        };

        if cacheable {
            if !self.commit(name, &ticket, is_valid, message.clone()) {
                return self.prior_validity(name);
            }
            self.cache.set(name, &value, is_valid, message);
        } else if !self.commit(name, &ticket, is_valid, message) {
            return self.prior_validity(name);
        }
        Run::applied(is_valid)
    }

    /// Applies a run's result if `ticket` is still the newest for the field.
    ///
    /// Fields that are not registered (before `init`) keep no state; the
    /// run still counts as applied.
    fn commit(&self, name: &str, ticket: &Ticket, is_valid: bool, message: Option<String>) -> bool {
        let (snapshot, gating) = {
            let mut state = self.state();
            if !state.pending.is_current(name, ticket) {
                return false;
            }
            state.pending.finish(name, ticket);
            let Some(field) = state.field_mut(name) else {
                log::trace!("'{name}' is not registered; result not recorded");
                return true;
            };
            field.is_valid = is_valid;
            field.message = message;
            let snapshot = field.clone();
            (snapshot, state.gating())
        };

        self.show(&snapshot);
        self.apply_gating(gating);
        true
    }

    fn show(&self, field: &FieldState) {
        let name = field.field_name.clone();
        if field.is_valid {
            self.host.clear_field_error(&name);
            self.events.emit(ValidatorEvent::FieldValid { field: name });
        } else {
            let message = field.message.clone().unwrap_or_default();
            self.host.show_field_error(&name, &message);
            self.events.emit(ValidatorEvent::FieldInvalid {
                field: name,
                message,
            });
        }
    }

    fn apply_gating(&self, gating: Gating) {
        if let Some(submit) = gating.submit {
            self.host.set_submit_state(submit);
        }
        if let Some(valid) = gating.validity_changed {
            self.events.emit(ValidatorEvent::FormValidityChanged(valid));
        }
    }
}

/// Clears the submitting flag and restores the submit control on drop.
struct SubmitGuard<'a> {
    inner: &'a ValidatorInner,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let gating = {
            let mut state = self.inner.state();
            state.submitting = false;
            state.gating()
        };
        self.inner.apply_gating(gating);
    }
}

fn spawn_detached<F>(what: &str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(fut);
        }
        Err(_) => log::error!("cannot run {what}: no tokio runtime"),
    }
}
