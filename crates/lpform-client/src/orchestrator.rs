//! Solve workflow state machine
//!
//! `Idle → Validating → Submitting → (Succeeded | Failed) → Idle`
//!
//! A solve is split into [`SolveOrchestrator::begin_solve`] (synchronous:
//! validate, persist, hand out a ticket) and [`SolveOrchestrator::finish_solve`]
//! (apply the response). Every attempt gets a fresh [`AttemptId`]; responses
//! for anything but the latest attempt are dropped, so a slow earlier
//! response can never overwrite what a newer one shows.

use lpform_form::{
    DisplayModel, EditError, FieldEdit, FormState, ValidationError, build_request, present,
    validate,
};
use lpform_model::ProblemRequest;
use tracing::{debug, info, warn};

use crate::store::{KeyValueStore, PersistenceStore};
use crate::transport::{SolverService, TransportError, decode_solve_body};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Idle,
    Validating,
    Submitting(AttemptId),
    Succeeded,
    Failed,
}

/// What the result area shows
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Hidden,
    Pending,
    /// Validation diagnostic; nothing was sent
    Invalid(String),
    Presented(DisplayModel),
    /// Transport failure, with the underlying message
    Failed(String),
}

/// A submitted request waiting for its response
#[derive(Debug, Clone)]
pub struct SolveTicket {
    pub attempt: AttemptId,
    pub request: ProblemRequest,
}

#[derive(Debug)]
pub enum Outcome {
    Rejected(ValidationError),
    Presented(DisplayModel),
    Failed(TransportError),
    /// A newer attempt was started before this one answered
    Superseded,
}

pub struct SolveOrchestrator<S> {
    form: FormState,
    store: PersistenceStore<S>,
    state: SolveState,
    view: ResultView,
    last_attempt: u64,
    /// Request of the latest attempt, independent of whether storing it worked
    submitted: Option<ProblemRequest>,
}

impl<S: KeyValueStore> SolveOrchestrator<S> {
    /// Start with the form restored from the store (default form if nothing
    /// usable is stored)
    pub fn new(store: PersistenceStore<S>) -> Self {
        let form = store.restore_form();
        Self {
            form,
            store,
            state: SolveState::Idle,
            view: ResultView::Hidden,
            last_attempt: 0,
            submitted: None,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn store(&self) -> &PersistenceStore<S> {
        &self.store
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    pub fn view(&self) -> &ResultView {
        &self.view
    }

    /// Apply a user edit. A finished attempt returns the workflow to `Idle`;
    /// an attempt in flight keeps waiting for its response. The persisted
    /// result is left alone until the next solve.
    pub fn apply_edit(&mut self, edit: FieldEdit) -> Result<(), EditError> {
        let resets_view = edit.changes_arity();
        self.form.apply(edit)?;
        self.settle();
        if resets_view && !self.is_submitting() {
            self.view = ResultView::Hidden;
        }
        Ok(())
    }

    /// Replace the whole form, e.g. with one loaded from a file
    pub fn replace_form(&mut self, form: FormState) {
        self.form = form;
        self.settle();
        if !self.is_submitting() {
            self.view = ResultView::Hidden;
        }
    }

    fn is_submitting(&self) -> bool {
        matches!(self.state, SolveState::Submitting(_))
    }

    fn settle(&mut self) {
        if !self.is_submitting() {
            self.state = SolveState::Idle;
        }
    }

    /// Validate the form and, if it holds, record a new attempt.
    ///
    /// On success the pending indicator is shown, the stored result is
    /// cleared and the new request stored, in that order, before the caller
    /// makes the network call.
    pub fn begin_solve(&mut self) -> Result<SolveTicket, ValidationError> {
        self.state = SolveState::Validating;

        let fields = self.form.fields();
        let built = validate(&fields).and_then(|()| build_request(&fields));
        let request = match built {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Solve rejected by validation");
                self.state = SolveState::Idle;
                self.view = ResultView::Invalid(e.to_string());
                return Err(e);
            }
        };

        self.view = ResultView::Pending;
        if let Err(e) = self.store.clear_result() {
            warn!(error = %e, "Failed to clear stored result");
        }
        if let Err(e) = self.store.write_request(&request) {
            warn!(error = %e, "Failed to store request");
        }

        self.last_attempt += 1;
        let attempt = AttemptId(self.last_attempt);
        self.state = SolveState::Submitting(attempt);
        self.submitted = Some(request.clone());
        info!(
            attempt = attempt.get(),
            variables = request.num_variables(),
            constraints = request.num_constraints(),
            "Submitting problem"
        );
        Ok(SolveTicket { attempt, request })
    }

    /// Apply the response to a previously issued ticket
    pub fn finish_solve(
        &mut self,
        attempt: AttemptId,
        response: Result<String, TransportError>,
    ) -> Outcome {
        let awaited = attempt.get() == self.last_attempt
            && self.state == SolveState::Submitting(attempt);
        if !awaited {
            debug!(
                attempt = attempt.get(),
                latest = self.last_attempt,
                "Discarding response for superseded attempt"
            );
            return Outcome::Superseded;
        }

        let decoded = response.and_then(|body| decode_solve_body(&body).map(|r| (body, r)));
        match decoded {
            Ok((body, result)) => {
                if result.status().is_optimal() {
                    if let Err(e) = self.store.write_result(&body) {
                        warn!(error = %e, "Failed to store result");
                    }
                }
                let solved = self.submitted.clone().or_else(|| self.store.read_request());
                let model = present(&result, solved.as_ref());
                info!(attempt = attempt.get(), status = %model.status_label, "Solve finished");
                self.state = SolveState::Succeeded;
                self.view = ResultView::Presented(model.clone());
                Outcome::Presented(model)
            }
            Err(e) => {
                warn!(attempt = attempt.get(), error = %e, "Solve failed");
                self.state = SolveState::Failed;
                self.view = ResultView::Failed(format!(
                    "Could not solve the problem: {}. Check the logs for details.",
                    e
                ));
                Outcome::Failed(e)
            }
        }
    }

    /// Run one complete attempt against `service`
    pub async fn solve(&mut self, service: &dyn SolverService) -> Outcome {
        let ticket = match self.begin_solve() {
            Ok(ticket) => ticket,
            Err(e) => return Outcome::Rejected(e),
        };
        debug!(service = service.name(), "Calling solver");
        let response = service.solve(&ticket.request).await;
        self.finish_solve(ticket.attempt, response)
    }
}
