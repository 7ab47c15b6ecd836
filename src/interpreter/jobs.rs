//! The promise job queue and unhandled-rejection tracking
//!
//! Jobs run in FIFO order once the running script or module finishes. Each
//! job runs with a fresh execution context of the realm that enqueued it.

use std::cell::RefCell;

use crate::error::JsResult;
use crate::interpreter::builtins::promise::{PromiseReaction, ReactionType};
use crate::interpreter::realm::RealmId;
use crate::interpreter::{ExecutionContext, Interpreter, ObjectId};
use crate::value::{CheapClone, Value};

/// A pending job
pub(crate) enum Job {
    /// NewPromiseReactionJob(reaction, argument)
    Reaction {
        reaction: PromiseReaction,
        argument: Value,
        realm: RealmId,
    },
    /// NewPromiseResolveThenableJob(promise, thenable, then)
    ResolveThenable {
        promise: ObjectId,
        thenable: Value,
        then: Value,
        realm: RealmId,
    },
}

impl Job {
    fn realm(&self) -> RealmId {
        match self {
            Job::Reaction { realm, .. } | Job::ResolveThenable { realm, .. } => *realm,
        }
    }
}

/// HostPromiseRejectionTracker state: promises rejected without a handler,
/// and the reasons reported once a job drain left them unhandled.
#[derive(Default)]
pub(crate) struct RejectionTracker {
    pending: RefCell<Vec<ObjectId>>,
    unhandled: RefCell<Vec<Value>>,
}

impl RejectionTracker {
    /// Operation "reject"
    pub(crate) fn rejected(&self, promise: ObjectId) {
        self.pending.borrow_mut().push(promise);
    }

    /// Operation "handle"
    pub(crate) fn handled(&self, promise: ObjectId) {
        self.pending.borrow_mut().retain(|p| *p != promise);
    }

    pub(crate) fn clear(&self) {
        self.pending.borrow_mut().clear();
        self.unhandled.borrow_mut().clear();
    }
}

impl Interpreter {
    /// HostEnqueuePromiseJob(job, realm)
    pub(crate) fn enqueue_job(&self, job: Job) {
        self.jobs.borrow_mut().push_back(job);
    }

    /// Run queued jobs until the queue is empty. Uncaught errors inside a
    /// job are reported and do not stop the drain; fatal errors do.
    pub fn run_jobs(&self) -> JsResult<()> {
        let mut ran = 0usize;
        loop {
            let job = self.jobs.borrow_mut().pop_front();
            let Some(job) = job else {
                break;
            };
            ran += 1;
            if let Err(error) = self.run_job(job) {
                if !error.is_catchable() {
                    return Err(error);
                }
                tracing::warn!(target: "ecmavm::jobs", %error, "uncaught error in promise job");
            }
        }
        tracing::trace!(target: "ecmavm::jobs", jobs = ran, "job queue drained");
        self.report_unhandled_rejections();
        Ok(())
    }

    fn run_job(&self, job: Job) -> JsResult<()> {
        let global_env = self.realm(job.realm())?.global_env;
        let context = ExecutionContext {
            lexical_environment: global_env,
            variable_environment: global_env,
            function: None,
            realm: job.realm(),
            script_or_module: None,
            strict: true,
            coroutine: None,
            caller_position: Default::default(),
        };
        self.with_context(context, || {
            self.tick()?;
            match job {
                Job::Reaction {
                    reaction, argument, ..
                } => self.promise_reaction_job(&reaction, argument),
                Job::ResolveThenable {
                    promise,
                    thenable,
                    then,
                    ..
                } => self.promise_resolve_thenable_job(promise, &thenable, &then),
            }
        })
    }

    /// The job NewPromiseReactionJob creates.
    fn promise_reaction_job(&self, reaction: &PromiseReaction, argument: Value) -> JsResult<()> {
        let handler_result = match &reaction.handler {
            None => match reaction.kind {
                ReactionType::Fulfill => Ok(argument),
                ReactionType::Reject => Err(crate::error::JsError::thrown(argument)),
            },
            Some(handler) => self.call(handler, &Value::Undefined, &[argument]),
        };
        let Some(capability) = &reaction.capability else {
            return match handler_result {
                Err(error) if !error.is_catchable() => Err(error),
                _ => Ok(()),
            };
        };
        match handler_result {
            Ok(value) => self.call(&capability.resolve, &Value::Undefined, &[value])?,
            Err(error) => {
                let reason = self.catchable_value(error)?;
                self.call(&capability.reject, &Value::Undefined, &[reason])?
            }
        };
        Ok(())
    }

    /// The job NewPromiseResolveThenableJob creates.
    fn promise_resolve_thenable_job(&self, promise: ObjectId, thenable: &Value, then: &Value) -> JsResult<()> {
        let (resolve, reject) = self.create_resolving_functions(promise)?;
        let result = self.call(
            then,
            thenable,
            &[Value::Object(resolve), Value::Object(reject)],
        );
        if let Err(error) = result {
            let reason = self.catchable_value(error)?;
            self.call(&Value::Object(reject), &Value::Undefined, &[reason])?;
        }
        Ok(())
    }

    fn report_unhandled_rejections(&self) {
        let pending = std::mem::take(&mut *self.rejections.pending.borrow_mut());
        for promise in pending {
            let Some(reason) = self.promise_rejection_reason(promise) else {
                continue;
            };
            tracing::warn!(
                target: "ecmavm::jobs",
                reason = %self.error_summary(&reason),
                "unhandled promise rejection"
            );
            self.rejections.unhandled.borrow_mut().push(reason.cheap_clone());
        }
    }

    /// Reasons of promises that were rejected and still had no handler
    /// when the job queue drained. Reported once.
    pub fn take_unhandled_rejections(&self) -> Vec<Value> {
        std::mem::take(&mut *self.rejections.unhandled.borrow_mut())
    }
}
