//! WorkflowController - actor that owns the workflow state
//!
//! Actions arrive over a channel and are applied to the state machine in
//! order. Service calls and the save effect run as separate tasks and report
//! back as events on the same channel, so the actor keeps answering while a
//! call is in flight and an overlapping trigger sees `busy` and is rejected.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::machine::{Action, Effect, Event, Rejection, Ticket, Transition, Workflow};
use super::state::WorkflowState;
use crate::domain::{Plan, PlanEdit, PlanError};
use crate::save::SaveEffect;
use crate::service::{PlanService, RenderService};

/// Errors from workflow handle operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("A request is already in progress")]
    Busy,

    #[error("There is no plan to commit or edit")]
    NoPlan,

    #[error("The request was superseded by a reset")]
    Superseded,

    #[error("Invalid edit: {0}")]
    InvalidEdit(PlanError),

    #[error("Workflow controller is not running")]
    ChannelClosed,
}

impl From<Rejection> for WorkflowError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Busy => WorkflowError::Busy,
            Rejection::NoPlan => WorkflowError::NoPlan,
            Rejection::Stale => WorkflowError::Superseded,
            Rejection::Edit(e) => WorkflowError::InvalidEdit(e),
        }
    }
}

/// Response from workflow operations
pub type WorkflowResponse = Result<WorkflowState, WorkflowError>;

/// External collaborators the controller drives
#[derive(Clone)]
pub struct Services {
    pub plan: Arc<dyn PlanService>,
    pub render: Arc<dyn RenderService>,
    pub saver: Arc<dyn SaveEffect>,
}

/// Commands sent to the controller actor
enum Command {
    Act {
        action: Action,
        reply: oneshot::Sender<WorkflowResponse>,
    },
    Settle(Event),
    Snapshot {
        reply: oneshot::Sender<WorkflowState>,
    },
    Shutdown,
}

/// A caller waiting for a service call to settle
struct Pending {
    ticket: Ticket,
    reply: oneshot::Sender<WorkflowResponse>,
}

pub struct WorkflowController {
    workflow: Workflow,
    services: Services,
    self_tx: mpsc::WeakSender<Command>,
    state_tx: watch::Sender<WorkflowState>,
    pending: Option<Pending>,
}

impl WorkflowController {
    /// Spawn the controller actor; decks are saved under `filename`
    pub fn spawn(services: Services, filename: impl Into<String>) -> WorkflowHandle {
        let workflow = Workflow::new(filename);
        debug!(filename = %workflow.filename(), "WorkflowController::spawn: called");

        let (tx, rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(workflow.state().clone());

        let controller = Self {
            workflow,
            services,
            self_tx: tx.downgrade(),
            state_tx,
            pending: None,
        };
        tokio::spawn(controller.run(rx));

        info!("WorkflowController spawned");
        WorkflowHandle { tx, state_rx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Act { action, reply } => self.handle_action(action, reply),
                Command::Settle(event) => self.handle_settle(event),
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.workflow.state().clone());
                }
                Command::Shutdown => {
                    debug!("run: shutdown requested");
                    break;
                }
            }
        }
        info!("WorkflowController stopped");
    }

    fn handle_action(&mut self, action: Action, reply: oneshot::Sender<WorkflowResponse>) {
        debug!(?action, "handle_action: called");
        match self.workflow.apply(action.into()) {
            Transition::Rejected(rejection) => {
                debug!(%rejection, "handle_action: rejected");
                let _ = reply.send(Err(rejection.into()));
            }
            Transition::Applied(Some(effect)) => {
                self.supersede_pending();
                let ticket = self.run_effect(effect);
                self.pending = Some(Pending { ticket, reply });
            }
            Transition::Applied(None) => {
                self.supersede_pending();
                let _ = reply.send(Ok(self.workflow.state().clone()));
            }
        }
        self.publish();
    }

    fn handle_settle(&mut self, event: Event) {
        let settled = event.ticket();
        match self.workflow.apply(event) {
            Transition::Rejected(rejection) => {
                debug!(%rejection, ?settled, "handle_settle: dropped");
                // A delivery overtaken by a plan edit still ends the commit call
                if settled.is_some() && settled == self.pending.as_ref().map(|p| p.ticket) {
                    self.answer_pending();
                }
                return;
            }
            Transition::Applied(Some(effect)) => {
                // The caller waits for the save to report back
                self.run_effect(effect);
            }
            Transition::Applied(None) => {
                if settled == Some(self.workflow.ticket()) {
                    self.answer_pending();
                }
            }
        }
        self.publish();
    }

    fn answer_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.reply.send(Ok(self.workflow.state().clone()));
        }
    }

    /// Tell a caller whose call was overtaken (by a reset) that it is moot
    fn supersede_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if pending.ticket == self.workflow.ticket() {
                self.pending = Some(pending);
            } else {
                debug!(ticket = pending.ticket, "supersede_pending: request superseded");
                let _ = pending.reply.send(Err(WorkflowError::Superseded));
            }
        }
    }

    /// Start an effect; returns the ticket it belongs to
    fn run_effect(&mut self, effect: Effect) -> Ticket {
        match effect {
            Effect::RequestPlan { ticket, prompt } => {
                let service = self.services.plan.clone();
                self.spawn_call(async move {
                    let result = service.generate_plan(&prompt).await;
                    Event::PlanSettled { ticket, result }
                });
                ticket
            }
            Effect::RequestRender { ticket, plan } => {
                let service = self.services.render.clone();
                self.spawn_call(async move {
                    let result = service.render(&plan).await;
                    Event::RenderSettled { ticket, result }
                });
                ticket
            }
            Effect::Save { ticket, filename, data } => {
                let saver = self.services.saver.clone();
                self.spawn_call(async move {
                    let written = tokio::task::spawn_blocking(move || {
                        let result = saver.save(&filename, &data);
                        (filename, result)
                    })
                    .await;
                    let location = match written {
                        Ok((_, Ok(path))) => Some(path),
                        Ok((filename, Err(e))) => {
                            warn!(error = %e, %filename, "Save failed");
                            None
                        }
                        Err(e) => {
                            warn!(error = %e, "Save task failed");
                            None
                        }
                    };
                    Event::Delivered { ticket, location }
                });
                ticket
            }
        }
    }

    fn spawn_call<F>(&self, call: F)
    where
        F: std::future::Future<Output = Event> + Send + 'static,
    {
        let Some(tx) = self.self_tx.upgrade() else {
            debug!("spawn_call: no handles left, skipping call");
            return;
        };
        tokio::spawn(async move {
            let event = call.await;
            if tx.send(Command::Settle(event)).await.is_err() {
                debug!("spawn_call: controller gone before call settled");
            }
        });
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.workflow.state().clone());
    }
}

/// Cloneable handle to the controller actor
#[derive(Clone)]
pub struct WorkflowHandle {
    tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<WorkflowState>,
}

impl WorkflowHandle {
    async fn act(&self, action: Action) -> WorkflowResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Act {
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| WorkflowError::ChannelClosed)?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)?
    }

    /// Replace the input text
    pub async fn edit_input(&self, text: impl Into<String>) -> WorkflowResponse {
        self.act(Action::EditInput(text.into())).await
    }

    /// Generate a plan from the current input; resolves when the call settles
    pub async fn generate(&self) -> WorkflowResponse {
        debug!("generate: called");
        self.act(Action::Generate).await
    }

    /// Set the input and generate a plan from it
    pub async fn submit(&self, text: impl Into<String>) -> WorkflowResponse {
        self.edit_input(text).await?;
        self.generate().await
    }

    /// Render the current plan and save it; resolves when the call settles
    pub async fn commit(&self) -> WorkflowResponse {
        debug!("commit: called");
        self.act(Action::Commit).await
    }

    /// Edit the plan under review
    pub async fn edit_plan(&self, edit: PlanEdit) -> WorkflowResponse {
        self.act(Action::EditPlan(edit)).await
    }

    /// Put a reviewed plan (e.g. read from a file) up for commit
    pub async fn load_plan(&self, plan: Plan) -> WorkflowResponse {
        debug!(items = plan.items.len(), "load_plan: called");
        self.act(Action::LoadPlan(plan)).await
    }

    /// Return to the initial empty state
    pub async fn reset(&self) -> WorkflowResponse {
        debug!("reset: called");
        self.act(Action::Reset).await
    }

    /// Current state
    pub async fn snapshot(&self) -> WorkflowResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| WorkflowError::ChannelClosed)?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    /// Watch state changes as they happen
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_rx.clone()
    }

    /// Stop the actor
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}
