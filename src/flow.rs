//! Auth flow controller: the state machine that gates every screen.
//!
//! Each screen mount asks the session store whether this client is already
//! authenticated and redirects accordingly; each form submit runs the
//! validator, then the remote gateway, then persists the session and
//! navigates. Transitions are pure where possible (`on_mount`) and the
//! side effects (notify, navigate, store write) go through injected
//! collaborator traits so the machine is testable without a real router.
//!
//! In-flight submits are keyed to the mount that issued them: unmounting or
//! remounting invalidates the ticket, so a late-arriving outcome from a
//! screen the user already left can neither write a session nor navigate.

// Allow dead code: embedding hooks beyond what the CLI front end exercises
#![allow(dead_code)]

use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{AuthGateway, AuthOutcome, LoginRequest, RegisterRequest};
use crate::auth::{
    validate_login, validate_register, LoginInput, RegisterInput, Session, SessionStore,
    ValidationError,
};

/// How long a notification stays up before auto-dismissing, in milliseconds
const AUTO_DISMISS_MS: u64 = 8000;

/// Shown for transport failures, which carry no server message
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

/// The screens the gate runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Landing,
}

/// Navigation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Landing,
}

/// Per-screen lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Checking,
    Redirecting,
    Idle,
    Submitting,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Display options forwarded to the notification surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOptions {
    pub position: Position,
    pub auto_dismiss: Duration,
    pub dismissible: bool,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            position: Position::TopRight,
            auto_dismiss: Duration::from_millis(AUTO_DISMISS_MS),
            dismissible: true,
        }
    }
}

/// The notification surface. Fire-and-forget; the gate never reads back.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity, options: &NotifyOptions);
}

/// Imperative navigation, applied by the host UI.
pub trait Navigator {
    fn go_to(&self, route: Route);
}

/// What a screen should do on mount, given the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountAction {
    /// Already authenticated on an entry form: leave before it can render.
    RedirectToLanding,
    /// Unauthenticated entry form: ready for input.
    ShowForm,
    /// Landing always renders; the username is present when a session is.
    ShowLanding { username: Option<String> },
}

/// Pure mount transition.
///
/// The landing screen never redirects when the session is absent; its route
/// protection is the router guard's job, not this gate's. That asymmetry
/// with Login/Register is intentional and preserved.
pub fn on_mount(screen: Screen, session: Option<&Session>) -> MountAction {
    match screen {
        Screen::Login | Screen::Register => {
            if session.is_some() {
                MountAction::RedirectToLanding
            } else {
                MountAction::ShowForm
            }
        }
        Screen::Landing => MountAction::ShowLanding {
            username: session.map(|s| s.username.clone()),
        },
    }
}

/// Ties an in-flight submit to the mount that issued it. Completing with a
/// stale ticket is a no-op: no write, no navigation, no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket {
    epoch: u64,
}

/// Orchestrates validation, the remote call, session persistence, and
/// navigation for the Login, Register, and Landing screens.
pub struct FlowController<S, G, N, V> {
    store: S,
    gateway: G,
    notifier: N,
    navigator: V,
    screen: Screen,
    state: FlowState,
    epoch: u64,
}

impl<S, G, N, V> FlowController<S, G, N, V>
where
    S: SessionStore,
    G: AuthGateway,
    N: Notifier,
    V: Navigator,
{
    pub fn new(store: S, gateway: G, notifier: N, navigator: V) -> Self {
        Self {
            store,
            gateway,
            notifier,
            navigator,
            screen: Screen::Login,
            state: FlowState::Checking,
            epoch: 0,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Mount a screen: read the session slot, apply the mount transition,
    /// and perform the redirect if one is called for.
    ///
    /// Mounting invalidates any submit still in flight from a previous
    /// mount.
    pub fn mount(&mut self, screen: Screen) -> MountAction {
        self.epoch += 1;
        self.screen = screen;
        self.state = FlowState::Checking;

        let session = self.store.read();
        let action = on_mount(screen, session.as_ref());
        match action {
            MountAction::RedirectToLanding => {
                debug!(?screen, "Session present on entry form, redirecting");
                self.state = FlowState::Redirecting;
                self.navigator.go_to(Route::Landing);
            }
            MountAction::ShowForm | MountAction::ShowLanding { .. } => {
                self.state = FlowState::Idle;
            }
        }
        action
    }

    /// Mark the current screen as gone. Any outcome that arrives for a
    /// ticket issued before this call is dropped.
    pub fn unmount(&mut self) {
        self.epoch += 1;
        self.state = FlowState::Checking;
    }

    /// Start a login submit. Returns the request to send plus the ticket to
    /// complete it with, or `None` when validation failed (the reason has
    /// been surfaced) or the submit was not accepted.
    pub fn begin_login(&mut self, input: &LoginInput) -> Option<(SubmitTicket, LoginRequest)> {
        if !self.accept_submit() {
            return None;
        }
        self.state = FlowState::Submitting;
        if let Err(reason) = validate_login(input) {
            self.reject_locally(reason);
            return None;
        }
        Some((
            SubmitTicket { epoch: self.epoch },
            LoginRequest {
                email: input.email.clone(),
                password: input.password.clone(),
            },
        ))
    }

    /// Start a register submit. The confirmation password is consumed by
    /// validation here and is absent from the outgoing request.
    pub fn begin_register(
        &mut self,
        input: &RegisterInput,
    ) -> Option<(SubmitTicket, RegisterRequest)> {
        if !self.accept_submit() {
            return None;
        }
        self.state = FlowState::Submitting;
        if let Err(reason) = validate_register(input) {
            self.reject_locally(reason);
            return None;
        }
        Some((
            SubmitTicket { epoch: self.epoch },
            RegisterRequest {
                username: input.username.clone(),
                email: input.email.clone(),
                password: input.password.clone(),
            },
        ))
    }

    /// Settle a submit with the outcome of the remote call.
    ///
    /// On success the session write happens before the navigation, exactly
    /// once each. Rejections and transport failures only notify and return
    /// the form to `Idle`; nothing is written and nothing navigates.
    pub fn complete(&mut self, ticket: SubmitTicket, outcome: AuthOutcome) {
        if ticket.epoch != self.epoch {
            debug!("Stale auth outcome dropped after unmount");
            return;
        }
        match outcome {
            AuthOutcome::Success { session } => {
                if let Err(e) = self.store.write(&session) {
                    warn!(error = %e, "Failed to persist session");
                }
                self.state = FlowState::Settled;
                self.navigator.go_to(Route::Landing);
            }
            AuthOutcome::Rejected { message } => {
                self.notifier
                    .notify(&message, Severity::Error, &NotifyOptions::default());
                self.state = FlowState::Idle;
            }
            AuthOutcome::TransportFailure => {
                self.notifier.notify(
                    TRANSPORT_FAILURE_MESSAGE,
                    Severity::Error,
                    &NotifyOptions::default(),
                );
                self.state = FlowState::Idle;
            }
        }
    }

    /// Validate, call the gateway, and settle, in one await.
    pub async fn submit_login(&mut self, input: &LoginInput) {
        if let Some((ticket, request)) = self.begin_login(input) {
            let outcome = self.gateway.login(&request).await;
            self.complete(ticket, outcome);
        }
    }

    /// Register counterpart of [`submit_login`](Self::submit_login).
    pub async fn submit_register(&mut self, input: &RegisterInput) {
        if let Some((ticket, request)) = self.begin_register(input) {
            let outcome = self.gateway.register(&request).await;
            self.complete(ticket, outcome);
        }
    }

    // Submits are serialized: while one is in flight, further submits are
    // ignored rather than spawning a second concurrent remote call.
    fn accept_submit(&mut self) -> bool {
        match self.state {
            FlowState::Idle => true,
            FlowState::Submitting => {
                debug!("Duplicate submit ignored while a request is in flight");
                false
            }
            _ => {
                debug!(state = ?self.state, "Submit ignored outside the form");
                false
            }
        }
    }

    fn reject_locally(&mut self, reason: ValidationError) {
        self.notifier
            .notify(&reason.to_string(), Severity::Error, &NotifyOptions::default());
        self.state = FlowState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::Utc;

    use super::*;
    use crate::auth::session::MemorySessionStore;

    /// Shared, ordered record of every side effect the controller performs.
    #[derive(Clone, Default)]
    struct Trace(Rc<RefCell<Vec<String>>>);

    impl Trace {
        fn push(&self, event: impl Into<String>) {
            self.0.borrow_mut().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    struct TraceStore {
        trace: Trace,
        inner: MemorySessionStore,
    }

    impl SessionStore for TraceStore {
        fn read(&self) -> Option<Session> {
            self.inner.read()
        }

        fn write(&self, session: &Session) -> anyhow::Result<()> {
            self.trace.push(format!("write:{}", session.username));
            self.inner.write(session)
        }

        fn clear(&self) -> anyhow::Result<()> {
            self.inner.clear()
        }
    }

    struct TraceNotifier {
        trace: Trace,
    }

    impl Notifier for TraceNotifier {
        fn notify(&self, message: &str, severity: Severity, options: &NotifyOptions) {
            assert_eq!(options, &NotifyOptions::default());
            self.trace.push(format!("notify:{:?}:{}", severity, message));
        }
    }

    struct TraceNavigator {
        trace: Trace,
    }

    impl Navigator for TraceNavigator {
        fn go_to(&self, route: Route) {
            self.trace.push(format!("goto:{:?}", route));
        }
    }

    /// Gateway double returning a canned outcome, recording each call.
    struct StubGateway {
        trace: Trace,
        outcome: AuthOutcome,
    }

    impl AuthGateway for StubGateway {
        async fn login(&self, _request: &LoginRequest) -> AuthOutcome {
            self.trace.push("net:login");
            self.outcome.clone()
        }

        async fn register(&self, _request: &RegisterRequest) -> AuthOutcome {
            self.trace.push("net:register");
            self.outcome.clone()
        }
    }

    fn session(username: &str) -> Session {
        Session {
            id: "1".to_string(),
            username: username.to_string(),
            presence: None,
            created_at: Utc::now(),
        }
    }

    fn controller(
        stored: Option<Session>,
        outcome: AuthOutcome,
    ) -> (
        Trace,
        FlowController<TraceStore, StubGateway, TraceNotifier, TraceNavigator>,
    ) {
        let trace = Trace::default();
        let inner = match stored {
            Some(s) => MemorySessionStore::with_session(s),
            None => MemorySessionStore::new(),
        };
        let flow = FlowController::new(
            TraceStore {
                trace: trace.clone(),
                inner,
            },
            StubGateway {
                trace: trace.clone(),
                outcome,
            },
            TraceNotifier {
                trace: trace.clone(),
            },
            TraceNavigator {
                trace: trace.clone(),
            },
        );
        (trace, flow)
    }

    fn valid_login() -> LoginInput {
        LoginInput {
            email: "alice@example.com".to_string(),
            password: "Abcdef1!".to_string(),
        }
    }

    fn valid_register() -> RegisterInput {
        RegisterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Abcdef1!".to_string(),
            confirm_password: "Abcdef1!".to_string(),
        }
    }

    fn rejected(message: &str) -> AuthOutcome {
        AuthOutcome::Rejected {
            message: message.to_string(),
        }
    }

    #[test]
    fn mounting_login_with_session_redirects_before_the_form_shows() {
        let (trace, mut flow) = controller(Some(session("alice")), AuthOutcome::TransportFailure);

        let action = flow.mount(Screen::Login);

        assert_eq!(action, MountAction::RedirectToLanding);
        assert_eq!(flow.state(), FlowState::Redirecting);
        assert_eq!(trace.events(), ["goto:Landing"]);
    }

    #[test]
    fn mounting_register_with_session_redirects_too() {
        let (trace, mut flow) = controller(Some(session("alice")), AuthOutcome::TransportFailure);

        assert_eq!(flow.mount(Screen::Register), MountAction::RedirectToLanding);
        assert_eq!(trace.events(), ["goto:Landing"]);
    }

    #[test]
    fn mounting_login_without_session_shows_the_form() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);

        assert_eq!(flow.mount(Screen::Login), MountAction::ShowForm);
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(trace.events().is_empty());
    }

    #[test]
    fn landing_without_session_does_not_redirect() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);

        let action = flow.mount(Screen::Landing);

        assert_eq!(action, MountAction::ShowLanding { username: None });
        assert!(trace.events().is_empty());
    }

    #[test]
    fn landing_with_session_supplies_the_username() {
        let (_, mut flow) = controller(Some(session("alice")), AuthOutcome::TransportFailure);

        assert_eq!(
            flow.mount(Screen::Landing),
            MountAction::ShowLanding {
                username: Some("alice".to_string())
            }
        );
    }

    #[tokio::test]
    async fn invalid_input_notifies_without_any_network_call() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);
        flow.mount(Screen::Login);

        flow.submit_login(&LoginInput::default()).await;

        assert_eq!(
            trace.events(),
            ["notify:Error:Email and password are required."]
        );
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn successful_login_writes_once_then_navigates_once() {
        let (trace, mut flow) = controller(
            None,
            AuthOutcome::Success {
                session: session("alice"),
            },
        );
        flow.mount(Screen::Login);

        flow.submit_login(&valid_login()).await;

        assert_eq!(trace.events(), ["net:login", "write:alice", "goto:Landing"]);
        assert_eq!(flow.state(), FlowState::Settled);
    }

    #[tokio::test]
    async fn successful_register_follows_the_same_order() {
        let (trace, mut flow) = controller(
            None,
            AuthOutcome::Success {
                session: session("alice"),
            },
        );
        flow.mount(Screen::Register);

        flow.submit_register(&valid_register()).await;

        assert_eq!(
            trace.events(),
            ["net:register", "write:alice", "goto:Landing"]
        );
    }

    #[tokio::test]
    async fn rejection_notifies_and_neither_writes_nor_navigates() {
        let (trace, mut flow) = controller(None, rejected("Incorrect username or password"));
        flow.mount(Screen::Login);

        flow.submit_login(&valid_login()).await;

        assert_eq!(
            trace.events(),
            ["net:login", "notify:Error:Incorrect username or password"]
        );
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_the_generic_message() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);
        flow.mount(Screen::Login);

        flow.submit_login(&valid_login()).await;

        assert_eq!(
            trace.events(),
            [
                "net:login".to_string(),
                format!("notify:Error:{TRANSPORT_FAILURE_MESSAGE}")
            ]
        );
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn retry_after_rejection_is_accepted() {
        let (trace, mut flow) = controller(None, rejected("nope"));
        flow.mount(Screen::Login);

        flow.submit_login(&valid_login()).await;
        flow.submit_login(&valid_login()).await;

        assert_eq!(trace.events().iter().filter(|e| *e == "net:login").count(), 2);
    }

    #[test]
    fn duplicate_submit_is_ignored_while_in_flight() {
        let (_, mut flow) = controller(None, AuthOutcome::TransportFailure);
        flow.mount(Screen::Login);

        let first = flow.begin_login(&valid_login());
        assert!(first.is_some());
        assert_eq!(flow.state(), FlowState::Submitting);

        assert!(flow.begin_login(&valid_login()).is_none());
    }

    #[test]
    fn outcome_after_unmount_is_dropped() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);
        flow.mount(Screen::Login);

        let (ticket, _) = flow.begin_login(&valid_login()).unwrap();
        flow.unmount();
        flow.complete(
            ticket,
            AuthOutcome::Success {
                session: session("alice"),
            },
        );

        assert!(trace.events().is_empty());
    }

    #[test]
    fn remounting_invalidates_the_inflight_ticket() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);
        flow.mount(Screen::Login);

        let (ticket, _) = flow.begin_login(&valid_login()).unwrap();
        flow.mount(Screen::Login);
        flow.complete(
            ticket,
            AuthOutcome::Success {
                session: session("alice"),
            },
        );

        assert!(trace.events().is_empty());
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn validation_failure_keeps_the_confirmation_local() {
        let (trace, mut flow) = controller(None, AuthOutcome::TransportFailure);
        flow.mount(Screen::Register);

        let mismatched = RegisterInput {
            confirm_password: "Abcdef2!".to_string(),
            ..valid_register()
        };
        assert!(flow.begin_register(&mismatched).is_none());
        assert_eq!(trace.events(), ["notify:Error:Both passwords must match."]);
    }

    #[test]
    fn default_notify_options_match_the_toast_contract() {
        let options = NotifyOptions::default();
        assert_eq!(options.position, Position::TopRight);
        assert_eq!(options.auto_dismiss, Duration::from_millis(8000));
        assert!(options.dismissible);
    }
}
