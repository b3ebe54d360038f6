//! Chat session supervision.
//!
//! # States
//! ```text
//! Disconnected → Connecting → Connected → Disconnected   (session dropped)
//!                    │            │
//!                    └────────────┴──→ Closing → Disconnected (shutdown)
//! ```
//!
//! A dropped session is reconnected after a fixed delay unless the network
//! reports that the account was logged out.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::config::RelayConfig;

/// Lifecycle state of the chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Credentials were revoked; reconnecting cannot succeed.
    LoggedOut,
    /// Any other drop; worth reconnecting.
    Lost(String),
}

/// How the supervisor stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorExit {
    LoggedOut,
    Shutdown,
}

/// Connection to a chat network.
pub trait ChatConnector: Send + Sync {
    /// Open a session.
    fn connect(&self) -> impl Future<Output = Result<(), CloseReason>> + Send;

    /// Resolve when the open session closes.
    fn closed(&self) -> impl Future<Output = CloseReason> + Send;

    /// Close the open session.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Keeps a chat session alive with fixed-delay reconnects.
pub struct SessionSupervisor<C> {
    connector: C,
    reconnect_delay: Duration,
    state: watch::Sender<SessionState>,
}

impl<C: ChatConnector> SessionSupervisor<C> {
    pub fn new(connector: C, reconnect_delay: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            connector,
            reconnect_delay,
            state,
        }
    }

    /// Build a supervisor from the relay section of the configuration.
    pub fn from_config(connector: C, config: &RelayConfig) -> Self {
        Self::new(connector, Duration::from_millis(config.reconnect_delay_ms))
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = ?previous, to = ?next, "Session state changed");
        }
    }

    /// Run until logged out or shut down.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> SupervisorExit {
        loop {
            self.transition(SessionState::Connecting);

            let reason = tokio::select! {
                connected = self.connector.connect() => match connected {
                    Ok(()) => {
                        self.transition(SessionState::Connected);
                        tracing::info!("Chat session connected");
                        tokio::select! {
                            reason = self.connector.closed() => reason,
                            _ = shutdown.recv() => return self.close().await,
                        }
                    }
                    Err(reason) => reason,
                },
                _ = shutdown.recv() => return self.close().await,
            };

            self.transition(SessionState::Disconnected);

            match reason {
                CloseReason::LoggedOut => {
                    tracing::warn!("Chat session logged out, not reconnecting");
                    return SupervisorExit::LoggedOut;
                }
                CloseReason::Lost(cause) => {
                    tracing::warn!(
                        cause = %cause,
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "Chat session closed, reconnecting"
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.recv() => return SupervisorExit::Shutdown,
            }
        }
    }

    async fn close(&self) -> SupervisorExit {
        self.transition(SessionState::Closing);
        self.connector.close().await;
        self.transition(SessionState::Disconnected);
        SupervisorExit::Shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a script of session lifetimes; blocks forever once exhausted.
    struct Scripted {
        connects: AtomicUsize,
        closes: AtomicUsize,
        lifetimes: Mutex<VecDeque<Result<CloseReason, CloseReason>>>,
        current: Mutex<Option<CloseReason>>,
    }

    impl Scripted {
        fn new(lifetimes: Vec<Result<CloseReason, CloseReason>>) -> Self {
            Self {
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                lifetimes: Mutex::new(lifetimes.into()),
                current: Mutex::new(None),
            }
        }
    }

    impl ChatConnector for Scripted {
        async fn connect(&self) -> Result<(), CloseReason> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let next = self.lifetimes.lock().unwrap().pop_front();
            match next {
                // connected, and will later close for this reason
                Some(Ok(reason)) => {
                    *self.current.lock().unwrap() = Some(reason);
                    Ok(())
                }
                Some(Err(reason)) => Err(reason),
                None => {
                    *self.current.lock().unwrap() = None;
                    Ok(())
                }
            }
        }

        async fn closed(&self) -> CloseReason {
            let reason = self.current.lock().unwrap().take();
            match reason {
                Some(reason) => reason,
                None => std::future::pending().await,
            }
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn reconnects_until_logged_out() {
        let connector = Scripted::new(vec![
            Ok(CloseReason::Lost("stream errored".into())),
            Err(CloseReason::Lost("connection refused".into())),
            Ok(CloseReason::LoggedOut),
        ]);
        let supervisor = SessionSupervisor::new(connector, Duration::from_millis(10));
        let shutdown = broadcast::channel(1).0;

        let exit = supervisor.run(shutdown.subscribe()).await;
        assert_eq!(exit, SupervisorExit::LoggedOut);
        assert_eq!(supervisor.connector.connects.load(Ordering::SeqCst), 3);
        assert_eq!(supervisor.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn waits_fixed_delay_between_attempts() {
        let connector = Scripted::new(vec![
            Err(CloseReason::Lost("down".into())),
            Ok(CloseReason::LoggedOut),
        ]);
        let supervisor = SessionSupervisor::new(connector, Duration::from_millis(150));
        let shutdown = broadcast::channel(1).0;

        let started = std::time::Instant::now();
        supervisor.run(shutdown.subscribe()).await;
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn reconnect_delay_comes_from_config() {
        let config = RelayConfig {
            reconnect_delay_ms: 120,
            ..RelayConfig::default()
        };
        let connector = Scripted::new(vec![
            Err(CloseReason::Lost("down".into())),
            Ok(CloseReason::LoggedOut),
        ]);
        let supervisor = SessionSupervisor::from_config(connector, &config);
        assert_eq!(supervisor.reconnect_delay(), Duration::from_millis(120));

        let shutdown = broadcast::channel(1).0;
        let started = std::time::Instant::now();
        assert_eq!(supervisor.run(shutdown.subscribe()).await, SupervisorExit::LoggedOut);
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn default_reconnect_delay_is_five_seconds() {
        let supervisor = SessionSupervisor::from_config(Scripted::new(vec![]), &RelayConfig::default());
        assert_eq!(supervisor.reconnect_delay(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn shutdown_closes_connected_session() {
        let connector = Scripted::new(vec![]);
        let supervisor = SessionSupervisor::new(connector, Duration::from_millis(10));
        let shutdown = broadcast::channel(1).0;
        let rx = shutdown.subscribe();
        let mut states = supervisor.subscribe();

        let run = supervisor.run(rx);
        let trigger = async {
            states.wait_for(|s| *s == SessionState::Connected).await.unwrap();
            shutdown.send(()).unwrap();
        };
        let (exit, _) = tokio::join!(run, trigger);

        assert_eq!(exit, SupervisorExit::Shutdown);
        assert_eq!(supervisor.connector.closes.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.state(), SessionState::Disconnected);
    }
}
