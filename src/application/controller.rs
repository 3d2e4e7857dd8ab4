// Chart controller - async shell that runs a session on the tokio runtime
//
// UI events arrive as commands on a channel; fetches run in a JoinSet and
// their results are fed back into the session between commands. The
// session itself stays single-threaded inside the event loop.
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::domain::commit::CommitId;
use crate::domain::series::SeriesData;

use super::provider::{FetchError, SeriesProvider};
use super::session::{ChartSession, FetchTicket, RenderSurface, SelectionSink, Toggled};

enum Command {
    Toggle(CommitId),
    KeepOnly(CommitId),
    ClearAll,
    SetViewport(f64, f64),
    ResetViewport,
    Restore(String),
}

type FetchOutcome = (FetchTicket, Result<SeriesData, FetchError>);

/// Cheap cloneable handle; drop every clone to stop the event loop.
#[derive(Clone)]
pub struct ChartController {
    commands: mpsc::UnboundedSender<Command>,
}

impl ChartController {
    pub fn spawn<R, S>(
        mut session: ChartSession<R, S>,
        provider: Arc<dyn SeriesProvider>,
    ) -> (Self, JoinHandle<()>)
    where
        R: RenderSurface + Send + 'static,
        S: SelectionSink + Send + 'static,
    {
        let (commands, mut inbox) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut fetches: JoinSet<FetchOutcome> = JoinSet::new();
            loop {
                tokio::select! {
                    command = inbox.recv() => match command {
                        Some(command) => {
                            Self::apply(&mut session, &mut fetches, &provider, command);
                        }
                        None => break,
                    },
                    Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                        Self::resolve(&mut session, joined);
                    }
                }
            }
            // the handles are gone; settle whatever is still in flight
            while let Some(joined) = fetches.join_next().await {
                Self::resolve(&mut session, joined);
            }
            tracing::debug!("chart controller stopped");
        });
        (Self { commands }, handle)
    }

    fn apply<R, S>(
        session: &mut ChartSession<R, S>,
        fetches: &mut JoinSet<FetchOutcome>,
        provider: &Arc<dyn SeriesProvider>,
        command: Command,
    ) where
        R: RenderSurface + Send + 'static,
        S: SelectionSink + Send + 'static,
    {
        match command {
            Command::Toggle(key) => {
                if let Toggled::FetchNeeded(ticket) = session.toggle(&key) {
                    Self::run_fetch(fetches, provider, ticket);
                }
            }
            Command::KeepOnly(key) => session.keep_only(&key),
            Command::ClearAll => session.clear_all(),
            Command::SetViewport(x_lo, x_hi) => session.set_viewport(x_lo, x_hi),
            Command::ResetViewport => session.reset_viewport(),
            Command::Restore(fragment) => {
                let (tickets, _warnings) = session.restore_selection(&fragment);
                for ticket in tickets {
                    Self::run_fetch(fetches, provider, ticket);
                }
            }
        }
    }

    fn run_fetch(
        fetches: &mut JoinSet<FetchOutcome>,
        provider: &Arc<dyn SeriesProvider>,
        ticket: FetchTicket,
    ) {
        let provider = provider.clone();
        fetches.spawn(async move {
            let result = provider
                .fetch_series(ticket.key())
                .await
                .map(SeriesData::from_record);
            (ticket, result)
        });
    }

    fn resolve<R, S>(
        session: &mut ChartSession<R, S>,
        joined: Result<FetchOutcome, tokio::task::JoinError>,
    ) where
        R: RenderSurface + Send + 'static,
        S: SelectionSink + Send + 'static,
    {
        match joined {
            Ok((ticket, result)) => {
                session.complete_activation(ticket, result);
            }
            Err(error) => tracing::error!(%error, "series fetch task aborted"),
        }
    }

    pub fn toggle(&self, key: CommitId) {
        let _ = self.commands.send(Command::Toggle(key));
    }

    pub fn keep_only(&self, key: CommitId) {
        let _ = self.commands.send(Command::KeepOnly(key));
    }

    pub fn clear_all(&self) {
        let _ = self.commands.send(Command::ClearAll);
    }

    pub fn set_viewport(&self, x_lo: f64, x_hi: f64) {
        let _ = self.commands.send(Command::SetViewport(x_lo, x_hi));
    }

    pub fn reset_viewport(&self) {
        let _ = self.commands.send(Command::ResetViewport);
    }

    pub fn restore(&self, fragment: impl Into<String>) {
        let _ = self.commands.send(Command::Restore(fragment.into()));
    }
}
