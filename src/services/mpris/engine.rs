use std::{collections::HashMap, thread};

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};
use zbus::{Connection, fdo, zvariant::OwnedValue};

use crate::{
    config::MediaConfig,
    platform::{
        dispatcher::InstructionDispatcher,
        reporter::StateReporter,
        types::{Instruction, InstructionAck, PlatformEvent},
    },
};

use super::{
    art::ArtResolver,
    error::MediaError,
    proxy::MediaPlayer2PlayerProxy,
    registry::{OwnershipChange, PlayerRegistry},
    session::{MprisTransport, PlayerSession},
    types::{MPRIS_NAME_PREFIX, PlayerId},
};

const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";
const PLAYER_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Everything the engine loop reacts to.
///
/// Bus signals, inbound instructions and external queries all arrive as
/// commands on one channel, so every registry and session mutation is
/// single-threaded and per-player delivery order is preserved.
enum EngineCommand {
    OwnerChanged {
        name: String,
        old_owner: String,
        new_owner: String,
    },
    PropertiesChanged {
        player: PlayerId,
        changed: HashMap<String, OwnedValue>,
    },
    Seeked {
        player: PlayerId,
        position: i64,
    },
    Instruction {
        instruction: Instruction,
        reply: oneshot::Sender<InstructionAck>,
    },
    CurrentPlayer {
        reply: oneshot::Sender<Option<PlayerId>>,
    },
    PlayerIds {
        reply: oneshot::Sender<Vec<PlayerId>>,
    },
    Shutdown,
}

/// Handle to the media engine.
///
/// The engine itself runs on a dedicated worker thread; this handle
/// marshals instructions and queries onto its loop. Cheap to clone.
#[derive(Clone)]
pub struct MediaEngine {
    commands: mpsc::UnboundedSender<EngineCommand>,
}

impl MediaEngine {
    /// Start the engine worker and wait until discovery is wired up.
    ///
    /// Already-running players are picked up by the startup enumeration;
    /// later arrivals and departures come in through NameOwnerChanged.
    ///
    /// # Errors
    /// Returns `MediaError::InitializationFailed` if the worker thread,
    /// the session-bus connection, or the signal subscriptions cannot be
    /// set up.
    pub async fn spawn(
        config: MediaConfig,
        events: mpsc::UnboundedSender<PlatformEvent>,
    ) -> Result<Self, MediaError> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let loop_commands = commands.clone();
        thread::Builder::new()
            .name("desklink-media".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(MediaError::InitializationFailed(format!(
                            "Worker runtime failed: {e}"
                        ))));
                        return;
                    }
                };

                runtime.block_on(run_engine(
                    config,
                    events,
                    loop_commands,
                    command_rx,
                    ready_tx,
                ));
            })
            .map_err(|e| {
                MediaError::InitializationFailed(format!("Worker thread failed: {e}"))
            })?;

        ready_rx
            .await
            .map_err(|_| MediaError::InitializationFailed("Worker exited during startup".to_string()))?
            .map(|()| Self { commands })
    }

    /// Route one instruction onto the engine loop and await its
    /// acknowledgment. Always acknowledged, even across shutdown.
    pub async fn dispatch(&self, instruction: Instruction) -> InstructionAck {
        let (reply, ack) = oneshot::channel();

        if self
            .commands
            .send(EngineCommand::Instruction { instruction, reply })
            .is_err()
        {
            return InstructionAck::from_result(&Err(MediaError::ShuttingDown));
        }

        ack.await
            .unwrap_or_else(|_| InstructionAck::from_result(&Err(MediaError::ShuttingDown)))
    }

    /// The current (most recently connected) player, if any.
    ///
    /// # Errors
    /// Returns `MediaError::ShuttingDown` once the engine loop is gone.
    pub async fn current_player(&self) -> Result<Option<PlayerId>, MediaError> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(EngineCommand::CurrentPlayer { reply })
            .map_err(|_| MediaError::ShuttingDown)?;
        answer.await.map_err(|_| MediaError::ShuttingDown)
    }

    /// Bus names of all live players.
    ///
    /// # Errors
    /// Returns `MediaError::ShuttingDown` once the engine loop is gone.
    pub async fn player_ids(&self) -> Result<Vec<PlayerId>, MediaError> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(EngineCommand::PlayerIds { reply })
            .map_err(|_| MediaError::ShuttingDown)?;
        answer.await.map_err(|_| MediaError::ShuttingDown)
    }

    /// Ask the engine loop to stop. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.commands.send(EngineCommand::Shutdown);
    }
}

async fn run_engine(
    config: MediaConfig,
    events: mpsc::UnboundedSender<PlatformEvent>,
    commands: mpsc::UnboundedSender<EngineCommand>,
    mut command_rx: mpsc::UnboundedReceiver<EngineCommand>,
    ready: oneshot::Sender<Result<(), MediaError>>,
) {
    let connection = match initialize(&commands).await {
        Ok(connection) => {
            let _ = ready.send(Ok(()));
            connection
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut state = EngineState {
        connection,
        registry: PlayerRegistry::new(config.ignored_players.clone()),
        reporter: StateReporter::new(events),
        art: ArtResolver::new(config.resolve_local_art),
        commands,
        monitors: HashMap::new(),
    };

    info!("Media engine running");

    while let Some(command) = command_rx.recv().await {
        match command {
            EngineCommand::OwnerChanged {
                name,
                old_owner,
                new_owner,
            } => {
                state.handle_owner_changed(&name, &old_owner, &new_owner).await;
            }
            EngineCommand::PropertiesChanged { player, changed } => {
                state.handle_properties_changed(&player, &changed);
            }
            EngineCommand::Seeked { player, position } => {
                debug!("Player {player} seeked to {position}us");
            }
            EngineCommand::Instruction { instruction, reply } => {
                InstructionDispatcher::dispatch(&state.registry, instruction, reply).await;
            }
            EngineCommand::CurrentPlayer { reply } => {
                let _ = reply.send(state.registry.current().cloned());
            }
            EngineCommand::PlayerIds { reply } => {
                let _ = reply.send(state.registry.player_ids());
            }
            EngineCommand::Shutdown => break,
        }
    }

    state.teardown();
    info!("Media engine stopped");
}

/// Connect to the session bus, subscribe to ownership changes and sweep
/// the names that are already owned.
#[instrument(skip(commands))]
async fn initialize(
    commands: &mpsc::UnboundedSender<EngineCommand>,
) -> Result<Connection, MediaError> {
    let connection = Connection::session().await.map_err(|e| {
        MediaError::InitializationFailed(format!("D-Bus connection failed: {e}"))
    })?;

    let dbus_proxy = fdo::DBusProxy::new(&connection)
        .await
        .map_err(|e| MediaError::InitializationFailed(format!("DBus proxy failed: {e}")))?;

    let mut name_owner_changed = dbus_proxy.receive_name_owner_changed().await.map_err(|e| {
        MediaError::InitializationFailed(format!("Signal subscription failed: {e}"))
    })?;

    let forwarder = commands.clone();
    tokio::spawn(async move {
        while let Some(signal) = name_owner_changed.next().await {
            let Ok(args) = signal.args() else {
                continue;
            };

            let send = forwarder.send(EngineCommand::OwnerChanged {
                name: args.name().to_string(),
                old_owner: args
                    .old_owner()
                    .as_deref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                new_owner: args
                    .new_owner()
                    .as_deref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            });
            if send.is_err() {
                break;
            }
        }
    });

    let names = dbus_proxy
        .list_names()
        .await
        .map_err(|e| MediaError::InitializationFailed(format!("Name listing failed: {e}")))?;

    for name in names {
        if !name.starts_with(MPRIS_NAME_PREFIX) {
            continue;
        }

        // Synthesized gain so already-running players are discovered
        // without waiting for a live transition.
        let _ = commands.send(EngineCommand::OwnerChanged {
            name: name.to_string(),
            old_owner: String::new(),
            new_owner: "existing".to_string(),
        });
    }

    Ok(connection)
}

/// State owned exclusively by the engine loop.
struct EngineState {
    connection: Connection,
    registry: PlayerRegistry<MprisTransport>,
    reporter: StateReporter,
    art: ArtResolver,
    commands: mpsc::UnboundedSender<EngineCommand>,
    monitors: HashMap<PlayerId, tokio::task::JoinHandle<()>>,
}

impl EngineState {
    async fn handle_owner_changed(&mut self, name: &str, old_owner: &str, new_owner: &str) {
        match OwnershipChange::classify(name, old_owner, new_owner) {
            OwnershipChange::Appeared(id) => self.add_player(id).await,
            OwnershipChange::Vanished(id) => self.remove_player(&id),
            OwnershipChange::Irrelevant => {}
        }
    }

    #[instrument(skip(self), fields(bus_name = %id.bus_name()))]
    async fn add_player(&mut self, id: PlayerId) {
        if self.registry.is_ignored(id.bus_name()) {
            debug!("Ignoring player per configuration");
            return;
        }

        let session =
            match PlayerSession::connect(&self.connection, id.clone(), self.art.clone()).await {
                Ok(session) => session,
                Err(e) => {
                    // The name is treated as never having appeared.
                    warn!("Skipping player: {e}");
                    return;
                }
            };

        info!("Connected to player {}", session.display_name());
        self.registry.insert(session);

        match self.start_monitor(&id).await {
            Ok(handle) => {
                self.monitors.insert(id, handle);
            }
            Err(e) => warn!("Property monitoring unavailable: {e}"),
        }
    }

    fn remove_player(&mut self, id: &PlayerId) {
        if let Some(handle) = self.monitors.remove(id) {
            handle.abort();
        }

        if self.registry.remove(id).is_some() {
            info!("Player {id} disconnected");
            self.reporter.forget(id);
        }
    }

    fn handle_properties_changed(&mut self, id: &PlayerId, changed: &HashMap<String, OwnedValue>) {
        // A notification can race its player's teardown; it lands here
        // after removal and must not touch a dead entry.
        let Some(session) = self.registry.get_mut(id) else {
            debug!("Dropping property change for unknown player {id}");
            return;
        };

        let diff = session.apply_property_diff(changed);
        if !diff.observable() {
            return;
        }

        if let Some(session) = self.registry.get(id) {
            self.reporter.report(session, diff);
        }
    }

    /// Subscribe to one player's PropertiesChanged and Seeked signals and
    /// forward them onto the loop. One task per player keeps delivery
    /// order intact.
    async fn start_monitor(
        &self,
        id: &PlayerId,
    ) -> Result<tokio::task::JoinHandle<()>, MediaError> {
        let connect_failed = |source| MediaError::ConnectionFailed {
            player: id.clone(),
            source,
        };

        let properties_proxy = fdo::PropertiesProxy::builder(&self.connection)
            .destination(id.bus_name().to_string())
            .map_err(connect_failed)?
            .path(PLAYER_OBJECT_PATH)
            .map_err(connect_failed)?
            .build()
            .await
            .map_err(connect_failed)?;

        let mut property_changes = properties_proxy
            .receive_properties_changed()
            .await
            .map_err(connect_failed)?;

        let player_proxy = MediaPlayer2PlayerProxy::builder(&self.connection)
            .destination(id.bus_name().to_string())
            .map_err(connect_failed)?
            .build()
            .await
            .map_err(connect_failed)?;

        let mut seeked = player_proxy.receive_seeked().await.map_err(connect_failed)?;

        let commands = self.commands.clone();
        let player = id.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    signal = property_changes.next() => {
                        let Some(signal) = signal else { break };
                        let Ok(args) = signal.args() else { continue };

                        if args.interface_name().as_str() != PLAYER_INTERFACE {
                            continue;
                        }

                        let changed: HashMap<String, OwnedValue> = args
                            .changed_properties()
                            .iter()
                            .filter_map(|(key, value)| {
                                OwnedValue::try_from(value.clone())
                                    .ok()
                                    .map(|owned| ((*key).to_string(), owned))
                            })
                            .collect();

                        if commands
                            .send(EngineCommand::PropertiesChanged {
                                player: player.clone(),
                                changed,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                    signal = seeked.next() => {
                        let Some(signal) = signal else { break };
                        let Ok(args) = signal.args() else { continue };

                        if commands
                            .send(EngineCommand::Seeked {
                                player: player.clone(),
                                position: *args.position(),
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        Ok(handle)
    }

    fn teardown(&mut self) {
        for (_, handle) in self.monitors.drain() {
            handle.abort();
        }

        let sessions = self.registry.drain();
        debug!("Dropped {} player sessions", sessions.len());
    }
}
