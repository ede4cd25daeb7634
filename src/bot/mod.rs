//! Bot composition root: gateway consumption and command dispatch.

mod dispatch;

pub use dispatch::InteractionDispatcher;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::application::CollageService;
use crate::domain::entities::BotToken;
use crate::infrastructure::discord::{
    ApiError, DiscordRestClient, DispatchEvent, GatewayClient, GatewayEventKind, GatewayIntents,
    command_surface,
};

/// How long to wait for the gateway task to close the socket after a
/// shutdown request.
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

/// Replaces the application's global command set and returns how many
/// commands Discord now carries.
///
/// # Errors
/// Returns an error when the application identity cannot be fetched or
/// the registration request is refused.
pub async fn sync_commands(rest: &DiscordRestClient) -> Result<usize, ApiError> {
    let application = rest.current_application().await?;
    info!(application_id = %application.id, "Registering global commands");
    rest.overwrite_global_commands(&application.id, &command_surface())
        .await
}

/// The running bot: consumes gateway events and answers slash commands.
pub struct CollageBot {
    token: BotToken,
    rest: Arc<DiscordRestClient>,
    service: CollageService,
}

impl CollageBot {
    /// Creates a bot from its wired dependencies.
    #[must_use]
    pub fn new(token: BotToken, rest: Arc<DiscordRestClient>, service: CollageService) -> Self {
        Self {
            token,
            rest,
            service,
        }
    }

    /// Connects to the gateway and runs until the event stream ends or a
    /// shutdown signal arrives.
    ///
    /// # Errors
    /// Returns an error when the gateway connection cannot be started.
    pub async fn run(self) -> color_eyre::Result<()> {
        let mut gateway = GatewayClient::new(GatewayIntents::bot_default());
        let mut events = gateway.connect(self.token.as_str())?;

        // Built on the first READY; interactions cannot be answered
        // before the application ID is known.
        let mut dispatcher: Option<Arc<InteractionDispatcher>> = None;

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Gateway event stream ended");
                        break;
                    };
                    if !self.handle_gateway_event(event, &mut dispatcher) {
                        break;
                    }
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Signal handler failed, shutting down");
                    }
                    info!("Shutdown requested");
                    gateway.disconnect();

                    // The gateway task closes the socket and then drops
                    // its sender; drain until the channel ends.
                    let _ = tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, async {
                        while events.recv().await.is_some() {}
                    })
                    .await;
                    break;
                }
            }
        }

        info!("Bot exiting");
        Ok(())
    }

    /// Returns `false` when the bot should stop.
    fn handle_gateway_event(
        &self,
        event: GatewayEventKind,
        dispatcher: &mut Option<Arc<InteractionDispatcher>>,
    ) -> bool {
        match event {
            GatewayEventKind::Connected { session_id, .. } => {
                info!(session_id = %session_id, "Gateway connected");
            }
            GatewayEventKind::Disconnected { reason, can_resume } => {
                warn!(reason = %reason, can_resume, "Gateway disconnected");
            }
            GatewayEventKind::Reconnecting { attempt } => {
                info!(attempt, "Gateway reconnecting");
            }
            GatewayEventKind::Resumed => {
                info!("Gateway session resumed");
            }
            GatewayEventKind::Dispatch(dispatch) => self.handle_dispatch(dispatch, dispatcher),
            GatewayEventKind::Error {
                message,
                recoverable,
            } => {
                if recoverable {
                    warn!(error = %message, "Recoverable gateway error");
                } else {
                    error!(error = %message, "Fatal gateway error");
                    return false;
                }
            }
        }
        true
    }

    fn handle_dispatch(
        &self,
        event: DispatchEvent,
        dispatcher: &mut Option<Arc<InteractionDispatcher>>,
    ) {
        match event {
            DispatchEvent::Ready(session) => {
                info!(
                    user_id = %session.user_id,
                    application_id = %session.application_id,
                    "Bot is ready"
                );
                *dispatcher = Some(Arc::new(InteractionDispatcher::new(
                    Arc::clone(&self.rest),
                    self.service.clone(),
                    session.application_id,
                )));
            }
            DispatchEvent::InteractionCreate(interaction) => {
                let Some(dispatcher) = dispatcher else {
                    warn!(interaction = %interaction.id, "Interaction before READY, dropping");
                    return;
                };
                // Dispatch off the event loop so a slow acknowledgement
                // never delays gateway reads.
                let dispatcher = Arc::clone(dispatcher);
                tokio::spawn(async move {
                    dispatcher.dispatch(interaction).await;
                });
            }
            DispatchEvent::GuildCreate { guild_id, name } => {
                debug!(guild = %guild_id, name = %name, "Guild available");
            }
            DispatchEvent::Unknown { event_type } => {
                debug!(event = %event_type, "Ignoring dispatch");
            }
        }
    }
}
