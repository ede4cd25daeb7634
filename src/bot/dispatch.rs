//! Routing from gateway interactions to queued canvas work.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::CollageService;
use crate::domain::entities::{CompositeRequest, CompositeSource, GuildId};
use crate::domain::errors::ServiceError;
use crate::domain::ports::ResponderPort;
use crate::infrastructure::discord::{
    COLLAGE_COMMAND, DiscordRestClient, FollowupResponder, IncomingInteraction,
};

/// Where an interaction goes after inspection.
#[derive(Debug)]
enum Route {
    /// A collage command with a guild context; queue it.
    Submit(GuildId, CompositeSource),
    /// A collage command the service will never accept; tell the user.
    Reject(ServiceError),
    /// Some other command; not ours to answer.
    Ignore,
}

fn route(interaction: &IncomingInteraction) -> Route {
    if interaction.command != COLLAGE_COMMAND {
        return Route::Ignore;
    }
    let Some(guild_id) = interaction.guild_id else {
        return Route::Reject(ServiceError::InvalidGuild);
    };
    Route::Submit(
        guild_id,
        CompositeSource::from_options(
            interaction.image_url.clone(),
            interaction.attachment_url.clone(),
        ),
    )
}

/// Acknowledges slash command invocations and hands them to the service.
///
/// Every accepted interaction is deferred first so its followup token
/// stays valid while the request waits in the queue.
pub struct InteractionDispatcher {
    rest: Arc<DiscordRestClient>,
    service: CollageService,
    application_id: String,
}

impl InteractionDispatcher {
    /// Creates a dispatcher bound to one application identity.
    #[must_use]
    pub fn new(
        rest: Arc<DiscordRestClient>,
        service: CollageService,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            rest,
            service,
            application_id: application_id.into(),
        }
    }

    /// Processes one interaction to its terminal response or rejection
    /// notice. Unknown commands are dropped without acknowledgement.
    pub async fn dispatch(&self, interaction: IncomingInteraction) {
        let outcome = match route(&interaction) {
            Route::Ignore => {
                debug!(command = %interaction.command, "Ignoring interaction for unknown command");
                return;
            }
            Route::Submit(guild_id, source) => Ok((guild_id, source)),
            Route::Reject(err) => Err(err),
        };

        if let Err(e) = self
            .rest
            .defer_interaction(&interaction.id, &interaction.token)
            .await
        {
            // Without the acknowledgement the token is dead, so there is
            // no channel left to report through.
            warn!(error = %e, "Failed to acknowledge interaction");
            return;
        }

        let responder: Arc<dyn ResponderPort> = Arc::new(FollowupResponder::new(
            Arc::clone(&self.rest),
            self.application_id.clone(),
            interaction.token.clone(),
        ));

        let rejection = match outcome {
            Ok((guild_id, source)) => {
                debug!(guild = %guild_id, source = ?source, "Queueing collage request");
                match self
                    .service
                    .submit(CompositeRequest::new(guild_id, source, Arc::clone(&responder)))
                {
                    Ok(()) => return,
                    Err(err) => err,
                }
            }
            Err(err) => err,
        };

        let (message, visibility) = rejection.user_notice();
        debug!(error = %rejection, "Rejecting interaction");
        if let Err(e) = responder.send_notice(&message, visibility).await {
            warn!(error = %e, "Failed to deliver rejection notice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(
        command: &str,
        guild_id: Option<u64>,
        image_url: Option<&str>,
        attachment_url: Option<&str>,
    ) -> IncomingInteraction {
        IncomingInteraction {
            id: "123".to_string(),
            token: "tok".to_string(),
            guild_id: guild_id.map(GuildId),
            command: command.to_string(),
            image_url: image_url.map(str::to_string),
            attachment_url: attachment_url.map(str::to_string),
        }
    }

    #[test]
    fn test_url_option_routes_to_submit() {
        let routed = route(&interaction("collage", Some(42), Some("https://x/a.png"), None));
        assert!(matches!(
            routed,
            Route::Submit(GuildId(42), CompositeSource::Url(url)) if url == "https://x/a.png"
        ));
    }

    #[test]
    fn test_attachment_option_routes_to_submit() {
        let routed = route(&interaction("collage", Some(42), None, Some("https://cdn/b.png")));
        assert!(matches!(
            routed,
            Route::Submit(GuildId(42), CompositeSource::Attachment(url)) if url == "https://cdn/b.png"
        ));
    }

    #[test]
    fn test_url_wins_over_attachment() {
        let routed = route(&interaction(
            "collage",
            Some(42),
            Some("https://x/a.png"),
            Some("https://cdn/b.png"),
        ));
        assert!(matches!(
            routed,
            Route::Submit(_, CompositeSource::Url(url)) if url == "https://x/a.png"
        ));
    }

    #[test]
    fn test_no_options_routes_to_view() {
        let routed = route(&interaction("collage", Some(42), None, None));
        assert!(matches!(routed, Route::Submit(_, CompositeSource::View)));
    }

    #[test]
    fn test_missing_guild_is_rejected() {
        let routed = route(&interaction("collage", None, Some("https://x/a.png"), None));
        assert!(matches!(routed, Route::Reject(ServiceError::InvalidGuild)));
    }

    #[test]
    fn test_other_commands_are_ignored() {
        let routed = route(&interaction("ping", Some(42), None, None));
        assert!(matches!(routed, Route::Ignore));
    }
}
