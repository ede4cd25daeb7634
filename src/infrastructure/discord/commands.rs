//! Slash command definitions registered with Discord.

use serde::Serialize;

/// Chat input (slash) command type.
const COMMAND_TYPE_CHAT_INPUT: u8 = 1;
/// String option type.
const OPTION_TYPE_STRING: u8 = 3;
/// Attachment option type.
const OPTION_TYPE_ATTACHMENT: u8 = 11;

/// Name of the collage command.
pub const COLLAGE_COMMAND: &str = "collage";
/// Name of the image URL option.
pub const OPTION_IMAGE_URL: &str = "image_url";
/// Name of the attachment option.
pub const OPTION_ATTACHMENT: &str = "attachment";

/// Application command definition.
#[derive(Debug, Serialize)]
pub struct CommandDefinition {
    /// Command name.
    pub name: &'static str,
    /// Command description shown in the client.
    pub description: &'static str,
    /// Command type.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Command options.
    pub options: Vec<CommandOption>,
}

/// Application command option definition.
#[derive(Debug, Serialize)]
pub struct CommandOption {
    /// Option name.
    pub name: &'static str,
    /// Option description shown in the client.
    pub description: &'static str,
    /// Option type.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Whether the option must be supplied.
    pub required: bool,
}

/// Returns every command this bot registers.
#[must_use]
pub fn command_surface() -> Vec<CommandDefinition> {
    vec![CommandDefinition {
        name: COLLAGE_COMMAND,
        description: "View or paste image in server collage.",
        kind: COMMAND_TYPE_CHAT_INPUT,
        options: vec![
            CommandOption {
                name: OPTION_IMAGE_URL,
                description: "URL of an image to paste onto the collage.",
                kind: OPTION_TYPE_STRING,
                required: false,
            },
            CommandOption {
                name: OPTION_ATTACHMENT,
                description: "Image file to paste onto the collage.",
                kind: OPTION_TYPE_ATTACHMENT,
                required: false,
            },
        ],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_surface_shape() {
        let commands = command_surface();
        assert_eq!(commands.len(), 1);

        let json = serde_json::to_value(&commands[0]).unwrap();
        assert_eq!(json["name"], "collage");
        assert_eq!(json["description"], "View or paste image in server collage.");
        assert_eq!(json["type"], 1);
        assert_eq!(json["options"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_options_are_optional() {
        let commands = command_surface();
        let json = serde_json::to_value(&commands[0]).unwrap();

        assert_eq!(json["options"][0]["name"], "image_url");
        assert_eq!(json["options"][0]["type"], 3);
        assert_eq!(json["options"][0]["required"], false);
        assert_eq!(json["options"][1]["name"], "attachment");
        assert_eq!(json["options"][1]["type"], 11);
        assert_eq!(json["options"][1]["required"], false);
    }
}
