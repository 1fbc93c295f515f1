//! Voice AI CLI
//!
//! Command-line interface for running the Voice AI node outside a workflow
//! host.

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice_ai::{
    AudioFormat, BinaryData, ExecutionItem, NodeParameters, VoiceAiConfig, VoiceAiNode,
};

/// Voice AI CLI
#[derive(Parser)]
#[command(name = "voiceai-cli")]
#[command(author, version, about = "Voice AI text-to-speech CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Voice AI API key
    #[arg(long, env = "VOICEAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API key is accepted
    TestCredential,

    /// Convert text to speech and write the audio to a file
    ///
    /// Example: voiceai-cli speak --voice v1 --text "Hello" --format wav
    Speak {
        /// Text to convert
        #[arg(long)]
        text: String,

        /// Voice ID
        #[arg(long)]
        voice: String,

        /// Audio format (mp3 or wav)
        #[arg(long)]
        format: Option<String>,

        /// Language code
        #[arg(long)]
        language: Option<String>,

        /// TTS model
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature (0-2)
        #[arg(long)]
        temperature: Option<f64>,

        /// Nucleus sampling (0-1)
        #[arg(long)]
        top_p: Option<f64>,

        /// Output path (default: speech.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage voices
    #[command(subcommand)]
    Voices(VoiceCommands),

    /// Print the node description as JSON
    Describe,
}

#[derive(Subcommand)]
enum VoiceCommands {
    /// List voices, optionally filtered by name
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Get a voice
    Get {
        /// Voice ID
        voice_id: String,
    },

    /// Delete a voice
    Delete {
        /// Voice ID
        voice_id: String,
    },

    /// Update a voice's name or visibility
    Update {
        /// Voice ID
        voice_id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New visibility (PRIVATE or PUBLIC)
        #[arg(long)]
        visibility: Option<String>,
    },

    /// Clone a voice from an audio sample
    Clone {
        /// Name of the new voice
        #[arg(long)]
        name: String,

        /// Audio sample (mp3 or wav)
        #[arg(long)]
        file: PathBuf,

        /// Visibility (PRIVATE or PUBLIC)
        #[arg(long)]
        visibility: Option<String>,

        /// Language code
        #[arg(long)]
        language: Option<String>,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Insert `value` under `name` when present
fn insert_some(map: &mut serde_json::Map<String, Value>, name: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(name.to_string(), value);
    }
}

/// Node parameters for `speak`
#[allow(clippy::too_many_arguments)]
fn speech_parameters(
    text: &str,
    voice: &str,
    format: Option<&str>,
    language: Option<&str>,
    model: Option<&str>,
    temperature: Option<f64>,
    top_p: Option<f64>,
) -> NodeParameters {
    let mut options = serde_json::Map::new();
    insert_some(&mut options, "audioFormat", format.map(Value::from));
    insert_some(&mut options, "language", language.map(Value::from));
    insert_some(&mut options, "model", model.map(Value::from));
    insert_some(&mut options, "temperature", temperature.map(Value::from));
    insert_some(&mut options, "topP", top_p.map(Value::from));

    NodeParameters::default()
        .with("resource", "speech")
        .with("operation", "textToSpeech")
        .with("voice", voice)
        .with("text", text)
        .with("additionalOptions", Value::Object(options))
}

/// Node parameters for `voices update`
fn update_parameters(
    voice_id: &str,
    name: Option<&str>,
    visibility: Option<&str>,
) -> NodeParameters {
    let mut fields = serde_json::Map::new();
    insert_some(&mut fields, "name", name.map(Value::from));
    insert_some(&mut fields, "voiceVisibility", visibility.map(Value::from));

    NodeParameters::default()
        .with("resource", "voice")
        .with("operation", "update")
        .with("voiceId", voice_id)
        .with("updateFields", Value::Object(fields))
}

/// Node parameters for `voices clone`
fn clone_parameters(
    name: &str,
    visibility: Option<&str>,
    language: Option<&str>,
) -> NodeParameters {
    let mut options = serde_json::Map::new();
    insert_some(&mut options, "voiceVisibility", visibility.map(Value::from));
    insert_some(&mut options, "language", language.map(Value::from));

    NodeParameters::default()
        .with("resource", "voice")
        .with("operation", "create")
        .with("voiceName", name)
        .with("additionalOptions", Value::Object(options))
}

/// Node parameters for a voice operation addressed by ID
fn voice_parameters(operation: &str, voice_id: &str) -> NodeParameters {
    NodeParameters::default()
        .with("resource", "voice")
        .with("operation", operation)
        .with("voiceId", voice_id)
}

/// MIME type for an audio sample, from its extension
fn sample_mime_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioFormat::from_extension)
        .unwrap_or_default()
        .mime_type()
}

/// Resolve configuration from file, environment and flags
fn load_config(api_key: Option<String>, base_url: Option<String>) -> anyhow::Result<VoiceAiConfig> {
    let mut config = VoiceAiConfig::load().context("Failed to load configuration")?;

    if let Some(key) = api_key {
        config.api_key = VoiceAiConfig::with_api_key(key).api_key;
    }
    if let Some(url) = base_url {
        config.base_url = url;
    }

    Ok(config)
}

fn print_items(items: &[ExecutionItem]) -> anyhow::Result<()> {
    let json: Vec<&serde_json::Map<String, Value>> = items.iter().map(|item| &item.json).collect();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if matches!(cli.command, Commands::Describe) {
        let description = json!({
            "node": VoiceAiNode::description(),
            "credential": VoiceAiNode::credential_description(),
        });
        println!("{}", serde_json::to_string_pretty(&description)?);
        return Ok(());
    }

    let config = load_config(cli.api_key, cli.base_url)?;
    let node = VoiceAiNode::from_config(&config)?;
    let input = [ExecutionItem::default()];

    match cli.command {
        Commands::Describe => {},

        Commands::TestCredential => {
            node.test_credential().await?;
            println!("✅ Connection successful");
        },

        Commands::Speak {
            text,
            voice,
            format,
            language,
            model,
            temperature,
            top_p,
            output,
        } => {
            let params = speech_parameters(
                &text,
                &voice,
                format.as_deref(),
                language.as_deref(),
                model.as_deref(),
                temperature,
                top_p,
            );
            let items = node.execute(&input, &params).await?;
            let binary = items
                .first()
                .and_then(|item| item.binary.get("data"))
                .context("Response contained no audio")?;

            let path = output.unwrap_or_else(|| {
                PathBuf::from(binary.file_name.as_deref().unwrap_or("speech.mp3"))
            });
            tokio::fs::write(&path, &binary.data)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            info!(path = %path.display(), bytes = binary.size_bytes(), "Audio written");
            println!(
                "🔊 Wrote {} ({}, {} bytes)",
                path.display(),
                binary.mime_type,
                binary.size_bytes()
            );
        },

        Commands::Voices(VoiceCommands::List { filter }) => {
            let result = node.list_search("listVoices", filter.as_deref()).await?;
            for entry in &result.results {
                println!("{}\t{}", entry.value, entry.name);
            }
        },

        Commands::Voices(VoiceCommands::Get { voice_id }) => {
            let items = node.execute(&input, &voice_parameters("get", &voice_id)).await?;
            print_items(&items)?;
        },

        Commands::Voices(VoiceCommands::Delete { voice_id }) => {
            let items = node.execute(&input, &voice_parameters("delete", &voice_id)).await?;
            print_items(&items)?;
        },

        Commands::Voices(VoiceCommands::Update {
            voice_id,
            name,
            visibility,
        }) => {
            let params = update_parameters(&voice_id, name.as_deref(), visibility.as_deref());
            let items = node.execute(&input, &params).await?;
            print_items(&items)?;
        },

        Commands::Voices(VoiceCommands::Clone {
            name,
            file,
            visibility,
            language,
        }) => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut binary = BinaryData::new(data, sample_mime_type(&file));
            if let Some(file_name) = file.file_name().and_then(|n| n.to_str()) {
                binary = binary.with_file_name(file_name);
            }

            let item = ExecutionItem::default().with_binary("data", binary);
            let params = clone_parameters(&name, visibility.as_deref(), language.as_deref());
            let items = node.execute(&[item], &params).await?;
            print_items(&items)?;
        },
    }

    Ok(())
}
