use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use swarm_application::SessionService;
use swarm_core::session::{Attachment, GeoLocation, ModelChoice, QueryRequest};
use swarm_interaction::GeminiStreamProvider;

use super::load_config;
use crate::render;

#[derive(Args)]
pub struct AskArgs {
    /// The question to research
    query: String,

    /// Use the pro model instead of flash
    #[arg(long)]
    pro: bool,

    /// Persona the model should adopt
    #[arg(long)]
    persona: Option<String>,

    /// Enable maps grounding
    #[arg(long)]
    maps: bool,

    /// Bias maps grounding to a location, as "LAT,LNG"
    #[arg(long, value_parser = parse_location)]
    location: Option<GeoLocation>,

    /// Attach a file to the query
    #[arg(long)]
    attach: Option<PathBuf>,

    /// Print the final snapshot as JSON instead of streaming text
    #[arg(long)]
    json: bool,
}

pub async fn run(args: AskArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut query_config = config.query_config();

    if args.pro {
        query_config.model = ModelChoice::Pro;
    }
    if args.persona.is_some() {
        query_config.persona = args.persona;
    }
    query_config.use_maps |= args.maps || args.location.is_some();
    query_config.location = args.location;
    if let Some(path) = &args.attach {
        query_config.attachment = Some(read_attachment(path)?);
    }

    let provider = GeminiStreamProvider::try_from_env()
        .context("Gemini credentials not found (set GEMINI_API_KEY or ~/.config/swarm/secret.json)")?;
    let service = SessionService::new(provider);

    let request = QueryRequest::new(args.query).with_config(query_config);
    render::stream_session(&service, request, args.json).await
}

fn parse_location(value: &str) -> Result<GeoLocation, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG but got '{value}'"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("location out of range: {latitude},{longitude}"));
    }
    Ok(GeoLocation {
        latitude,
        longitude,
    })
}

fn read_attachment(path: &Path) -> Result<Attachment> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read attachment {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Attachment {
        mime_type: mime_type_for(path).to_string(),
        file_name,
        data,
    })
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        _ => "application/octet-stream",
    }
}
