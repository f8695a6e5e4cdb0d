use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use askgem_contracts::errors::{truncate_text, QueryFailure};
use askgem_contracts::events::{EventPayload, EventWriter};
use askgem_contracts::images::find_latest_image;
use askgem_contracts::limits::{try_acquire, RateLimitDecision, RateLimitState};
use askgem_contracts::models::ModelSelector;
use askgem_contracts::request::{build_request, ContentPart, Depth, Message, ReasoningOptions};
use askgem_contracts::settings::{Settings, DEFAULT_MODEL};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub message: Message,
    pub options: Option<ReasoningOptions>,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    /// Reasoning summary, only present when thoughts were requested.
    pub thoughts: Option<String>,
    pub usage: Option<Value>,
    pub finish_reason: Option<String>,
}

/// The single network boundary. One call is one attempt; callers decide on
/// resubmission.
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

pub struct GeminiClient {
    api_base: String,
    http: HttpClient,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_base: &str, timeout_s: f64) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            http: HttpClient::new(),
            timeout: Duration::from_secs_f64(timeout_s),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_base, settings.request_timeout_s())
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        if request.api_key.trim().is_empty() {
            bail!("Gemini API key missing");
        }
        let endpoint = self.endpoint_for_model(&request.model);
        let payload = build_generate_payload(&request.message, request.options.as_ref());
        tracing::debug!(
            model = %request.model,
            parts = request.message.parts.len(),
            reasoning = request.options.is_some(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, request.api_key.trim())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let response_payload = response_json_or_error("Gemini", response)?;
        extract_generated_text(&response_payload)
    }
}

/// Wire body for `generateContent`. `generationConfig` is only present when
/// reasoning options are given.
pub fn build_generate_payload(message: &Message, options: Option<&ReasoningOptions>) -> Value {
    let parts: Vec<Value> = message.parts.iter().map(part_to_json).collect();
    let mut payload = Map::new();
    payload.insert(
        "contents".to_string(),
        Value::Array(vec![json!({
            "role": message.role.as_str(),
            "parts": parts,
        })]),
    );
    if let Some(options) = options {
        payload.insert(
            "generationConfig".to_string(),
            json!({ "thinkingConfig": options }),
        );
    }
    Value::Object(payload)
}

fn part_to_json(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text(text) => json!({ "text": text }),
        ContentPart::Image(bytes) => json!({
            "inlineData": {
                "mimeType": image_mime_type(bytes),
                "data": BASE64.encode(bytes),
            }
        }),
    }
}

fn image_mime_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("image/png")
}

/// Answer text of the first candidate, with thought parts kept apart.
pub fn extract_generated_text(payload: &Value) -> Result<ModelResponse> {
    let Some(candidate) = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
    else {
        if let Some(reason) = payload
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            bail!("Gemini blocked the prompt ({reason})");
        }
        bail!("Gemini returned no candidates");
    };

    let finish_reason = candidate
        .get("finishReason")
        .and_then(Value::as_str)
        .map(str::to_string);
    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut text = String::new();
    let mut thoughts = String::new();
    for part in &parts {
        let Some(chunk) = part.get("text").and_then(Value::as_str) else {
            continue;
        };
        if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
            thoughts.push_str(chunk);
        } else {
            text.push_str(chunk);
        }
    }

    if text.trim().is_empty() {
        match finish_reason.as_deref() {
            Some(reason) if reason != "STOP" => {
                bail!("Gemini returned no text (finish reason {reason})")
            }
            _ => bail!("Gemini returned no text"),
        }
    }

    Ok(ModelResponse {
        text,
        thoughts: if thoughts.trim().is_empty() {
            None
        } else {
            Some(thoughts)
        },
        usage: payload.get("usageMetadata").cloned(),
        finish_reason,
    })
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        let detail = api_error_message(&body).unwrap_or_else(|| truncate_text(&body, 512));
        bail!("{provider} request failed ({code}): {detail}");
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn api_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Offline model that describes the request it received.
pub struct DryrunModel;

impl TextModel for DryrunModel {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let prompt = request.message.text().unwrap_or_default();
        let mut text = format!("**dryrun** `{}` received:\n\n> {prompt}", request.model);
        if let Some(bytes) = request.message.image() {
            text.push_str(&format!(
                "\n\nAttached image: {} bytes ({})",
                bytes.len(),
                image_mime_type(bytes)
            ));
        }
        let thoughts = request
            .options
            .filter(|options| options.include_thoughts)
            .map(|options| format!("dryrun reasoning, budget {}", options.thinking_budget));
        Ok(ModelResponse {
            text,
            thoughts,
            usage: None,
            finish_reason: Some("STOP".to_string()),
        })
    }
}

pub fn default_text_model(settings: &Settings) -> Box<dyn TextModel> {
    if settings.is_dryrun() {
        Box::new(DryrunModel)
    } else {
        Box::new(GeminiClient::from_settings(settings))
    }
}

/// One submission from the interactive surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryForm {
    pub query: String,
    pub image: Option<PathBuf>,
    pub depth: Depth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub text: String,
    pub thoughts: Option<String>,
    pub model: String,
    pub depth: Option<Depth>,
    pub image_path: Option<PathBuf>,
    pub usage: Option<Value>,
    pub elapsed_s: f64,
}

pub struct QueryEngine {
    settings: Settings,
    model: Box<dyn TextModel>,
    selector: ModelSelector,
    events: Option<EventWriter>,
    limiter: RateLimitState,
}

impl QueryEngine {
    pub fn new(settings: Settings, model: Box<dyn TextModel>) -> Self {
        Self {
            settings,
            model,
            selector: ModelSelector::new(None),
            events: None,
            limiter: RateLimitState::new(),
        }
    }

    pub fn from_settings(settings: Settings) -> Self {
        let model = default_text_model(&settings);
        Self::new(settings, model)
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn event_writer(&self) -> Option<&EventWriter> {
        self.events.as_ref()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Form path: validation, rate limit gate, image read, then the remote call.
    pub fn submit(&mut self, form: &QueryForm, now_ms: u64) -> Result<QueryOutcome, QueryFailure> {
        let query = form.query.trim();
        if query.is_empty() {
            return Err(self.fail(QueryFailure::validation("Query is required")));
        }

        if let RateLimitDecision::Rejected { wait_ms } =
            try_acquire(&mut self.limiter, now_ms, self.settings.rate_limit_ms)
        {
            let mut payload = EventPayload::new();
            payload.insert("wait_ms".to_string(), json!(wait_ms));
            self.emit("rate_limited", payload);
            return Err(QueryFailure::rate_limited(wait_ms));
        }

        let image = match form.image.as_deref() {
            Some(path) => Some((path, self.read_image(path)?)),
            None => None,
        };
        let requested_model = match form.depth {
            Depth::Quick => self.settings.quick_model.clone(),
            Depth::Balanced | Depth::Deep => self.settings.model.clone(),
        };
        self.run(
            query,
            image,
            &requested_model,
            form.depth.reasoning(),
            Some(form.depth),
        )
    }

    /// Latest screenshot with the configured prompt. Not rate limited.
    pub fn quick_query(&self) -> Result<QueryOutcome, QueryFailure> {
        let Some(directory) = self.settings.images_directory.clone() else {
            return Err(self.fail(QueryFailure::validation(
                "No images directory configured (set images_directory or ASKGEM_IMAGES_DIR)",
            )));
        };
        self.quick_query_in(&directory)
    }

    pub fn quick_query_in(&self, directory: &Path) -> Result<QueryOutcome, QueryFailure> {
        let Some(image_path) = find_latest_image(directory) else {
            return Err(self.fail(QueryFailure::no_image()));
        };
        let mut payload = EventPayload::new();
        payload.insert(
            "path".to_string(),
            json!(image_path.display().to_string()),
        );
        self.emit("image_selected", payload);

        let bytes = self.read_image(&image_path)?;
        let prompt = self.settings.quick_query.clone();
        let model = self.settings.model.clone();
        self.run(
            &prompt,
            Some((image_path.as_path(), bytes)),
            &model,
            ReasoningOptions::screenshot(),
            None,
        )
    }

    fn read_image(&self, path: &Path) -> Result<Vec<u8>, QueryFailure> {
        fs::read(path).map_err(|err| {
            self.fail(QueryFailure::io(format!(
                "failed reading image {}: {err}",
                path.display()
            )))
        })
    }

    fn run(
        &self,
        query: &str,
        image: Option<(&Path, Vec<u8>)>,
        requested_model: &str,
        options: ReasoningOptions,
        depth: Option<Depth>,
    ) -> Result<QueryOutcome, QueryFailure> {
        let selection = self.selector.select(requested_model, DEFAULT_MODEL);
        if selection.family.is_none() {
            tracing::debug!(
                model = %selection.name,
                "model not in catalog; sending reasoning options"
            );
        }
        let options = if selection.accepts_reasoning {
            Some(options)
        } else {
            None
        };

        let (image_path, image_bytes) = match image {
            Some((path, bytes)) => (Some(path.to_path_buf()), Some(bytes)),
            None => (None, None),
        };
        let prepared = build_request(query, image_bytes, options);
        let request = ModelRequest {
            model: selection.name.clone(),
            message: prepared.message,
            options: prepared.options,
            api_key: self.settings.gemini_api_key.clone(),
        };

        let mut started = EventPayload::new();
        started.insert("model".to_string(), json!(request.model));
        started.insert(
            "depth".to_string(),
            json!(depth.map(|value| value.as_str())),
        );
        started.insert("has_image".to_string(), json!(image_path.is_some()));
        started.insert("reasoning".to_string(), json!(request.options));
        started.insert(
            "model_family".to_string(),
            json!(selection.family),
        );
        self.emit("query_started", started);

        let clock = Instant::now();
        let response = self
            .model
            .generate(&request)
            .map_err(|err| self.fail(QueryFailure::from_remote(&err)))?;
        let elapsed_s = clock.elapsed().as_secs_f64();

        let mut finished = EventPayload::new();
        finished.insert("model".to_string(), json!(request.model));
        finished.insert("elapsed_s".to_string(), json!(elapsed_s));
        finished.insert("chars".to_string(), json!(response.text.chars().count()));
        finished.insert(
            "usage".to_string(),
            response.usage.clone().unwrap_or(Value::Null),
        );
        self.emit("query_finished", finished);

        Ok(QueryOutcome {
            text: response.text,
            thoughts: response.thoughts,
            model: request.model,
            depth,
            image_path,
            usage: response.usage,
            elapsed_s,
        })
    }

    fn fail(&self, failure: QueryFailure) -> QueryFailure {
        tracing::debug!(kind = failure.kind().as_str(), "{failure}");
        let mut payload = EventPayload::new();
        payload.insert("kind".to_string(), json!(failure.kind().as_str()));
        payload.insert("message".to_string(), json!(failure.message()));
        self.emit("query_failed", payload);
        failure
    }

    fn emit(&self, event_type: &str, payload: EventPayload) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.emit(event_type, payload) {
            tracing::warn!(
                path = %events.path().display(),
                error = %err,
                "failed writing {event_type} event"
            );
        }
    }
}

/// What the user sees for a finished submission.
pub fn display_text(result: &Result<QueryOutcome, QueryFailure>) -> String {
    match result {
        Ok(outcome) => outcome.text.clone(),
        Err(failure) => failure.user_message(),
    }
}

/// Markdown view of an outcome, with the reasoning summary quoted above the
/// answer when asked for.
pub fn format_outcome(outcome: &QueryOutcome, show_thoughts: bool) -> String {
    let Some(thoughts) = outcome.thoughts.as_deref().filter(|_| show_thoughts) else {
        return outcome.text.clone();
    };
    let quoted = thoughts
        .trim()
        .lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<String>>()
        .join("\n");
    format!("{quoted}\n\n{}", outcome.text)
}
