//! Assistant operations: destination extraction and structured suggestions
//!
//! Both operations wrap the model call in bounded rate-limit retry. The
//! extraction path declares a GPS tool the model may invoke; the tool is
//! resolved by the geolocation subsystem, never by the pipeline itself, and
//! the result is fed back to the model in a follow-up turn.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use crate::assistant::client::{
    Content, FunctionCall, FunctionDeclaration, GenerateRequest, GenerationConfig, LanguageModel,
    Part, SystemInstruction, Tool,
};
use crate::assistant::retry::call_with_retry;
use crate::assistant::schema;
use crate::geo::Coordinates;
use crate::nav::Destination;
use crate::voice::DestinationExtractor;
use crate::{Error, Result};

/// Literal reply token meaning "no destination recognized"
pub const NO_DESTINATION_TOKEN: &str = "NONE";

/// Name of the declared GPS tool
pub const GPS_TOOL_NAME: &str = "get_gps_location";

/// Upper bound on tool-resolution round trips in one extraction
const MAX_TOOL_TURNS: usize = 4;

/// Conversation turns retained as context for subsequent extractions
const MAX_HISTORY_TURNS: usize = 10;

/// Resolves the GPS tool declared to the model
#[async_trait]
pub trait GpsResolver: Send + Sync {
    /// Current position, if a fix is available
    async fn current_position(&self) -> Option<Coordinates>;
}

#[async_trait]
impl GpsResolver for crate::geo::LocationTracker {
    async fn current_position(&self) -> Option<Coordinates> {
        self.current()
    }
}

/// The AI request pipeline
pub struct AssistantPipeline<M> {
    model: M,
    gps: std::sync::Arc<dyn GpsResolver>,
    history: Mutex<Vec<Content>>,
    max_attempts: u32,
    vehicle: String,
}

impl<M: LanguageModel> AssistantPipeline<M> {
    /// Create a new pipeline
    pub fn new(
        model: M,
        gps: std::sync::Arc<dyn GpsResolver>,
        max_attempts: u32,
        vehicle: impl Into<String>,
    ) -> Self {
        Self {
            model,
            gps,
            history: Mutex::new(Vec::new()),
            max_attempts,
            vehicle: vehicle.into(),
        }
    }

    /// Extract a destination from a spoken command.
    ///
    /// Prior turns are included as context. Returns `Ok(None)` when the model
    /// replies with the literal [`NO_DESTINATION_TOKEN`] (or nothing at all);
    /// otherwise the trimmed reply text.
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails after retries, or the tool loop
    /// does not converge
    pub async fn extract_destination(&self, command: &str) -> Result<Option<String>> {
        let mut contents = self.history_snapshot();
        contents.push(Content::user(command));

        for turn in 0..MAX_TOOL_TURNS {
            let request = GenerateRequest {
                contents: contents.clone(),
                system_instruction: Some(SystemInstruction::text(self.extraction_instruction())),
                tools: Some(vec![gps_tool()]),
                generation_config: None,
            };

            let response = call_with_retry(self.max_attempts, || self.model.generate(&request)).await?;

            let calls: Vec<FunctionCall> = response.function_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                let reply = response.text().map(|t| t.trim().to_string()).unwrap_or_default();
                self.remember(command, &reply);

                if reply.is_empty() || reply == NO_DESTINATION_TOKEN {
                    tracing::info!(command, "no destination recognized");
                    return Ok(None);
                }

                tracing::info!(command, destination = %reply, "destination extracted");
                return Ok(Some(reply));
            }

            tracing::debug!(turn, tools = calls.len(), "resolving tool calls");

            if let Some(content) = response.candidates.into_iter().next().and_then(|c| c.content) {
                contents.push(content);
            }

            let mut parts = Vec::with_capacity(calls.len());
            for call in calls {
                parts.push(self.resolve_tool_call(&call).await);
            }
            contents.push(Content {
                role: "user".to_string(),
                parts,
            });
        }

        Err(Error::Assistant(format!(
            "tool loop did not converge within {MAX_TOOL_TURNS} turns"
        )))
    }

    /// Generate structured destination suggestions for a query.
    ///
    /// The model is constrained to the destination-list schema; a payload that
    /// does not validate yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails after retries
    pub async fn generate_destinations(
        &self,
        query: &str,
        location: Option<Coordinates>,
    ) -> Result<Vec<Destination>> {
        let (lat, lng) = location.map_or((0.0, 0.0), |l| (l.lat, l.lng));
        let prompt = format!("User location: lat {lat}, lng {lng}. Query: \"{query}\".");

        let request = GenerateRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: Some(SystemInstruction::text(self.generation_instruction())),
            tools: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema::destination_list_schema()),
            }),
        };

        let response = call_with_retry(self.max_attempts, || self.model.generate(&request)).await?;

        let payload = response.text().unwrap_or_else(|| "[]".to_string());
        let destinations = schema::parse_destinations(&payload);
        tracing::info!(query, count = destinations.len(), "structured suggestions ready");

        Ok(destinations)
    }

    /// Resolve one tool call into a response part
    async fn resolve_tool_call(&self, call: &FunctionCall) -> Part {
        if call.name == GPS_TOOL_NAME {
            let payload = match self.gps.current_position().await {
                Some(pos) => {
                    tracing::debug!(lat = pos.lat, lng = pos.lng, "GPS tool resolved");
                    json!({"lat": pos.lat, "lng": pos.lng})
                }
                None => {
                    tracing::debug!("GPS tool resolved without a fix");
                    json!({"error": "position unavailable"})
                }
            };
            Part::function_response(GPS_TOOL_NAME, payload)
        } else {
            tracing::warn!(tool = %call.name, "model requested an undeclared tool");
            Part::function_response(call.name.clone(), json!({"error": "unknown tool"}))
        }
    }

    /// Append a completed exchange to the conversation history
    fn remember(&self, command: &str, reply: &str) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(Content::user(command));
        history.push(Content::model(if reply.is_empty() {
            NO_DESTINATION_TOKEN
        } else {
            reply
        }));

        let excess = history.len().saturating_sub(MAX_HISTORY_TURNS);
        if excess > 0 {
            history.drain(..excess);
        }
    }

    fn history_snapshot(&self) -> Vec<Content> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn extraction_instruction(&self) -> String {
        format!(
            "You are the voice assistant built into a {} navigation system.\n\
             Rules:\n\
             1. Never guess the driver's location. If asked where they are, what their \
             position is, or anything GPS related, call {GPS_TOOL_NAME} immediately.\n\
             2. Never invent coordinates; if the tool reports an error, say the position \
             is unavailable.\n\
             3. When the command names a place to navigate to, reply with only that place \
             name or address.\n\
             4. If no navigable destination is present, reply with the single word {NO_DESTINATION_TOKEN}.\n\
             5. Keep every reply concise.",
            self.vehicle
        )
    }

    fn generation_instruction(&self) -> String {
        format!(
            "You are a professional {} navigation system. Generate a list of 3 specific \
             and realistic destination options based on the user's query and current \
             location. For each destination, provide precise route details: distance, \
             duration, and estimated battery percentage usage.",
            self.vehicle
        )
    }
}

#[async_trait]
impl<M: LanguageModel> DestinationExtractor for AssistantPipeline<M> {
    async fn extract(&self, command: &str) -> Result<Option<String>> {
        self.extract_destination(command).await
    }
}

/// The GPS tool declaration: zero parameters, resolved externally
fn gps_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: GPS_TOOL_NAME.to_string(),
            description: "Reads the vehicle's precise current latitude and longitude from \
                          the GPS hardware."
                .to_string(),
            parameters: json!({"type": "OBJECT", "properties": {}}),
        }],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use super::*;
    use crate::assistant::client::{Candidate, GenerateResponse};

    struct ScriptedModel {
        responses: Mutex<VecDeque<GenerateResponse>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<GenerateResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<GenerateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for &ScriptedModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Assistant("script exhausted".to_string()))
        }
    }

    struct FixedGps(Option<Coordinates>);

    #[async_trait]
    impl GpsResolver for FixedGps {
        async fn current_position(&self) -> Option<Coordinates> {
            self.0
        }
    }

    fn text_response(text: &str) -> GenerateResponse {
        GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content::model(text)),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    fn gps_call_response() -> GenerateResponse {
        GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: "model".to_string(),
                    parts: vec![Part {
                        function_call: Some(FunctionCall {
                            name: GPS_TOOL_NAME.to_string(),
                            args: json!({}),
                        }),
                        ..Part::default()
                    }],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    fn pipeline(model: &ScriptedModel) -> AssistantPipeline<&ScriptedModel> {
        AssistantPipeline::new(model, Arc::new(FixedGps(None)), 1, "E-2008 GT")
    }

    #[tokio::test]
    async fn extracts_destination_text() {
        let model = ScriptedModel::new(vec![text_response("  Parque das Nacoes  ")]);
        let pipeline = pipeline(&model);

        let result = pipeline.extract_destination("take me to the park").await.unwrap();
        assert_eq!(result.as_deref(), Some("Parque das Nacoes"));
    }

    #[tokio::test]
    async fn none_token_means_no_destination() {
        let model = ScriptedModel::new(vec![text_response("NONE")]);
        let pipeline = pipeline(&model);

        let result = pipeline.extract_destination("turn on the lights").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn empty_reply_means_no_destination() {
        let model = ScriptedModel::new(vec![GenerateResponse::default()]);
        let pipeline = pipeline(&model);

        let result = pipeline.extract_destination("hm").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn prior_turns_are_sent_as_context() {
        let model = ScriptedModel::new(vec![
            text_response("Bela Vista"),
            text_response("NONE"),
        ]);
        let pipeline = pipeline(&model);

        pipeline.extract_destination("go to bela vista").await.unwrap();
        pipeline.extract_destination("thanks").await.unwrap();

        let requests = model.requests();
        // Second request carries the first exchange plus the new command
        assert_eq!(requests[1].contents.len(), 3);
        assert_eq!(requests[1].contents[0].role, "user");
        assert_eq!(requests[1].contents[1].role, "model");
    }

    #[tokio::test]
    async fn gps_tool_call_is_resolved_and_fed_back() {
        let model = ScriptedModel::new(vec![
            gps_call_response(),
            text_response("You are at Praca do Comercio"),
        ]);
        let gps = Arc::new(FixedGps(Some(Coordinates::new(38.7078, -9.1366))));
        let pipeline = AssistantPipeline::new(&model, gps, 1, "E-2008 GT");

        let result = pipeline.extract_destination("where am I").await.unwrap();
        assert_eq!(result.as_deref(), Some("You are at Praca do Comercio"));

        let requests = model.requests();
        assert_eq!(requests.len(), 2);

        // Follow-up turn carries the tool result with the resolved coordinates
        let follow_up = requests[1].contents.last().unwrap();
        let response_part = follow_up.parts[0].function_response.as_ref().unwrap();
        assert_eq!(response_part.name, GPS_TOOL_NAME);
        assert!((response_part.response["lat"].as_f64().unwrap() - 38.7078).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unavailable_gps_reports_error_payload() {
        let model = ScriptedModel::new(vec![
            gps_call_response(),
            text_response("I cannot read your position right now"),
        ]);
        let pipeline = pipeline(&model);

        pipeline.extract_destination("where am I").await.unwrap();

        let requests = model.requests();
        let follow_up = requests[1].contents.last().unwrap();
        let response_part = follow_up.parts[0].function_response.as_ref().unwrap();
        assert!(response_part.response.get("error").is_some());
    }

    #[tokio::test]
    async fn runaway_tool_loop_errors_out() {
        let model = ScriptedModel::new(vec![
            gps_call_response(),
            gps_call_response(),
            gps_call_response(),
            gps_call_response(),
            gps_call_response(),
        ]);
        let pipeline = pipeline(&model);

        let result = pipeline.extract_destination("where am I").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn structured_generation_parses_payload() {
        let payload = r#"[{"name":"A","address":"B","distance":"1.0 km","duration":"5 min","batteryUsage":2,"lat":1.0,"lng":2.0}]"#;
        let model = ScriptedModel::new(vec![text_response(payload)]);
        let pipeline = pipeline(&model);

        let destinations = pipeline.generate_destinations("cafe", None).await.unwrap();
        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[0].name, "A");

        // Structured requests carry the JSON constraint
        let request = &model.requests()[0];
        let config = request.generation_config.as_ref().unwrap();
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
        assert!(config.response_schema.is_some());
    }

    #[tokio::test]
    async fn structured_generation_soft_fails_on_bad_payload() {
        let model = ScriptedModel::new(vec![text_response("{not json")]);
        let pipeline = pipeline(&model);

        let destinations = pipeline.generate_destinations("cafe", None).await.unwrap();
        assert!(destinations.is_empty());
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let model = ScriptedModel::new(vec![]);
        let pipeline = pipeline(&model);

        assert!(pipeline.extract_destination("anywhere").await.is_err());
        assert!(pipeline.generate_destinations("cafe", None).await.is_err());
    }
}
