//! MCP (Model Context Protocol) server implementation.
//!
//! This module exposes reading-index scoring over the MCP protocol, making it
//! available to AI assistants via stdio transport.
//!
//! # Architecture
//!
//! The MCP server is a presentation layer: it wraps the same core library that
//! the CLI commands use. Tables are loaded once at startup and shared by
//! every tool call.
//!
//! The server never calls the generative model itself. A client that already
//! has a model response passes it to `score_extraction`, which reconciles it
//! against the vocabulary before scoring.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use ondok_core::config::Config;
use ondok_core::error::AnalysisError;
use ondok_core::matcher::{MatchMode, MatchedWord};
use ondok_core::pipeline::{self, ScoreOptions, Tables};
use ondok_core::scoring::ScoringStrategy;

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `score_text` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ScoreTextParams {
    /// The Korean passage to score.
    pub text: String,
    /// Scoring strategy. Omit for the configured default.
    pub strategy: Option<ScoringStrategy>,
    /// Matching policy. Omit for the configured default.
    pub match_mode: Option<MatchMode>,
    /// Clamp the index to 0–280. Omit for the configured default.
    pub clamp: Option<bool>,
}

/// Parameters for the `score_extraction` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ScoreExtractionParams {
    /// The passage the model analyzed.
    pub text: String,
    /// The model's answer: one `word/grade` pair per line.
    pub response: String,
    /// Scoring strategy. Omit for the configured extraction default.
    pub strategy: Option<ScoringStrategy>,
}

/// Parameters for the `resolve_grade` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ResolveGradeParams {
    /// Reading index to resolve.
    pub index: f64,
}

/// Parameters for the `lookup_word` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct LookupWordParams {
    /// Word to look up.
    pub word: String,
}

/// MCP server exposing reading-index scoring to AI assistants.
///
/// Each `#[tool]` method in the `#[tool_router]` impl block is automatically
/// registered and callable via the MCP protocol.
#[derive(Clone)]
pub struct ProjectServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    tables: Arc<Tables>,
    direct: ScoreOptions,
    extraction: ScoreOptions,
    max_input_bytes: Option<usize>,
}

fn invalid(e: &AnalysisError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))
}

impl ProjectServer {
    fn check_size(&self, text: &str) -> Result<(), McpError> {
        pipeline::check_input_size(text.len(), self.max_input_bytes).map_err(|e| invalid(&e))
    }
}

#[tool_router]
impl ProjectServer {
    /// Create a server over loaded tables, taking defaults from `config`.
    pub fn new(tables: Arc<Tables>, config: &Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            tables,
            direct: ScoreOptions::from_config(config),
            extraction: ScoreOptions::for_extraction(config),
            max_input_bytes: config.input_limit(),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, description, and table sizes")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        #[allow(unused_variables)] Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "words": self.tables.vocab.len(),
            "ranges": self.tables.ranges.len(),
            "strategy": self.direct.strategy,
        });

        let text = if params.format == "json" {
            to_json(&info)?
        } else {
            format!(
                "{} v{}\n{}\n{} words, {} ranges, strategy {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
                self.tables.vocab.len(),
                self.tables.ranges.len(),
                self.direct.strategy,
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Score a passage by matching it against the vocabulary.
    #[tool(
        description = "Compute the Korean reading index (온독지수, 0-280) of a passage from the cognitive tool words it uses. Returns the index, grade label, matched words, and diagnostics."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn score_text(
        &self,
        Parameters(params): Parameters<ScoreTextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "score_text", strategy = ?params.strategy, "executing MCP tool");
        self.check_size(&params.text)?;

        let options = ScoreOptions {
            strategy: params.strategy.unwrap_or(self.direct.strategy),
            match_mode: params.match_mode.unwrap_or(self.direct.match_mode),
            clamp: params.clamp.unwrap_or(self.direct.clamp),
        };
        let report =
            pipeline::analyze_text(&self.tables, &params.text, options).map_err(|e| invalid(&e))?;

        tracing::info!(
            tool = "score_text",
            index = report.index,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(to_json(
            &report,
        )?)]))
    }

    /// Reconcile and score a model's word/grade answer.
    #[tool(
        description = "Score the word/grade pairs a language model extracted from a passage. Pairs are checked against the vocabulary; unknown words and wrong grades are rejected and reported."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn score_extraction(
        &self,
        Parameters(params): Parameters<ScoreExtractionParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "score_extraction", "executing MCP tool");
        self.check_size(&params.text)?;
        self.check_size(&params.response)?;

        let mut options = self.extraction;
        if let Some(strategy) = params.strategy {
            options.strategy = strategy;
        }
        let result =
            pipeline::analyze_extraction(&self.tables, &params.text, &params.response, options)
                .map_err(|e| invalid(&e))?;

        tracing::info!(
            tool = "score_extraction",
            index = result.report.index,
            rejected = result.rejected.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(to_json(
            &result,
        )?)]))
    }

    /// Map an index to a grade label.
    #[tool(description = "Resolve a reading index to its target school grade.")]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn resolve_grade(
        &self,
        Parameters(params): Parameters<ResolveGradeParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "resolve_grade", index = params.index, "executing MCP tool");

        let grade = pipeline::resolve_grade(&self.tables.ranges, params.index);
        let json = to_json(&serde_json::json!({ "index": params.index, "grade": grade }))?;

        tracing::info!(tool = "resolve_grade", grade = %grade, "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Look up a word's grade.
    #[tool(description = "Look up whether a word is a cognitive tool word and its grade (1 = hardest).")]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn lookup_word(
        &self,
        Parameters(params): Parameters<LookupWordParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "lookup_word", word = %params.word, "executing MCP tool");

        let found = self.tables.vocab.get(params.word.trim()).map(|e| MatchedWord {
            word: e.word.clone(),
            grade: e.grade.as_u8(),
            weight: e.grade.combined_weight(),
            count: 0,
        });

        tracing::info!(tool = "lookup_word", found = found.is_some(), "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(to_json(
            &found,
        )?)]))
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Scores Korean passages by their cognitive tool words (사고도구어) \
                 and maps the reading index (온독지수) to a school grade.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondok_core::ranges::{ScoreRange, ScoreRangeTable};
    use ondok_core::vocab::{Grade, VocabEntry, VocabTable};
    use rmcp::model::RawContent;

    fn server() -> ProjectServer {
        let tables = Tables::new(
            VocabTable::from_entries([
                VocabEntry::new("분석", Grade::One),
                VocabEntry::new("추론", Grade::Two),
            ]),
            ScoreRangeTable::new(vec![
                ScoreRange::new(0, 139, "G1").unwrap(),
                ScoreRange::new(140, 219, "G2").unwrap(),
                ScoreRange::new(220, 280, "G3").unwrap(),
            ]),
        );
        ProjectServer::new(Arc::new(tables), &Config::default())
    }

    /// Extract text from the first content item in a `CallToolResult`.
    fn extract_text(result: &CallToolResult) -> Option<&str> {
        result.content.first().and_then(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }

    fn json_of(result: &CallToolResult) -> serde_json::Value {
        serde_json::from_str(extract_text(result).expect("should have text content"))
            .expect("should be valid JSON")
    }

    #[test]
    fn server_info_has_correct_name() {
        let info = ServerHandler::get_info(&server());
        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn get_info_tool_reports_table_sizes() {
        let params = Parameters(GetInfoParams {
            format: "json".to_string(),
        });
        let result = server().get_info(params).expect("get_info should succeed");
        let json = json_of(&result);
        assert_eq!(json["words"], 2);
        assert_eq!(json["ranges"], 3);
        assert_eq!(json["strategy"], "cttr");
    }

    #[test]
    fn score_text_returns_report() {
        let params = Parameters(ScoreTextParams {
            text: "분석 그리고 추론".to_string(),
            strategy: Some(ScoringStrategy::WeightedFraction),
            match_mode: None,
            clamp: None,
        });
        let result = server().score_text(params).expect("score_text should succeed");
        let json = json_of(&result);
        assert_eq!(json["index"], 245.0);
        assert_eq!(json["grade"]["label"], "G3");
        assert_eq!(json["matches"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn score_text_without_matches_reports_no_matches() {
        let params = Parameters(ScoreTextParams {
            text: "오늘은 맑다".to_string(),
            strategy: None,
            match_mode: None,
            clamp: None,
        });
        let result = server().score_text(params).expect("score_text should succeed");
        let json = json_of(&result);
        assert_eq!(json["index"], 0.0);
        assert_eq!(json["grade"]["kind"], "no_matches");
    }

    #[test]
    fn score_text_rejects_blank_input() {
        let params = Parameters(ScoreTextParams {
            text: "   ".to_string(),
            strategy: None,
            match_mode: None,
            clamp: None,
        });
        assert!(server().score_text(params).is_err());
    }

    #[test]
    fn score_text_rejects_oversized_input() {
        let mut srv = server();
        srv.max_input_bytes = Some(4);
        let params = Parameters(ScoreTextParams {
            text: "분석 분석".to_string(),
            strategy: None,
            match_mode: None,
            clamp: None,
        });
        assert!(srv.score_text(params).is_err());
    }

    #[test]
    fn score_extraction_rejects_wrong_grades() {
        let params = Parameters(ScoreExtractionParams {
            text: "분석과 추론".to_string(),
            response: "1. 분석/1\n2. 추론/4\n".to_string(),
            strategy: None,
        });
        let result = server()
            .score_extraction(params)
            .expect("score_extraction should succeed");
        let json = json_of(&result);
        assert_eq!(json["report"]["index"], 280.0);
        assert_eq!(json["rejected"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn score_extraction_rejects_blank_passage() {
        let params = Parameters(ScoreExtractionParams {
            text: "  \n".to_string(),
            response: "분석/1".to_string(),
            strategy: None,
        });
        assert!(server().score_extraction(params).is_err());
    }

    #[test]
    fn resolve_grade_handles_gaps() {
        let result = server()
            .resolve_grade(Parameters(ResolveGradeParams { index: 300.0 }))
            .expect("resolve_grade should succeed");
        assert_eq!(json_of(&result)["grade"]["kind"], "out_of_range");

        let between = server()
            .resolve_grade(Parameters(ResolveGradeParams { index: 139.6 }))
            .expect("resolve_grade should succeed");
        assert_eq!(json_of(&between)["grade"]["kind"], "out_of_range");
    }

    #[test]
    fn lookup_word_finds_grade() {
        let result = server()
            .lookup_word(Parameters(LookupWordParams {
                word: "추론".to_string(),
            }))
            .expect("lookup_word should succeed");
        assert_eq!(json_of(&result)["grade"], 2);

        let missing = server()
            .lookup_word(Parameters(LookupWordParams {
                word: "사과".to_string(),
            }))
            .expect("lookup_word should succeed");
        assert!(json_of(&missing).is_null());
    }
}
