//! Model-facing tools.
//!
//! Every registry command is exposed as a tool whose arguments are a JSON
//! object of string fields. Tools never fail: validation problems, command
//! errors and guard refusals all come back as the tool's text output so the
//! model can react to them.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::agent::types::ToolSchema;
use crate::okx::args::build_args_string;
use crate::okx::commands::CommandDefinition;
use crate::okx::registry::{CommandRegistry, RegistryKind, is_success_envelope};
use crate::session::{PendingQuote, SessionStore};

pub const RESOLVE_CHAIN_INFO: &str = "resolve_chain_info";
pub const GET_QUOTE: &str = "okx_get_quote";
pub const EXECUTE_SWAP: &str = "okx_execute_swap";

/// Trade commands offered to the swap copilot, besides `resolve_chain_info`.
const SWAP_COPILOT_COMMANDS: &[&str] = &[
    "okx_get_supported_chains",
    "okx_get_liquidity_sources",
    "okx_get_tokens",
    GET_QUOTE,
    "okx_get_swap",
    EXECUTE_SWAP,
];

const WALLET_FIELDS: &[&str] = &["address", "userWalletAddress"];

static NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d*$").expect("valid numeric pattern"));
static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid amount pattern"));

static CHAIN_INDEXES: &[(&str, &str)] = &[
    ("solana", "501"),
    ("ethereum", "1"),
    ("eth", "1"),
    ("arbitrum", "42161"),
    ("arb", "42161"),
    ("oktc", "66"),
    ("okx chain", "66"),
    ("bsc", "56"),
    ("binance smart chain", "56"),
];

/// Which copilot a chat turn is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentMode {
    #[serde(rename = "SAK_AGENT_NLP")]
    SakAgentNlp,
    #[serde(rename = "OKX_API_AGENT_NLP")]
    OkxApiAgentNlp,
}

impl AgentMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SAK_AGENT_NLP" => Some(AgentMode::SakAgentNlp),
            "OKX_API_AGENT_NLP" => Some(AgentMode::OkxApiAgentNlp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::SakAgentNlp => "SAK_AGENT_NLP",
            AgentMode::OkxApiAgentNlp => "OKX_API_AGENT_NLP",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            AgentMode::SakAgentNlp => 0.2,
            AgentMode::OkxApiAgentNlp => 0.0,
        }
    }
}

/// Value shape inferred from a parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Amount,
    Text,
}

impl FieldKind {
    pub fn infer(param: &str) -> Self {
        let lower = param.to_lowercase();
        if lower.contains("index") || (lower.contains("id") && !lower.contains("address")) {
            FieldKind::Numeric
        } else if lower.contains("amount") {
            FieldKind::Amount
        } else {
            FieldKind::Text
        }
    }

    fn pattern(&self) -> Option<&'static Regex> {
        match self {
            FieldKind::Numeric => Some(&NUMERIC_PATTERN),
            FieldKind::Amount => Some(&AMOUNT_PATTERN),
            FieldKind::Text => None,
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.pattern().is_none_or(|re| re.is_match(value))
    }

    fn schema(&self, param: &str) -> Value {
        match self {
            FieldKind::Numeric => json!({
                "type": "string",
                "pattern": NUMERIC_PATTERN.as_str(),
                "description": format!("Numeric string value for {}.", param),
            }),
            FieldKind::Amount => json!({
                "type": "string",
                "pattern": AMOUNT_PATTERN.as_str(),
                "description": "Numeric string for amount.",
            }),
            FieldKind::Text => json!({
                "type": "string",
                "description": format!("Value for {}.", param),
            }),
        }
    }
}

/// The session and turn a tool call belongs to.
///
/// A quote produced during the turn is held here and only reaches the
/// session when the turn commits, so a failed turn leaves nothing behind.
#[derive(Clone)]
pub struct ToolContext {
    pub session_id: String,
    pub turn: u64,
    pub sessions: Arc<SessionStore>,
    staged_quote: Arc<Mutex<Option<PendingQuote>>>,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>, turn: u64, sessions: Arc<SessionStore>) -> Self {
        Self {
            session_id: session_id.into(),
            turn,
            sessions,
            staged_quote: Arc::new(Mutex::new(None)),
        }
    }

    /// Remove and return the quote staged during this turn.
    pub fn take_staged_quote(&self) -> Option<PendingQuote> {
        self.staged_quote.lock().take()
    }
}

enum ToolAction {
    Command {
        registry: Arc<CommandRegistry>,
        def: &'static CommandDefinition,
    },
    ResolveChain,
}

pub struct AgentTool {
    name: &'static str,
    description: String,
    fields: Vec<(&'static str, FieldKind)>,
    required: Vec<&'static str>,
    action: ToolAction,
}

impl AgentTool {
    pub fn for_command(registry: Arc<CommandRegistry>, def: &'static CommandDefinition) -> Self {
        let fields = def
            .required_params
            .iter()
            .map(|param| (*param, FieldKind::infer(param)))
            .collect();
        // wallet fields fall back to the configured address
        let has_wallet = registry.wallet_address().is_some();
        let required = def
            .required_params
            .iter()
            .copied()
            .filter(|param| !(has_wallet && WALLET_FIELDS.contains(param)))
            .collect();
        let description = command_description(registry.kind(), def);

        Self {
            name: def.name,
            description,
            fields,
            required,
            action: ToolAction::Command { registry, def },
        }
    }

    pub fn resolve_chain_info() -> Self {
        Self {
            name: RESOLVE_CHAIN_INFO,
            description: "Helper: Converts common chain name (e.g. 'Solana', 'Ethereum') to its OKX numeric chainIndex. \
                          Input MUST be a JSON string like: '{\"chainName\": \"Solana\"}'."
                .to_string(),
            fields: vec![("chainName", FieldKind::Text)],
            required: vec!["chainName"],
            action: ToolAction::ResolveChain,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        for (param, kind) in &self.fields {
            let mut field = kind.schema(param);
            if self.name == RESOLVE_CHAIN_INFO {
                field["description"] = json!("Common blockchain name (e.g., Solana, Ethereum, BSC).");
            }
            properties.insert(param.to_string(), field);
        }

        let mut parameters = json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        });
        parameters["additionalProperties"] = match self.action {
            ToolAction::Command { .. } => json!({"type": "string", "description": "Other optional string parameters."}),
            ToolAction::ResolveChain => json!(false),
        };

        ToolSchema::function(self.name, self.description.clone(), parameters)
    }

    /// Parse and check the model's raw argument JSON.
    ///
    /// Returns the fields in declaration order followed by any extras.
    pub fn validate(&self, raw_input: &str) -> Result<Vec<(String, String)>, String> {
        let trimmed = raw_input.trim();
        let input: Value = if trimmed.is_empty() {
            json!({})
        } else {
            serde_json::from_str(trimmed).map_err(|e| e.to_string())?
        };
        let object = input
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;

        let mut validated = Vec::with_capacity(object.len());
        for (param, kind) in &self.fields {
            match object.get(*param) {
                Some(Value::String(value)) => {
                    if !kind.accepts(value) {
                        return Err(format!("'{}' has an invalid format: {}", param, value));
                    }
                    validated.push((param.to_string(), value.clone()));
                }
                Some(Value::Null) | None if !self.required.contains(param) => {}
                Some(other) => return Err(format!("'{}' must be a string, got {}", param, other)),
                None => return Err(format!("'{}' is required", param)),
            }
        }

        for (key, value) in object {
            if self.fields.iter().any(|(param, _)| param == key) {
                continue;
            }
            match (&self.action, value) {
                (ToolAction::ResolveChain, _) => return Err(format!("unexpected field '{}'", key)),
                (_, Value::String(extra)) => validated.push((key.clone(), extra.clone())),
                (_, Value::Null) => {}
                (_, other) => return Err(format!("'{}' must be a string, got {}", key, other)),
            }
        }

        Ok(validated)
    }

    /// Run the tool on the model's raw argument JSON. Always yields text.
    pub async fn invoke(&self, raw_input: &str, ctx: &ToolContext) -> String {
        let fields = match self.validate(raw_input) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Invalid input for tool {}: {} (input: {})", self.name, e, raw_input);
                return match self.action {
                    ToolAction::ResolveChain => format!(
                        "Invalid input format for {}. Expected JSON string like '{{\"chainName\": \"value\"}}'. Error: {}",
                        self.name, e
                    ),
                    ToolAction::Command { .. } => format!(
                        "Invalid input format for {}. Expected a JSON string matching the schema. Error: {}",
                        self.name, e
                    ),
                };
            }
        };

        match &self.action {
            ToolAction::ResolveChain => {
                let chain_name = field(&fields, "chainName").unwrap_or_default();
                resolve_chain_info(chain_name).to_string()
            }
            ToolAction::Command { registry, def } => self.run_command(registry, def, &fields, ctx).await,
        }
    }

    async fn run_command(
        &self,
        registry: &CommandRegistry,
        def: &CommandDefinition,
        fields: &[(String, String)],
        ctx: &ToolContext,
    ) -> String {
        if def.name == EXECUTE_SWAP {
            if let Err(refusal) = check_swap_confirmed(fields, ctx) {
                warn!("Refusing {} in session {}: {}", def.name, ctx.session_id, refusal);
                return refusal;
            }
            ctx.sessions.clear_quote(&ctx.session_id);
        }

        let args = build_args_string(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        info!("Tool {} calling {} API with args: {}", self.name, registry.kind().label(), args);

        match registry.execute(def.name, &args).await {
            Ok(result) => {
                if def.name == GET_QUOTE && is_success_envelope(&result) {
                    stage_quote(fields, ctx);
                }
                serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string())
            }
            Err(e) => {
                warn!("Error calling {}: {}", def.name, e);
                format!("Error executing {}: {}. Example: {}", def.name, e, def.example)
            }
        }
    }
}

fn command_description(kind: RegistryKind, def: &CommandDefinition) -> String {
    let required = if def.required_params.is_empty() {
        "None".to_string()
    } else {
        def.required_params.join(", ")
    };
    let prefix = match kind {
        RegistryKind::Trade => "OKX Action",
        RegistryKind::Market => "Use for OKX Market/Balance/History API",
    };
    format!(
        "{}: {}. Required: {}. Input to this tool MUST be a JSON string representing an object with these parameters.",
        prefix, def.llm_description, required
    )
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn stage_quote(fields: &[(String, String)], ctx: &ToolContext) {
    let (Some(chain), Some(from), Some(to), Some(amount)) = (
        field(fields, "chainIndex"),
        field(fields, "fromTokenAddress"),
        field(fields, "toTokenAddress"),
        field(fields, "amount"),
    ) else {
        return;
    };

    *ctx.staged_quote.lock() = Some(PendingQuote {
        chain_index: chain.to_string(),
        from_token_address: from.to_string(),
        to_token_address: to.to_string(),
        amount: amount.to_string(),
        turn: ctx.turn,
    });
}

/// A swap may only run against a quote the user has already seen.
fn check_swap_confirmed(fields: &[(String, String)], ctx: &ToolContext) -> Result<(), String> {
    const NEXT_STEP: &str = "Get a quote with okx_get_quote, present it to the user, and execute only after the user confirms in their next message.";

    let Some(quote) = ctx.sessions.pending_quote(&ctx.session_id) else {
        return Err(format!("Swap not executed: there is no quote for this swap yet. {}", NEXT_STEP));
    };
    if quote.turn >= ctx.turn {
        return Err(format!(
            "Swap not executed: the quote was just produced and the user has not confirmed it. {}",
            NEXT_STEP
        ));
    }

    let matches = quote.matches(
        field(fields, "chainIndex").unwrap_or_default(),
        field(fields, "fromTokenAddress").unwrap_or_default(),
        field(fields, "toTokenAddress").unwrap_or_default(),
        field(fields, "amount").unwrap_or_default(),
    );
    if !matches {
        return Err(format!(
            "Swap not executed: the requested swap does not match the quoted swap (chainIndex {}, {} -> {}, amount {}). {}",
            quote.chain_index, quote.from_token_address, quote.to_token_address, quote.amount, NEXT_STEP
        ));
    }
    Ok(())
}

/// Map a common chain name to its OKX `chainIndex`. Never fails.
pub fn resolve_chain_info(chain_name: &str) -> Value {
    let key = chain_name.trim().to_lowercase();
    match CHAIN_INDEXES.iter().find(|(name, _)| *name == key) {
        Some((_, index)) => json!({
            "chainIndex": index,
            "resolvedFor": chain_name,
            "status": "success",
        }),
        None => json!({
            "error": format!(
                "Could not resolve chainIndex for {}. Ask user for numeric chainIndex or supported name.",
                chain_name
            ),
            "status": "not_found",
        }),
    }
}

/// The tools offered to one agent mode.
pub struct ToolSet {
    tools: Vec<AgentTool>,
}

impl ToolSet {
    pub fn new(tools: Vec<AgentTool>) -> Self {
        Self { tools }
    }

    pub fn for_mode(mode: AgentMode, trade: &Arc<CommandRegistry>, market: &Arc<CommandRegistry>) -> Self {
        let mut tools: Vec<AgentTool> = match mode {
            AgentMode::SakAgentNlp => SWAP_COPILOT_COMMANDS
                .iter()
                .filter_map(|name| trade.definition(name))
                .map(|def| AgentTool::for_command(Arc::clone(trade), def))
                .collect(),
            AgentMode::OkxApiAgentNlp => trade
                .definitions()
                .iter()
                .filter(|def| def.name != EXECUTE_SWAP)
                .map(|def| AgentTool::for_command(Arc::clone(trade), def))
                .chain(
                    market
                        .definitions()
                        .iter()
                        .map(|def| AgentTool::for_command(Arc::clone(market), def)),
                )
                .collect(),
        };
        tools.push(AgentTool::resolve_chain_info());
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&AgentTool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name).collect()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(AgentTool::schema).collect()
    }

    /// Run the named tool. Unknown names become tool output too.
    pub async fn invoke(&self, name: &str, raw_input: &str, ctx: &ToolContext) -> String {
        match self.get(name) {
            Some(tool) => tool.invoke(raw_input, ctx).await,
            None => {
                warn!("Model requested unknown tool {}", name);
                format!("Unknown tool {}. Available tools: {}", name, self.names().join(", "))
            }
        }
    }
}
