use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use super::args::{CommandArgs, parse_command_args};
use super::client::OkxClient;
use super::commands::{CommandDefinition, MARKET_COMMANDS, RequestSpec, TRADE_COMMANDS};
use super::error::CommandError;

/// Parameters that fall back to the configured wallet address.
const WALLET_PARAMS: &[&str] = &["address", "userWalletAddress"];

/// Signs and submits a serialized swap transaction returned by OKX.
#[async_trait]
pub trait SwapSubmitter: Send + Sync {
    /// `serialized_tx` is the base58 transaction from the swap response.
    /// Returns the transaction signature.
    async fn submit(&self, serialized_tx: &str) -> Result<String, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Trade,
    Market,
}

impl RegistryKind {
    pub fn label(&self) -> &'static str {
        match self {
            RegistryKind::Trade => "Trade",
            RegistryKind::Market => "Market",
        }
    }

    fn table(&self) -> &'static [CommandDefinition] {
        match self {
            RegistryKind::Trade => TRADE_COMMANDS,
            RegistryKind::Market => MARKET_COMMANDS,
        }
    }
}

/// Listing entry for one command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandInfo {
    pub name: &'static str,
    pub ui_description: &'static str,
    pub llm_tool_description: &'static str,
    pub example: &'static str,
    #[serde(rename = "requiredParams")]
    pub required_params: Vec<&'static str>,
}

impl From<&CommandDefinition> for CommandInfo {
    fn from(def: &CommandDefinition) -> Self {
        Self {
            name: def.name,
            ui_description: def.ui_description,
            llm_tool_description: def.llm_description,
            example: def.example,
            required_params: def.required_params.to_vec(),
        }
    }
}

/// Dispatches named commands to signed OKX calls.
pub struct CommandRegistry {
    kind: RegistryKind,
    commands: &'static [CommandDefinition],
    client: OkxClient,
    wallet_address: Option<String>,
    submitter: Option<Arc<dyn SwapSubmitter>>,
}

impl CommandRegistry {
    pub fn new(kind: RegistryKind, client: OkxClient, wallet_address: Option<String>) -> Self {
        Self {
            kind,
            commands: kind.table(),
            client,
            wallet_address,
            submitter: None,
        }
    }

    pub fn trade(client: OkxClient, wallet_address: Option<String>) -> Self {
        Self::new(RegistryKind::Trade, client, wallet_address)
    }

    pub fn market(client: OkxClient, wallet_address: Option<String>) -> Self {
        Self::new(RegistryKind::Market, client, wallet_address)
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn SwapSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    pub fn definition(&self, name: &str) -> Option<&'static CommandDefinition> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    pub fn definitions(&self) -> &'static [CommandDefinition] {
        self.commands
    }

    /// Enumerate every command in table order.
    pub fn commands(&self) -> Vec<CommandInfo> {
        self.commands.iter().map(CommandInfo::from).collect()
    }

    /// Validate `args` for `name` and perform the command's signed call.
    ///
    /// The decoded OKX response is returned verbatim, including error
    /// envelopes with a non-zero `code`.
    pub async fn execute(&self, name: &str, args: &str) -> Result<Value, CommandError> {
        let def = self.definition(name).ok_or_else(|| CommandError::UnknownCommand {
            registry: self.kind.label(),
            command: name.to_string(),
            available: self.commands.iter().map(|c| c.name.to_string()).collect(),
        })?;

        let mut parsed = parse_command_args(args);
        self.check_required(def, &mut parsed)?;

        info!("Executing OKX {} command {} with {} args", self.kind.label(), def.name, parsed.len());

        match def.request {
            RequestSpec::Query { path, params } => {
                let query = query_pairs(params, &parsed);
                Ok(self.client.get(path, &query).await?)
            }
            RequestSpec::BatchBody { path, fields } => {
                let mut item = Map::new();
                for field in fields {
                    if let Some(value) = parsed.get(*field) {
                        item.insert(field.to_string(), Value::String(value.clone()));
                    }
                }
                Ok(self.client.post(path, &Value::Array(vec![Value::Object(item)])).await?)
            }
            RequestSpec::SubmitSwap { path, params } => {
                let query = query_pairs(params, &parsed);
                let swap = self.client.get(path, &query).await?;
                self.submit_swap(swap, &parsed).await
            }
        }
    }

    fn check_required(&self, def: &CommandDefinition, parsed: &mut CommandArgs) -> Result<(), CommandError> {
        let mut missing = Vec::new();
        for param in def.required_params {
            let present = parsed.get(*param).is_some_and(|v| !v.is_empty());
            if present {
                continue;
            }
            match (&self.wallet_address, WALLET_PARAMS.contains(param)) {
                (Some(wallet), true) => {
                    parsed.insert(param.to_string(), wallet.clone());
                }
                _ => missing.push(param.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CommandError::MissingParams {
                command: def.name.to_string(),
                missing,
                example: def.example.to_string(),
            })
        }
    }

    async fn submit_swap(&self, swap: Value, parsed: &CommandArgs) -> Result<Value, CommandError> {
        if !is_success_envelope(&swap) {
            warn!("OKX swap request was rejected, not submitting: {}", swap);
            return Ok(swap);
        }

        let serialized = swap["data"][0]["tx"]["data"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CommandError::Submission("swap response has no transaction data".to_string()))?;

        let submitter = self
            .submitter
            .as_ref()
            .ok_or_else(|| CommandError::Submission("no wallet is configured to sign swaps".to_string()))?;

        let signature = submitter.submit(serialized).await.map_err(CommandError::Submission)?;
        info!("Submitted swap transaction {}", signature);

        Ok(json!({
            "code": "0",
            "msg": "",
            "data": [{
                "txHash": signature,
                "chainIndex": parsed.get("chainIndex"),
                "fromTokenAddress": parsed.get("fromTokenAddress"),
                "toTokenAddress": parsed.get("toTokenAddress"),
                "amount": parsed.get("amount"),
                "routerResult": swap["data"][0]["routerResult"].clone(),
            }]
        }))
    }
}

fn query_pairs<'a>(params: &[&'a str], parsed: &'a CommandArgs) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .filter_map(|param| {
            parsed
                .get(*param)
                .filter(|v| !v.is_empty())
                .map(|value| (*param, value.as_str()))
        })
        .collect()
}

/// True when an OKX envelope reports `code == "0"`. Numeric codes are accepted too.
pub fn is_success_envelope(body: &Value) -> bool {
    match &body["code"] {
        Value::String(code) => code == "0",
        Value::Number(code) => code.as_i64() == Some(0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okx::auth::{OkxAuth, OkxCredentials};
    use parking_lot::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn client_for(server: &MockServer) -> OkxClient {
        OkxClient::new(OkxAuth::new(OkxCredentials::default()), server.uri(), Duration::from_secs(5)).unwrap()
    }

    async fn ok_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "0", "msg": "", "data": []})))
            .mount(&server)
            .await;
        server
    }

    struct RecordingSubmitter {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SwapSubmitter for RecordingSubmitter {
        async fn submit(&self, serialized_tx: &str) -> Result<String, String> {
            self.seen.lock().push(serialized_tx.to_string());
            Ok("5igSignature".to_string())
        }
    }

    /// Builds an argument string holding every required param of `def`.
    fn full_args(def: &CommandDefinition) -> String {
        def.required_params
            .iter()
            .map(|p| format!("{}={}", p, if p.contains("Index") { "501" } else { "1" }))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_unknown_command_lists_available() {
        let server = ok_server().await;
        let registry = CommandRegistry::market(client_for(&server), None);

        let err = registry.execute("okx_does_not_exist", "").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown OKX Market API command: okx_does_not_exist"));
        for cmd in MARKET_COMMANDS {
            assert!(msg.contains(cmd.name));
        }
    }

    #[tokio::test]
    async fn test_every_command_accepts_full_args() {
        let server = ok_server().await;
        let submitter = Arc::new(RecordingSubmitter { seen: Mutex::new(Vec::new()) });
        let trade = CommandRegistry::trade(client_for(&server), None).with_submitter(submitter);
        let market = CommandRegistry::market(client_for(&server), None);

        for registry in [&trade, &market] {
            for def in registry.definitions() {
                let result = registry.execute(def.name, &full_args(def)).await;
                assert!(
                    !matches!(result, Err(CommandError::MissingParams { .. })),
                    "{} reported missing params",
                    def.name
                );
            }
        }
    }

    #[tokio::test]
    async fn test_omitting_each_required_param_is_reported() {
        let server = ok_server().await;
        let trade = CommandRegistry::trade(client_for(&server), None);
        let market = CommandRegistry::market(client_for(&server), None);

        for registry in [&trade, &market] {
            for def in registry.definitions() {
                for omitted in def.required_params {
                    let args = def
                        .required_params
                        .iter()
                        .filter(|p| *p != omitted)
                        .map(|p| format!("{}=1", p))
                        .collect::<Vec<_>>()
                        .join(" ");
                    match registry.execute(def.name, &args).await {
                        Err(CommandError::MissingParams { missing, example, .. }) => {
                            assert_eq!(missing, vec![omitted.to_string()]);
                            assert_eq!(example, def.example);
                        }
                        other => panic!("{} without {}: {:?}", def.name, omitted, other.map(|_| ())),
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_missing_set_is_named_in_message() {
        let server = ok_server().await;
        let trade = CommandRegistry::trade(client_for(&server), None);

        let err = trade.execute("okx_get_quote", "chainIndex=501").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Missing required parameters for okx_get_quote: amount, fromTokenAddress, toTokenAddress."));
        assert!(msg.contains("Example: okx_get_quote"));
    }

    #[tokio::test]
    async fn test_wallet_address_fills_address_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v5/dex/balance/total-value"))
            .and(query_param("address", WALLET))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "0", "data": [{"totalValue": "12.5"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let market = CommandRegistry::market(client_for(&server), Some(WALLET.to_string()));
        let body = market.execute("okx_balance_get_total_value", "").await.unwrap();
        assert_eq!(body["data"][0]["totalValue"], "12.5");

        let without_wallet = CommandRegistry::market(client_for(&server), None);
        let err = without_wallet.execute("okx_balance_get_total_value", "").await.unwrap_err();
        assert!(matches!(err, CommandError::MissingParams { .. }));
    }

    #[tokio::test]
    async fn test_price_posts_single_item_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v5/dex/market/price"))
            .and(body_json(json!([{"chainIndex": "501", "tokenContractAddress": "NATIVE"}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "0", "data": [{"price": "150.1"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let market = CommandRegistry::market(client_for(&server), None);
        let body = market
            .execute("okx_market_get_price", "chainIndex=501 tokenContractAddress=NATIVE")
            .await
            .unwrap();
        assert_eq!(body["data"][0]["price"], "150.1");
    }

    #[tokio::test]
    async fn test_optional_params_forwarded_unknown_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v5/dex/aggregator/quote"))
            .and(query_param("slippage", "0.5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "0", "data": [{}]})))
            .expect(1)
            .mount(&server)
            .await;

        let trade = CommandRegistry::trade(client_for(&server), None);
        trade
            .execute(
                "okx_get_quote",
                "chainIndex=501 amount=100 fromTokenAddress=A toTokenAddress=B slippage=0.5 bogus=1",
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].url.query().unwrap_or_default().contains("bogus"));
    }

    #[tokio::test]
    async fn test_execute_swap_submits_transaction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v5/dex/aggregator/swap"))
            .and(query_param("userWalletAddress", WALLET))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "0",
                "data": [{"routerResult": {"toTokenAmount": "1500000"}, "tx": {"data": "3Bxs4Bc3VYuGVB19"}}]
            })))
            .mount(&server)
            .await;

        let submitter = Arc::new(RecordingSubmitter { seen: Mutex::new(Vec::new()) });
        let trade = CommandRegistry::trade(client_for(&server), Some(WALLET.to_string()))
            .with_submitter(submitter.clone());

        let body = trade
            .execute("okx_execute_swap", "chainIndex=501 amount=10000000 fromTokenAddress=A toTokenAddress=B slippage=0.5")
            .await
            .unwrap();

        assert_eq!(body["code"], "0");
        assert_eq!(body["data"][0]["txHash"], "5igSignature");
        assert_eq!(body["data"][0]["routerResult"]["toTokenAmount"], "1500000");
        assert_eq!(submitter.seen.lock().as_slice(), ["3Bxs4Bc3VYuGVB19"]);
    }

    #[tokio::test]
    async fn test_execute_swap_passes_through_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "82000", "msg": "Insufficient liquidity"})))
            .mount(&server)
            .await;

        let submitter = Arc::new(RecordingSubmitter { seen: Mutex::new(Vec::new()) });
        let trade = CommandRegistry::trade(client_for(&server), Some(WALLET.to_string()))
            .with_submitter(submitter.clone());

        let body = trade
            .execute("okx_execute_swap", "chainIndex=501 amount=1 fromTokenAddress=A toTokenAddress=B slippage=0.5")
            .await
            .unwrap();
        assert_eq!(body["code"], "82000");
        assert!(submitter.seen.lock().is_empty());
    }

    #[test]
    fn test_success_envelope_detection() {
        assert!(is_success_envelope(&json!({"code": "0"})));
        assert!(is_success_envelope(&json!({"code": 0})));
        assert!(!is_success_envelope(&json!({"code": "50011"})));
        assert!(!is_success_envelope(&json!({"data": []})));
    }

    #[test]
    fn test_listing_matches_table() {
        let client = OkxClient::new(OkxAuth::new(OkxCredentials::default()), "http://localhost", Duration::from_secs(1)).unwrap();
        let trade = CommandRegistry::trade(client, None);
        let listing = trade.commands();
        assert_eq!(listing.len(), TRADE_COMMANDS.len());
        assert_eq!(listing[0].name, TRADE_COMMANDS[0].name);
        assert_eq!(listing[3].required_params, vec!["chainIndex", "amount", "fromTokenAddress", "toTokenAddress"]);
    }
}
