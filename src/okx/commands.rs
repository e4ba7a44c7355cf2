//! Command tables for the Trade and Market registries.
//!
//! Each entry describes exactly one OKX endpoint. Handlers are not code: the
//! registry interprets the [`RequestSpec`] of an entry to build the signed call.

/// How a command maps its arguments onto one HTTP request.
#[derive(Debug, Clone, Copy)]
pub enum RequestSpec {
    /// GET; every listed parameter present in the arguments becomes a query
    /// parameter, in the listed order.
    Query {
        path: &'static str,
        params: &'static [&'static str],
    },
    /// POST; the body is a one-element JSON array holding the listed fields.
    BatchBody {
        path: &'static str,
        fields: &'static [&'static str],
    },
    /// GET swap data like [`RequestSpec::Query`], then sign and submit the
    /// returned Solana transaction with the configured keypair.
    SubmitSwap {
        path: &'static str,
        params: &'static [&'static str],
    },
}

impl RequestSpec {
    pub fn path(&self) -> &'static str {
        match self {
            RequestSpec::Query { path, .. }
            | RequestSpec::BatchBody { path, .. }
            | RequestSpec::SubmitSwap { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub required_params: &'static [&'static str],
    pub request: RequestSpec,
    /// Long description for listings.
    pub ui_description: &'static str,
    /// Short description for tool schemas.
    pub llm_description: &'static str,
    pub example: &'static str,
}

const SWAP_PARAMS: &[&str] = &[
    "chainIndex",
    "amount",
    "fromTokenAddress",
    "toTokenAddress",
    "slippage",
    "userWalletAddress",
    "swapReceiverAddress",
    "feePercent",
    "autoSlippage",
    "maxAutoSlippage",
];

const SWAP_REQUIRED: &[&str] = &[
    "chainIndex",
    "amount",
    "fromTokenAddress",
    "toTokenAddress",
    "slippage",
    "userWalletAddress",
];

pub static TRADE_COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        name: "okx_get_supported_chains",
        required_params: &[],
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/supported/chain",
            params: &["chainIndex"],
        },
        ui_description: "Retrieve information on chains supported by the OKX DEX Aggregator.",
        llm_description: "Gets chains supported by the DEX aggregator",
        example: "okx_get_supported_chains chainIndex=501",
    },
    CommandDefinition {
        name: "okx_get_tokens",
        required_params: &["chainIndex"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/all-tokens",
            params: &["chainIndex"],
        },
        ui_description: "Fetches a list of tokens for a specific chain from OKX DEX Aggregator.",
        llm_description: "Gets list of tokens for a chainIndex",
        example: "okx_get_tokens chainIndex=501",
    },
    CommandDefinition {
        name: "okx_get_liquidity_sources",
        required_params: &["chainIndex"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/get-liquidity",
            params: &["chainIndex"],
        },
        ui_description: "Get a list of liquidity sources available for swap from OKX DEX Aggregator.",
        llm_description: "Gets liquidity sources for a chainIndex",
        example: "okx_get_liquidity_sources chainIndex=501",
    },
    CommandDefinition {
        name: "okx_get_quote",
        required_params: &["chainIndex", "amount", "fromTokenAddress", "toTokenAddress"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/quote",
            params: &[
                "chainIndex",
                "amount",
                "fromTokenAddress",
                "toTokenAddress",
                "slippage",
                "dexIds",
                "priceImpactProtectionPercentage",
                "feePercent",
            ],
        },
        ui_description: "Get the best quote for a swap from OKX DEX Aggregator.",
        llm_description: "Gets swap quote for specified tokens and amount",
        example: "okx_get_quote chainIndex=501 amount=10000000 fromTokenAddress=So11111111111111111111111111111111111111112 toTokenAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v slippage=0.5",
    },
    CommandDefinition {
        name: "okx_get_swap",
        required_params: SWAP_REQUIRED,
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/swap",
            params: SWAP_PARAMS,
        },
        ui_description: "Generate the transaction data for a swap without submitting it.",
        llm_description: "Gets unsigned swap transaction data",
        example: "okx_get_swap chainIndex=501 amount=10000000 fromTokenAddress=So11111111111111111111111111111111111111112 toTokenAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v slippage=0.5 userWalletAddress=yourAddress",
    },
    CommandDefinition {
        name: "okx_get_swap_instruction",
        required_params: SWAP_REQUIRED,
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/swap-instruction",
            params: SWAP_PARAMS,
        },
        ui_description: "Get the Solana swap instructions for a swap so they can be composed into a custom transaction.",
        llm_description: "Gets Solana swap instructions",
        example: "okx_get_swap_instruction chainIndex=501 amount=10000000 fromTokenAddress=So11111111111111111111111111111111111111112 toTokenAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v slippage=0.5 userWalletAddress=yourAddress",
    },
    CommandDefinition {
        name: "okx_get_txn_status",
        required_params: &["chainIndex", "txHash"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/aggregator/history",
            params: &["chainIndex", "txHash", "isFromMyProject"],
        },
        ui_description: "Get the final transaction status of a single-chain swap using txhash from OKX DEX Aggregator.",
        llm_description: "Gets transaction status by txHash and chainIndex",
        example: "okx_get_txn_status chainIndex=501 txHash=yourTxHash",
    },
    CommandDefinition {
        name: "okx_get_onchain_supported_chains",
        required_params: &[],
        request: RequestSpec::Query {
            path: "/api/v5/dex/pre-transaction/supported/chain",
            params: &[],
        },
        ui_description: "Retrieve information on chains supported by Onchain gateway API.",
        llm_description: "Gets chains supported by Onchain Gateway API",
        example: "okx_get_onchain_supported_chains",
    },
    CommandDefinition {
        name: "okx_execute_swap",
        required_params: SWAP_REQUIRED,
        request: RequestSpec::SubmitSwap {
            path: "/api/v5/dex/aggregator/swap",
            params: SWAP_PARAMS,
        },
        ui_description: "Build a swap with OKX DEX Aggregator, sign it with the configured wallet and submit it to Solana.",
        llm_description: "Executes a confirmed swap and returns the transaction signature",
        example: "okx_execute_swap chainIndex=501 amount=10000000 fromTokenAddress=So11111111111111111111111111111111111111112 toTokenAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v slippage=0.5 userWalletAddress=yourAddress",
    },
];

pub static MARKET_COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        name: "okx_market_supported_chains",
        required_params: &[],
        request: RequestSpec::Query {
            path: "/api/v5/dex/market/supported/chain",
            params: &["chainIndex"],
        },
        ui_description: "Retrieve information on chains supported by OKX Market API.",
        llm_description: "Gets chains supported by Market API",
        example: "okx_market_supported_chains chainIndex=1",
    },
    CommandDefinition {
        name: "okx_market_get_price",
        required_params: &["chainIndex", "tokenContractAddress"],
        request: RequestSpec::BatchBody {
            path: "/api/v5/dex/market/price",
            fields: &["chainIndex", "tokenContractAddress"],
        },
        ui_description: "Retrieve the latest price of a token using OKX Market API.",
        llm_description: "Gets latest token price by chain and address",
        example: "okx_market_get_price chainIndex=501 tokenContractAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    },
    CommandDefinition {
        name: "okx_market_get_trades",
        required_params: &["chainIndex", "tokenContractAddress"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/market/trades",
            params: &["chainIndex", "tokenContractAddress", "after", "limit"],
        },
        ui_description: "Retrieve the most recent trades of a token using OKX Market API.",
        llm_description: "Gets recent trades for a token",
        example: "okx_market_get_trades chainIndex=501 tokenContractAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v limit=20",
    },
    CommandDefinition {
        name: "okx_market_get_candles",
        required_params: &["chainIndex", "tokenContractAddress"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/market/candles",
            params: &["chainIndex", "tokenContractAddress", "after", "before", "bar", "limit"],
        },
        ui_description: "Retrieve candlestick chart data of a token using OKX Market API.",
        llm_description: "Gets candlestick data for a token",
        example: "okx_market_get_candles chainIndex=501 tokenContractAddress=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v bar=1H limit=24",
    },
    CommandDefinition {
        name: "okx_balance_supported_chains",
        required_params: &[],
        request: RequestSpec::Query {
            path: "/api/v5/dex/balance/supported/chain",
            params: &[],
        },
        ui_description: "Retrieve information on chains supported by OKX Balance API.",
        llm_description: "Gets chains supported by Balance API",
        example: "okx_balance_supported_chains",
    },
    CommandDefinition {
        name: "okx_balance_get_total_value",
        required_params: &["address"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/balance/total-value",
            params: &["address", "chains", "assetType", "excludeRiskToken"],
        },
        ui_description: "Retrieve total balance of all tokens and DeFi assets for an address.",
        llm_description: "Gets total asset value for an address",
        example: "okx_balance_get_total_value address=yourAddress chains=1,501",
    },
    CommandDefinition {
        name: "okx_balance_get_all_token_balances",
        required_params: &["address", "chains"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/balance/all-token-balances-by-address",
            params: &["address", "chains", "excludeRiskToken"],
        },
        ui_description: "Query the list of token balances held by an address on the given chains.",
        llm_description: "Gets all token balances for an address",
        example: "okx_balance_get_all_token_balances address=yourAddress chains=501",
    },
    CommandDefinition {
        name: "okx_history_get_transactions",
        required_params: &["address", "chains"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/post-transaction/transactions-by-address",
            params: &["address", "chains", "tokenContractAddress", "begin", "end", "cursor", "limit"],
        },
        ui_description: "Query the transaction history of an address, ordered by time descending.",
        llm_description: "Gets transaction history for an address",
        example: "okx_history_get_transactions address=yourAddress chains=501 limit=20",
    },
    CommandDefinition {
        name: "okx_history_get_transaction_detail",
        required_params: &["chainIndex", "txHash"],
        request: RequestSpec::Query {
            path: "/api/v5/dex/post-transaction/transaction-detail-by-txhash",
            params: &["chainIndex", "txHash", "itype"],
        },
        ui_description: "Retrieve the details of a transaction by its hash.",
        llm_description: "Gets transaction details by txHash",
        example: "okx_history_get_transaction_detail chainIndex=501 txHash=yourTxHash",
    },
];
