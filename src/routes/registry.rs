// Route registry
// Static catalog of the supported transfer pairs: channel ids, priority
// fees, source-chain parameters, quote tokens, and operand layout variants

use alloy_primitives::{address, Address, U256};

use crate::errors::TransferError;

/// UCS03 router contract, deployed at the same address on every source chain.
pub const UCS03_ROUTER: Address = address!("5FbE74A283f7954f10AA04C2eDf55578811aeb03");

/// Sentinel token address for the chain's native asset.
pub const BASE_TOKEN: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// Decimals word emitted for every source asset.
pub const SOURCE_DECIMALS: u64 = 18;

const WEI_PER_TOKEN: f64 = 1e18;

/// Source chains the registry routes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainTag {
    Sepolia,
    Holesky,
    Sei,
    Corn,
}

impl ChainTag {
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            ChainTag::Sepolia => "https://sepolia.drpc.org/",
            ChainTag::Holesky => "https://ethereum-holesky-rpc.publicnode.com/",
            ChainTag::Sei => "https://evm-rpc-testnet.sei-apis.com/",
            ChainTag::Corn => "https://21000001.rpc.thirdweb.com/",
        }
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            ChainTag::Sepolia => "ETH Sepolia",
            ChainTag::Holesky => "ETH Holesky",
            ChainTag::Sei => "SEI",
            ChainTag::Corn => "BTCN",
        }
    }

    /// Per-chain default transfer amount in whole source-asset units.
    pub fn default_amount(&self) -> f64 {
        match self {
            ChainTag::Sepolia => 0.0001,
            ChainTag::Holesky => 0.0001,
            ChainTag::Sei => 0.01,
            ChainTag::Corn => 0.0000001,
        }
    }

    /// Block-explorer link for a transaction hash. Informational only.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        match self {
            ChainTag::Sepolia => format!("https://sepolia.etherscan.io/tx/{tx_hash}"),
            ChainTag::Holesky => format!("https://holesky.etherscan.io/tx/{tx_hash}"),
            ChainTag::Sei => format!("https://seitrace.com/tx/{tx_hash}?chain=atlantic-2"),
            ChainTag::Corn => format!("https://testnet.cornscan.io/tx/{tx_hash}"),
        }
    }
}

/// Which configured destination account string a length-prefixed receiver
/// resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestFamily {
    Xion,
    Babylon,
}

/// Receiver-encoding variant of a route. This single tag determines the
/// operand layout: fixed-address routes carry 20-byte receiver and quote
/// slots, length-prefixed routes carry 64-byte string slots for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// Receiver is the sender's own EVM address on the destination chain.
    FixedAddress,
    /// Receiver is a bech32-style account string on the destination chain.
    LengthPrefixed(DestFamily),
}

/// Precomputed byte offsets of one instruction block. These are fixed
/// per layout variant, not recomputed from field sizes: the upstream
/// contract's tuple shape is a closed catalog, not a generic ABI schema.
#[derive(Debug, Clone, Copy)]
pub struct OperandLayout {
    pub tail_len: u64,
    pub sender: u64,
    pub receiver: u64,
    pub base_token: u64,
    pub symbol: u64,
    pub name: u64,
    pub quote: u64,
    /// Outer-head offset of the second instruction in a multiplex operand.
    pub second_block: u64,
    /// Slot width of the receiver field in bytes.
    pub receiver_slot: usize,
    /// Slot width of the quote-token field in bytes.
    pub quote_slot: usize,
}

const LAYOUT_FIXED: OperandLayout = OperandLayout {
    tail_len: 704,
    sender: 320,
    receiver: 384,
    base_token: 448,
    symbol: 512,
    name: 576,
    quote: 640,
    second_block: 896,
    receiver_slot: 32,
    quote_slot: 32,
};

const LAYOUT_PREFIXED: OperandLayout = OperandLayout {
    tail_len: 768,
    sender: 320,
    receiver: 384,
    base_token: 480,
    symbol: 544,
    name: 608,
    quote: 672,
    second_block: 960,
    receiver_slot: 64,
    quote_slot: 64,
};

impl ReceiverKind {
    pub fn layout(&self) -> &'static OperandLayout {
        match self {
            ReceiverKind::FixedAddress => &LAYOUT_FIXED,
            ReceiverKind::LengthPrefixed(_) => &LAYOUT_PREFIXED,
        }
    }
}

/// Immutable descriptor of one supported (source, destination) pair.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub id: u8,
    pub pair: &'static str,
    pub channel_id: u32,
    /// Priority-fee multiplier in gwei.
    pub fee_gwei: f64,
    pub source: ChainTag,
    pub symbol: &'static str,
    pub name: &'static str,
    /// 20-byte EVM address or the raw bytes of a bech32 account string.
    pub quote_token: &'static [u8],
    pub receiver: ReceiverKind,
    /// Two-hop routes bundle a second, zero-amount sub-instruction.
    pub multiplex: bool,
}

impl Route {
    /// Convert a whole-unit amount (configured override or the chain
    /// default) into wei-denominated base units.
    pub fn amount_base_units(&self, override_amount: Option<f64>) -> Result<U256, TransferError> {
        let tokens = override_amount.unwrap_or_else(|| self.source.default_amount());
        let wei = (tokens * WEI_PER_TOKEN).round();
        if !(wei >= 1.0) || wei > u128::MAX as f64 {
            return Err(TransferError::InvalidAmount);
        }
        Ok(U256::from(wei as u128))
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        self.source.explorer_tx_url(tx_hash)
    }
}

const QUOTE_ETH_ON_HOLESKY: [u8; 20] =
    alloy_primitives::hex!("92b3bc0bc3ac0ee60b04a0bbc4a09deb3914c886");
const QUOTE_ETH_ON_SEPOLIA: [u8; 20] =
    alloy_primitives::hex!("f6e7e2725b40ec8226036906cab0f5dc3722b8e7");
const QUOTE_SEI_BRIDGED: [u8; 20] =
    alloy_primitives::hex!("e86bed5b0813430df660d17363b89fe9bd8232d8");
const QUOTE_BTCN_ON_SEI: [u8; 20] =
    alloy_primitives::hex!("92b3bc0bc3ac0ee60b04a0bbc4a09deb3914c886");

static ROUTES: [Route; 12] = [
    Route {
        id: 1,
        pair: "Sepolia Testnet to Holesky Testnet",
        channel_id: 8,
        fee_gwei: 1.5,
        source: ChainTag::Sepolia,
        symbol: "ETH",
        name: "Ether",
        quote_token: &QUOTE_ETH_ON_HOLESKY,
        receiver: ReceiverKind::FixedAddress,
        multiplex: false,
    },
    Route {
        id: 2,
        pair: "Sepolia Testnet to Babylon Testnet",
        channel_id: 7,
        fee_gwei: 1.5,
        source: ChainTag::Sepolia,
        symbol: "ETH",
        name: "Ether",
        quote_token: b"bbn187eaxfaqemg3ntfen5jkselwpk6v65z54892f2pptlx5g3p9qsmsc9gh4c",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Babylon),
        multiplex: false,
    },
    Route {
        id: 3,
        pair: "Holesky Testnet to Sepolia Testnet",
        channel_id: 2,
        fee_gwei: 0.001,
        source: ChainTag::Holesky,
        symbol: "ETH",
        name: "Ether",
        quote_token: &QUOTE_ETH_ON_SEPOLIA,
        receiver: ReceiverKind::FixedAddress,
        multiplex: false,
    },
    Route {
        id: 4,
        pair: "Holesky Testnet to Xion Testnet",
        channel_id: 4,
        fee_gwei: 0.001,
        source: ChainTag::Holesky,
        symbol: "ETH",
        name: "Ether",
        quote_token: b"xion1xc9vahyrrm3gml9xs89k8fu93g3fsm52jhjckmgxrzlazf0sv05q6nuune",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Xion),
        multiplex: false,
    },
    Route {
        id: 5,
        pair: "Holesky Testnet to Babylon Testnet",
        channel_id: 3,
        fee_gwei: 0.001,
        source: ChainTag::Holesky,
        symbol: "ETH",
        name: "Ether",
        quote_token: b"bbn1vjarrnrqm6nc4j609dte7gwqfccpdad9cwdttys5d2szjqwp7rtslrn766",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Babylon),
        multiplex: false,
    },
    Route {
        id: 6,
        pair: "Sei Testnet to Xion Testnet",
        channel_id: 1,
        fee_gwei: 1.1,
        source: ChainTag::Sei,
        symbol: "SEI",
        name: "Sei",
        quote_token: b"xion1tms92cm34lxln4kvxw2xdsgncumzepr5e2eug90vmtyw55z8djuqvwnee7",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Xion),
        multiplex: false,
    },
    Route {
        id: 7,
        pair: "Sei Testnet to Bitcorn Testnet",
        channel_id: 2,
        fee_gwei: 1.1,
        source: ChainTag::Sei,
        symbol: "SEI",
        name: "Sei",
        quote_token: &QUOTE_SEI_BRIDGED,
        receiver: ReceiverKind::FixedAddress,
        multiplex: false,
    },
    Route {
        id: 8,
        pair: "Sei Testnet to Binance Smart Chain Testnet",
        channel_id: 5,
        fee_gwei: 1.1,
        source: ChainTag::Sei,
        symbol: "SEI",
        name: "Sei",
        quote_token: &QUOTE_SEI_BRIDGED,
        receiver: ReceiverKind::FixedAddress,
        multiplex: true,
    },
    Route {
        id: 9,
        pair: "Sei Testnet to Babylon Testnet",
        channel_id: 4,
        fee_gwei: 1.1,
        source: ChainTag::Sei,
        symbol: "SEI",
        name: "Sei",
        quote_token: b"bbn169hna9lzttypg47ehau04h54exmul0r0y9j7plaxswg5n3de7fnqd8wnuy",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Babylon),
        multiplex: true,
    },
    Route {
        id: 10,
        pair: "Bitcorn Testnet to Xion Testnet",
        channel_id: 2,
        fee_gwei: 0.01,
        source: ChainTag::Corn,
        symbol: "BTCN",
        name: "Bitcorn",
        quote_token: b"xion1h746ddyk9c9yh4fccuzkcmep89wmk5n5zkw757273mqcmuemc38s2xtmtf",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Xion),
        multiplex: false,
    },
    Route {
        id: 11,
        pair: "Bitcorn Testnet to Sei Testnet",
        channel_id: 3,
        fee_gwei: 0.01,
        source: ChainTag::Corn,
        symbol: "BTCN",
        name: "Bitcorn",
        quote_token: &QUOTE_BTCN_ON_SEI,
        receiver: ReceiverKind::FixedAddress,
        multiplex: false,
    },
    Route {
        id: 12,
        pair: "Bitcorn Testnet to Babylon Testnet",
        channel_id: 1,
        fee_gwei: 0.01,
        source: ChainTag::Corn,
        symbol: "BTCN",
        name: "Bitcorn",
        quote_token: b"bbn1p9zh7p2fxf3tqvk0mdqna2spkjl00q20ajwej48mzm82zna5nt7s9pw2pl",
        receiver: ReceiverKind::LengthPrefixed(DestFamily::Babylon),
        multiplex: false,
    },
];

/// All routes in their declared menu order.
pub fn all() -> &'static [Route] {
    &ROUTES
}

/// Look up a route by its ordinal (1-based).
pub fn lookup(id: u8) -> Result<&'static Route, TransferError> {
    if id == 0 {
        return Err(TransferError::UnknownRoute(id));
    }
    ROUTES
        .get(id as usize - 1)
        .ok_or(TransferError::UnknownRoute(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_declared_order() {
        for (i, route) in all().iter().enumerate() {
            assert_eq!(route.id as usize, i + 1);
            assert_eq!(lookup(route.id).unwrap().pair, route.pair);
        }
    }

    #[test]
    fn unknown_routes_are_rejected() {
        assert!(matches!(lookup(0), Err(TransferError::UnknownRoute(0))));
        assert!(matches!(lookup(13), Err(TransferError::UnknownRoute(13))));
    }

    #[test]
    fn sepolia_to_holesky_parameters() {
        let route = lookup(1).unwrap();
        assert_eq!(route.channel_id, 8);
        assert_eq!(route.fee_gwei, 1.5);
        assert_eq!(route.source, ChainTag::Sepolia);
        assert_eq!(route.receiver, ReceiverKind::FixedAddress);
        assert!(!route.multiplex);
        assert_eq!(route.quote_token.len(), 20);
    }

    #[test]
    fn only_sei_routes_are_multiplexed() {
        let multiplexed: Vec<u8> = all()
            .iter()
            .filter(|r| r.multiplex)
            .map(|r| r.id)
            .collect();
        assert_eq!(multiplexed, vec![8, 9]);
    }

    #[test]
    fn layout_constants_per_variant() {
        let fixed = ReceiverKind::FixedAddress.layout();
        assert_eq!(fixed.tail_len, 704);
        assert_eq!(fixed.quote, 640);
        assert_eq!(fixed.second_block, 896);

        let prefixed = ReceiverKind::LengthPrefixed(DestFamily::Xion).layout();
        assert_eq!(prefixed.tail_len, 768);
        assert_eq!(prefixed.quote, 672);
        assert_eq!(prefixed.second_block, 960);
        assert_eq!(prefixed.receiver_slot, 64);
    }

    #[test]
    fn bech32_quote_tokens_have_expected_lengths() {
        // Babylon addresses are 62 bytes, Xion addresses 63
        assert_eq!(lookup(2).unwrap().quote_token.len(), 62);
        assert_eq!(lookup(4).unwrap().quote_token.len(), 63);
        assert_eq!(lookup(9).unwrap().quote_token.len(), 62);
        assert_eq!(lookup(10).unwrap().quote_token.len(), 63);
    }

    #[test]
    fn amount_conversion_to_base_units() {
        let route = lookup(1).unwrap();
        assert_eq!(
            route.amount_base_units(None).unwrap(),
            U256::from(100_000_000_000_000u64) // 0.0001 ether
        );
        assert_eq!(
            route.amount_base_units(Some(0.01)).unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert!(matches!(
            route.amount_base_units(Some(0.0)),
            Err(TransferError::InvalidAmount)
        ));
    }
}
