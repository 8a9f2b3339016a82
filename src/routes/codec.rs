// Instruction codec
// Builds the ABI-tuple-shaped operand bytes for a route and amount, and the
// UCS03 `send` calldata wrapping the finished instruction

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};

use crate::encode::{address_field, ascii_field, raw_field, word, word_u64};
use crate::errors::TransferError;
use crate::routes::registry::{ReceiverKind, Route, BASE_TOKEN, SOURCE_DECIMALS, UCS03_ROUTER};

/// Wire version of every emitted instruction.
pub const INSTRUCTION_VERSION: u8 = 0;
/// Opcode for a token-transfer batch.
pub const INSTRUCTION_OPCODE: u8 = 2;

sol! {
    struct Ucs03Instruction {
        uint8 version;
        uint8 opcode;
        bytes operand;
    }

    function send(
        uint32 channelId,
        uint64 timeoutHeight,
        uint64 timeoutTimestamp,
        bytes32 salt,
        Ucs03Instruction instruction
    );
}

/// One transfer order, assembled per pipeline iteration. Destination
/// accounts are carried explicitly so the codec stays a pure function of
/// its inputs.
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub route: &'a Route,
    pub sender: Address,
    pub xion_account: &'a str,
    pub babylon_account: &'a str,
    pub amount_base_units: U256,
}

impl TransferRequest<'_> {
    fn receiver_account(&self, kind: &ReceiverKind) -> Option<&str> {
        match kind {
            ReceiverKind::FixedAddress => None,
            ReceiverKind::LengthPrefixed(family) => Some(match family {
                crate::routes::registry::DestFamily::Xion => self.xion_account,
                crate::routes::registry::DestFamily::Babylon => self.babylon_account,
            }),
        }
    }
}

/// Typed instruction value, consumed exactly once by the pipeline's send
/// step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub version: u8,
    pub opcode: u8,
    pub operand: Bytes,
}

/// Build the instruction for a transfer request. Deterministic; a given
/// `(route, amount)` pair always yields byte-identical operands.
pub fn build_instruction(request: &TransferRequest<'_>) -> Result<Instruction, TransferError> {
    if request.amount_base_units.is_zero() {
        return Err(TransferError::InvalidAmount);
    }

    let route = request.route;
    let layout = route.receiver.layout();

    let mut operand = String::new();
    operand.push_str(&word_u64(32));
    if route.multiplex {
        // Batch of two chained instructions: the second hop routes the
        // already-bridged asset, so its amount legs are zero.
        operand.push_str(&word_u64(2));
        operand.push_str(&word_u64(64));
        operand.push_str(&word_u64(layout.second_block));
        operand.push_str(&instruction_block(request, request.amount_base_units)?);
        operand.push_str(&instruction_block(request, U256::ZERO)?);
    } else {
        operand.push_str(&word_u64(1));
        operand.push_str(&word_u64(32));
        operand.push_str(&instruction_block(request, request.amount_base_units)?);
    }

    let operand = hex::decode(&operand)
        .map_err(|e| TransferError::Configuration(format!("operand assembly: {e}")))?;

    Ok(Instruction {
        version: INSTRUCTION_VERSION,
        opcode: INSTRUCTION_OPCODE,
        operand: operand.into(),
    })
}

/// One instruction block: head words with the layout's precomputed offsets
/// and the two amount legs, followed by the length-prefixed field tail.
fn instruction_block(
    request: &TransferRequest<'_>,
    amount: U256,
) -> Result<String, TransferError> {
    let route = request.route;
    let layout = route.receiver.layout();

    let mut block = String::new();
    for head in [1, 3, 96, layout.tail_len, layout.sender, layout.receiver, layout.base_token] {
        block.push_str(&word_u64(head));
    }
    block.push_str(&word(amount));
    block.push_str(&word_u64(layout.symbol));
    block.push_str(&word_u64(layout.name));
    block.push_str(&word_u64(SOURCE_DECIMALS));
    block.push_str(&word_u64(0));
    block.push_str(&word_u64(layout.quote));
    block.push_str(&word(amount));

    // sender
    block.push_str(&word_u64(Address::len_bytes() as u64));
    block.push_str(&address_field(&request.sender));

    // receiver: the sender's own address on EVM destinations, a bech32
    // account string otherwise
    match request.receiver_account(&route.receiver) {
        None => {
            block.push_str(&word_u64(Address::len_bytes() as u64));
            block.push_str(&address_field(&request.sender));
        }
        Some(account) => {
            block.push_str(&word_u64(account.len() as u64));
            block.push_str(&ascii_field(account, layout.receiver_slot, "receiver")?);
        }
    }

    // source asset identity
    block.push_str(&word_u64(Address::len_bytes() as u64));
    block.push_str(&address_field(&BASE_TOKEN));
    block.push_str(&word_u64(route.symbol.len() as u64));
    block.push_str(&ascii_field(route.symbol, 32, "symbol")?);
    block.push_str(&word_u64(route.name.len() as u64));
    block.push_str(&ascii_field(route.name, 32, "name")?);

    // destination quote token
    block.push_str(&word_u64(route.quote_token.len() as u64));
    block.push_str(&raw_field(route.quote_token, layout.quote_slot, "quote_token")?);

    Ok(block)
}

/// ABI-encode the UCS03 `send` call carrying a finished instruction.
pub fn send_calldata(
    channel_id: u32,
    timeout_height: u64,
    timeout_timestamp: u64,
    salt: B256,
    instruction: &Instruction,
) -> Bytes {
    let call = sendCall {
        channelId: channel_id,
        timeoutHeight: timeout_height,
        timeoutTimestamp: timeout_timestamp,
        salt,
        instruction: Ucs03Instruction {
            version: instruction.version,
            opcode: instruction.opcode,
            operand: instruction.operand.clone(),
        },
    };
    call.abi_encode().into()
}

/// The router the calldata is addressed to.
pub fn router_address() -> Address {
    UCS03_ROUTER
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::registry::{lookup, DestFamily};
    use alloy_primitives::{address, keccak256};

    const SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const XION: &str = "xion1h746ddyk9c9yh4fccuzkcmep89wmk5n5zkw757273mqcmuemc38s2xtmtf";
    const BABYLON: &str = "bbn1hw309nlveyrnvnydsrwrmhkmdpjr3vhjmtrvdk";

    fn request(route_id: u8, amount: u64) -> TransferRequest<'static> {
        TransferRequest {
            route: lookup(route_id).unwrap(),
            sender: SENDER,
            xion_account: XION,
            babylon_account: BABYLON,
            amount_base_units: U256::from(amount),
        }
    }

    #[test]
    fn sepolia_to_holesky_operand_matches_reference_bytes() {
        // 0.0001 ether in wei
        let instruction = build_instruction(&request(1, 100_000_000_000_000)).unwrap();
        assert_eq!(instruction.version, 0);
        assert_eq!(instruction.opcode, 2);
        let expected = concat!(
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "0000000000000000000000000000000000000000000000000000000000000060",
            "00000000000000000000000000000000000000000000000000000000000002c0",
            "0000000000000000000000000000000000000000000000000000000000000140",
            "0000000000000000000000000000000000000000000000000000000000000180",
            "00000000000000000000000000000000000000000000000000000000000001c0",
            "00000000000000000000000000000000000000000000000000005af3107a4000",
            "0000000000000000000000000000000000000000000000000000000000000200",
            "0000000000000000000000000000000000000000000000000000000000000240",
            "0000000000000000000000000000000000000000000000000000000000000012",
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000280",
            "00000000000000000000000000000000000000000000000000005af3107a4000",
            "0000000000000000000000000000000000000000000000000000000000000014",
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000014",
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000014",
            "eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "4554480000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000005",
            "4574686572000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000014",
            "92b3bc0bc3ac0ee60b04a0bbc4a09deb3914c886000000000000000000000000",
        );
        assert_eq!(hex::encode(&instruction.operand), expected);
    }

    #[test]
    fn encoding_is_deterministic() {
        for id in 1..=12 {
            let a = build_instruction(&request(id, 42_000_000)).unwrap();
            let b = build_instruction(&request(id, 42_000_000)).unwrap();
            assert_eq!(a.operand, b.operand, "route {id}");
        }
    }

    #[test]
    fn operand_length_is_fixed_per_route() {
        // Same route, different amounts: identical layout, identical length.
        let small = build_instruction(&request(5, 1)).unwrap();
        let large = build_instruction(&request(5, u64::MAX)).unwrap();
        assert_eq!(small.operand.len(), large.operand.len());
    }

    #[test]
    fn multiplex_head_declares_two_instructions() {
        let instruction = build_instruction(&request(9, 10_000_000_000_000_000)).unwrap();
        let operand = hex::encode(&instruction.operand);
        // outer head: batch offset, count=2, first offset, second offset
        assert_eq!(&operand[64..128], &crate::encode::word_u64(2));
        assert_eq!(&operand[128..192], &crate::encode::word_u64(64));
        assert_eq!(&operand[192..256], &crate::encode::word_u64(960));
    }

    #[test]
    fn multiplex_tail_is_two_single_tails() {
        // The concatenated multiplex tail equals two single-instruction
        // tails: len(multi) - 4 head words == 2 * (len(single) - 3 head words)
        let single = build_instruction(&request(6, 1_000)).unwrap();
        let multi = build_instruction(&request(9, 1_000)).unwrap();
        assert_eq!(multi.operand.len() - 128, 2 * (single.operand.len() - 96));

        let single_fixed = build_instruction(&request(7, 1_000)).unwrap();
        let multi_fixed = build_instruction(&request(8, 1_000)).unwrap();
        assert_eq!(
            multi_fixed.operand.len() - 128,
            2 * (single_fixed.operand.len() - 96)
        );
    }

    #[test]
    fn multiplex_second_leg_amounts_are_zero() {
        let amount = 5_000_000_000u64;
        let instruction = build_instruction(&request(8, amount)).unwrap();
        let operand = hex::encode(&instruction.operand);
        let amount_word = word(U256::from(amount));
        // first block carries the amount twice, second block never
        let occurrences = operand.matches(&amount_word).count();
        assert_eq!(occurrences, 2);
        // block offsets are relative to the batch body, 64 bytes in
        let second_block = &operand[(64 + 896) * 2..];
        assert!(!second_block.contains(&amount_word));
    }

    #[test]
    fn zero_amount_is_rejected_with_no_output() {
        assert!(matches!(
            build_instruction(&request(1, 0)),
            Err(TransferError::InvalidAmount)
        ));
    }

    #[test]
    fn oversized_receiver_fails_field_too_long() {
        let long = "x".repeat(80);
        let route = lookup(4).unwrap();
        assert_eq!(
            route.receiver,
            ReceiverKind::LengthPrefixed(DestFamily::Xion)
        );
        let request = TransferRequest {
            route,
            sender: SENDER,
            xion_account: &long,
            babylon_account: BABYLON,
            amount_base_units: U256::from(1u64),
        };
        assert!(matches!(
            build_instruction(&request),
            Err(TransferError::FieldTooLong { field: "receiver", .. })
        ));
    }

    #[test]
    fn send_calldata_uses_router_selector() {
        let instruction = build_instruction(&request(1, 1_000)).unwrap();
        let data = send_calldata(8, 0, 1_234, B256::ZERO, &instruction);
        let selector =
            &keccak256("send(uint32,uint64,uint64,bytes32,(uint8,uint8,bytes))".as_bytes())[..4];
        assert_eq!(&data[..4], selector);
    }
}
