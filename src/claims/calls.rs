//! On-chain call shapes for redemption.
//!
//! Positions live in the Polymarket proxy wallet, so every redeem is wrapped
//! in a `ProxyWalletFactory.proxy(ProxyCall[])` call; one relayer submission
//! can then carry several redeems.

use alloy::primitives::{address, Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use thiserror::Error;

use crate::models::ClaimablePosition;

/// Conditional Tokens Framework on Polygon.
pub const CTF_ADDRESS: Address = address!("4D97DCd97eC945f40cF65F87097ACe5EA0476045");
/// USDC.e collateral.
pub const USDC_ADDRESS: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
pub const NEG_RISK_ADAPTER_ADDRESS: Address = address!("d91E80cF2E7be2e162c6513ceD06f1dD0dA35296");

/// Redeems per relayer submission.
pub const MAX_BATCH_SIZE: usize = 8;

sol! {
    #[derive(Debug)]
    enum CallType {
        Invalid,
        Call,
        DelegateCall,
    }

    /// Field order matches the factory's Solidity struct.
    #[derive(Debug)]
    struct ProxyCall {
        CallType typeCode;
        address to;
        uint256 value;
        bytes data;
    }

    interface IProxyWalletFactory {
        function proxy(ProxyCall[] memory calls) external payable returns (bytes[] memory returnValues);
    }

    interface IConditionalTokens {
        function redeemPositions(
            address collateralToken,
            bytes32 parentCollectionId,
            bytes32 conditionId,
            uint256[] calldata indexSets
        ) external;
    }

    interface INegRiskAdapter {
        function redeemPositions(bytes32 conditionId, uint256[] calldata amounts) external;
    }
}

#[derive(Debug, Error)]
#[error("invalid condition id: {0}")]
pub struct InvalidConditionId(pub String);

/// One encoded redeem, addressed to the contract that settles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemCall {
    pub condition_id: String,
    pub to: Address,
    pub data: Bytes,
}

/// Build the redeem for a position: the CTF path with index sets [1, 2], or
/// the neg-risk adapter with max amounts for both outcomes.
pub fn redeem_call(position: &ClaimablePosition) -> Result<RedeemCall, InvalidConditionId> {
    let condition_id: B256 = position
        .condition_id
        .parse()
        .map_err(|_| InvalidConditionId(position.condition_id.clone()))?;

    let (to, data) = if position.negative_risk {
        let call = INegRiskAdapter::redeemPositionsCall {
            conditionId: condition_id,
            amounts: vec![U256::MAX, U256::MAX],
        };
        (NEG_RISK_ADAPTER_ADDRESS, call.abi_encode())
    } else {
        let call = IConditionalTokens::redeemPositionsCall {
            collateralToken: USDC_ADDRESS,
            parentCollectionId: B256::ZERO,
            conditionId: condition_id,
            indexSets: vec![U256::from(1), U256::from(2)],
        };
        (CTF_ADDRESS, call.abi_encode())
    };

    Ok(RedeemCall {
        condition_id: position.condition_id.clone(),
        to,
        data: Bytes::from(data),
    })
}

/// Encode redeems as a single proxy-factory call.
pub fn encode_batch(calls: &[RedeemCall]) -> Bytes {
    let proxy_calls = calls
        .iter()
        .map(|c| ProxyCall {
            typeCode: CallType::Call,
            to: c.to,
            value: U256::ZERO,
            data: c.data.clone(),
        })
        .collect();

    Bytes::from(IProxyWalletFactory::proxyCall { calls: proxy_calls }.abi_encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn position(condition_id: &str, negative_risk: bool) -> ClaimablePosition {
        ClaimablePosition {
            condition_id: condition_id.into(),
            slug: None,
            title: None,
            outcome: Some("Yes".into()),
            size: Decimal::from(10),
            avg_price: Decimal::new(5, 1),
            cur_price: Decimal::ONE,
            current_value: Decimal::from(10),
            realized_pnl: Decimal::ZERO,
            negative_risk,
            redeemable: true,
        }
    }

    const CONDITION: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn standard_redeem_targets_ctf() {
        let call = redeem_call(&position(CONDITION, false)).unwrap();
        assert_eq!(call.to, CTF_ADDRESS);

        let decoded = IConditionalTokens::redeemPositionsCall::abi_decode(&call.data).unwrap();
        assert_eq!(decoded.collateralToken, USDC_ADDRESS);
        assert_eq!(decoded.indexSets, vec![U256::from(1), U256::from(2)]);
    }

    #[test]
    fn neg_risk_redeem_targets_adapter() {
        let call = redeem_call(&position(CONDITION, true)).unwrap();
        assert_eq!(call.to, NEG_RISK_ADAPTER_ADDRESS);

        let decoded = INegRiskAdapter::redeemPositionsCall::abi_decode(&call.data).unwrap();
        assert_eq!(decoded.amounts, vec![U256::MAX, U256::MAX]);
    }

    #[test]
    fn malformed_condition_id_rejected() {
        assert!(redeem_call(&position("not-a-hash", false)).is_err());
    }

    #[test]
    fn batch_wraps_every_call() {
        let calls: Vec<_> = [false, true, false]
            .iter()
            .map(|nr| redeem_call(&position(CONDITION, *nr)).unwrap())
            .collect();

        let data = encode_batch(&calls);
        let decoded = IProxyWalletFactory::proxyCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.calls.len(), 3);
        assert_eq!(decoded.calls[1].to, NEG_RISK_ADAPTER_ADDRESS);
    }
}
