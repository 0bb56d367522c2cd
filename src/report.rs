use std::io::Write;
use std::time::Duration;

use alloy::consensus::Transaction as _;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::eth::{Block, Transaction};
use chrono::DateTime;
use log::debug;

use crate::client::EvmClient;
use crate::error::PeekError;

/// Flat pause between consecutive sender lookups, a courtesy to public
/// endpoints. Not adaptive.
pub const TX_LOOKUP_PACING: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct BlockSummary {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub miner: Address,
    pub tx_count: usize,
}

pub fn summarize_block(block: &Block) -> BlockSummary {
    BlockSummary {
        number: block.header.number,
        timestamp: block.header.timestamp,
        gas_limit: block.header.gas_limit,
        miner: block.header.beneficiary,
        tx_count: block.transactions.len(),
    }
}

#[derive(Debug)]
pub struct TxSummary {
    pub hash: B256,
    pub from: Address,
    /// None for contract-creation transactions.
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
}

pub fn summarize_transaction(tx: &Transaction, from: Address) -> TxSummary {
    TxSummary {
        hash: *tx.inner.tx_hash(),
        from,
        to: tx.inner.to(),
        value: tx.inner.value(),
        gas_limit: tx.inner.gas_limit(),
    }
}

fn render_timestamp(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| format!("{timestamp} (unix)"))
}

fn write_block<W: Write>(out: &mut W, summary: &BlockSummary) -> std::io::Result<()> {
    writeln!(out, "Latest block details:")?;
    writeln!(out, "Block number: {}", summary.number)?;
    writeln!(out, "Timestamp: {}", render_timestamp(summary.timestamp))?;
    writeln!(out, "Gas limit: {}", summary.gas_limit)?;
    writeln!(out, "Miner address: {}", summary.miner)
}

fn write_transaction<W: Write>(out: &mut W, summary: &TxSummary) -> std::io::Result<()> {
    writeln!(out, "Transaction Hash: {}", summary.hash)?;
    writeln!(out, "From: {}", summary.from)?;
    match summary.to {
        Some(to) => writeln!(out, "To: {to}")?,
        None => writeln!(out, "To: <none>")?,
    }
    writeln!(out, "Value: {}", summary.value)?;
    writeln!(out, "Gas Limit: {}", summary.gas_limit)
}

/// The one-shot phase: a fixed sequence of independent reads against current
/// remote state, printed as they arrive. Any failure aborts the whole run.
pub async fn run_report<W: Write>(
    client: &EvmClient,
    balance_address: Address,
    pacing: Duration,
    out: &mut W,
) -> Result<(), PeekError> {
    let block_number = client.latest_block_number().await?;
    writeln!(out, "Latest block number: {block_number}")?;

    let block = client
        .block_by_number(block_number)
        .await?
        .ok_or(PeekError::BlockNotFound(block_number))?;
    let summary = summarize_block(&block);
    write_block(out, &summary)?;

    writeln!(out, "Latest transactions in the block:")?;
    for (index, tx) in block.transactions.txns().enumerate() {
        let sender = client
            .transaction_sender(block.header.hash, index)
            .await?
            .ok_or(PeekError::TransactionNotFound {
                block: block.header.hash,
                index,
            })?;
        debug!("resolved sender of tx {index} in block {block_number}");
        write_transaction(out, &summarize_transaction(tx, sender))?;
        tokio::time::sleep(pacing).await;
    }

    let gas_price = client.gas_price().await?;
    writeln!(out, "Suggested gas price: {gas_price}")?;

    let network_id = client.network_id().await?;
    writeln!(out, "Network ID: {network_id}")?;

    let client_version = client.client_version().await?;
    writeln!(out, "Client Version: {client_version}")?;

    let balance = client.balance_of(balance_address).await?;
    writeln!(out, "Balance: {balance}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::consensus::transaction::Recovered;
    use alloy::consensus::{Header as ConsensusHeader, SignableTransaction, TxEnvelope, TxLegacy};
    use alloy::primitives::{Bytes, Signature, TxKind, U64, U128, address};
    use alloy::providers::mock::Asserter;
    use alloy::providers::{Provider, ProviderBuilder};
    use alloy::rpc::types::eth::{BlockTransactions, Header};

    const MINER: Address = address!("1f9090aaE28b8a3dCeaDf281B0F12828e676c326");
    const HOLDER: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    fn mocked_client(asserter: &Asserter) -> EvmClient {
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        EvmClient::from_provider(provider.erased())
    }

    fn test_block(number: u64, txs: Vec<Transaction>) -> Block {
        let inner = ConsensusHeader {
            number,
            timestamp: 1_700_000_000,
            gas_limit: 30_000_000,
            beneficiary: MINER,
            ..Default::default()
        };
        Block {
            header: Header {
                hash: B256::repeat_byte(0xab),
                inner,
                total_difficulty: None,
                size: None,
            },
            uncles: Vec::new(),
            transactions: BlockTransactions::Full(txs),
            withdrawals: None,
        }
    }

    fn test_tx(from: Address, to: Address, index: u64, block_number: u64) -> Transaction {
        let legacy = TxLegacy {
            chain_id: Some(1),
            nonce: index,
            gas_price: 2_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(to),
            value: U256::from(1_000u64),
            input: Bytes::new(),
        };
        let signature = Signature::new(U256::from(1), U256::from(1), false);
        let envelope = TxEnvelope::Legacy(legacy.into_signed(signature));
        Transaction {
            inner: Recovered::new_unchecked(envelope, from),
            block_hash: Some(B256::repeat_byte(0xab)),
            block_number: Some(block_number),
            transaction_index: Some(index),
            effective_gas_price: None,
        }
    }

    fn push_tail_responses(asserter: &Asserter) {
        asserter.push_success(&U128::from(30_000_000_000u128));
        asserter.push_success(&U64::from(1u64));
        asserter.push_success(&"TestNode/v0.1.0");
        asserter.push_success(&U256::from(5u64));
    }

    #[tokio::test]
    async fn test_empty_block_report() {
        let asserter = Asserter::new();
        let client = mocked_client(&asserter);

        asserter.push_success(&U64::from(100u64));
        asserter.push_success(&test_block(100, vec![]));
        push_tail_responses(&asserter);

        let mut out = Vec::new();
        run_report(&client, HOLDER, Duration::ZERO, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Latest block number: 100"));
        assert!(text.contains("Block number: 100"));
        assert!(!text.contains("Transaction Hash:"));
        assert!(text.contains("Suggested gas price: 30000000000"));
        assert!(text.contains("Network ID: 1"));
        assert!(text.contains("Client Version: TestNode/v0.1.0"));
        assert!(text.contains("Balance: 5"));

        // the block lines come before the chain-level stats
        let block_at = text.find("Latest block number").unwrap();
        let gas_at = text.find("Suggested gas price").unwrap();
        assert!(block_at < gas_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sender_lookups_are_paced() {
        let asserter = Asserter::new();
        let client = mocked_client(&asserter);

        let alice = address!("0000000000000000000000000000000000000a11");
        let bob = address!("0000000000000000000000000000000000000b0b");
        let tx0 = test_tx(alice, HOLDER, 0, 100);
        let tx1 = test_tx(bob, HOLDER, 1, 100);

        asserter.push_success(&U64::from(100u64));
        asserter.push_success(&test_block(100, vec![tx0.clone(), tx1.clone()]));
        asserter.push_success(&tx0);
        asserter.push_success(&tx1);
        push_tail_responses(&asserter);

        let pacing = Duration::from_secs(1);
        let started = tokio::time::Instant::now();
        let mut out = Vec::new();
        run_report(&client, HOLDER, pacing, &mut out).await.unwrap();
        assert!(started.elapsed() >= pacing * 2);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Transaction Hash:").count(), 2);
        let alice_at = text.find(&format!("From: {alice}")).unwrap();
        let bob_at = text.find(&format!("From: {bob}")).unwrap();
        assert!(alice_at < bob_at);
    }

    #[tokio::test]
    async fn test_contract_creation_has_no_recipient() {
        let mut tx = test_tx(HOLDER, MINER, 0, 1);
        let legacy = TxLegacy {
            chain_id: Some(1),
            nonce: 0,
            gas_price: 2_000_000_000,
            gas_limit: 500_000,
            to: TxKind::Create,
            value: U256::ZERO,
            input: Bytes::from(vec![0x60, 0x60]),
        };
        let signature = Signature::new(U256::from(1), U256::from(1), false);
        tx.inner = Recovered::new_unchecked(TxEnvelope::Legacy(legacy.into_signed(signature)), HOLDER);

        let summary = summarize_transaction(&tx, HOLDER);
        assert_eq!(summary.to, None);

        let mut out = Vec::new();
        write_transaction(&mut out, &summary).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("To: <none>"));
    }

    #[test]
    fn test_summarize_block() {
        let block = test_block(42, vec![]);
        let summary = summarize_block(&block);
        assert_eq!(summary.number, 42);
        assert_eq!(summary.tx_count, 0);
        assert_eq!(summary.miner, MINER);
        assert_eq!(summary.gas_limit, 30_000_000);
    }

    #[test]
    fn test_render_timestamp() {
        assert_eq!(render_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }
}
