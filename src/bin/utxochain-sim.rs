#![forbid(unsafe_code)]
//! Deterministic ledger simulation: participants pay each other, blocks are
//! assembled from the pending pool, and competing blocks are mined on older
//! nodes to exercise forks and pruning.

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};
use utxochain::blockchain::{Block, ChainIndex};
use utxochain::config::load_config;
use utxochain::crypto::KeyPair;
use utxochain::transaction::Transaction;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults apply if it is missing)
    #[arg(long, default_value = "config.toml")]
    config: String,
    /// Number of blocks to mine on the best branch
    #[arg(long, default_value_t = 30)]
    blocks: u64,
    /// Every N rounds, mine a competing block on a retained node up to
    /// cutoff_age + 1 blocks below the best height (0 disables forks)
    #[arg(long, default_value_t = 5)]
    fork_every: u64,
    /// Number of simulated participants
    #[arg(long, default_value_t = 4)]
    participants: usize,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    best_height: u64,
    best_block: String,
    retained_nodes: usize,
    pending_transactions: usize,
    blocks_accepted: u64,
    blocks_rejected: u64,
    transactions_confirmed: usize,
    utxo_count: usize,
    total_value: i128,
}

fn keypair_from_rng(rng: &mut StdRng) -> KeyPair {
    loop {
        let secret: [u8; 32] = rng.gen();
        if let Ok(keypair) = KeyPair::from_secret_bytes(&secret) {
            return keypair;
        }
    }
}

/// Queues a payment from `payer` to `payee` using one of the payer's outputs
/// on the best branch, returning change to the payer.
fn queue_payment(
    chain: &mut ChainIndex,
    rng: &mut StdRng,
    payer: &KeyPair,
    payee: &KeyPair,
    nonce: u64,
) -> Result<bool, Box<dyn std::error::Error>> {
    let owned = chain.get_max_height_snapshot().owned_by(&payer.owner_key());
    let Some((outpoint, output)) = owned.first().cloned() else {
        return Ok(false);
    };
    if output.value == 0 {
        return Ok(false);
    }

    let amount = rng.gen_range(1..=output.value);
    let mut tx = Transaction::new(nonce);
    tx.add_input(outpoint);
    tx.add_output(amount, payee.owner_key());
    if amount < output.value {
        tx.add_output(output.value - amount, payer.owner_key());
    }
    tx.sign_with(0, payer)?;
    Ok(chain.add_transaction(tx))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level()?)
        .init();

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let participants: Vec<KeyPair> = (0..cli.participants.max(2))
        .map(|_| keypair_from_rng(&mut rng))
        .collect();
    let reward = config.simulation.block_reward;

    let genesis = Block::genesis(Transaction::coinbase(reward, participants[0].owner_key(), 0));
    let mut chain = ChainIndex::new(genesis, config.chain.cutoff_age);
    info!(
        cutoff_age = chain.cutoff_age(),
        participants = participants.len(),
        "starting simulation"
    );

    let mut summary = Summary::default();
    let mut nonce = 0u64;
    for round in 1..=cli.blocks {
        for _ in 0..rng.gen_range(1..=3) {
            let payer = &participants[rng.gen_range(0..participants.len())];
            let payee = &participants[rng.gen_range(0..participants.len())];
            nonce += 1;
            if !queue_payment(&mut chain, &mut rng, payer, payee, nonce)? {
                debug!(round, "payer had nothing to spend");
            }
        }

        let miner = &participants[rng.gen_range(0..participants.len())];
        nonce += 1;
        let block = chain.assemble_block(miner.owner_key(), reward, nonce);
        let confirmed = block.transactions.len();
        match chain.try_add_block(block) {
            Ok(_) => {
                summary.blocks_accepted += 1;
                summary.transactions_confirmed += confirmed;
            }
            Err(reason) => {
                warn!(round, %reason, "assembled block rejected");
                summary.blocks_rejected += 1;
            }
        }

        if cli.fork_every > 0 && round % cli.fork_every == 0 {
            let depth = rng.gen_range(0..chain.cutoff_age() + 2);
            let target = chain.best_height().saturating_sub(depth);
            // Lowest identity at the target height keeps seeded runs repeatable.
            let Some(parent) = chain
                .nodes()
                .filter(|(_, node)| node.height == target)
                .map(|(id, _)| *id)
                .min()
            else {
                debug!(round, target, "no retained node at rival height");
                continue;
            };
            nonce += 1;
            let rival = Block::new(parent, vec![], Transaction::coinbase(reward, miner.owner_key(), nonce));
            match chain.try_add_block(rival) {
                Ok(id) => {
                    debug!(round, block = %hex::encode(id), "rival block attached");
                    summary.blocks_accepted += 1;
                }
                Err(reason) => {
                    debug!(round, %reason, "rival block rejected");
                    summary.blocks_rejected += 1;
                }
            }
        }
    }

    let snapshot = chain.get_max_height_snapshot();
    summary.best_height = chain.best_height();
    summary.best_block = hex::encode(chain.best_block_id());
    summary.retained_nodes = chain.node_count();
    summary.pending_transactions = chain.get_pending_pool().len();
    summary.utxo_count = snapshot.len();
    summary.total_value = snapshot.total_value();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("best height          {}", summary.best_height);
        println!("best block           {}", summary.best_block);
        println!("retained nodes       {}", summary.retained_nodes);
        println!("pending transactions {}", summary.pending_transactions);
        println!("blocks accepted      {}", summary.blocks_accepted);
        println!("blocks rejected      {}", summary.blocks_rejected);
        println!("txs confirmed        {}", summary.transactions_confirmed);
        println!("unspent outputs      {}", summary.utxo_count);
        println!("total value          {}", summary.total_value);
    }
    Ok(())
}
