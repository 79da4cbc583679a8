//! End-to-end pipeline tests.
//!
//! Each test wires a monitor through `MonitorBuilder` over an in-memory feed,
//! with the asset's real testnet contract id, and checks what reaches the
//! reporter.

use std::sync::Arc;
use std::time::Duration;

use supplywatch_core::{MemoryReporter, MonitorMode, StreamCursor};
use supplywatch_stellar::stellar_xdr::curr::{
    AccountId, ContractEvent, ContractEventBody, ContractEventType, ContractEventV0, ContractId,
    ExtensionPoint, Hash, Int128Parts, LedgerEntryChanges, Limits, OperationMetaV2, PublicKey,
    ScAddress, ScMap, ScMapEntry, ScString, ScSymbol, ScVal, StringM, TransactionMeta,
    TransactionMetaV4, Uint256, VecM, WriteXdr,
};
use supplywatch_stellar::{AssetIdentity, MemoryFeed, MonitorBuilder, Network, TransactionRecord};
use tokio_util::sync::CancellationToken;

const FIFO: &str = "fifo:GC66GVXUBUONBFLHFA7QBB2RU7HK3XT5AYM5ZZSIIG2XCYDGHXRDKUKE";

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn sym(s: &str) -> ScVal {
    ScVal::Symbol(ScSymbol(StringM::try_from(s).unwrap()))
}

fn i128(v: i128) -> ScVal {
    ScVal::I128(Int128Parts {
        hi: (v >> 64) as i64,
        lo: v as u64,
    })
}

fn holder() -> ScVal {
    ScVal::Address(ScAddress::Account(AccountId(
        PublicKey::PublicKeyTypeEd25519(Uint256([0xaa; 32])),
    )))
}

fn fifo_contract_id() -> [u8; 32] {
    AssetIdentity::parse(FIFO)
        .unwrap()
        .contract_id(&Network::Testnet)
        .unwrap()
}

fn event(contract_id: [u8; 32], kind: &str, asset: &str, data: ScVal) -> ContractEvent {
    let asset = ScVal::String(ScString(StringM::try_from(asset).unwrap()));
    ContractEvent {
        ext: ExtensionPoint::V0,
        contract_id: Some(ContractId(Hash(contract_id))),
        type_: ContractEventType::Contract,
        body: ContractEventBody::V0(ContractEventV0 {
            topics: vec![sym(kind), holder(), asset].try_into().unwrap(),
            data,
        }),
    }
}

fn tx(hash: &str, operations: Vec<Vec<ContractEvent>>) -> TransactionRecord {
    let operations: Vec<OperationMetaV2> = operations
        .into_iter()
        .map(|events| OperationMetaV2 {
            ext: ExtensionPoint::V0,
            changes: LedgerEntryChanges(VecM::default()),
            events: events.try_into().unwrap(),
        })
        .collect();
    let meta = TransactionMeta::V4(TransactionMetaV4 {
        ext: ExtensionPoint::V0,
        tx_changes_before: LedgerEntryChanges(VecM::default()),
        operations: operations.try_into().unwrap(),
        tx_changes_after: LedgerEntryChanges(VecM::default()),
        soroban_meta: None,
        events: VecM::default(),
        diagnostic_events: VecM::default(),
    });
    TransactionRecord {
        hash: hash.into(),
        ledger: 0,
        successful: true,
        paging_token: String::new(),
        result_meta_xdr: Some(meta.to_xdr_base64(Limits::none()).unwrap()),
    }
}

fn builder() -> MonitorBuilder {
    MonitorBuilder::new()
        .asset(FIFO)
        .network(Network::Testnet)
        .ledger_delay_ms(0)
        .error_delay_ms(1)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn historical_replay_accumulates_supply() {
    let id = fifo_contract_id();
    let feed = Arc::new(MemoryFeed::new());
    feed.insert_ledger(
        593_231,
        vec![tx(
            "mint-tx",
            vec![vec![event(id, "mint", FIFO, i128(1_000_000_000))]],
        )],
    );
    feed.insert_ledger(
        593_232,
        vec![
            tx("burn-tx", vec![vec![event(id, "burn", FIFO, i128(2_500_000))]]),
            tx(
                "claw-tx",
                vec![vec![], vec![event(id, "clawback", FIFO, i128(500_000))]],
            ),
        ],
    );

    let reporter = MemoryReporter::new();
    let mut monitor = builder()
        .mode(MonitorMode::Historical)
        .start_ledger(593_231)
        .end_ledger(593_232)
        .build_with_feed(feed, Box::new(reporter.clone()), CancellationToken::new())
        .unwrap();
    let outcome = monitor.run().await;

    assert_eq!(outcome.supply.formatted, "99.7");
    assert_eq!(outcome.supply.stats.mints, 1);
    assert_eq!(outcome.supply.stats.burns, 1);
    assert_eq!(outcome.supply.stats.clawbacks, 1);

    let recorded = reporter.recorded();
    let summary = recorded.summary.unwrap();
    assert_eq!(summary.contract_id, "CDWZDP4EYF75ZV6EEMDJJTJNK3TWNMLE6TGTVBIA3HS4BJUIRHJ3MLMG");
    assert_eq!(summary.network, Network::TESTNET_PASSPHRASE);

    let supplies: Vec<_> = recorded.ledgers.iter().map(|l| l.supply.as_str()).collect();
    assert_eq!(supplies, vec!["100", "99.7"]);
    let hashes: Vec<_> = recorded.events.iter().map(|e| e.tx_hash.as_str()).collect();
    assert_eq!(hashes, vec!["mint-tx", "burn-tx", "claw-tx"]);
}

#[tokio::test]
async fn foreign_and_mislabelled_events_are_ignored() {
    let id = fifo_contract_id();
    let mut other = id;
    other[31] ^= 1;

    let feed = Arc::new(MemoryFeed::new());
    feed.insert_ledger(
        1,
        vec![tx(
            "t",
            vec![vec![
                event(other, "mint", FIFO, i128(10_000_000)),
                event(id, "mint", "USDC:GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN", i128(10_000_000)),
                event(id, "mint", FIFO, i128(20_000_000)),
            ]],
        )],
    );

    let reporter = MemoryReporter::new();
    let outcome = builder()
        .mode(MonitorMode::Historical)
        .start_ledger(1)
        .end_ledger(1)
        .build_with_feed(feed, Box::new(reporter.clone()), CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert_eq!(outcome.supply.formatted, "2");
    assert_eq!(reporter.recorded().events.len(), 1);
}

#[tokio::test]
async fn muxed_transfer_style_map_amount_is_used() {
    let id = fifo_contract_id();
    let data = ScVal::Map(Some(ScMap(
        vec![
            ScMapEntry {
                key: sym("amount"),
                val: i128(42),
            },
            ScMapEntry {
                key: sym("to_muxed_id"),
                val: ScVal::U64(7),
            },
        ]
        .try_into()
        .unwrap(),
    )));

    let feed = Arc::new(MemoryFeed::new());
    feed.insert_ledger(9, vec![tx("t", vec![vec![event(id, "mint", FIFO, data)]])]);

    let reporter = MemoryReporter::new();
    let outcome = builder()
        .mode(MonitorMode::Historical)
        .start_ledger(9)
        .end_ledger(9)
        .build_with_feed(feed, Box::new(reporter.clone()), CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert_eq!(outcome.supply.stroops, "42");
    assert_eq!(reporter.recorded().events[0].amount, "42");
}

#[tokio::test]
async fn streaming_processes_notified_ledgers_until_shutdown() {
    let id = fifo_contract_id();
    let feed = Arc::new(MemoryFeed::new());
    feed.insert_ledger(50, vec![]);
    feed.insert_ledger(51, vec![tx("a", vec![vec![event(id, "mint", FIFO, i128(30_000_000))]])]);
    feed.insert_ledger(52, vec![tx("b", vec![vec![event(id, "burn", FIFO, i128(10_000_000))]])]);
    feed.queue_stream(&[51, 52]);
    feed.fail_next(52, 1);

    let reporter = MemoryReporter::new();
    let token = CancellationToken::new();
    {
        let reporter = reporter.clone();
        let token = token.clone();
        tokio::spawn(async move {
            while reporter.ledgers().len() < 2 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            token.cancel();
        });
    }

    let outcome = builder()
        .mode(MonitorMode::Streaming)
        .start_ledger(50)
        .build_with_feed(feed.clone(), Box::new(reporter.clone()), token)
        .unwrap()
        .run()
        .await;

    assert_eq!(
        feed.subscriptions(),
        vec![StreamCursor::token(MemoryFeed::paging_token(50))]
    );
    assert_eq!(reporter.ledgers(), vec![51, 52]);
    assert_eq!(feed.fetches(), vec![51, 52, 52]);
    assert_eq!(outcome.supply.formatted, "2");
}
