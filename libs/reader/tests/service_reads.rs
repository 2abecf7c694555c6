//! Service-level read behavior against a mock byte source: routing,
//! lifecycle, concurrent preloading, merging and cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use solreader::{
    Address, BinaryDataReader, BoundContract, CancellationToken, ChainReaderService, ReadOpts,
    ReaderConfig, ReaderError, ReaderResult,
};
use solreader_codec::{
    build_idl_account_codec, EncodingKind, Idl, RemoteCodec, StructValue, Value,
};

const IDL: &str = r#"{
    "accounts": [
        {
            "name": "AccountA",
            "type": {
                "kind": "struct",
                "fields": [{"name": "value", "type": "u64"}]
            }
        },
        {
            "name": "AccountB",
            "type": {
                "kind": "struct",
                "fields": [
                    {"name": "count", "type": "u32"},
                    {"name": "label", "type": "string"}
                ]
            }
        }
    ],
    "types": []
}"#;

fn address_a() -> Address {
    Address::new([1u8; 32])
}

fn address_b() -> Address {
    Address::new([2u8; 32])
}

fn account_a_value() -> Value {
    let mut s = StructValue::new("AccountA");
    s.insert("Value", Value::U64(42)).unwrap();
    Value::Struct(s)
}

fn account_b_value() -> Value {
    let mut s = StructValue::new("AccountB");
    s.insert("Count", Value::U32(7)).unwrap();
    s.insert("Label", Value::String("stored".into())).unwrap();
    Value::Struct(s)
}

fn encoded(account: &str, value: &Value) -> Vec<u8> {
    let idl = Idl::from_json(IDL).unwrap();
    let entry = build_idl_account_codec(&idl, EncodingKind::LittleEndian.builder()).unwrap();
    entry.encode(value, account).unwrap()
}

struct MockReader {
    payloads: Mutex<HashMap<Address, Vec<u8>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockReader {
    fn new(delay: Duration) -> Arc<Self> {
        let payloads = HashMap::from([
            (address_a(), encoded("AccountA", &account_a_value())),
            (address_b(), encoded("AccountB", &account_b_value())),
        ]);
        Arc::new(Self {
            payloads: Mutex::new(payloads),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BinaryDataReader for MockReader {
    async fn read_all(&self, address: Address, _opts: Option<&ReadOpts>) -> ReaderResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.payloads
            .lock()
            .get(&address)
            .cloned()
            .ok_or_else(|| ReaderError::read(format!("no account stored at {address}")))
    }
}

fn config() -> ReaderConfig {
    let json = serde_json::json!({
        "namespaces": {
            "contracts": {
                "methods": {
                    "readA": {
                        "idl": IDL,
                        "procedures": [
                            {"idl_account": "AccountA"}
                        ]
                    },
                    "readBoth": {
                        "idl": IDL,
                        "procedures": [
                            {
                                "idl_account": "AccountA",
                                "output_modifications": [
                                    {"type": "rename", "fields": {"Discriminator": "DiscriminatorA"}}
                                ]
                            },
                            {
                                "idl_account": "AccountB",
                                "output_modifications": [
                                    {"type": "rename", "fields": {"Discriminator": "DiscriminatorB"}}
                                ]
                            }
                        ]
                    }
                }
            }
        }
    });
    serde_json::from_value(json).unwrap()
}

fn started_service(reader: Arc<MockReader>) -> ChainReaderService {
    let service = ChainReaderService::new(reader, config()).unwrap();
    service
        .bind(&[
            BoundContract {
                name: "contracts.readA.0".into(),
                address: address_a().to_string(),
            },
            BoundContract {
                name: "contracts.readBoth.0".into(),
                address: address_a().to_string(),
            },
            BoundContract {
                name: "contracts.readBoth.1".into(),
                address: address_b().to_string(),
            },
        ])
        .unwrap();
    service.start().unwrap();
    service
}

#[tokio::test]
async fn single_procedure_read_decodes_the_account() {
    let reader = MockReader::new(Duration::ZERO);
    let service = started_service(Arc::clone(&reader));

    // account procedures accept call params but never consume them
    let params = Value::U64(9);
    let value = service
        .get_latest_value(
            CancellationToken::never(),
            "contracts",
            "readA",
            Some(&params),
        )
        .await
        .unwrap();

    let s = value.as_struct().unwrap();
    assert_eq!(s.get("Value"), Some(&Value::U64(42)));
    assert_eq!(reader.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn multi_procedure_reads_preload_concurrently() {
    let reader = MockReader::new(Duration::from_secs(1));
    let service = started_service(Arc::clone(&reader));

    let started = tokio::time::Instant::now();
    let value = service
        .get_latest_value(CancellationToken::never(), "contracts", "readBoth", None)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // one fetch per account, overlapped rather than sequential
    assert_eq!(reader.call_count(), 2);
    assert!(
        elapsed < Duration::from_millis(1500),
        "expected overlapped fetches, took {elapsed:?}"
    );

    let s = value.as_struct().unwrap();
    assert_eq!(s.get("Value"), Some(&Value::U64(42)));
    assert_eq!(s.get("Count"), Some(&Value::U32(7)));
    assert_eq!(s.get("Label"), Some(&Value::String("stored".into())));
    assert!(s.get("DiscriminatorA").is_some());
    assert!(s.get("DiscriminatorB").is_some());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_an_in_flight_fetch() {
    let reader = MockReader::new(Duration::from_millis(600));
    let service = started_service(reader);

    let (token, handle) = CancellationToken::new();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.cancel("shutdown requested");
    });

    let started = tokio::time::Instant::now();
    let err = service
        .get_latest_value(token, "contracts", "readA", None)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_cancelled());
    assert!(err.to_string().contains("shutdown requested"));
    assert!(
        elapsed < Duration::from_millis(600),
        "cancellation should beat the fetch, took {elapsed:?}"
    );
}

#[tokio::test]
async fn unknown_routing_keys_name_the_missing_key() {
    let service = started_service(MockReader::new(Duration::ZERO));

    let err = service
        .get_latest_value(CancellationToken::never(), "missing", "readA", None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_config());
    assert!(err.to_string().contains("missing"));

    let err = service
        .get_latest_value(CancellationToken::never(), "contracts", "nope", None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_config());
    assert!(err.to_string().contains("nope"));
}

#[tokio::test]
async fn lifecycle_is_idempotent_once() {
    let service = ChainReaderService::new(MockReader::new(Duration::ZERO), config()).unwrap();

    assert!(matches!(service.ready(), Err(ReaderError::NotStarted)));
    let err = service
        .get_latest_value(CancellationToken::never(), "contracts", "readA", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::NotStarted));

    service.start().unwrap();
    assert!(service.ready().is_ok());
    assert!(matches!(service.start(), Err(ReaderError::AlreadyStarted)));

    service.close().unwrap();
    assert!(matches!(service.close(), Err(ReaderError::AlreadyClosed)));
    assert!(matches!(service.ready(), Err(ReaderError::AlreadyClosed)));
    assert!(matches!(service.start(), Err(ReaderError::AlreadyClosed)));

    let report = service.health_report();
    assert!(matches!(
        report.get("ChainReaderService"),
        Some(Some(ReaderError::AlreadyClosed))
    ));
}

#[tokio::test]
async fn unbound_reads_fail_without_an_address() {
    let service = ChainReaderService::new(MockReader::new(Duration::ZERO), config()).unwrap();
    service.start().unwrap();

    let err = service
        .get_latest_value(CancellationToken::never(), "contracts", "readA", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::Unbound));
}

#[tokio::test]
async fn bind_rejects_malformed_names() {
    let service = ChainReaderService::new(MockReader::new(Duration::ZERO), config()).unwrap();

    let cases = [
        ("notdotted", "is not namespace.method.index"),
        ("contracts.readA.x", "non-numeric index"),
        ("contracts.readA.5", "indexes past"),
        ("missing.readA.0", "no namespace"),
    ];
    for (name, needle) in cases {
        let err = service
            .bind(&[BoundContract {
                name: name.into(),
                address: address_a().to_string(),
            }])
            .unwrap_err();
        assert!(err.is_invalid_config(), "{name}");
        assert!(err.to_string().contains(needle), "{name}: {err}");
    }

    let err = service
        .bind(&[BoundContract {
            name: "contracts.readA.0".into(),
            address: "0OIl-not-base58".into(),
        }])
        .unwrap_err();
    assert!(err.is_invalid_config());
}

#[tokio::test]
async fn merged_type_concatenates_contributor_fields() {
    let service = ChainReaderService::new(MockReader::new(Duration::ZERO), config()).unwrap();

    let ty = service
        .create_contract_type("contracts", "readBoth", false)
        .unwrap();
    let (name, fields) = ty.as_struct().unwrap();
    assert_eq!(name, "readBoth");

    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "DiscriminatorA",
            "Value",
            "DiscriminatorB",
            "Count",
            "Label"
        ]
    );
}

#[tokio::test]
async fn overlapping_merged_fields_are_a_config_error() {
    // two procedures over the same account collide on every field name
    let json = serde_json::json!({
        "namespaces": {
            "contracts": {
                "methods": {
                    "readTwice": {
                        "idl": IDL,
                        "procedures": [
                            {"idl_account": "AccountA"},
                            {"idl_account": "AccountA"}
                        ]
                    }
                }
            }
        }
    });
    let config: ReaderConfig = serde_json::from_value(json).unwrap();
    let service = ChainReaderService::new(MockReader::new(Duration::ZERO), config).unwrap();

    let err = service
        .create_contract_type("contracts", "readTwice", false)
        .unwrap_err();
    assert!(err.is_invalid_config());
    assert!(err.to_string().contains("Discriminator"));
}

#[tokio::test(start_paused = true)]
async fn a_failing_sibling_cancels_the_remaining_preloads() {
    let reader = MockReader::new(Duration::from_millis(100));
    // drop AccountA's payload so the first leg fails after its fetch
    reader.payloads.lock().remove(&address_a());
    let service = started_service(Arc::clone(&reader));

    let err = service
        .get_latest_value(CancellationToken::never(), "contracts", "readBoth", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::Read { .. }));
}
