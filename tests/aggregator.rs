use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};

use evm_portfolio_tracker::models::asset::NATIVE_KEY;
use evm_portfolio_tracker::{
    AggregationError, AssetDescriptor, BalanceSource, PortfolioAggregator, PriceSource, PriceTable,
    RawBalance,
};

const WALLET: &str = "0x35fA164735182de50811E8e2E824cFb9B6118ac2";
const WEETH: &str = "0x35fa164735182de50811e8e2e824cfb9b6118ac2";
const EETH: &str = "0xfe2e637202056d30016725477c5da089ab0a043a";

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn assets() -> Vec<AssetDescriptor> {
    vec![
        AssetDescriptor::native("Ethereum", "ETH", "ethereum", 18),
        AssetDescriptor::token("Wrapped eETH", "weETH", WEETH, "ether-fi-staked-eth", 18),
        AssetDescriptor::token("Ether.fi ETH", "eETH", EETH, "ether-fi", 18),
    ]
}

#[derive(Clone)]
enum Reply {
    Balance(&'static str),
    Rejected(&'static str),
    Transport(&'static str),
    Hang,
}

/// Sets `cancelled` when dropped before `finish` was called.
struct CompletionGuard {
    cancelled: Arc<AtomicUsize>,
    finished: bool,
}

impl CompletionGuard {
    fn new(cancelled: Arc<AtomicUsize>) -> Self {
        Self { cancelled, finished: false }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
struct MockBalances {
    replies: HashMap<String, (Reply, Duration)>,
    starts: Mutex<Vec<(String, Instant)>>,
    cancelled: Arc<AtomicUsize>,
}

impl MockBalances {
    fn reply(mut self, key: &str, reply: Reply) -> Self {
        self.replies.insert(key.to_string(), (reply, Duration::ZERO));
        self
    }

    fn reply_after(mut self, key: &str, reply: Reply, latency: Duration) -> Self {
        self.replies.insert(key.to_string(), (reply, latency));
        self
    }

    async fn respond(&self, key: &str, contract: Option<&str>) -> anyhow::Result<RawBalance> {
        self.starts.lock().unwrap().push((key.to_string(), Instant::now()));
        let guard = CompletionGuard::new(self.cancelled.clone());

        let (reply, latency) = self
            .replies
            .get(key)
            .cloned()
            .unwrap_or((Reply::Balance("0"), Duration::ZERO));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let contract = contract.map(str::to_string);
        let result = match reply {
            Reply::Balance(value) => Ok(RawBalance::ok(contract, value)),
            Reply::Rejected(message) => Ok(RawBalance::failed(contract, message)),
            Reply::Transport(message) => Err(anyhow::anyhow!(message)),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(RawBalance::ok(contract, "0"))
            }
        };
        guard.finish();
        result
    }
}

#[async_trait]
impl BalanceSource for MockBalances {
    async fn get_native_balance(&self, _address: &str) -> anyhow::Result<RawBalance> {
        self.respond(NATIVE_KEY, None).await
    }

    async fn get_token_balance(
        &self,
        _address: &str,
        contract_address: &str,
    ) -> anyhow::Result<RawBalance> {
        self.respond(&contract_address.to_ascii_lowercase(), Some(contract_address))
            .await
    }
}

#[derive(Default)]
struct MockPrices {
    table: PriceTable,
    fail: bool,
    latency: Duration,
    calls: Mutex<Vec<(BTreeSet<String>, String, Instant)>>,
    cancelled: Arc<AtomicUsize>,
}

impl MockPrices {
    fn with_prices(prices: &[(&str, &str)]) -> Self {
        let mut table = PriceTable::new();
        for (id, price) in prices {
            table.insert(*id, "usd", dec(price));
        }
        Self { table, ..Default::default() }
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn get_prices(
        &self,
        price_ids: &BTreeSet<String>,
        fiat_currency: &str,
    ) -> anyhow::Result<PriceTable> {
        self.calls
            .lock()
            .unwrap()
            .push((price_ids.clone(), fiat_currency.to_string(), Instant::now()));
        let guard = CompletionGuard::new(self.cancelled.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        guard.finish();

        if self.fail {
            anyhow::bail!("price service unavailable");
        }
        Ok(self.table.clone())
    }
}

fn aggregator(balances: &Arc<MockBalances>, prices: &Arc<MockPrices>) -> PortfolioAggregator {
    PortfolioAggregator::new(balances.clone(), prices.clone())
}

#[tokio::test]
async fn missing_price_zeroes_only_that_asset() {
    let balances = Arc::new(
        MockBalances::default()
            .reply(NATIVE_KEY, Reply::Balance("1500000000000000000"))
            .reply(WEETH, Reply::Balance("2000000000000000000"))
            .reply(EETH, Reply::Balance("3000000000000000000")),
    );
    let prices = Arc::new(MockPrices::with_prices(&[
        ("ethereum", "4000.10"),
        ("ether-fi-staked-eth", "4200.05"),
    ]));

    let snapshot = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap();

    let symbols: Vec<&str> = snapshot.valuations.iter().map(|v| v.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ETH", "weETH", "eETH"]);

    assert_eq!(snapshot.valuations[0].balance, dec("1.5"));
    assert_eq!(snapshot.valuations[0].fiat_value, dec("6000.15"));
    assert_eq!(snapshot.valuations[1].fiat_value, dec("8400.10"));
    assert_eq!(snapshot.valuations[2].balance, dec("3"));
    assert!(snapshot.valuations[2].fiat_value.is_zero());
    assert_eq!(snapshot.total_fiat_value, dec("14400.25"));
    assert_eq!(snapshot.fiat_currency, "usd");
    assert_eq!(snapshot.address, WALLET);
}

#[tokio::test]
async fn provider_rejection_aborts_whole_snapshot() {
    let balances = Arc::new(
        MockBalances::default()
            .reply(NATIVE_KEY, Reply::Balance("1000000000000000000"))
            .reply(WEETH, Reply::Rejected("NOTOK: Max rate limit reached"))
            .reply(EETH, Reply::Balance("1000000000000000000")),
    );
    let prices = Arc::new(MockPrices::with_prices(&[("ethereum", "4000")]));

    let err = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap_err();

    assert_eq!(err, AggregationError::new("weETH", "NOTOK: Max rate limit reached"));
    assert!(err.to_string().contains("weETH"));
}

#[tokio::test]
async fn transport_error_aborts_whole_snapshot() {
    let balances = Arc::new(
        MockBalances::default().reply(EETH, Reply::Transport("connection reset by peer")),
    );
    let prices = Arc::new(MockPrices::default());

    let err = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap_err();

    assert_eq!(err.asset, "eETH");
    assert!(err.message.contains("connection reset by peer"));
}

#[tokio::test]
async fn first_failure_in_list_order_is_reported() {
    // eETH fails immediately, weETH fails later; list order wins
    let balances = Arc::new(
        MockBalances::default()
            .reply_after(WEETH, Reply::Rejected("NOTOK"), Duration::from_millis(50))
            .reply(EETH, Reply::Transport("dns failure")),
    );
    let prices = Arc::new(MockPrices::default());

    let err = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap_err();

    assert_eq!(err.asset, "weETH");
}

#[tokio::test]
async fn hanging_balance_times_out() {
    let balances = Arc::new(MockBalances::default().reply(NATIVE_KEY, Reply::Hang));
    let prices = Arc::new(MockPrices::default());

    let started = Instant::now();
    let err = aggregator(&balances, &prices)
        .with_fetch_timeout(Duration::from_millis(50))
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap_err();

    assert_eq!(err, AggregationError::new("ETH", "timed out after 50ms"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn price_failure_is_never_fatal() {
    let balances = Arc::new(
        MockBalances::default()
            .reply(NATIVE_KEY, Reply::Balance("1000000000000000000"))
            .reply(WEETH, Reply::Balance("1000000000000000000")),
    );
    let prices = Arc::new(MockPrices { fail: true, ..Default::default() });

    let snapshot = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap();

    assert_eq!(snapshot.asset_count(), 3);
    assert_eq!(snapshot.valuations[0].balance, dec("1"));
    assert!(snapshot.valuations.iter().all(|v| v.fiat_value.is_zero()));
    assert!(snapshot.total_fiat_value.is_zero());
}

#[tokio::test]
async fn slow_price_fetch_times_out_to_zero_values() {
    let balances = Arc::new(MockBalances::default().reply(NATIVE_KEY, Reply::Balance("5")));
    let prices = Arc::new(MockPrices {
        latency: Duration::from_secs(3600),
        ..MockPrices::with_prices(&[("ethereum", "4000")])
    });

    let snapshot = aggregator(&balances, &prices)
        .with_fetch_timeout(Duration::from_millis(50))
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap();

    assert!(snapshot.total_fiat_value.is_zero());
}

#[tokio::test]
async fn malformed_balance_degrades_to_zero() {
    let balances = Arc::new(
        MockBalances::default()
            .reply(NATIVE_KEY, Reply::Balance(""))
            .reply(WEETH, Reply::Balance("not-a-number"))
            .reply(EETH, Reply::Balance("2000000000000000000")),
    );
    let prices = Arc::new(MockPrices::with_prices(&[
        ("ethereum", "4000"),
        ("ether-fi-staked-eth", "4200"),
        ("ether-fi", "3900"),
    ]));

    let snapshot = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap();

    assert!(snapshot.valuations[0].balance.is_zero());
    assert!(snapshot.valuations[1].balance.is_zero());
    assert_eq!(snapshot.total_fiat_value, dec("7800"));
}

#[tokio::test]
async fn single_batched_price_fetch_for_all_ids() {
    let balances = Arc::new(MockBalances::default());
    let prices = Arc::new(MockPrices::default());

    aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "USD")
        .await
        .unwrap();

    let calls = prices.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let expected: BTreeSet<String> = ["ethereum", "ether-fi-staked-eth", "ether-fi"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(calls[0].0, expected);
    assert_eq!(calls[0].1, "usd");
    assert_eq!(balances.starts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn all_fetches_are_in_flight_together() {
    let balances = Arc::new(
        MockBalances::default()
            .reply_after(NATIVE_KEY, Reply::Balance("1"), Duration::from_millis(300))
            .reply_after(WEETH, Reply::Balance("2"), Duration::from_millis(200))
            .reply_after(EETH, Reply::Balance("3"), Duration::from_millis(100)),
    );
    let prices = Arc::new(MockPrices {
        latency: Duration::from_millis(250),
        ..Default::default()
    });

    let started = Instant::now();
    let snapshot = aggregator(&balances, &prices)
        .aggregate(WALLET, &assets(), "usd")
        .await
        .unwrap();
    let elapsed = started.elapsed();

    let mut starts: Vec<Instant> = balances.starts.lock().unwrap().iter().map(|(_, t)| *t).collect();
    starts.push(prices.calls.lock().unwrap()[0].2);
    assert_eq!(starts.len(), 4);

    let first = *starts.iter().min().unwrap();
    let last = *starts.iter().max().unwrap();
    assert!(last - first < Duration::from_millis(50), "fetches were not started together");

    // Serial execution would take 850ms
    assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);

    // Slowest-first completion does not reorder the output
    let symbols: Vec<&str> = snapshot.valuations.iter().map(|v| v.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ETH", "weETH", "eETH"]);
    assert_eq!(snapshot.valuations[2].balance, dec("0.000000000000000003"));
}

#[tokio::test]
async fn abandoning_aggregation_cancels_outstanding_fetches() {
    let balances = Arc::new(
        MockBalances::default()
            .reply_after(NATIVE_KEY, Reply::Balance("1"), Duration::from_secs(3600))
            .reply_after(WEETH, Reply::Balance("1"), Duration::from_secs(3600))
            .reply_after(EETH, Reply::Balance("1"), Duration::from_secs(3600)),
    );
    let prices = Arc::new(MockPrices {
        latency: Duration::from_secs(3600),
        ..Default::default()
    });
    let aggregator = aggregator(&balances, &prices);
    let tracked = assets();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        aggregator.aggregate(WALLET, &tracked, "usd"),
    )
    .await;

    assert!(abandoned.is_err());
    assert_eq!(balances.cancelled.load(Ordering::SeqCst), 3);
    assert_eq!(prices.cancelled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_aggregation_is_identical() {
    let balances = Arc::new(
        MockBalances::default()
            .reply(NATIVE_KEY, Reply::Balance("1234567890123456789012"))
            .reply(WEETH, Reply::Balance("987654321"))
            .reply(EETH, Reply::Balance("5")),
    );
    let prices = Arc::new(MockPrices::with_prices(&[
        ("ethereum", "3999.99"),
        ("ether-fi", "0.1"),
    ]));
    let aggregator = aggregator(&balances, &prices);

    let first = aggregator.aggregate(WALLET, &assets(), "usd").await.unwrap();
    let second = aggregator.aggregate(WALLET, &assets(), "usd").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total_fiat_value.to_string(), second.total_fiat_value.to_string());
    assert_eq!(first.format_report(), second.format_report());
    assert_eq!(prices.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_asset_list_yields_empty_snapshot() {
    let balances = Arc::new(MockBalances::default());
    let prices = Arc::new(MockPrices::default());

    let snapshot = aggregator(&balances, &prices)
        .aggregate(WALLET, &[], "usd")
        .await
        .unwrap();

    assert!(snapshot.is_empty());
    assert!(snapshot.total_fiat_value.is_zero());
}

#[tokio::test]
async fn validate_address_reflects_provider_status() {
    let accepted = MockBalances::default().reply(NATIVE_KEY, Reply::Balance("0"));
    let rejected = MockBalances::default().reply(NATIVE_KEY, Reply::Rejected("NOTOK"));

    assert!(accepted.validate_address(WALLET).await.unwrap());
    assert!(!rejected.validate_address("0xnope").await.unwrap());
}
