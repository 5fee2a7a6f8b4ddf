//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use portal_crawler::config::{FetchConfig, ThrottleConfig, TransportConfig};
use portal_crawler::crawler::{PoliteFetcher, RecordingSleeper, RetryingTransport, Throttler};

/// Fetcher whose three layers sleep through separate recording sleepers
pub struct TestFetcher {
    pub fetcher: PoliteFetcher,
    pub throttle: RecordingSleeper,
    pub transport: RecordingSleeper,
    pub manual: RecordingSleeper,
}

/// Fetcher with the given policies and no real waiting
pub fn test_fetcher(transport: TransportConfig, policy: FetchConfig) -> TestFetcher {
    test_fetcher_with_throttle(ThrottleConfig::disabled(), transport, policy)
}

pub fn test_fetcher_with_throttle(
    throttle: ThrottleConfig,
    transport: TransportConfig,
    policy: FetchConfig,
) -> TestFetcher {
    let throttle_sleeper = RecordingSleeper::new();
    let transport_sleeper = RecordingSleeper::new();
    let manual_sleeper = RecordingSleeper::new();

    let transport = RetryingTransport::with_sleeper(transport, Arc::new(transport_sleeper.clone()))
        .expect("client builds");
    let throttler = Throttler::with_sleeper(throttle, Arc::new(throttle_sleeper.clone()));
    let fetcher = PoliteFetcher::with_sleeper(
        transport,
        throttler,
        policy,
        Arc::new(manual_sleeper.clone()),
    );

    TestFetcher {
        fetcher,
        throttle: throttle_sleeper,
        transport: transport_sleeper,
        manual: manual_sleeper,
    }
}

/// Fetcher with transport retries off, so only the manual retry loop acts
pub fn manual_only_fetcher() -> TestFetcher {
    test_fetcher(TransportConfig::no_retries(), FetchConfig::default())
}

/// A results page with `count` listing cards linking to `/MLC-{start + i}`
pub fn listing_page(start: usize, count: usize) -> String {
    let cards: String = (start..start + count)
        .map(|i| {
            format!(
                r#"<li class="ui-search-layout__item">
  <a class="poly-component__title" href="/MLC-{i}">Casa {i} en Ñuñoa</a>
  <div class="poly-price__current">
    <span class="andes-money-amount__currency-symbol">$</span>
    <span class="andes-money-amount__fraction">{price}</span>
  </div>
  <span class="poly-component__location">Calle {i}, Ñuñoa, RM (Metropolitana)</span>
  <ul>
    <li class="poly-attributes_list__item">3 dormitorios</li>
    <li class="poly-attributes_list__item">2 baños</li>
  </ul>
</li>
"#,
                price = format!("{}.000", 400 + i)
            )
        })
        .collect();

    format!(r#"<html><body><ol class="ui-search-layout">{cards}</ol></body></html>"#)
}

/// A detail page with a characteristics table
pub fn detail_page(util: &str, total: &str, dormitorios: &str, banos: &str) -> String {
    format!(
        r#"<html><body><table>
  <tr class="andes-table__row"><th>Superficie útil</th><td><span class="andes-table__column--value">{util}</span></td></tr>
  <tr class="andes-table__row"><th>Superficie total</th><td>{total}</td></tr>
  <tr class="andes-table__row"><th>Dormitorios</th><td>{dormitorios}</td></tr>
  <tr class="andes-table__row"><th>Baños</th><td>{banos}</td></tr>
</table></body></html>"#
    )
}
