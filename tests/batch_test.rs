//! Batch runner tests: resume, checkpoints, placeholders and early stop

mod common;

use async_trait::async_trait;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_crawler::config::BatchConfig;
use portal_crawler::crawler::{
    BatchRunner, DetailScraper, ItemScraper, ListingPageScraper, PoliteFetcher, WorkItem,
};
use portal_crawler::error::Result;
use portal_crawler::models::{Record, RecordTable, LINK_COLUMN, PAGE_COLUMN};
use portal_crawler::parser::DETAIL_COLUMNS;
use portal_crawler::storage::{read_table, write_table};

use common::{detail_page, listing_page, manual_only_fetcher};

fn batch(checkpoint_every: usize) -> BatchConfig {
    BatchConfig {
        checkpoint_every,
        resume: true,
        stop_on_empty: false,
    }
}

async fn mount_detail(server: &MockServer, route: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page("80 m²", "100 m²", "2", "1")),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Prior output {a, b} and work {a, b, c}: only c is fetched
#[tokio::test]
async fn test_resume_fetches_only_new_items() {
    let server = MockServer::start().await;
    mount_detail(&server, "/a", 0).await;
    mount_detail(&server, "/b", 0).await;
    mount_detail(&server, "/c", 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("detalle.csv");
    let links: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|p| format!("{}/{p}", server.uri()))
        .collect();

    let mut previous = RecordTable::with_columns(DETAIL_COLUMNS.iter().copied());
    for link in &links[..2] {
        previous.push(Record::new().with(LINK_COLUMN, link.as_str()).with("dormitorios", 3u32));
    }
    write_table(&output, &previous).unwrap();

    let items: Vec<WorkItem> = links.iter().cloned().map(WorkItem::for_url).collect();
    let runner = BatchRunner::new(DetailScraper::new(), batch(100)).with_output(&output);
    let mut t = manual_only_fetcher();
    let (table, summary) = runner.run(&mut t.fetcher, &items).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(table.len(), 3);
    for link in &links {
        let count = table
            .rows()
            .iter()
            .filter(|r| r.get_cell(LINK_COLUMN).as_deref() == Some(link.as_str()))
            .count();
        assert_eq!(count, 1, "{link}");
    }

    let on_disk = read_table(&output).unwrap();
    assert_eq!(on_disk.len(), 3);
    assert_eq!(on_disk.rows()[2].get_f64("superficie_util"), Some(80.0));
}

/// With resume disabled every item is fetched again
#[tokio::test]
async fn test_no_resume_refetches() {
    let server = MockServer::start().await;
    mount_detail(&server, "/a", 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("detalle.csv");
    let link = format!("{}/a", server.uri());

    let mut previous = RecordTable::with_columns(DETAIL_COLUMNS.iter().copied());
    previous.push(Record::new().with(LINK_COLUMN, link.as_str()));
    write_table(&output, &previous).unwrap();

    let config = BatchConfig {
        resume: false,
        ..batch(100)
    };
    let runner = BatchRunner::new(DetailScraper::new(), config).with_output(&output);
    let mut t = manual_only_fetcher();
    let (table, _) = runner
        .run(&mut t.fetcher, &[WorkItem::for_url(link)])
        .await
        .unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].get_f64("dormitorios"), Some(2.0));
}

/// A failed detail fetch still records its link
#[tokio::test]
async fn test_failed_item_writes_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, "/ok", 1).await;

    let items = vec![
        WorkItem::for_url(format!("{}/gone", server.uri())),
        WorkItem::for_url(format!("{}/ok", server.uri())),
    ];
    let runner = BatchRunner::new(DetailScraper::new(), batch(100));
    let mut t = manual_only_fetcher();
    let (table, summary) = runner.run(&mut t.fetcher, &items).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(table.len(), 2);
    let placeholder = &table.rows()[0];
    assert_eq!(placeholder.get_cell(LINK_COLUMN), Some(items[0].key.clone()));
    assert_eq!(placeholder.len(), 1);
    assert_eq!(table.rows()[1].get_f64("banos"), Some(1.0));
}

/// A failed results page leaves no row, so a later run retries it
#[tokio::test]
async fn test_failed_listing_page_has_no_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/arriendo/casa/maule"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(1, 3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/arriendo/casa/maule_Desde_49"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = format!("{}/arriendo/casa/maule", server.uri());
    let items = ListingPageScraper::page_items(&base, 2);
    let runner = BatchRunner::new(ListingPageScraper::new(), batch(100));
    let mut t = manual_only_fetcher();
    let (table, summary) = runner.run(&mut t.fetcher, &items).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(table.len(), 3);
    let pages = table.distinct(PAGE_COLUMN);
    assert!(pages.contains(&items[0].key));
    assert!(!pages.contains(&items[1].key));
}

/// An empty results page ends the run when stop_on_empty is set
#[tokio::test]
async fn test_stop_on_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/arriendo/casa/maule"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(1, 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/arriendo/casa/maule_Desde_49"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/arriendo/casa/maule_Desde_97"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(3, 2)))
        .expect(0)
        .mount(&server)
        .await;

    let base = format!("{}/arriendo/casa/maule", server.uri());
    let items = ListingPageScraper::page_items(&base, 3);
    let config = BatchConfig {
        stop_on_empty: true,
        ..batch(100)
    };
    let runner = BatchRunner::new(ListingPageScraper::new(), config);
    let mut t = manual_only_fetcher();
    let (table, summary) = runner.run(&mut t.fetcher, &items).await.unwrap();

    assert!(summary.stopped_early);
    assert_eq!(summary.processed, 2);
    assert_eq!(table.len(), 2);
}

/// Work-item tags land on every record of the item
#[tokio::test]
async fn test_tags_stamped_on_listing_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/arriendo/casa/maule"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(1, 2)))
        .mount(&server)
        .await;

    let url = format!("{}/arriendo/casa/maule", server.uri());
    let items = vec![WorkItem::for_url(url).with_tag("region_scraping", "Maule")];
    let runner = BatchRunner::new(ListingPageScraper::new(), batch(100));
    let mut t = manual_only_fetcher();
    let (table, _) = runner.run(&mut t.fetcher, &items).await.unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.null_count("region_scraping"), 0);
    assert_eq!(table.distinct("region_scraping").len(), 1);
}

/// Scraper that fails hard on one key
struct CrashingScraper {
    crash_on: String,
}

#[async_trait]
impl ItemScraper for CrashingScraper {
    fn columns(&self) -> Vec<String> {
        vec![LINK_COLUMN.to_string(), "valor".to_string()]
    }

    fn resume_column(&self) -> &str {
        LINK_COLUMN
    }

    async fn scrape(&self, _fetcher: &mut PoliteFetcher, item: &WorkItem) -> Result<Vec<Record>> {
        if item.key == self.crash_on {
            panic!("simulated crash on {}", item.key);
        }
        Ok(vec![Record::new().with("valor", 1.0)])
    }
}

/// checkpoint_every = K and a crash on item K+1 leaves exactly K rows on disk
#[tokio::test]
async fn test_checkpoint_survives_crash() {
    const K: usize = 2;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("parcial.csv");
    let items: Vec<WorkItem> = (1..=4)
        .map(|i| WorkItem::for_url(format!("https://x/{i}")))
        .collect();

    let runner = BatchRunner::new(
        CrashingScraper {
            crash_on: items[K].key.clone(),
        },
        batch(K),
    )
    .with_output(&output);
    let mut t = manual_only_fetcher();

    let handle = tokio::spawn(async move { runner.run(&mut t.fetcher, &items).await.map(|_| ()) });
    let outcome = handle.await;
    assert!(outcome.is_err(), "run should have panicked");

    let on_disk = read_table(&output).unwrap();
    assert_eq!(on_disk.len(), K);
    assert!(!dir.path().join("parcial.csv.tmp").exists());
}
