mod common;

use std::sync::{Arc, Mutex};

use ccharvest::{
    batch::Batch,
    error::Error,
    filtering::Length,
    locator::Locator,
    metrics::WorkerMetrics,
    pipelines::Worker,
    sink::Document,
};
use prometheus::Registry;

use common::{cdx_line, html_response, warc_record, FakeArchive, FakeDelivery, Settlement};

fn metrics() -> WorkerMetrics {
    WorkerMetrics::register(&Registry::new()).unwrap()
}

fn locator(id: usize) -> Locator {
    Locator::from_cdx_line(cdx_line(id, "eng", "200").trim_end()).unwrap()
}

fn batch(ids: &[usize]) -> Batch {
    Batch::new(ids.iter().map(|id| locator(*id)).collect())
}

/// One gzipped response record per id, at `crawl-data/<id>.warc.gz`.
fn archive(ids: &[usize]) -> FakeArchive {
    ids.iter().fold(FakeArchive::default(), |archive, id| {
        let record = warc_record("response", *id, &html_response(&format!("document {}", id)));
        archive.with_file(&format!("crawl-data/{}.warc.gz", id), record.as_bytes())
    })
}

fn worker(archive: FakeArchive, m: &WorkerMetrics) -> Worker<FakeArchive, Vec<Document>> {
    Worker::new(archive, Vec::new(), m.clone())
}

fn texts(documents: &[Document]) -> Vec<&str> {
    documents.iter().map(|d| d.text.as_str()).collect()
}

#[test_log::test(tokio::test)]
async fn process_batch() {
    let m = metrics();
    let mut w = worker(archive(&[1, 2]), &m);

    assert!(w.process_batch(batch(&[1, 2])).await.is_ok());
    assert_eq!(texts(w.sink()), vec!["document 1", "document 2"]);
    assert_eq!(
        w.sink()[1],
        Document {
            surt_url: "com,example)/2".to_string(),
            target_uri: Some("http://example.com/2".to_string()),
            text: "document 2".to_string(),
        }
    );
    assert_eq!(m.batches.get(), 1);
    assert_eq!(m.entries_received.get(), 2);
    assert_eq!(m.extracted.get(), 2);
}

#[test_log::test(tokio::test)]
async fn fetches_locator_range() {
    let archive = archive(&[3]);
    let mut w = Worker::new(&archive, Vec::new(), metrics());

    w.process_locator(&locator(3)).await.unwrap();
    assert_eq!(
        archive.requests(),
        vec![("crawl-data/3.warc.gz".to_string(), 1500, 500)]
    );
}

#[test_log::test(tokio::test)]
async fn failing_locator_fails_batch() {
    // crawl-data/2.warc.gz is missing
    let m = metrics();
    let mut w = worker(archive(&[1, 3]), &m);

    let result = w.process_batch(batch(&[1, 2, 3])).await;
    assert!(matches!(
        result,
        Err(Error::Processing {
            failed: 1,
            total: 3
        })
    ));

    // the other locators are still processed
    assert_eq!(texts(w.sink()), vec!["document 1", "document 3"]);
    assert_eq!(m.batches.get(), 0);
    assert_eq!(m.entries_received.get(), 3);
}

#[test_log::test(tokio::test)]
async fn malformed_container() {
    let m = metrics();
    let archive = archive(&[1]).with_file("crawl-data/2.warc.gz", b"this is not a WARC header\r\n\r\n");
    let mut w = worker(archive, &m);

    assert!(matches!(
        w.process_locator(&locator(2)).await,
        Err(Error::ContainerFormat(_))
    ));
    assert!(w.process_batch(batch(&[1, 2])).await.is_err());
    assert_eq!(texts(w.sink()), vec!["document 1"]);
}

#[test_log::test(tokio::test)]
async fn non_response_records_and_empty_text() {
    let content = [
        warc_record("request", 1, "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"),
        warc_record("response", 1, "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n"),
        warc_record("response", 1, "HTTP/1.1 200 OK\r\n\r\n<script>only()</script>"),
        warc_record("response", 1, &html_response("kept")),
    ]
    .concat();

    let m = metrics();
    let archive = FakeArchive::default().with_file("crawl-data/1.warc.gz", content.as_bytes());
    let mut w = worker(archive, &m);

    assert_eq!(w.process_locator(&locator(1)).await.unwrap(), 1);
    assert_eq!(texts(w.sink()), vec!["kept"]);
    assert_eq!(m.extraction_errors.get(), 2);
    assert_eq!(m.extracted.get(), 1);
}

#[test_log::test(tokio::test)]
async fn length_filter() {
    let m = metrics();
    let archive = archive(&[1]).with_file(
        "crawl-data/2.warc.gz",
        warc_record("response", 2, &html_response("a much longer document")).as_bytes(),
    );
    let mut w = worker(archive, &m).with_length_filter(Length::new(Some(12), None));

    assert!(w.process_batch(batch(&[1, 2])).await.is_ok());
    assert_eq!(texts(w.sink()), vec!["a much longer document"]);
    assert_eq!(m.batches.get(), 1);
}

#[test_log::test(tokio::test)]
async fn settle_deliveries() {
    let settlements = Arc::new(Mutex::new(Vec::new()));
    let m = metrics();
    let mut w = worker(archive(&[1, 3]), &m);

    let ok = FakeDelivery::new(batch(&[1, 3]).to_json().unwrap(), &settlements);
    assert!(w.handle(ok).await.is_ok());

    let failing = FakeDelivery::new(batch(&[1, 2]).to_json().unwrap(), &settlements);
    assert!(w.handle(failing).await.is_err());

    // the broker hands the same batch out again, and it fails again
    let failing_again = FakeDelivery::new(batch(&[1, 2]).to_json().unwrap(), &settlements).again();
    assert!(w.handle(failing_again).await.is_err());

    assert_eq!(
        *settlements.lock().unwrap(),
        vec![Settlement::Ack, Settlement::Requeue, Settlement::Drop]
    );
    assert_eq!(m.batches.get(), 1);
    assert_eq!(m.entries_received.get(), 6);
}

#[test_log::test(tokio::test)]
async fn undecodable_batch_is_dropped() {
    let settlements = Arc::new(Mutex::new(Vec::new()));
    let m = metrics();
    let mut w = worker(archive(&[1]), &m);

    for payload in [&b"{\"not\": \"a batch\"}"[..], &b"\xff\xfe"[..], &b""[..]] {
        let garbage = FakeDelivery::new(payload.to_vec(), &settlements);
        assert!(matches!(w.handle(garbage).await, Err(Error::Serde(_))));
    }

    // never requeued, even on a first delivery
    assert_eq!(
        *settlements.lock().unwrap(),
        vec![Settlement::Drop, Settlement::Drop, Settlement::Drop]
    );
    assert_eq!(m.entries_received.get(), 0);
    assert!(w.sink().is_empty());
}

#[test_log::test(tokio::test)]
async fn run_until_stream_ends() {
    let settlements = Arc::new(Mutex::new(Vec::new()));
    let deliveries = vec![
        Ok(FakeDelivery::new(batch(&[1]).to_json().unwrap(), &settlements)),
        Err(Error::Custom("channel closed".to_string())),
        Ok(FakeDelivery::new(batch(&[2]).to_json().unwrap(), &settlements)),
        Ok(FakeDelivery::new(batch(&[1, 2]).to_json().unwrap(), &settlements).again()),
        Ok(FakeDelivery::new(b"[{}]".to_vec(), &settlements)),
    ];

    let m = metrics();
    let mut w = worker(archive(&[1]), &m);
    w.run(futures::stream::iter(deliveries)).await;

    assert_eq!(
        *settlements.lock().unwrap(),
        vec![
            Settlement::Ack,
            Settlement::Requeue,
            Settlement::Drop,
            Settlement::Drop
        ]
    );
    assert_eq!(m.batches.get(), 1);
    assert_eq!(texts(&w.into_sink()), vec!["document 1", "document 1"]);
}
