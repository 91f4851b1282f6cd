//! Acquisition engine tests against a local canned-response HTTP
//! server. Every connection carries exactly one request (the server
//! closes after responding), so the connection count is the probe count.

use kithound::acquire::engine::KitHunter;
use kithound::acquire::fingerprint::fingerprint;
use kithound::acquire::ledger::OriginLedger;
use kithound::acquire::{HuntOutcome, MAIN_EXTENSIONS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const ARCHIVE_BYTES: &[u8] = b"PK\x03\x04\xff\xfe\x80fake archive payload";
const HTML_404: &[u8] = b"<html><body>404 Not Found</body></html>";

struct TestServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serves `responder(path) -> (status, body)` one request per connection.
async fn spawn_server<F>(responder: F) -> TestServer
where
    F: Fn(&str) -> (u16, Vec<u8>) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = Arc::clone(&hits);
    let responder = Arc::new(responder);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            hits_in.fetch_add(1, Ordering::SeqCst);
            let responder = Arc::clone(&responder);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                let (status, body) = responder(&path);
                let reason = if status == 200 { "OK" } else { "Not Found" };
                let header = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    reason,
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    TestServer { addr, hits }
}

fn hunter(ledger: Arc<OriginLedger>, kits_dir: PathBuf) -> Arc<KitHunter> {
    Arc::new(
        KitHunter::new(
            ledger,
            kits_dir,
            MAIN_EXTENSIONS,
            4,
            Duration::from_secs(5),
        )
        .unwrap(),
    )
}

fn kit_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n != "origins.txt")
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn first_validated_probe_wins() {
    let server = spawn_server(|path| {
        if path == "/store.zip" {
            (200, ARCHIVE_BYTES.to_vec())
        } else {
            (404, HTML_404.to_vec())
        }
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(OriginLedger::open(&dir.path().join("origins.txt")).unwrap());
    let hunter = hunter(Arc::clone(&ledger), dir.path().to_path_buf());

    let url = server.url("/store/login.php");
    let outcome = hunter.acquire(&url).await.unwrap();
    assert_eq!(outcome, HuntOutcome::Downloaded);

    // .zip is the first extension probed at the only prefix.
    assert_eq!(server.hit_count(), 1);

    let prefix = server.url("/store");
    let fp = fingerprint(&prefix);
    assert!(ledger.contains(&fp));
    assert_eq!(kit_files(dir.path()), vec![format!("store#{}.zip", &fp[..5])]);

    let content = std::fs::read(dir.path().join(format!("store#{}.zip", &fp[..5]))).unwrap();
    assert_eq!(content, ARCHIVE_BYTES);
}

#[tokio::test]
async fn known_fingerprint_stops_the_url_without_a_file() {
    let server = spawn_server(|path| {
        if path.ends_with(".zip") {
            (200, ARCHIVE_BYTES.to_vec())
        } else {
            (404, HTML_404.to_vec())
        }
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(OriginLedger::open(&dir.path().join("origins.txt")).unwrap());
    let prefix = server.url("/store");
    ledger
        .record(&fingerprint(&prefix), "store#xxxxx.zip", &server.url("/store/old.php"))
        .unwrap();

    let hunter = hunter(Arc::clone(&ledger), dir.path().to_path_buf());
    let outcome = hunter.acquire(&server.url("/store/login.php")).await.unwrap();

    assert_eq!(outcome, HuntOutcome::AlreadyKnown);
    // One probe validated and hit the ledger; the successor extensions
    // at that prefix were never requested.
    assert_eq!(server.hit_count(), 1);
    assert!(kit_files(dir.path()).is_empty());
}

#[tokio::test]
async fn html_everywhere_is_silent_success() {
    let server = spawn_server(|_| (200, HTML_404.to_vec())).await;

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(OriginLedger::open(&dir.path().join("origins.txt")).unwrap());
    let hunter = hunter(Arc::clone(&ledger), dir.path().to_path_buf());

    let outcome = hunter.acquire(&server.url("/store/login.php")).await.unwrap();
    assert_eq!(outcome, HuntOutcome::Nothing);
    // All three extensions probed at the single prefix, none accepted.
    assert_eq!(server.hit_count(), 3);
    assert!(kit_files(dir.path()).is_empty());
    assert_eq!(ledger.len(), 0);
}

#[tokio::test]
async fn unreachable_host_is_swallowed() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(OriginLedger::open(&dir.path().join("origins.txt")).unwrap());
    let hunter = hunter(ledger, dir.path().to_path_buf());

    let outcome = hunter
        .acquire(&format!("http://{}/store/login.php", addr))
        .await
        .unwrap();
    assert_eq!(outcome, HuntOutcome::Nothing);
}

#[tokio::test]
async fn concurrent_urls_on_one_prefix_download_once() {
    let server = spawn_server(|path| {
        if path.ends_with(".zip") {
            (200, ARCHIVE_BYTES.to_vec())
        } else {
            (404, HTML_404.to_vec())
        }
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(OriginLedger::open(&dir.path().join("origins.txt")).unwrap());
    let hunter = hunter(Arc::clone(&ledger), dir.path().to_path_buf());

    let urls = vec![
        server.url("/store/a.php"),
        server.url("/store/b.php"),
        server.url("/store/c.php"),
    ];
    let tally = Arc::clone(&hunter).hunt_all(urls).await.unwrap();

    assert_eq!(tally.downloaded, 1);
    assert_eq!(tally.duplicates, 2);
    assert_eq!(tally.empty, 0);
    assert_eq!(kit_files(dir.path()).len(), 1);
    assert_eq!(ledger.len(), 1);
}
