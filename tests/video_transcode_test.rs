//! Integration tests for on-the-fly conversion on `GET /video`.
//!
//! The encoder is replaced by POSIX tools so the tests run without ffmpeg.

#![cfg(unix)]

mod common;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use common::{patterned, TestHarness};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};

fn sh(script: &str) -> impl FnOnce(&mut vidshelf::config::Config) + '_ {
    move |config| {
        config.transcode.program = Some(PathBuf::from("sh"));
        // `sh -c script name arg`: the source path arrives as $1.
        config.transcode.args = ["-c", script, "sh", "{input}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
    }
}

#[tokio::test]
async fn foreign_codec_is_transcoded() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(200_000);
    let id = h.add_video("clip.mov", Some("hevc"), &data);

    let resp = reqwest::get(format!("http://{addr}/video?id={id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()[CONTENT_TYPE], "video/mp4");
    assert!(resp.headers().get(CONTENT_RANGE).is_none());
    assert!(resp.headers().get(ACCEPT_RANGES).is_none());
    assert_eq!(resp.bytes().await.unwrap().as_ref(), &data[..]);
}

#[tokio::test]
async fn range_header_is_ignored_when_transcoding() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(5000);
    let id = h.add_video("clip.mkv", Some("vp9"), &data);

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/video?id={id}"))
        .header(RANGE, "bytes=100-199")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get(CONTENT_RANGE).is_none());
    assert!(resp.headers().get(CONTENT_LENGTH).is_none());
    assert_eq!(resp.bytes().await.unwrap().len(), 5000);
}

#[tokio::test]
async fn native_codec_match_is_case_insensitive() {
    let (h, addr) = TestHarness::with_server().await;
    let id = h.add_video("clip.mp4", Some("H264"), &patterned(100));

    let resp = reqwest::get(format!("http://{addr}/video?id={id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
    assert_eq!(resp.headers()[CONTENT_LENGTH], "100");
}

#[tokio::test]
async fn concurrent_transcodes_are_independent() {
    let (h, addr) = TestHarness::with_server().await;
    let first = patterned(150_000);
    let second: Vec<u8> = first.iter().rev().copied().collect();
    let a = h.add_video("a.mkv", Some("hevc"), &first);
    let b = h.add_video("b.mkv", Some("hevc"), &second);

    let (ra, rb) = tokio::join!(
        reqwest::get(format!("http://{addr}/video?id={a}")),
        reqwest::get(format!("http://{addr}/video?id={b}")),
    );
    let (ba, bb) = tokio::join!(ra.unwrap().bytes(), rb.unwrap().bytes());

    assert_eq!(ba.unwrap().as_ref(), &first[..]);
    assert_eq!(bb.unwrap().as_ref(), &second[..]);
}

#[tokio::test]
async fn encoder_failure_before_output_is_500() {
    let (h, addr) =
        TestHarness::with_server_config(sh("echo 'Unsupported codec' >&2; exit 1")).await;
    let id = h.add_video("clip.mkv", Some("hevc"), b"data");

    let resp = reqwest::get(format!("http://{addr}/video?id={id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "upstream_process_failure");
    assert!(json["error"].as_str().unwrap().contains("Unsupported codec"));
}

#[tokio::test]
async fn missing_encoder_is_500() {
    let (h, addr) = TestHarness::with_server_config(|config| {
        config.transcode.program = Some(PathBuf::from("/nonexistent/encoder"));
    })
    .await;
    let id = h.add_video("clip.mkv", Some("hevc"), b"data");

    let resp = reqwest::get(format!("http://{addr}/video?id={id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn encoder_failure_mid_stream_truncates_body() {
    let (h, addr) = TestHarness::with_server_config(sh("printf partial; exit 3")).await;
    let id = h.add_video("clip.mkv", Some("hevc"), b"data");

    let resp = reqwest::get(format!("http://{addr}/video?id={id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.bytes().await.is_err());

    // The server keeps serving.
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn client_disconnect_kills_encoder() {
    let (h, addr) = TestHarness::with_server_config(sh(r#"echo $$ > "$1.pid"; exec yes"#)).await;
    let id = h.add_video("clip.mkv", Some("hevc"), b"data");
    let pid_file = PathBuf::from(format!("{}.pid", h.video_path(id).display()));

    let mut resp = reqwest::get(format!("http://{addr}/video?id={id}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.chunk().await.unwrap().is_some());

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(!process_gone(pid));

    drop(resp);

    let deadline = Instant::now() + Duration::from_secs(10);
    while !process_gone(pid) {
        assert!(
            Instant::now() < deadline,
            "encoder {pid} still running after disconnect"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn disconnect_before_first_output_kills_encoder() {
    use tokio::io::AsyncWriteExt;

    let (h, addr) =
        TestHarness::with_server_config(sh(r#"echo $$ > "$1.pid"; exec sleep 30"#)).await;
    let id = h.add_video("clip.mkv", Some("hevc"), b"data");
    let pid_file = PathBuf::from(format!("{}.pid", h.video_path(id).display()));

    // Raw connection, so it can be closed while the response head is pending.
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(format!("GET /video?id={id} HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes())
        .await
        .unwrap();

    let pid = wait_for_pid(&pid_file).await;
    assert!(!process_gone(pid));

    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(10);
    while !process_gone(pid) {
        assert!(
            Instant::now() < deadline,
            "encoder {pid} still running after disconnect"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Poll until the encoder has written its pid.
#[cfg(target_os = "linux")]
async fn wait_for_pid(path: &std::path::Path) -> u32 {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(pid) = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            return pid;
        }
        assert!(Instant::now() < deadline, "encoder never started");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// True when the pid no longer exists or is a zombie awaiting reaping.
#[cfg(target_os = "linux")]
fn process_gone(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(") ")
            .and_then(|(_, rest)| rest.chars().next())
            .map(|state| state == 'Z' || state == 'X')
            .unwrap_or(true),
        Err(_) => true,
    }
}
