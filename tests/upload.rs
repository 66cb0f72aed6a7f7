use std::{
    fs,
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    path::PathBuf,
    thread,
};

use streamupload::{Diagnostics, Error, State, Status, UploadSession};
use tempfile::TempDir;

fn fixture(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn expected(boundary: &str, content: &str, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = format!("--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"hello.txt\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n");
    for (k, v) in fields {
        body += &format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{k}\"\r\n\r\n{v}\r\n");
    }
    body += &format!("--{boundary}--\r\n");
    body.into_bytes()
}

#[test]
fn small_file_fits_one_pull() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let fields = [("k1", "101")];
    let (mut session, content_type) =
        UploadSession::create("file", &path, fields, Diagnostics::new("a")).unwrap();
    let want = expected(session.boundary(), "hello", &fields);
    assert_eq!(content_type, format!("multipart/form-data; boundary={}", session.boundary()));
    assert_eq!(session.content_length(), Some(want.len() as u64));

    let mut buf = [0u8; 4096];
    let pull = session.pull(&mut buf).unwrap();
    assert_eq!(pull.status, Status::EndOfStream);
    assert_eq!(&buf[..pull.written], &want[..]);

    let pull = session.pull(&mut buf).unwrap();
    assert_eq!((pull.written, pull.status), (0, Status::EndOfStream));
}

#[test]
fn single_byte_pulls_reproduce_the_body() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let fields = [("k1", "101")];
    let (mut session, _) = UploadSession::create("file", &path, fields, Diagnostics::default()).unwrap();
    let want = expected(session.boundary(), "hello", &fields);

    let mut body = Vec::new();
    let mut byte = [0u8; 1];
    for i in 0..want.len() {
        let pull = session.pull(&mut byte).unwrap();
        assert_eq!(pull.written, 1);
        let last = i == want.len() - 1;
        assert_eq!(pull.status == Status::EndOfStream, last, "pull {i}");
        body.push(byte[0]);
    }
    assert_eq!(body, want);
    assert_eq!(session.pull(&mut byte).unwrap().written, 0);
}

#[test]
fn large_file_streams_through_small_buffers() {
    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let (_dir, path) = fixture("blob.bin", &content);
    let (mut session, _) =
        UploadSession::create("file", &path, [("k", "v")], Diagnostics::default()).unwrap();
    let len = session.content_length().unwrap();

    let mut body = Vec::new();
    session.read_to_end(&mut body).unwrap();
    assert_eq!(body.len() as u64, len);
    assert_eq!(session.bytes_emitted_from_file(), content.len() as u64);

    let start = body.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    assert_eq!(&body[start..start + content.len()], &content[..]);
}

#[test]
fn identical_input_gives_identical_layout() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let fields = [("b", "2"), ("a", "1"), ("c", "3")];
    let mut bodies = Vec::new();
    for _ in 0..2 {
        let (mut session, _) = UploadSession::create("file", &path, fields, Diagnostics::default()).unwrap();
        let boundary = session.boundary().to_owned();
        let mut body = String::new();
        session.read_to_string(&mut body).unwrap();
        bodies.push(body.replace(&boundary, "BOUNDARY"));
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(String::from_utf8(expected("BOUNDARY", "hello", &fields)).unwrap(), bodies[0]);
}

#[test]
fn sessions_never_share_a_boundary() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let no_fields: [(&str, &str); 0] = [];
    let (first, _) = UploadSession::create("file", &path, no_fields, Diagnostics::default()).unwrap();
    let (second, _) = UploadSession::create("file", &path, no_fields, Diagnostics::default()).unwrap();
    assert_ne!(first.boundary(), second.boundary());
}

#[test]
fn empty_fields_leave_only_the_closing_boundary() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let no_fields: [(&str, &str); 0] = [];
    let (mut session, _) = UploadSession::create("file", &path, no_fields, Diagnostics::default()).unwrap();
    let boundary = session.boundary().to_owned();
    let mut body = Vec::new();
    session.read_to_end(&mut body).unwrap();
    assert!(body.ends_with(format!("hello\r\n--{boundary}--\r\n").as_bytes()));
}

#[test]
fn missing_file_fails_creation() {
    let dir = tempfile::tempdir().unwrap();
    let no_fields: [(&str, &str); 0] = [];
    let err = UploadSession::create("file", dir.path().join("missing.pdf"), no_fields, Diagnostics::default())
        .unwrap_err();
    assert!(matches!(err, Error::Open { .. }), "{err}");
}

#[test]
fn file_growing_after_creation_keeps_declared_length() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let fields = [("k1", "101")];
    let (mut session, _) = UploadSession::create("file", &path, fields, Diagnostics::default()).unwrap();
    let want = expected(session.boundary(), "hello", &fields);

    let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"appended later!!").unwrap();

    let mut body = Vec::new();
    session.read_to_end(&mut body).unwrap();
    assert_eq!(session.content_length(), Some(body.len() as u64));
    assert_eq!(body, want);
}

#[test]
fn file_shrinking_after_creation_fails_the_stream() {
    let (_dir, path) = fixture("hello.txt", b"hello world");
    let no_fields: [(&str, &str); 0] = [];
    let (mut session, _) = UploadSession::create("file", &path, no_fields, Diagnostics::default()).unwrap();
    fs::File::create(&path).unwrap().set_len(3).unwrap();

    let mut buf = [0u8; 4096];
    let err = session.pull(&mut buf).unwrap_err();
    assert!(
        matches!(&err, Error::Read(e) if e.kind() == std::io::ErrorKind::UnexpectedEof),
        "{err}"
    );
    assert_eq!(session.state(), State::Failed);
    assert!(matches!(session.pull(&mut buf), Err(Error::Failed)));
}

#[test]
fn path_without_file_name_fails_creation() {
    let no_fields: [(&str, &str); 0] = [];
    let err = UploadSession::create("file", "/", no_fields, Diagnostics::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)), "{err}");
}

#[test]
fn release_mid_stream_rejects_further_pulls() {
    let (_dir, path) = fixture("hello.txt", &[b'x'; 10_000]);
    let no_fields: [(&str, &str); 0] = [];
    let (mut session, _) = UploadSession::create("file", &path, no_fields, Diagnostics::default()).unwrap();
    let mut buf = [0u8; 512];
    assert_eq!(session.pull(&mut buf).unwrap().status, Status::More);

    session.release();
    session.release();
    assert!(matches!(session.pull(&mut buf), Err(Error::Released)));
    assert_eq!(
        session.read(&mut buf).unwrap_err().to_string(),
        Error::Released.to_string()
    );
}

/// Accepts one request, records its head and body, answers `201 Created`.
fn serve_once() -> (String, thread::JoinHandle<(String, Vec<u8>)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/upload", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let len: usize = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse().unwrap())
            })
            .expect("request without content-length");
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        stream
            .write_all(b"HTTP/1.1 201 Created\r\nContent-Length: 7\r\nConnection: close\r\n\r\nstored\n")
            .unwrap();
        (head, body)
    });
    (url, handle)
}

#[test]
fn post_file_sends_exact_body_with_headers() {
    let (_dir, path) = fixture("hello.txt", b"hello");
    let (url, server) = serve_once();

    let response = streamupload::post_file(&url, "file", &path, [("k1", "101"), ("k2", "333")], Diagnostics::default())
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(response.into_string().unwrap(), "stored\n");

    let (head, body) = server.join().unwrap();
    let head = head.to_ascii_lowercase();
    assert!(head.starts_with("post /upload http/1.1\r\n"));
    assert!(!head.contains("transfer-encoding"));

    let content_type = head
        .lines()
        .find_map(|l| l.strip_prefix("content-type: "))
        .unwrap();
    let boundary = content_type.strip_prefix("multipart/form-data; boundary=").unwrap();
    assert_eq!(body, expected(boundary, "hello", &[("k1", "101"), ("k2", "333")]));
}
