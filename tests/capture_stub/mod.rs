use std::io::Read;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How the stub endpoint answers POST /capture
#[derive(Debug, Clone)]
pub enum CaptureBehavior {
    /// 200 with `{"data":{"topic":...}}`
    Topic(&'static str),
    /// The given status with an empty body
    Status(u16),
    /// 200 with a verbatim body
    RawBody(&'static str),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

pub struct CaptureStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CaptureStub {
    pub fn spawn(behavior: CaptureBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start capture stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let method = request.method().to_string();
            let path = request.url().to_string();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.to_string());

            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);

            recorded.lock().unwrap().push(RecordedRequest {
                method,
                path,
                content_type,
                body,
            });

            let response = match &behavior {
                CaptureBehavior::Topic(topic) => tiny_http::Response::from_string(format!(
                    r#"{{"data":{{"topic":"{topic}"}}}}"#
                )),
                CaptureBehavior::Status(code) => {
                    tiny_http::Response::from_string("").with_status_code(*code)
                }
                CaptureBehavior::RawBody(raw) => tiny_http::Response::from_string(*raw),
            };
            let _ = request.respond(response);
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for CaptureStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
