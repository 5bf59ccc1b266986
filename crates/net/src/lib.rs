//! HTTP transport.
//!
//! One exchange is one GET: `/init` with no payload for bootstrap, `/msg`
//! with the message flattened into query parameters afterwards. The request
//! runs on its own thread; the outcome comes back to the loop as a
//! `LoopEvent::Response`. Failures are carried as strings; the loop only
//! logs them and re-arms, it never inspects them.

use bus::{EventSink, LoopEvent};
use std::thread;
use std::time::Duration;
use url::Url;
use vdom::{Msg, ServerPayload};

/// Issues exchanges. At most one is ever outstanding; the loop, not the
/// transport, enforces that.
pub trait Transport: Send + Sync {
    fn exchange(&self, msg: Option<Msg>, reply: EventSink);
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base: Url,
    pub init_path: String,
    pub msg_path: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            init_path: "/init".to_string(),
            msg_path: "/msg".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "serfdom/0.1".to_string(),
        }
    }

    pub fn parse(base: &str) -> Result<Self, String> {
        let base = Url::parse(base).map_err(|e| e.to_string())?;
        Ok(Self::new(base))
    }
}

pub struct HttpTransport {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { config, agent }
    }

    fn endpoint(&self, msg: Option<&Msg>) -> Result<Url, String> {
        let path = match msg {
            Some(_) => &self.config.msg_path,
            None => &self.config.init_path,
        };
        let mut url = self.config.base.join(path).map_err(|e| e.to_string())?;
        if let Some(msg) = msg {
            let mut query = url.query_pairs_mut();
            for (name, value) in msg.to_query() {
                query.append_pair(&name, &value);
            }
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn exchange(&self, msg: Option<Msg>, reply: EventSink) {
        let url = match self.endpoint(msg.as_ref()) {
            Ok(url) => url,
            Err(err) => {
                reply.post(LoopEvent::Response(Err(err)));
                return;
            }
        };
        let agent = self.agent.clone();
        thread::spawn(move || {
            let result = fetch_payload(&agent, &url);
            if !reply.post(LoopEvent::Response(result)) {
                log::debug!("loop gone before response from {url}");
            }
        });
    }
}

fn fetch_payload(agent: &ureq::Agent, url: &Url) -> Result<ServerPayload, String> {
    let response = agent
        .request_url("GET", url)
        .call()
        .map_err(|e| e.to_string())?;
    let body = response.into_string().map_err(|e| e.to_string())?;
    vdom::parse_payload(body.as_bytes()).map_err(|e| format!("payload decode failed: {e:?}"))
}
