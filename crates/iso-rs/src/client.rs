// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! The client: session lifecycle over acquisition and transport.
//!
//! State machine: `Empty -> Acquired -> Releasing -> Empty`. A client holds
//! at most one live session at a time; every action is a synchronous
//! request bounded by its timeout, and a failed action never releases the
//! session on its own.

use std::sync::Arc;
use std::time::Duration;

use iso_protocol::{
    Args, DEFAULT_RPC_TIMEOUT, KeySpace, STOP_RECORD_TIMEOUT, STOP_VIDEO_TIMEOUT, SessionBinding,
    TaskResult,
};
use iso_runtime::{BrokerStore, Error, RedisStore, Result, Session, Transport, claim_instance};

use crate::config::Config;

/// What to ask for when acquiring a browser instance.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Browser engine to claim ("chrome", "firefox", ...).
    pub browser_type: String,
    /// Capture a video of the session.
    pub video: bool,
    /// Record the DOM (rrweb) for later replay.
    pub record: bool,
    /// Load a persistent profile by ID.
    pub profile: Option<String>,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            browser_type: "chrome".to_string(),
            video: false,
            record: false,
            profile: None,
        }
    }
}

impl AcquireOptions {
    /// Requests a specific browser engine.
    pub fn browser_type(mut self, browser_type: impl Into<String>) -> Self {
        self.browser_type = browser_type.into();
        self
    }

    /// Enables video capture for the session.
    pub fn video(mut self, video: bool) -> Self {
        self.video = video;
        self
    }

    /// Enables DOM recording for the session.
    pub fn record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    /// Loads a persistent profile.
    pub fn profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile = Some(profile_id.into());
        self
    }
}

/// Outcome of a successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireReceipt {
    /// Worker that owns the claimed instance.
    pub worker_name: String,
    /// The claimed browser instance.
    pub browser_id: String,
}

/// Entry point for driving one pooled remote browser.
///
/// Holds the store handle, the transport, and the (at most one) live
/// session. Multiple clients in the same or different processes may share
/// one pool; exclusivity of claimed instances comes from the store's atomic
/// claim, not from anything the client does locally.
pub struct Client {
    store: Arc<dyn BrokerStore>,
    transport: Transport,
    keys: KeySpace,
    session: Option<Session>,
    session_data: Option<TaskResult>,
    video_url: Option<String>,
    record_url: Option<String>,
}

impl Client {
    /// Connects to the broker described by `config`, verifying the link
    /// before returning.
    pub async fn connect(config: Config) -> Result<Self> {
        let store = Arc::new(RedisStore::connect(&config.url).await?);
        Ok(Self::with_store(store, KeySpace::new(config.prefix)))
    }

    /// Builds a client over an already-constructed store. This is how tests
    /// and embedded setups inject [`MemoryStore`].
    ///
    /// [`MemoryStore`]: iso_runtime::MemoryStore
    pub fn with_store(store: Arc<dyn BrokerStore>, keys: KeySpace) -> Self {
        let transport = Transport::new(Arc::clone(&store), keys.clone());
        Self {
            store,
            transport,
            keys,
            session: None,
            session_data: None,
            video_url: None,
            record_url: None,
        }
    }

    /// True while a session is live.
    pub fn is_acquired(&self) -> bool {
        self.session.is_some()
    }

    /// The live session's binding, if any.
    pub fn session(&self) -> Option<&SessionBinding> {
        self.session.as_ref().map(Session::binding)
    }

    /// Metadata returned by the worker for the final release command.
    pub fn session_data(&self) -> Option<&TaskResult> {
        self.session_data.as_ref()
    }

    /// URL of the finalized session video, once `stop_video` succeeded.
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    /// URL of the finalized DOM recording, once `stop_record` succeeded.
    pub fn record_url(&self) -> Option<&str> {
        self.record_url.as_deref()
    }

    /// Claims one free browser instance and binds it to this client.
    ///
    /// When persistence was requested (profile, video, or recording), one
    /// synchronous warm-up command is sent so the worker materializes the
    /// persistent environment before the caller's first real action. A
    /// warm-up failure is logged but does not roll back the claim: the
    /// instance stays busy until released.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionBusy`] if a session is already live
    /// - [`Error::NoWorkers`] / [`Error::NoBrowserAvailable`] from the pool
    ///   scan; allocation is not retried here - callers may retry at their
    ///   own cadence
    pub async fn acquire(&mut self, options: AcquireOptions) -> Result<AcquireReceipt> {
        if self.session.is_some() {
            return Err(Error::SessionBusy);
        }

        let (worker_name, browser_id) =
            claim_instance(self.store.as_ref(), &self.keys, &options.browser_type).await?;

        let binding = SessionBinding {
            browser_id: browser_id.clone(),
            worker_name: worker_name.clone(),
            browser_type: options.browser_type,
            video: options.video,
            record: options.record,
            profile_id: options.profile,
        };
        let wants_persistence = binding.wants_persistence();
        self.session = Some(Session::new(binding));
        self.session_data = None;
        self.video_url = None;
        self.record_url = None;

        if wants_persistence {
            tracing::info!(
                worker = worker_name.as_str(),
                "initializing persistent environment"
            );
            if let Err(err) = self.send("get_title", Args::new()).await {
                // The claim is not rolled back; the instance stays busy
                // until released.
                tracing::warn!("warm-up call failed during acquisition: {err}");
            }
        }

        Ok(AcquireReceipt {
            worker_name,
            browser_id,
        })
    }

    /// Sends one command to the session's worker with the default timeout.
    ///
    /// This is the generic primitive every action forwarder goes through.
    /// A failed command leaves the session live; only [`Client::release`]
    /// clears it.
    pub async fn send(&mut self, action: &str, args: Args) -> Result<TaskResult> {
        self.send_with_timeout(action, args, DEFAULT_RPC_TIMEOUT).await
    }

    /// Sends one command with a caller-supplied timeout, for long-running
    /// actions (video finalization, captcha solving, ...).
    pub async fn send_with_timeout(
        &mut self,
        action: &str,
        args: Args,
        timeout: Duration,
    ) -> Result<TaskResult> {
        let session = self.session.as_mut().ok_or_else(|| Error::NotAcquired {
            action: action.to_string(),
        })?;
        self.transport.send(session, action, args, timeout).await
    }

    /// Releases the session: best-effort teardown, then the release
    /// command, then the binding is gone.
    ///
    /// `stop_video` and `stop_record` run first when active, each with its
    /// extended timeout; their failures (including a missing URL in the
    /// response) are logged, never fatal. The session is cleared
    /// unconditionally - even when the release command itself fails - so
    /// the client never believes it holds a browser it cannot use. The
    /// worker, not this client, returns the instance to the free set.
    ///
    /// # Errors
    ///
    /// [`Error::NotAcquired`] if no session is live.
    pub async fn release(&mut self) -> Result<TaskResult> {
        // Taken out up front: whatever happens below, the session is Empty.
        let mut session = self.session.take().ok_or_else(|| Error::NotAcquired {
            action: "release_browser".to_string(),
        })?;

        if session.binding().video {
            tracing::info!("stopping session video");
            match self
                .transport
                .send(&mut session, "stop_video", Args::new(), STOP_VIDEO_TIMEOUT)
                .await
            {
                Ok(result) => {
                    self.video_url = result.str_field("video_url").map(str::to_string);
                    match &self.video_url {
                        Some(url) => tracing::info!(url = url.as_str(), "session video finalized"),
                        None => tracing::warn!("stop_video returned no video_url"),
                    }
                }
                Err(err) => tracing::warn!("stop_video failed during release: {err}"),
            }
        }

        if session.binding().record {
            tracing::info!("finalizing session recording");
            match self
                .transport
                .send(&mut session, "stop_record", Args::new(), STOP_RECORD_TIMEOUT)
                .await
            {
                Ok(result) => {
                    self.record_url = result.str_field("record_url").map(str::to_string);
                    match &self.record_url {
                        Some(url) => tracing::info!(url = url.as_str(), "session recording saved"),
                        None => tracing::warn!("stop_record returned no record_url"),
                    }
                }
                Err(err) => tracing::warn!("stop_record failed during release: {err}"),
            }
        }

        tracing::info!(
            browser_id = session.binding().browser_id.as_str(),
            "releasing browser"
        );
        match self
            .transport
            .send(&mut session, "release_browser", Args::new(), DEFAULT_RPC_TIMEOUT)
            .await
        {
            Ok(result) => {
                self.session_data = Some(result.clone());
                Ok(result)
            }
            Err(err) => {
                tracing::error!("release command failed: {err}");
                Err(err)
            }
        }
    }
}
